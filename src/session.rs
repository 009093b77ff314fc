//! Per-connection state: current db index, `MULTI` buffer, and the
//! command-processing entry point the Executor calls for every inbound
//! invocation.
//!
//! Grounded in `examples/original_source/src/Redis/TransactionContext.h`
//! (`_inTransation`, `_transcationQueue`) and `RedisSession.h`'s per-client
//! `db_index`; queueing and `EXEC`/`DISCARD` semantics follow spec.md §4.8,
//! including its §9-resolved open questions (`SELECT` queues like any
//! other command and is evaluated against the session's live db index when
//! `EXEC` runs it).

use crate::cmd::{self, registry};
use crate::db::Database;
use crate::error::PicoError;
use crate::resp::Reply;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    Normal,
    InTx,
}

/// One connection's command-batching state. Never shared across
/// connections; created on connect, dropped on disconnect.
pub struct Session {
    db_index: u8,
    num_dbs: u8,
    state: TxState,
    tx_queue: Vec<Vec<String>>,
    tx_dirty: bool,
}

impl Session {
    pub fn new(num_dbs: u8) -> Self {
        Session {
            db_index: 0,
            num_dbs,
            state: TxState::Normal,
            tx_queue: Vec::new(),
            tx_dirty: false,
        }
    }

    pub fn db_index(&self) -> u8 {
        self.db_index
    }

    pub fn is_in_tx(&self) -> bool {
        self.state == TxState::InTx
    }

    /// Processes one inbound invocation (`args[0]` is the command name),
    /// mutating session/transaction state and, when appropriate,
    /// `databases` too. This is the single entry point the Executor calls
    /// for both top-level commands and each command inside an `EXEC`
    /// batch — `EXEC` itself recurses into [`Session::apply_one`] per
    /// queued invocation.
    pub fn process(&mut self, databases: &mut [Database], args: Vec<String>) -> Reply {
        let name = args[0].to_ascii_lowercase();

        let Some(spec) = registry::lookup(&name) else {
            if self.is_in_tx() {
                self.tx_dirty = true;
            }
            return Reply::from(PicoError::UnknownCommand);
        };
        if !spec.arity.accepts(args.len()) {
            if self.is_in_tx() {
                self.tx_dirty = true;
            }
            return Reply::from(PicoError::WrongArity { name: name.clone() });
        }

        match name.as_str() {
            "multi" => self.cmd_multi(),
            "exec" => self.cmd_exec(databases),
            "discard" => self.cmd_discard(),
            _ => {
                if self.is_in_tx() {
                    self.tx_queue.push(args);
                    Reply::queued()
                } else {
                    self.apply_one(databases, &args)
                }
            }
        }
    }

    fn cmd_multi(&mut self) -> Reply {
        if self.is_in_tx() {
            return Reply::from(PicoError::MultiNested);
        }
        self.state = TxState::InTx;
        self.tx_queue.clear();
        self.tx_dirty = false;
        Reply::ok()
    }

    fn cmd_discard(&mut self) -> Reply {
        if !self.is_in_tx() {
            return Reply::from(PicoError::DiscardWithoutMulti);
        }
        self.state = TxState::Normal;
        self.tx_queue.clear();
        self.tx_dirty = false;
        Reply::ok()
    }

    fn cmd_exec(&mut self, databases: &mut [Database]) -> Reply {
        if !self.is_in_tx() {
            return Reply::from(PicoError::ExecWithoutMulti);
        }
        self.state = TxState::Normal;
        if self.tx_dirty {
            self.tx_queue.clear();
            self.tx_dirty = false;
            return Reply::Error(
                "EXECABORT Transaction discarded because of previous errors.".to_string(),
            );
        }
        let queue = std::mem::take(&mut self.tx_queue);
        let replies = queue
            .into_iter()
            .map(|cmd| self.apply_one(databases, &cmd))
            .collect();
        Reply::Array(replies)
    }

    /// Executes a single, already arity-checked, non-control-command
    /// invocation against the session's current database, or `SELECT`
    /// against the session's own index.
    fn apply_one(&mut self, databases: &mut [Database], args: &[String]) -> Reply {
        let name = args[0].to_ascii_lowercase();
        if name == "select" {
            return self.select(&args[1]);
        }
        match cmd::execute(&mut databases[self.db_index as usize], args) {
            Ok(reply) => reply,
            Err(err) => Reply::from(err),
        }
    }

    fn select(&mut self, index_arg: &str) -> Reply {
        match index_arg.parse::<u8>() {
            Ok(idx) if idx < self.num_dbs => {
                self.db_index = idx;
                Reply::ok()
            }
            _ => Reply::from(PicoError::InvalidDbIndex),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dbs(n: u8) -> Vec<Database> {
        (0..n).map(Database::new).collect()
    }

    fn args(words: &[&str]) -> Vec<String> {
        words.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn select_changes_current_db_and_isolates_state() {
        let mut session = Session::new(16);
        let mut databases = dbs(16);

        session.process(&mut databases, args(&["SELECT", "1"]));
        session.process(&mut databases, args(&["SET", "k", "v"]));
        session.process(&mut databases, args(&["SELECT", "0"]));
        assert_eq!(
            session.process(&mut databases, args(&["EXISTS", "k"])),
            Reply::Integer(0)
        );
        session.process(&mut databases, args(&["SELECT", "1"]));
        assert_eq!(
            session.process(&mut databases, args(&["EXISTS", "k"])),
            Reply::Integer(1)
        );
    }

    #[test]
    fn multi_cannot_nest() {
        let mut session = Session::new(16);
        let mut databases = dbs(16);
        assert_eq!(session.process(&mut databases, args(&["MULTI"])), Reply::ok());
        assert_eq!(
            session.process(&mut databases, args(&["MULTI"])),
            Reply::from(PicoError::MultiNested)
        );
    }

    #[test]
    fn exec_without_multi_errors() {
        let mut session = Session::new(16);
        let mut databases = dbs(16);
        assert_eq!(
            session.process(&mut databases, args(&["EXEC"])),
            Reply::from(PicoError::ExecWithoutMulti)
        );
    }

    #[test]
    fn discard_without_multi_errors() {
        let mut session = Session::new(16);
        let mut databases = dbs(16);
        assert_eq!(
            session.process(&mut databases, args(&["DISCARD"])),
            Reply::from(PicoError::DiscardWithoutMulti)
        );
    }

    #[test]
    fn queued_commands_execute_in_order_on_exec() {
        let mut session = Session::new(16);
        let mut databases = dbs(16);

        session.process(&mut databases, args(&["MULTI"]));
        assert_eq!(
            session.process(&mut databases, args(&["SET", "a", "1"])),
            Reply::queued()
        );
        assert_eq!(
            session.process(&mut databases, args(&["INCR", "a"])),
            Reply::queued()
        );
        let result = session.process(&mut databases, args(&["EXEC"]));
        assert_eq!(
            result,
            Reply::Array(vec![Reply::ok(), Reply::Integer(2)])
        );
        assert!(!session.is_in_tx());
    }

    #[test]
    fn arity_failure_in_tx_marks_dirty_and_aborts_exec() {
        let mut session = Session::new(16);
        let mut databases = dbs(16);

        session.process(&mut databases, args(&["MULTI"]));
        session.process(&mut databases, args(&["SET", "a"])); // wrong arity
        let result = session.process(&mut databases, args(&["EXEC"]));
        assert_eq!(
            result,
            Reply::Error(
                "EXECABORT Transaction discarded because of previous errors.".to_string()
            )
        );
        assert!(!session.is_in_tx());
    }

    #[test]
    fn discard_drops_queue() {
        let mut session = Session::new(16);
        let mut databases = dbs(16);

        session.process(&mut databases, args(&["MULTI"]));
        session.process(&mut databases, args(&["SET", "a", "1"]));
        assert_eq!(session.process(&mut databases, args(&["DISCARD"])), Reply::ok());
        assert!(!session.is_in_tx());
        assert_eq!(
            session.process(&mut databases, args(&["EXISTS", "a"])),
            Reply::Integer(0)
        );
    }

    #[test]
    fn select_inside_transaction_queues_and_applies_on_exec() {
        let mut session = Session::new(16);
        let mut databases = dbs(16);

        session.process(&mut databases, args(&["MULTI"]));
        session.process(&mut databases, args(&["SELECT", "2"]));
        session.process(&mut databases, args(&["SET", "k", "v"]));
        session.process(&mut databases, args(&["EXEC"]));

        assert_eq!(session.db_index(), 2);
        assert_eq!(
            databases[2].exists("k"),
            true
        );
        assert_eq!(databases[0].exists("k"), false);
    }
}
