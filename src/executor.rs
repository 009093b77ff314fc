//! Single-writer command execution pipeline.
//!
//! All sixteen [`Database`]s are owned by one dedicated thread; every
//! state mutation or read runs there, in FIFO order relative to each
//! session's own submissions (spec.md §4.7, §5). This is the
//! "message-passing executor owning all state" option spec.md §9
//! explicitly endorses as satisfying the single-writer contract.

use crate::db::Database;
use crate::persistence::PersistenceEngine;
use crate::resp::Reply;
use crate::session::Session;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// One unit of executor work: a parsed invocation plus a weak handle back
/// to the session that should receive the reply. A session that has
/// already disconnected still has its command executed; the reply is
/// simply dropped (spec.md §5 "Cancellation & timeouts").
struct ExecutorJob {
    session: Weak<Mutex<Session>>,
    reply_tx: Sender<Reply>,
    invocation: Vec<String>,
}

enum Message {
    Job(ExecutorJob),
    Flush { sync: bool },
    Shutdown { ack: Sender<()> },
}

/// A cheap, cloneable handle used by connection threads and the periodic
/// flush timer to submit work to the executor thread.
#[derive(Clone)]
pub struct ExecutorHandle {
    tx: Sender<Message>,
}

impl ExecutorHandle {
    pub fn submit(
        &self,
        session: Weak<Mutex<Session>>,
        reply_tx: Sender<Reply>,
        invocation: Vec<String>,
    ) {
        let _ = self.tx.send(Message::Job(ExecutorJob {
            session,
            reply_tx,
            invocation,
        }));
    }

    pub fn request_flush(&self, sync: bool) {
        let _ = self.tx.send(Message::Flush { sync });
    }

    /// Posts a shutdown request and blocks until the executor has drained
    /// its queue and performed a final synchronous snapshot of every
    /// database.
    pub fn shutdown(&self) {
        let (ack_tx, ack_rx) = mpsc::channel();
        if self.tx.send(Message::Shutdown { ack: ack_tx }).is_ok() {
            let _ = ack_rx.recv();
        }
    }
}

pub struct Executor {
    handle: ExecutorHandle,
    join: Option<JoinHandle<()>>,
}

impl Executor {
    /// Spawns the single-writer thread, handing it ownership of every
    /// database and the persistence engine.
    pub fn spawn(databases: Vec<Database>, persistence: Arc<PersistenceEngine>) -> Executor {
        let (tx, rx): (Sender<Message>, Receiver<Message>) = mpsc::channel();
        let join = thread::Builder::new()
            .name("picoredis-executor".into())
            .spawn(move || run(databases, persistence, rx))
            .expect("failed to spawn executor thread");

        Executor {
            handle: ExecutorHandle { tx },
            join: Some(join),
        }
    }

    pub fn handle(&self) -> ExecutorHandle {
        self.handle.clone()
    }
}

impl Drop for Executor {
    fn drop(&mut self) {
        if let Some(join) = self.join.take() {
            self.handle.shutdown();
            let _ = join.join();
        }
    }
}

fn run(mut databases: Vec<Database>, persistence: Arc<PersistenceEngine>, rx: Receiver<Message>) {
    info!(count = databases.len(), "executor thread started");
    for msg in rx {
        match msg {
            Message::Job(job) => run_job(&mut databases, job),
            Message::Flush { sync } => flush_dirty(&mut databases, &persistence, sync),
            Message::Shutdown { ack } => {
                debug!("executor draining for shutdown");
                flush_all(&mut databases, &persistence, true);
                let _ = ack.send(());
                break;
            }
        }
    }
    info!("executor thread stopped");
}

fn run_job(databases: &mut [Database], job: ExecutorJob) {
    let Some(session) = job.session.upgrade() else {
        // Session has fully gone away: nothing left to mutate on its
        // behalf, nothing to reply to.
        return;
    };
    let reply = {
        let mut session = session.lock().unwrap();
        session.process(databases, job.invocation)
    };
    // Ignore send failures: the connection may have disconnected between
    // submission and completion (spec.md §5).
    let _ = job.reply_tx.send(reply);
}

fn flush_dirty(databases: &mut [Database], persistence: &PersistenceEngine, sync: bool) {
    for db in databases.iter_mut() {
        if db.is_dirty() {
            if let Err(e) = db.snapshot(persistence, sync) {
                handle_snapshot_error(e);
            }
        }
    }
}

fn flush_all(databases: &mut [Database], persistence: &PersistenceEngine, sync: bool) {
    for db in databases.iter_mut() {
        if let Err(e) = db.snapshot(persistence, sync) {
            handle_snapshot_error(e);
        }
    }
}

fn handle_snapshot_error(err: crate::error::PicoError) {
    if err.is_fatal() {
        error!(error = %err, "fatal persistence failure, aborting");
        std::process::exit(1);
    }
    warn!(error = %err, "snapshot failed");
}

/// Periodic background flush (spec.md §4.7): every `interval`, posts a
/// non-sync flush request through the executor's own channel so it can
/// never race with command handlers. Stops when `stop` is signalled.
pub fn spawn_periodic_flush(
    handle: ExecutorHandle,
    interval: Duration,
    stop: Arc<std::sync::atomic::AtomicBool>,
) -> JoinHandle<()> {
    thread::Builder::new()
        .name("picoredis-flush-timer".into())
        .spawn(move || {
            use std::sync::atomic::Ordering;
            while !stop.load(Ordering::Relaxed) {
                thread::sleep(interval);
                if stop.load(Ordering::Relaxed) {
                    break;
                }
                handle.request_flush(false);
            }
        })
        .expect("failed to spawn periodic flush thread")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn make_executor(num_dbs: u8) -> (Executor, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let persistence = Arc::new(PersistenceEngine::open(dir.path(), num_dbs).unwrap());
        let databases: Vec<Database> = (0..num_dbs).map(Database::new).collect();
        (Executor::spawn(databases, persistence), dir)
    }

    #[test]
    fn submits_and_replies_in_order() {
        let (executor, _dir) = make_executor(1);
        let handle = executor.handle();
        let session = Arc::new(Mutex::new(Session::new(1)));
        let (reply_tx, reply_rx) = mpsc::channel();

        handle.submit(
            Arc::downgrade(&session),
            reply_tx.clone(),
            vec!["SET".into(), "k".into(), "v".into()],
        );
        handle.submit(
            Arc::downgrade(&session),
            reply_tx,
            vec!["GET".into(), "k".into()],
        );

        assert_eq!(reply_rx.recv().unwrap(), Reply::ok());
        assert_eq!(reply_rx.recv().unwrap(), Reply::Bulk("v".into()));
    }

    #[test]
    fn dropped_session_drops_reply_but_job_is_skipped_safely() {
        let (executor, _dir) = make_executor(1);
        let handle = executor.handle();
        let session = Arc::new(Mutex::new(Session::new(1)));
        let weak = Arc::downgrade(&session);
        drop(session);

        let (reply_tx, reply_rx) = mpsc::channel();
        handle.submit(weak, reply_tx, vec!["SET".into(), "k".into(), "v".into()]);
        handle.shutdown();
        assert!(reply_rx.try_recv().is_err());
    }

    #[test]
    fn periodic_flush_thread_stops_on_signal() {
        let (executor, _dir) = make_executor(1);
        let stop = Arc::new(AtomicBool::new(false));
        let join = spawn_periodic_flush(executor.handle(), Duration::from_millis(5), stop.clone());
        thread::sleep(Duration::from_millis(20));
        stop.store(true, Ordering::Relaxed);
        join.join().unwrap();
    }
}
