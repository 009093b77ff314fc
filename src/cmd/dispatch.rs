//! Executes a command descriptor's data-plane commands against a
//! [`Database`]. `SELECT`/`MULTI`/`EXEC`/`DISCARD` are session-level and
//! handled by [`crate::session::Session`] before reaching this dispatcher.
//!
//! Grounded in `examples/original_source/src/Redis/CmdParser.h`'s
//! per-command parser/executor pairs (`SetParser`, `GetParser`, ...): each
//! arm here is the Rust rendering of one such pair, type-checking the
//! addressed key before mutating.

use crate::cmd::registry;
use crate::db::Database;
use crate::error::{PicoError, PicoResult};
use crate::resp::Reply;
use crate::store::TypeTag;

/// Checks that `key` is absent or already of `expected` type; otherwise
/// yields `WRONGTYPE` (spec.md §4.6).
fn check_type(db: &Database, key: &str, expected: TypeTag) -> PicoResult<()> {
    match db.type_of(key) {
        Some(actual) if actual != expected => Err(PicoError::WrongType),
        _ => Ok(()),
    }
}

/// Runs the descriptor's type-compatibility check for a single-key,
/// type-affine command (spec.md §4.6): the descriptor is the sole source
/// of which [`TypeTag`] the key must match.
fn check_affinity(db: &Database, key: &str, spec: &registry::CommandSpec) -> PicoResult<()> {
    match spec.affinity.type_tag() {
        Some(expected) => check_type(db, key, expected),
        None => Ok(()),
    }
}

fn parse_i64(s: &str) -> PicoResult<i64> {
    s.parse::<i64>().map_err(|_| PicoError::NotInteger)
}

/// Runs one already arity-checked, case-insensitively-named command
/// against `db`. `args` is the full invocation including the command name
/// at `args[0]`.
pub fn execute(db: &mut Database, args: &[String]) -> PicoResult<Reply> {
    let name = args[0].to_ascii_lowercase();
    let spec = registry::lookup(&name).ok_or(PicoError::UnknownCommand)?;
    let reply = match name.as_str() {
        "set" => {
            let key = &args[1];
            check_affinity(db, key, spec)?;
            db.strings.set(key, args[2].clone());
            db.mark_dirty();
            Reply::ok()
        }
        "get" => {
            let key = &args[1];
            check_affinity(db, key, spec)?;
            match db.strings.get(key) {
                Some(v) => Reply::Bulk(v),
                None => Reply::NullBulk,
            }
        }
        "strlen" => {
            let key = &args[1];
            check_affinity(db, key, spec)?;
            Reply::Integer(db.strings.strlen(key) as i64)
        }
        "incr" => {
            let key = &args[1];
            check_affinity(db, key, spec)?;
            let v = db.strings.incr_by(key, 1)?;
            db.mark_dirty();
            Reply::Integer(v)
        }
        "decr" => {
            let key = &args[1];
            check_affinity(db, key, spec)?;
            let v = db.strings.decr_by(key, 1)?;
            db.mark_dirty();
            Reply::Integer(v)
        }
        "incrby" => {
            let key = &args[1];
            check_affinity(db, key, spec)?;
            let delta = parse_i64(&args[2])?;
            let v = db.strings.incr_by(key, delta)?;
            db.mark_dirty();
            Reply::Integer(v)
        }
        "decrby" => {
            let key = &args[1];
            check_affinity(db, key, spec)?;
            let delta = parse_i64(&args[2])?;
            let v = db.strings.decr_by(key, delta)?;
            db.mark_dirty();
            Reply::Integer(v)
        }
        "append" => {
            let key = &args[1];
            check_affinity(db, key, spec)?;
            let len = db.strings.append(key, &args[2]);
            db.mark_dirty();
            Reply::Integer(len as i64)
        }
        "mset" => {
            for pair in args[1..].chunks(2) {
                check_affinity(db, &pair[0], spec)?;
            }
            for pair in args[1..].chunks(2) {
                db.strings.set(&pair[0], pair[1].clone());
            }
            db.mark_dirty();
            Reply::ok()
        }
        "mget" => {
            let mut out = Vec::with_capacity(args.len() - 1);
            for key in &args[1..] {
                out.push(match db.type_of(key) {
                    Some(TypeTag::String) => Reply::Bulk(db.strings.get(key).unwrap()),
                    _ => Reply::NullBulk,
                });
            }
            Reply::Array(out)
        }
        "hset" => {
            let key = &args[1];
            check_affinity(db, key, spec)?;
            db.hashes.hset(key, &args[2], args[3].clone());
            db.mark_dirty();
            Reply::ok()
        }
        "hget" => {
            let key = &args[1];
            check_affinity(db, key, spec)?;
            match db.hashes.hget(key, &args[2]) {
                Some(v) => Reply::Bulk(v),
                None => Reply::NullBulk,
            }
        }
        "hdel" => {
            let key = &args[1];
            check_affinity(db, key, spec)?;
            let mut removed = 0i64;
            for field in &args[2..] {
                if db.hashes.hdel(key, field) {
                    removed += 1;
                }
            }
            if removed > 0 {
                db.mark_dirty();
            }
            Reply::Integer(removed)
        }
        "hgetall" => {
            let key = &args[1];
            check_affinity(db, key, spec)?;
            let mut out = Vec::new();
            for (f, v) in db.hashes.hgetall(key) {
                out.push(Reply::Bulk(f));
                out.push(Reply::Bulk(v));
            }
            Reply::Array(out)
        }
        "hmset" => {
            let key = &args[1];
            check_affinity(db, key, spec)?;
            for pair in args[2..].chunks(2) {
                db.hashes.hset(key, &pair[0], pair[1].clone());
            }
            db.mark_dirty();
            Reply::ok()
        }
        "hmget" => {
            let key = &args[1];
            check_affinity(db, key, spec)?;
            let out = args[2..]
                .iter()
                .map(|field| match db.hashes.hget(key, field) {
                    Some(v) => Reply::Bulk(v),
                    None => Reply::NullBulk,
                })
                .collect();
            Reply::Array(out)
        }
        "lpush" => {
            let key = &args[1];
            check_affinity(db, key, spec)?;
            let mut len = 0;
            for v in &args[2..] {
                len = db.lists.lpush(key, v.clone());
            }
            db.mark_dirty();
            Reply::Integer(len as i64)
        }
        "rpush" => {
            let key = &args[1];
            check_affinity(db, key, spec)?;
            let mut len = 0;
            for v in &args[2..] {
                len = db.lists.rpush(key, v.clone());
            }
            db.mark_dirty();
            Reply::Integer(len as i64)
        }
        "lpop" => {
            let key = &args[1];
            check_affinity(db, key, spec)?;
            match db.lists.lpop(key) {
                Some(v) => {
                    db.mark_dirty();
                    Reply::Bulk(v)
                }
                None => Reply::NullBulk,
            }
        }
        "rpop" => {
            let key = &args[1];
            check_affinity(db, key, spec)?;
            match db.lists.rpop(key) {
                Some(v) => {
                    db.mark_dirty();
                    Reply::Bulk(v)
                }
                None => Reply::NullBulk,
            }
        }
        "lrange" => {
            let key = &args[1];
            check_affinity(db, key, spec)?;
            let start = parse_i64(&args[2])?;
            let end = parse_i64(&args[3])?;
            let values = db.lists.lrange(key, start, end);
            Reply::Array(values.into_iter().map(Reply::Bulk).collect())
        }
        "sadd" => {
            let key = &args[1];
            check_affinity(db, key, spec)?;
            let mut added = 0i64;
            for m in &args[2..] {
                if db.sets.sadd(key, m) {
                    added += 1;
                }
            }
            if added > 0 {
                db.mark_dirty();
            }
            Reply::Integer(added)
        }
        "srem" => {
            let key = &args[1];
            check_affinity(db, key, spec)?;
            let mut removed = 0i64;
            for m in &args[2..] {
                if db.sets.srem(key, m) {
                    removed += 1;
                }
            }
            if removed > 0 {
                db.mark_dirty();
            }
            Reply::Integer(removed)
        }
        "smembers" => {
            let key = &args[1];
            check_affinity(db, key, spec)?;
            Reply::Array(db.sets.smembers(key).into_iter().map(Reply::Bulk).collect())
        }
        "sismember" => {
            let key = &args[1];
            check_affinity(db, key, spec)?;
            Reply::Integer(db.sets.sismember(key, &args[2]) as i64)
        }
        "del" => {
            let removed = db.erase_key(&args[1]);
            Reply::Integer(removed as i64)
        }
        "exists" => Reply::Integer(db.exists(&args[1]) as i64),
        "keys" => Reply::Array(db.keys(&args[1]).into_iter().map(Reply::Bulk).collect()),
        "dbsize" => Reply::Integer(db.dbsize() as i64),
        "command" => Reply::Array(Vec::new()),
        _ => return Err(PicoError::UnknownCommand),
    };
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn args(words: &[&str]) -> Vec<String> {
        words.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn set_then_get() {
        let mut db = Database::new(0);
        execute(&mut db, &args(&["SET", "foo", "bar"])).unwrap();
        let reply = execute(&mut db, &args(&["GET", "foo"])).unwrap();
        assert_eq!(reply, Reply::Bulk("bar".into()));
    }

    #[test]
    fn wrongtype_on_cross_type_access() {
        let mut db = Database::new(0);
        execute(&mut db, &args(&["RPUSH", "L", "x"])).unwrap();
        let err = execute(&mut db, &args(&["GET", "L"])).unwrap_err();
        assert!(matches!(err, PicoError::WrongType));
    }

    #[test]
    fn incr_on_non_integer_value_errors() {
        let mut db = Database::new(0);
        execute(&mut db, &args(&["SET", "counter", "abc"])).unwrap();
        let err = execute(&mut db, &args(&["INCR", "counter"])).unwrap_err();
        assert!(matches!(err, PicoError::NotInteger));
    }

    #[test]
    fn sadd_counts_only_new_members() {
        let mut db = Database::new(0);
        let r = execute(&mut db, &args(&["SADD", "s", "a", "b", "a"])).unwrap();
        assert_eq!(r, Reply::Integer(2));
    }

    #[test]
    fn del_exists_roundtrip() {
        let mut db = Database::new(0);
        execute(&mut db, &args(&["SET", "k", "v"])).unwrap();
        assert_eq!(
            execute(&mut db, &args(&["EXISTS", "k"])).unwrap(),
            Reply::Integer(1)
        );
        assert_eq!(
            execute(&mut db, &args(&["DEL", "k"])).unwrap(),
            Reply::Integer(1)
        );
        assert_eq!(
            execute(&mut db, &args(&["EXISTS", "k"])).unwrap(),
            Reply::Integer(0)
        );
    }

    #[test]
    fn unknown_command_errors() {
        let mut db = Database::new(0);
        let err = execute(&mut db, &args(&["FROBNICATE", "x"])).unwrap_err();
        assert!(matches!(err, PicoError::UnknownCommand));
    }
}
