//! Command descriptors: name, arity predicate, and type affinity.
//!
//! The table is built the way `examples/yijun-tang-rudis/src/cmd.rs`
//! builds its `CMD_TABLE` — a `once_cell::sync::Lazy<HashMap<&str, _>>` of
//! descriptors keyed by lowercase command name — generalized from that
//! teacher's single exact/negative-arity integer to the richer arity
//! shapes spec.md §4.6 calls for (`MSET`'s "at least 3 and odd", etc.).

use crate::store::TypeTag;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Which value-type namespace a command operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affinity {
    String,
    Hash,
    List,
    Set,
    Any,
}

impl Affinity {
    /// The [`TypeTag`] a `check_type` call against this affinity should
    /// expect, or `None` for commands that aren't keyed to a single type.
    pub fn type_tag(&self) -> Option<TypeTag> {
        match self {
            Affinity::String => Some(TypeTag::String),
            Affinity::Hash => Some(TypeTag::Hash),
            Affinity::List => Some(TypeTag::List),
            Affinity::Set => Some(TypeTag::Set),
            Affinity::Any => None,
        }
    }
}

/// Arity shapes needed by the command table in spec.md §4.6. `argc`
/// counts the command name itself (so `SET k v` has `argc == 3`).
#[derive(Debug, Clone, Copy)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    AtLeastOdd(usize),
    AtLeastEven(usize),
}

impl Arity {
    pub fn accepts(&self, argc: usize) -> bool {
        match *self {
            Arity::Exact(n) => argc == n,
            Arity::AtLeast(n) => argc >= n,
            Arity::AtLeastOdd(n) => argc >= n && argc % 2 == 1,
            Arity::AtLeastEven(n) => argc >= n && argc % 2 == 0,
        }
    }
}

pub struct CommandSpec {
    pub arity: Arity,
    pub affinity: Affinity,
}

macro_rules! spec {
    ($name:expr, $arity:expr, $affinity:expr) => {
        (
            $name,
            CommandSpec {
                arity: $arity,
                affinity: $affinity,
            },
        )
    };
}

static CMD_TABLE: Lazy<HashMap<&'static str, CommandSpec>> = Lazy::new(|| {
    use Affinity::*;
    use Arity::*;
    HashMap::from([
        spec!("set", Exact(3), String),
        spec!("get", Exact(2), String),
        spec!("strlen", Exact(2), String),
        spec!("incr", Exact(2), String),
        spec!("decr", Exact(2), String),
        spec!("append", Exact(3), String),
        spec!("incrby", Exact(3), String),
        spec!("decrby", Exact(3), String),
        spec!("mset", AtLeastOdd(3), String),
        spec!("mget", AtLeast(2), String),
        spec!("hset", Exact(4), Hash),
        spec!("hget", Exact(3), Hash),
        spec!("hdel", AtLeast(3), Hash),
        spec!("hgetall", Exact(2), Hash),
        spec!("hmset", AtLeastEven(4), Hash),
        spec!("hmget", AtLeast(3), Hash),
        spec!("lpush", AtLeast(3), List),
        spec!("rpush", AtLeast(3), List),
        spec!("lpop", Exact(2), List),
        spec!("rpop", Exact(2), List),
        spec!("lrange", Exact(4), List),
        spec!("sadd", AtLeast(3), Set),
        spec!("srem", AtLeast(3), Set),
        spec!("smembers", Exact(2), Set),
        spec!("sismember", Exact(3), Set),
        spec!("del", Exact(2), Any),
        spec!("exists", Exact(2), Any),
        spec!("keys", Exact(2), Any),
        spec!("dbsize", Exact(1), Any),
        spec!("select", Exact(2), Any),
        spec!("command", Exact(1), Any),
        spec!("multi", Exact(1), Any),
        spec!("exec", Exact(1), Any),
        spec!("discard", Exact(1), Any),
    ])
});

/// Case-insensitive descriptor lookup.
pub fn lookup(name: &str) -> Option<&'static CommandSpec> {
    CMD_TABLE.get(name.to_ascii_lowercase().as_str())
}
