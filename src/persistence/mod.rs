//! Persistence engine: snapshot-serializes each database's typed stores
//! into an embedded ordered key/value store and restores them at open.
//!
//! Grounded in `examples/original_source/src/Redis/PersistenceManager.h`,
//! which wraps one LevelDB instance per logical database at
//! `./data/db<N>`. This crate's backing store is `sled` instead (pure
//! Rust, matches the pack's idiomatic choice — see
//! `examples/other_examples/manifests/*/Cargo.toml`), reached only
//! through the narrow [`KvEngine`] trait so the rest of the crate never
//! names `sled` directly.

pub mod engine;
pub mod sled_engine;

pub use engine::PersistenceEngine;

use crate::error::PicoResult;

/// Opaque backing store contract (spec.md §1): `put`, `get`, `iterate`,
/// and a batched write with a durability flag.
pub trait KvEngine: Send + Sync {
    fn put(&self, key: &[u8], value: &[u8]) -> PicoResult<()>;
    fn get(&self, key: &[u8]) -> PicoResult<Option<Vec<u8>>>;
    fn iterate(&self) -> PicoResult<Vec<(Vec<u8>, Vec<u8>)>>;
    fn write_batch(&self, items: &[(Vec<u8>, Vec<u8>)], sync: bool) -> PicoResult<()>;
}
