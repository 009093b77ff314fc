//! One logical namespace: owns the four typed stores, routes type-scoped
//! operations, and exposes glob keyspace enumeration plus `DBSIZE`.
//!
//! Grounded in `examples/original_source/src/Redis/DataManager.h`
//! (`getDataType`, `keys`, `eraseKey`, `dbsize`, `searchKey`,
//! `persistDataToDisk`/`loadDataFromDisk`).

use crate::error::PicoResult;
use crate::persistence::PersistenceEngine;
use crate::store::hash::HashStore;
use crate::store::list::ListStore;
use crate::store::set::SetStore;
use crate::store::string::StringStore;
use crate::store::{TypeTag, TypedStore};

/// A single one of the sixteen logical databases a session may `SELECT`.
pub struct Database {
    index: u8,
    pub strings: StringStore,
    pub hashes: HashStore,
    pub lists: ListStore,
    pub sets: SetStore,
    dirty: bool,
}

/// Fixed erase-order used by `erase_key`/`exists`, matching the C++
/// original's iteration over its `dataStore_` map.
const ERASE_ORDER: [TypeTag; 4] = [TypeTag::String, TypeTag::Hash, TypeTag::List, TypeTag::Set];

impl Database {
    pub fn new(index: u8) -> Self {
        Database {
            index,
            strings: StringStore::new(),
            hashes: HashStore::new(),
            lists: ListStore::new(),
            sets: SetStore::new(),
            dirty: false,
        }
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    fn stores(&self) -> [&dyn TypedStore; 4] {
        [&self.strings, &self.hashes, &self.lists, &self.sets]
    }

    /// Mark this database touched since its last snapshot; read by the
    /// periodic-flush timer (spec.md §4.7) to skip untouched databases.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Fans out to each store and concatenates matches. Ordering across
    /// types is not guaranteed (spec.md §4.3).
    pub fn keys(&self, pattern: &str) -> Vec<String> {
        self.stores()
            .into_iter()
            .flat_map(|s| s.match_keys(pattern))
            .collect()
    }

    /// Erases `key` from the first store (in fixed type order) that
    /// contains it.
    pub fn erase_key(&mut self, key: &str) -> bool {
        let removed = match ERASE_ORDER
            .iter()
            .find(|tag| self.store_contains(**tag, key))
        {
            Some(TypeTag::String) => self.strings.erase(key),
            Some(TypeTag::Hash) => self.hashes.erase(key),
            Some(TypeTag::List) => self.lists.erase(key),
            Some(TypeTag::Set) => self.sets.erase(key),
            None => false,
        };
        if removed {
            self.dirty = true;
        }
        removed
    }

    fn store_contains(&self, tag: TypeTag, key: &str) -> bool {
        match tag {
            TypeTag::String => self.strings.contains(key),
            TypeTag::Hash => self.hashes.contains(key),
            TypeTag::List => self.lists.contains(key),
            TypeTag::Set => self.sets.contains(key),
        }
    }

    pub fn exists(&self, key: &str) -> bool {
        self.stores().into_iter().any(|s| s.contains(key))
    }

    pub fn dbsize(&self) -> u64 {
        self.stores().into_iter().map(|s| s.size()).sum()
    }

    /// Which value-type namespace currently holds `key`, if any.
    pub fn type_of(&self, key: &str) -> Option<TypeTag> {
        self.stores()
            .into_iter()
            .find(|s| s.contains(key))
            .map(|s| s.type_tag())
    }

    /// Serializes all four stores and writes them as one atomic batch
    /// into the persistence engine.
    pub fn snapshot(&mut self, engine: &PersistenceEngine, sync: bool) -> PicoResult<()> {
        let blobs = [
            (TypeTag::String, self.strings.serialize()),
            (TypeTag::Hash, self.hashes.serialize()),
            (TypeTag::List, self.lists.serialize()),
            (TypeTag::Set, self.sets.serialize()),
        ];
        engine.persist(self.index, &blobs, sync)?;
        self.dirty = false;
        Ok(())
    }

    /// Restores all four stores from the persistence engine's last
    /// snapshot for this database's index.
    pub fn restore(&mut self, engine: &PersistenceEngine) -> PicoResult<()> {
        for (tag, bytes) in engine.load(self.index)? {
            match tag {
                TypeTag::String => self.strings.deserialize(&bytes)?,
                TypeTag::Hash => self.hashes.deserialize(&bytes)?,
                TypeTag::List => self.lists.deserialize(&bytes)?,
                TypeTag::Set => self.sets.deserialize(&bytes)?,
            }
        }
        self.dirty = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erase_key_checks_stores_in_fixed_order() {
        let mut db = Database::new(0);
        db.hashes.hset("k", "f", "v".into());
        assert!(db.erase_key("k"));
        assert!(!db.exists("k"));
    }

    #[test]
    fn dbsize_sums_all_stores() {
        let mut db = Database::new(0);
        db.strings.set("a", "1".into());
        db.hashes.hset("b", "f", "v".into());
        db.lists.rpush("c", "x".into());
        db.sets.sadd("d", "m");
        assert_eq!(db.dbsize(), 4);
    }

    #[test]
    fn keys_fans_out_across_types() {
        let mut db = Database::new(0);
        db.strings.set("str1", "v".into());
        db.hashes.hset("hash1", "f", "v".into());
        let mut keys = db.keys("*");
        keys.sort();
        assert_eq!(keys, vec!["hash1".to_string(), "str1".to_string()]);
    }

    #[test]
    fn type_of_reports_owning_store() {
        let mut db = Database::new(0);
        db.lists.rpush("L", "x".into());
        assert_eq!(db.type_of("L"), Some(TypeTag::List));
        assert_eq!(db.type_of("missing"), None);
    }
}
