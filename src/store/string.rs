//! String store: an ordered `key -> value` map backed by the skiplist.
//!
//! Grounded in `examples/original_source/src/Redis/DataType.h`'s
//! `RedisString` (skiplist-backed) plus its `insert`/`get`/`remove`.

use super::framing;
use super::{TypeTag, TypedStore};
use crate::error::{PicoError, PicoResult};
use crate::skiplist::SkipList;

#[derive(Default)]
pub struct StringStore {
    data: SkipList,
}

impl StringStore {
    pub fn new() -> Self {
        Self {
            data: SkipList::new(),
        }
    }

    pub fn set(&mut self, key: &str, value: String) {
        self.data.insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.data.search(key)
    }

    /// Returns the new length of the string after appending.
    pub fn append(&mut self, key: &str, value: &str) -> u64 {
        let mut current = self.data.search(key).unwrap_or_default();
        current.push_str(value);
        let len = current.len() as u64;
        self.data.insert(key, current);
        len
    }

    pub fn incr_by(&mut self, key: &str, delta: i64) -> PicoResult<i64> {
        let current = match self.data.search(key) {
            Some(s) => s.parse::<i64>().map_err(|_| PicoError::NotInteger)?,
            None => 0,
        };
        let next = current
            .checked_add(delta)
            .ok_or(PicoError::NotInteger)?;
        self.data.insert(key, next.to_string());
        Ok(next)
    }

    pub fn decr_by(&mut self, key: &str, delta: i64) -> PicoResult<i64> {
        let current = match self.data.search(key) {
            Some(s) => s.parse::<i64>().map_err(|_| PicoError::NotInteger)?,
            None => 0,
        };
        let next = current
            .checked_sub(delta)
            .ok_or(PicoError::NotInteger)?;
        self.data.insert(key, next.to_string());
        Ok(next)
    }

    pub fn strlen(&self, key: &str) -> u64 {
        self.data
            .search(key)
            .map(|s| s.len() as u64)
            .unwrap_or(0)
    }
}

impl TypedStore for StringStore {
    fn type_tag(&self) -> TypeTag {
        TypeTag::String
    }

    fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (k, v) in self.data.entries() {
            framing::write_field(&mut out, &k);
            framing::write_field(&mut out, &v);
            out.push(b'\n');
        }
        out
    }

    fn deserialize(&mut self, bytes: &[u8]) -> PicoResult<()> {
        self.data.clear();
        let mut pos = 0;
        while pos < bytes.len() {
            let (key, next) = framing::read_field(bytes, pos).ok_or(PicoError::Protocol)?;
            let (value, next) = framing::read_field(bytes, next).ok_or(PicoError::Protocol)?;
            self.data.insert(&key, value);
            pos = next + 1; // skip '\n'
        }
        Ok(())
    }

    fn all_keys(&self) -> Vec<String> {
        self.data.keys()
    }

    fn contains(&self, key: &str) -> bool {
        self.data.contains(key)
    }

    fn erase(&mut self, key: &str) -> bool {
        self.data.erase(key)
    }

    fn size(&self) -> u64 {
        self.data.size() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_roundtrip() {
        let mut s = StringStore::new();
        s.set("foo", "bar".into());
        assert_eq!(s.get("foo"), Some("bar".into()));
    }

    #[test]
    fn append_returns_new_length() {
        let mut s = StringStore::new();
        s.set("foo", "bar".into());
        assert_eq!(s.append("foo", "baz"), 6);
        assert_eq!(s.get("foo"), Some("barbaz".into()));
    }

    #[test]
    fn append_to_missing_key_creates_it() {
        let mut s = StringStore::new();
        assert_eq!(s.append("new", "hi"), 2);
        assert_eq!(s.get("new"), Some("hi".into()));
    }

    #[test]
    fn incr_decr_missing_key_is_zero_based() {
        let mut s = StringStore::new();
        assert_eq!(s.incr_by("counter", 1).unwrap(), 1);
        assert_eq!(s.incr_by("counter", 10).unwrap(), 11);
        assert_eq!(s.decr_by("counter", 1).unwrap(), 10);
    }

    #[test]
    fn incr_on_non_integer_errors() {
        let mut s = StringStore::new();
        s.set("counter", "abc".into());
        assert!(matches!(
            s.incr_by("counter", 1),
            Err(PicoError::NotInteger)
        ));
    }

    #[test]
    fn serialize_deserialize_round_trips_with_delimiters_in_values() {
        let mut s = StringStore::new();
        s.set("a", "va|lue,with;delims=1\nend".into());
        s.set("b", "plain".into());
        let bytes = s.serialize();

        let mut restored = StringStore::new();
        restored.deserialize(&bytes).unwrap();
        assert_eq!(restored.all_keys(), s.all_keys());
        assert_eq!(restored.get("a"), s.get("a"));
        assert_eq!(restored.get("b"), s.get("b"));
    }
}
