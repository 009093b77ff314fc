//! Hash store: `key -> (field -> value)`.
//!
//! Grounded in `examples/original_source/src/Redis/DataType.h`'s
//! `RedisHash` (`hashData_: unordered_map<string, unordered_map<string,
//! string>>`).

use super::framing;
use super::{TypeTag, TypedStore};
use crate::error::{PicoError, PicoResult};
use std::collections::HashMap;

#[derive(Default)]
pub struct HashStore {
    data: HashMap<String, HashMap<String, String>>,
}

impl HashStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hset(&mut self, key: &str, field: &str, value: String) {
        self.data
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value);
    }

    pub fn hget(&self, key: &str, field: &str) -> Option<String> {
        self.data.get(key)?.get(field).cloned()
    }

    pub fn hdel(&mut self, key: &str, field: &str) -> bool {
        let Some(fields) = self.data.get_mut(key) else {
            return false;
        };
        let removed = fields.remove(field).is_some();
        if fields.is_empty() {
            self.data.remove(key);
        }
        removed
    }

    pub fn hgetall(&self, key: &str) -> Vec<(String, String)> {
        self.data
            .get(key)
            .map(|fields| fields.iter().map(|(f, v)| (f.clone(), v.clone())).collect())
            .unwrap_or_default()
    }
}

impl TypedStore for HashStore {
    fn type_tag(&self) -> TypeTag {
        TypeTag::Hash
    }

    fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (key, fields) in &self.data {
            for (field, value) in fields {
                framing::write_field(&mut out, key);
                framing::write_field(&mut out, field);
                framing::write_field(&mut out, value);
                out.push(b'\n');
            }
        }
        out
    }

    fn deserialize(&mut self, bytes: &[u8]) -> PicoResult<()> {
        self.data.clear();
        let mut pos = 0;
        while pos < bytes.len() {
            let (key, next) = framing::read_field(bytes, pos).ok_or(PicoError::Protocol)?;
            let (field, next) = framing::read_field(bytes, next).ok_or(PicoError::Protocol)?;
            let (value, next) = framing::read_field(bytes, next).ok_or(PicoError::Protocol)?;
            self.hset(&key, &field, value);
            pos = next + 1;
        }
        Ok(())
    }

    fn all_keys(&self) -> Vec<String> {
        self.data.keys().cloned().collect()
    }

    fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    fn erase(&mut self, key: &str) -> bool {
        self.data.remove(key).is_some()
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hset_hget_hdel() {
        let mut h = HashStore::new();
        h.hset("k", "f1", "v1".into());
        h.hset("k", "f2", "v2".into());
        assert_eq!(h.hget("k", "f1"), Some("v1".into()));
        assert!(h.hdel("k", "f1"));
        assert!(!h.hdel("k", "f1"));
        assert_eq!(h.hget("k", "f1"), None);
    }

    #[test]
    fn hgetall_returns_all_fields() {
        let mut h = HashStore::new();
        h.hset("k", "f1", "v1".into());
        h.hset("k", "f2", "v2".into());
        let mut all = h.hgetall("k");
        all.sort();
        assert_eq!(
            all,
            vec![("f1".to_string(), "v1".to_string()), ("f2".to_string(), "v2".to_string())]
        );
    }

    #[test]
    fn serialize_round_trips() {
        let mut h = HashStore::new();
        h.hset("k", "f|1", "v,2;3=4\n5".into());
        let bytes = h.serialize();
        let mut restored = HashStore::new();
        restored.deserialize(&bytes).unwrap();
        assert_eq!(restored.hget("k", "f|1"), Some("v,2;3=4\n5".into()));
    }
}
