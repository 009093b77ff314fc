//! Set store: `key -> set<member>`, unordered, unique members.
//!
//! Grounded in `examples/original_source/src/Redis/DataType.h`'s
//! `RedisSet` (`setData_: unordered_map<string, unordered_set<string>>`).
//! `sadd`/`srem` report *new* insertions/actual removals rather than the
//! C++ original's "number of arguments" bug flagged in spec.md §9 item 4.

use super::framing;
use super::{TypeTag, TypedStore};
use crate::error::{PicoError, PicoResult};
use std::collections::{HashMap, HashSet};

#[derive(Default)]
pub struct SetStore {
    data: HashMap<String, HashSet<String>>,
}

impl SetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether `member` was newly added.
    pub fn sadd(&mut self, key: &str, member: &str) -> bool {
        self.data
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string())
    }

    /// Returns whether `member` was present and removed.
    pub fn srem(&mut self, key: &str, member: &str) -> bool {
        let Some(members) = self.data.get_mut(key) else {
            return false;
        };
        let removed = members.remove(member);
        if members.is_empty() {
            self.data.remove(key);
        }
        removed
    }

    pub fn smembers(&self, key: &str) -> Vec<String> {
        self.data
            .get(key)
            .map(|m| m.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn sismember(&self, key: &str, member: &str) -> bool {
        self.data
            .get(key)
            .map(|m| m.contains(member))
            .unwrap_or(false)
    }
}

impl TypedStore for SetStore {
    fn type_tag(&self) -> TypeTag {
        TypeTag::Set
    }

    fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (key, members) in &self.data {
            framing::write_field(&mut out, key);
            out.extend_from_slice(members.len().to_string().as_bytes());
            out.push(b':');
            for m in members {
                framing::write_field(&mut out, m);
            }
            out.push(b'\n');
        }
        out
    }

    fn deserialize(&mut self, bytes: &[u8]) -> PicoResult<()> {
        self.data.clear();
        let mut pos = 0;
        while pos < bytes.len() {
            let (key, next) = framing::read_field(bytes, pos).ok_or(PicoError::Protocol)?;
            let colon = bytes[next..]
                .iter()
                .position(|&b| b == b':')
                .ok_or(PicoError::Protocol)?
                + next;
            let count: usize = std::str::from_utf8(&bytes[next..colon])
                .ok()
                .and_then(|s| s.parse().ok())
                .ok_or(PicoError::Protocol)?;
            let mut cursor = colon + 1;
            let mut members = HashSet::with_capacity(count);
            for _ in 0..count {
                let (m, next) = framing::read_field(bytes, cursor).ok_or(PicoError::Protocol)?;
                members.insert(m);
                cursor = next;
            }
            self.data.insert(key, members);
            pos = cursor + 1;
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
    fn sadd_reports_newly_added_only() {
        let mut s = SetStore::new();
        assert!(s.sadd("s", "x"));
        assert!(!s.sadd("s", "x"));
        assert!(s.sadd("s", "y"));
    }

    #[test]
    fn srem_and_sismember() {
        let mut s = SetStore::new();
        s.sadd("s", "x");
        s.sadd("s", "y");
        assert!(s.sismember("s", "x"));
        assert!(s.srem("s", "x"));
        assert!(!s.srem("s", "x"));
        assert!(!s.sismember("s", "x"));
        let mut members = s.smembers("s");
        members.sort();
        assert_eq!(members, vec!["y".to_string()]);
    }

    #[test]
    fn serialize_round_trips() {
        let mut s = SetStore::new();
        s.sadd("s", "a|1");
        s.sadd("s", "b,2");
        let bytes = s.serialize();
        let mut restored = SetStore::new();
        restored.deserialize(&bytes).unwrap();
        let mut a = s.smembers("s");
        let mut b = restored.smembers("s");
        a.sort();
        b.sort();
        assert_eq!(a, b);
    }
}
