//! List store: `key -> deque<value>`, both ends mutable.
//!
//! Grounded in `examples/original_source/src/Redis/DataType.h`'s
//! `RedisList` (`listData_: unordered_map<string, deque<string>>`).

use super::framing;
use super::{TypeTag, TypedStore};
use crate::error::{PicoError, PicoResult};
use std::collections::{HashMap, VecDeque};

#[derive(Default)]
pub struct ListStore {
    data: HashMap<String, VecDeque<String>>,
}

impl ListStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lpush(&mut self, key: &str, value: String) -> u64 {
        let deque = self.data.entry(key.to_string()).or_default();
        deque.push_front(value);
        deque.len() as u64
    }

    pub fn rpush(&mut self, key: &str, value: String) -> u64 {
        let deque = self.data.entry(key.to_string()).or_default();
        deque.push_back(value);
        deque.len() as u64
    }

    pub fn lpop(&mut self, key: &str) -> Option<String> {
        let deque = self.data.get_mut(key)?;
        let v = deque.pop_front();
        if deque.is_empty() {
            self.data.remove(key);
        }
        v
    }

    pub fn rpop(&mut self, key: &str) -> Option<String> {
        let deque = self.data.get_mut(key)?;
        let v = deque.pop_back();
        if deque.is_empty() {
            self.data.remove(key);
        }
        v
    }

    /// Negative indices count from the end of the list (`-1` is the last
    /// element). The resolved range is clamped to `[0, size-1]`; an
    /// inverted range or a missing key yields an empty result.
    pub fn lrange(&self, key: &str, start: i64, end: i64) -> Vec<String> {
        let Some(deque) = self.data.get(key) else {
            return Vec::new();
        };
        let len = deque.len() as i64;
        if len == 0 {
            return Vec::new();
        }

        let resolve = |idx: i64| -> i64 {
            if idx < 0 {
                len + idx
            } else {
                idx
            }
        };
        let start = resolve(start).clamp(0, len - 1);
        let end = resolve(end).clamp(0, len - 1);
        if start > end {
            return Vec::new();
        }
        deque
            .iter()
            .skip(start as usize)
            .take((end - start + 1) as usize)
            .cloned()
            .collect()
    }
}

impl TypedStore for ListStore {
    fn type_tag(&self) -> TypeTag {
        TypeTag::List
    }

    fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (key, values) in &self.data {
            framing::write_field(&mut out, key);
            out.extend_from_slice(values.len().to_string().as_bytes());
            out.push(b':');
            for v in values {
                framing::write_field(&mut out, v);
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
            let mut values = VecDeque::with_capacity(count);
            for _ in 0..count {
                let (v, next) = framing::read_field(bytes, cursor).ok_or(PicoError::Protocol)?;
                values.push_back(v);
                cursor = next;
            }
            self.data.insert(key, values);
            pos = cursor + 1; // skip '\n'
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
    fn push_pop_both_ends() {
        let mut l = ListStore::new();
        assert_eq!(l.rpush("L", "a".into()), 1);
        assert_eq!(l.rpush("L", "b".into()), 2);
        assert_eq!(l.rpush("L", "c".into()), 3);
        assert_eq!(l.lpush("L", "z".into()), 4);
        assert_eq!(l.lrange("L", 0, -1), vec!["z", "a", "b", "c"]);
        assert_eq!(l.lpop("L"), Some("z".into()));
        assert_eq!(l.rpop("L"), Some("c".into()));
    }

    #[test]
    fn lrange_handles_negative_and_inverted_ranges() {
        let mut l = ListStore::new();
        for v in ["a", "b", "c", "d"] {
            l.rpush("L", v.into());
        }
        assert_eq!(l.lrange("L", -2, -1), vec!["c", "d"]);
        assert_eq!(l.lrange("L", 2, 1), Vec::<String>::new());
        assert_eq!(l.lrange("missing", 0, -1), Vec::<String>::new());
        assert_eq!(l.lrange("L", -100, 100), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn pop_last_element_removes_key() {
        let mut l = ListStore::new();
        l.rpush("L", "only".into());
        l.lpop("L");
        assert!(!l.contains("L"));
    }

    #[test]
    fn serialize_round_trips() {
        let mut l = ListStore::new();
        for v in ["a|1", "b,2", "c;3"] {
            l.rpush("L", v.into());
        }
        let bytes = l.serialize();
        let mut restored = ListStore::new();
        restored.deserialize(&bytes).unwrap();
        assert_eq!(restored.lrange("L", 0, -1), l.lrange("L", 0, -1));
    }
}
