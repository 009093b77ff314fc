//! Ordered key/value map with randomized levels.
//!
//! Backs the String store's keyspace so keys can be range-scanned in
//! lexicographic order. The node layout and promotion scheme follow
//! `examples/yijun-tang-rudis/src/redis/skiplist.rs`'s `Arc<RwLock<_>>`
//! forward-pointer style; unlike that zset-flavored skiplist (which orders
//! on a separate `f64` score), this one orders directly on the key.

use rand::Rng;
use std::sync::{Arc, RwLock};

const MAX_LEVEL: usize = 16;
const PROMOTION_P: f64 = 0.5;

struct Node {
    key: Option<String>,
    value: RwLock<String>,
    forward: Vec<RwLock<Option<Arc<Node>>>>,
}

impl Node {
    fn new(level: usize, key: Option<String>, value: String) -> Arc<Node> {
        let mut forward = Vec::with_capacity(level);
        for _ in 0..level {
            forward.push(RwLock::new(None));
        }
        Arc::new(Node {
            key,
            value: RwLock::new(value),
            forward,
        })
    }
}

/// An ordered associative container keyed by `String`, O(log n) expected
/// insert/search/erase.
pub struct SkipList {
    head: Arc<Node>,
    level: usize,
    len: usize,
}

impl SkipList {
    pub fn new() -> SkipList {
        SkipList {
            head: Node::new(MAX_LEVEL, None, String::new()),
            level: 1,
            len: 0,
        }
    }

    fn random_level(&self) -> usize {
        let mut rng = rand::thread_rng();
        let mut level = 1;
        while level < MAX_LEVEL && rng.gen_bool(PROMOTION_P) {
            level += 1;
        }
        level
    }

    /// Overwrite-if-present insert.
    pub fn insert(&mut self, key: &str, value: String) {
        let mut update: Vec<Arc<Node>> = Vec::with_capacity(MAX_LEVEL);
        let mut x = self.head.clone();
        for i in (0..self.level).rev() {
            loop {
                let next = x.forward[i].read().unwrap().clone();
                match next {
                    Some(n) if n.key.as_deref().unwrap() < key => x = n,
                    _ => break,
                }
            }
            update.push(x.clone());
        }
        update.reverse();

        let existing = update[0].forward[0].read().unwrap().clone();
        if let Some(n) = &existing {
            if n.key.as_deref() == Some(key) {
                *n.value.write().unwrap() = value;
                return;
            }
        }

        let new_level = self.random_level();
        if new_level > self.level {
            for _ in self.level..new_level {
                update.push(self.head.clone());
            }
            self.level = new_level;
        }

        let node = Node::new(new_level, Some(key.to_string()), value);
        for i in 0..new_level {
            let next = update[i].forward[i].read().unwrap().clone();
            *node.forward[i].write().unwrap() = next;
            *update[i].forward[i].write().unwrap() = Some(node.clone());
        }
        self.len += 1;
    }

    pub fn search(&self, key: &str) -> Option<String> {
        let mut x = self.head.clone();
        for i in (0..self.level).rev() {
            loop {
                let next = x.forward[i].read().unwrap().clone();
                match next {
                    Some(n) if n.key.as_deref().unwrap() < key => x = n,
                    _ => break,
                }
            }
        }
        let next = x.forward[0].read().unwrap().clone();
        match next {
            Some(n) if n.key.as_deref() == Some(key) => Some(n.value.read().unwrap().clone()),
            _ => None,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.search(key).is_some()
    }

    pub fn erase(&mut self, key: &str) -> bool {
        let mut update: Vec<Arc<Node>> = Vec::with_capacity(MAX_LEVEL);
        let mut x = self.head.clone();
        for i in (0..self.level).rev() {
            loop {
                let next = x.forward[i].read().unwrap().clone();
                match next {
                    Some(n) if n.key.as_deref().unwrap() < key => x = n,
                    _ => break,
                }
            }
            update.push(x.clone());
        }
        update.reverse();

        let target = update[0].forward[0].read().unwrap().clone();
        let target = match target {
            Some(n) if n.key.as_deref() == Some(key) => n,
            _ => return false,
        };

        for i in 0..self.level {
            let points_to_target = {
                let slot = update[i].forward[i].read().unwrap();
                matches!(slot.as_ref(), Some(n) if Arc::ptr_eq(n, &target))
            };
            if !points_to_target {
                continue;
            }
            let next = target.forward[i].read().unwrap().clone();
            *update[i].forward[i].write().unwrap() = next;
        }

        while self.level > 1 && self.head.forward[self.level - 1].read().unwrap().is_none() {
            self.level -= 1;
        }
        self.len -= 1;
        true
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries().into_iter().map(|(k, _)| k).collect()
    }

    pub fn entries(&self) -> Vec<(String, String)> {
        let mut out = Vec::with_capacity(self.len);
        let mut x = self.head.forward[0].read().unwrap().clone();
        while let Some(n) = x {
            out.push((n.key.clone().unwrap(), n.value.read().unwrap().clone()));
            x = n.forward[0].read().unwrap().clone();
        }
        out
    }

    pub fn size(&self) -> usize {
        self.len
    }

    pub fn clear(&mut self) {
        self.head = Node::new(MAX_LEVEL, None, String::new());
        self.level = 1;
        self.len = 0;
    }
}

impl Default for SkipList {
    fn default() -> Self {
        Self::new()
    }
}
