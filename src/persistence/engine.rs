//! One [`KvEngine`] per logical database index, opened eagerly at
//! startup and held for the process lifetime, mirroring the C++
//! original's one-`PersistenceManager`-per-db model.

use super::sled_engine::SledEngine;
use super::KvEngine;
use crate::error::PicoResult;
use crate::store::TypeTag;
use std::path::{Path, PathBuf};

pub struct PersistenceEngine {
    engines: Vec<Box<dyn KvEngine>>,
}

impl PersistenceEngine {
    /// Opens `./data/db<N>` (relative to `base_dir`) for every `N` in
    /// `0..num_dbs`. A failure here is fatal per spec.md §7.
    pub fn open(base_dir: &Path, num_dbs: u8) -> PicoResult<Self> {
        let mut engines: Vec<Box<dyn KvEngine>> = Vec::with_capacity(num_dbs as usize);
        for n in 0..num_dbs {
            let path: PathBuf = base_dir.join(format!("db{n}"));
            engines.push(Box::new(SledEngine::open(&path)?));
        }
        Ok(PersistenceEngine { engines })
    }

    /// Writes the four type-tagged blobs for database `index` as a
    /// single atomic batch.
    pub fn persist(
        &self,
        index: u8,
        blobs: &[(TypeTag, Vec<u8>)],
        sync: bool,
    ) -> PicoResult<()> {
        let items: Vec<(Vec<u8>, Vec<u8>)> = blobs
            .iter()
            .map(|(tag, bytes)| (tag.as_str().as_bytes().to_vec(), bytes.clone()))
            .collect();
        self.engines[index as usize].write_batch(&items, sync)
    }

    /// Reads back every recognized type-tagged blob for database
    /// `index`. An unrecognized tag fails the restore (spec.md §4.4).
    pub fn load(&self, index: u8) -> PicoResult<Vec<(TypeTag, Vec<u8>)>> {
        let mut out = Vec::new();
        for (key, value) in self.engines[index as usize].iterate()? {
            let tag_str = String::from_utf8_lossy(&key);
            let tag = TypeTag::from_str(&tag_str).ok_or(crate::error::PicoError::Protocol)?;
            out.push((tag, value));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persist_then_load_round_trips_per_db() {
        let dir = tempfile::tempdir().unwrap();
        let engine = PersistenceEngine::open(dir.path(), 2).unwrap();
        engine
            .persist(0, &[(TypeTag::String, b"db0-strings".to_vec())], true)
            .unwrap();
        engine
            .persist(1, &[(TypeTag::String, b"db1-strings".to_vec())], true)
            .unwrap();

        let loaded0 = engine.load(0).unwrap();
        assert_eq!(loaded0, vec![(TypeTag::String, b"db0-strings".to_vec())]);
        let loaded1 = engine.load(1).unwrap();
        assert_eq!(loaded1, vec![(TypeTag::String, b"db1-strings".to_vec())]);
    }
}
