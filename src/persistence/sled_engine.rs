//! `sled`-backed [`KvEngine`]: the one module in the persistence layer
//! allowed to mention `sled`.

use super::KvEngine;
use crate::error::PicoResult;

pub struct SledEngine {
    db: sled::Db,
}

impl SledEngine {
    pub fn open(path: &std::path::Path) -> PicoResult<Self> {
        let db = sled::open(path)?;
        Ok(SledEngine { db })
    }
}

impl KvEngine for SledEngine {
    fn put(&self, key: &[u8], value: &[u8]) -> PicoResult<()> {
        self.db.insert(key, value)?;
        Ok(())
    }

    fn get(&self, key: &[u8]) -> PicoResult<Option<Vec<u8>>> {
        Ok(self.db.get(key)?.map(|v| v.to_vec()))
    }

    fn iterate(&self) -> PicoResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut out = Vec::new();
        for item in self.db.iter() {
            let (k, v) = item?;
            out.push((k.to_vec(), v.to_vec()));
        }
        Ok(out)
    }

    fn write_batch(&self, items: &[(Vec<u8>, Vec<u8>)], sync: bool) -> PicoResult<()> {
        let mut batch = sled::Batch::default();
        for (k, v) in items {
            batch.insert(k.clone(), v.clone());
        }
        self.db.apply_batch(batch)?;
        if sync {
            self.db.flush()?;
        }
        Ok(())
    }
}
