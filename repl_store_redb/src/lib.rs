//! `LocalStore` backed by a single [`redb`] table.
//!
//! Nodes carry no durable state — restarts lose unreplicated records — so
//! this adapter opens redb against an in-memory backend rather than a file
//! path. The table/transaction shape otherwise follows
//! `s5-dev-s5-rs/registries/redb`.

use std::sync::Arc;

use redb::backends::InMemoryBackend;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use repl_store::{LocalStore, StoreError, StoreResult};

const TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("records");

pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Opens an in-memory redb database with the `records` table created.
    pub fn open_in_memory() -> anyhow::Result<Self> {
        let db = Database::builder().create_with_backend(InMemoryBackend::new())?;

        // Ensure the table exists before the first read, same rationale as
        // `RedbRegistry::open`.
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl LocalStore for RedbStore {
    fn put(&mut self, key: &str, value: Vec<u8>) -> StoreResult<()> {
        (|| -> anyhow::Result<()> {
            let write_txn = self.db.begin_write()?;
            {
                let mut table = write_txn.open_table(TABLE)?;
                table.insert(key, value.as_slice())?;
            }
            write_txn.commit()?;
            Ok(())
        })()
        .map_err(StoreError::Backend)
    }

    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        (|| -> anyhow::Result<Option<Vec<u8>>> {
            let read_txn = self.db.begin_read()?;
            let table = read_txn.open_table(TABLE)?;
            Ok(table.get(key)?.map(|guard| guard.value().to_vec()))
        })()
        .map_err(StoreError::Backend)
    }

    fn delete(&mut self, key: &str) -> StoreResult<()> {
        (|| -> anyhow::Result<()> {
            let write_txn = self.db.begin_write()?;
            {
                let mut table = write_txn.open_table(TABLE)?;
                table.remove(key)?;
            }
            write_txn.commit()?;
            Ok(())
        })()
        .map_err(StoreError::Backend)
    }

    fn scan(&self) -> StoreResult<Vec<(String, Vec<u8>)>> {
        (|| -> anyhow::Result<Vec<(String, Vec<u8>)>> {
            let read_txn = self.db.begin_read()?;
            let table = read_txn.open_table(TABLE)?;
            let mut out = Vec::new();
            for entry in table.iter()? {
                let (k, v) = entry?;
                out.push((k.value().to_string(), v.value().to_vec()));
            }
            Ok(out)
        })()
        .map_err(StoreError::Backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_delete_scan() {
        let mut store = RedbStore::open_in_memory().unwrap();
        store.put("a", vec![1, 2, 3]).unwrap();
        store.put("b", vec![4]).unwrap();
        assert_eq!(store.get("a").unwrap(), Some(vec![1, 2, 3]));

        store.delete("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
        // deleting again is not an error
        store.delete("a").unwrap();

        let scanned = store.scan().unwrap();
        assert_eq!(scanned, vec![("b".to_string(), vec![4])]);
    }
}
