use std::collections::BTreeMap;

use crate::{LocalStore, StoreResult};

/// In-memory `LocalStore`, used in tests and for nodes that never enable a
/// durable backend. Iteration order is irrelevant to merge semantics, but a
/// `BTreeMap` makes `scan()` output deterministic, which is convenient for
/// tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: BTreeMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryStore {
    fn put(&mut self, key: &str, value: Vec<u8>) -> StoreResult<()> {
        self.data.insert(key.to_string(), value);
        Ok(())
    }

    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.data.get(key).cloned())
    }

    fn delete(&mut self, key: &str) -> StoreResult<()> {
        self.data.remove(key);
        Ok(())
    }

    fn scan(&self) -> StoreResult<Vec<(String, Vec<u8>)>> {
        Ok(self
            .data
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_missing_key_is_not_an_error() {
        let mut store = MemoryStore::new();
        store.delete("absent").unwrap();
    }

    #[test]
    fn put_get_roundtrip() {
        let mut store = MemoryStore::new();
        store.put("a", vec![1, 2, 3]).unwrap();
        assert_eq!(store.get("a").unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(store.get("b").unwrap(), None);
    }

    #[test]
    fn scan_reflects_current_state() {
        let mut store = MemoryStore::new();
        store.put("a", vec![1]).unwrap();
        store.put("b", vec![2]).unwrap();
        store.delete("a").unwrap();
        assert_eq!(store.scan().unwrap(), vec![("b".to_string(), vec![2])]);
    }
}
