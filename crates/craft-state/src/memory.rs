use std::collections::BTreeMap;

use crate::address::Address;
use crate::error::StateError;
use crate::provider::{StateReader, StateWriter};

/// In-memory state provider for tests, local demos, and embedding.
///
/// Mirrors the atomic-commit contract of the real ledger runtime: a
/// [`StateTransaction`] stages writes in an overlay; reads through the
/// overlay see the transaction's own staged writes; `commit()` folds the
/// overlay into the committed map and dropping without commit discards it.
#[derive(Default)]
pub struct MemoryStateStore {
    committed: BTreeMap<Address, Vec<u8>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a transaction-scoped view over the store.
    pub fn transaction(&mut self) -> StateTransaction<'_> {
        StateTransaction {
            store: self,
            staged: BTreeMap::new(),
        }
    }

    /// Read committed state directly (what a subsequent transaction sees).
    pub fn get(&self, address: &Address) -> Option<&[u8]> {
        self.committed.get(address).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }
}

impl StateReader for MemoryStateStore {
    fn read(&self, addresses: &[Address]) -> Result<BTreeMap<Address, Vec<u8>>, StateError> {
        let mut found = BTreeMap::new();
        for address in addresses {
            if let Some(bytes) = self.committed.get(address) {
                found.insert(address.clone(), bytes.clone());
            }
        }
        Ok(found)
    }
}

/// One transaction's staged view of a [`MemoryStateStore`].
pub struct StateTransaction<'a> {
    store: &'a mut MemoryStateStore,
    staged: BTreeMap<Address, Vec<u8>>,
}

impl StateTransaction<'_> {
    /// Make every staged write visible to later transactions.
    pub fn commit(self) {
        self.store.committed.extend(self.staged);
    }

    /// Number of addresses staged so far.
    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }
}

impl StateReader for StateTransaction<'_> {
    fn read(&self, addresses: &[Address]) -> Result<BTreeMap<Address, Vec<u8>>, StateError> {
        let mut found = BTreeMap::new();
        for address in addresses {
            if let Some(bytes) = self
                .staged
                .get(address)
                .or_else(|| self.store.committed.get(address))
            {
                found.insert(address.clone(), bytes.clone());
            }
        }
        Ok(found)
    }
}

impl StateWriter for StateTransaction<'_> {
    fn write(&mut self, entries: BTreeMap<Address, Vec<u8>>) -> Result<(), StateError> {
        self.staged.extend(entries);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::asset_address;

    fn entries(address: &Address, bytes: &[u8]) -> BTreeMap<Address, Vec<u8>> {
        let mut map = BTreeMap::new();
        map.insert(address.clone(), bytes.to_vec());
        map
    }

    #[test]
    fn committed_writes_are_visible_to_later_reads() {
        let mut store = MemoryStateStore::new();
        let addr = asset_address("uid-1");

        let mut txn = store.transaction();
        txn.write(entries(&addr, b"payload")).unwrap();
        txn.commit();

        assert_eq!(store.get(&addr), Some(&b"payload"[..]));
    }

    #[test]
    fn dropped_transaction_discards_staged_writes() {
        let mut store = MemoryStateStore::new();
        let addr = asset_address("uid-1");

        {
            let mut txn = store.transaction();
            txn.write(entries(&addr, b"payload")).unwrap();
            // dropped without commit
        }

        assert_eq!(store.get(&addr), None);
    }

    #[test]
    fn transaction_reads_see_own_staged_writes() {
        let mut store = MemoryStateStore::new();
        let addr = asset_address("uid-1");

        let mut txn = store.transaction();
        txn.write(entries(&addr, b"staged")).unwrap();
        let read = txn.read(&[addr.clone()]).unwrap();
        assert_eq!(read.get(&addr).map(Vec::as_slice), Some(&b"staged"[..]));
    }

    #[test]
    fn staged_writes_shadow_committed_values() {
        let mut store = MemoryStateStore::new();
        let addr = asset_address("uid-1");

        let mut txn = store.transaction();
        txn.write(entries(&addr, b"v1")).unwrap();
        txn.commit();

        let mut txn = store.transaction();
        txn.write(entries(&addr, b"v2")).unwrap();
        let read = txn.read(&[addr.clone()]).unwrap();
        assert_eq!(read.get(&addr).map(Vec::as_slice), Some(&b"v2"[..]));
    }

    #[test]
    fn absent_addresses_are_missing_from_the_result() {
        let store = MemoryStateStore::new();
        let read = store.read(&[asset_address("missing")]).unwrap();
        assert!(read.is_empty());
    }
}
