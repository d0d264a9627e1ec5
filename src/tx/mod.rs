//! Explicit, scoped transaction guard.
//!
//! A single-writer model: at most one transaction is active on a [`Store`]
//! at a time. [`Store::transaction`] (the closure form) is the preferred
//! entry point; this module backs the explicit guard form for callers who
//! need to span multiple statements before deciding to commit.

use crate::store::{Snapshot, Store};
use crate::{Error, Result};

/// An in-progress transaction. Rolls back automatically on `Drop` unless
/// `commit()` or `rollback()` was called.
pub struct TransactionGuard<'s> {
    store: &'s mut Store,
    snapshot: Option<Snapshot>,
    finished: bool,
}

impl<'s> TransactionGuard<'s> {
    pub(crate) fn begin(store: &'s mut Store) -> Result<Self> {
        if store.is_tx_active() {
            return Err(Error::NestedTransaction);
        }
        store.set_tx_active(true);
        let snapshot = store.snapshot();
        Ok(Self { store, snapshot: Some(snapshot), finished: false })
    }

    /// Access the store mutably within the transaction.
    pub fn store(&mut self) -> &mut Store {
        self.store
    }

    /// Discards the snapshot and keeps all mutations made so far.
    pub fn commit(mut self) -> Result<()> {
        self.finished = true;
        self.store.set_tx_active(false);
        Ok(())
    }

    /// Restores the store to the state it had when the transaction began.
    pub fn rollback(mut self) -> Result<()> {
        let snapshot = self.snapshot.take().expect("snapshot present until finished");
        self.store.restore(snapshot);
        self.finished = true;
        self.store.set_tx_active(false);
        Ok(())
    }
}

impl Drop for TransactionGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Some(snapshot) = self.snapshot.take() {
            self.store.restore(snapshot);
        }
        self.store.set_tx_active(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PropertyMap;

    #[test]
    fn commit_keeps_mutations() {
        let mut store = Store::new();
        {
            let mut guard = store.begin_transaction().unwrap();
            guard.store().create_node(vec![], PropertyMap::new(), None).unwrap();
            guard.commit().unwrap();
        }
        assert_eq!(store.node_count(), 1);
    }

    #[test]
    fn drop_without_commit_rolls_back() {
        let mut store = Store::new();
        {
            let mut guard = store.begin_transaction().unwrap();
            guard.store().create_node(vec![], PropertyMap::new(), None).unwrap();
        }
        assert_eq!(store.node_count(), 0);
    }

    #[test]
    fn explicit_rollback_undoes_mutations() {
        let mut store = Store::new();
        let mut guard = store.begin_transaction().unwrap();
        guard.store().create_node(vec![], PropertyMap::new(), None).unwrap();
        guard.rollback().unwrap();
        assert_eq!(store.node_count(), 0);
    }

}
