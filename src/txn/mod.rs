//! Transaction id assignment and the MVCC visibility predicate.
//!
//! There is no snapshot: a reader's visibility check runs against whatever
//! the transaction table says *right now*, not against a snapshot taken at
//! `begin`. A transaction that commits while another is mid-scan can become
//! visible to it partway through. This is documented (not hidden) as
//! weaker-than-snapshot-isolation.

use crate::constants::{MAX_TXN_SLOTS, NO_TXN_ID};
use crate::error::{DbError, DbResult};
use crate::heap::TupleHeader;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnState {
    Active,
    Committed,
    Aborted,
}

struct Inner {
    next_txn_id: u64,
    states: HashMap<u64, TxnState>,
    /// Count of `Active` entries in `states`; bounds concurrency, not the
    /// lifetime total (committed/aborted entries are kept forever so older
    /// tuples stay resolvable).
    active_count: usize,
}

pub struct TransactionManager {
    inner: Mutex<Inner>,
}

impl TransactionManager {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_txn_id: NO_TXN_ID + 1,
                states: HashMap::new(),
                active_count: 0,
            }),
        }
    }

    pub fn begin(&self) -> DbResult<u64> {
        let mut inner = self.inner.lock().unwrap();
        if inner.active_count >= MAX_TXN_SLOTS {
            return Err(DbError::ResourceExhausted);
        }
        let txn_id = inner.next_txn_id;
        inner.next_txn_id += 1;
        inner.states.insert(txn_id, TxnState::Active);
        inner.active_count += 1;
        Ok(txn_id)
    }

    pub fn commit(&self, txn_id: u64) -> DbResult<()> {
        self.transition(txn_id, TxnState::Committed)
    }

    pub fn abort(&self, txn_id: u64) -> DbResult<()> {
        self.transition(txn_id, TxnState::Aborted)
    }

    fn transition(&self, txn_id: u64, to: TxnState) -> DbResult<()> {
        let mut inner = self.inner.lock().unwrap();
        match inner.states.get(&txn_id) {
            Some(TxnState::Active) => {
                inner.states.insert(txn_id, to);
                inner.active_count -= 1;
                Ok(())
            }
            Some(_) => Err(DbError::BadTransactionState),
            None => Err(DbError::NoActiveTransaction),
        }
    }

    pub fn state(&self, txn_id: u64) -> DbResult<TxnState> {
        let inner = self.inner.lock().unwrap();
        inner
            .states
            .get(&txn_id)
            .copied()
            .ok_or_else(|| DbError::Other(format!("unknown transaction id {txn_id}")))
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new()
    }
}

/// A tuple version is visible to `viewer_txn_id` iff its creator is
/// committed (or is the viewer itself, for reading its own uncommitted
/// writes) and it has not been deleted by a transaction other than a still
/// non-committed one.
pub fn mvcc_is_visible(
    header: &TupleHeader,
    viewer_txn_id: u64,
    txn_mgr: &TransactionManager,
) -> DbResult<bool> {
    let created_visible = header.xmin == viewer_txn_id
        || (header.xmin <= viewer_txn_id && txn_mgr.state(header.xmin)? == TxnState::Committed);
    if !created_visible {
        return Ok(false);
    }

    if header.xmax == NO_TXN_ID {
        return Ok(true);
    }
    if header.xmax > viewer_txn_id {
        return Ok(true);
    }
    if header.xmax == viewer_txn_id {
        return Ok(false);
    }
    Ok(txn_mgr.state(header.xmax)? != TxnState::Committed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(xmin: u64, xmax: u64) -> TupleHeader {
        TupleHeader {
            xmin,
            xmax,
            is_deleted: xmax != NO_TXN_ID,
        }
    }

    #[test]
    fn begin_assigns_increasing_ids() {
        let mgr = TransactionManager::new();
        let a = mgr.begin().unwrap();
        let b = mgr.begin().unwrap();
        assert!(b > a);
    }

    #[test]
    fn own_uncommitted_insert_is_visible_to_self() {
        let mgr = TransactionManager::new();
        let t1 = mgr.begin().unwrap();
        assert!(mvcc_is_visible(&header(t1, NO_TXN_ID), t1, &mgr).unwrap());
    }

    #[test]
    fn uncommitted_insert_is_invisible_to_others() {
        let mgr = TransactionManager::new();
        let t1 = mgr.begin().unwrap();
        let t2 = mgr.begin().unwrap();
        assert!(!mvcc_is_visible(&header(t1, NO_TXN_ID), t2, &mgr).unwrap());
    }

    #[test]
    fn committed_insert_is_visible_to_others() {
        let mgr = TransactionManager::new();
        let t1 = mgr.begin().unwrap();
        let t2 = mgr.begin().unwrap();
        mgr.commit(t1).unwrap();
        assert!(mvcc_is_visible(&header(t1, NO_TXN_ID), t2, &mgr).unwrap());
    }

    #[test]
    fn aborted_insert_stays_invisible() {
        let mgr = TransactionManager::new();
        let t1 = mgr.begin().unwrap();
        let t2 = mgr.begin().unwrap();
        mgr.abort(t1).unwrap();
        assert!(!mvcc_is_visible(&header(t1, NO_TXN_ID), t2, &mgr).unwrap());
    }

    #[test]
    fn committed_delete_hides_the_tuple() {
        let mgr = TransactionManager::new();
        let t1 = mgr.begin().unwrap();
        mgr.commit(t1).unwrap();
        let t2 = mgr.begin().unwrap();
        mgr.commit(t2).unwrap();
        let t3 = mgr.begin().unwrap();
        assert!(!mvcc_is_visible(&header(t1, t2), t3, &mgr).unwrap());
    }

    #[test]
    fn uncommitted_delete_keeps_tuple_visible_to_others() {
        let mgr = TransactionManager::new();
        let t1 = mgr.begin().unwrap();
        mgr.commit(t1).unwrap();
        let deleter = mgr.begin().unwrap();
        let reader = mgr.begin().unwrap();
        assert!(mvcc_is_visible(&header(t1, deleter), reader, &mgr).unwrap());
    }

    #[test]
    fn own_delete_is_invisible_to_self() {
        let mgr = TransactionManager::new();
        let t1 = mgr.begin().unwrap();
        mgr.commit(t1).unwrap();
        let deleter = mgr.begin().unwrap();
        assert!(!mvcc_is_visible(&header(t1, deleter), deleter, &mgr).unwrap());
    }

    #[test]
    fn later_committed_insert_is_invisible_to_earlier_viewer() {
        let mgr = TransactionManager::new();
        let reader = mgr.begin().unwrap();
        let t2 = mgr.begin().unwrap();
        mgr.commit(t2).unwrap();
        assert!(!mvcc_is_visible(&header(t2, NO_TXN_ID), reader, &mgr).unwrap());
    }

    #[test]
    fn later_delete_is_unconditionally_visible_to_earlier_viewer() {
        let mgr = TransactionManager::new();
        let t1 = mgr.begin().unwrap();
        mgr.commit(t1).unwrap();
        let reader = mgr.begin().unwrap();
        let deleter = mgr.begin().unwrap();
        mgr.commit(deleter).unwrap();
        assert!(mvcc_is_visible(&header(t1, deleter), reader, &mgr).unwrap());
    }

    #[test]
    fn double_commit_is_bad_state() {
        let mgr = TransactionManager::new();
        let t1 = mgr.begin().unwrap();
        mgr.commit(t1).unwrap();
        assert!(matches!(mgr.commit(t1), Err(DbError::BadTransactionState)));
    }

    #[test]
    fn unknown_txn_commit_is_no_active_transaction() {
        let mgr = TransactionManager::new();
        assert!(matches!(mgr.commit(999), Err(DbError::NoActiveTransaction)));
    }
}
