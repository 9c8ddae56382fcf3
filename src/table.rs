//! The table facade: wires the catalog, heap, B+-tree index, and
//! transaction manager together into `create_table`/`insert`/`select`/
//! `delete`/`select_all`.

use crate::btree::{BTree, BTreeError, InsertOutcome};
use crate::catalog::Catalog;
use crate::constants::NULL_PAGE_ID;
use crate::error::{DbError, DbResult};
use crate::heap;
use crate::schema::TableSchema;
use crate::storage::BufferPool;
use crate::txn::{mvcc_is_visible, TransactionManager};
use crate::value::Value;
use std::sync::{Arc, Mutex};

/// A handle to one table. Cheap to construct; all durable state lives in
/// the catalog and the pages it tracks.
pub struct Table {
    bp: BufferPool,
    catalog: Arc<Catalog>,
    txn_mgr: Arc<TransactionManager>,
    /// Serializes writers on this table, per spec.md's Design Notes on
    /// concurrent B+-tree mutation ("SHOULD serialize writers per table").
    /// Readers never take it.
    write_lock: Arc<Mutex<()>>,
    name: String,
}

impl Table {
    pub(crate) fn new(
        bp: BufferPool,
        catalog: Arc<Catalog>,
        txn_mgr: Arc<TransactionManager>,
        write_lock: Arc<Mutex<()>>,
        name: String,
    ) -> Self {
        Self {
            bp,
            catalog,
            txn_mgr,
            write_lock,
            name,
        }
    }

    fn schema(&self) -> DbResult<TableSchema> {
        self.catalog.table_schema(&self.name)
    }

    /// Inserts one row, stamping it with `txn_id` as creator. Fails with
    /// `DuplicateKey` if the primary key already exists in the index,
    /// including one inserted by this same transaction but not yet
    /// committed. Tables with no primary-key column (`schema.root_page_id
    /// == NULL_PAGE_ID`) are heap-only: the row is stored but not indexed,
    /// per spec.md §3.
    pub fn insert(&self, txn_id: u64, values: Vec<Value>) -> DbResult<()> {
        let _write_guard = self.write_lock.lock().unwrap();
        let schema = self.schema()?;

        if values.len() != schema.columns.len() {
            return Err(DbError::Other(format!(
                "expected {} column values, got {}",
                schema.columns.len(),
                values.len()
            )));
        }
        let key = schema.primary_key_index().map(|idx| values[idx].clone());

        let catalog_for_heap = Arc::clone(&self.catalog);
        let (page_id, slot) =
            heap::insert_tuple(&self.bp, || catalog_for_heap.allocate_page(), &schema, values, txn_id)?;

        let Some(key) = key else {
            return Ok(());
        };

        let catalog_for_btree = Arc::clone(&self.catalog);
        let mut allocate_page = || catalog_for_btree.allocate_page();
        let outcome = BTree::insert(&self.bp, &mut allocate_page, schema.root_page_id, key, page_id, slot);

        match outcome {
            Ok(InsertOutcome::NoSplit) => Ok(()),
            Ok(InsertOutcome::NewRoot(new_root)) => self.catalog.set_root_page_id(&self.name, new_root),
            Err(BTreeError::DuplicateKey) => Err(DbError::DuplicateKey),
            Err(other) => Err(other.into()),
        }
    }

    /// Point lookup by primary key, visibility-filtered for `txn_id`.
    pub fn select(&self, txn_id: u64, key: &Value) -> DbResult<Option<Vec<Value>>> {
        let schema = self.schema()?;
        if schema.root_page_id == NULL_PAGE_ID {
            return Ok(None);
        }
        let location = BTree::search(&self.bp, schema.root_page_id, key).map_err(DbError::from)?;
        let Some((page_id, slot)) = location else {
            return Ok(None);
        };

        let tuple = heap::load_tuple(&self.bp, &schema, page_id, slot)?;
        if mvcc_is_visible(&tuple.header, txn_id, &self.txn_mgr)? {
            Ok(Some(tuple.values))
        } else {
            Ok(None)
        }
    }

    /// Full scan in primary-key order, visibility-filtered for `txn_id`.
    pub fn select_all(&self, txn_id: u64) -> DbResult<Vec<Vec<Value>>> {
        let schema = self.schema()?;
        if schema.root_page_id == NULL_PAGE_ID {
            return Ok(Vec::new());
        }
        let locations = crate::btree::scan_all(&self.bp, schema.root_page_id).map_err(DbError::from)?;

        let mut rows = Vec::with_capacity(locations.len());
        for (page_id, slot) in locations {
            let tuple = heap::load_tuple(&self.bp, &schema, page_id, slot)?;
            if mvcc_is_visible(&tuple.header, txn_id, &self.txn_mgr)? {
                rows.push(tuple.values);
            }
        }
        Ok(rows)
    }

    /// Deletes the row at `key` by stamping its `xmax`; the index entry is
    /// left in place (see `btree::BTree::delete`). Returns `NotFound` if no
    /// version of the row is currently visible to `txn_id`.
    pub fn delete(&self, txn_id: u64, key: &Value) -> DbResult<()> {
        let _write_guard = self.write_lock.lock().unwrap();
        let schema = self.schema()?;
        if schema.root_page_id == NULL_PAGE_ID {
            return Err(DbError::NotFound);
        }
        let (page_id, slot) = BTree::search(&self.bp, schema.root_page_id, key)
            .map_err(DbError::from)?
            .ok_or(DbError::NotFound)?;

        let tuple = heap::load_tuple(&self.bp, &schema, page_id, slot)?;
        if !mvcc_is_visible(&tuple.header, txn_id, &self.txn_mgr)? {
            return Err(DbError::NotFound);
        }
        heap::delete_tuple(&self.bp, &schema, page_id, slot, txn_id)
    }

    pub fn schema_snapshot(&self) -> DbResult<TableSchema> {
        self.schema()
    }
}
