//! `Database`: the single owning handle over one data file. Everything
//! else (catalog, buffer pool, transaction manager, per-table locks) hangs
//! off this handle behind `Arc`s, so it is `Clone` and safe to share across
//! threads.

use crate::catalog::Catalog;
use crate::constants::NULL_PAGE_ID;
use crate::error::{DbError, DbResult};
use crate::schema::TableSchema;
use crate::storage::{BufferPool, Pager};
use crate::table::Table;
use crate::txn::TransactionManager;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct Database {
    bp: BufferPool,
    catalog: Arc<Catalog>,
    txn_mgr: Arc<TransactionManager>,
    write_locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        let pager = Pager::open(path)?;
        let bp = BufferPool::new(pager);
        let catalog = Arc::new(Catalog::load(bp.clone())?);
        Ok(Self {
            bp,
            catalog,
            txn_mgr: Arc::new(TransactionManager::new()),
            write_locks: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    pub fn begin(&self) -> DbResult<u64> {
        self.txn_mgr.begin()
    }

    pub fn commit(&self, txn_id: u64) -> DbResult<()> {
        self.txn_mgr.commit(txn_id)
    }

    pub fn abort(&self, txn_id: u64) -> DbResult<()> {
        self.txn_mgr.abort(txn_id)
    }

    /// Creates a table. Tables with a primary-key column get a B+-tree
    /// root allocated and indexed; tables without one (spec.md §3: "may be
    /// inserted into but are not indexed for lookup") are left with
    /// `root_page_id == NULL_PAGE_ID` and are heap-only.
    pub fn create_table(&self, schema: TableSchema) -> DbResult<()> {
        let name = schema.name.clone();
        let has_pk = schema.primary_key_index().is_some();
        self.catalog.create_table(schema)?;

        if has_pk {
            let root_page_id = self.catalog.allocate_page()?;
            crate::btree::BTree::new_empty_leaf(&self.bp, root_page_id)?;
            self.catalog.set_root_page_id(&name, root_page_id)?;
            debug_assert_ne!(root_page_id, NULL_PAGE_ID);
        }
        Ok(())
    }

    pub fn table(&self, name: &str) -> DbResult<Table> {
        // Touch the catalog first so callers get `NotFound` for an unknown
        // table instead of silently acquiring a lock for it.
        self.catalog.table_schema(name)?;
        let write_lock = {
            let mut locks = self.write_locks.lock().unwrap();
            Arc::clone(
                locks
                    .entry(name.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };
        Ok(Table::new(
            self.bp.clone(),
            Arc::clone(&self.catalog),
            Arc::clone(&self.txn_mgr),
            write_lock,
            name.to_string(),
        ))
    }

    pub fn table_names(&self) -> Vec<String> {
        self.catalog.table_names()
    }

    /// Flushes every dirty page and fsyncs. The engine's only durability
    /// boundary; there is no write-ahead log.
    pub fn checkpoint(&self) -> DbResult<()> {
        self.bp.checkpoint()
    }
}
