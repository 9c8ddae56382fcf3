//! The catalog owns the metadata page (page 1): the schema list and the
//! next-page-id counter. It is the one place that hands out fresh page ids,
//! so its internal lock doubles as the "allocate_page is atomic" guarantee
//! spec.md describes.

use crate::constants::{MAX_TABLES, METADATA_PAGE_ID, NULL_PAGE_ID, PAGE_SIZE};
use crate::error::{DbError, DbResult};
use crate::schema::TableSchema;
use crate::storage::BufferPool;
use std::sync::Mutex;

struct CatalogState {
    schemas: Vec<TableSchema>,
    next_page_id: u64,
}

pub struct Catalog {
    bp: BufferPool,
    state: Mutex<CatalogState>,
}

impl Catalog {
    /// Reads page 1. An empty file (short read, surfaced by the buffer pool
    /// as a zero-filled page) means a brand-new database: start with zero
    /// tables and the first free page after the metadata page itself.
    pub fn load(bp: BufferPool) -> DbResult<Self> {
        let guard = bp.get_page(METADATA_PAGE_ID)?;
        let (schema_count, next_page_id, schemas) = guard.with_bytes(|buf| decode_metadata(buf));

        let state = if schema_count == 0 && next_page_id == 0 {
            guard.with_bytes_mut(|buf| encode_metadata(buf, 0, METADATA_PAGE_ID + 1, &[]))?;
            CatalogState {
                schemas: Vec::new(),
                next_page_id: METADATA_PAGE_ID + 1,
            }
        } else {
            CatalogState {
                schemas: schemas?,
                next_page_id,
            }
        };

        Ok(Self {
            bp,
            state: Mutex::new(state),
        })
    }

    fn save(&self, state: &CatalogState) -> DbResult<()> {
        // Encode into a scratch page first so a mid-encode failure (e.g. a
        // schema that no longer fits) can never leave page 1 half-written.
        let mut scratch = [0u8; PAGE_SIZE];
        encode_metadata(
            &mut scratch,
            state.schemas.len() as u32,
            state.next_page_id,
            &state.schemas,
        )?;

        let guard = self.bp.get_page(METADATA_PAGE_ID)?;
        guard.with_bytes_mut(|buf| *buf = scratch);
        Ok(())
    }

    /// Bumps `next_page_id` and returns the id that was just reserved. The
    /// page itself is not written to disk here; the caller's next
    /// `BufferPool::get_page` on that id will see a short read and zero-fill it.
    pub fn allocate_page(&self) -> DbResult<u64> {
        let mut state = self.state.lock().unwrap();
        let page_id = state.next_page_id;
        state.next_page_id += 1;
        self.save(&state)?;
        Ok(page_id)
    }

    pub fn create_table(&self, schema: TableSchema) -> DbResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.schemas.iter().any(|s| s.name == schema.name) {
            return Err(DbError::DuplicateTable);
        }
        if state.schemas.len() >= MAX_TABLES {
            return Err(DbError::CatalogFull);
        }
        state.schemas.push(schema);
        self.save(&state)
    }

    pub fn table_schema(&self, name: &str) -> DbResult<TableSchema> {
        let state = self.state.lock().unwrap();
        state
            .schemas
            .iter()
            .find(|s| s.name == name)
            .cloned()
            .ok_or(DbError::NotFound)
    }

    pub fn set_root_page_id(&self, name: &str, root_page_id: u64) -> DbResult<()> {
        let mut state = self.state.lock().unwrap();
        let schema = state
            .schemas
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or(DbError::NotFound)?;
        schema.root_page_id = root_page_id;
        self.save(&state)
    }

    pub fn table_names(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.schemas.iter().map(|s| s.name.clone()).collect()
    }
}

fn encode_metadata(
    buf: &mut [u8; PAGE_SIZE],
    schema_count: u32,
    next_page_id: u64,
    schemas: &[TableSchema],
) -> DbResult<()> {
    buf.fill(0);
    buf[0..4].copy_from_slice(&schema_count.to_le_bytes());
    // next_page_id is logically u32 per spec.md's layout note, but the
    // engine's page ids are u64 internally; store the full width.
    buf[4..12].copy_from_slice(&next_page_id.to_le_bytes());

    let mut offset = 12;
    for schema in schemas {
        let encoded = schema.encode()?;
        buf[offset..offset + encoded.len()].copy_from_slice(&encoded);
        offset += encoded.len();
    }
    Ok(())
}

fn decode_metadata(buf: &[u8; PAGE_SIZE]) -> (u32, u64, DbResult<Vec<TableSchema>>) {
    let schema_count = u32::from_le_bytes(buf[0..4].try_into().unwrap());
    let next_page_id = u64::from_le_bytes(buf[4..12].try_into().unwrap());

    if schema_count == 0 && next_page_id == 0 {
        return (0, 0, Ok(Vec::new()));
    }

    let mut schemas = Vec::with_capacity(schema_count as usize);
    let mut offset = 12;
    for _ in 0..schema_count {
        match TableSchema::decode(&buf[offset..offset + crate::constants::TABLE_SCHEMA_SIZE]) {
            Ok(schema) => schemas.push(schema),
            Err(e) => return (schema_count, next_page_id, Err(e)),
        }
        offset += crate::constants::TABLE_SCHEMA_SIZE;
    }
    (schema_count, next_page_id, Ok(schemas))
}

/// A table schema's root is `NULL_PAGE_ID` until `create_table` allocates
/// and persists an empty B+-tree root for it.
pub fn has_index(schema: &TableSchema) -> bool {
    schema.root_page_id != NULL_PAGE_ID
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Column;
    use crate::storage::Pager;
    use crate::value::ColumnType;
    use tempfile::NamedTempFile;

    fn new_catalog() -> (Catalog, NamedTempFile) {
        let tmp = NamedTempFile::new().unwrap();
        let pager = Pager::open(tmp.path()).unwrap();
        let bp = BufferPool::new(pager);
        (Catalog::load(bp).unwrap(), tmp)
    }

    #[test]
    fn fresh_catalog_has_no_tables() {
        let (catalog, _tmp) = new_catalog();
        assert!(catalog.table_names().is_empty());
        assert_eq!(catalog.allocate_page().unwrap(), 2);
        assert_eq!(catalog.allocate_page().unwrap(), 3);
    }

    #[test]
    fn create_then_find_table() {
        let (catalog, _tmp) = new_catalog();
        let schema = TableSchema::new(
            "users",
            vec![Column::new("id", ColumnType::Int32, true)],
        )
        .unwrap();
        catalog.create_table(schema).unwrap();
        assert!(matches!(
            catalog.create_table(
                TableSchema::new("users", vec![Column::new("id", ColumnType::Int32, true)])
                    .unwrap()
            ),
            Err(DbError::DuplicateTable)
        ));
        let found = catalog.table_schema("users").unwrap();
        assert_eq!(found.name, "users");
    }

    #[test]
    fn catalog_full_after_max_tables() {
        let (catalog, _tmp) = new_catalog();
        for i in 0..MAX_TABLES {
            let schema =
                TableSchema::new(format!("t{i}"), vec![Column::new("id", ColumnType::Int32, true)])
                    .unwrap();
            catalog.create_table(schema).unwrap();
        }
        let overflow =
            TableSchema::new("overflow", vec![Column::new("id", ColumnType::Int32, true)])
                .unwrap();
        assert!(matches!(catalog.create_table(overflow), Err(DbError::CatalogFull)));
    }
}
