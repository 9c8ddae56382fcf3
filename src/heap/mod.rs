pub mod tuple;

pub use tuple::{Tuple, TupleHeader};

use crate::constants::{NULL_PAGE_ID, PAGE_SIZE};
use crate::error::{DbError, DbResult};
use crate::schema::TableSchema;
use crate::storage::BufferPool;
use crate::value::Value;

/// `tuple_count:i32` header followed by fixed-size tuple records, written in
/// append order. Deletion stamps the record's header in place; it never
/// compacts the page.
struct HeapPage;

impl HeapPage {
    const COUNT_OFFSET: usize = 0;
    const RECORDS_OFFSET: usize = 4;

    fn capacity(record_size: usize) -> usize {
        (PAGE_SIZE - Self::RECORDS_OFFSET) / record_size
    }

    fn slot_offset(slot: u32, record_size: usize) -> usize {
        Self::RECORDS_OFFSET + slot as usize * record_size
    }
}

/// Allocates a fresh heap page and writes `values` at slot 0, stamping the
/// tuple header for an insert by `txn_id`. Every INSERT gets its own page
/// (spec.md's documented space trade-off); `PageFull` exists only as a
/// forward-compatible bound should that ever change.
pub fn insert_tuple(
    bp: &BufferPool,
    catalog_allocate_page: impl FnOnce() -> DbResult<u64>,
    schema: &TableSchema,
    values: Vec<Value>,
    txn_id: u64,
) -> DbResult<(u64, u32)> {
    if values.len() != schema.columns.len() {
        return Err(DbError::Other(format!(
            "expected {} column values, got {}",
            schema.columns.len(),
            values.len()
        )));
    }

    let record_size = schema.tuple_record_size();
    if HeapPage::capacity(record_size) == 0 {
        return Err(DbError::PageFull);
    }

    let tuple = Tuple {
        header: TupleHeader {
            xmin: txn_id,
            xmax: 0,
            is_deleted: false,
        },
        values,
    };
    let record = tuple.encode(record_size)?;

    let page_id = catalog_allocate_page()?;
    let guard = bp.get_page(page_id)?;
    guard.with_bytes_mut(|buf| {
        buf[HeapPage::COUNT_OFFSET..HeapPage::COUNT_OFFSET + 4].copy_from_slice(&1i32.to_le_bytes());
        let off = HeapPage::slot_offset(0, record_size);
        buf[off..off + record.len()].copy_from_slice(&record);
    });

    Ok((page_id, 0))
}

/// Loads the tuple at `(page_id, slot)`, bounds-checking the slot against
/// the page's `tuple_count`.
pub fn load_tuple(
    bp: &BufferPool,
    schema: &TableSchema,
    page_id: u64,
    slot: u32,
) -> DbResult<Tuple> {
    if page_id == NULL_PAGE_ID {
        return Err(DbError::NotFound);
    }
    let record_size = schema.tuple_record_size();
    let guard = bp.get_page(page_id)?;
    guard.with_bytes(|buf| {
        let count = i32::from_le_bytes(
            buf[HeapPage::COUNT_OFFSET..HeapPage::COUNT_OFFSET + 4]
                .try_into()
                .unwrap(),
        );
        if slot as i32 >= count {
            return Err(DbError::NotFound);
        }
        let off = HeapPage::slot_offset(slot, record_size);
        Tuple::decode(&buf[off..off + record_size], schema.columns.len())
    })
}

/// Stamps `xmax` and `is_deleted` on the tuple at `(page_id, slot)` in
/// place. The B+-tree entry is left untouched (index deletion is a
/// documented Non-goal).
pub fn delete_tuple(
    bp: &BufferPool,
    schema: &TableSchema,
    page_id: u64,
    slot: u32,
    txn_id: u64,
) -> DbResult<()> {
    let record_size = schema.tuple_record_size();
    let guard = bp.get_page(page_id)?;
    guard.with_bytes_mut(|buf| -> DbResult<()> {
        let count = i32::from_le_bytes(
            buf[HeapPage::COUNT_OFFSET..HeapPage::COUNT_OFFSET + 4]
                .try_into()
                .unwrap(),
        );
        if slot as i32 >= count {
            return Err(DbError::NotFound);
        }
        let off = HeapPage::slot_offset(slot, record_size);
        let mut tuple = Tuple::decode(&buf[off..off + record_size], schema.columns.len())?;
        tuple.header.xmax = txn_id;
        tuple.header.is_deleted = true;
        let record = tuple.encode(record_size)?;
        buf[off..off + record.len()].copy_from_slice(&record);
        Ok(())
    })
}
