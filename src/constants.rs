//! Fixed sizes that define the on-disk format. Changing any of these
//! invalidates existing database files.

/// Size in bytes of every page, including page 1 (metadata).
pub const PAGE_SIZE: usize = 4096;

/// Page ids are 1-based; page 0 never refers to a real page.
pub const NULL_PAGE_ID: u64 = 0;

/// Page 1 is always the metadata page.
pub const METADATA_PAGE_ID: u64 = 1;

/// Number of frames held by the buffer pool.
pub const FRAME_COUNT: usize = 256;

/// Maximum children per internal B+-tree node (order 49 => 48 keys).
pub const BTREE_ORDER: usize = 49;
pub const BTREE_MAX_KEYS: usize = BTREE_ORDER - 1;

/// Every Value, whether a B+-tree key or a tuple column, is serialized into
/// this many bytes: a one-byte tag followed by a fixed-width payload,
/// zero-padded. This keeps node and tuple record offsets independent of the
/// runtime size of any single value.
pub const VALUE_ENCODED_SIZE: usize = 72;

/// Longest a Varchar value may be.
pub const MAX_VARCHAR_LEN: usize = 64;

/// Longest a column or table name may be.
pub const MAX_COLUMN_NAME: usize = 32;
pub const MAX_TABLE_NAME: usize = 64;

/// Columns per table.
pub const MAX_COLUMNS: usize = 8;

/// On-disk size of one ColumnDef record in the catalog.
pub const COLUMN_DEF_SIZE: usize = MAX_COLUMN_NAME + 1 + 2 + 1; // name + tag + size + pk flag

/// On-disk size of one TableSchema record in the catalog.
pub const TABLE_SCHEMA_SIZE: usize =
    MAX_TABLE_NAME + 1 + MAX_COLUMNS * COLUMN_DEF_SIZE + 8; // name + col_count + columns + root_page_id

/// Catalog header (schema_count + next_page_id) plus the schema array must
/// fit in one page.
pub const METADATA_HEADER_SIZE: usize = 4 + 4;

/// Capped at 9 per the on-disk format, with room to spare in page 1
/// (9 * TABLE_SCHEMA_SIZE + METADATA_HEADER_SIZE <= PAGE_SIZE).
pub const MAX_TABLES: usize = 9;

/// Tuple header: xmin(8) + xmax(8) + is_deleted(1).
pub const TUPLE_HEADER_SIZE: usize = 8 + 8 + 1;

/// Transaction slots.
pub const MAX_TXN_SLOTS: usize = 1024;

/// A transaction id of zero means "no transaction".
pub const NO_TXN_ID: u64 = 0;
