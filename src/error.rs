//! Crate-wide error type. Each subsystem defines its own small `Debug` enum
//! (see `storage::pager`, `storage::buffer_pool`, `btree`, `heap`, `txn`) and
//! is folded into `DbError` via `From`, the way the teacher crate composes
//! `BTreeError`/`HeapError` out of lower-level fetch/unpin errors.

use std::fmt;

#[derive(Debug)]
pub enum DbError {
    NotFound,
    DuplicateKey,
    DuplicateTable,
    CatalogFull,
    SchemaTooLarge,
    NoActiveTransaction,
    BadTransactionState,
    PageFull,
    NoVictim,
    ShortRead,
    IoFailure(String),
    BadType,
    ResourceExhausted,
    Parse(String),
    Other(String),
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbError::NotFound => write!(f, "not found"),
            DbError::DuplicateKey => write!(f, "duplicate key"),
            DbError::DuplicateTable => write!(f, "table already exists"),
            DbError::CatalogFull => write!(f, "catalog is full"),
            DbError::SchemaTooLarge => write!(f, "schema too large"),
            DbError::NoActiveTransaction => write!(f, "no active transaction"),
            DbError::BadTransactionState => write!(f, "transaction is not active"),
            DbError::PageFull => write!(f, "page is full"),
            DbError::NoVictim => write!(f, "buffer pool exhausted: every frame pinned"),
            DbError::ShortRead => write!(f, "short read from data file"),
            DbError::IoFailure(msg) => write!(f, "I/O failure: {msg}"),
            DbError::BadType => write!(f, "mismatched value types"),
            DbError::ResourceExhausted => write!(f, "no free transaction slots"),
            DbError::Parse(msg) => write!(f, "parse error: {msg}"),
            DbError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for DbError {}

impl From<std::io::Error> for DbError {
    fn from(err: std::io::Error) -> Self {
        DbError::IoFailure(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;
