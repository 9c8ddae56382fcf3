pub mod node;
pub mod tree;

pub use node::BTreeNode;
pub use tree::{scan_all, search, BTree, InsertOutcome};

use crate::error::DbError;

#[derive(Debug)]
pub enum BTreeError {
    DuplicateKey,
    InvalidPageType,
    Db(DbError),
}

impl From<DbError> for BTreeError {
    fn from(err: DbError) -> Self {
        BTreeError::Db(err)
    }
}

impl From<BTreeError> for DbError {
    fn from(err: BTreeError) -> Self {
        match err {
            BTreeError::DuplicateKey => DbError::DuplicateKey,
            BTreeError::InvalidPageType => DbError::Other("invalid b+-tree page type".into()),
            BTreeError::Db(e) => e,
        }
    }
}
