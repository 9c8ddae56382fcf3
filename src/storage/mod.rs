pub mod buffer_pool;
pub mod pager;

pub use buffer_pool::{BufferPool, PageGuard};
pub use pager::Pager;
