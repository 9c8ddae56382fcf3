//! Whole-page, page-aligned file I/O. The pager never looks at the bytes it
//! moves; the buffer pool and everything above it owns page layout.

use crate::constants::PAGE_SIZE;
use crate::error::{DbError, DbResult};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

pub struct Pager {
    file: File,
}

impl Pager {
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        Ok(Self { file })
    }

    fn offset_of(page_id: u64) -> u64 {
        debug_assert!(page_id >= 1, "page 0 is the null sentinel, never addressed");
        (page_id - 1) * PAGE_SIZE as u64
    }

    /// Reads exactly `PAGE_SIZE` bytes for `page_id` into `out`. Fails with
    /// `ShortRead` if the file doesn't yet extend that far.
    pub fn read_page(&mut self, page_id: u64, out: &mut [u8; PAGE_SIZE]) -> DbResult<()> {
        self.file.seek(SeekFrom::Start(Self::offset_of(page_id)))?;
        self.file
            .read_exact(out)
            .map_err(|_| DbError::ShortRead)?;
        Ok(())
    }

    /// Writes `PAGE_SIZE` bytes for `page_id`, growing the file if needed,
    /// and flushes to the OS so the write is visible to a subsequent read
    /// (not necessarily durable across a crash — see `checkpoint`).
    pub fn write_page(&mut self, page_id: u64, buf: &[u8; PAGE_SIZE]) -> DbResult<()> {
        self.file.seek(SeekFrom::Start(Self::offset_of(page_id)))?;
        self.file.write_all(buf)?;
        self.file.flush()?;
        Ok(())
    }

    /// fsyncs the underlying file; the durability boundary for a checkpoint.
    pub fn sync(&self) -> DbResult<()> {
        self.file.sync_all()?;
        Ok(())
    }

    pub fn file_len(&self) -> DbResult<u64> {
        Ok(self.file.metadata()?.len())
    }
}
