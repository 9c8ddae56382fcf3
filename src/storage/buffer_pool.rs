//! Fixed-capacity page cache: pin on access, first-fit eviction among
//! unpinned frames, dirty pages flushed through the pager on eviction and
//! on checkpoint.

use crate::constants::{FRAME_COUNT, NULL_PAGE_ID, PAGE_SIZE};
use crate::error::{DbError, DbResult};
use crate::storage::pager::Pager;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

struct Frame {
    page_id: u64, // NULL_PAGE_ID means the frame is empty
    data: Box<[u8; PAGE_SIZE]>,
    dirty: bool,
    pin_count: u32,
}

impl Frame {
    fn empty() -> Self {
        Self {
            page_id: NULL_PAGE_ID,
            data: Box::new([0u8; PAGE_SIZE]),
            dirty: false,
            pin_count: 0,
        }
    }
}

struct Inner {
    pager: Mutex<Pager>,
    frames: Vec<Mutex<Frame>>,
    // Pool-wide lock: guards the page_id -> frame index mapping, victim
    // selection, and frame assignment. Released before returning to callers.
    table: Mutex<HashMap<u64, usize>>,
}

#[derive(Clone)]
pub struct BufferPool {
    inner: Arc<Inner>,
}

impl BufferPool {
    pub fn new(pager: Pager) -> Self {
        let frames = (0..FRAME_COUNT).map(|_| Mutex::new(Frame::empty())).collect();
        Self {
            inner: Arc::new(Inner {
                pager: Mutex::new(pager),
                frames,
                table: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Pins `page_id`, loading it from disk (or zero-filling a short read,
    /// as happens for a page allocated but never written) if not resident.
    pub fn get_page(&self, page_id: u64) -> DbResult<PageGuard> {
        let mut table = self.inner.table.lock().unwrap();

        if let Some(&idx) = table.get(&page_id) {
            let mut frame = self.inner.frames[idx].lock().unwrap();
            frame.pin_count += 1;
            drop(frame);
            return Ok(PageGuard {
                pool: Arc::clone(&self.inner),
                idx,
                page_id,
            });
        }

        let victim_idx = self
            .find_unpinned_frame()
            .ok_or(DbError::NoVictim)?;

        let mut frame = self.inner.frames[victim_idx].lock().unwrap();
        let old_page_id = frame.page_id;
        let was_dirty = frame.dirty;
        // Claim the frame (pin it, drop its old mapping) while `table` is
        // still held, so no concurrent get_page can pick it as a victim too
        // once the pool-wide lock is released below. The per-frame lock
        // stays held across the I/O that follows, mirroring the one
        // exception the pin/flush discipline allows.
        frame.pin_count = 1;
        table.remove(&old_page_id);
        drop(table);

        if was_dirty && old_page_id != NULL_PAGE_ID {
            let mut pager = self.inner.pager.lock().unwrap();
            pager.write_page(old_page_id, &frame.data)?;
        }

        {
            let mut pager = self.inner.pager.lock().unwrap();
            match pager.read_page(page_id, &mut frame.data) {
                Ok(()) => {}
                Err(DbError::ShortRead) => frame.data.fill(0),
                Err(e) => {
                    frame.pin_count = 0;
                    return Err(e);
                }
            }
        }

        frame.page_id = page_id;
        frame.dirty = false;
        drop(frame);

        let mut table = self.inner.table.lock().unwrap();
        table.insert(page_id, victim_idx);

        Ok(PageGuard {
            pool: Arc::clone(&self.inner),
            idx: victim_idx,
            page_id,
        })
    }

    /// First-fit scan over frames for one with `pin_count == 0`. Any
    /// constant-time-per-frame scan order satisfies the spec; this one is
    /// index order, which is what "first-fit" names.
    fn find_unpinned_frame(&self) -> Option<usize> {
        for (idx, lock) in self.inner.frames.iter().enumerate() {
            let frame = lock.lock().unwrap();
            if frame.pin_count == 0 {
                return Some(idx);
            }
        }
        None
    }

    /// Flushes every dirty frame and fsyncs the data file. This is the
    /// engine's only durability boundary (no WAL).
    pub fn checkpoint(&self) -> DbResult<()> {
        for lock in self.inner.frames.iter() {
            let mut frame = lock.lock().unwrap();
            if frame.dirty && frame.page_id != NULL_PAGE_ID {
                let mut pager = self.inner.pager.lock().unwrap();
                pager.write_page(frame.page_id, &frame.data)?;
                frame.dirty = false;
            }
        }
        self.inner.pager.lock().unwrap().sync()
    }

    /// True iff no frame is currently pinned. Used to assert the pin
    /// discipline invariant between operations in tests.
    pub fn all_unpinned(&self) -> bool {
        self.inner
            .frames
            .iter()
            .all(|lock| lock.lock().unwrap().pin_count == 0)
    }
}

/// RAII pin on a buffer frame. Dropping it calls `release_page` so callers
/// cannot forget to unpin on any exit path, including early returns via `?`.
pub struct PageGuard {
    pool: Arc<Inner>,
    idx: usize,
    page_id: u64,
}

impl PageGuard {
    pub fn page_id(&self) -> u64 {
        self.page_id
    }

    pub fn with_bytes<R>(&self, f: impl FnOnce(&[u8; PAGE_SIZE]) -> R) -> R {
        let frame = self.pool.frames[self.idx].lock().unwrap();
        f(&frame.data)
    }

    /// Mutates the page's bytes and marks the frame dirty in the same
    /// critical section.
    pub fn with_bytes_mut<R>(&self, f: impl FnOnce(&mut [u8; PAGE_SIZE]) -> R) -> R {
        let mut frame = self.pool.frames[self.idx].lock().unwrap();
        let result = f(&mut frame.data);
        frame.dirty = true;
        result
    }

    pub fn mark_dirty(&self) {
        let mut frame = self.pool.frames[self.idx].lock().unwrap();
        frame.dirty = true;
    }
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        let mut frame = self.pool.frames[self.idx].lock().unwrap();
        frame.pin_count = frame.pin_count.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn new_pool() -> (BufferPool, NamedTempFile) {
        let tmp = NamedTempFile::new().unwrap();
        let pager = Pager::open(tmp.path()).unwrap();
        (BufferPool::new(pager), tmp)
    }

    #[test]
    fn pin_then_release_returns_to_zero() {
        let (pool, _tmp) = new_pool();
        {
            let guard = pool.get_page(1).unwrap();
            guard.with_bytes_mut(|b| b[0] = 7);
        }
        assert!(pool.all_unpinned());
    }

    #[test]
    fn checkpoint_persists_across_reopen() {
        let (pool, tmp) = new_pool();
        {
            let guard = pool.get_page(1).unwrap();
            guard.with_bytes_mut(|b| b[0] = 42);
        }
        pool.checkpoint().unwrap();
        drop(pool);

        let pager = Pager::open(tmp.path()).unwrap();
        let pool2 = BufferPool::new(pager);
        let guard = pool2.get_page(1).unwrap();
        guard.with_bytes(|b| assert_eq!(b[0], 42));
    }

    #[test]
    fn every_frame_pinned_fails_with_no_victim() {
        let (pool, _tmp) = new_pool();
        let mut guards = Vec::new();
        for pid in 1..=FRAME_COUNT as u64 {
            guards.push(pool.get_page(pid).unwrap());
        }
        assert!(matches!(pool.get_page(FRAME_COUNT as u64 + 1), Err(DbError::NoVictim)));
    }
}
