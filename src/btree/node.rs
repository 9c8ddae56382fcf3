//! On-disk layout of a B+-tree node page:
//! `{is_leaf: u8, key_count: u32, keys[BTREE_MAX_KEYS]}` followed by a
//! pointer-union: parallel `(tuple_page_id, tuple_slot_id)` arrays for a
//! leaf, or a `children` array for an internal node.

use crate::btree::BTreeError;
use crate::constants::{BTREE_MAX_KEYS, BTREE_ORDER, VALUE_ENCODED_SIZE};
use crate::error::DbResult;
use crate::value::Value;

const HEADER_SIZE: usize = 1 + 4;
const KEYS_OFFSET: usize = HEADER_SIZE;
const KEYS_SIZE: usize = BTREE_MAX_KEYS * VALUE_ENCODED_SIZE;
const PTR_UNION_OFFSET: usize = KEYS_OFFSET + KEYS_SIZE;
const LEAF_PAGE_ID_SIZE: usize = BTREE_MAX_KEYS * 8;
const LEAF_SLOT_OFFSET: usize = PTR_UNION_OFFSET + LEAF_PAGE_ID_SIZE;

#[derive(Debug, Clone)]
pub struct BTreeNode {
    pub is_leaf: bool,
    pub keys: Vec<Value>,
    /// Leaf only: parallel to `keys`.
    pub tuple_locations: Vec<(u64, u32)>,
    /// Internal only: `children.len() == keys.len() + 1`.
    pub children: Vec<u64>,
}

impl BTreeNode {
    pub fn new_leaf() -> Self {
        Self {
            is_leaf: true,
            keys: Vec::new(),
            tuple_locations: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn new_internal() -> Self {
        Self {
            is_leaf: false,
            keys: Vec::new(),
            tuple_locations: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub fn is_overflowing(&self) -> bool {
        self.keys.len() > BTREE_MAX_KEYS
    }

    pub fn encode(&self, buf: &mut [u8]) -> DbResult<()> {
        debug_assert!(self.keys.len() <= BTREE_ORDER); // allow transient overflow pre-split
        buf.fill(0);
        buf[0] = self.is_leaf as u8;
        buf[1..5].copy_from_slice(&(self.keys.len() as u32).to_le_bytes());

        for (i, key) in self.keys.iter().enumerate() {
            let off = KEYS_OFFSET + i * VALUE_ENCODED_SIZE;
            let encoded = key.encode()?;
            buf[off..off + VALUE_ENCODED_SIZE].copy_from_slice(&encoded);
        }

        if self.is_leaf {
            for (i, (page_id, slot)) in self.tuple_locations.iter().enumerate() {
                let pid_off = PTR_UNION_OFFSET + i * 8;
                buf[pid_off..pid_off + 8].copy_from_slice(&page_id.to_le_bytes());
                let slot_off = LEAF_SLOT_OFFSET + i * 4;
                buf[slot_off..slot_off + 4].copy_from_slice(&slot.to_le_bytes());
            }
        } else {
            for (i, child) in self.children.iter().enumerate() {
                let off = PTR_UNION_OFFSET + i * 8;
                buf[off..off + 8].copy_from_slice(&child.to_le_bytes());
            }
        }
        Ok(())
    }

    /// Decodes a node page. `key_count` comes straight off disk, so it's
    /// bounds-checked against `BTREE_MAX_KEYS` before being used to index
    /// into `buf` — a page that isn't really a B+-tree node (or one that's
    /// corrupted) reads back with a nonsense `key_count` far more often
    /// than it reads back with a small, wrong one.
    pub fn decode(buf: &[u8]) -> Result<Self, BTreeError> {
        let is_leaf = buf[0] != 0;
        let key_count = u32::from_le_bytes(buf[1..5].try_into().unwrap()) as usize;
        if key_count > BTREE_MAX_KEYS {
            return Err(BTreeError::InvalidPageType);
        }

        let mut keys = Vec::with_capacity(key_count);
        for i in 0..key_count {
            let off = KEYS_OFFSET + i * VALUE_ENCODED_SIZE;
            keys.push(Value::decode(&buf[off..off + VALUE_ENCODED_SIZE])?);
        }

        let mut tuple_locations = Vec::new();
        let mut children = Vec::new();
        if is_leaf {
            for i in 0..key_count {
                let pid_off = PTR_UNION_OFFSET + i * 8;
                let page_id = u64::from_le_bytes(buf[pid_off..pid_off + 8].try_into().unwrap());
                let slot_off = LEAF_SLOT_OFFSET + i * 4;
                let slot = u32::from_le_bytes(buf[slot_off..slot_off + 4].try_into().unwrap());
                tuple_locations.push((page_id, slot));
            }
        } else {
            for i in 0..=key_count {
                let off = PTR_UNION_OFFSET + i * 8;
                children.push(u64::from_le_bytes(buf[off..off + 8].try_into().unwrap()));
            }
        }

        Ok(BTreeNode {
            is_leaf,
            keys,
            tuple_locations,
            children,
        })
    }
}
