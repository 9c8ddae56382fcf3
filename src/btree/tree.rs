//! Insert/search for the ordered key -> (tuple_page_id, tuple_slot) index.
//!
//! `delete` is deliberately a no-op: MVCC handles logical deletion by
//! stamping the tuple's `xmax` (see `heap::delete_tuple` and
//! `txn::mvcc_is_visible`); removing the B+-tree entry and reclaiming space
//! is an explicit Non-goal (spec.md's Open Question on this is resolved as
//! "leave it", see DESIGN.md).

use crate::btree::node::BTreeNode;
use crate::btree::BTreeError;
use crate::constants::{BTREE_MAX_KEYS, BTREE_ORDER};
use crate::error::DbResult;
use crate::storage::BufferPool;
use crate::value::Value;
use std::cmp::Ordering;

#[derive(Debug)]
pub enum InsertOutcome {
    NoSplit,
    /// The root split; the caller (the table facade) must persist this as
    /// the schema's new `root_page_id`.
    NewRoot(u64),
}

enum SplitOutcome {
    NoSplit,
    Split { promoted_key: Value, new_page_id: u64 },
}

pub struct BTree;

impl BTree {
    pub fn insert(
        bp: &BufferPool,
        allocate_page: &mut dyn FnMut() -> DbResult<u64>,
        root_page_id: u64,
        key: Value,
        tuple_page_id: u64,
        tuple_slot: u32,
    ) -> Result<InsertOutcome, BTreeError> {
        match insert_rec(bp, allocate_page, root_page_id, &key, tuple_page_id, tuple_slot)? {
            SplitOutcome::NoSplit => Ok(InsertOutcome::NoSplit),
            SplitOutcome::Split {
                promoted_key,
                new_page_id,
            } => {
                let new_root_id = allocate_page()?;
                let mut new_root = BTreeNode::new_internal();
                new_root.keys = vec![promoted_key];
                new_root.children = vec![root_page_id, new_page_id];
                write_node(bp, new_root_id, &new_root)?;
                Ok(InsertOutcome::NewRoot(new_root_id))
            }
        }
    }

    pub fn search(
        bp: &BufferPool,
        root_page_id: u64,
        key: &Value,
    ) -> Result<Option<(u64, u32)>, BTreeError> {
        search(bp, root_page_id, key)
    }

    /// No-op; see module docs.
    pub fn delete(_bp: &BufferPool, _root_page_id: u64, _key: &Value) -> Result<(), BTreeError> {
        Ok(())
    }

    pub fn new_empty_leaf(bp: &BufferPool, page_id: u64) -> DbResult<()> {
        write_node(bp, page_id, &BTreeNode::new_leaf())
    }
}

/// In-order walk of every `(tuple_page_id, tuple_slot)` reachable from
/// `root_page_id`, i.e. every live index entry in primary-key order. This
/// is how a WHERE-less SELECT is served: there is no heap page directory to
/// walk (each row's heap page is allocated ad hoc, see `heap::insert_tuple`),
/// but the index already reaches every row, so its key order stands in for
/// heap order.
pub fn scan_all(bp: &BufferPool, root_page_id: u64) -> Result<Vec<(u64, u32)>, BTreeError> {
    if root_page_id == crate::constants::NULL_PAGE_ID {
        return Ok(Vec::new());
    }
    let node = read_node(bp, root_page_id)?;
    let mut out = Vec::new();
    collect(bp, &node, &mut out)?;
    Ok(out)
}

fn collect(bp: &BufferPool, node: &BTreeNode, out: &mut Vec<(u64, u32)>) -> Result<(), BTreeError> {
    if node.is_leaf {
        out.extend_from_slice(&node.tuple_locations);
        return Ok(());
    }
    for &child_id in &node.children {
        let child = read_node(bp, child_id)?;
        collect(bp, &child, out)?;
    }
    Ok(())
}

pub fn search(bp: &BufferPool, root_page_id: u64, key: &Value) -> Result<Option<(u64, u32)>, BTreeError> {
    let mut page_id = root_page_id;
    loop {
        let node = read_node(bp, page_id)?;
        if node.is_leaf {
            let pos = lower_bound(&node.keys, key)?;
            if pos < node.keys.len() && node.keys[pos].equals(key)? {
                return Ok(Some(node.tuple_locations[pos]));
            }
            return Ok(None);
        } else {
            let idx = upper_bound(&node.keys, key)?;
            page_id = node.children[idx];
        }
    }
}

fn insert_rec(
    bp: &BufferPool,
    allocate_page: &mut dyn FnMut() -> DbResult<u64>,
    page_id: u64,
    key: &Value,
    tuple_page_id: u64,
    tuple_slot: u32,
) -> Result<SplitOutcome, BTreeError> {
    let mut node = read_node(bp, page_id)?;

    if node.is_leaf {
        let pos = lower_bound(&node.keys, key)?;
        if pos < node.keys.len() && node.keys[pos].equals(key)? {
            return Err(BTreeError::DuplicateKey);
        }
        node.keys.insert(pos, key.clone());
        node.tuple_locations.insert(pos, (tuple_page_id, tuple_slot));

        if node.keys.len() <= BTREE_MAX_KEYS {
            write_node(bp, page_id, &node)?;
            return Ok(SplitOutcome::NoSplit);
        }

        let mid = BTREE_ORDER / 2;
        let right_keys = node.keys.split_off(mid);
        let right_locs = node.tuple_locations.split_off(mid);
        let promoted_key = right_keys[0].clone();
        let new_page_id = allocate_page()?;
        let right_node = BTreeNode {
            is_leaf: true,
            keys: right_keys,
            tuple_locations: right_locs,
            children: Vec::new(),
        };
        write_node(bp, new_page_id, &right_node)?;
        write_node(bp, page_id, &node)?;
        Ok(SplitOutcome::Split {
            promoted_key,
            new_page_id,
        })
    } else {
        let child_idx = upper_bound(&node.keys, key)?;
        let child_page_id = node.children[child_idx];

        match insert_rec(bp, allocate_page, child_page_id, key, tuple_page_id, tuple_slot)? {
            SplitOutcome::NoSplit => Ok(SplitOutcome::NoSplit),
            SplitOutcome::Split {
                promoted_key,
                new_page_id,
            } => {
                node.keys.insert(child_idx, promoted_key);
                node.children.insert(child_idx + 1, new_page_id);

                if node.keys.len() <= BTREE_MAX_KEYS {
                    write_node(bp, page_id, &node)?;
                    return Ok(SplitOutcome::NoSplit);
                }

                let mid = BTREE_ORDER / 2;
                let right_keys = node.keys.split_off(mid + 1);
                let promoted_key = node.keys.pop().expect("node had mid+1 keys before split");
                let right_children = node.children.split_off(mid + 1);
                let new_page_id = allocate_page()?;
                let right_node = BTreeNode {
                    is_leaf: false,
                    keys: right_keys,
                    tuple_locations: Vec::new(),
                    children: right_children,
                };
                write_node(bp, new_page_id, &right_node)?;
                write_node(bp, page_id, &node)?;
                Ok(SplitOutcome::Split {
                    promoted_key,
                    new_page_id,
                })
            }
        }
    }
}

fn read_node(bp: &BufferPool, page_id: u64) -> Result<BTreeNode, BTreeError> {
    let guard = bp.get_page(page_id)?;
    guard.with_bytes(|buf| BTreeNode::decode(buf))
}

fn write_node(bp: &BufferPool, page_id: u64, node: &BTreeNode) -> DbResult<()> {
    let guard = bp.get_page(page_id)?;
    guard.with_bytes_mut(|buf| node.encode(buf))
}

/// First index `i` with `keys[i] >= target` (i.e. count of keys `< target`).
fn lower_bound(keys: &[Value], target: &Value) -> DbResult<usize> {
    let mut lo = 0;
    let mut hi = keys.len();
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if keys[mid].compare(target)? == Ordering::Less {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    Ok(lo)
}

/// First index `i` with `keys[i] > target` (i.e. count of keys `<= target`);
/// used to pick the child to descend into so that `children[i]` holds keys
/// `< keys[i] <= children[i+1]`, matching the node ordering invariant.
fn upper_bound(keys: &[Value], target: &Value) -> DbResult<usize> {
    let mut lo = 0;
    let mut hi = keys.len();
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if keys[mid].compare(target)? != Ordering::Greater {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    Ok(lo)
}
