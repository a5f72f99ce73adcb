//! Parent-pointer queries over the flat block sequence.
//!
//! The sequence order is positional and independent of nesting; these
//! functions only chase `parent_id` links. Every walk carries a visited set
//! so corrupted input cannot hang it.

use std::collections::HashSet;

use super::types::{Block, BlockId};
use super::utils::find_block_by_id;
use crate::error::{EditorError, Result};

/// Ancestors of `id`, nearest parent first.
///
/// A parent id that no longer resolves still appears as the last entry.
/// Returns [`EditorError::ParentCycle`] when the chain loops back on itself.
pub fn ancestors(blocks: &[Block], id: &str) -> Result<Vec<BlockId>> {
    let mut out = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    seen.insert(id);

    let mut next = find_block_by_id(blocks, id).and_then(|b| b.parent_id.as_deref());
    while let Some(parent_id) = next {
        if !seen.insert(parent_id) {
            log::error!("parent cycle through block {} (from {})", parent_id, id);
            return Err(EditorError::ParentCycle {
                block_id: parent_id.to_string(),
            });
        }
        out.push(parent_id.to_string());
        next = find_block_by_id(blocks, parent_id).and_then(|b| b.parent_id.as_deref());
    }
    Ok(out)
}

/// All blocks below `id`, depth-first in sequence order. Excludes `id`.
pub fn descendants(blocks: &[Block], id: &str) -> Vec<BlockId> {
    let mut out = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    seen.insert(id);

    let mut stack: Vec<&str> = children(blocks, id).into_iter().rev().collect();
    while let Some(current) = stack.pop() {
        if !seen.insert(current) {
            continue;
        }
        out.push(current.to_string());
        stack.extend(children(blocks, current).into_iter().rev());
    }
    out
}

/// Direct children of `id`, in sequence order.
pub fn children<'a>(blocks: &'a [Block], id: &str) -> Vec<&'a str> {
    blocks
        .iter()
        .filter(|b| b.parent_id.as_deref() == Some(id))
        .map(|b| b.id.as_str())
        .collect()
}

/// Nearest block that is an ancestor of both `a` and `b`.
/// `None` when either id is unknown or they share no ancestor.
pub fn common_ancestor(blocks: &[Block], a: &str, b: &str) -> Result<Option<BlockId>> {
    if find_block_by_id(blocks, a).is_none() || find_block_by_id(blocks, b).is_none() {
        return Ok(None);
    }
    let left = ancestors(blocks, a)?;
    let right: HashSet<BlockId> = ancestors(blocks, b)?.into_iter().collect();
    Ok(left.into_iter().find(|id| right.contains(id)))
}

/// Nesting depth; root blocks are at depth 0. A cycle reports depth 0.
pub fn depth(blocks: &[Block], id: &str) -> usize {
    ancestors(blocks, id).map(|a| a.len()).unwrap_or(0)
}

/// Whether pointing `id` at `new_parent` would make it its own ancestor.
pub fn would_create_cycle(blocks: &[Block], id: &str, new_parent: &str) -> bool {
    new_parent == id || descendants(blocks, id).iter().any(|d| d == new_parent)
}
