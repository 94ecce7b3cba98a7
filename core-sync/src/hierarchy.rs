//! # Hierarchy Leveler
//!
//! Arranges a flat list of parent-referencing rows into ordered levels so
//! that a parent is always persisted before any of its children. Level 0
//! holds the roots, level N+1 the direct children of level N.
//!
//! The walk is an iterative breadth-first pass over a work queue, so
//! catalog depth never touches the call stack. Rows whose declared parent
//! does not occur in the input are unreachable and silently dropped (the
//! count is logged at warn level). A row that references itself, or any
//! arrangement that would visit one id twice, is a fatal cycle error.

use std::collections::{HashMap, HashSet};

use core_catalog::models::CatalogRow;
use tracing::warn;

use crate::error::{Result, SyncError};

/// One depth level of a catalog hierarchy, in persistence order
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyLevel<T> {
    pub level: u32,
    pub items: Vec<T>,
}

/// Split `items` into hierarchy levels, roots first
///
/// Input order is preserved within each parent's child list.
pub fn separate_into_levels<T: CatalogRow>(items: Vec<T>) -> Result<Vec<HierarchyLevel<T>>> {
    let total = items.len();
    if total == 0 {
        return Ok(Vec::new());
    }

    // Root rows live under the empty-string key.
    let mut children_of: HashMap<String, Vec<usize>> = HashMap::new();
    for (index, item) in items.iter().enumerate() {
        let parent = item.parent_id().unwrap_or("");
        if parent == item.id() {
            return Err(SyncError::HierarchyCycle {
                id: item.id().to_string(),
            });
        }
        children_of.entry(parent.to_string()).or_default().push(index);
    }

    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    let mut seen: HashSet<String> = HashSet::with_capacity(total);
    let mut levels: Vec<HierarchyLevel<T>> = Vec::new();
    let mut frontier = children_of.remove("").unwrap_or_default();
    let mut placed = 0usize;
    let mut depth = 0u32;

    while !frontier.is_empty() {
        let mut level_items = Vec::with_capacity(frontier.len());
        let mut next = Vec::new();

        for index in frontier {
            if let Some(item) = slots[index].take() {
                if !seen.insert(item.id().to_string()) {
                    return Err(SyncError::HierarchyCycle {
                        id: item.id().to_string(),
                    });
                }
                if let Some(child_indices) = children_of.remove(item.id()) {
                    next.extend(child_indices);
                }
                level_items.push(item);
                placed += 1;
            }
        }

        levels.push(HierarchyLevel {
            level: depth,
            items: level_items,
        });
        depth += 1;
        frontier = next;
    }

    if placed < total {
        warn!(
            dropped = total - placed,
            "dropped rows with no path to a hierarchy root"
        );
    }

    Ok(levels)
}
