//! Pure tree primitives: locate, detach, insert, and edit nodes.
//!
//! Every function takes `&Document` and hands back a new `Document`. Only
//! the nodes on the path from the top level to the affected node are copied
//! (`Arc::make_mut` on a shared `Arc` clones that one node); all other
//! subtrees stay shared with the input.

use crate::id::NodeId;
use crate::model::{Document, Node};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::sync::Arc;

/// Where a node lands relative to a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropPosition {
    /// Immediate sibling, just before the target.
    Before,
    /// Immediate sibling, just after the target.
    After,
    /// Last child of the target.
    Inside,
}

/// Sibling indices leading from the top level down to a node.
type NodePath = SmallVec<[usize; 8]>;

// ─── Lookup ──────────────────────────────────────────────────────────────

/// Depth-first, parent-before-children search. First match wins.
pub fn find(document: &Document, id: NodeId) -> Option<&Node> {
    document.roots.iter().find_map(|n| find_in(n, id))
}

fn find_in(node: &Node, id: NodeId) -> Option<&Node> {
    if node.id == id {
        return Some(node);
    }
    node.children.iter().find_map(|c| find_in(c, id))
}

/// ID of the node that directly owns `id`, or `None` for top-level or absent nodes.
pub fn find_parent(document: &Document, id: NodeId) -> Option<NodeId> {
    let path = locate(&document.roots, id)?;
    let (_, parent_path) = path.split_last()?;
    if parent_path.is_empty() {
        return None;
    }
    node_at(&document.roots, parent_path).map(|n| n.id)
}

/// Whether `id` sits somewhere below `ancestor` (strictly).
pub fn is_descendant(document: &Document, ancestor: NodeId, id: NodeId) -> bool {
    find(document, ancestor)
        .is_some_and(|a| a.children.iter().any(|c| find_in(c, id).is_some()))
}

fn locate(siblings: &[Arc<Node>], id: NodeId) -> Option<NodePath> {
    let mut path = NodePath::new();
    locate_into(siblings, id, &mut path).then_some(path)
}

fn locate_into(siblings: &[Arc<Node>], id: NodeId, path: &mut NodePath) -> bool {
    for (i, node) in siblings.iter().enumerate() {
        path.push(i);
        if node.id == id || locate_into(&node.children, id, path) {
            return true;
        }
        path.pop();
    }
    false
}

fn node_at<'a>(roots: &'a [Arc<Node>], path: &[usize]) -> Option<&'a Node> {
    let (&first, rest) = path.split_first()?;
    let mut node = roots.get(first)?;
    for &i in rest {
        node = node.children.get(i)?;
    }
    Some(node)
}

// ─── Path copying ────────────────────────────────────────────────────────

/// The sibling list that `parent_path` points into, unsharing every node on
/// the way down. `parent_path` must come from `locate` on the same roots.
fn siblings_mut<'a>(roots: &'a mut Vec<Arc<Node>>, parent_path: &[usize]) -> &'a mut Vec<Arc<Node>> {
    let mut siblings = roots;
    for &i in parent_path {
        siblings = &mut Arc::make_mut(&mut siblings[i]).children;
    }
    siblings
}

fn node_mut<'a>(roots: &'a mut Vec<Arc<Node>>, path: &[usize]) -> Option<&'a mut Node> {
    let (&last, parent_path) = path.split_last()?;
    let siblings = siblings_mut(roots, parent_path);
    siblings.get_mut(last).map(Arc::make_mut)
}

// ─── Structural edits ────────────────────────────────────────────────────

/// Remove the node `id` from wherever it occurs, keeping sibling order.
///
/// Returns the removed subtree (shared, not copied) and the new document.
/// When `id` is absent the returned document equals the input.
pub fn detach(document: &Document, id: NodeId) -> (Option<Arc<Node>>, Document) {
    let Some(path) = locate(&document.roots, id) else {
        log::trace!("detach: {id} not in document");
        return (None, document.clone());
    };
    let mut next = document.clone();
    let Some((&last, parent_path)) = path.split_last() else {
        return (None, next);
    };
    let removed = siblings_mut(&mut next.roots, parent_path).remove(last);
    (Some(removed), next)
}

/// Place `node` relative to `target`.
///
/// `Inside` appends as the last child; `Before`/`After` insert as an
/// immediate sibling at the target's depth. Returns `false` with the input
/// document when `target` is absent.
pub fn insert(
    document: &Document,
    node: Arc<Node>,
    target: NodeId,
    position: DropPosition,
) -> (bool, Document) {
    let Some(path) = locate(&document.roots, target) else {
        log::trace!("insert: target {target} not in document");
        return (false, document.clone());
    };
    let mut next = document.clone();
    let Some((&last, parent_path)) = path.split_last() else {
        return (false, next);
    };

    match position {
        DropPosition::Inside => {
            let siblings = siblings_mut(&mut next.roots, parent_path);
            Arc::make_mut(&mut siblings[last]).children.push(node);
        }
        DropPosition::Before => siblings_mut(&mut next.roots, parent_path).insert(last, node),
        DropPosition::After => siblings_mut(&mut next.roots, parent_path).insert(last + 1, node),
    }
    (true, next)
}

/// Edit one node in place (on a private copy of the path).
/// Returns `None` when `id` is absent.
pub fn update(document: &Document, id: NodeId, edit: impl FnOnce(&mut Node)) -> Option<Document> {
    let path = locate(&document.roots, id)?;
    let mut next = document.clone();
    edit(node_mut(&mut next.roots, &path)?);
    Some(next)
}
