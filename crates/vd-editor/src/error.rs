//! Errors raised by the mutation engine.
//!
//! A missing target is never an error: mutations against stale IDs report
//! `Change::Unchanged` instead. Only requests that would break a document
//! invariant are rejected here, before anything is touched.

use thiserror::Error;
use vd_core::NodeId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("cannot remove {id}: the document must keep at least one root")]
    SoleRoot { id: NodeId },

    #[error("cannot move {dragged} into its own subtree (target {target})")]
    CyclicMove { dragged: NodeId, target: NodeId },
}
