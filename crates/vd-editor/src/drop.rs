//! Drag-and-drop reordering: drop-position classification and the
//! transient drag session that feeds `EditorSession::move_node`.

use vd_core::{DropPosition, NodeId, NodeKind};

/// Fraction of a node's height, from the top, that means "before".
const BEFORE_BAND: f64 = 0.25;
/// Fraction of a node's height, from the top, past which a drop means "after".
const AFTER_BAND: f64 = 0.75;

/// Decide where a drop over a node of `kind` would land.
///
/// Frames take every drop as a child. Other kinds split vertically: top
/// quarter → `Before`, bottom quarter → `After`, middle → `Inside` when the
/// kind holds children, `After` otherwise.
pub fn classify(pointer_y: f64, node_top: f64, node_height: f64, kind: &NodeKind) -> DropPosition {
    if kind.always_accepts_drop() {
        return DropPosition::Inside;
    }

    let relative_y = pointer_y - node_top;
    if relative_y < BEFORE_BAND * node_height {
        DropPosition::Before
    } else if relative_y > AFTER_BAND * node_height {
        DropPosition::After
    } else if kind.accepts_children() {
        DropPosition::Inside
    } else {
        DropPosition::After
    }
}

/// The node currently under the pointer and what dropping there would do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropTarget {
    pub target: NodeId,
    pub position: DropPosition,
}

/// One in-flight drag gesture.
///
/// The classification is recomputed on every drag-over and is only
/// feedback until `finish`, which hands the last result to the mutation
/// engine. A `None` hover means the pointer is over empty canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    dragged: NodeId,
    hover: Option<DropTarget>,
}

impl DragSession {
    pub fn begin(dragged: NodeId) -> Self {
        Self {
            dragged,
            hover: None,
        }
    }

    /// Pointer moved over `target`, whose box spans `top..top + height`.
    pub fn over(
        &mut self,
        target: NodeId,
        kind: &NodeKind,
        pointer_y: f64,
        top: f64,
        height: f64,
    ) -> DropPosition {
        let position = classify(pointer_y, top, height, kind);
        self.hover = Some(DropTarget { target, position });
        position
    }

    /// Pointer left every candidate node: a drop now lands on the canvas.
    pub fn over_canvas(&mut self) {
        self.hover = None;
    }

    /// End the gesture: the dragged node and where it should go.
    pub fn finish(self) -> (NodeId, Option<DropTarget>) {
        (self.dragged, self.hover)
    }
}
