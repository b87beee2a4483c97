//! The editing session: one document, its selection, clipboard, undo
//! history, and the drag gesture in progress.
//!
//! Every write goes through `apply`, which computes the next document from
//! the current one, records the previous document in history, and swaps the
//! new one in. Requests against missing IDs change nothing and record
//! nothing.

use crate::config::EditorConfig;
use crate::drop::DragSession;
use crate::error::EditError;
use crate::history::History;
use crate::mutation::{self, ChartPatch, Change, Mutation, NodePatch};
use crate::tables::TableStore;
use std::sync::Arc;
use vd_core::tree::{self, DropPosition};
use vd_core::{Document, Node, NodeId, NodeKind, Row, Style};

pub struct EditorSession {
    document: Document,
    history: History,
    selected: Option<NodeId>,
    /// Detached subtree waiting to be pasted.
    clipboard: Option<Arc<Node>>,
    drag: Option<DragSession>,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl EditorSession {
    /// A session over a blank document with a single Artboard frame.
    pub fn new(config: EditorConfig) -> Self {
        Self::from_document(Document::blank(), config)
    }

    pub fn from_document(document: Document, config: EditorConfig) -> Self {
        Self {
            document,
            history: History::new(config.history_depth),
            selected: None,
            clipboard: None,
            drag: None,
        }
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        tree::find(&self.document, id)
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Select `id`, or clear the selection with `None`. Unknown IDs are ignored.
    pub fn select(&mut self, id: Option<NodeId>) -> bool {
        match id {
            Some(id) if self.node(id).is_none() => false,
            _ => {
                self.selected = id;
                true
            }
        }
    }

    /// Replace the document wholesale and forget history and selection.
    pub fn reset(&mut self, document: Document) {
        self.document = document;
        self.history.clear();
        self.selected = None;
        self.drag = None;
    }

    // ─── Mutation core ───────────────────────────────────────────────────

    /// Apply a mutation, recording the previous document for undo.
    pub fn apply(&mut self, mutation: Mutation) -> Result<Change, EditError> {
        let description = mutation.description();
        let next = mutation.apply(&self.document).inspect_err(|err| {
            log::warn!("rejected `{description}`: {err}");
        })?;
        let Some(next) = next else {
            log::debug!("`{description}` found no target; document unchanged");
            return Ok(Change::Unchanged);
        };

        let before = std::mem::replace(&mut self.document, next);
        self.history.record(before, &description);
        self.prune_selection();
        log::debug!("applied `{description}` ({} nodes)", self.document.node_count());
        Ok(Change::Applied)
    }

    /// For mutations that can only be applied or skipped.
    fn apply_total(&mut self, mutation: Mutation) -> Change {
        self.apply(mutation).unwrap_or(Change::Unchanged)
    }

    // ─── Commands ────────────────────────────────────────────────────────

    /// Create a `kind` node with its defaults plus `style` overrides as the
    /// last child of `parent` (root if `None`), and select it.
    pub fn add_node(&mut self, kind: NodeKind, parent: Option<NodeId>, style: &Style) -> Option<NodeId> {
        let mut node = Node::create(kind);
        node.style.merge(style);
        let id = node.id;
        let change = self.apply_total(Mutation::AddNode {
            parent,
            node: Box::new(node),
        });
        change.applied().then(|| {
            self.selected = Some(id);
            id
        })
    }

    /// Delete `id` and its whole subtree. The sole root cannot be removed.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Change, EditError> {
        self.apply(Mutation::RemoveNode { id })
    }

    pub fn move_node(
        &mut self,
        dragged: NodeId,
        target: Option<NodeId>,
        position: DropPosition,
    ) -> Result<Change, EditError> {
        self.apply(Mutation::MoveNode {
            dragged,
            target,
            position,
        })
    }

    pub fn update_style(&mut self, id: NodeId, patch: Style) -> Change {
        self.apply_total(Mutation::UpdateStyle { id, patch })
    }

    pub fn update_chart_props(&mut self, id: NodeId, patch: ChartPatch) -> Change {
        self.apply_total(Mutation::UpdateChartProps { id, patch })
    }

    pub fn update_data(&mut self, id: NodeId, rows: Vec<Row>) -> Change {
        self.apply_total(Mutation::UpdateData { id, rows })
    }

    pub fn update_props(&mut self, id: NodeId, patch: NodePatch) -> Change {
        self.apply_total(Mutation::UpdateProps {
            id,
            patch: Box::new(patch),
        })
    }

    /// Link `id` to an external table: set the source, copy its rows, and
    /// clear the column mapping, as one undo step.
    pub fn bind_table(&mut self, id: NodeId, store: &dyn TableStore, table_id: &str) -> Change {
        let Some(rows) = store.table_by_id(table_id) else {
            log::debug!("table `{table_id}` not found");
            return Change::Unchanged;
        };
        let Some(node) = self.node(id) else {
            return Change::Unchanged;
        };
        let mut config = node.chart_config.clone().unwrap_or_default();
        config.clear_column_mapping();

        self.update_props(
            id,
            NodePatch {
                data_source_id: Some(table_id.to_string()),
                data: Some(rows),
                chart_config: Some(config),
                ..Default::default()
            },
        )
    }

    // ─── Clipboard ───────────────────────────────────────────────────────

    /// Put a copy of `id`'s subtree on the clipboard. Leaves the document
    /// and history alone.
    pub fn copy(&mut self, id: NodeId) -> Change {
        match self.node(id) {
            Some(node) => {
                self.clipboard = Some(Arc::new(node.clone()));
                Change::Applied
            }
            None => Change::Unchanged,
        }
    }

    /// Insert a re-identified clone of the clipboard under `parent`, falling
    /// back to the selection and then the root. A leaf target gets the clone
    /// as its next sibling. Selects the clone.
    pub fn paste(&mut self, parent: Option<NodeId>) -> Option<NodeId> {
        let mut node = self.clipboard.as_ref()?.with_fresh_ids();
        mutation::force_relative(&mut node.style);
        let id = node.id;
        let parent = parent.or(self.selected);

        let change = self.apply_total(Mutation::Paste {
            parent,
            node: Box::new(node),
        });
        change.applied().then(|| {
            self.selected = Some(id);
            id
        })
    }

    // ─── History ─────────────────────────────────────────────────────────

    /// Returns the description of the undone step.
    pub fn undo(&mut self) -> Option<String> {
        let description = self.history.undo(&mut self.document)?;
        self.prune_selection();
        log::debug!("undo `{description}`");
        Some(description)
    }

    pub fn redo(&mut self) -> Option<String> {
        let description = self.history.redo(&mut self.document)?;
        self.prune_selection();
        log::debug!("redo `{description}`");
        Some(description)
    }

    /// Group the following mutations into one undo step (e.g. while a
    /// slider is being dragged).
    pub fn begin_batch(&mut self, description: &str) {
        self.history.begin_batch(&self.document, description);
    }

    pub fn end_batch(&mut self) {
        self.history.end_batch(&self.document);
    }

    // ─── Drag and drop ───────────────────────────────────────────────────

    /// Start dragging `id`. Replaces any drag already in progress.
    pub fn begin_drag(&mut self, id: NodeId) -> bool {
        if self.node(id).is_none() {
            return false;
        }
        self.drag = Some(DragSession::begin(id));
        true
    }

    /// Pointer over `target` whose box spans `top..top + height`. Returns the
    /// provisional drop position for feedback.
    pub fn drag_over(&mut self, target: NodeId, pointer_y: f64, top: f64, height: f64) -> Option<DropPosition> {
        let kind = tree::find(&self.document, target)?.kind.clone();
        let drag = self.drag.as_mut()?;
        Some(drag.over(target, &kind, pointer_y, top, height))
    }

    pub fn drag_over_canvas(&mut self) {
        if let Some(drag) = self.drag.as_mut() {
            drag.over_canvas();
        }
    }

    pub fn cancel_drag(&mut self) {
        self.drag = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Commit the drag with its last classification.
    pub fn drop_drag(&mut self) -> Result<Change, EditError> {
        let Some(drag) = self.drag.take() else {
            return Ok(Change::Unchanged);
        };
        let (dragged, hover) = drag.finish();
        match hover {
            Some(hover) => self.move_node(dragged, Some(hover.target), hover.position),
            None => self.move_node(dragged, None, DropPosition::Inside),
        }
    }

    fn prune_selection(&mut self) {
        if let Some(id) = self.selected
            && tree::find(&self.document, id).is_none()
        {
            self.selected = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::MemoryTables;
    use vd_core::{Value, chart_keys};

    #[test]
    fn add_selects_new_node() {
        let mut session = EditorSession::default();
        let id = session.add_node(NodeKind::Container, None, &Style::new()).unwrap();
        assert_eq!(session.selected(), Some(id));
        assert!(session.can_undo());
    }

    #[test]
    fn style_overrides_win_over_defaults() {
        let mut session = EditorSession::default();
        let id = session
            .add_node(NodeKind::button(), None, &Style::new().with("background", "#000"))
            .unwrap();
        let style = &session.node(id).unwrap().style;
        assert_eq!(style.get("background"), Some(&Value::from("#000")));
        assert_eq!(style.get("borderRadius"), Some(&Value::from(6)));
    }

    #[test]
    fn removing_selected_clears_selection() {
        let mut session = EditorSession::default();
        let outer = session.add_node(NodeKind::Container, None, &Style::new()).unwrap();
        session.add_node(NodeKind::text(), Some(outer), &Style::new()).unwrap();
        // Selection is the text, inside `outer`.
        assert_eq!(session.remove_node(outer), Ok(Change::Applied));
        assert_eq!(session.selected(), None);
    }

    #[test]
    fn undo_restores_selection_target() {
        let mut session = EditorSession::default();
        let id = session.add_node(NodeKind::Chart, None, &Style::new()).unwrap();
        assert_eq!(session.undo().as_deref(), Some("Add Chart"));
        assert!(session.node(id).is_none());
        assert_eq!(session.selected(), None);
    }

    #[test]
    fn copy_does_not_touch_history() {
        let mut session = EditorSession::default();
        let root = session.document().root_id().unwrap();
        assert_eq!(session.copy(root), Change::Applied);
        assert!(!session.can_undo());
        assert_eq!(session.copy(NodeId::intern("nowhere")), Change::Unchanged);
    }

    #[test]
    fn paste_targets_selection_and_forces_relative() {
        let mut session = EditorSession::default();
        let host = session.add_node(NodeKind::Container, None, &Style::new()).unwrap();
        let button = session
            .add_node(
                NodeKind::button(),
                None,
                &Style::new().with("position", "absolute").with("left", 20),
            )
            .unwrap();
        session.copy(button);
        session.select(Some(host));

        let pasted = session.paste(None).unwrap();
        assert_ne!(pasted, button);
        assert_eq!(tree::find_parent(session.document(), pasted), Some(host));
        let style = &session.node(pasted).unwrap().style;
        assert_eq!(style.get("position"), Some(&Value::from("relative")));
        assert!(!style.contains_key("left"));
        assert_eq!(session.selected(), Some(pasted));
    }

    #[test]
    fn paste_with_empty_clipboard_is_noop() {
        let mut session = EditorSession::default();
        assert_eq!(session.paste(None), None);
        assert!(!session.can_undo());
    }

    #[test]
    fn drag_drop_uses_last_classification() {
        let mut session = EditorSession::default();
        let a = session.add_node(NodeKind::Container, None, &Style::new()).unwrap();
        let b = session.add_node(NodeKind::Container, None, &Style::new()).unwrap();
        let t = session.add_node(NodeKind::text(), None, &Style::new()).unwrap();

        assert!(session.begin_drag(t));
        assert_eq!(session.drag_over(b, 150.0, 100.0, 100.0), Some(DropPosition::Inside));
        assert_eq!(session.drag_over(a, 101.0, 100.0, 100.0), Some(DropPosition::Before));
        assert_eq!(session.drop_drag(), Ok(Change::Applied));
        assert!(!session.is_dragging());

        let root = session.document().root().unwrap();
        let order: Vec<NodeId> = root.children.iter().map(|c| c.id).collect();
        assert_eq!(order, [t, a, b]);
    }

    #[test]
    fn drop_on_canvas_goes_to_root_end() {
        let mut session = EditorSession::default();
        let box_id = session.add_node(NodeKind::Container, None, &Style::new()).unwrap();
        let inner = session.add_node(NodeKind::text(), Some(box_id), &Style::new()).unwrap();
        session.begin_drag(inner);
        session.drag_over(box_id, 5.0, 0.0, 100.0);
        session.drag_over_canvas();
        assert_eq!(session.drop_drag(), Ok(Change::Applied));
        let root = session.document().root().unwrap();
        assert_eq!(root.children.last().map(|c| c.id), Some(inner));
    }

    #[test]
    fn bind_table_is_one_step() {
        let mut tables = MemoryTables::new();
        let row = [("month".to_string(), Value::from("Jan"))].into_iter().collect();
        tables.insert("sales", vec![row]);

        let mut session = EditorSession::default();
        let chart = session.add_node(NodeKind::Chart, None, &Style::new()).unwrap();
        session.update_chart_props(
            chart,
            ChartPatch {
                options: [(chart_keys::LABEL_KEY.to_string(), Value::from("old"))]
                    .into_iter()
                    .collect(),
                ..Default::default()
            },
        );

        assert_eq!(session.bind_table(chart, &tables, "sales"), Change::Applied);
        let node = session.node(chart).unwrap();
        assert_eq!(node.data_source_id.as_deref(), Some("sales"));
        assert_eq!(node.data.as_ref().map(Vec::len), Some(1));
        let options = &node.chart_config.as_ref().unwrap().options;
        assert_eq!(options.get(chart_keys::LABEL_KEY), Some(&Value::from("")));

        assert_eq!(session.bind_table(chart, &tables, "missing"), Change::Unchanged);
        session.undo();
        assert_eq!(session.node(chart).unwrap().data_source_id, None);
    }
}
