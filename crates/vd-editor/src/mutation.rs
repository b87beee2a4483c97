//! Document mutations.
//!
//! A `Mutation` is computed against the current document and yields the
//! next one, never touching its input. Three outcomes:
//!
//! - `Ok(Some(next))`: applied.
//! - `Ok(None)`: a referenced ID is missing; nothing happens and nothing is
//!   recorded in history.
//! - `Err(EditError)`: the request would break a document invariant.

use crate::error::EditError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use vd_core::tree::{self, DropPosition};
use vd_core::{ChartConfig, ChartVariant, Document, Node, NodeId, NodeKind, Row, Style, Value, keys};

/// Whether a request changed the document ("0 nodes affected" otherwise).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Applied,
    Unchanged,
}

impl Change {
    pub fn applied(self) -> bool {
        self == Change::Applied
    }
}

/// Partial chart config. `options` is merged key by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartPatch {
    pub variant: Option<ChartVariant>,
    pub options: BTreeMap<String, Value>,
}

/// Shallow patch over arbitrary node fields. `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodePatch {
    pub name: Option<String>,
    /// Replaces the whole style map.
    pub style: Option<Style>,
    pub data: Option<Vec<Row>>,
    pub chart_config: Option<ChartConfig>,
    pub data_source_id: Option<String>,
    /// Drop the data-source link. Applied before `data_source_id`.
    pub clear_data_source: bool,
    /// Text content of a Text node, or the label of a Button.
    pub content: Option<String>,
}

/// A request against the document, mirroring the editor's command surface.
#[derive(Debug, Clone)]
pub enum Mutation {
    /// Insert a prepared node as the last child of `parent` (root if `None`).
    AddNode {
        parent: Option<NodeId>,
        node: Box<Node>,
    },
    RemoveNode {
        id: NodeId,
    },
    /// Relocate `dragged`. `target = None` means the empty canvas: the node
    /// goes to the end of the root Frame.
    MoveNode {
        dragged: NodeId,
        target: Option<NodeId>,
        position: DropPosition,
    },
    UpdateStyle {
        id: NodeId,
        patch: Style,
    },
    UpdateChartProps {
        id: NodeId,
        patch: ChartPatch,
    },
    UpdateData {
        id: NodeId,
        rows: Vec<Row>,
    },
    UpdateProps {
        id: NodeId,
        patch: Box<NodePatch>,
    },
    /// Insert a clipboard clone (already re-identified) under `parent`.
    Paste {
        parent: Option<NodeId>,
        node: Box<Node>,
    },
}

impl Mutation {
    /// Human-readable label used for undo/redo history.
    pub fn description(&self) -> String {
        match self {
            Mutation::AddNode { node, .. } => format!("Add {}", node.kind.name()),
            Mutation::RemoveNode { id } => format!("Remove {id}"),
            Mutation::MoveNode { dragged, .. } => format!("Move {dragged}"),
            Mutation::UpdateStyle { id, .. } => format!("Style {id}"),
            Mutation::UpdateChartProps { id, .. } => format!("Chart options {id}"),
            Mutation::UpdateData { id, .. } => format!("Data {id}"),
            Mutation::UpdateProps { id, .. } => format!("Update {id}"),
            Mutation::Paste { node, .. } => format!("Paste {}", node.kind.name()),
        }
    }

    /// Compute the document that results from this mutation.
    pub fn apply(self, document: &Document) -> Result<Option<Document>, EditError> {
        match self {
            Mutation::AddNode { parent, node } | Mutation::Paste { parent, node } => {
                Ok(insert_child(document, parent, *node))
            }
            Mutation::RemoveNode { id } => remove(document, id),
            Mutation::MoveNode {
                dragged,
                target,
                position,
            } => relocate(document, dragged, target, position),
            Mutation::UpdateStyle { id, patch } => Ok(update_style(document, id, &patch)),
            Mutation::UpdateChartProps { id, patch } => Ok(tree::update(document, id, |node| {
                let config = node.chart_config.get_or_insert_with(ChartConfig::default);
                if let Some(variant) = patch.variant {
                    config.variant = variant;
                }
                config.options.extend(patch.options);
            })),
            Mutation::UpdateData { id, rows } => Ok(tree::update(document, id, |node| {
                node.data = Some(rows);
                if let Some(config) = node.chart_config.as_mut() {
                    config.clear_column_mapping();
                }
            })),
            Mutation::UpdateProps { id, patch } => {
                Ok(tree::update(document, id, |node| apply_props(node, *patch)))
            }
        }
    }
}

fn insert_child(document: &Document, parent: Option<NodeId>, node: Node) -> Option<Document> {
    let parent = parent.or_else(|| document.root_id())?;
    let position = settle(document, parent, DropPosition::Inside);
    let (inserted, next) = tree::insert(document, Arc::new(node), parent, position);
    inserted.then_some(next)
}

/// Leaf kinds never hold children: `Inside` a leaf lands right after it.
fn settle(document: &Document, target: NodeId, position: DropPosition) -> DropPosition {
    match position {
        DropPosition::Inside
            if tree::find(document, target).is_some_and(|n| !n.kind.accepts_children()) =>
        {
            DropPosition::After
        }
        other => other,
    }
}

fn remove(document: &Document, id: NodeId) -> Result<Option<Document>, EditError> {
    if let [only] = document.roots.as_slice()
        && only.id == id
    {
        return Err(EditError::SoleRoot { id });
    }
    let (removed, next) = tree::detach(document, id);
    Ok(removed.map(|_| next))
}

fn relocate(
    document: &Document,
    dragged: NodeId,
    target: Option<NodeId>,
    position: DropPosition,
) -> Result<Option<Document>, EditError> {
    let (target, position) = match target {
        Some(target) => (target, position),
        None => match document.root_id() {
            Some(root) => (root, DropPosition::Inside),
            None => return Ok(None),
        },
    };
    if dragged == target {
        return Ok(None);
    }
    if tree::find(document, dragged).is_none() || tree::find(document, target).is_none() {
        return Ok(None);
    }
    if tree::is_descendant(document, dragged, target) {
        return Err(EditError::CyclicMove { dragged, target });
    }

    let position = settle(document, target, position);
    let (Some(node), detached) = tree::detach(document, dragged) else {
        return Ok(None);
    };
    let (inserted, next) = tree::insert(&detached, node, target, position);
    Ok(inserted.then_some(next))
}

/// Shallow-merge `patch` into the node's style. Switching the node to a flow
/// layout voids its direct children's free-positioning keys.
fn update_style(document: &Document, id: NodeId, patch: &Style) -> Option<Document> {
    let flow_layout = patch
        .get(keys::DISPLAY)
        .and_then(Value::as_str)
        .is_some_and(|display| keys::FLOW_LAYOUTS.contains(&display));

    tree::update(document, id, |node| {
        node.style.merge(patch);
        if !flow_layout {
            return;
        }
        for child in &mut node.children {
            if has_free_position(child) {
                clear_free_position(&mut Arc::make_mut(child).style);
            }
        }
    })
}

fn has_free_position(node: &Node) -> bool {
    node.style.contains_key(keys::POSITION)
        || keys::OFFSETS.iter().any(|k| node.style.contains_key(k))
}

fn clear_free_position(style: &mut Style) {
    style.remove(keys::POSITION);
    for key in keys::OFFSETS {
        style.remove(key);
    }
}

/// Put a pasted clone into the parent's layout flow.
pub(crate) fn force_relative(style: &mut Style) {
    for key in keys::OFFSETS {
        style.remove(key);
    }
    style.set(keys::POSITION, keys::RELATIVE);
}

fn apply_props(node: &mut Node, patch: NodePatch) {
    if let Some(name) = patch.name {
        node.name = name;
    }
    if let Some(style) = patch.style {
        node.style = style;
    }
    if let Some(data) = patch.data {
        node.data = Some(data);
    }
    if let Some(config) = patch.chart_config {
        node.chart_config = Some(config);
    }
    if patch.clear_data_source {
        node.data_source_id = None;
    }
    if let Some(source) = patch.data_source_id {
        node.data_source_id = Some(source);
    }
    if let Some(content) = patch.content {
        match &mut node.kind {
            NodeKind::Text { content: c } => *c = content,
            NodeKind::Button { label } => *label = content,
            NodeKind::Frame | NodeKind::Container | NodeKind::Chart => {
                log::debug!("content patch ignored on {} {}", node.kind.name(), node.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vd_core::tree::find;

    fn node(id: &str, kind: NodeKind) -> Node {
        Node::new(NodeId::intern(id), kind)
    }

    fn sample() -> Document {
        Document::with_root(node("m1", NodeKind::Frame).with_children([
            node("m2", NodeKind::Container).with_children([node("m4", NodeKind::Container)]),
            node("m3", NodeKind::button()),
        ]))
    }

    #[test]
    fn flex_layout_clears_child_offsets() {
        let doc = Document::with_root(node("f1", NodeKind::Frame).with_children([
            node("f2", NodeKind::button()).with_style(
                Style::new()
                    .with("position", "absolute")
                    .with("left", 40)
                    .with("top", 12)
                    .with("color", "red"),
            ),
            node("f3", NodeKind::text()),
        ]));
        let before_text = Arc::clone(&doc.roots[0].children[1]);

        let next = Mutation::UpdateStyle {
            id: NodeId::intern("f1"),
            patch: Style::new().with("display", "flex"),
        }
        .apply(&doc)
        .unwrap()
        .unwrap();

        let button = find(&next, NodeId::intern("f2")).unwrap();
        assert!(!button.style.contains_key("left"));
        assert!(!button.style.contains_key("top"));
        assert!(!button.style.contains_key("position"));
        assert_eq!(button.style.get("color"), Some(&Value::from("red")));
        // Children without offsets are not copied.
        assert!(Arc::ptr_eq(&before_text, &next.roots[0].children[1]));
    }

    #[test]
    fn block_layout_keeps_child_offsets() {
        let doc = Document::with_root(
            node("b1", NodeKind::Frame)
                .with_children([node("b2", NodeKind::text()).with_style(Style::new().with("left", 4))]),
        );
        let next = Mutation::UpdateStyle {
            id: NodeId::intern("b1"),
            patch: Style::new().with("display", "block"),
        }
        .apply(&doc)
        .unwrap()
        .unwrap();
        assert!(find(&next, NodeId::intern("b2")).unwrap().style.contains_key("left"));
    }

    #[test]
    fn chart_options_merge_one_level() {
        let mut chart = node("c1", NodeKind::Chart);
        chart.chart_config = Some(ChartConfig::default());
        let doc = Document::with_root(node("c0", NodeKind::Frame).with_children([chart]));

        let mut options = BTreeMap::new();
        options.insert("title".to_string(), Value::from("Revenue"));
        let next = Mutation::UpdateChartProps {
            id: NodeId::intern("c1"),
            patch: ChartPatch {
                variant: Some(ChartVariant::Donut),
                options,
            },
        }
        .apply(&doc)
        .unwrap()
        .unwrap();

        let config = find(&next, NodeId::intern("c1")).unwrap().chart_config.clone().unwrap();
        assert_eq!(config.variant, ChartVariant::Donut);
        assert_eq!(config.options.get("title"), Some(&Value::from("Revenue")));
        assert_eq!(config.options.get("showLegend"), Some(&Value::from(true)));
    }

    #[test]
    fn new_data_resets_column_mapping() {
        let mut chart = node("d1", NodeKind::Chart);
        let mut config = ChartConfig::default();
        config.options.insert("labelKey".into(), Value::from("month"));
        config.options.insert("valueKey".into(), Value::from("sales"));
        chart.chart_config = Some(config);
        let doc = Document::with_root(node("d0", NodeKind::Frame).with_children([chart]));

        let row: Row = [("region".to_string(), Value::from("EU"))].into_iter().collect();
        let next = Mutation::UpdateData {
            id: NodeId::intern("d1"),
            rows: vec![row.clone()],
        }
        .apply(&doc)
        .unwrap()
        .unwrap();

        let chart = find(&next, NodeId::intern("d1")).unwrap();
        assert_eq!(chart.data, Some(vec![row]));
        let options = &chart.chart_config.as_ref().unwrap().options;
        assert_eq!(options.get("labelKey"), Some(&Value::from("")));
        assert_eq!(options.get("valueKey"), Some(&Value::from("")));
    }

    #[test]
    fn props_patch_sets_several_fields() {
        let doc = sample();
        let patch = NodePatch {
            name: Some("Call to action".into()),
            content: Some("Buy now".into()),
            data_source_id: Some("sales_q3".into()),
            ..Default::default()
        };
        let next = Mutation::UpdateProps {
            id: NodeId::intern("m3"),
            patch: Box::new(patch),
        }
        .apply(&doc)
        .unwrap()
        .unwrap();

        let button = find(&next, NodeId::intern("m3")).unwrap();
        assert_eq!(button.name, "Call to action");
        assert_eq!(button.kind, NodeKind::Button { label: "Buy now".into() });
        assert_eq!(button.data_source_id.as_deref(), Some("sales_q3"));
    }

    #[test]
    fn cyclic_move_is_rejected() {
        let doc = sample();
        let err = Mutation::MoveNode {
            dragged: NodeId::intern("m2"),
            target: Some(NodeId::intern("m4")),
            position: DropPosition::Inside,
        }
        .apply(&doc)
        .unwrap_err();
        assert_eq!(
            err,
            EditError::CyclicMove {
                dragged: NodeId::intern("m2"),
                target: NodeId::intern("m4"),
            }
        );
    }

    #[test]
    fn move_to_canvas_appends_to_root() {
        let doc = sample();
        let next = Mutation::MoveNode {
            dragged: NodeId::intern("m4"),
            target: None,
            position: DropPosition::Before,
        }
        .apply(&doc)
        .unwrap()
        .unwrap();
        let root = next.root().unwrap();
        assert_eq!(root.children.last().unwrap().id, NodeId::intern("m4"));
        assert!(find(&next, NodeId::intern("m2")).unwrap().children.is_empty());
    }

    #[test]
    fn leaves_take_siblings_not_children() {
        let doc = sample();
        let added = Mutation::AddNode {
            parent: Some(NodeId::intern("m3")),
            node: Box::new(node("m5", NodeKind::text())),
        }
        .apply(&doc)
        .unwrap()
        .unwrap();
        assert!(find(&added, NodeId::intern("m3")).unwrap().children.is_empty());
        let root = added.root().unwrap();
        let order: Vec<&str> = root.children.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(order, ["m2", "m3", "m5"]);

        let moved = Mutation::MoveNode {
            dragged: NodeId::intern("m4"),
            target: Some(NodeId::intern("m3")),
            position: DropPosition::Inside,
        }
        .apply(&doc)
        .unwrap()
        .unwrap();
        assert!(find(&moved, NodeId::intern("m3")).unwrap().children.is_empty());
        assert_eq!(tree::find_parent(&moved, NodeId::intern("m4")), Some(NodeId::intern("m1")));
        assert_eq!(moved.root().unwrap().children.last().unwrap().id, NodeId::intern("m4"));
    }

    #[test]
    fn stale_ids_are_noops() {
        let doc = sample();
        let ghost = NodeId::intern("ghost");
        let requests = [
            Mutation::RemoveNode { id: ghost },
            Mutation::MoveNode {
                dragged: ghost,
                target: Some(NodeId::intern("m2")),
                position: DropPosition::Inside,
            },
            Mutation::MoveNode {
                dragged: NodeId::intern("m3"),
                target: Some(ghost),
                position: DropPosition::After,
            },
            Mutation::UpdateStyle {
                id: ghost,
                patch: Style::new().with("color", "red"),
            },
            Mutation::UpdateData {
                id: ghost,
                rows: Vec::new(),
            },
            Mutation::AddNode {
                parent: Some(ghost),
                node: Box::new(Node::create(NodeKind::Container)),
            },
            Mutation::UpdateChartProps {
                id: ghost,
                patch: ChartPatch {
                    variant: Some(ChartVariant::Pie),
                    ..Default::default()
                },
            },
            Mutation::UpdateProps {
                id: ghost,
                patch: Box::new(NodePatch {
                    name: Some("Renamed".into()),
                    ..Default::default()
                }),
            },
            Mutation::Paste {
                parent: Some(ghost),
                node: Box::new(Node::create(NodeKind::button())),
            },
        ];
        for request in requests {
            assert_eq!(request.apply(&doc), Ok(None));
        }
    }
}
