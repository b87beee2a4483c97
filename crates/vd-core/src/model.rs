//! Core document-tree data model for VisualDraft.
//!
//! A document is an ordered forest of `Node` values (in practice a single
//! root Frame). Parents exclusively own their children. Children are held
//! behind `Arc` so that cloning a `Node` or `Document` shares every subtree:
//! edits copy only the path from the root to the edited node, which keeps
//! undo snapshots cheap and independent of the live document.

use crate::id::NodeId;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

// ─── Scalar values ───────────────────────────────────────────────────────

/// A scalar used for style values, data-row cells, and chart options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

// ─── Style ───────────────────────────────────────────────────────────────

/// Style property keys with engine-level meaning. Everything else is opaque
/// to the engine and interpreted by the rendering layer.
pub mod keys {
    pub const DISPLAY: &str = "display";
    pub const POSITION: &str = "position";
    pub const LEFT: &str = "left";
    pub const TOP: &str = "top";
    pub const RIGHT: &str = "right";
    pub const BOTTOM: &str = "bottom";

    /// Offsets that only mean something under free positioning.
    pub const OFFSETS: [&str; 4] = [LEFT, TOP, RIGHT, BOTTOM];

    /// `display` values whose children are placed by the layout flow.
    pub const FLOW_LAYOUTS: [&str; 2] = ["flex", "grid"];

    /// `position` value for nodes placed by their parent's layout flow.
    pub const RELATIVE: &str = "relative";
}

/// Insertion-ordered mapping of style property name → value.
///
/// Overwriting a key keeps its original position; new keys append.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style {
    entries: SmallVec<[(String, Value); 6]>,
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    /// Shallow merge: keys in `patch` overwrite, all others are retained.
    pub fn merge(&mut self, patch: &Style) {
        for (k, v) in patch.iter() {
            self.set(k, v.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Builder-style `set`, handy for defaults and tests.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }
}

impl Serialize for Style {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Style {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct StyleVisitor;

        impl<'de> Visitor<'de> for StyleVisitor {
            type Value = Style;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of style properties")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Style, A::Error> {
                let mut style = Style::new();
                while let Some((key, value)) = access.next_entry::<String, Value>()? {
                    style.set(key, value);
                }
                Ok(style)
            }
        }

        deserializer.deserialize_map(StyleVisitor)
    }
}

// ─── Chart data ──────────────────────────────────────────────────────────

/// One data record: heterogeneous column name → scalar.
pub type Row = BTreeMap<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartVariant {
    #[default]
    Bar,
    Line,
    Pie,
    Donut,
    BarHorizontal,
}

/// Chart option keys the engine itself resets.
pub mod chart_keys {
    pub const LABEL_KEY: &str = "labelKey";
    pub const VALUE_KEY: &str = "valueKey";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    pub variant: ChartVariant,
    #[serde(default)]
    pub options: BTreeMap<String, Value>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        let options = [
            (chart_keys::LABEL_KEY, Value::from("")),
            (chart_keys::VALUE_KEY, Value::from("")),
            ("title", Value::from("")),
            ("showLegend", Value::from(true)),
            ("showGrid", Value::from(true)),
            ("color", Value::from("#6366f1")),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            variant: ChartVariant::Bar,
            options,
        }
    }
}

impl ChartConfig {
    /// Forget which columns feed the labels and values.
    pub fn clear_column_mapping(&mut self) {
        for key in [chart_keys::LABEL_KEY, chart_keys::VALUE_KEY] {
            self.options.insert(key.to_string(), Value::from(""));
        }
    }
}

// ─── Nodes ───────────────────────────────────────────────────────────────

/// The node kinds of the design document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NodeKind {
    /// Top-level artboard. Always accepts drops as children.
    Frame,
    /// Layout box grouping other nodes.
    Container,
    Button { label: String },
    Text { content: String },
    /// Data visualisation; its rows and config live on the `Node`.
    Chart,
}

impl NodeKind {
    /// Display name, also used as the prefix for fresh IDs.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Frame => "Frame",
            NodeKind::Container => "Container",
            NodeKind::Button { .. } => "Button",
            NodeKind::Text { .. } => "Text",
            NodeKind::Chart => "Chart",
        }
    }

    fn id_prefix(&self) -> &'static str {
        match self {
            NodeKind::Frame => "frame",
            NodeKind::Container => "container",
            NodeKind::Button { .. } => "button",
            NodeKind::Text { .. } => "text",
            NodeKind::Chart => "chart",
        }
    }

    /// Whether nodes of this kind hold children.
    pub fn accepts_children(&self) -> bool {
        match self {
            NodeKind::Frame | NodeKind::Container => true,
            NodeKind::Button { .. } | NodeKind::Text { .. } | NodeKind::Chart => false,
        }
    }

    /// Whether a drop anywhere over this node means "inside".
    pub fn always_accepts_drop(&self) -> bool {
        match self {
            NodeKind::Frame => true,
            NodeKind::Container
            | NodeKind::Button { .. }
            | NodeKind::Text { .. }
            | NodeKind::Chart => false,
        }
    }

    /// Kind with its default payload (`Button` label, `Text` content).
    pub fn button() -> Self {
        NodeKind::Button {
            label: "Button".into(),
        }
    }

    pub fn text() -> Self {
        NodeKind::Text {
            content: "Text".into(),
        }
    }

    /// Style a freshly created node of this kind starts with.
    pub fn default_style(&self) -> Style {
        match self {
            NodeKind::Frame => Style::new()
                .with("width", 1200)
                .with("height", 800)
                .with("background", "#ffffff")
                .with(keys::POSITION, keys::RELATIVE)
                .with("overflow", "hidden"),
            NodeKind::Container => Style::new()
                .with(keys::DISPLAY, "flex")
                .with("flexDirection", "column")
                .with("gap", 8)
                .with("padding", 16)
                .with("minHeight", 80)
                .with("background", "#f8fafc")
                .with("borderRadius", 8),
            NodeKind::Button { .. } => Style::new()
                .with("padding", "8px 16px")
                .with("background", "#6366f1")
                .with("color", "#ffffff")
                .with("borderRadius", 6)
                .with("fontSize", 14),
            NodeKind::Text { .. } => Style::new().with("fontSize", 16).with("color", "#0f172a"),
            NodeKind::Chart => Style::new().with("width", 400).with("height", 300),
        }
    }
}

/// A single element of the document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique within the document; never changes after creation.
    pub id: NodeId,

    #[serde(flatten)]
    pub kind: NodeKind,

    /// Display label shown in the layers panel.
    pub name: String,

    #[serde(default)]
    pub style: Style,

    /// Owned children, in paint order. Empty for leaf kinds.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Arc<Node>>,

    /// Chart rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Row>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_config: Option<ChartConfig>,

    /// Weak reference to an externally owned data table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source_id: Option<String>,
}

impl Node {
    /// A bare node: the kind's display name, no style, no children.
    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            name: kind.name().to_string(),
            kind,
            style: Style::new(),
            children: Vec::new(),
            data: None,
            chart_config: None,
            data_source_id: None,
        }
    }

    /// A node with a fresh ID and the kind-specific defaults applied.
    pub fn create(kind: NodeKind) -> Self {
        let mut node = Self::new(NodeId::with_prefix(kind.id_prefix()), kind);
        node.style = node.kind.default_style();
        if matches!(node.kind, NodeKind::Chart) {
            node.data = Some(Vec::new());
            node.chart_config = Some(ChartConfig::default());
        }
        node
    }

    /// Copy of this subtree where every node, descendants included,
    /// carries a fresh ID.
    pub fn with_fresh_ids(&self) -> Node {
        let mut copy = self.clone();
        copy.id = NodeId::with_prefix(self.kind.id_prefix());
        copy.children = self
            .children
            .iter()
            .map(|child| Arc::new(child.with_fresh_ids()))
            .collect();
        copy
    }

    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children = children.into_iter().map(Arc::new).collect();
        self
    }

    #[must_use]
    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Number of nodes in this subtree, self included.
    pub fn subtree_size(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(|c| c.subtree_size())
            .sum::<usize>()
    }

    /// IDs of this subtree in pre-order.
    pub fn collect_ids(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.subtree_size());
        self.collect_ids_into(&mut out);
        out
    }

    fn collect_ids_into(&self, out: &mut Vec<NodeId>) {
        out.push(self.id);
        for child in &self.children {
            child.collect_ids_into(out);
        }
    }
}

// ─── Document ────────────────────────────────────────────────────────────

/// The full ordered forest being edited.
///
/// Cloning is O(top-level count): subtrees are shared, never copied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    pub roots: Vec<Arc<Node>>,
}

impl Document {
    /// A document holding a single root node.
    pub fn with_root(root: Node) -> Self {
        Self {
            roots: vec![Arc::new(root)],
        }
    }

    /// A document with one default Artboard frame.
    pub fn blank() -> Self {
        let mut frame = Node::create(NodeKind::Frame);
        frame.name = "Artboard".into();
        Self::with_root(frame)
    }

    /// The root Frame: the first top-level node.
    pub fn root(&self) -> Option<&Node> {
        self.roots.first().map(|n| n.as_ref())
    }

    pub fn root_id(&self) -> Option<NodeId> {
        self.root().map(|n| n.id)
    }

    pub fn node_count(&self) -> usize {
        self.roots.iter().map(|n| n.subtree_size()).sum()
    }

    /// Every ID in pre-order.
    pub fn ids(&self) -> Vec<NodeId> {
        self.roots.iter().flat_map(|n| n.collect_ids()).collect()
    }

    /// True if no ID appears twice.
    pub fn has_unique_ids(&self) -> bool {
        let ids = self.ids();
        let unique: std::collections::HashSet<_> = ids.iter().collect();
        unique.len() == ids.len()
    }
}
