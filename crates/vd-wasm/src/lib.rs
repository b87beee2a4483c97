//! WASM bridge for VisualDraft: exposes the editing engine to the page.
//!
//! Compiled via `wasm-pack build --target web`. The page owns rendering and
//! DOM listeners; every change to the document or the viewport goes through
//! `VdCanvas`. Complex arguments cross the boundary as JSON strings.

mod import;
mod logging;

pub use import::{ImportError, rows_from_json};

use log::LevelFilter;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use vd_core::tree::DropPosition;
use vd_core::{Document, NodeId, NodeKind, Point, Rect, Size, Style};
use vd_editor::input::{InputEvent, Modifiers, PointerButton};
use vd_editor::shortcuts::{ShortcutAction, ShortcutMap};
use vd_editor::tables::MemoryTables;
use vd_editor::{
    Change, ChartPatch, EditError, EditorConfig, EditorSession, NodePatch, ViewportController,
};
use wasm_bindgen::prelude::*;

/// Wheel delta applied by the keyboard zoom shortcuts.
const KEY_ZOOM_STEP: f64 = 100.0;

/// The page-facing editor controller.
///
/// Holds the editing session, the viewport, and the data tables the page
/// has registered for binding.
#[wasm_bindgen]
pub struct VdCanvas {
    session: EditorSession,
    viewport: ViewportController,
    tables: MemoryTables,
    width: f64,
    height: f64,
    /// Space bar held: primary drags pan instead of selecting.
    space_held: bool,
}

/// A rendered element's box as reported by the page, in content space.
#[derive(Debug, Deserialize)]
struct ElementRect {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

#[wasm_bindgen]
impl VdCanvas {
    /// Create a controller over a blank document, for a canvas of the
    /// given size.
    #[wasm_bindgen(constructor)]
    pub fn new(width: f64, height: f64) -> Self {
        Self::with_config(width, height, EditorConfig::default())
    }

    /// Like `new`, with an `EditorConfig` JSON object. Missing fields take
    /// their defaults; malformed JSON falls back to the defaults entirely.
    pub fn new_with_config(width: f64, height: f64, config_json: &str) -> Self {
        let config = parse_json::<EditorConfig>("editor config", config_json).unwrap_or_default();
        Self::with_config(width, height, config)
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    // ─── Document ────────────────────────────────────────────────────────

    /// The whole document as a JSON array of root nodes.
    pub fn document_json(&self) -> String {
        serde_json::to_string(self.session.document()).unwrap_or_else(|e| {
            log::error!("document serialization failed: {e}");
            "[]".to_string()
        })
    }

    /// Replace the document with `json`, dropping history and selection.
    /// Returns `false` (keeping the current document) if it does not parse.
    pub fn load_document(&mut self, json: &str) -> bool {
        let Some(document) = parse_json::<Document>("document", json) else {
            return false;
        };
        if document.roots.is_empty() || !document.has_unique_ids() {
            log::warn!("rejected document: it needs a root and unique ids");
            return false;
        }
        self.session.reset(document);
        true
    }

    /// The selected node ID, or empty string if none.
    pub fn selected_id(&self) -> String {
        self.session
            .selected()
            .map(|id| id.as_str().to_string())
            .unwrap_or_default()
    }

    /// Select a node; an empty ID clears the selection.
    pub fn select(&mut self, node_id: &str) -> bool {
        self.session.select(parse_id(node_id))
    }

    pub fn can_undo(&self) -> bool {
        self.session.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.session.can_redo()
    }

    // ─── Mutations ───────────────────────────────────────────────────────

    /// Add a node of `kind` under `parent_id` (root if empty), with style
    /// overrides from `style_json`. Returns the new ID, or empty string.
    pub fn add_node(&mut self, kind: &str, parent_id: &str, style_json: &str) -> String {
        let Some(kind) = parse_kind(kind) else {
            log::warn!("unknown node kind `{kind}`");
            return String::new();
        };
        let style = if style_json.trim().is_empty() {
            Style::new()
        } else {
            match parse_json::<Style>("style", style_json) {
                Some(style) => style,
                None => return String::new(),
            }
        };
        self.session
            .add_node(kind, parse_id(parent_id), &style)
            .map(|id| id.as_str().to_string())
            .unwrap_or_default()
    }

    /// Returns `{"ok":true,"changed":bool}` or `{"ok":false,"error":"..."}`.
    pub fn remove_node(&mut self, node_id: &str) -> String {
        let Some(id) = parse_id(node_id) else {
            return outcome(Ok(Change::Unchanged));
        };
        outcome(self.session.remove_node(id))
    }

    /// Move `dragged_id` relative to `target_id` (`"before"`, `"after"`,
    /// `"inside"`). An empty target means the canvas: append to the root.
    pub fn move_node(&mut self, dragged_id: &str, target_id: &str, position: &str) -> String {
        let Some(dragged) = parse_id(dragged_id) else {
            return outcome(Ok(Change::Unchanged));
        };
        let Some(position) = parse_position(position) else {
            return error_json(&format!("unknown drop position `{position}`"));
        };
        outcome(self.session.move_node(dragged, parse_id(target_id), position))
    }

    /// Merge a style patch. Returns `true` if the document changed.
    pub fn update_style(&mut self, node_id: &str, patch_json: &str) -> bool {
        let (Some(id), Some(patch)) = (parse_id(node_id), parse_json::<Style>("style", patch_json))
        else {
            return false;
        };
        self.session.update_style(id, patch).applied()
    }

    /// Merge chart options (`{"variant": "line", "options": {...}}`).
    pub fn update_chart_props(&mut self, node_id: &str, patch_json: &str) -> bool {
        let (Some(id), Some(patch)) = (
            parse_id(node_id),
            parse_json::<ChartPatch>("chart patch", patch_json),
        ) else {
            return false;
        };
        self.session.update_chart_props(id, patch).applied()
    }

    /// Patch arbitrary node fields (`name`, `style`, `data`, `content`, ...).
    pub fn update_props(&mut self, node_id: &str, patch_json: &str) -> bool {
        let (Some(id), Some(patch)) = (
            parse_id(node_id),
            parse_json::<NodePatch>("node patch", patch_json),
        ) else {
            return false;
        };
        self.session.update_props(id, patch).applied()
    }

    /// Replace a chart's rows with a JSON array of flat objects.
    /// Returns `{"ok":true,"changed":bool,"rows":n}` or `{"ok":false,"error":"..."}`.
    pub fn import_rows(&mut self, node_id: &str, rows_json: &str) -> String {
        let rows = match rows_from_json(rows_json) {
            Ok(rows) => rows,
            Err(e) => {
                log::warn!("row import rejected: {e}");
                return error_json(&e.to_string());
            }
        };
        let count = rows.len();
        let changed = parse_id(node_id).is_some_and(|id| self.session.update_data(id, rows).applied());
        json!({ "ok": true, "changed": changed, "rows": count }).to_string()
    }

    /// Register (or replace) a data table the page owns.
    pub fn set_table(&mut self, table_id: &str, rows_json: &str) -> String {
        match rows_from_json(rows_json) {
            Ok(rows) => {
                let count = rows.len();
                self.tables.insert(table_id, rows);
                json!({ "ok": true, "rows": count }).to_string()
            }
            Err(e) => error_json(&e.to_string()),
        }
    }

    /// Link a chart to a registered table in one undo step.
    pub fn bind_table(&mut self, node_id: &str, table_id: &str) -> bool {
        let Some(id) = parse_id(node_id) else {
            return false;
        };
        self.session.bind_table(id, &self.tables, table_id).applied()
    }

    /// Group the following edits into one undo step, until `end_batch`.
    pub fn begin_batch(&mut self, description: &str) {
        self.session.begin_batch(description);
    }

    pub fn end_batch(&mut self) {
        self.session.end_batch();
    }

    // ─── Clipboard & history ─────────────────────────────────────────────

    /// Copy `node_id` (the selection if empty). Returns `true` on success.
    pub fn copy(&mut self, node_id: &str) -> bool {
        match parse_id(node_id).or(self.session.selected()) {
            Some(id) => self.session.copy(id).applied(),
            None => false,
        }
    }

    /// Paste under `parent_id` (selection, then root, if empty).
    /// Returns the pasted node's ID, or empty string.
    pub fn paste(&mut self, parent_id: &str) -> String {
        self.session
            .paste(parse_id(parent_id))
            .map(|id| id.as_str().to_string())
            .unwrap_or_default()
    }

    pub fn undo(&mut self) -> bool {
        self.session.undo().is_some()
    }

    pub fn redo(&mut self) -> bool {
        self.session.redo().is_some()
    }

    // ─── Drag and drop ───────────────────────────────────────────────────

    pub fn drag_begin(&mut self, node_id: &str) -> bool {
        parse_id(node_id).is_some_and(|id| self.session.begin_drag(id))
    }

    /// Pointer over `target_id`, whose box spans `top..top + height`.
    /// Returns the provisional position name, or empty string.
    pub fn drag_over(&mut self, target_id: &str, pointer_y: f64, top: f64, height: f64) -> String {
        parse_id(target_id)
            .and_then(|id| self.session.drag_over(id, pointer_y, top, height))
            .map(|p| position_name(p).to_string())
            .unwrap_or_default()
    }

    pub fn drag_over_canvas(&mut self) {
        self.session.drag_over_canvas();
    }

    pub fn drag_cancel(&mut self) {
        self.session.cancel_drag();
    }

    /// Commit the drag. Same result shape as `move_node`.
    pub fn drag_drop(&mut self) -> String {
        outcome(self.session.drop_drag())
    }

    // ─── Viewport ────────────────────────────────────────────────────────

    /// Wheel event. Zooms about the pointer when Ctrl or ⌘ is held.
    /// Returns `true` if the transform changed.
    #[allow(clippy::too_many_arguments)]
    pub fn handle_wheel(
        &mut self,
        x: f64,
        y: f64,
        delta_y: f64,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> bool {
        let event = InputEvent::Wheel {
            x,
            y,
            delta_y,
            modifiers: self.modifiers(shift, ctrl, alt, meta),
        };
        self.viewport.handle(&event)
    }

    /// Pointer down with DOM `button` code. Returns `true` if a pan started.
    #[allow(clippy::too_many_arguments)]
    pub fn handle_pointer_down(
        &mut self,
        x: f64,
        y: f64,
        button: i16,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> bool {
        let event = InputEvent::PointerDown {
            x,
            y,
            button: PointerButton::from_dom(button),
            modifiers: self.modifiers(shift, ctrl, alt, meta),
        };
        self.viewport.handle(&event)
    }

    /// Returns `true` if the canvas panned.
    pub fn handle_pointer_move(
        &mut self,
        x: f64,
        y: f64,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> bool {
        let event = InputEvent::PointerMove {
            x,
            y,
            modifiers: self.modifiers(shift, ctrl, alt, meta),
        };
        self.viewport.handle(&event)
    }

    /// Returns `true` if a pan ended.
    pub fn handle_pointer_up(
        &mut self,
        x: f64,
        y: f64,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> bool {
        let event = InputEvent::PointerUp {
            x,
            y,
            modifiers: self.modifiers(shift, ctrl, alt, meta),
        };
        self.viewport.handle(&event)
    }

    /// Center the union of `[{"x","y","width","height"}, ...]` in the canvas.
    pub fn auto_center(&mut self, rects_json: &str) -> bool {
        let Some(rects) = parse_json::<Vec<ElementRect>>("element rects", rects_json) else {
            return false;
        };
        let rects: Vec<Rect> = rects
            .iter()
            .map(|r| Rect::new(r.x, r.y, r.x + r.width, r.y + r.height))
            .collect();
        self.viewport
            .auto_center(&rects, Size::new(self.width, self.height))
    }

    pub fn zoom(&self) -> f64 {
        self.viewport.scale()
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset();
    }

    /// Content → canvas transform as `[a, b, c, d, e, f]`, ready for
    /// `CanvasRenderingContext2D.setTransform` or a CSS `matrix()`.
    pub fn transform(&self) -> Vec<f64> {
        self.viewport.transform().as_coeffs().to_vec()
    }

    /// Canvas pixel → content space, as `[x, y]`.
    pub fn screen_to_content(&self, x: f64, y: f64) -> Vec<f64> {
        let p = self.viewport.to_content(Point::new(x, y));
        vec![p.x, p.y]
    }

    // ─── Keyboard Shortcut API ───────────────────────────────────────────

    /// Handle a keydown. Returns a JSON string:
    /// `{"changed":bool, "action":"<action_name>"}`
    ///
    /// `autoCenter` is reported without acting: the page owns the element
    /// boxes and answers with `auto_center`.
    pub fn handle_key(&mut self, key: &str, shift: bool, ctrl: bool, alt: bool, meta: bool) -> String {
        let modifiers = self.modifiers(shift, ctrl, alt, meta);
        let Some(action) = ShortcutMap::resolve(key, modifiers) else {
            return r#"{"changed":false,"action":"none"}"#.to_string();
        };
        let changed = self.dispatch_action(action);
        json!({ "changed": changed, "action": action_to_name(action) }).to_string()
    }

    /// Handle a keyup. Releasing Space ends the temporary hand tool.
    pub fn handle_key_up(&mut self, key: &str) -> bool {
        if key == " " && self.space_held {
            self.space_held = false;
            self.viewport.end_pan();
            return true;
        }
        false
    }
}

// ─── Private helpers ─────────────────────────────────────────────────────

impl VdCanvas {
    fn with_config(width: f64, height: f64, config: EditorConfig) -> Self {
        logging::init(LevelFilter::Info);
        logging::panic_hook_setup();

        Self {
            session: EditorSession::new(config),
            viewport: ViewportController::new(config.zoom),
            tables: MemoryTables::new(),
            width,
            height,
            space_held: false,
        }
    }

    fn modifiers(&self, shift: bool, ctrl: bool, alt: bool, meta: bool) -> Modifiers {
        Modifiers {
            shift,
            ctrl,
            alt,
            meta,
            space: self.space_held,
        }
    }

    fn canvas_center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    fn delete_selected(&mut self) -> bool {
        let Some(id) = self.session.selected() else {
            return false;
        };
        self.session.remove_node(id).is_ok_and(Change::applied)
    }

    /// Run a shortcut action. Returns `true` if the document, selection,
    /// or view changed.
    fn dispatch_action(&mut self, action: ShortcutAction) -> bool {
        match action {
            ShortcutAction::Undo => self.undo(),
            ShortcutAction::Redo => self.redo(),
            ShortcutAction::Delete => self.delete_selected(),
            ShortcutAction::Copy => self.copy(""),
            ShortcutAction::Cut => self.copy("") && self.delete_selected(),
            ShortcutAction::Paste => !self.paste("").is_empty(),
            ShortcutAction::Deselect => {
                let had = self.session.selected().is_some();
                self.session.select(None);
                had
            }
            ShortcutAction::ZoomIn | ShortcutAction::ZoomOut => {
                let delta = if action == ShortcutAction::ZoomIn {
                    -KEY_ZOOM_STEP
                } else {
                    KEY_ZOOM_STEP
                };
                let before = self.viewport.scale();
                self.viewport.zoom_at(delta, self.canvas_center()) != before
            }
            ShortcutAction::ZoomReset => {
                self.viewport.reset();
                true
            }
            ShortcutAction::PanStart => {
                self.space_held = true;
                false
            }
            // Needs element boxes from the page.
            ShortcutAction::AutoCenter => false,
        }
    }
}

fn action_to_name(action: ShortcutAction) -> &'static str {
    match action {
        ShortcutAction::Undo => "undo",
        ShortcutAction::Redo => "redo",
        ShortcutAction::Delete => "delete",
        ShortcutAction::Copy => "copy",
        ShortcutAction::Cut => "cut",
        ShortcutAction::Paste => "paste",
        ShortcutAction::Deselect => "deselect",
        ShortcutAction::ZoomIn => "zoomIn",
        ShortcutAction::ZoomOut => "zoomOut",
        ShortcutAction::ZoomReset => "zoomReset",
        ShortcutAction::AutoCenter => "autoCenter",
        ShortcutAction::PanStart => "panStart",
    }
}

fn parse_id(s: &str) -> Option<NodeId> {
    (!s.is_empty()).then(|| NodeId::intern(s))
}

fn parse_kind(name: &str) -> Option<NodeKind> {
    match name {
        "frame" => Some(NodeKind::Frame),
        "container" => Some(NodeKind::Container),
        "button" => Some(NodeKind::button()),
        "text" => Some(NodeKind::text()),
        "chart" => Some(NodeKind::Chart),
        _ => None,
    }
}

fn parse_position(name: &str) -> Option<DropPosition> {
    match name {
        "before" => Some(DropPosition::Before),
        "after" => Some(DropPosition::After),
        "inside" => Some(DropPosition::Inside),
        _ => None,
    }
}

fn position_name(position: DropPosition) -> &'static str {
    match position {
        DropPosition::Before => "before",
        DropPosition::After => "after",
        DropPosition::Inside => "inside",
    }
}

fn parse_json<T: DeserializeOwned>(what: &str, json: &str) -> Option<T> {
    serde_json::from_str(json)
        .inspect_err(|e| log::warn!("invalid {what} JSON: {e}"))
        .ok()
}

fn outcome(result: Result<Change, EditError>) -> String {
    match result {
        Ok(change) => json!({ "ok": true, "changed": change.applied() }).to_string(),
        Err(e) => error_json(&e.to_string()),
    }
}

fn error_json(message: &str) -> String {
    json!({ "ok": false, "error": message }).to_string()
}

// ─── Standalone functions (no canvas needed) ─────────────────────────────

/// Change the console log level (`"off"`, `"error"`, ... `"trace"`).
/// Returns `false` for an unknown level name.
#[wasm_bindgen]
pub fn set_log_level(level: &str) -> bool {
    match logging::parse_level(level) {
        Some(filter) => {
            log::set_max_level(filter);
            true
        }
        None => false,
    }
}

/// Check a rows payload without touching any canvas.
/// Returns `{"ok":true,"rows":n}` or `{"ok":false,"error":"..."}`.
#[wasm_bindgen]
pub fn validate_rows(rows_json: &str) -> String {
    match rows_from_json(rows_json) {
        Ok(rows) => json!({ "ok": true, "rows": rows.len() }).to_string(),
        Err(e) => error_json(&e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value as Json;

    fn canvas() -> VdCanvas {
        VdCanvas::new(800.0, 600.0)
    }

    fn parse(s: &str) -> Json {
        serde_json::from_str(s).unwrap()
    }

    #[test]
    fn add_and_remove_round_trip() {
        let mut c = canvas();
        let id = c.add_node("container", "", r#"{"gap": 24}"#);
        assert!(!id.is_empty());
        assert_eq!(c.selected_id(), id);

        let doc = parse(&c.document_json());
        assert_eq!(doc[0]["children"][0]["style"]["gap"], 24.0);

        assert_eq!(parse(&c.remove_node(&id)), json!({"ok": true, "changed": true}));
        assert_eq!(c.selected_id(), "");
        assert!(c.undo());
        assert_eq!(parse(&c.document_json()), doc);
    }

    #[test]
    fn unknown_kind_or_style_adds_nothing() {
        let mut c = canvas();
        assert_eq!(c.add_node("slider", "", ""), "");
        assert_eq!(c.add_node("text", "", "{not json"), "");
        assert!(!c.can_undo());
    }

    #[test]
    fn removing_root_reports_error() {
        let mut c = canvas();
        let root = parse(&c.document_json())[0]["id"].as_str().unwrap().to_string();
        let res = parse(&c.remove_node(&root));
        assert_eq!(res["ok"], false);
        assert!(res["error"].as_str().unwrap().contains("root"));
    }

    #[test]
    fn bad_rows_leave_document_untouched() {
        let mut c = canvas();
        let chart = c.add_node("chart", "", "");
        let before = c.document_json();

        let res = parse(&c.import_rows(&chart, r#"[{"a": {"nested": 1}}]"#));
        assert_eq!(res["ok"], false);
        assert_eq!(c.document_json(), before);

        let res = parse(&c.import_rows(&chart, r#"[{"month": "Jan", "v": 3}]"#));
        assert_eq!(res, json!({"ok": true, "changed": true, "rows": 1}));
    }

    #[test]
    fn bound_table_feeds_chart() {
        let mut c = canvas();
        let chart = c.add_node("chart", "", "");
        assert_eq!(parse(&c.set_table("sales", r#"[{"m":"Jan"},{"m":"Feb"}]"#))["rows"], 2);
        assert!(c.bind_table(&chart, "sales"));
        assert!(!c.bind_table(&chart, "nope"));

        let doc = parse(&c.document_json());
        let node = &doc[0]["children"][0];
        assert_eq!(node["dataSourceId"], "sales");
        assert_eq!(node["data"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn cut_shortcut_then_paste() {
        let mut c = canvas();
        let id = c.add_node("button", "", "");
        let cmd = |key: &str, c: &mut VdCanvas| parse(&c.handle_key(key, false, true, false, false));

        assert_eq!(cmd("x", &mut c), json!({"changed": true, "action": "cut"}));
        assert!(!c.document_json().contains(&id));
        assert_eq!(cmd("v", &mut c)["changed"], true);
        assert_ne!(c.selected_id(), id);
        assert_ne!(c.selected_id(), "");
    }

    #[test]
    fn space_drag_pans_view() {
        let mut c = canvas();
        assert_eq!(parse(&c.handle_key(" ", false, false, false, false))["action"], "panStart");
        assert!(c.handle_pointer_down(10.0, 10.0, 0, false, false, false, false));
        assert!(c.handle_pointer_move(40.0, 30.0, false, false, false, false));
        assert!(c.handle_pointer_up(40.0, 30.0, false, false, false, false));
        assert_eq!(c.transform(), vec![1.0, 0.0, 0.0, 1.0, 30.0, 20.0]);

        assert!(c.handle_key_up(" "));
        assert!(!c.handle_pointer_down(10.0, 10.0, 0, false, false, false, false));
    }

    #[test]
    fn wheel_needs_zoom_modifier() {
        let mut c = canvas();
        assert!(!c.handle_wheel(100.0, 100.0, -100.0, false, false, false, false));
        assert!(c.handle_wheel(100.0, 100.0, -100.0, false, true, false, false));
        assert!((c.zoom() - 1.15).abs() < 1e-12);
    }

    #[test]
    fn auto_center_uses_canvas_size() {
        let mut c = canvas();
        assert!(c.auto_center(r#"[{"x":0,"y":0,"width":200,"height":100}]"#));
        assert_eq!(c.transform()[4..], [300.0, 250.0]);
        assert!(!c.auto_center("[]"));
    }

    #[test]
    fn drag_drop_via_bridge() {
        let mut c = canvas();
        let a = c.add_node("container", "", "");
        let t = c.add_node("text", "", "");
        assert!(c.drag_begin(&t));
        assert_eq!(c.drag_over(&a, 50.0, 0.0, 100.0), "inside");
        assert_eq!(parse(&c.drag_drop())["changed"], true);

        let doc = parse(&c.document_json());
        assert_eq!(doc[0]["children"][0]["children"][0]["id"], t.as_str());
    }

    #[test]
    fn config_json_sets_history_depth() {
        let mut c = VdCanvas::new_with_config(800.0, 600.0, r#"{"historyDepth": 1}"#);
        c.add_node("text", "", "");
        c.add_node("text", "", "");
        assert!(c.undo());
        assert!(!c.undo());
    }
}
