//! Canvas pan/zoom state.
//!
//! Screen position = content position × `scale` + `offset`. The controller
//! owns that mapping and the three gestures that change it:
//!
//! - **Zoom** (zoom modifier + wheel) keeps the content point under the
//!   cursor fixed on screen.
//! - **Pan** (pan modifier + primary drag, or middle drag) moves `offset` by
//!   the pointer's travel since the drag started.
//! - **Auto-center** translates the bounding box of the rendered elements
//!   onto the middle of the canvas, leaving `scale` alone.

use crate::config::ZoomConfig;
use crate::input::{InputEvent, PointerButton};
use kurbo::{Affine, Point, Rect, Size, Vec2};

#[derive(Debug, Clone, Copy, PartialEq)]
struct PanGesture {
    pointer_start: Point,
    offset_start: Vec2,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewportController {
    scale: f64,
    offset: Vec2,
    pan: Option<PanGesture>,
    config: ZoomConfig,
}

impl Default for ViewportController {
    fn default() -> Self {
        Self::new(ZoomConfig::default())
    }
}

impl ViewportController {
    pub fn new(config: ZoomConfig) -> Self {
        Self {
            scale: config.clamp(1.0),
            offset: Vec2::ZERO,
            pan: None,
            config,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn set_scale(&mut self, scale: f64) {
        self.scale = self.config.clamp(scale);
    }

    pub fn set_offset(&mut self, offset: Vec2) {
        self.offset = offset;
    }

    /// Back to 100 % with content origin at the canvas origin.
    pub fn reset(&mut self) {
        self.scale = self.config.clamp(1.0);
        self.offset = Vec2::ZERO;
        self.pan = None;
    }

    // ─── Zoom ────────────────────────────────────────────────────────────

    /// Apply one wheel step of `delta_y` (raw `WheelEvent.deltaY`) anchored at
    /// `pointer`. Negative deltas zoom in. Returns the new scale.
    pub fn zoom_at(&mut self, delta_y: f64, pointer: Point) -> f64 {
        let new_scale = self.config.clamp(self.scale + (-delta_y) * self.config.intensity);
        let anchor = self.to_content(pointer);
        self.offset = pointer.to_vec2() - anchor.to_vec2() * new_scale;
        self.scale = new_scale;
        new_scale
    }

    // ─── Pan ─────────────────────────────────────────────────────────────

    /// Start a pan gesture. Replaces any gesture already in progress.
    pub fn begin_pan(&mut self, pointer: Point) {
        self.pan = Some(PanGesture {
            pointer_start: pointer,
            offset_start: self.offset,
        });
    }

    /// Follow the pointer. No-op unless a pan is in progress.
    pub fn pan_to(&mut self, pointer: Point) -> bool {
        let Some(gesture) = self.pan else {
            return false;
        };
        self.offset = gesture.offset_start + (pointer - gesture.pointer_start);
        true
    }

    pub fn end_pan(&mut self) -> bool {
        self.pan.take().is_some()
    }

    pub fn is_panning(&self) -> bool {
        self.pan.is_some()
    }

    // ─── Auto-center ─────────────────────────────────────────────────────

    /// Center the union of `elements` (content-space rectangles) in a canvas
    /// of size `canvas`. Returns `false` and leaves the offset alone when
    /// there is nothing to center.
    pub fn auto_center(&mut self, elements: &[Rect], canvas: Size) -> bool {
        let Some(bounds) = elements.iter().copied().reduce(|acc, r| acc.union(r)) else {
            return false;
        };
        let content_center = bounds.center().to_vec2() * self.scale;
        let canvas_center = Vec2::new(canvas.width / 2.0, canvas.height / 2.0);
        self.offset = canvas_center - content_center;
        log::debug!(
            "auto-center: bounds {bounds:?} → offset ({:.1}, {:.1})",
            self.offset.x,
            self.offset.y
        );
        true
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Route a normalized input event. Returns `true` when the transform changed
    /// or a pan gesture started/ended; other events are left to the caller.
    pub fn handle(&mut self, event: &InputEvent) -> bool {
        match event {
            InputEvent::Wheel {
                x,
                y,
                delta_y,
                modifiers,
            } if modifiers.zoom() => {
                let before = self.scale;
                self.zoom_at(*delta_y, Point::new(*x, *y));
                self.scale != before
            }
            InputEvent::PointerDown {
                x,
                y,
                button,
                modifiers,
            } => {
                let pan = match button {
                    PointerButton::Primary => modifiers.pan(),
                    PointerButton::Middle => true,
                    PointerButton::Secondary => false,
                };
                if pan {
                    self.begin_pan(Point::new(*x, *y));
                }
                pan
            }
            InputEvent::PointerMove { x, y, .. } => self.pan_to(Point::new(*x, *y)),
            InputEvent::PointerUp { .. } => self.end_pan(),
            InputEvent::Wheel { .. } => false,
        }
    }

    // ─── Coordinate mapping ──────────────────────────────────────────────

    /// Canvas pixel → content space.
    pub fn to_content(&self, screen: Point) -> Point {
        ((screen.to_vec2() - self.offset) / self.scale).to_point()
    }

    /// Content space → canvas pixel.
    pub fn to_screen(&self, content: Point) -> Point {
        (content.to_vec2() * self.scale + self.offset).to_point()
    }

    /// The transform the rendering layer applies to content.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.scale)
    }
}
