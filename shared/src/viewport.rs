use serde::Serialize;

use crate::geometry::{Point, Size, Vec2};

pub const MIN_SCALE: f64 = 0.5;
pub const MAX_SCALE: f64 = 3.0;
pub const DEFAULT_SCALE: f64 = 1.1;
pub const ZOOM_STEP: f64 = 0.2;

/// Pan/zoom transform from virtual-canvas coordinates to container pixels.
///
/// Starts locked and centered on a target point. Every command is total:
/// commands that don't apply in the current state are no-ops.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pan_x: f64,
    pan_y: f64,
    scale: f64,
    locked: bool,
    dragging: bool,
    #[serde(skip)]
    drag_start: Vec2,
    #[serde(skip)]
    container: Size,
    #[serde(skip)]
    target: Point,
}

impl Viewport {
    /// Initial state for a container, centered on `target` at the default scale.
    pub fn new(container: Size, target: Point) -> Self {
        let mut vp = Self {
            pan_x: 0.0,
            pan_y: 0.0,
            scale: DEFAULT_SCALE,
            locked: true,
            dragging: false,
            drag_start: Vec2::ZERO,
            container,
            target,
        };
        vp.center();
        vp
    }

    pub fn pan(&self) -> Point {
        Point::new(self.pan_x, self.pan_y)
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn container(&self) -> Size {
        self.container
    }

    pub fn target(&self) -> Point {
        self.target
    }

    /// Place the target point at the container's center at the current scale.
    pub fn center(&mut self) {
        let mid = self.container.to_rect().center();
        self.pan_x = mid.x - self.target.x * self.scale;
        self.pan_y = mid.y - self.target.y * self.scale;
    }

    /// New container dimensions. Re-centers.
    pub fn resize(&mut self, container: Size) {
        self.container = container;
        self.center();
    }

    pub fn begin_drag(&mut self, pointer: Point) {
        if self.locked {
            return;
        }
        self.dragging = true;
        self.drag_start = pointer - self.pan();
    }

    pub fn update_drag(&mut self, pointer: Point) {
        if !self.dragging || self.locked {
            return;
        }
        let pan = pointer - self.drag_start;
        self.pan_x = pan.x;
        self.pan_y = pan.y;
    }

    pub fn end_drag(&mut self) {
        self.dragging = false;
    }

    /// Zoom is anchored at the virtual origin: pan is left as is.
    pub fn zoom_in(&mut self) {
        self.set_scale(self.scale + ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_scale(self.scale - ZOOM_STEP);
    }

    fn set_scale(&mut self, scale: f64) {
        self.scale = scale.clamp(MIN_SCALE, MAX_SCALE);
    }

    /// Locking also ends any drag in progress.
    pub fn toggle_lock(&mut self) {
        self.locked = !self.locked;
        if self.locked {
            self.dragging = false;
        }
    }

    pub fn reset(&mut self) {
        self.scale = DEFAULT_SCALE;
        self.center();
    }

    pub fn virtual_to_screen(&self, p: Point) -> Point {
        Point::new(p.x * self.scale + self.pan_x, p.y * self.scale + self.pan_y)
    }

    pub fn screen_to_virtual(&self, p: Point) -> Point {
        Point::new(
            (p.x - self.pan_x) / self.scale,
            (p.y - self.pan_y) / self.scale,
        )
    }

    /// CSS transform applying this viewport to an element whose origin is the virtual origin.
    pub fn css_transform(&self) -> String {
        format!(
            "translate({}px, {}px) scale({})",
            self.pan_x, self.pan_y, self.scale
        )
    }
}
