//! Geometry on top of `kurbo`: SVG path data, even-odd containment and bounds.

use kurbo::Shape;

pub use kurbo::{BezPath, PathEl, Point, Rect, Size, Vec2};

/// Parse SVG path data into an outline whose subpaths are all closed.
///
/// Any command `kurbo` understands is accepted; the data must open with a
/// moveto.
pub fn parse_path(d: &str) -> Result<BezPath, String> {
    match d.trim_start().chars().next() {
        Some('M' | 'm') => {}
        Some(other) => return Err(format!("path must start with `M`, found `{other}`")),
        None => return Err("empty path".to_string()),
    }
    let path = BezPath::from_svg(d).map_err(|e| format!("invalid path data: {e}"))?;
    Ok(close_subpaths(&path))
}

/// Append a `ClosePath` to every subpath that draws something and is left open.
pub fn close_subpaths(path: &BezPath) -> BezPath {
    let mut closed = BezPath::new();
    let mut open = false;
    for el in path.elements() {
        match el {
            PathEl::MoveTo(_) => {
                if open {
                    closed.close_path();
                    open = false;
                }
            }
            PathEl::ClosePath => open = false,
            _ => open = true,
        }
        closed.push(*el);
    }
    if open {
        closed.close_path();
    }
    closed
}

/// Even-odd fill rule over all subpaths: a point inside a hole is outside.
pub fn contains_even_odd(path: &BezPath, p: Point) -> bool {
    path.winding(p) % 2 != 0
}

/// Exact bounding box, or `None` for an outline with no area.
pub fn area_bounds(path: &BezPath) -> Option<Rect> {
    let bounds = path.bounding_box();
    (bounds.width() > 0.0 && bounds.height() > 0.0).then_some(bounds)
}
