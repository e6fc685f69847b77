use std::sync::LazyLock;

use territory_shared::basemap::{BASE_LAYERS, LANDMARKS, LayerKind};
use territory_shared::colors::{REGION_GLOW, REGION_STROKE, REGION_STROKE_HOVER, Rgba};
use territory_shared::geometry::{BezPath, PathEl, parse_path};
use territory_shared::intensity::NEUTRAL_FILL;
use territory_shared::{IntensityScale, Metric, Size, StatsMap, Viewport, registry};
use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

const BACKGROUND: &str = "#f8f5f0";
const GRID_LINE: &str = "rgba(0,0,0,0.03)";
const GRID_SPACING: f64 = 40.0;
const LANDMARK_DOT: Rgba = Rgba::new(148, 163, 184, 0.4);
const LANDMARK_TEXT: Rgba = Rgba::new(100, 116, 139, 0.4);
const BADGE_FILL: Rgba = Rgba::new(255, 255, 255, 0.9);
const BADGE_STROKE: Rgba = Rgba::new(226, 232, 240, 1.0);
const BADGE_TEXT: Rgba = Rgba::new(15, 23, 42, 1.0);

/// How one base-map layer is painted, in virtual units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LayerStyle {
    pub fill: Option<Rgba>,
    pub stroke: Option<(Rgba, f64)>,
    pub dash: Option<(f64, f64)>,
}

pub(crate) fn layer_style(kind: LayerKind) -> LayerStyle {
    match kind {
        LayerKind::Waterway => LayerStyle {
            fill: Some(Rgba::new(239, 246, 255, 0.8)),
            stroke: None,
            dash: None,
        },
        LayerKind::Land => LayerStyle {
            fill: Some(Rgba::new(255, 255, 255, 1.0)),
            stroke: Some((Rgba::new(226, 232, 240, 1.0), 1.0)),
            dash: None,
        },
        LayerKind::Ocean => LayerStyle {
            fill: Some(Rgba::new(219, 234, 254, 0.4)),
            stroke: Some((Rgba::new(191, 219, 254, 0.2), 2.0)),
            dash: None,
        },
        LayerKind::Highway => LayerStyle {
            fill: None,
            stroke: Some((Rgba::new(251, 191, 36, 0.4), 4.0)),
            dash: None,
        },
        LayerKind::Turnpike => LayerStyle {
            fill: None,
            stroke: Some((Rgba::new(203, 213, 225, 1.0), 2.5)),
            dash: Some((10.0, 5.0)),
        },
    }
}

/// Fill for a region: its tier color, or neutral when it has no stats entry.
pub(crate) fn region_fill(
    stats: &StatsMap,
    scale: &IntensityScale,
    region_id: &str,
    metric: Metric,
) -> Rgba {
    match stats.get(region_id) {
        Some(entry) => scale.tier(entry, metric).fill(),
        None => NEUTRAL_FILL,
    }
}

static BASE_PATHS: LazyLock<Vec<(LayerKind, BezPath)>> = LazyLock::new(|| {
    BASE_LAYERS
        .iter()
        .filter_map(|layer| parse_path(layer.path).ok().map(|p| (layer.kind, p)))
        .collect()
});

pub(crate) struct Frame<'a> {
    pub css_size: Size,
    pub dpr: f64,
    pub viewport: &'a Viewport,
    pub stats: &'a StatsMap,
    pub metric: Metric,
    pub hovered: Option<&'a str>,
}

pub(crate) fn draw_frame(ctx: &CanvasRenderingContext2d, frame: &Frame<'_>) {
    let dpr = frame.dpr;
    ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0).ok();
    ctx.set_fill_style_str(BACKGROUND);
    ctx.fill_rect(0.0, 0.0, frame.css_size.width, frame.css_size.height);
    draw_grid(ctx, frame.css_size);

    let scale = frame.viewport.scale();
    let pan = frame.viewport.pan();
    ctx.set_transform(dpr * scale, 0.0, 0.0, dpr * scale, dpr * pan.x, dpr * pan.y)
        .ok();

    draw_base_map(ctx);
    draw_regions(ctx, frame);
}

fn draw_grid(ctx: &CanvasRenderingContext2d, size: Size) {
    ctx.set_stroke_style_str(GRID_LINE);
    ctx.set_line_width(1.0);
    ctx.begin_path();
    let mut x = 0.0;
    while x <= size.width {
        ctx.move_to(x + 0.5, 0.0);
        ctx.line_to(x + 0.5, size.height);
        x += GRID_SPACING;
    }
    let mut y = 0.0;
    while y <= size.height {
        ctx.move_to(0.0, y + 0.5);
        ctx.line_to(size.width, y + 0.5);
        y += GRID_SPACING;
    }
    ctx.stroke();
}

fn trace(ctx: &CanvasRenderingContext2d, path: &BezPath) {
    ctx.begin_path();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => ctx.move_to(p.x, p.y),
            PathEl::LineTo(p) => ctx.line_to(p.x, p.y),
            PathEl::QuadTo(c, end) => ctx.quadratic_curve_to(c.x, c.y, end.x, end.y),
            PathEl::CurveTo(c1, c2, end) => {
                ctx.bezier_curve_to(c1.x, c1.y, c2.x, c2.y, end.x, end.y)
            }
            PathEl::ClosePath => ctx.close_path(),
        }
    }
}

fn draw_base_map(ctx: &CanvasRenderingContext2d) {
    for (kind, path) in BASE_PATHS.iter() {
        let style = layer_style(*kind);
        trace(ctx, path);
        if let Some(fill) = style.fill {
            ctx.set_fill_style_str(&fill.css());
            ctx.fill();
        }
        if let Some((color, width)) = style.stroke {
            set_dash(ctx, style.dash);
            ctx.set_stroke_style_str(&color.css());
            ctx.set_line_width(width);
            ctx.stroke();
        }
    }
    set_dash(ctx, None);

    ctx.set_font("900 14px Inter, system-ui, sans-serif");
    ctx.set_text_align("right");
    ctx.set_text_baseline("middle");
    for landmark in LANDMARKS {
        ctx.begin_path();
        ctx.arc(landmark.at.x, landmark.at.y, 5.0, 0.0, std::f64::consts::TAU)
            .ok();
        ctx.set_fill_style_str(&LANDMARK_DOT.css());
        ctx.fill();
        ctx.set_fill_style_str(&LANDMARK_TEXT.css());
        ctx.fill_text(
            &landmark.label.to_uppercase(),
            landmark.at.x - 16.0,
            landmark.at.y,
        )
        .ok();
    }
}

fn set_dash(ctx: &CanvasRenderingContext2d, dash: Option<(f64, f64)>) {
    let segments = js_sys::Array::new();
    if let Some((on, off)) = dash {
        segments.push(&JsValue::from_f64(on));
        segments.push(&JsValue::from_f64(off));
    }
    ctx.set_line_dash(&segments).ok();
}

fn draw_regions(ctx: &CanvasRenderingContext2d, frame: &Frame<'_>) {
    let scale = IntensityScale::from_stats(frame.stats);
    let regions = registry().regions();

    for region in regions {
        let hovered = frame.hovered == Some(region.id);
        trace(ctx, &region.outline);

        if hovered {
            ctx.save();
            ctx.set_shadow_color(&REGION_GLOW.css());
            ctx.set_shadow_blur(16.0);
            ctx.set_fill_style_str(&REGION_GLOW.css());
            ctx.fill();
            ctx.restore();
        }

        let fill = region_fill(frame.stats, &scale, region.id, frame.metric);
        ctx.set_fill_style_str(&fill.css());
        ctx.fill();

        let (stroke, width) = if hovered {
            (REGION_STROKE_HOVER, 3.0)
        } else {
            (REGION_STROKE, 2.0)
        };
        ctx.set_stroke_style_str(&stroke.css());
        ctx.set_line_width(width);
        ctx.stroke();
    }

    ctx.set_font("900 14px Inter, system-ui, sans-serif");
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    for region in regions {
        let at = region.label_anchor;
        let (w, h) = (64.0, 26.0);
        ctx.set_fill_style_str(&BADGE_FILL.css());
        ctx.fill_rect(at.x - w / 2.0, at.y - h / 2.0, w, h);
        ctx.set_stroke_style_str(&BADGE_STROKE.css());
        ctx.set_line_width(1.0);
        ctx.stroke_rect(at.x - w / 2.0, at.y - h / 2.0, w, h);
        ctx.set_fill_style_str(&BADGE_TEXT.css());
        ctx.fill_text(region.id, at.x, at.y).ok();
    }
}
