use serde::Serialize;

/// An sRGB color with straight alpha.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Format as a CSS color string.
    pub fn css(&self) -> String {
        rgba_css(self.r, self.g, self.b, self.a)
    }

    pub fn with_alpha(self, a: f64) -> Self {
        Self { a, ..self }
    }

    /// Brighten by a factor (1.0 = no change, >1.0 = brighter), keeping alpha.
    pub fn brighten(self, factor: f64) -> Self {
        let (r, g, b) = brighten(self.r, self.g, self.b, factor);
        Self { r, g, b, a: self.a }
    }
}

/// Format RGBA as a CSS color string.
pub fn rgba_css(r: u8, g: u8, b: u8, a: f64) -> String {
    format!("rgba({r},{g},{b},{a})")
}

pub fn brighten(r: u8, g: u8, b: u8, factor: f64) -> (u8, u8, u8) {
    (
        ((r as f64 * factor).min(255.0)) as u8,
        ((g as f64 * factor).min(255.0)) as u8,
        ((b as f64 * factor).min(255.0)) as u8,
    )
}

/// Region outline at rest.
pub const REGION_STROKE: Rgba = Rgba::new(37, 99, 235, 0.4);
/// Region outline while hovered.
pub const REGION_STROKE_HOVER: Rgba = Rgba::new(37, 99, 235, 1.0);
/// Soft glow drawn under a hovered region.
pub const REGION_GLOW: Rgba = Rgba::new(59, 130, 246, 0.2);
