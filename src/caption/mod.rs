mod compose;
mod fit;
mod font;
mod layout;
mod measure;
mod render;
mod wrap;

use serde::Serialize;

pub use compose::{CaptionLayout, CaptionOptions, CaptionRequest, compose_captions};
pub use fit::{FitConfig, FitResult, fit_caption};
pub use font::{
    FontMetrics, ResolvedCaptionFont, load_font_metrics, load_font_metrics_from_data,
    resolve_caption_font,
};
pub use layout::{PlacedLine, caption_boxes, layout_lines};
pub use measure::{EstimatedMeasurer, TextMeasurer};
pub use render::{PaintStyle, image_format_from_mime, render_svg, render_svg_bytes};
pub use wrap::{LineBreak, break_lines, force_break_lines, normalize_words};

/// Lowest and highest accepted user font scale.
pub const MIN_FONT_SCALE: f32 = 0.25;
pub const MAX_FONT_SCALE: f32 = 2.0;

/// Largest font size the fitter will ever try, in pixels.
pub const MAX_FONT_SIZE: f32 = 1000.0;

/// Axis-aligned rectangle a caption has to stay inside, in image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CaptionBox {
    pub center_x: f32,
    pub center_y: f32,
    pub width: f32,
    pub height: f32,
}

impl CaptionBox {
    pub fn left(&self) -> f32 {
        self.center_x - self.width * 0.5
    }

    pub fn top(&self) -> f32 {
        self.center_y - self.height * 0.5
    }

    /// Shrinks the box on every side, keeping the center fixed.
    pub fn inset(&self, amount: f32) -> CaptionBox {
        let amount = amount.max(0.0);
        CaptionBox {
            center_x: self.center_x,
            center_y: self.center_y,
            width: (self.width - amount * 2.0).max(0.0),
            height: (self.height - amount * 2.0).max(0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Upper,
    Lower,
}

impl Region {
    pub const ALL: [Region; 2] = [Region::Upper, Region::Lower];

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Upper => "upper",
            Region::Lower => "lower",
        }
    }
}

/// Limits used to derive a per-box starting font size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeBounds {
    pub min_size: f32,
    pub max_size: f32,
    pub growth_factor: f32,
}

impl Default for SizeBounds {
    fn default() -> Self {
        Self {
            min_size: 8.0,
            max_size: 160.0,
            growth_factor: 0.2,
        }
    }
}

/// Font parameters for one caption. Every measurement and paint call receives
/// this explicitly; nothing keeps a "current font" between calls.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleSpec {
    pub weight: u16,
    pub family: String,
    pub initial_size: f32,
    pub min_size: f32,
    pub growth_factor: f32,
}

impl StyleSpec {
    /// Starting size is `box height * growth factor * font scale`, floored to a
    /// whole pixel and kept inside the bounds.
    pub fn for_box(
        caption_box: &CaptionBox,
        family: &str,
        weight: u16,
        font_scale: f32,
        bounds: &SizeBounds,
    ) -> Self {
        let min_size = sanitize_min_size(bounds.min_size);
        let max_size = if bounds.max_size.is_finite() {
            bounds.max_size.min(MAX_FONT_SIZE).max(min_size)
        } else {
            min_size
        };
        let scale = clamp_font_scale(font_scale);
        let raw = (caption_box.height * bounds.growth_factor * scale).floor();
        let initial_size = if raw.is_finite() {
            raw.clamp(min_size, max_size)
        } else {
            min_size
        };
        Self {
            weight,
            family: family.to_string(),
            initial_size,
            min_size,
            growth_factor: bounds.growth_factor,
        }
    }
}

pub fn clamp_font_scale(scale: f32) -> f32 {
    if scale.is_finite() {
        scale.clamp(MIN_FONT_SCALE, MAX_FONT_SCALE)
    } else {
        1.0
    }
}

pub(crate) fn sanitize_min_size(min_size: f32) -> f32 {
    if min_size.is_finite() && min_size >= 1.0 {
        min_size.min(MAX_FONT_SIZE)
    } else {
        1.0
    }
}
