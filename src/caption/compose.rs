use serde::Serialize;

use super::fit::{FitConfig, FitResult, fit_caption};
use super::layout::{PlacedLine, layout_lines};
use super::measure::TextMeasurer;
use super::{CaptionBox, Region, SizeBounds, StyleSpec, clamp_font_scale};

/// Text for both caption regions plus the user font scale.
#[derive(Debug, Clone)]
pub struct CaptionRequest {
    pub upper: String,
    pub lower: String,
    pub font_scale: f32,
}

impl Default for CaptionRequest {
    fn default() -> Self {
        Self {
            upper: String::new(),
            lower: String::new(),
            font_scale: 1.0,
        }
    }
}

impl CaptionRequest {
    pub fn text(&self, region: Region) -> &str {
        match region {
            Region::Upper => &self.upper,
            Region::Lower => &self.lower,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CaptionOptions {
    pub family: String,
    pub weight: u16,
    pub bounds: SizeBounds,
    pub fit: FitConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct CaptionLayout {
    pub region: Region,
    #[serde(rename = "box")]
    pub caption_box: CaptionBox,
    pub family: String,
    pub weight: u16,
    pub fit: FitResult,
    pub lines: Vec<PlacedLine>,
}

/// Fits and places both captions of an image. Every call starts from scratch.
pub fn compose_captions(
    request: &CaptionRequest,
    image_width: u32,
    image_height: u32,
    options: &CaptionOptions,
    measurer: &dyn TextMeasurer,
) -> Vec<CaptionLayout> {
    let font_scale = clamp_font_scale(request.font_scale);
    Region::ALL
        .iter()
        .map(|region| {
            let caption_box = region.caption_box(image_width, image_height);
            let style = StyleSpec::for_box(
                &caption_box,
                &options.family,
                options.weight,
                font_scale,
                &options.bounds,
            );
            let fit = fit_caption(
                request.text(*region),
                &caption_box,
                &style,
                measurer,
                &options.fit,
            );
            let lines = layout_lines(&fit, &caption_box);
            CaptionLayout {
                region: *region,
                caption_box,
                family: style.family,
                weight: style.weight,
                fit,
                lines,
            }
        })
        .collect()
}
