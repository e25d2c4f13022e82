use serde::Serialize;

use super::fit::FitResult;
use super::{CaptionBox, Region};

/// One line ready to paint, centered horizontally on `x` and vertically on `y`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedLine {
    pub text: String,
    pub x: f32,
    pub y: f32,
}

impl Region {
    /// Each caption takes the right half of the image; the upper one the top
    /// half, the lower one the bottom half.
    pub fn caption_box(&self, image_width: u32, image_height: u32) -> CaptionBox {
        let width = image_width as f32;
        let height = image_height as f32;
        let center_y = match self {
            Region::Upper => height * 0.25,
            Region::Lower => height * 0.75,
        };
        CaptionBox {
            center_x: width * 0.75,
            center_y,
            width: width * 0.5,
            height: height * 0.5,
        }
    }
}

pub fn caption_boxes(image_width: u32, image_height: u32) -> [(Region, CaptionBox); 2] {
    Region::ALL.map(|region| (region, region.caption_box(image_width, image_height)))
}

pub fn layout_lines(fit: &FitResult, caption_box: &CaptionBox) -> Vec<PlacedLine> {
    let start_y = caption_box.center_y - fit.block_height * 0.5 + fit.line_height * 0.5;
    fit.lines
        .iter()
        .enumerate()
        .map(|(idx, text)| PlacedLine {
            text: text.clone(),
            x: caption_box.center_x,
            y: start_y + idx as f32 * fit.line_height,
        })
        .collect()
}
