use super::StyleSpec;

/// Pixel width of a string at a font size.
///
/// Implementations must be idempotent and monotonic: width never decreases as
/// the font size grows, and a prefix never measures wider than the whole
/// string. The line breaker relies on both.
pub trait TextMeasurer {
    fn measure(&self, text: &str, font_size: f32, style: &StyleSpec) -> f32;
}

/// Font-free width estimate from per-character units. Handy in tests and for
/// library callers that lay out text without loading a face.
#[derive(Debug, Clone, Copy, Default)]
pub struct EstimatedMeasurer;

const BOLD_WIDTH_FACTOR: f32 = 1.08;

impl TextMeasurer for EstimatedMeasurer {
    fn measure(&self, text: &str, font_size: f32, style: &StyleSpec) -> f32 {
        let units = estimate_text_units(text);
        let factor = if style.weight >= 600 {
            BOLD_WIDTH_FACTOR
        } else {
            1.0
        };
        units * font_size.max(0.0) * factor
    }
}

fn estimate_char_units(ch: char) -> f32 {
    if ch.is_whitespace() {
        0.3
    } else if ch.is_ascii_alphanumeric() {
        0.6
    } else if ch.is_ascii() {
        0.4
    } else if matches!(
        ch as u32,
        0x4E00..=0x9FFF | 0x3040..=0x30FF | 0x31F0..=0x31FF
    ) {
        1.0
    } else {
        0.9
    }
}

pub(crate) fn estimate_text_units(text: &str) -> f32 {
    text.chars().map(estimate_char_units).sum()
}
