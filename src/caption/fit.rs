use serde::Serialize;
use tracing::debug;

use super::measure::TextMeasurer;
use super::wrap::{break_lines, force_break_lines, normalize_words};
use super::{CaptionBox, MAX_FONT_SIZE, StyleSpec, sanitize_min_size};

const SIZE_STEP: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitConfig {
    /// Share of the box width/height kept free as margin, split evenly
    /// between both sides.
    pub padding_ratio: f32,
    pub line_height_ratio: f32,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            padding_ratio: 0.12,
            line_height_ratio: 1.1,
        }
    }
}

impl FitConfig {
    pub fn usable_width(&self, caption_box: &CaptionBox) -> f32 {
        (caption_box.width * (1.0 - self.padding_ratio())).max(0.0)
    }

    pub fn usable_height(&self, caption_box: &CaptionBox) -> f32 {
        (caption_box.height * (1.0 - self.padding_ratio())).max(0.0)
    }

    pub fn line_height(&self, font_size: f32) -> f32 {
        font_size * self.line_height_ratio
    }

    fn padding_ratio(&self) -> f32 {
        if self.padding_ratio.is_finite() {
            self.padding_ratio.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitResult {
    pub font_size: f32,
    pub lines: Vec<String>,
    pub line_height: f32,
    pub block_height: f32,
    /// Set when the size floor was reached and some word had to be cut into
    /// character runs.
    pub forced: bool,
    /// Number of wrapping passes the search needed.
    pub attempts: u32,
}

impl FitResult {
    fn new(
        font_size: f32,
        lines: Vec<String>,
        config: &FitConfig,
        forced: bool,
        attempts: u32,
    ) -> Self {
        let line_height = config.line_height(font_size);
        let block_height = lines.len() as f32 * line_height;
        Self {
            font_size,
            lines,
            line_height,
            block_height,
            forced,
            attempts,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Picks the largest whole-step font size at which the caption fits the box.
///
/// Walks down from `style.initial_size` one pixel at a time. A size is
/// accepted when every word fits the usable width and the wrapped block fits
/// the usable height. At `style.min_size` the current wrap is returned even if
/// it is too tall, and over-wide words are cut into character runs.
///
/// The starting size is capped at [`MAX_FONT_SIZE`] and snapped onto the step
/// grid above the floor, so the search makes at most
/// `initial_size - min_size + 1` wrapping passes.
pub fn fit_caption(
    text: &str,
    caption_box: &CaptionBox,
    style: &StyleSpec,
    measurer: &dyn TextMeasurer,
    config: &FitConfig,
) -> FitResult {
    let min_size = sanitize_min_size(style.min_size);
    let initial_size = starting_size(style.initial_size, min_size);
    let words = normalize_words(text);
    if words.is_empty() {
        return FitResult::new(initial_size, Vec::new(), config, false, 0);
    }

    let max_width = config.usable_width(caption_box);
    let max_height = config.usable_height(caption_box);
    let steps = ((initial_size - min_size) / SIZE_STEP).round() as u32;
    let mut attempts = 0u32;

    for step in 0..steps {
        attempts += 1;
        let font_size = initial_size - step as f32 * SIZE_STEP;
        let wrapped = break_lines(&words, max_width, font_size, style, measurer);
        if !wrapped.feasible {
            continue;
        }
        let result = FitResult::new(font_size, wrapped.lines, config, false, attempts);
        if result.block_height <= max_height {
            debug!(
                "fit: {} line(s) at {}px after {} attempt(s)",
                result.lines.len(),
                font_size,
                attempts
            );
            return result;
        }
    }

    attempts += 1;
    let wrapped = break_lines(&words, max_width, min_size, style, measurer);
    if wrapped.feasible {
        let result = FitResult::new(min_size, wrapped.lines, config, false, attempts);
        if result.block_height <= max_height {
            debug!(
                "fit: {} line(s) at floor {}px after {} attempt(s)",
                result.lines.len(),
                min_size,
                attempts
            );
        } else {
            debug!(
                "fit: {} line(s) overflow height at floor {}px",
                result.lines.len(),
                min_size
            );
        }
        return result;
    }

    let forced = force_break_lines(&words, max_width, min_size, style, measurer);
    debug!(
        "fit: splitting over-wide words into {} line(s) at floor {}px",
        forced.lines.len(),
        min_size
    );
    FitResult::new(min_size, forced.lines, config, !forced.feasible, attempts)
}

/// Caps the requested size and rounds it down onto the `min_size + k * SIZE_STEP`
/// grid, so the last step lands exactly on the floor.
fn starting_size(initial_size: f32, min_size: f32) -> f32 {
    if !initial_size.is_finite() {
        return min_size;
    }
    let capped = initial_size.clamp(min_size, MAX_FONT_SIZE.max(min_size));
    min_size + ((capped - min_size) / SIZE_STEP).floor() * SIZE_STEP
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{FixedMeasurer, test_style};

    const FLAT: FitConfig = FitConfig {
        padding_ratio: 0.0,
        line_height_ratio: 1.0,
    };

    fn caption_box(width: f32, height: f32) -> CaptionBox {
        CaptionBox {
            center_x: width,
            center_y: height,
            width,
            height,
        }
    }

    fn style(initial_size: f32, min_size: f32) -> StyleSpec {
        StyleSpec {
            initial_size,
            min_size,
            ..test_style()
        }
    }

    #[test]
    fn empty_text_fits_nothing() {
        for text in ["", "   ", "\n\t "] {
            let result = fit_caption(
                text,
                &caption_box(100.0, 100.0),
                &style(20.0, 6.0),
                &FixedMeasurer,
                &FLAT,
            );
            assert!(result.is_empty());
            assert_eq!(result.block_height, 0.0);
            assert_eq!(result.attempts, 0);
        }
    }

    #[test]
    fn short_text_keeps_initial_size() {
        let result = fit_caption(
            "hello world",
            &caption_box(100.0, 100.0),
            &style(10.0, 4.0),
            &FixedMeasurer,
            &FLAT,
        );
        assert_eq!(result.lines, vec!["HELLO WORLD"]);
        assert_eq!(result.font_size, 10.0);
        assert_eq!(result.attempts, 1);
        assert!(!result.forced);
    }

    #[test]
    fn ten_words_shrink_into_two_lines() {
        let caption_box = caption_box(250.0, 36.0);
        let result = fit_caption(
            "one two three four five six seven eight nine ten",
            &caption_box,
            &style(20.0, 6.0),
            &FixedMeasurer,
            &FLAT,
        );
        assert_eq!(
            result.lines,
            vec!["ONE TWO THREE FOUR FIVE SIX", "SEVEN EIGHT NINE TEN"]
        );
        assert_eq!(result.font_size, 18.0);
        assert_eq!(result.attempts, 3);
        assert!(result.block_height <= FLAT.usable_height(&caption_box));
    }

    #[test]
    fn long_token_is_split_at_floor() {
        let token = "X".repeat(60);
        let caption_box = caption_box(100.0, 100.0);
        let style = style(20.0, 6.0);
        let result = fit_caption(&token, &caption_box, &style, &FixedMeasurer, &FLAT);
        assert!(result.forced);
        assert_eq!(result.font_size, 6.0);
        assert_eq!(result.attempts, 15);
        assert_eq!(result.lines.len(), 2);
        assert_eq!(result.lines.concat(), token);
        for line in &result.lines {
            assert!(FixedMeasurer.measure(line, result.font_size, &style) <= 100.0);
        }
    }

    #[test]
    fn search_terminates_within_size_range() {
        let text = "word ".repeat(200);
        let style = style(40.0, 8.0);
        let result = fit_caption(
            &text,
            &caption_box(120.0, 40.0),
            &style,
            &FixedMeasurer,
            &FitConfig::default(),
        );
        assert_eq!(result.font_size, 8.0);
        assert!(result.attempts <= (40 - 8) + 1);
        assert!(result.block_height > FitConfig::default().usable_height(&caption_box(120.0, 40.0)));
        assert!(!result.forced);
    }

    #[test]
    fn fractional_floor_keeps_attempt_bound() {
        let token = "X".repeat(60);
        let result = fit_caption(
            &token,
            &caption_box(100.0, 100.0),
            &style(20.0, 6.5),
            &FixedMeasurer,
            &FLAT,
        );
        assert!(result.forced);
        assert_eq!(result.font_size, 6.5);
        assert_eq!(result.attempts, 14);
        assert!(result.attempts as f32 <= (20.0 - 6.5) + 1.0);
    }

    #[test]
    fn fractional_start_is_snapped_onto_step_grid() {
        let result = fit_caption(
            "hello world",
            &caption_box(100.0, 100.0),
            &style(10.7, 4.0),
            &FixedMeasurer,
            &FLAT,
        );
        assert_eq!(result.font_size, 10.0);
        assert_eq!(result.attempts, 1);
    }

    #[test]
    fn huge_initial_size_is_capped_and_terminates() {
        let result = fit_caption(
            "hi",
            &caption_box(100.0, 100.0),
            &style(3.0e7, 8.0),
            &FixedMeasurer,
            &FLAT,
        );
        assert_eq!(result.lines, vec!["HI"]);
        assert_eq!(result.font_size, 100.0);
        assert_eq!(result.attempts, (MAX_FONT_SIZE - 100.0) as u32 + 1);
    }

    #[test]
    fn huge_floor_is_capped() {
        let result = fit_caption(
            "hi",
            &caption_box(100.0, 100.0),
            &style(f32::MAX, 1.0e9),
            &FixedMeasurer,
            &FLAT,
        );
        assert_eq!(result.font_size, MAX_FONT_SIZE);
        assert_eq!(result.attempts, 1);
        assert!(result.forced);
    }

    #[test]
    fn fitting_is_idempotent() {
        let caption_box = caption_box(180.0, 90.0);
        let style = style(30.0, 8.0);
        let config = FitConfig::default();
        let text = "when the build is green on the first try";
        let first = fit_caption(text, &caption_box, &style, &FixedMeasurer, &config);
        let second = fit_caption(text, &caption_box, &style, &FixedMeasurer, &config);
        assert_eq!(first, second);
    }

    #[test]
    fn chosen_lines_fit_usable_width() {
        let caption_box = caption_box(180.0, 90.0);
        let style = style(30.0, 8.0);
        let config = FitConfig::default();
        let result = fit_caption(
            "  a caption that needs a few lines to fit  ",
            &caption_box,
            &style,
            &FixedMeasurer,
            &config,
        );
        assert!(!result.forced);
        for line in &result.lines {
            assert_eq!(line, &line.to_uppercase());
            assert!(!line.trim().is_empty());
            assert!(
                FixedMeasurer.measure(line, result.font_size, &style)
                    <= config.usable_width(&caption_box)
            );
        }
        assert_eq!(
            result.block_height,
            result.lines.len() as f32 * result.line_height
        );
    }

    #[test]
    fn nan_sizes_do_not_hang() {
        let style = StyleSpec {
            initial_size: f32::INFINITY,
            min_size: f32::NAN,
            ..test_style()
        };
        let result = fit_caption(
            "still terminates",
            &caption_box(100.0, 100.0),
            &style,
            &FixedMeasurer,
            &FLAT,
        );
        assert_eq!(result.font_size, 1.0);
    }
}
