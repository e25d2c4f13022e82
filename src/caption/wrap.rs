use super::StyleSpec;
use super::measure::TextMeasurer;

/// Outcome of one wrapping pass at a fixed font size.
#[derive(Debug, Clone, PartialEq)]
pub struct LineBreak {
    pub lines: Vec<String>,
    /// False when some word was wider than the line at this size. For
    /// [`break_lines`] the lines are then empty; for [`force_break_lines`] they
    /// hold the character-split layout.
    pub feasible: bool,
}

/// Trims, uppercases and splits caption text into words.
pub fn normalize_words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|word| word.to_uppercase())
        .collect()
}

/// Greedy word wrap. Stops early and reports `feasible = false` as soon as a
/// single word does not fit `max_width` on its own.
pub fn break_lines(
    words: &[String],
    max_width: f32,
    font_size: f32,
    style: &StyleSpec,
    measurer: &dyn TextMeasurer,
) -> LineBreak {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in words {
        let candidate = join_candidate(&current, word);
        if measurer.measure(&candidate, font_size, style) <= max_width {
            current = candidate;
            continue;
        }
        if current.is_empty() || measurer.measure(word, font_size, style) > max_width {
            return LineBreak {
                lines: Vec::new(),
                feasible: false,
            };
        }
        lines.push(std::mem::replace(&mut current, word.clone()));
    }

    if !current.is_empty() {
        lines.push(current);
    }
    LineBreak {
        lines,
        feasible: true,
    }
}

/// Greedy word wrap that never exceeds `max_width`: words too wide for a line
/// are cut into character runs. The last run of a cut word stays open, so the
/// next word may still join it.
pub fn force_break_lines(
    words: &[String],
    max_width: f32,
    font_size: f32,
    style: &StyleSpec,
    measurer: &dyn TextMeasurer,
) -> LineBreak {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut split_any = false;

    for word in words {
        let candidate = join_candidate(&current, word);
        if measurer.measure(&candidate, font_size, style) <= max_width {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if measurer.measure(word, font_size, style) <= max_width {
            current = word.clone();
            continue;
        }
        split_any = true;
        let mut runs = split_word(word, max_width, font_size, style, measurer);
        if let Some(last) = runs.pop() {
            lines.extend(runs);
            current = last;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    LineBreak {
        lines,
        feasible: !split_any,
    }
}

fn split_word(
    word: &str,
    max_width: f32,
    font_size: f32,
    style: &StyleSpec,
    measurer: &dyn TextMeasurer,
) -> Vec<String> {
    let mut runs = Vec::new();
    let mut run = String::new();
    for ch in word.chars() {
        run.push(ch);
        // A run keeps at least one character, even one wider than the line.
        if run.chars().nth(1).is_some() && measurer.measure(&run, font_size, style) > max_width {
            run.pop();
            runs.push(std::mem::take(&mut run));
            run.push(ch);
        }
    }
    if !run.is_empty() {
        runs.push(run);
    }
    runs
}

fn join_candidate(current: &str, word: &str) -> String {
    if current.is_empty() {
        word.to_string()
    } else {
        format!("{} {}", current, word)
    }
}
