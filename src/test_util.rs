use crate::caption::{StyleSpec, TextMeasurer};

pub(crate) fn with_temp_home<F, R>(func: F) -> R
where
    F: FnOnce(&std::path::Path) -> R,
{
    static HOME_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
    let _guard = HOME_MUTEX.lock().unwrap_or_else(|err| err.into_inner());
    let dir = tempfile::tempdir().expect("tempdir");
    let old_home = std::env::var("HOME").ok();
    // Serialized by HOME_MUTEX; no other test thread touches HOME.
    unsafe { std::env::set_var("HOME", dir.path()) };
    let result = func(dir.path());
    match old_home {
        Some(old) => unsafe { std::env::set_var("HOME", old) },
        None => unsafe { std::env::remove_var("HOME") },
    }
    result
}

/// Every character, spaces included, is half the font size wide.
pub(crate) struct FixedMeasurer;

impl TextMeasurer for FixedMeasurer {
    fn measure(&self, text: &str, font_size: f32, _style: &StyleSpec) -> f32 {
        text.chars().count() as f32 * 0.5 * font_size
    }
}

pub(crate) fn test_style() -> StyleSpec {
    StyleSpec {
        weight: 700,
        family: "Impact".to_string(),
        initial_size: 20.0,
        min_size: 6.0,
        growth_factor: 0.2,
    }
}
