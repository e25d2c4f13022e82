use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::caption::{CaptionOptions, FitConfig, MAX_FONT_SIZE, PaintStyle, SizeBounds};

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

#[derive(Debug, Clone)]
pub struct Settings {
    pub font_family: Option<String>,
    pub font_path: Option<String>,
    pub font_weight: u16,
    pub min_font_size: f32,
    pub max_font_size: f32,
    pub growth_factor: f32,
    pub line_height: f32,
    pub padding_ratio: f32,
    pub clip_inset: f32,
    pub fill_color: String,
    pub stroke_color: String,
    pub stroke_ratio: f32,
    pub server_addr: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            font_family: None,
            font_path: None,
            font_weight: 700,
            min_font_size: 8.0,
            max_font_size: 160.0,
            growth_factor: 0.2,
            line_height: 1.1,
            padding_ratio: 0.12,
            clip_inset: 2.0,
            fill_color: "#ffffff".to_string(),
            stroke_color: "#000000".to_string(),
            stroke_ratio: 0.08,
            server_addr: "127.0.0.1:8787".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    font: Option<FontSettings>,
    layout: Option<LayoutSettings>,
    paint: Option<PaintSettings>,
    server: Option<ServerSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct FontSettings {
    family: Option<String>,
    path: Option<String>,
    weight: Option<u16>,
    min_size: Option<f32>,
    max_size: Option<f32>,
    growth_factor: Option<f32>,
    line_height: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct LayoutSettings {
    padding_ratio: Option<f32>,
    clip_inset: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct PaintSettings {
    fill_color: Option<String>,
    stroke_color: Option<String>,
    stroke_ratio: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSettings {
    addr: Option<String>,
}

pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    settings.merge(parse_settings(DEFAULT_SETTINGS_TOML, Path::new("<built-in>"))?);
    ensure_home_settings_file()?;

    let mut ordered_paths = Vec::new();
    ordered_paths.push(PathBuf::from("settings.toml"));
    ordered_paths.push(PathBuf::from("settings.local.toml"));

    if let Some(home) = home_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            settings.merge(parse_settings(&content, &path)?);
            debug!("settings: merged {}", path.display());
        }
    }

    Ok(settings)
}

fn parse_settings(content: &str, path: &Path) -> Result<SettingsFile> {
    toml::from_str(content).with_context(|| format!("failed to parse settings: {}", path.display()))
}

impl Settings {
    pub fn caption_options(&self, family: &str) -> CaptionOptions {
        CaptionOptions {
            family: family.to_string(),
            weight: self.font_weight,
            bounds: SizeBounds {
                min_size: self.min_font_size,
                max_size: self.max_font_size,
                growth_factor: self.growth_factor,
            },
            fit: FitConfig {
                padding_ratio: self.padding_ratio,
                line_height_ratio: self.line_height,
            },
        }
    }

    pub fn paint_style(&self) -> PaintStyle {
        PaintStyle {
            fill_color: self.fill_color.clone(),
            stroke_color: self.stroke_color.clone(),
            stroke_ratio: self.stroke_ratio,
            clip_inset: self.clip_inset,
        }
    }

    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(font) = incoming.font {
            if let Some(family) = font.family {
                if !family.trim().is_empty() {
                    self.font_family = Some(family);
                }
            }
            if let Some(path) = font.path {
                if !path.trim().is_empty() {
                    self.font_path = Some(path);
                }
            }
            if let Some(weight) = font.weight {
                if (1..=1000).contains(&weight) {
                    self.font_weight = weight;
                }
            }
            if let Some(size) = font.min_size.filter(|size| is_font_size(*size)) {
                self.min_font_size = size;
            }
            if let Some(size) = font.max_size.filter(|size| is_font_size(*size)) {
                self.max_font_size = size;
            }
            if let Some(factor) = font.growth_factor.filter(|value| is_positive(*value)) {
                self.growth_factor = factor;
            }
            if let Some(ratio) = font.line_height.filter(|value| is_positive(*value)) {
                self.line_height = ratio;
            }
        }
        if let Some(layout) = incoming.layout {
            if let Some(ratio) = layout.padding_ratio {
                if (0.0..1.0).contains(&ratio) {
                    self.padding_ratio = ratio;
                }
            }
            if let Some(inset) = layout.clip_inset {
                if inset.is_finite() && inset >= 0.0 {
                    self.clip_inset = inset;
                }
            }
        }
        if let Some(paint) = incoming.paint {
            if let Some(color) = paint.fill_color {
                if !color.trim().is_empty() {
                    self.fill_color = color;
                }
            }
            if let Some(color) = paint.stroke_color {
                if !color.trim().is_empty() {
                    self.stroke_color = color;
                }
            }
            if let Some(ratio) = paint.stroke_ratio {
                if ratio.is_finite() && ratio >= 0.0 {
                    self.stroke_ratio = ratio;
                }
            }
        }
        if let Some(server) = incoming.server {
            if let Some(addr) = server.addr {
                if !addr.trim().is_empty() {
                    self.server_addr = addr;
                }
            }
        }
        if self.max_font_size < self.min_font_size {
            self.max_font_size = self.min_font_size;
        }
    }
}

fn is_positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

fn is_font_size(value: f32) -> bool {
    is_positive(value) && value <= MAX_FONT_SIZE
}

fn ensure_home_settings_file() -> Result<()> {
    let Some(home) = home_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".caption-overlay-rust"))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::with_temp_home;

    #[test]
    fn defaults_match_built_in_file() {
        with_temp_home(|_| {
            let settings = load_settings(None).expect("settings");
            assert_eq!(settings.font_weight, 700);
            assert_eq!(settings.min_font_size, 8.0);
            assert_eq!(settings.padding_ratio, 0.12);
            assert_eq!(settings.fill_color, "#ffffff");
            assert_eq!(settings.stroke_ratio, 0.08);
            assert!(settings.font_family.is_none());
        });
    }

    #[test]
    fn home_settings_file_is_created() {
        with_temp_home(|home| {
            load_settings(None).expect("settings");
            let path = home.join(".caption-overlay-rust").join("settings.toml");
            let content = fs::read_to_string(path).expect("read settings");
            assert_eq!(content, DEFAULT_SETTINGS_TOML);
        });
    }

    #[test]
    fn extra_file_overrides_and_invalid_values_are_ignored() {
        with_temp_home(|home| {
            let extra = home.join("extra.toml");
            fs::write(
                &extra,
                r##"
[font]
family = "Anton"
min_size = -4.0
max_size = 90.0
line_height = 1.3

[layout]
padding_ratio = 1.5
clip_inset = 0.0

[paint]
stroke_color = "  "
fill_color = "#ffee00"
stroke_ratio = 0.05
"##,
            )
            .expect("write extra");
            let settings = load_settings(Some(&extra)).expect("settings");
            assert_eq!(settings.font_family.as_deref(), Some("Anton"));
            assert_eq!(settings.min_font_size, 8.0);
            assert_eq!(settings.max_font_size, 90.0);
            assert_eq!(settings.line_height, 1.3);
            assert_eq!(settings.padding_ratio, 0.12);
            assert_eq!(settings.clip_inset, 0.0);
            assert_eq!(settings.stroke_color, "#000000");
            assert_eq!(settings.fill_color, "#ffee00");
            assert_eq!(settings.paint_style().stroke_ratio, 0.05);

            let options = settings.caption_options("Anton");
            assert_eq!(options.bounds.max_size, 90.0);
            assert_eq!(options.fit.line_height_ratio, 1.3);
        });
    }

    #[test]
    fn oversized_font_sizes_are_ignored() {
        with_temp_home(|home| {
            let extra = home.join("huge.toml");
            fs::write(
                &extra,
                r#"
[font]
min_size = 5000.0
max_size = 1e8
growth_factor = 1e6
"#,
            )
            .expect("write extra");
            let settings = load_settings(Some(&extra)).expect("settings");
            assert_eq!(settings.min_font_size, 8.0);
            assert_eq!(settings.max_font_size, 160.0);

            let options = settings.caption_options("Impact");
            let caption_box = crate::caption::Region::Upper.caption_box(800, 600);
            let style = crate::caption::StyleSpec::for_box(
                &caption_box,
                "Impact",
                700,
                1.0,
                &options.bounds,
            );
            assert_eq!(style.initial_size, 160.0);
        });
    }

    #[test]
    fn missing_extra_file_is_an_error() {
        with_temp_home(|home| {
            let err = load_settings(Some(&home.join("nope.toml"))).unwrap_err();
            assert!(err.to_string().contains("settings file not found"));
        });
    }

    #[test]
    fn malformed_file_reports_path() {
        with_temp_home(|home| {
            let extra = home.join("broken.toml");
            fs::write(&extra, "[font\nfamily = 1").expect("write");
            let err = load_settings(Some(&extra)).unwrap_err();
            assert!(err.to_string().contains("broken.toml"));
        });
    }
}
