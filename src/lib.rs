use anyhow::{Context, Result, anyhow};
use std::path::{Path, PathBuf};
use tracing::info;

pub mod caption;
pub mod image_source;
pub mod logging;
mod server;
pub mod settings;
#[cfg(test)]
mod test_util;

pub use server::run_server;

use caption::{CaptionLayout, CaptionRequest, ResolvedCaptionFont};
use image_source::SourceImage;
use settings::Settings;

#[derive(Debug, Clone)]
pub struct Config {
    pub image: String,
    pub upper: Option<String>,
    pub lower: Option<String>,
    pub font_scale: f32,
    pub output: Option<String>,
    pub output_mime: Option<String>,
    pub font_path: Option<String>,
    pub font_family: Option<String>,
    pub settings_path: Option<String>,
    pub show_layout: bool,
    pub svg: bool,
}

/// Captions fitted for one image together with the SVG scene that paints them.
pub struct Overlay {
    pub captions: Vec<CaptionLayout>,
    pub svg: String,
}

#[cfg(target_os = "macos")]
fn caption_fallback_fonts() -> &'static [&'static str] {
    &["Impact", "Anton", "Helvetica Neue", "sans-serif"]
}

#[cfg(target_os = "windows")]
fn caption_fallback_fonts() -> &'static [&'static str] {
    &["Impact", "Arial Black", "Arial", "sans-serif"]
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn caption_fallback_fonts() -> &'static [&'static str] {
    &["Impact", "Anton", "Oswald", "DejaVu Sans", "sans-serif"]
}

/// Loads the caption font. Command line values win over settings; nothing is
/// fitted until this succeeds.
pub fn resolve_font(
    settings: &Settings,
    font_path: Option<&str>,
    font_family: Option<&str>,
) -> Result<ResolvedCaptionFont> {
    let path = font_path.or(settings.font_path.as_deref()).map(Path::new);
    let family = font_family.or(settings.font_family.as_deref());
    caption::resolve_caption_font(path, family, settings.font_weight, caption_fallback_fonts())
        .with_context(|| "caption font is not available")
}

pub fn build_overlay(
    image: &SourceImage,
    request: &CaptionRequest,
    settings: &Settings,
    font: &ResolvedCaptionFont,
) -> Overlay {
    let options = settings.caption_options(&font.family);
    let captions = caption::compose_captions(
        request,
        image.width,
        image.height,
        &options,
        &font.metrics,
    );
    for layout in &captions {
        info!(
            "caption {}: {} line(s) at {}px{}",
            layout.region.as_str(),
            layout.fit.lines.len(),
            layout.fit.font_size,
            if layout.fit.forced { " (split words)" } else { "" }
        );
    }
    let svg = caption::render_svg(
        &image.bytes,
        &image.mime,
        image.width,
        image.height,
        &captions,
        &settings.paint_style(),
    );
    Overlay { captions, svg }
}

pub fn run(config: Config) -> Result<String> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let settings = settings::load_settings(settings_path)?;

    let image_path = Path::new(config.image.trim());
    if image_path.as_os_str().is_empty() {
        return Err(anyhow!("image path is empty"));
    }
    let svg_output = if config.svg && !config.show_layout {
        Some(svg_output_path(config.output.as_deref(), image_path)?)
    } else {
        None
    };
    let image = image_source::load_image(image_path)?;
    let font = resolve_font(
        &settings,
        config.font_path.as_deref(),
        config.font_family.as_deref(),
    )?;

    let request = CaptionRequest {
        upper: config.upper.unwrap_or_default(),
        lower: config.lower.unwrap_or_default(),
        font_scale: config.font_scale,
    };
    let overlay = build_overlay(&image, &request, &settings, &font);

    if config.show_layout {
        return serde_json::to_string_pretty(&overlay.captions)
            .with_context(|| "failed to serialize caption layout");
    }

    if let Some(output) = svg_output {
        std::fs::write(&output, overlay.svg.as_bytes())
            .with_context(|| format!("failed to write svg: {}", output.display()))?;
        return Ok(format!("wrote {}", output.display()));
    }

    let output_mime = match (config.output_mime.as_deref(), config.output.as_deref()) {
        (Some(mime), _) => mime.trim().to_lowercase(),
        (None, Some(path)) => image_source::output_mime_for_path(Path::new(path)).to_string(),
        (None, None) => image_source::PNG_MIME.to_string(),
    };
    let extension = image_source::extension_from_mime(&output_mime)
        .ok_or_else(|| anyhow!("unsupported output image mime '{}'", output_mime))?;
    let output = config
        .output
        .map(PathBuf::from)
        .unwrap_or_else(|| default_output_path(image_path, extension));
    let bytes = caption::render_svg_bytes(&overlay.svg, &output_mime, Some(font.metrics.data()))?;
    std::fs::write(&output, bytes)
        .with_context(|| format!("failed to write image: {}", output.display()))?;
    Ok(format!("wrote {}", output.display()))
}

fn svg_output_path(output: Option<&str>, image_path: &Path) -> Result<PathBuf> {
    let Some(output) = output else {
        return Ok(default_output_path(image_path, "svg"));
    };
    let output = PathBuf::from(output);
    let is_svg = output
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"));
    if !is_svg {
        return Err(anyhow!(
            "--svg writes an SVG scene; output must end in .svg: {}",
            output.display()
        ));
    }
    Ok(output)
}

fn default_output_path(image_path: &Path, extension: &str) -> PathBuf {
    let stem = image_path
        .file_stem()
        .and_then(|value| value.to_str())
        .unwrap_or("image");
    image_path.with_file_name(format!("{}-captioned.{}", stem, extension))
}
