use anyhow::{Context, Result, anyhow};
use image::GenericImageView;
use std::path::Path;
use tracing::info;

pub const PNG_MIME: &str = "image/png";

/// A decoded-once source image: the original bytes are kept for embedding,
/// the dimensions drive caption box geometry.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub bytes: Vec<u8>,
    pub mime: String,
    pub width: u32,
    pub height: u32,
}

pub fn load_image(path: &Path) -> Result<SourceImage> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read image: {}", path.display()))?;
    load_image_from_bytes(bytes, Some(path))
}

pub fn load_image_from_bytes(bytes: Vec<u8>, path: Option<&Path>) -> Result<SourceImage> {
    let mime = detect_mime(&bytes, path)?;
    let decoded = image::load_from_memory(&bytes).with_context(|| "failed to decode image")?;
    let (width, height) = decoded.dimensions();
    if width == 0 || height == 0 {
        return Err(anyhow!("image has no pixels ({}x{})", width, height));
    }
    info!("image: {} {}x{}", mime, width, height);
    Ok(SourceImage {
        bytes,
        mime,
        width,
        height,
    })
}

/// Output mime for a destination path, defaulting to PNG.
pub fn output_mime_for_path(path: &Path) -> &'static str {
    extension_lower(Some(path))
        .and_then(|ext| mime_from_extension(&ext))
        .unwrap_or(PNG_MIME)
}

pub fn extension_from_mime(mime: &str) -> Option<&'static str> {
    match mime {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/bmp" => Some("bmp"),
        "image/tiff" => Some("tiff"),
        _ => None,
    }
}

fn detect_mime(bytes: &[u8], path: Option<&Path>) -> Result<String> {
    if let Some(kind) = infer::get(bytes) {
        let detected = kind.mime_type();
        if detected.starts_with("image/") {
            return Ok(detected.to_string());
        }
        return Err(anyhow!("expected image data (detected '{}')", detected));
    }

    if let Some(mime) = extension_lower(path).and_then(|ext| mime_from_extension(&ext)) {
        return Ok(mime.to_string());
    }

    Err(anyhow!(
        "unable to detect image type for '{}'",
        path.map(|value| value.display().to_string())
            .unwrap_or_else(|| "request body".to_string())
    ))
}

fn extension_lower(path: Option<&Path>) -> Option<String> {
    path.and_then(|path| path.extension())
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase())
}

fn mime_from_extension(ext: &str) -> Option<&'static str> {
    match ext {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "tiff" | "tif" => Some("image/tiff"),
        _ => None,
    }
}
