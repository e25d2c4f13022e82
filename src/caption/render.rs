use anyhow::{Context, Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use resvg::render;
use std::io::Cursor;
use std::sync::Arc;
use tiny_skia::Pixmap;
use usvg::{Options, Tree, fontdb};

use super::compose::CaptionLayout;

/// Fixed paint constants for caption text.
#[derive(Debug, Clone)]
pub struct PaintStyle {
    pub fill_color: String,
    pub stroke_color: String,
    /// Outline width as a share of the font size.
    pub stroke_ratio: f32,
    /// Pixels the clip rectangle is pulled in from each box edge.
    pub clip_inset: f32,
}

impl Default for PaintStyle {
    fn default() -> Self {
        Self {
            fill_color: "#ffffff".to_string(),
            stroke_color: "#000000".to_string(),
            stroke_ratio: 0.08,
            clip_inset: 2.0,
        }
    }
}

/// Builds the SVG scene: the source image, then each caption clipped to its
/// box. Captions without lines paint nothing.
pub fn render_svg(
    image_bytes: &[u8],
    image_mime: &str,
    width: u32,
    height: u32,
    captions: &[CaptionLayout],
    paint: &PaintStyle,
) -> String {
    let encoded = BASE64.encode(image_bytes);
    let data_uri = format!("data:{};base64,{}", image_mime, encoded);

    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = width,
        h = height
    ));
    svg.push_str(&format!(
        r#"<image href="{uri}" xlink:href="{uri}" x="0" y="0" width="{w}" height="{h}" preserveAspectRatio="none"/>"#,
        uri = data_uri,
        w = width,
        h = height
    ));

    for caption in captions {
        if caption.lines.is_empty() {
            continue;
        }
        let clip = caption.caption_box.inset(paint.clip_inset);
        let clip_id = format!("clip-{}", caption.region.as_str());
        svg.push_str(&format!(
            r#"<clipPath id="{id}"><rect x="{x}" y="{y}" width="{w}" height="{h}"/></clipPath>"#,
            id = clip_id,
            x = clip.left(),
            y = clip.top(),
            w = clip.width,
            h = clip.height
        ));
        svg.push_str(&format!(r#"<g clip-path="url(#{})">"#, clip_id));
        let font_size = caption.fit.font_size;
        let family = escape_xml(&caption.family);
        for line in &caption.lines {
            // Font attributes repeat on every line so nothing depends on
            // inherited text state.
            svg.push_str(&format!(
                r#"<text x="{x}" y="{y}" font-family="{family}" font-weight="{weight}" font-size="{size}" text-anchor="middle" dominant-baseline="central" fill="{fill}" stroke="{stroke}" stroke-width="{stroke_width}" stroke-linejoin="round" paint-order="stroke">{text}</text>"#,
                x = line.x,
                y = line.y,
                family = family,
                weight = caption.weight,
                size = font_size,
                fill = escape_xml(&paint.fill_color),
                stroke = escape_xml(&paint.stroke_color),
                stroke_width = font_size * paint.stroke_ratio,
                text = escape_xml(&line.text)
            ));
        }
        svg.push_str("</g>");
    }

    svg.push_str("</svg>");
    svg
}

/// Rasterizes the scene and encodes it as `output_mime`. When `font_data` is
/// given it is the only font available, so glyphs come from the same face that
/// was measured while fitting.
pub fn render_svg_bytes(svg: &str, output_mime: &str, font_data: Option<&[u8]>) -> Result<Vec<u8>> {
    let mut db = fontdb::Database::new();
    match font_data {
        Some(data) => db.load_font_data(data.to_vec()),
        None => db.load_system_fonts(),
    }
    let options = Options {
        fontdb: Arc::new(db),
        ..Options::default()
    };
    let tree = Tree::from_str(svg, &options).with_context(|| "failed to parse SVG")?;
    let size = tree.size().to_int_size();
    let mut pixmap =
        Pixmap::new(size.width(), size.height()).ok_or_else(|| anyhow!("empty SVG size"))?;
    let mut pixmap_mut = pixmap.as_mut();
    render(&tree, tiny_skia::Transform::identity(), &mut pixmap_mut);
    let image = image::RgbaImage::from_raw(size.width(), size.height(), pixmap.data().to_vec())
        .ok_or_else(|| anyhow!("failed to build image buffer from SVG"))?;
    let format = image_format_from_mime(output_mime)
        .ok_or_else(|| anyhow!("unsupported output image mime '{}'", output_mime))?;
    let mut bytes = Vec::new();
    let mut cursor = Cursor::new(&mut bytes);
    let encoded = if matches!(format, image::ImageFormat::Jpeg) {
        image::DynamicImage::ImageRgb8(image::DynamicImage::ImageRgba8(image).to_rgb8())
    } else {
        image::DynamicImage::ImageRgba8(image)
    };
    encoded
        .write_to(&mut cursor, format)
        .with_context(|| "failed to encode captioned image")?;
    Ok(bytes)
}

pub fn image_format_from_mime(mime: &str) -> Option<image::ImageFormat> {
    match mime {
        "image/png" => Some(image::ImageFormat::Png),
        "image/jpeg" => Some(image::ImageFormat::Jpeg),
        "image/jpg" => Some(image::ImageFormat::Jpeg),
        "image/gif" => Some(image::ImageFormat::Gif),
        "image/webp" => Some(image::ImageFormat::WebP),
        "image/bmp" => Some(image::ImageFormat::Bmp),
        "image/tiff" => Some(image::ImageFormat::Tiff),
        _ => None,
    }
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
