use anyhow::{Context, Result, anyhow};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use ttf_parser::Face;
use ttf_parser::name_id;
use usvg::fontdb;

use super::StyleSpec;
use super::measure::{TextMeasurer, estimate_text_units};

/// Advance metrics of one loaded font face. Holding a value of this type is
/// what "the font is ready" means: the same bytes are later handed to the
/// rasterizer, so painted text matches the widths used while fitting.
#[derive(Clone)]
pub struct FontMetrics {
    data: Arc<Vec<u8>>,
    units_per_em: u16,
    space_advance: u16,
    family: Option<String>,
    weight: u16,
    face_index: u32,
}

impl std::fmt::Debug for FontMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontMetrics")
            .field("family", &self.family)
            .field("weight", &self.weight)
            .field("units_per_em", &self.units_per_em)
            .field("face_index", &self.face_index)
            .finish()
    }
}

impl FontMetrics {
    pub fn family(&self) -> Option<&str> {
        self.family.as_deref()
    }

    pub fn weight(&self) -> u16 {
        self.weight
    }

    pub fn data(&self) -> &[u8] {
        self.data.as_ref()
    }

    fn advance_units(&self, face: &Face<'_>, text: &str) -> u32 {
        let mut advance = 0u32;
        for ch in text.chars() {
            if ch.is_whitespace() {
                advance = advance.saturating_add(self.space_advance as u32);
                continue;
            }
            let glyph_advance = face
                .glyph_index(ch)
                .and_then(|glyph| face.glyph_hor_advance(glyph))
                .unwrap_or(self.space_advance);
            advance = advance.saturating_add(glyph_advance as u32);
        }
        advance
    }
}

impl TextMeasurer for FontMetrics {
    fn measure(&self, text: &str, font_size: f32, _style: &StyleSpec) -> f32 {
        let font_size = font_size.max(0.0);
        match Face::parse(&self.data, self.face_index) {
            Ok(face) => {
                let units = self.units_per_em.max(1) as f32;
                self.advance_units(&face, text) as f32 * (font_size / units)
            }
            // Validated at load time; only reachable if the buffer was swapped.
            Err(_) => estimate_text_units(text) * font_size,
        }
    }
}

pub struct ResolvedCaptionFont {
    pub metrics: FontMetrics,
    pub family: String,
}

pub fn load_font_metrics(path: &Path) -> Result<FontMetrics> {
    let data =
        std::fs::read(path).with_context(|| format!("failed to read font: {}", path.display()))?;
    load_font_metrics_from_data(&data, None)
        .map_err(|err| anyhow!("failed to parse font: {} ({})", path.display(), err))
}

/// Resolves the caption font from an explicit file, a family name, or the
/// fallback list, in that order. Fails when nothing usable is installed, so
/// no caption is ever fitted against metrics of an unknown face.
pub fn resolve_caption_font(
    font_path: Option<&Path>,
    font_family: Option<&str>,
    weight: u16,
    fallback: &[&str],
) -> Result<ResolvedCaptionFont> {
    if let Some(path) = font_path {
        let metrics = load_font_metrics(path)?;
        let family = metrics
            .family()
            .map(|name| name.to_string())
            .or_else(|| font_family.map(|name| name.to_string()))
            .unwrap_or_else(|| "sans-serif".to_string());
        info!("font: loaded {} from {}", family, path.display());
        return Ok(ResolvedCaptionFont { metrics, family });
    }

    let mut db = fontdb::Database::new();
    db.load_system_fonts();

    if let Some(family) = font_family {
        return load_font_metrics_from_family(&db, family, weight);
    }

    for candidate in fallback {
        match load_font_metrics_from_family(&db, candidate, weight) {
            Ok(resolved) => return Ok(resolved),
            Err(err) => debug!("font: fallback {} unavailable ({})", candidate, err),
        }
    }

    Err(anyhow!("no caption fonts found (tried {})", fallback.join(", ")))
}

pub fn load_font_metrics_from_data(
    data: &[u8],
    preferred_family: Option<&str>,
) -> Result<FontMetrics> {
    let shared = Arc::new(data.to_vec());
    let mut fallback = None;
    let count = ttf_parser::fonts_in_collection(data).unwrap_or(1);
    for index in 0..count {
        let Some(metrics) = metrics_for_face(&shared, index) else {
            continue;
        };
        let preferred = match (preferred_family, metrics.family()) {
            (Some(preferred), Some(found)) => found.eq_ignore_ascii_case(preferred),
            _ => false,
        };
        if preferred {
            return Ok(metrics);
        }
        if fallback.is_none() {
            fallback = Some(metrics);
        }
    }
    if preferred_family.is_some() {
        return Err(anyhow!("font family not found in font file"));
    }
    fallback.ok_or_else(|| anyhow!("failed to parse font data"))
}

fn metrics_for_face(data: &Arc<Vec<u8>>, index: u32) -> Option<FontMetrics> {
    let face = Face::parse(data, index).ok()?;
    let units_per_em = face.units_per_em().max(1);
    let space_advance = face
        .glyph_index(' ')
        .and_then(|id| face.glyph_hor_advance(id))
        .unwrap_or(units_per_em / 2);
    Some(FontMetrics {
        data: Arc::clone(data),
        units_per_em,
        space_advance,
        family: extract_family_name(&face),
        weight: face.weight().to_number(),
        face_index: index,
    })
}

fn load_font_metrics_from_family(
    db: &fontdb::Database,
    family: &str,
    weight: u16,
) -> Result<ResolvedCaptionFont> {
    let is_sans = family.eq_ignore_ascii_case("sans-serif");
    let families = if is_sans {
        vec![fontdb::Family::SansSerif]
    } else {
        vec![fontdb::Family::Name(family)]
    };
    let query = fontdb::Query {
        families: &families,
        weight: fontdb::Weight(weight),
        ..Default::default()
    };
    let id = db
        .query(&query)
        .ok_or_else(|| anyhow!("font not found: {}", family))?;
    let (data, face_index) = db
        .with_face_data(id, |data, index| (data.to_vec(), index))
        .ok_or_else(|| anyhow!("failed to load font data: {}", family))?;
    let metrics = metrics_for_face(&Arc::new(data), face_index)
        .ok_or_else(|| anyhow!("failed to parse font data: {}", family))?;
    let resolved_family = metrics
        .family()
        .map(|name| name.to_string())
        .unwrap_or_else(|| family.to_string());
    info!(
        "font: resolved {} (weight {}) for {}",
        resolved_family,
        metrics.weight(),
        family
    );
    Ok(ResolvedCaptionFont {
        metrics,
        family: resolved_family,
    })
}

fn extract_family_name(face: &Face<'_>) -> Option<String> {
    let mut fallback = None;
    for name in face.names() {
        if name.name_id == name_id::TYPOGRAPHIC_FAMILY {
            if let Some(value) = name.to_string() {
                return Some(value);
            }
        } else if name.name_id == name_id::FAMILY && fallback.is_none() {
            fallback = name.to_string();
        }
    }
    fallback
}
