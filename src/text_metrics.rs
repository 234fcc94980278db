//! Text measurement behind a small trait so layout never talks to a
//! rendering surface directly.

use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::Mutex;
use ttf_parser::Face;

/// Bold glyphs run a little wider than the regular advances we measure.
const BOLD_SCALE: f32 = 1.06;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSpec<'a> {
    pub family: &'a str,
    pub size: f32,
    pub bold: bool,
}

impl<'a> FontSpec<'a> {
    pub fn bold(family: &'a str, size: f32) -> Self {
        Self {
            family,
            size,
            bold: true,
        }
    }

    pub fn regular(family: &'a str, size: f32) -> Self {
        Self {
            family,
            size,
            bold: false,
        }
    }
}

pub trait TextMeasurer {
    /// Advance width of `text` on a single line, in pixels.
    fn text_width(&self, text: &str, font: &FontSpec<'_>) -> f32;
}

impl<T: TextMeasurer + ?Sized> TextMeasurer for &T {
    fn text_width(&self, text: &str, font: &FontSpec<'_>) -> f32 {
        (**self).text_width(text, font)
    }
}

/// Table-driven widths; deterministic and independent of installed fonts.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproximateMeasurer;

/// Uses the first installed face matching the family list, falling back to
/// [`ApproximateMeasurer`] when nothing matches.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemFontMeasurer;

static APPROXIMATE: ApproximateMeasurer = ApproximateMeasurer;
static SYSTEM: SystemFontMeasurer = SystemFontMeasurer;

pub fn measurer_for(fast_text_metrics: bool) -> &'static dyn TextMeasurer {
    if fast_text_metrics { &APPROXIMATE } else { &SYSTEM }
}

impl TextMeasurer for ApproximateMeasurer {
    fn text_width(&self, text: &str, font: &FontSpec<'_>) -> f32 {
        if text.is_empty() || font.size <= 0.0 {
            return 0.0;
        }
        let width = text.chars().map(char_width_factor).sum::<f32>() * font.size;
        if font.bold { width * BOLD_SCALE } else { width }
    }
}

impl TextMeasurer for SystemFontMeasurer {
    fn text_width(&self, text: &str, font: &FontSpec<'_>) -> f32 {
        if text.is_empty() || font.size <= 0.0 {
            return 0.0;
        }
        let measured = FONT_CACHE
            .lock()
            .ok()
            .and_then(|mut cache| cache.measure(text, font));
        measured.unwrap_or_else(|| APPROXIMATE.text_width(text, font))
    }
}

pub(crate) fn char_width_factor(ch: char) -> f32 {
    match ch {
        ' ' => 0.306,
        '\\' | '.' | ',' | ':' | ';' | '|' | '!' | '(' | ')' | '[' | ']' | '{' | '}' => 0.321,
        'A' | 'B' | 'K' => 0.650,
        'C' | 'D' | 'G' | 'H' | 'N' | 'O' | 'Q' | 'U' => 0.745,
        'E' | 'F' | 'L' | 'P' | 'R' | 'S' | 'T' | 'Z' => 0.600,
        'I' => 0.272,
        'J' => 0.557,
        'M' => 0.903,
        'V' | 'X' | 'Y' => 0.655,
        'W' => 0.958,
        'f' | 'r' | 't' => 0.340,
        'i' | 'j' | 'l' => 0.235,
        'm' => 0.867,
        'w' => 0.811,
        'a'..='z' => 0.570,
        '1' => 0.396,
        '0'..='9' => 0.605,
        '@' | '#' | '%' | '&' => 0.946,
        // Pictographs (the node emoji) render roughly square.
        '\u{1F000}'..='\u{1FAFF}' | '\u{2600}'..='\u{27BF}' => 1.25,
        // Variation selectors and joiners take no space.
        '\u{FE00}'..='\u{FE0F}' | '\u{200D}' => 0.0,
        _ => 0.568,
    }
}

static FONT_CACHE: Lazy<Mutex<FontCache>> = Lazy::new(|| Mutex::new(FontCache::new()));

struct FontCache {
    db: Database,
    loaded_system_fonts: bool,
    faces: HashMap<String, Option<FontFace>>,
}

impl FontCache {
    fn new() -> Self {
        Self {
            db: Database::new(),
            loaded_system_fonts: false,
            faces: HashMap::new(),
        }
    }

    fn measure(&mut self, text: &str, font: &FontSpec<'_>) -> Option<f32> {
        let key = face_key(font);
        if !self.faces.contains_key(&key) {
            let face = self.load_face(font, &key);
            if face.is_none() {
                tracing::debug!(family = font.family, "no installed face, using approximate metrics");
            }
            self.faces.insert(key.clone(), face);
        }
        let face = self.faces.get_mut(&key)?.as_mut()?;
        face.measure_width(text, font.size)
    }

    fn load_face(&mut self, font: &FontSpec<'_>, key: &str) -> Option<FontFace> {
        if let Some(face) = load_cached_face(key) {
            return Some(face);
        }

        let names: Vec<&str> = font
            .family
            .split(',')
            .map(|part| part.trim().trim_matches('"').trim_matches('\''))
            .filter(|part| !part.is_empty())
            .collect();
        let mut families: Vec<Family<'_>> = names
            .iter()
            .map(|name| match name.to_ascii_lowercase().as_str() {
                "serif" => Family::Serif,
                "monospace" | "ui-monospace" => Family::Monospace,
                "cursive" => Family::Cursive,
                "fantasy" => Family::Fantasy,
                "sans-serif" | "system-ui" | "-apple-system" | "ui-sans-serif" => {
                    Family::SansSerif
                }
                _ => Family::Name(*name),
            })
            .collect();
        if families.is_empty() {
            families.push(Family::SansSerif);
        }

        if !self.loaded_system_fonts {
            self.db.load_system_fonts();
            self.loaded_system_fonts = true;
        }

        let query = Query {
            families: &families,
            weight: if font.bold { Weight::BOLD } else { Weight::NORMAL },
            stretch: Stretch::Normal,
            style: Style::Normal,
        };
        let id = self.db.query(&query)?;
        self.db
            .with_face_data(id, |data, index| {
                let face = FontFace::parse(data.to_vec(), index)?;
                store_cached_face(key, &face);
                Some(face)
            })
            .flatten()
    }
}

struct FontFace {
    data: Vec<u8>,
    index: u32,
    units_per_em: u16,
    ascii_advances: [u16; 128],
    advances: HashMap<char, Option<u16>>,
}

impl FontFace {
    fn parse(data: Vec<u8>, index: u32) -> Option<Self> {
        let (units_per_em, ascii_advances) = {
            let face = Face::parse(&data, index).ok()?;
            let mut advances = [0u16; 128];
            for byte in 0u8..=127 {
                if let Some(glyph) = face.glyph_index(byte as char) {
                    advances[byte as usize] = face.glyph_hor_advance(glyph).unwrap_or(0);
                }
            }
            (face.units_per_em().max(1), advances)
        };
        Some(Self {
            data,
            index,
            units_per_em,
            ascii_advances,
            advances: HashMap::new(),
        })
    }

    fn measure_width(&mut self, text: &str, font_size: f32) -> Option<f32> {
        let scale = font_size / self.units_per_em as f32;
        let missing = |ch: char| char_width_factor(ch) * font_size;
        let mut width = 0.0f32;

        let uncached: Vec<char> = text
            .chars()
            .filter(|ch| !ch.is_ascii() && !self.advances.contains_key(ch))
            .collect();
        if !uncached.is_empty() {
            let face = Face::parse(&self.data, self.index).ok()?;
            for ch in uncached {
                let advance = face
                    .glyph_index(ch)
                    .and_then(|glyph| face.glyph_hor_advance(glyph));
                self.advances.insert(ch, advance);
            }
        }

        for ch in text.chars() {
            if ch == '\n' {
                continue;
            }
            let advance = if ch.is_ascii() {
                Some(self.ascii_advances[ch as usize]).filter(|adv| *adv > 0)
            } else {
                self.advances.get(&ch).copied().flatten()
            };
            width += match advance {
                Some(advance) => advance as f32 * scale,
                None => missing(ch),
            };
        }
        Some(width.max(0.0))
    }
}

fn face_key(font: &FontSpec<'_>) -> String {
    let family = font.family.trim();
    let family = if family.is_empty() { "sans-serif" } else { family };
    if font.bold {
        format!("{family}#bold")
    } else {
        family.to_string()
    }
}

fn cache_paths(key: &str) -> Option<(PathBuf, PathBuf)> {
    let base = std::env::var_os("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".cache")))?;
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    key.hash(&mut hasher);
    let hash = hasher.finish();
    let dir = base.join("cmapr").join("font-cache");
    Some((dir.join(format!("{hash:x}.font")), dir.join(format!("{hash:x}.meta"))))
}

fn load_cached_face(key: &str) -> Option<FontFace> {
    let (font_path, meta_path) = cache_paths(key)?;
    let bytes = fs::read(font_path).ok()?;
    let index: u32 = fs::read_to_string(meta_path).ok()?.trim().parse().ok()?;
    FontFace::parse(bytes, index)
}

fn store_cached_face(key: &str, face: &FontFace) {
    let Some((font_path, meta_path)) = cache_paths(key) else {
        return;
    };
    if font_path.exists() {
        return;
    }
    if let Some(parent) = font_path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let _ = fs::write(&font_path, &face.data);
    let _ = fs::write(&meta_path, face.index.to_string());
}
