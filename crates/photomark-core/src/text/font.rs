//! Font resolution: family and style hints to a usable glyph source.
//!
//! Resolution never fails. Each provider walks its own fallback chain and
//! ends at the built-in [`BitmapFont`].

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use ab_glyph::{Font, FontArc, FontVec, InvalidFont};

use super::bitmap::{BitmapFont, BUILTIN_FONT};

/// Families tried, in order, after the requested family.
pub const FALLBACK_FAMILIES: [&str; 5] = [
    "Helvetica",
    "Times",
    "Arial",
    "DejaVu Sans",
    "Liberation Sans",
];

const FONT_EXTENSIONS: [&str; 3] = ["ttf", "otf", "ttc"];

/// Capability that maps family and style hints to a glyph source.
pub trait FontProvider {
    fn resolve(&self, family: Option<&str>, bold: bool, italic: bool) -> FontHandle;
}

/// A resolved glyph source.
#[derive(Clone)]
pub enum FontHandle {
    Outline(OutlineFont),
    Bitmap(&'static BitmapFont),
}

impl FontHandle {
    pub fn builtin() -> Self {
        FontHandle::Bitmap(&BUILTIN_FONT)
    }

    pub fn is_bitmap(&self) -> bool {
        matches!(self, FontHandle::Bitmap(_))
    }
}

impl fmt::Debug for FontHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontHandle::Outline(font) => f.debug_tuple("Outline").field(&font.source).finish(),
            FontHandle::Bitmap(_) => f.write_str("Bitmap(builtin)"),
        }
    }
}

/// Where an outline font was loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FontSource {
    /// A font file, with the face index inside a collection.
    File { path: PathBuf, index: u32 },
    /// Bytes registered at runtime under a name.
    Memory { name: String },
}

/// A scalable font plus its origin.
#[derive(Clone)]
pub struct OutlineFont {
    font: FontArc,
    source: FontSource,
}

impl OutlineFont {
    pub fn new(font: FontArc, source: FontSource) -> Self {
        Self { font, source }
    }

    /// Parse face `index` of a font file or collection.
    pub fn from_bytes(data: Vec<u8>, index: u32, source: FontSource) -> Result<Self, InvalidFont> {
        let font = FontVec::try_from_vec_and_index(data, index)?;
        Ok(Self::new(FontArc::new(font), source))
    }

    pub fn font(&self) -> &FontArc {
        &self.font
    }

    pub fn source(&self) -> &FontSource {
        &self.source
    }

    /// Scale at which the em square is `px_size` pixels tall.
    pub fn em_scale(&self, px_size: f32) -> ab_glyph::PxScale {
        let height = self.font.height_unscaled();
        match self.font.units_per_em() {
            Some(upem) if upem > 0.0 && height > 0.0 => {
                ab_glyph::PxScale::from(px_size * height / upem)
            }
            _ => ab_glyph::PxScale::from(px_size),
        }
    }
}

// ============================================================================
// Headless provider
// ============================================================================

/// Provider that always returns the built-in bitmap font.
#[derive(Debug, Default, Clone, Copy)]
pub struct FallbackFontProvider;

impl FontProvider for FallbackFontProvider {
    fn resolve(&self, _family: Option<&str>, _bold: bool, _italic: bool) -> FontHandle {
        FontHandle::builtin()
    }
}

// ============================================================================
// In-memory provider
// ============================================================================

/// Provider backed by fonts registered as raw bytes.
///
/// A requested family that matches a registered name (case-insensitive)
/// wins; otherwise the first registered font is used; with nothing
/// registered the bitmap font is returned.
#[derive(Default, Clone)]
pub struct MemoryFontProvider {
    fonts: Vec<(String, OutlineFont)>,
}

impl MemoryFontProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register face 0 of `data` under `name`, replacing an earlier font
    /// with the same name.
    pub fn register(&mut self, name: impl Into<String>, data: Vec<u8>) -> Result<(), InvalidFont> {
        let name = name.into();
        let font = OutlineFont::from_bytes(data, 0, FontSource::Memory { name: name.clone() })?;
        self.fonts.retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
        self.fonts.push((name, font));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}

impl FontProvider for MemoryFontProvider {
    fn resolve(&self, family: Option<&str>, _bold: bool, _italic: bool) -> FontHandle {
        let by_name = family.and_then(|family| {
            self.fonts
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(family.trim()))
        });
        match by_name.or_else(|| self.fonts.first()) {
            Some((_, font)) => FontHandle::Outline(font.clone()),
            None => FontHandle::builtin(),
        }
    }
}

// ============================================================================
// System provider
// ============================================================================

/// Provider backed by a [`fontdb::Database`] of installed fonts.
///
/// Chain: the requested family in the closest available style, then
/// [`FALLBACK_FAMILIES`], then the generic sans-serif family, then the
/// bitmap font. A family that is a path to an existing font file is loaded
/// directly.
pub struct SystemFontProvider {
    system: bool,
    dirs: Vec<PathBuf>,
    db: OnceLock<fontdb::Database>,
    loaded: Mutex<HashMap<FontSource, OutlineFont>>,
}

impl SystemFontProvider {
    /// Use the fonts installed on this machine.
    pub fn new() -> Self {
        Self {
            system: true,
            dirs: Vec::new(),
            db: OnceLock::new(),
            loaded: Mutex::new(HashMap::new()),
        }
    }

    /// Use only the fonts found below `dirs`.
    pub fn with_search_dirs(dirs: Vec<PathBuf>) -> Self {
        Self {
            system: false,
            dirs,
            ..Self::new()
        }
    }

    /// The font database, loaded on first use.
    fn database(&self) -> &fontdb::Database {
        self.db.get_or_init(|| {
            let mut db = fontdb::Database::new();
            if self.system {
                db.load_system_fonts();
            }
            for dir in &self.dirs {
                db.load_fonts_dir(dir);
            }
            tracing::debug!(faces = db.len(), "loaded font database");
            db
        })
    }

    fn cached(&self, source: &FontSource) -> Option<OutlineFont> {
        self.loaded.lock().ok()?.get(source).cloned()
    }

    fn remember(&self, font: &OutlineFont) {
        if let Ok(mut cache) = self.loaded.lock() {
            cache.insert(font.source().clone(), font.clone());
        }
    }

    fn load_face(&self, db: &fontdb::Database, id: fontdb::ID) -> Option<OutlineFont> {
        let face = db.face(id)?;
        let source = match &face.source {
            fontdb::Source::File(path) => FontSource::File {
                path: path.clone(),
                index: face.index,
            },
            _ => FontSource::Memory {
                name: face.post_script_name.clone(),
            },
        };
        if let Some(font) = self.cached(&source) {
            return Some(font);
        }

        let parsed = db.with_face_data(id, |data, index| {
            OutlineFont::from_bytes(data.to_vec(), index, source.clone())
        })?;
        match parsed {
            Ok(font) => {
                self.remember(&font);
                Some(font)
            }
            Err(e) => {
                tracing::debug!(source = ?source, error = %e, "cannot parse font");
                None
            }
        }
    }

    fn try_family(&self, family: fontdb::Family<'_>, bold: bool, italic: bool) -> Option<OutlineFont> {
        let db = self.database();
        let query = fontdb::Query {
            families: &[family],
            weight: if bold {
                fontdb::Weight::BOLD
            } else {
                fontdb::Weight::NORMAL
            },
            stretch: fontdb::Stretch::Normal,
            style: if italic {
                fontdb::Style::Italic
            } else {
                fontdb::Style::Normal
            },
        };
        let id = db.query(&query)?;
        self.load_face(db, id)
    }

    fn try_path(&self, family: &str) -> Option<OutlineFont> {
        let path = Path::new(family);
        if !has_font_extension(path) || !path.is_file() {
            return None;
        }
        let source = FontSource::File {
            path: path.to_path_buf(),
            index: 0,
        };
        if let Some(font) = self.cached(&source) {
            return Some(font);
        }

        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "cannot read font file");
                return None;
            }
        };
        match OutlineFont::from_bytes(data, 0, source) {
            Ok(font) => {
                self.remember(&font);
                Some(font)
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "cannot parse font");
                None
            }
        }
    }
}

impl Default for SystemFontProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl FontProvider for SystemFontProvider {
    fn resolve(&self, family: Option<&str>, bold: bool, italic: bool) -> FontHandle {
        let requested = family.map(str::trim).filter(|f| !f.is_empty());

        let found = requested
            .and_then(|family| {
                self.try_path(family)
                    .or_else(|| self.try_family(fontdb::Family::Name(family), bold, italic))
            })
            .or_else(|| {
                FALLBACK_FAMILIES
                    .iter()
                    .find_map(|family| self.try_family(fontdb::Family::Name(family), bold, italic))
            })
            .or_else(|| self.try_family(fontdb::Family::SansSerif, bold, italic));

        match found {
            Some(font) => {
                tracing::debug!(source = ?font.source(), "resolved font");
                FontHandle::Outline(font)
            }
            None => {
                tracing::warn!(
                    family = requested.unwrap_or("<default>"),
                    "no outline font found, using built-in bitmap font"
                );
                FontHandle::builtin()
            }
        }
    }
}

fn has_font_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| FONT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
