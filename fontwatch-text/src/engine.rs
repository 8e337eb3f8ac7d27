//! Text engine — measures single-line text runs using `cosmic-text`.
//!
//! The engine owns a `FontSystem` (font database + shaping). A measurement
//! resolves the CSS font stack against the database the way a browser
//! would: the first named family that has been registered wins, otherwise
//! the stack's generic keyword is used. A family that is not registered
//! yet therefore renders in the fallback, and starts rendering in its own
//! face as soon as [`TextEngine::register_font_data`] makes it available.
//!
//! Only families that have a face of their own are shaped. A generic
//! keyword with no matching face (and every family, when the database has
//! no upright face at all) is measured with a fixed reference advance
//! instead. Letting the shaper substitute an arbitrary registered face for
//! `serif` would make the baseline and the probe render identically.
//!
//! Results are memoised in an LRU keyed by text, resolved family and size.
//! Registering a font clears the cache and bumps [`TextEngine::generation`].

use std::num::NonZeroUsize;
use std::path::Path;

use cosmic_text::{fontdb, Attrs, Buffer, Family, FontSystem, Metrics, Shaping};
use lru::LruCache;
use thiserror::Error;

use crate::fonts::{FamilyName, FontStack, GenericFamily};

/// Default number of memoised measurements.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Line height as a multiple of the font size (CSS `line-height: normal`).
pub const NORMAL_LINE_HEIGHT: f32 = 1.2;

/// Per-character advance, in em, of runs measured without a face.
pub const REFERENCE_ADVANCE: f32 = 0.5;

#[derive(Debug, Error)]
pub enum TextError {
    #[error("Font data contained no usable faces")]
    InvalidFontData,
    #[error("Failed to read font file: {0}")]
    Io(#[from] std::io::Error),
}

/// Bounding box of a measured text run.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TextExtent {
    pub width: f32,
    pub height: f32,
}

/// Family a stack resolved to against the current database.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ResolvedFamily {
    Named(String),
    Generic(GenericFamily),
}

impl ResolvedFamily {
    fn as_family(&self) -> Family<'_> {
        match self {
            Self::Named(name) => Family::Name(name),
            Self::Generic(GenericFamily::Serif) => Family::Serif,
            Self::Generic(GenericFamily::SansSerif) => Family::SansSerif,
            Self::Generic(GenericFamily::Monospace) => Family::Monospace,
            Self::Generic(GenericFamily::Cursive) => Family::Cursive,
            Self::Generic(GenericFamily::Fantasy) => Family::Fantasy,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct MeasureKey {
    text: String,
    family: ResolvedFamily,
    size_bits: u32,
}

/// Text measurement engine wrapping cosmic-text.
pub struct TextEngine {
    font_system: FontSystem,
    cache: LruCache<MeasureKey, TextExtent>,
    generation: u64,
    /// Whether the shaper can pick a default face at all.
    shapeable: bool,
}

impl Default for TextEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextEngine {
    /// Engine backed by the system fonts.
    pub fn new() -> Self {
        Self::with_font_system(FontSystem::new())
    }

    /// Engine with an empty font database. Only fonts registered through
    /// [`register_font_data`](Self::register_font_data) are available.
    pub fn empty() -> Self {
        let db = fontdb::Database::new();
        Self::with_font_system(FontSystem::new_with_locale_and_db("en-US".to_string(), db))
    }

    pub fn with_font_system(font_system: FontSystem) -> Self {
        let capacity = NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        let shapeable = has_upright_face(font_system.db());
        if !shapeable {
            log::warn!("TextEngine: no upright font face available, using reference metrics");
        }
        Self {
            font_system,
            cache: LruCache::new(capacity),
            generation: 0,
            shapeable,
        }
    }

    /// Number of font faces in the database.
    pub fn face_count(&self) -> usize {
        self.font_system.db().len()
    }

    /// Bumped every time the set of available fonts changes.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Memoised measurements currently held.
    pub fn cached_measurements(&self) -> usize {
        self.cache.len()
    }

    /// Whether a face with this family name is registered (case-insensitive).
    pub fn has_family(&self, name: &str) -> bool {
        self.family_name(name).is_some()
    }

    /// Family name as spelled in the database, for a case-insensitive match.
    fn family_name(&self, name: &str) -> Option<String> {
        self.font_system.db().faces().find_map(|face| {
            face.families
                .iter()
                .find(|(n, _)| n.eq_ignore_ascii_case(name))
                .map(|(n, _)| n.clone())
        })
    }

    /// Whether `family` would be shaped in a face of its own.
    pub fn has_face(&self, family: &ResolvedFamily) -> bool {
        match family {
            ResolvedFamily::Named(_) => true,
            ResolvedFamily::Generic(_) => {
                let db = self.font_system.db();
                let generic = family.as_family();
                self.has_family(db.family_name(&generic))
            }
        }
    }

    /// Add font faces from raw font bytes (TTF/OTF/TTC).
    ///
    /// Returns how many faces were added.
    pub fn register_font_data(&mut self, data: Vec<u8>) -> Result<usize, TextError> {
        let before = self.face_count();
        self.font_system.db_mut().load_font_data(data);
        let added = self.face_count().saturating_sub(before);
        if added == 0 {
            return Err(TextError::InvalidFontData);
        }
        self.cache.clear();
        self.generation += 1;
        self.shapeable = has_upright_face(self.font_system.db());
        log::info!("TextEngine: registered {added} font faces (generation {})", self.generation);
        Ok(added)
    }

    /// Read a font file and register its faces.
    pub fn register_font_file(&mut self, path: impl AsRef<Path>) -> Result<usize, TextError> {
        let data = std::fs::read(path.as_ref())?;
        log::debug!("TextEngine: loading font file {}", path.as_ref().display());
        self.register_font_data(data)
    }

    /// Resolve a stack to the first registered named family, or its generic.
    pub fn resolve(&self, stack: &FontStack) -> ResolvedFamily {
        for family in stack.families() {
            match family {
                FamilyName::Named(name) => {
                    if let Some(found) = self.family_name(name) {
                        return ResolvedFamily::Named(found);
                    }
                }
                FamilyName::Generic(generic) => return ResolvedFamily::Generic(*generic),
            }
        }
        ResolvedFamily::Generic(stack.generic_fallback())
    }

    /// Measure `text` as one unwrapped line in `font_family` at `font_size`.
    pub fn measure(&mut self, text: &str, font_family: &str, font_size: f32) -> TextExtent {
        let stack = FontStack::parse(font_family);
        let family = self.resolve(&stack);
        let key = MeasureKey {
            text: text.to_string(),
            family,
            size_bits: font_size.to_bits(),
        };
        if let Some(extent) = self.cache.get(&key) {
            return *extent;
        }

        let extent = if self.shapeable && self.has_face(&key.family) {
            self.shape(&key.text, &key.family, font_size)
        } else {
            reference_extent(&key.text, font_size)
        };
        log::trace!(
            "TextEngine: '{stack}' as {:?} at {font_size}px -> {:.1}x{:.1}",
            key.family,
            extent.width,
            extent.height
        );
        self.cache.put(key, extent);
        extent
    }

    fn shape(&mut self, text: &str, family: &ResolvedFamily, font_size: f32) -> TextExtent {
        let metrics = Metrics::new(font_size, font_size * NORMAL_LINE_HEIGHT);
        let attrs = Attrs::new().family(family.as_family());

        // No width limit: the run never wraps.
        let mut buffer = Buffer::new(&mut self.font_system, metrics);
        buffer.set_size(&mut self.font_system, None, None);
        buffer.set_text(&mut self.font_system, text, attrs, Shaping::Advanced);
        buffer.shape_until_scroll(&mut self.font_system, false);

        let mut width: f32 = 0.0;
        let mut lines = 0usize;
        for run in buffer.layout_runs() {
            width = width.max(run.line_w);
            lines += 1;
        }

        TextExtent {
            width,
            height: lines.max(1) as f32 * metrics.line_height,
        }
    }
}

/// Extent of a run in a face with a fixed advance and normal line height.
fn reference_extent(text: &str, font_size: f32) -> TextExtent {
    TextExtent {
        width: text.chars().count() as f32 * REFERENCE_ADVANCE * font_size,
        height: font_size * NORMAL_LINE_HEIGHT,
    }
}

/// The shaper needs at least one upright, normal-width face as a default.
fn has_upright_face(db: &fontdb::Database) -> bool {
    db.faces().any(|face| {
        face.post_script_name.contains("Emoji")
            || (face.style == fontdb::Style::Normal && face.stretch == fontdb::Stretch::Normal)
    })
}

// ===================================================================
// Tests
// ===================================================================
