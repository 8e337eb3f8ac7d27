//! Text measurement backends for the headless surface.

use fontwatch_core::Dimensions;
use fontwatch_text::{FamilyName, FontStack, GenericFamily, TextEngine};
use rustc_hash::FxHashMap;

/// Measures a single unwrapped text run under a CSS font stack.
pub trait TextMeasure {
    fn measure_text(&mut self, text: &str, font_family: &str, font_size: f32) -> Dimensions;

    /// Changes whenever the available fonts change, so the surface knows
    /// its cached layout is stale.
    fn generation(&self) -> u64 {
        0
    }
}

impl TextMeasure for TextEngine {
    fn measure_text(&mut self, text: &str, font_family: &str, font_size: f32) -> Dimensions {
        let extent = self.measure(text, font_family, font_size);
        Dimensions::new(extent.width, extent.height)
    }

    fn generation(&self) -> u64 {
        TextEngine::generation(self)
    }
}

// ── Synthetic metrics ───────────────────────────────────────────────

/// Per-face metrics, in em units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceMetrics {
    /// Advance of every character.
    pub advance: f32,
    pub line_height: f32,
}

impl FaceMetrics {
    pub const fn new(advance: f32, line_height: f32) -> Self {
        Self {
            advance,
            line_height,
        }
    }
}

/// Deterministic, font-file-free metrics: every face is a fixed advance
/// and line height. Named families only resolve once registered.
#[derive(Clone, Debug)]
pub struct SyntheticMetrics {
    faces: FxHashMap<String, FaceMetrics>,
    generics: FxHashMap<GenericFamily, FaceMetrics>,
    generation: u64,
}

impl Default for SyntheticMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticMetrics {
    pub fn new() -> Self {
        let generics = [
            (GenericFamily::Serif, FaceMetrics::new(0.5, 1.15)),
            (GenericFamily::SansSerif, FaceMetrics::new(0.55, 1.15)),
            (GenericFamily::Monospace, FaceMetrics::new(0.6, 1.2)),
            (GenericFamily::Cursive, FaceMetrics::new(0.45, 1.3)),
            (GenericFamily::Fantasy, FaceMetrics::new(0.65, 1.25)),
        ]
        .into_iter()
        .collect();

        Self {
            faces: FxHashMap::default(),
            generics,
            generation: 0,
        }
    }

    /// Make `family` available with `metrics`.
    pub fn register(&mut self, family: &str, metrics: FaceMetrics) {
        self.faces.insert(family.to_lowercase(), metrics);
        self.generation += 1;
    }

    /// Remove `family`. Returns whether it was registered.
    pub fn unregister(&mut self, family: &str) -> bool {
        let removed = self.faces.remove(&family.to_lowercase()).is_some();
        if removed {
            self.generation += 1;
        }
        removed
    }

    pub fn is_registered(&self, family: &str) -> bool {
        self.faces.contains_key(&family.to_lowercase())
    }

    /// Metrics of the generic family a stack falls back to.
    pub fn generic(&self, generic: GenericFamily) -> FaceMetrics {
        self.generics
            .get(&generic)
            .copied()
            .unwrap_or(FaceMetrics::new(0.5, 1.15))
    }

    fn resolve(&self, stack: &FontStack) -> FaceMetrics {
        for family in stack.families() {
            match family {
                FamilyName::Named(name) => {
                    if let Some(face) = self.faces.get(&name.to_lowercase()) {
                        return *face;
                    }
                }
                FamilyName::Generic(generic) => return self.generic(*generic),
            }
        }
        self.generic(stack.generic_fallback())
    }
}

impl TextMeasure for SyntheticMetrics {
    fn measure_text(&mut self, text: &str, font_family: &str, font_size: f32) -> Dimensions {
        let face = self.resolve(&FontStack::parse(font_family));
        let chars = text.chars().count() as f32;
        Dimensions::new(
            chars * face.advance * font_size,
            face.line_height * font_size,
        )
    }

    fn generation(&self) -> u64 {
        self.generation
    }
}

// ===================================================================
// Tests
// ===================================================================
