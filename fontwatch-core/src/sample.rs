//! Measurement sample — the fixed text and styling every probe is cloned from.
//!
//! The sample mixes printable ASCII, Latin-1, Greek, typographic punctuation,
//! arrows and mathematical operators so that almost any real typeface will
//! produce a different advance width than the reference family. It is
//! rendered at a large size to amplify sub-pixel differences.

use serde::{Deserialize, Serialize};

/// Generic family every probe falls back to, and the one the baseline uses.
pub const REFERENCE_FAMILY: &str = "serif";

/// Font size (logical pixels) of the container, inherited by every sample.
pub const SAMPLE_FONT_SIZE: f32 = 40.0;

/// Offset used to move the container out of the visible area.
pub const OFFSCREEN_OFFSET: f32 = -10000.0;

/// Character set rendered by the baseline and by every probe.
pub const SAMPLE_TEXT: &str = " !\"\\#$%&'()*+,-./0123456789:;<=>?@ABCDEFGHIJKLMNOPQRSTUVWXYZ[]^_`abcdefghijklmnopqrstuvwxyz{|}~¡¢£¤¥¦§¨©ª«¬\u{ad}®¯°±²³´µ¶·¸¹º»¼½¾¿ÀÁÂÃÄÅÆÇÈÉÊËÌÍÎÏÐÑÒÓÔÕÖ×ØÙÚÛÜÝÞßàáâãäåæçèéêëìíîïðñòóôõö÷øùúûüýþÿŒœŠšŸƒˆ˜ΑΒΓΔΕΖΗΘΙΚΛΜΝΞΟΠΡΣΤΥΦΧΨΩαβγδεζηθικλμνξοπρςστυφχψωϑϒϖ–—‘’‚“”„†‡•…‰′″‹›‾⁄€ℑ℘ℜ™ℵ←↑→↓↔↵⇐⇑⇒⇓⇔∀∂∃∅∇∈∉∋∏∑−∗√∝∞∠∧∨∩∪∫∴∼≅≈≠≡≤≥⊂⊃⊄⊆⊇⊕⊗⊥⋅⌈⌉⌊⌋〈〉◊♠♣♥♦";

/// Build the font stack applied to a probe: `"<candidate>, <reference>"`.
pub fn font_stack(candidate: &str, reference: &str) -> String {
    format!("{candidate}, {reference}")
}

/// Text, size and reference family used to build the baseline and probes.
///
/// Both the baseline and the probes must share this exactly; a different
/// size or wrapping mode would change the measured width on its own.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleSpec {
    pub text: String,
    pub font_size: f32,
    pub reference_family: String,
}

impl Default for SampleSpec {
    fn default() -> Self {
        Self {
            text: SAMPLE_TEXT.to_string(),
            font_size: SAMPLE_FONT_SIZE,
            reference_family: REFERENCE_FAMILY.to_string(),
        }
    }
}

impl SampleSpec {
    /// Font stack for a candidate family over this sample's reference family.
    pub fn stack_for(&self, candidate: &str) -> String {
        font_stack(candidate, &self.reference_family)
    }
}

// ===================================================================
// Tests
// ===================================================================
