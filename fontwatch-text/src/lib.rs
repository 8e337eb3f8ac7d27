//! # fontwatch-text
//!
//! Text metrics backend for fontwatch. Measures single-line text runs under
//! a CSS-style font stack via `cosmic-text`, and lets the host register
//! font data at runtime so families become available mid-run.
//!
//! ## Architecture
//!
//! ```text
//! "Lobster, serif" ──► FontStack ──► TextEngine::resolve ──► Lobster | serif
//!                                          │
//!                                          ▼
//!                             cosmic-text Buffer (no wrap) ──► TextExtent
//!                                          │
//!                                     LRU (text, family, size)
//! ```
//!
//! - **`fonts`** — Font stack parsing and generic families.
//! - **`engine`** — Font registration, stack resolution, measurement.

pub mod engine;
pub mod fonts;

// Re-exports for ergonomic use.
pub use engine::{ResolvedFamily, TextEngine, TextError, TextExtent, NORMAL_LINE_HEIGHT};
pub use fonts::{parse_generic, FamilyName, FontStack, GenericFamily};
