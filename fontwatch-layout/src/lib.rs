//! # fontwatch-layout
//!
//! Headless rendering surface for fontwatch. A Taffy layout tree stands in
//! for the live document: the detector's off-screen container and probes
//! become absolutely positioned nodes, text leaves are sized through a
//! [`TextMeasure`] backend, and font-family / font-size are inherited down
//! the tree the way CSS inherits them.
//!
//! ```text
//! root (viewport)
//!   └── container  abs(-10000, -10000)  serif 40px
//!         ├── text "…"  "Lobster, serif"   ──► TextMeasure ──► Dimensions
//!         └── text "…"  "Inter, serif"
//! ```
//!
//! - **`engine`** — `HeadlessSurface`, implements `fontwatch_core::Surface`.
//! - **`measure`** — `TextMeasure` trait; cosmic-text and synthetic backends.

pub mod engine;
pub mod measure;

// Re-exports for ergonomic use.
pub use engine::{HeadlessSurface, LayoutError, SurfaceConfig};
pub use measure::{FaceMetrics, SyntheticMetrics, TextMeasure};
