//! # fontwatch-core
//!
//! Detects when a set of font families has become available for text
//! layout, without any font-loading events from the environment. Each
//! family gets an invisible probe rendered with `"<family>, serif"`; a
//! probe whose size differs from the plain-`serif` baseline is taken as
//! proof its font is active.
//!
//! ## Architecture
//!
//! ```text
//! sample ──► baseline (ReferenceMetrics, optionally cached)
//!   │
//!   └──clone per family──► ProbeSet ──sweep──► Settlement(measured, baseline)
//!                              │
//!                      FontWatch state machine
//!               Initializing ─► Polling ─► Finalized ─► callback (once)
//!                              ▲
//!                       driver (tokio interval) or manual tick()
//! ```
//!
//! - **`surface`** — `Surface` trait: the environment the probes live in.
//! - **`sample`** — Fixed sample text, reference family, font stack format.
//! - **`baseline`** — Reference metrics and the shared write-once cache.
//! - **`settle`** — Pluggable settlement test (default: any dimension differs).
//! - **`probe`** — Per-family probes, sweep, pending/settled accounting.
//! - **`watch`** — Run state machine, teardown and exactly-once callback.
//! - **`driver`** — Async timer loop, `on_fonts_load` entry point.
//! - **`options`** — `maxNumOfTries` / `tryIntervalMs` configuration.

pub mod baseline;
pub mod driver;
pub mod error;
pub mod options;
pub mod probe;
pub mod sample;
pub mod settle;
pub mod surface;
pub mod watch;

// Re-exports for ergonomic use.
pub use baseline::{BaselineCache, ReferenceMetrics};
pub use driver::{drive, drive_until, on_fonts_load, on_fonts_load_cached};
pub use error::{ConfigError, FontsNotLoaded, WatchResult, NOT_LOADED_MESSAGE};
pub use options::{WatchOptions, DEFAULT_MAX_NUM_OF_TRIES, DEFAULT_TRY_INTERVAL_MS};
pub use probe::{Probe, ProbeSet};
pub use sample::{font_stack, SampleSpec, REFERENCE_FAMILY, SAMPLE_FONT_SIZE, SAMPLE_TEXT};
pub use settle::{dimensions_differ, DimensionsDiffer, Settlement};
pub use surface::{ContainerStyle, Dimensions, Surface, SurfaceError};
pub use watch::{Callback, FontWatch, Phase, RunState, Step};
