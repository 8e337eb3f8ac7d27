//! Reference metrics and the optional cross-run baseline cache.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::surface::{Dimensions, Surface, SurfaceError};

/// Size of the measurement sample rendered in the reference family only.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReferenceMetrics {
    pub width: f32,
    pub height: f32,
}

impl From<Dimensions> for ReferenceMetrics {
    fn from(d: Dimensions) -> Self {
        Self {
            width: d.width,
            height: d.height,
        }
    }
}

/// Measure the baseline: `sample` must already sit in the container and
/// carry no font override, so it renders in the inherited reference family.
pub fn measure_baseline<S: Surface>(
    surface: &mut S,
    sample: &S::Node,
) -> Result<ReferenceMetrics, SurfaceError> {
    let metrics = ReferenceMetrics::from(surface.measure(sample)?);
    log::debug!(
        "Baseline measured: {:.1}x{:.1}",
        metrics.width,
        metrics.height
    );
    Ok(metrics)
}

/// Write-once baseline shared between runs on the same surface.
///
/// The first run that is handed the cache measures and stores the
/// baseline; every later run reads it back without re-measuring. Share it
/// by reference (`Rc`/`Arc`). A cache must not be shared between surfaces
/// with different text backends.
#[derive(Debug, Default)]
pub struct BaselineCache {
    metrics: OnceLock<ReferenceMetrics>,
}

impl BaselineCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached metrics, if a run has already measured them.
    pub fn get(&self) -> Option<ReferenceMetrics> {
        self.metrics.get().copied()
    }

    /// Return the cached metrics, or run `measure` and store its result.
    ///
    /// A failed measurement leaves the cache empty.
    pub fn get_or_measure<F>(&self, measure: F) -> Result<ReferenceMetrics, SurfaceError>
    where
        F: FnOnce() -> Result<ReferenceMetrics, SurfaceError>,
    {
        if let Some(cached) = self.metrics.get() {
            log::trace!("Baseline served from cache");
            return Ok(*cached);
        }
        let measured = measure()?;
        // A concurrent writer may have won; the first stored value is kept.
        Ok(*self.metrics.get_or_init(|| measured))
    }

    pub fn is_populated(&self) -> bool {
        self.metrics.get().is_some()
    }
}

// ===================================================================
// Tests
// ===================================================================
