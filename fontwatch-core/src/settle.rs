//! Settlement — deciding from a measurement whether a probe's font applied.
//!
//! The default test is deliberately coarse: any change in width or height
//! relative to the baseline counts as proof the candidate font is active.
//! A candidate that is metric-identical to the reference family therefore
//! never settles and is reported as not loaded, even if it did load. This
//! is a limit of the method, not something a strategy here can repair.

use crate::baseline::ReferenceMetrics;
use crate::surface::Dimensions;

/// Strategy deciding whether a probe measurement shows its font is active.
pub trait Settlement {
    fn is_settled(&self, measured: Dimensions, baseline: &ReferenceMetrics) -> bool;
}

/// `true` when either dimension differs from the baseline.
pub fn dimensions_differ(measured: Dimensions, baseline: &ReferenceMetrics) -> bool {
    measured.width != baseline.width || measured.height != baseline.height
}

/// Default strategy: [`dimensions_differ`].
#[derive(Clone, Copy, Debug, Default)]
pub struct DimensionsDiffer;

impl Settlement for DimensionsDiffer {
    fn is_settled(&self, measured: Dimensions, baseline: &ReferenceMetrics) -> bool {
        dimensions_differ(measured, baseline)
    }
}

impl<F> Settlement for F
where
    F: Fn(Dimensions, &ReferenceMetrics) -> bool,
{
    fn is_settled(&self, measured: Dimensions, baseline: &ReferenceMetrics) -> bool {
        self(measured, baseline)
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: ReferenceMetrics = ReferenceMetrics {
        width: 500.0,
        height: 46.0,
    };

    #[test]
    fn test_identical_dimensions_pending() {
        assert!(!dimensions_differ(Dimensions::new(500.0, 46.0), &BASE));
    }

    #[test]
    fn test_width_change_settles() {
        assert!(dimensions_differ(Dimensions::new(501.0, 46.0), &BASE));
        assert!(dimensions_differ(Dimensions::new(320.0, 46.0), &BASE));
    }

    #[test]
    fn test_height_change_settles() {
        assert!(dimensions_differ(Dimensions::new(500.0, 52.0), &BASE));
    }

    #[test]
    fn test_default_strategy_matches_function() {
        let strategy = DimensionsDiffer;
        assert!(!strategy.is_settled(Dimensions::new(500.0, 46.0), &BASE));
        assert!(strategy.is_settled(Dimensions::new(500.0, 40.0), &BASE));
    }

    #[test]
    fn test_closure_strategy() {
        // Require a delta of at least 2 units on either axis.
        let tolerant = |m: Dimensions, b: &ReferenceMetrics| {
            (m.width - b.width).abs() >= 2.0 || (m.height - b.height).abs() >= 2.0
        };
        assert!(!tolerant.is_settled(Dimensions::new(501.0, 46.0), &BASE));
        assert!(tolerant.is_settled(Dimensions::new(503.0, 46.0), &BASE));
    }
}
