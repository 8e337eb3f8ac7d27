//! Detection run — the `Initializing → Polling → Finalized` state machine.
//!
//! A [`FontWatch`] owns everything one run creates: its container, its
//! probes, its attempt counter and the completion callback. It does not
//! own a timer. The caller drives it:
//!
//! ```text
//! start() ──► Step::Finished                      (all settled / empty / no budget)
//!    │
//!    └──────► Step::Poll { after } ──► tick() ──► Step::Poll { after } ──► ...
//!                                         │
//!                                         └──► Step::Finished  (settled / budget spent)
//! ```
//!
//! [`crate::driver`] runs this loop on a tokio interval; tests call
//! `tick()` directly to simulate timer events.
//!
//! Finalizing removes the container (and every still-attached probe with
//! it) before the callback is invoked. Both happen at most once per run.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::baseline::{measure_baseline, BaselineCache, ReferenceMetrics};
use crate::error::{FontsNotLoaded, WatchResult};
use crate::options::WatchOptions;
use crate::probe::ProbeSet;
use crate::settle::{DimensionsDiffer, Settlement};
use crate::surface::{ContainerStyle, Surface, SurfaceError};

/// Completion callback. Invoked exactly once per run.
pub type Callback = Box<dyn FnOnce(WatchResult)>;

/// Lifecycle phase of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Initializing,
    Polling,
    Finalized,
}

/// What the driver should do next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Call [`FontWatch::tick`] again after this delay.
    Poll { after: Duration },
    /// The run has finalized; stop the timer.
    Finished,
}

/// Attempt accounting for the polling phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunState {
    pub attempts: u32,
    pub max_attempts: u32,
    pub interval: Duration,
}

impl RunState {
    fn exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }
}

/// One detection run over an ordered list of font families.
pub struct FontWatch<N, P = DimensionsDiffer> {
    id: Uuid,
    options: WatchOptions,
    settlement: P,
    cache: Option<Arc<BaselineCache>>,
    phase: Phase,
    state: RunState,
    container: Option<N>,
    baseline: Option<ReferenceMetrics>,
    probes: ProbeSet<N>,
    callback: Option<Callback>,
    outcome: Option<WatchResult>,
}

impl<N: Clone> FontWatch<N, DimensionsDiffer> {
    /// New run with default options and the default settlement test.
    pub fn new<I, F>(families: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        let options = WatchOptions::default();
        Self {
            id: Uuid::new_v4(),
            state: RunState {
                attempts: 0,
                max_attempts: options.max_num_of_tries,
                interval: options.interval(),
            },
            options,
            settlement: DimensionsDiffer,
            cache: None,
            phase: Phase::Initializing,
            container: None,
            baseline: None,
            probes: ProbeSet::new(families),
            callback: None,
            outcome: None,
        }
    }
}

impl<N: Clone, P: Settlement> FontWatch<N, P> {
    pub fn with_options(mut self, options: WatchOptions) -> Self {
        let options = options.normalized();
        self.state.max_attempts = options.max_num_of_tries;
        self.state.interval = options.interval();
        self.options = options;
        self
    }

    /// Share a baseline with other runs on the same surface.
    pub fn with_baseline_cache(mut self, cache: Arc<BaselineCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Replace the settlement test.
    pub fn with_settlement<Q: Settlement>(self, settlement: Q) -> FontWatch<N, Q> {
        FontWatch {
            id: self.id,
            options: self.options,
            settlement,
            cache: self.cache,
            phase: self.phase,
            state: self.state,
            container: self.container,
            baseline: self.baseline,
            probes: self.probes,
            callback: self.callback,
            outcome: self.outcome,
        }
    }

    /// Register the completion callback.
    pub fn on_complete(mut self, callback: impl FnOnce(WatchResult) + 'static) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    // ---------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn options(&self) -> &WatchOptions {
        &self.options
    }

    pub fn baseline(&self) -> Option<ReferenceMetrics> {
        self.baseline
    }

    pub fn probes(&self) -> &ProbeSet<N> {
        &self.probes
    }

    /// Final result, once the run has finalized.
    pub fn outcome(&self) -> Option<&WatchResult> {
        self.outcome.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finalized
    }

    // ---------------------------------------------------------------
    // Transitions
    // ---------------------------------------------------------------

    /// Build the baseline and probes, then run the immediate sweep.
    ///
    /// Finalizes right away when there is nothing to wait for: an empty
    /// request, every probe settled on the first sweep, or a zero attempt
    /// budget. Calling `start` again is a no-op that reports the current step.
    pub fn start<S>(&mut self, surface: &mut S) -> Step
    where
        S: Surface<Node = N>,
    {
        match self.phase {
            Phase::Initializing => {}
            Phase::Polling => return self.poll_step(),
            Phase::Finalized => return Step::Finished,
        }

        log::debug!(
            "Run {}: watching {} font families",
            self.id,
            self.probes.len()
        );

        if self.probes.is_empty() {
            return self.finalize(surface);
        }

        if let Err(e) = self.prepare(surface) {
            log::error!("Run {}: environment fault during setup: {e}", self.id);
            return self.finalize(surface);
        }

        if let Err(e) = self.sweep(surface) {
            log::error!("Run {}: environment fault during first sweep: {e}", self.id);
            return self.finalize(surface);
        }

        if self.probes.pending_count() == 0 || self.state.exhausted() {
            return self.finalize(surface);
        }

        self.phase = Phase::Polling;
        log::debug!(
            "Run {}: {} pending after first sweep, polling every {:?} (max {}, gives up after {:?})",
            self.id,
            self.probes.pending_count(),
            self.state.interval,
            self.state.max_attempts,
            self.options.budget()
        );
        self.poll_step()
    }

    /// One poll tick: sweep the pending probes and count the attempt.
    ///
    /// A tick before `start` starts the run; ticks after finalization are
    /// ignored.
    pub fn tick<S>(&mut self, surface: &mut S) -> Step
    where
        S: Surface<Node = N>,
    {
        match self.phase {
            Phase::Initializing => return self.start(surface),
            Phase::Polling => {}
            Phase::Finalized => return Step::Finished,
        }

        if let Err(e) = self.sweep(surface) {
            log::error!("Run {}: environment fault during poll: {e}", self.id);
            return self.finalize(surface);
        }
        self.state.attempts += 1;

        log::trace!(
            "Run {}: tick {}/{}, {} pending",
            self.id,
            self.state.attempts,
            self.state.max_attempts,
            self.probes.pending_count()
        );

        if self.probes.pending_count() == 0 || self.state.exhausted() {
            return self.finalize(surface);
        }
        self.poll_step()
    }

    /// Stop the run now. Still-pending families are reported as not
    /// loaded. No-op on a finished run.
    pub fn cancel<S>(&mut self, surface: &mut S) -> Step
    where
        S: Surface<Node = N>,
    {
        if self.phase == Phase::Finalized {
            return Step::Finished;
        }
        log::debug!("Run {}: cancelled", self.id);
        self.finalize(surface)
    }

    // ---------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------

    fn poll_step(&self) -> Step {
        Step::Poll {
            after: self.state.interval,
        }
    }

    /// Container, sample, baseline, probes. The sample is the template the
    /// probes are cloned from and is removed once they exist.
    fn prepare<S>(&mut self, surface: &mut S) -> Result<(), SurfaceError>
    where
        S: Surface<Node = N>,
    {
        let spec = self.options.sample.clone();
        let style = ContainerStyle::offscreen(spec.reference_family.as_str(), spec.font_size);
        let container = surface.create_container(&style)?;
        self.container = Some(container.clone());

        let sample = surface.create_sample(&container, &spec.text)?;
        let baseline = match &self.cache {
            Some(cache) => cache.get_or_measure(|| measure_baseline(surface, &sample))?,
            None => measure_baseline(surface, &sample)?,
        };
        self.baseline = Some(baseline);

        self.probes.attach(surface, &sample, &container, &spec)?;
        surface.remove(&sample)?;
        Ok(())
    }

    fn sweep<S>(&mut self, surface: &mut S) -> Result<usize, SurfaceError>
    where
        S: Surface<Node = N>,
    {
        let baseline = self
            .baseline
            .ok_or_else(|| SurfaceError::Backend("baseline not measured".into()))?;
        self.probes.sweep(surface, &baseline, &self.settlement)
    }

    /// Tear down and report. Runs once; `phase` guards every caller.
    fn finalize<S>(&mut self, surface: &mut S) -> Step
    where
        S: Surface<Node = N>,
    {
        self.phase = Phase::Finalized;

        if let Some(container) = self.container.take() {
            if let Err(e) = surface.remove(&container) {
                log::warn!("Run {}: failed to remove container: {e}", self.id);
            }
        }
        self.probes.release();

        let not_loaded = self.probes.pending_families();
        let result = if not_loaded.is_empty() {
            log::info!("Run {}: all {} font families loaded", self.id, self.probes.len());
            Ok(())
        } else {
            log::info!(
                "Run {}: {} of {} font families not loaded: {:?}",
                self.id,
                not_loaded.len(),
                self.probes.len(),
                not_loaded
            );
            Err(FontsNotLoaded::new(not_loaded))
        };

        self.outcome = Some(result.clone());
        if let Some(callback) = self.callback.take() {
            callback(result);
        }
        Step::Finished
    }
}

// ===================================================================
// Tests
// ===================================================================
