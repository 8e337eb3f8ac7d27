//! Run configuration.
//!
//! Recognised keys mirror the caller-facing contract: `maxNumOfTries` and
//! `tryIntervalMs`. Options can be built in code or parsed from a JSON
//! object; unknown keys are ignored.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::sample::SampleSpec;

/// Default number of poll ticks after the immediate sweep.
pub const DEFAULT_MAX_NUM_OF_TRIES: u32 = 10;

/// Default delay between poll ticks, in milliseconds.
pub const DEFAULT_TRY_INTERVAL_MS: u64 = 250;

/// Options for one detection run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WatchOptions {
    /// Poll ticks allowed after the immediate sweep. `0` means the
    /// immediate sweep is the only check.
    pub max_num_of_tries: u32,
    /// Delay between poll ticks. `0` is replaced by the default.
    pub try_interval_ms: u64,
    /// Sample text, size and reference family.
    #[serde(skip)]
    pub sample: SampleSpec,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            max_num_of_tries: DEFAULT_MAX_NUM_OF_TRIES,
            try_interval_ms: DEFAULT_TRY_INTERVAL_MS,
            sample: SampleSpec::default(),
        }
    }
}

impl WatchOptions {
    /// Parse options from a JSON object such as
    /// `{"maxNumOfTries": 3, "tryIntervalMs": 100}`.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let options: Self = serde_json::from_str(json)?;
        Ok(options.normalized())
    }

    pub fn with_max_num_of_tries(mut self, tries: u32) -> Self {
        self.max_num_of_tries = tries;
        self
    }

    pub fn with_try_interval_ms(mut self, ms: u64) -> Self {
        self.try_interval_ms = ms;
        self
    }

    pub fn with_sample(mut self, sample: SampleSpec) -> Self {
        self.sample = sample;
        self
    }

    /// Replace a zero interval with the default.
    pub fn normalized(mut self) -> Self {
        if self.try_interval_ms == 0 {
            self.try_interval_ms = DEFAULT_TRY_INTERVAL_MS;
        }
        self
    }

    /// Delay between poll ticks.
    pub fn interval(&self) -> Duration {
        let ms = if self.try_interval_ms == 0 {
            DEFAULT_TRY_INTERVAL_MS
        } else {
            self.try_interval_ms
        };
        Duration::from_millis(ms)
    }

    /// Upper bound on how long a run can poll before giving up.
    pub fn budget(&self) -> Duration {
        self.interval() * self.max_num_of_tries
    }
}

// ===================================================================
// Tests
// ===================================================================
