//! Run outcome and configuration errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message carried by every failed run.
pub const NOT_LOADED_MESSAGE: &str = "Not all fonts are loaded";

/// Outcome handed to the completion callback: `Ok(())` when every
/// requested family settled (including an empty request).
pub type WatchResult = Result<(), FontsNotLoaded>;

/// The only failure a run reports.
///
/// A family that failed to load, a malformed family name, and a font that
/// took longer than the attempt budget are indistinguishable to the
/// detector and all end up here.
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[error("{message}: {}", not_loaded_font_families.join(", "))]
pub struct FontsNotLoaded {
    pub message: String,
    /// Families that never settled, in request order.
    pub not_loaded_font_families: Vec<String>,
}

impl FontsNotLoaded {
    pub fn new(not_loaded_font_families: Vec<String>) -> Self {
        Self {
            message: NOT_LOADED_MESSAGE.to_string(),
            not_loaded_font_families,
        }
    }
}

/// Errors raised while reading [`WatchOptions`](crate::WatchOptions).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid options JSON: {0}")]
    Json(#[from] serde_json::Error),
}
