//! Mutation behavior switches

use serde::{Deserialize, Serialize};

/// What to do when a single directive fails.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Record the failure, keep applying the remaining directives and save
    /// whatever succeeded.
    #[default]
    Continue,
    /// Abort the batch on the first failure. Nothing is saved.
    Abort,
}

/// Handling of characters WinAnsiEncoding cannot represent.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UnsupportedCharPolicy {
    /// Replace each unsupported character with `?`.
    #[default]
    Substitute,
    /// Fail the directive.
    Reject,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MutationOptions {
    pub failure_policy: FailurePolicy,
    pub unsupported_chars: UnsupportedCharPolicy,
    /// Flate-compress the overlay streams
    pub compress_overlays: bool,
    /// Wrap the original page content in `q`/`Q` before the first overlay so
    /// leftover transforms cannot displace it
    pub isolate_page_state: bool,
}

impl MutationOptions {
    pub fn strict() -> Self {
        Self {
            failure_policy: FailurePolicy::Abort,
            unsupported_chars: UnsupportedCharPolicy::Reject,
            ..Self::default()
        }
    }
}
