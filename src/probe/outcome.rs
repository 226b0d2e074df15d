//! Per-candidate probe outcome.

use serde::{Deserialize, Serialize};

use crate::error_handling::ErrorKind;

/// Result of testing one candidate.
///
/// `delay_ms` is `-1` whenever the candidate failed, and `error_kind` is set exactly
/// when `success` is false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    pub success: bool,
    pub delay_ms: i64,
    pub error_kind: Option<ErrorKind>,
}

impl ProbeOutcome {
    pub fn passed(delay_ms: i64) -> Self {
        Self {
            success: true,
            delay_ms,
            error_kind: None,
        }
    }

    pub fn failed(kind: ErrorKind) -> Self {
        Self {
            success: false,
            delay_ms: -1,
            error_kind: Some(kind),
        }
    }
}
