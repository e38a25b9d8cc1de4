//! Errors raised inside workflows

use serde::{Deserialize, Serialize};

use crate::naming::CompositeName;
use crate::step::StepError;

/// Exception value thrown into and raised by workflows
///
/// This is what the display side sends with a `ThrowActionException`
/// request, what the driver injects on cancellation, and what a failed run
/// reports in its outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionError {
    /// Error message
    pub message: String,

    /// Diagnostic detail shown on request
    #[serde(default)]
    pub detail: Option<String>,

    /// Error code for programmatic handling
    #[serde(default)]
    pub code: Option<String>,
}

impl ActionError {
    /// Create a new action error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            detail: None,
            code: None,
        }
    }

    /// The cancellation condition injected into a workflow
    pub fn cancelled() -> Self {
        Self::new("action cancelled").with_code(error_codes::CANCEL_REQUEST)
    }

    /// A step or driver broke the protocol's invariants
    pub fn protocol_violation(message: impl Into<String>) -> Self {
        Self::new(message).with_code(error_codes::PROTOCOL_VIOLATION)
    }

    /// A composite name could not be resolved
    pub fn name_not_found(name: &CompositeName) -> Self {
        Self::new(format!("no binding for name: {name}")).with_code(error_codes::NAME_NOT_FOUND)
    }

    /// A workflow or action panicked; the payload message becomes the detail
    pub fn panicked(payload: &(dyn std::any::Any + Send)) -> Self {
        let detail = payload
            .downcast_ref::<&str>()
            .map(|message| message.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        Self::new("action panicked")
            .with_code(error_codes::PANIC)
            .with_detail(detail)
    }

    /// Set the error code
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Set the diagnostic detail
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Check if this is the cancellation condition
    pub fn is_cancellation(&self) -> bool {
        self.code.as_deref() == Some(error_codes::CANCEL_REQUEST)
    }
}

impl std::fmt::Display for ActionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ActionError {}

impl From<StepError> for ActionError {
    fn from(err: StepError) -> Self {
        Self::new(err.to_string()).with_code(error_codes::STEP_ERROR)
    }
}

/// Common error code constants
pub mod error_codes {
    /// Cancellation requested by the display side
    pub const CANCEL_REQUEST: &str = "cancel_request";

    /// A step was classified inconsistently
    pub const PROTOCOL_VIOLATION: &str = "protocol_violation";

    /// Registry lookup failed
    pub const NAME_NOT_FOUND: &str = "name_not_found";

    /// A step or its reply could not be encoded or decoded
    pub const STEP_ERROR: &str = "step_error";

    /// Action code panicked while running on the model side
    pub const PANIC: &str = "panic";
}
