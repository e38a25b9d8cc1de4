//! Response and cancel handlers
//!
//! The driver never talks to the display side directly. It emits
//! notifications through a [`ResponseHandler`] and polls a
//! [`CancelHandler`] between steps.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::naming::CompositeName;
use crate::step::{ActionStep, SerializableStep};
use crate::workflow::ActionError;

/// How a run ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum ActionOutcome {
    /// The run unwound on a cancellation request
    Cancelled,

    /// The workflow ran to completion
    Completed(Option<serde_json::Value>),

    /// The run could not start, or raised an unhandled error
    Failed(ActionError),
}

impl ActionOutcome {
    /// Short status label for logs
    pub fn status(&self) -> &'static str {
        match self {
            Self::Cancelled => "cancelled",
            Self::Completed(_) => "completed",
            Self::Failed(_) => "failed",
        }
    }
}

/// Display-ward message, in emission order
#[derive(Debug, Clone)]
pub enum Notification {
    /// A step with a byte encoding
    SerializableStep {
        run_name: CompositeName,
        gui_run_name: CompositeName,
        step_type: String,
        blocking: bool,
        payload: Vec<u8>,
    },

    /// A non-blocking step handed over as an object (same process only)
    ObjectStep {
        run_name: CompositeName,
        gui_run_name: CompositeName,
        step: Arc<dyn ActionStep>,
    },

    /// A run stopped, or could not be started
    ActionStopped {
        run_name: CompositeName,
        gui_run_name: CompositeName,
        outcome: ActionOutcome,
    },

    /// The model side started or finished handling a request
    Busy(bool),
}

impl Notification {
    /// Step type name, for step notifications
    pub fn step_type(&self) -> Option<&str> {
        match self {
            Self::SerializableStep { step_type, .. } => Some(step_type),
            Self::ObjectStep { step, .. } => Some(step.type_name()),
            _ => None,
        }
    }

    /// Run the notification is addressed to
    pub fn run_name(&self) -> Option<&CompositeName> {
        match self {
            Self::SerializableStep { run_name, .. }
            | Self::ObjectStep { run_name, .. }
            | Self::ActionStopped { run_name, .. } => Some(run_name),
            Self::Busy(_) => None,
        }
    }
}

/// Sink for notifications destined for the display side
pub trait ResponseHandler {
    /// Emit a step that carries a byte encoding
    fn serializable_step(
        &self,
        run_name: &CompositeName,
        gui_run_name: &CompositeName,
        step_type: &str,
        blocking: bool,
        payload: Vec<u8>,
    );

    /// Emit a non-blocking step as an object reference
    fn non_blocking_step(
        &self,
        run_name: &CompositeName,
        gui_run_name: &CompositeName,
        step: Arc<dyn ActionStep>,
    );

    /// Report that a run stopped
    fn action_stopped(
        &self,
        run_name: &CompositeName,
        gui_run_name: &CompositeName,
        outcome: ActionOutcome,
    );

    /// Whether the display side shares this address space
    ///
    /// When false, a non-serializable step fails the run instead of being
    /// handed over as an object.
    fn supports_object_steps(&self) -> bool {
        true
    }
}

/// Source of asynchronous cancellation requests
pub trait CancelHandler {
    /// Check, and consume, a pending cancellation request for the run
    fn has_cancel_request(&self, run_name: &CompositeName) -> bool;
}

/// Cancel handler that never reports a request
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancel;

impl CancelHandler for NeverCancel {
    fn has_cancel_request(&self, _run_name: &CompositeName) -> bool {
        false
    }
}

/// Emit a serializable step through the handler
///
/// Encoding failures are logged; the built-in steps cannot fail to encode.
pub fn emit_step<S: SerializableStep>(
    handler: &dyn ResponseHandler,
    run_name: &CompositeName,
    gui_run_name: &CompositeName,
    step: &S,
) {
    match crate::step::encode_step(step) {
        Ok(payload) => {
            handler.serializable_step(run_name, gui_run_name, S::TYPE, step.blocking(), payload)
        }
        Err(e) => error!(step_type = S::TYPE, error = %e, "failed to encode step"),
    }
}

/// Response handler that keeps every notification in memory
///
/// Useful for a display side living in the same process, and in tests.
#[derive(Debug)]
pub struct CollectingResponseHandler {
    notifications: Mutex<Vec<Notification>>,
    object_steps: bool,
}

impl Default for CollectingResponseHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectingResponseHandler {
    pub fn new() -> Self {
        Self {
            notifications: Mutex::new(Vec::new()),
            object_steps: true,
        }
    }

    /// Collector standing in for a display side in another process
    pub fn without_object_steps() -> Self {
        Self {
            object_steps: false,
            ..Self::new()
        }
    }

    /// Snapshot of the notifications so far
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().clone()
    }

    /// Drain the notifications so far
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.notifications.lock())
    }

    pub fn len(&self) -> usize {
        self.notifications.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.lock().is_empty()
    }

    fn push(&self, notification: Notification) {
        self.notifications.lock().push(notification);
    }
}

impl ResponseHandler for CollectingResponseHandler {
    fn serializable_step(
        &self,
        run_name: &CompositeName,
        gui_run_name: &CompositeName,
        step_type: &str,
        blocking: bool,
        payload: Vec<u8>,
    ) {
        self.push(Notification::SerializableStep {
            run_name: run_name.clone(),
            gui_run_name: gui_run_name.clone(),
            step_type: step_type.to_string(),
            blocking,
            payload,
        });
    }

    fn non_blocking_step(
        &self,
        run_name: &CompositeName,
        gui_run_name: &CompositeName,
        step: Arc<dyn ActionStep>,
    ) {
        self.push(Notification::ObjectStep {
            run_name: run_name.clone(),
            gui_run_name: gui_run_name.clone(),
            step,
        });
    }

    fn action_stopped(
        &self,
        run_name: &CompositeName,
        gui_run_name: &CompositeName,
        outcome: ActionOutcome,
    ) {
        self.push(Notification::ActionStopped {
            run_name: run_name.clone(),
            gui_run_name: gui_run_name.clone(),
            outcome,
        });
    }

    fn supports_object_steps(&self) -> bool {
        self.object_steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::PopProgressLevel;

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_value(ActionOutcome::Completed(None)).unwrap();
        assert_eq!(json, serde_json::json!({"status": "completed", "value": null}));

        let json = serde_json::to_value(ActionOutcome::Cancelled).unwrap();
        assert_eq!(json, serde_json::json!({"status": "cancelled"}));

        let outcome = ActionOutcome::Failed(ActionError::new("boom"));
        let parsed: ActionOutcome =
            serde_json::from_value(serde_json::to_value(&outcome).unwrap()).unwrap();
        assert_eq!(parsed, outcome);
    }

    #[test]
    fn test_emit_step_uses_type_name() {
        let handler = CollectingResponseHandler::new();
        let run_name = CompositeName::from(["model_run", "1"]);
        let gui_run_name = CompositeName::from(["gui", "1"]);

        emit_step(&handler, &run_name, &gui_run_name, &PopProgressLevel::default());

        let notifications = handler.take();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].step_type(), Some("PopProgressLevel"));
        assert_eq!(notifications[0].run_name(), Some(&run_name));
        assert!(handler.is_empty());
    }

    #[test]
    fn test_never_cancel() {
        assert!(!NeverCancel.has_cancel_request(&CompositeName::from(["model_run", "1"])));
    }
}
