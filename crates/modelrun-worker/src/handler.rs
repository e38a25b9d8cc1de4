//! Channel-backed handlers connecting the worker to its display side

use std::sync::Arc;

use dashmap::DashSet;
use modelrun_core::engine::{ActionOutcome, CancelHandler, Notification, ResponseHandler};
use modelrun_core::step::ActionStep;
use modelrun_core::CompositeName;
use tokio::sync::mpsc;
use tracing::warn;

/// Response handler forwarding notifications to an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelResponseHandler {
    tx: mpsc::UnboundedSender<Notification>,
    object_steps: bool,
}

impl ChannelResponseHandler {
    pub fn new(tx: mpsc::UnboundedSender<Notification>, object_steps: bool) -> Self {
        Self { tx, object_steps }
    }

    /// Send a notification that is not tied to a run
    pub fn notify(&self, notification: Notification) {
        if self.tx.send(notification).is_err() {
            warn!("display side disconnected, notification dropped");
        }
    }
}

impl ResponseHandler for ChannelResponseHandler {
    fn serializable_step(
        &self,
        run_name: &CompositeName,
        gui_run_name: &CompositeName,
        step_type: &str,
        blocking: bool,
        payload: Vec<u8>,
    ) {
        self.notify(Notification::SerializableStep {
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
        self.notify(Notification::ObjectStep {
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
        self.notify(Notification::ActionStopped {
            run_name: run_name.clone(),
            gui_run_name: gui_run_name.clone(),
            outcome,
        });
    }

    fn supports_object_steps(&self) -> bool {
        self.object_steps
    }
}

/// Cancel requests shared between the display side and the worker
///
/// The display side records a request without going through the request
/// queue; the driver consumes it at the run's next step boundary.
#[derive(Debug, Clone, Default)]
pub struct SharedCancelHandler {
    pending: Arc<DashSet<CompositeName>>,
}

impl SharedCancelHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_cancel(&self, run_name: CompositeName) {
        self.pending.insert(run_name);
    }

    /// Number of requests not yet consumed
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl CancelHandler for SharedCancelHandler {
    fn has_cancel_request(&self, run_name: &CompositeName) -> bool {
        self.pending.remove(run_name).is_some()
    }
}
