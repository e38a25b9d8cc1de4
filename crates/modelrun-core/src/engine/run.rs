//! Model side state of an ongoing action run

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use super::CancelHandler;
use crate::naming::CompositeName;
use crate::step::{ActionStep, StepResponse};
use crate::workflow::{ActionError, Resume, Workflow, WorkflowState};

/// One in-flight workflow, owned by the model side for its whole lifetime
pub struct ModelRun {
    gui_run_name: CompositeName,
    workflow: Box<dyn Workflow>,
    cancel: bool,
    last_step: Option<Arc<dyn ActionStep>>,
}

impl ModelRun {
    pub fn new(gui_run_name: CompositeName, workflow: Box<dyn Workflow>) -> Self {
        Self {
            gui_run_name,
            workflow,
            cancel: false,
            last_step: None,
        }
    }

    /// Name of the display side counterpart of this run
    pub fn gui_run_name(&self) -> &CompositeName {
        &self.gui_run_name
    }

    /// Step most recently yielded by the workflow
    pub fn last_step(&self) -> Option<&Arc<dyn ActionStep>> {
        self.last_step.as_ref()
    }

    /// Whether a cancellation was requested and not yet injected
    pub fn is_cancel_requested(&self) -> bool {
        self.cancel
    }

    /// Record a cancellation, acted upon at the next step boundary
    pub fn request_cancel(&mut self) {
        self.cancel = true;
    }

    pub(crate) fn set_last_step(&mut self, step: Arc<dyn ActionStep>) {
        self.last_step = Some(step);
    }

    /// Resume the workflow; a panic inside it raises an error instead of unwinding
    pub(crate) fn resume(&mut self, resume: Resume) -> WorkflowState {
        let workflow = &mut self.workflow;
        match panic::catch_unwind(AssertUnwindSafe(|| workflow.resume(resume))) {
            Ok(state) => state,
            Err(payload) => {
                let error = ActionError::panicked(&*payload);
                tracing::error!(
                    gui_run_name = %self.gui_run_name,
                    detail = ?error.detail,
                    "workflow panicked"
                );
                WorkflowState::Raised(error)
            }
        }
    }

    /// Move to the next step, injecting a pending cancellation instead
    ///
    /// Both the run's own flag and the handler are consumed, so a single
    /// request is injected once.
    pub(crate) fn advance(
        &mut self,
        run_name: &CompositeName,
        cancel_handler: &dyn CancelHandler,
    ) -> WorkflowState {
        let flagged = std::mem::take(&mut self.cancel);
        let requested = cancel_handler.has_cancel_request(run_name);

        if flagged || requested {
            tracing::debug!(%run_name, "asynchronous cancel, raise request");
            self.resume(Resume::Throw(ActionError::cancelled()))
        } else {
            self.resume(Resume::Next)
        }
    }

    /// Decode a reply with the result type of the last yielded step
    pub(crate) fn decode_response(
        &self,
        response: serde_json::Value,
    ) -> Result<StepResponse, ActionError> {
        let step = self.last_step.as_ref().ok_or_else(|| {
            ActionError::protocol_violation("response sent to a run without a pending step")
        })?;

        Ok(step.deserialize_result(response)?)
    }
}

impl fmt::Debug for ModelRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRun")
            .field("gui_run_name", &self.gui_run_name)
            .field("cancel", &self.cancel)
            .field("last_step", &self.last_step)
            .finish_non_exhaustive()
    }
}
