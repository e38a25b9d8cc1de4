//! Step-iteration driver
//!
//! Resumes a run's workflow and ships the steps it yields until the run
//! either blocks on the display side or terminates.

use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use super::{emit_step, ActionOutcome, CancelHandler, ModelRegistry, ModelRun, ResponseHandler};
use crate::naming::CompositeName;
use crate::step::{ActionStep, MessageBox, PopProgressLevel};
use crate::workflow::{ActionError, Resume, WorkflowState};

/// How the driver resumes a suspended run
#[derive(Debug, Clone, PartialEq)]
pub enum ResumeMethod {
    /// Advance to the next step, honouring pending cancellations
    Continue,

    /// Deliver the display side reply to the last blocking step
    Send(serde_json::Value),

    /// Raise an error at the suspension point
    Throw(ActionError),
}

impl ResumeMethod {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Continue => "continue",
            Self::Send(_) => "send",
            Self::Throw(_) => "throw",
        }
    }
}

/// Drive a run until it blocks or terminates
///
/// On termination the run is unbound, any pending out-of-band cancel for it
/// is discarded, and the display side receives a progress pop followed by
/// `action_stopped`; a failed run gets an error message box first. A panic
/// inside the workflow fails the run. A run name that does not resolve is logged and
/// ignored.
#[instrument(skip_all, fields(run_name = %run_name, method = method.as_str()))]
pub fn iterate_until_blocking(
    registry: &mut ModelRegistry,
    run_name: &CompositeName,
    method: ResumeMethod,
    response_handler: &dyn ResponseHandler,
    cancel_handler: &dyn CancelHandler,
) {
    let run = match registry.resolve_run(run_name) {
        Ok(run) => run,
        Err(e) => {
            error!(error = %e, "no run bound under name");
            return;
        }
    };

    let (gui_run_name, outcome) = {
        let mut run = run.lock();
        let outcome = drive(&mut run, run_name, method, response_handler, cancel_handler);
        (run.gui_run_name().clone(), outcome)
    };

    match outcome {
        Some(outcome) => {
            // a request that raced with termination has nothing left to cancel
            cancel_handler.has_cancel_request(run_name);
            finish_run(registry, run_name, &gui_run_name, outcome, response_handler);
        }
        None => debug!("run suspended on blocking step"),
    }
}

/// Run the workflow; `None` means it is suspended on a blocking step
fn drive(
    run: &mut ModelRun,
    run_name: &CompositeName,
    method: ResumeMethod,
    response_handler: &dyn ResponseHandler,
    cancel_handler: &dyn CancelHandler,
) -> Option<ActionOutcome> {
    let mut state = match method {
        ResumeMethod::Continue => run.advance(run_name, cancel_handler),
        ResumeMethod::Send(response) => match run.decode_response(response) {
            Ok(response) => run.resume(Resume::Send(response)),
            Err(e) => {
                warn!(error = %e, "reply does not match the pending step");
                return Some(ActionOutcome::Failed(e));
            }
        },
        ResumeMethod::Throw(exception) => run.resume(Resume::Throw(exception)),
    };

    loop {
        match state {
            WorkflowState::Yielded(step) => {
                let step: Arc<dyn ActionStep> = Arc::from(step);
                run.set_last_step(step.clone());

                if let Err(e) = emit(run, run_name, &step, response_handler) {
                    return Some(ActionOutcome::Failed(e));
                }
                if step.blocking() {
                    return None;
                }
                state = run.advance(run_name, cancel_handler);
            }
            WorkflowState::Finished(result) => return Some(ActionOutcome::Completed(result)),
            WorkflowState::Raised(e) if e.is_cancellation() => return Some(ActionOutcome::Cancelled),
            WorkflowState::Raised(e) => return Some(ActionOutcome::Failed(e)),
        }
    }
}

fn emit(
    run: &ModelRun,
    run_name: &CompositeName,
    step: &Arc<dyn ActionStep>,
    response_handler: &dyn ResponseHandler,
) -> Result<(), ActionError> {
    let step_type = step.type_name();

    match step.to_bytes() {
        Some(payload) => {
            let payload = payload?;
            debug!(step_type, blocking = step.blocking(), "emitting step");
            response_handler.serializable_step(
                run_name,
                run.gui_run_name(),
                step_type,
                step.blocking(),
                payload,
            );
            Ok(())
        }
        None if step.blocking() => {
            error!(step_type, "blocking step is not serializable");
            Err(ActionError::protocol_violation(format!(
                "blocking step {step_type} is not serializable"
            )))
        }
        None if !response_handler.supports_object_steps() => {
            error!(step_type, "step is not serializable and cannot be sent as an object");
            Err(ActionError::protocol_violation(format!(
                "step {step_type} is not serializable"
            )))
        }
        None => {
            debug!(step_type, "emitting object step");
            response_handler.non_blocking_step(run_name, run.gui_run_name(), step.clone());
            Ok(())
        }
    }
}

fn finish_run(
    registry: &mut ModelRegistry,
    run_name: &CompositeName,
    gui_run_name: &CompositeName,
    outcome: ActionOutcome,
    response_handler: &dyn ResponseHandler,
) {
    if let ActionOutcome::Failed(e) = &outcome {
        error!(error = %e, code = ?e.code, "action run failed");
        emit_step(
            response_handler,
            &CompositeName::null(),
            gui_run_name,
            &MessageBox::from_error("Exception caught", e),
        );
    }

    emit_step(response_handler, run_name, gui_run_name, &PopProgressLevel::default());

    if let Err(e) = registry.unbind(run_name) {
        warn!(error = %e, "run was already unbound");
    }

    info!(status = outcome.status(), "action run stopped");
    response_handler.action_stopped(run_name, gui_run_name, outcome);
}
