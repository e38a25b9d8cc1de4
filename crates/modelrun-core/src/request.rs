//! Requests from the display side
//!
//! Each request is a plain serializable value executed on the model side
//! against the [`ModelRegistry`]. Execution never fails: problems are logged
//! and, where a display side counterpart is waiting, reported through the
//! response handler.

use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::engine::{
    emit_step, iterate_until_blocking, ActionOutcome, CancelHandler, ModelRegistry, ModelRun,
    ProtocolError, ResponseHandler, ResumeMethod,
};
use crate::naming::CompositeName;
use crate::step::{MessageBox, PushProgressLevel};
use crate::workflow::ActionError;

/// Progress text shown while a new run starts
const START_PROGRESS_TEXT: &str = "Please wait";

/// Start a run of a bound action against a bound model context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitiateAction {
    pub gui_run_name: CompositeName,
    pub action_name: CompositeName,
    pub model_context: CompositeName,
    #[serde(default)]
    pub mode: Option<serde_json::Value>,
}

impl InitiateAction {
    pub fn new(
        gui_run_name: CompositeName,
        action_name: CompositeName,
        model_context: CompositeName,
    ) -> Self {
        Self {
            gui_run_name,
            action_name,
            model_context,
            mode: None,
        }
    }

    pub fn with_mode(mut self, mode: serde_json::Value) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn execute(
        self,
        registry: &mut ModelRegistry,
        response_handler: &dyn ResponseHandler,
        cancel_handler: &dyn CancelHandler,
    ) {
        let null = CompositeName::null();
        let gui_run_name = self.gui_run_name;

        let resolved = registry.resolve_action(&self.action_name).and_then(|action| {
            registry
                .resolve_model_context(&self.model_context)
                .map(|model_context| (action, model_context))
        });
        let (action, model_context) = match resolved {
            Ok(resolved) => resolved,
            Err(e) => {
                error!(
                    action_name = %self.action_name,
                    model_context = %self.model_context,
                    error = %e,
                    "cannot start action"
                );
                response_handler.action_stopped(
                    &null,
                    &gui_run_name,
                    ActionOutcome::Failed(lookup_error(e)),
                );
                return;
            }
        };

        let constructed =
            panic::catch_unwind(AssertUnwindSafe(|| action.model_run(model_context, self.mode)))
                .unwrap_or_else(|payload| Err(ActionError::panicked(&*payload)));
        let workflow = match constructed {
            Ok(workflow) => workflow,
            Err(e) => {
                error!(action = action.name(), error = %e, "failed to construct action run");
                emit_step(
                    response_handler,
                    &null,
                    &gui_run_name,
                    &MessageBox::from_error(format!("Exception caught in {}", action.name()), &e),
                );
                response_handler.action_stopped(&null, &gui_run_name, ActionOutcome::Failed(e));
                return;
            }
        };

        let run_name = match registry.bind_run(ModelRun::new(gui_run_name.clone(), workflow)) {
            Ok(run_name) => run_name,
            Err(e) => {
                error!(action = action.name(), error = %e, "failed to bind action run");
                response_handler.action_stopped(
                    &null,
                    &gui_run_name,
                    ActionOutcome::Failed(ActionError::new(e.to_string())),
                );
                return;
            }
        };

        info!(%run_name, %gui_run_name, action = action.name(), "action run started");
        emit_step(
            response_handler,
            &run_name,
            &gui_run_name,
            &PushProgressLevel::new(START_PROGRESS_TEXT),
        );
        iterate_until_blocking(
            registry,
            &run_name,
            ResumeMethod::Continue,
            response_handler,
            cancel_handler,
        );
    }
}

fn lookup_error(error: ProtocolError) -> ActionError {
    match error {
        ProtocolError::Naming(crate::naming::NamingError::NameNotFound(name)) => {
            ActionError::name_not_found(&name)
        }
        other => ActionError::new(other.to_string()),
    }
}

/// Reply to the blocking step a run is suspended on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendActionResponse {
    pub run_name: CompositeName,
    pub response: serde_json::Value,
}

impl SendActionResponse {
    pub fn new(run_name: CompositeName, response: serde_json::Value) -> Self {
        Self { run_name, response }
    }

    pub fn execute(
        self,
        registry: &mut ModelRegistry,
        response_handler: &dyn ResponseHandler,
        cancel_handler: &dyn CancelHandler,
    ) {
        iterate_until_blocking(
            registry,
            &self.run_name,
            ResumeMethod::Send(self.response),
            response_handler,
            cancel_handler,
        );
    }
}

/// Raise an error in a suspended run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThrowActionException {
    pub run_name: CompositeName,
    pub exception: ActionError,
}

impl ThrowActionException {
    pub fn new(run_name: CompositeName, exception: ActionError) -> Self {
        Self {
            run_name,
            exception,
        }
    }

    pub fn execute(
        self,
        registry: &mut ModelRegistry,
        response_handler: &dyn ResponseHandler,
        cancel_handler: &dyn CancelHandler,
    ) {
        iterate_until_blocking(
            registry,
            &self.run_name,
            ResumeMethod::Throw(self.exception),
            response_handler,
            cancel_handler,
        );
    }
}

/// Ask a run to cancel at its next step boundary
///
/// Cancellation is cooperative: this only records the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelAction {
    pub run_name: CompositeName,
}

impl CancelAction {
    pub fn new(run_name: CompositeName) -> Self {
        Self { run_name }
    }

    pub fn execute(
        self,
        registry: &mut ModelRegistry,
        _response_handler: &dyn ResponseHandler,
        cancel_handler: &dyn CancelHandler,
    ) {
        match registry.resolve_run(&self.run_name) {
            Ok(run) => {
                info!(run_name = %self.run_name, "cancel requested");
                run.lock().request_cancel();
            }
            Err(e) => {
                // the run is gone, so an out-of-band request for it would never be consumed
                cancel_handler.has_cancel_request(&self.run_name);
                warn!(run_name = %self.run_name, error = %e, "cancel for unknown run ignored");
            }
        }
    }
}

/// Shut the model side down after the current request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StopProcess {}

impl StopProcess {
    pub fn execute(
        self,
        _registry: &mut ModelRegistry,
        _response_handler: &dyn ResponseHandler,
        _cancel_handler: &dyn CancelHandler,
    ) {
        info!("stop requested");
    }
}

/// Any request the display side can post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    InitiateAction(InitiateAction),
    SendActionResponse(SendActionResponse),
    ThrowActionException(ThrowActionException),
    CancelAction(CancelAction),
    StopProcess(StopProcess),
}

impl Request {
    /// Wire tag of the request
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InitiateAction(_) => "initiate_action",
            Self::SendActionResponse(_) => "send_action_response",
            Self::ThrowActionException(_) => "throw_action_exception",
            Self::CancelAction(_) => "cancel_action",
            Self::StopProcess(_) => "stop_process",
        }
    }

    /// Whether the model side should stop after this request
    pub fn is_stop(&self) -> bool {
        matches!(self, Self::StopProcess(_))
    }

    pub fn execute(
        self,
        registry: &mut ModelRegistry,
        response_handler: &dyn ResponseHandler,
        cancel_handler: &dyn CancelHandler,
    ) {
        match self {
            Self::InitiateAction(r) => r.execute(registry, response_handler, cancel_handler),
            Self::SendActionResponse(r) => r.execute(registry, response_handler, cancel_handler),
            Self::ThrowActionException(r) => r.execute(registry, response_handler, cancel_handler),
            Self::CancelAction(r) => r.execute(registry, response_handler, cancel_handler),
            Self::StopProcess(r) => r.execute(registry, response_handler, cancel_handler),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ProtocolError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl From<InitiateAction> for Request {
    fn from(request: InitiateAction) -> Self {
        Self::InitiateAction(request)
    }
}

impl From<SendActionResponse> for Request {
    fn from(request: SendActionResponse) -> Self {
        Self::SendActionResponse(request)
    }
}

impl From<ThrowActionException> for Request {
    fn from(request: ThrowActionException) -> Self {
        Self::ThrowActionException(request)
    }
}

impl From<CancelAction> for Request {
    fn from(request: CancelAction) -> Self {
        Self::CancelAction(request)
    }
}

impl From<StopProcess> for Request {
    fn from(request: StopProcess) -> Self {
        Self::StopProcess(request)
    }
}
