//! # Action-Run Protocol
//!
//! Runs user actions as suspendable workflows on a model side and ships the
//! steps they yield to a display side, which may live in another process.
//!
//! ## Features
//!
//! - **Hierarchical naming**: actions, model contexts and runs are addressed by composite names
//! - **Step-at-a-time workflows**: a run advances until it blocks on the display side or ends
//! - **Continue, send and throw**: a suspended run resumes with a reply or an error
//! - **Cooperative cancellation**: cancel requests are polled between steps
//! - **Serializable requests and responses**: JSON on the wire, base64 step payloads
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Display side                              │
//! │  (posts Requests, renders steps, answers blocking steps)    │
//! └─────────────────────────────────────────────────────────────┘
//!                   │ Request              ▲ Notification
//!                   ▼                      │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    ModelRegistry                             │
//! │  (naming context: actions, model contexts, model_run/<id>)  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 iterate_until_blocking                       │
//! │  (resumes the run's workflow, emits steps, polls cancel)    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use modelrun_core::prelude::*;
//!
//! let mut registry = ModelRegistry::new();
//! registry
//!     .bind_model_context(&CompositeName::from(["ctx", "default"]), Arc::new(()))
//!     .unwrap();
//! registry
//!     .bind_action(
//!         &CompositeName::from(["actions", "noop"]),
//!         Arc::new(ActionFn::new("noop", |_ctx: ModelContext, _mode| {
//!             Ok(Box::new(StepSequence::empty()) as Box<dyn Workflow>)
//!         })),
//!     )
//!     .unwrap();
//!
//! let handler = CollectingResponseHandler::new();
//! let request = InitiateAction::new(
//!     CompositeName::from(["gui", "run", "1"]),
//!     CompositeName::from(["actions", "noop"]),
//!     CompositeName::from(["ctx", "default"]),
//! );
//! Request::from(request).execute(&mut registry, &handler, &NeverCancel);
//!
//! // push progress, pop progress, stopped
//! assert_eq!(handler.len(), 3);
//! assert_eq!(registry.run_count(), 0);
//! ```

pub mod engine;
pub mod naming;
pub mod request;
pub mod response;
pub mod step;
pub mod workflow;

/// Prelude for common imports
pub mod prelude {
    pub use crate::engine::{
        iterate_until_blocking, ActionOutcome, CancelHandler, CollectingResponseHandler,
        ModelRegistry, ModelRun, NeverCancel, Notification, ProtocolError, ResponseHandler,
        ResumeMethod,
    };
    pub use crate::naming::{CompositeName, NamingContext, NamingError};
    pub use crate::request::{
        CancelAction, InitiateAction, Request, SendActionResponse, StopProcess,
        ThrowActionException,
    };
    pub use crate::response::Response;
    pub use crate::step::{
        ActionStep, MessageBox, PopProgressLevel, PushProgressLevel, SerializableStep,
        StandardButton, StepError, StepRegistry, StepResponse, UpdateProgress,
    };
    pub use crate::workflow::{
        Action, ActionError, ActionFn, ModelContext, Resume, StepSequence, Workflow, WorkflowState,
    };
}

// Re-export commonly used types at crate root
pub use engine::{ActionOutcome, ModelRegistry, Notification, ProtocolError};
pub use naming::CompositeName;
pub use request::Request;
pub use response::Response;
pub use workflow::{Action, ActionError, Workflow};
