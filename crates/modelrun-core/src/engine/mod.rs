//! Model side engine
//!
//! This module contains the runtime that owns and drives action runs:
//! - [`ModelRegistry`] binding actions, model contexts and runs by name
//! - [`ModelRun`] holding a suspended workflow
//! - [`iterate_until_blocking`] advancing a run step by step
//! - [`ResponseHandler`] and [`CancelHandler`] connecting to the display side

mod driver;
mod handler;
mod registry;
mod run;

pub use driver::{iterate_until_blocking, ResumeMethod};
pub use handler::{
    emit_step, ActionOutcome, CancelHandler, CollectingResponseHandler, NeverCancel, Notification,
    ResponseHandler,
};
pub use registry::{Bound, ModelRegistry, ProtocolError, MODEL_RUN};
pub use run::ModelRun;
