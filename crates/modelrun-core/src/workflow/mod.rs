//! Workflow abstractions and types
//!
//! This module contains the suspendable computation primitives:
//! - [`Workflow`] trait for step-at-a-time state machines
//! - [`Resume`] and [`WorkflowState`] for driving them
//! - [`ActionError`] for errors thrown into and raised by workflows
//! - [`Action`] trait for building a workflow per run

mod action;
mod definition;
mod error;

pub use action::{Action, ActionFn, ModelContext};
pub use definition::{Resume, StepSequence, Workflow, WorkflowState};
pub use error::{error_codes, ActionError};
