//! Action steps
//!
//! This module contains:
//! - [`ActionStep`] trait implemented by everything a workflow can yield
//! - [`StepResponse`] carrying decoded display side replies
//! - the built-in steps emitted by the protocol itself
//! - [`StepRegistry`] for decoding steps by type name

mod builtin;
mod definition;
mod registry;

pub use builtin::{
    MessageBox, MessageIcon, PopProgressLevel, PushProgressLevel, StandardButton, UpdateProgress,
};
pub use definition::{
    decode_result, decode_step, encode_step, ActionStep, SerializableStep, StepError, StepResponse,
};
pub use registry::{StepDecoder, StepRegistry};
