//! Naming service
//!
//! This module contains the addressing primitives shared by both sides:
//! - [`CompositeName`] for hierarchical names
//! - [`NamingContext`] for binding names to objects in nested namespaces

mod context;
mod name;

pub use context::{Binding, NamingContext, NamingError};
pub use name::{CompositeName, CONSTANT, NULL};
