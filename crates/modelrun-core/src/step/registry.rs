//! Step registry for decoding steps by type name
//!
//! The display side receives a type name and an encoded payload. The registry
//! maps type names to decoders so the step can be rebuilt without knowing its
//! concrete type up front.

use std::collections::HashMap;
use std::fmt;

use super::{decode_step, ActionStep, MessageBox, PopProgressLevel, PushProgressLevel};
use super::{SerializableStep, StepError, UpdateProgress};

/// Decoder function type for rebuilding steps from bytes
pub type StepDecoder =
    Box<dyn Fn(&[u8]) -> Result<Box<dyn ActionStep>, StepError> + Send + Sync>;

/// Registry of step decoders
pub struct StepRegistry {
    decoders: HashMap<String, StepDecoder>,
}

impl Default for StepRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StepRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// Create a registry with the steps the protocol itself emits
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register::<PushProgressLevel>();
        registry.register::<PopProgressLevel>();
        registry.register::<UpdateProgress>();
        registry.register::<MessageBox>();
        registry
    }

    /// Register a step type
    ///
    /// # Example
    ///
    /// ```
    /// use modelrun_core::step::{StepRegistry, UpdateProgress};
    ///
    /// let mut registry = StepRegistry::new();
    /// registry.register::<UpdateProgress>();
    /// assert!(registry.contains("UpdateProgress"));
    /// ```
    pub fn register<S: SerializableStep>(&mut self) {
        let decoder: StepDecoder = Box::new(|bytes: &[u8]| {
            let step: S = decode_step(bytes)?;
            Ok(Box::new(step) as Box<dyn ActionStep>)
        });

        self.decoders.insert(S::TYPE.to_string(), decoder);
    }

    /// Check if a step type is registered
    pub fn contains(&self, step_type: &str) -> bool {
        self.decoders.contains_key(step_type)
    }

    /// Rebuild a step from its type name and encoded payload
    pub fn decode(&self, step_type: &str, bytes: &[u8]) -> Result<Box<dyn ActionStep>, StepError> {
        let decoder = self
            .decoders
            .get(step_type)
            .ok_or_else(|| StepError::UnknownStepType(step_type.to_string()))?;

        decoder(bytes)
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }

    /// Get all registered step type names
    pub fn step_types(&self) -> impl Iterator<Item = &str> {
        self.decoders.keys().map(|s| s.as_str())
    }
}

impl fmt::Debug for StepRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepRegistry")
            .field("step_types", &self.decoders.keys().collect::<Vec<_>>())
            .finish()
    }
}
