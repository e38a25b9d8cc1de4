//! Action step trait definition

use std::any::Any;
use std::fmt;

use serde::{de::DeserializeOwned, Serialize};

/// Errors from step encoding and decoding
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    /// Failed to encode a step for transport
    #[error("failed to encode step {step_type}: {source}")]
    Encode {
        step_type: String,
        #[source]
        source: serde_json::Error,
    },

    /// Failed to decode a step or a step result
    #[error("failed to decode {step_type}: {source}")]
    Decode {
        step_type: String,
        #[source]
        source: serde_json::Error,
    },

    /// No decoder registered for the step type
    #[error("unknown step type: {0}")]
    UnknownStepType(String),
}

/// A unit of work or interaction yielded by a workflow
///
/// Steps are consumed by the display side. Two properties classify them:
/// - **blocking**: the workflow stays suspended until the display side
///   answers with a response or an exception
/// - **serializable**: [`to_bytes`](ActionStep::to_bytes) returns an
///   encoding that can cross a process boundary. Steps without one can
///   only be handed over as an object to a display side in the same
///   process, and must never be blocking.
///
/// # Example
///
/// ```
/// use std::any::Any;
/// use modelrun_core::step::{encode_step, ActionStep, SerializableStep, StepError};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Serialize, Deserialize)]
/// struct Refresh;
///
/// impl SerializableStep for Refresh {
///     const TYPE: &'static str = "Refresh";
/// }
///
/// impl ActionStep for Refresh {
///     fn type_name(&self) -> &'static str {
///         Self::TYPE
///     }
///
///     fn to_bytes(&self) -> Option<Result<Vec<u8>, StepError>> {
///         Some(encode_step(self))
///     }
///
///     fn as_any(&self) -> &dyn Any {
///         self
///     }
/// }
/// ```
pub trait ActionStep: fmt::Debug + Send + Sync + 'static {
    /// Stable type name used to route the step on the receiving side
    fn type_name(&self) -> &'static str;

    /// Whether the workflow waits for the display side before resuming
    fn blocking(&self) -> bool {
        false
    }

    /// Byte encoding of the step, `None` for steps that are not serializable
    fn to_bytes(&self) -> Option<Result<Vec<u8>, StepError>> {
        None
    }

    /// Decode a display side reply into the result type this step expects
    ///
    /// The default keeps the reply as a raw [`serde_json::Value`].
    fn deserialize_result(&self, response: serde_json::Value) -> Result<StepResponse, StepError> {
        Ok(StepResponse::new(response))
    }

    /// Access to the concrete step, for display sides receiving objects
    fn as_any(&self) -> &dyn Any;
}

/// Marker for steps with a byte encoding and a registered type name
pub trait SerializableStep: ActionStep + Serialize + DeserializeOwned + Sized {
    /// Type name used in notifications and in the [`StepRegistry`](super::StepRegistry)
    const TYPE: &'static str;
}

/// Encode a serializable step as JSON bytes
pub fn encode_step<S: SerializableStep>(step: &S) -> Result<Vec<u8>, StepError> {
    serde_json::to_vec(step).map_err(|source| StepError::Encode {
        step_type: S::TYPE.to_string(),
        source,
    })
}

/// Decode a serializable step from JSON bytes
pub fn decode_step<S: SerializableStep>(bytes: &[u8]) -> Result<S, StepError> {
    serde_json::from_slice(bytes).map_err(|source| StepError::Decode {
        step_type: S::TYPE.to_string(),
        source,
    })
}

/// Decode a reply to a step of type `step_type` as `R`
pub fn decode_result<R>(step_type: &str, response: serde_json::Value) -> Result<StepResponse, StepError>
where
    R: DeserializeOwned + Send + 'static,
{
    let result: R = serde_json::from_value(response).map_err(|source| StepError::Decode {
        step_type: format!("{step_type} result"),
        source,
    })?;
    Ok(StepResponse::new(result))
}

/// A decoded reply, delivered to the workflow that yielded the step
///
/// The concrete type is chosen by the step's
/// [`deserialize_result`](ActionStep::deserialize_result), so the workflow
/// knows what to downcast to.
pub struct StepResponse(Box<dyn Any + Send>);

impl StepResponse {
    pub fn new<T: Any + Send>(value: T) -> Self {
        Self(Box::new(value))
    }

    /// Check if the response holds a `T`
    pub fn is<T: Any>(&self) -> bool {
        self.0.is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Take the response as a `T`, or get it back unchanged
    pub fn downcast<T: Any>(self) -> Result<T, Self> {
        self.0.downcast::<T>().map(|value| *value).map_err(Self)
    }
}

impl fmt::Debug for StepResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StepResponse(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_step_response_downcast() {
        let response = StepResponse::new(5_u32);
        assert!(response.is::<u32>());
        assert_eq!(response.downcast_ref::<u32>(), Some(&5));

        let response = response.downcast::<String>().unwrap_err();
        assert_eq!(response.downcast::<u32>().unwrap(), 5);
    }

    #[test]
    fn test_decode_result_typed() {
        let response = decode_result::<Vec<String>>("Select", json!(["a", "b"])).unwrap();
        assert_eq!(
            response.downcast::<Vec<String>>().unwrap(),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn test_decode_result_mismatch() {
        let error = decode_result::<bool>("Confirm", json!("not a bool")).unwrap_err();
        assert!(matches!(error, StepError::Decode { .. }));
        assert!(error.to_string().contains("Confirm result"));
    }
}
