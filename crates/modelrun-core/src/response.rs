//! Wire form of notifications
//!
//! A display side in another process receives [`Response`] values, one per
//! [`Notification`]. Step payloads travel base64-encoded so a response stays
//! a single JSON document.

use serde::{Deserialize, Serialize};

use crate::engine::{ActionOutcome, Notification, ProtocolError};
use crate::naming::CompositeName;

/// Notification as sent across a process boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    ActionStepped {
        run_name: CompositeName,
        gui_run_name: CompositeName,
        step_type: String,
        blocking: bool,
        #[serde(with = "payload")]
        payload: Vec<u8>,
    },
    ActionStopped {
        run_name: CompositeName,
        gui_run_name: CompositeName,
        outcome: ActionOutcome,
    },
    Busy {
        busy: bool,
    },
}

impl Response {
    /// Convert a notification, `None` for object steps which have no wire form
    pub fn from_notification(notification: Notification) -> Option<Self> {
        match notification {
            Notification::SerializableStep {
                run_name,
                gui_run_name,
                step_type,
                blocking,
                payload,
            } => Some(Self::ActionStepped {
                run_name,
                gui_run_name,
                step_type,
                blocking,
                payload,
            }),
            Notification::ObjectStep { .. } => None,
            Notification::ActionStopped {
                run_name,
                gui_run_name,
                outcome,
            } => Some(Self::ActionStopped {
                run_name,
                gui_run_name,
                outcome,
            }),
            Notification::Busy(busy) => Some(Self::Busy { busy }),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ProtocolError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

mod payload {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64.decode(encoded).map_err(serde::de::Error::custom)
    }
}
