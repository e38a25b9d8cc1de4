//! Steps emitted by the protocol itself

use std::any::Any;

use serde::{Deserialize, Serialize};

use super::{decode_result, encode_step, ActionStep, SerializableStep, StepError, StepResponse};
use crate::workflow::ActionError;

/// Open a new level on the display side's progress indicator stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushProgressLevel {
    pub text: String,
}

impl PushProgressLevel {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl SerializableStep for PushProgressLevel {
    const TYPE: &'static str = "PushProgressLevel";
}

impl ActionStep for PushProgressLevel {
    fn type_name(&self) -> &'static str {
        Self::TYPE
    }

    fn to_bytes(&self) -> Option<Result<Vec<u8>, StepError>> {
        Some(encode_step(self))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Close the topmost level of the progress indicator stack
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopProgressLevel {}

impl SerializableStep for PopProgressLevel {
    const TYPE: &'static str = "PopProgressLevel";
}

impl ActionStep for PopProgressLevel {
    fn type_name(&self) -> &'static str {
        Self::TYPE
    }

    fn to_bytes(&self) -> Option<Result<Vec<u8>, StepError>> {
        Some(encode_step(self))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Report progress of the current run
///
/// Non-blocking. Workflows yield these between units of work, which is also
/// where pending cancellations are picked up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateProgress {
    pub value: Option<u64>,
    pub maximum: Option<u64>,
    pub text: Option<String>,
    pub detail: Option<String>,
}

impl UpdateProgress {
    pub fn new(value: u64, maximum: u64) -> Self {
        Self {
            value: Some(value),
            maximum: Some(maximum),
            ..Default::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl SerializableStep for UpdateProgress {
    const TYPE: &'static str = "UpdateProgress";
}

impl ActionStep for UpdateProgress {
    fn type_name(&self) -> &'static str {
        Self::TYPE
    }

    fn to_bytes(&self) -> Option<Result<Vec<u8>, StepError>> {
        Some(encode_step(self))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Icon shown next to a message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageIcon {
    #[default]
    Information,
    Question,
    Warning,
    Critical,
}

/// Buttons the user can answer a message with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StandardButton {
    Ok,
    Cancel,
    Yes,
    No,
}

/// Show a message to the user
///
/// When blocking, the workflow is resumed with the [`StandardButton`] the
/// user pressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBox {
    pub title: String,
    pub text: String,
    pub detail: Option<String>,
    pub icon: MessageIcon,
    pub buttons: Vec<StandardButton>,
    pub blocking: bool,
}

impl MessageBox {
    /// Create a blocking message with an Ok button
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            detail: None,
            icon: MessageIcon::default(),
            buttons: vec![StandardButton::Ok],
            blocking: true,
        }
    }

    /// Create the non-blocking message shown when a run fails
    pub fn from_error(title: impl Into<String>, error: &ActionError) -> Self {
        Self {
            title: title.into(),
            text: error.message.clone(),
            detail: error.detail.clone(),
            icon: MessageIcon::Critical,
            buttons: vec![StandardButton::Ok],
            blocking: false,
        }
    }

    pub fn with_icon(mut self, icon: MessageIcon) -> Self {
        self.icon = icon;
        self
    }

    pub fn with_buttons(mut self, buttons: Vec<StandardButton>) -> Self {
        self.buttons = buttons;
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl SerializableStep for MessageBox {
    const TYPE: &'static str = "MessageBox";
}

impl ActionStep for MessageBox {
    fn type_name(&self) -> &'static str {
        Self::TYPE
    }

    fn blocking(&self) -> bool {
        self.blocking
    }

    fn to_bytes(&self) -> Option<Result<Vec<u8>, StepError>> {
        Some(encode_step(self))
    }

    fn deserialize_result(&self, response: serde_json::Value) -> Result<StepResponse, StepError> {
        decode_result::<StandardButton>(Self::TYPE, response)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::decode_step;
    use serde_json::json;

    #[test]
    fn test_progress_steps_are_non_blocking() {
        assert!(!PushProgressLevel::new("Please wait").blocking());
        assert!(!PopProgressLevel::default().blocking());
        assert!(!UpdateProgress::new(1, 10).blocking());
    }

    #[test]
    fn test_message_box_round_trip() {
        let step = MessageBox::new("Delete", "Delete 3 rows?")
            .with_icon(MessageIcon::Question)
            .with_buttons(vec![StandardButton::Yes, StandardButton::No]);

        let bytes = step.to_bytes().unwrap().unwrap();
        let decoded: MessageBox = decode_step(&bytes).unwrap();

        assert_eq!(decoded, step);
        assert!(decoded.blocking());
    }

    #[test]
    fn test_message_box_result_type() {
        let step = MessageBox::new("Delete", "Delete 3 rows?");

        let response = step.deserialize_result(json!("yes")).unwrap();
        assert_eq!(response.downcast::<StandardButton>().unwrap(), StandardButton::Yes);

        assert!(step.deserialize_result(json!(42)).is_err());
    }

    #[test]
    fn test_message_box_from_error() {
        let error = ActionError::new("disk full").with_detail("while writing report.pdf");
        let step = MessageBox::from_error("Exception caught", &error);

        assert_eq!(step.text, "disk full");
        assert_eq!(step.detail.as_deref(), Some("while writing report.pdf"));
        assert_eq!(step.icon, MessageIcon::Critical);
        assert!(!step.blocking());
    }

    #[test]
    fn test_update_progress_encoding() {
        let step = UpdateProgress::new(3, 10).with_text("Importing");
        let bytes = step.to_bytes().unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(value["value"], json!(3));
        assert_eq!(value["maximum"], json!(10));
        assert_eq!(value["text"], json!("Importing"));
    }
}
