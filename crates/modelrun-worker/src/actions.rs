//! Demo actions bound by the worker binary

use std::sync::Arc;

use modelrun_core::engine::{ModelRegistry, ProtocolError};
use modelrun_core::step::{MessageBox, MessageIcon, StandardButton, UpdateProgress};
use modelrun_core::workflow::{
    Action, ActionError, ModelContext, Resume, StepSequence, Workflow, WorkflowState,
};
use modelrun_core::CompositeName;
use serde::Deserialize;

/// Model context of the demo actions
#[derive(Debug, Clone)]
pub struct DemoModel {
    pub title: String,
}

/// Finishes immediately
#[derive(Debug)]
pub struct NoopAction;

impl Action for NoopAction {
    fn name(&self) -> &str {
        "noop"
    }

    fn model_run(
        &self,
        _model_context: ModelContext,
        _mode: Option<serde_json::Value>,
    ) -> Result<Box<dyn Workflow>, ActionError> {
        Ok(Box::new(StepSequence::empty()))
    }
}

#[derive(Debug, Deserialize)]
struct CountdownMode {
    #[serde(default = "default_count")]
    from: u64,
}

fn default_count() -> u64 {
    5
}

/// Reports progress from `mode.from` down to zero
#[derive(Debug)]
pub struct CountdownAction;

impl Action for CountdownAction {
    fn name(&self) -> &str {
        "countdown"
    }

    fn model_run(
        &self,
        _model_context: ModelContext,
        mode: Option<serde_json::Value>,
    ) -> Result<Box<dyn Workflow>, ActionError> {
        let from = match mode {
            Some(mode) => {
                serde_json::from_value::<CountdownMode>(mode)
                    .map_err(|e| ActionError::new("invalid countdown mode").with_detail(e.to_string()))?
                    .from
            }
            None => default_count(),
        };
        Ok(Box::new(Countdown { from, remaining: from }))
    }
}

#[derive(Debug)]
struct Countdown {
    from: u64,
    remaining: u64,
}

impl Workflow for Countdown {
    fn resume(&mut self, resume: Resume) -> WorkflowState {
        if let Resume::Throw(error) = resume {
            return WorkflowState::Raised(error);
        }
        if self.remaining == 0 {
            return WorkflowState::Finished(Some(serde_json::json!(self.from)));
        }

        self.remaining -= 1;
        let done = self.from - self.remaining;
        WorkflowState::step(
            UpdateProgress::new(done, self.from).with_text(format!("{} left", self.remaining)),
        )
    }
}

/// Asks a yes/no question and finishes with the answer
#[derive(Debug)]
pub struct ConfirmAction;

impl Action for ConfirmAction {
    fn name(&self) -> &str {
        "confirm"
    }

    fn model_run(
        &self,
        model_context: ModelContext,
        _mode: Option<serde_json::Value>,
    ) -> Result<Box<dyn Workflow>, ActionError> {
        let model = model_context
            .downcast_ref::<DemoModel>()
            .ok_or_else(|| ActionError::new("model context is not a demo model"))?;

        Ok(Box::new(Confirm::Ask {
            question: format!("Apply changes to {}?", model.title),
        }))
    }
}

#[derive(Debug)]
enum Confirm {
    Ask { question: String },
    Waiting,
    Done,
}

impl Workflow for Confirm {
    fn resume(&mut self, resume: Resume) -> WorkflowState {
        match (std::mem::replace(self, Self::Done), resume) {
            (_, Resume::Throw(error)) => WorkflowState::Raised(error),
            (Self::Ask { question }, _) => {
                *self = Self::Waiting;
                WorkflowState::step(
                    MessageBox::new("Confirm", question)
                        .with_icon(MessageIcon::Question)
                        .with_buttons(vec![StandardButton::Yes, StandardButton::No]),
                )
            }
            (Self::Waiting, Resume::Send(reply)) => match reply.downcast::<StandardButton>() {
                Ok(button) => WorkflowState::Finished(Some(serde_json::json!(button))),
                Err(_) => WorkflowState::Raised(ActionError::protocol_violation(
                    "confirmation reply is not a button",
                )),
            },
            (Self::Waiting, Resume::Next) | (Self::Done, _) => WorkflowState::Finished(None),
        }
    }
}

/// Registry with the demo actions and a default model context
///
/// - `actions/noop`, `actions/countdown`, `actions/confirm`
/// - `ctx/default`
pub fn demo_registry() -> Result<ModelRegistry, ProtocolError> {
    let mut registry = ModelRegistry::new();

    let actions: [(&str, Arc<dyn Action>); 3] = [
        ("noop", Arc::new(NoopAction)),
        ("countdown", Arc::new(CountdownAction)),
        ("confirm", Arc::new(ConfirmAction)),
    ];
    for (name, action) in actions {
        registry.bind_action(&CompositeName::from(["actions", name]), action)?;
    }

    registry.bind_model_context(
        &CompositeName::from(["ctx", "default"]),
        Arc::new(DemoModel {
            title: "default model".to_string(),
        }),
    )?;

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use modelrun_core::engine::{ActionOutcome, CollectingResponseHandler, NeverCancel, Notification};
    use modelrun_core::request::{InitiateAction, SendActionResponse};

    use super::*;

    fn initiate(action: &str) -> InitiateAction {
        InitiateAction::new(
            CompositeName::from(["gui", "1"]),
            CompositeName::from(["actions", action]),
            CompositeName::from(["ctx", "default"]),
        )
    }

    fn last_outcome(notifications: &[Notification]) -> ActionOutcome {
        match notifications.last() {
            Some(Notification::ActionStopped { outcome, .. }) => outcome.clone(),
            other => panic!("Expected ActionStopped, got {other:?}"),
        }
    }

    #[test]
    fn test_demo_registry_binds_everything() {
        let registry = demo_registry().unwrap();
        for name in ["noop", "countdown", "confirm"] {
            assert!(registry
                .resolve_action(&CompositeName::from(["actions", name]))
                .is_ok());
        }
        assert!(registry
            .resolve_model_context(&CompositeName::from(["ctx", "default"]))
            .is_ok());
    }

    #[test]
    fn test_countdown_reports_progress() {
        let mut registry = demo_registry().unwrap();
        let handler = CollectingResponseHandler::new();

        initiate("countdown")
            .with_mode(serde_json::json!({"from": 3}))
            .execute(&mut registry, &handler, &NeverCancel);

        let notifications = handler.take();
        let progress = notifications
            .iter()
            .filter(|n| n.step_type() == Some("UpdateProgress"))
            .count();
        assert_eq!(progress, 3);
        assert_eq!(
            last_outcome(&notifications),
            ActionOutcome::Completed(Some(serde_json::json!(3)))
        );
    }

    #[test]
    fn test_countdown_rejects_bad_mode() {
        let mut registry = demo_registry().unwrap();
        let handler = CollectingResponseHandler::new();

        initiate("countdown")
            .with_mode(serde_json::json!({"from": "ten"}))
            .execute(&mut registry, &handler, &NeverCancel);

        match last_outcome(&handler.take()) {
            ActionOutcome::Failed(e) => assert_eq!(e.message, "invalid countdown mode"),
            other => panic!("Expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn test_confirm_returns_answer() {
        let mut registry = demo_registry().unwrap();
        let handler = CollectingResponseHandler::new();

        initiate("confirm").execute(&mut registry, &handler, &NeverCancel);
        let notifications = handler.take();
        assert_eq!(notifications.last().unwrap().step_type(), Some("MessageBox"));
        let run_name = notifications.last().unwrap().run_name().unwrap().clone();

        SendActionResponse::new(run_name, serde_json::json!("no")).execute(
            &mut registry,
            &handler,
            &NeverCancel,
        );

        assert_eq!(
            last_outcome(&handler.take()),
            ActionOutcome::Completed(Some(serde_json::json!("no")))
        );
    }

    #[test]
    fn test_confirm_needs_demo_model() {
        let mut registry = demo_registry().unwrap();
        registry
            .bind_model_context(&CompositeName::from(["ctx", "other"]), Arc::new(7_u8))
            .unwrap();
        let handler = CollectingResponseHandler::new();

        let mut request = initiate("confirm");
        request.model_context = CompositeName::from(["ctx", "other"]);
        request.execute(&mut registry, &handler, &NeverCancel);

        let notifications = handler.take();
        assert_eq!(notifications[0].step_type(), Some("MessageBox"));
        assert!(matches!(last_outcome(&notifications), ActionOutcome::Failed(_)));
        assert_eq!(registry.run_count(), 0);
    }
}
