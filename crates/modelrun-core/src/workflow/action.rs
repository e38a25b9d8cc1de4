//! Actions: factories for workflows

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use super::{ActionError, Workflow};

/// Shared handle to the model context an action runs against
///
/// Model contexts are read-mostly; several runs may hold the same one.
pub type ModelContext = Arc<dyn Any + Send + Sync>;

/// A user-facing operation that runs as a workflow on the model side
///
/// # Example
///
/// ```
/// use modelrun_core::workflow::{Action, ActionError, ModelContext, StepSequence, Workflow};
///
/// struct Noop;
///
/// impl Action for Noop {
///     fn name(&self) -> &str {
///         "noop"
///     }
///
///     fn model_run(
///         &self,
///         _model_context: ModelContext,
///         _mode: Option<serde_json::Value>,
///     ) -> Result<Box<dyn Workflow>, ActionError> {
///         Ok(Box::new(StepSequence::empty()))
///     }
/// }
/// ```
pub trait Action: Send + Sync {
    /// Name used in logs and error messages
    fn name(&self) -> &str;

    /// Build the workflow for one run
    ///
    /// An error here means no run is created; the display side is told
    /// with a message box.
    fn model_run(
        &self,
        model_context: ModelContext,
        mode: Option<serde_json::Value>,
    ) -> Result<Box<dyn Workflow>, ActionError>;
}

/// Action backed by a closure
pub struct ActionFn<F> {
    name: String,
    factory: F,
}

impl<F> ActionFn<F>
where
    F: Fn(ModelContext, Option<serde_json::Value>) -> Result<Box<dyn Workflow>, ActionError>
        + Send
        + Sync,
{
    pub fn new(name: impl Into<String>, factory: F) -> Self {
        Self {
            name: name.into(),
            factory,
        }
    }
}

impl<F> Action for ActionFn<F>
where
    F: Fn(ModelContext, Option<serde_json::Value>) -> Result<Box<dyn Workflow>, ActionError>
        + Send
        + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn model_run(
        &self,
        model_context: ModelContext,
        mode: Option<serde_json::Value>,
    ) -> Result<Box<dyn Workflow>, ActionError> {
        (self.factory)(model_context, mode)
    }
}

impl<F> fmt::Debug for ActionFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionFn").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{Resume, StepSequence, WorkflowState};

    #[test]
    fn test_action_fn_builds_workflow() {
        let action = ActionFn::new("echo_mode", |_ctx: ModelContext, mode| {
            let result = mode.unwrap_or(serde_json::Value::Null);
            Ok(Box::new(StepSequence::empty().with_result(result)) as Box<dyn Workflow>)
        });

        let ctx: ModelContext = Arc::new(());
        let mut workflow = action
            .model_run(ctx, Some(serde_json::json!("fast")))
            .unwrap();

        assert_eq!(action.name(), "echo_mode");
        match workflow.resume(Resume::Next) {
            WorkflowState::Finished(result) => assert_eq!(result, Some(serde_json::json!("fast"))),
            other => panic!("Expected Finished, got {other:?}"),
        }
    }

    #[test]
    fn test_action_fn_construction_error() {
        let action = ActionFn::new("broken", |_ctx: ModelContext, _mode| {
            Err(ActionError::new("no rows selected"))
        });

        let result = action.model_run(Arc::new(()), None);
        assert_eq!(result.err(), Some(ActionError::new("no rows selected")));
    }
}
