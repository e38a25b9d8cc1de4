//! Workflow trait definition

use std::collections::VecDeque;
use std::fmt;

use super::ActionError;
use crate::step::{ActionStep, StepResponse};

/// How a suspended workflow is resumed
#[derive(Debug)]
pub enum Resume {
    /// Advance without input
    Next,

    /// Advance with the decoded reply to the last yielded step
    Send(StepResponse),

    /// Raise an error at the suspension point
    Throw(ActionError),
}

/// What a workflow produced when it was last resumed
#[derive(Debug)]
pub enum WorkflowState {
    /// Suspended on a step
    Yielded(Box<dyn ActionStep>),

    /// Ran to completion with an optional result
    Finished(Option<serde_json::Value>),

    /// Raised an error that it did not handle
    Raised(ActionError),
}

impl WorkflowState {
    /// Convenience for yielding a concrete step
    pub fn step(step: impl ActionStep) -> Self {
        Self::Yielded(Box::new(step))
    }
}

/// A suspendable computation driven one step at a time
///
/// Every call to [`resume`](Workflow::resume) runs the workflow until it
/// yields its next step, finishes, or raises. A workflow that is thrown an
/// error it does not handle should raise it back; that is how cancellation
/// unwinds a run.
///
/// Closures of the right shape are workflows too, which keeps small state
/// machines short:
///
/// ```
/// use modelrun_core::step::UpdateProgress;
/// use modelrun_core::workflow::{Resume, Workflow, WorkflowState};
///
/// let mut remaining = 3;
/// let mut workflow = move |resume: Resume| match resume {
///     Resume::Throw(error) => WorkflowState::Raised(error),
///     _ if remaining == 0 => WorkflowState::Finished(None),
///     _ => {
///         remaining -= 1;
///         WorkflowState::step(UpdateProgress::new(3 - remaining, 3))
///     }
/// };
///
/// assert!(matches!(workflow.resume(Resume::Next), WorkflowState::Yielded(_)));
/// ```
pub trait Workflow: Send {
    fn resume(&mut self, resume: Resume) -> WorkflowState;
}

impl<F> Workflow for F
where
    F: FnMut(Resume) -> WorkflowState + Send,
{
    fn resume(&mut self, resume: Resume) -> WorkflowState {
        self(resume)
    }
}

/// Workflow yielding a fixed list of steps, then finishing
///
/// Replies are ignored; any thrown error is raised back, so the sequence
/// can be cancelled between steps.
pub struct StepSequence {
    steps: VecDeque<Box<dyn ActionStep>>,
    result: Option<serde_json::Value>,
}

impl StepSequence {
    pub fn new(steps: Vec<Box<dyn ActionStep>>) -> Self {
        Self {
            steps: steps.into(),
            result: None,
        }
    }

    /// An empty sequence finishes on its first resumption
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Set the value the sequence finishes with
    pub fn with_result(mut self, result: serde_json::Value) -> Self {
        self.result = Some(result);
        self
    }
}

impl Workflow for StepSequence {
    fn resume(&mut self, resume: Resume) -> WorkflowState {
        if let Resume::Throw(error) = resume {
            return WorkflowState::Raised(error);
        }
        match self.steps.pop_front() {
            Some(step) => WorkflowState::Yielded(step),
            None => WorkflowState::Finished(self.result.take()),
        }
    }
}

impl fmt::Debug for StepSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepSequence")
            .field("remaining", &self.steps.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::{PopProgressLevel, UpdateProgress};

    #[test]
    fn test_step_sequence_yields_in_order() {
        let mut workflow = StepSequence::new(vec![
            Box::new(UpdateProgress::new(1, 2)),
            Box::new(PopProgressLevel::default()),
        ])
        .with_result(serde_json::json!("done"));

        match workflow.resume(Resume::Next) {
            WorkflowState::Yielded(step) => assert_eq!(step.type_name(), "UpdateProgress"),
            other => panic!("Expected Yielded, got {other:?}"),
        }
        match workflow.resume(Resume::Next) {
            WorkflowState::Yielded(step) => assert_eq!(step.type_name(), "PopProgressLevel"),
            other => panic!("Expected Yielded, got {other:?}"),
        }
        match workflow.resume(Resume::Next) {
            WorkflowState::Finished(result) => assert_eq!(result, Some(serde_json::json!("done"))),
            other => panic!("Expected Finished, got {other:?}"),
        }
    }

    #[test]
    fn test_step_sequence_raises_thrown_error() {
        let mut workflow = StepSequence::new(vec![Box::new(UpdateProgress::new(1, 2))]);

        match workflow.resume(Resume::Throw(ActionError::cancelled())) {
            WorkflowState::Raised(error) => assert!(error.is_cancellation()),
            other => panic!("Expected Raised, got {other:?}"),
        }
    }

    #[test]
    fn test_closure_workflow() {
        let mut seen = Vec::new();
        let mut workflow = move |resume: Resume| {
            seen.push(matches!(resume, Resume::Next));
            WorkflowState::Finished(Some(serde_json::json!(seen.len())))
        };

        match workflow.resume(Resume::Next) {
            WorkflowState::Finished(result) => assert_eq!(result, Some(serde_json::json!(1))),
            other => panic!("Expected Finished, got {other:?}"),
        }
    }
}
