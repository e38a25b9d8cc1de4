//! Model registry: typed bindings over the naming context
//!
//! Actions, model contexts and runs share one naming tree. The registry is
//! owned by the model side and only mutated there; the display side refers
//! to entries by name through requests.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use super::ModelRun;
use crate::naming::{CompositeName, NamingContext, NamingError};
use crate::workflow::{Action, ModelContext};

/// Segment of the namespace holding runs
pub const MODEL_RUN: &str = "model_run";

/// Errors from registry operations
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Naming error
    #[error(transparent)]
    Naming(#[from] NamingError),

    /// The name is bound to a different kind of object
    #[error("{name} is bound to {found}, expected {expected}")]
    UnexpectedBinding {
        name: CompositeName,
        expected: &'static str,
        found: &'static str,
    },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ProtocolError {
    /// Check if this is a failed name lookup
    pub fn is_name_not_found(&self) -> bool {
        matches!(self, Self::Naming(NamingError::NameNotFound(_)))
    }
}

/// Object bound in the model registry
#[derive(Clone)]
pub enum Bound {
    Action(Arc<dyn Action>),
    ModelContext(ModelContext),
    Run(Arc<Mutex<ModelRun>>),
}

impl Bound {
    fn kind(&self) -> &'static str {
        match self {
            Self::Action(_) => "action",
            Self::ModelContext(_) => "model context",
            Self::Run(_) => "run",
        }
    }
}

/// Bindings are equal when they share the same object
impl PartialEq for Bound {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Action(a), Self::Action(b)) => Arc::ptr_eq(a, b),
            (Self::ModelContext(a), Self::ModelContext(b)) => Arc::ptr_eq(a, b),
            (Self::Run(a), Self::Run(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Action(action) => f.debug_tuple("Action").field(&action.name()).finish(),
            Self::ModelContext(_) => f.write_str("ModelContext(..)"),
            Self::Run(run) => match run.try_lock() {
                Some(run) => f.debug_tuple("Run").field(&*run).finish(),
                None => f.write_str("Run(<locked>)"),
            },
        }
    }
}

/// Root naming context of the model side
///
/// Construct once when the model side starts; [`reset`](Self::reset) tears
/// every binding down and restores the well-known namespaces.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use modelrun_core::{CompositeName, ModelRegistry};
///
/// let mut registry = ModelRegistry::new();
/// let name = CompositeName::from(["ctx", "1"]);
/// registry.bind_model_context(&name, Arc::new(42_u32)).unwrap();
///
/// let context = registry.resolve_model_context(&name).unwrap();
/// assert_eq!(context.downcast_ref::<u32>(), Some(&42));
/// ```
#[derive(Debug)]
pub struct ModelRegistry {
    root: NamingContext<Bound>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            root: NamingContext::new(),
        };
        registry.bind_well_known();
        registry
    }

    fn bind_well_known(&mut self) {
        if let Err(e) = self.root.bind_new_context(MODEL_RUN) {
            tracing::error!(error = %e, "failed to create run namespace");
        }
    }

    /// Drop every binding and recreate the well-known namespaces
    pub fn reset(&mut self) {
        self.root.clear();
        self.bind_well_known();
    }

    /// Read access to the underlying naming tree
    pub fn naming(&self) -> &NamingContext<Bound> {
        &self.root
    }

    /// Bind an action under an absolute name
    pub fn bind_action(
        &mut self,
        name: &CompositeName,
        action: Arc<dyn Action>,
    ) -> Result<CompositeName, ProtocolError> {
        Ok(self.root.bind_path(name, Bound::Action(action))?)
    }

    /// Bind a model context under an absolute name
    pub fn bind_model_context(
        &mut self,
        name: &CompositeName,
        model_context: ModelContext,
    ) -> Result<CompositeName, ProtocolError> {
        Ok(self.root.bind_path(name, Bound::ModelContext(model_context))?)
    }

    /// Bind a run under a fresh name in the run namespace
    pub fn bind_run(&mut self, run: ModelRun) -> Result<CompositeName, ProtocolError> {
        let runs = self.root.bind_new_context(MODEL_RUN)?;
        let segment = Uuid::now_v7().to_string();
        Ok(runs.bind(segment, Bound::Run(Arc::new(Mutex::new(run))))?)
    }

    pub fn resolve_action(&self, name: &CompositeName) -> Result<Arc<dyn Action>, ProtocolError> {
        match self.root.resolve(name)? {
            Bound::Action(action) => Ok(action.clone()),
            other => Err(Self::unexpected(name, "action", other)),
        }
    }

    pub fn resolve_model_context(
        &self,
        name: &CompositeName,
    ) -> Result<ModelContext, ProtocolError> {
        match self.root.resolve(name)? {
            Bound::ModelContext(model_context) => Ok(model_context.clone()),
            other => Err(Self::unexpected(name, "model context", other)),
        }
    }

    pub fn resolve_run(&self, name: &CompositeName) -> Result<Arc<Mutex<ModelRun>>, ProtocolError> {
        match self.root.resolve(name)? {
            Bound::Run(run) => Ok(run.clone()),
            other => Err(Self::unexpected(name, "run", other)),
        }
    }

    /// Remove an action, model context or run binding
    ///
    /// Names of nested contexts are not objects and fail with
    /// [`NamingError::NameNotFound`], leaving the namespace in place.
    pub fn unbind(&mut self, name: &CompositeName) -> Result<(), ProtocolError> {
        self.root.resolve(name)?;
        self.root.unbind(name)?;
        Ok(())
    }

    /// Number of runs currently bound
    pub fn run_count(&self) -> usize {
        self.root
            .resolve_context(&CompositeName::from([MODEL_RUN]))
            .map(|runs| runs.len())
            .unwrap_or(0)
    }

    fn unexpected(name: &CompositeName, expected: &'static str, found: &Bound) -> ProtocolError {
        ProtocolError::UnexpectedBinding {
            name: name.clone(),
            expected,
            found: found.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{ActionError, StepSequence, Workflow};

    struct Noop;

    impl Action for Noop {
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

    fn new_run() -> ModelRun {
        ModelRun::new(
            CompositeName::from(["gui", "1"]),
            Box::new(StepSequence::empty()),
        )
    }

    #[test]
    fn test_run_namespace_exists_at_startup() {
        let registry = ModelRegistry::new();
        assert!(registry
            .naming()
            .resolve_context(&CompositeName::from([MODEL_RUN]))
            .is_ok());
        assert_eq!(registry.run_count(), 0);
    }

    #[test]
    fn test_bind_run_names_are_unique() {
        let mut registry = ModelRegistry::new();
        let first = registry.bind_run(new_run()).unwrap();
        let second = registry.bind_run(new_run()).unwrap();

        assert_ne!(first, second);
        assert_eq!(first.segments()[0], MODEL_RUN);
        assert_eq!(registry.run_count(), 2);

        let run = registry.resolve_run(&first).unwrap();
        assert_eq!(run.lock().gui_run_name(), &CompositeName::from(["gui", "1"]));
    }

    #[test]
    fn test_resolve_same_action_twice() {
        let mut registry = ModelRegistry::new();
        let name = CompositeName::from(["actions", "noop"]);
        let action: Arc<dyn Action> = Arc::new(Noop);
        registry.bind_action(&name, action.clone()).unwrap();

        let first = registry.resolve_action(&name).unwrap();
        let second = registry.resolve_action(&name).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &action));

        // rebinding the same action is a no-op
        assert!(registry.bind_action(&name, action).is_ok());
        // a different action is refused
        assert!(registry.bind_action(&name, Arc::new(Noop)).is_err());
    }

    #[test]
    fn test_same_action_under_two_names_is_refused() {
        let mut registry = ModelRegistry::new();
        let action: Arc<dyn Action> = Arc::new(Noop);
        let first = registry
            .bind_action(&CompositeName::from(["actions", "a"]), action.clone())
            .unwrap();

        let result = registry.bind_action(&CompositeName::from(["actions", "b"]), action);
        assert!(matches!(
            result,
            Err(ProtocolError::Naming(NamingError::AlreadyBound(ref name))) if *name == first
        ));
        assert!(registry
            .resolve_action(&CompositeName::from(["actions", "b"]))
            .err()
            .unwrap()
            .is_name_not_found());
    }

    #[test]
    fn test_unbind_does_not_drop_namespaces() {
        let mut registry = ModelRegistry::new();
        let run_name = registry.bind_run(new_run()).unwrap();

        let error = registry.unbind(&CompositeName::from([MODEL_RUN])).unwrap_err();
        assert!(error.is_name_not_found());
        assert_eq!(registry.run_count(), 1);
        assert!(registry.resolve_run(&run_name).is_ok());
    }

    #[test]
    fn test_unexpected_binding() {
        let mut registry = ModelRegistry::new();
        let name = CompositeName::from(["actions", "noop"]);
        registry.bind_action(&name, Arc::new(Noop)).unwrap();

        let result = registry.resolve_model_context(&name);
        assert!(matches!(
            result,
            Err(ProtocolError::UnexpectedBinding {
                expected: "model context",
                found: "action",
                ..
            })
        ));
    }

    #[test]
    fn test_unbind_twice_is_not_fatal() {
        let mut registry = ModelRegistry::new();
        let name = registry.bind_run(new_run()).unwrap();

        registry.unbind(&name).unwrap();
        let error = registry.unbind(&name).unwrap_err();
        assert!(error.is_name_not_found());
        assert!(registry.resolve_run(&name).unwrap_err().is_name_not_found());
        assert_eq!(registry.run_count(), 0);
    }

    #[test]
    fn test_reset() {
        let mut registry = ModelRegistry::new();
        registry
            .bind_model_context(&CompositeName::from(["ctx", "1"]), Arc::new(()))
            .unwrap();
        registry.bind_run(new_run()).unwrap();

        registry.reset();

        assert_eq!(registry.naming().names(), Vec::<CompositeName>::new());
        assert!(registry
            .naming()
            .resolve_context(&CompositeName::from([MODEL_RUN]))
            .is_ok());
    }
}
