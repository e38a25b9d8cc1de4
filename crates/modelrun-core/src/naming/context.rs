//! Hierarchical naming context

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use super::CompositeName;

/// Errors from naming operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NamingError {
    /// No object is bound under the name
    #[error("name not found: {0}")]
    NameNotFound(CompositeName),

    /// The name is already bound to something else
    #[error("name already bound: {0}")]
    AlreadyBound(CompositeName),

    /// The name cannot be interpreted in this context
    #[error("invalid name: {0}")]
    InvalidName(CompositeName),
}

/// A single entry of a naming context
#[derive(Debug)]
pub enum Binding<T> {
    /// Nested namespace
    Context(NamingContext<T>),

    /// Bound object
    Object(T),
}

/// Tree of names bound to objects
///
/// Every context knows its absolute name, so names returned by [`bind`] and
/// accepted by [`resolve`] are always absolute. A context only resolves names
/// that start with its own name.
///
/// An object is reachable through exactly one name: rebinding a segment to a
/// different object requires an explicit [`unbind`] first.
///
/// [`bind`]: NamingContext::bind
/// [`resolve`]: NamingContext::resolve
/// [`unbind`]: NamingContext::unbind
#[derive(Debug)]
pub struct NamingContext<T> {
    name: CompositeName,
    bindings: BTreeMap<String, Binding<T>>,
}

impl<T> Default for NamingContext<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> NamingContext<T> {
    /// Create an empty root context
    pub fn new() -> Self {
        Self::with_name(CompositeName::root())
    }

    fn with_name(name: CompositeName) -> Self {
        Self {
            name,
            bindings: BTreeMap::new(),
        }
    }

    /// Absolute name of this context
    pub fn name(&self) -> &CompositeName {
        &self.name
    }

    /// Number of direct bindings
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Remove every binding, including nested contexts
    pub fn clear(&mut self) {
        self.bindings.clear();
    }

    /// Create a nested context, or return the existing one
    pub fn bind_new_context(
        &mut self,
        segment: impl Into<String>,
    ) -> Result<&mut NamingContext<T>, NamingError> {
        let segment = segment.into();
        let name = self.child_name(&segment)?;

        let binding = self
            .bindings
            .entry(segment)
            .or_insert_with(|| Binding::Context(NamingContext::with_name(name.clone())));

        match binding {
            Binding::Context(context) => Ok(context),
            Binding::Object(_) => Err(NamingError::AlreadyBound(name)),
        }
    }

    /// Resolve a nested context by its absolute name
    pub fn resolve_context(&self, name: &CompositeName) -> Result<&NamingContext<T>, NamingError> {
        let relative = self.relative(name)?;

        let mut context = self;
        for segment in relative {
            context = match context.bindings.get(segment) {
                Some(Binding::Context(nested)) => nested,
                _ => return Err(NamingError::NameNotFound(name.clone())),
            };
        }
        Ok(context)
    }

    /// Resolve a nested context by its absolute name, mutably
    pub fn resolve_context_mut(
        &mut self,
        name: &CompositeName,
    ) -> Result<&mut NamingContext<T>, NamingError> {
        let relative = self.relative(name)?.to_vec();

        let mut context = self;
        for segment in &relative {
            context = match context.bindings.get_mut(segment) {
                Some(Binding::Context(nested)) => nested,
                _ => return Err(NamingError::NameNotFound(name.clone())),
            };
        }
        Ok(context)
    }

    /// Resolve an object by its absolute name
    ///
    /// Fails with [`NamingError::NameNotFound`] if any segment is missing or
    /// if the name addresses a context.
    pub fn resolve(&self, name: &CompositeName) -> Result<&T, NamingError> {
        let (parent, last) = self.split(name)?;
        let context = self.resolve_context(&parent)?;

        match context.bindings.get(last) {
            Some(Binding::Object(object)) => Ok(object),
            _ => Err(NamingError::NameNotFound(name.clone())),
        }
    }

    /// Check if an object is bound under the name
    pub fn contains(&self, name: &CompositeName) -> bool {
        self.resolve(name).is_ok()
    }

    /// Remove a binding, returning what was bound
    ///
    /// Unbinding a missing name fails with [`NamingError::NameNotFound`] and
    /// leaves the tree untouched.
    pub fn unbind(&mut self, name: &CompositeName) -> Result<Binding<T>, NamingError> {
        let (parent, last) = self.split(name)?;
        let last = last.to_string();
        let context = self.resolve_context_mut(&parent)?;

        context
            .bindings
            .remove(&last)
            .ok_or_else(|| NamingError::NameNotFound(name.clone()))
    }

    /// Absolute names of all objects bound in this context and below
    pub fn names(&self) -> Vec<CompositeName> {
        let mut names = Vec::new();
        for (segment, binding) in &self.bindings {
            match binding {
                Binding::Object(_) => names.push(self.name.child(segment.clone())),
                Binding::Context(nested) => names.extend(nested.names()),
            }
        }
        names
    }

    fn child_name(&self, segment: &str) -> Result<CompositeName, NamingError> {
        let name = self.name.child(segment);
        if segment.is_empty() {
            return Err(NamingError::InvalidName(name));
        }
        Ok(name)
    }

    fn relative<'a>(&self, name: &'a CompositeName) -> Result<&'a [String], NamingError> {
        if !self.name.is_prefix_of(name) {
            return Err(NamingError::InvalidName(name.clone()));
        }
        Ok(&name.segments()[self.name.len()..])
    }

    fn split<'a>(&self, name: &'a CompositeName) -> Result<(CompositeName, &'a str), NamingError> {
        if name.len() <= self.name.len() {
            return Err(NamingError::InvalidName(name.clone()));
        }
        // relative() validates the prefix
        self.relative(name)?;
        name.split_last()
            .ok_or_else(|| NamingError::InvalidName(name.clone()))
    }
}

impl<T: PartialEq> NamingContext<T> {
    /// Bind an object under `segment` in this context
    ///
    /// Returns the absolute name of the binding. Binding an equal object
    /// again is a no-op; binding a different object fails with
    /// [`NamingError::AlreadyBound`], as does binding an object already
    /// reachable under another name in this context.
    pub fn bind(
        &mut self,
        segment: impl Into<String>,
        object: T,
    ) -> Result<CompositeName, NamingError> {
        let segment = segment.into();
        let name = self.child_name(&segment)?;

        if let Some(existing) = self.name_of(&object).filter(|existing| *existing != name) {
            return Err(NamingError::AlreadyBound(existing));
        }

        match self.bindings.entry(segment) {
            Entry::Vacant(entry) => {
                entry.insert(Binding::Object(object));
                Ok(name)
            }
            Entry::Occupied(entry) => match entry.get() {
                Binding::Object(existing) if *existing == object => Ok(name),
                _ => Err(NamingError::AlreadyBound(name)),
            },
        }
    }

    /// Bind an object under an absolute name, creating intermediate contexts
    pub fn bind_path(
        &mut self,
        name: &CompositeName,
        object: T,
    ) -> Result<CompositeName, NamingError> {
        let relative = self.relative(name)?.to_vec();
        let Some((last, parents)) = relative.split_last() else {
            return Err(NamingError::InvalidName(name.clone()));
        };

        if let Some(existing) = self.name_of(&object).filter(|existing| existing != name) {
            return Err(NamingError::AlreadyBound(existing));
        }

        let mut context = self;
        for segment in parents {
            context = context.bind_new_context(segment.clone())?;
        }
        context.bind(last.clone(), object)
    }

    /// Absolute name under which an equal object is bound, if any
    pub fn name_of(&self, object: &T) -> Option<CompositeName> {
        self.bindings.iter().find_map(|(segment, binding)| match binding {
            Binding::Object(bound) if bound == object => Some(self.name.child(segment.clone())),
            Binding::Object(_) => None,
            Binding::Context(nested) => nested.name_of(object),
        })
    }
}
