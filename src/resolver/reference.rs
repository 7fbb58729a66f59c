//! The set of host reference modules references are resolved against.

use std::{collections::BTreeMap, sync::Arc};

use crate::metadata::{Module, TypeDescriptor, TypeIdentity};

/// Read-only collection of host reference modules, keyed by scope.
///
/// Built once at startup and shared between concurrent passes through `Arc`.
/// The facade module is inserted by [`crate::engine::RuleEngine::new`] so that
/// facade members resolve like any other host member.
#[derive(Debug, Clone, Default)]
pub struct ReferenceSet {
    modules: BTreeMap<String, Arc<Module>>,
}

impl ReferenceSet {
    /// Creates an empty reference set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a reference set from the given modules.
    pub fn from_modules(modules: impl IntoIterator<Item = Module>) -> Self {
        let mut set = Self::new();
        for module in modules {
            set.insert(module);
        }
        set
    }

    /// Adds a module, replacing and returning any module with the same scope.
    pub fn insert(&mut self, module: Module) -> Option<Arc<Module>> {
        self.insert_shared(Arc::new(module))
    }

    /// Adds a shared module, replacing and returning any module with the same scope.
    pub fn insert_shared(&mut self, module: Arc<Module>) -> Option<Arc<Module>> {
        self.modules.insert(module.name().to_string(), module)
    }

    /// Returns the module defining `scope`.
    #[must_use]
    pub fn module(&self, scope: &str) -> Option<&Module> {
        self.modules.get(scope).map(Arc::as_ref)
    }

    /// Returns true if reference data for `scope` is loaded
    #[must_use]
    pub fn contains_scope(&self, scope: &str) -> bool {
        self.modules.contains_key(scope)
    }

    /// Iterates the loaded scopes in sorted order.
    pub fn scopes(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// Returns the number of loaded modules
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns true if no module is loaded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Looks up a type definition by its full identity.
    #[must_use]
    pub fn find_type(&self, identity: &TypeIdentity) -> Option<(&Module, &TypeDescriptor)> {
        let module = self.module(&identity.scope)?;
        module
            .find_type(&identity.namespace, &identity.name)
            .map(|ty| (module, ty))
    }
}
