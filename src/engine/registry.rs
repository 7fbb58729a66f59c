//! Explicit, ordered registration of handlers.

use std::{collections::HashSet, sync::Arc};

use crate::{
    config::EngineConfig,
    engine::handler::{HandlerKind, InstructionHandler},
    facades::FacadeRegistry,
    handlers::{
        finders::{
            NetworkCodeFinder, PatchingLibraryFinder, ReferenceToInvalidMemberFinder,
            ReferenceToMissingTypeFinder, TypeFinder, UnverifiableBodyFinder,
        },
        rewriters::{
            HeuristicFieldRewriter, MethodParentRewriter, ReplaceReferencesRewriter,
            TypeReferenceRewriter,
        },
    },
};

/// An ordered list of handlers.
///
/// Order matters: the engine offers every usage and instruction to the
/// handlers in registration order, and a rewriter registered before a finder
/// repairs a reference before the finder inspects it.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: Vec<Arc<dyn InstructionHandler>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a builder.
    #[must_use]
    pub fn builder() -> HandlerRegistryBuilder {
        HandlerRegistryBuilder::new()
    }

    /// Builds the standard handler set for a configuration.
    ///
    /// Rewriters come first (only with `rewrite_mods`), followed by the
    /// finders and, with `paranoid_warnings`, the sensitive API detectors.
    #[must_use]
    pub fn standard(config: &EngineConfig, facades: &FacadeRegistry) -> Self {
        let mut builder = Self::builder();

        if config.rewrite_mods {
            builder = builder.with(ReplaceReferencesRewriter::new(facades));
            if !config.type_mappings.is_empty() {
                builder = builder.with(TypeReferenceRewriter::new(config.type_mappings.clone()));
            }
            if !config.method_parent_mappings.is_empty() {
                builder = builder.with(MethodParentRewriter::new(
                    config.method_parent_mappings.clone(),
                ));
            }
            builder = builder.with(HeuristicFieldRewriter::new());
        }

        builder = builder
            .with(PatchingLibraryFinder::new(config.patching_libraries.clone()))
            .with(UnverifiableBodyFinder::new())
            .with(ReferenceToMissingTypeFinder::new())
            .with(ReferenceToInvalidMemberFinder::new())
            .with(NetworkCodeFinder::new(config.network_namespaces.clone()));

        if config.paranoid_warnings {
            builder = builder
                .with(TypeFinder::console())
                .with(TypeFinder::filesystem())
                .with(TypeFinder::shell())
                .with(TypeFinder::reflection())
                .with(TypeFinder::dynamic());
        }

        builder.build()
    }

    /// Iterates the handlers in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn InstructionHandler>> {
        self.handlers.iter()
    }

    /// Returns the handler names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|handler| handler.name()).collect()
    }

    /// Returns true if any registered handler mutates modules
    #[must_use]
    pub fn has_rewriters(&self) -> bool {
        self.handlers
            .iter()
            .any(|handler| handler.kind() == HandlerKind::Rewriter)
    }

    /// Returns the number of handlers
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if no handler is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Builder for [`HandlerRegistry`].
///
/// Handlers are kept in insertion order; a handler whose name is already
/// registered is skipped.
#[derive(Default)]
pub struct HandlerRegistryBuilder {
    handlers: Vec<Arc<dyn InstructionHandler>>,
    names: HashSet<&'static str>,
}

impl HandlerRegistryBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler.
    #[must_use]
    pub fn with(self, handler: impl InstructionHandler + 'static) -> Self {
        self.with_shared(Arc::new(handler))
    }

    /// Appends a shared handler.
    #[must_use]
    pub fn with_shared(mut self, handler: Arc<dyn InstructionHandler>) -> Self {
        if self.names.insert(handler.name()) {
            self.handlers.push(handler);
        } else {
            log::warn!("handler '{}' registered twice, keeping the first", handler.name());
        }
        self
    }

    /// Finishes the registry.
    #[must_use]
    pub fn build(self) -> HandlerRegistry {
        HandlerRegistry {
            handlers: self.handlers,
        }
    }
}
