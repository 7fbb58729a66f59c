//! Configuration for the rule engine.
//!
//! [`EngineConfig`] is a plain struct with public fields and sensible
//! defaults. It can be adjusted field by field, through the `with_*` methods,
//! from one of the named presets, or through the validating
//! [`EngineConfigBuilder`].
//!
//! # Examples
//!
//! ```rust
//! use modscope::config::EngineConfig;
//!
//! let config = EngineConfig::builder()
//!     .validate_scope("Game")
//!     .validate_scope("Framework")
//!     .network_namespace("Netcode")
//!     .paranoid_warnings(true)
//!     .build()?;
//! assert!(config.validates("Game"));
//! # Ok::<(), modscope::Error>(())
//! ```

use std::collections::BTreeSet;

use crate::{metadata::TypeIdentity, Result};

/// Default assembly name of the host game binary.
///
/// A placeholder for hosts shipping their API as `Game` and `Framework`
/// assemblies; hosts with other assembly names replace
/// [`EngineConfig::validate_scopes`].
pub const DEFAULT_GAME_SCOPE: &str = "Game";

/// Default assembly name of the host framework binary, see [`DEFAULT_GAME_SCOPE`].
pub const DEFAULT_FRAMEWORK_SCOPE: &str = "Framework";

/// Default namespace of the host API, shown unqualified in diagnostics.
///
/// A placeholder like [`DEFAULT_GAME_SCOPE`]; replace
/// [`EngineConfig::display_namespaces`] for other hosts.
pub const DEFAULT_HOST_NAMESPACE: &str = "Host";

/// A well-known external library used to patch host code at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchingLibrary {
    /// Scope (assembly name) of the library, e.g. `0Harmony`
    pub scope: String,
    /// Name shown in diagnostics, e.g. `Harmony`
    pub display_name: String,
}

impl PatchingLibrary {
    /// Creates a new patching library entry.
    pub fn new(scope: impl Into<String>, display_name: impl Into<String>) -> Self {
        PatchingLibrary {
            scope: scope.into(),
            display_name: display_name.into(),
        }
    }
}

/// A type which was renamed or moved between host API generations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMapping {
    /// Identity as referenced by older mods
    pub from: TypeIdentity,
    /// Identity in the current host API
    pub to: TypeIdentity,
}

impl TypeMapping {
    /// Creates a new mapping.
    #[must_use]
    pub fn new(from: TypeIdentity, to: TypeIdentity) -> Self {
        TypeMapping { from, to }
    }
}

/// Configuration for the rule engine.
///
/// Controls which scopes are validated, which optional handlers are
/// registered and how diagnostics are phrased.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Scopes (assembly names) whose references are validated against the reference set.
    ///
    /// References into any other scope are never checked. Must not be empty.
    pub validate_scopes: BTreeSet<String>,

    /// Search base types when a member is not found on its declaring type (default: true).
    pub include_base_types: bool,

    /// Patching libraries whose usage raises a detection.
    pub patching_libraries: Vec<PatchingLibrary>,

    /// Namespaces holding network synchronization types (default: `Netcode`).
    pub network_namespaces: Vec<String>,

    /// Namespaces whose types are shown by their short name in diagnostics
    /// (default: the host namespace, `Netcode`, `System` and `System.Collections.Generic`).
    pub display_namespaces: Vec<String>,

    /// Use fully-qualified technical member names in diagnostics (default: false).
    pub technical_details: bool,

    /// Register the rewriter handlers (default: true).
    ///
    /// When disabled, broken references are reported instead of repaired.
    pub rewrite_mods: bool,

    /// Register the sensitive framework API detectors (default: false).
    pub paranoid_warnings: bool,

    /// Renamed or moved types which are redirected wherever they are used.
    pub type_mappings: Vec<TypeMapping>,

    /// Types whose static methods moved to another type with unchanged signatures.
    pub method_parent_mappings: Vec<TypeMapping>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            validate_scopes: [DEFAULT_GAME_SCOPE, DEFAULT_FRAMEWORK_SCOPE]
                .into_iter()
                .map(String::from)
                .collect(),
            include_base_types: true,
            patching_libraries: vec![PatchingLibrary::new("0Harmony", "Harmony")],
            network_namespaces: vec!["Netcode".to_string()],
            display_namespaces: [
                DEFAULT_HOST_NAMESPACE,
                "Netcode",
                "System",
                "System.Collections.Generic",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            technical_details: false,
            rewrite_mods: true,
            paranoid_warnings: false,
            type_mappings: Vec::new(),
            method_parent_mappings: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Creates a new configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a "strict" configuration for auditing mods.
    ///
    /// This configuration uses:
    /// - Paranoid detectors for console, filesystem, shell, reflection and dynamic access
    /// - Fully-qualified technical names in diagnostics
    /// - No base type search, so members must exist on the referenced type
    #[must_use]
    pub fn strict() -> Self {
        Self {
            include_base_types: false,
            technical_details: true,
            paranoid_warnings: true,
            ..Self::default()
        }
    }

    /// Creates a configuration which only reports and never mutates a module.
    #[must_use]
    pub fn detect_only() -> Self {
        Self {
            rewrite_mods: false,
            ..Self::default()
        }
    }

    /// Starts a validating builder from the default configuration.
    #[must_use]
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::new()
    }

    /// Returns true if references into `scope` are validated
    #[must_use]
    pub fn validates(&self, scope: &str) -> bool {
        self.validate_scopes.contains(scope)
    }

    /// Enables or disables fully-qualified names in diagnostics.
    ///
    /// # Returns
    ///
    /// The modified configuration (builder pattern).
    #[must_use]
    pub fn with_technical_details(mut self, enable: bool) -> Self {
        self.technical_details = enable;
        self
    }

    /// Enables or disables the rewriter handlers.
    ///
    /// # Returns
    ///
    /// The modified configuration (builder pattern).
    #[must_use]
    pub fn with_rewrites(mut self, enable: bool) -> Self {
        self.rewrite_mods = enable;
        self
    }

    /// Enables or disables the sensitive API detectors.
    ///
    /// # Returns
    ///
    /// The modified configuration (builder pattern).
    #[must_use]
    pub fn with_paranoid_warnings(mut self, enable: bool) -> Self {
        self.paranoid_warnings = enable;
        self
    }

    /// Adds a renamed type.
    ///
    /// # Returns
    ///
    /// The modified configuration (builder pattern).
    #[must_use]
    pub fn with_type_mapping(mut self, from: TypeIdentity, to: TypeIdentity) -> Self {
        self.type_mappings.push(TypeMapping::new(from, to));
        self
    }

    /// Adds a type whose static methods moved.
    ///
    /// # Returns
    ///
    /// The modified configuration (builder pattern).
    #[must_use]
    pub fn with_method_parent_mapping(mut self, from: TypeIdentity, to: TypeIdentity) -> Self {
        self.method_parent_mappings.push(TypeMapping::new(from, to));
        self
    }

    /// Checks the configuration for inconsistencies.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] if the validated-scope set is empty or
    /// contains an empty name, if a patching library has no scope, or if a
    /// type mapping maps a type onto itself.
    pub fn validate(&self) -> Result<()> {
        if self.validate_scopes.is_empty() {
            return Err(config_error!("at least one scope must be validated"));
        }
        if self.validate_scopes.iter().any(String::is_empty) {
            return Err(config_error!("validated scope names must not be empty"));
        }
        if let Some(library) = self
            .patching_libraries
            .iter()
            .find(|library| library.scope.is_empty())
        {
            return Err(config_error!(
                "patching library '{}' has no scope",
                library.display_name
            ));
        }
        for mapping in self
            .type_mappings
            .iter()
            .chain(self.method_parent_mappings.iter())
        {
            if mapping.from == mapping.to {
                return Err(config_error!("type {} is mapped onto itself", mapping.from));
            }
        }
        Ok(())
    }
}

/// Validating builder for [`EngineConfig`].
#[derive(Debug, Clone, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Starts from the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a validated scope.
    #[must_use]
    pub fn validate_scope(mut self, scope: impl Into<String>) -> Self {
        self.config.validate_scopes.insert(scope.into());
        self
    }

    /// Removes all validated scopes, including the defaults.
    #[must_use]
    pub fn clear_validate_scopes(mut self) -> Self {
        self.config.validate_scopes.clear();
        self
    }

    /// Adds a patching library.
    #[must_use]
    pub fn patching_library(
        mut self,
        scope: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        self.config
            .patching_libraries
            .push(PatchingLibrary::new(scope, display_name));
        self
    }

    /// Adds a network synchronization namespace.
    #[must_use]
    pub fn network_namespace(mut self, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        if !self.config.network_namespaces.contains(&namespace) {
            self.config.network_namespaces.push(namespace);
        }
        self
    }

    /// Adds a namespace shown by short type names in diagnostics.
    #[must_use]
    pub fn display_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.display_namespaces.push(namespace.into());
        self
    }

    /// Enables or disables base type search.
    #[must_use]
    pub fn include_base_types(mut self, enable: bool) -> Self {
        self.config.include_base_types = enable;
        self
    }

    /// Enables or disables fully-qualified names in diagnostics.
    #[must_use]
    pub fn technical_details(mut self, enable: bool) -> Self {
        self.config.technical_details = enable;
        self
    }

    /// Enables or disables the rewriter handlers.
    #[must_use]
    pub fn rewrite_mods(mut self, enable: bool) -> Self {
        self.config.rewrite_mods = enable;
        self
    }

    /// Enables or disables the sensitive API detectors.
    #[must_use]
    pub fn paranoid_warnings(mut self, enable: bool) -> Self {
        self.config.paranoid_warnings = enable;
        self
    }

    /// Adds a renamed type.
    #[must_use]
    pub fn type_mapping(mut self, from: TypeIdentity, to: TypeIdentity) -> Self {
        self.config.type_mappings.push(TypeMapping::new(from, to));
        self
    }

    /// Adds a type whose static methods moved.
    #[must_use]
    pub fn method_parent_mapping(mut self, from: TypeIdentity, to: TypeIdentity) -> Self {
        self.config
            .method_parent_mappings
            .push(TypeMapping::new(from, to));
        self
    }

    /// Validates and returns the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] if [`EngineConfig::validate`] fails.
    pub fn build(self) -> Result<EngineConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
