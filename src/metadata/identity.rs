//! Type identity used to match types across module boundaries.
//!
//! Two type descriptors from different modules are "the same type" when their
//! [`TypeIdentity`] matches. The identity is a plain value tuple of
//! `(scope, namespace, name)` so it can key caches without borrowing from the
//! module that produced it.

use std::fmt;

/// Scope name of the core framework library which defines `System.*` primitives.
pub const CORE_SCOPE: &str = "System.Runtime";

/// The `(scope, namespace, name)` identity of a type.
///
/// - `scope` is the name of the assembly which defines the type
/// - `namespace` may be empty for types in the global namespace
/// - `name` is the simple name; nested types use `Outer/Inner`
///
/// # Examples
///
/// ```rust
/// use modscope::metadata::TypeIdentity;
///
/// let graphics = TypeIdentity::new("Game", "Host", "Graphics");
/// assert_eq!(graphics.full_name(), "Host.Graphics");
/// assert_eq!(graphics.to_string(), "[Game]Host.Graphics");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeIdentity {
    /// Name of the assembly defining the type
    pub scope: String,
    /// Namespace of the type
    pub namespace: String,
    /// Simple name of the type
    pub name: String,
}

impl TypeIdentity {
    /// Creates a new identity.
    ///
    /// # Arguments
    ///
    /// * `scope` - Name of the assembly defining the type
    /// * `namespace` - Namespace of the type (may be empty)
    /// * `name` - Simple name of the type
    pub fn new(
        scope: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        TypeIdentity {
            scope: scope.into(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Creates the identity of a `System` type defined in the core library.
    pub fn system(name: impl Into<String>) -> Self {
        Self::new(CORE_SCOPE, "System", name)
    }

    /// Returns `Namespace.Name`, or just `Name` in the global namespace.
    #[must_use]
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// Returns true if namespace and name match, ignoring the scope.
    ///
    /// The same type may be forwarded between host assemblies across API
    /// generations, so structural comparisons of signatures use this instead
    /// of full equality.
    #[must_use]
    pub fn same_namespace_and_name(&self, other: &TypeIdentity) -> bool {
        self.namespace == other.namespace && self.name == other.name
    }

    /// Returns true if the type lives in `namespace` or one of its child namespaces.
    #[must_use]
    pub fn in_namespace(&self, namespace: &str) -> bool {
        self.namespace == namespace
            || (self.namespace.starts_with(namespace)
                && self.namespace[namespace.len()..].starts_with('.'))
    }

    /// Returns the simple name without a generic arity suffix (`List`1` -> `List`).
    #[must_use]
    pub fn short_name(&self) -> &str {
        let name = self.name.rsplit('/').next().unwrap_or(&self.name);
        match name.find('`') {
            Some(pos) => &name[..pos],
            None => name,
        }
    }
}

impl fmt::Display for TypeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]{}", self.scope, self.full_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_name_with_and_without_namespace() {
        assert_eq!(TypeIdentity::new("Game", "Host", "Game").full_name(), "Host.Game");
        assert_eq!(TypeIdentity::new("Mod", "", "<Module>").full_name(), "<Module>");
    }

    #[test]
    fn scope_is_ignored_by_structural_comparison() {
        let a = TypeIdentity::new("Game", "Host", "Vector2");
        let b = TypeIdentity::new("Framework", "Host", "Vector2");
        assert_ne!(a, b);
        assert!(a.same_namespace_and_name(&b));
    }

    #[test]
    fn namespace_prefix_requires_a_dot_boundary() {
        let net = TypeIdentity::new("Netcode", "Netcode.Fields", "NetInt");
        assert!(net.in_namespace("Netcode"));
        assert!(net.in_namespace("Netcode.Fields"));

        let other = TypeIdentity::new("Mod", "NetcodeExtras", "Helper");
        assert!(!other.in_namespace("Netcode"));
    }

    #[test]
    fn short_name_strips_arity_and_nesting() {
        let list = TypeIdentity::new(CORE_SCOPE, "System.Collections.Generic", "List`1");
        assert_eq!(list.short_name(), "List");

        let nested = TypeIdentity::new("Game", "Host", "Game/Options");
        assert_eq!(nested.short_name(), "Options");
    }
}
