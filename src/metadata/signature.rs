//! Type usages and member signatures.
//!
//! [`TypeSig`] describes the shape of a single type usage (a field type, a
//! parameter, a local, the declaring type of a member reference, ...).
//! [`MemberSignature`] bundles the return/field type with the parameter list
//! of a member.
//!
//! Named types are stored by [`TypeIdentity`] value rather than by token, so a
//! signature read from a mod binary can be compared directly against a
//! signature read from a host reference module.

use std::fmt;

use crate::metadata::identity::{TypeIdentity, CORE_SCOPE};

/// The shape of a type usage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeSig {
    /// `void` (return types only)
    Void,
    /// A named class or value type
    Named(TypeIdentity),
    /// An array; rank 1 is a single-dimensional zero-based array
    Array {
        /// Element type
        element: Box<TypeSig>,
        /// Number of dimensions
        rank: u32,
    },
    /// A generic type instantiated with concrete arguments
    GenericInst {
        /// The open generic type
        base: TypeIdentity,
        /// Generic arguments, in declaration order
        args: Vec<TypeSig>,
    },
    /// A managed reference (`ref T`)
    ByRef(Box<TypeSig>),
    /// An unmanaged pointer (`T*`)
    Pointer(Box<TypeSig>),
    /// Generic parameter of the declaring type (`!n`)
    GenericParam(u16),
    /// Generic parameter of the method (`!!n`)
    MethodGenericParam(u16),
}

impl TypeSig {
    /// A named type usage. `System.Void` from the core library maps to [`TypeSig::Void`].
    pub fn named(
        scope: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        let identity = TypeIdentity::new(scope, namespace, name);
        if is_core_void(&identity) {
            return TypeSig::Void;
        }
        TypeSig::Named(identity)
    }

    /// A `System` type from the core library.
    pub fn system(name: &str) -> Self {
        TypeSig::Named(TypeIdentity::system(name))
    }

    /// `System.String`
    #[must_use]
    pub fn string() -> Self {
        Self::system("String")
    }

    /// `System.Int32`
    #[must_use]
    pub fn int32() -> Self {
        Self::system("Int32")
    }

    /// `System.Boolean`
    #[must_use]
    pub fn boolean() -> Self {
        Self::system("Boolean")
    }

    /// `System.Object`
    #[must_use]
    pub fn object() -> Self {
        Self::system("Object")
    }

    /// A single-dimensional array of `element`.
    #[must_use]
    pub fn array_of(element: TypeSig) -> Self {
        TypeSig::Array {
            element: Box::new(element),
            rank: 1,
        }
    }

    /// A generic instance of `base` with `args`.
    #[must_use]
    pub fn generic(base: TypeIdentity, args: Vec<TypeSig>) -> Self {
        TypeSig::GenericInst { base, args }
    }

    /// Returns the identity of the outermost named type, if any.
    ///
    /// Arrays, pointers and generic parameters have no identity of their own.
    #[must_use]
    pub fn identity(&self) -> Option<&TypeIdentity> {
        match self {
            TypeSig::Named(identity) => Some(identity),
            TypeSig::GenericInst { base, .. } => Some(base),
            _ => None,
        }
    }

    /// Returns the scope of the outermost named type, if any.
    #[must_use]
    pub fn scope(&self) -> Option<&str> {
        self.identity().map(|identity| identity.scope.as_str())
    }

    /// Returns true for arrays, whose members are runtime pseudo-methods.
    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self, TypeSig::Array { .. })
    }

    /// Collects every named identity used anywhere in this signature.
    ///
    /// The outer type comes first, followed by generic arguments and element
    /// types in declaration order.
    #[must_use]
    pub fn identities(&self) -> Vec<&TypeIdentity> {
        let mut found = Vec::new();
        self.collect_identities(&mut found);
        found
    }

    fn collect_identities<'a>(&'a self, found: &mut Vec<&'a TypeIdentity>) {
        match self {
            TypeSig::Named(identity) => found.push(identity),
            TypeSig::GenericInst { base, args } => {
                found.push(base);
                for arg in args {
                    arg.collect_identities(found);
                }
            }
            TypeSig::Array { element, .. } => element.collect_identities(found),
            TypeSig::ByRef(inner) | TypeSig::Pointer(inner) => inner.collect_identities(found),
            TypeSig::Void | TypeSig::GenericParam(_) | TypeSig::MethodGenericParam(_) => {}
        }
    }

    /// Replaces every occurrence of `from` (compared by full identity) with `to`.
    ///
    /// # Returns
    ///
    /// `true` if at least one identity was replaced.
    pub fn replace_identity(&mut self, from: &TypeIdentity, to: &TypeIdentity) -> bool {
        match self {
            TypeSig::Named(identity) => {
                if identity == from {
                    *identity = to.clone();
                    return true;
                }
                false
            }
            TypeSig::GenericInst { base, args } => {
                let mut replaced = false;
                if base == from {
                    *base = to.clone();
                    replaced = true;
                }
                for arg in args {
                    replaced |= arg.replace_identity(from, to);
                }
                replaced
            }
            TypeSig::Array { element, .. } => element.replace_identity(from, to),
            TypeSig::ByRef(inner) | TypeSig::Pointer(inner) => inner.replace_identity(from, to),
            TypeSig::Void | TypeSig::GenericParam(_) | TypeSig::MethodGenericParam(_) => false,
        }
    }

    /// Heuristically compares two type usages.
    ///
    /// Shapes must match exactly, named types are compared by namespace and
    /// name only (scopes may differ when a type moved between host assemblies)
    /// and generic parameters by position.
    #[must_use]
    pub fn looks_like_same_type(&self, other: &TypeSig) -> bool {
        match (self, other) {
            (TypeSig::Void, TypeSig::Void) => true,
            (TypeSig::Named(a), TypeSig::Named(b)) => a.same_namespace_and_name(b),
            (
                TypeSig::Array {
                    element: a,
                    rank: rank_a,
                },
                TypeSig::Array {
                    element: b,
                    rank: rank_b,
                },
            ) => rank_a == rank_b && a.looks_like_same_type(b),
            (
                TypeSig::GenericInst {
                    base: base_a,
                    args: args_a,
                },
                TypeSig::GenericInst {
                    base: base_b,
                    args: args_b,
                },
            ) => {
                base_a.same_namespace_and_name(base_b)
                    && args_a.len() == args_b.len()
                    && args_a
                        .iter()
                        .zip(args_b)
                        .all(|(a, b)| a.looks_like_same_type(b))
            }
            (TypeSig::ByRef(a), TypeSig::ByRef(b)) | (TypeSig::Pointer(a), TypeSig::Pointer(b)) => {
                a.looks_like_same_type(b)
            }
            (TypeSig::GenericParam(a), TypeSig::GenericParam(b))
            | (TypeSig::MethodGenericParam(a), TypeSig::MethodGenericParam(b)) => a == b,
            _ => false,
        }
    }

    /// Returns the fully-qualified technical name (`System.Collections.Generic.List`1<System.Int32>`).
    #[must_use]
    pub fn full_name(&self) -> String {
        self.render(&|identity: &TypeIdentity| identity.full_name())
    }

    /// Returns a compact name without namespaces (`List<Int32>`), used in rewrite phrases.
    #[must_use]
    pub fn short_name(&self) -> String {
        self.render(&|identity: &TypeIdentity| identity.short_name().to_string())
    }

    /// Renders the signature, formatting each named type with `name_of`.
    pub fn render(&self, name_of: &dyn Fn(&TypeIdentity) -> String) -> String {
        match self {
            TypeSig::Void => "System.Void".to_string(),
            TypeSig::Named(identity) => name_of(identity),
            TypeSig::Array { element, rank } => {
                let commas = ",".repeat(rank.saturating_sub(1) as usize);
                format!("{}[{}]", element.render(name_of), commas)
            }
            TypeSig::GenericInst { base, args } => {
                let args = args
                    .iter()
                    .map(|arg| arg.render(name_of))
                    .collect::<Vec<_>>()
                    .join(",");
                format!("{}<{}>", name_of(base), args)
            }
            TypeSig::ByRef(inner) => format!("{}&", inner.render(name_of)),
            TypeSig::Pointer(inner) => format!("{}*", inner.render(name_of)),
            TypeSig::GenericParam(index) => format!("!{index}"),
            TypeSig::MethodGenericParam(index) => format!("!!{index}"),
        }
    }
}

impl fmt::Display for TypeSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}

/// The signature of a member.
///
/// For fields and properties `return_type` is the field/property type and
/// `parameters` is empty (indexers aside). Constructors return [`TypeSig::Void`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberSignature {
    /// Return type, field type or property type
    pub return_type: TypeSig,
    /// Parameter types, excluding the implicit `this`
    pub parameters: Vec<TypeSig>,
    /// Number of method generic parameters
    pub generic_arity: u16,
}

impl MemberSignature {
    /// Creates a method signature.
    #[must_use]
    pub fn method(return_type: TypeSig, parameters: Vec<TypeSig>) -> Self {
        MemberSignature {
            return_type,
            parameters,
            generic_arity: 0,
        }
    }

    /// Creates a field or property signature.
    #[must_use]
    pub fn field(field_type: TypeSig) -> Self {
        MemberSignature {
            return_type: field_type,
            parameters: Vec::new(),
            generic_arity: 0,
        }
    }

    /// Sets the number of method generic parameters.
    #[must_use]
    pub fn with_generic_arity(mut self, arity: u16) -> Self {
        self.generic_arity = arity;
        self
    }

    /// Returns true if the parameter lists and generic arity match heuristically.
    #[must_use]
    pub fn same_parameters(&self, other: &MemberSignature) -> bool {
        self.generic_arity == other.generic_arity
            && self.parameters.len() == other.parameters.len()
            && self
                .parameters
                .iter()
                .zip(&other.parameters)
                .all(|(a, b)| a.looks_like_same_type(b))
    }

    /// Returns true if parameters and return type match heuristically.
    #[must_use]
    pub fn looks_like_same(&self, other: &MemberSignature) -> bool {
        self.same_parameters(other) && self.return_type.looks_like_same_type(&other.return_type)
    }

    /// Iterates every type usage of the signature, return type first.
    pub fn types(&self) -> impl Iterator<Item = &TypeSig> {
        std::iter::once(&self.return_type).chain(self.parameters.iter())
    }
}

fn is_core_void(identity: &TypeIdentity) -> bool {
    identity.scope == CORE_SCOPE && identity.namespace == "System" && identity.name == "Void"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector2(scope: &str) -> TypeSig {
        TypeSig::named(scope, "Host", "Vector2")
    }

    #[test]
    fn core_void_is_normalized() {
        assert_eq!(TypeSig::named(CORE_SCOPE, "System", "Void"), TypeSig::Void);
        assert_eq!(TypeSig::Void.full_name(), "System.Void");
    }

    #[test]
    fn same_type_ignores_scope() {
        assert!(vector2("Game").looks_like_same_type(&vector2("Framework")));
        assert!(!vector2("Game").looks_like_same_type(&TypeSig::int32()));
    }

    #[test]
    fn arrays_compare_rank_and_element() {
        let a = TypeSig::array_of(TypeSig::int32());
        let b = TypeSig::Array {
            element: Box::new(TypeSig::int32()),
            rank: 2,
        };
        assert!(a.looks_like_same_type(&TypeSig::array_of(TypeSig::int32())));
        assert!(!a.looks_like_same_type(&b));
        assert_eq!(b.full_name(), "System.Int32[,]");
    }

    #[test]
    fn generic_instances_compare_arguments() {
        let list = TypeIdentity::new(CORE_SCOPE, "System.Collections.Generic", "List`1");
        let ints = TypeSig::generic(list.clone(), vec![TypeSig::int32()]);
        let strings = TypeSig::generic(list, vec![TypeSig::string()]);

        assert!(!ints.looks_like_same_type(&strings));
        assert_eq!(
            ints.full_name(),
            "System.Collections.Generic.List`1<System.Int32>"
        );
        assert_eq!(ints.short_name(), "List<Int32>");
    }

    #[test]
    fn identities_are_collected_outer_first() {
        let dict = TypeIdentity::new(CORE_SCOPE, "System.Collections.Generic", "Dictionary`2");
        let sig = TypeSig::generic(
            dict.clone(),
            vec![TypeSig::string(), TypeSig::array_of(vector2("Framework"))],
        );

        let names: Vec<String> = sig.identities().iter().map(|i| i.full_name()).collect();
        assert_eq!(
            names,
            vec![
                "System.Collections.Generic.Dictionary`2",
                "System.String",
                "Host.Vector2"
            ]
        );
    }

    #[test]
    fn replace_identity_rewrites_nested_usages() {
        let old = TypeIdentity::new("Game", "Host", "OldItem");
        let new = TypeIdentity::new("Game", "Host", "Item");
        let mut sig = TypeSig::ByRef(Box::new(TypeSig::array_of(TypeSig::Named(old.clone()))));

        assert!(sig.replace_identity(&old, &new));
        assert_eq!(sig.full_name(), "Host.Item[]&");
        assert!(!sig.replace_identity(&old, &new));
    }

    #[test]
    fn signatures_compare_parameters_and_return() {
        let a = MemberSignature::method(TypeSig::Void, vec![vector2("Framework")]);
        let b = MemberSignature::method(TypeSig::boolean(), vec![vector2("Game")]);

        assert!(a.same_parameters(&b));
        assert!(!a.looks_like_same(&b));
        assert!(!a.same_parameters(&a.clone().with_generic_arity(1)));
    }
}
