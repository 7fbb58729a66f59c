//! Resolution of mod references against the host reference set.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::{
    config::EngineConfig,
    metadata::{
        MemberDescriptor, MemberKind, Module, TypeDescriptor, TypeIdentity, TypeSig,
        CONSTRUCTOR_NAME,
    },
    resolver::reference::ReferenceSet,
};

/// Maximum depth of a base type chain before resolution gives up.
const MAX_HIERARCHY_DEPTH: usize = 64;

/// Why a reference did not resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnresolvedReason {
    /// The declaring type does not exist in its scope
    MissingType,
    /// No member with a matching name and signature exists
    MissingMember,
    /// The field exists, but is a compile-time constant baked into callers
    ConstantField,
    /// No reference data is loaded for the declaring scope
    ScopeNotLoaded,
}

/// Outcome of resolving a member reference.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<'a> {
    /// The reference resolves to the given member definition
    Matched(&'a MemberDescriptor),
    /// A member with the same name exists, but its type differs.
    ///
    /// For methods this is either an overload with the same parameters, or
    /// the first same-named overload when none of them returns the expected type.
    Mismatched {
        /// Type of the existing member
        actual: TypeSig,
        /// Type the reference expects
        expected: TypeSig,
    },
    /// Nothing matches
    Unresolved(UnresolvedReason),
}

impl Resolution<'_> {
    /// Returns true for [`Resolution::Matched`]
    #[must_use]
    pub fn is_matched(&self) -> bool {
        matches!(self, Resolution::Matched(_))
    }
}

type ResolvedType<'a> = (&'a Module, &'a TypeDescriptor);

/// Resolves type and member references of one pass.
///
/// The resolver owns a cache of type lookups keyed by [`TypeIdentity`]. It
/// lives exactly as long as one pass over one module, so concurrent passes
/// never share mutable state.
pub struct Resolver<'a> {
    references: &'a ReferenceSet,
    validate_scopes: &'a BTreeSet<String>,
    include_base_types: bool,
    cache: HashMap<TypeIdentity, Option<ResolvedType<'a>>>,
}

impl<'a> Resolver<'a> {
    /// Creates a resolver over `references` using the scope allow-list of `config`.
    #[must_use]
    pub fn new(references: &'a ReferenceSet, config: &'a EngineConfig) -> Self {
        Resolver {
            references,
            validate_scopes: &config.validate_scopes,
            include_base_types: config.include_base_types,
            cache: HashMap::new(),
        }
    }

    /// Returns the reference set this resolver reads from
    #[must_use]
    pub fn references(&self) -> &'a ReferenceSet {
        self.references
    }

    /// Returns true if references through `sig` must be validated.
    ///
    /// Only named types in an allow-listed scope are validated. Arrays and
    /// generic parameters never are, which also skips array pseudo-methods.
    #[must_use]
    pub fn should_validate(&self, sig: &TypeSig) -> bool {
        if sig.is_array() {
            return false;
        }
        sig.scope()
            .is_some_and(|scope| self.validate_scopes.contains(scope))
    }

    /// Returns true if `identity` is the identity of a validated scope's type.
    #[must_use]
    pub fn validates_identity(&self, identity: &TypeIdentity) -> bool {
        self.validate_scopes.contains(&identity.scope)
    }

    /// Resolves a type definition, caching the outcome.
    pub fn resolve_type(&mut self, identity: &TypeIdentity) -> Option<ResolvedType<'a>> {
        if let Some(cached) = self.cache.get(identity) {
            return *cached;
        }
        let references = self.references;
        let resolved = references.find_type(identity);
        self.cache.insert(identity.clone(), resolved);
        resolved
    }

    /// Returns the number of cached type lookups
    #[must_use]
    pub fn cached_types(&self) -> usize {
        self.cache.len()
    }

    /// Resolves a member reference.
    ///
    /// - Fields must exist on the declaring type itself and must not be constants.
    /// - Methods match on name, parameters, generic arity, static-ness and return
    ///   type; with `include_base_types` the base type chain is searched too.
    ///   Same-named overloads of which none returns the referenced type make
    ///   the reference a mismatch rather than a missing member.
    ///   Constructors are only searched on the declaring type.
    /// - Properties resolve through their `get_` accessor.
    pub fn resolve_member(&mut self, reference: &MemberDescriptor) -> Resolution<'a> {
        let Some(identity) = reference.declaring_type.identity() else {
            return Resolution::Unresolved(UnresolvedReason::MissingType);
        };
        if !self.references.contains_scope(&identity.scope) {
            return Resolution::Unresolved(UnresolvedReason::ScopeNotLoaded);
        }
        let Some(declaring) = self.resolve_type(identity) else {
            return Resolution::Unresolved(UnresolvedReason::MissingType);
        };

        match reference.kind {
            MemberKind::Field => Self::resolve_field(declaring, reference),
            MemberKind::Property => self.resolve_property(declaring, reference),
            MemberKind::Method | MemberKind::Constructor => {
                self.resolve_method(declaring, reference)
            }
        }
    }

    /// Finds a property definition by name on a type or its base types.
    pub fn find_property(
        &mut self,
        identity: &TypeIdentity,
        name: &str,
    ) -> Option<&'a MemberDescriptor> {
        let declaring = self.resolve_type(identity)?;
        self.hierarchy(declaring)
            .into_iter()
            .flat_map(|(module, ty)| module.members_of(ty))
            .map(|(_, member)| member)
            .find(|member| member.kind == MemberKind::Property && member.name == name)
    }

    /// Finds a method definition by name on a type or its base types.
    pub fn find_method(
        &mut self,
        identity: &TypeIdentity,
        name: &str,
    ) -> Option<&'a MemberDescriptor> {
        let declaring = self.resolve_type(identity)?;
        self.hierarchy(declaring)
            .into_iter()
            .flat_map(|(module, ty)| module.members_of(ty))
            .map(|(_, member)| member)
            .find(|member| member.is_callable() && member.name == name)
    }

    fn resolve_field(
        (module, ty): ResolvedType<'a>,
        reference: &MemberDescriptor,
    ) -> Resolution<'a> {
        let Some(field) = module
            .members_of(ty)
            .map(|(_, member)| member)
            .find(|member| member.kind == MemberKind::Field && member.name == reference.name)
        else {
            return Resolution::Unresolved(UnresolvedReason::MissingMember);
        };

        if field.is_literal() {
            return Resolution::Unresolved(UnresolvedReason::ConstantField);
        }
        if field.is_static() != reference.is_static() {
            return Resolution::Unresolved(UnresolvedReason::MissingMember);
        }
        let actual = &field.signature.return_type;
        let expected = &reference.signature.return_type;
        if !actual.looks_like_same_type(expected) {
            return Resolution::Mismatched {
                actual: actual.clone(),
                expected: expected.clone(),
            };
        }
        Resolution::Matched(field)
    }

    fn resolve_property(
        &mut self,
        declaring: ResolvedType<'a>,
        reference: &MemberDescriptor,
    ) -> Resolution<'a> {
        let getter = format!("get_{}", reference.name);
        let Some(accessor) = self
            .hierarchy(declaring)
            .into_iter()
            .flat_map(|(module, ty)| module.members_of(ty))
            .map(|(_, member)| member)
            .find(|member| {
                member.kind == MemberKind::Method
                    && member.name == getter
                    && member.signature.parameters.is_empty()
            })
        else {
            return Resolution::Unresolved(UnresolvedReason::MissingMember);
        };

        let actual = &accessor.signature.return_type;
        let expected = &reference.signature.return_type;
        if !actual.looks_like_same_type(expected) {
            return Resolution::Mismatched {
                actual: actual.clone(),
                expected: expected.clone(),
            };
        }
        Resolution::Matched(accessor)
    }

    fn resolve_method(
        &mut self,
        declaring: ResolvedType<'a>,
        reference: &MemberDescriptor,
    ) -> Resolution<'a> {
        let types = if reference.name == CONSTRUCTOR_NAME || !self.include_base_types {
            vec![declaring]
        } else {
            self.hierarchy(declaring)
        };

        let expected = &reference.signature.return_type;
        let mut same_parameters = None;
        let mut same_name = None;
        let mut any_returns_expected = false;
        for (module, ty) in types {
            for (_, candidate) in module.members_of(ty) {
                if !candidate.is_callable()
                    || candidate.name != reference.name
                    || candidate.is_static() != reference.is_static()
                {
                    continue;
                }
                let returns_expected = candidate
                    .signature
                    .return_type
                    .looks_like_same_type(expected);
                if candidate.signature.same_parameters(&reference.signature) {
                    if returns_expected {
                        return Resolution::Matched(candidate);
                    }
                    same_parameters.get_or_insert(candidate);
                }
                any_returns_expected |= returns_expected;
                same_name.get_or_insert(candidate);
            }
        }

        // An overload with the same parameters wins, otherwise a mismatch is
        // only reported if no same-named overload returns the expected type.
        let mismatched = same_parameters.or(same_name.filter(|_| !any_returns_expected));
        match mismatched {
            Some(candidate) => Resolution::Mismatched {
                actual: candidate.signature.return_type.clone(),
                expected: expected.clone(),
            },
            None => Resolution::Unresolved(UnresolvedReason::MissingMember),
        }
    }

    /// Returns `start` followed by its resolvable base types.
    fn hierarchy(&mut self, start: ResolvedType<'a>) -> Vec<ResolvedType<'a>> {
        let mut chain = vec![start];
        if !self.include_base_types {
            return chain;
        }

        let mut seen = HashSet::new();
        seen.insert(start.1.identity.clone());
        let mut current = start;
        while chain.len() < MAX_HIERARCHY_DEPTH {
            let Some(base) = current.1.base.as_ref().and_then(TypeSig::identity) else {
                break;
            };
            if !seen.insert(base.clone()) {
                break;
            }
            let Some(next) = self.resolve_type(base) else {
                break;
            };
            chain.push(next);
            current = next;
        }
        chain
    }
}
