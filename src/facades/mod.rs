//! Compatibility facade types.
//!
//! A facade is a synthetic type which exposes member signatures of an *older*
//! host API and forwards each of them to the current member, pushing default
//! values for parameters the current API added. Mods compiled against the old
//! API are rewritten to call the facade instead of failing to load.
//!
//! Facades derive from the host type they adapt, so an instance of the host
//! type can be passed as `this`. They are never constructed: their private
//! constructor throws. A removed constructor overload is instead replaced by
//! a static `Constructor` factory which builds the host type through its
//! current constructor.
//!
//! # Key Components
//!
//! - [`FacadeType`] / [`FacadeMember`] - Definitions of facades and their members
//! - [`FacadeRegistry`] - The process-wide, read-only set of facades
//! - [`ApiGeneration`] - Host API generation a facade adapts to
//!
//! # Examples
//!
//! ```rust
//! use modscope::facades::FacadeRegistry;
//!
//! let facades = FacadeRegistry::builtin();
//! let module = facades.module()?;
//! assert!(module.types().iter().all(|ty| ty.is_facade()));
//! # Ok::<(), modscope::Error>(())
//! ```

mod definitions;

use std::collections::HashSet;

use strum::{Display, EnumIter};

use crate::{
    metadata::{
        MemberDescriptor, MemberFlags, MemberSignature, MethodBody, MethodBodyBuilder, Module,
        ModuleBuilder, TypeFlags, TypeIdentity, TypeSig, CONSTRUCTOR_NAME,
    },
    resolver::ReferenceSet,
    Error, Result,
};

/// Scope of the synthetic module holding all facades.
pub const FACADE_SCOPE: &str = "ModScope.Facades";

/// Name of the static factory standing in for a removed constructor overload.
pub const FACTORY_NAME: &str = "Constructor";

/// Host API generation a facade adapts mods to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter)]
pub enum ApiGeneration {
    /// Host API 1.5
    #[strum(serialize = "1.5")]
    Host1_5,
    /// Host API 1.6
    #[strum(serialize = "1.6")]
    Host1_6,
}

impl ApiGeneration {
    /// Returns the namespace of facades for this generation.
    #[must_use]
    pub fn namespace(&self) -> &'static str {
        match self {
            ApiGeneration::Host1_5 => "ModScope.Facades.Host_1_5",
            ApiGeneration::Host1_6 => "ModScope.Facades.Host_1_6",
        }
    }
}

/// A value pushed for a parameter the current API added.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultArg {
    /// `ldc.i4 value`, also used for enums and booleans
    Int32(i32),
    /// `ldnull`
    Null,
    /// `ldstr value`
    String(String),
    /// Call to a static getter, e.g. `Color.get_White`
    StaticGetter(MemberDescriptor),
}

impl DefaultArg {
    /// Returns the static getter `type::get_{name}` returning `ty`.
    #[must_use]
    pub fn getter(ty: TypeSig, name: &str) -> Self {
        DefaultArg::StaticGetter(MemberDescriptor::static_method(
            ty.clone(),
            format!("get_{name}"),
            MemberSignature::method(ty, vec![]),
        ))
    }
}

/// Where a facade member forwards to.
#[derive(Debug, Clone, PartialEq)]
pub struct Forward {
    /// Name of the current member on the facade's target type
    pub name: String,
    /// Signature of the current member
    pub signature: MemberSignature,
    /// Values for the parameters following the facade member's own parameters
    pub defaults: Vec<DefaultArg>,
}

/// What a facade member stands in for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FacadeMemberKind {
    /// A method or accessor reached through `call` or `callvirt`
    Method,
    /// A static factory replacing `newobj` of a removed constructor overload
    Factory,
}

/// A member exposed by a facade with its old signature.
#[derive(Debug, Clone, PartialEq)]
pub struct FacadeMember {
    /// Member name
    pub name: String,
    /// Old signature; for factories the old constructor parameters returning the target
    pub signature: MemberSignature,
    /// Whether the member is static
    pub is_static: bool,
    /// Method or constructor factory
    pub kind: FacadeMemberKind,
    /// Forwarding target; `None` for signature-only members whose body throws
    pub forward: Option<Forward>,
}

impl FacadeMember {
    /// Creates an instance member forwarding to `target` with `defaults` appended.
    pub fn forwarding(
        name: impl Into<String>,
        signature: MemberSignature,
        target: MemberSignature,
        defaults: Vec<DefaultArg>,
    ) -> Self {
        let name = name.into();
        FacadeMember {
            forward: Some(Forward {
                name: name.clone(),
                signature: target,
                defaults,
            }),
            name,
            signature,
            is_static: false,
            kind: FacadeMemberKind::Method,
        }
    }

    /// Creates a signature-only member.
    pub fn signature_only(name: impl Into<String>, signature: MemberSignature) -> Self {
        FacadeMember {
            name: name.into(),
            signature,
            is_static: false,
            kind: FacadeMemberKind::Method,
            forward: None,
        }
    }

    /// Creates a static factory replacing a removed constructor of `target`.
    ///
    /// # Arguments
    ///
    /// * `target` - The host type the factory constructs.
    /// * `parameters` - Parameters of the removed constructor.
    /// * `constructor` - Parameters of the current constructor.
    /// * `defaults` - Values for the current constructor's added parameters.
    pub fn factory(
        target: &TypeIdentity,
        parameters: Vec<TypeSig>,
        constructor: Vec<TypeSig>,
        defaults: Vec<DefaultArg>,
    ) -> Self {
        FacadeMember {
            name: FACTORY_NAME.to_string(),
            signature: MemberSignature::method(TypeSig::Named(target.clone()), parameters),
            is_static: true,
            kind: FacadeMemberKind::Factory,
            forward: Some(Forward {
                name: CONSTRUCTOR_NAME.to_string(),
                signature: MemberSignature::method(TypeSig::Void, constructor),
                defaults,
            }),
        }
    }

    /// Returns true for constructor factories
    #[must_use]
    pub fn is_factory(&self) -> bool {
        self.kind == FacadeMemberKind::Factory
    }

    /// Marks the member static.
    #[must_use]
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Forwards to a differently named member.
    #[must_use]
    pub fn renamed_target(mut self, name: impl Into<String>) -> Self {
        if let Some(forward) = self.forward.as_mut() {
            forward.name = name.into();
        }
        self
    }

    fn flags(&self) -> MemberFlags {
        if self.is_static {
            MemberFlags::PUBLIC | MemberFlags::STATIC
        } else {
            MemberFlags::PUBLIC
        }
    }
}

/// A synthetic type exposing an old host API shape.
#[derive(Debug, Clone, PartialEq)]
pub struct FacadeType {
    /// Simple name, e.g. `GraphicsFacade`
    pub name: String,
    /// Generation this facade adapts to
    pub generation: ApiGeneration,
    /// The current host type this facade adapts and derives from
    pub target: TypeIdentity,
    /// Exposed members
    pub members: Vec<FacadeMember>,
}

impl FacadeType {
    /// Creates a facade without members.
    pub fn new(name: impl Into<String>, generation: ApiGeneration, target: TypeIdentity) -> Self {
        FacadeType {
            name: name.into(),
            generation,
            target,
            members: Vec::new(),
        }
    }

    /// Adds a member.
    #[must_use]
    pub fn with_member(mut self, member: FacadeMember) -> Self {
        self.members.push(member);
        self
    }

    /// Returns the identity of the facade type.
    #[must_use]
    pub fn identity(&self) -> TypeIdentity {
        TypeIdentity::new(FACADE_SCOPE, self.generation.namespace(), self.name.clone())
    }

    /// Returns a member reference to a facade member.
    #[must_use]
    pub fn member_ref(&self, member: &FacadeMember) -> MemberDescriptor {
        MemberDescriptor::method(
            TypeSig::Named(self.identity()),
            member.name.clone(),
            member.signature.clone(),
        )
        .with_flags(member.flags() & MemberFlags::STATIC)
    }

    /// Returns the member reference a forwarding member calls.
    fn forward_ref(&self, member: &FacadeMember, forward: &Forward) -> MemberDescriptor {
        if member.is_factory() {
            return MemberDescriptor::constructor(
                TypeSig::Named(self.target.clone()),
                forward.signature.parameters.clone(),
            );
        }
        MemberDescriptor::method(
            TypeSig::Named(self.target.clone()),
            forward.name.clone(),
            forward.signature.clone(),
        )
        .with_flags(member.flags() & MemberFlags::STATIC)
    }

    fn qualified(&self, member: &FacadeMember) -> String {
        format!("{}.{}", self.name, member.name)
    }
}

/// The process-wide set of facades.
///
/// Constructed once at startup and shared read-only through `Arc`.
#[derive(Debug, Clone, Default)]
pub struct FacadeRegistry {
    facades: Vec<FacadeType>,
}

impl FacadeRegistry {
    /// Returns the compiled-in facades.
    #[must_use]
    pub fn builtin() -> Self {
        FacadeRegistry {
            facades: definitions::builtin(),
        }
    }

    /// Starts a builder.
    #[must_use]
    pub fn builder() -> FacadeRegistryBuilder {
        FacadeRegistryBuilder::default()
    }

    /// Returns all facades in registration order
    #[must_use]
    pub fn facades(&self) -> &[FacadeType] {
        &self.facades
    }

    /// Returns the facades adapting the given host type
    pub fn for_target<'a>(
        &'a self,
        target: &'a TypeIdentity,
    ) -> impl Iterator<Item = &'a FacadeType> + 'a {
        self.facades
            .iter()
            .filter(move |facade| &facade.target == target)
    }

    /// Returns the number of facades
    #[must_use]
    pub fn len(&self) -> usize {
        self.facades.len()
    }

    /// Returns true if there are no facades
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.facades.is_empty()
    }

    /// Checks that every facade matches the host reference set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FacadeDefinition`] if a target type or forwarding target
    /// is missing, if the defaults do not cover the added parameters, or if a
    /// factory does not return its target type.
    pub fn validate(&self, references: &ReferenceSet) -> Result<()> {
        for facade in &self.facades {
            if references.find_type(&facade.target).is_none() {
                return Err(Error::FacadeDefinition(format!(
                    "{} adapts missing type {}",
                    facade.name, facade.target
                )));
            }
            for member in &facade.members {
                let Some(forward) = &member.forward else {
                    continue;
                };
                check_defaults(facade, member, forward)?;
                if member.is_factory()
                    && !member
                        .signature
                        .return_type
                        .looks_like_same_type(&TypeSig::Named(facade.target.clone()))
                {
                    return Err(Error::FacadeDefinition(format!(
                        "{} does not return {}",
                        facade.qualified(member),
                        facade.target
                    )));
                }

                let target = facade.forward_ref(member, forward);
                if !defines(references, &target) {
                    return Err(Error::FacadeDefinition(format!(
                        "{} forwards to missing member {}",
                        facade.qualified(member),
                        target.full_name()
                    )));
                }
                for default in &forward.defaults {
                    if let DefaultArg::StaticGetter(getter) = default {
                        if !defines(references, getter) {
                            return Err(Error::FacadeDefinition(format!(
                                "{} uses missing default {}",
                                facade.qualified(member),
                                getter.full_name()
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Materializes the facades as a module in [`FACADE_SCOPE`].
    ///
    /// Every facade derives from its target and gets a private constructor
    /// whose body throws `System.NotSupportedException`. Forwarding members
    /// load their arguments, push the defaults, call the current member and
    /// return; factories end in `newobj` of the current constructor instead.
    /// Signature-only members throw.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidToken`] only if the module builder is misused,
    /// which indicates a bug.
    pub fn module(&self) -> Result<Module> {
        let mut builder = ModuleBuilder::new(FACADE_SCOPE);
        for facade in &self.facades {
            let ty = builder.define_type(
                facade.generation.namespace(),
                facade.name.clone(),
                Some(TypeSig::Named(facade.target.clone())),
                TypeFlags::PUBLIC | TypeFlags::FACADE,
            );

            let message = format!(
                "{} is a compatibility facade and must never be constructed directly",
                facade.name
            );
            let ctor_body = throwing_body(&mut builder, &message);
            builder.define_constructor(ty, vec![], MemberFlags::PRIVATE, Some(ctor_body))?;

            for member in &facade.members {
                let body = match &member.forward {
                    Some(forward) => forwarding_body(&mut builder, facade, member, forward),
                    None => throwing_body(
                        &mut builder,
                        &format!(
                            "{} is a compatibility facade member and must never be called directly",
                            facade.qualified(member)
                        ),
                    ),
                };
                builder.define_method(
                    ty,
                    member.name.clone(),
                    member.signature.clone(),
                    member.flags(),
                    Some(body),
                )?;
            }
        }
        Ok(builder.build())
    }
}

/// Builder for [`FacadeRegistry`] rejecting duplicate definitions.
#[derive(Debug, Default)]
pub struct FacadeRegistryBuilder {
    facades: Vec<FacadeType>,
}

impl FacadeRegistryBuilder {
    /// Starts from the compiled-in facades.
    #[must_use]
    pub fn with_builtin(mut self) -> Self {
        self.facades.extend(definitions::builtin());
        self
    }

    /// Adds a facade.
    #[must_use]
    pub fn facade(mut self, facade: FacadeType) -> Self {
        self.facades.push(facade);
        self
    }

    /// Finishes the registry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FacadeDefinition`] for duplicate facade identities or
    /// two members of one facade with the same name and parameters.
    pub fn build(self) -> Result<FacadeRegistry> {
        let mut identities = HashSet::new();
        for facade in &self.facades {
            if !identities.insert(facade.identity()) {
                return Err(Error::FacadeDefinition(format!(
                    "duplicate facade {}",
                    facade.identity()
                )));
            }
            for (index, member) in facade.members.iter().enumerate() {
                let duplicate = facade.members[..index].iter().any(|other| {
                    other.name == member.name
                        && other.is_static == member.is_static
                        && other.signature.same_parameters(&member.signature)
                });
                if duplicate {
                    return Err(Error::FacadeDefinition(format!(
                        "duplicate member {}",
                        facade.qualified(member)
                    )));
                }
            }
        }
        Ok(FacadeRegistry {
            facades: self.facades,
        })
    }
}

fn check_defaults(facade: &FacadeType, member: &FacadeMember, forward: &Forward) -> Result<()> {
    let own = &member.signature.parameters;
    let target = &forward.signature.parameters;
    let prefix_matches = target.len() == own.len() + forward.defaults.len()
        && own
            .iter()
            .zip(target)
            .all(|(own, target)| own.looks_like_same_type(target));
    if !prefix_matches {
        return Err(Error::FacadeDefinition(format!(
            "{} does not forward its parameters followed by {} defaults",
            facade.qualified(member),
            forward.defaults.len()
        )));
    }
    Ok(())
}

/// Returns true if the reference set defines a callable matching `reference` exactly.
fn defines(references: &ReferenceSet, reference: &MemberDescriptor) -> bool {
    let Some((module, ty)) = reference
        .declaring_type
        .identity()
        .and_then(|identity| references.find_type(identity))
    else {
        return false;
    };
    module.members_of(ty).any(|(_, candidate)| {
        candidate.is_callable()
            && candidate.name == reference.name
            && candidate.is_static() == reference.is_static()
            && candidate.signature.looks_like_same(&reference.signature)
    })
}

fn throwing_body(builder: &mut ModuleBuilder, message: &str) -> MethodBody {
    let exception = builder.member_ref(MemberDescriptor::constructor(
        TypeSig::system("NotSupportedException"),
        vec![TypeSig::string()],
    ));
    MethodBodyBuilder::new()
        .ldstr(message)
        .newobj(exception)
        .throw()
        .build()
}

fn forwarding_body(
    builder: &mut ModuleBuilder,
    facade: &FacadeType,
    member: &FacadeMember,
    forward: &Forward,
) -> MethodBody {
    let mut body = MethodBodyBuilder::new();
    let mut argument: u16 = 0;
    if !member.is_static {
        body = body.ldarg(0);
        argument = 1;
    }
    for _ in &member.signature.parameters {
        body = body.ldarg(argument);
        argument += 1;
    }
    for default in &forward.defaults {
        body = match default {
            DefaultArg::Int32(value) => body.ldc_i4(*value),
            DefaultArg::Null => body.ldnull(),
            DefaultArg::String(value) => body.ldstr(value),
            DefaultArg::StaticGetter(getter) => body.call(builder.member_ref(getter.clone())),
        };
    }

    let target = builder.member_ref(facade.forward_ref(member, forward));
    body = match member.kind {
        FacadeMemberKind::Factory => body.newobj(target),
        FacadeMemberKind::Method if member.is_static => body.call(target),
        FacadeMemberKind::Method => body.callvirt(target),
    };
    body.ret().build()
}
