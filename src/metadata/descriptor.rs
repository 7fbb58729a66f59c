//! Type and member descriptors.
//!
//! Descriptors are the nodes of a [`crate::metadata::Module`] arena. A
//! [`TypeDescriptor`] is a type *defined* by the module; a
//! [`MemberDescriptor`] is either a member definition (owned by one of those
//! types) or a member *reference* recorded by the module's code, pointing at a
//! member defined elsewhere.

use std::fmt;

use bitflags::bitflags;
use strum::{Display, IntoStaticStr};

use crate::metadata::{
    identity::TypeIdentity,
    module::MethodBody,
    signature::{MemberSignature, TypeSig},
    token::Token,
};

/// Name of instance constructors.
pub const CONSTRUCTOR_NAME: &str = ".ctor";
/// Name of static constructors.
pub const STATIC_CONSTRUCTOR_NAME: &str = ".cctor";

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// Type attribute flags
    pub struct TypeFlags: u32 {
        /// Type is visible outside its assembly
        const PUBLIC = 0x0001;
        /// Type is an interface
        const INTERFACE = 0x0020;
        /// Type cannot be instantiated
        const ABSTRACT = 0x0080;
        /// Type cannot be derived from
        const SEALED = 0x0100;
        /// Type is a value type
        const VALUE_TYPE = 0x0200;
        /// Type is a compatibility facade which only exists as a rewrite target
        const FACADE = 0x1000_0000;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// Member attribute flags
    pub struct MemberFlags: u32 {
        /// Accessible only by the declaring type
        const PRIVATE = 0x0001;
        /// Accessible by anyone
        const PUBLIC = 0x0006;
        /// Member is defined on the type rather than per instance
        const STATIC = 0x0010;
        /// Field can only be initialized
        const INIT_ONLY = 0x0020;
        /// Field value is a compile-time constant baked into callers
        const LITERAL = 0x0040;
        /// Method is virtual
        const VIRTUAL = 0x0040_0000;
        /// Method has no implementation
        const ABSTRACT = 0x0400;
        /// Member has a special name (property accessors, operators, constructors)
        const SPECIAL_NAME = 0x0800;
    }
}

/// The kind of a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum MemberKind {
    /// A field
    Field,
    /// A method, including property accessors
    Method,
    /// A property
    Property,
    /// An instance or static constructor
    Constructor,
}

/// Whether a member descriptor is defined by its module or referenced from elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberOrigin {
    /// Defined by a type of the owning module
    Definition,
    /// A reference recorded by the owning module's code
    Reference,
}

/// A type defined by a module.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    /// `(scope, namespace, name)` identity
    pub identity: TypeIdentity,
    /// Base type, `None` for `System.Object` and interfaces
    pub base: Option<TypeSig>,
    /// Type attributes
    pub flags: TypeFlags,
    /// Tokens of the member definitions owned by this type, in declaration order
    pub members: Vec<Token>,
}

impl TypeDescriptor {
    /// Creates a type descriptor without members.
    #[must_use]
    pub fn new(identity: TypeIdentity, base: Option<TypeSig>, flags: TypeFlags) -> Self {
        TypeDescriptor {
            identity,
            base,
            flags,
            members: Vec::new(),
        }
    }

    /// Returns true if this type is a compatibility facade
    #[must_use]
    pub fn is_facade(&self) -> bool {
        self.flags.contains(TypeFlags::FACADE)
    }

    /// Returns the type as a signature usage
    #[must_use]
    pub fn as_sig(&self) -> TypeSig {
        TypeSig::Named(self.identity.clone())
    }
}

/// A field, method, property or constructor.
///
/// Definitions are immutable once loaded from a reference module. A
/// *reference* recorded in a mod binary is immutable as well; rewriting swaps
/// which reference an instruction points to instead of editing it.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberDescriptor {
    /// Simple member name (`DrawSprite`, `get_Stack`, `.ctor`)
    pub name: String,
    /// Declaring type as written at the reference site
    pub declaring_type: TypeSig,
    /// Member kind
    pub kind: MemberKind,
    /// Signature of the member
    pub signature: MemberSignature,
    /// Member attributes
    pub flags: MemberFlags,
    /// Definition or reference
    pub origin: MemberOrigin,
    /// Method body of a method definition, if any
    pub body: Option<MethodBody>,
}

impl MemberDescriptor {
    fn reference(
        declaring_type: TypeSig,
        name: impl Into<String>,
        kind: MemberKind,
        signature: MemberSignature,
    ) -> Self {
        MemberDescriptor {
            name: name.into(),
            declaring_type,
            kind,
            signature,
            flags: MemberFlags::empty(),
            origin: MemberOrigin::Reference,
            body: None,
        }
    }

    /// Creates an instance method reference.
    pub fn method(
        declaring_type: TypeSig,
        name: impl Into<String>,
        signature: MemberSignature,
    ) -> Self {
        Self::reference(declaring_type, name, MemberKind::Method, signature)
    }

    /// Creates a static method reference.
    pub fn static_method(
        declaring_type: TypeSig,
        name: impl Into<String>,
        signature: MemberSignature,
    ) -> Self {
        Self::method(declaring_type, name, signature).with_flags(MemberFlags::STATIC)
    }

    /// Creates an instance field reference.
    pub fn field(declaring_type: TypeSig, name: impl Into<String>, field_type: TypeSig) -> Self {
        Self::reference(
            declaring_type,
            name,
            MemberKind::Field,
            MemberSignature::field(field_type),
        )
    }

    /// Creates a static field reference.
    pub fn static_field(
        declaring_type: TypeSig,
        name: impl Into<String>,
        field_type: TypeSig,
    ) -> Self {
        Self::field(declaring_type, name, field_type).with_flags(MemberFlags::STATIC)
    }

    /// Creates an instance constructor reference.
    #[must_use]
    pub fn constructor(declaring_type: TypeSig, parameters: Vec<TypeSig>) -> Self {
        Self::reference(
            declaring_type,
            CONSTRUCTOR_NAME,
            MemberKind::Constructor,
            MemberSignature::method(TypeSig::Void, parameters),
        )
        .with_flags(MemberFlags::SPECIAL_NAME)
    }

    /// Creates a property reference.
    pub fn property(
        declaring_type: TypeSig,
        name: impl Into<String>,
        property_type: TypeSig,
    ) -> Self {
        Self::reference(
            declaring_type,
            name,
            MemberKind::Property,
            MemberSignature::field(property_type),
        )
    }

    /// Adds attribute flags.
    #[must_use]
    pub fn with_flags(mut self, flags: MemberFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Returns true if the member is static
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.flags.contains(MemberFlags::STATIC)
    }

    /// Returns true for a field whose value is a compile-time constant
    #[must_use]
    pub fn is_literal(&self) -> bool {
        self.kind == MemberKind::Field && self.flags.contains(MemberFlags::LITERAL)
    }

    /// Returns true for methods and constructors
    #[must_use]
    pub fn is_callable(&self) -> bool {
        matches!(self.kind, MemberKind::Method | MemberKind::Constructor)
    }

    /// Returns true for a method named like a property accessor (`get_X`/`set_X`)
    #[must_use]
    pub fn is_property_accessor(&self) -> bool {
        self.kind == MemberKind::Method
            && (self.name.starts_with("get_") || self.name.starts_with("set_"))
    }

    /// Returns the property name for accessors, or the member name otherwise.
    #[must_use]
    pub fn display_member_name(&self) -> &str {
        if self.is_property_accessor() {
            &self.name[4..]
        } else {
            &self.name
        }
    }

    /// Returns the kind as phrased in diagnostics (`field`, `method`, `property`, `constructor`).
    #[must_use]
    pub fn kind_label(&self) -> &'static str {
        if self.is_property_accessor() {
            return MemberKind::Property.into();
        }
        match self.name.as_str() {
            CONSTRUCTOR_NAME | STATIC_CONSTRUCTOR_NAME => MemberKind::Constructor.into(),
            _ => self.kind.into(),
        }
    }

    /// Returns the fully-qualified technical name.
    ///
    /// Fields render as `Type Declaring::name`, methods as
    /// `Return Declaring::name(Param,Param)`.
    #[must_use]
    pub fn full_name(&self) -> String {
        let head = format!(
            "{} {}::{}",
            self.signature.return_type.full_name(),
            self.declaring_type.full_name(),
            self.name
        );
        if self.is_callable() {
            let params = self
                .signature
                .parameters
                .iter()
                .map(TypeSig::full_name)
                .collect::<Vec<_>>()
                .join(",");
            format!("{head}({params})")
        } else {
            head
        }
    }
}

impl fmt::Display for MemberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}
