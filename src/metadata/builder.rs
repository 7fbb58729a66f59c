//! Fluent construction of [`Module`]s and [`MethodBody`]s.
//!
//! The engine does not parse binaries; the loader which does hands over its
//! result through these builders. They are also what the facade registry uses
//! to materialize its synthetic module, and what the test fixtures use to
//! describe host reference assemblies and mod binaries.
//!
//! # Examples
//!
//! ```rust
//! use modscope::metadata::{
//!     MemberDescriptor, MemberFlags, MemberSignature, MethodBodyBuilder, ModuleBuilder,
//!     TypeFlags, TypeSig,
//! };
//!
//! let mut builder = ModuleBuilder::new("SpriteMod");
//! let entry = builder.define_type("SpriteMod", "ModEntry", Some(TypeSig::object()), TypeFlags::PUBLIC);
//!
//! let exit = builder.member_ref(MemberDescriptor::static_method(
//!     TypeSig::named("Game", "Host", "Game"),
//!     "Exit",
//!     MemberSignature::method(TypeSig::Void, vec![]),
//! ));
//! let body = MethodBodyBuilder::new().call(exit).ret().build();
//! builder.define_method(
//!     entry,
//!     "Quit",
//!     MemberSignature::method(TypeSig::Void, vec![]),
//!     MemberFlags::PUBLIC,
//!     Some(body),
//! )?;
//!
//! let module = builder.build();
//! assert_eq!(
//!     module.references(),
//!     &["System.Runtime".to_string(), "Game".to_string()]
//! );
//! # Ok::<(), modscope::Error>(())
//! ```

use uguid::Guid;

use crate::{
    metadata::{
        descriptor::{
            MemberDescriptor, MemberFlags, MemberKind, TypeDescriptor, TypeFlags,
            CONSTRUCTOR_NAME, STATIC_CONSTRUCTOR_NAME,
        },
        identity::TypeIdentity,
        instruction::{Instruction, OpCode, Operand},
        module::{MethodBody, Module},
        signature::{MemberSignature, TypeSig},
        token::Token,
    },
    Error, Result,
};

/// Builds a [`Module`].
pub struct ModuleBuilder {
    module: Module,
}

impl ModuleBuilder {
    /// Starts an empty module with the given assembly name and a zero version id.
    pub fn new(name: impl Into<String>) -> Self {
        ModuleBuilder {
            module: Module::new(name, Guid::ZERO),
        }
    }

    /// Sets the module version id.
    #[must_use]
    pub fn with_mvid(mut self, mvid: Guid) -> Self {
        self.module.set_mvid(mvid);
        self
    }

    /// Records an assembly reference.
    pub fn add_reference(&mut self, scope: impl Into<String>) -> &mut Self {
        self.module.add_reference(scope);
        self
    }

    /// Defines a type in this module and returns its index.
    pub fn define_type(
        &mut self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        base: Option<TypeSig>,
        flags: TypeFlags,
    ) -> usize {
        let identity = TypeIdentity::new(self.module.name(), namespace, name);
        if let Some(scope) = base.as_ref().and_then(TypeSig::scope) {
            let scope = scope.to_string();
            self.module.add_reference(scope);
        }
        self.module
            .push_type(TypeDescriptor::new(identity, base, flags))
    }

    /// Defines a field on the type at `ty`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidToken`] if `ty` is not a defined type.
    pub fn define_field(
        &mut self,
        ty: usize,
        name: impl Into<String>,
        field_type: TypeSig,
        flags: MemberFlags,
    ) -> Result<Token> {
        let declaring = self.declaring(ty)?;
        let field = MemberDescriptor::field(declaring, name, field_type).with_flags(flags);
        self.module.push_member_definition(ty, field)
    }

    /// Defines a method on the type at `ty`.
    ///
    /// Methods named `.ctor`/`.cctor` are recorded as constructors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidToken`] if `ty` is not a defined type.
    pub fn define_method(
        &mut self,
        ty: usize,
        name: impl Into<String>,
        signature: MemberSignature,
        flags: MemberFlags,
        body: Option<MethodBody>,
    ) -> Result<Token> {
        let name = name.into();
        let declaring = self.declaring(ty)?;
        let mut method = MemberDescriptor::method(declaring, name, signature).with_flags(flags);
        if method.name == CONSTRUCTOR_NAME || method.name == STATIC_CONSTRUCTOR_NAME {
            method.kind = MemberKind::Constructor;
            method.flags |= MemberFlags::SPECIAL_NAME;
        }
        method.body = body;
        self.module.push_member_definition(ty, method)
    }

    /// Defines an instance constructor on the type at `ty`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidToken`] if `ty` is not a defined type.
    pub fn define_constructor(
        &mut self,
        ty: usize,
        parameters: Vec<TypeSig>,
        flags: MemberFlags,
        body: Option<MethodBody>,
    ) -> Result<Token> {
        self.define_method(
            ty,
            CONSTRUCTOR_NAME,
            MemberSignature::method(TypeSig::Void, parameters),
            flags,
            body,
        )
    }

    /// Defines a property row without accessors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidToken`] if `ty` is not a defined type.
    pub fn define_property(
        &mut self,
        ty: usize,
        name: impl Into<String>,
        property_type: TypeSig,
        flags: MemberFlags,
    ) -> Result<Token> {
        let declaring = self.declaring(ty)?;
        let property =
            MemberDescriptor::property(declaring, name, property_type).with_flags(flags);
        self.module.push_member_definition(ty, property)
    }

    /// Defines a property together with its `get_`/`set_` accessors.
    ///
    /// # Returns
    ///
    /// The token of the property row; the accessors follow it in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidToken`] if `ty` is not a defined type.
    pub fn define_auto_property(
        &mut self,
        ty: usize,
        name: &str,
        property_type: TypeSig,
        flags: MemberFlags,
    ) -> Result<Token> {
        let property = self.define_property(ty, name, property_type.clone(), flags)?;
        let accessor_flags = flags | MemberFlags::SPECIAL_NAME;
        self.define_method(
            ty,
            format!("get_{name}"),
            MemberSignature::method(property_type.clone(), vec![]),
            accessor_flags,
            None,
        )?;
        self.define_method(
            ty,
            format!("set_{name}"),
            MemberSignature::method(TypeSig::Void, vec![property_type]),
            accessor_flags,
            None,
        )?;
        Ok(property)
    }

    /// Records a member reference and returns its token.
    ///
    /// Identical references share a token.
    pub fn member_ref(&mut self, member: MemberDescriptor) -> Token {
        self.module.import_member(member)
    }

    /// Finishes the module.
    #[must_use]
    pub fn build(self) -> Module {
        self.module
    }

    fn declaring(&self, ty: usize) -> Result<TypeSig> {
        self.module
            .types()
            .get(ty)
            .map(TypeDescriptor::as_sig)
            .ok_or(Error::InvalidToken(Token::type_def(ty)))
    }
}

/// Builds a [`MethodBody`] instruction by instruction.
///
/// Offsets are computed from the encoded size of each instruction.
#[derive(Default)]
pub struct MethodBodyBuilder {
    locals: Vec<TypeSig>,
    instructions: Vec<Instruction>,
    offset: u32,
}

impl MethodBodyBuilder {
    /// Starts an empty body.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a local variable.
    #[must_use]
    pub fn local(mut self, ty: TypeSig) -> Self {
        self.locals.push(ty);
        self
    }

    /// Appends an arbitrary instruction.
    #[must_use]
    pub fn emit(mut self, opcode: OpCode, operand: Operand) -> Self {
        self.instructions
            .push(Instruction::new(self.offset, opcode, operand));
        self.offset += opcode.encoded_size() as u32;
        self
    }

    /// `nop`
    #[must_use]
    pub fn nop(self) -> Self {
        self.emit(OpCode::Nop, Operand::None)
    }

    /// `ldarg index`
    #[must_use]
    pub fn ldarg(self, index: u16) -> Self {
        self.emit(OpCode::Ldarg, Operand::Argument(index))
    }

    /// `ldloc index`
    #[must_use]
    pub fn ldloc(self, index: u16) -> Self {
        self.emit(OpCode::Ldloc, Operand::Local(index))
    }

    /// `stloc index`
    #[must_use]
    pub fn stloc(self, index: u16) -> Self {
        self.emit(OpCode::Stloc, Operand::Local(index))
    }

    /// `ldnull`
    #[must_use]
    pub fn ldnull(self) -> Self {
        self.emit(OpCode::Ldnull, Operand::None)
    }

    /// `ldc.i4 value`
    #[must_use]
    pub fn ldc_i4(self, value: i32) -> Self {
        self.emit(OpCode::LdcI4, Operand::Int32(value))
    }

    /// `ldstr value`
    #[must_use]
    pub fn ldstr(self, value: &str) -> Self {
        self.emit(OpCode::Ldstr, Operand::String(value.to_string()))
    }

    /// `dup`
    #[must_use]
    pub fn dup(self) -> Self {
        self.emit(OpCode::Dup, Operand::None)
    }

    /// `pop`
    #[must_use]
    pub fn pop(self) -> Self {
        self.emit(OpCode::Pop, Operand::None)
    }

    /// `call method`
    #[must_use]
    pub fn call(self, method: Token) -> Self {
        self.emit(OpCode::Call, Operand::Member(method))
    }

    /// `callvirt method`
    #[must_use]
    pub fn callvirt(self, method: Token) -> Self {
        self.emit(OpCode::Callvirt, Operand::Member(method))
    }

    /// `newobj constructor`
    #[must_use]
    pub fn newobj(self, constructor: Token) -> Self {
        self.emit(OpCode::Newobj, Operand::Member(constructor))
    }

    /// `ldfld field`
    #[must_use]
    pub fn ldfld(self, field: Token) -> Self {
        self.emit(OpCode::Ldfld, Operand::Member(field))
    }

    /// `ldflda field`
    #[must_use]
    pub fn ldflda(self, field: Token) -> Self {
        self.emit(OpCode::Ldflda, Operand::Member(field))
    }

    /// `stfld field`
    #[must_use]
    pub fn stfld(self, field: Token) -> Self {
        self.emit(OpCode::Stfld, Operand::Member(field))
    }

    /// `ldsfld field`
    #[must_use]
    pub fn ldsfld(self, field: Token) -> Self {
        self.emit(OpCode::Ldsfld, Operand::Member(field))
    }

    /// `ldsflda field`
    #[must_use]
    pub fn ldsflda(self, field: Token) -> Self {
        self.emit(OpCode::Ldsflda, Operand::Member(field))
    }

    /// `stsfld field`
    #[must_use]
    pub fn stsfld(self, field: Token) -> Self {
        self.emit(OpCode::Stsfld, Operand::Member(field))
    }

    /// `box type`
    #[must_use]
    pub fn box_(self, ty: TypeSig) -> Self {
        self.emit(OpCode::Box, Operand::Type(ty))
    }

    /// `unbox.any type`
    #[must_use]
    pub fn unbox_any(self, ty: TypeSig) -> Self {
        self.emit(OpCode::UnboxAny, Operand::Type(ty))
    }

    /// `castclass type`
    #[must_use]
    pub fn castclass(self, ty: TypeSig) -> Self {
        self.emit(OpCode::Castclass, Operand::Type(ty))
    }

    /// `isinst type`
    #[must_use]
    pub fn isinst(self, ty: TypeSig) -> Self {
        self.emit(OpCode::Isinst, Operand::Type(ty))
    }

    /// `newarr type`
    #[must_use]
    pub fn newarr(self, ty: TypeSig) -> Self {
        self.emit(OpCode::Newarr, Operand::Type(ty))
    }

    /// `ldtoken type`
    #[must_use]
    pub fn ldtoken(self, ty: TypeSig) -> Self {
        self.emit(OpCode::Ldtoken, Operand::Type(ty))
    }

    /// `ldftn method`
    #[must_use]
    pub fn ldftn(self, method: Token) -> Self {
        self.emit(OpCode::Ldftn, Operand::Member(method))
    }

    /// `br target`
    #[must_use]
    pub fn br(self, target: u32) -> Self {
        self.emit(OpCode::Br, Operand::Target(target))
    }

    /// `brtrue target`
    #[must_use]
    pub fn brtrue(self, target: u32) -> Self {
        self.emit(OpCode::Brtrue, Operand::Target(target))
    }

    /// `brfalse target`
    #[must_use]
    pub fn brfalse(self, target: u32) -> Self {
        self.emit(OpCode::Brfalse, Operand::Target(target))
    }

    /// `throw`
    #[must_use]
    pub fn throw(self) -> Self {
        self.emit(OpCode::Throw, Operand::None)
    }

    /// `ret`
    #[must_use]
    pub fn ret(self) -> Self {
        self.emit(OpCode::Ret, Operand::None)
    }

    /// Finishes an inspectable body.
    #[must_use]
    pub fn build(self) -> MethodBody {
        MethodBody::il(self.locals, self.instructions)
    }
}
