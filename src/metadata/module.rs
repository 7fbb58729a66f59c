//! The in-memory metadata graph of one binary.
//!
//! A [`Module`] is an arena: type definitions and members (definitions as well
//! as references) live in flat vectors and are addressed by [`Token`]. Method
//! bodies are owned by their method definition and address their instructions
//! by index. A rewrite therefore never edits the graph shape; it swaps the
//! token an operand points to, or replaces a single type usage value.
//!
//! Modules are built by an external loader (see
//! [`crate::metadata::ModuleBuilder`]) and are used in two roles:
//!
//! - **mod binaries**, which are scanned (and possibly mutated) by the
//!   [`crate::engine::RuleEngine`]
//! - **host reference modules**, which are read-only and collected into a
//!   [`crate::resolver::ReferenceSet`]

use strum::Display;
use uguid::Guid;

use crate::{
    metadata::{
        descriptor::{MemberDescriptor, MemberOrigin, TypeDescriptor},
        instruction::{Instruction, OpCode, Operand},
        signature::TypeSig,
        token::Token,
    },
    Error, Result,
};

/// Lifecycle of a module with respect to the rule engine.
///
/// `Unprocessed -> Scanning -> { Clean | Rewritten | Flagged | Rejected }`.
/// Terminal states are one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ScanState {
    /// The module has not been handed to the engine yet
    Unprocessed,
    /// A pass is running
    Scanning,
    /// No findings
    Clean,
    /// At least one rewrite was applied and nothing worse was found
    Rewritten,
    /// A non-fatal detection was raised
    Flagged,
    /// The module is incompatible
    Rejected,
}

impl ScanState {
    /// Returns true once a verdict has been produced
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ScanState::Unprocessed | ScanState::Scanning)
    }
}

/// How a method body is implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Managed instructions which can be inspected
    Il,
    /// Native or mixed-mode code which cannot be inspected
    Native,
}

/// The body of a method definition.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodBody {
    /// Implementation kind
    pub kind: BodyKind,
    /// Local variable types
    pub locals: Vec<TypeSig>,
    /// Instruction stream, in declaration order
    pub instructions: Vec<Instruction>,
}

impl MethodBody {
    /// Creates an inspectable instruction body.
    #[must_use]
    pub fn il(locals: Vec<TypeSig>, instructions: Vec<Instruction>) -> Self {
        MethodBody {
            kind: BodyKind::Il,
            locals,
            instructions,
        }
    }

    /// Creates an opaque native body.
    #[must_use]
    pub fn native() -> Self {
        MethodBody {
            kind: BodyKind::Native,
            locals: Vec::new(),
            instructions: Vec::new(),
        }
    }

    /// Returns true if the instructions of this body can be walked
    #[must_use]
    pub fn is_inspectable(&self) -> bool {
        self.kind == BodyKind::Il
    }
}

/// Addresses one instruction of one method body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstructionLocation {
    /// Token of the method definition owning the body
    pub method: Token,
    /// Index into the instruction stream
    pub index: usize,
}

impl InstructionLocation {
    /// Creates a new location.
    #[must_use]
    pub fn new(method: Token, index: usize) -> Self {
        InstructionLocation { method, index }
    }
}

/// A position in a member signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureSlot {
    /// Return type, field type or property type
    Return,
    /// Parameter at the given index
    Parameter(usize),
}

/// Addresses a single type usage inside a module.
///
/// The rule engine offers each usage to the type hook of every handler; a
/// handler may answer with a replacement which is written back through
/// [`Module::set_type_usage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeUsage {
    /// Base type of the type definition at the given arena index
    BaseType(usize),
    /// A slot of a member signature
    Signature {
        /// The member
        member: Token,
        /// Slot inside the signature
        slot: SignatureSlot,
    },
    /// Declaring type of a member
    DeclaringType(Token),
    /// Local variable of a method body
    Local {
        /// The method definition
        method: Token,
        /// Local index
        index: usize,
    },
    /// Type operand of an instruction
    Operand(InstructionLocation),
}

/// One binary's metadata graph.
#[derive(Debug, Clone)]
pub struct Module {
    /// Assembly name, which is also the scope of the types it defines
    name: String,
    /// Module version id
    mvid: Guid,
    /// Scopes of referenced assemblies
    references: Vec<String>,
    /// Type definition arena
    types: Vec<TypeDescriptor>,
    /// Member arena (definitions and references)
    members: Vec<MemberDescriptor>,
    /// Lifecycle state
    state: ScanState,
    /// Set once any instruction or type usage was rewritten
    mutated: bool,
}

impl Module {
    /// Creates an empty module.
    ///
    /// # Arguments
    ///
    /// * `name` - Assembly name; also the scope of every type defined here
    /// * `mvid` - Module version id of the binary
    pub fn new(name: impl Into<String>, mvid: Guid) -> Self {
        Module {
            name: name.into(),
            mvid,
            references: Vec::new(),
            types: Vec::new(),
            members: Vec::new(),
            state: ScanState::Unprocessed,
            mutated: false,
        }
    }

    /// Returns the assembly name of the module
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the module version id
    #[must_use]
    pub fn mvid(&self) -> Guid {
        self.mvid
    }

    /// Returns the scopes of all referenced assemblies
    #[must_use]
    pub fn references(&self) -> &[String] {
        &self.references
    }

    /// Returns the type definitions, in declaration order
    #[must_use]
    pub fn types(&self) -> &[TypeDescriptor] {
        &self.types
    }

    /// Returns the current lifecycle state
    #[must_use]
    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Returns true if any rewrite was applied to this module
    #[must_use]
    pub fn is_mutated(&self) -> bool {
        self.mutated
    }

    pub(crate) fn set_mvid(&mut self, mvid: Guid) {
        self.mvid = mvid;
    }

    pub(crate) fn set_state(&mut self, state: ScanState) {
        self.state = state;
    }

    /// Looks up a type definition by namespace and name.
    #[must_use]
    pub fn find_type(&self, namespace: &str, name: &str) -> Option<&TypeDescriptor> {
        self.types
            .iter()
            .find(|ty| ty.identity.namespace == namespace && ty.identity.name == name)
    }

    /// Returns the member addressed by `token`.
    #[must_use]
    pub fn member(&self, token: Token) -> Option<&MemberDescriptor> {
        if !token.is_member() {
            return None;
        }
        token.index().and_then(|index| self.members.get(index))
    }

    /// Iterates all members with their tokens, in arena order.
    pub fn members(&self) -> impl Iterator<Item = (Token, &MemberDescriptor)> {
        self.members
            .iter()
            .enumerate()
            .map(|(index, member)| (Token::member(index), member))
    }

    /// Iterates the member definitions of a type.
    pub fn members_of<'a>(
        &'a self,
        ty: &'a TypeDescriptor,
    ) -> impl Iterator<Item = (Token, &'a MemberDescriptor)> + 'a {
        ty.members
            .iter()
            .filter_map(move |token| self.member(*token).map(|member| (*token, member)))
    }

    /// Returns the body of a method definition.
    #[must_use]
    pub fn body(&self, method: Token) -> Option<&MethodBody> {
        self.member(method).and_then(|member| member.body.as_ref())
    }

    /// Returns the instruction at `location`.
    #[must_use]
    pub fn instruction(&self, location: InstructionLocation) -> Option<&Instruction> {
        self.body(location.method)
            .and_then(|body| body.instructions.get(location.index))
    }

    /// Returns the number of instructions of a method body (0 without a body).
    #[must_use]
    pub fn instruction_count(&self, method: Token) -> usize {
        self.body(method)
            .map_or(0, |body| body.instructions.len())
    }

    /// Adds an assembly reference if it is not present yet.
    pub fn add_reference(&mut self, scope: impl Into<String>) {
        let scope = scope.into();
        if scope != self.name && !self.references.contains(&scope) {
            self.references.push(scope);
        }
    }

    /// Appends a type definition and returns its arena index.
    pub(crate) fn push_type(&mut self, ty: TypeDescriptor) -> usize {
        self.types.push(ty);
        self.types.len() - 1
    }

    /// Appends a member definition to the type at `type_index`.
    pub(crate) fn push_member_definition(
        &mut self,
        type_index: usize,
        mut member: MemberDescriptor,
    ) -> Result<Token> {
        if type_index >= self.types.len() {
            return Err(Error::InvalidToken(Token::type_def(type_index)));
        }
        member.origin = MemberOrigin::Definition;
        self.members.push(member);
        let token = Token::member(self.members.len() - 1);
        self.types[type_index].members.push(token);
        Ok(token)
    }

    /// Imports a member reference into the arena and returns its token.
    ///
    /// An identical existing reference is reused, so repeated imports of the
    /// same target by many call sites share one arena entry. The declaring
    /// scope is added to the assembly references when missing.
    pub fn import_member(&mut self, mut member: MemberDescriptor) -> Token {
        member.origin = MemberOrigin::Reference;
        member.body = None;

        let existing = self.members.iter().position(|candidate| {
            candidate.origin == MemberOrigin::Reference
                && candidate.name == member.name
                && candidate.kind == member.kind
                && candidate.flags == member.flags
                && candidate.declaring_type == member.declaring_type
                && candidate.signature == member.signature
        });
        if let Some(index) = existing {
            return Token::member(index);
        }

        if let Some(scope) = member.declaring_type.scope() {
            let scope = scope.to_string();
            self.add_reference(scope);
        }
        self.members.push(member);
        Token::member(self.members.len() - 1)
    }

    /// Replaces the opcode and operand of one instruction, keeping its offset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidToken`] if the location does not address an instruction.
    pub fn replace_instruction(
        &mut self,
        location: InstructionLocation,
        opcode: OpCode,
        operand: Operand,
    ) -> Result<()> {
        let instruction = self
            .member_mut(location.method)
            .and_then(|member| member.body.as_mut())
            .and_then(|body| body.instructions.get_mut(location.index))
            .ok_or(Error::InvalidToken(location.method))?;

        if instruction.opcode != opcode || instruction.operand != operand {
            instruction.opcode = opcode;
            instruction.operand = operand;
            self.mutated = true;
        }
        Ok(())
    }

    /// Returns the type addressed by a usage.
    #[must_use]
    pub fn type_usage(&self, usage: &TypeUsage) -> Option<&TypeSig> {
        match *usage {
            TypeUsage::BaseType(index) => self.types.get(index).and_then(|ty| ty.base.as_ref()),
            TypeUsage::Signature { member, slot } => {
                let member = self.member(member)?;
                match slot {
                    SignatureSlot::Return => Some(&member.signature.return_type),
                    SignatureSlot::Parameter(index) => member.signature.parameters.get(index),
                }
            }
            TypeUsage::DeclaringType(member) => {
                self.member(member).map(|member| &member.declaring_type)
            }
            TypeUsage::Local { method, index } => {
                self.body(method).and_then(|body| body.locals.get(index))
            }
            TypeUsage::Operand(location) => self
                .instruction(location)
                .and_then(|instruction| instruction.operand.type_sig()),
        }
    }

    /// Replaces the type addressed by a usage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidToken`] if the usage does not address a type.
    pub fn set_type_usage(&mut self, usage: &TypeUsage, replacement: TypeSig) -> Result<()> {
        let target = match *usage {
            TypeUsage::BaseType(index) => self.types.get_mut(index).and_then(|ty| ty.base.as_mut()),
            TypeUsage::Signature { member, slot } => {
                self.member_mut(member).and_then(|member| match slot {
                    SignatureSlot::Return => Some(&mut member.signature.return_type),
                    SignatureSlot::Parameter(index) => member.signature.parameters.get_mut(index),
                })
            }
            TypeUsage::DeclaringType(member) => self
                .member_mut(member)
                .map(|member| &mut member.declaring_type),
            TypeUsage::Local { method, index } => self
                .member_mut(method)
                .and_then(|member| member.body.as_mut())
                .and_then(|body| body.locals.get_mut(index)),
            TypeUsage::Operand(location) => self
                .member_mut(location.method)
                .and_then(|member| member.body.as_mut())
                .and_then(|body| body.instructions.get_mut(location.index))
                .and_then(|instruction| match &mut instruction.operand {
                    Operand::Type(sig) => Some(sig),
                    _ => None,
                }),
        };

        let Some(target) = target else {
            return Err(Error::InvalidToken(usage_token(usage)));
        };
        if *target != replacement {
            if let Some(scope) = replacement.scope() {
                let scope = scope.to_string();
                *target = replacement;
                self.add_reference(scope);
            } else {
                *target = replacement;
            }
            self.mutated = true;
        }
        Ok(())
    }

    fn member_mut(&mut self, token: Token) -> Option<&mut MemberDescriptor> {
        if !token.is_member() {
            return None;
        }
        token.index().and_then(|index| self.members.get_mut(index))
    }
}

fn usage_token(usage: &TypeUsage) -> Token {
    match *usage {
        TypeUsage::BaseType(index) => Token::type_def(index),
        TypeUsage::Signature { member, .. }
        | TypeUsage::DeclaringType(member)
        | TypeUsage::Local { method: member, .. } => member,
        TypeUsage::Operand(location) => location.method,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{
        descriptor::TypeFlags,
        identity::TypeIdentity,
        instruction::{Instruction, OpCode},
        signature::MemberSignature,
    };

    fn module_with_method() -> (Module, Token, Token) {
        let mut module = Module::new("SpriteMod", Guid::ZERO);
        let ty = module.push_type(TypeDescriptor::new(
            TypeIdentity::new("SpriteMod", "SpriteMod", "ModEntry"),
            Some(TypeSig::object()),
            TypeFlags::PUBLIC,
        ));
        let draw = module.import_member(MemberDescriptor::method(
            TypeSig::named("Game", "Host", "Graphics"),
            "DrawSprite",
            MemberSignature::method(TypeSig::Void, vec![]),
        ));
        let mut entry = MemberDescriptor::method(
            TypeSig::named("SpriteMod", "SpriteMod", "ModEntry"),
            "Entry",
            MemberSignature::method(TypeSig::Void, vec![]),
        );
        entry.body = Some(MethodBody::il(
            vec![TypeSig::named("Framework", "Host", "Texture")],
            vec![
                Instruction::new(0, OpCode::Call, Operand::Member(draw)),
                Instruction::new(5, OpCode::Ret, Operand::None),
            ],
        ));
        let method = module.push_member_definition(ty, entry).unwrap();
        (module, method, draw)
    }

    #[test]
    fn import_reuses_identical_references() {
        let (mut module, _, draw) = module_with_method();
        let again = module.import_member(MemberDescriptor::method(
            TypeSig::named("Game", "Host", "Graphics"),
            "DrawSprite",
            MemberSignature::method(TypeSig::Void, vec![]),
        ));
        assert_eq!(again, draw);
        assert_eq!(module.references(), &["Game".to_string()]);
        assert!(!module.is_mutated());
    }

    #[test]
    fn replace_instruction_marks_mutated() {
        let (mut module, method, draw) = module_with_method();
        let location = InstructionLocation::new(method, 0);

        module
            .replace_instruction(location, OpCode::Call, Operand::Member(draw))
            .unwrap();
        assert!(!module.is_mutated());

        module
            .replace_instruction(location, OpCode::Callvirt, Operand::Member(draw))
            .unwrap();
        assert!(module.is_mutated());
        assert_eq!(module.instruction(location).unwrap().opcode, OpCode::Callvirt);
        assert_eq!(module.instruction(location).unwrap().offset, 0);
    }

    #[test]
    fn replace_instruction_rejects_bad_location() {
        let (mut module, method, _) = module_with_method();
        let result = module.replace_instruction(
            InstructionLocation::new(method, 99),
            OpCode::Nop,
            Operand::None,
        );
        assert!(matches!(result, Err(Error::InvalidToken(_))));
    }

    #[test]
    fn type_usages_read_and_write() {
        let (mut module, method, _) = module_with_method();
        let local = TypeUsage::Local { method, index: 0 };
        assert_eq!(
            module.type_usage(&local).unwrap().full_name(),
            "Host.Texture"
        );

        module
            .set_type_usage(&local, TypeSig::named("Graphics", "Host", "Texture2D"))
            .unwrap();
        assert!(module.is_mutated());
        assert_eq!(
            module.type_usage(&local).unwrap().full_name(),
            "Host.Texture2D"
        );
        assert!(module.references().contains(&"Graphics".to_string()));
    }

    #[test]
    fn scan_state_terminality() {
        assert!(!ScanState::Unprocessed.is_terminal());
        assert!(!ScanState::Scanning.is_terminal());
        assert!(ScanState::Clean.is_terminal());
        assert!(ScanState::Rejected.is_terminal());
    }

    #[test]
    fn member_lookup_requires_member_table() {
        let (module, method, _) = module_with_method();
        assert!(module.member(method).is_some());
        assert!(module.member(Token::type_def(0)).is_none());
        assert!(module.member(Token::member(50)).is_none());
    }
}
