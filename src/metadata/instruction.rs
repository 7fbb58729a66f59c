//! Instruction representation for method bodies.
//!
//! The engine never executes code, so only the information needed to classify
//! and redirect symbol references is modelled: the opcode, its operand and the
//! byte offset the instruction was decoded from.
//!
//! # Key Components
//!
//! - [`Instruction`] - A decoded instruction
//! - [`OpCode`] - Supported CIL opcodes with their mnemonics
//! - [`Operand`] - Type-safe operand representation
//! - [`OperandType`] - Encoded operand kinds and their sizes

use std::fmt;

use strum::{Display, IntoStaticStr};

use crate::metadata::{signature::TypeSig, token::Token};

/// Types of operands for CIL instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandType {
    /// No operand present
    None,
    /// Unsigned 16-bit index (arguments, locals)
    UInt16,
    /// Signed 32-bit integer
    Int32,
    /// Metadata token reference (members, types, strings)
    Token,
    /// Branch target
    BranchTarget,
}

impl OperandType {
    /// Returns the size in bytes of this operand type.
    #[must_use]
    pub const fn size(&self) -> usize {
        match self {
            OperandType::None => 0,
            OperandType::UInt16 => 2,
            OperandType::Int32 | OperandType::Token | OperandType::BranchTarget => 4,
        }
    }
}

/// Supported CIL opcodes.
///
/// The `Display` implementation yields the ECMA-335 mnemonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum OpCode {
    /// Do nothing
    #[strum(serialize = "nop")]
    Nop,
    /// Load argument
    #[strum(serialize = "ldarg")]
    Ldarg,
    /// Load local variable
    #[strum(serialize = "ldloc")]
    Ldloc,
    /// Store local variable
    #[strum(serialize = "stloc")]
    Stloc,
    /// Push null reference
    #[strum(serialize = "ldnull")]
    Ldnull,
    /// Push 32-bit integer
    #[strum(serialize = "ldc.i4")]
    LdcI4,
    /// Push string literal
    #[strum(serialize = "ldstr")]
    Ldstr,
    /// Duplicate top of stack
    #[strum(serialize = "dup")]
    Dup,
    /// Discard top of stack
    #[strum(serialize = "pop")]
    Pop,
    /// Call method
    #[strum(serialize = "call")]
    Call,
    /// Call method through virtual dispatch
    #[strum(serialize = "callvirt")]
    Callvirt,
    /// Allocate object and call constructor
    #[strum(serialize = "newobj")]
    Newobj,
    /// Return from method
    #[strum(serialize = "ret")]
    Ret,
    /// Unconditional branch
    #[strum(serialize = "br")]
    Br,
    /// Branch if true
    #[strum(serialize = "brtrue")]
    Brtrue,
    /// Branch if false
    #[strum(serialize = "brfalse")]
    Brfalse,
    /// Throw exception
    #[strum(serialize = "throw")]
    Throw,
    /// Load instance field
    #[strum(serialize = "ldfld")]
    Ldfld,
    /// Load instance field address
    #[strum(serialize = "ldflda")]
    Ldflda,
    /// Store instance field
    #[strum(serialize = "stfld")]
    Stfld,
    /// Load static field
    #[strum(serialize = "ldsfld")]
    Ldsfld,
    /// Load static field address
    #[strum(serialize = "ldsflda")]
    Ldsflda,
    /// Store static field
    #[strum(serialize = "stsfld")]
    Stsfld,
    /// Box value type
    #[strum(serialize = "box")]
    Box,
    /// Unbox to value type
    #[strum(serialize = "unbox.any")]
    UnboxAny,
    /// Cast to class
    #[strum(serialize = "castclass")]
    Castclass,
    /// Type test
    #[strum(serialize = "isinst")]
    Isinst,
    /// Allocate array
    #[strum(serialize = "newarr")]
    Newarr,
    /// Load runtime handle of a type
    #[strum(serialize = "ldtoken")]
    Ldtoken,
    /// Load method pointer
    #[strum(serialize = "ldftn")]
    Ldftn,
    /// Load virtual method pointer
    #[strum(serialize = "ldvirtftn")]
    Ldvirtftn,
}

impl OpCode {
    /// Returns the operand kind this opcode expects.
    #[must_use]
    pub const fn operand_type(&self) -> OperandType {
        match self {
            OpCode::Nop
            | OpCode::Ldnull
            | OpCode::Dup
            | OpCode::Pop
            | OpCode::Ret
            | OpCode::Throw => OperandType::None,
            OpCode::Ldarg | OpCode::Ldloc | OpCode::Stloc => OperandType::UInt16,
            OpCode::LdcI4 => OperandType::Int32,
            OpCode::Br | OpCode::Brtrue | OpCode::Brfalse => OperandType::BranchTarget,
            OpCode::Ldstr
            | OpCode::Call
            | OpCode::Callvirt
            | OpCode::Newobj
            | OpCode::Ldfld
            | OpCode::Ldflda
            | OpCode::Stfld
            | OpCode::Ldsfld
            | OpCode::Ldsflda
            | OpCode::Stsfld
            | OpCode::Box
            | OpCode::UnboxAny
            | OpCode::Castclass
            | OpCode::Isinst
            | OpCode::Newarr
            | OpCode::Ldtoken
            | OpCode::Ldftn
            | OpCode::Ldvirtftn => OperandType::Token,
        }
    }

    /// Returns the encoded size of the opcode and its operand in bytes.
    #[must_use]
    pub const fn encoded_size(&self) -> usize {
        let opcode = match self {
            OpCode::Ldarg | OpCode::Ldloc | OpCode::Stloc | OpCode::Ldftn | OpCode::Ldvirtftn => 2,
            _ => 1,
        };
        opcode + self.operand_type().size()
    }

    /// Returns true for opcodes that access a field.
    #[must_use]
    pub const fn is_field_access(&self) -> bool {
        matches!(
            self,
            OpCode::Ldfld
                | OpCode::Ldflda
                | OpCode::Stfld
                | OpCode::Ldsfld
                | OpCode::Ldsflda
                | OpCode::Stsfld
        )
    }

    /// Returns true for opcodes that reference a method or constructor.
    #[must_use]
    pub const fn is_method_reference(&self) -> bool {
        matches!(
            self,
            OpCode::Call | OpCode::Callvirt | OpCode::Newobj | OpCode::Ldftn | OpCode::Ldvirtftn
        )
    }
}

/// An instruction operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// No operand present
    None,
    /// 32-bit integer immediate
    Int32(i32),
    /// String literal
    String(String),
    /// Method argument index
    Argument(u16),
    /// Local variable index
    Local(u16),
    /// Branch target (instruction index)
    Target(u32),
    /// Reference to a member of the module arena
    Member(Token),
    /// Type usage
    Type(TypeSig),
}

impl Operand {
    /// Returns a formatted string representation of the operand.
    ///
    /// # Returns
    ///
    /// - `None` for [`Operand::None`]
    /// - A formatted string for all other operand types
    #[must_use]
    pub fn as_string(&self) -> Option<String> {
        match self {
            Operand::None => None,
            Operand::Int32(value) => Some(value.to_string()),
            Operand::String(value) => Some(format!("{value:?}")),
            Operand::Argument(index) => Some(format!("A_{index}")),
            Operand::Local(index) => Some(format!("V_{index}")),
            Operand::Target(target) => Some(format!("IL_{target:04}")),
            Operand::Member(token) => Some(token.to_string()),
            Operand::Type(sig) => Some(sig.full_name()),
        }
    }

    /// Returns the member token, if this operand references a member.
    #[must_use]
    pub fn member(&self) -> Option<Token> {
        match self {
            Operand::Member(token) => Some(*token),
            _ => None,
        }
    }

    /// Returns the type usage, if this operand is a type.
    #[must_use]
    pub fn type_sig(&self) -> Option<&TypeSig> {
        match self {
            Operand::Type(sig) => Some(sig),
            _ => None,
        }
    }
}

/// A decoded instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// Byte offset of the instruction within its method body
    pub offset: u32,
    /// The opcode
    pub opcode: OpCode,
    /// The operand
    pub operand: Operand,
}

impl Instruction {
    /// Creates a new instruction.
    #[must_use]
    pub fn new(offset: u32, opcode: OpCode, operand: Operand) -> Self {
        Instruction {
            offset,
            opcode,
            operand,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IL_{:04x}: {}", self.offset, self.opcode)?;
        if let Some(operand) = self.operand.as_string() {
            write!(f, " {operand}")?;
        }
        Ok(())
    }
}
