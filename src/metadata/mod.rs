//! In-memory metadata model of mod binaries and host reference assemblies.
//!
//! This module contains the graph the rule engine walks and mutates. It does
//! not parse raw binaries: an external loader builds [`Module`]s through
//! [`ModuleBuilder`] and hands them over already decoded.
//!
//! # Key Components
//!
//! - [`Module`] - Arena of type and member descriptors plus method bodies
//! - [`token`] - Arena addresses used by instruction operands
//! - [`TypeIdentity`] - The `(scope, namespace, name)` identity of a type
//! - [`TypeSig`] / [`MemberSignature`] - Type usages and member signatures
//! - [`Instruction`] - Decoded instructions with typed operands
//! - [`ModuleBuilder`] / [`MethodBodyBuilder`] - Fluent construction
//!
//! # Examples
//!
//! ```rust
//! use modscope::metadata::{MemberFlags, ModuleBuilder, TypeFlags, TypeSig};
//!
//! let mut builder = ModuleBuilder::new("Game");
//! let game = builder.define_type("Host", "Game", None, TypeFlags::PUBLIC);
//! builder.define_field(game, "Version", TypeSig::string(), MemberFlags::PUBLIC | MemberFlags::STATIC)?;
//! let module = builder.build();
//!
//! let ty = module.find_type("Host", "Game").unwrap();
//! assert_eq!(module.members_of(ty).count(), 1);
//! # Ok::<(), modscope::Error>(())
//! ```

/// Fluent builders for modules and method bodies
pub mod builder;
/// Type and member descriptors
pub mod descriptor;
/// Type identity across module boundaries
pub mod identity;
/// Instructions, opcodes and operands
pub mod instruction;
/// The module arena and its mutation API
pub mod module;
/// Type usages and member signatures
pub mod signature;
/// Arena addresses
pub mod token;

pub use builder::{MethodBodyBuilder, ModuleBuilder};
pub use descriptor::{
    MemberDescriptor, MemberFlags, MemberKind, MemberOrigin, TypeDescriptor, TypeFlags,
    CONSTRUCTOR_NAME, STATIC_CONSTRUCTOR_NAME,
};
pub use identity::{TypeIdentity, CORE_SCOPE};
pub use instruction::{Instruction, OpCode, Operand, OperandType};
pub use module::{
    BodyKind, InstructionLocation, MethodBody, Module, ScanState, SignatureSlot, TypeUsage,
};
pub use signature::{MemberSignature, TypeSig};
pub use token::Token;
