//! # modscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the modscope library. Import this module to get quick access to everything
//! needed to describe modules, configure the engine and read verdicts.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all modscope operations
pub use crate::Error;

/// The result type used throughout modscope
pub use crate::Result;

/// Engine configuration
pub use crate::config::{EngineConfig, EngineConfigBuilder, PatchingLibrary, TypeMapping};

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// The rule engine and its handler infrastructure
pub use crate::engine::{
    HandlerKind, HandlerRegistry, HandlerRegistryBuilder, InstructionHandler, PassContext,
    RuleEngine,
};

// ================================================================================================
// Metadata Model
// ================================================================================================

/// Modules and their construction
pub use crate::metadata::{
    BodyKind, InstructionLocation, MethodBody, MethodBodyBuilder, Module, ModuleBuilder,
    ScanState, SignatureSlot, TypeUsage,
};

/// Types, members and signatures
pub use crate::metadata::{
    MemberDescriptor, MemberFlags, MemberKind, MemberOrigin, MemberSignature, TypeDescriptor,
    TypeFlags, TypeIdentity, TypeSig, CONSTRUCTOR_NAME, CORE_SCOPE,
};

/// Instructions and tokens
pub use crate::metadata::{Instruction, OpCode, Operand, Token};

// ================================================================================================
// Resolution
// ================================================================================================

/// Host reference data and member resolution
pub use crate::resolver::{ReferenceSet, Resolution, Resolver, UnresolvedReason};

// ================================================================================================
// Facades
// ================================================================================================

/// Compatibility facades
pub use crate::facades::{
    ApiGeneration, DefaultArg, FacadeMember, FacadeMemberKind, FacadeRegistry, FacadeType,
    FACADE_SCOPE, FACTORY_NAME,
};

// ================================================================================================
// Verdicts
// ================================================================================================

/// Findings and their aggregation
pub use crate::verdict::{Finding, HandleResult, Verdict, VerdictStatus};
