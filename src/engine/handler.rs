//! The handler trait implemented by every finder and rewriter.

use strum::Display;

use crate::{
    engine::context::PassContext,
    metadata::{InstructionLocation, Module, TypeSig, TypeUsage},
};

/// Whether a handler only reports or also mutates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum HandlerKind {
    /// Read-only: classifies references and records findings
    Finder,
    /// Mutating: repairs references in place
    Rewriter,
}

/// A pluggable rule offered every type usage and instruction of a module.
///
/// Handlers are stateless and must be thread-safe (Send + Sync) so that one
/// [`crate::engine::HandlerRegistry`] can serve many concurrent passes. All
/// per-pass state (resolver cache, findings) lives in the [`PassContext`].
///
/// # Pass Integration
///
/// For every module the engine calls, in handler registration order:
///
/// 1. [`handle_module`](Self::handle_module) once
/// 2. [`handle_type`](Self::handle_type) for every type usage (base types,
///    member signatures, locals, declaring types of referenced members and
///    type operands)
/// 3. [`handle_instruction`](Self::handle_instruction) for every instruction
///    of every inspectable method body
///
/// Findings are recorded through [`PassContext::mark_flag`]; redirects of
/// member references go through [`PassContext::redirect_member`].
pub trait InstructionHandler: Send + Sync {
    /// Unique name for logging and finding attribution.
    fn name(&self) -> &'static str;

    /// Whether this handler mutates the module.
    fn kind(&self) -> HandlerKind;

    /// Does claiming an instruction stop the remaining handlers for it?
    ///
    /// Defaults to `false`: every applicable handler sees every instruction.
    fn is_exclusive(&self) -> bool {
        false
    }

    /// Whole-module check, run before any type or instruction is visited.
    fn handle_module(&self, _ctx: &mut PassContext<'_>, _module: &mut Module) {}

    /// Inspect one type usage.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The pass context.
    /// * `module` - The module being scanned.
    /// * `usage` - Where the type is used.
    /// * `ty` - The type as currently recorded (after earlier handlers' replacements).
    ///
    /// # Returns
    ///
    /// A replacement type, which the engine writes back into the module.
    fn handle_type(
        &self,
        _ctx: &mut PassContext<'_>,
        _module: &Module,
        _usage: &TypeUsage,
        _ty: &TypeSig,
    ) -> Option<TypeSig> {
        None
    }

    /// Inspect one instruction.
    ///
    /// # Returns
    ///
    /// `true` if the handler claimed the instruction.
    fn handle_instruction(
        &self,
        _ctx: &mut PassContext<'_>,
        _module: &mut Module,
        _location: InstructionLocation,
    ) -> bool {
        false
    }
}
