//! Per-pass state shared by all handlers.

use std::collections::HashSet;

use crate::{
    config::EngineConfig,
    metadata::{
        InstructionLocation, MemberDescriptor, MemberFlags, MemberOrigin, Module, OpCode,
        Operand, Token, TypeSig,
    },
    resolver::{ReferenceSet, Resolution, Resolver},
    verdict::{Finding, HandleResult},
    Error, Result,
};

/// State of one pass over one module.
///
/// Owns the [`Resolver`] (and therefore its type cache) and the findings
/// accumulated so far. Created by the engine at the start of a pass and
/// consumed at its end.
pub struct PassContext<'a> {
    config: &'a EngineConfig,
    resolver: Resolver<'a>,
    findings: Vec<Finding>,
    seen: HashSet<(&'static str, HandleResult, String)>,
    handler: &'static str,
}

impl<'a> PassContext<'a> {
    /// Creates the context for a new pass.
    #[must_use]
    pub fn new(references: &'a ReferenceSet, config: &'a EngineConfig) -> Self {
        PassContext {
            config,
            resolver: Resolver::new(references, config),
            findings: Vec::new(),
            seen: HashSet::new(),
            handler: "engine",
        }
    }

    /// Returns the engine configuration
    #[must_use]
    pub fn config(&self) -> &'a EngineConfig {
        self.config
    }

    /// Returns the resolver of this pass
    pub fn resolver(&mut self) -> &mut Resolver<'a> {
        &mut self.resolver
    }

    /// Returns the findings recorded so far
    #[must_use]
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Records a finding for the handler currently running.
    ///
    /// [`HandleResult::None`] is ignored, and a finding identical to one the
    /// same handler already raised is dropped, so a broken reference used at
    /// many call sites is reported once.
    pub fn mark_flag(&mut self, result: HandleResult, phrase: impl Into<String>) {
        if result == HandleResult::None {
            return;
        }
        let phrase = phrase.into();
        if self.seen.insert((self.handler, result, phrase.clone())) {
            self.findings
                .push(Finding::new(result, phrase, self.handler));
        }
    }

    /// Redirects the member operand of an instruction to a new target.
    ///
    /// The new target is resolved against the reference set and must be
    /// stack-compatible with the current operand: the same implicit `this`
    /// (the same declaring type or a type derived from it), the same popped
    /// argument types and the same pushed value. Only then is a reference to
    /// the resolved definition imported and the instruction replaced.
    ///
    /// A `newobj` may become a `call` to a static factory returning the
    /// constructed type, but a facade itself is never a `newobj` target.
    ///
    /// # Arguments
    ///
    /// * `module` - The module being scanned.
    /// * `location` - The instruction to rewrite.
    /// * `opcode` - The opcode of the rewritten instruction.
    /// * `target` - The new target, as a member reference.
    ///
    /// # Returns
    ///
    /// The token of the imported reference.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidToken`] if the location does not address an
    /// instruction, or [`Error::InvalidRewrite`] if the instruction has no
    /// member operand, the target does not resolve, is not compatible, or is a
    /// facade constructor. The module is left untouched on error.
    pub fn redirect_member(
        &mut self,
        module: &mut Module,
        location: InstructionLocation,
        opcode: OpCode,
        target: &MemberDescriptor,
    ) -> Result<Token> {
        let instruction = module
            .instruction(location)
            .ok_or(Error::InvalidToken(location.method))?;
        let current = instruction
            .operand
            .member()
            .and_then(|token| module.member(token))
            .ok_or_else(|| {
                Error::InvalidRewrite(format!("{instruction} has no member operand"))
            })?;
        let current_shape = StackShape::of(instruction.opcode, current);

        let definition = match self.resolver.resolve_member(target) {
            Resolution::Matched(definition) => definition,
            _ => {
                return Err(Error::InvalidRewrite(format!(
                    "{} does not resolve",
                    target.full_name()
                )))
            }
        };

        let declaring_facade = definition
            .declaring_type
            .identity()
            .and_then(|identity| self.resolver.resolve_type(identity))
            .is_some_and(|(_, ty)| ty.is_facade());
        if declaring_facade && opcode == OpCode::Newobj {
            return Err(Error::InvalidRewrite(format!(
                "facade {} cannot be constructed",
                definition.declaring_type
            )));
        }

        let new_shape = StackShape::of(opcode, definition);
        if !self.compatible(&current_shape, &new_shape) {
            return Err(Error::InvalidRewrite(format!(
                "{} is not compatible with {}",
                definition.full_name(),
                current.full_name()
            )));
        }

        log::trace!(
            "redirecting {} to {} at {:?}",
            current.full_name(),
            definition.full_name(),
            location
        );

        let reference = MemberDescriptor {
            name: definition.name.clone(),
            declaring_type: definition.declaring_type.clone(),
            kind: definition.kind,
            signature: definition.signature.clone(),
            flags: definition.flags & MemberFlags::STATIC,
            origin: MemberOrigin::Reference,
            body: None,
        };
        let token = module.import_member(reference);
        module.replace_instruction(location, opcode, Operand::Member(token))?;
        Ok(token)
    }

    pub(crate) fn enter(&mut self, handler: &'static str) {
        self.handler = handler;
    }

    pub(crate) fn into_findings(self) -> Vec<Finding> {
        self.findings
    }

    fn compatible(&mut self, current: &StackShape, new: &StackShape) -> bool {
        let this_compatible = match (&current.this, &new.this) {
            (None, None) => true,
            (Some(current), Some(new)) => {
                new.looks_like_same_type(current) || self.derives_from(new, current)
            }
            _ => false,
        };
        let pushes_compatible = match (&current.pushes, &new.pushes) {
            (None, None) => true,
            (Some(current), Some(new)) => new.looks_like_same_type(current),
            _ => false,
        };

        this_compatible
            && pushes_compatible
            && current.pops.len() == new.pops.len()
            && current
                .pops
                .iter()
                .zip(&new.pops)
                .all(|(current, new)| new.looks_like_same_type(current))
    }

    /// Returns true if the base type of `derived` is `base`.
    fn derives_from(&mut self, derived: &TypeSig, base: &TypeSig) -> bool {
        derived
            .identity()
            .and_then(|identity| self.resolver.resolve_type(identity))
            .and_then(|(_, ty)| ty.base.as_ref())
            .is_some_and(|parent| parent.looks_like_same_type(base))
    }
}

/// The evaluation stack effect of an instruction with a member operand.
#[derive(Debug)]
struct StackShape {
    this: Option<TypeSig>,
    pops: Vec<TypeSig>,
    pushes: Option<TypeSig>,
}

impl StackShape {
    fn of(opcode: OpCode, member: &MemberDescriptor) -> Self {
        let declaring = member.declaring_type.clone();
        let value = member.signature.return_type.clone();
        match opcode {
            OpCode::Ldfld => StackShape {
                this: Some(declaring),
                pops: Vec::new(),
                pushes: Some(value),
            },
            OpCode::Ldflda => StackShape {
                this: Some(declaring),
                pops: Vec::new(),
                pushes: Some(TypeSig::ByRef(Box::new(value))),
            },
            OpCode::Stfld => StackShape {
                this: Some(declaring),
                pops: vec![value],
                pushes: None,
            },
            OpCode::Ldsfld => StackShape {
                this: None,
                pops: Vec::new(),
                pushes: Some(value),
            },
            OpCode::Ldsflda => StackShape {
                this: None,
                pops: Vec::new(),
                pushes: Some(TypeSig::ByRef(Box::new(value))),
            },
            OpCode::Stsfld => StackShape {
                this: None,
                pops: vec![value],
                pushes: None,
            },
            OpCode::Newobj => StackShape {
                this: None,
                pops: member.signature.parameters.clone(),
                pushes: Some(declaring),
            },
            OpCode::Ldftn => StackShape {
                this: None,
                pops: Vec::new(),
                pushes: Some(TypeSig::system("IntPtr")),
            },
            OpCode::Ldvirtftn => StackShape {
                this: Some(declaring),
                pops: Vec::new(),
                pushes: Some(TypeSig::system("IntPtr")),
            },
            _ => StackShape {
                this: (!member.is_static()).then_some(declaring),
                pops: member.signature.parameters.clone(),
                pushes: (value != TypeSig::Void).then_some(value),
            },
        }
    }
}
