//! The rule engine driving a pass over a module.

use std::{collections::HashSet, sync::Arc};

use rayon::prelude::*;

use crate::{
    config::EngineConfig,
    engine::{context::PassContext, registry::HandlerRegistry},
    facades::FacadeRegistry,
    metadata::{
        InstructionLocation, MemberOrigin, Module, ScanState, SignatureSlot, Token, TypeUsage,
    },
    resolver::ReferenceSet,
    verdict::Verdict,
    Error, Result,
};

/// Runs the registered handlers over modules and produces their verdicts.
///
/// The engine itself is immutable once built. Configuration, reference set,
/// facades and handlers are shared read-only, so [`RuleEngine::process_all`]
/// can scan many modules in parallel.
///
/// # Example
///
/// ```rust,ignore
/// use modscope::prelude::*;
///
/// let engine = RuleEngine::new(EngineConfig::default(), references, facades)?;
/// let verdict = engine.process(&mut module)?;
/// if verdict.should_persist() {
///     // write the rewritten module
/// }
/// ```
pub struct RuleEngine {
    config: Arc<EngineConfig>,
    references: Arc<ReferenceSet>,
    facades: Arc<FacadeRegistry>,
    registry: HandlerRegistry,
}

impl RuleEngine {
    /// Creates an engine with the standard handler set for `config`.
    ///
    /// # Arguments
    ///
    /// * `config` - The engine configuration.
    /// * `references` - Host reference modules.
    /// * `facades` - The facade registry; its module is added to the reference set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an invalid configuration and
    /// [`Error::FacadeDefinition`] if a facade does not match the reference set.
    pub fn new(
        config: EngineConfig,
        references: Arc<ReferenceSet>,
        facades: Arc<FacadeRegistry>,
    ) -> Result<Self> {
        let registry = HandlerRegistry::standard(&config, &facades);
        Self::with_registry(config, references, facades, registry)
    }

    /// Creates an engine with a custom handler registry.
    ///
    /// # Errors
    ///
    /// Same as [`RuleEngine::new`].
    pub fn with_registry(
        config: EngineConfig,
        mut references: Arc<ReferenceSet>,
        facades: Arc<FacadeRegistry>,
        registry: HandlerRegistry,
    ) -> Result<Self> {
        config.validate()?;
        facades.validate(&references)?;
        if !facades.is_empty() {
            Arc::make_mut(&mut references).insert(facades.module()?);
        }

        log::debug!(
            "rule engine ready: {} handlers, {} reference scopes, {} facades",
            registry.len(),
            references.len(),
            facades.len()
        );

        Ok(RuleEngine {
            config: Arc::new(config),
            references,
            facades,
            registry,
        })
    }

    /// Returns the configuration
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the reference set, including the facade module
    #[must_use]
    pub fn references(&self) -> &ReferenceSet {
        &self.references
    }

    /// Returns the facade registry
    #[must_use]
    pub fn facades(&self) -> &FacadeRegistry {
        &self.facades
    }

    /// Returns the handler registry
    #[must_use]
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Runs one pass over a module.
    ///
    /// Module hooks run first, then for every type its base type and member
    /// signatures are offered to the type hooks, followed by every method body
    /// (locals, then instructions in declaration order).
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyScanned`] if the module is not [`ScanState::Unprocessed`].
    pub fn process(&self, module: &mut Module) -> Result<Verdict> {
        if module.state() != ScanState::Unprocessed {
            return Err(Error::AlreadyScanned(module.name().to_string()));
        }
        module.set_state(ScanState::Scanning);

        let mut ctx = PassContext::new(&self.references, &self.config);
        for handler in self.registry.iter() {
            ctx.enter(handler.name());
            handler.handle_module(&mut ctx, module);
        }

        let mut visited = HashSet::new();
        for type_index in 0..module.types().len() {
            self.visit_usage(&mut ctx, module, TypeUsage::BaseType(type_index));

            let members = module.types()[type_index].members.clone();
            for member in &members {
                self.visit_signature(&mut ctx, module, *member);
            }
            for member in members {
                if module.body(member).is_some_and(|body| body.is_inspectable()) {
                    self.visit_body(&mut ctx, module, member, &mut visited);
                }
            }
        }

        let verdict = Verdict::aggregate(module.name(), ctx.into_findings(), module.is_mutated());
        module.set_state(verdict.status().scan_state());
        log::debug!("{verdict}");
        Ok(verdict)
    }

    /// Runs one independent pass per module in parallel.
    ///
    /// Results are returned in the order of `modules`.
    pub fn process_all(&self, modules: &mut [Module]) -> Vec<Result<Verdict>> {
        modules
            .par_iter_mut()
            .map(|module| self.process(module))
            .collect()
    }

    fn visit_signature(&self, ctx: &mut PassContext<'_>, module: &mut Module, member: Token) {
        let Some(parameters) = module
            .member(member)
            .map(|member| member.signature.parameters.len())
        else {
            return;
        };
        self.visit_usage(
            ctx,
            module,
            TypeUsage::Signature {
                member,
                slot: SignatureSlot::Return,
            },
        );
        for index in 0..parameters {
            self.visit_usage(
                ctx,
                module,
                TypeUsage::Signature {
                    member,
                    slot: SignatureSlot::Parameter(index),
                },
            );
        }
    }

    fn visit_body(
        &self,
        ctx: &mut PassContext<'_>,
        module: &mut Module,
        method: Token,
        visited: &mut HashSet<Token>,
    ) {
        let locals = module.body(method).map_or(0, |body| body.locals.len());
        for index in 0..locals {
            self.visit_usage(ctx, module, TypeUsage::Local { method, index });
        }

        // Handlers may replace instructions, so the length is re-read every step.
        let mut index = 0;
        while index < module.instruction_count(method) {
            self.visit_instruction(ctx, module, InstructionLocation::new(method, index), visited);
            index += 1;
        }
    }

    fn visit_instruction(
        &self,
        ctx: &mut PassContext<'_>,
        module: &mut Module,
        location: InstructionLocation,
        visited: &mut HashSet<Token>,
    ) {
        let Some(instruction) = module.instruction(location) else {
            return;
        };

        if instruction.operand.type_sig().is_some() {
            self.visit_usage(ctx, module, TypeUsage::Operand(location));
        } else if let Some(token) = instruction.operand.member() {
            let Some(member) = module.member(token) else {
                log::warn!(
                    "{}: skipping {} with dangling member token {}",
                    module.name(),
                    instruction,
                    token
                );
                return;
            };
            if member.origin == MemberOrigin::Reference && visited.insert(token) {
                self.visit_usage(ctx, module, TypeUsage::DeclaringType(token));
                self.visit_signature(ctx, module, token);
            }
        }

        for handler in self.registry.iter() {
            ctx.enter(handler.name());
            let claimed = handler.handle_instruction(ctx, module, location);
            if claimed && handler.is_exclusive() {
                break;
            }
        }
    }

    fn visit_usage(&self, ctx: &mut PassContext<'_>, module: &mut Module, usage: TypeUsage) {
        let Some(mut current) = module.type_usage(&usage).cloned() else {
            return;
        };

        for handler in self.registry.iter() {
            ctx.enter(handler.name());
            let Some(replacement) = handler.handle_type(ctx, module, &usage, &current) else {
                continue;
            };
            if replacement == current {
                continue;
            }
            match module.set_type_usage(&usage, replacement.clone()) {
                Ok(()) => current = replacement,
                Err(error) => log::warn!("{}: {error}", module.name()),
            }
        }
    }
}
