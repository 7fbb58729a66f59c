//! Rewriting of renamed or moved types.

use crate::{
    config::TypeMapping,
    engine::{HandlerKind, InstructionHandler, PassContext},
    handlers::helpers::display_identity,
    metadata::{Module, TypeSig, TypeUsage},
    verdict::HandleResult,
};

/// Rewrites usages of renamed or moved types to their new identity.
///
/// Applies to every type usage, including generic arguments, array elements
/// and the declaring types of member references, so calls through a renamed
/// type resolve against the new type afterwards.
///
/// A mapping is only applied while its old type no longer resolves and its
/// new type does.
#[derive(Debug, Clone, Default)]
pub struct TypeReferenceRewriter {
    mappings: Vec<TypeMapping>,
}

impl TypeReferenceRewriter {
    /// Creates a rewriter for the given mappings, applied in order.
    #[must_use]
    pub fn new(mappings: Vec<TypeMapping>) -> Self {
        TypeReferenceRewriter { mappings }
    }
}

impl InstructionHandler for TypeReferenceRewriter {
    fn name(&self) -> &'static str {
        "type-references"
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Rewriter
    }

    fn handle_type(
        &self,
        ctx: &mut PassContext<'_>,
        _module: &Module,
        _usage: &TypeUsage,
        ty: &TypeSig,
    ) -> Option<TypeSig> {
        let mut rewritten = ty.clone();
        let mut changed = false;
        for mapping in &self.mappings {
            if !rewritten.identities().contains(&&mapping.from) || !applicable(ctx, mapping) {
                continue;
            }
            if rewritten.replace_identity(&mapping.from, &mapping.to) {
                changed = true;
                let config = ctx.config();
                let phrase = format!(
                    "converted {} references to {}",
                    display_identity(config, &mapping.from),
                    display_identity(config, &mapping.to)
                );
                ctx.mark_flag(HandleResult::Rewritten, phrase);
            }
        }
        changed.then_some(rewritten)
    }
}

/// Returns true if `mapping` repairs a reference instead of breaking one.
fn applicable(ctx: &mut PassContext<'_>, mapping: &TypeMapping) -> bool {
    let resolver = ctx.resolver();
    resolver.resolve_type(&mapping.from).is_none() && resolver.resolve_type(&mapping.to).is_some()
}

#[cfg(test)]
mod tests {
    use crate::{
        config::EngineConfig,
        metadata::{MemberDescriptor, MemberSignature, MethodBodyBuilder, Operand, TypeSig},
        test::{build_mod, engine, game_identity, game_type},
        verdict::{HandleResult, VerdictStatus},
    };

    #[test]
    fn renamed_type_is_rewritten_everywhere() {
        let config = EngineConfig::default().with_type_mapping(game_identity("Farmer"), game_identity("Player"));
        let (mut module, entry) = build_mod("OldFarmer", |builder| {
            let name = builder.member_ref(MemberDescriptor::method(
                game_type("Farmer"),
                "GetName",
                MemberSignature::method(TypeSig::string(), vec![]),
            ));
            MethodBodyBuilder::new()
                .local(TypeSig::array_of(game_type("Farmer")))
                .ldnull()
                .castclass(game_type("Farmer"))
                .callvirt(name)
                .pop()
                .ret()
                .build()
        });

        let verdict = engine(config).process(&mut module).unwrap();
        assert_eq!(verdict.status(), VerdictStatus::Rewritten);
        assert_eq!(
            verdict.rewrite_phrases(),
            vec!["converted Farmer references to Player"]
        );
        assert!(!verdict.has(HandleResult::NotCompatible));

        let body = module.body(entry).unwrap();
        assert_eq!(body.locals, vec![TypeSig::array_of(game_type("Player"))]);
        assert_eq!(body.instructions[1].operand, Operand::Type(game_type("Player")));
        let call = module
            .member(body.instructions[2].operand.member().unwrap())
            .unwrap();
        assert_eq!(call.declaring_type, game_type("Player"));
    }

    #[test]
    fn unmapped_types_are_untouched() {
        let config = EngineConfig::default().with_type_mapping(game_identity("Farmer"), game_identity("Player"));
        let (mut module, _) = build_mod("NoFarmer", |_| {
            MethodBodyBuilder::new().local(game_type("Item")).ret().build()
        });

        let verdict = engine(config).process(&mut module).unwrap();
        assert_eq!(verdict.status(), VerdictStatus::Clean);
        assert!(!module.is_mutated());
    }

    #[test]
    fn mapping_onto_unknown_type_is_not_applied() {
        let config = EngineConfig::default().with_type_mapping(game_identity("Item"), game_identity("Ghost"));
        let (mut module, entry) = build_mod("KeepsItem", |builder| {
            let name = builder.member_ref(MemberDescriptor::method(
                game_type("Item"),
                "GetName",
                MemberSignature::method(TypeSig::string(), vec![]),
            ));
            MethodBodyBuilder::new().ldnull().callvirt(name).pop().ret().build()
        });

        let verdict = engine(config).process(&mut module).unwrap();
        assert_eq!(verdict.status(), VerdictStatus::Clean);
        assert!(verdict.rewrite_phrases().is_empty());
        assert!(!module.is_mutated());

        let body = module.body(entry).unwrap();
        let call = module
            .member(body.instructions[1].operand.member().unwrap())
            .unwrap();
        assert_eq!(call.declaring_type, game_type("Item"));
    }

    #[test]
    fn mapping_from_existing_type_is_not_applied() {
        let config = EngineConfig::default().with_type_mapping(game_identity("Item"), game_identity("Player"));
        let (mut module, _) = build_mod("StillItem", |_| {
            MethodBodyBuilder::new().local(game_type("Item")).ret().build()
        });

        let verdict = engine(config).process(&mut module).unwrap();
        assert_eq!(verdict.status(), VerdictStatus::Clean);
        assert!(!module.is_mutated());
    }
}
