//! Redirection of legacy call and constructor shapes to compatibility facades.

use crate::{
    engine::{HandlerKind, InstructionHandler, PassContext},
    facades::{FacadeMember, FacadeRegistry, FacadeType},
    handlers::helpers::member_operand,
    metadata::{
        InstructionLocation, MemberDescriptor, MemberSignature, Module, OpCode, TypeIdentity,
        TypeSig, CONSTRUCTOR_NAME,
    },
    verdict::HandleResult,
};

/// One old member shape and the facade member replacing it.
#[derive(Debug, Clone)]
struct FacadeRule {
    target: TypeIdentity,
    name: String,
    is_static: bool,
    signature: MemberSignature,
    facade: MemberDescriptor,
    constructs: bool,
}

impl FacadeRule {
    fn new(facade: &FacadeType, member: &FacadeMember) -> Self {
        let (name, is_static, signature) = if member.is_factory() {
            (
                CONSTRUCTOR_NAME.to_string(),
                false,
                MemberSignature::method(TypeSig::Void, member.signature.parameters.clone()),
            )
        } else {
            (member.name.clone(), member.is_static, member.signature.clone())
        };
        FacadeRule {
            target: facade.target.clone(),
            name,
            is_static,
            signature,
            facade: facade.member_ref(member),
            constructs: member.is_factory(),
        }
    }

    /// Returns the opcode calling the facade member in place of `opcode`.
    fn redirect_opcode(&self, opcode: OpCode) -> Option<OpCode> {
        match (self.constructs, opcode) {
            (true, OpCode::Newobj) => Some(OpCode::Call),
            (false, OpCode::Call | OpCode::Callvirt) => Some(opcode),
            _ => None,
        }
    }

    fn matches(&self, reference: &MemberDescriptor) -> bool {
        reference.name == self.name
            && reference.is_static() == self.is_static
            && reference.declaring_type.identity() == Some(&self.target)
            && reference.signature.looks_like_same(&self.signature)
    }

    fn phrase(&self) -> String {
        let parameters = self
            .signature
            .parameters
            .iter()
            .map(|parameter| parameter.short_name())
            .collect::<Vec<_>>()
            .join(", ");
        if self.constructs {
            format!("redirected legacy {}({parameters}) constructor", self.target.name)
        } else {
            format!("redirected legacy {}({parameters}) call", self.name)
        }
    }
}

/// Redirects calls using an old member signature to the matching facade member.
///
/// Rules are derived from the forwarding members of a [`FacadeRegistry`]. A
/// call is only redirected when it no longer resolves against the host, so
/// an overload that still exists is never shadowed by its facade. Facades are
/// never constructed: `newobj` of a removed constructor overload becomes a
/// `call` to the facade's static factory, which pushes the same object.
#[derive(Debug, Clone, Default)]
pub struct ReplaceReferencesRewriter {
    rules: Vec<FacadeRule>,
}

impl ReplaceReferencesRewriter {
    /// Builds the rules for every forwarding facade member.
    #[must_use]
    pub fn new(facades: &FacadeRegistry) -> Self {
        let rules = facades
            .facades()
            .iter()
            .flat_map(|facade| {
                facade
                    .members
                    .iter()
                    .filter(|member| member.forward.is_some())
                    .map(move |member| FacadeRule::new(facade, member))
            })
            .collect();
        ReplaceReferencesRewriter { rules }
    }

    /// Returns the number of redirect rules
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if there are no rules
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl InstructionHandler for ReplaceReferencesRewriter {
    fn name(&self) -> &'static str {
        "facade-references"
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Rewriter
    }

    fn handle_instruction(
        &self,
        ctx: &mut PassContext<'_>,
        module: &mut Module,
        location: InstructionLocation,
    ) -> bool {
        let Some((opcode, reference)) = member_operand(module, location) else {
            return false;
        };
        let Some((rule, redirect)) = self.rules.iter().find_map(|rule| {
            let redirect = rule.redirect_opcode(opcode)?;
            rule.matches(reference).then_some((rule, redirect))
        }) else {
            return false;
        };
        if ctx.resolver().resolve_member(reference).is_matched() {
            return false;
        }

        match ctx.redirect_member(module, location, redirect, &rule.facade) {
            Ok(_) => {
                ctx.mark_flag(HandleResult::Rewritten, rule.phrase());
                true
            }
            Err(error) => {
                log::debug!("facade redirect to {} refused: {error}", rule.facade.full_name());
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::EngineConfig,
        facades::FACTORY_NAME,
        metadata::{MethodBodyBuilder, Operand},
        resolver::Resolution,
        test::{build_mod, engine, framework_type, game_type},
        verdict::VerdictStatus,
    };

    fn legacy_draw() -> MemberDescriptor {
        MemberDescriptor::method(
            game_type("Graphics"),
            "DrawSprite",
            MemberSignature::method(TypeSig::Void, vec![framework_type("Texture"), framework_type("Vector2")]),
        )
    }

    #[test]
    fn rules_cover_forwarding_members() {
        let rewriter = ReplaceReferencesRewriter::new(&FacadeRegistry::builtin());
        assert_eq!(rewriter.len(), 5);
        assert!(ReplaceReferencesRewriter::new(&FacadeRegistry::default()).is_empty());
    }

    #[test]
    fn legacy_call_is_redirected_to_facade() {
        let (mut module, entry) = build_mod("LegacyDraw", |builder| {
            let draw = builder.member_ref(legacy_draw());
            MethodBodyBuilder::new()
                .ldnull()
                .ldnull()
                .ldnull()
                .callvirt(draw)
                .ret()
                .build()
        });

        let engine = engine(EngineConfig::default());
        let verdict = engine.process(&mut module).unwrap();
        assert_eq!(verdict.status(), VerdictStatus::Rewritten);
        assert_eq!(
            verdict.rewrite_phrases(),
            vec!["redirected legacy DrawSprite(Texture, Vector2) call"]
        );
        assert!(module.is_mutated());

        let call = module.instruction(InstructionLocation::new(entry, 3)).unwrap();
        assert_eq!(call.opcode, OpCode::Callvirt);
        let Operand::Member(token) = call.operand else {
            panic!("expected a member operand");
        };
        let redirected = module.member(token).unwrap();
        assert_eq!(
            redirected.declaring_type.full_name(),
            "ModScope.Facades.Host_1_6.GraphicsFacade"
        );

        let mut ctx = PassContext::new(engine.references(), engine.config());
        match ctx.resolver().resolve_member(redirected) {
            Resolution::Matched(definition) => {
                assert!(definition.signature.looks_like_same(&redirected.signature));
            }
            other => panic!("redirected reference does not resolve: {other:?}"),
        }
    }

    #[test]
    fn static_legacy_call_is_redirected() {
        let (mut module, _) = build_mod("LegacyCharacters", |builder| {
            let all = builder.member_ref(MemberDescriptor::static_method(
                game_type("Utility"),
                "getAllCharacters",
                MemberSignature::method(TypeSig::array_of(game_type("Character")), vec![]),
            ));
            MethodBodyBuilder::new().call(all).pop().ret().build()
        });

        let verdict = engine(EngineConfig::default()).process(&mut module).unwrap();
        assert_eq!(verdict.status(), VerdictStatus::Rewritten);
        assert_eq!(
            verdict.rewrite_phrases(),
            vec!["redirected legacy getAllCharacters() call"]
        );
    }

    #[test]
    fn removed_constructor_becomes_factory_call() {
        let (mut module, entry) = build_mod("LegacyItem", |builder| {
            let ctor = builder.member_ref(MemberDescriptor::constructor(
                game_type("Item"),
                vec![TypeSig::string()],
            ));
            MethodBodyBuilder::new()
                .ldstr("(O)388")
                .newobj(ctor)
                .pop()
                .ret()
                .build()
        });

        let engine = engine(EngineConfig::default());
        let verdict = engine.process(&mut module).unwrap();
        assert_eq!(verdict.status(), VerdictStatus::Rewritten);
        assert_eq!(
            verdict.rewrite_phrases(),
            vec!["redirected legacy Item(String) constructor"]
        );

        let call = module.instruction(InstructionLocation::new(entry, 1)).unwrap();
        assert_eq!(call.opcode, OpCode::Call);
        let factory = module.member(call.operand.member().unwrap()).unwrap();
        assert_eq!(factory.name, FACTORY_NAME);
        assert!(factory.is_static());
        assert_eq!(factory.signature.return_type, game_type("Item"));
        assert_eq!(
            factory.declaring_type.full_name(),
            "ModScope.Facades.Host_1_6.ItemFacade"
        );

        let mut ctx = PassContext::new(engine.references(), engine.config());
        assert!(ctx.resolver().resolve_member(factory).is_matched());
    }

    #[test]
    fn existing_constructor_is_not_replaced() {
        let (mut module, _) = build_mod("CurrentItem", |builder| {
            let ctor = builder.member_ref(MemberDescriptor::constructor(
                game_type("Item"),
                vec![TypeSig::string(), TypeSig::int32()],
            ));
            MethodBodyBuilder::new()
                .ldstr("(O)388")
                .ldc_i4(5)
                .newobj(ctor)
                .pop()
                .ret()
                .build()
        });

        let verdict = engine(EngineConfig::default()).process(&mut module).unwrap();
        assert_eq!(verdict.status(), VerdictStatus::Clean);
        assert!(!module.is_mutated());
    }

    #[test]
    fn factory_rule_ignores_calls() {
        let rule = ReplaceReferencesRewriter::new(&FacadeRegistry::builtin())
            .rules
            .into_iter()
            .find(|rule| rule.constructs)
            .unwrap();
        assert_eq!(rule.redirect_opcode(OpCode::Newobj), Some(OpCode::Call));
        assert_eq!(rule.redirect_opcode(OpCode::Call), None);
    }

    #[test]
    fn current_overload_is_left_alone() {
        let (mut module, _) = build_mod("CurrentDraw", |builder| {
            let draw = builder.member_ref(MemberDescriptor::method(
                game_type("Graphics"),
                "DrawSprite",
                MemberSignature::method(
                    TypeSig::Void,
                    vec![framework_type("Texture"), framework_type("Vector2"), framework_type("Color")],
                ),
            ));
            MethodBodyBuilder::new()
                .ldnull()
                .ldnull()
                .ldnull()
                .ldnull()
                .callvirt(draw)
                .ret()
                .build()
        });

        let verdict = engine(EngineConfig::default()).process(&mut module).unwrap();
        assert_eq!(verdict.status(), VerdictStatus::Clean);
        assert!(!module.is_mutated());
    }

    #[test]
    fn detect_only_reports_instead_of_rewriting() {
        let (mut module, _) = build_mod("LegacyDrawDetect", |builder| {
            let draw = builder.member_ref(legacy_draw());
            MethodBodyBuilder::new()
                .ldnull()
                .ldnull()
                .ldnull()
                .callvirt(draw)
                .ret()
                .build()
        });

        let verdict = engine(EngineConfig::detect_only()).process(&mut module).unwrap();
        assert_eq!(verdict.status(), VerdictStatus::Rejected);
        assert_eq!(
            verdict.blocking_reasons(),
            vec!["reference to Graphics.DrawSprite (no such method)"]
        );
        assert!(!module.is_mutated());
    }
}
