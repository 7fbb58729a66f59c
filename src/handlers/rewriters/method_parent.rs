//! Rewriting of static methods which moved to another type.

use crate::{
    config::TypeMapping,
    engine::{HandlerKind, InstructionHandler, PassContext},
    handlers::helpers::{display_identity, member_operand},
    metadata::{InstructionLocation, MemberDescriptor, MemberFlags, Module, OpCode, TypeSig},
    verdict::HandleResult,
};

/// Redirects calls to static methods which moved to another type.
///
/// Only `call`s to static methods whose reference no longer resolves are
/// considered. The method keeps its name and signature on the new type.
#[derive(Debug, Clone, Default)]
pub struct MethodParentRewriter {
    mappings: Vec<TypeMapping>,
}

impl MethodParentRewriter {
    /// Creates a rewriter for the given old and new declaring types.
    #[must_use]
    pub fn new(mappings: Vec<TypeMapping>) -> Self {
        MethodParentRewriter { mappings }
    }
}

impl InstructionHandler for MethodParentRewriter {
    fn name(&self) -> &'static str {
        "method-parent"
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
        let Some((opcode, method)) = member_operand(module, location) else {
            return false;
        };
        if opcode != OpCode::Call || !method.is_callable() || !method.is_static() {
            return false;
        }
        let Some(mapping) = self
            .mappings
            .iter()
            .find(|mapping| method.declaring_type.identity() == Some(&mapping.from))
        else {
            return false;
        };
        if ctx.resolver().resolve_member(method).is_matched() {
            return false;
        }

        let target = MemberDescriptor::static_method(
            TypeSig::Named(mapping.to.clone()),
            method.name.clone(),
            method.signature.clone(),
        )
        .with_flags(method.flags & MemberFlags::SPECIAL_NAME);
        let config = ctx.config();
        let phrase = format!(
            "redirected {from}.{name} to {to}.{name}",
            from = display_identity(config, &mapping.from),
            to = display_identity(config, &mapping.to),
            name = method.display_member_name()
        );

        match ctx.redirect_member(module, location, OpCode::Call, &target) {
            Ok(_) => {
                ctx.mark_flag(HandleResult::Rewritten, phrase);
                true
            }
            Err(error) => {
                log::debug!("method parent redirect refused: {error}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        config::EngineConfig,
        metadata::{MemberDescriptor, MemberSignature, MethodBodyBuilder, TypeSig},
        test::{build_mod, engine, game_identity, game_type},
        verdict::{HandleResult, VerdictStatus},
    };

    fn online_count(owner: &str) -> MemberDescriptor {
        MemberDescriptor::static_method(
            game_type(owner),
            "getOnlineCount",
            MemberSignature::method(TypeSig::int32(), vec![]),
        )
    }

    fn config() -> EngineConfig {
        EngineConfig::default()
            .with_method_parent_mapping(game_identity("Game"), game_identity("Multiplayer"))
    }

    #[test]
    fn moved_static_method_is_redirected() {
        let (mut module, _) = build_mod("Online", |builder| {
            let count = builder.member_ref(online_count("Game"));
            MethodBodyBuilder::new().call(count).pop().ret().build()
        });

        let verdict = engine(config()).process(&mut module).unwrap();
        assert_eq!(verdict.status(), VerdictStatus::Rewritten);
        assert_eq!(
            verdict.rewrite_phrases(),
            vec!["redirected Game.getOnlineCount to Multiplayer.getOnlineCount"]
        );
        assert!(!verdict.has(HandleResult::NotCompatible));
    }

    #[test]
    fn existing_method_on_old_type_is_kept() {
        let (mut module, _) = build_mod("Exit", |builder| {
            let exit = builder.member_ref(MemberDescriptor::static_method(
                game_type("Game"),
                "Exit",
                MemberSignature::method(TypeSig::Void, vec![]),
            ));
            MethodBodyBuilder::new().call(exit).ret().build()
        });

        let verdict = engine(config()).process(&mut module).unwrap();
        assert_eq!(verdict.status(), VerdictStatus::Clean);
        assert!(!module.is_mutated());
    }

    #[test]
    fn method_missing_on_new_type_is_reported() {
        let (mut module, _) = build_mod("Vanished", |builder| {
            let gone = builder.member_ref(MemberDescriptor::static_method(
                game_type("Game"),
                "getHostName",
                MemberSignature::method(TypeSig::string(), vec![]),
            ));
            MethodBodyBuilder::new().call(gone).pop().ret().build()
        });

        let verdict = engine(config()).process(&mut module).unwrap();
        assert_eq!(verdict.status(), VerdictStatus::Rejected);
        assert_eq!(
            verdict.blocking_reasons(),
            vec!["reference to Game.getHostName (no such method)"]
        );
    }
}
