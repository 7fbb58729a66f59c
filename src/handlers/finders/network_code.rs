//! Detection of broken references into network synchronization code.

use crate::{
    engine::{HandlerKind, InstructionHandler, PassContext},
    handlers::helpers::{display_member, member_operand},
    metadata::{InstructionLocation, Module},
    resolver::{Resolution, UnresolvedReason},
    verdict::HandleResult,
};

/// Detects broken references into network synchronization code.
///
/// Such references usually mean the mod syncs state the host now syncs
/// differently, so they are flagged in addition to any compatibility finding.
/// References into a scope without loaded reference data are not reported.
#[derive(Debug, Clone, Default)]
pub struct NetworkCodeFinder {
    namespaces: Vec<String>,
}

impl NetworkCodeFinder {
    /// Creates a finder for the given namespaces and their children.
    #[must_use]
    pub fn new(namespaces: Vec<String>) -> Self {
        NetworkCodeFinder { namespaces }
    }
}

impl InstructionHandler for NetworkCodeFinder {
    fn name(&self) -> &'static str {
        "network-code"
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Finder
    }

    fn handle_instruction(
        &self,
        ctx: &mut PassContext<'_>,
        module: &mut Module,
        location: InstructionLocation,
    ) -> bool {
        let Some((_, member)) = member_operand(module, location) else {
            return false;
        };
        let Some(identity) = member.declaring_type.identity() else {
            return false;
        };
        if !self
            .namespaces
            .iter()
            .any(|namespace| identity.in_namespace(namespace))
        {
            return false;
        }

        match ctx.resolver().resolve_member(member) {
            Resolution::Matched(_) | Resolution::Unresolved(UnresolvedReason::ScopeNotLoaded) => {}
            Resolution::Mismatched { .. } | Resolution::Unresolved(_) => {
                let phrase = format!(
                    "network code reference to {}",
                    display_member(ctx.config(), member)
                );
                ctx.mark_flag(HandleResult::DetectedIncompatibleNetworkCode, phrase);
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        config::EngineConfig,
        metadata::{MemberDescriptor, MemberSignature, MethodBodyBuilder, TypeSig},
        test::{build_mod, engine},
        verdict::{HandleResult, VerdictStatus},
    };

    fn net_int() -> TypeSig {
        TypeSig::named("Netcode", "Netcode", "NetInt")
    }

    #[test]
    fn broken_netcode_reference_is_flagged() {
        let (mut module, _) = build_mod("Sync", |builder| {
            let reset = builder.member_ref(MemberDescriptor::method(
                net_int(),
                "Reset",
                MemberSignature::method(TypeSig::Void, vec![]),
            ));
            MethodBodyBuilder::new().ldnull().callvirt(reset).ret().build()
        });

        let verdict = engine(EngineConfig::detect_only()).process(&mut module).unwrap();
        assert_eq!(verdict.status(), VerdictStatus::Flagged);
        assert_eq!(
            verdict.phrases(HandleResult::DetectedIncompatibleNetworkCode),
            vec!["network code reference to NetInt.Reset"]
        );
    }

    #[test]
    fn working_netcode_reference_is_clean() {
        let (mut module, _) = build_mod("SyncOk", |builder| {
            let set = builder.member_ref(MemberDescriptor::method(
                net_int(),
                "Set",
                MemberSignature::method(TypeSig::Void, vec![TypeSig::int32()]),
            ));
            let value = builder.member_ref(MemberDescriptor::method(
                net_int(),
                "get_Value",
                MemberSignature::method(TypeSig::int32(), vec![]),
            ));
            MethodBodyBuilder::new()
                .ldnull()
                .ldc_i4(1)
                .callvirt(set)
                .ldnull()
                .callvirt(value)
                .pop()
                .ret()
                .build()
        });

        let verdict = engine(EngineConfig::detect_only()).process(&mut module).unwrap();
        assert_eq!(verdict.status(), VerdictStatus::Clean);
    }
}
