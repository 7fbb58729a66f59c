//! Detection of member references the host API no longer satisfies.

use crate::{
    engine::{HandlerKind, InstructionHandler, PassContext},
    handlers::helpers::{display_member, display_type, member_operand},
    metadata::{InstructionLocation, MemberKind, Module},
    resolver::Resolution,
    verdict::HandleResult,
};

/// Reports field, method and property references the host no longer satisfies.
///
/// Only references whose declaring type lives in a validated scope are
/// checked; array pseudo-methods are skipped. A member with the same name
/// but another type is reported with both types, anything else that does not
/// resolve as `no such {kind}`, including members of a missing type.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReferenceToInvalidMemberFinder;

impl ReferenceToInvalidMemberFinder {
    /// Creates the finder.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl InstructionHandler for ReferenceToInvalidMemberFinder {
    fn name(&self) -> &'static str {
        "invalid-member"
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
        let Some((opcode, member)) = member_operand(module, location) else {
            return false;
        };
        if !opcode.is_field_access() && !opcode.is_method_reference() {
            return false;
        }
        if !ctx.resolver().should_validate(&member.declaring_type) {
            return false;
        }

        let resolution = ctx.resolver().resolve_member(member);
        let config = ctx.config();
        let phrase = match resolution {
            Resolution::Matched(_) => return false,
            Resolution::Mismatched { actual, expected } => {
                let prefix = if member.kind == MemberKind::Field {
                    "field returns"
                } else {
                    "returns"
                };
                format!(
                    "reference to {} ({prefix} {}, not {})",
                    display_member(config, member),
                    display_type(config, &actual),
                    display_type(config, &expected)
                )
            }
            Resolution::Unresolved(_) => format!(
                "reference to {} (no such {})",
                display_member(config, member),
                member.kind_label()
            ),
        };
        ctx.mark_flag(HandleResult::NotCompatible, phrase);
        false
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        config::EngineConfig,
        metadata::{MemberDescriptor, MemberSignature, MethodBodyBuilder, TypeSig},
        test::{build_mod, engine, framework_type, game_type},
        verdict::{HandleResult, VerdictStatus},
    };

    #[test]
    fn renamed_field_is_rejected() {
        let (mut module, _) = build_mod("RenamedField", |builder| {
            let version =
                builder.member_ref(MemberDescriptor::static_field(game_type("Game"), "version", TypeSig::string()));
            MethodBodyBuilder::new().ldsfld(version).pop().ret().build()
        });

        let verdict = engine(EngineConfig::detect_only()).process(&mut module).unwrap();
        assert_eq!(verdict.status(), VerdictStatus::Rejected);
        assert_eq!(
            verdict.phrases(HandleResult::NotCompatible),
            vec!["reference to Game.version (no such field)"]
        );
    }

    #[test]
    fn constant_field_is_missing() {
        let (mut module, _) = build_mod("ConstantField", |builder| {
            let max =
                builder.member_ref(MemberDescriptor::static_field(game_type("Game"), "MaxPlayers", TypeSig::int32()));
            MethodBodyBuilder::new().ldsfld(max).pop().ret().build()
        });

        let verdict = engine(EngineConfig::detect_only()).process(&mut module).unwrap();
        assert_eq!(
            verdict.phrases(HandleResult::NotCompatible),
            vec!["reference to Game.MaxPlayers (no such field)"]
        );
    }

    #[test]
    fn changed_return_type_names_both_types() {
        let (mut module, _) = build_mod("ReturnType", |builder| {
            let place = builder.member_ref(MemberDescriptor::method(
                game_type("Item"),
                "canBePlacedHere",
                MemberSignature::method(
                    TypeSig::int32(),
                    vec![game_type("Location"), framework_type("Vector2"), game_type("CollisionMask")],
                ),
            ));
            MethodBodyBuilder::new()
                .ldnull()
                .ldnull()
                .ldnull()
                .ldc_i4(0)
                .callvirt(place)
                .pop()
                .ret()
                .build()
        });

        let verdict = engine(EngineConfig::detect_only()).process(&mut module).unwrap();
        assert_eq!(
            verdict.phrases(HandleResult::NotCompatible),
            vec!["reference to Item.canBePlacedHere (returns bool, not int)"]
        );
    }

    #[test]
    fn overloads_with_other_return_type_name_both_types() {
        let (mut module, _) = build_mod("ExitCode", |builder| {
            let exit = builder.member_ref(MemberDescriptor::static_method(
                game_type("Game"),
                "Exit",
                MemberSignature::method(TypeSig::int32(), vec![TypeSig::int32()]),
            ));
            MethodBodyBuilder::new().ldc_i4(0).call(exit).pop().ret().build()
        });

        let verdict = engine(EngineConfig::detect_only()).process(&mut module).unwrap();
        assert_eq!(
            verdict.phrases(HandleResult::NotCompatible),
            vec!["reference to Game.Exit (returns void, not int)"]
        );
    }

    #[test]
    fn member_of_missing_type_is_no_such_member() {
        let (mut module, _) = build_mod("Haunted", |builder| {
            let haunt = builder.member_ref(MemberDescriptor::static_method(
                game_type("Ghost"),
                "Haunt",
                MemberSignature::method(TypeSig::Void, vec![]),
            ));
            MethodBodyBuilder::new().call(haunt).ret().build()
        });

        let verdict = engine(EngineConfig::detect_only()).process(&mut module).unwrap();
        assert_eq!(verdict.status(), VerdictStatus::Rejected);
        let phrases: Vec<&str> = verdict
            .findings()
            .iter()
            .filter(|finding| finding.handler == "invalid-member")
            .map(|finding| finding.phrase.as_str())
            .collect();
        assert_eq!(phrases, vec!["reference to Ghost.Haunt (no such method)"]);
        assert!(verdict
            .phrases(HandleResult::NotCompatible)
            .iter()
            .all(|phrase| !phrase.contains("returns")));
    }

    #[test]
    fn matching_and_unvalidated_references_are_clean() {
        let (mut module, _) = build_mod("Matching", |builder| {
            let exit = builder.member_ref(MemberDescriptor::static_method(
                game_type("Game"),
                "Exit",
                MemberSignature::method(TypeSig::Void, vec![]),
            ));
            let name = builder.member_ref(MemberDescriptor::method(
                game_type("Item"),
                "GetName",
                MemberSignature::method(TypeSig::string(), vec![]),
            ));
            let other = builder.member_ref(MemberDescriptor::static_method(
                TypeSig::named("OtherMod", "OtherMod", "Api"),
                "Missing",
                MemberSignature::method(TypeSig::Void, vec![]),
            ));
            let length = builder.member_ref(MemberDescriptor::method(
                TypeSig::array_of(game_type("Item")),
                "Get",
                MemberSignature::method(game_type("Item"), vec![TypeSig::int32()]),
            ));
            MethodBodyBuilder::new()
                .call(exit)
                .ldnull()
                .callvirt(name)
                .pop()
                .call(other)
                .ldnull()
                .ldc_i4(0)
                .call(length)
                .pop()
                .ret()
                .build()
        });

        let verdict = engine(EngineConfig::detect_only()).process(&mut module).unwrap();
        assert_eq!(verdict.status(), VerdictStatus::Clean);
    }

    #[test]
    fn broken_reference_is_reported_once() {
        let (mut module, _) = build_mod("Repeated", |builder| {
            let version =
                builder.member_ref(MemberDescriptor::static_field(game_type("Game"), "version", TypeSig::string()));
            MethodBodyBuilder::new()
                .ldsfld(version)
                .pop()
                .ldsfld(version)
                .pop()
                .ret()
                .build()
        });

        let verdict = engine(EngineConfig::detect_only()).process(&mut module).unwrap();
        assert_eq!(verdict.findings().len(), 1);
    }
}
