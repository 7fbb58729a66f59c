//! Rewriting of fields which became properties.

use crate::{
    engine::{HandlerKind, InstructionHandler, PassContext},
    handlers::helpers::{display_type, member_operand},
    metadata::{
        InstructionLocation, MemberDescriptor, MemberFlags, MemberKind, MemberSignature, Module,
        OpCode, TypeSig,
    },
    resolver::{Resolution, UnresolvedReason},
    verdict::HandleResult,
};

/// Rewrites accesses to fields that became properties of the same type.
///
/// | Field access | Replacement |
/// |--------------|-------------|
/// | `ldfld`      | `callvirt get_X` |
/// | `stfld`      | `callvirt set_X` |
/// | `ldsfld`     | `call get_X` |
/// | `stsfld`     | `call set_X` |
///
/// Address loads (`ldflda`, `ldsflda`) have no accessor equivalent and are
/// left to the finders.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicFieldRewriter;

impl HeuristicFieldRewriter {
    /// Creates the rewriter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Returns the accessor replacing a field access, with the opcode calling it.
fn accessor(opcode: OpCode, field: &MemberDescriptor) -> Option<(OpCode, MemberDescriptor)> {
    let (name, signature) = match opcode {
        OpCode::Ldfld | OpCode::Ldsfld => (
            format!("get_{}", field.name),
            MemberSignature::method(field.signature.return_type.clone(), vec![]),
        ),
        OpCode::Stfld | OpCode::Stsfld => (
            format!("set_{}", field.name),
            MemberSignature::method(TypeSig::Void, vec![field.signature.return_type.clone()]),
        ),
        _ => return None,
    };

    let mut target = MemberDescriptor::method(field.declaring_type.clone(), name, signature);
    let call = if field.is_static() {
        target = target.with_flags(MemberFlags::STATIC);
        OpCode::Call
    } else {
        OpCode::Callvirt
    };
    Some((call, target))
}

impl InstructionHandler for HeuristicFieldRewriter {
    fn name(&self) -> &'static str {
        "field-to-property"
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
        let Some((opcode, field)) = member_operand(module, location) else {
            return false;
        };
        if field.kind != MemberKind::Field || !ctx.resolver().should_validate(&field.declaring_type)
        {
            return false;
        }
        let Some((call, target)) = accessor(opcode, field) else {
            return false;
        };
        if ctx.resolver().resolve_member(field)
            != Resolution::Unresolved(UnresolvedReason::MissingMember)
        {
            return false;
        }

        let Some(identity) = field.declaring_type.identity() else {
            return false;
        };
        let same_type = ctx
            .resolver()
            .find_property(identity, &field.name)
            .is_some_and(|property| {
                property
                    .signature
                    .return_type
                    .looks_like_same_type(&field.signature.return_type)
            });
        if !same_type {
            return false;
        }

        let phrase = format!(
            "converted {}.{} field access to property",
            display_type(ctx.config(), &field.declaring_type),
            field.name
        );
        match ctx.redirect_member(module, location, call, &target) {
            Ok(_) => {
                ctx.mark_flag(HandleResult::Rewritten, phrase);
                true
            }
            Err(error) => {
                log::debug!("field-to-property rewrite refused: {error}");
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
        metadata::{MethodBodyBuilder, Operand},
        test::{build_mod, engine, game_type},
        verdict::VerdictStatus,
    };

    fn stack_field() -> MemberDescriptor {
        MemberDescriptor::field(game_type("Item"), "Stack", TypeSig::int32())
    }

    #[test]
    fn accessor_shapes() {
        let (call, getter) = accessor(OpCode::Ldfld, &stack_field()).unwrap();
        assert_eq!(call, OpCode::Callvirt);
        assert_eq!(getter.name, "get_Stack");
        assert_eq!(getter.signature.return_type, TypeSig::int32());

        let static_field = MemberDescriptor::static_field(game_type("Game"), "Version", TypeSig::string());
        let (call, setter) = accessor(OpCode::Stsfld, &static_field).unwrap();
        assert_eq!(call, OpCode::Call);
        assert!(setter.is_static());
        assert_eq!(setter.signature.parameters, vec![TypeSig::string()]);

        assert!(accessor(OpCode::Ldflda, &stack_field()).is_none());
    }

    #[test]
    fn field_read_and_write_become_accessor_calls() {
        let (mut module, entry) = build_mod("StackField", |builder| {
            let stack = builder.member_ref(stack_field());
            MethodBodyBuilder::new()
                .ldnull()
                .ldfld(stack)
                .stloc(0)
                .ldnull()
                .ldloc(0)
                .stfld(stack)
                .ret()
                .local(TypeSig::int32())
                .build()
        });

        let verdict = engine(EngineConfig::default()).process(&mut module).unwrap();
        assert_eq!(verdict.status(), VerdictStatus::Rewritten);
        assert_eq!(
            verdict.rewrite_phrases(),
            vec!["converted Item.Stack field access to property"]
        );

        let body = module.body(entry).unwrap();
        let names: Vec<(OpCode, &str)> = [1, 5]
            .iter()
            .map(|index| {
                let instruction = &body.instructions[*index];
                let Operand::Member(token) = instruction.operand else {
                    panic!("expected a member operand");
                };
                (instruction.opcode, module.member(token).unwrap().name.as_str())
            })
            .collect();
        assert_eq!(
            names,
            vec![(OpCode::Callvirt, "get_Stack"), (OpCode::Callvirt, "set_Stack")]
        );
    }

    #[test]
    fn address_load_is_not_rewritten() {
        let (mut module, _) = build_mod("StackAddress", |builder| {
            let stack = builder.member_ref(stack_field());
            MethodBodyBuilder::new().ldnull().ldflda(stack).pop().ret().build()
        });

        let verdict = engine(EngineConfig::default()).process(&mut module).unwrap();
        assert_eq!(verdict.status(), VerdictStatus::Rejected);
        assert_eq!(
            verdict.blocking_reasons(),
            vec!["reference to Item.Stack (no such field)"]
        );
        assert!(!module.is_mutated());
    }

    #[test]
    fn property_of_another_type_is_not_used() {
        let (mut module, _) = build_mod("StackText", |builder| {
            let stack = builder.member_ref(MemberDescriptor::field(game_type("Item"), "Stack", TypeSig::string()));
            MethodBodyBuilder::new().ldnull().ldfld(stack).pop().ret().build()
        });

        let verdict = engine(EngineConfig::default()).process(&mut module).unwrap();
        assert_eq!(verdict.status(), VerdictStatus::Rejected);
        assert!(!module.is_mutated());
    }
}
