//! Shared helpers for phrasing findings and reading member operands.

use crate::{
    config::EngineConfig,
    metadata::{
        InstructionLocation, MemberDescriptor, Module, OpCode, TypeIdentity, TypeSig,
        CONSTRUCTOR_NAME,
    },
};

/// Returns the keyword of a core primitive type, e.g. `int` for `System.Int32`.
fn keyword(identity: &TypeIdentity) -> Option<&'static str> {
    if identity.namespace != "System" {
        return None;
    }
    Some(match identity.name.as_str() {
        "Boolean" => "bool",
        "Byte" => "byte",
        "SByte" => "sbyte",
        "Char" => "char",
        "Decimal" => "decimal",
        "Double" => "double",
        "Single" => "float",
        "Int16" => "short",
        "UInt16" => "ushort",
        "Int32" => "int",
        "UInt32" => "uint",
        "Int64" => "long",
        "UInt64" => "ulong",
        "Object" => "object",
        "String" => "string",
        _ => return None,
    })
}

/// Returns the name of a type identity as shown in diagnostics.
pub(crate) fn display_identity(config: &EngineConfig, identity: &TypeIdentity) -> String {
    if config.technical_details {
        return identity.full_name();
    }
    if let Some(keyword) = keyword(identity) {
        return keyword.to_string();
    }
    if config
        .display_namespaces
        .iter()
        .any(|namespace| *namespace == identity.namespace)
    {
        return identity.short_name().to_string();
    }
    identity.full_name()
}

/// Returns a type usage as shown in diagnostics.
///
/// Primitives use their keyword and types in the configured display
/// namespaces their short name; everything else is fully qualified.
pub(crate) fn display_type(config: &EngineConfig, ty: &TypeSig) -> String {
    if config.technical_details {
        return ty.full_name();
    }
    if *ty == TypeSig::Void {
        return "void".to_string();
    }
    ty.render(&|identity: &TypeIdentity| display_identity(config, identity))
}

/// Returns a member as shown in diagnostics.
///
/// `Type.Member` with accessor prefixes stripped and constructors as
/// `Type(params)`, or the fully-qualified technical name when
/// `technical_details` is set.
pub(crate) fn display_member(config: &EngineConfig, member: &MemberDescriptor) -> String {
    if config.technical_details {
        return member.full_name();
    }
    let declaring = display_type(config, &member.declaring_type);
    if member.name == CONSTRUCTOR_NAME {
        let parameters = member
            .signature
            .parameters
            .iter()
            .map(|parameter| display_type(config, parameter))
            .collect::<Vec<_>>()
            .join(", ");
        return format!("{declaring}({parameters})");
    }
    format!("{declaring}.{}", member.display_member_name())
}

/// Returns the opcode and member of an instruction with a member operand.
pub(crate) fn member_operand(
    module: &Module,
    location: InstructionLocation,
) -> Option<(OpCode, &MemberDescriptor)> {
    let instruction = module.instruction(location)?;
    let member = module.member(instruction.operand.member()?)?;
    Some((instruction.opcode, member))
}
