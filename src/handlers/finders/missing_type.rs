//! Detection of type usages the host API no longer defines.

use crate::{
    engine::{HandlerKind, InstructionHandler, PassContext},
    handlers::helpers::display_identity,
    metadata::{Module, TypeSig, TypeUsage},
    verdict::HandleResult,
};

/// Reports type usages in a validated scope which do not resolve.
///
/// Every identity inside a usage is checked, so `List<Ghost>` and `Ghost[]`
/// both report the missing `Ghost`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReferenceToMissingTypeFinder;

impl ReferenceToMissingTypeFinder {
    /// Creates the finder.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl InstructionHandler for ReferenceToMissingTypeFinder {
    fn name(&self) -> &'static str {
        "missing-type"
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Finder
    }

    fn handle_type(
        &self,
        ctx: &mut PassContext<'_>,
        _module: &Module,
        _usage: &TypeUsage,
        ty: &TypeSig,
    ) -> Option<TypeSig> {
        for identity in ty.identities() {
            if !ctx.resolver().validates_identity(identity) {
                continue;
            }
            if ctx.resolver().resolve_type(identity).is_none() {
                let phrase = format!(
                    "reference to {} (no such type)",
                    display_identity(ctx.config(), identity)
                );
                ctx.mark_flag(HandleResult::NotCompatible, phrase);
            }
        }
        None
    }
}
