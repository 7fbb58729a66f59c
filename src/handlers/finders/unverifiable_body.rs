//! Detection of method bodies which cannot be inspected.

use crate::{
    engine::{HandlerKind, InstructionHandler, PassContext},
    handlers::helpers::display_member,
    metadata::Module,
    verdict::HandleResult,
};

/// Reports methods whose bodies cannot be inspected (native or mixed-mode code).
#[derive(Debug, Default, Clone, Copy)]
pub struct UnverifiableBodyFinder;

impl UnverifiableBodyFinder {
    /// Creates the finder.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl InstructionHandler for UnverifiableBodyFinder {
    fn name(&self) -> &'static str {
        "unverifiable-body"
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Finder
    }

    fn handle_module(&self, ctx: &mut PassContext<'_>, module: &mut Module) {
        let config = ctx.config();
        let opaque: Vec<String> = module
            .members()
            .filter(|(_, member)| {
                member
                    .body
                    .as_ref()
                    .is_some_and(|body| !body.is_inspectable())
            })
            .map(|(_, member)| display_member(config, member))
            .collect();

        for method in opaque {
            ctx.mark_flag(
                HandleResult::NotVerified,
                format!("method {method} could not be inspected"),
            );
        }
    }
}
