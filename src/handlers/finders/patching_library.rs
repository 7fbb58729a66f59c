//! Detection of runtime patching libraries.

use crate::{
    config::PatchingLibrary,
    engine::{HandlerKind, InstructionHandler, PassContext},
    metadata::{Module, TypeSig, TypeUsage},
    verdict::HandleResult,
};

/// Detects references to runtime patching libraries such as Harmony.
///
/// A mod using one can alter any host method at runtime, so its static
/// compatibility cannot be vouched for.
#[derive(Debug, Clone, Default)]
pub struct PatchingLibraryFinder {
    libraries: Vec<PatchingLibrary>,
}

impl PatchingLibraryFinder {
    /// Creates a finder for the given libraries.
    #[must_use]
    pub fn new(libraries: Vec<PatchingLibrary>) -> Self {
        PatchingLibraryFinder { libraries }
    }

    /// Returns the libraries this finder detects
    #[must_use]
    pub fn libraries(&self) -> &[PatchingLibrary] {
        &self.libraries
    }
}

impl InstructionHandler for PatchingLibraryFinder {
    fn name(&self) -> &'static str {
        "patching-library"
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
            if let Some(library) = self
                .libraries
                .iter()
                .find(|library| library.scope == identity.scope)
            {
                ctx.mark_flag(
                    HandleResult::DetectedGamePatchingLibrary,
                    library.display_name.clone(),
                );
            }
        }
        None
    }
}
