//! Detection of sensitive framework APIs by type name or namespace.
//!
//! The presets are only registered when paranoid warnings are enabled.

use crate::{
    engine::{HandlerKind, InstructionHandler, PassContext},
    metadata::{Module, TypeIdentity, TypeSig, TypeUsage},
    verdict::HandleResult,
};

/// Detects usages of sensitive framework types.
///
/// A type matches by full name (`System.IO.File`) or by living in one of the
/// configured namespaces (`System.Reflection.*`). Scopes are ignored since
/// these types move between framework assemblies.
#[derive(Debug, Clone)]
pub struct TypeFinder {
    name: &'static str,
    result: HandleResult,
    types: Vec<String>,
    namespaces: Vec<String>,
}

impl TypeFinder {
    /// Creates a finder raising `result` for the given types and namespaces.
    ///
    /// # Arguments
    ///
    /// * `name` - Handler name used for finding attribution.
    /// * `result` - The finding raised on a match.
    /// * `types` - Full type names, e.g. `System.Console`.
    /// * `namespaces` - Namespaces whose types (and child namespaces' types) match.
    #[must_use]
    pub fn new(
        name: &'static str,
        result: HandleResult,
        types: &[&str],
        namespaces: &[&str],
    ) -> Self {
        TypeFinder {
            name,
            result,
            types: types.iter().map(ToString::to_string).collect(),
            namespaces: namespaces.iter().map(ToString::to_string).collect(),
        }
    }

    /// `System.Console`
    #[must_use]
    pub fn console() -> Self {
        Self::new(
            "console-access",
            HandleResult::DetectedConsoleAccess,
            &["System.Console"],
            &[],
        )
    }

    /// Direct file system access through `System.IO`
    #[must_use]
    pub fn filesystem() -> Self {
        Self::new(
            "filesystem-access",
            HandleResult::DetectedFilesystemAccess,
            &[
                "System.IO.File",
                "System.IO.FileInfo",
                "System.IO.Directory",
                "System.IO.DirectoryInfo",
                "System.IO.DriveInfo",
                "System.IO.FileSystemWatcher",
            ],
            &[],
        )
    }

    /// `System.Diagnostics.Process`
    #[must_use]
    pub fn shell() -> Self {
        Self::new(
            "shell-access",
            HandleResult::DetectedShellAccess,
            &["System.Diagnostics.Process"],
            &[],
        )
    }

    /// Anything in `System.Reflection`
    #[must_use]
    pub fn reflection() -> Self {
        Self::new(
            "reflection-access",
            HandleResult::DetectedReflectionAccess,
            &[],
            &["System.Reflection"],
        )
    }

    /// The `dynamic` keyword's runtime binder
    #[must_use]
    pub fn dynamic() -> Self {
        Self::new(
            "dynamic-access",
            HandleResult::DetectedDynamic,
            &[],
            &["Microsoft.CSharp.RuntimeBinder"],
        )
    }

    fn matches(&self, identity: &TypeIdentity) -> bool {
        let full_name = identity.full_name();
        self.types.iter().any(|ty| *ty == full_name)
            || self
                .namespaces
                .iter()
                .any(|namespace| identity.in_namespace(namespace))
    }
}

impl InstructionHandler for TypeFinder {
    fn name(&self) -> &'static str {
        self.name
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
            if self.matches(identity) {
                ctx.mark_flag(self.result, identity.full_name());
            }
        }
        None
    }
}
