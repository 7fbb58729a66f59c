//! Aggregation of handler findings into a per-module verdict.
//!
//! Handlers never fail a pass; they append [`Finding`]s to the pass context.
//! At the end of the pass the findings are rolled up into a single
//! [`VerdictStatus`] by severity, while every individual phrase is kept for
//! diagnostics.
//!
//! # Severity
//!
//! | Finding                         | Status                   |
//! |---------------------------------|--------------------------|
//! | `NotCompatible`                 | [`VerdictStatus::Rejected`] |
//! | detections, `NotVerified`       | [`VerdictStatus::Flagged`]  |
//! | `Rewritten`                     | [`VerdictStatus::Rewritten`] |
//! | none                            | [`VerdictStatus::Clean`]    |
//!
//! # Examples
//!
//! ```rust
//! use modscope::verdict::{Finding, HandleResult, Verdict, VerdictStatus};
//!
//! let verdict = Verdict::aggregate(
//!     "SpriteMod",
//!     vec![
//!         Finding::new(HandleResult::Rewritten, "redirected legacy Begin() call", "facade"),
//!         Finding::new(HandleResult::NotCompatible, "reference to Game.version (no such field)", "invalid member"),
//!     ],
//!     true,
//! );
//! assert_eq!(verdict.status(), VerdictStatus::Rejected);
//! assert_eq!(verdict.blocking_reasons(), vec!["reference to Game.version (no such field)"]);
//! ```

use std::fmt;

use strum::{Display, EnumIter, IntoEnumIterator};

use crate::metadata::ScanState;

/// Outcome of one handler on one reference or usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter)]
#[strum(serialize_all = "title_case")]
pub enum HandleResult {
    /// Nothing to report
    None,
    /// A reference was repaired
    Rewritten,
    /// The mod patches host code at runtime through a patching library
    DetectedGamePatchingLibrary,
    /// The mod uses network synchronization code which no longer matches
    DetectedIncompatibleNetworkCode,
    /// The mod references host API which does not exist
    NotCompatible,
    /// Part of the mod could not be inspected
    NotVerified,
    /// The mod writes to or reads from the console
    DetectedConsoleAccess,
    /// The mod accesses the filesystem directly
    DetectedFilesystemAccess,
    /// The mod starts external processes
    DetectedShellAccess,
    /// The mod uses reflection
    DetectedReflectionAccess,
    /// The mod uses dynamic binding
    DetectedDynamic,
}

impl HandleResult {
    /// Returns the verdict status this result escalates to.
    #[must_use]
    pub fn severity(&self) -> VerdictStatus {
        match self {
            HandleResult::None => VerdictStatus::Clean,
            HandleResult::Rewritten => VerdictStatus::Rewritten,
            HandleResult::NotCompatible => VerdictStatus::Rejected,
            _ => VerdictStatus::Flagged,
        }
    }

    /// Returns true for non-fatal detections
    #[must_use]
    pub fn is_detection(&self) -> bool {
        self.severity() == VerdictStatus::Flagged
    }
}

/// One finding: a result, its human-readable phrase and the handler which raised it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Finding {
    /// The result category
    pub result: HandleResult,
    /// Diagnostic phrase, used verbatim
    pub phrase: String,
    /// Name of the handler which raised the finding
    pub handler: &'static str,
}

impl Finding {
    /// Creates a new finding.
    pub fn new(result: HandleResult, phrase: impl Into<String>, handler: &'static str) -> Self {
        Finding {
            result,
            phrase: phrase.into(),
            handler,
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.result, self.phrase)
    }
}

/// Roll-up status of a module, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
pub enum VerdictStatus {
    /// Load unmodified
    Clean,
    /// Load the rewritten module
    Rewritten,
    /// Load with a warning
    Flagged,
    /// Refuse to load
    Rejected,
}

impl VerdictStatus {
    /// Returns true if the loader may load the module.
    ///
    /// # Arguments
    ///
    /// * `operator_override` - The operator allowed loading incompatible mods anyway
    #[must_use]
    pub fn allows_load(&self, operator_override: bool) -> bool {
        *self != VerdictStatus::Rejected || operator_override
    }

    /// Returns the terminal scan state matching this status
    #[must_use]
    pub fn scan_state(&self) -> ScanState {
        match self {
            VerdictStatus::Clean => ScanState::Clean,
            VerdictStatus::Rewritten => ScanState::Rewritten,
            VerdictStatus::Flagged => ScanState::Flagged,
            VerdictStatus::Rejected => ScanState::Rejected,
        }
    }
}

/// Rolls findings up into the most severe status present.
#[must_use]
pub fn aggregate(findings: &[Finding]) -> VerdictStatus {
    findings
        .iter()
        .map(|finding| finding.result.severity())
        .max()
        .unwrap_or(VerdictStatus::Clean)
}

/// The immutable result of one pass over one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    module: String,
    status: VerdictStatus,
    findings: Vec<Finding>,
    mutated: bool,
}

impl Verdict {
    /// Builds the verdict of a module from its findings.
    ///
    /// # Arguments
    ///
    /// * `module` - Name of the scanned module
    /// * `findings` - Every finding, in the order they were raised
    /// * `mutated` - Whether a rewriter changed the module
    pub fn aggregate(module: impl Into<String>, findings: Vec<Finding>, mutated: bool) -> Self {
        Verdict {
            module: module.into(),
            status: aggregate(&findings),
            findings,
            mutated,
        }
    }

    /// Returns the name of the scanned module
    #[must_use]
    pub fn module_name(&self) -> &str {
        &self.module
    }

    /// Returns the roll-up status
    #[must_use]
    pub fn status(&self) -> VerdictStatus {
        self.status
    }

    /// Returns every finding in the order it was raised
    #[must_use]
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Returns true if any finding has the given result
    #[must_use]
    pub fn has(&self, result: HandleResult) -> bool {
        self.findings.iter().any(|finding| finding.result == result)
    }

    /// Returns the phrases of all findings with the given result.
    #[must_use]
    pub fn phrases(&self, result: HandleResult) -> Vec<&str> {
        self.findings
            .iter()
            .filter(|finding| finding.result == result)
            .map(|finding| finding.phrase.as_str())
            .collect()
    }

    /// Returns what was rewritten
    #[must_use]
    pub fn rewrite_phrases(&self) -> Vec<&str> {
        self.phrases(HandleResult::Rewritten)
    }

    /// Returns why the module is rejected
    #[must_use]
    pub fn blocking_reasons(&self) -> Vec<&str> {
        self.phrases(HandleResult::NotCompatible)
    }

    /// Groups phrases by result, most severe categories first.
    #[must_use]
    pub fn summary(&self) -> Vec<(HandleResult, Vec<&str>)> {
        let mut groups: Vec<(HandleResult, Vec<&str>)> = HandleResult::iter()
            .filter(|result| *result != HandleResult::None)
            .map(|result| (result, self.phrases(result)))
            .filter(|(_, phrases)| !phrases.is_empty())
            .collect();
        groups.sort_by(|a, b| b.0.severity().cmp(&a.0.severity()));
        groups
    }

    /// Returns true if the rewritten module must be persisted instead of the original bytes
    #[must_use]
    pub fn should_persist(&self) -> bool {
        self.mutated
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.module, self.status)?;
        for (result, phrases) in self.summary() {
            write!(f, "\n  {result}: {}", phrases.join("; "))?;
        }
        Ok(())
    }
}
