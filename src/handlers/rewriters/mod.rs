//! Mutating handlers which repair references in place.
//!
//! A rewriter only touches a reference the host no longer satisfies, and only
//! through [`crate::engine::PassContext::redirect_member`] or a returned type
//! replacement, so a repaired instruction always resolves afterwards.

mod heuristic_field;
mod method_parent;
mod replace_references;
mod type_reference;

pub use heuristic_field::HeuristicFieldRewriter;
pub use method_parent::MethodParentRewriter;
pub use replace_references::ReplaceReferencesRewriter;
pub use type_reference::TypeReferenceRewriter;
