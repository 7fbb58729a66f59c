//! The standard finders and rewriters.
//!
//! Every handler implements [`crate::engine::InstructionHandler`] and is
//! registered by [`crate::engine::HandlerRegistry::standard`]. Finders only
//! record findings; rewriters repair references in place and record a
//! [`crate::verdict::HandleResult::Rewritten`] finding for each repair.
//!
//! # Finders
//!
//! - [`finders::ReferenceToInvalidMemberFinder`] - member references that do not resolve
//! - [`finders::ReferenceToMissingTypeFinder`] - type references that do not resolve
//! - [`finders::PatchingLibraryFinder`] - references to runtime patching libraries
//! - [`finders::NetworkCodeFinder`] - broken references into network code
//! - [`finders::UnverifiableBodyFinder`] - methods whose bodies cannot be inspected
//! - [`finders::TypeFinder`] - uses of sensitive APIs
//!
//! # Rewriters
//!
//! - [`rewriters::ReplaceReferencesRewriter`] - old call signatures to facades
//! - [`rewriters::TypeReferenceRewriter`] - renamed or moved types
//! - [`rewriters::MethodParentRewriter`] - static methods moved to another type
//! - [`rewriters::HeuristicFieldRewriter`] - fields turned into properties

pub mod finders;
pub(crate) mod helpers;
pub mod rewriters;
