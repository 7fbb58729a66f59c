//! Read-only handlers which classify references and record findings.

mod invalid_member;
mod missing_type;
mod network_code;
mod patching_library;
mod type_finder;
mod unverifiable_body;

pub use invalid_member::ReferenceToInvalidMemberFinder;
pub use missing_type::ReferenceToMissingTypeFinder;
pub use network_code::NetworkCodeFinder;
pub use patching_library::PatchingLibraryFinder;
pub use type_finder::TypeFinder;
pub use unverifiable_body::UnverifiableBodyFinder;
