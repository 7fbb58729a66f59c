// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # modscope
//!
//! A compatibility inspection and rewriting engine for game mod binaries.
//!
//! Before a mod compiled against an older host API is loaded, `modscope`
//! walks every type usage and instruction of its metadata, resolves each
//! reference against the host's reference assemblies and decides whether the
//! mod can load as-is, can be repaired in place, should be flagged for the
//! operator, or must be rejected.
//!
//! ## Features
//!
//! - **Reference resolution** - Fields, methods, properties and constructors are matched
//!   by name and signature, with base type lookup and a per-pass type cache
//! - **In-place repair** - Old call signatures are redirected to compatibility facades,
//!   renamed types and moved methods are rewritten, and fields which became
//!   properties are replaced with accessor calls
//! - **Detection** - Patching libraries, broken network code, opaque method bodies and,
//!   in paranoid mode, console, file system, process, reflection and `dynamic` usage
//! - **Parallel scanning** - Independent passes per module via `rayon`, sharing the
//!   read-only reference data
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use modscope::prelude::*;
//!
//! // The host API: `Host.Game` with a static `Exit()`
//! let mut host = ModuleBuilder::new("Game");
//! let game = host.define_type("Host", "Game", None, TypeFlags::PUBLIC);
//! host.define_method(
//!     game,
//!     "Exit",
//!     MemberSignature::method(TypeSig::Void, vec![]),
//!     MemberFlags::PUBLIC | MemberFlags::STATIC,
//!     None,
//! )?;
//! let references = ReferenceSet::from_modules([host.build()]);
//!
//! // A mod calling `Game.Quit()`, which the host does not have
//! let mut builder = ModuleBuilder::new("QuitMod");
//! let entry = builder.define_type("QuitMod", "ModEntry", None, TypeFlags::PUBLIC);
//! let quit = builder.member_ref(MemberDescriptor::static_method(
//!     TypeSig::named("Game", "Host", "Game"),
//!     "Quit",
//!     MemberSignature::method(TypeSig::Void, vec![]),
//! ));
//! builder.define_method(
//!     entry,
//!     "Run",
//!     MemberSignature::method(TypeSig::Void, vec![]),
//!     MemberFlags::PUBLIC | MemberFlags::STATIC,
//!     Some(MethodBodyBuilder::new().call(quit).ret().build()),
//! )?;
//! let mut module = builder.build();
//!
//! let engine = RuleEngine::new(
//!     EngineConfig::default(),
//!     Arc::new(references),
//!     Arc::new(FacadeRegistry::default()),
//! )?;
//! let verdict = engine.process(&mut module)?;
//!
//! assert_eq!(verdict.status(), VerdictStatus::Rejected);
//! assert_eq!(verdict.blocking_reasons(), vec!["reference to Game.Quit (no such method)"]);
//! # Ok::<(), modscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`metadata`] - The in-memory module model: types, members, instructions, tokens
//! - [`resolver`] - Host reference data and the per-pass resolver
//! - [`engine`] - The rule engine, handler trait and registry
//! - [`handlers`] - The standard finders and rewriters
//! - [`facades`] - Compatibility facade definitions and their synthetic module
//! - [`verdict`] - Findings and their aggregation into a load decision
//! - [`config`] - Engine configuration
//!
//! ## Logging
//!
//! The engine logs through the [`log`] facade: handler registration and
//! verdicts at `debug`, individual redirects at `trace`, and skipped dangling
//! tokens at `warn`. Install any logger implementation to see them.

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use modscope::prelude::*;
///
/// let config = EngineConfig::strict();
/// assert!(config.technical_details);
/// assert!(config.validates("Game"));
/// ```
pub mod prelude;

pub mod config;
pub mod engine;
pub mod facades;
pub mod handlers;
pub mod metadata;
pub mod resolver;
pub mod verdict;

/// `modscope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `modscope` Error type
///
/// Only construction-time misconfiguration and misuse of the engine are
/// errors. Broken references inside a mod are findings, never errors.
///
/// # Examples
///
/// ```rust
/// use modscope::{config::EngineConfig, Error};
///
/// let config = EngineConfig::builder().clear_validate_scopes().build();
/// assert!(matches!(config, Err(Error::Config { .. })));
/// ```
pub use error::Error;
