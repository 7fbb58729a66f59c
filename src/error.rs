//! The crate-wide error type and its construction macro.

use thiserror::Error;

use crate::metadata::token::Token;

macro_rules! config_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Config {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Config {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which covers every error this library can return.
///
/// Findings about a mod binary (missing members, signature mismatches, detected
/// patching libraries, ...) are **never** reported through this type: they are
/// accumulated as [`crate::verdict::Finding`]s so that a single broken reference
/// cannot abort the scan of the rest of a module. `Error` is reserved for
/// setup-time misconfiguration and for contract violations by the caller.
///
/// # Error Categories
///
/// ## Setup Errors
/// - [`Error::Config`] - Invalid engine configuration (e.g. an empty validated-scope set)
/// - [`Error::FacadeDefinition`] - A compiled-in facade definition is inconsistent
///
/// ## Contract Errors
/// - [`Error::AlreadyScanned`] - A module was handed to the engine twice
/// - [`Error::InvalidToken`] - A token does not address an entry of the module arena
/// - [`Error::InvalidRewrite`] - A rewrite was refused because the new target does not type-check
///
/// # Examples
///
/// ```rust
/// use modscope::{config::EngineConfig, Error};
///
/// let config = EngineConfig::builder().clear_validate_scopes().build();
/// match config {
///     Err(Error::Config { message, .. }) => println!("bad config: {}", message),
///     Err(e) => println!("other error: {}", e),
///     Ok(_) => unreachable!(),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The engine configuration is invalid.
    ///
    /// Raised while building an [`crate::config::EngineConfig`] or a
    /// [`crate::engine::RuleEngine`]. The error includes the source location
    /// where the problem was detected.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of the misconfiguration
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Invalid configuration - {file}:{line}: {message}")]
    Config {
        /// The message to be printed for the Config error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// The module has already been scanned.
    ///
    /// A verdict is produced exactly once per module; to scan again the caller
    /// must discard the module and rebuild it from the original bytes.
    #[error("Module '{0}' has already been scanned")]
    AlreadyScanned(String),

    /// A facade definition is inconsistent.
    ///
    /// Covers duplicate facade identities, duplicate member shapes and
    /// forwarding targets which do not exist in the host reference set.
    #[error("Invalid facade definition - {0}")]
    FacadeDefinition(String),

    /// A token does not address an entry of the module.
    #[error("Token does not address a module entry - {0}")]
    InvalidToken(Token),

    /// A rewrite was refused.
    ///
    /// The redirected reference would not type-check against its new target,
    /// so the module was left untouched.
    #[error("Rewrite refused - {0}")]
    InvalidRewrite(String),
}
