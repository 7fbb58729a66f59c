//! The rule engine and its handler infrastructure.
//!
//! The [`RuleEngine`] owns an ordered [`HandlerRegistry`] and drives one pass
//! per module, offering every type usage and instruction to every handler in
//! turn. Handlers implement [`InstructionHandler`] and record findings and
//! rewrites through the per-pass [`PassContext`].
//!
//! # Architecture
//!
//! ```text
//! Module ──► RuleEngine::process
//!              ├─ handle_module      (every handler, once)
//!              ├─ per type
//!              │    ├─ handle_type   (base type, member signatures)
//!              │    └─ per method body
//!              │         ├─ handle_type         (locals)
//!              │         └─ per instruction
//!              │              ├─ handle_type    (type operands, referenced members)
//!              │              └─ handle_instruction
//!              └─ Verdict::aggregate
//! ```

mod context;
mod handler;
mod registry;
mod rule_engine;

pub use context::PassContext;
pub use handler::{HandlerKind, InstructionHandler};
pub use registry::{HandlerRegistry, HandlerRegistryBuilder};
pub use rule_engine::RuleEngine;
