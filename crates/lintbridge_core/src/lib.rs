//! # lintbridge_core
//!
//! Runs an ESLint-compatible engine as a subprocess over in-memory
//! documents.
//!
//! This crate provides:
//! - The per-document session orchestrator ([`Linter`])
//! - The plugin gate and the `--stdin` lint invocation
//! - UTF-16 position mapping for engine locations
//! - The issue store and fix planning
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use lintbridge_core::{DocumentSnapshot, EngineSettings, Linter, Settings};
//!
//! let linter = Linter::new(Arc::new(Settings::new(EngineSettings::default())));
//! let snapshot = DocumentSnapshot::new("file:///src/app.js", "var a = 1;", "javascript")
//!     .with_path("/src/app.js");
//!
//! linter.start(snapshot, |result| match result {
//!     Ok(record) => println!("{} issues", record.diagnostics().len()),
//!     Err(e) => eprintln!("{e}"),
//! });
//! ```

mod cancel;
mod diagnostic;
mod document;
mod engine;
mod error;
mod fixer;
mod gate;
mod invoker;
pub mod position;
mod process;
mod session;
mod settings;
mod store;

#[cfg(all(test, unix))]
pub(crate) mod test_utils;

pub use cancel::{CancelSignal, Outcome};
pub use diagnostic::{
    EngineFix, EngineMessage, EngineResult, EngineSuggestion, LintDiagnostic, Severity,
};
pub use document::{DocumentId, DocumentSnapshot, LineEnding};
pub use engine::{Engine, EngineExit, required_plugin};
pub use error::LintError;
pub use fixer::{FixChoice, FixPlan, TextEdit, apply_edits, compute_edits, fix_choices};
pub use gate::{ConfigGate, EffectiveConfig, GateVerdict};
pub use invoker::LintInvoker;
pub use position::{OffsetRange, SourcePosition, to_range};
pub use session::{Linter, SessionHandle, SessionState};
pub use settings::{DEFAULT_MAX_OUTPUT_BYTES, EngineSettings, Settings, SharedSettings};
pub use store::{IssueStore, LintRecord};
