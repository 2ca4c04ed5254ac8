//! celestecheck - semantic lints for Celeste mods.
//!
//! celestecheck inspects the program model a host compiler dumped for a
//! mod and reports misuse of the modding frameworks: MonoMod hooks that
//! are not static or drop `orig`, IL cursor calls that break other mods,
//! custom entities the level loader cannot construct, and tracker queries
//! against types the tracker never indexed.
//!
//! # Architecture
//!
//! - `model`: the read-only program model (syntax arena plus symbols)
//! - `detect`: diagnostic catalog, the rules and the event-driven runner
//! - `fix`: the static-qualifier code fix for `HooksShouldBeStatic`
//! - `config`: YAML configuration schema
//! - `report`: output formatting (pretty, JSON, SARIF)
//!
//! # Example
//!
//! ```no_run
//! use celestecheck::{Config, Program, Runner};
//!
//! let program = Program::load("Mod.model.json".as_ref())?;
//! let result = Runner::new(Config::default())?.run(&program);
//! for d in &result.diagnostics {
//!     println!("{} {} {}", d.location, d.id.code(), d.message);
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod cli;
pub mod config;
pub mod detect;
pub mod fix;
pub mod model;
pub mod report;

pub use config::Config;
pub use detect::{AnalysisResult, Catalog, Diagnostic, DiagnosticId, Runner, Severity};
pub use fix::{action_for, CodeAction, TextEdit};
pub use model::{ModelError, Program, ProgramBuilder};
