//! Incremental type oracle over compiled Java classes.
//!
//! A [`TypeOracle`] takes [`CompilationUnit`]s (the class files produced from
//! one source file), collects each class into a flat record, declares every
//! class of the build and then resolves generic signatures, members and
//! annotations into a [`TypeStore`](jtype_types::TypeStore).
//!
//! Rebuilding is incremental: re-adding a unit rebuilds it together with every
//! unit that references its types or inlined one of its constants. Units with
//! errors, and the units depending on them, are left out of the graph without
//! disturbing unrelated ones.

mod build;
pub mod collect;
mod config;
mod deps;
mod diagnostics;
mod error;
mod oracle;
mod resolve;
mod unit;

pub use crate::config::OracleConfig;
pub use crate::diagnostics::{DiagnosticSink, TracingSink};
pub use crate::error::{ConfigError, ContractViolation, NotFound, OracleError};
pub use crate::oracle::{BuildReport, TypeOracle, UnitStatus};
pub use crate::unit::{CompilationUnit, CompiledClass, MethodArgNames};
