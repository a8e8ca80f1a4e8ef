use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a whole [`TypeOracle::build`](crate::TypeOracle::build).
///
/// Ordinary source problems never surface here; they prune the affected
/// units and are reported through diagnostics instead.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("contract violation in {location}: {violation}")]
    Contract {
        location: String,
        #[source]
        violation: ContractViolation,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// The bytecode did not have the shape the collectors and resolvers rely on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractViolation {
    #[error("constructor {descriptor} of inner class {class} has no enclosing instance parameter")]
    MissingHiddenConstructorArg { class: String, descriptor: String },

    #[error(
        "parameter count of {class}.{method} differs between descriptor ({descriptor}) and signature ({signature})"
    )]
    ParameterCountMismatch {
        class: String,
        method: String,
        descriptor: String,
        signature: String,
    },

    #[error("unexpected inner class entry for {class} while classified as {kind}")]
    IllegalClassKindTransition { class: String, kind: &'static str },

    #[error("interface {class} declares superclass {superclass} in its signature")]
    InterfaceSuperclassNotObject { class: String, superclass: String },

    #[error("{generic} expects {expected} type arguments, got {actual}")]
    TypeArgumentArity {
        generic: String,
        expected: usize,
        actual: usize,
    },

    #[error("invalid method descriptor {descriptor} in {class}")]
    InvalidDescriptor { class: String, descriptor: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("type {name} not found")]
pub struct NotFound {
    pub name: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
}
