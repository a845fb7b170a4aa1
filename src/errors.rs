//! Shared error types for method-set resolution

use crate::model::TypeName;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for graph construction and method-set queries
#[derive(Debug, Error)]
pub enum Error {
    /// Two declarations share an identifier
    #[error("Duplicate identifier: `{name}` is already declared")]
    DuplicateIdentifier { name: TypeName },

    /// Lookup of an identifier that was never declared
    #[error("{}", unknown_type_message(.name, .referenced_by.as_ref()))]
    UnknownType {
        name: TypeName,
        referenced_by: Option<TypeName>,
    },

    /// By-value (or interface) embedding closes a cycle
    #[error("Embedding cycle: {}", format_path(.path))]
    EmbeddingCycle { path: Vec<TypeName> },

    /// Direct query of a method name excluded for ambiguity
    #[error(
        "Ambiguous method `{method}` on `{owner}`: promoted at depth {depth} from {}",
        join_names(.candidates)
    )]
    AmbiguousMethod {
        owner: TypeName,
        method: String,
        depth: usize,
        candidates: Vec<TypeName>,
    },

    /// A type declares, or an interface requires, the same method name twice
    #[error("Duplicate method `{method}` on `{owner}`")]
    DuplicateMethod { owner: TypeName, method: String },

    /// Embedded interfaces require the same name with different signatures
    #[error("Interface `{interface}` requires `{method}` with conflicting signatures")]
    ConflictingInterfaceMethod { interface: TypeName, method: String },

    /// A declaration is structurally invalid for where it is used
    #[error("Invalid declaration `{name}`: {message}")]
    InvalidDeclaration { name: TypeName, message: String },

    /// Satisfaction checked against a type that is not an interface
    #[error("`{name}` is not an interface")]
    NotAnInterface { name: TypeName },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Document loading errors with the offending path
    #[error("Document error in {}: {message}", .path.display())]
    Document { path: PathBuf, message: String },

    /// Generic errors with context
    #[error("{context}: {message}")]
    WithContext { context: String, message: String },

    /// Wrapped external errors
    #[error(transparent)]
    External(#[from] anyhow::Error),

    /// IO errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML errors
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

fn unknown_type_message(name: &TypeName, referenced_by: Option<&TypeName>) -> String {
    match referenced_by {
        Some(owner) => format!("Unknown type `{}` referenced by `{}`", name, owner),
        None => format!("Unknown type `{}`", name),
    }
}

fn format_path(path: &[TypeName]) -> String {
    path.iter()
        .map(|name| name.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn join_names(names: &[TypeName]) -> String {
    names
        .iter()
        .map(|name| format!("`{}`", name))
        .collect::<Vec<_>>()
        .join(", ")
}

impl Error {
    /// Create an unknown-type error for a bare lookup
    pub fn unknown_type(name: impl Into<TypeName>) -> Self {
        Self::UnknownType {
            name: name.into(),
            referenced_by: None,
        }
    }

    /// Create an unknown-type error for a reference from another declaration
    pub fn unknown_reference(name: impl Into<TypeName>, owner: impl Into<TypeName>) -> Self {
        Self::UnknownType {
            name: name.into(),
            referenced_by: Some(owner.into()),
        }
    }

    /// Create an invalid-declaration error
    pub fn invalid_declaration(name: impl Into<TypeName>, message: impl Into<String>) -> Self {
        Self::InvalidDeclaration {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            message: self.to_string(),
        }
    }

    /// Whether this error rejects graph construction (as opposed to a query failure)
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateIdentifier { .. }
                | Self::EmbeddingCycle { .. }
                | Self::DuplicateMethod { .. }
                | Self::ConflictingInterfaceMethod { .. }
                | Self::InvalidDeclaration { .. }
        )
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_cycle_message_shows_path() {
        let err = Error::EmbeddingCycle {
            path: vec!["node".into(), "link".into(), "node".into()],
        };
        assert_eq!(err.to_string(), "Embedding cycle: node -> link -> node");
        assert!(err.is_construction_error());
    }

    #[test]
    fn test_unknown_type_message_with_and_without_owner() {
        assert_eq!(
            Error::unknown_type("ghost").to_string(),
            "Unknown type `ghost`"
        );
        assert_eq!(
            Error::unknown_reference("ghost", "host").to_string(),
            "Unknown type `ghost` referenced by `host`"
        );
        assert!(!Error::unknown_type("ghost").is_construction_error());
    }

    #[test]
    fn test_ambiguous_method_lists_candidates() {
        let err = Error::AmbiguousMethod {
            owner: "pair".into(),
            method: "m".to_string(),
            depth: 1,
            candidates: vec!["left".into(), "right".into()],
        };
        assert_eq!(
            err.to_string(),
            "Ambiguous method `m` on `pair`: promoted at depth 1 from `left`, `right`"
        );
    }

    #[test]
    fn test_result_ext_adds_context() {
        let result: Result<()> = Err(Error::Configuration("bad value".to_string()));
        let err = result.context("loading .methodset.toml").unwrap_err();
        assert_eq!(
            err.to_string(),
            "loading .methodset.toml: Configuration error: bad value"
        );
    }
}
