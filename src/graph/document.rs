//! Serialized type graphs.
//!
//! A surrounding tool that already has its declarations as data can hand them
//! over as JSON or TOML instead of building them in code. Loading goes through
//! the same registration path, so the same construction errors apply.

use crate::errors::{Error, Result};
use crate::graph::TypeGraph;
use crate::model::TypeDeclaration;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A list of declarations in registration order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub types: Vec<TypeDeclaration>,
}

impl GraphDocument {
    pub fn from_json(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a document, choosing the format from the file extension
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read graph document {}", path.display()))?;

        let format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();

        let document = match format {
            "json" => Self::from_json(&contents),
            "toml" => Self::from_toml(&contents),
            other => Err(Error::Document {
                path: path.to_path_buf(),
                message: format!("unsupported document extension `{}`", other),
            }),
        }?;

        log::debug!(
            "Loaded {} declarations from {}",
            document.types.len(),
            path.display()
        );
        Ok(document)
    }

    /// Register every declaration, in order, into a fresh graph
    pub fn into_graph(self) -> Result<TypeGraph> {
        let mut graph = TypeGraph::new();
        for declaration in self.types {
            graph.declare(declaration)?;
        }
        Ok(graph)
    }
}

impl From<&TypeGraph> for GraphDocument {
    fn from(graph: &TypeGraph) -> Self {
        Self {
            types: graph.iter().cloned().collect(),
        }
    }
}
