//! Registry of declared types.
//!
//! The graph is built once (construction phase) and then handed by value to a
//! [`MethodSetResolver`](crate::resolver::MethodSetResolver), which only reads
//! it. Each declaration is checked locally when it is registered; references
//! between declarations are checked by [`TypeGraph::validate`] once the graph
//! is complete, since forward references are allowed while building.

pub mod cycle_guard;
pub mod document;

pub use cycle_guard::CycleGuard;
pub use document::GraphDocument;

use crate::errors::{Error, Result};
use crate::model::{TypeDeclaration, TypeKind, TypeName};
use std::collections::{HashMap, HashSet};

/// All declared types, kept in declaration order
#[derive(Debug, Clone, Default)]
pub struct TypeGraph {
    types: HashMap<TypeName, TypeDeclaration>,
    order: Vec<TypeName>,
}

impl TypeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a declaration of any kind.
    ///
    /// Rejects a duplicate identifier, a malformed declaration, and a by-value
    /// embedding cycle closed by this declaration. A rejected declaration
    /// leaves the graph unchanged.
    pub fn declare(&mut self, declaration: TypeDeclaration) -> Result<()> {
        if self.types.contains_key(&declaration.name) {
            return Err(Error::DuplicateIdentifier {
                name: declaration.name,
            });
        }

        validate_declaration(&declaration)?;
        CycleGuard::for_partial_graph(self).check_declaration(&declaration)?;

        log::debug!("Declared type `{}`", declaration.name);
        self.order.push(declaration.name.clone());
        self.types.insert(declaration.name.clone(), declaration);
        Ok(())
    }

    /// Register a primitive-based or composite type
    pub fn register_type(&mut self, declaration: TypeDeclaration) -> Result<()> {
        if declaration.is_interface() {
            return Err(Error::invalid_declaration(
                declaration.name,
                "interfaces must be registered with register_interface",
            ));
        }
        self.declare(declaration)
    }

    /// Register an interface
    pub fn register_interface(&mut self, declaration: TypeDeclaration) -> Result<()> {
        if !declaration.is_interface() {
            return Err(Error::invalid_declaration(
                declaration.name,
                "only interfaces can be registered with register_interface",
            ));
        }
        self.declare(declaration)
    }

    pub fn lookup(&self, name: &str) -> Result<&TypeDeclaration> {
        self.types
            .get(name)
            .ok_or_else(|| Error::unknown_type(name))
    }

    pub fn get(&self, name: &str) -> Option<&TypeDeclaration> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Declarations in the order they were registered
    pub fn iter(&self) -> impl Iterator<Item = &TypeDeclaration> {
        self.order.iter().filter_map(|name| self.types.get(name))
    }

    /// Interface declarations in declaration order
    pub fn interfaces(&self) -> impl Iterator<Item = &TypeDeclaration> {
        self.iter().filter(|decl| decl.is_interface())
    }

    /// Check the complete graph before queries start.
    ///
    /// Every referenced type must be declared, interfaces may only embed
    /// interfaces, and no by-value or interface embedding cycle may exist.
    pub fn validate(&self) -> Result<()> {
        for decl in self.iter() {
            for referenced in decl.referenced_types() {
                if !self.contains(referenced.as_str()) {
                    return Err(Error::unknown_reference(referenced, &decl.name));
                }
            }
            for embedded in decl.embedded_interfaces() {
                if !self.lookup(embedded.as_str())?.is_interface() {
                    return Err(Error::invalid_declaration(
                        &decl.name,
                        format!("interface embeds non-interface `{}`", embedded),
                    ));
                }
            }
        }

        let mut guard = CycleGuard::new(self);
        for name in &self.order {
            guard.check_acyclic(name)?;
        }

        log::debug!("Validated type graph with {} declarations", self.len());
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn insert_unchecked(&mut self, declaration: TypeDeclaration) {
        self.order.push(declaration.name.clone());
        self.types.insert(declaration.name.clone(), declaration);
    }
}

/// Checks that need nothing but the declaration itself
fn validate_declaration(declaration: &TypeDeclaration) -> Result<()> {
    if declaration.name.as_str().is_empty() {
        return Err(Error::invalid_declaration(
            &declaration.name,
            "identifier must not be empty",
        ));
    }

    let mut seen = HashSet::new();
    match &declaration.kind {
        TypeKind::Interface { required, .. } => {
            if let Some(method) = declaration.methods.first() {
                return Err(Error::invalid_declaration(
                    &declaration.name,
                    format!("interfaces cannot declare method `{}`", method.name),
                ));
            }
            for method in required {
                if !seen.insert(method.name.as_str()) {
                    return Err(Error::DuplicateMethod {
                        owner: declaration.name.clone(),
                        method: method.name.clone(),
                    });
                }
            }
        }
        TypeKind::Primitive { .. } | TypeKind::Composite { .. } => {
            for method in &declaration.methods {
                if !seen.insert(method.name.as_str()) {
                    return Err(Error::DuplicateMethod {
                        owner: declaration.name.clone(),
                        method: method.name.clone(),
                    });
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MethodDeclaration, RequiredMethod, Signature};

    #[test]
    fn test_declare_and_lookup() {
        let mut graph = TypeGraph::new();
        graph
            .register_type(TypeDeclaration::primitive("celsius", "float64"))
            .unwrap();

        assert_eq!(graph.len(), 1);
        assert!(graph.contains("celsius"));
        assert_eq!(graph.lookup("celsius").unwrap().name.as_str(), "celsius");
    }

    #[test]
    fn test_duplicate_identifier_is_rejected() {
        let mut graph = TypeGraph::new();
        graph
            .register_type(TypeDeclaration::composite("point"))
            .unwrap();

        let err = graph
            .register_interface(TypeDeclaration::interface("point"))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateIdentifier { ref name } if name.as_str() == "point"));
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_lookup_unknown_type() {
        let graph = TypeGraph::new();
        assert!(matches!(
            graph.lookup("missing"),
            Err(Error::UnknownType { .. })
        ));
    }

    #[test]
    fn test_register_kind_mismatch() {
        let mut graph = TypeGraph::new();
        assert!(matches!(
            graph.register_type(TypeDeclaration::interface("stringer")),
            Err(Error::InvalidDeclaration { .. })
        ));
        assert!(matches!(
            graph.register_interface(TypeDeclaration::composite("buffer")),
            Err(Error::InvalidDeclaration { .. })
        ));
        assert!(graph.is_empty());
    }

    #[test]
    fn test_duplicate_method_is_rejected() {
        let mut graph = TypeGraph::new();
        let decl = TypeDeclaration::composite("file")
            .with_method(MethodDeclaration::by_value("close", Signature::unit()))
            .with_method(MethodDeclaration::by_reference("close", Signature::unit()));

        assert!(matches!(
            graph.register_type(decl),
            Err(Error::DuplicateMethod { .. })
        ));
    }

    #[test]
    fn test_interface_cannot_own_methods() {
        let mut graph = TypeGraph::new();
        let decl = TypeDeclaration::interface("closer")
            .with_method(MethodDeclaration::by_value("close", Signature::unit()));

        assert!(matches!(
            graph.register_interface(decl),
            Err(Error::InvalidDeclaration { .. })
        ));
    }

    #[test]
    fn test_value_self_embedding_fails_at_declaration() {
        let mut graph = TypeGraph::new();
        let err = graph
            .register_type(TypeDeclaration::composite("node").embed("node"))
            .unwrap_err();

        assert!(matches!(err, Error::EmbeddingCycle { .. }));
        assert!(!graph.contains("node"));
    }

    #[test]
    fn test_forward_reference_then_validate() {
        let mut graph = TypeGraph::new();
        graph
            .register_type(TypeDeclaration::composite("outer").embed("inner"))
            .unwrap();
        assert!(matches!(
            graph.validate(),
            Err(Error::UnknownType { ref referenced_by, .. })
                if referenced_by.as_ref().map(TypeName::as_str) == Some("outer")
        ));

        graph
            .register_type(TypeDeclaration::composite("inner"))
            .unwrap();
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_interface_embedding_non_interface_fails_validation() {
        let mut graph = TypeGraph::new();
        graph
            .register_type(TypeDeclaration::composite("buffer"))
            .unwrap();
        graph
            .register_interface(
                TypeDeclaration::interface("reader")
                    .require(RequiredMethod::new("read", Signature::unit()))
                    .embed_interface("buffer"),
            )
            .unwrap();

        assert!(matches!(
            graph.validate(),
            Err(Error::InvalidDeclaration { .. })
        ));
    }

    #[test]
    fn test_iteration_follows_declaration_order() {
        let mut graph = TypeGraph::new();
        for name in ["zeta", "alpha", "mid"] {
            graph
                .register_type(TypeDeclaration::composite(name))
                .unwrap();
        }
        let names: Vec<_> = graph.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }
}
