//! Declarative type model consumed by the resolver.
//!
//! Declarations are plain data: the surrounding tool builds them (or loads a
//! [`GraphDocument`](crate::graph::document::GraphDocument)) and hands them to a
//! [`TypeGraph`](crate::graph::TypeGraph). Nothing here knows about source text.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Identifier of a declared type, unique within one graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeName(String);

impl TypeName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for TypeName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TypeName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for TypeName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<&TypeName> for TypeName {
    fn from(name: &TypeName) -> Self {
        name.clone()
    }
}

/// How a method receives its receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Receiver {
    #[default]
    ByValue,
    ByReference,
}

/// Which form of a type a query is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    /// A value of the type
    AsValue,
    /// A reference to a value of the type
    AsReference,
}

/// Whether a field holds its type directly or through a reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indirection {
    #[default]
    Value,
    Reference,
}

/// Parameter and result types, compared nominally
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Signature {
    #[serde(default)]
    pub params: Vec<TypeName>,
    #[serde(default)]
    pub results: Vec<TypeName>,
}

impl Signature {
    pub fn new<P, R>(params: P, results: R) -> Self
    where
        P: IntoIterator,
        P::Item: Into<TypeName>,
        R: IntoIterator,
        R::Item: Into<TypeName>,
    {
        Self {
            params: params.into_iter().map(Into::into).collect(),
            results: results.into_iter().map(Into::into).collect(),
        }
    }

    /// A signature with no parameters and no results
    pub fn unit() -> Self {
        Self::default()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |names: &[TypeName]| {
            names
                .iter()
                .map(TypeName::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        };
        write!(f, "({})", join(&self.params))?;
        match self.results.len() {
            0 => Ok(()),
            1 => write!(f, " -> {}", self.results[0]),
            _ => write!(f, " -> ({})", join(&self.results)),
        }
    }
}

/// A method attached to a concrete type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodDeclaration {
    pub name: String,
    #[serde(default)]
    pub receiver: Receiver,
    #[serde(default)]
    pub signature: Signature,
}

impl MethodDeclaration {
    pub fn new(name: impl Into<String>, receiver: Receiver, signature: Signature) -> Self {
        Self {
            name: name.into(),
            receiver,
            signature,
        }
    }

    pub fn by_value(name: impl Into<String>, signature: Signature) -> Self {
        Self::new(name, Receiver::ByValue, signature)
    }

    pub fn by_reference(name: impl Into<String>, signature: Signature) -> Self {
        Self::new(name, Receiver::ByReference, signature)
    }
}

/// A method signature an interface requires
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequiredMethod {
    pub name: String,
    #[serde(default)]
    pub signature: Signature,
}

impl RequiredMethod {
    pub fn new(name: impl Into<String>, signature: Signature) -> Self {
        Self {
            name: name.into(),
            signature,
        }
    }
}

/// A field of a composite type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Field name; embedded fields may omit it
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub field_type: TypeName,
    #[serde(default)]
    pub embedded: bool,
    #[serde(default)]
    pub indirection: Indirection,
}

impl Field {
    pub fn named(name: impl Into<String>, field_type: impl Into<TypeName>) -> Self {
        Self {
            name: Some(name.into()),
            field_type: field_type.into(),
            embedded: false,
            indirection: Indirection::Value,
        }
    }

    pub fn embedded(field_type: impl Into<TypeName>, indirection: Indirection) -> Self {
        Self {
            name: None,
            field_type: field_type.into(),
            embedded: true,
            indirection,
        }
    }

    pub fn is_value_embedding(&self) -> bool {
        self.embedded && self.indirection == Indirection::Value
    }
}

/// Shape of a declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "form", rename_all = "snake_case")]
pub enum TypeKind {
    /// A named type over a primitive, e.g. a counter over an integer
    Primitive { underlying: String },
    Composite {
        #[serde(default)]
        fields: Vec<Field>,
    },
    Interface {
        #[serde(default)]
        required: Vec<RequiredMethod>,
        /// Interfaces whose requirements this one includes
        #[serde(default)]
        embeds: Vec<TypeName>,
    },
}

/// A declared type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDeclaration {
    pub name: TypeName,
    pub kind: TypeKind,
    #[serde(default)]
    pub methods: Vec<MethodDeclaration>,
}

impl TypeDeclaration {
    pub fn primitive(name: impl Into<TypeName>, underlying: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Primitive {
                underlying: underlying.into(),
            },
            methods: Vec::new(),
        }
    }

    pub fn composite(name: impl Into<TypeName>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Composite { fields: Vec::new() },
            methods: Vec::new(),
        }
    }

    pub fn interface(name: impl Into<TypeName>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Interface {
                required: Vec::new(),
                embeds: Vec::new(),
            },
            methods: Vec::new(),
        }
    }

    /// Append a field. Ignored on non-composite declarations.
    pub fn with_field(mut self, field: Field) -> Self {
        if let TypeKind::Composite { fields } = &mut self.kind {
            fields.push(field);
        }
        self
    }

    /// Embed `field_type` by value
    pub fn embed(self, field_type: impl Into<TypeName>) -> Self {
        self.with_field(Field::embedded(field_type, Indirection::Value))
    }

    /// Embed `field_type` through a reference
    pub fn embed_ref(self, field_type: impl Into<TypeName>) -> Self {
        self.with_field(Field::embedded(field_type, Indirection::Reference))
    }

    pub fn with_method(mut self, method: MethodDeclaration) -> Self {
        self.methods.push(method);
        self
    }

    /// Add a required method. Ignored on non-interface declarations.
    pub fn require(mut self, method: RequiredMethod) -> Self {
        if let TypeKind::Interface { required, .. } = &mut self.kind {
            required.push(method);
        }
        self
    }

    /// Include another interface's requirements. Ignored on non-interface declarations.
    pub fn embed_interface(mut self, interface: impl Into<TypeName>) -> Self {
        if let TypeKind::Interface { embeds, .. } = &mut self.kind {
            embeds.push(interface.into());
        }
        self
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.kind, TypeKind::Interface { .. })
    }

    pub fn fields(&self) -> &[Field] {
        match &self.kind {
            TypeKind::Composite { fields } => fields,
            _ => &[],
        }
    }

    /// Embedded fields in declaration order
    pub fn embedded_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields().iter().filter(|field| field.embedded)
    }

    /// Embedded interfaces, empty for concrete types
    pub fn embedded_interfaces(&self) -> &[TypeName] {
        match &self.kind {
            TypeKind::Interface { embeds, .. } => embeds,
            _ => &[],
        }
    }

    /// Every type this declaration references through a field or embedding
    pub fn referenced_types(&self) -> impl Iterator<Item = &TypeName> {
        self.fields()
            .iter()
            .map(|field| &field.field_type)
            .chain(self.embedded_interfaces().iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_display() {
        assert_eq!(Signature::unit().to_string(), "()");
        assert_eq!(
            Signature::new(["string"], ["string"]).to_string(),
            "(string) -> string"
        );
        assert_eq!(
            Signature::new(["int", "int"], ["int", "error"]).to_string(),
            "(int, int) -> (int, error)"
        );
    }

    #[test]
    fn test_builder_ignores_fields_on_interfaces() {
        let iface = TypeDeclaration::interface("reader").embed("buffer");
        assert!(iface.fields().is_empty());
        assert!(iface.is_interface());
    }

    #[test]
    fn test_embedded_fields_keep_declaration_order() {
        let decl = TypeDeclaration::composite("server")
            .with_field(Field::named("port", "int"))
            .embed("logger")
            .embed_ref("mux");

        let embedded: Vec<_> = decl
            .embedded_fields()
            .map(|f| (f.field_type.as_str(), f.indirection))
            .collect();
        assert_eq!(
            embedded,
            vec![
                ("logger", Indirection::Value),
                ("mux", Indirection::Reference)
            ]
        );
        assert_eq!(decl.referenced_types().count(), 3);
    }

    #[test]
    fn test_signatures_compare_nominally() {
        let a = Signature::new(["celsius"], Vec::<&str>::new());
        let b = Signature::new(["float64"], Vec::<&str>::new());
        assert_ne!(a, b);
        assert_eq!(a, Signature::new(["celsius"], Vec::<&str>::new()));
    }
}
