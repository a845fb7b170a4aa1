//! Method-set resolution and structural interface satisfaction for a type
//! system with embedding.
//!
//! Build a [`TypeGraph`] from [`TypeDeclaration`]s (or load a
//! [`GraphDocument`]), then hand it to a [`MethodSetResolver`] to ask which
//! methods a value or a reference of a type carries and which interfaces it
//! satisfies.
//!
//! ```
//! use methodset::{
//!     MethodDeclaration, MethodSetResolver, QueryMode, RequiredMethod, Signature,
//!     TypeDeclaration, TypeGraph,
//! };
//!
//! let greet = Signature::new(["string"], ["string"]);
//! let mut graph = TypeGraph::new();
//! graph.register_interface(
//!     TypeDeclaration::interface("greeter").require(RequiredMethod::new("greet", greet.clone())),
//! )?;
//! graph.register_type(
//!     TypeDeclaration::composite("english").with_method(MethodDeclaration::by_value("greet", greet)),
//! )?;
//!
//! let resolver = MethodSetResolver::new(graph)?;
//! assert!(resolver.satisfies("english", QueryMode::AsValue, "greeter")?);
//! # Ok::<(), methodset::Error>(())
//! ```

pub mod config;
pub mod errors;
pub mod graph;
pub mod model;
pub mod resolver;

pub use crate::config::{load_config, InterfaceEmbedding, MethodSetConfig, ResolverConfig};
pub use crate::errors::{Error, Result, ResultExt};
pub use crate::graph::{GraphDocument, TypeGraph};
pub use crate::model::{
    Field, Indirection, MethodDeclaration, QueryMode, Receiver, RequiredMethod, Signature,
    TypeDeclaration, TypeKind, TypeName,
};
pub use crate::resolver::{
    Ambiguity, CacheStats, MethodSet, MethodSetEntry, MethodSetResolver, SatisfactionQuery,
    Unsatisfied,
};
