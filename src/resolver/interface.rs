//! Interface requirements and structural satisfaction.
//!
//! A type satisfies an interface when the selected method set holds every
//! required name with the exact same parameter and result types. Nothing
//! declares the relationship; it is checked on demand.

use crate::errors::{Error, Result};
use crate::graph::TypeGraph;
use crate::model::{QueryMode, RequiredMethod, Signature, TypeDeclaration, TypeKind, TypeName};
use crate::resolver::method_set::{MethodSet, ResolvedMethodSets};
use im::OrdMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Flattened requirements of one interface, including embedded interfaces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceRequirements {
    pub interface: TypeName,
    methods: OrdMap<String, RequiredMethod>,
}

impl InterfaceRequirements {
    pub fn get(&self, method: &str) -> Option<&RequiredMethod> {
        self.methods.get(method)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Required methods sorted by name
    pub fn iter(&self) -> impl Iterator<Item = &RequiredMethod> {
        self.methods.values()
    }
}

/// Requirements for every interface in a graph
pub type InterfaceTable = HashMap<TypeName, Arc<InterfaceRequirements>>;

/// Flatten every interface of a validated graph
pub fn build_interface_table(graph: &TypeGraph) -> Result<InterfaceTable> {
    let mut table = InterfaceTable::new();
    for decl in graph.interfaces() {
        flatten_interface(graph, decl, &mut table)?;
    }
    Ok(table)
}

/// Own requirements first, then embedded interfaces in declaration order.
/// A name required twice must carry the same signature both times.
fn flatten_interface(
    graph: &TypeGraph,
    decl: &TypeDeclaration,
    table: &mut InterfaceTable,
) -> Result<Arc<InterfaceRequirements>> {
    if let Some(done) = table.get(&decl.name) {
        return Ok(Arc::clone(done));
    }

    let (required, embeds) = match &decl.kind {
        TypeKind::Interface { required, embeds } => (required, embeds),
        _ => return Err(Error::NotAnInterface {
            name: decl.name.clone(),
        }),
    };

    let mut methods: OrdMap<String, RequiredMethod> = OrdMap::new();
    let mut merge = |method: &RequiredMethod| -> Result<()> {
        match methods.get(&method.name) {
            Some(existing) if existing.signature != method.signature => {
                Err(Error::ConflictingInterfaceMethod {
                    interface: decl.name.clone(),
                    method: method.name.clone(),
                })
            }
            Some(_) => Ok(()),
            None => {
                methods.insert(method.name.clone(), method.clone());
                Ok(())
            }
        }
    };

    for method in required {
        merge(method)?;
    }
    for embedded in embeds {
        let embedded_decl = graph.lookup(embedded.as_str())?;
        let nested = flatten_interface(graph, embedded_decl, table)?;
        for method in nested.iter() {
            merge(method)?;
        }
    }

    let requirements = Arc::new(InterfaceRequirements {
        interface: decl.name.clone(),
        methods,
    });
    table.insert(decl.name.clone(), Arc::clone(&requirements));
    Ok(requirements)
}

/// Why a type does not satisfy an interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unsatisfied {
    Missing {
        method: String,
    },
    Ambiguous {
        method: String,
        depth: usize,
        candidates: Vec<TypeName>,
    },
    SignatureMismatch {
        method: String,
        expected: Signature,
        found: Signature,
    },
    /// Present only on a reference because the receiver is by-reference
    ReferenceReceiverOnly {
        method: String,
    },
}

impl fmt::Display for Unsatisfied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { method } => write!(f, "missing method `{}`", method),
            Self::Ambiguous { method, depth, .. } => {
                write!(f, "method `{}` is ambiguous at depth {}", method, depth)
            }
            Self::SignatureMismatch {
                method,
                expected,
                found,
            } => write!(
                f,
                "method `{}` has signature {}, interface requires {}",
                method, found, expected
            ),
            Self::ReferenceReceiverOnly { method } => {
                write!(f, "method `{}` has a by-reference receiver", method)
            }
        }
    }
}

pub struct InterfaceMatcher;

impl InterfaceMatcher {
    /// Every requirement is present, unambiguous, and matches exactly
    pub fn satisfies(set: &MethodSet, requirements: &InterfaceRequirements) -> bool {
        requirements.iter().all(|required| {
            set.get(&required.name)
                .is_some_and(|entry| entry.method.signature == required.signature)
        })
    }

    /// Reasons the selected set falls short, in requirement order; empty when
    /// satisfied
    pub fn explain(
        sets: &ResolvedMethodSets,
        mode: QueryMode,
        requirements: &InterfaceRequirements,
    ) -> Vec<Unsatisfied> {
        let set = sets.select(mode);
        requirements
            .iter()
            .filter_map(|required| Self::explain_one(sets, set, mode, required))
            .collect()
    }

    fn explain_one(
        sets: &ResolvedMethodSets,
        set: &MethodSet,
        mode: QueryMode,
        required: &RequiredMethod,
    ) -> Option<Unsatisfied> {
        let method = required.name.clone();

        if let Some(ambiguity) = sets.ambiguities.iter().find(|a| a.method == method) {
            return Some(Unsatisfied::Ambiguous {
                method,
                depth: ambiguity.depth,
                candidates: ambiguity.candidates.clone(),
            });
        }

        match set.get(&method) {
            Some(entry) if entry.method.signature == required.signature => None,
            Some(entry) => Some(Unsatisfied::SignatureMismatch {
                method,
                expected: required.signature.clone(),
                found: entry.method.signature.clone(),
            }),
            None if mode == QueryMode::AsValue && sets.pointer.contains(&method) => {
                Some(Unsatisfied::ReferenceReceiverOnly { method })
            }
            None => Some(Unsatisfied::Missing { method }),
        }
    }
}
