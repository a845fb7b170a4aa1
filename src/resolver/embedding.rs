//! Breadth-first collection of method contributions through embedded fields.
//!
//! Depth 0 is the root's own methods, depth 1 the methods declared directly
//! on the types it embeds, and so on. Promotion is decided once, from the
//! root, so a type's contribution is always its own declared methods and never
//! what was promoted into it.

use crate::config::InterfaceEmbedding;
use crate::errors::{Error, Result};
use crate::graph::TypeGraph;
use crate::model::{Indirection, MethodDeclaration, TypeDeclaration, TypeName};
use crate::resolver::interface::InterfaceTable;
use im::Vector;
use std::collections::{HashMap, HashSet};

/// One method found at one depth of the traversal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contribution {
    pub depth: usize,
    pub method: MethodDeclaration,
    /// Type that declares the method
    pub owner: TypeName,
    /// Embedded types walked from the root to `owner`; empty at depth 0
    pub path: Vector<TypeName>,
    /// The path passes through at least one reference embedding
    pub indirect: bool,
    /// `owner` was reached through more than one field at this depth
    pub multiples: bool,
}

/// A type waiting to be visited at the current depth
#[derive(Debug, Clone)]
struct FrontierEntry<'g> {
    decl: &'g TypeDeclaration,
    path: Vector<TypeName>,
    indirect: bool,
    multiples: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct EmbeddingResolver<'g> {
    graph: &'g TypeGraph,
    interfaces: &'g InterfaceTable,
    policy: InterfaceEmbedding,
}

impl<'g> EmbeddingResolver<'g> {
    pub fn new(
        graph: &'g TypeGraph,
        interfaces: &'g InterfaceTable,
        policy: InterfaceEmbedding,
    ) -> Self {
        Self {
            graph,
            interfaces,
            policy,
        }
    }

    /// Contributions ordered by depth, then by field declaration order.
    ///
    /// A type already visited at a shallower depth is neither re-emitted nor
    /// descended again, which bounds the walk even over reference cycles.
    pub fn collect_contributions(&self, root: &str) -> Result<Vec<Contribution>> {
        let root_decl = self.graph.lookup(root)?;

        let mut contributions = Vec::new();
        let mut seen: HashSet<TypeName> = HashSet::new();
        let mut current = vec![FrontierEntry {
            decl: root_decl,
            path: Vector::new(),
            indirect: false,
            multiples: false,
        }];
        let mut depth = 0;

        while !current.is_empty() {
            let mut next = Vec::new();

            for entry in consolidate(current) {
                if !seen.insert(entry.decl.name.clone()) {
                    continue;
                }

                if entry.decl.is_interface() {
                    self.visit_interface(&entry, depth, &mut contributions)?;
                    continue;
                }

                contributions.extend(entry.decl.methods.iter().map(|method| Contribution {
                    depth,
                    method: method.clone(),
                    owner: entry.decl.name.clone(),
                    path: entry.path.clone(),
                    indirect: entry.indirect,
                    multiples: entry.multiples,
                }));

                for field in entry.decl.embedded_fields() {
                    let embedded = self.graph.get(field.field_type.as_str()).ok_or_else(|| {
                        Error::unknown_reference(&field.field_type, &entry.decl.name)
                    })?;
                    let mut path = entry.path.clone();
                    path.push_back(field.field_type.clone());
                    next.push(FrontierEntry {
                        decl: embedded,
                        path,
                        indirect: entry.indirect || field.indirection == Indirection::Reference,
                        multiples: entry.multiples,
                    });
                }
            }

            current = next;
            depth += 1;
        }

        Ok(contributions)
    }

    /// An interface at the root contributes its requirements as its method
    /// set. Below the root it contributes only under the promote policy.
    fn visit_interface(
        &self,
        entry: &FrontierEntry<'g>,
        depth: usize,
        contributions: &mut Vec<Contribution>,
    ) -> Result<()> {
        if depth > 0 && self.policy == InterfaceEmbedding::Ignore {
            tracing::trace!(
                interface = %entry.decl.name,
                depth,
                "Skipping embedded interface"
            );
            return Ok(());
        }

        let requirements = self
            .interfaces
            .get(&entry.decl.name)
            .ok_or_else(|| Error::unknown_type(&entry.decl.name))?;

        contributions.extend(requirements.iter().map(|required| Contribution {
            depth,
            method: MethodDeclaration::by_value(&required.name, required.signature.clone()),
            owner: entry.decl.name.clone(),
            path: entry.path.clone(),
            indirect: entry.indirect,
            multiples: entry.multiples,
        }));
        Ok(())
    }
}

/// Merge entries for the same type at one depth, keeping the first and
/// flagging it as reached more than once
fn consolidate(entries: Vec<FrontierEntry<'_>>) -> Vec<FrontierEntry<'_>> {
    let mut index: HashMap<TypeName, usize> = HashMap::new();
    let mut merged: Vec<FrontierEntry<'_>> = Vec::with_capacity(entries.len());

    for entry in entries {
        match index.get(&entry.decl.name) {
            Some(&position) => merged[position].multiples = true,
            None => {
                index.insert(entry.decl.name.clone(), merged.len());
                merged.push(entry);
            }
        }
    }

    merged
}
