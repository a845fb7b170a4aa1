//! Embedding cycle detection
//!
//! A composite that embeds itself by value, directly or through other
//! composites, has no finite layout. Reference embedding breaks such a cycle
//! and is not walked here. Interface-to-interface embedding is walked too,
//! since an interface cannot include its own requirements.

use crate::errors::{Error, Result};
use crate::graph::TypeGraph;
use crate::model::{TypeDeclaration, TypeName};
use std::collections::HashSet;

/// Depth-first walker over by-value embedding edges.
///
/// Types whose whole subgraph has been explored are remembered as proven
/// acyclic, so a pass over every declaration walks each type once.
#[derive(Debug)]
pub struct CycleGuard<'g> {
    graph: &'g TypeGraph,
    proven: HashSet<TypeName>,
    cache_proofs: bool,
}

impl<'g> CycleGuard<'g> {
    /// A guard for a complete graph; proofs are cached across calls
    pub fn new(graph: &'g TypeGraph) -> Self {
        Self {
            graph,
            proven: HashSet::new(),
            cache_proofs: true,
        }
    }

    /// A guard for a graph still under construction.
    ///
    /// Forward references may be undeclared, so a type that looks acyclic now
    /// can still close a cycle later; nothing is cached.
    pub fn for_partial_graph(graph: &'g TypeGraph) -> Self {
        Self {
            graph,
            proven: HashSet::new(),
            cache_proofs: false,
        }
    }

    pub fn is_proven(&self, name: &str) -> bool {
        self.proven.contains(name)
    }

    /// Check that no by-value embedding path from `root` returns to a type on it
    pub fn check_acyclic(&mut self, root: &TypeName) -> Result<()> {
        let graph = self.graph;
        let root_decl = graph.lookup(root.as_str())?;
        self.check_declaration(root_decl)
    }

    /// Same as [`check_acyclic`](Self::check_acyclic) for a declaration that may
    /// not be registered yet
    pub fn check_declaration(&mut self, root: &TypeDeclaration) -> Result<()> {
        if self.proven.contains(&root.name) {
            return Ok(());
        }

        let graph = self.graph;
        let mut on_path: HashSet<TypeName> = HashSet::new();
        let mut path: Vec<TypeName> = Vec::new();
        // Explored within this walk; the graph cannot change mid-walk
        let mut finished: HashSet<TypeName> = HashSet::new();
        let mut stack: Vec<(&TypeDeclaration, bool)> = vec![(root, true)];

        while let Some((decl, is_entering)) = stack.pop() {
            if !is_entering {
                leave_node(&decl.name, &mut on_path, &mut path);
                finished.insert(decl.name.clone());
                if self.cache_proofs {
                    self.proven.insert(decl.name.clone());
                }
                continue;
            }

            if on_path.contains(&decl.name) {
                return Err(Error::EmbeddingCycle {
                    path: extract_cycle(&path, &decl.name),
                });
            }
            if finished.contains(&decl.name) || self.proven.contains(&decl.name) {
                continue;
            }

            enter_node(&decl.name, &mut on_path, &mut path);
            stack.push((decl, false));

            // Reversed so the first declared edge is explored first
            let next_decls: Vec<&TypeDeclaration> = successors(graph, root, decl).collect();
            for next in next_decls.into_iter().rev() {
                stack.push((next, true));
            }
        }

        Ok(())
    }
}

/// By-value embedded field types and embedded interfaces that are declared
/// (or are the root being checked)
fn successors<'a>(
    graph: &'a TypeGraph,
    root: &'a TypeDeclaration,
    decl: &'a TypeDeclaration,
) -> impl Iterator<Item = &'a TypeDeclaration> + 'a {
    let value_embeds = decl
        .embedded_fields()
        .filter(|field| field.is_value_embedding())
        .map(|field| &field.field_type);

    value_embeds
        .chain(decl.embedded_interfaces().iter())
        .filter_map(move |name| {
            if *name == root.name {
                Some(root)
            } else {
                graph.get(name.as_str())
            }
        })
}

fn enter_node(name: &TypeName, on_path: &mut HashSet<TypeName>, path: &mut Vec<TypeName>) {
    on_path.insert(name.clone());
    path.push(name.clone());
}

fn leave_node(name: &TypeName, on_path: &mut HashSet<TypeName>, path: &mut Vec<TypeName>) {
    path.pop();
    on_path.remove(name);
}

/// The cycle as a closed path, e.g. `a -> b -> a`
fn extract_cycle(path: &[TypeName], revisited: &TypeName) -> Vec<TypeName> {
    let start = path.iter().position(|n| n == revisited).unwrap_or(0);
    let mut cycle = path[start..].to_vec();
    cycle.push(revisited.clone());
    cycle
}
