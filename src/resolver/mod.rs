//! Query phase: method sets and interface satisfaction over a finished graph.
//!
//! [`MethodSetResolver`] owns its [`TypeGraph`], so construction and querying
//! cannot overlap. All queries take `&self` and may run from many threads;
//! the only shared mutable state is the pair of insert-if-absent caches.

pub mod embedding;
pub mod interface;
pub mod method_set;

pub use embedding::{Contribution, EmbeddingResolver};
pub use interface::{
    build_interface_table, InterfaceMatcher, InterfaceRequirements, InterfaceTable, Unsatisfied,
};
pub use method_set::{Ambiguity, MethodSet, MethodSetBuilder, MethodSetEntry, ResolvedMethodSets};

use crate::config::ResolverConfig;
use crate::errors::{Error, Result};
use crate::graph::{GraphDocument, TypeGraph};
use crate::model::{QueryMode, TypeName};
use dashmap::DashMap;
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

type SatisfactionKey = (TypeName, QueryMode, TypeName);

/// One question for [`MethodSetResolver::satisfies_all`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SatisfactionQuery {
    pub candidate: TypeName,
    pub mode: QueryMode,
    pub interface: TypeName,
}

impl SatisfactionQuery {
    pub fn new(
        candidate: impl Into<TypeName>,
        mode: QueryMode,
        interface: impl Into<TypeName>,
    ) -> Self {
        Self {
            candidate: candidate.into(),
            mode,
            interface: interface.into(),
        }
    }
}

/// Snapshot of cache sizes and hit counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub method_set_entries: usize,
    pub method_set_hits: usize,
    pub method_set_misses: usize,
    pub satisfaction_entries: usize,
    pub satisfaction_hits: usize,
    pub satisfaction_misses: usize,
}

#[derive(Debug, Default)]
struct ResolverStats {
    method_set_hits: AtomicUsize,
    method_set_misses: AtomicUsize,
    satisfaction_hits: AtomicUsize,
    satisfaction_misses: AtomicUsize,
}

impl ResolverStats {
    fn record(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Debug)]
pub struct MethodSetResolver {
    graph: TypeGraph,
    config: ResolverConfig,
    interfaces: InterfaceTable,
    method_sets: DashMap<TypeName, Arc<ResolvedMethodSets>>,
    satisfaction: DashMap<SatisfactionKey, bool>,
    stats: ResolverStats,
}

impl MethodSetResolver {
    pub fn new(graph: TypeGraph) -> Result<Self> {
        Self::with_config(graph, ResolverConfig::default())
    }

    /// End the construction phase: validate the graph and flatten every
    /// interface before any query runs
    pub fn with_config(graph: TypeGraph, config: ResolverConfig) -> Result<Self> {
        graph.validate()?;
        let interfaces = build_interface_table(&graph)?;

        tracing::debug!(
            types = graph.len(),
            interfaces = interfaces.len(),
            policy = ?config.interface_embedding,
            "Method set resolver ready"
        );

        Ok(Self {
            graph,
            config,
            interfaces,
            method_sets: DashMap::new(),
            satisfaction: DashMap::new(),
            stats: ResolverStats::default(),
        })
    }

    pub fn from_document(document: GraphDocument, config: ResolverConfig) -> Result<Self> {
        Self::with_config(document.into_graph()?, config)
    }

    pub fn graph(&self) -> &TypeGraph {
        &self.graph
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Both method sets of `ty`, computed once and shared afterwards
    pub fn method_sets(&self, ty: &str) -> Result<Arc<ResolvedMethodSets>> {
        if let Some(cached) = self.method_sets.get(ty) {
            ResolverStats::record(&self.stats.method_set_hits);
            return Ok(Arc::clone(cached.value()));
        }

        let span = tracing::debug_span!("method_sets", ty);
        let _enter = span.enter();
        ResolverStats::record(&self.stats.method_set_misses);

        let decl = self.graph.lookup(ty)?;
        let contributions =
            EmbeddingResolver::new(&self.graph, &self.interfaces, self.config.interface_embedding)
                .collect_contributions(ty)?;
        let computed = Arc::new(MethodSetBuilder::build(&decl.name, &contributions));

        if !computed.ambiguities.is_empty() {
            tracing::debug!(
                ambiguous = computed.ambiguities.len(),
                "Excluded ambiguous promoted methods"
            );
        }

        // A racing thread may have stored an identical result first; keep it.
        let stored = self
            .method_sets
            .entry(decl.name.clone())
            .or_insert(computed);
        Ok(Arc::clone(stored.value()))
    }

    pub fn method_set(&self, ty: &str, mode: QueryMode) -> Result<MethodSet> {
        Ok(self.method_sets(ty)?.select(mode).clone())
    }

    /// Look up one method; an ambiguous name is an error, an absent one is `None`
    pub fn lookup_method(
        &self,
        ty: &str,
        mode: QueryMode,
        method: &str,
    ) -> Result<Option<MethodSetEntry>> {
        let sets = self.method_sets(ty)?;
        let entry = sets.select(mode).lookup(method)?;
        Ok(entry.cloned())
    }

    /// Flattened requirements of `interface`
    pub fn requirements(&self, interface: &str) -> Result<Arc<InterfaceRequirements>> {
        let decl = self.graph.lookup(interface)?;
        if !decl.is_interface() {
            return Err(Error::NotAnInterface {
                name: decl.name.clone(),
            });
        }
        self.interfaces
            .get(&decl.name)
            .cloned()
            .ok_or_else(|| Error::unknown_type(&decl.name))
    }

    /// Whether `candidate` in the given form provides every method `interface`
    /// requires. Ambiguous names count as absent.
    pub fn satisfies(&self, candidate: &str, mode: QueryMode, interface: &str) -> Result<bool> {
        let requirements = self.requirements(interface)?;
        let candidate_decl = self.graph.lookup(candidate)?;
        let key = (
            candidate_decl.name.clone(),
            mode,
            requirements.interface.clone(),
        );

        if self.config.memoize {
            if let Some(answer) = self.satisfaction.get(&key) {
                ResolverStats::record(&self.stats.satisfaction_hits);
                return Ok(*answer.value());
            }
        }
        ResolverStats::record(&self.stats.satisfaction_misses);

        let sets = self.method_sets(candidate)?;
        let answer = InterfaceMatcher::satisfies(sets.select(mode), &requirements);
        tracing::trace!(candidate, ?mode, interface, answer, "Checked satisfaction");

        if self.config.memoize {
            let stored = self.satisfaction.entry(key).or_insert(answer);
            return Ok(*stored.value());
        }
        Ok(answer)
    }

    /// Reasons `candidate` does not satisfy `interface`; empty when it does
    pub fn explain(
        &self,
        candidate: &str,
        mode: QueryMode,
        interface: &str,
    ) -> Result<Vec<Unsatisfied>> {
        let requirements = self.requirements(interface)?;
        let sets = self.method_sets(candidate)?;
        Ok(InterfaceMatcher::explain(&sets, mode, &requirements))
    }

    /// Names excluded from `ty`'s method sets because they are ambiguous
    pub fn describe_ambiguities(&self, ty: &str) -> Result<BTreeSet<String>> {
        Ok(self
            .method_sets(ty)?
            .ambiguities
            .iter()
            .map(|ambiguity| ambiguity.method.clone())
            .collect())
    }

    pub fn ambiguities(&self, ty: &str) -> Result<Vec<Ambiguity>> {
        Ok(self.method_sets(ty)?.ambiguities.clone())
    }

    /// Every concrete type satisfying `interface` in the given form, in
    /// declaration order
    pub fn implementors(&self, interface: &str, mode: QueryMode) -> Result<Vec<TypeName>> {
        self.requirements(interface)?;
        let candidates: Vec<&TypeName> = self
            .graph
            .iter()
            .filter(|decl| !decl.is_interface())
            .map(|decl| &decl.name)
            .collect();

        let check = |name: &&TypeName| -> Result<Option<TypeName>> {
            Ok(self
                .satisfies(name.as_str(), mode, interface)?
                .then(|| (*name).clone()))
        };

        let answers: Vec<Option<TypeName>> = if self.config.parallel {
            candidates.par_iter().map(check).collect::<Result<_>>()?
        } else {
            candidates.iter().map(check).collect::<Result<_>>()?
        };
        Ok(answers.into_iter().flatten().collect())
    }

    /// Answer many satisfaction queries; results line up with `queries`
    pub fn satisfies_all(&self, queries: &[SatisfactionQuery]) -> Result<Vec<bool>> {
        let span = tracing::debug_span!("satisfies_all", queries = queries.len());
        let _enter = span.enter();

        let check = |query: &SatisfactionQuery| {
            self.satisfies(
                query.candidate.as_str(),
                query.mode,
                query.interface.as_str(),
            )
        };

        if self.config.parallel {
            queries.par_iter().map(check).collect()
        } else {
            queries.iter().map(check).collect()
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            method_set_entries: self.method_sets.len(),
            method_set_hits: self.stats.method_set_hits.load(Ordering::Relaxed),
            method_set_misses: self.stats.method_set_misses.load(Ordering::Relaxed),
            satisfaction_entries: self.satisfaction.len(),
            satisfaction_hits: self.stats.satisfaction_hits.load(Ordering::Relaxed),
            satisfaction_misses: self.stats.satisfaction_misses.load(Ordering::Relaxed),
        }
    }

    /// Drop every cached answer and reset counters
    pub fn clear_caches(&self) {
        self.method_sets.clear();
        self.satisfaction.clear();
        for counter in [
            &self.stats.method_set_hits,
            &self.stats.method_set_misses,
            &self.stats.satisfaction_hits,
            &self.stats.satisfaction_misses,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}
