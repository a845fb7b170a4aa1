//! Merging contributions into value and pointer method sets.
//!
//! Per method name only the contributions at the shallowest depth count. A
//! single survivor wins; several survivors, or one reached through more than
//! one field, make the name ambiguous and it is left out of both sets.

use crate::errors::{Error, Result};
use crate::model::{MethodDeclaration, QueryMode, Receiver, TypeName};
use crate::resolver::embedding::Contribution;
use im::{OrdMap, Vector};
use std::collections::HashMap;

/// A method usable through a method set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSetEntry {
    pub method: MethodDeclaration,
    /// Type that declares the method
    pub owner: TypeName,
    /// 0 when declared on the type itself
    pub depth: usize,
    pub path: Vector<TypeName>,
    pub indirect: bool,
}

impl MethodSetEntry {
    pub fn is_promoted(&self) -> bool {
        self.depth > 0
    }
}

/// A method name excluded because it is promoted from several places at
/// its shallowest depth
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ambiguity {
    pub method: String,
    pub depth: usize,
    /// Declaring types, one per contributing embedding path
    pub candidates: Vec<TypeName>,
}

/// Methods callable on one form (value or reference) of a type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSet {
    owner: TypeName,
    mode: QueryMode,
    entries: OrdMap<String, MethodSetEntry>,
    ambiguous: OrdMap<String, Ambiguity>,
}

impl MethodSet {
    fn empty(owner: TypeName, mode: QueryMode) -> Self {
        Self {
            owner,
            mode,
            entries: OrdMap::new(),
            ambiguous: OrdMap::new(),
        }
    }

    pub fn owner(&self) -> &TypeName {
        &self.owner
    }

    pub fn mode(&self) -> QueryMode {
        self.mode
    }

    pub fn get(&self, method: &str) -> Option<&MethodSetEntry> {
        self.entries.get(method)
    }

    /// Look up a method, failing if the name was excluded as ambiguous
    pub fn lookup(&self, method: &str) -> Result<Option<&MethodSetEntry>> {
        if let Some(ambiguity) = self.ambiguous.get(method) {
            return Err(Error::AmbiguousMethod {
                owner: self.owner.clone(),
                method: ambiguity.method.clone(),
                depth: ambiguity.depth,
                candidates: ambiguity.candidates.clone(),
            });
        }
        Ok(self.entries.get(method))
    }

    pub fn contains(&self, method: &str) -> bool {
        self.entries.contains_key(method)
    }

    pub fn is_ambiguous(&self, method: &str) -> bool {
        self.ambiguous.contains_key(method)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Method names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MethodSetEntry> {
        self.entries.values()
    }

    /// Every method here is also in `other` with the same declaration
    pub fn is_subset_of(&self, other: &MethodSet) -> bool {
        self.entries
            .iter()
            .all(|(name, entry)| other.entries.get(name) == Some(entry))
    }

    fn insert(&mut self, entry: MethodSetEntry) {
        self.entries.insert(entry.method.name.clone(), entry);
    }
}

/// Both method sets of one type plus the names excluded from them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMethodSets {
    pub value: MethodSet,
    pub pointer: MethodSet,
    pub ambiguities: Vec<Ambiguity>,
}

impl ResolvedMethodSets {
    pub fn select(&self, mode: QueryMode) -> &MethodSet {
        match mode {
            QueryMode::AsValue => &self.value,
            QueryMode::AsReference => &self.pointer,
        }
    }
}

pub struct MethodSetBuilder;

impl MethodSetBuilder {
    /// Merge depth-ordered contributions for `owner` into its method sets
    pub fn build(owner: &TypeName, contributions: &[Contribution]) -> ResolvedMethodSets {
        let mut value = MethodSet::empty(owner.clone(), QueryMode::AsValue);
        let mut pointer = MethodSet::empty(owner.clone(), QueryMode::AsReference);
        let mut ambiguities = Vec::new();

        for (name, survivors) in shallowest_by_name(contributions) {
            if let Some(ambiguity) = detect_ambiguity(name, &survivors) {
                value.ambiguous.insert(name.to_string(), ambiguity.clone());
                pointer.ambiguous.insert(name.to_string(), ambiguity.clone());
                ambiguities.push(ambiguity);
                continue;
            }

            let winner = survivors[0];
            let entry = MethodSetEntry {
                method: winner.method.clone(),
                owner: winner.owner.clone(),
                depth: winner.depth,
                path: winner.path.clone(),
                indirect: winner.indirect,
            };
            if visible_on_value(winner) {
                value.insert(entry.clone());
            }
            pointer.insert(entry);
        }

        ambiguities.sort_by(|a, b| a.method.cmp(&b.method));
        ResolvedMethodSets {
            value,
            pointer,
            ambiguities,
        }
    }
}

/// Group contributions by name, keeping only those at the name's minimum
/// depth. Names come out in first-seen order.
fn shallowest_by_name(contributions: &[Contribution]) -> Vec<(&str, Vec<&Contribution>)> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&Contribution>> = HashMap::new();

    for contribution in contributions {
        let name = contribution.method.name.as_str();
        let group = groups.entry(name).or_insert_with(|| {
            order.push(name);
            Vec::new()
        });

        match group.first().map(|c| c.depth) {
            Some(depth) if contribution.depth > depth => {}
            Some(depth) if contribution.depth < depth => {
                group.clear();
                group.push(contribution);
            }
            _ => group.push(contribution),
        }
    }

    order
        .into_iter()
        .filter_map(|name| groups.remove(name).map(|group| (name, group)))
        .collect()
}

fn detect_ambiguity(name: &str, survivors: &[&Contribution]) -> Option<Ambiguity> {
    let reached_twice = survivors.len() == 1 && survivors[0].multiples;
    if survivors.len() < 2 && !reached_twice {
        return None;
    }

    let mut candidates: Vec<TypeName> = survivors.iter().map(|c| c.owner.clone()).collect();
    if reached_twice {
        candidates.push(survivors[0].owner.clone());
    }

    Some(Ambiguity {
        method: name.to_string(),
        depth: survivors[0].depth,
        candidates,
    })
}

/// A value exposes by-value methods, plus by-reference methods whose
/// receiver is reached through an embedded reference
fn visible_on_value(contribution: &Contribution) -> bool {
    contribution.method.receiver == Receiver::ByValue || contribution.indirect
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Signature;
    use pretty_assertions::assert_eq;

    fn contribution(depth: usize, name: &str, receiver: Receiver, owner: &str) -> Contribution {
        Contribution {
            depth,
            method: MethodDeclaration::new(name, receiver, Signature::unit()),
            owner: owner.into(),
            path: Vector::new(),
            indirect: false,
            multiples: false,
        }
    }

    #[test]
    fn test_receiver_kind_partitions_sets() {
        let sets = MethodSetBuilder::build(
            &"file".into(),
            &[
                contribution(0, "name", Receiver::ByValue, "file"),
                contribution(0, "write", Receiver::ByReference, "file"),
            ],
        );

        assert_eq!(sets.value.names().collect::<Vec<_>>(), vec!["name"]);
        assert_eq!(
            sets.pointer.names().collect::<Vec<_>>(),
            vec!["name", "write"]
        );
        assert!(sets.value.is_subset_of(&sets.pointer));
    }

    #[test]
    fn test_shallower_contribution_shadows_deeper() {
        let sets = MethodSetBuilder::build(
            &"outer".into(),
            &[
                contribution(0, "run", Receiver::ByValue, "outer"),
                contribution(1, "run", Receiver::ByValue, "inner"),
            ],
        );

        let entry = sets.value.get("run").unwrap();
        assert_eq!(entry.owner.as_str(), "outer");
        assert_eq!(entry.depth, 0);
        assert!(sets.ambiguities.is_empty());
    }

    #[test]
    fn test_equal_depth_is_ambiguous_in_both_sets() {
        let sets = MethodSetBuilder::build(
            &"pair".into(),
            &[
                contribution(1, "m", Receiver::ByValue, "left"),
                contribution(1, "m", Receiver::ByReference, "right"),
                contribution(2, "m", Receiver::ByValue, "deep"),
            ],
        );

        assert!(!sets.value.contains("m"));
        assert!(!sets.pointer.contains("m"));
        assert_eq!(
            sets.ambiguities,
            vec![Ambiguity {
                method: "m".to_string(),
                depth: 1,
                candidates: vec!["left".into(), "right".into()],
            }]
        );
        assert!(matches!(
            sets.pointer.lookup("m"),
            Err(Error::AmbiguousMethod { depth: 1, .. })
        ));
    }

    #[test]
    fn test_multiples_flag_makes_single_survivor_ambiguous() {
        let mut reached_twice = contribution(2, "m", Receiver::ByValue, "base");
        reached_twice.multiples = true;

        let sets = MethodSetBuilder::build(&"diamond".into(), &[reached_twice]);
        assert!(sets.value.is_ambiguous("m"));
        assert_eq!(
            sets.ambiguities[0].candidates,
            vec![TypeName::from("base"), TypeName::from("base")]
        );
    }

    #[test]
    fn test_indirect_reference_method_visible_on_value() {
        let mut through_reference = contribution(1, "flush", Receiver::ByReference, "buffer");
        through_reference.indirect = true;

        let sets = MethodSetBuilder::build(
            &"writer".into(),
            &[
                through_reference,
                contribution(1, "reset", Receiver::ByReference, "state"),
            ],
        );

        assert!(sets.value.contains("flush"));
        assert!(!sets.value.contains("reset"));
        assert!(sets.pointer.contains("reset"));
    }

    #[test]
    fn test_lookup_absent_is_none() {
        let sets = MethodSetBuilder::build(&"empty".into(), &[]);
        assert!(sets.value.is_empty());
        assert_eq!(sets.select(QueryMode::AsReference).lookup("x").unwrap(), None);
        assert_eq!(sets.select(QueryMode::AsValue).mode(), QueryMode::AsValue);
    }

    #[test]
    fn test_shallowest_by_name_keeps_first_seen_order() {
        let contributions = [
            contribution(0, "b", Receiver::ByValue, "t"),
            contribution(0, "a", Receiver::ByValue, "t"),
            contribution(1, "b", Receiver::ByValue, "u"),
        ];
        let groups = shallowest_by_name(&contributions);

        let summary: Vec<_> = groups.iter().map(|(n, g)| (*n, g.len())).collect();
        assert_eq!(summary, vec![("b", 1), ("a", 1)]);
    }
}
