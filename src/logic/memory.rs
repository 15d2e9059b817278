use crate::error::{AgriSenseError, Result};
use crate::models::{Fact, FactId, FactKind};
use std::collections::{BTreeMap, BTreeSet};

/// The fact base of one engine. Tracks which kinds changed since the
/// agenda was last refreshed.
#[derive(Debug, Clone, Default)]
pub struct WorkingMemory {
    facts: BTreeMap<FactId, Fact>,
    next_id: u64,
    dirty: BTreeSet<FactKind>,
}

impl WorkingMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and insert a fact. On error the fact base is unchanged.
    pub fn declare(&mut self, fact: Fact) -> Result<FactId> {
        fact.validate()?;

        let id = FactId(self.next_id);
        self.next_id += 1;
        self.dirty.insert(fact.kind());
        self.facts.insert(id, fact);
        Ok(id)
    }

    pub fn retract(&mut self, id: FactId) -> Result<Fact> {
        let fact = self
            .facts
            .remove(&id)
            .ok_or(AgriSenseError::UnknownFact(id))?;
        self.dirty.insert(fact.kind());
        Ok(fact)
    }

    pub fn get(&self, id: FactId) -> Option<&Fact> {
        self.facts.get(&id)
    }

    /// Live facts of one kind, oldest first.
    pub fn query(&self, kind: FactKind) -> impl Iterator<Item = (FactId, &Fact)> {
        self.facts
            .iter()
            .filter(move |(_, fact)| fact.kind() == kind)
            .map(|(id, fact)| (*id, fact))
    }

    pub fn iter(&self) -> impl Iterator<Item = (FactId, &Fact)> {
        self.facts.iter().map(|(id, fact)| (*id, fact))
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn dirty_kinds(&self) -> &BTreeSet<FactKind> {
        &self.dirty
    }

    pub fn clear_dirty(&mut self) {
        self.dirty.clear();
    }

    /// Drop every fact and restart identities from zero.
    pub fn clear(&mut self) {
        self.facts.clear();
        self.next_id = 0;
        self.dirty.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lab(n: i64) -> Fact {
        Fact::new(FactKind::Lab).with("N", n)
    }

    #[test]
    fn identities_are_monotonic_and_unique() {
        let mut wm = WorkingMemory::new();
        let a = wm.declare(lab(10)).unwrap();
        let b = wm.declare(lab(10)).unwrap();
        assert!(b > a);
        assert_eq!(wm.len(), 2);
    }

    #[test]
    fn retracted_identities_are_not_reused() {
        let mut wm = WorkingMemory::new();
        let a = wm.declare(lab(10)).unwrap();
        wm.retract(a).unwrap();
        let b = wm.declare(lab(10)).unwrap();
        assert_ne!(a, b);
        assert!(wm.get(a).is_none());
    }

    #[test]
    fn invalid_fact_leaves_memory_unchanged() {
        let mut wm = WorkingMemory::new();
        let bad = Fact::new(FactKind::Lab).with("N", "plenty");
        assert!(wm.declare(bad).is_err());
        assert!(wm.is_empty());
        assert!(wm.dirty_kinds().is_empty());
    }

    #[test]
    fn retracting_unknown_fact_fails() {
        let mut wm = WorkingMemory::new();
        assert!(matches!(
            wm.retract(FactId(7)),
            Err(AgriSenseError::UnknownFact(FactId(7)))
        ));
    }

    #[test]
    fn mutations_mark_kinds_dirty() {
        let mut wm = WorkingMemory::new();
        let id = wm.declare(lab(10)).unwrap();
        wm.declare(Fact::new(FactKind::Crop).with("name", "rice"))
            .unwrap();
        assert_eq!(wm.dirty_kinds().len(), 2);

        wm.clear_dirty();
        wm.retract(id).unwrap();
        assert!(wm.dirty_kinds().contains(&FactKind::Lab));
        assert_eq!(wm.dirty_kinds().len(), 1);
    }

    #[test]
    fn query_filters_by_kind_in_insertion_order() {
        let mut wm = WorkingMemory::new();
        let first = wm.declare(lab(1)).unwrap();
        wm.declare(Fact::new(FactKind::Crop).with("name", "rice"))
            .unwrap();
        let second = wm.declare(lab(2)).unwrap();

        let ids: Vec<FactId> = wm.query(FactKind::Lab).map(|(id, _)| id).collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[test]
    fn clear_restarts_identities() {
        let mut wm = WorkingMemory::new();
        wm.declare(lab(1)).unwrap();
        wm.clear();
        assert_eq!(wm.declare(lab(1)).unwrap(), FactId(0));
    }
}
