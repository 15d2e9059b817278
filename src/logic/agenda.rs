//! Pending activations and conflict resolution.
//!
//! Ordering, applied until a total order is reached:
//! 1. salience, higher first
//! 2. rule declaration index, earlier first
//! 3. recency of supporting facts, newer first
//! 4. bindings, as a final deterministic tie break
//!
//! Fired activations are remembered by (rule, bindings, support). A rule can
//! fire again for the same bindings only when backed by different facts.

use super::bindings::Bindings;
use super::matcher::Match;
use crate::models::FactId;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    /// Declaration index of the rule in the engine's catalog
    pub rule: usize,
    pub salience: i32,
    pub bindings: Bindings,
    /// Supporting fact ids, ascending
    pub support: Vec<FactId>,
}

type ActivationKey = (usize, Bindings, Vec<FactId>);

impl Activation {
    pub fn from_match(rule: usize, salience: i32, m: Match) -> Self {
        Self {
            rule,
            salience,
            bindings: m.bindings,
            support: m.support.into_iter().collect(),
        }
    }

    fn key(&self) -> ActivationKey {
        (self.rule, self.bindings.clone(), self.support.clone())
    }

    /// Supporting ids newest first. Compared lexicographically, so an
    /// activation backed by a newer fact is the larger, and one with no
    /// supporting facts is the oldest of all.
    fn recency(&self) -> Vec<FactId> {
        self.support.iter().rev().copied().collect()
    }

    /// Conflict resolution order: `Less` fires first.
    pub fn priority_cmp(&self, other: &Self) -> Ordering {
        other
            .salience
            .cmp(&self.salience)
            .then_with(|| self.rule.cmp(&other.rule))
            .then_with(|| other.recency().cmp(&self.recency()))
            .then_with(|| self.bindings.cmp(&other.bindings))
    }
}

#[derive(Debug, Default)]
pub struct Agenda {
    pending: BTreeMap<usize, Vec<Activation>>,
    fired: BTreeSet<ActivationKey>,
}

impl Agenda {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the pending activations of one rule with a fresh match result,
    /// dropping any that have already fired.
    pub fn replace(&mut self, rule: usize, activations: Vec<Activation>) {
        let eligible: Vec<Activation> = activations
            .into_iter()
            .filter(|a| !self.fired.contains(&a.key()))
            .collect();

        if eligible.is_empty() {
            self.pending.remove(&rule);
        } else {
            self.pending.insert(rule, eligible);
        }
    }

    /// Remove and return the activation that should fire next, marking it fired.
    pub fn pop(&mut self) -> Option<Activation> {
        let (rule, index) = self
            .pending
            .iter()
            .flat_map(|(rule, acts)| acts.iter().enumerate().map(move |(i, a)| (*rule, i, a)))
            .min_by(|(_, _, a), (_, _, b)| a.priority_cmp(b))
            .map(|(rule, i, _)| (rule, i))?;

        let acts = self.pending.get_mut(&rule)?;
        let activation = acts.remove(index);
        if acts.is_empty() {
            self.pending.remove(&rule);
        }

        self.fired.insert(activation.key());
        Some(activation)
    }

    /// Undo a `pop` whose rule body failed, so the activation is pending again.
    pub fn restore(&mut self, activation: Activation) {
        self.fired.remove(&activation.key());
        self.pending
            .entry(activation.rule)
            .or_default()
            .push(activation);
    }

    /// Pending activations in firing order.
    pub fn ordered(&self) -> Vec<&Activation> {
        let mut all: Vec<&Activation> = self.pending.values().flatten().collect();
        all.sort_by(|a, b| a.priority_cmp(b));
        all
    }

    pub fn len(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn fired_count(&self) -> usize {
        self.fired.len()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.fired.clear();
    }
}
