use super::{catalog, Rule};
use crate::config::{Config, EngineConfig};
use crate::error::{AgriSenseError, Result};
use crate::logic::agenda::{Activation, Agenda};
use crate::logic::bindings::Bindings;
use crate::logic::condition::{Condition, PredicateRegistry};
use crate::logic::matcher::Matcher;
use crate::logic::memory::WorkingMemory;
use crate::models::{Fact, FactId, FactKind};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A rule with its condition built once at engine construction.
pub struct CompiledRule {
    rule: Box<dyn Rule>,
    condition: Condition,
    kinds: BTreeSet<FactKind>,
    salience: i32,
}

impl CompiledRule {
    fn compile(rule: Box<dyn Rule>) -> Self {
        let condition = rule.condition();
        let kinds = condition.kinds();
        let salience = rule.salience();
        Self {
            rule,
            condition,
            kinds,
            salience,
        }
    }

    fn id(&self) -> &'static str {
        self.rule.id()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EngineState {
    /// Freshly reset, no facts declared
    Idle,
    /// Facts declared, not yet run to quiescence
    Ready,
    Running,
    /// No activation left; `run` is a no-op until the fact base changes
    Quiescent,
}

impl EngineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineState::Idle => "idle",
            EngineState::Ready => "ready",
            EngineState::Running => "running",
            EngineState::Quiescent => "quiescent",
        }
    }
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry in the firing trace.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Firing {
    pub rule_id: &'static str,
    pub bindings: Bindings,
    pub support: Vec<FactId>,
    pub asserted: Vec<FactId>,
}

/// Forward-chaining engine over one working memory.
///
/// The compiled catalog and predicate registry are shared; facts, agenda and
/// firing trace belong to this instance alone.
pub struct RulesEngine {
    name: String,
    rules: Arc<[CompiledRule]>,
    predicates: Arc<PredicateRegistry>,
    memory: WorkingMemory,
    agenda: Agenda,
    state: EngineState,
    max_iterations: usize,
    firing_log: Vec<Firing>,
    // False until the first refresh has matched every rule, so rules that
    // only test for absence get a chance on an empty fact base.
    primed: bool,
}

impl RulesEngine {
    pub fn new(rules: Vec<Box<dyn Rule>>, config: &EngineConfig) -> Result<Self> {
        Self::with_predicates(rules, PredicateRegistry::new(), config)
    }

    /// Build an engine whose rules may reference the given named predicates.
    /// Every predicate a rule names must be registered.
    pub fn with_predicates(
        rules: Vec<Box<dyn Rule>>,
        predicates: PredicateRegistry,
        config: &EngineConfig,
    ) -> Result<Self> {
        if config.max_iterations == 0 {
            return Err(AgriSenseError::Config(
                "engine.max_iterations must be greater than zero".into(),
            ));
        }

        let compiled: Vec<CompiledRule> = rules.into_iter().map(CompiledRule::compile).collect();

        for rule in &compiled {
            if let Some(missing) = rule
                .condition
                .predicates()
                .into_iter()
                .find(|name| !predicates.contains(name))
            {
                return Err(AgriSenseError::UnknownPredicate(missing));
            }
        }

        Ok(Self {
            name: "agrisense".into(),
            rules: compiled.into(),
            predicates: Arc::new(predicates),
            memory: WorkingMemory::new(),
            agenda: Agenda::new(),
            state: EngineState::Idle,
            max_iterations: config.max_iterations,
            firing_log: Vec::new(),
            primed: false,
        })
    }

    /// Engine loaded with the standard diagnosis and fertilizer catalog.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(catalog(&config.thresholds), &config.engine)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// A fresh engine sharing this one's rules and predicates but none of its facts.
    pub fn clone_empty(&self) -> Self {
        Self {
            name: self.name.clone(),
            rules: Arc::clone(&self.rules),
            predicates: Arc::clone(&self.predicates),
            memory: WorkingMemory::new(),
            agenda: Agenda::new(),
            state: EngineState::Idle,
            max_iterations: self.max_iterations,
            firing_log: Vec::new(),
            primed: false,
        }
    }

    /// Discard all facts, pending activations and firing history.
    pub fn reset(&mut self) {
        self.memory.clear();
        self.agenda.clear();
        self.firing_log.clear();
        self.primed = false;
        self.state = EngineState::Idle;
    }

    pub fn declare(&mut self, fact: Fact) -> Result<FactId> {
        let id = self.memory.declare(fact)?;
        if self.state != EngineState::Running {
            self.state = EngineState::Ready;
        }
        Ok(id)
    }

    /// Remove a fact. Pending activations that depended on it are dropped at
    /// the next agenda refresh.
    pub fn retract(&mut self, id: FactId) -> Result<Fact> {
        let fact = self.memory.retract(id)?;
        if self.state != EngineState::Running {
            self.state = EngineState::Ready;
        }
        Ok(fact)
    }

    /// Fire activations until none remain. Returns the number fired.
    pub fn run(&mut self) -> Result<usize> {
        if self.state == EngineState::Quiescent {
            debug!(engine = %self.name, "Already quiescent, nothing to run");
            return Ok(0);
        }

        self.state = EngineState::Running;
        let result = self.run_to_fixpoint();
        self.state = match result {
            Ok(_) => EngineState::Quiescent,
            Err(_) => EngineState::Ready,
        };
        result
    }

    fn run_to_fixpoint(&mut self) -> Result<usize> {
        let mut fired = 0usize;

        loop {
            self.refresh_agenda()?;
            if self.agenda.is_empty() {
                break;
            }

            if fired >= self.max_iterations {
                warn!(
                    engine = %self.name,
                    limit = self.max_iterations,
                    pending = self.agenda.len(),
                    "Iteration cap reached before quiescence"
                );
                return Err(AgriSenseError::NonterminatingRuleSet {
                    rule_set: self.name.clone(),
                    limit: self.max_iterations,
                });
            }

            let Some(activation) = self.agenda.pop() else {
                break;
            };
            if let Err(e) = self.fire(activation.clone()) {
                warn!(engine = %self.name, error = %e, "Rule body failed");
                self.agenda.restore(activation);
                return Err(e);
            }
            fired += 1;
        }

        info!(
            engine = %self.name,
            fired,
            facts = self.memory.len(),
            "Run reached quiescence"
        );
        Ok(fired)
    }

    fn fire(&mut self, activation: Activation) -> Result<()> {
        let rule = &self.rules[activation.rule];
        let rule_id = rule.id();
        let produced = rule.rule.fire(&activation.bindings)?;

        // All or nothing: a bad fact from the body must not leave its siblings behind
        for fact in &produced {
            fact.validate()?;
        }

        let mut asserted = Vec::with_capacity(produced.len());
        for fact in produced {
            asserted.push(self.memory.declare(fact)?);
        }

        debug!(
            rule = rule_id,
            bindings = %activation.bindings,
            asserted = asserted.len(),
            "Fired activation"
        );

        self.firing_log.push(Firing {
            rule_id,
            bindings: activation.bindings,
            support: activation.support,
            asserted,
        });
        Ok(())
    }

    /// Re-match the rules that read a kind changed since the last refresh.
    ///
    /// Matches are staged first; if any rule's guard fails, the agenda and the
    /// dirty set are left exactly as they were.
    fn refresh_agenda(&mut self) -> Result<()> {
        let dirty = self.memory.dirty_kinds();
        let matcher = Matcher::new(&self.memory, &self.predicates);
        let mut staged: Vec<(usize, Vec<Activation>)> = Vec::new();

        for (index, rule) in self.rules.iter().enumerate() {
            if self.primed && rule.kinds.is_disjoint(dirty) {
                continue;
            }

            let matches = matcher.matches(&rule.condition).map_err(|reason| {
                warn!(rule = rule.id(), %reason, "Guard evaluation failed");
                AgriSenseError::GuardEvaluation {
                    rule: rule.id().to_string(),
                    reason,
                }
            })?;

            let activations = matches
                .into_iter()
                .map(|m| Activation::from_match(index, rule.salience, m))
                .collect();
            staged.push((index, activations));
        }

        debug!(rematched = staged.len(), "Agenda refreshed");

        for (index, activations) in staged {
            self.agenda.replace(index, activations);
        }
        self.memory.clear_dirty();
        self.primed = true;
        Ok(())
    }

    /// Live facts of one kind, oldest first.
    pub fn facts_of_kind(&self, kind: FactKind) -> Vec<&Fact> {
        self.memory.query(kind).map(|(_, fact)| fact).collect()
    }

    pub fn fact(&self, id: FactId) -> Option<&Fact> {
        self.memory.get(id)
    }

    pub fn fact_count(&self) -> usize {
        self.memory.len()
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn firing_log(&self) -> &[Firing] {
        &self.firing_log
    }

    /// Catalog entries as (id, name, salience), in declaration order.
    pub fn rules(&self) -> Vec<(&'static str, &'static str, i32)> {
        self.rules
            .iter()
            .map(|r| (r.rule.id(), r.rule.name(), r.salience))
            .collect()
    }

    pub fn agenda_len(&self) -> usize {
        self.agenda.len()
    }
}
