use crate::encoder::{CardinalityEncoding, Clue, exactly, exactly_clause_count, sequential_counter};
use crate::logic::{Assigned, Clause, Literal, Variable};
use crate::oracle::{SatOracle, VarisatOracle, Verdict};
use crate::store::{Deductions, Frontier, KnowledgeStore};
use std::collections::HashMap;

/// Default budget for a binomial cardinality set. Larger sets are encoded
/// with a sequential counter.
pub const DEFAULT_CARDINALITY_CLAUSE_LIMIT: u64 = 200_000;

/// Answer to an entailment query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entailment {
    /// The base conjoined with the negated goal is unsatisfiable.
    Entailed,
    /// A model exists in which the goal is false.
    NotEntailed,
    /// Nothing references the cell, or the oracle gave up.
    Indeterminate,
}

/// The whole-board clause set.
///
/// Clues are appended in CNF mode and each established fact is appended as a
/// unit clause, after which every other clause is simplified against it. The
/// board-wide mine count is never stored here: it is rebuilt from the current
/// frontier whenever the cardinality tier runs and dropped afterwards.
pub struct GlobalKnowledge<O = VarisatOracle> {
    clauses: Vec<Clause>,
    /// Variable -> number of stored clauses mentioning it.
    mentions: HashMap<Variable, usize>,
    facts: HashMap<Variable, bool>,
    oracle: O,
    encoding: CardinalityEncoding,
    clause_limit: Option<u64>,
    /// First id free for counter registers.
    first_aux: u32,
}

impl GlobalKnowledge<VarisatOracle> {
    /// A base for a board of `cell_count` cells, ids `1..=cell_count`.
    pub fn new(cell_count: usize) -> Self {
        Self::with_oracle(cell_count, VarisatOracle::default())
    }
}

impl<O: SatOracle> GlobalKnowledge<O> {
    pub fn with_oracle(cell_count: usize, oracle: O) -> Self {
        GlobalKnowledge {
            clauses: Vec::new(),
            mentions: HashMap::new(),
            facts: HashMap::new(),
            oracle,
            encoding: CardinalityEncoding::default(),
            clause_limit: Some(DEFAULT_CARDINALITY_CLAUSE_LIMIT),
            first_aux: cell_count as u32 + 1,
        }
    }

    /// Selects the cardinality encoding and the binomial clause budget.
    pub fn with_cardinality(mut self, encoding: CardinalityEncoding, limit: Option<u64>) -> Self {
        self.encoding = encoding;
        self.clause_limit = limit;
        self
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// True when some stored clause references `variable`.
    pub fn mentions(&self, variable: Variable) -> bool {
        self.mentions.contains_key(&variable)
    }

    /// The established value of `variable`, `true` for a mine.
    pub fn fact(&self, variable: Variable) -> Option<bool> {
        self.facts.get(&variable).copied()
    }

    fn push(&mut self, clause: Clause) {
        for literal in clause.literals() {
            *self.mentions.entry(literal.variable()).or_default() += 1;
        }
        self.clauses.push(clause);
    }

    fn forget(mentions: &mut HashMap<Variable, usize>, variable: Variable) {
        if let Some(count) = mentions.get_mut(&variable) {
            *count -= 1;
            if *count == 0 {
                mentions.remove(&variable);
            }
        }
    }

    /// Does the base force `goal`? Checks the base conjoined with `!goal`.
    pub fn entails(&mut self, goal: Literal) -> Entailment {
        if !self.mentions(goal.variable()) {
            return Entailment::Indeterminate;
        }
        self.oracle.load(self.clauses.iter());
        entailment(self.oracle.check(!goal))
    }

    /// Like [`GlobalKnowledge::entails`], with the base additionally conjoined
    /// to "exactly `mines_remaining` of the unresolved cells are mines".
    pub fn entails_with_cardinality(&mut self, goal: Literal, frontier: &Frontier) -> Entailment {
        if !frontier.unresolved.contains(&goal.variable()) && !self.mentions(goal.variable()) {
            return Entailment::Indeterminate;
        }
        let Some(cardinality) = self.cardinality(frontier) else {
            return Entailment::Indeterminate;
        };
        self.oracle.load(self.clauses.iter().chain(cardinality.iter()));
        entailment(self.oracle.check(!goal))
    }

    /// The cardinality tier: every unresolved cell, both polarities, against
    /// the base plus a freshly built mine-count constraint.
    pub fn query_with_cardinality(&mut self, frontier: &Frontier) -> Deductions {
        let Some(cardinality) = self.cardinality(frontier) else {
            return Deductions::default();
        };
        tracing::debug!(
            unknown = frontier.unresolved.len(),
            mines = frontier.mines_remaining,
            clauses = cardinality.len(),
            "cardinality constraint built"
        );
        self.oracle.load(self.clauses.iter().chain(cardinality.iter()));
        // Every unresolved cell appears in the cardinality set.
        let candidates = frontier.unresolved.clone();
        self.deduce(&candidates)
    }

    fn cardinality(&self, frontier: &Frontier) -> Option<Vec<Clause>> {
        let cells = &frontier.unresolved;
        let mines = frontier.mines_remaining;
        if cells.is_empty() {
            return None;
        }
        if mines > cells.len() {
            tracing::error!(
                mines,
                unknown = cells.len(),
                "more mines remaining than unknown cells"
            );
            return None;
        }

        match self.encoding {
            CardinalityEncoding::Binomial => {
                let size = exactly_clause_count(cells.len(), mines);
                match self.clause_limit {
                    Some(limit) if size > limit => {
                        tracing::debug!(size, limit, "binomial set over budget, using a counter");
                        Some(sequential_counter(cells, mines, self.first_aux))
                    }
                    _ => Some(exactly(cells, mines).collect()),
                }
            }
            CardinalityEncoding::SequentialCounter => {
                Some(sequential_counter(cells, mines, self.first_aux))
            }
        }
    }

    /// Checks both polarities of each candidate against the loaded clauses.
    fn deduce(&mut self, candidates: &[Variable]) -> Deductions {
        let mut deductions = Deductions::default();
        for &cell in candidates {
            let can_be_mine = self.oracle.check(cell.mine());
            let can_be_safe = self.oracle.check(cell.safe());

            if matches!(can_be_mine, Verdict::Unknown) || matches!(can_be_safe, Verdict::Unknown) {
                deductions.inconclusive += 1;
            }
            match (can_be_mine, can_be_safe) {
                (Verdict::Unsatisfiable, Verdict::Unsatisfiable) => {
                    tracing::error!(%cell, "both polarities refuted");
                    deductions.contradictions.push(cell);
                }
                (Verdict::Unsatisfiable, _) => deductions.facts.push(cell.safe()),
                (_, Verdict::Unsatisfiable) => deductions.facts.push(cell.mine()),
                _ => {}
            }
        }
        deductions
    }

    /// Double-queries every unresolved cell the base knows about. Returns the
    /// first cell for which both polarities are refuted.
    pub fn check_consistency(&mut self, frontier: &Frontier) -> Result<(), Variable> {
        let candidates: Vec<Variable> = frontier
            .unresolved
            .iter()
            .copied()
            .filter(|&cell| self.mentions(cell))
            .collect();
        if candidates.is_empty() {
            return Ok(());
        }
        self.oracle.load(self.clauses.iter());
        for cell in candidates {
            let mine = self.oracle.check(cell.mine());
            let safe = self.oracle.check(cell.safe());
            if mine == Verdict::Unsatisfiable && safe == Verdict::Unsatisfiable {
                return Err(cell);
            }
        }
        Ok(())
    }
}

fn entailment(verdict: Verdict) -> Entailment {
    match verdict {
        Verdict::Unsatisfiable => Entailment::Entailed,
        Verdict::Satisfiable(_) => Entailment::NotEntailed,
        Verdict::Unknown => Entailment::Indeterminate,
    }
}

impl<O: SatOracle> KnowledgeStore for GlobalKnowledge<O> {
    fn add_clue(&mut self, clue: &Clue) -> usize {
        let before = self.clauses.len();
        for clause in clue.clauses() {
            self.push(clause);
        }
        let added = self.clauses.len() - before;
        tracing::trace!(cell = %clue.cell(), clauses = added, "clue encoded");
        added
    }

    fn learn_fact(&mut self, fact: Literal) -> usize {
        let variable = fact.variable();
        if let Some(known) = self.facts.get(&variable) {
            if *known != fact.is_mine() {
                tracing::error!(%fact, "fact contradicts an established fact");
            }
            return 0;
        }
        self.facts.insert(variable, fact.is_mine());

        let mut touched = 0;
        if self.mentions(variable) {
            let clauses = std::mem::take(&mut self.clauses);
            let mut kept = Vec::with_capacity(clauses.len());
            for clause in clauses {
                if clause.contains(fact) {
                    for literal in clause.literals() {
                        Self::forget(&mut self.mentions, literal.variable());
                    }
                    touched += 1;
                    continue;
                }
                match clause.assign(fact) {
                    Assigned::Untouched(clause) => kept.push(clause),
                    Assigned::Reduced(clause) => {
                        Self::forget(&mut self.mentions, variable);
                        touched += 1;
                        if clause.is_empty() {
                            tracing::error!(%fact, "fact falsified a clause");
                        }
                        kept.push(clause);
                    }
                    Assigned::Satisfied => touched += 1,
                }
            }
            self.clauses = kept;
        }

        self.push(Clause::unit(fact));
        tracing::trace!(%fact, touched, remaining = self.clauses.len(), "base simplified");
        touched
    }

    fn query(&mut self, frontier: &Frontier) -> Deductions {
        let candidates: Vec<Variable> = frontier
            .unresolved
            .iter()
            .copied()
            .filter(|&cell| self.mentions(cell))
            .collect();
        if candidates.is_empty() {
            return Deductions::default();
        }
        self.oracle.load(self.clauses.iter());
        self.deduce(&candidates)
    }
}
