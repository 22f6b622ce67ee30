//! The capability set shared by both knowledge representations.

use crate::encoder::Clue;
use crate::logic::{Literal, Variable};

/// What a query is allowed to know about the current turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frontier {
    /// Covered, unflagged cells.
    pub unresolved: Vec<Variable>,
    /// Total mines minus flags and exploded mines.
    pub mines_remaining: usize,
}

/// Result of one query pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deductions {
    /// Literals the store has proven.
    pub facts: Vec<Literal>,
    /// Checks the oracle could not decide.
    pub inconclusive: usize,
    /// Cells for which both polarities were refuted.
    pub contradictions: Vec<Variable>,
}

impl Deductions {
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

/// An incrementally maintained constraint store.
///
/// Clues are added once, when revealed. Facts only ever shrink what the store
/// holds: after `learn_fact(l)` returns, nothing in the store may still assume
/// `!l`.
pub trait KnowledgeStore {
    /// Encodes a freshly revealed clue. Returns how many clauses or worlds were
    /// stored.
    fn add_clue(&mut self, clue: &Clue) -> usize;

    /// Records an established fact. Returns how many stored items the fact
    /// removed or simplified; zero when the store knows nothing about the cell.
    fn learn_fact(&mut self, fact: Literal) -> usize;

    /// Derives whatever facts this store can prove.
    fn query(&mut self, frontier: &Frontier) -> Deductions;
}
