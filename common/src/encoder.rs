//! Translation of numeric clues and mine counts into logical constraints.
//!
//! A clue "exactly `k` of these `n` cells are mines" has two encodings:
//!
//! * CNF mode: the at-least-`k` family (every `n - k + 1` subset holds a mine)
//!   plus the at-most-`k` family (every `k + 1` subset holds a safe cell).
//! * Possible-world mode: the `C(n, k)` complete assignments consistent with
//!   the clue.
//!
//! The board-wide "exactly `mines_remaining` of the unknown cells" constraint
//! reuses the CNF families, or optionally a sequential counter with auxiliary
//! variables.

use crate::combinatorics::{binomial, masks, subsets};
use crate::logic::{Clause, Literal, Variable, World};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("clue {clue} at cell {cell} is out of range for {neighbors} unknown neighbours")]
    ClueOutOfRange {
        cell: Variable,
        clue: i64,
        neighbors: usize,
    },
}

/// A revealed clue, restricted to the neighbours that were still unknown when
/// it was revealed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clue {
    cell: Variable,
    mines: usize,
    neighbors: Vec<Variable>,
}

impl Clue {
    /// Fails unless `mines <= neighbors.len()`.
    pub fn new(
        cell: Variable,
        mines: usize,
        neighbors: Vec<Variable>,
    ) -> Result<Self, EncodeError> {
        if mines > neighbors.len() {
            return Err(EncodeError::ClueOutOfRange {
                cell,
                clue: mines as i64,
                neighbors: neighbors.len(),
            });
        }
        Ok(Clue {
            cell,
            mines,
            neighbors,
        })
    }

    /// Builds a clue from the count shown on the board, discounting the
    /// neighbours already known to be mines.
    pub fn from_reveal(
        cell: Variable,
        shown: u8,
        known_mines: usize,
        neighbors: Vec<Variable>,
    ) -> Result<Self, EncodeError> {
        let remaining = i64::from(shown) - known_mines as i64;
        match usize::try_from(remaining) {
            Ok(mines) => Clue::new(cell, mines, neighbors),
            Err(_) => Err(EncodeError::ClueOutOfRange {
                cell,
                clue: remaining,
                neighbors: neighbors.len(),
            }),
        }
    }

    /// The clue-holding cell.
    pub fn cell(&self) -> Variable {
        self.cell
    }

    /// Mines among the unknown neighbours.
    pub fn mines(&self) -> usize {
        self.mines
    }

    pub fn neighbors(&self) -> &[Variable] {
        &self.neighbors
    }

    /// CNF mode.
    pub fn clauses(&self) -> impl Iterator<Item = Clause> + '_ {
        exactly(&self.neighbors, self.mines)
    }

    /// Possible-world mode.
    pub fn worlds(&self) -> impl Iterator<Item = World> + '_ {
        masks(self.neighbors.len(), self.mines).map(|mask| {
            World::new(
                self.neighbors
                    .iter()
                    .zip(mask)
                    .map(|(&variable, mine)| Literal::new(variable, mine)),
            )
        })
    }
}

/// "At least one of every `n - k + 1` cells is a mine".
pub fn at_least(vars: &[Variable], k: usize) -> impl Iterator<Item = Clause> + '_ {
    // k == 0 asks for subsets larger than the set: no clauses. k > n
    // collapses to the empty subset: one empty, unsatisfiable clause.
    let choose = (vars.len() + 1).saturating_sub(k);
    subsets(vars, choose).map(|combo| Clause::new(combo.into_iter().map(Variable::mine)))
}

/// "At least one of every `k + 1` cells is safe".
pub fn at_most(vars: &[Variable], k: usize) -> impl Iterator<Item = Clause> + '_ {
    subsets(vars, k + 1).map(|combo| Clause::new(combo.into_iter().map(Variable::safe)))
}

/// Both families: exactly `k` of `vars` are mines.
pub fn exactly(vars: &[Variable], k: usize) -> impl Iterator<Item = Clause> + '_ {
    at_least(vars, k).chain(at_most(vars, k))
}

/// Number of clauses [`exactly`] produces for `n` variables.
pub fn exactly_clause_count(n: usize, k: usize) -> u64 {
    binomial(n, (n + 1).saturating_sub(k)).saturating_add(binomial(n, k + 1))
}

/// How the board-wide mine count is turned into clauses.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum CardinalityEncoding {
    /// The same subset families as a clue. No auxiliary variables.
    #[default]
    Binomial,
    /// Sinz-style counter registers, quadratic in size.
    SequentialCounter,
}

/// Exactly `k` of `vars` are mines, using counter registers
/// `r(i, j) <=> at least j of vars[..=i] are mines` for `j` in `1..=k + 1`.
///
/// Auxiliary ids are taken from `first_aux` upward and must not collide with
/// any cell id.
pub fn sequential_counter(vars: &[Variable], k: usize, first_aux: u32) -> Vec<Clause> {
    let n = vars.len();
    if k > n {
        return vec![Clause::new(std::iter::empty())];
    }
    if k == 0 || k == n {
        return vars
            .iter()
            .map(|&v| Clause::unit(Literal::new(v, k == n)))
            .collect();
    }

    let width = k + 1;
    let reg = |i: usize, j: usize| -> Variable {
        Variable::new(first_aux + (i * width + (j - 1)) as u32)
    };
    let mut clauses = Vec::with_capacity(4 * n * width + 2);

    // Row 0: r(0, 1) <=> x0, every higher register is false.
    let x0 = vars[0].mine();
    clauses.push(Clause::new([!x0, reg(0, 1).mine()]));
    clauses.push(Clause::new([x0, reg(0, 1).safe()]));
    for j in 2..=width {
        clauses.push(Clause::unit(reg(0, j).safe()));
    }

    // r(i, j) <=> r(i-1, j) OR (x_i AND r(i-1, j-1))
    for (i, var) in vars.iter().enumerate().skip(1) {
        let x = var.mine();
        for j in 1..=width {
            let a = reg(i, j).mine();
            let b = reg(i - 1, j).mine();
            clauses.push(Clause::new([!b, a]));
            if j == 1 {
                clauses.push(Clause::new([!x, a]));
                clauses.push(Clause::new([!a, b, x]));
            } else {
                let d = reg(i - 1, j - 1).mine();
                clauses.push(Clause::new([!x, !d, a]));
                clauses.push(Clause::new([!a, b, x]));
                clauses.push(Clause::new([!a, b, d]));
            }
        }
    }

    clauses.push(Clause::unit(reg(n - 1, k).mine()));
    clauses.push(Clause::unit(reg(n - 1, k + 1).safe()));
    clauses
}

/// Auxiliary ids used by [`sequential_counter`] for these parameters.
pub fn sequential_counter_aux_count(n: usize, k: usize) -> usize {
    if k == 0 || k >= n { 0 } else { n * (k + 1) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{SatOracle, VarisatOracle, Verdict};
    use std::collections::HashSet;

    fn vars(n: usize) -> Vec<Variable> {
        (1..=n as u32).map(Variable::new).collect()
    }

    fn clue(n: usize, k: usize) -> Clue {
        Clue::new(Variable::new(100), k, vars(n)).unwrap()
    }

    #[test]
    fn test_cnf_matches_truth_table() {
        for n in 0..=8 {
            for k in 0..=n {
                let clauses: Vec<Clause> = clue(n, k).clauses().collect();
                assert_eq!(clauses.len() as u64, exactly_clause_count(n, k));

                for bits in 0u32..(1 << n) {
                    let is_mine = |v: Variable| bits & (1 << (v.id() - 1)) != 0;
                    let satisfied = clauses.iter().all(|c| c.holds(&is_mine));
                    assert_eq!(
                        satisfied,
                        bits.count_ones() as usize == k,
                        "n={n} k={k} bits={bits:b}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_worlds_enumerate_every_assignment() {
        for n in 0..=8 {
            for k in 0..=n {
                let worlds: Vec<World> = clue(n, k).worlds().collect();
                assert_eq!(worlds.len() as u64, binomial(n, k));

                let unique: HashSet<&World> = worlds.iter().collect();
                assert_eq!(unique.len(), worlds.len());

                for world in &worlds {
                    assert_eq!(world.literals().len(), n);
                    assert_eq!(world.mine_count(), k);
                }
            }
        }
    }

    #[test]
    fn test_zero_and_full_clues() {
        let zero: Vec<Clause> = clue(3, 0).clauses().collect();
        assert_eq!(zero.len(), 3);
        assert!(zero.iter().all(|c| c.as_unit().is_some_and(|l| !l.is_mine())));

        let full: Vec<Clause> = clue(3, 3).clauses().collect();
        assert_eq!(full.len(), 3);
        assert!(full.iter().all(|c| c.as_unit().is_some_and(|l| l.is_mine())));
    }

    #[test]
    fn test_out_of_range_clue_is_refused() {
        let err = Clue::new(Variable::new(9), 4, vars(3)).unwrap_err();
        assert_eq!(
            err,
            EncodeError::ClueOutOfRange {
                cell: Variable::new(9),
                clue: 4,
                neighbors: 3
            }
        );

        // Two flagged neighbours around a revealed 1.
        let err = Clue::from_reveal(Variable::new(9), 1, 2, vars(3)).unwrap_err();
        assert!(matches!(err, EncodeError::ClueOutOfRange { clue: -1, .. }));

        let ok = Clue::from_reveal(Variable::new(9), 3, 1, vars(3)).unwrap();
        assert_eq!(ok.mines(), 2);
    }

    #[test]
    fn test_sequential_counter_matches_truth_table() {
        for n in 0..=6 {
            for k in 0..=n {
                let cells = vars(n);
                let clauses = sequential_counter(&cells, k, n as u32 + 1);
                let mut oracle = VarisatOracle::default();
                oracle.load(clauses.iter());

                for bits in 0u32..(1 << n) {
                    let assumptions: Vec<Literal> = cells
                        .iter()
                        .map(|&v| Literal::new(v, bits & (1 << (v.id() - 1)) != 0))
                        .collect();
                    let verdict = oracle.check_all(&assumptions);
                    let expected = bits.count_ones() as usize == k;
                    assert_eq!(
                        matches!(verdict, Verdict::Satisfiable(_)),
                        expected,
                        "n={n} k={k} bits={bits:b}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_sequential_counter_aux_ids_stay_above_cells() {
        let cells = vars(5);
        let clauses = sequential_counter(&cells, 2, 6);
        let max = clauses
            .iter()
            .flat_map(|c| c.literals())
            .map(|l| l.variable().id())
            .max()
            .unwrap();
        assert_eq!(max as usize, 5 + sequential_counter_aux_count(5, 2));
    }
}
