use crate::logic::{Clause, Literal};
use varisat::{CnfFormula, ExtendFormula, Lit, Solver};

/// Answer of a satisfiability check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// A model, as the literals it makes true.
    Satisfiable(Vec<Literal>),
    Unsatisfiable,
    /// The oracle gave up. Callers treat this as "no deduction".
    Unknown,
}

/// A SAT solver the global knowledge base can consult.
///
/// A clause set is loaded once and then checked under different assumptions,
/// which is the same as conjoining each assumption to a copy of the set.
pub trait SatOracle {
    /// Replaces any previously loaded clauses.
    fn load<'a, I>(&mut self, clauses: I)
    where
        I: IntoIterator<Item = &'a Clause>;

    /// Satisfiability of the loaded clauses conjoined with `assumptions`.
    fn check_all(&mut self, assumptions: &[Literal]) -> Verdict;

    fn check(&mut self, assumption: Literal) -> Verdict {
        self.check_all(&[assumption])
    }
}

/// [`SatOracle`] backed by `varisat`'s incremental solver.
pub struct VarisatOracle {
    solver: Solver<'static>,
}

impl Default for VarisatOracle {
    fn default() -> Self {
        VarisatOracle {
            solver: Solver::new(),
        }
    }
}

fn to_lit(literal: Literal) -> Lit {
    Lit::from_dimacs(literal.to_dimacs())
}

impl SatOracle for VarisatOracle {
    fn load<'a, I>(&mut self, clauses: I)
    where
        I: IntoIterator<Item = &'a Clause>,
    {
        // A fresh solver per load: learnt clauses from an older set must not leak.
        self.solver = Solver::new();

        let mut formula = CnfFormula::new();
        let mut lits: Vec<Lit> = Vec::new();
        for clause in clauses {
            lits.clear();
            lits.extend(clause.literals().iter().map(|&literal| to_lit(literal)));
            formula.add_clause(&lits);
        }
        self.solver.add_formula(&formula);
    }

    fn check_all(&mut self, assumptions: &[Literal]) -> Verdict {
        let lits: Vec<Lit> = assumptions.iter().map(|&literal| to_lit(literal)).collect();
        self.solver.assume(&lits);

        let verdict = match self.solver.solve() {
            Ok(true) => {
                let model = self
                    .solver
                    .model()
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|lit| Literal::from_dimacs(lit.to_dimacs()))
                    .collect();
                Verdict::Satisfiable(model)
            }
            Ok(false) => Verdict::Unsatisfiable,
            Err(err) => {
                tracing::warn!(error = %err, "sat oracle gave up");
                Verdict::Unknown
            }
        };

        // Assumptions are per check.
        self.solver.assume(&[]);
        verdict
    }
}
