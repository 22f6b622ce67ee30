use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Not;

/// The proposition "this cell is a mine".
///
/// Every cell on the board gets one id when the game starts and keeps it for
/// the whole game. Ids start at 1 so they can be handed to a SAT solver as
/// DIMACS variables: `id` means "is a mine", `-id` means "is safe".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Variable(u32);

impl Variable {
    /// Creates a variable from a non-zero id.
    pub fn new(id: u32) -> Self {
        debug_assert!(id != 0, "variable ids start at 1");
        Variable(id)
    }

    pub fn id(self) -> u32 {
        self.0
    }

    /// The literal asserting this cell holds a mine.
    pub fn mine(self) -> Literal {
        Literal::new(self, true)
    }

    /// The literal asserting this cell is safe.
    pub fn safe(self) -> Literal {
        Literal::new(self, false)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A variable together with an asserted truth value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Literal {
    variable: Variable,
    mine: bool,
}

impl Literal {
    pub fn new(variable: Variable, mine: bool) -> Self {
        Literal { variable, mine }
    }

    pub fn variable(self) -> Variable {
        self.variable
    }

    /// True when the literal asserts a mine, false when it asserts safety.
    pub fn is_mine(self) -> bool {
        self.mine
    }

    /// Signed integer form: positive id for a mine, negative id for safe.
    pub fn to_dimacs(self) -> isize {
        let id = self.variable.0 as isize;
        if self.mine { id } else { -id }
    }

    /// Inverse of [`Literal::to_dimacs`]. Returns `None` for zero.
    pub fn from_dimacs(value: isize) -> Option<Self> {
        if value == 0 {
            return None;
        }
        let id = u32::try_from(value.unsigned_abs()).ok()?;
        Some(Literal::new(Variable(id), value > 0))
    }
}

impl Not for Literal {
    type Output = Literal;

    fn not(self) -> Literal {
        Literal::new(self.variable, !self.mine)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.mine { "" } else { "-" };
        write!(f, "{}M{}", sign, self.variable)
    }
}

/// Outcome of fixing one variable in a clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assigned {
    /// The clause does not mention the variable.
    Untouched(Clause),
    /// The clause contains the established literal and is now trivially true.
    Satisfied,
    /// The clause contained the opposite literal, which has been removed.
    Reduced(Clause),
}

/// A CNF clause: the disjunction of its literals.
///
/// Literals are kept sorted and duplicates collapse on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Clause(Vec<Literal>);

impl Clause {
    pub fn new(literals: impl IntoIterator<Item = Literal>) -> Self {
        let mut literals: Vec<Literal> = literals.into_iter().collect();
        literals.sort_unstable();
        literals.dedup();
        Clause(literals)
    }

    pub fn unit(literal: Literal) -> Self {
        Clause(vec![literal])
    }

    pub fn literals(&self) -> &[Literal] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The single literal of a unit clause.
    pub fn as_unit(&self) -> Option<Literal> {
        match self.0.as_slice() {
            [literal] => Some(*literal),
            _ => None,
        }
    }

    pub fn contains(&self, literal: Literal) -> bool {
        self.0.binary_search(&literal).is_ok()
    }

    pub fn mentions(&self, variable: Variable) -> bool {
        self.contains(variable.mine()) || self.contains(variable.safe())
    }

    /// Evaluates the disjunction under a total assignment (`true` = mine).
    pub fn holds(&self, is_mine: impl Fn(Variable) -> bool) -> bool {
        self.0
            .iter()
            .any(|literal| is_mine(literal.variable) == literal.mine)
    }

    /// Simplifies the clause given that `fact` is now known to hold.
    pub fn assign(self, fact: Literal) -> Assigned {
        if self.contains(fact) {
            return Assigned::Satisfied;
        }
        let opposite = !fact;
        if !self.contains(opposite) {
            return Assigned::Untouched(self);
        }
        let Clause(mut literals) = self;
        literals.retain(|&literal| literal != opposite);
        Assigned::Reduced(Clause(literals))
    }

    pub fn to_dimacs(&self) -> Vec<isize> {
        self.0.iter().map(|literal| literal.to_dimacs()).collect()
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "()");
        }
        let parts: Vec<String> = self.0.iter().map(Literal::to_string).collect();
        write!(f, "({})", parts.join(" OR "))
    }
}

/// One complete candidate assignment for a neighbour set: the conjunction of
/// its literals, one per variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct World(Vec<Literal>);

impl World {
    pub fn new(literals: impl IntoIterator<Item = Literal>) -> Self {
        let mut literals: Vec<Literal> = literals.into_iter().collect();
        literals.sort_unstable_by_key(|literal| literal.variable);
        literals.dedup_by_key(|literal| literal.variable);
        World(literals)
    }

    pub fn literals(&self) -> &[Literal] {
        &self.0
    }

    /// The value this world gives to `variable`, if it mentions it.
    pub fn value_of(&self, variable: Variable) -> Option<bool> {
        self.0
            .binary_search_by_key(&variable, |literal| literal.variable)
            .ok()
            .map(|index| self.0[index].mine)
    }

    /// True when this world assigns the opposite polarity to the fact's cell.
    pub fn contradicts(&self, fact: Literal) -> bool {
        self.value_of(fact.variable) == Some(!fact.mine)
    }

    pub fn mine_count(&self) -> usize {
        self.0.iter().filter(|literal| literal.mine).count()
    }
}

impl fmt::Display for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(Literal::to_string).collect();
        write!(f, "[{}]", parts.join(" AND "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(id: u32) -> Variable {
        Variable::new(id)
    }

    #[test]
    fn test_literal_dimacs_round_trip() {
        assert_eq!(var(7).mine().to_dimacs(), 7);
        assert_eq!(var(7).safe().to_dimacs(), -7);
        assert_eq!(Literal::from_dimacs(-7), Some(var(7).safe()));
        assert_eq!(Literal::from_dimacs(0), None);
        assert_eq!(!var(3).mine(), var(3).safe());
    }

    #[test]
    fn test_clause_collapses_duplicates() {
        let clause = Clause::new([var(2).mine(), var(1).mine(), var(2).mine()]);
        assert_eq!(clause.len(), 2);
        assert_eq!(clause.literals(), &[var(1).mine(), var(2).mine()]);
        assert!(clause.mentions(var(2)));
        assert!(!clause.mentions(var(3)));
    }

    #[test]
    fn test_clause_assign() {
        let clause = Clause::new([var(1).mine(), var(2).safe()]);

        assert_eq!(clause.clone().assign(var(1).mine()), Assigned::Satisfied);
        assert_eq!(
            clause.clone().assign(var(1).safe()),
            Assigned::Reduced(Clause::unit(var(2).safe()))
        );
        assert_eq!(
            clause.clone().assign(var(3).mine()),
            Assigned::Untouched(clause)
        );
    }

    #[test]
    fn test_world_lookup() {
        let world = World::new([var(4).safe(), var(2).mine()]);
        assert_eq!(world.value_of(var(2)), Some(true));
        assert_eq!(world.value_of(var(4)), Some(false));
        assert_eq!(world.value_of(var(9)), None);
        assert!(world.contradicts(var(2).safe()));
        assert!(!world.contradicts(var(2).mine()));
        assert!(!world.contradicts(var(9).mine()));
        assert_eq!(world.mine_count(), 1);
    }
}
