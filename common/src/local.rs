use crate::encoder::Clue;
use crate::logic::{Literal, Variable, World};
use crate::store::{Deductions, Frontier, KnowledgeStore};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Per-clue possible-world groups.
///
/// Each revealed clue owns the disjunction of its consistent worlds. Facts
/// delete worlds, never add them, and a group that is down to one world is
/// consumed: every literal in it is forced.
///
/// Groups are never combined, so a contradiction that only appears when two
/// neighbourhoods are read together goes unnoticed here.
#[derive(Debug, Default)]
pub struct LocalKnowledge {
    groups: BTreeMap<Variable, Vec<World>>,
    /// Cell -> clue cells whose worlds mention it.
    watchers: HashMap<Variable, HashSet<Variable>>,
}

impl LocalKnowledge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining worlds for the clue at `cell`, if its group is still live.
    pub fn worlds(&self, cell: Variable) -> Option<&[World]> {
        self.groups.get(&cell).map(Vec::as_slice)
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn world_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn groups(&self) -> impl Iterator<Item = (Variable, &[World])> {
        self.groups.iter().map(|(&cell, worlds)| (cell, worlds.as_slice()))
    }
}

impl KnowledgeStore for LocalKnowledge {
    fn add_clue(&mut self, clue: &Clue) -> usize {
        if clue.neighbors().is_empty() {
            return 0;
        }
        if self.groups.contains_key(&clue.cell()) {
            tracing::warn!(cell = %clue.cell(), "clue already encoded");
            return 0;
        }

        let worlds: Vec<World> = clue.worlds().collect();
        for &neighbor in clue.neighbors() {
            self.watchers.entry(neighbor).or_default().insert(clue.cell());
        }
        let added = worlds.len();
        tracing::trace!(cell = %clue.cell(), worlds = added, "local group created");
        self.groups.insert(clue.cell(), worlds);
        added
    }

    fn learn_fact(&mut self, fact: Literal) -> usize {
        // A resolved cell can never appear in a later clue.
        let Some(clue_cells) = self.watchers.remove(&fact.variable()) else {
            return 0;
        };

        let mut purged = 0;
        for cell in clue_cells {
            let Some(worlds) = self.groups.get_mut(&cell) else {
                continue;
            };
            let before = worlds.len();
            worlds.retain(|world| !world.contradicts(fact));
            purged += before - worlds.len();

            if worlds.is_empty() {
                tracing::error!(clue = %cell, %fact, "every world of a clue was contradicted");
                self.groups.remove(&cell);
            }
        }
        purged
    }

    fn query(&mut self, _frontier: &Frontier) -> Deductions {
        let singletons: Vec<Variable> = self
            .groups
            .iter()
            .filter(|(_, worlds)| worlds.len() == 1)
            .map(|(&cell, _)| cell)
            .collect();

        let mut deductions = Deductions::default();
        for cell in singletons {
            if let Some(mut worlds) = self.groups.remove(&cell) {
                if let Some(world) = worlds.pop() {
                    deductions.facts.extend_from_slice(world.literals());
                }
            }
        }
        deductions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(id: u32) -> Variable {
        Variable::new(id)
    }

    fn clue(cell: u32, mines: usize, neighbors: &[u32]) -> Clue {
        Clue::new(var(cell), mines, neighbors.iter().map(|&id| var(id)).collect()).unwrap()
    }

    #[test]
    fn test_zero_clue_in_corner_is_immediately_forced() {
        let mut local = LocalKnowledge::new();
        // (0,0) on a 5x5 board with neighbours (1,0), (0,1), (1,1).
        assert_eq!(local.add_clue(&clue(1, 0, &[2, 6, 7])), 1);

        let deductions = local.query(&Frontier::default());
        let mut facts = deductions.facts;
        facts.sort();
        assert_eq!(facts, vec![var(2).safe(), var(6).safe(), var(7).safe()]);

        // The group was consumed.
        assert_eq!(local.group_count(), 0);
        assert!(local.query(&Frontier::default()).is_empty());
    }

    #[test]
    fn test_purge_removes_contradicting_worlds() {
        let mut local = LocalKnowledge::new();
        local.add_clue(&clue(10, 1, &[1, 2, 3]));
        local.add_clue(&clue(11, 2, &[2, 3, 4]));

        let purged = local.learn_fact(var(2).mine());
        // Clue 10 loses the two worlds with 2 safe, clue 11 loses one.
        assert_eq!(purged, 3);

        for (_, worlds) in local.groups() {
            assert!(worlds.iter().all(|w| !w.contradicts(var(2).mine())));
        }

        // Clue 10 is now a singleton: 2 is the mine, 1 and 3 are safe.
        let facts = local.query(&Frontier::default()).facts;
        assert!(facts.contains(&var(1).safe()));
        assert!(facts.contains(&var(3).safe()));
        assert!(facts.contains(&var(2).mine()));
    }

    #[test]
    fn test_unknown_cell_is_a_no_op() {
        let mut local = LocalKnowledge::new();
        local.add_clue(&clue(10, 1, &[1, 2]));
        assert_eq!(local.learn_fact(var(42).safe()), 0);
        assert_eq!(local.world_count(), 2);
    }

    #[test]
    fn test_cross_cell_pattern_is_invisible_locally() {
        let mut local = LocalKnowledge::new();
        // exactly 1 of {a, b}; exactly 2 of {a, b, c}
        local.add_clue(&clue(10, 1, &[1, 2]));
        local.add_clue(&clue(11, 2, &[1, 2, 3]));

        assert_eq!(local.worlds(var(10)).map(<[World]>::len), Some(2));
        assert_eq!(local.worlds(var(11)).map(<[World]>::len), Some(3));
        assert!(local.query(&Frontier::default()).is_empty());
    }

    #[test]
    fn test_groups_only_shrink() {
        let mut local = LocalKnowledge::new();
        local.add_clue(&clue(10, 2, &[1, 2, 3, 4]));
        let mut last = local.world_count();
        for fact in [var(1).safe(), var(4).safe(), var(1).safe()] {
            local.learn_fact(fact);
            assert!(local.world_count() <= last);
            last = local.world_count();
        }
        assert_eq!(local.worlds(var(10)).map(<[World]>::len), Some(1));
    }
}
