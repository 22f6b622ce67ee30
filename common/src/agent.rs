use crate::board::{Board, Point, Reveal, Score, neighbors};
use crate::encoder::{CardinalityEncoding, Clue, EncodeError};
use crate::global::{DEFAULT_CARDINALITY_CLAUSE_LIMIT, GlobalKnowledge};
use crate::local::LocalKnowledge;
use crate::logic::{Literal, Variable};
use crate::oracle::{SatOracle, VarisatOracle};
use crate::store::{Deductions, Frontier, KnowledgeStore};
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// What the agent has inferred about a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Safety {
    #[default]
    Unknown,
    Safe,
    Mine,
}

/// The agent's public view of one cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellState {
    pub id: Variable,
    pub covered: bool,
    pub flagged: bool,
    /// The count shown when the cell was revealed, if any was given.
    pub clue: Option<u8>,
    pub safety: Safety,
}

impl CellState {
    fn new(id: Variable) -> Self {
        CellState {
            id,
            covered: true,
            flagged: false,
            clue: None,
            safety: Safety::Unknown,
        }
    }

    /// Covered and unflagged.
    pub fn is_unknown(&self) -> bool {
        self.covered && !self.flagged
    }
}

/// Rungs of the reasoning ladder, cheapest first.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
pub enum Tier {
    /// Singleton possible-world groups.
    Local,
    /// Satisfiability queries over the whole-board clause set.
    Global,
    /// Global queries plus the board-wide mine count.
    #[default]
    Cardinality,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Local, Tier::Global, Tier::Cardinality];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Highest tier the ladder may climb to before guessing.
    pub max_tier: Tier,
    /// First cell revealed. Not counted as a forced guess.
    pub opening: Option<Point>,
    pub cardinality: CardinalityEncoding,
    /// Largest binomial cardinality set to build. Larger sets are encoded with
    /// a sequential counter instead.
    pub cardinality_clause_limit: Option<u64>,
    /// Double-query every unresolved cell after each global tier.
    pub check_consistency: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            max_tier: Tier::default(),
            opening: Some(Point::new(0, 0)),
            cardinality: CardinalityEncoding::default(),
            cardinality_clause_limit: Some(DEFAULT_CARDINALITY_CLAUSE_LIMIT),
            check_consistency: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error("knowledge base refutes both polarities of ({}, {})", .cell.x, .cell.y)]
    Inconsistent { cell: Point },
    #[error("invalid agent configuration: {0}")]
    InvalidConfig(String),
}

/// Deductions made per tier over a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TierCounts {
    pub local: usize,
    pub global: usize,
    pub cardinality: usize,
}

impl TierCounts {
    fn add(&mut self, tier: Tier, marked: usize) {
        match tier {
            Tier::Local => self.local += marked,
            Tier::Global => self.global += marked,
            Tier::Cardinality => self.cardinality += marked,
        }
    }
}

/// Summary of a finished (or abandoned) game.
///
/// Only integer fields, so the report can be `bcs`-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameReport {
    pub score: Option<Score>,
    pub forced_guesses: usize,
    pub mines_hit: usize,
    pub moves: usize,
    pub deductions: TierCounts,
}

impl GameReport {
    /// The score's value, zero if the game did not finish.
    pub fn score_value(&self) -> f64 {
        self.score.map_or(0.0, |score| score.value())
    }

    /// Encodes the report as bytes.
    pub fn serialize(&self) -> Result<Vec<u8>, bcs::Error> {
        bcs::to_bytes(self)
    }

    /// Decodes a report produced by [`GameReport::serialize`].
    pub fn deserialize(bts: &[u8]) -> Result<Self, bcs::Error> {
        bcs::from_bytes(bts)
    }
}

/// What one call to [`Agent::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Pending facts were acted on.
    Propagated(usize),
    /// A tier marked this many cells.
    Deduced { tier: Tier, marked: usize },
    /// Nothing could be proven; a random cell was revealed.
    Guessed(Point),
    Finished,
}

/// Borrowed view of the agent's cells, for rendering.
pub struct Snapshot<'a> {
    pub dim: usize,
    pub cells: &'a [CellState],
}

impl fmt::Display for Snapshot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "   ")?;
        for x in 0..self.dim {
            write!(f, "{:^3}", x)?;
        }
        writeln!(f, "\n  +{}", "---".repeat(self.dim))?;

        for (y, row) in self.cells.chunks(self.dim.max(1)).enumerate() {
            write!(f, "{:^2}|", y)?;
            for cell in row {
                let display = match cell {
                    CellState { flagged: true, .. } => " F ".to_string(),
                    CellState { covered: true, .. } => " ■ ".to_string(),
                    CellState { clue: Some(n), .. } => format!(" {} ", n),
                    CellState { safety: Safety::Mine, .. } => " * ".to_string(),
                    _ => " ? ".to_string(),
                };
                write!(f, "{}", display)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

type Redraw = Box<dyn FnMut(Snapshot<'_>)>;

/// The inference loop.
///
/// Owns both knowledge stores and is the only component that talks to the
/// board. Each turn climbs the ladder: act on pending facts, then singleton
/// worlds, then global entailment, then global entailment with the mine count,
/// and only then a random reveal.
pub struct Agent<B, R, O = VarisatOracle> {
    board: B,
    rng: R,
    config: AgentConfig,
    dim: usize,
    total_mines: usize,
    cells: Vec<CellState>,
    local: LocalKnowledge,
    global: GlobalKnowledge<O>,
    flags: usize,
    mines_hit: usize,
    forced_guesses: usize,
    moves: usize,
    deductions: TierCounts,
    finished: bool,
    redraw: Option<Redraw>,
}

impl<B: Board, R: Rng> Agent<B, R, VarisatOracle> {
    pub fn new(board: B, rng: R, config: AgentConfig) -> Result<Self, AgentError> {
        Self::with_oracle(board, rng, config, VarisatOracle::default())
    }
}

impl<B: Board, R: Rng, O: SatOracle> Agent<B, R, O> {
    pub fn with_oracle(
        board: B,
        rng: R,
        config: AgentConfig,
        oracle: O,
    ) -> Result<Self, AgentError> {
        let dim = board.dim();
        if dim == 0 {
            return Err(AgentError::InvalidConfig("board has no cells".into()));
        }
        if let Some(opening) = config.opening {
            if opening.x >= dim || opening.y >= dim {
                return Err(AgentError::InvalidConfig(format!(
                    "opening ({}, {}) is outside a {dim}x{dim} board",
                    opening.x, opening.y
                )));
            }
        }

        let cell_count = dim * dim;
        let cells = (1..=cell_count as u32)
            .map(|id| CellState::new(Variable::new(id)))
            .collect();
        let global = GlobalKnowledge::with_oracle(cell_count, oracle)
            .with_cardinality(config.cardinality, config.cardinality_clause_limit);

        Ok(Agent {
            total_mines: board.mine_count(),
            board,
            rng,
            config,
            dim,
            cells,
            local: LocalKnowledge::new(),
            global,
            flags: 0,
            mines_hit: 0,
            forced_guesses: 0,
            moves: 0,
            deductions: TierCounts::default(),
            finished: false,
            redraw: None,
        })
    }

    /// Called after every board action. Not awaited.
    pub fn on_redraw(&mut self, redraw: impl FnMut(Snapshot<'_>) + 'static) {
        self.redraw = Some(Box::new(redraw));
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    pub fn cells(&self) -> &[CellState] {
        &self.cells
    }

    /// `None` outside the board.
    pub fn cell(&self, at: Point) -> Option<&CellState> {
        self.index(at).map(|index| &self.cells[index])
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            dim: self.dim,
            cells: &self.cells,
        }
    }

    pub fn local(&self) -> &LocalKnowledge {
        &self.local
    }

    pub fn global(&self) -> &GlobalKnowledge<O> {
        &self.global
    }

    pub fn forced_guesses(&self) -> usize {
        self.forced_guesses
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn index(&self, at: Point) -> Option<usize> {
        (at.x < self.dim && at.y < self.dim).then(|| at.y * self.dim + at.x)
    }

    fn point(&self, variable: Variable) -> Option<Point> {
        let index = (variable.id() as usize).checked_sub(1)?;
        (index < self.cells.len()).then(|| Point::new(index % self.dim, index / self.dim))
    }

    /// Plays until every cell is flagged or revealed.
    pub fn solve(&mut self) -> Result<GameReport, AgentError> {
        self.finished = self.board.is_game_over();
        if let Some(opening) = self.config.opening {
            if !self.finished {
                self.reveal(opening)?;
            }
        }
        while !self.finished {
            self.step()?;
        }

        let report = self.report();
        tracing::info!(
            score = report.score_value(),
            forced_guesses = report.forced_guesses,
            mines_hit = report.mines_hit,
            "game over"
        );
        Ok(report)
    }

    /// One turn of the ladder.
    pub fn step(&mut self) -> Result<Step, AgentError> {
        if self.finished {
            return Ok(Step::Finished);
        }

        let acted = self.propagate()?;
        if acted > 0 {
            return Ok(Step::Propagated(acted));
        }

        for tier in Tier::ALL {
            if tier > self.config.max_tier {
                break;
            }
            let marked = self.query(tier)?;
            if marked > 0 {
                return Ok(Step::Deduced { tier, marked });
            }
        }

        self.guess()
    }

    /// Reveals every cell marked safe and flags every cell marked as a mine.
    /// Returns the number of board actions taken.
    pub fn propagate(&mut self) -> Result<usize, AgentError> {
        let pending: Vec<(Point, Safety)> = self
            .cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_unknown() && cell.safety != Safety::Unknown)
            .map(|(i, cell)| (Point::new(i % self.dim, i / self.dim), cell.safety))
            .collect();

        let mut acted = 0;
        for (at, safety) in pending {
            if self.finished {
                break;
            }
            match safety {
                Safety::Safe => self.reveal(at)?,
                Safety::Mine => self.flag(at),
                Safety::Unknown => continue,
            }
            acted += 1;
        }
        Ok(acted)
    }

    fn frontier(&self) -> Frontier {
        let unresolved = self
            .cells
            .iter()
            .filter(|cell| cell.is_unknown())
            .map(|cell| cell.id)
            .collect();
        Frontier {
            unresolved,
            mines_remaining: self.total_mines.saturating_sub(self.flags + self.mines_hit),
        }
    }

    /// Runs one tier and marks what it proves. Returns how many cells changed.
    fn query(&mut self, tier: Tier) -> Result<usize, AgentError> {
        let frontier = self.frontier();
        let deductions = match tier {
            Tier::Local => self.local.query(&frontier),
            Tier::Global => self.global.query(&frontier),
            Tier::Cardinality => self.global.query_with_cardinality(&frontier),
        };
        self.review(tier, &deductions)?;

        let marked = self.mark(&deductions.facts);
        self.deductions.add(tier, marked);
        tracing::debug!(
            ?tier,
            facts = deductions.facts.len(),
            marked,
            inconclusive = deductions.inconclusive,
            "tier finished"
        );
        Ok(marked)
    }

    fn review(&mut self, tier: Tier, deductions: &Deductions) -> Result<(), AgentError> {
        if !self.config.check_consistency {
            return Ok(());
        }
        if let Some(&cell) = deductions.contradictions.first() {
            let cell = self.point(cell).unwrap_or_default();
            return Err(AgentError::Inconsistent { cell });
        }
        if tier != Tier::Local {
            self.check_consistency()?;
        }
        Ok(())
    }

    /// Diagnostic: fails if the base refutes both polarities of any
    /// unresolved cell. Never true in a correct run.
    pub fn check_consistency(&mut self) -> Result<(), AgentError> {
        let frontier = self.frontier();
        match self.global.check_consistency(&frontier) {
            Ok(()) => Ok(()),
            Err(variable) => {
                let cell = self.point(variable).unwrap_or_default();
                tracing::error!(x = cell.x, y = cell.y, "knowledge base is inconsistent");
                Err(AgentError::Inconsistent { cell })
            }
        }
    }

    fn mark(&mut self, facts: &[Literal]) -> usize {
        let mut marked = 0;
        for &fact in facts {
            let Some(at) = self.point(fact.variable()) else {
                continue;
            };
            let Some(index) = self.index(at) else {
                continue;
            };
            let cell = &mut self.cells[index];
            if !cell.is_unknown() {
                continue;
            }

            let inferred = if fact.is_mine() { Safety::Mine } else { Safety::Safe };
            match cell.safety {
                Safety::Unknown => {
                    cell.safety = inferred;
                    marked += 1;
                }
                current if current == inferred => {}
                current => {
                    tracing::error!(
                        x = at.x,
                        y = at.y,
                        ?current,
                        ?inferred,
                        "conflicting deduction"
                    );
                }
            }
        }
        marked
    }

    fn guess(&mut self) -> Result<Step, AgentError> {
        let candidates: Vec<Point> = self
            .cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_unknown())
            .map(|(i, _)| Point::new(i % self.dim, i / self.dim))
            .collect();

        let Some(&at) = candidates.choose(&mut self.rng) else {
            // Nothing left to reveal: the board must agree the game is over.
            self.finished = true;
            if !self.board.is_game_over() {
                tracing::warn!("no unknown cells left but the board is not finished");
            }
            return Ok(Step::Finished);
        };

        tracing::debug!(x = at.x, y = at.y, "random guess");
        self.forced_guesses += 1;
        self.reveal(at)?;
        Ok(Step::Guessed(at))
    }

    /// Reveals a covered, unflagged cell and folds the result into both stores.
    /// A no-op on any other cell, including points off the board.
    pub fn reveal(&mut self, at: Point) -> Result<(), AgentError> {
        let Some(index) = self.index(at) else {
            return Ok(());
        };
        if !self.cells[index].is_unknown() {
            return Ok(());
        }
        let Some(outcome) = self.board.reveal(at) else {
            return Ok(());
        };
        self.moves += 1;

        let cell = &mut self.cells[index];
        let variable = cell.id;
        cell.covered = false;
        tracing::debug!(x = at.x, y = at.y, ?outcome, "revealed");

        match outcome {
            Reveal::MineHit => {
                cell.safety = Safety::Mine;
                self.mines_hit += 1;
                self.learn(variable.mine());
            }
            Reveal::Count(shown) => {
                cell.safety = Safety::Safe;
                cell.clue = Some(shown);
                self.learn(variable.safe());
                self.encode_clue(at, variable, shown)?;
            }
            Reveal::Withheld => {
                cell.safety = Safety::Safe;
                self.learn(variable.safe());
            }
        }

        self.after_action();
        Ok(())
    }

    /// Flags a covered, unflagged cell as a mine. A no-op on any other cell,
    /// including points off the board.
    pub fn flag(&mut self, at: Point) {
        let Some(index) = self.index(at) else {
            return;
        };
        if !self.cells[index].is_unknown() {
            return;
        }
        self.board.set_flag(at);
        self.moves += 1;
        self.flags += 1;

        let cell = &mut self.cells[index];
        let variable = cell.id;
        cell.flagged = true;
        cell.safety = Safety::Mine;
        tracing::debug!(x = at.x, y = at.y, "flagged");

        self.learn(variable.mine());
        self.after_action();
    }

    fn learn(&mut self, fact: Literal) {
        let purged_worlds = self.local.learn_fact(fact);
        let touched_clauses = self.global.learn_fact(fact);
        tracing::trace!(%fact, purged_worlds, touched_clauses, "fact learned");
    }

    fn encode_clue(&mut self, at: Point, clue_cell: Variable, shown: u8) -> Result<(), AgentError> {
        let mut unknown = Vec::new();
        let mut known_mines = 0;
        for index in neighbors(self.dim, at).filter_map(|neighbor| self.index(neighbor)) {
            let cell = &self.cells[index];
            if cell.is_unknown() {
                unknown.push(cell.id);
            } else if cell.flagged || cell.safety == Safety::Mine {
                known_mines += 1;
            }
        }

        let clue = Clue::from_reveal(clue_cell, shown, known_mines, unknown)?;
        self.local.add_clue(&clue);
        self.global.add_clue(&clue);
        Ok(())
    }

    fn after_action(&mut self) {
        if let Some(mut redraw) = self.redraw.take() {
            redraw(self.snapshot());
            self.redraw = Some(redraw);
        }
        if self.board.is_game_over() {
            self.finished = true;
        }
    }

    pub fn report(&self) -> GameReport {
        GameReport {
            score: self.board.score(),
            forced_guesses: self.forced_guesses,
            mines_hit: self.mines_hit,
            moves: self.moves,
            deductions: self.deductions,
        }
    }
}
