//! A minesweeper agent that reasons with two knowledge stores: per-clue
//! possible worlds, and a CNF clause base queried through a SAT solver.

pub mod agent;
pub mod board;
pub mod combinatorics;
pub mod encoder;
pub mod global;
pub mod harness;
pub mod local;
pub mod logic;
pub mod oracle;
pub mod store;

pub use agent::{
    Agent, AgentConfig, AgentError, CellState, GameReport, Safety, Step, Tier, TierCounts,
};
pub use board::{Board, BoardError, GridBoard, Point, Reveal, Score};
pub use encoder::{CardinalityEncoding, Clue, EncodeError};
pub use global::{Entailment, GlobalKnowledge};
pub use harness::{GameError, GameSpec, SweepPoint, run_game, sweep_density, sweep_fog};
pub use local::LocalKnowledge;
pub use logic::{Clause, Literal, Variable, World};
pub use oracle::{SatOracle, VarisatOracle, Verdict};
pub use store::{Deductions, Frontier, KnowledgeStore};
