//! Whole-game runs and parameter sweeps.

use crate::agent::{Agent, AgentConfig, AgentError, GameReport};
use crate::board::{BoardError, GridBoard};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Everything needed to play one game from scratch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSpec {
    pub dim: usize,
    pub mines: usize,
    pub fog_probability: f64,
    /// Seeds both the layout and the agent's guesses. Fresh entropy if absent.
    pub seed: Option<u64>,
    pub agent: AgentConfig,
}

impl GameSpec {
    pub fn new(dim: usize, mines: usize) -> Self {
        GameSpec {
            dim,
            mines,
            fog_probability: 0.0,
            seed: None,
            agent: AgentConfig::default(),
        }
    }

    /// Seeded when `seed` is set, fresh entropy otherwise.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }

    /// A random board for this spec, and the RNG left over for the agent's
    /// guesses.
    pub fn board_and_rng(&self) -> Result<(GridBoard, StdRng), BoardError> {
        let mut rng = self.rng();
        let fog_seed = rng.random();
        let board = GridBoard::random(self.dim, self.mines, &mut rng)?
            .with_fog(self.fog_probability, fog_seed)?;
        Ok((board, rng))
    }
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error(transparent)]
    Agent(#[from] AgentError),
}

/// Builds a random board for `spec` and plays it to the end.
pub fn run_game(spec: &GameSpec) -> Result<GameReport, GameError> {
    let (board, rng) = spec.board_and_rng()?;
    let mut agent = Agent::new(board, rng, spec.agent.clone())?;
    Ok(agent.solve()?)
}

/// One averaged point of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    /// The swept parameter: a mine count or a fog probability.
    pub x: f64,
    pub mean_score: f64,
    pub mean_forced_guesses: f64,
    pub games: usize,
}

fn average<F>(
    x: f64,
    games: usize,
    master: &mut StdRng,
    mut play: F,
) -> Result<SweepPoint, GameError>
where
    F: FnMut(u64) -> Result<GameReport, GameError>,
{
    let mut score = 0.0;
    let mut guesses = 0.0;
    for _ in 0..games {
        let report = play(master.random())?;
        score += report.score_value();
        guesses += report.forced_guesses as f64;
    }
    let n = games.max(1) as f64;
    Ok(SweepPoint {
        x,
        mean_score: score / n,
        mean_forced_guesses: guesses / n,
        games,
    })
}

/// Plays `games` games for every mine count in `mines`.
pub fn sweep_density(
    base: &GameSpec,
    mines: impl IntoIterator<Item = usize>,
    games: usize,
) -> Result<Vec<SweepPoint>, GameError> {
    let mut master = base.rng();
    mines
        .into_iter()
        .map(|count| {
            let point = average(count as f64, games, &mut master, |seed| {
                run_game(&GameSpec {
                    mines: count,
                    seed: Some(seed),
                    ..base.clone()
                })
            })?;
            tracing::info!(mines = count, score = point.mean_score, "density point");
            Ok(point)
        })
        .collect()
}

/// Plays `games` games for every fog probability in `probabilities`.
pub fn sweep_fog(
    base: &GameSpec,
    probabilities: impl IntoIterator<Item = f64>,
    games: usize,
) -> Result<Vec<SweepPoint>, GameError> {
    let mut master = base.rng();
    probabilities
        .into_iter()
        .map(|probability| {
            let point = average(probability, games, &mut master, |seed| {
                run_game(&GameSpec {
                    fog_probability: probability,
                    seed: Some(seed),
                    ..base.clone()
                })
            })?;
            tracing::info!(fog = probability, score = point.mean_score, "fog point");
            Ok(point)
        })
        .collect()
}
