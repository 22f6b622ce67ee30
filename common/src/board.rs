use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Represents a 2D coordinate on the minesweeper board.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Point {
    pub x: usize,
    pub y: usize,
}

impl Point {
    pub fn new(x: usize, y: usize) -> Self {
        Point { x, y }
    }
}

/// What the board says when a cell is revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reveal {
    MineHit,
    /// Mines among the 8 neighbours.
    Count(u8),
    /// The clue was withheld. Not the same as a count of zero.
    Withheld,
}

/// Final score of a game: each correct flag earns a point, each wrong flag
/// costs one, normalised by the number of mines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Score {
    pub correct_flags: usize,
    pub incorrect_flags: usize,
    pub total_mines: usize,
}

impl Score {
    pub fn value(&self) -> f64 {
        if self.total_mines == 0 {
            return if self.incorrect_flags == 0 { 1.0 } else { 0.0 };
        }
        (self.correct_flags as f64 - self.incorrect_flags as f64) / self.total_mines as f64
    }
}

/// The solver's only window onto the hidden game state.
pub trait Board {
    /// Side length of the square grid.
    fn dim(&self) -> usize;

    fn mine_count(&self) -> usize;

    /// Reveals a cell. `None` when the cell is already revealed or flagged.
    fn reveal(&mut self, at: Point) -> Option<Reveal>;

    /// Toggles a flag. Does nothing on a revealed cell.
    fn set_flag(&mut self, at: Point);

    /// True once every cell is flagged or revealed. Computes the score.
    fn is_game_over(&mut self) -> bool;

    fn score(&self) -> Option<Score>;
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoardError {
    #[error("{mines} mines do not fit on a board of {cells} cells")]
    TooManyMines { mines: usize, cells: usize },
    #[error("fog probability {0} is outside [0, 1]")]
    InvalidFog(f64),
    #[error("({}, {}) is outside a {dim}x{dim} board", .point.x, .point.y)]
    OutOfBounds { point: Point, dim: usize },
}

/// Neighbours of `point` on a `dim` x `dim` grid, handling edges and corners.
pub fn neighbors(dim: usize, point: Point) -> impl Iterator<Item = Point> {
    (-1..=1).flat_map(move |dy| {
        (-1..=1).filter_map(move |dx| {
            if dx == 0 && dy == 0 {
                return None;
            }

            let nx = point.x as isize + dx;
            let ny = point.y as isize + dy;

            if nx >= 0 && nx < dim as isize && ny >= 0 && ny < dim as isize {
                Some(Point {
                    x: nx as usize,
                    y: ny as usize,
                })
            } else {
                None
            }
        })
    })
}

/// A square board that owns the hidden mine layout.
#[derive(Debug, Clone)]
pub struct GridBoard {
    dim: usize,
    mines: Vec<bool>,
    revealed: Vec<bool>,
    flags: Vec<bool>,
    fog_probability: f64,
    fog_rng: StdRng,
    score: Option<Score>,
}

impl GridBoard {
    /// Places `mine_count` mines uniformly at random.
    pub fn random<R: Rng + ?Sized>(
        dim: usize,
        mine_count: usize,
        rng: &mut R,
    ) -> Result<Self, BoardError> {
        let cells = dim * dim;
        if mine_count > cells {
            return Err(BoardError::TooManyMines {
                mines: mine_count,
                cells,
            });
        }
        let mut mines = vec![false; cells];
        for index in rand::seq::index::sample(rng, cells, mine_count) {
            mines[index] = true;
        }
        Ok(Self::with_layout(dim, mines))
    }

    /// A board with mines exactly at `mines`.
    pub fn from_mines(dim: usize, mines: &[Point]) -> Result<Self, BoardError> {
        let mut layout = vec![false; dim * dim];
        for &point in mines {
            if point.x >= dim || point.y >= dim {
                return Err(BoardError::OutOfBounds { point, dim });
            }
            layout[point.y * dim + point.x] = true;
        }
        Ok(Self::with_layout(dim, layout))
    }

    fn with_layout(dim: usize, mines: Vec<bool>) -> Self {
        let cells = mines.len();
        GridBoard {
            dim,
            mines,
            revealed: vec![false; cells],
            flags: vec![false; cells],
            fog_probability: 0.0,
            fog_rng: StdRng::seed_from_u64(0),
            score: None,
        }
    }

    /// Withholds each safe clue with probability `probability`.
    pub fn with_fog(mut self, probability: f64, seed: u64) -> Result<Self, BoardError> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(BoardError::InvalidFog(probability));
        }
        self.fog_probability = probability;
        self.fog_rng = StdRng::seed_from_u64(seed);
        Ok(self)
    }

    fn index(&self, at: Point) -> Option<usize> {
        (at.x < self.dim && at.y < self.dim).then(|| at.y * self.dim + at.x)
    }

    /// Hidden state, for tests and rendering after the game.
    pub fn is_mine(&self, at: Point) -> bool {
        self.index(at).is_some_and(|i| self.mines[i])
    }

    pub fn is_flagged(&self, at: Point) -> bool {
        self.index(at).is_some_and(|i| self.flags[i])
    }

    pub fn is_revealed(&self, at: Point) -> bool {
        self.index(at).is_some_and(|i| self.revealed[i])
    }

    fn count_adjacent_mines(&self, at: Point) -> u8 {
        neighbors(self.dim, at).filter(|&n| self.is_mine(n)).count() as u8
    }

    fn calculate_score(&self) -> Score {
        let mut score = Score {
            total_mines: self.mine_count(),
            ..Score::default()
        };
        for (&flag, &mine) in self.flags.iter().zip(&self.mines) {
            match (flag, mine) {
                (true, true) => score.correct_flags += 1,
                (true, false) => score.incorrect_flags += 1,
                _ => {}
            }
        }
        score
    }
}

impl Board for GridBoard {
    fn dim(&self) -> usize {
        self.dim
    }

    fn mine_count(&self) -> usize {
        self.mines.iter().filter(|&&m| m).count()
    }

    fn reveal(&mut self, at: Point) -> Option<Reveal> {
        let i = self.index(at)?;
        if self.revealed[i] || self.flags[i] {
            return None;
        }
        self.revealed[i] = true;

        if self.mines[i] {
            return Some(Reveal::MineHit);
        }
        if self.fog_probability > 0.0 && self.fog_rng.random_bool(self.fog_probability) {
            return Some(Reveal::Withheld);
        }
        Some(Reveal::Count(self.count_adjacent_mines(at)))
    }

    fn set_flag(&mut self, at: Point) {
        let Some(i) = self.index(at) else {
            return;
        };
        if self.revealed[i] {
            return;
        }
        self.flags[i] = !self.flags[i];
    }

    fn is_game_over(&mut self) -> bool {
        let flagged = self.flags.iter().filter(|&&f| f).count();
        let revealed = self.revealed.iter().filter(|&&r| r).count();
        if flagged + revealed == self.dim * self.dim {
            self.score = Some(self.calculate_score());
            return true;
        }
        false
    }

    fn score(&self) -> Option<Score> {
        self.score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_neighbors() {
        // Corner cell (0,0) should have 3 neighbors
        assert_eq!(neighbors(3, Point::new(0, 0)).count(), 3);
        // Center cell (1,1) should have 8 neighbors
        assert_eq!(neighbors(3, Point::new(1, 1)).count(), 8);
        // Edge cell (1,0) should have 5 neighbors
        assert_eq!(neighbors(3, Point::new(1, 0)).count(), 5);
    }

    #[test]
    fn test_random_board_places_every_mine() {
        let mut rng = StdRng::seed_from_u64(7);
        let board = GridBoard::random(6, 10, &mut rng).unwrap();
        assert_eq!(board.mine_count(), 10);
        assert_eq!(board.dim(), 6);
    }

    #[test]
    fn test_too_many_mines() {
        let mut rng = StdRng::seed_from_u64(7);
        let err = GridBoard::random(3, 10, &mut rng).unwrap_err();
        assert_eq!(err, BoardError::TooManyMines { mines: 10, cells: 9 });
    }

    #[test]
    fn test_reveal_counts_and_no_ops() {
        let mut board = GridBoard::from_mines(3, &[Point::new(2, 2)]).unwrap();

        assert_eq!(board.reveal(Point::new(0, 0)), Some(Reveal::Count(0)));
        assert_eq!(board.reveal(Point::new(1, 1)), Some(Reveal::Count(1)));
        // Already revealed.
        assert_eq!(board.reveal(Point::new(1, 1)), None);

        board.set_flag(Point::new(2, 1));
        assert!(board.is_flagged(Point::new(2, 1)));
        // Revealing a flagged cell does nothing.
        assert_eq!(board.reveal(Point::new(2, 1)), None);
        // Flagging a revealed cell does nothing.
        board.set_flag(Point::new(0, 0));
        assert!(!board.is_flagged(Point::new(0, 0)));

        assert_eq!(board.reveal(Point::new(2, 2)), Some(Reveal::MineHit));
    }

    #[test]
    fn test_fog_withholds_clues() {
        let mut board = GridBoard::from_mines(3, &[])
            .unwrap()
            .with_fog(1.0, 3)
            .unwrap();
        assert_eq!(board.reveal(Point::new(0, 0)), Some(Reveal::Withheld));
        assert!(matches!(
            GridBoard::from_mines(3, &[]).unwrap().with_fog(1.5, 3),
            Err(BoardError::InvalidFog(_))
        ));
    }

    #[test]
    fn test_game_over_and_score() {
        let mut board = GridBoard::from_mines(2, &[Point::new(1, 1)]).unwrap();
        board.reveal(Point::new(0, 0));
        board.reveal(Point::new(1, 0));
        board.set_flag(Point::new(0, 1));
        assert!(!board.is_game_over());
        assert_eq!(board.score(), None);

        board.set_flag(Point::new(1, 1));
        assert!(board.is_game_over());
        let score = board.score().unwrap();
        assert_eq!(score.correct_flags, 1);
        assert_eq!(score.incorrect_flags, 1);
        assert_eq!(score.value(), 0.0);
    }
}
