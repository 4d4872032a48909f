//! Per-game rules behind a common interface.
//!
//! The engine is game-agnostic: it asks the rules for the initial board,
//! whether a move is legal, and whether the just-placed piece wins or draws
//! the game. Adding a game is one new implementation plus one registry arm.

mod connect_four;
mod tic_tac_toe;

pub use connect_four::ConnectFour;
pub use tic_tac_toe::TicTacToe;

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A board cell: the occupying player's id, or empty.
pub type Cell = Option<Uuid>;

/// Rectangular grid of cells, row-major, row 0 at the top.
pub type Board = Vec<Vec<Cell>>;

/// Supported game types. Closed set; dispatch happens through [`GameType::rules`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    #[default]
    TicTacToe,
    ConnectFour,
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl GameType {
    /// Convert from the wire/database string representation
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "tic_tac_toe" => Some(Self::TicTacToe),
            "connect_four" => Some(Self::ConnectFour),
            _ => None,
        }
    }

    /// Convert to the wire/database string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TicTacToe => "tic_tac_toe",
            Self::ConnectFour => "connect_four",
        }
    }

    /// Look up the rule set for this game type.
    ///
    /// The registry is process-wide and read-only; rule implementations are
    /// stateless and safe for concurrent use.
    pub fn rules(self) -> &'static dyn GameRules {
        match self {
            Self::TicTacToe => &TicTacToe,
            Self::ConnectFour => &ConnectFour,
        }
    }
}

/// Why a move was rejected by the rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveRejection {
    /// Coordinates outside the board
    OutOfBounds,
    /// Target cell already holds a piece (for gravity games: column full)
    CellOccupied,
    /// Coordinates are on the board and free, but violate the game's
    /// placement geometry (e.g. a floating connect-four piece)
    IllegalGeometry,
}

/// Rule set for one game type.
///
/// All methods are pure and CPU-bound; they must not perform I/O.
pub trait GameRules: Send + Sync {
    /// Board dimensions as `(rows, cols)`.
    fn dimensions(&self) -> (usize, usize);

    /// A fresh board of the game's dimensions, all cells empty.
    fn initial_board(&self) -> Board {
        let (rows, cols) = self.dimensions();
        vec![vec![None; cols]; rows]
    }

    /// Check that placing at `(row, col)` is legal on `board`.
    fn validate_move(&self, board: &Board, row: i32, col: i32) -> Result<(), MoveRejection>;

    /// Whether the piece just placed at `(row, col)` by `player` wins.
    ///
    /// Evaluated incrementally around the placed cell; callers invoke this
    /// after writing the piece to the board.
    fn check_winner(&self, board: &Board, row: i32, col: i32, player: Uuid) -> bool;

    /// Whether the game is drawn: no winner and no empty cell left.
    fn check_draw(&self, _board: &Board, move_count: usize) -> bool {
        let (rows, cols) = self.dimensions();
        move_count >= rows * cols
    }
}

/// Bounds check shared by the rule implementations.
pub(crate) fn in_bounds(rows: usize, cols: usize, row: i32, col: i32) -> bool {
    row >= 0 && col >= 0 && (row as usize) < rows && (col as usize) < cols
}
