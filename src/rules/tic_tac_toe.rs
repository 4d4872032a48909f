use uuid::Uuid;

use super::{in_bounds, Board, GameRules, MoveRejection};

/// Classic 3x3 tic-tac-toe: place anywhere free, three in a line wins.
pub struct TicTacToe;

const ROWS: usize = 3;
const COLS: usize = 3;

impl GameRules for TicTacToe {
    fn dimensions(&self) -> (usize, usize) {
        (ROWS, COLS)
    }

    fn validate_move(&self, board: &Board, row: i32, col: i32) -> Result<(), MoveRejection> {
        if !in_bounds(ROWS, COLS, row, col) {
            return Err(MoveRejection::OutOfBounds);
        }
        if board[row as usize][col as usize].is_some() {
            return Err(MoveRejection::CellOccupied);
        }
        Ok(())
    }

    fn check_winner(&self, board: &Board, row: i32, col: i32, player: Uuid) -> bool {
        let (row, col) = (row as usize, col as usize);
        let mine = |r: usize, c: usize| board[r][c] == Some(player);

        // Row and column through the placed cell
        if (0..COLS).all(|c| mine(row, c)) || (0..ROWS).all(|r| mine(r, col)) {
            return true;
        }

        // Main diagonal, when the placed cell lies on it
        if row == col && (0..ROWS).all(|i| mine(i, i)) {
            return true;
        }

        // Anti-diagonal
        if row + col == ROWS - 1 && (0..ROWS).all(|i| mine(i, ROWS - 1 - i)) {
            return true;
        }

        false
    }
}
