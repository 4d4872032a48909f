use uuid::Uuid;

use super::{in_bounds, Board, GameRules, MoveRejection};

/// Connect four on a 6x7 grid: pieces drop to the lowest empty row of a
/// column, four contiguous in any direction wins.
pub struct ConnectFour;

const ROWS: usize = 6;
const COLS: usize = 7;
const WIN_LENGTH: i32 = 4;

/// Lowest empty row of `col`, or `None` when the column is full.
fn drop_row(board: &Board, col: usize) -> Option<usize> {
    (0..ROWS).rev().find(|&r| board[r][col].is_none())
}

impl GameRules for ConnectFour {
    fn dimensions(&self) -> (usize, usize) {
        (ROWS, COLS)
    }

    /// Moves are parameterized by column; the caller computes the drop row
    /// and the rule verifies it matches the lowest empty row.
    fn validate_move(&self, board: &Board, row: i32, col: i32) -> Result<(), MoveRejection> {
        if !in_bounds(ROWS, COLS, row, col) {
            return Err(MoveRejection::OutOfBounds);
        }
        match drop_row(board, col as usize) {
            None => Err(MoveRejection::CellOccupied),
            Some(expected) if expected != row as usize => Err(MoveRejection::IllegalGeometry),
            Some(_) => Ok(()),
        }
    }

    fn check_winner(&self, board: &Board, row: i32, col: i32, player: Uuid) -> bool {
        let mine = |r: i32, c: i32| {
            in_bounds(ROWS, COLS, r, c) && board[r as usize][c as usize] == Some(player)
        };

        // Contiguous run length through the placed cell along (dr, dc)
        let run = |dr: i32, dc: i32| {
            let mut count = 1;
            for dir in [1, -1] {
                let (mut r, mut c) = (row + dir * dr, col + dir * dc);
                while mine(r, c) {
                    count += 1;
                    r += dir * dr;
                    c += dir * dc;
                }
            }
            count
        };

        [(0, 1), (1, 0), (1, 1), (1, -1)]
            .into_iter()
            .any(|(dr, dc)| run(dr, dc) >= WIN_LENGTH)
    }
}
