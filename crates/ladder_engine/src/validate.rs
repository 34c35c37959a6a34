//! Move legality and target resolution for flat boards.
//!
//! Nothing here mutates. [`resolve`] turns the index a player asked for into
//! the cell that will actually change, or says why it cannot.

use crate::action::{MoveError, MoveTarget};
use crate::level::LevelRuleSet;
use crate::types::{Board, Mark, Player};
use tracing::{debug, instrument};

/// Gravity: the lowest empty cell in the column of `raw`.
pub struct GravityDrop;

impl GravityDrop {
    /// Scans the column from the last row upward.
    pub fn check(board: &Board, raw: usize) -> Result<usize, MoveError> {
        let side = board.side();
        let col = raw % side;
        (0..side)
            .rev()
            .map(|row| board.index_of(row, col))
            .find(|&i| board.is_empty_at(i))
            .ok_or(MoveError::ColumnFull(col))
    }
}

/// Overlay: any cell except Neutral ones and the mover's own.
pub struct OverlayTarget;

impl OverlayTarget {
    /// Accepts empty cells and opponent cells.
    pub fn check(board: &Board, index: usize, player: Player) -> Result<usize, MoveError> {
        match board.get(index) {
            Some(Mark::Neutral) => Err(MoveError::NeutralCell(MoveTarget::Flat(index))),
            Some(Mark::Occupied(p)) if p == player => {
                Err(MoveError::OwnMark(MoveTarget::Flat(index)))
            }
            Some(_) => Ok(index),
            None => Err(MoveError::OutOfBounds(MoveTarget::Flat(index))),
        }
    }
}

/// Plain placement: the cell must be empty.
pub struct CellIsEmpty;

impl CellIsEmpty {
    /// Accepts only empty cells.
    pub fn check(board: &Board, index: usize) -> Result<usize, MoveError> {
        if board.is_empty_at(index) {
            Ok(index)
        } else {
            Err(MoveError::CellOccupied(MoveTarget::Flat(index)))
        }
    }
}

/// Resolves `raw` to the index the move will write, under `rules`.
///
/// # Errors
///
/// Returns the reason the move is illegal; the board is never touched.
#[instrument(skip(board, rules), fields(level = %rules.level))]
pub fn resolve(
    board: &Board,
    rules: &LevelRuleSet,
    raw: usize,
    player: Player,
) -> Result<usize, MoveError> {
    if raw >= board.len() {
        return Err(MoveError::OutOfBounds(MoveTarget::Flat(raw)));
    }
    let result = if rules.gravity {
        GravityDrop::check(board, raw)
    } else if rules.overlay {
        OverlayTarget::check(board, raw, player)
    } else {
        CellIsEmpty::check(board, raw)
    };
    if let Err(e) = &result {
        debug!(raw, error = %e, "Move rejected");
    }
    result
}

/// Every distinct index `player` could write to, in ascending order.
///
/// Gravity maps a whole column onto one cell, so duplicates are removed.
pub fn legal_targets(board: &Board, rules: &LevelRuleSet, player: Player) -> Vec<usize> {
    let mut targets: Vec<usize> = (0..board.len())
        .filter_map(|raw| resolve(board, rules, raw, player).ok())
        .collect();
    targets.sort_unstable();
    targets.dedup();
    targets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;

    const X: Mark = Mark::Occupied(Player::X);
    const O: Mark = Mark::Occupied(Player::O);

    #[test]
    fn test_plain_rejects_occupied() {
        let rules = Level::Classic.rules();
        let mut board = Board::new(3);
        board.set(4, O);
        assert_eq!(resolve(&board, &rules, 0, Player::X), Ok(0));
        assert_eq!(
            resolve(&board, &rules, 4, Player::X),
            Err(MoveError::CellOccupied(MoveTarget::Flat(4)))
        );
    }

    #[test]
    fn test_out_of_bounds() {
        let rules = Level::Classic.rules();
        let board = Board::new(3);
        assert_eq!(
            resolve(&board, &rules, 9, Player::X),
            Err(MoveError::OutOfBounds(MoveTarget::Flat(9)))
        );
    }

    #[test]
    fn test_gravity_lands_lowest_empty() {
        let rules = Level::Gravity.rules();
        let mut board = Board::new(3);
        // Any row of column 1 resolves to the bottom cell.
        assert_eq!(resolve(&board, &rules, 1, Player::X), Ok(7));
        assert_eq!(resolve(&board, &rules, 4, Player::X), Ok(7));
        board.set(7, X);
        assert_eq!(resolve(&board, &rules, 1, Player::O), Ok(4));
        board.set(4, O);
        board.set(1, X);
        assert_eq!(resolve(&board, &rules, 7, Player::O), Err(MoveError::ColumnFull(1)));
    }

    #[test]
    fn test_overlay_targets() {
        let rules = Level::Overlay.rules();
        let mut board = Board::new(3);
        board.set(0, X);
        board.set(1, O);
        board.set(2, Mark::Neutral);
        assert_eq!(
            resolve(&board, &rules, 0, Player::X),
            Err(MoveError::OwnMark(MoveTarget::Flat(0)))
        );
        assert_eq!(resolve(&board, &rules, 1, Player::X), Ok(1));
        assert_eq!(
            resolve(&board, &rules, 2, Player::O),
            Err(MoveError::NeutralCell(MoveTarget::Flat(2)))
        );
        assert_eq!(resolve(&board, &rules, 3, Player::O), Ok(3));
    }

    #[test]
    fn test_legal_targets_dedup_gravity_columns() {
        let rules = Level::Gravity.rules();
        let board = Board::new(3);
        assert_eq!(legal_targets(&board, &rules, Player::O), vec![6, 7, 8]);
    }
}
