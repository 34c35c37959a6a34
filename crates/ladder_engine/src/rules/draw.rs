//! Draw detection for flat boards.

use super::win::{WinLine, has_won};
use crate::types::{Board, Player};
use tracing::instrument;

/// A full board where neither player holds a line.
///
/// Levels that evict old moves never call this; their boards cannot fill.
#[instrument(skip(board, lines))]
pub fn is_draw(board: &Board, lines: &[WinLine]) -> bool {
    board.is_full()
        && !has_won(board, Player::X, lines)
        && !has_won(board, Player::O, lines)
}
