//! Win detection over boards of any supported side.

use crate::types::{Board, Player};
use tracing::instrument;

/// A fixed set of board indices that wins when one player covers all of them.
pub type WinLine = Vec<usize>;

/// Derives every winning line for a board of `side`: rows, columns and the
/// two diagonals. Each line has exactly `side` indices.
#[instrument]
pub fn win_lines(side: usize) -> Vec<WinLine> {
    let mut lines = Vec::with_capacity(2 * side + 2);
    for row in 0..side {
        lines.push((0..side).map(|col| row * side + col).collect());
    }
    for col in 0..side {
        lines.push((0..side).map(|row| row * side + col).collect());
    }
    lines.push((0..side).map(|i| i * side + i).collect());
    lines.push((0..side).map(|i| i * side + (side - 1 - i)).collect());
    lines
}

/// Checks whether `player` covers any of `lines` on `board`.
///
/// A cell covers a line position when it holds `player`'s mark or a
/// Neutral wildcard. Out-of-range indices never cover anything.
pub fn has_won(board: &Board, player: Player, lines: &[WinLine]) -> bool {
    lines.iter().any(|line| {
        line.iter()
            .all(|&i| board.get(i).is_some_and(|mark| mark.counts_for(player)))
    })
}

/// Returns the winner on `board`, checking `first` before its opponent.
///
/// With Neutral marks both players can hold a line at once; the caller
/// decides who takes precedence.
pub fn winner(board: &Board, first: Player, lines: &[WinLine]) -> Option<Player> {
    [first, first.opponent()]
        .into_iter()
        .find(|&p| has_won(board, p, lines))
}
