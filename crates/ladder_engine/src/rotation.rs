//! Periodic quarter-turn of the board.

use crate::level::LevelRuleSet;
use crate::session::{Arena, GameSession};
use crate::types::{Board, Mark};
use tracing::{info, instrument};

/// True when a move that brought the turn counter to `turns` triggers a
/// rotation: rotation is enabled and `turns` is a positive multiple of the
/// period.
pub fn rotation_due(rules: &LevelRuleSet, turns: u32) -> bool {
    rules.rotate_every > 0 && turns > 0 && turns % rules.rotate_every == 0
}

/// Destination index of every cell under a 90 degree clockwise turn.
///
/// Cell `(r, c)` moves to `(c, side - 1 - r)`.
pub fn quarter_turn(side: usize) -> Vec<usize> {
    (0..side * side)
        .map(|i| {
            let (r, c) = (i / side, i % side);
            c * side + (side - 1 - r)
        })
        .collect()
}

/// Returns `board` turned a quarter clockwise.
pub fn rotate(board: &Board) -> Board {
    let side = board.side();
    let mut cells = vec![Mark::Empty; board.len()];
    for (from, to) in quarter_turn(side).into_iter().enumerate() {
        cells[to] = board.cells()[from];
    }
    Board::from_cells(side, cells).unwrap_or_else(|| board.clone())
}

/// Rotates the session's flat board in place and remaps its history.
///
/// Returns the full post-rotation mark sequence, or `None` on the composite
/// level. The turn counter is untouched.
#[instrument(skip(session), fields(turns = session.turns))]
pub fn rotate_session(session: &mut GameSession) -> Option<Vec<Mark>> {
    let Arena::Flat(board) = &mut session.arena else {
        return None;
    };
    let permutation = quarter_turn(board.side());
    *board = rotate(board);
    session.history.remap(&permutation);
    info!("Board rotated");
    Some(board.cells().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;
    use crate::types::Player;

    fn numbered(side: usize) -> Board {
        let cells = (0..side * side)
            .map(|i| match i % 3 {
                0 => Mark::Occupied(Player::X),
                1 => Mark::Occupied(Player::O),
                _ => Mark::Empty,
            })
            .collect();
        Board::from_cells(side, cells).unwrap()
    }

    #[test]
    fn test_corner_moves_clockwise() {
        let mut board = Board::new(4);
        board.set(0, Mark::Occupied(Player::X));
        let turned = rotate(&board);
        assert_eq!(turned.get(3), Some(Mark::Occupied(Player::X)));
        assert_eq!(turned.get(0), Some(Mark::Empty));
    }

    #[test]
    fn test_four_turns_restore_board() {
        let board = numbered(4);
        let mut turned = board.clone();
        for _ in 0..4 {
            turned = rotate(&turned);
        }
        assert_eq!(turned, board);
        assert_ne!(rotate(&board), board);
    }

    #[test]
    fn test_rotation_due_on_multiples_of_three() {
        let rules = Level::Rotation.rules();
        let due: Vec<u32> = (0..10).filter(|&t| rotation_due(&rules, t)).collect();
        assert_eq!(due, vec![3, 6, 9]);
        assert!(!rotation_due(&Level::Infection.rules(), 3));
    }

    #[test]
    fn test_rotate_session_keeps_turns_and_length() {
        let mut session = GameSession::new(Level::Rotation);
        session.turns = 3;
        let cells = rotate_session(&mut session).unwrap();
        assert_eq!(cells.len(), 16);
        assert_eq!(session.turns(), 3);
        assert!(rotate_session(&mut GameSession::new(Level::Ultimate)).is_none());
    }
}
