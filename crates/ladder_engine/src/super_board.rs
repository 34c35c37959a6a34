//! The composite "board of boards".
//!
//! Nine plain 3x3 sub-boards and a meta-board holding each sub-board's
//! winner. The last cell played picks the sub-board the next player must
//! use, unless that sub-board is closed.

use crate::action::{CellChange, MoveError, MoveTarget};
use crate::ai::{self, Choice};
use crate::level::LevelRuleSet;
use crate::rules::{WinLine, has_won, win_lines};
use crate::session::MoveHistory;
use crate::types::{Board, Mark, Player};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Number of sub-boards, and of cells in each.
pub const SUB_BOARDS: usize = 9;

/// The sub-board the preference rule tries first on a free move.
const CENTER_BOARD: usize = 4;

/// Where the next move must be played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NextTarget {
    /// Any open sub-board.
    Free,
    /// Only this sub-board.
    Board(usize),
}

/// What one composite move changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuperOutcome {
    /// The cell written.
    pub change: CellChange,
    /// Sub-board newly won by the mover.
    pub decided: Option<usize>,
    /// Constraint for the following move.
    pub next: NextTarget,
}

/// Nine sub-boards plus a meta-board of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuperBoard {
    boards: Vec<Board>,
    meta: Board,
    next: NextTarget,
    #[serde(skip, default = "sub_lines")]
    lines: Vec<WinLine>,
}

fn sub_lines() -> Vec<WinLine> {
    win_lines(3)
}

impl Default for SuperBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl SuperBoard {
    /// Creates nine empty sub-boards with a free first move.
    pub fn new() -> Self {
        Self {
            boards: vec![Board::new(3); SUB_BOARDS],
            meta: Board::new(3),
            next: NextTarget::Free,
            lines: sub_lines(),
        }
    }

    /// Sub-board `index`.
    pub fn sub_board(&self, index: usize) -> Option<&Board> {
        self.boards.get(index)
    }

    /// The meta-board: each cell is the sub-board's winner or Empty.
    pub fn meta(&self) -> &Board {
        &self.meta
    }

    /// Where the next move must be played.
    pub fn next_target(&self) -> NextTarget {
        self.next
    }

    /// A sub-board is closed once decided or full.
    pub fn is_closed(&self, index: usize) -> bool {
        !self.meta.is_empty_at(index) || self.boards.get(index).is_none_or(Board::is_full)
    }

    /// Sub-boards that may receive the next move.
    pub fn eligible_boards(&self) -> Vec<usize> {
        match self.next {
            NextTarget::Board(b) if !self.is_closed(b) => vec![b],
            _ => (0..SUB_BOARDS).filter(|&b| !self.is_closed(b)).collect(),
        }
    }

    /// Checks a move at `(board, cell)` without changing anything.
    ///
    /// # Errors
    ///
    /// Rejects out-of-range targets, the wrong sub-board, closed sub-boards
    /// and occupied cells.
    pub fn check(&self, board: usize, cell: usize) -> Result<(), MoveError> {
        let target = MoveTarget::Nested { board, cell };
        let Some(sub) = self.boards.get(board) else {
            return Err(MoveError::OutOfBounds(target));
        };
        if cell >= sub.len() {
            return Err(MoveError::OutOfBounds(target));
        }
        if let NextTarget::Board(required) = self.next
            && required != board
        {
            return Err(MoveError::WrongBoard { required });
        }
        if self.is_closed(board) {
            return Err(MoveError::BoardClosed(board));
        }
        if !sub.is_empty_at(cell) {
            return Err(MoveError::CellOccupied(target));
        }
        Ok(())
    }

    /// Plays `player` at `(board, cell)`.
    ///
    /// # Errors
    ///
    /// Same as [`SuperBoard::check`]; nothing changes on error.
    #[instrument(skip(self))]
    pub fn play(
        &mut self,
        board: usize,
        cell: usize,
        player: Player,
    ) -> Result<SuperOutcome, MoveError> {
        self.check(board, cell)?;
        let sub = &mut self.boards[board];
        sub.set(cell, player.mark());

        let mut decided = None;
        if self.meta.is_empty_at(board) && has_won(sub, player, &self.lines) {
            self.meta.set(board, player.mark());
            info!(board, winner = %player, "Sub-board decided");
            decided = Some(board);
        }

        self.next = if self.is_closed(cell) {
            NextTarget::Free
        } else {
            NextTarget::Board(cell)
        };
        debug!(next = ?self.next, "Next target");

        Ok(SuperOutcome {
            change: CellChange::new(MoveTarget::Nested { board, cell }, player.mark()),
            decided,
            next: self.next,
        })
    }

    /// True if `player` holds a line of sub-boards on the meta-board.
    pub fn has_won(&self, player: Player) -> bool {
        has_won(&self.meta, player, &self.lines)
    }

    /// Every sub-board is closed and nobody holds the meta-board.
    pub fn is_draw(&self) -> bool {
        (0..SUB_BOARDS).all(|b| self.is_closed(b))
            && !self.has_won(Player::X)
            && !self.has_won(Player::O)
    }

    /// Picks a move for `me`.
    ///
    /// On a free move the center sub-board is preferred, otherwise a random
    /// open one; within the sub-board the flat heuristic decides.
    #[instrument(skip(self, rng))]
    pub fn choose_move<R: Rng + ?Sized>(&self, me: Player, rng: &mut R) -> Option<(usize, Choice)> {
        let eligible = self.eligible_boards();
        let board = if eligible.contains(&CENTER_BOARD) {
            CENTER_BOARD
        } else {
            *eligible.choose(rng)?
        };
        let rules = LevelRuleSet::sub_board();
        let choice = ai::choose_move(
            &self.boards[board],
            &rules,
            &MoveHistory::new(0),
            &self.lines,
            me,
            rng,
        )?;
        Some((board, choice))
    }

    /// Formats all nine sub-boards as one 9x9 grid.
    ///
    /// Closed sub-boards show their winner (or `#` when drawn) in every
    /// empty cell.
    pub fn display(&self) -> String {
        let mut out = String::new();
        for outer_row in 0..3 {
            for inner_row in 0..3 {
                let mut parts = Vec::with_capacity(3);
                for outer_col in 0..3 {
                    let b = outer_row * 3 + outer_col;
                    let fill = match self.meta.get(b) {
                        Some(Mark::Occupied(p)) => Some(p.mark().symbol().to_ascii_lowercase()),
                        _ if self.is_closed(b) => Some('#'),
                        _ => None,
                    };
                    let row: String = (0..3)
                        .map(|inner_col| {
                            let mark = self.boards[b]
                                .get(inner_row * 3 + inner_col)
                                .unwrap_or_default();
                            match (mark, fill) {
                                (Mark::Empty, Some(f)) => f,
                                (m, _) => m.symbol(),
                            }
                        })
                        .collect();
                    parts.push(row);
                }
                out.push_str(&parts.join(" | "));
                out.push('\n');
            }
            if outer_row < 2 {
                out.push_str("----+-----+----\n");
            }
        }
        out
    }
}
