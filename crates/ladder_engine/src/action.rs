//! First-class move types.
//!
//! A [`MoveTarget`] is the only input event the engine accepts. Rejections
//! are values, never panics: a rejected move leaves the session untouched.

use crate::types::{Mark, Player};
use serde::{Deserialize, Serialize};

/// A logical position a player asks to move at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveTarget {
    /// Flat board index. On gravity levels only its column matters.
    Flat(usize),
    /// Cell of a sub-board on the composite level.
    Nested {
        /// Sub-board index (0-8).
        board: usize,
        /// Cell index within the sub-board (0-8).
        cell: usize,
    },
}

impl std::fmt::Display for MoveTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MoveTarget::Flat(i) => write!(f, "cell {}", i),
            MoveTarget::Nested { board, cell } => write!(f, "board {} cell {}", board, cell),
        }
    }
}

/// A cell whose mark changed, with its new mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_new::new)]
pub struct CellChange {
    /// Where the change happened.
    pub target: MoveTarget,
    /// The mark now in the cell.
    pub mark: Mark,
}

/// Why a move was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum MoveError {
    /// The game on this level is over.
    #[display("Game is already over")]
    GameOver,

    /// It is not this player's turn.
    #[display("It's not {}'s turn", _0)]
    WrongPlayer(Player),

    /// The target does not exist on this board.
    #[display("{} is out of bounds", _0)]
    OutOfBounds(MoveTarget),

    /// The cell already holds a mark.
    #[display("{} is already occupied", _0)]
    CellOccupied(MoveTarget),

    /// Overlay levels forbid playing over your own mark.
    #[display("{} already holds your mark", _0)]
    OwnMark(MoveTarget),

    /// Neutral cells can never be played again.
    #[display("{} is neutral", _0)]
    NeutralCell(MoveTarget),

    /// Gravity level: no empty cell left in the column.
    #[display("Column {} is full", _0)]
    ColumnFull(usize),

    /// Composite level: the move must go to another sub-board.
    #[display("Must play in board {}", required)]
    WrongBoard {
        /// Sub-board the player is constrained to.
        required: usize,
    },

    /// Composite level: the sub-board is already decided or full.
    #[display("Board {} is closed", _0)]
    BoardClosed(usize),

    /// Flat targets on the composite level or nested targets elsewhere.
    #[display("{} does not fit this level", _0)]
    WrongShape(MoveTarget),

    /// A deferred move belongs to a session that has since been replaced.
    #[display("Pending move belongs to a replaced session")]
    StaleSession,

    /// No pending opponent move is due.
    #[display("No opponent move is pending")]
    NotPending,
}

impl std::error::Error for MoveError {}
