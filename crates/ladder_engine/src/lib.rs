//! Ladder engine - seven escalating tic-tac-toe variants
//!
//! A pure, synchronous rules engine. It owns no clock, no I/O and no
//! persistence: every accepted move is settled in one step and described
//! by a [`TurnReport`], and the opponent's reply comes back as a
//! [`PendingMove`] for the host to fire after its own delay.
//!
//! # Architecture
//!
//! - **Rules**: per-level switches ([`LevelRuleSet`]) and line checks
//! - **Validation**: resolves a requested cell to the cell that changes
//! - **Application**: overlay, memory eviction, infection, rotation
//! - **Opponent**: one-ply win/block/center heuristic
//! - **Progression**: [`Ladder`] sequences turns and advances levels
//!
//! # Example
//!
//! ```
//! use ladder_engine::{Ladder, Level, MoveTarget, TurnStatus};
//! use rand::SeedableRng;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//! let mut ladder = Ladder::new();
//! let report = ladder.human_move(MoveTarget::Flat(4), &mut rng).unwrap();
//! assert_eq!(report.status, TurnStatus::None);
//! assert_eq!(ladder.level(), Level::Classic);
//!
//! let reply = ladder.play_pending(report.pending.unwrap(), &mut rng).unwrap();
//! assert!(ladder.accepts_input());
//! # let _ = reply;
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod action;
mod ai;
mod apply;
mod level;
mod progression;
mod rotation;
mod rules;
mod session;
mod super_board;
mod types;
mod validate;

// Crate-level exports - Core types
pub use types::{Board, GameStatus, Mark, Outcome, Player};

// Crate-level exports - Levels and rules
pub use level::{Level, LevelRuleSet};
pub use rules::{WinLine, has_won, is_draw, win_lines, winner};

// Crate-level exports - Moves
pub use action::{CellChange, MoveError, MoveTarget};
pub use validate::{CellIsEmpty, GravityDrop, OverlayTarget, legal_targets, resolve};

// Crate-level exports - Applying moves
pub use apply::{INFECTION_CHANCE, MoveOutcome, apply, apply_to_board, infect, mark_for, simulate};
pub use rotation::{quarter_turn, rotate, rotate_session, rotation_due};

// Crate-level exports - Game state
pub use session::{Arena, GameSession, MoveHistory};
pub use super_board::{NextTarget, SUB_BOARDS, SuperBoard, SuperOutcome};

// Crate-level exports - Opponent
pub use ai::{Choice, Tier, choose_move};

// Crate-level exports - Progression
pub use progression::{
    HUMAN, Ladder, OPPONENT, PendingMove, RecordEvent, RecordKind, SuperUpdate, TurnReport,
    TurnStatus,
};
