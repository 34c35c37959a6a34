//! Game rules for the ladder.
//!
//! Pure functions for evaluating board state. Rules are separated from
//! board storage and from level configuration so every level reuses them.

pub mod draw;
pub mod win;

pub use draw::is_draw;
pub use win::{WinLine, has_won, win_lines, winner};
