//! Per-level rule configuration.
//!
//! Every behavioral switch lives in [`LevelRuleSet`]. Code outside this
//! module reads the rule fields and never branches on the level number.

use serde::{Deserialize, Serialize};
use tracing::instrument;

/// One of the seven ladder levels, in play order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::EnumIter,
    strum::Display,
)]
pub enum Level {
    /// Plain 3x3.
    Classic,
    /// Each player keeps at most three marks; the oldest fades.
    Memory,
    /// Playing on an opponent's mark turns it Neutral.
    Overlay,
    /// Marks drop to the lowest empty cell of the column.
    Gravity,
    /// 4x4, fresh marks may flip adjacent opponent marks.
    Infection,
    /// 4x4 with infection, the board turns every three turns.
    Rotation,
    /// Nine sub-boards with a meta-board of results.
    Ultimate,
}

impl Level {
    /// All levels in play order.
    pub const ALL: [Level; 7] = [
        Level::Classic,
        Level::Memory,
        Level::Overlay,
        Level::Gravity,
        Level::Infection,
        Level::Rotation,
        Level::Ultimate,
    ];

    /// The first level of a new session.
    pub const FIRST: Level = Level::Classic;

    /// 1-based level number, as used by the record counters.
    pub fn number(self) -> u8 {
        match self {
            Level::Classic => 1,
            Level::Memory => 2,
            Level::Overlay => 3,
            Level::Gravity => 4,
            Level::Infection => 5,
            Level::Rotation => 6,
            Level::Ultimate => 7,
        }
    }

    /// Looks up a level by its 1-based number.
    #[instrument]
    pub fn from_number(number: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|l| l.number() == number)
    }

    /// The level after this one, or `None` on the last level.
    pub fn next(self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    /// One-line description shown to the player.
    pub fn description(self) -> &'static str {
        match self {
            Level::Classic => "Classic: complete a line of three first!",
            Level::Memory => "Memory: placing your 4th mark erases your 1st.",
            Level::Overlay => "Overlay: play over your opponent to leave a Neutral (N) mark.",
            Level::Gravity => "Gravity: marks fall to the bottom of their column.",
            Level::Infection => {
                "Infection (4x4): complete four! Marks next to yours may be infected."
            }
            Level::Rotation => "Rotation (4x4): the board turns 90 degrees every 3 turns.",
            Level::Ultimate => "Ultimate: tic-tac-toe inside tic-tac-toe. The final showdown.",
        }
    }

    /// The rule set for this level.
    pub fn rules(self) -> LevelRuleSet {
        let base = LevelRuleSet {
            level: self,
            side: 3,
            gravity: false,
            overlay: false,
            infection: false,
            rotate_every: 0,
            history_limit: 0,
            composite: false,
        };
        match self {
            Level::Classic => base,
            Level::Memory => LevelRuleSet {
                history_limit: 3,
                ..base
            },
            Level::Overlay => LevelRuleSet {
                overlay: true,
                ..base
            },
            Level::Gravity => LevelRuleSet {
                gravity: true,
                ..base
            },
            Level::Infection => LevelRuleSet {
                side: 4,
                infection: true,
                ..base
            },
            Level::Rotation => LevelRuleSet {
                side: 4,
                infection: true,
                rotate_every: 3,
                ..base
            },
            Level::Ultimate => LevelRuleSet {
                composite: true,
                ..base
            },
        }
    }
}

/// Immutable rule switches for one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRuleSet {
    /// Level these rules belong to.
    pub level: Level,
    /// Board side length (3 or 4). Sub-boards on the composite level use it too.
    pub side: usize,
    /// A move names a column and lands in its lowest empty cell.
    pub gravity: bool,
    /// Moving onto an opponent mark leaves a Neutral.
    pub overlay: bool,
    /// Fresh marks may convert orthogonal opponent neighbors.
    pub infection: bool,
    /// Rotate the board after every N completed turns; 0 disables.
    pub rotate_every: u32,
    /// Marks kept per player before the oldest is erased; 0 disables.
    pub history_limit: usize,
    /// Play on nine sub-boards instead of one board.
    pub composite: bool,
}

impl LevelRuleSet {
    /// Rules for a single sub-board of the composite level: plain 3x3.
    pub fn sub_board() -> Self {
        Level::Classic.rules()
    }

    /// True when a full board ends the game in a draw.
    pub fn draws_when_full(&self) -> bool {
        self.history_limit == 0
    }

    /// The positional preference set for this board size.
    ///
    /// The single center cell on 3x3, the four inner cells on 4x4.
    pub fn center_cells(&self) -> Vec<usize> {
        let side = self.side;
        if side % 2 == 1 {
            vec![(side / 2) * side + side / 2]
        } else {
            let lo = side / 2 - 1;
            let hi = side / 2;
            vec![
                lo * side + lo,
                lo * side + hi,
                hi * side + lo,
                hi * side + hi,
            ]
        }
    }
}
