//! The mutable aggregate for one game on one level.

use crate::level::{Level, LevelRuleSet};
use crate::rules::{WinLine, win_lines};
use crate::super_board::SuperBoard;
use crate::types::{Board, GameStatus, Player};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{info, instrument};

/// Per-player FIFO of recent move indices.
///
/// With a limit of 0 nothing is recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveHistory {
    limit: usize,
    x: VecDeque<usize>,
    o: VecDeque<usize>,
}

impl MoveHistory {
    /// Creates an empty history keeping at most `limit` moves per player.
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            x: VecDeque::new(),
            o: VecDeque::new(),
        }
    }

    /// Maximum queue length per player.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// The queue of `player`, oldest first.
    pub fn queue(&self, player: Player) -> &VecDeque<usize> {
        match player {
            Player::X => &self.x,
            Player::O => &self.o,
        }
    }

    fn queue_mut(&mut self, player: Player) -> &mut VecDeque<usize> {
        match player {
            Player::X => &mut self.x,
            Player::O => &mut self.o,
        }
    }

    /// The index that `player`'s next move would evict, if any.
    pub fn next_eviction(&self, player: Player) -> Option<usize> {
        if self.limit == 0 {
            return None;
        }
        let queue = self.queue(player);
        (queue.len() >= self.limit).then(|| queue.front().copied()).flatten()
    }

    /// Records a move and returns the evicted index when the queue overflows.
    pub fn push(&mut self, player: Player, index: usize) -> Option<usize> {
        if self.limit == 0 {
            return None;
        }
        let limit = self.limit;
        let queue = self.queue_mut(player);
        queue.push_back(index);
        if queue.len() > limit {
            queue.pop_front()
        } else {
            None
        }
    }

    /// Rewrites every stored index through `permutation` (old index to new).
    pub fn remap(&mut self, permutation: &[usize]) {
        for queue in [&mut self.x, &mut self.o] {
            for index in queue.iter_mut() {
                if let Some(&to) = permutation.get(*index) {
                    *index = to;
                }
            }
        }
    }
}

/// Board storage for one level: a single board, or the composite arrangement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Arena {
    /// One board of the level's side.
    Flat(Board),
    /// Nine sub-boards plus the meta-board.
    Super(SuperBoard),
}

/// One game on one level.
///
/// Created at session start and on every advance or reset; never shared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSession {
    pub(crate) rules: LevelRuleSet,
    pub(crate) lines: Vec<WinLine>,
    pub(crate) arena: Arena,
    pub(crate) to_move: Player,
    pub(crate) history: MoveHistory,
    pub(crate) turns: u32,
    pub(crate) status: GameStatus,
}

impl GameSession {
    /// Creates a fresh game on `level` with X to move.
    #[instrument]
    pub fn new(level: Level) -> Self {
        let rules = level.rules();
        let arena = if rules.composite {
            Arena::Super(SuperBoard::new())
        } else {
            Arena::Flat(Board::new(rules.side))
        };
        info!(level = %level, side = rules.side, "New game session");
        Self {
            rules,
            lines: win_lines(rules.side),
            arena,
            to_move: Player::X,
            history: MoveHistory::new(rules.history_limit),
            turns: 0,
            status: GameStatus::InProgress,
        }
    }

    /// Active rules.
    pub fn rules(&self) -> &LevelRuleSet {
        &self.rules
    }

    /// Level being played.
    pub fn level(&self) -> Level {
        self.rules.level
    }

    /// Winning lines for the active side.
    pub fn lines(&self) -> &[WinLine] {
        &self.lines
    }

    /// Board storage.
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// The flat board, or `None` on the composite level.
    pub fn board(&self) -> Option<&Board> {
        match &self.arena {
            Arena::Flat(board) => Some(board),
            Arena::Super(_) => None,
        }
    }

    /// The composite board, or `None` on flat levels.
    pub fn super_board(&self) -> Option<&SuperBoard> {
        match &self.arena {
            Arena::Flat(_) => None,
            Arena::Super(board) => Some(board),
        }
    }

    /// Player to move.
    pub fn to_move(&self) -> Player {
        self.to_move
    }

    /// Move history queues.
    pub fn history(&self) -> &MoveHistory {
        &self.history
    }

    /// Completed moves since the session started.
    pub fn turns(&self) -> u32 {
        self.turns
    }

    /// Game status.
    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// False once a terminal state is reached.
    pub fn is_active(&self) -> bool {
        self.status == GameStatus::InProgress
    }

    /// Text rendering of whichever board is in play.
    pub fn display(&self) -> String {
        match &self.arena {
            Arena::Flat(board) => board.display(),
            Arena::Super(board) => board.display(),
        }
    }
}
