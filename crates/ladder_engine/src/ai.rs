//! The heuristic opponent.
//!
//! Three tiers, strictly in order: take an immediate win, block an
//! immediate loss, then prefer the center cells. Exactly one ply in each
//! direction; ties are broken uniformly at random.

use crate::apply::simulate;
use crate::level::LevelRuleSet;
use crate::rules::{WinLine, has_won};
use crate::session::MoveHistory;
use crate::types::{Board, Player};
use crate::validate::legal_targets;
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, instrument};

/// Which tier produced a choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Tier {
    /// Completes a line for the mover.
    Win,
    /// Occupies the cell the opponent needed.
    Block,
    /// One of the center cells.
    Center,
    /// Anything legal.
    Any,
}

/// A chosen index and the tier that chose it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    /// Resolved board index to play.
    pub index: usize,
    /// Tier that produced it.
    pub tier: Tier,
}

/// Picks a move for `me` on a flat board.
///
/// Candidates are the resolved legal targets, so on gravity levels each
/// column contributes its landing cell. Returns `None` when no legal move
/// exists.
#[instrument(skip(board, rules, history, lines, rng), fields(level = %rules.level))]
pub fn choose_move<R: Rng + ?Sized>(
    board: &Board,
    rules: &LevelRuleSet,
    history: &MoveHistory,
    lines: &[WinLine],
    me: Player,
    rng: &mut R,
) -> Option<Choice> {
    let legal = legal_targets(board, rules, me);
    if legal.is_empty() {
        return None;
    }
    let them = me.opponent();

    let wins: Vec<usize> = legal
        .iter()
        .copied()
        .filter(|&i| has_won(&simulate(board, rules, history, i, me), me, lines))
        .collect();
    if let Some(&index) = wins.choose(rng) {
        debug!(index, "Taking win");
        return Some(Choice {
            index,
            tier: Tier::Win,
        });
    }

    let blocks: Vec<usize> = legal
        .iter()
        .copied()
        .filter(|&i| has_won(&simulate(board, rules, history, i, them), them, lines))
        .collect();
    if let Some(&index) = blocks.choose(rng) {
        debug!(index, "Blocking");
        return Some(Choice {
            index,
            tier: Tier::Block,
        });
    }

    let centers: Vec<usize> = rules
        .center_cells()
        .into_iter()
        .filter(|c| legal.contains(c))
        .collect();
    if let Some(&index) = centers.choose(rng) {
        return Some(Choice {
            index,
            tier: Tier::Center,
        });
    }

    legal.choose(rng).map(|&index| Choice {
        index,
        tier: Tier::Any,
    })
}
