//! Applying resolved moves to a flat board.
//!
//! Side effects stay inside the given board and history: overlay
//! conversion, history eviction and infection spread.

use crate::action::{CellChange, MoveTarget};
use crate::level::LevelRuleSet;
use crate::session::{Arena, GameSession, MoveHistory};
use crate::types::{Board, Mark, Player};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Chance that one orthogonal opponent neighbor flips after a move.
pub const INFECTION_CHANCE: f64 = 0.30;

/// What a single applied move did to the board.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOutcome {
    /// Index written by the move.
    pub index: usize,
    /// Mark written there (the mover's own, or Neutral on overlay).
    pub written: Mark,
    /// Cell erased by history eviction.
    pub evicted: Option<usize>,
    /// Cells flipped by infection.
    pub infected: Vec<usize>,
    /// Every changed cell with its final mark, in the order it changed.
    pub changes: Vec<CellChange>,
}

/// The mark a move by `player` writes at `index`.
///
/// On overlay levels an opponent's mark becomes Neutral.
pub fn mark_for(board: &Board, rules: &LevelRuleSet, index: usize, player: Player) -> Mark {
    match board.get(index) {
        Some(Mark::Occupied(p)) if rules.overlay && p != player => Mark::Neutral,
        _ => player.mark(),
    }
}

/// Writes a move and its deterministic side effects onto a copy of `board`.
///
/// Used for one-ply simulation: overlay conversion and history eviction are
/// reproduced, infection is not.
pub fn simulate(
    board: &Board,
    rules: &LevelRuleSet,
    history: &MoveHistory,
    index: usize,
    player: Player,
) -> Board {
    let mut next = board.clone();
    next.set(index, mark_for(board, rules, index, player));
    if let Some(evicted) = history.next_eviction(player) {
        next.set(evicted, Mark::Empty);
    }
    next
}

/// Applies a resolved move at `index` for `player` to a flat board.
///
/// The caller must have resolved `index` through
/// [`validate::resolve`](crate::validate::resolve).
#[instrument(skip(board, history, rules, rng), fields(level = %rules.level))]
pub fn apply_to_board<R: Rng + ?Sized>(
    board: &mut Board,
    history: &mut MoveHistory,
    rules: &LevelRuleSet,
    index: usize,
    player: Player,
    rng: &mut R,
) -> MoveOutcome {
    let written = mark_for(board, rules, index, player);
    board.set(index, written);
    let mut outcome = MoveOutcome {
        index,
        written,
        ..MoveOutcome::default()
    };
    outcome
        .changes
        .push(CellChange::new(MoveTarget::Flat(index), written));

    if rules.history_limit > 0
        && let Some(evicted) = history.push(player, index)
    {
        board.set(evicted, Mark::Empty);
        debug!(evicted, "Oldest move erased");
        outcome.evicted = Some(evicted);
        outcome
            .changes
            .push(CellChange::new(MoveTarget::Flat(evicted), Mark::Empty));
    }

    if rules.infection && written != Mark::Neutral {
        outcome.infected = infect(board, index, player, rng);
        for &i in &outcome.infected {
            outcome
                .changes
                .push(CellChange::new(MoveTarget::Flat(i), player.mark()));
        }
    }

    outcome
}

/// Applies a resolved move to the session's flat board and counts the turn.
///
/// Returns `None` on the composite level, which has its own applier.
#[instrument(skip(session, rng), fields(level = %session.rules.level))]
pub fn apply<R: Rng + ?Sized>(
    session: &mut GameSession,
    index: usize,
    player: Player,
    rng: &mut R,
) -> Option<MoveOutcome> {
    let rules = session.rules;
    let Arena::Flat(board) = &mut session.arena else {
        return None;
    };
    let outcome = apply_to_board(board, &mut session.history, &rules, index, player, rng);
    session.turns += 1;
    Some(outcome)
}

/// Flips orthogonal opponent neighbors of `index` to `player`.
///
/// Each neighbor is an independent trial at [`INFECTION_CHANCE`].
/// Returns the flipped indices.
pub fn infect<R: Rng + ?Sized>(
    board: &mut Board,
    index: usize,
    player: Player,
    rng: &mut R,
) -> Vec<usize> {
    let victim = player.opponent().mark();
    let (row, col) = board.coords(index);
    let side = board.side() as isize;
    let neighbors = [(-1isize, 0isize), (1, 0), (0, -1), (0, 1)];

    let mut flipped = Vec::new();
    for (dr, dc) in neighbors {
        let (r, c) = (row as isize + dr, col as isize + dc);
        if r < 0 || r >= side || c < 0 || c >= side {
            continue;
        }
        let n = board.index_of(r as usize, c as usize);
        if board.get(n) == Some(victim) && rng.gen_bool(INFECTION_CHANCE) {
            board.set(n, player.mark());
            debug!(index = n, infector = %player, "Cell infected");
            flipped.push(n);
        }
    }
    flipped
}
