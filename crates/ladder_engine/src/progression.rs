//! Level progression and turn sequencing.
//!
//! [`Ladder`] owns the running [`GameSession`] and is the only thing that
//! mutates it. Each accepted move runs validate, apply, win check,
//! rotation and progression in one synchronous step and reports what
//! changed. The opponent's reply is handed back as a [`PendingMove`] for
//! the host to fire after its thinking delay.

use crate::action::{CellChange, MoveError, MoveTarget};
use crate::ai;
use crate::apply;
use crate::level::Level;
use crate::rotation::{rotate_session, rotation_due};
use crate::rules::{is_draw, winner};
use crate::session::{Arena, GameSession};
use crate::super_board::NextTarget;
use crate::types::{GameStatus, Mark, Outcome, Player};
use crate::validate;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// The human always plays X.
pub const HUMAN: Player = Player::X;

/// The computer always plays O.
pub const OPPONENT: Player = Player::O;

/// Terminal status after a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnStatus {
    /// Game continues.
    None,
    /// The human won.
    HumanWin,
    /// The computer won.
    OpponentWin,
    /// Nobody can win.
    Draw,
}

/// Kind of record counter to bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RecordKind {
    /// Level cleared.
    Win,
    /// Level lost or abandoned.
    Fail,
}

/// A counter increment the host should persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordEvent {
    /// Level the counter belongs to.
    pub level: Level,
    /// Which counter.
    pub kind: RecordKind,
}

/// An opponent move the host must fire later.
///
/// Only valid for the session that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingMove {
    /// Session generation that issued this move.
    pub epoch: u64,
    /// True on the composite level, which thinks a little longer.
    pub composite: bool,
}

/// Composite-level details of a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuperUpdate {
    /// Sub-board newly won by the mover.
    pub decided: Option<usize>,
    /// Where the next move must go.
    pub next: NextTarget,
}

/// Everything the presentation needs after an accepted move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnReport {
    /// Level the move was played on.
    pub level: Level,
    /// Who moved.
    pub mover: Player,
    /// The cell actually written (after gravity).
    pub target: MoveTarget,
    /// Changed cells with their new marks.
    pub changes: Vec<CellChange>,
    /// Full mark sequence after a rotation, if one fired.
    pub rotation: Option<Vec<Mark>>,
    /// Composite-level details.
    pub super_update: Option<SuperUpdate>,
    /// Terminal status.
    pub status: TurnStatus,
    /// Counter to persist.
    pub record: Option<RecordEvent>,
    /// Level the ladder advanced to.
    pub advanced_to: Option<Level>,
    /// Opponent move to fire next.
    pub pending: Option<PendingMove>,
}

/// Session-level state machine over the seven levels.
#[derive(Debug, Clone)]
pub struct Ladder {
    session: GameSession,
    epoch: u64,
    pending: Option<PendingMove>,
}

impl Default for Ladder {
    fn default() -> Self {
        Self::new()
    }
}

impl Ladder {
    /// Starts at level 1.
    pub fn new() -> Self {
        Self::starting_at(Level::FIRST)
    }

    /// Starts at `level`.
    #[instrument]
    pub fn starting_at(level: Level) -> Self {
        Self {
            session: GameSession::new(level),
            epoch: 0,
            pending: None,
        }
    }

    /// The running game.
    pub fn session(&self) -> &GameSession {
        &self.session
    }

    /// Level being played.
    pub fn level(&self) -> Level {
        self.session.level()
    }

    /// Generation of the running session.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// The opponent move waiting to fire, if any.
    pub fn pending(&self) -> Option<PendingMove> {
        self.pending
    }

    /// True once the human has won the last level.
    pub fn is_cleared(&self) -> bool {
        self.level().next().is_none()
            && self.session.status() == GameStatus::Decided(Outcome::Winner(HUMAN))
    }

    /// True when a human move would currently be accepted.
    pub fn accepts_input(&self) -> bool {
        self.session.is_active() && self.session.to_move() == HUMAN && self.pending.is_none()
    }

    /// Plays the human's move at `target`.
    ///
    /// # Errors
    ///
    /// Rejected moves leave every piece of state unchanged.
    #[instrument(skip(self, rng), fields(level = %self.level()))]
    pub fn human_move<R: Rng + ?Sized>(
        &mut self,
        target: MoveTarget,
        rng: &mut R,
    ) -> Result<TurnReport, MoveError> {
        if !self.session.is_active() {
            return Err(MoveError::GameOver);
        }
        if self.session.to_move() != HUMAN {
            return Err(MoveError::WrongPlayer(HUMAN));
        }
        self.play_turn(HUMAN, target, rng)
    }

    /// Fires a pending opponent move chosen by the heuristic.
    ///
    /// # Errors
    ///
    /// [`MoveError::StaleSession`] when the session was replaced since the
    /// move was issued, [`MoveError::NotPending`] when it was already played.
    #[instrument(skip(self, rng), fields(level = %self.level()))]
    pub fn play_pending<R: Rng + ?Sized>(
        &mut self,
        pending: PendingMove,
        rng: &mut R,
    ) -> Result<TurnReport, MoveError> {
        self.check_pending(pending)?;
        let choice = match self.session.arena() {
            Arena::Flat(board) => ai::choose_move(
                board,
                self.session.rules(),
                self.session.history(),
                self.session.lines(),
                OPPONENT,
                rng,
            )
            .map(|c| MoveTarget::Flat(c.index)),
            Arena::Super(sb) => sb
                .choose_move(OPPONENT, rng)
                .map(|(board, c)| MoveTarget::Nested {
                    board,
                    cell: c.index,
                }),
        };
        match choice {
            Some(target) => self.opponent_move(pending, target, rng),
            None => {
                warn!("Opponent has no legal move, calling it a draw");
                self.pending = None;
                self.session.status = GameStatus::Decided(Outcome::Draw);
                Ok(TurnReport {
                    level: self.level(),
                    mover: OPPONENT,
                    target: MoveTarget::Flat(0),
                    changes: Vec::new(),
                    rotation: None,
                    super_update: None,
                    status: TurnStatus::Draw,
                    record: None,
                    advanced_to: None,
                    pending: None,
                })
            }
        }
    }

    /// Fires a pending opponent move at an explicit `target`.
    ///
    /// # Errors
    ///
    /// As [`Ladder::play_pending`], plus any rejection of `target`; a
    /// rejected target leaves the move pending.
    #[instrument(skip(self, rng), fields(level = %self.level()))]
    pub fn opponent_move<R: Rng + ?Sized>(
        &mut self,
        pending: PendingMove,
        target: MoveTarget,
        rng: &mut R,
    ) -> Result<TurnReport, MoveError> {
        self.check_pending(pending)?;
        let report = self.play_turn(OPPONENT, target, rng)?;
        if self.pending == Some(pending) {
            self.pending = None;
        }
        Ok(report)
    }

    /// Restarts the current level.
    ///
    /// Abandoning a game still in progress counts as a failure; the
    /// returned event should be persisted.
    #[instrument(skip(self), fields(level = %self.level()))]
    pub fn reset(&mut self) -> Option<RecordEvent> {
        let record = self.session.is_active().then_some(RecordEvent {
            level: self.level(),
            kind: RecordKind::Fail,
        });
        self.restart(self.level());
        record
    }

    fn restart(&mut self, level: Level) {
        self.session = GameSession::new(level);
        self.epoch += 1;
        self.pending = None;
        info!(level = %level, epoch = self.epoch, "Session restarted");
    }

    fn check_pending(&self, pending: PendingMove) -> Result<(), MoveError> {
        if pending.epoch != self.epoch {
            debug!(stale = pending.epoch, current = self.epoch, "Dropping stale move");
            return Err(MoveError::StaleSession);
        }
        if self.pending != Some(pending) {
            return Err(MoveError::NotPending);
        }
        if !self.session.is_active() {
            return Err(MoveError::GameOver);
        }
        Ok(())
    }

    /// Validates and applies one move, then settles win, rotation and
    /// progression. Nothing changes unless validation passes.
    fn play_turn<R: Rng + ?Sized>(
        &mut self,
        player: Player,
        target: MoveTarget,
        rng: &mut R,
    ) -> Result<TurnReport, MoveError> {
        let level = self.level();
        let rules = *self.session.rules();
        let mut rotation = None;
        let mut super_update = None;

        let (played, changes, outcome) = match target {
            MoveTarget::Flat(raw) => {
                let Some(board) = self.session.board() else {
                    return Err(MoveError::WrongShape(target));
                };
                let index = validate::resolve(board, &rules, raw, player)?;
                let moved = apply::apply(&mut self.session, index, player, rng).unwrap_or_default();

                let mut outcome = self.flat_outcome(player);
                if outcome.is_none() && rotation_due(&rules, self.session.turns()) {
                    rotation = rotate_session(&mut self.session);
                    outcome = self.flat_outcome(player);
                }
                (MoveTarget::Flat(index), moved.changes, outcome)
            }
            MoveTarget::Nested { board, cell } => {
                let Arena::Super(sb) = &mut self.session.arena else {
                    return Err(MoveError::WrongShape(target));
                };
                let moved = sb.play(board, cell, player)?;
                let outcome = if sb.has_won(player) {
                    Some(Outcome::Winner(player))
                } else if sb.is_draw() {
                    Some(Outcome::Draw)
                } else {
                    None
                };
                super_update = Some(SuperUpdate {
                    decided: moved.decided,
                    next: moved.next,
                });
                self.session.turns += 1;
                (target, vec![moved.change], outcome)
            }
        };

        let mut report = TurnReport {
            level,
            mover: player,
            target: played,
            changes,
            rotation,
            super_update,
            status: TurnStatus::None,
            record: None,
            advanced_to: None,
            pending: None,
        };
        self.settle(&mut report, outcome);
        Ok(report)
    }

    /// Winner (mover first) or draw on a flat board.
    fn flat_outcome(&self, mover: Player) -> Option<Outcome> {
        let board = self.session.board()?;
        let lines = self.session.lines();
        if let Some(p) = winner(board, mover, lines) {
            return Some(Outcome::Winner(p));
        }
        (self.session.rules().draws_when_full() && is_draw(board, lines)).then_some(Outcome::Draw)
    }

    fn settle(&mut self, report: &mut TurnReport, outcome: Option<Outcome>) {
        let level = report.level;
        match outcome {
            Some(Outcome::Winner(p)) => {
                self.session.status = GameStatus::Decided(Outcome::Winner(p));
                if p == HUMAN {
                    info!(level = %level, "Human cleared level");
                    report.status = TurnStatus::HumanWin;
                    report.record = Some(RecordEvent {
                        level,
                        kind: RecordKind::Win,
                    });
                    if let Some(next) = level.next() {
                        self.restart(next);
                        report.advanced_to = Some(next);
                    } else {
                        info!("All levels cleared");
                    }
                } else {
                    info!(level = %level, "Opponent won");
                    report.status = TurnStatus::OpponentWin;
                    report.record = Some(RecordEvent {
                        level,
                        kind: RecordKind::Fail,
                    });
                }
            }
            Some(Outcome::Draw) => {
                info!(level = %level, "Draw");
                self.session.status = GameStatus::Decided(Outcome::Draw);
                report.status = TurnStatus::Draw;
            }
            None => {
                self.session.to_move = report.mover.opponent();
                if self.session.to_move == OPPONENT {
                    let pending = PendingMove {
                        epoch: self.epoch,
                        composite: self.session.rules().composite,
                    };
                    self.pending = Some(pending);
                    report.pending = Some(pending);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand::rngs::mock::StepRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_rejected_move_changes_nothing() {
        let mut ladder = Ladder::new();
        let mut rng = rng();
        let report = ladder.human_move(MoveTarget::Flat(4), &mut rng).unwrap();
        let pending = report.pending.unwrap();
        ladder.opponent_move(pending, MoveTarget::Flat(0), &mut rng).unwrap();

        let before = ladder.session().board().cloned();
        let turns = ladder.session().turns();
        assert_eq!(
            ladder.human_move(MoveTarget::Flat(4), &mut rng),
            Err(MoveError::CellOccupied(MoveTarget::Flat(4)))
        );
        assert_eq!(ladder.session().board().cloned(), before);
        assert_eq!(ladder.session().turns(), turns);
        assert_eq!(ladder.session().to_move(), HUMAN);
    }

    #[test]
    fn test_input_gated_while_opponent_pending() {
        let mut ladder = Ladder::new();
        let mut rng = rng();
        ladder.human_move(MoveTarget::Flat(0), &mut rng).unwrap();
        assert!(!ladder.accepts_input());
        assert_eq!(
            ladder.human_move(MoveTarget::Flat(1), &mut rng),
            Err(MoveError::WrongPlayer(HUMAN))
        );
    }

    #[test]
    fn test_pending_move_fires_once() {
        let mut ladder = Ladder::new();
        let mut rng = rng();
        let pending = ladder.human_move(MoveTarget::Flat(0), &mut rng).unwrap().pending.unwrap();
        let report = ladder.play_pending(pending, &mut rng).unwrap();
        assert_eq!(report.mover, OPPONENT);
        assert_eq!(ladder.play_pending(pending, &mut rng), Err(MoveError::NotPending));
        assert!(ladder.accepts_input());
    }

    #[test]
    fn test_reset_invalidates_pending_and_records_failure() {
        let mut ladder = Ladder::new();
        let mut rng = rng();
        let pending = ladder.human_move(MoveTarget::Flat(0), &mut rng).unwrap().pending.unwrap();
        let record = ladder.reset();
        assert_eq!(
            record,
            Some(RecordEvent {
                level: Level::Classic,
                kind: RecordKind::Fail
            })
        );
        assert_eq!(ladder.play_pending(pending, &mut rng), Err(MoveError::StaleSession));
        assert_eq!(ladder.session().turns(), 0);
        assert!(ladder.session().board().unwrap().cells().iter().all(|m| m.is_empty()));
    }

    #[test]
    fn test_reset_after_draw_is_not_failure() {
        let mut ladder = Ladder::new();
        let mut rng = rng();
        // X O X / X O O / O X X
        let script = [(0, 1), (2, 4), (3, 6), (7, 5)];
        for (human, opponent) in script {
            let pending = ladder
                .human_move(MoveTarget::Flat(human), &mut rng)
                .unwrap()
                .pending
                .unwrap();
            ladder.opponent_move(pending, MoveTarget::Flat(opponent), &mut rng).unwrap();
        }
        let report = ladder.human_move(MoveTarget::Flat(8), &mut rng).unwrap();
        assert_eq!(report.status, TurnStatus::Draw);
        assert!(!ladder.session().is_active());
        assert_eq!(ladder.reset(), None);
    }

    #[test]
    fn test_opponent_win_is_terminal_failure() {
        let mut ladder = Ladder::new();
        let mut rng = rng();
        let script = [(0, 3), (1, 4), (8, 5)];
        let mut last = None;
        for (human, opponent) in script {
            let pending = ladder
                .human_move(MoveTarget::Flat(human), &mut rng)
                .unwrap()
                .pending
                .unwrap();
            last = Some(
                ladder
                    .opponent_move(pending, MoveTarget::Flat(opponent), &mut rng)
                    .unwrap(),
            );
        }
        let report = last.unwrap();
        assert_eq!(report.status, TurnStatus::OpponentWin);
        assert_eq!(report.record.map(|r| r.kind), Some(RecordKind::Fail));
        assert_eq!(ladder.level(), Level::Classic);
        assert_eq!(ladder.human_move(MoveTarget::Flat(2), &mut rng), Err(MoveError::GameOver));
    }

    #[test]
    fn test_human_win_advances() {
        let mut ladder = Ladder::new();
        let mut rng = rng();
        for (human, opponent) in [(0, 3), (1, 4)] {
            let pending = ladder
                .human_move(MoveTarget::Flat(human), &mut rng)
                .unwrap()
                .pending
                .unwrap();
            ladder.opponent_move(pending, MoveTarget::Flat(opponent), &mut rng).unwrap();
        }
        let report = ladder.human_move(MoveTarget::Flat(2), &mut rng).unwrap();
        assert_eq!(report.status, TurnStatus::HumanWin);
        assert_eq!(report.advanced_to, Some(Level::Memory));
        assert_eq!(ladder.level(), Level::Memory);
        assert!(ladder.accepts_input());
        assert_eq!(ladder.epoch(), 1);
    }

    #[test]
    fn test_wrong_shape_rejected() {
        let mut ladder = Ladder::starting_at(Level::Ultimate);
        let mut rng = rng();
        assert_eq!(
            ladder.human_move(MoveTarget::Flat(0), &mut rng),
            Err(MoveError::WrongShape(MoveTarget::Flat(0)))
        );
        let mut flat = Ladder::new();
        let nested = MoveTarget::Nested { board: 0, cell: 0 };
        assert_eq!(flat.human_move(nested, &mut rng), Err(MoveError::WrongShape(nested)));
    }

    #[test]
    fn test_rotation_fires_on_third_turn() {
        let mut ladder = Ladder::starting_at(Level::Rotation);
        let mut rng = StepRng::new(u64::MAX, 0);
        let p = ladder.human_move(MoveTarget::Flat(0), &mut rng).unwrap().pending.unwrap();
        let r2 = ladder.opponent_move(p, MoveTarget::Flat(15), &mut rng).unwrap();
        assert!(r2.rotation.is_none());
        let r3 = ladder.human_move(MoveTarget::Flat(1), &mut rng).unwrap();
        let cells = r3.rotation.expect("third turn rotates");
        // X at (0,0) and (0,1) land in column 3; O at (3,3) lands at (3,0).
        assert_eq!(cells[3], Mark::Occupied(Player::X));
        assert_eq!(cells[7], Mark::Occupied(Player::X));
        assert_eq!(cells[12], Mark::Occupied(Player::O));
        assert_eq!(ladder.session().turns(), 3);
    }

    #[test]
    fn test_composite_turn_reports_next_board() {
        let mut ladder = Ladder::starting_at(Level::Ultimate);
        let mut rng = rng();
        let report = ladder
            .human_move(MoveTarget::Nested { board: 4, cell: 2 }, &mut rng)
            .unwrap();
        assert_eq!(
            report.super_update,
            Some(SuperUpdate {
                decided: None,
                next: NextTarget::Board(2)
            })
        );
        let pending = report.pending.unwrap();
        assert!(pending.composite);
        assert_eq!(
            ladder.opponent_move(pending, MoveTarget::Nested { board: 0, cell: 0 }, &mut rng),
            Err(MoveError::WrongBoard { required: 2 })
        );
        assert_eq!(ladder.pending(), Some(pending));
        let reply = ladder.play_pending(pending, &mut rng).unwrap();
        assert!(matches!(reply.target, MoveTarget::Nested { board: 2, .. }));
        assert_eq!(ladder.session().turns(), 2);
    }
}
