//! Runs a [`Ladder`] in real time.
//!
//! The engine settles each move instantly; the driver adds the thinking
//! delays, forwards record events to the counter store and keeps the
//! random source.

use crate::config::Pacing;
use crate::records::{Records, Scoreboard};
use ladder_engine::{Ladder, MoveError, MoveTarget, PendingMove, RecordEvent, TurnReport};
use rand::rngs::StdRng;
use tokio::time::{Duration, sleep};
use tracing::{debug, info, instrument};

/// A ladder session with pacing and persistence attached.
#[derive(Debug)]
pub struct Driver {
    ladder: Ladder,
    records: Records,
    pacing: Pacing,
    rng: StdRng,
}

impl Driver {
    /// Creates a driver over `ladder`.
    pub fn new(ladder: Ladder, records: Records, pacing: Pacing, rng: StdRng) -> Self {
        Self {
            ladder,
            records,
            pacing,
            rng,
        }
    }

    /// The engine state.
    pub fn ladder(&self) -> &Ladder {
        &self.ladder
    }

    /// Cached counters.
    pub fn records(&self) -> &Records {
        &self.records
    }

    /// Configured delays.
    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    /// How long the opponent thinks before `pending` fires.
    pub fn delay_for(&self, pending: PendingMove) -> Duration {
        if pending.composite {
            self.pacing.deep_thinking
        } else {
            self.pacing.thinking
        }
    }

    /// Loads the counters from the store.
    pub async fn refresh_records(&mut self) -> &Scoreboard {
        self.records.refresh().await
    }

    /// Plays a human move and persists its result.
    ///
    /// # Errors
    ///
    /// The engine's rejection, with nothing changed.
    #[instrument(skip(self))]
    pub async fn human(&mut self, target: MoveTarget) -> Result<TurnReport, MoveError> {
        let report = self.ladder.human_move(target, &mut self.rng)?;
        self.persist(report.record).await;
        Ok(report)
    }

    /// Fires a pending opponent move immediately and persists its result.
    ///
    /// # Errors
    ///
    /// [`MoveError::StaleSession`] when a reset or advance happened since
    /// the move was scheduled.
    #[instrument(skip(self))]
    pub async fn fire(&mut self, pending: PendingMove) -> Result<TurnReport, MoveError> {
        let report = self.ladder.play_pending(pending, &mut self.rng)?;
        self.persist(report.record).await;
        Ok(report)
    }

    /// Waits out the thinking delay, then fires `pending`.
    ///
    /// # Errors
    ///
    /// As [`Driver::fire`].
    pub async fn opponent_turn(&mut self, pending: PendingMove) -> Result<TurnReport, MoveError> {
        sleep(self.delay_for(pending)).await;
        self.fire(pending).await
    }

    /// Plays a human move and, unless the game ended, the opponent's reply.
    ///
    /// Returns one report per move played. Rotation settle pauses are
    /// included.
    ///
    /// # Errors
    ///
    /// The engine's rejection of the human move.
    pub async fn exchange(&mut self, target: MoveTarget) -> Result<Vec<TurnReport>, MoveError> {
        let report = self.human(target).await?;
        self.settle(&report).await;
        let mut reports = vec![report];
        if let Some(pending) = reports[0].pending {
            let reply = self.opponent_turn(pending).await?;
            self.settle(&reply).await;
            reports.push(reply);
        }
        Ok(reports)
    }

    /// Restarts the current level, persisting the abandon as a failure.
    #[instrument(skip(self))]
    pub async fn reset(&mut self) -> Option<RecordEvent> {
        let record = self.ladder.reset();
        info!(level = %self.ladder.level(), "Level reset");
        self.persist(record).await;
        record
    }

    /// Sleeps for whatever the report asks the host to show first.
    pub async fn settle(&self, report: &TurnReport) {
        if report.rotation.is_some() {
            sleep(self.pacing.rotation_settle).await;
        }
        if report.advanced_to.is_some() {
            sleep(self.pacing.advance_pause).await;
        }
    }

    async fn persist(&mut self, record: Option<RecordEvent>) {
        if let Some(event) = record {
            self.records.record(event).await;
        } else {
            debug!("Nothing to record");
        }
    }
}
