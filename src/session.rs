//! Play session: the Game Controller plus the result display delay.
//!
//! Scoring happens the moment a stage is submitted; the completion is then
//! held for a short, fixed delay so the player can read the stage result
//! before the next stage appears. Quitting or restarting while a completion
//! is held makes it stale, and a stale completion is dropped on delivery.

use crate::drill::{
    FieldStatus, GameController, StageCompletion, SubmitOutcome, ValidationError,
};
use derive_getters::Getters;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// A scored stage waiting out the display delay.
#[derive(Debug, Clone, Getters)]
pub struct PendingCompletion {
    /// The computed completion event.
    completion: StageCompletion,
    /// Session epoch the completion was produced in.
    epoch: u64,
}

impl PendingCompletion {
    /// Sleeps through the display delay and hands the completion back.
    ///
    /// Holds no borrow of the session, so the session can still quit or
    /// restart while the delay runs; [`GameSession::deliver`] then drops it.
    #[instrument(skip(self), fields(epoch = self.epoch))]
    pub async fn wait(self, delay: Duration) -> Self {
        tokio::time::sleep(delay).await;
        self
    }
}

/// A play session driving one [`GameController`].
#[derive(Debug)]
pub struct GameSession {
    game: GameController,
    epoch: u64,
    display_delay: Duration,
}

impl GameSession {
    /// Wraps a controller with the given result display delay.
    #[instrument(skip(game))]
    pub fn new(game: GameController, display_delay: Duration) -> Self {
        Self {
            game,
            epoch: 0,
            display_delay,
        }
    }

    /// The wrapped controller.
    pub fn game(&self) -> &GameController {
        &self.game
    }

    /// How long a completion is held before delivery.
    pub fn display_delay(&self) -> Duration {
        self.display_delay
    }

    /// Starts play.
    #[instrument(skip(self))]
    pub fn start(&mut self) {
        self.epoch += 1;
        self.game.start();
    }

    /// Quits to the intro, invalidating any held completion.
    #[instrument(skip(self))]
    pub fn quit(&mut self) {
        self.epoch += 1;
        self.game.quit();
    }

    /// Returns to the intro after a completed game.
    #[instrument(skip(self))]
    pub fn restart(&mut self) {
        self.epoch += 1;
        self.game.restart();
    }

    /// Writes a field of the active stage.
    pub fn update_field(&mut self, field_id: &str, value: impl Into<String>) -> FieldStatus {
        self.game.update_field(field_id, value)
    }

    /// Submits the active stage; on success the scored completion is held.
    #[instrument(skip(self))]
    pub fn submit(&mut self) -> Result<PendingCompletion, Vec<ValidationError>> {
        match self.game.submit() {
            SubmitOutcome::Completed(completion) => Ok(self.hold(completion)),
            SubmitOutcome::Rejected(errors) => Err(errors),
        }
    }

    /// One clock second; returns the forced completion if time ran out.
    pub fn tick(&mut self) -> Option<PendingCompletion> {
        let completion = self.game.tick()?;
        Some(self.hold(completion))
    }

    /// Hands a held completion to the controller unless it went stale.
    #[instrument(skip(self, pending), fields(epoch = pending.epoch))]
    pub fn deliver(&mut self, pending: PendingCompletion) -> bool {
        if pending.epoch != self.epoch {
            warn!(current = self.epoch, "Discarding completion from an abandoned session");
            return false;
        }
        self.game.complete(pending.completion);
        info!(status = %self.game.state().status(), "Completion delivered");
        true
    }

    fn hold(&self, completion: StageCompletion) -> PendingCompletion {
        debug!(stage = *completion.result().stage(), "Holding completion for display");
        PendingCompletion {
            completion,
            epoch: self.epoch,
        }
    }
}
