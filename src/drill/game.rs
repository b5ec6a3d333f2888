//! Game controller: the intro → playing → completed state machine.
//!
//! Owns the stage definitions, the running totals, the result history and
//! the stage controller for the stage being played.

use super::catalog::StageCatalog;
use super::contracts::{enforce, fail, Contract, ContractViolation, GameIs, StageCompleteContract};
use super::scoring::{compute_total_errors, compute_total_score, running_accuracy};
use super::stage::{FieldStatus, StageCompletion, StageController, SubmitOutcome};
use super::summary::GameSummary;
use super::types::{GameState, GameStatus, ScoreResult, StageDefinition, SubmissionMap};
use tracing::{debug, info, instrument, warn};

/// Top-level state machine for one play session.
#[derive(Debug)]
pub struct GameController {
    catalog: Box<dyn StageCatalog>,
    stages: Vec<StageDefinition>,
    state: GameState,
    history: Vec<ScoreResult>,
    active_stage: Option<StageController>,
}

impl GameController {
    /// Loads the stages and waits at the intro.
    #[instrument(skip(catalog))]
    pub fn new(catalog: impl StageCatalog + 'static) -> Self {
        let catalog: Box<dyn StageCatalog> = Box::new(catalog);
        let stages = catalog.load_stages();
        if stages.is_empty() {
            fail(ContractViolation::EmptyCatalog);
        }
        info!(total_stages = stages.len(), "Game loaded");

        Self {
            state: GameState::new(stages.len() as u32),
            catalog,
            stages,
            history: Vec::new(),
            active_stage: None,
        }
    }

    /// Snapshot of progress.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Results of finished stages, in stage order.
    pub fn history(&self) -> &[ScoreResult] {
        &self.history
    }

    /// Stage definitions, with their completed flags.
    pub fn stages(&self) -> &[StageDefinition] {
        &self.stages
    }

    /// The stage being played, if any.
    pub fn active_stage(&self) -> Option<&StageController> {
        self.active_stage.as_ref()
    }

    /// Begins play at stage 1 with zeroed totals.
    #[instrument(skip(self))]
    pub fn start(&mut self) {
        enforce(GameIs::check(self, GameStatus::Intro, "start"));

        self.state = GameState::new(self.stages.len() as u32);
        self.state.set_status(GameStatus::Playing);
        self.history.clear();
        self.enter_current_stage();
        info!("Game started");
    }

    /// Abandons the stage in play without scoring it and returns to the
    /// intro with fresh stages.
    #[instrument(skip(self))]
    pub fn quit(&mut self) {
        enforce(GameIs::check(self, GameStatus::Playing, "quit"));
        warn!(
            stage = *self.state.current_stage_index(),
            "Quitting; in-progress stage discarded"
        );
        self.reset();
    }

    /// Returns to the intro after a completed game.
    #[instrument(skip(self))]
    pub fn restart(&mut self) {
        enforce(GameIs::check(self, GameStatus::Completed, "restart"));
        info!("Restarting");
        self.reset();
    }

    /// Writes a field of the active stage.
    #[instrument(skip(self, value))]
    pub fn update_field(&mut self, field_id: &str, value: impl Into<String>) -> FieldStatus {
        self.active_stage_mut("update a field").update_field(field_id, value)
    }

    /// Submits the active stage.
    ///
    /// A completed outcome must be handed back through
    /// [`GameController::stage_complete`].
    #[instrument(skip(self))]
    pub fn submit(&mut self) -> SubmitOutcome {
        self.active_stage_mut("submit").submit()
    }

    /// Forwards one clock tick to the active stage.
    #[instrument(level = "trace", skip(self))]
    pub fn tick(&mut self) -> Option<StageCompletion> {
        self.active_stage.as_mut().and_then(StageController::tick)
    }

    /// Consumes a stage's completion: records the result, updates totals,
    /// then either moves to the next stage or finishes the game.
    #[instrument(skip(self, result, submission), fields(stage = *result.stage()))]
    pub fn stage_complete(&mut self, result: ScoreResult, submission: SubmissionMap) {
        enforce(StageCompleteContract::pre(self, &result));

        let index = *self.state.current_stage_index();
        let accuracy = running_accuracy(
            *self.state.cumulative_accuracy(),
            self.state.stages_completed_before(),
            *result.accuracy(),
        );
        self.state.accumulate(&result, accuracy);
        self.stages[(index - 1) as usize].mark_completed(submission);
        self.history.push(result);

        if index < *self.state.total_stages() {
            self.state.advance();
            self.enter_current_stage();
        } else {
            self.state.set_status(GameStatus::Completed);
            self.active_stage = None;
            info!(
                score = *self.state.cumulative_score(),
                accuracy = *self.state.cumulative_accuracy(),
                errors = *self.state.cumulative_errors(),
                "Game completed"
            );
        }

        #[cfg(debug_assertions)]
        enforce(StageCompleteContract::post(&*self, &*self));
    }

    /// Consumes a completion event.
    pub fn complete(&mut self, completion: StageCompletion) {
        let (result, submission) = completion.into_parts();
        self.stage_complete(result, submission);
    }

    /// Field-based total recomputed from stored submissions.
    ///
    /// Matches the running total when no stage was timed.
    pub fn recomputed_score(&self) -> u32 {
        compute_total_score(&self.stages)
    }

    /// Error total recomputed from stored submissions.
    pub fn recomputed_errors(&self) -> u32 {
        compute_total_errors(&self.stages)
    }

    /// End-of-game summary, once every stage is done.
    pub fn summary(&self) -> Option<GameSummary> {
        match self.state.status() {
            GameStatus::Completed => Some(GameSummary::new(self.state.clone(), self.history.clone())),
            _ => None,
        }
    }

    fn active_stage_mut(&mut self, action: &'static str) -> &mut StageController {
        enforce(GameIs::check(self, GameStatus::Playing, action));
        match self.active_stage.as_mut() {
            Some(stage) => stage,
            None => fail(ContractViolation::WrongStatus {
                action,
                status: *self.state.status(),
            }),
        }
    }

    fn enter_current_stage(&mut self) {
        let index = *self.state.current_stage_index() as usize;
        let definition = self.stages[index - 1].clone();
        debug!(stage = index, "Entering stage");
        self.active_stage = Some(StageController::new(definition));
    }

    fn reset(&mut self) {
        self.stages = self.catalog.load_stages();
        self.state = GameState::new(self.stages.len() as u32);
        self.history.clear();
        self.active_stage = None;
    }

    #[cfg(test)]
    pub(crate) fn corrupt_history_for_test(&mut self, result: ScoreResult) {
        self.history.push(result);
    }
}
