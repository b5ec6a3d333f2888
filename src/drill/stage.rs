//! Per-stage lifecycle: collect field input, gate on validation, score.
//!
//! One controller serves both untimed stages and stages with a countdown;
//! the stage definition's time limit decides which.

use super::contracts::{enforce, FieldExists, StageIsActive};
use super::scoring::{score_submission, score_timeout};
use super::types::{ScoreResult, StageDefinition, SubmissionMap};
use super::validation::{check_field, ValidationError};
use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

/// Phase of a stage controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StagePhase {
    /// Accepting field input.
    Active,
    /// Validating and scoring a submit.
    Submitting,
    /// Completion emitted; no further input.
    Done,
}

/// Live feedback state of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldStatus {
    /// Not edited yet.
    #[default]
    Pristine,
    /// Current value passes validation.
    Valid,
    /// Current value fails validation.
    Invalid,
}

/// How many fields of a display group currently validate.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize)]
pub struct GroupProgress {
    /// Group title.
    name: String,
    /// Fields in the group whose status is valid.
    valid: usize,
    /// Fields in the group.
    total: usize,
}

impl GroupProgress {
    /// Whether every field in the group is valid.
    pub fn is_complete(&self) -> bool {
        self.valid == self.total
    }
}

/// Completion event: the score plus the submission it was computed from.
#[derive(Debug, Clone, PartialEq, Eq, Getters, new)]
pub struct StageCompletion {
    /// Scored outcome.
    result: ScoreResult,
    /// Field values at completion.
    submission: SubmissionMap,
    /// Whether the clock forced this completion.
    timed_out: bool,
}

impl StageCompletion {
    /// Splits the event into its parts.
    pub fn into_parts(self) -> (ScoreResult, SubmissionMap) {
        (self.result, self.submission)
    }
}

/// Result of a submit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Some fields failed validation; the stage stays active.
    Rejected(Vec<ValidationError>),
    /// The stage is done and scored.
    Completed(StageCompletion),
}

/// Drives one stage from first input to its single completion event.
#[derive(Debug, Clone, Getters)]
pub struct StageController {
    definition: StageDefinition,
    phase: StagePhase,
    submission: SubmissionMap,
    field_status: BTreeMap<String, FieldStatus>,
    time_remaining: Option<u32>,
}

impl StageController {
    /// Enters a stage with every field at its initial value.
    #[instrument(skip(definition), fields(stage = *definition.sequence_number()))]
    pub fn new(definition: StageDefinition) -> Self {
        let submission = definition
            .fields()
            .iter()
            .map(|f| (f.id().clone(), f.kind().initial_value().to_string()))
            .collect();
        let field_status = definition
            .fields()
            .iter()
            .map(|f| (f.id().clone(), FieldStatus::Pristine))
            .collect();
        let time_remaining = *definition.time_limit_seconds();
        debug!(?time_remaining, "Stage entered");

        Self {
            definition,
            phase: StagePhase::Active,
            submission,
            field_status,
            time_remaining,
        }
    }

    /// Current value of a field.
    pub fn value(&self, field_id: &str) -> Option<&str> {
        self.submission.get(field_id).map(String::as_str)
    }

    /// Writes a field value and returns its live validation status.
    #[instrument(skip(self, value), fields(stage = *self.definition.sequence_number()))]
    pub fn update_field(&mut self, field_id: &str, value: impl Into<String>) -> FieldStatus {
        enforce(StageIsActive::check(self));
        enforce(FieldExists::check(self, field_id));

        let value = value.into();
        let status = match self.definition.field(field_id).map(|f| check_field(f, &value)) {
            Some(Ok(())) => FieldStatus::Valid,
            _ => FieldStatus::Invalid,
        };

        self.submission.insert(field_id.to_string(), value);
        self.field_status.insert(field_id.to_string(), status);
        debug!(?status, "Field updated");
        status
    }

    /// Validates every field and, if all pass, scores the stage.
    ///
    /// A rejected submit leaves the stage active so the user can correct
    /// it; a completed one moves the stage to done for good.
    #[instrument(skip(self), fields(stage = *self.definition.sequence_number()))]
    pub fn submit(&mut self) -> SubmitOutcome {
        enforce(StageIsActive::check(self));
        self.phase = StagePhase::Submitting;

        let errors: Vec<ValidationError> = self
            .definition
            .fields()
            .iter()
            .filter_map(|f| check_field(f, self.value(f.id()).unwrap_or("")).err())
            .collect();

        for field in self.definition.fields() {
            let failed = errors.iter().any(|e| &e.field_id == field.id());
            let status = if failed { FieldStatus::Invalid } else { FieldStatus::Valid };
            self.field_status.insert(field.id().clone(), status);
        }

        if !errors.is_empty() {
            warn!(failed = errors.len(), "Submission rejected");
            self.phase = StagePhase::Active;
            return SubmitOutcome::Rejected(errors);
        }

        let result = score_submission(&self.definition, &self.submission, self.time_remaining);
        info!(
            score = *result.score(),
            accuracy = *result.accuracy(),
            errors = *result.error_count(),
            "Stage scored"
        );
        SubmitOutcome::Completed(self.finish(result, false))
    }

    /// Advances the countdown by one second.
    ///
    /// When the clock hits zero the stage is force-submitted without the
    /// validation gate and scores nothing. Untimed or finished stages
    /// ignore ticks.
    #[instrument(skip(self), fields(stage = *self.definition.sequence_number()))]
    pub fn tick(&mut self) -> Option<StageCompletion> {
        if self.phase != StagePhase::Active {
            return None;
        }
        let remaining = self.time_remaining.as_mut()?;
        *remaining = remaining.saturating_sub(1);
        if *remaining > 0 {
            return None;
        }

        warn!("Time's up");
        let result = score_timeout(&self.definition, &self.submission);
        Some(self.finish(result, true))
    }

    /// Progress through each display group.
    pub fn group_progress(&self) -> Vec<GroupProgress> {
        self.definition
            .groups()
            .iter()
            .map(|group| GroupProgress {
                name: group.name().clone(),
                valid: group
                    .field_ids()
                    .iter()
                    .filter(|id| self.field_status.get(*id) == Some(&FieldStatus::Valid))
                    .count(),
                total: group.field_ids().len(),
            })
            .collect()
    }

    fn finish(&mut self, result: ScoreResult, timed_out: bool) -> StageCompletion {
        self.phase = StagePhase::Done;
        StageCompletion::new(result, self.submission.clone(), timed_out)
    }
}
