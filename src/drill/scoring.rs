//! Scoring engine: accuracy, per-stage score, error counts, and totals.
//!
//! All functions are pure. Percentages use round-half-up integer
//! arithmetic so `round(x / y * 100)` never depends on float precision.

use super::types::{ExpectedValues, ScoreResult, StageDefinition, SubmissionMap};
use tracing::{debug, instrument};

/// Seconds of remaining time worth one bonus point.
pub const SECONDS_PER_BONUS_POINT: u32 = 5;

/// `round(numerator / denominator)` for non-negative integers, halves up.
pub(crate) fn rounded_div(numerator: u64, denominator: u64) -> u32 {
    debug_assert!(denominator > 0);
    ((2 * numerator + denominator) / (2 * denominator)) as u32
}

fn submitted<'a>(submission: &'a SubmissionMap, id: &str) -> &'a str {
    submission.get(id).map(String::as_str).unwrap_or("")
}

/// Percentage (0–100) of non-empty expected values matched exactly.
///
/// An empty submission is 0% accurate.
#[instrument(level = "debug", skip_all, fields(submitted = submission.len()))]
pub fn compute_accuracy(submission: &SubmissionMap, expected: &ExpectedValues) -> u32 {
    if submission.is_empty() {
        return 0;
    }

    let scorable = expected.iter().filter(|(_, value)| !value.is_empty());
    let (total, correct) = scorable.fold((0u64, 0u64), |(total, correct), (id, value)| {
        let hit = submitted(submission, id) == value;
        (total + 1, correct + u64::from(hit))
    });

    if total == 0 {
        return 0;
    }
    rounded_div(correct * 100, total)
}

/// Field-based stage score: rewards matches, penalizes wrong non-empty
/// entries, ignores blanks, and never drops below zero.
#[instrument(level = "debug", skip_all, fields(stage = *stage.sequence_number()))]
pub fn compute_stage_score(stage: &StageDefinition, submission: &SubmissionMap) -> u32 {
    let reward = i64::from(*stage.points_per_correct_field());
    let penalty = i64::from(*stage.penalty_per_incorrect_field());

    let raw: i64 = stage
        .expected_values()
        .iter()
        .map(|(id, expected)| {
            let value = submitted(submission, id);
            if value == expected {
                reward
            } else if !value.is_empty() {
                -penalty
            } else {
                0
            }
        })
        .sum();

    let clamped = raw.max(0) as u32;
    debug!(raw, clamped, "stage score");
    clamped
}

/// Number of fields with a non-empty value that differs from the answer.
///
/// Blank fields lower accuracy but are not errors.
#[instrument(level = "debug", skip_all, fields(stage = *stage.sequence_number()))]
pub fn compute_error_count(stage: &StageDefinition, submission: &SubmissionMap) -> u32 {
    stage
        .expected_values()
        .iter()
        .filter(|(id, expected)| {
            let value = submitted(submission, id);
            !value.is_empty() && value != *expected
        })
        .count() as u32
}

/// Bonus points for finishing a timed stage early.
pub fn time_bonus(time_remaining: u32) -> u32 {
    time_remaining / SECONDS_PER_BONUS_POINT
}

/// Scores a submitted stage.
///
/// For timed stages the bonus is added after the zero clamp, so a stage
/// with no correct fields can still score from time alone.
#[instrument(skip_all, fields(stage = *stage.sequence_number(), ?time_remaining))]
pub fn score_submission(
    stage: &StageDefinition,
    submission: &SubmissionMap,
    time_remaining: Option<u32>,
) -> ScoreResult {
    let accuracy = compute_accuracy(submission, stage.expected_values());
    let error_count = compute_error_count(stage, submission);
    let score = compute_stage_score(stage, submission) + time_remaining.map_or(0, time_bonus);
    ScoreResult::new(*stage.sequence_number(), score, accuracy, error_count, time_remaining)
}

/// Scores a stage whose clock ran out: all points forfeited.
#[instrument(skip_all, fields(stage = *stage.sequence_number()))]
pub fn score_timeout(stage: &StageDefinition, submission: &SubmissionMap) -> ScoreResult {
    let accuracy = compute_accuracy(submission, stage.expected_values());
    let error_count = compute_error_count(stage, submission);
    ScoreResult::new(*stage.sequence_number(), 0, accuracy, error_count, Some(0))
}

/// Sum of field-based scores over completed stages, recomputed from each
/// stage's stored submission.
#[instrument(skip_all, fields(stages = stages.len()))]
pub fn compute_total_score(stages: &[StageDefinition]) -> u32 {
    stages
        .iter()
        .filter(|stage| *stage.completed())
        .map(|stage| compute_stage_score(stage, stage.user_inputs()))
        .sum()
}

/// Sum of error counts over completed stages.
#[instrument(skip_all, fields(stages = stages.len()))]
pub fn compute_total_errors(stages: &[StageDefinition]) -> u32 {
    stages
        .iter()
        .filter(|stage| *stage.completed())
        .map(|stage| compute_error_count(stage, stage.user_inputs()))
        .sum()
}

/// Folds one more stage accuracy into a running mean.
///
/// Rounds after every update, so the result can differ by one from a
/// mean computed over the whole history at once.
pub fn running_accuracy(previous: u32, stages_completed_before: u32, accuracy: u32) -> u32 {
    let n = u64::from(stages_completed_before);
    rounded_div(u64::from(previous) * n + u64::from(accuracy), n + 1)
}

/// Mean of the given accuracies, rounded once.
pub fn flat_accuracy(accuracies: &[u32]) -> u32 {
    if accuracies.is_empty() {
        return 0;
    }
    let sum: u64 = accuracies.iter().copied().map(u64::from).sum();
    rounded_div(sum, accuracies.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drill::types::{FieldDefinition, FieldKind};

    fn map(pairs: &[(&str, &str)]) -> SubmissionMap {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn stage(expected: &[(&str, &str)], points: u32, penalty: u32) -> StageDefinition {
        let fields = expected
            .iter()
            .map(|(id, _)| FieldDefinition::new(*id, *id, FieldKind::Text, true))
            .collect();
        StageDefinition::new(1, fields, map(expected), points, penalty)
    }

    #[test]
    fn test_rounded_div_halves_up() {
        assert_eq!(rounded_div(50, 100), 1);
        assert_eq!(rounded_div(1, 3), 0);
        assert_eq!(rounded_div(200, 3), 67);
        assert_eq!(rounded_div(125, 10), 13);
    }

    #[test]
    fn test_empty_submission_is_zero_accuracy() {
        assert_eq!(compute_accuracy(&SubmissionMap::new(), &map(&[("a", "x")])), 0);
    }

    #[test]
    fn test_no_scorable_fields_is_zero_accuracy() {
        assert_eq!(compute_accuracy(&map(&[("a", "x")]), &map(&[("a", "")])), 0);
    }

    #[test]
    fn test_empty_expected_values_are_not_counted() {
        let expected = map(&[("a", "x"), ("b", "")]);
        assert_eq!(compute_accuracy(&map(&[("a", "x"), ("b", "anything")]), &expected), 100);
    }

    #[test]
    fn test_one_of_eight_rounds_up() {
        let pairs: Vec<(String, String)> = (0..8).map(|i| (format!("f{i}"), "v".to_string())).collect();
        let expected: ExpectedValues = pairs.into_iter().collect();
        assert_eq!(compute_accuracy(&map(&[("f0", "v")]), &expected), 13);
    }

    #[test]
    fn test_score_clamps_at_zero() {
        let s = stage(&[("a", "x"), ("b", "y"), ("c", "z")], 10, 50);
        assert_eq!(compute_stage_score(&s, &map(&[("a", "x"), ("b", "no"), ("c", "no")])), 0);
    }

    #[test]
    fn test_time_bonus_added_after_clamp() {
        let s = stage(&[("a", "x")], 10, 50).with_time_limit(60);
        let result = score_submission(&s, &map(&[("a", "wrong")]), Some(23));
        assert_eq!(*result.score(), 4);
        assert_eq!(*result.accuracy(), 0);
        assert_eq!(*result.error_count(), 1);
    }

    #[test]
    fn test_timeout_forfeits_points() {
        let s = stage(&[("a", "x"), ("b", "y")], 10, 5);
        let result = score_timeout(&s, &map(&[("a", "x"), ("b", "")]));
        assert_eq!(*result.score(), 0);
        assert_eq!(*result.accuracy(), 50);
        assert_eq!(*result.time_remaining(), Some(0));
    }

    #[test]
    fn test_running_accuracy_diverges_from_flat_mean() {
        let after_one = running_accuracy(0, 0, 50);
        let after_two = running_accuracy(after_one, 1, 51);
        let after_three = running_accuracy(after_two, 2, 50);
        assert_eq!((after_one, after_two, after_three), (50, 51, 51));
        assert_eq!(flat_accuracy(&[50, 51, 50]), 50);
    }
}
