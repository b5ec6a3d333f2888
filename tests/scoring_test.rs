//! Tests for accuracy, score, and error arithmetic.

use strictly_crm::{
    compute_accuracy, compute_error_count, compute_stage_score, flat_accuracy, running_accuracy,
    score_submission, score_timeout, ExpectedValues, FieldDefinition, FieldKind, StageDefinition,
    SubmissionMap, ValidationRule,
};

fn pairs(items: &[(&str, &str)]) -> SubmissionMap {
    items
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn contact_stage(points: u32, penalty: u32) -> StageDefinition {
    let fields = vec![
        FieldDefinition::new("firstName", "First Name", FieldKind::Text, true),
        FieldDefinition::new("email", "Email", FieldKind::Email, true)
            .with_rule(ValidationRule::Email),
    ];
    let expected: ExpectedValues = pairs(&[
        ("firstName", "Michael"),
        ("email", "mjohnson@company.com"),
    ]);
    StageDefinition::new(1, fields, expected, points, penalty)
}

#[test]
fn test_one_right_one_wrong() {
    let stage = contact_stage(10, 5);
    let submission = pairs(&[("firstName", "Michael"), ("email", "wrong@x")]);
    let result = score_submission(&stage, &submission, None);
    assert_eq!(*result.accuracy(), 50);
    assert_eq!(*result.error_count(), 1);
    assert_eq!(*result.score(), 5);
}

#[test]
fn test_blank_fields_are_not_penalized() {
    let stage = contact_stage(10, 5);
    let submission = pairs(&[("firstName", ""), ("email", "")]);
    let result = score_submission(&stage, &submission, None);
    assert_eq!(*result.accuracy(), 0);
    assert_eq!(*result.error_count(), 0);
    assert_eq!(*result.score(), 0);
}

#[test]
fn test_all_correct() {
    let stage = contact_stage(10, 5);
    let submission = pairs(&[("firstName", "Michael"), ("email", "mjohnson@company.com")]);
    let result = score_submission(&stage, &submission, None);
    assert_eq!(*result.accuracy(), 100);
    assert_eq!(*result.error_count(), 0);
    assert_eq!(*result.score(), 20);
    assert_eq!(*result.stage(), 1);
}

#[test]
fn test_score_never_negative() {
    let stage = contact_stage(1, 50);
    let submission = pairs(&[("firstName", "Mike"), ("email", "m@c.io")]);
    assert_eq!(compute_stage_score(&stage, &submission), 0);
    assert_eq!(compute_error_count(&stage, &submission), 2);
}

#[test]
fn test_blank_lowers_accuracy_but_not_errors() {
    let stage = contact_stage(10, 5);
    let submission = pairs(&[("firstName", "Michael"), ("email", "")]);
    assert_eq!(compute_accuracy(&submission, stage.expected_values()), 50);
    assert_eq!(compute_error_count(&stage, &submission), 0);
    assert_eq!(compute_stage_score(&stage, &submission), 10);
}

#[test]
fn test_matching_is_exact() {
    let stage = contact_stage(10, 5);
    let submission = pairs(&[("firstName", "michael "), ("email", "MJOHNSON@company.com")]);
    assert_eq!(compute_accuracy(&submission, stage.expected_values()), 0);
    assert_eq!(compute_error_count(&stage, &submission), 2);
}

#[test]
fn test_empty_submission_is_zero_accuracy() {
    let stage = contact_stage(10, 5);
    assert_eq!(compute_accuracy(&SubmissionMap::new(), stage.expected_values()), 0);
}

#[test]
fn test_empty_expected_values_are_not_scorable() {
    let expected = pairs(&[("a", "x"), ("b", "")]);
    let submission = pairs(&[("a", "x"), ("b", "anything")]);
    assert_eq!(compute_accuracy(&submission, &expected), 100);
}

#[test]
fn test_accuracy_rounds_half_up() {
    let expected = pairs(&[("a", "1"), ("b", "2"), ("c", "3")]);
    let two_of_three = pairs(&[("a", "1"), ("b", "2"), ("c", "x")]);
    assert_eq!(compute_accuracy(&two_of_three, &expected), 67);

    let expected = pairs(&[("a", "1"), ("b", "2"), ("c", "3"), ("d", "4"), ("e", "5"), ("f", "6"), ("g", "7"), ("h", "8")]);
    let one_of_eight = pairs(&[("a", "1")]);
    // 12.5 rounds to 13
    assert_eq!(compute_accuracy(&one_of_eight, &expected), 13);
}

#[test]
fn test_time_bonus_added_after_clamp() {
    let stage = contact_stage(1, 50);
    let submission = pairs(&[("firstName", "Mike"), ("email", "m@c.io")]);
    let result = score_submission(&stage, &submission, Some(24));
    assert_eq!(*result.score(), 4);
    assert_eq!(*result.time_remaining(), Some(24));
}

#[test]
fn test_timeout_forfeits_points() {
    let stage = contact_stage(10, 5);
    let submission = pairs(&[("firstName", "Michael"), ("email", "mjohnson@company.com")]);
    let result = score_timeout(&stage, &submission);
    assert_eq!(*result.score(), 0);
    assert_eq!(*result.accuracy(), 100);
    assert_eq!(*result.time_remaining(), Some(0));
}

#[test]
fn test_running_accuracy_sequence() {
    let first = running_accuracy(0, 0, 100);
    let second = running_accuracy(first, 1, 0);
    let third = running_accuracy(second, 2, 100);
    assert_eq!((first, second, third), (100, 50, 67));
}

#[test]
fn test_running_accuracy_diverges_from_flat_mean() {
    let first = running_accuracy(0, 0, 50);
    let second = running_accuracy(first, 1, 51);
    let third = running_accuracy(second, 2, 50);
    // 50.5 rounds to 51 before the third stage is folded in
    assert_eq!(second, 51);
    assert_eq!(third, 51);
    assert_eq!(flat_accuracy(&[50, 51, 50]), 50);
}
