//! Core domain types for the data-entry drill.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::instrument;

/// A user's field values at submit time, keyed by field id.
pub type SubmissionMap = BTreeMap<String, String>;

/// Canonical answers for a stage, keyed by field id.
pub type ExpectedValues = BTreeMap<String, String>;

/// The widget a field is entered through.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum FieldKind {
    /// Single-line free text.
    Text,
    /// Email address.
    Email,
    /// Numeric value, entered as text.
    Number,
    /// One of a fixed list of options.
    Select,
    /// Calendar date.
    Date,
    /// Boolean toggle, submitted as `"true"` / `"false"`.
    Checkbox,
    /// Multi-line free text.
    #[serde(alias = "textarea")]
    #[strum(to_string = "multiline-text", serialize = "textarea")]
    MultilineText,
}

impl FieldKind {
    /// Value a field of this kind holds before the user touches it.
    pub fn initial_value(self) -> &'static str {
        match self {
            FieldKind::Checkbox => "false",
            _ => "",
        }
    }
}

/// Format check selected by a field's validation tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ValidationRule {
    /// Permissive `something@something.something` shape check.
    Email,
}

/// One input slot of a stage.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Unique key within the stage.
    id: String,
    /// Human-readable name, used in messages.
    label: String,
    /// Widget kind.
    kind: FieldKind,
    /// Whether an empty (or unchecked) value is rejected.
    #[serde(default)]
    required: bool,
    /// Allowed values for `select` fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    options: Option<Vec<String>>,
    /// Optional format check.
    #[serde(default, rename = "validation", skip_serializing_if = "Option::is_none")]
    validation_rule: Option<ValidationRule>,
    /// Placeholder hint for the presentation layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    placeholder: Option<String>,
}

impl FieldDefinition {
    /// Creates a field with no options, rule, or placeholder.
    #[instrument(skip(id, label), fields(field_id = %id.as_ref()))]
    pub fn new(id: impl AsRef<str>, label: impl Into<String>, kind: FieldKind, required: bool) -> Self {
        Self {
            id: id.as_ref().to_string(),
            label: label.into(),
            kind,
            required,
            options: None,
            validation_rule: None,
            placeholder: None,
        }
    }

    /// Attaches the option list of a `select` field.
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    /// Attaches a format rule.
    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        self.validation_rule = Some(rule);
        self
    }

    /// Attaches a placeholder hint.
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }
}

/// Named display group of field ids (a form tab or section).
///
/// Presentation hint only; scoring never looks at groups.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct FieldGroup {
    /// Group title.
    name: String,
    /// Member field ids, in display order.
    field_ids: Vec<String>,
}

impl FieldGroup {
    /// Creates a display group.
    pub fn new<I, S>(name: impl Into<String>, field_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            field_ids: field_ids.into_iter().map(Into::into).collect(),
        }
    }
}

/// One level of the game.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct StageDefinition {
    /// 1-based position in the stage sequence.
    sequence_number: u32,
    /// Short title.
    #[serde(default)]
    name: String,
    /// One-line task description.
    #[serde(default)]
    description: String,
    /// Ordered form fields.
    fields: Vec<FieldDefinition>,
    /// Canonical answers; empty values are not scored.
    expected_values: ExpectedValues,
    /// Reward per correctly matched field.
    points_per_correct_field: u32,
    /// Deduction per wrong non-empty field.
    penalty_per_incorrect_field: u32,
    /// Unstructured source text the user transcribes from.
    #[serde(default)]
    reference_material: String,
    /// Countdown length; `None` for untimed stages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    time_limit_seconds: Option<u32>,
    /// Optional display grouping.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    groups: Vec<FieldGroup>,
    /// Set once the Game Controller consumes this stage's completion.
    #[serde(skip)]
    completed: bool,
    /// The submission that completed this stage.
    #[serde(skip)]
    user_inputs: SubmissionMap,
}

impl StageDefinition {
    /// Creates an untimed stage with no reference text or groups.
    #[instrument(skip(fields, expected_values))]
    pub fn new(
        sequence_number: u32,
        fields: Vec<FieldDefinition>,
        expected_values: ExpectedValues,
        points_per_correct_field: u32,
        penalty_per_incorrect_field: u32,
    ) -> Self {
        Self {
            sequence_number,
            name: String::new(),
            description: String::new(),
            fields,
            expected_values,
            points_per_correct_field,
            penalty_per_incorrect_field,
            reference_material: String::new(),
            time_limit_seconds: None,
            groups: Vec::new(),
            completed: false,
            user_inputs: SubmissionMap::new(),
        }
    }

    /// Sets the title and description.
    pub fn with_title(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.name = name.into();
        self.description = description.into();
        self
    }

    /// Sets the reference passage.
    pub fn with_reference(mut self, text: impl Into<String>) -> Self {
        self.reference_material = text.into();
        self
    }

    /// Makes the stage time-bounded.
    pub fn with_time_limit(mut self, seconds: u32) -> Self {
        self.time_limit_seconds = Some(seconds);
        self
    }

    /// Attaches display groups.
    pub fn with_groups(mut self, groups: Vec<FieldGroup>) -> Self {
        self.groups = groups;
        self
    }

    /// Looks up a field by id.
    pub fn field(&self, id: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.id() == id)
    }

    /// Whether the stage runs against a countdown.
    pub fn is_timed(&self) -> bool {
        self.time_limit_seconds.is_some()
    }

    /// Records the completing submission and flags the stage done.
    pub(crate) fn mark_completed(&mut self, submission: SubmissionMap) {
        self.completed = true;
        self.user_inputs = submission;
    }
}

/// Result of scoring one stage.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Sequence number of the scored stage.
    stage: u32,
    /// Points earned, never negative.
    score: u32,
    /// Percentage of scorable fields matched, 0–100.
    accuracy: u32,
    /// Wrong non-empty fields.
    error_count: u32,
    /// Seconds left on the clock, for timed stages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    time_remaining: Option<u32>,
}

impl ScoreResult {
    /// Creates a score result.
    pub fn new(stage: u32, score: u32, accuracy: u32, error_count: u32, time_remaining: Option<u32>) -> Self {
        debug_assert!(accuracy <= 100, "accuracy is a percentage");
        Self {
            stage,
            score,
            accuracy,
            error_count,
            time_remaining,
        }
    }
}

/// Overall phase of a play session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GameStatus {
    /// Waiting for the player to start.
    #[default]
    Intro,
    /// A stage is being played.
    Playing,
    /// All stages finished.
    Completed,
    /// Reserved; nothing transitions here.
    Failed,
}

/// Read-only snapshot of a play session's progress.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct GameState {
    /// 1-based index of the stage being played.
    current_stage_index: u32,
    /// Number of stages in the session.
    total_stages: u32,
    /// Sum of stage scores so far.
    cumulative_score: u32,
    /// Sum of stage error counts so far.
    cumulative_errors: u32,
    /// Running mean of stage accuracies, rounded after every stage.
    cumulative_accuracy: u32,
    /// Session phase.
    status: GameStatus,
}

impl GameState {
    /// Fresh state at the intro screen.
    pub fn new(total_stages: u32) -> Self {
        Self {
            current_stage_index: 1,
            total_stages,
            cumulative_score: 0,
            cumulative_errors: 0,
            cumulative_accuracy: 0,
            status: GameStatus::Intro,
        }
    }

    /// Number of stages finished before the current one.
    pub fn stages_completed_before(&self) -> u32 {
        self.current_stage_index - 1
    }

    pub(crate) fn set_status(&mut self, status: GameStatus) {
        self.status = status;
    }

    pub(crate) fn advance(&mut self) {
        self.current_stage_index += 1;
    }

    pub(crate) fn accumulate(&mut self, result: &ScoreResult, accuracy: u32) {
        self.cumulative_score += result.score;
        self.cumulative_errors += result.error_count;
        self.cumulative_accuracy = accuracy;
    }
}
