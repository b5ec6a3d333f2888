//! Data-entry drill engine: validation, scoring, and stage progression.

mod catalog;
mod contracts;
mod game;
pub mod invariants;
mod scoring;
mod stage;
mod summary;
mod types;
mod validation;

pub use catalog::{validate_stages, BuiltinCatalog, CatalogError, StageCatalog, TomlCatalog};
pub use contracts::{
    Contract, ContractViolation, FieldExists, GameIs, IndexInRange, ResultMatchesStage,
    StageCompleteContract, StageIsActive,
};
pub use game::GameController;
pub use scoring::{
    compute_accuracy, compute_error_count, compute_stage_score, compute_total_errors,
    compute_total_score, flat_accuracy, running_accuracy, score_submission, score_timeout,
    time_bonus, SECONDS_PER_BONUS_POINT,
};
pub use stage::{
    FieldStatus, GroupProgress, StageCompletion, StageController, StagePhase, SubmitOutcome,
};
pub use summary::{Achievement, GameSummary, Rating};
pub use types::{
    ExpectedValues, FieldDefinition, FieldGroup, FieldKind, GameState, GameStatus, ScoreResult,
    StageDefinition, SubmissionMap, ValidationRule,
};
pub use validation::{check_field, validate, ValidationError, ValidationErrorKind};
