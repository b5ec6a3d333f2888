//! Strictly CRM library - a data-entry training game engine
//!
//! Players fill in CRM-style forms (contacts, opportunities, support cases)
//! from reference material and are scored on how closely their entries match
//! the expected values.
//!
//! # Architecture
//!
//! - **Drill**: field validation, scoring, the per-stage controller and the
//!   game state machine
//! - **Catalog**: built-in stages or stages loaded from TOML
//! - **Session**: result display delay and cancellation of stale completions
//! - **Config**: drill settings loaded from TOML
//!
//! # Example
//!
//! ```
//! use strictly_crm::{BuiltinCatalog, GameController, SubmitOutcome};
//!
//! let mut game = GameController::new(BuiltinCatalog);
//! game.start();
//! game.update_field("firstName", "Michael");
//! match game.submit() {
//!     SubmitOutcome::Rejected(errors) => assert!(!errors.is_empty()),
//!     SubmitOutcome::Completed(_) => unreachable!("required fields are blank"),
//! }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod config;
mod drill;
mod session;

// Crate-level exports - Configuration
pub use config::{ConfigError, DrillConfig, MAX_DISPLAY_DELAY_MS};

// Crate-level exports - Session
pub use session::{GameSession, PendingCompletion};

// Crate-level exports - Drill engine
pub use drill::{
    check_field, compute_accuracy, compute_error_count, compute_stage_score, compute_total_errors,
    compute_total_score, flat_accuracy, running_accuracy, score_submission, score_timeout,
    time_bonus, validate, validate_stages, Achievement, BuiltinCatalog, CatalogError, Contract,
    ContractViolation, ExpectedValues, FieldDefinition, FieldExists, FieldGroup, FieldKind,
    FieldStatus, GameController, GameIs, GameState, GameStatus, GameSummary, GroupProgress,
    IndexInRange, Rating, ResultMatchesStage, ScoreResult, StageCatalog, StageCompleteContract,
    StageCompletion, StageController, StageDefinition, StageIsActive, StagePhase, SubmissionMap,
    SubmitOutcome, TomlCatalog, ValidationError, ValidationErrorKind, ValidationRule,
    SECONDS_PER_BONUS_POINT,
};

// Crate-level exports - Invariants
pub use drill::invariants;
