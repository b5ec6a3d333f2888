//! Contract-based checks for the stage and game state machines.
//!
//! Preconditions guard every transition. A failed precondition means the
//! caller is driving the state machine wrong, so it is logged and turned
//! into a panic rather than returned.

use super::game::GameController;
use super::invariants::{DrillInvariants, InvariantSet};
use super::stage::{StageController, StagePhase};
use super::types::{GameStatus, ScoreResult};
use tracing::{error, instrument};

/// Misuse of the stage or game state machine.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ContractViolation {
    /// A stage operation arrived while the stage was not accepting input.
    #[display("Stage {} is {}, not active", stage, phase)]
    StageNotActive {
        /// Stage sequence number.
        stage: u32,
        /// Phase the stage was in.
        phase: StagePhase,
    },

    /// A field id that the stage does not define.
    #[display("Stage {} has no field '{}'", stage, field_id)]
    UnknownField {
        /// Stage sequence number.
        stage: u32,
        /// The unknown id.
        field_id: String,
    },

    /// A game transition attempted from the wrong status.
    #[display("Cannot {} while the game is {}", action, status)]
    WrongStatus {
        /// Attempted transition.
        action: &'static str,
        /// Status at the time.
        status: GameStatus,
    },

    /// A completion for a stage other than the one being played.
    #[display("Result for stage {} arrived while stage {} is active", got, expected)]
    StageMismatch {
        /// Stage being played.
        expected: u32,
        /// Stage named by the result.
        got: u32,
    },

    /// The stage index left `1..=total`.
    #[display("Stage index {} outside 1..={}", index, total)]
    IndexOutOfRange {
        /// Offending index.
        index: u32,
        /// Number of stages.
        total: u32,
    },

    /// The catalog produced no stages.
    #[display("Stage catalog is empty")]
    EmptyCatalog,

    /// A postcondition failed.
    #[display("Invariant violation: {}", _0)]
    InvariantViolation(String),
}

impl std::error::Error for ContractViolation {}

/// Logs a violation and aborts the current operation.
#[track_caller]
pub(crate) fn fail(violation: ContractViolation) -> ! {
    error!(%violation, "Contract violation");
    panic!("contract violation: {violation}");
}

/// Unwraps a precondition result, failing loudly on violation.
#[track_caller]
pub(crate) fn enforce(check: Result<(), ContractViolation>) {
    if let Err(violation) = check {
        fail(violation);
    }
}

// ─────────────────────────────────────────────────────────────
//  Contract Trait
// ─────────────────────────────────────────────────────────────

/// Pre- and postconditions for a state transition.
pub trait Contract<S, A> {
    /// Must hold before `action` is applied to `state`.
    fn pre(state: &S, action: &A) -> Result<(), ContractViolation>;

    /// Must hold after the transition.
    fn post(before: &S, after: &S) -> Result<(), ContractViolation>;
}

// ─────────────────────────────────────────────────────────────
//  Stage Preconditions
// ─────────────────────────────────────────────────────────────

/// Precondition: the stage is accepting input.
pub struct StageIsActive;

impl StageIsActive {
    /// Checks the stage phase.
    #[instrument(level = "trace", skip(stage))]
    pub fn check(stage: &StageController) -> Result<(), ContractViolation> {
        match stage.phase() {
            StagePhase::Active => Ok(()),
            phase => Err(ContractViolation::StageNotActive {
                stage: *stage.definition().sequence_number(),
                phase: *phase,
            }),
        }
    }
}

/// Precondition: the stage defines the field.
pub struct FieldExists;

impl FieldExists {
    /// Checks the field id.
    #[instrument(level = "trace", skip(stage))]
    pub fn check(stage: &StageController, field_id: &str) -> Result<(), ContractViolation> {
        if stage.definition().field(field_id).is_some() {
            Ok(())
        } else {
            Err(ContractViolation::UnknownField {
                stage: *stage.definition().sequence_number(),
                field_id: field_id.to_string(),
            })
        }
    }
}

// ─────────────────────────────────────────────────────────────
//  Game Preconditions
// ─────────────────────────────────────────────────────────────

/// Precondition: the game is in the given status.
pub struct GameIs;

impl GameIs {
    /// Checks the status before `action`.
    #[instrument(level = "trace", skip(game))]
    pub fn check(
        game: &GameController,
        expected: GameStatus,
        action: &'static str,
    ) -> Result<(), ContractViolation> {
        let status = *game.state().status();
        if status == expected {
            Ok(())
        } else {
            Err(ContractViolation::WrongStatus { action, status })
        }
    }
}

/// Precondition: the current index is within the stage count.
pub struct IndexInRange;

impl IndexInRange {
    /// Checks the current stage index.
    #[instrument(level = "trace", skip(game))]
    pub fn check(game: &GameController) -> Result<(), ContractViolation> {
        let index = *game.state().current_stage_index();
        let total = *game.state().total_stages();
        if (1..=total).contains(&index) {
            Ok(())
        } else {
            Err(ContractViolation::IndexOutOfRange { index, total })
        }
    }
}

/// Precondition: the result belongs to the stage being played.
pub struct ResultMatchesStage;

impl ResultMatchesStage {
    /// Compares the result's stage against the current index.
    #[instrument(level = "trace", skip(game, result))]
    pub fn check(game: &GameController, result: &ScoreResult) -> Result<(), ContractViolation> {
        let expected = *game.state().current_stage_index();
        let got = *result.stage();
        if expected == got {
            Ok(())
        } else {
            Err(ContractViolation::StageMismatch { expected, got })
        }
    }
}

// ─────────────────────────────────────────────────────────────
//  Stage Completion Contract
// ─────────────────────────────────────────────────────────────

/// Contract for consuming a stage's completion.
///
/// Preconditions:
/// - Game is playing
/// - Stage index within bounds
/// - Result is for the current stage
///
/// Postconditions:
/// - Progress, history, and totals invariants hold
pub struct StageCompleteContract;

impl Contract<GameController, ScoreResult> for StageCompleteContract {
    fn pre(game: &GameController, result: &ScoreResult) -> Result<(), ContractViolation> {
        GameIs::check(game, GameStatus::Playing, "complete a stage")?;
        IndexInRange::check(game)?;
        ResultMatchesStage::check(game, result)
    }

    fn post(_before: &GameController, after: &GameController) -> Result<(), ContractViolation> {
        DrillInvariants::check_all(after).map_err(|violations| {
            let descriptions = violations
                .iter()
                .map(|v| v.description.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            ContractViolation::InvariantViolation(format!("Postcondition failed: {}", descriptions))
        })
    }
}
