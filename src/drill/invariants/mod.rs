//! First-class invariants for a play session.
//!
//! Invariants are logical properties of the Game Controller that hold
//! between transitions. They are checked as postconditions in debug builds
//! and are testable on their own.

/// A logical property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// Violation of an invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// A set of invariants that can be checked together.
///
/// Implemented for triples of invariants.
pub trait InvariantSet<S> {
    /// Checks every invariant, collecting all violations.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

impl<S, I1, I2, I3> InvariantSet<S> for (I1, I2, I3)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
    I3: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
        let mut violations = Vec::new();
        if !I1::holds(state) {
            violations.push(InvariantViolation::new(I1::description()));
        }
        if !I2::holds(state) {
            violations.push(InvariantViolation::new(I2::description()));
        }
        if !I3::holds(state) {
            violations.push(InvariantViolation::new(I3::description()));
        }
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

pub mod history_consistent;
pub mod progress_bounded;
pub mod totals_match;

pub use history_consistent::HistoryConsistentInvariant;
pub use progress_bounded::ProgressBoundedInvariant;
pub use totals_match::TotalsMatchInvariant;

/// All Game Controller invariants as a composable set.
pub type DrillInvariants = (
    ProgressBoundedInvariant,
    HistoryConsistentInvariant,
    TotalsMatchInvariant,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drill::catalog::BuiltinCatalog;
    use crate::drill::game::GameController;
    use crate::drill::types::ScoreResult;
    use crate::drill::SubmissionMap;

    #[test]
    fn test_invariant_set_holds_for_new_game() {
        let game = GameController::new(BuiltinCatalog);
        assert!(DrillInvariants::check_all(&game).is_ok());
    }

    #[test]
    fn test_invariant_set_holds_after_stages() {
        let mut game = GameController::new(BuiltinCatalog);
        game.start();
        game.stage_complete(ScoreResult::new(1, 30, 60, 2, None), SubmissionMap::new());
        game.stage_complete(ScoreResult::new(2, 45, 80, 1, None), SubmissionMap::new());
        assert!(DrillInvariants::check_all(&game).is_ok());
    }

    #[test]
    fn test_invariant_set_detects_corruption() {
        let mut game = GameController::new(BuiltinCatalog);
        game.start();
        game.stage_complete(ScoreResult::new(1, 30, 60, 2, None), SubmissionMap::new());
        game.corrupt_history_for_test(ScoreResult::new(7, 1, 1, 1, None));

        let violations = DrillInvariants::check_all(&game).unwrap_err();
        let descriptions: Vec<&str> = violations.iter().map(|v| v.description.as_str()).collect();
        assert_eq!(
            descriptions,
            vec![
                HistoryConsistentInvariant::description(),
                TotalsMatchInvariant::description(),
            ]
        );
    }
}
