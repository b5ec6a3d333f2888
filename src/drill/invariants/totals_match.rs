//! Totals invariant: running sums agree with the result history.

use super::super::game::GameController;
use super::Invariant;

/// Invariant: cumulative score and errors equal the sums over history.
pub struct TotalsMatchInvariant;

impl Invariant<GameController> for TotalsMatchInvariant {
    fn holds(game: &GameController) -> bool {
        let score: u32 = game.history().iter().map(|r| *r.score()).sum();
        let errors: u32 = game.history().iter().map(|r| *r.error_count()).sum();
        score == *game.state().cumulative_score() && errors == *game.state().cumulative_errors()
    }

    fn description() -> &'static str {
        "Cumulative score and errors equal the sums over history"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drill::catalog::BuiltinCatalog;
    use crate::drill::types::ScoreResult;
    use crate::drill::SubmissionMap;

    #[test]
    fn test_holds_after_accumulating() {
        let mut game = GameController::new(BuiltinCatalog);
        game.start();
        game.stage_complete(ScoreResult::new(1, 25, 70, 2, None), SubmissionMap::new());
        game.stage_complete(ScoreResult::new(2, 40, 90, 0, None), SubmissionMap::new());
        assert!(TotalsMatchInvariant::holds(&game));
        assert_eq!(*game.state().cumulative_score(), 65);
        assert_eq!(*game.state().cumulative_errors(), 2);
    }

    #[test]
    fn test_untracked_result_violates() {
        let mut game = GameController::new(BuiltinCatalog);
        game.start();
        game.corrupt_history_for_test(ScoreResult::new(1, 5, 0, 0, None));
        assert!(!TotalsMatchInvariant::holds(&game));
    }
}
