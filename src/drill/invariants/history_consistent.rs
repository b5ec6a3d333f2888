//! History consistency invariant: one result per completed stage, in order.

use super::super::game::GameController;
use super::Invariant;

/// Invariant: the result history lines up with the completed stages.
///
/// There is exactly one result per stage flagged completed, and results
/// name stages `1..=n` in sequence.
pub struct HistoryConsistentInvariant;

impl Invariant<GameController> for HistoryConsistentInvariant {
    fn holds(game: &GameController) -> bool {
        let completed = game.stages().iter().filter(|s| *s.completed()).count();
        let in_order = game
            .history()
            .iter()
            .zip(1u32..)
            .all(|(result, expected)| *result.stage() == expected);

        completed == game.history().len() && in_order
    }

    fn description() -> &'static str {
        "History holds one in-order result per completed stage"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drill::catalog::BuiltinCatalog;
    use crate::drill::types::ScoreResult;
    use crate::drill::SubmissionMap;

    #[test]
    fn test_empty_game_holds() {
        let game = GameController::new(BuiltinCatalog);
        assert!(HistoryConsistentInvariant::holds(&game));
    }

    #[test]
    fn test_completed_stages_hold() {
        let mut game = GameController::new(BuiltinCatalog);
        game.start();
        game.stage_complete(ScoreResult::new(1, 10, 50, 1, None), SubmissionMap::new());
        assert!(HistoryConsistentInvariant::holds(&game));
        assert_eq!(game.history().len(), 1);
    }

    #[test]
    fn test_extra_history_entry_violates() {
        let mut game = GameController::new(BuiltinCatalog);
        game.start();
        game.corrupt_history_for_test(ScoreResult::new(1, 0, 0, 0, None));
        assert!(!HistoryConsistentInvariant::holds(&game));
    }
}
