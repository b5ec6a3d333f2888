//! Progress invariant: the stage index stays within the stage count.

use super::super::game::GameController;
use super::Invariant;

/// Invariant: `1 <= current_stage_index <= total_stages`.
pub struct ProgressBoundedInvariant;

impl Invariant<GameController> for ProgressBoundedInvariant {
    fn holds(game: &GameController) -> bool {
        let index = *game.state().current_stage_index();
        let total = *game.state().total_stages();
        index >= 1 && index <= total
    }

    fn description() -> &'static str {
        "Current stage index stays within 1..=total stages"
    }
}
