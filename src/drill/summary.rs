//! End-of-game summary: performance rating and achievements.

use super::types::{GameState, ScoreResult};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Overall rating from final accuracy and score.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
pub enum Rating {
    /// Below every threshold.
    Beginner,
    /// Accuracy ≥ 60 and score ≥ 40.
    Apprentice,
    /// Accuracy ≥ 70 and score ≥ 60.
    Proficient,
    /// Accuracy ≥ 80 and score ≥ 80.
    Expert,
    /// Accuracy ≥ 90 and score ≥ 100.
    Master,
}

impl Rating {
    /// Rates a finished game.
    #[instrument]
    pub fn for_totals(accuracy: u32, score: u32) -> Self {
        match (accuracy, score) {
            (90.., 100..) => Rating::Master,
            (80.., 80..) => Rating::Expert,
            (70.., 60..) => Rating::Proficient,
            (60.., 40..) => Rating::Apprentice,
            _ => Rating::Beginner,
        }
    }
}

/// Badge earned over a full game.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumIter,
)]
pub enum Achievement {
    /// Final accuracy of at least 90%.
    #[strum(to_string = "Perfect Precision")]
    PerfectPrecision,
    /// Some stage finished with more than 30 seconds left.
    #[strum(to_string = "Speed Demon")]
    SpeedDemon,
    /// No errors in any stage.
    #[strum(to_string = "Flawless Entry")]
    FlawlessEntry,
    /// Final score of at least 100.
    #[strum(to_string = "High Scorer")]
    HighScorer,
    /// Finished every stage.
    #[strum(to_string = "Challenge Completed")]
    ChallengeCompleted,
}

/// Seconds left on a stage that earn [`Achievement::SpeedDemon`].
const SPEED_DEMON_SECONDS: u32 = 30;

/// Final figures of a completed game.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize)]
pub struct GameSummary {
    /// Final progress snapshot.
    state: GameState,
    /// Per-stage results.
    history: Vec<ScoreResult>,
    /// Performance rating.
    rating: Rating,
    /// Badges earned, in display order.
    achievements: Vec<Achievement>,
    /// Errors summed over the history.
    total_errors: u32,
}

impl GameSummary {
    /// Builds the summary from the final state and history.
    #[instrument(skip_all, fields(stages = history.len()))]
    pub fn new(state: GameState, history: Vec<ScoreResult>) -> Self {
        let accuracy = *state.cumulative_accuracy();
        let score = *state.cumulative_score();
        let total_errors: u32 = history.iter().map(|r| *r.error_count()).sum();
        let fast_stage = history
            .iter()
            .any(|r| matches!(r.time_remaining(), Some(t) if *t > SPEED_DEMON_SECONDS));

        let mut achievements = Vec::new();
        if accuracy >= 90 {
            achievements.push(Achievement::PerfectPrecision);
        }
        if fast_stage {
            achievements.push(Achievement::SpeedDemon);
        }
        if total_errors == 0 {
            achievements.push(Achievement::FlawlessEntry);
        }
        if score >= 100 {
            achievements.push(Achievement::HighScorer);
        }
        achievements.push(Achievement::ChallengeCompleted);

        Self {
            rating: Rating::for_totals(accuracy, score),
            state,
            history,
            achievements,
            total_errors,
        }
    }
}
