//! Tests for file-backed catalogs, drill config, and the play session.

use std::io::Write;
use std::time::Duration;
use strictly_crm::{
    DrillConfig, GameController, GameSession, GameStatus, StageCatalog, TomlCatalog,
    MAX_DISPLAY_DELAY_MS,
};
use tempfile::NamedTempFile;

const TWO_STAGES: &str = r#"
[[stages]]
sequence_number = 1
name = "Quick contact"
points_per_correct_field = 10
penalty_per_incorrect_field = 5
reference_material = "Michael, mjohnson@company.com"

[[stages.fields]]
id = "firstName"
label = "First Name"
kind = "text"
required = true

[[stages.fields]]
id = "email"
label = "Email"
kind = "email"
required = true
validation = "email"

[stages.expected_values]
firstName = "Michael"
email = "mjohnson@company.com"

[[stages]]
sequence_number = 2
name = "Timed follow-up"
points_per_correct_field = 20
penalty_per_incorrect_field = 10
reference_material = "Priority: High"
time_limit_seconds = 3

[[stages.fields]]
id = "priority"
label = "Priority"
kind = "select"
required = true
options = ["Low", "High"]

[stages.expected_values]
priority = "High"
"#;

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(content.as_bytes()).expect("write temp file");
    file
}

fn session(delay: Duration) -> GameSession {
    let catalog = TomlCatalog::from_toml_str(TWO_STAGES).expect("valid catalog");
    GameSession::new(GameController::new(catalog), delay)
}

fn fill_first_stage(session: &mut GameSession) {
    session.update_field("firstName", "Michael");
    session.update_field("email", "mjohnson@company.com");
}

#[test]
fn test_catalog_from_file() {
    let file = write_temp(TWO_STAGES);
    let catalog = TomlCatalog::from_file(file.path()).expect("catalog loads");
    let stages = catalog.load_stages();
    assert_eq!(stages.len(), 2);
    assert!(!stages[0].is_timed());
    assert!(stages[1].is_timed());
}

#[test]
fn test_catalog_file_missing() {
    let err = TomlCatalog::from_file("/nonexistent/stages.toml").unwrap_err();
    assert!(err.message.contains("Failed to read catalog file"));
}

#[test]
fn test_config_from_file() {
    let file = write_temp("result_display_delay_ms = 800\nstages_file = \"stages.toml\"\n");
    let config = DrillConfig::from_file(file.path()).expect("config loads");
    assert_eq!(*config.result_display_delay_ms(), 800);
    assert_eq!(config.display_delay(), Duration::from_millis(800));
    assert_eq!(
        config.stages_file().as_deref(),
        Some(std::path::Path::new("stages.toml"))
    );
}

#[test]
fn test_config_defaults_and_cap() {
    let file = write_temp("");
    let config = DrillConfig::from_file(file.path()).expect("empty config loads");
    assert_eq!(config, DrillConfig::default());
    assert_eq!(*config.result_display_delay_ms(), 1_500);

    let capped = DrillConfig::default().with_display_delay_ms(10_000);
    assert_eq!(*capped.result_display_delay_ms(), MAX_DISPLAY_DELAY_MS);
}

#[test]
fn test_config_parse_error() {
    let file = write_temp("result_display_delay_ms = \"soon\"");
    let err = DrillConfig::from_file(file.path()).unwrap_err();
    assert!(err.message.contains("Failed to parse config"));
}

#[tokio::test(start_paused = true)]
async fn test_completion_waits_for_display_delay() {
    let mut session = session(Duration::from_millis(1_500));
    session.start();
    fill_first_stage(&mut session);

    let pending = session.submit().expect("valid submission");
    assert_eq!(*session.game().state().current_stage_index(), 1);

    let before = tokio::time::Instant::now();
    let pending = pending.wait(session.display_delay()).await;
    assert!(session.deliver(pending));
    assert!(before.elapsed() >= Duration::from_millis(1_500));
    assert_eq!(*session.game().state().current_stage_index(), 2);
    assert_eq!(*session.game().state().cumulative_score(), 20);
}

#[tokio::test(start_paused = true)]
async fn test_quit_during_delay_drops_completion() {
    let mut session = session(Duration::from_millis(1_500));
    session.start();
    fill_first_stage(&mut session);
    let pending = session.submit().expect("valid submission");

    let delay = session.display_delay();
    let wait = pending.wait(delay);
    tokio::pin!(wait);
    tokio::select! {
        _ = &mut wait => panic!("delay elapsed before the player quit"),
        _ = tokio::time::sleep(delay / 2) => session.quit(),
    }
    assert_eq!(*session.game().state().status(), GameStatus::Intro);

    let pending = wait.await;
    assert!(!session.deliver(pending));
    assert_eq!(*session.game().state().status(), GameStatus::Intro);
    assert!(session.game().history().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_restart_during_delay_drops_completion() {
    let mut session = session(Duration::from_millis(1_000));
    session.start();
    fill_first_stage(&mut session);
    let first = session.submit().expect("valid submission");

    let delay = session.display_delay();
    let wait = first.wait(delay);
    tokio::pin!(wait);
    tokio::select! {
        _ = &mut wait => panic!("delay elapsed before the player quit"),
        _ = tokio::time::sleep(delay / 4) => {
            session.quit();
            session.start();
        }
    }

    let stale = wait.await;
    assert!(!session.deliver(stale));
    assert_eq!(*session.game().state().status(), GameStatus::Playing);
    assert_eq!(*session.game().state().current_stage_index(), 1);
    assert!(session.game().history().is_empty());
}

#[test]
fn test_stale_completion_dropped_after_new_start() {
    let mut session = session(Duration::ZERO);
    session.start();
    fill_first_stage(&mut session);
    let pending = session.submit().expect("valid submission");

    session.quit();
    session.start();
    assert!(!session.deliver(pending));
    assert_eq!(*session.game().state().current_stage_index(), 1);
    assert!(session.game().history().is_empty());
}

#[test]
fn test_timeout_finishes_game() {
    let mut session = session(Duration::ZERO);
    session.start();
    assert!(session.tick().is_none(), "untimed stage ignores ticks");

    fill_first_stage(&mut session);
    let pending = session.submit().expect("valid submission");
    assert!(session.deliver(pending));

    session.update_field("priority", "High");
    assert!(session.tick().is_none());
    assert!(session.tick().is_none());
    let pending = session.tick().expect("clock ran out");
    assert!(*pending.completion().timed_out());
    assert_eq!(*pending.completion().result().score(), 0);
    assert_eq!(*pending.completion().result().accuracy(), 100);
    assert!(session.deliver(pending));

    assert_eq!(*session.game().state().status(), GameStatus::Completed);
    assert_eq!(*session.game().state().cumulative_score(), 20);
    assert_eq!(*session.game().state().cumulative_accuracy(), 100);
    // Recomputed from stored submissions, the forfeited stage still counts.
    assert_eq!(session.game().recomputed_score(), 40);
}
