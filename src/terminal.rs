//! Line-oriented terminal front end for the drill.
//!
//! Input lines are either `field = value` edits (field by id or by its
//! number in the listing) or one of the `:` commands. Timed stages are
//! driven by a one-second ticker running alongside stdin.

use anyhow::Result;
use std::time::Duration;
use strictly_crm::{
    FieldDefinition, FieldKind, FieldStatus, GameSession, GameStatus, PendingCompletion,
    StageController,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, instrument};

const TICK: Duration = Duration::from_secs(1);

/// What the loop should do after handling a line.
enum Flow {
    Continue,
    /// A new stage is on screen, or play paused for a result; the
    /// countdown restarts from a full second.
    StageEntered,
    Exit,
}

/// Runs the interactive drill on stdin until the player exits or input
/// closes.
pub async fn run(session: GameSession) -> Result<()> {
    drive(session, BufReader::new(tokio::io::stdin()).lines()).await?;
    Ok(())
}

/// The play loop over any line source; hands the session back at the end.
#[instrument(skip_all)]
async fn drive<R>(mut session: GameSession, mut input: Lines<R>) -> Result<GameSession>
where
    R: AsyncBufRead + Unpin,
{
    let mut ticker = clock();

    print_intro(&session);
    loop {
        let timed = session
            .game()
            .active_stage()
            .is_some_and(|s| s.time_remaining().is_some());

        tokio::select! {
            line = input.next_line() => {
                let Some(line) = line? else {
                    info!("Input closed");
                    return Ok(session);
                };
                match handle_line(&mut session, &mut input, line.trim()).await? {
                    Flow::Exit => return Ok(session),
                    Flow::StageEntered => ticker.reset(),
                    Flow::Continue => {}
                }
            }
            _ = ticker.tick(), if timed => {
                if let Some(pending) = session.tick() {
                    println!("\n⏰ Time's up!");
                    show_result(&pending);
                    hold_result(&mut session, &mut input, pending).await?;
                    ticker.reset();
                    render(&session);
                } else if let Some(stage) = session.game().active_stage() {
                    announce_time(stage);
                }
            }
        }
    }
}

/// One tick per second, the first a full second from now.
fn clock() -> Interval {
    let mut ticker = interval_at(Instant::now() + TICK, TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

async fn handle_line<R>(session: &mut GameSession, input: &mut Lines<R>, line: &str) -> Result<Flow>
where
    R: AsyncBufRead + Unpin,
{
    debug!(line, "Input");
    let status = *session.game().state().status();
    match (status, line) {
        (GameStatus::Intro, ":quit") | (GameStatus::Completed, ":quit") => return Ok(Flow::Exit),
        (GameStatus::Intro, _) => {
            session.start();
            render(session);
            return Ok(Flow::StageEntered);
        }
        (GameStatus::Playing, ":quit") => {
            session.quit();
            print_intro(session);
        }
        (GameStatus::Playing, ":submit") => match session.submit() {
            Ok(pending) => {
                show_result(&pending);
                hold_result(session, input, pending).await?;
                render(session);
                return Ok(Flow::StageEntered);
            }
            Err(errors) => {
                println!("\nFix these before submitting:");
                for error in errors {
                    println!("  ✗ {}", error);
                }
            }
        },
        (GameStatus::Playing, "") => render(session),
        (GameStatus::Playing, edit) => apply_edit(session, edit),
        (GameStatus::Completed, ":restart") => {
            session.restart();
            print_intro(session);
        }
        (GameStatus::Completed, _) => println!("Type :restart to play again or :quit to exit."),
        (GameStatus::Failed, _) => return Ok(Flow::Exit),
    }
    Ok(Flow::Continue)
}

/// Keeps the stage result on screen for the display delay.
///
/// `:quit` typed meanwhile abandons the game and the held completion with
/// it; any other line is acknowledged and dropped while the delay runs on.
async fn hold_result<R>(
    session: &mut GameSession,
    input: &mut Lines<R>,
    pending: PendingCompletion,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let wait = pending.wait(session.display_delay());
    tokio::pin!(wait);

    loop {
        tokio::select! {
            pending = &mut wait => {
                session.deliver(pending);
                return Ok(());
            }
            line = input.next_line() => match line? {
                Some(line) if line.trim() == ":quit" => {
                    session.quit();
                    info!("Quit while a result was on screen");
                    return Ok(());
                }
                Some(line) => {
                    debug!(%line, "Input during result display ignored");
                    println!("  (showing the result; '{}' ignored)", line.trim());
                }
                None => {
                    let pending = (&mut wait).await;
                    session.deliver(pending);
                    return Ok(());
                }
            }
        }
    }
}

fn apply_edit(session: &mut GameSession, edit: &str) {
    let Some((key, raw)) = edit.split_once('=') else {
        println!("Enter `field = value`, :submit, or :quit.");
        return;
    };
    let Some(stage) = session.game().active_stage() else {
        return;
    };
    let Some(field) = resolve_field(stage, key.trim()).cloned() else {
        println!("No field '{}' on this stage.", key.trim());
        return;
    };

    let value = normalize_input(&field, raw.trim());
    let status = session.update_field(field.id(), value);
    let mark = match status {
        FieldStatus::Valid => "✓",
        FieldStatus::Invalid => "✗",
        FieldStatus::Pristine => " ",
    };
    println!("{} {}", mark, field.label());
}

fn resolve_field<'a>(stage: &'a StageController, key: &str) -> Option<&'a FieldDefinition> {
    let fields = stage.definition().fields();
    match key.parse::<usize>() {
        Ok(n) if (1..=fields.len()).contains(&n) => fields.get(n - 1),
        _ => stage.definition().field(key),
    }
}

/// Maps what the player typed onto the stored field value.
fn normalize_input(field: &FieldDefinition, raw: &str) -> String {
    match field.kind() {
        FieldKind::Checkbox => {
            let on = matches!(raw.to_ascii_lowercase().as_str(), "y" | "yes" | "true" | "x" | "1");
            on.to_string()
        }
        FieldKind::Select => {
            let options = field.options().as_deref().unwrap_or_default();
            match raw.parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => options[n - 1].clone(),
                _ => raw.to_string(),
            }
        }
        _ => raw.to_string(),
    }
}

// ─────────────────────────────────────────────────────────────
//  Rendering
// ─────────────────────────────────────────────────────────────

fn print_intro(session: &GameSession) {
    let game = session.game();
    println!("\n══ Strictly CRM: data-entry drill ══");
    println!(
        "Copy the reference material into each form as exactly as you can. {} stages.",
        game.state().total_stages()
    );
    for stage in game.stages() {
        let clock = match stage.time_limit_seconds() {
            Some(seconds) => format!(" ({}s)", seconds),
            None => String::new(),
        };
        println!("  {}. {}{}", stage.sequence_number(), stage.name(), clock);
    }
    println!("Press Enter to begin, or :quit to exit.");
}

fn render(session: &GameSession) {
    let game = session.game();
    if let Some(summary) = game.summary() {
        println!("\n══ Drill complete ══");
        println!("Score:    {}", summary.state().cumulative_score());
        println!("Accuracy: {}%", summary.state().cumulative_accuracy());
        println!("Errors:   {}", summary.total_errors());
        println!("Rating:   {}", summary.rating());
        for achievement in summary.achievements() {
            println!("  ★ {}", achievement);
        }
        println!("Type :restart to play again or :quit to exit.");
        return;
    }

    let Some(stage) = game.active_stage() else {
        print_intro(session);
        return;
    };
    let definition = stage.definition();
    println!(
        "\n── Stage {}/{}: {} ──",
        definition.sequence_number(),
        game.state().total_stages(),
        definition.name()
    );
    println!("{}", definition.description());
    println!("\nReference:\n{}\n", definition.reference_material());

    for (n, field) in definition.fields().iter().enumerate() {
        let mark = match stage.field_status().get(field.id()) {
            Some(FieldStatus::Valid) => "✓",
            Some(FieldStatus::Invalid) => "✗",
            _ => " ",
        };
        let required = if *field.required() { "*" } else { "" };
        let options = match field.options() {
            Some(options) => format!(" [{}]", options.join(" | ")),
            None => String::new(),
        };
        println!(
            "{} {:>2}. {}{} ({}){}: {}",
            mark,
            n + 1,
            field.label(),
            required,
            field.id(),
            options,
            stage.value(field.id()).unwrap_or("")
        );
    }

    for group in stage.group_progress() {
        println!("  {}: {}/{}", group.name(), group.valid(), group.total());
    }
    if let Some(seconds) = stage.time_remaining() {
        println!("Time remaining: {}s", seconds);
    }
    println!("Enter `field = value`, :submit, or :quit.");
}

fn announce_time(stage: &StageController) {
    if let Some(seconds) = stage.time_remaining() {
        if *seconds <= 10 || seconds % 15 == 0 {
            println!("  ({}s left)", seconds);
        }
    }
}

fn show_result(pending: &PendingCompletion) {
    let result = pending.completion().result();
    println!("\nStage {} result", result.stage());
    println!("  Score:    {}", result.score());
    println!("  Accuracy: {}%", result.accuracy());
    println!("  Errors:   {}", result.error_count());
    if let Some(seconds) = result.time_remaining() {
        println!("  Time left: {}s", seconds);
    }
}
