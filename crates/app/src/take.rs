use std::time::Duration;

use anyhow::Context;
use exam_core::model::{TestId, UserId};
use exam_core::{Tick, Urgency};
use services::{AppServices, SessionController, SessionPhase};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::input::{self, Command};
use crate::render;

enum Flow {
    Continue,
    Finished,
    Leave,
}

/// Whether to print the clock for this many seconds left.
fn announce(remaining: u64, previous: Urgency, now: Urgency) -> bool {
    previous != now || (remaining > 0 && remaining % 300 == 0) || (1..=10).contains(&remaining)
}

fn show_current(session: &SessionController) {
    let total = session.test().map_or(0, |t| t.question_count());
    if let Some(view) = session.current_question() {
        render::question(&view, total, &session.timer_display());
    }
}

/// Run one interactive attempt against stdin.
pub async fn run(services: &AppServices, user_id: UserId, test_id: TestId) -> anyhow::Result<()> {
    let mut session = services.new_session(user_id);
    session
        .load(&test_id)
        .await
        .with_context(|| format!("cannot start test {test_id}"))?;

    if let Some(test) = session.test() {
        render::banner(test);
    }
    if session.progress().is_some_and(|p| p.answered > 0) {
        println!("Resuming your previous answers.");
    }
    show_current(&session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    let mut urgency = session.urgency();
    let mut confirming = false;

    loop {
        let flow = tokio::select! {
            _ = ticker.tick() => match session.tick().await {
                Tick::Running { remaining } => {
                    let now = session.urgency();
                    if announce(remaining, urgency, now) {
                        println!("[{} left]", session.timer_display());
                    }
                    urgency = now;
                    Flow::Continue
                }
                Tick::Expired => {
                    println!();
                    println!("Time is up.");
                    Flow::Finished
                }
                Tick::Stopped => Flow::Finished,
            },
            line = lines.next_line() => match line? {
                Some(line) if confirming => {
                    confirming = false;
                    if input::is_yes(&line) {
                        session.submit().await;
                        Flow::Finished
                    } else {
                        show_current(&session);
                        Flow::Continue
                    }
                }
                Some(line) => handle(&mut session, &line, &mut confirming),
                None => Flow::Leave,
            },
        };

        match flow {
            Flow::Continue => {}
            Flow::Finished => break,
            Flow::Leave => {
                session.abandon().await;
                println!("Left the test. Your answers are saved.");
                return Ok(());
            }
        }
    }

    debug!(phase = ?session.phase(), "attempt loop finished");
    if session.phase() == SessionPhase::Completed {
        if let (Some(test), Some(outcome)) = (session.test(), session.outcome()) {
            render::result(test, &outcome.result, outcome.persisted);
        }
    }
    Ok(())
}

fn handle(session: &mut SessionController, line: &str, confirming: &mut bool) -> Flow {
    match input::parse(line) {
        Command::Answer(option) => {
            if session.answer(option).is_none() {
                println!("No option {}.", option + 1);
                return Flow::Continue;
            }
        }
        Command::Next => {
            session.next();
        }
        Command::Previous => {
            session.previous();
        }
        Command::Goto(index) => {
            session.select_question(index);
        }
        Command::Bookmark => {
            session.toggle_bookmark();
        }
        Command::Clear => {
            session.clear_answer();
        }
        Command::Overview => {
            render::overview(session);
            return Flow::Continue;
        }
        Command::Submit => {
            if let Some(preview) = session.submission_preview() {
                render::preview(&preview);
                *confirming = true;
            }
            return Flow::Continue;
        }
        Command::Quit => return Flow::Leave,
        Command::Help => {
            println!("{}", input::HELP);
            return Flow::Continue;
        }
        Command::Unknown => {
            println!("Unknown command, type h for help.");
            return Flow::Continue;
        }
    }
    show_current(session);
    Flow::Continue
}
