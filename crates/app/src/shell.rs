use std::time::Duration;

use services::{
    AppServices, CompletionOutcome, ExerciseError, ExerciseLoopService, ExerciseRun,
};
use shapeville_core::curriculum::Curriculum;
use shapeville_core::model::{KeyStage, ModuleId, Problem};
use shapeville_core::session::{SessionState, Verdict};
use shapeville_core::time::format_countdown;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::problems;

/// Seconds between countdown reminders.
const REMINDER_EVERY: u32 = 30;

pub fn print_modules(curriculum: &Curriculum) {
    for module in curriculum.modules() {
        let timer = module
            .time_budget_secs()
            .map_or_else(|| "untimed".to_string(), format_countdown);
        println!(
            "{:<10} {:<46} {} {:>2} exercises, {}",
            module.id(),
            module.title(),
            module.stage().as_str().to_uppercase(),
            module.variants().len(),
            timer
        );
    }
}

pub fn print_status(
    services: &AppServices,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let view = services.exercises().view()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("{}: {:.1}%", KeyStage::Ks1, view.ks1_percent);
    println!("{}: {:.1}%", KeyStage::Ks2, view.ks2_percent);
    println!("Score: {}", view.total_score);
    for module in &view.modules {
        let mark = if module.is_complete { "*" } else { " " };
        println!(
            "{mark} {:<10} {:>2}/{:<2} {:>3} pts  {}",
            module.module, module.completed, module.total, module.points, module.title
        );
    }
    Ok(())
}

/// Play one round of `module` on stdin/stdout.
pub async fn play(
    services: &AppServices,
    module: ModuleId,
) -> Result<(), Box<dyn std::error::Error>> {
    let exercises = services.exercises();
    let spec = exercises.book().module_spec(module)?;

    let plan = exercises.plan_round(module).await?;
    if plan.reset_required {
        println!("Starting {} again from the beginning.", spec.title());
    }

    let limits = exercises.limits_for(module)?;
    let questions: Vec<Problem> = {
        let mut rng = rand::rng();
        plan.variants
            .iter()
            .map(|key| problems::generate(spec, key, limits, &mut rng))
            .collect::<Result<_, _>>()?
    };

    println!("{} ({} questions). Type 'quit' to stop.", spec.title(), questions.len());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    for (index, problem) in questions.into_iter().enumerate() {
        let mut run = exercises.start(problem)?;
        println!();
        println!("Q{}. {}", index + 1, run.prompt());
        print_limits(&run);

        let timed = run.session().remaining_secs().is_some();
        let mut ticker = tokio::time::interval(Duration::from_secs(1));
        // The first tick completes immediately.
        ticker.tick().await;

        let completion = loop {
            tokio::select! {
                _ = ticker.tick(), if timed => {
                    let step = exercises.tick(&mut run).await?;
                    if let Some(err) = step.persist_error {
                        resync(&exercises, &err).await;
                    }
                    if let Some(completion) = step.completion {
                        break completion;
                    }
                    if let Some(secs) = step.tick.seconds_left {
                        if secs > 0 && secs % REMINDER_EVERY == 0 {
                            println!("  {} left", format_countdown(secs));
                        }
                    }
                }
                line = lines.next_line() => {
                    let Some(raw) = line? else {
                        run.abandon();
                        return Ok(());
                    };
                    if raw.trim().eq_ignore_ascii_case("quit") {
                        run.abandon();
                        println!("Bye!");
                        return Ok(());
                    }

                    let step = exercises.submit(&mut run, &raw).await?;
                    match step.outcome.verdict {
                        Verdict::Correct => println!("  Correct!"),
                        Verdict::Incorrect if step.completion.is_none() => println!(
                            "  Not quite. {} attempt(s) left.",
                            step.outcome.attempts_remaining
                        ),
                        Verdict::Incorrect => {}
                        Verdict::Invalid(reason) => println!("  {}", reason.message()),
                    }
                    if let Some(err) = step.persist_error {
                        resync(&exercises, &err).await;
                    }
                    if let Some(completion) = step.completion {
                        break completion;
                    }
                }
            }
        };

        report(&run, &completion, spec.title());
    }

    let view = exercises.view()?;
    let stage = module.stage();
    println!();
    println!(
        "Round over. Score: {}. {}: {:.1}%",
        services.score_board().total(),
        stage,
        view.percent(stage)
    );
    Ok(())
}

/// Retry a failed save once; the round goes on either way.
async fn resync(exercises: &ExerciseLoopService, err: &ExerciseError) {
    eprintln!("  (progress not saved: {err})");
    if let Err(retry) = exercises.sync().await {
        log::warn!("sync after a failed save also failed: {retry}");
    }
}

fn print_limits(run: &ExerciseRun) {
    let attempts = run.session().attempts_remaining();
    match run.session().remaining_secs() {
        Some(secs) => println!("  {attempts} attempts, {} on the clock", format_countdown(secs)),
        None => println!("  {attempts} attempts"),
    }
}

fn report(run: &ExerciseRun, completion: &CompletionOutcome, title: &str) {
    let answer = run.session().answer_key().reveal();
    match completion.state {
        SessionState::CorrectlySolved => println!("  +{} point(s)", completion.points),
        SessionState::ExhaustedAttempts => println!("  Out of attempts. The answer was {answer}."),
        SessionState::TimedOut => println!("  Time's up! The answer was {answer}."),
        SessionState::Active => {}
    }
    if completion.module_complete {
        println!("  You have completed every exercise in {title}!");
    }
}
