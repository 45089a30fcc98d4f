use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use blockquiz::bot::best_placement;
use blockquiz::driver::SessionDriver;
use blockquiz::logging::{DEFAULT_FILTER, init_tracing};
use blockquiz::logic::{BlockQuizInput, BlockQuizLogic};
use blockquiz::question::{BankQuestionService, QuestionBank, QuestionService};
use blockquiz::question_http::HttpQuestionService;
use blockquiz::session::{GameSession, Phase, PhaseKind, PlacementAttempt, SessionEvent};
use blockquiz::settings::{GameSettings, SettingsStore};
use clap::{Parser, Subcommand};
use engine::HeadlessRunner;
use engine::regression::{InputRecording, state_sha256_hex};

#[derive(Debug, Parser)]
#[command(name = "blockquiz")]
#[command(about = "Block-placement puzzle with a quiz side-channel")]
struct Cli {
    /// Settings file; defaults to BLOCKQUIZ_SETTINGS_PATH or the XDG config dir.
    #[arg(long, global = true)]
    settings: Option<PathBuf>,
    /// Log filter used when RUST_LOG is unset.
    #[arg(long, global = true, default_value = DEFAULT_FILTER)]
    log: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Play interactively on stdin/stdout.
    Play {
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Let the greedy bot play against the local question bank.
    Simulate {
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value_t = 200)]
        moves: usize,
        /// Answer every question wrong instead of right.
        #[arg(long, default_value_t = false)]
        wrong_answers: bool,
        /// Write the inputs and recorded history as JSON.
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Re-simulate a saved recording and check it against its history.
    Replay { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log);

    let store = match &cli.settings {
        Some(path) => SettingsStore::new(path),
        None => SettingsStore::from_env(),
    };
    let settings = store
        .load()
        .with_env_overrides(|name| std::env::var_os(name));
    tracing::debug!(path = %store.path().display(), ?settings, "settings resolved");

    match cli.command {
        Commands::Play { seed } => cmd_play(settings_with_seed(settings, seed)).await,
        Commands::Simulate {
            seed,
            moves,
            wrong_answers,
            save,
        } => cmd_simulate(
            &settings_with_seed(settings, seed),
            moves,
            wrong_answers,
            save.as_deref(),
        ),
        Commands::Replay { file } => cmd_replay(&settings, &file),
    }
}

fn settings_with_seed(mut settings: GameSettings, seed: Option<u64>) -> GameSettings {
    if let Some(seed) = seed {
        settings.seed = seed;
    }
    settings
}

fn question_bank(settings: &GameSettings) -> Result<QuestionBank> {
    match &settings.question_bank_path {
        Some(path) => QuestionBank::load_json_file(path)
            .with_context(|| format!("Failed to load question bank {}", path.display())),
        None => Ok(QuestionBank::builtin()),
    }
}

fn question_service(settings: &GameSettings) -> Result<Box<dyn QuestionService>> {
    if let Some(endpoint) = &settings.question_endpoint {
        let service = HttpQuestionService::new(endpoint)
            .with_context(|| format!("Invalid question endpoint {endpoint}"))?;
        tracing::info!(%endpoint, "using http question service");
        return Ok(Box::new(service));
    }
    Ok(Box::new(BankQuestionService::new(question_bank(settings)?)))
}

async fn cmd_play(settings: GameSettings) -> Result<()> {
    let service = question_service(&settings)?;
    let session = GameSession::new_game(settings.session_config());
    let mut driver =
        SessionDriver::new(session, service).with_request_timeout(settings.question_request_timeout());
    driver.start();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print_session(driver.session());
        let asked_at = Instant::now();
        match driver.session().phase_kind() {
            PhaseKind::GameOver => prompt("game over. `new` or `quit`> ")?,
            PhaseKind::AwaitingAnswer => prompt("answer number> ")?,
            _ => prompt("<slot> <row> <col> | new | quit> ")?,
        }
        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("Failed to read stdin")?;
        if expire_answer(&mut driver, asked_at.elapsed()) {
            println!("too slow, that counts as wrong");
            continue;
        }
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            [] => continue,
            ["quit"] | ["q"] => break,
            ["new"] => {
                driver.new_game();
            }
            [choice] if driver.session().phase_kind() == PhaseKind::AwaitingAnswer => {
                let Some(index) = option_index(choice) else {
                    println!("enter an option number from the list");
                    continue;
                };
                match driver.answer_index(index) {
                    Ok(events) => print_events(&events),
                    Err(err) => println!("{err}"),
                }
            }
            [slot, row, col] => {
                let (Ok(slot), Ok(row), Ok(col)) = (slot.parse(), row.parse(), col.parse())
                else {
                    println!("expected three numbers");
                    continue;
                };
                match driver.place(PlacementAttempt::new(slot, row, col)).await {
                    Ok(events) => print_events(&events),
                    Err(err) => println!("{err}"),
                }
            }
            _ => println!("unrecognized input"),
        }
    }

    let session = driver.session();
    println!(
        "final score {} ({} lines, {}/{} correct)",
        session.score(),
        session.stats().lines_cleared,
        session.stats().questions_correct,
        session.stats().questions_answered
    );
    Ok(())
}

fn cmd_simulate(
    settings: &GameSettings,
    moves: usize,
    wrong_answers: bool,
    save: Option<&Path>,
) -> Result<()> {
    let logic = BlockQuizLogic::new(settings.session_config(), question_bank(settings)?);
    let mut runner = HeadlessRunner::new(logic);
    let mut inputs = Vec::new();

    for _ in 0..moves {
        let state = runner.state();
        let input = match state.phase() {
            Phase::AwaitingAnswer { question, .. } => {
                let correct = question
                    .options
                    .iter()
                    .position(|option| *option == question.answer)
                    .unwrap_or(0);
                let index = if wrong_answers {
                    (correct + 1) % question.options.len().max(1)
                } else {
                    correct
                };
                BlockQuizInput::Answer(index)
            }
            Phase::Playing => match best_placement(state) {
                Some(attempt) => BlockQuizInput::Place(attempt),
                None => break,
            },
            _ => break,
        };
        inputs.push(input);
        runner.step(input);
    }

    let session = runner.state();
    println!(
        "frames {} score {} lines {} correct {}/{} phase {}",
        runner.frame(),
        session.score(),
        session.stats().lines_cleared,
        session.stats().questions_correct,
        session.stats().questions_answered,
        session.phase_kind()
    );

    if let Some(path) = save {
        InputRecording::new(inputs, runner.timemachine().clone())
            .save_json_file(path)
            .with_context(|| format!("Failed to save recording to {}", path.display()))?;
        println!("saved {}", path.display());
    }
    Ok(())
}

fn cmd_replay(settings: &GameSettings, file: &Path) -> Result<()> {
    let recording = InputRecording::<GameSession, BlockQuizInput>::load_json_file(file)
        .with_context(|| format!("Failed to load recording {}", file.display()))?;
    let logic = BlockQuizLogic::new(settings.session_config(), question_bank(settings)?);
    let runner = recording
        .replay(logic)
        .with_context(|| format!("Replay of {} does not match its history", file.display()))?;

    let session = runner.state();
    if session.phase_kind() == PhaseKind::Idle {
        bail!("recording {} never started a game", file.display());
    }
    let hash = state_sha256_hex(session).context("Failed to hash final state")?;
    print_session(session);
    println!(
        "replayed {} inputs, score {} phase {} sha256 {}",
        recording.inputs.len(),
        session.score(),
        session.phase_kind(),
        hash
    );
    Ok(())
}

/// Counts the time spent at the prompt against a pending answer. Returns
/// true when that ran the answer timer out.
fn expire_answer<S: QuestionService>(driver: &mut SessionDriver<S>, elapsed: Duration) -> bool {
    if driver.session().phase_kind() != PhaseKind::AwaitingAnswer {
        return false;
    }
    driver
        .tick(elapsed)
        .iter()
        .any(|event| matches!(event, SessionEvent::AnswerResolved { timed_out: true, .. }))
}

/// Options are shown numbered from 1.
fn option_index(input: &str) -> Option<usize> {
    input.parse::<usize>().ok()?.checked_sub(1)
}

fn prompt(text: &str) -> Result<()> {
    print!("{text}");
    io::stdout().flush().context("Failed to flush stdout")
}

fn print_session(session: &GameSession) {
    println!();
    print!("{}", session.grid());
    println!(
        "score {}  difficulty {}  streak {}",
        session.score(),
        session.difficulty(),
        session.streak().current
    );
    for (slot, shape) in session.pieces().slots().iter().enumerate() {
        match shape {
            Some(shape) => {
                println!("slot {slot}: {}", shape.label());
                for line in shape.preview_lines() {
                    println!("    {line}");
                }
            }
            None => println!("slot {slot}: -"),
        }
    }
    match session.phase() {
        Phase::AwaitingAnswer { question, timer } => {
            println!("Q: {}", question.question);
            for (index, option) in question.options.iter().enumerate() {
                println!("  {}. {option}", index + 1);
            }
            if let Some(timer) = timer {
                println!("  ({}s to answer)", timer.remaining().as_secs());
            }
        }
        Phase::GameOver { reason } => println!("game over: {reason:?}"),
        _ => {}
    }
}

fn print_events(events: &[SessionEvent]) {
    for event in events {
        match event {
            SessionEvent::PiecePlaced { delta, .. } => println!("+{}", delta.total()),
            SessionEvent::LinesCleared { rows, cols, .. } => {
                println!("cleared rows {rows:?} cols {cols:?}")
            }
            SessionEvent::AnswerResolved { outcome, .. } => {
                if outcome.correct {
                    println!("correct! +{}", outcome.bonus);
                } else {
                    println!("wrong");
                }
            }
            _ => {}
        }
    }
}
