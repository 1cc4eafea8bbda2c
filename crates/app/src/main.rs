use std::fmt;
use std::path::PathBuf;

use services::{
    AppServices, OnboardingEvent, OnboardingService, QuizConfig, QuizLoad, RemoteConfig,
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

mod console;

use console::{Input, parse_input, render_answers, render_question};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- run   [--db <sqlite_url>] [--remote-url <url>]");
    eprintln!("                            [--remote-key <key>] [--fallback <path>] [--verbose]");
    eprintln!("  cargo run -p app -- reset [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults for run:");
    eprintln!("  --db sqlite://quiz.sqlite3");
    eprintln!("  bundled quiz when --fallback is not given");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_REMOTE_URL, QUIZ_REMOTE_KEY, QUIZ_REMOTE_TIMEOUT_SECS,");
    eprintln!("  QUIZ_FALLBACK_PATH, QUIZ_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Run,
    Reset,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "run" => Some(Self::Run),
            "reset" => Some(Self::Reset),
            _ => None,
        }
    }
}

struct Args {
    config: QuizConfig,
    verbose: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut config = QuizConfig::from_env();
        let mut verbose = false;
        let mut remote_key = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    config.db_url = value;
                }
                "--remote-url" => {
                    let url = require_value(args, "--remote-url")?;
                    config.remote = Some(RemoteConfig::new(url));
                }
                "--remote-key" => {
                    remote_key = Some(require_value(args, "--remote-key")?);
                }
                "--fallback" => {
                    config.fallback_path = Some(PathBuf::from(require_value(args, "--fallback")?));
                }
                "--verbose" | "-v" => verbose = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        if let (Some(remote), Some(key)) = (config.remote.as_mut(), remote_key) {
            remote.key = key;
        }
        config.db_url = normalize_sqlite_url(config.db_url);
        Ok(Self { config, verbose })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_env("QUIZ_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| format!("failed to initialize tracing subscriber: {err}"))?;
    Ok(())
}

async fn prompt(lines: &mut Lines<BufReader<Stdin>>) -> std::io::Result<Option<String>> {
    lines.next_line().await
}

async fn load_quiz(
    onboarding: &mut OnboardingService,
    lines: &mut Lines<BufReader<Stdin>>,
) -> Result<bool, Box<dyn std::error::Error>> {
    println!("{}", onboarding.intro().title);
    loop {
        match onboarding.take_quiz().await {
            QuizLoad::Loaded(quiz) => {
                if let Some(title) = quiz.title() {
                    println!("{title}");
                }
                return Ok(true);
            }
            QuizLoad::Failed(reason) => {
                eprintln!("Could not load the quiz: {reason}");
                println!("Retry? [y/N]");
                let answer = prompt(lines).await?.unwrap_or_default();
                if !answer.trim().eq_ignore_ascii_case("y") {
                    return Ok(false);
                }
            }
        }
    }
}

async fn run_quiz(mut onboarding: OnboardingService) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    if !load_quiz(&mut onboarding, &mut lines).await? {
        return Ok(());
    }
    println!("{}", console::HELP);

    loop {
        let Some(flow) = onboarding.flow() else {
            return Ok(());
        };
        println!("{}", render_question(flow));

        let Some(line) = prompt(&mut lines).await? else {
            onboarding.save_progress().await?;
            return Ok(());
        };

        match parse_input(&line, flow.current_question()) {
            Input::Action(action) => {
                if let Some(OnboardingEvent::FlowFinished(answers)) =
                    onboarding.dispatch(action).await?
                {
                    println!("Thanks! Your answers:");
                    print!("{}", render_answers(&answers));
                    return Ok(());
                }
            }
            Input::Quit => {
                onboarding.save_progress().await?;
                println!("Progress saved. Run again to resume.");
                return Ok(());
            }
            Input::Help => println!("{}", console::HELP),
            Input::Invalid(reason) => eprintln!("{reason}"),
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: run the quiz when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Run,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with('-') => Command::Run,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with('-') {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    init_tracing(parsed.verbose)?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.config.db_url)?;
    let services = AppServices::new_sqlite(&parsed.config).await?;
    tracing::debug!(db = %parsed.config.db_url, remote = parsed.config.remote.is_some(), "services ready");

    match cmd {
        Command::Run => run_quiz(services.onboarding()).await,
        Command::Reset => {
            services.onboarding().reset().await?;
            println!("Saved quiz progress cleared.");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
