mod config;
mod console;

use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use services::{AssessmentService, Clock, SessionGate, StaticCredentialValidator};
use storage::{
    BuiltinCatalog, FileSessionStore, InMemorySessionStore, JsonQuestionBank, QuestionRepository,
    SessionStore,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::console::{Console, Flow};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidPath { flag: &'static str, raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidPath { flag, raw } => write!(f, "invalid {flag} value: {raw:?}"),
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

fn require_path(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<PathBuf, ArgsError> {
    let value = require_value(args, flag)?;
    if value.trim().is_empty() {
        return Err(ArgsError::InvalidPath { flag, raw: value });
    }
    Ok(PathBuf::from(value))
}

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    session_file: Option<PathBuf>,
    verbose: bool,
    help: bool,
}

impl Args {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => parsed.config = Some(require_path(&mut args, "--config")?),
                "--session-file" => {
                    parsed.session_file = Some(require_path(&mut args, "--session-file")?);
                }
                "--verbose" | "-v" => parsed.verbose = true,
                "--help" | "-h" => parsed.help = true,
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }
        Ok(parsed)
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--config <file.toml>] [--session-file <jar.json>] [--verbose]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  sessions are kept in memory; questions come from the built-in CIS catalog");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  ASSESS_CONFIG, ASSESS_SESSION_FILE, ASSESS_LOGIN_DELAY_MS, RUST_LOG");
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn build_console(config: &AppConfig, clock: Clock) -> Console {
    let sessions: Arc<dyn SessionStore> = match &config.session_file {
        Some(path) => {
            tracing::info!(path = %path.display(), "persisting session flags");
            Arc::new(FileSessionStore::new(path, clock))
        }
        None => Arc::new(InMemorySessionStore::new(clock)),
    };
    let questions: Arc<dyn QuestionRepository> = match &config.question_bank {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading question bank");
            Arc::new(JsonQuestionBank::new(path))
        }
        None => Arc::new(BuiltinCatalog),
    };

    let validator = StaticCredentialValidator::new(
        config.credentials.email.clone(),
        config.credentials.password.clone(),
    );
    let gate = SessionGate::new(sessions, Arc::new(validator))
        .with_ttl(config.session_ttl())
        .with_login_delay(config.login_delay());
    let assessments = AssessmentService::new(clock, questions).with_binding(config.binding);

    Console::new(gate, assessments)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse(std::env::args().skip(1)).inspect_err(|_| print_usage())?;
    if args.help {
        print_usage();
        return Ok(());
    }
    init_tracing(args.verbose);

    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(path) = args.session_file {
        config.session_file = Some(path);
    }

    let mut console = build_console(&config, Clock::system());
    let mut stdout = std::io::stdout();
    console.start(&mut stdout).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if console.handle_line(&line, &mut stdout).await? == Flow::Quit {
            break;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // Binary glue: report once and exit.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
