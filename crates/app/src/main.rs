use std::fmt;
use std::io::Stdout;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use quiz_core::model::KnowledgeBase;
use services::{AppServices, Clock, LearningSession, Presenter};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::info;

mod command;
mod terminal;

use command::Command;
use terminal::TerminalPresenter;

const BUNDLED_KNOWLEDGE: &str = include_str!("../data/knowledge-base.json");

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidKnowledgePath { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidKnowledgePath { raw } => {
                write!(f, "invalid --knowledge value: {raw}")
            }
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
    eprintln!("  cargo run -p app -- [--db <sqlite_url>] [--knowledge <path>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://progress.sqlite3");
    eprintln!("  --knowledge <bundled knowledge base>");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_KNOWLEDGE_PATH, RUST_LOG");
}

#[derive(Debug, PartialEq, Eq)]
struct Args {
    db_url: String,
    knowledge: Option<PathBuf>,
}

enum Parsed {
    Run(Args),
    Help,
}

impl Args {
    fn parse(
        args: &mut impl Iterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Parsed, ArgsError> {
        let mut db_url = env("QUIZ_DB_URL")
            .filter(|value| !value.trim().is_empty())
            .map_or_else(|| "sqlite://progress.sqlite3".into(), normalize_sqlite_url);
        let mut knowledge = env("QUIZ_KNOWLEDGE_PATH")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--knowledge" => {
                    let value = require_value(args, "--knowledge")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidKnowledgePath { raw: value });
                    }
                    knowledge = Some(PathBuf::from(value));
                }
                "--help" | "-h" => return Ok(Parsed::Help),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Parsed::Run(Self { db_url, knowledge }))
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
    let path = Path::new(&path_str);
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

    let path = Path::new(path);
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

async fn load_knowledge(path: Option<&Path>) -> Result<KnowledgeBase, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(KnowledgeBase::from_json(BUNDLED_KNOWLEDGE)?);
    };
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|err| format!("cannot read knowledge base {}: {err}", path.display()))?;
    KnowledgeBase::from_json(&text)
        .map_err(|err| format!("invalid knowledge base {}: {err}", path.display()).into())
}

type Session = LearningSession<TerminalPresenter<Stdout>>;
type InputLines = Lines<BufReader<Stdin>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

async fn execute(
    session: &mut Session,
    command: Command,
    input: &mut InputLines,
) -> Result<Flow, Box<dyn std::error::Error>> {
    match command {
        Command::Chapters => {
            let snapshot = session.snapshot().clone();
            let chapters = session.engine().chapter_overview(&snapshot);
            session
                .presenter_mut()
                .render_chapter_list(&chapters, &snapshot);
        }
        Command::Chapter(id) => {
            if !session.select_chapter(id).await {
                let note = if session.snapshot().current_chapter == id {
                    format!("Already in chapter {id}.")
                } else if session.engine().knowledge().contains_chapter(id) {
                    format!("Chapter {id} is still locked.")
                } else {
                    format!("Chapter {id} does not exist.")
                };
                session.presenter_mut().message(note);
            }
        }
        Command::Pick(index) => {
            if let Err(err) = session.select_option(index) {
                session.presenter_mut().error(err);
            } else if session.visit().is_checked() {
                session
                    .presenter_mut()
                    .message("Already checked. Type `next` to continue.");
            }
        }
        Command::Next => match session.next_topic().await {
            Ok(_) => {}
            // The presenter already prompted for a pick.
            Err(err) if err.is_no_selection() => {}
            Err(err) => session.presenter_mut().error(err),
        },
        Command::Prev => {
            if !session.prev_topic().await {
                session
                    .presenter_mut()
                    .message("Already at the first topic of this chapter.");
            }
        }
        Command::Stats => {
            let snapshot = session.snapshot().clone();
            let summary = session.progress_summary();
            session.presenter_mut().render_stats(&snapshot, summary);
        }
        Command::Export(path) => {
            let text = match session.export() {
                Ok(text) => text,
                Err(err) => {
                    session.presenter_mut().error(err);
                    return Ok(Flow::Continue);
                }
            };
            match path {
                Some(path) => match tokio::fs::write(&path, text).await {
                    Ok(()) => session
                        .presenter_mut()
                        .message(format!("Progress written to {}.", path.display())),
                    Err(err) => session
                        .presenter_mut()
                        .error(format!("cannot write {}: {err}", path.display())),
                },
                None => session.presenter_mut().message(text),
            }
        }
        Command::Import(path) => match tokio::fs::read_to_string(&path).await {
            Ok(text) => match session.import(&text).await {
                Ok(()) => session.presenter_mut().message("Progress imported."),
                Err(err) => session.presenter_mut().error(err),
            },
            Err(err) => session
                .presenter_mut()
                .error(format!("cannot read {}: {err}", path.display())),
        },
        Command::Reset => {
            session
                .presenter_mut()
                .message("Reset all progress? This cannot be undone. [y/N]");
            session.presenter_mut().prompt();
            let answer = input.next_line().await?.unwrap_or_default();
            if matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes") {
                match session.reset().await {
                    Ok(()) => session.presenter_mut().message("Progress reset."),
                    Err(err) => session.presenter_mut().error(err),
                }
            } else {
                session.presenter_mut().message("Nothing changed.");
            }
        }
        Command::Help => session.presenter_mut().help(),
        Command::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let parsed = match Args::parse(&mut argv, |key| std::env::var(key).ok()) {
        Ok(Parsed::Run(args)) => args,
        Ok(Parsed::Help) => {
            print_usage();
            return Ok(());
        }
        Err(err) => {
            eprintln!("{err}");
            print_usage();
            return Err(err.into());
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let knowledge = load_knowledge(parsed.knowledge.as_deref()).await?;
    info!(
        chapters = knowledge.chapter_count(),
        topics = knowledge.total_topics(),
        "knowledge base loaded"
    );

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let services =
        AppServices::new_sqlite(&parsed.db_url, Clock::system(), Arc::new(knowledge)).await?;

    let mut session = services
        .start_session(TerminalPresenter::new(std::io::stdout()))
        .await;
    session
        .presenter_mut()
        .message("Type `help` for commands.");

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    loop {
        session.presenter_mut().prompt();
        let Some(line) = input.next_line().await? else {
            break;
        };
        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                session.presenter_mut().error(err);
                continue;
            }
        };
        if execute(&mut session, command, &mut input).await? == Flow::Quit {
            break;
        }
    }

    info!("session ended");
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str], env: &[(&str, &str)]) -> Result<Parsed, ArgsError> {
        let mut iter = args.iter().map(|arg| (*arg).to_string());
        Args::parse(&mut iter, |key| {
            env.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value).to_string())
        })
    }

    fn run_args(parsed: Result<Parsed, ArgsError>) -> Args {
        match parsed {
            Ok(Parsed::Run(args)) => args,
            Ok(Parsed::Help) => panic!("unexpected help"),
            Err(err) => panic!("unexpected error: {err}"),
        }
    }

    #[test]
    fn defaults_apply_without_args() {
        let args = run_args(parse(&[], &[]));
        assert_eq!(args.db_url, "sqlite://progress.sqlite3");
        assert_eq!(args.knowledge, None);
    }

    #[test]
    fn flags_override_environment() {
        let args = run_args(parse(
            &["--db", "sqlite::memory:", "--knowledge", "kb.json"],
            &[
                ("QUIZ_DB_URL", "sqlite://env.sqlite3"),
                ("QUIZ_KNOWLEDGE_PATH", "env.json"),
            ],
        ));
        assert_eq!(args.db_url, "sqlite::memory:");
        assert_eq!(args.knowledge, Some(PathBuf::from("kb.json")));
    }

    #[test]
    fn environment_fills_in_missing_flags() {
        let args = run_args(parse(&[], &[("QUIZ_KNOWLEDGE_PATH", "env.json")]));
        assert_eq!(args.knowledge, Some(PathBuf::from("env.json")));
    }

    #[test]
    fn rejects_unknown_and_incomplete_args() {
        assert!(matches!(
            parse(&["--db"], &[]),
            Err(ArgsError::MissingValue { flag: "--db" })
        ));
        assert!(matches!(
            parse(&["--verbose"], &[]),
            Err(ArgsError::UnknownArg(_))
        ));
        assert!(matches!(parse(&["--help"], &[]), Ok(Parsed::Help)));
    }

    #[test]
    fn relative_sqlite_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:data/progress.sqlite3".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/progress.sqlite3"));
    }

    #[test]
    fn bundled_knowledge_base_is_valid() {
        let kb = KnowledgeBase::from_json(BUNDLED_KNOWLEDGE).unwrap();
        assert!(kb.chapter_count() >= 2);
    }
}
