mod logging;

use std::borrow::Cow::{self, Borrowed, Owned};
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Parser;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use parley_application::{SessionFactory, SessionOrchestrator, TurnReply};
use parley_core::ParleyError;
use parley_infrastructure::{AppConfig, ParleyPaths};

const REGENERATE_COMMAND: &str = "/regenerate";
const EXIT_COMMAND: &str = "exit";

#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(about = "Parley - talk with a persona over a durable, self-compacting session", long_about = None)]
struct Cli {
    /// Data directory (defaults to the platform config directory)
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// Persona to talk with, overriding config.toml
    #[arg(long)]
    persona: Option<String>,

    /// Generation preset, overriding config.toml
    #[arg(long)]
    preset: Option<String>,

    /// Log level for the log file, overriding config.toml
    #[arg(long)]
    log_level: Option<String>,
}

/// CLI helper for rustyline that provides command completion, highlighting, and hints.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: vec![REGENERATE_COMMAND.to_string()],
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else if line.is_empty() {
            Borrowed(line)
        } else {
            Owned(line.green().to_string())
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

/// Loads settings: config.toml, then environment, then command-line flags.
fn load_config(cli: &Cli, paths: &ParleyPaths) -> Result<AppConfig> {
    let config_file = paths.app_config_file();
    let mut config = AppConfig::load(&config_file)
        .with_context(|| format!("failed to load {}", config_file.display()))?;
    config.apply_env_overrides(|key| std::env::var(key).ok());

    if let Some(persona) = &cli.persona {
        config.session.persona = persona.clone();
    }
    if let Some(preset) = &cli.preset {
        config.session.preset = preset.clone();
    }
    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone();
    }

    config.validate().context("invalid settings")?;
    Ok(config)
}

fn print_reply(session: &SessionOrchestrator, reply: &TurnReply) {
    println!("{}", format!("[{}]", session.persona_name()).bright_magenta());
    for line in reply.content.lines() {
        println!("{}", line.bright_blue());
    }
    println!();

    if let Err(e) = &reply.compaction {
        eprintln!(
            "{}",
            format!("History compaction skipped this turn: {e}").yellow()
        );
    }
}

fn print_turn_error(error: &ParleyError) {
    eprintln!("{}", format!("Error: {error}").red());
    if error.is_retryable() {
        eprintln!(
            "{}",
            format!("Your message was kept. Type '{REGENERATE_COMMAND}' to try again.").yellow()
        );
    }
}

/// Entry point for the Parley REPL.
///
/// Sets up configuration and logging, starts one session, and runs turns
/// until the user types `exit` or presses Ctrl-D. Turns are awaited inline,
/// so a new message is only read once the previous reply is recorded.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ===== Configuration & Logging =====
    let paths = ParleyPaths::new(cli.config_dir.as_deref())?;
    let config = load_config(&cli, &paths)?;
    let _log_guard = logging::init(&config.log_level, &paths.logs_dir())
        .context("failed to initialize logging")?;

    // ===== Session Startup =====
    let factory = SessionFactory::new(config, paths);
    let request = factory.default_request();
    let mut session = match factory.start_session(&request).await {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(error = %e, persona = %request.persona, preset = %request.preset, "Failed to start session");
            eprintln!("{}", format!("Could not start session: {e}").red());
            return Err(e.into());
        }
    };

    // ===== REPL Setup =====
    let mut rl = Editor::new().context("failed to create line editor")?;
    rl.set_helper(Some(CliHelper::new()));

    println!(
        "{}",
        format!("=== Parley: {} ===", session.persona_name())
            .bright_magenta()
            .bold()
    );
    println!(
        "{}",
        format!(
            "Preset '{}'. Session log: {}",
            session.preset().name,
            session.state().log_location()
        )
        .bright_black()
    );
    println!(
        "{}",
        format!("Type '{REGENERATE_COMMAND}' to retry a reply, or '{EXIT_COMMAND}' to leave.")
            .bright_black()
    );
    println!();

    // ===== Main REPL Loop =====
    loop {
        let readline = rl.readline(&format!("{}> ", session.user_name()));

        match readline {
            Ok(line) => {
                let trimmed = line.trim();

                if trimmed.eq_ignore_ascii_case(EXIT_COMMAND) {
                    break;
                }

                if trimmed.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(trimmed);

                let result = if trimmed == REGENERATE_COMMAND {
                    session.regenerate().await
                } else {
                    session.submit_turn(trimmed).await
                };

                match result {
                    Ok(reply) => print_reply(&session, &reply),
                    Err(e) => print_turn_error(&e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", format!("CTRL-C detected. Type '{EXIT_COMMAND}' to leave.").yellow());
            }
            Err(ReadlineError::Eof) => {
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {err:?}").red());
                break;
            }
        }
    }

    // ===== Shutdown =====
    if let Err(e) = session.end().await {
        tracing::error!(error = %e, "Failed to record session end");
        eprintln!("{}", format!("Could not record session end: {e}").red());
    }
    println!("{}", "Goodbye!".bright_green());

    Ok(())
}
