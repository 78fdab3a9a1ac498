//! SecureTodo - Local to-do list gated by biometric authentication
//!
//! Terminal front end: every to-do command requires a valid session, and the
//! session slides forward each time one is used.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use securetodo::{
    auth::{AuthManager, AuthOutcome, NoticeAction, SessionCountdown},
    biometric::ConsoleBiometrics,
    clock::SystemClock,
    config::{Config, ConfigManager},
    input::LineReader,
    storage::{FileStore, KeyValueStore, MemoryStore},
    todo::{Todo, TodoError, TodoList, TodoStore},
};

/// CLI arguments for SecureTodo
#[derive(Parser, Debug)]
#[command(name = "securetodo")]
#[command(about = "SecureTodo - Local to-do list gated by biometric authentication")]
#[command(version)]
#[command(long_about = "
SecureTodo - Local to-do list gated by biometric authentication

Configuration priority (highest to lowest):
1. Command-line arguments
2. Configuration file
3. Environment variables
4. Built-in defaults

Environment variables:
  SECURETODO_MAX_FAILED_ATTEMPTS - Failed attempts before lockout
  SECURETODO_LOCKOUT_DURATION    - Lockout window (e.g., 5m)
  SECURETODO_SESSION_TIMEOUT     - Session timeout (e.g., 15m)
  SECURETODO_PROMPT_TIMEOUT      - Biometric prompt timeout (e.g., 30s)
  SECURETODO_BIOMETRIC_MODALITY  - face_id, touch_id, biometrics or none
  SECURETODO_PLATFORM            - auto, ios, android or other
  SECURETODO_STORAGE_BACKEND     - file or memory
  SECURETODO_DATA_DIR            - Data directory
  SECURETODO_LOG_LEVEL           - Log level (trace, debug, info, warn, error)
")]
pub struct CliArgs {
    /// Configuration file path
    #[arg(
        short,
        long,
        default_value = "securetodo.toml",
        help = "Path to configuration file"
    )]
    pub config: PathBuf,

    /// Data directory (overrides config file)
    #[arg(short, long, help = "Data directory")]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, help = "Log level")]
    pub log_level: Option<String>,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,

    /// Keep everything in memory for this run
    #[arg(long, help = "Use in-memory storage")]
    pub memory: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration and exit")]
    pub validate_config: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show login and session status
    Status,
    /// Authenticate with biometrics
    Login,
    /// Clear the session and authentication history
    Logout,
    /// List to-do items
    List,
    /// Add a to-do item
    Add { text: Vec<String> },
    /// Change the text of a to-do item
    Edit { id: String, text: Vec<String> },
    /// Delete a to-do item
    Remove { id: String },
    /// Show the remaining session time until it runs out
    Watch,
    /// Open the device settings page for biometrics
    Settings,
    /// Interactive session
    Shell,
}

struct App {
    auth: Arc<AuthManager>,
    todos: TodoList,
    config: Config,
    input: Arc<LineReader>,
}

/// How long exit waits for background tasks before abandoning them
const SHUTDOWN_GRACE: Duration = Duration::from_millis(250);

fn main() -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let result = runtime.block_on(run());
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}

async fn run() -> Result<()> {
    let args = CliArgs::parse();

    // Load configuration with priority: CLI args > config file > environment > defaults
    let mut config = if args.config.exists() {
        ConfigManager::load_from_file(&args.config)?
    } else {
        ConfigManager::load_from_env()?
    };

    config.merge_with_cli_args(
        args.data_dir.as_deref(),
        args.log_level.as_deref(),
        args.memory,
    );

    config
        .validate()
        .context("Final configuration validation failed")?;

    init_tracing(&config, args.verbose)?;
    info!("Starting SecureTodo v{}", env!("CARGO_PKG_VERSION"));

    if args.validate_config {
        println!("Configuration is valid");
        println!("  Session timeout: {:?}", config.auth.session_timeout);
        println!(
            "  Lockout: {} attempts, {:?}",
            config.auth.max_failed_attempts, config.auth.lockout_duration
        );
        println!("  Prompt timeout: {:?}", config.auth.prompt_timeout);
        println!(
            "  Storage: {} ({})",
            config.storage.backend,
            config.storage.data_dir.display()
        );
        return Ok(());
    }

    let mut app = App::build(config).await?;

    match args.command.unwrap_or(Command::Status) {
        Command::Status => app.status().await,
        Command::Login => app.login().await,
        Command::Logout => app.logout().await,
        Command::List => app.list().await,
        Command::Add { text } => app.add(&text.join(" ")).await,
        Command::Edit { id, text } => app.edit(&id, &text.join(" ")).await,
        Command::Remove { id } => app.remove(&id).await,
        Command::Watch => app.watch().await,
        Command::Settings => app.auth.open_biometric_settings().await,
        Command::Shell => app.shell().await,
    }
}

impl App {
    async fn build(config: Config) -> Result<Self> {
        let store: Arc<dyn KeyValueStore> = match config.storage.backend.as_str() {
            "memory" => Arc::new(MemoryStore::new()),
            _ => Arc::new(
                FileStore::open(&config.storage.data_dir)
                    .await
                    .with_context(|| {
                        format!(
                            "Failed to open data directory {}",
                            config.storage.data_dir.display()
                        )
                    })?,
            ),
        };

        let input = Arc::new(LineReader::stdin().context("Failed to start input reader")?);
        let biometrics = Arc::new(ConsoleBiometrics::new(
            config.biometric.sensor_status()?,
            input.clone(),
        ));
        let clock = Arc::new(SystemClock);

        let auth = AuthManager::new(config.auth.clone(), store.clone(), biometrics)
            .with_clock(clock.clone())
            .with_platform(config.biometric.platform()?);

        Ok(Self {
            auth: Arc::new(auth),
            todos: TodoList::new(TodoStore::new(store), clock),
            config,
            input,
        })
    }

    async fn status(&self) -> Result<()> {
        let greeting = self.auth.greeting().await;
        println!("{}", greeting.title);
        println!("{}", greeting.message);

        if self.auth.is_session_valid().await {
            println!(
                "Signed in, session expires in {} minutes",
                self.auth.remaining_session_minutes()
            );
        } else {
            println!("Not signed in ({})", greeting.action_label);
        }
        Ok(())
    }

    async fn login(&self) -> Result<()> {
        let greeting = self.auth.greeting().await;
        println!("{}", greeting.message);

        let outcome = self.auth.authenticate().await;
        report(&outcome);

        if let Some(notice) = outcome.notice() {
            if notice.action == NoticeAction::OpenSettings {
                self.auth.open_biometric_settings().await?;
            }
        }

        match outcome {
            AuthOutcome::Authenticated { .. } => Ok(()),
            AuthOutcome::Cancelled => bail!("Authentication cancelled"),
            _ => bail!("Authentication failed"),
        }
    }

    async fn logout(&self) -> Result<()> {
        self.auth.logout().await?;
        println!("Logged out. You will need to authenticate again to access your TODOs.");
        Ok(())
    }

    async fn require_session(&mut self) -> Result<()> {
        if !self.auth.is_session_valid().await {
            bail!("Not authenticated. Run `securetodo login` first.");
        }
        self.todos.load().await?;
        Ok(())
    }

    async fn list(&mut self) -> Result<()> {
        self.require_session().await?;
        print_todos(self.todos.todos());
        Ok(())
    }

    async fn add(&mut self, text: &str) -> Result<()> {
        self.require_session().await?;
        let todo = self.todos.add(text).await?;
        println!("Added {}", short_id(&todo.id));
        Ok(())
    }

    async fn edit(&mut self, id: &str, text: &str) -> Result<()> {
        self.require_session().await?;
        let id = resolve_id(self.todos.todos(), id)?;
        let todo = self.todos.update(&id, text).await?;
        println!("Updated {}: {}", short_id(&todo.id), todo.text);
        Ok(())
    }

    async fn remove(&mut self, id: &str) -> Result<()> {
        self.require_session().await?;
        let id = resolve_id(self.todos.todos(), id)?;
        self.todos.delete(&id).await?;
        println!("Deleted {}", short_id(&id));
        Ok(())
    }

    async fn watch(&mut self) -> Result<()> {
        self.require_session().await?;
        let countdown =
            SessionCountdown::spawn(self.auth.clone(), self.config.auth.countdown_interval);
        let mut minutes = countdown.subscribe();

        loop {
            let remaining = *minutes.borrow_and_update();
            if remaining == 0 {
                println!("Session expired");
                return Ok(());
            }
            println!("Session expires in {} minutes", remaining);

            tokio::select! {
                changed = minutes.changed() => {
                    changed.context("Session countdown stopped")?;
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received Ctrl+C, stopping");
                    return Ok(());
                }
            }
        }
    }

    async fn shell(&mut self) -> Result<()> {
        println!("{}", self.auth.greeting().await.message);
        println!("Type `help` for commands.");

        loop {
            print!("> ");
            std::io::stdout().flush().context("Failed to write prompt")?;
            let Some(line) = self.input.read_line().await else {
                break;
            };

            let line = line.trim();
            let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
            let rest = rest.trim();

            let result = match command {
                "" => Ok(()),
                "help" => {
                    println!("login | logout | status | list | add <text> | edit <id> <text> | rm <id> | settings | quit");
                    Ok(())
                }
                "quit" | "exit" => break,
                "login" => self.login().await,
                "logout" => self.logout().await,
                "status" => self.status().await,
                "list" => self.list().await,
                "add" => self.add(rest).await,
                "edit" => {
                    let (id, text) = rest.split_once(' ').unwrap_or((rest, ""));
                    self.edit(id, text).await
                }
                "rm" | "remove" => self.remove(rest).await,
                "settings" => self.auth.open_biometric_settings().await,
                other => Err(anyhow::anyhow!("Unknown command: {}", other)),
            };

            if let Err(e) = result {
                debug!("Shell command failed: {:#}", e);
                println!("Error: {}", user_message(&e));
            }
        }

        Ok(())
    }
}

fn report(outcome: &AuthOutcome) {
    match outcome {
        AuthOutcome::Authenticated { resumed: true } => println!("Session still active"),
        AuthOutcome::Authenticated { resumed: false } => println!("Authenticated"),
        AuthOutcome::Rejected {
            failed_attempts,
            lockout: None,
        } => println!("Not recognised (failed attempts: {})", failed_attempts),
        _ => {}
    }

    if let Some(notice) = outcome.notice() {
        println!("{}: {}", notice.title, notice.message);
    }
}

fn user_message(error: &anyhow::Error) -> String {
    match error.downcast_ref::<TodoError>() {
        Some(TodoError::Load(_)) => "Failed to load todos".to_string(),
        Some(TodoError::EmptyText) => "Please enter a todo item".to_string(),
        _ => error.to_string(),
    }
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn print_todos(todos: &[Todo]) {
    if todos.is_empty() {
        println!("No TODOs yet");
        return;
    }
    for todo in todos {
        println!(
            "{}  {}  (updated {})",
            short_id(&todo.id),
            todo.text,
            humantime::format_rfc3339_seconds(todo.updated_at)
        );
    }
}

/// Full id of the single item whose id starts with `prefix`
fn resolve_id(todos: &[Todo], prefix: &str) -> Result<String> {
    if prefix.is_empty() {
        bail!("Missing todo id");
    }
    let mut matches = todos.iter().filter(|todo| todo.id.starts_with(prefix));
    match (matches.next(), matches.next()) {
        (Some(todo), None) => Ok(todo.id.clone()),
        (None, _) => Err(TodoError::NotFound(prefix.to_string()).into()),
        (Some(_), Some(_)) => bail!("Id prefix '{}' is ambiguous", prefix),
    }
}

/// Initialize tracing/logging
fn init_tracing(config: &Config, verbose: bool) -> Result<()> {
    let log_level = if verbose {
        "debug"
    } else {
        &config.monitoring.log_level
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_level(true),
        )
        .with(env_filter)
        .init();

    Ok(())
}
