mod terminal;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use leave_auth::config::{AuthConfig, ConfigError};
use leave_auth::net::types::{ApiError, User};
use leave_auth::session::SessionError;
use leave_auth::{AuthFormController, Field, FileSessionStore, HttpAuthApi, SessionStore, SubmitOutcome};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use terminal::{ShellCommand, ShellTracker};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("failed to read input: {0}")]
    Stdin(#[source] std::io::Error),
    #[error("{0}")]
    Rejected(String),
}

#[derive(Parser, Debug)]
#[command(name = "leave-auth", about = "Sign in to the leave-management backend")]
struct Cli {
    /// Backend base URL (overrides `LEAVE_API_BASE_URL`).
    #[arg(long)]
    base_url: Option<String>,

    /// Where the session is stored (overrides `LEAVE_SESSION_FILE`).
    #[arg(long)]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and store the session.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "LEAVE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account. Does not sign in.
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "LEAVE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Interactive login/register form.
    Shell,
    /// Show the stored session.
    Session,
    /// Forget the stored session.
    Logout,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let _ = dotenvy::dotenv();
    init_tracing();
    let cli = Cli::parse();

    let mut config = AuthConfig::from_env()?;
    if let Some(url) = &cli.base_url {
        config = config.with_base_url(url)?;
    }
    if let Some(path) = cli.session_file {
        config.session_file = path;
    }

    let store = Arc::new(FileSessionStore::open(&config.session_file)?);
    tracing::debug!(base_url = %config.base_url, session_file = %config.session_file.display(), "config loaded");

    match cli.command {
        Command::Session => {
            show_session(store.as_ref())?;
            Ok(())
        }
        Command::Logout => {
            store.clear()?;
            println!("Logged out.");
            Ok(())
        }
        Command::Login { email, password } => {
            let controller = build_controller(&config, store)?;
            controller.update_field(Field::Email, email);
            controller.update_field(Field::Password, password);
            finish_one_shot(&controller, controller.submit().await)
        }
        Command::Register { name, email, password } => {
            let controller = build_controller(&config, store)?;
            controller.toggle_mode();
            controller.update_field(Field::Name, name);
            controller.update_field(Field::Email, email);
            controller.update_field(Field::Password, password);
            finish_one_shot(&controller, controller.submit().await)
        }
        Command::Shell => {
            let controller = Arc::new(build_controller(&config, store)?);
            run_shell(controller).await
        }
    }
}

fn build_controller(config: &AuthConfig, store: Arc<FileSessionStore>) -> Result<AuthFormController, CliError> {
    let api = Arc::new(HttpAuthApi::new(config)?);
    Ok(AuthFormController::new(api, store).with_on_authenticated(announce_login))
}

fn announce_login(user: &User) {
    let who = if user.name.is_empty() { format!("user #{}", user.id) } else { user.name.clone() };
    println!("Signed in as {who} ({}).", user.role);
    if user.is_admin() {
        println!("Admin access: you can review and approve leave requests.");
    }
}

fn show_session(store: &dyn SessionStore) -> Result<(), CliError> {
    match store.load()? {
        Some(session) => {
            let user = &session.user;
            println!("user:  #{} {}", user.id, user.name);
            println!("email: {}", user.email);
            let scope = if user.is_admin() { " (can review leave requests)" } else { "" };
            println!("role:  {}{scope}", user.role);
        }
        None => println!("Not signed in."),
    }
    Ok(())
}

fn finish_one_shot(controller: &AuthFormController, outcome: SubmitOutcome) -> Result<(), CliError> {
    let message = controller.message().map(|m| m.text);
    if let Some(text) = terminal::failure_text(&outcome, message.clone()) {
        return Err(CliError::Rejected(text));
    }
    if outcome == SubmitOutcome::Registered {
        println!("{}", message.unwrap_or_default());
    }
    Ok(())
}

/// Event loop: stdin lines and request completions interleave, so a second
/// `submit` typed while one is pending reaches the controller's guard.
///
/// End of input waits for pending requests; only `quit` abandons them.
async fn run_shell(controller: Arc<AuthFormController>) -> Result<(), CliError> {
    println!("{}\n", terminal::BANNER);
    println!("{}", terminal::render(&controller.snapshot()));

    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<SubmitOutcome>();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tracker = ShellTracker::default();

    loop {
        tokio::select! {
            line = lines.next_line(), if !tracker.is_input_closed() => {
                let Some(line) = line.map_err(CliError::Stdin)? else {
                    tracing::debug!(pending = tracker.pending(), "shell input closed");
                    if tracker.input_closed() {
                        break;
                    }
                    continue;
                };
                let command = match terminal::parse_command(&line) {
                    Ok(command) => command,
                    Err(e) => {
                        println!("{e}");
                        continue;
                    }
                };
                match command {
                    ShellCommand::Set(field, value) => controller.update_field(field, value),
                    ShellCommand::Toggle => {
                        controller.toggle_mode();
                    }
                    ShellCommand::Dismiss => controller.dismiss_message(),
                    ShellCommand::Show => {}
                    ShellCommand::Help => {
                        println!("{}", terminal::HELP);
                        continue;
                    }
                    ShellCommand::Quit => {
                        tracker.quit();
                        break;
                    }
                    ShellCommand::Submit => match controller.begin_submit() {
                        Ok(pending) => {
                            tracker.submitted();
                            let controller = Arc::clone(&controller);
                            let done_tx = done_tx.clone();
                            tokio::spawn(async move {
                                let _ = done_tx.send(controller.complete_submit(pending).await);
                            });
                        }
                        Err(SubmitOutcome::Ignored) => {
                            println!("{}", terminal::BUSY_NOTICE);
                            continue;
                        }
                        Err(outcome) => tracker.rejected(&outcome, controller.message().map(|m| m.text)),
                    },
                }
                println!("{}", terminal::render(&controller.snapshot()));
            }
            Some(outcome) = done_rx.recv() => {
                println!("{}", terminal::render(&controller.snapshot()));
                if tracker.resolved(&outcome, controller.message().map(|m| m.text)) {
                    break;
                }
            }
        }
    }

    controller.dispose();
    match tracker.into_failure() {
        Some(text) => Err(CliError::Rejected(text)),
        None => Ok(()),
    }
}
