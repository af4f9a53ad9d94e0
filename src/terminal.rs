//! Terminal rendering and input parsing for the interactive auth shell.
//!
//! Pure helpers only; `main` owns stdin/stdout and the controller.

#[cfg(test)]
#[path = "terminal_test.rs"]
mod tests;

use std::fmt::Write;

use leave_auth::SubmitOutcome;
use leave_auth::form::{Field, FormState, MessageKind, Mode};

pub const BANNER: &str = "Leave Management System\nDemo admin: admin@example.com / admin123";

pub const HELP: &str = "\
commands:
  name <value>       set the name (register only)
  email <value>      set the email
  password <value>   set the password
  submit             send the form
  toggle             switch between login and register
  dismiss            close the alert
  show               redraw the form
  help               this text
  quit               leave";

pub const BUSY_NOTICE: &str = "A request is already in progress.";
pub const NOT_SENT_MESSAGE: &str = "request was not sent";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Set(Field, String),
    Submit,
    Toggle,
    Dismiss,
    Show,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShellParseError {
    #[error("unknown command '{0}' (type 'help')")]
    Unknown(String),
    #[error("'{0}' takes no arguments")]
    UnexpectedArgument(String),
}

/// Parse one input line. Field values keep inner spaces; an empty value
/// clears the field.
pub fn parse_command(line: &str) -> Result<ShellCommand, ShellParseError> {
    let line = line.trim();
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    if let Some(field) = Field::parse(word) {
        return Ok(ShellCommand::Set(field, rest.to_owned()));
    }

    let command = match word.to_ascii_lowercase().as_str() {
        "" | "show" => ShellCommand::Show,
        "submit" | "login" | "register" => ShellCommand::Submit,
        "toggle" | "switch" => ShellCommand::Toggle,
        "dismiss" | "close" => ShellCommand::Dismiss,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        _ => return Err(ShellParseError::Unknown(word.to_owned())),
    };
    if !rest.is_empty() {
        return Err(ShellParseError::UnexpectedArgument(word.to_owned()));
    }
    Ok(command)
}

/// Draw the form the way the web page lays it out.
pub fn render(state: &FormState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", state.mode);

    if state.mode == Mode::Register {
        let _ = writeln!(out, "  name:     {}", state.fields.name);
    }
    let _ = writeln!(out, "  email:    {}", state.fields.email);
    let _ = writeln!(out, "  password: {}", "*".repeat(state.fields.password.chars().count()));

    let button = match (state.loading, state.mode) {
        (true, Mode::Login) => "Logging in...",
        (true, Mode::Register) => "Registering...",
        (false, mode) => mode.label(),
    };
    let _ = writeln!(out, "  [{button}]");

    if let Some(message) = &state.message {
        let tag = match message.kind {
            MessageKind::Success => "ok",
            MessageKind::Error => "error",
        };
        let _ = writeln!(out, "  ({tag}) {}", message.text);
    }

    let hint = match state.mode {
        Mode::Login => "Need an account? Register (toggle)",
        Mode::Register => "Have an account? Login (toggle)",
    };
    let _ = write!(out, "  {hint}");
    out
}

/// Exit text for a finished submit, or `None` when it succeeded.
pub fn failure_text(outcome: &SubmitOutcome, message: Option<String>) -> Option<String> {
    match outcome {
        SubmitOutcome::Authenticated(_) | SubmitOutcome::Registered => None,
        SubmitOutcome::Invalid | SubmitOutcome::Failed => {
            Some(message.unwrap_or_else(|| "request failed".to_owned()))
        }
        SubmitOutcome::Ignored | SubmitOutcome::Discarded => Some(NOT_SENT_MESSAGE.to_owned()),
    }
}

/// Decides when the shell loop may stop.
///
/// End of input only stops the loop once every spawned submit has reported
/// back; `quit` stops it immediately. The last reported outcome decides the
/// exit status.
#[derive(Debug, Default)]
pub struct ShellTracker {
    pending: usize,
    input_closed: bool,
    failure: Option<String>,
}

impl ShellTracker {
    pub fn submitted(&mut self) {
        self.pending += 1;
    }

    pub fn pending(&self) -> usize {
        self.pending
    }

    /// A submit rejected before any request was sent.
    pub fn rejected(&mut self, outcome: &SubmitOutcome, message: Option<String>) {
        if *outcome != SubmitOutcome::Ignored {
            self.failure = failure_text(outcome, message);
        }
    }

    /// A spawned submit finished. Returns `true` when the loop should stop.
    pub fn resolved(&mut self, outcome: &SubmitOutcome, message: Option<String>) -> bool {
        self.pending = self.pending.saturating_sub(1);
        self.rejected(outcome, message);
        matches!(outcome, SubmitOutcome::Authenticated(_)) || (self.input_closed && self.pending == 0)
    }

    /// Stdin hit EOF. Returns `true` when nothing is left to wait for.
    pub fn input_closed(&mut self) -> bool {
        self.input_closed = true;
        self.pending == 0
    }

    /// `quit` typed: anything still pending will be dropped.
    pub fn quit(&mut self) {
        if self.pending > 0 {
            self.failure = Some(NOT_SENT_MESSAGE.to_owned());
        }
    }

    pub fn is_input_closed(&self) -> bool {
        self.input_closed
    }

    /// Exit text if the session ended on a failure.
    pub fn into_failure(self) -> Option<String> {
        self.failure
    }
}
