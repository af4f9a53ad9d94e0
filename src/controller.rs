//! Auth form controller: owns the form state and runs one auth request per
//! accepted submit.
//!
//! ARCHITECTURE
//! ============
//! `AuthFormController` is shared by reference between the input loop and
//! whatever awaits `submit()`. State sits behind a `std::sync::Mutex` that is
//! only held for short synchronous updates, never across the request await.
//!
//! ```text
//!   Idle ──submit──▶ Submitting ──ok/err──▶ Idle | Resolved(kind)
//!     ▲                                          │
//!     └──────────────── toggle_mode ─────────────┘
//! ```
//!
//! INVARIANTS
//! ==========
//! - At most one request is in flight; `submit()` while `loading` is a no-op.
//! - Failures never escape as errors; they become the form's message.
//! - After `dispose()`, late responses change nothing: no state, no session,
//!   no callbacks.
//! - Registration never authenticates; it sends the user back to Login.
//! - A failed request is reported in the mode it was sent from, even if the
//!   mode was toggled while it was in flight.

#[cfg(test)]
#[path = "controller_test.rs"]
mod tests;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::form::{Credentials, Field, FormFields, FormState, Message, MessageKind, Mode, credentials_for};
use crate::net::AuthApi;
use crate::net::types::{ApiError, User};
use crate::session::{SessionStore, SessionToken};

pub const REGISTRATION_SUCCESS_MESSAGE: &str = "Registration successful! Please login.";
pub const SESSION_SAVE_FAILED_MESSAGE: &str = "Signed in, but the session could not be saved. Please try again.";

type AuthenticatedCallback = Box<dyn Fn(&User) + Send + Sync>;
type ModeChangeCallback = Box<dyn Fn(Mode) + Send + Sync>;

/// Coarse view of where the form is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Submitting,
    /// Not loading, showing the outcome of the last action.
    Resolved(MessageKind),
}

/// What a call to [`AuthFormController::submit`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// A request was already in flight; nothing was sent.
    Ignored,
    /// Required input missing or malformed; nothing was sent.
    Invalid,
    /// Login succeeded and the session was stored.
    Authenticated(User),
    /// Account created; the form is back in Login mode.
    Registered,
    /// The request failed; the reason is in the form's message.
    Failed,
    /// The controller was disposed before the response arrived.
    Discarded,
}

/// In-flight slot claimed by [`AuthFormController::begin_submit`].
#[must_use = "the form stays loading until the request is completed"]
#[derive(Debug)]
pub struct PendingSubmit {
    credentials: Credentials,
}

impl PendingSubmit {
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.credentials.mode()
    }
}

pub struct AuthFormController {
    api: Arc<dyn AuthApi>,
    sessions: Arc<dyn SessionStore>,
    state: Mutex<FormState>,
    disposed: AtomicBool,
    on_authenticated: Option<AuthenticatedCallback>,
    on_mode_change: Option<ModeChangeCallback>,
}

impl AuthFormController {
    #[must_use]
    pub fn new(api: Arc<dyn AuthApi>, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            api,
            sessions,
            state: Mutex::new(FormState::default()),
            disposed: AtomicBool::new(false),
            on_authenticated: None,
            on_mode_change: None,
        }
    }

    /// Called once per successful login with the authenticated user.
    #[must_use]
    pub fn with_on_authenticated<F>(mut self, f: F) -> Self
    where
        F: Fn(&User) + Send + Sync + 'static,
    {
        self.on_authenticated = Some(Box::new(f));
        self
    }

    /// Called whenever the mode changes, including the switch back to Login
    /// after a successful registration.
    #[must_use]
    pub fn with_on_mode_change<F>(mut self, f: F) -> Self
    where
        F: Fn(Mode) + Send + Sync + 'static,
    {
        self.on_mode_change = Some(Box::new(f));
        self
    }

    fn lock(&self) -> MutexGuard<'_, FormState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // READS
    // =========================================================================

    #[must_use]
    pub fn snapshot(&self) -> FormState {
        self.lock().clone()
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.lock().mode
    }

    #[must_use]
    pub fn fields(&self) -> FormFields {
        self.lock().fields.clone()
    }

    #[must_use]
    pub fn message(&self) -> Option<Message> {
        self.lock().message.clone()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        let state = self.lock();
        if state.loading {
            Phase::Submitting
        } else if let Some(message) = &state.message {
            Phase::Resolved(message.kind)
        } else {
            Phase::Idle
        }
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    // =========================================================================
    // UPDATES
    // =========================================================================

    pub fn update_field(&self, field: Field, value: impl Into<String>) {
        if self.is_disposed() {
            return;
        }
        self.lock().fields.set(field, value);
    }

    /// Switch Login ↔ Register and clear the message.
    ///
    /// Email and password survive the switch; `name` is cleared because it
    /// only means something in Register mode.
    pub fn toggle_mode(&self) -> Mode {
        if self.is_disposed() {
            return self.mode();
        }
        let mode = {
            let mut state = self.lock();
            state.mode = state.mode.toggled();
            state.message = None;
            state.fields.name.clear();
            state.mode
        };
        tracing::debug!(%mode, "auth form mode toggled");
        self.notify_mode_change(mode);
        mode
    }

    /// Close the alert.
    pub fn dismiss_message(&self) {
        if self.is_disposed() {
            return;
        }
        self.lock().message = None;
    }

    /// Tear the controller down. Any response still in flight is dropped.
    pub fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::AcqRel) {
            tracing::debug!("auth form controller disposed");
        }
    }

    // =========================================================================
    // SUBMIT
    // =========================================================================

    /// Validate the form and, if valid, issue exactly one login or register
    /// request. Never retries.
    pub async fn submit(&self) -> SubmitOutcome {
        match self.begin_submit() {
            Ok(pending) => self.complete_submit(pending).await,
            Err(outcome) => outcome,
        }
    }

    /// Synchronous half of [`submit`](Self::submit): run the guards and take
    /// the in-flight slot. On `Ok`, `loading` is already set and the returned
    /// ticket must be passed to [`complete_submit`](Self::complete_submit).
    ///
    /// # Errors
    ///
    /// Returns the outcome directly (`Ignored`, `Invalid`, `Discarded`) when
    /// no request should be sent.
    pub fn begin_submit(&self) -> Result<PendingSubmit, SubmitOutcome> {
        if self.is_disposed() {
            return Err(SubmitOutcome::Discarded);
        }

        let mut state = self.lock();
        if state.loading {
            tracing::debug!("submit ignored: request already in flight");
            return Err(SubmitOutcome::Ignored);
        }
        match credentials_for(state.mode, &state.fields) {
            Ok(credentials) => {
                state.message = None;
                state.loading = true;
                Ok(PendingSubmit { credentials })
            }
            Err(e) => {
                tracing::debug!(error = %e, mode = %state.mode, "submit rejected by validation");
                state.message = Some(Message::error(e.to_string()));
                Err(SubmitOutcome::Invalid)
            }
        }
    }

    /// Send the request claimed by [`begin_submit`](Self::begin_submit) and
    /// apply its outcome.
    pub async fn complete_submit(&self, pending: PendingSubmit) -> SubmitOutcome {
        if self.is_disposed() {
            return SubmitOutcome::Discarded;
        }

        let credentials = pending.credentials;
        tracing::info!(mode = %credentials.mode(), email = %credentials.email(), "auth request started");
        match credentials {
            Credentials::Login { email, password } => {
                let result = self.api.login(&email, &password).await;
                self.finish_login(result.map(SessionToken::from))
            }
            Credentials::Register { name, email, password } => {
                let result = self.api.register(&name, &email, &password).await;
                self.finish_register(name, result)
            }
        }
    }

    fn finish_login(&self, result: Result<SessionToken, ApiError>) -> SubmitOutcome {
        if self.is_disposed() {
            tracing::debug!("login response discarded after dispose");
            return SubmitOutcome::Discarded;
        }

        match result {
            Ok(session) => {
                if let Err(e) = self.sessions.save(&session) {
                    tracing::warn!(error = %e, user_id = session.user.id, "failed to persist session");
                    self.fail(Mode::Login, None, Message::error(SESSION_SAVE_FAILED_MESSAGE));
                    return SubmitOutcome::Failed;
                }
                {
                    let mut state = self.lock();
                    state.loading = false;
                    state.message = None;
                }
                tracing::info!(user_id = session.user.id, role = ?session.user.role, "login succeeded");
                if let Some(cb) = &self.on_authenticated {
                    cb(&session.user);
                }
                SubmitOutcome::Authenticated(session.user)
            }
            Err(e) => {
                tracing::warn!(error = %e, "login failed");
                self.fail(Mode::Login, None, Message::error(e.user_message()));
                SubmitOutcome::Failed
            }
        }
    }

    fn finish_register(&self, name: String, result: Result<User, ApiError>) -> SubmitOutcome {
        if self.is_disposed() {
            tracing::debug!("register response discarded after dispose");
            return SubmitOutcome::Discarded;
        }

        match result {
            Ok(user) => {
                let changed = {
                    let mut state = self.lock();
                    let changed = state.mode != Mode::Login;
                    state.loading = false;
                    state.mode = Mode::Login;
                    state.fields = FormFields::default();
                    state.message = Some(Message::success(REGISTRATION_SUCCESS_MESSAGE));
                    changed
                };
                tracing::info!(user_id = user.id, "registration succeeded");
                if changed {
                    self.notify_mode_change(Mode::Login);
                }
                SubmitOutcome::Registered
            }
            Err(e) => {
                tracing::warn!(error = %e, "registration failed");
                self.fail(Mode::Register, Some(name), Message::error(e.user_message()));
                SubmitOutcome::Failed
            }
        }
    }

    /// Show a failure in the mode the request was sent from. If the user
    /// toggled away mid-flight, that mode comes back along with the name that
    /// was sent, so the form they submitted is the one they can retry.
    fn fail(&self, sent: Mode, sent_name: Option<String>, message: Message) {
        let changed = {
            let mut state = self.lock();
            state.loading = false;
            state.message = Some(message);
            let changed = state.mode != sent;
            if changed {
                state.mode = sent;
                if let Some(name) = sent_name {
                    state.fields.name = name;
                }
            }
            changed
        };
        if changed {
            tracing::debug!(mode = %sent, "restored mode of failed request");
            self.notify_mode_change(sent);
        }
    }

    fn notify_mode_change(&self, mode: Mode) {
        if let Some(cb) = &self.on_mode_change {
            cb(mode);
        }
    }
}
