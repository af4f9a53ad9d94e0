//! # leave-auth
//!
//! Login/registration flow for the leave-management client.
//!
//! This crate owns the form state machine (`controller`), the pure form
//! model it mutates (`form`), the HTTP boundary to the auth backend (`net`),
//! and the process-wide session store written after a successful login
//! (`session`). The `leave-auth` binary embeds the controller behind a
//! terminal front end.

pub mod config;
pub mod controller;
pub mod form;
pub mod net;
pub mod session;

pub use controller::{AuthFormController, PendingSubmit, Phase, SubmitOutcome};
pub use form::{Field, FormFields, FormState, Message, MessageKind, Mode};
pub use net::{AuthApi, HttpAuthApi};
pub use session::{FileSessionStore, MemorySessionStore, SessionStore, SessionToken};
