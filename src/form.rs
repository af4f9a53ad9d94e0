//! Form model for the login/register view.
//!
//! DESIGN
//! ======
//! Everything here is plain data plus pure functions. The controller owns the
//! single `FormState` instance and is the only writer; validation runs at
//! submit time so typing never produces errors.

#[cfg(test)]
#[path = "form_test.rs"]
mod tests;

use std::fmt;

/// Which flow the form is presenting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Login,
    Register,
}

impl Mode {
    /// The other mode.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Login => Self::Register,
            Self::Register => Self::Login,
        }
    }

    /// Label used on the submit button.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Login => "Login",
            Self::Register => "Register",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An editable input on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Email,
    Password,
}

impl Field {
    /// Parse a field from its input name (`"name"`, `"email"`, `"password"`).
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "name" => Some(Self::Name),
            "email" => Some(Self::Email),
            "password" => Some(Self::Password),
            _ => None,
        }
    }
}

/// Raw input values as typed.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl FormFields {
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::Name => self.name = value,
            Field::Email => self.email = value,
            Field::Password => self.password = value,
        }
    }
}

// Password stays out of logs and debug output.
impl fmt::Debug for FormFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormFields")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &if self.password.is_empty() { "" } else { "***" })
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Success,
    Error,
}

/// The single alert shown under the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub kind: MessageKind,
    pub text: String,
}

impl Message {
    pub fn success(text: impl Into<String>) -> Self {
        Self { kind: MessageKind::Success, text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { kind: MessageKind::Error, text: text.into() }
    }
}

/// Full view state of the auth form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub mode: Mode,
    pub fields: FormFields,
    pub loading: bool,
    pub message: Option<Message>,
}

// =============================================================================
// VALIDATION
// =============================================================================

/// Input rejected before any request is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Name, email, and password are required")]
    MissingRegisterFields,
    #[error("Email and password are required")]
    MissingLoginFields,
    #[error("Enter a valid email address")]
    InvalidEmail,
}

/// Values sent with a single request.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Login { email: String, password: String },
    Register { name: String, email: String, password: String },
}

impl Credentials {
    #[must_use]
    pub fn mode(&self) -> Mode {
        match self {
            Self::Login { .. } => Mode::Login,
            Self::Register { .. } => Mode::Register,
        }
    }

    #[must_use]
    pub fn email(&self) -> &str {
        match self {
            Self::Login { email, .. } | Self::Register { email, .. } => email,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Login { email, .. } => f.debug_struct("Login").field("email", email).finish_non_exhaustive(),
            Self::Register { name, email, .. } => f
                .debug_struct("Register")
                .field("name", name)
                .field("email", email)
                .finish_non_exhaustive(),
        }
    }
}

/// Basic `local@domain` shape check. Richer validation belongs to the server.
#[must_use]
pub fn looks_like_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => !local.is_empty() && !domain.is_empty(),
        _ => false,
    }
}

/// Derive request credentials from the form for the given mode.
///
/// Email and name are trimmed; the password is sent exactly as typed.
///
/// # Errors
///
/// Returns a [`ValidationError`] when a required field is blank or the email
/// is not shaped like an address.
pub fn credentials_for(mode: Mode, fields: &FormFields) -> Result<Credentials, ValidationError> {
    let email = fields.email.trim();
    let name = fields.name.trim();
    let password = fields.password.as_str();

    match mode {
        Mode::Login => {
            if email.is_empty() || password.is_empty() {
                return Err(ValidationError::MissingLoginFields);
            }
        }
        Mode::Register => {
            if name.is_empty() || email.is_empty() || password.is_empty() {
                return Err(ValidationError::MissingRegisterFields);
            }
        }
    }
    if !looks_like_email(email) {
        return Err(ValidationError::InvalidEmail);
    }

    Ok(match mode {
        Mode::Login => Credentials::Login { email: email.to_owned(), password: password.to_owned() },
        Mode::Register => Credentials::Register {
            name: name.to_owned(),
            email: email.to_owned(),
            password: password.to_owned(),
        },
    })
}
