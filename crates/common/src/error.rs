use thiserror::Error;

/// The error taxonomy shared by every layer of the core engine.
///
/// Handler bodies recover `UserInput`, `NotFound`, `Authentication`, and
/// `Integrity` variants and map them to structured command results; only
/// `Fatal` is allowed to bubble out of `main` and abort startup.
#[derive(Error, Debug, Clone)]
pub enum MudError {
    #[error("user input error: {0}")]
    UserInput(String),

    #[error("authentication error: {0}")]
    Authentication(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal invariant violated: {0}")]
    Integrity(String),

    #[error("transient persistence error: {0}")]
    Transient(String),

    #[error("fatal startup error: {0}")]
    Fatal(String),
}

impl MudError {
    pub fn not_found(what: impl Into<String>) -> Self {
        MudError::NotFound(what.into())
    }

    pub fn user_input(what: impl Into<String>) -> Self {
        MudError::UserInput(what.into())
    }

    pub fn integrity(what: impl Into<String>) -> Self {
        MudError::Integrity(what.into())
    }

    /// The one-line marker-prefixed form the session layer writes back to a
    /// player, per the error-handling design in.
    pub fn marker(&self) -> &'static str {
        match self {
            MudError::UserInput(_) => "\u{274c}",
            MudError::Authentication(_) => "\u{274c}",
            MudError::NotFound(_) => "\u{274c}",
            MudError::Integrity(_) => "\u{274c}",
            MudError::Transient(_) => "\u{274c}",
            MudError::Fatal(_) => "\u{1f6ab}",
        }
    }
}

pub type MudResult<T> = Result<T, MudError>;
