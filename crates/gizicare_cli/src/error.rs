//! Error types for the command-line front-end.

use gizicare_client::GiziCareError;
use gizicare_client::validation::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("API error: {0}")]
    Api(#[from] GiziCareError),

    /// Shown to the user verbatim.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Silakan login terlebih dahulu (gizicare login).")]
    SignInRequired,

    #[error("Belum ada profil. Buat profil dengan `gizicare profiles create`.")]
    NoProfile,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Another submission is still in progress")]
    Busy,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl CliError {
    /// Whether the stored session should be dropped.
    pub fn requires_sign_in(&self) -> bool {
        match self {
            CliError::SignInRequired => true,
            CliError::Api(e) => e.requires_sign_in(),
            _ => false,
        }
    }

    /// Process exit code: 2 for input problems, 3 for auth, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Validation(_) | CliError::InvalidArgument(_) | CliError::Busy => 2,
            e if e.requires_sign_in() => 3,
            _ => 1,
        }
    }
}

pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_pass_through() {
        let err = CliError::from(ValidationError::MissingProfileField);
        assert_eq!(err.to_string(), "Semua field wajib diisi.");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn auth_failures_require_sign_in() {
        let err = CliError::from(GiziCareError::Auth("expired".into()));
        assert!(err.requires_sign_in());
        assert_eq!(err.exit_code(), 3);
        assert!(!CliError::NoProfile.requires_sign_in());
    }
}
