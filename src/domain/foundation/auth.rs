//! Identity resolution errors.
//!
//! The routing layer does not authenticate anyone itself. It asks an
//! externally supplied resolver to turn a handshake into a [`UserId`]
//! and only needs to know how that can fail.
//!
//! [`UserId`]: super::UserId

use thiserror::Error;

use super::ErrorCode;

/// Errors an identity resolver may return during handshake.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// The handshake carried no credentials at all.
    #[error("Missing credentials")]
    MissingCredentials,

    /// Credentials were present but not accepted.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The resolver could not reach its backing service.
    #[error("Identity service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl IdentityError {
    /// Creates a service unavailable error with a message.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Error code reported to the client in the handshake error notification.
    pub fn code(&self) -> ErrorCode {
        match self {
            IdentityError::MissingCredentials | IdentityError::InvalidCredentials => {
                ErrorCode::Unauthorized
            }
            IdentityError::ServiceUnavailable(_) => ErrorCode::InternalError,
        }
    }

    /// Returns true if this is a transient error that may succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, IdentityError::ServiceUnavailable(_))
    }
}
