use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Failure reading, writing or decoding the durable snapshot.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to encode store snapshot: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to decode store snapshot: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("durable medium {medium} failed: {source:#}")]
    Medium {
        medium: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Fatal startup failure; the process must not serve requests after this.
#[derive(Debug, Error)]
pub enum StoreInitError {
    #[error("existing store at {medium} could not be loaded: {source}")]
    Load {
        medium: String,
        #[source]
        source: PersistenceError,
    },
    #[error("new store at {medium} could not be written: {source}")]
    Create {
        medium: String,
        #[source]
        source: PersistenceError,
    },
    #[error("administrator seeding failed: {0}")]
    Seed(#[source] Box<AppError>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    InvalidCredentials,
    Suspended,
}

impl AuthFailure {
    pub fn message(self) -> &'static str {
        match self {
            AuthFailure::InvalidCredentials => "Invalid credentials",
            AuthFailure::Suspended => "Your account has been suspended. Please contact support.",
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("Email already registered")]
    DuplicateEmail,
    #[error("Mobile number already registered")]
    DuplicatePhone,
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error("Administrator accounts cannot be suspended or deleted")]
    ProtectedRole,
    #[error("{}", .0.message())]
    Auth(AuthFailure),
    #[error("You are not allowed to perform this action")]
    Forbidden,
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateEmail | AppError::DuplicatePhone => StatusCode::CONFLICT,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::ProtectedRole | AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Auth(AuthFailure::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            AppError::Auth(AuthFailure::Suspended) => StatusCode::FORBIDDEN,
            AppError::Persistence(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(
                error.cause_chain = ?self,
                error.message = %self,
                "Unexpected error happened"
            );
            return (status, "Internal server error".to_string()).into_response();
        }
        (status, self.to_string()).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_follows_taxonomy() {
        assert_eq!(AppError::validation("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::DuplicateEmail.status(), StatusCode::CONFLICT);
        assert_eq!(AppError::DuplicatePhone.status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::NotFound { entity: "user", id: 7 }.status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(AppError::ProtectedRole.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::Auth(AuthFailure::InvalidCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Auth(AuthFailure::Suspended).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn suspended_message_is_explicit() {
        let msg = AppError::Auth(AuthFailure::Suspended).to_string();
        assert!(msg.contains("suspended"));
    }
}
