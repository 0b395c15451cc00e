use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::models::LeadStatus;

pub type AppResult<T> = std::result::Result<T, AppError>;

/// ErrorCode
///
/// Backend failure codes the service recognises. Raw failures (SQLSTATEs, identity
/// provider error strings) are classified into one of these, and each maps to a single
/// static, user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    PermissionDenied,
    FailedPrecondition,
    AlreadyExists,
    NotFound,
    EmailAlreadyInUse,
    WeakPassword,
    InvalidEmail,
    Unavailable,
    Unknown,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::PermissionDenied => "permission-denied",
            ErrorCode::FailedPrecondition => "failed-precondition",
            ErrorCode::AlreadyExists => "already-exists",
            ErrorCode::NotFound => "not-found",
            ErrorCode::EmailAlreadyInUse => "auth/email-already-in-use",
            ErrorCode::WeakPassword => "auth/weak-password",
            ErrorCode::InvalidEmail => "auth/invalid-email",
            ErrorCode::Unavailable => "unavailable",
            ErrorCode::Unknown => "unknown",
        }
    }

    /// Classifies a sqlx failure by its SQLSTATE.
    pub fn from_sqlx(err: &sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db) => match db.code().as_deref() {
                // insufficient_privilege
                Some("42501") => ErrorCode::PermissionDenied,
                // object_not_in_prerequisite_state
                Some("55000") => ErrorCode::FailedPrecondition,
                Some("23505") => ErrorCode::AlreadyExists,
                _ => ErrorCode::Unknown,
            },
            sqlx::Error::RowNotFound => ErrorCode::NotFound,
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                ErrorCode::Unavailable
            }
            _ => ErrorCode::Unknown,
        }
    }

    /// Classifies an identity provider error message such as
    /// `WEAK_PASSWORD : Password should be at least 6 characters`.
    pub fn from_identity(message: &str) -> Self {
        let head = message.split([' ', ':']).next().unwrap_or_default();
        match head {
            "EMAIL_EXISTS" => ErrorCode::EmailAlreadyInUse,
            "WEAK_PASSWORD" => ErrorCode::WeakPassword,
            "INVALID_EMAIL" | "MISSING_EMAIL" => ErrorCode::InvalidEmail,
            "OPERATION_NOT_ALLOWED" | "ADMIN_ONLY_OPERATION" => ErrorCode::PermissionDenied,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => ErrorCode::Unavailable,
            _ => ErrorCode::Unknown,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorCode::PermissionDenied => {
                "Permission denied. Please ensure you have the necessary permissions."
            }
            ErrorCode::FailedPrecondition => {
                "Database is not ready. Please contact support to resolve this issue."
            }
            ErrorCode::AlreadyExists => "This record already exists.",
            ErrorCode::NotFound => "The requested record was not found.",
            ErrorCode::EmailAlreadyInUse => {
                "This email is already registered. Please use a different email or sign in."
            }
            ErrorCode::WeakPassword => "Password should be at least 6 characters.",
            ErrorCode::InvalidEmail => "Please enter a valid email address.",
            ErrorCode::Unavailable => "The service is temporarily unavailable. Please try again.",
            ErrorCode::Unknown => "Something went wrong. Please try again.",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::PermissionDenied => StatusCode::FORBIDDEN,
            ErrorCode::AlreadyExists | ErrorCode::EmailAlreadyInUse => StatusCode::CONFLICT,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::WeakPassword | ErrorCode::InvalidEmail => StatusCode::BAD_REQUEST,
            ErrorCode::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::FailedPrecondition | ErrorCode::Unknown => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// AppError
///
/// Every failure a handler can return. Converted into a JSON body of the form
/// `{"error": ..., "code": ...}`; internal details are logged, never sent.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Identity provider error: {}", .0.as_str())]
    Identity(ErrorCode),

    #[error("Identity provider unreachable: {0}")]
    IdentityTransport(#[from] reqwest::Error),

    #[error("Please sign in to continue.")]
    Unauthenticated,

    #[error("Please select a role to continue.")]
    RoleRequired,

    #[error("You don't have permission to access this page.")]
    Forbidden { redirect: String },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("A lead cannot move from {from} to {to}.")]
    InvalidTransition { from: LeadStatus, to: LeadStatus },

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// The backend code this error is reported under.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(e) => ErrorCode::from_sqlx(e).as_str(),
            AppError::Identity(code) => code.as_str(),
            AppError::IdentityTransport(_) => ErrorCode::Unavailable.as_str(),
            AppError::Unauthenticated => "unauthenticated",
            AppError::RoleRequired => "role-required",
            AppError::Forbidden { .. } => "forbidden",
            AppError::NotFound(_) => "not-found",
            AppError::Validation(_) => "invalid-argument",
            AppError::InvalidTransition { .. } => "invalid-transition",
            AppError::Conflict(_) => "conflict",
            AppError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Database(e) => ErrorCode::from_sqlx(e).status(),
            AppError::Identity(code) => code.status(),
            AppError::IdentityTransport(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::RoleRequired | AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidTransition { .. } | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Database(e) => ErrorCode::from_sqlx(e).user_message().to_string(),
            AppError::Identity(code) => code.user_message().to_string(),
            AppError::IdentityTransport(_) => ErrorCode::Unavailable.user_message().to_string(),
            AppError::Internal(_) => ErrorCode::Unknown.user_message().to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Database(e) => tracing::error!("database error: {:?}", e),
            AppError::IdentityTransport(e) => tracing::error!("identity transport error: {:?}", e),
            AppError::Internal(msg) => tracing::error!("internal error: {}", msg),
            other => tracing::debug!("request rejected: {}", other),
        }

        let mut body = json!({
            "error": self.user_message(),
            "code": self.code(),
        });
        match &self {
            AppError::Forbidden { redirect } => body["redirect"] = json!(redirect),
            AppError::RoleRequired => body["redirect"] = json!("/role-selection"),
            AppError::Unauthenticated => body["redirect"] = json!("/login"),
            _ => {}
        }

        (self.status(), Json(body)).into_response()
    }
}
