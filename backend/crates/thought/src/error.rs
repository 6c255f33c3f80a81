//! Thought Error Types
//!
//! This module provides thought-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::retry::{Retryable, RetryError};
use thiserror::Error;

use crate::domain::gateway::CompletionError;

/// Thought-specific result type alias
pub type ThoughtResult<T> = Result<T, ThoughtError>;

/// Which generation path a rate window guards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitScope {
    Local,
    Remote,
}

impl fmt::Display for LimitScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitScope::Local => f.write_str("Local"),
            LimitScope::Remote => f.write_str("Remote"),
        }
    }
}

/// Thought-specific error variants
#[derive(Debug, Error)]
pub enum ThoughtError {
    /// Rate window exhausted; carries the instant it reopens and the wait
    /// measured on the limiter's clock
    #[error("{scope} generation limit reached")]
    RateLimited {
        scope: LimitScope,
        reset_at_ms: i64,
        retry_after_secs: u64,
    },

    /// Completion API rejected the credentials
    #[error("Completion API rejected the API key: {0}")]
    AuthFailed(String),

    /// Completion API account is out of quota
    #[error("Completion API quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Completion API account has a billing problem
    #[error("Completion API billing problem: {0}")]
    BillingFailed(String),

    /// Transient failures exhausted every attempt
    #[error("Remote generation failed after {attempts} attempt(s): {message}")]
    RemoteUnavailable { attempts: u32, message: String },

    /// Shared thought unknown or expired
    #[error("Thought not found or expired")]
    NotFound,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ThoughtError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ThoughtError::RateLimited { .. } => ErrorKind::TooManyRequests,
            ThoughtError::AuthFailed(_) | ThoughtError::RemoteUnavailable { .. } => {
                ErrorKind::BadGateway
            }
            ThoughtError::QuotaExceeded(_) | ThoughtError::BillingFailed(_) => {
                ErrorKind::ServiceUnavailable
            }
            ThoughtError::NotFound => ErrorKind::NotFound,
            ThoughtError::Forbidden(_) => ErrorKind::Forbidden,
            ThoughtError::InvalidRequest(_) => ErrorKind::BadRequest,
            ThoughtError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Suggested next step shown to the user
    pub fn action(&self) -> Option<&'static str> {
        match self {
            ThoughtError::RateLimited {
                scope: LimitScope::Local,
                ..
            } => Some("Wait for the window to reset before generating again"),
            ThoughtError::RateLimited {
                scope: LimitScope::Remote,
                ..
            } => Some("Use template generation until the remote window resets"),
            ThoughtError::AuthFailed(_) => Some("Check OPENAI_API_KEY"),
            ThoughtError::QuotaExceeded(_) | ThoughtError::BillingFailed(_) => {
                Some("Check the completion API account, or use template generation")
            }
            ThoughtError::RemoteUnavailable { .. } => Some("Try again later"),
            _ => None,
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            ThoughtError::Internal(msg) => {
                tracing::error!(message = %msg, "Thought internal error");
            }
            ThoughtError::AuthFailed(_)
            | ThoughtError::QuotaExceeded(_)
            | ThoughtError::BillingFailed(_)
            | ThoughtError::RemoteUnavailable { .. } => {
                tracing::error!(error = %self, "Remote generation error");
            }
            ThoughtError::RateLimited {
                scope,
                reset_at_ms,
                retry_after_secs,
            } => {
                tracing::warn!(
                    scope = %scope,
                    reset_at_ms,
                    retry_after_secs,
                    "Thought rate limit exceeded"
                );
            }
            ThoughtError::Forbidden(_) => {
                tracing::warn!(error = %self, "Thought admin request rejected");
            }
            _ => {
                tracing::debug!(error = %self, "Thought error");
            }
        }
    }
}

impl From<RetryError<CompletionError>> for ThoughtError {
    fn from(err: RetryError<CompletionError>) -> Self {
        let RetryError { error, attempts } = err;
        if error.is_transient() {
            return ThoughtError::RemoteUnavailable {
                attempts,
                message: error.to_string(),
            };
        }
        match error {
            CompletionError::Unauthorized(msg) => ThoughtError::AuthFailed(msg),
            CompletionError::QuotaExceeded(msg) => ThoughtError::QuotaExceeded(msg),
            CompletionError::Billing(msg) => ThoughtError::BillingFailed(msg),
            other => ThoughtError::RemoteUnavailable {
                attempts,
                message: other.to_string(),
            },
        }
    }
}

impl From<ThoughtError> for AppError {
    fn from(err: ThoughtError) -> Self {
        let kind = err.kind();
        let action = err.action();
        let window = match &err {
            ThoughtError::RateLimited {
                reset_at_ms,
                retry_after_secs,
                ..
            } => Some((*reset_at_ms, *retry_after_secs)),
            _ => None,
        };

        let mut app = AppError::new(kind, err.to_string());
        if let Some(action) = action {
            app = app.with_action(action);
        }
        if let Some((reset_at_ms, retry_after_secs)) = window {
            app = app
                .with_reset_at_ms(reset_at_ms)
                .with_retry_after_secs(retry_after_secs);
        }
        app
    }
}

impl IntoResponse for ThoughtError {
    fn into_response(self) -> Response {
        self.log();
        AppError::from(self).into_response()
    }
}
