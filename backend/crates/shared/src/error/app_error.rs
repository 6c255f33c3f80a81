//! Application Error - Unified error type for the application
//!
//! Defines [`AppError`] struct and [`AppResult<T>`] type alias.

use std::borrow::Cow;
use std::error::Error;
use std::fmt;

use super::kind::ErrorKind;

/// Unified error type rendered to HTTP clients.
///
/// Crate-specific errors (`ThoughtError`, ...) convert into this type at the
/// boundary. Built with a small builder API.
///
/// ## Examples
/// ```rust
/// use kernel::error::{app_error::AppError, kind::ErrorKind};
///
/// let err = AppError::too_many_requests("Local generation limit reached")
///     .with_reset_at_ms(1_700_000_060_000)
///     .with_action("Wait for the window to reset");
/// assert_eq!(err.status_code(), 429);
/// ```
pub struct AppError {
    kind: ErrorKind,
    /// Message shown to the user
    message: Cow<'static, str>,
    /// What the user can do about it
    action: Option<Cow<'static, str>>,
    /// Epoch millis at which a rate window reopens
    reset_at_ms: Option<i64>,
    /// Seconds until retry, as measured by whoever produced `reset_at_ms`
    retry_after: Option<u64>,
    source: Option<Box<dyn Error + Send + Sync + 'static>>,
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    #[inline]
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            action: None,
            reset_at_ms: None,
            retry_after: None,
            source: None,
        }
    }

    // ========================================================================
    // Convenience constructors
    // ========================================================================

    #[inline]
    pub fn bad_request(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    #[inline]
    pub fn forbidden(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    #[inline]
    pub fn not_found(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    #[inline]
    pub fn too_many_requests(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::TooManyRequests, message)
    }

    #[inline]
    pub fn internal(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::InternalServerError, message)
    }

    #[inline]
    pub fn bad_gateway(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::BadGateway, message)
    }

    #[inline]
    pub fn service_unavailable(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::ServiceUnavailable, message)
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    #[inline]
    pub fn with_action(mut self, action: impl Into<Cow<'static, str>>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Attach the instant a rate window reopens (epoch millis)
    #[inline]
    pub fn with_reset_at_ms(mut self, reset_at_ms: i64) -> Self {
        self.reset_at_ms = Some(reset_at_ms);
        self
    }

    /// Pin the `Retry-After` value instead of deriving it from the wall clock
    #[inline]
    pub fn with_retry_after_secs(mut self, secs: u64) -> Self {
        self.retry_after = Some(secs);
        self
    }

    /// Keep the underlying error for logs (never rendered to clients)
    #[inline]
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[inline]
    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[inline]
    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    #[inline]
    pub fn reset_at_ms(&self) -> Option<i64> {
        self.reset_at_ms
    }

    /// Whole seconds until `reset_at_ms`, rounded up, for a `Retry-After` header
    ///
    /// A value pinned with [`Self::with_retry_after_secs`] wins over `now_ms`.
    pub fn retry_after_secs(&self, now_ms: i64) -> Option<u64> {
        if self.retry_after.is_some() {
            return self.retry_after;
        }
        self.reset_at_ms.map(|reset| {
            let remaining_ms = reset.saturating_sub(now_ms).max(0) as u64;
            remaining_ms.div_ceil(1000)
        })
    }

    #[inline]
    pub fn is_server_error(&self) -> bool {
        self.kind.is_server_error()
    }
}

impl fmt::Debug for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = f.debug_struct("AppError");
        builder.field("kind", &self.kind);
        builder.field("message", &self.message);
        if let Some(action) = &self.action {
            builder.field("action", action);
        }
        if let Some(reset_at_ms) = &self.reset_at_ms {
            builder.field("reset_at_ms", reset_at_ms);
        }
        if let Some(retry_after) = &self.retry_after {
            builder.field("retry_after", retry_after);
        }
        if let Some(source) = &self.source {
            builder.field("source", source);
        }
        builder.finish()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)?;
        if let Some(action) = &self.action {
            write!(f, " (Action: {})", action)?;
        }
        Ok(())
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn Error + 'static))
    }
}
