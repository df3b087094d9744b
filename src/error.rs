//! Error types used by the takevisor runtime and handlers.
//!
//! This module defines three error enums:
//!
//! - [`SupervisorError`] structural problems detected while building a supervisor.
//! - [`RuntimeError`] errors raised by the orchestration runtime itself.
//! - [`HandlerError`] errors raised by individual handler invocations.
//!
//! All types provide helper methods (`as_label`, `as_message`) for logging/metrics.

use std::time::Duration;
use thiserror::Error;

/// # Construction-time errors.
///
/// Returned synchronously by registration and by
/// [`Supervisor::create_supervisor`](crate::Supervisor::create_supervisor).
/// Nothing is spawned when one of these is returned.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SupervisorError {
    /// The owner declares no handlers, but at least one is required.
    #[error("owner {owner:?} declares no handlers")]
    MissingDeclaration {
        /// Owner that was looked up.
        owner: String,
    },

    /// The owner already has a registered handler set.
    #[error("owner {owner:?} is already registered")]
    OwnerAlreadyRegistered {
        /// Owner that was registered twice.
        owner: String,
    },
}

impl SupervisorError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use takevisor::SupervisorError;
    ///
    /// let err = SupervisorError::MissingDeclaration { owner: "cart".into() };
    /// assert_eq!(err.as_label(), "supervisor_missing_declaration");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SupervisorError::MissingDeclaration { .. } => "supervisor_missing_declaration",
            SupervisorError::OwnerAlreadyRegistered { .. } => "supervisor_owner_already_registered",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            SupervisorError::MissingDeclaration { owner } => {
                format!("no handlers declared for owner={owner}")
            }
            SupervisorError::OwnerAlreadyRegistered { owner } => {
                format!("duplicate registration for owner={owner}")
            }
        }
    }
}

/// # Errors produced by the takevisor runtime.
///
/// These represent failures in the orchestration system itself,
/// such as a shutdown sequence exceeding its grace period.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some watchers remained stuck.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}; forcing termination")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of watchers that did not stop in time.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use takevisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; stuck watchers={stuck:?}")
            }
        }
    }
}

/// # Errors produced by a handler invocation.
///
/// Contained within the watcher that started the invocation: they are
/// reported on the event bus and never reach sibling watchers or the root.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// Invocation exceeded its timeout duration.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// Handler body reported a failure.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Handler body panicked.
    #[error("handler panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// Invocation was cancelled (preempted or root shutdown).
    #[error("context cancelled")]
    Canceled,
}

impl HandlerError {
    /// Convenience constructor for [`HandlerError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        HandlerError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use takevisor::HandlerError;
    /// use std::time::Duration;
    ///
    /// let err = HandlerError::Timeout { timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "handler_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerError::Timeout { .. } => "handler_timeout",
            HandlerError::Fail { .. } => "handler_failed",
            HandlerError::Panicked { .. } => "handler_panicked",
            HandlerError::Canceled => "handler_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            HandlerError::Timeout { timeout } => format!("timeout: {timeout:?}"),
            HandlerError::Fail { error } => format!("error: {error}"),
            HandlerError::Panicked { info } => format!("panic: {info}"),
            HandlerError::Canceled => "context cancelled".to_string(),
        }
    }

    /// Returns `true` when the invocation ended because its context was cancelled.
    pub fn is_canceled(&self) -> bool {
        matches!(self, HandlerError::Canceled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_stable() {
        assert_eq!(HandlerError::fail("x").as_label(), "handler_failed");
        assert_eq!(
            HandlerError::Panicked { info: "p".into() }.as_label(),
            "handler_panicked"
        );
        assert_eq!(HandlerError::Canceled.as_label(), "handler_canceled");
        assert_eq!(
            SupervisorError::OwnerAlreadyRegistered { owner: "a".into() }.as_label(),
            "supervisor_owner_already_registered"
        );
    }

    #[test]
    fn display_includes_owner() {
        let err = SupervisorError::MissingDeclaration {
            owner: "cart".into(),
        };
        assert_eq!(err.to_string(), "owner \"cart\" declares no handlers");
        assert_eq!(err.as_message(), "no handlers declared for owner=cart");
    }
}
