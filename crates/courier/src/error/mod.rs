//! Error taxonomy surfaced by dispatch and registration.
//!
//! Configuration faults (`UnsupportedRequestKind`, `HandlerNotRegistered`,
//! contract violations) are distinct variants from runtime failures raised
//! by handlers, so callers can tell "nothing is wired" apart from "the
//! handler ran and failed". Handler errors travel as [`BoxError`] and are
//! surfaced unchanged through [`DispatchError::Handler`].

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

use crate::message::Capabilities;

/// Type-erased error returned by handlers and decorators.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Result type returned by handlers and decorators.
pub type HandlerResult<T> = Result<T, BoxError>;

/// Errors surfaced by [`crate::Dispatcher`].
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The request type does not declare exactly one dispatch capability.
    #[error("request type `{request}` has unsupported capabilities: {capabilities}")]
    UnsupportedRequestKind {
        /// Request type name.
        request: &'static str,
        /// Capabilities the type declared.
        capabilities: Capabilities,
    },

    /// No handler is registered for the request type.
    #[error("no handler registered for `{request}` returning `{response}`")]
    HandlerNotRegistered {
        /// Request type name.
        request: &'static str,
        /// Response type name.
        response: &'static str,
    },

    /// The registry returned a handler that does not serve the request type.
    #[error("service `{service}` is not a handler for `{request}`")]
    HandlerContractViolation {
        /// Request type name.
        request: &'static str,
        /// Concrete type name of the offending service.
        service: &'static str,
    },

    /// A decorator does not honour the decorator contract.
    #[error("decorator `{decorator}` violated its contract for `{request}`: {violation}")]
    DecoratorContractViolation {
        /// Request type name.
        request: &'static str,
        /// Concrete type name of the offending decorator.
        decorator: &'static str,
        /// What the decorator did wrong.
        #[source]
        violation: DecoratorViolation,
    },

    /// A handler or decorator failed. The error is the one it returned.
    #[error(transparent)]
    Handler(BoxError),

    /// One or more notification handlers failed during publish.
    #[error(transparent)]
    AggregateNotificationFailure(NotificationFailures),
}

impl DispatchError {
    /// Converts an error produced by a decorator chain into a dispatch error.
    ///
    /// Only contract violations the dispatcher itself raised while the chain
    /// ran are unwrapped. Anything else is a handler failure and is kept
    /// exactly as returned, including a `DispatchError` from a nested send.
    #[must_use]
    pub(crate) fn from_chain(error: BoxError) -> Self {
        match error.downcast::<ChainViolation>() {
            Ok(violation) => violation.0,
            Err(other) => Self::Handler(other),
        }
    }

    /// Returns `true` when the failure comes from wiring rather than from a
    /// handler running.
    #[must_use]
    pub const fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedRequestKind { .. }
                | Self::HandlerNotRegistered { .. }
                | Self::HandlerContractViolation { .. }
                | Self::DecoratorContractViolation { .. }
        )
    }

    /// Returns the handler error when the dispatch failed inside a handler or
    /// decorator.
    #[must_use]
    pub fn handler_error(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        match self {
            Self::Handler(error) => Some(error.as_ref()),
            _ => None,
        }
    }

    /// Returns the aggregated notification failures, if any.
    #[must_use]
    pub const fn notification_failures(&self) -> Option<&NotificationFailures> {
        match self {
            Self::AggregateNotificationFailure(failures) => Some(failures),
            _ => None,
        }
    }
}

/// Contract violation raised by the dispatcher while a chain runs.
///
/// Carried through the chain as a [`BoxError`] and unwrapped again by
/// [`DispatchError::from_chain`].
#[derive(Debug, Error)]
#[error(transparent)]
pub(crate) struct ChainViolation(pub(crate) DispatchError);

/// Ways a decorator can break its contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecoratorViolation {
    /// The registered service is not a decorator for the request type.
    #[error("service does not implement the decorator contract")]
    Incompatible,
    /// The decorator reported success without running the continuation, so
    /// no response exists.
    #[error("returned success without calling next")]
    MissingContinuation,
    /// The decorator called the continuation more than once.
    #[error("called next more than once")]
    ContinuationReused,
}

/// Failure of a single notification handler.
#[derive(Debug, Error)]
pub enum HandlerFailure {
    /// The handler returned an error.
    #[error("handler `{handler}` failed: {source}")]
    Failed {
        /// Handler type name.
        handler: &'static str,
        /// Error returned by the handler.
        #[source]
        source: BoxError,
    },
    /// The handler panicked.
    #[error("handler `{handler}` panicked: {message}")]
    Panicked {
        /// Handler type name.
        handler: &'static str,
        /// Panic payload rendered as text.
        message: String,
    },
}

impl HandlerFailure {
    /// Returns the type name of the failing handler.
    #[must_use]
    pub const fn handler(&self) -> &'static str {
        match self {
            Self::Failed { handler, .. } | Self::Panicked { handler, .. } => handler,
        }
    }

    /// Returns the error the handler returned, if it did not panic.
    #[must_use]
    pub fn error(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        match self {
            Self::Failed { source, .. } => Some(source.as_ref()),
            Self::Panicked { .. } => None,
        }
    }
}

/// Every failure raised while publishing one notification.
#[derive(Debug)]
pub struct NotificationFailures {
    notification: &'static str,
    attempted: usize,
    failures: Vec<HandlerFailure>,
}

impl NotificationFailures {
    /// Builds an aggregate from the failures of one publish call.
    #[must_use]
    pub const fn new(
        notification: &'static str,
        attempted: usize,
        failures: Vec<HandlerFailure>,
    ) -> Self {
        Self {
            notification,
            attempted,
            failures,
        }
    }

    /// Returns the notification type name.
    #[must_use]
    pub const fn notification(&self) -> &'static str {
        self.notification
    }

    /// Returns how many handlers were invoked.
    #[must_use]
    pub const fn attempted(&self) -> usize {
        self.attempted
    }

    /// Returns the number of failed handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Returns `true` when no handler failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Iterates over the failures in handler registration order.
    pub fn iter(&self) -> impl Iterator<Item = &HandlerFailure> {
        self.failures.iter()
    }

    /// Returns the failure recorded for the named handler.
    #[must_use]
    pub fn for_handler(&self, handler: &str) -> Option<&HandlerFailure> {
        self.failures
            .iter()
            .find(|failure| failure.handler() == handler)
    }

    /// Consumes the aggregate and returns the individual failures.
    #[must_use]
    pub fn into_failures(self) -> Vec<HandlerFailure> {
        self.failures
    }
}

impl fmt::Display for NotificationFailures {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{} of {} handlers failed for `{}`",
            self.failures.len(),
            self.attempted,
            self.notification
        )?;
        for failure in &self.failures {
            write!(formatter, "; {failure}")?;
        }
        Ok(())
    }
}

impl StdError for NotificationFailures {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.failures
            .first()
            .map(|failure| failure as &(dyn StdError + 'static))
    }
}

impl<'a> IntoIterator for &'a NotificationFailures {
    type Item = &'a HandlerFailure;
    type IntoIter = std::slice::Iter<'a, HandlerFailure>;

    fn into_iter(self) -> Self::IntoIter {
        self.failures.iter()
    }
}

/// Errors raised while populating a [`crate::Registry`].
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A handler is already registered for the request type.
    #[error("`{request}` already has handler `{existing}`; refusing `{rejected}`")]
    DuplicateHandler {
        /// Request type name.
        request: &'static str,
        /// Handler registered first.
        existing: &'static str,
        /// Handler that was refused.
        rejected: &'static str,
    },
}
