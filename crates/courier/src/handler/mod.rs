//! Contracts implemented by handler and decorator authors.
//!
//! Handlers receive the request by reference together with the caller's
//! [`CancellationToken`]. Decorators additionally receive a [`Next`]
//! continuation that runs the rest of the chain; they may run it once or
//! skip it to short-circuit with their own response.

mod universal;

use std::fmt;

use crate::cancellation::CancellationToken;
use crate::error::HandlerResult;
use crate::message::{Notification, Request, RequestKind};

pub(crate) use self::universal::UniversalAdapter;

/// The single handler responsible for a request type.
pub trait RequestHandler<R: Request>: Send + Sync {
    /// Handles the request.
    ///
    /// # Errors
    ///
    /// Any error returned here reaches the caller of
    /// [`crate::Dispatcher::send`] unchanged.
    fn handle(&self, request: &R, token: &CancellationToken) -> HandlerResult<R::Response>;
}

/// One of the handlers observing a notification type.
pub trait NotificationHandler<N: Notification>: Send + Sync {
    /// Handles the notification.
    ///
    /// # Errors
    ///
    /// Failures are collected into the aggregate reported by
    /// [`crate::Dispatcher::publish`].
    fn handle(&self, notification: &N, token: &CancellationToken) -> HandlerResult<()>;
}

/// Continuation running the remainder of a decorator chain.
///
/// Consumed by [`Next::run`], so each link runs at most once.
pub struct Next<'a, T> {
    call: Box<dyn FnOnce() -> HandlerResult<T> + 'a>,
}

impl<'a, T> Next<'a, T> {
    /// Wraps a closure as a continuation.
    pub fn new(call: impl FnOnce() -> HandlerResult<T> + 'a) -> Self {
        Self {
            call: Box::new(call),
        }
    }

    /// Runs the rest of the chain.
    ///
    /// # Errors
    ///
    /// Returns whatever the inner decorators or the handler return.
    pub fn run(self) -> HandlerResult<T> {
        (self.call)()
    }
}

impl<T> fmt::Debug for Next<'_, T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("Next").finish_non_exhaustive()
    }
}

/// Cross-cutting behaviour wrapped around the handler of one request type.
pub trait Decorator<R: Request>: Send + Sync {
    /// Handles the request, usually by calling `next.run()`.
    ///
    /// # Errors
    ///
    /// Errors from `next` should be returned as-is. Errors raised by the
    /// decorator itself reach the caller unchanged.
    fn handle(
        &self,
        request: &R,
        next: Next<'_, R::Response>,
        token: &CancellationToken,
    ) -> HandlerResult<R::Response>;
}

/// Type-erased view of a request handed to universal decorators.
#[derive(Clone, Copy)]
pub struct RequestContext<'a> {
    request_type: &'static str,
    response_type: &'static str,
    kind: RequestKind,
    request: &'a dyn fmt::Debug,
}

impl<'a> RequestContext<'a> {
    /// Builds the context for a classified request.
    #[must_use]
    pub fn new<R: Request>(request: &'a R, kind: RequestKind) -> Self {
        Self {
            request_type: std::any::type_name::<R>(),
            response_type: std::any::type_name::<R::Response>(),
            kind,
            request,
        }
    }

    /// Returns the request type name.
    #[must_use]
    pub const fn request_type(&self) -> &'static str {
        self.request_type
    }

    /// Returns the response type name.
    #[must_use]
    pub const fn response_type(&self) -> &'static str {
        self.response_type
    }

    /// Returns the classified request kind.
    #[must_use]
    pub const fn kind(&self) -> RequestKind {
        self.kind
    }

    /// Returns the request for `Debug` rendering.
    #[must_use]
    pub const fn request(&self) -> &'a dyn fmt::Debug {
        self.request
    }
}

impl fmt::Debug for RequestContext<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("RequestContext")
            .field("request_type", &self.request_type)
            .field("kind", &self.kind)
            .field("request", self.request)
            .finish()
    }
}

/// Decorator applied to every request type.
///
/// A universal decorator cannot build a response for an arbitrary request,
/// so it must either call `next` exactly once and return `Ok(())`, or fail.
/// Calling `next` yields `Ok(())` when the inner chain succeeded; the
/// response itself is forwarded to the caller untouched. Returning `Ok(())`
/// without calling `next`, or calling it twice, is a
/// [`crate::DispatchError::DecoratorContractViolation`].
pub trait UniversalDecorator: Send + Sync {
    /// Handles a request of any type.
    ///
    /// # Errors
    ///
    /// Returning the error produced by `next` reports the inner failure to
    /// the caller unchanged. Any other error replaces the response.
    fn handle(
        &self,
        context: &RequestContext<'_>,
        next: &mut dyn FnMut() -> HandlerResult<()>,
        token: &CancellationToken,
    ) -> HandlerResult<()>;
}
