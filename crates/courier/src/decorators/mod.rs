//! Built-in decorators.

use std::time::Instant;

use tracing::{debug, info_span, warn};

use crate::cancellation::CancellationToken;
use crate::error::HandlerResult;
use crate::handler::{RequestContext, UniversalDecorator};

const REQUEST_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::request");

/// Logs the start, outcome and duration of every request.
///
/// The decorator always runs the rest of the chain and returns its outcome
/// unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingDecorator;

impl LoggingDecorator {
    /// Creates the decorator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl UniversalDecorator for LoggingDecorator {
    fn handle(
        &self,
        context: &RequestContext<'_>,
        next: &mut dyn FnMut() -> HandlerResult<()>,
        _token: &CancellationToken,
    ) -> HandlerResult<()> {
        let span = info_span!(
            target: REQUEST_TARGET,
            "request",
            request = context.request_type(),
            kind = %context.kind()
        );
        let _entered = span.enter();

        debug!(
            target: REQUEST_TARGET,
            payload = ?context.request(),
            "starting request"
        );
        let started = Instant::now();
        let outcome = next();
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        match &outcome {
            Ok(()) => debug!(target: REQUEST_TARGET, elapsed_ms, "finished request"),
            Err(error) => warn!(
                target: REQUEST_TARGET,
                elapsed_ms,
                error = %error,
                "request failed"
            ),
        }
        outcome
    }
}
