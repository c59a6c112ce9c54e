//! Decorator chain composition.
//!
//! The chain is a right fold over the decorators: the terminal handler call
//! is the innermost link and each decorator, from last to first, wraps the
//! link built so far. Running the result therefore enters the first
//! decorator first.

use std::sync::Arc;

use crate::cache::CompiledInvocation;
use crate::cancellation::CancellationToken;
use crate::handler::{Decorator, Next, RequestHandler};
use crate::message::Request;

/// Builds the innermost link: the compiled call into the handler.
#[must_use]
pub fn terminal<'a, R: Request>(
    compiled: &'a CompiledInvocation<R>,
    handler: &'a dyn RequestHandler<R>,
    request: &'a R,
    token: &'a CancellationToken,
) -> Next<'a, R::Response> {
    Next::new(move || compiled.invoke(handler, request, token))
}

/// Wraps `terminal` in `decorators`, outermost first.
///
/// Every link receives the same request and token. Each decorator runs at
/// most once, and a decorator that does not run its continuation prevents
/// every later decorator and the handler from running.
#[must_use]
pub fn build_chain<'a, R: Request>(
    decorators: &'a [Arc<dyn Decorator<R>>],
    request: &'a R,
    token: &'a CancellationToken,
    terminal: Next<'a, R::Response>,
) -> Next<'a, R::Response> {
    decorators
        .iter()
        .rev()
        .fold(terminal, |next, decorator| {
            Next::new(move || decorator.handle(request, next, token))
        })
}
