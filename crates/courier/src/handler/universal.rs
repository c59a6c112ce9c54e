//! Adapter running a [`UniversalDecorator`] as a typed [`Decorator`].

use std::any::type_name;
use std::marker::PhantomData;
use std::sync::Arc;

use thiserror::Error;

use super::{Decorator, Next, RequestContext, UniversalDecorator};
use crate::cancellation::CancellationToken;
use crate::error::{ChainViolation, DecoratorViolation, DispatchError, HandlerResult};
use crate::message::{Request, RequestKind};

/// Stand-in error handed to a universal decorator when the inner chain
/// failed. The original error is kept by the adapter and returned instead.
#[derive(Debug, Error)]
#[error("{message}")]
struct InnerFailure {
    message: String,
}

pub(crate) struct UniversalAdapter<R> {
    inner: Arc<dyn UniversalDecorator>,
    name: &'static str,
    kind: RequestKind,
    _request: PhantomData<fn(&R)>,
}

impl<R: Request> UniversalAdapter<R> {
    pub(crate) fn new(
        inner: Arc<dyn UniversalDecorator>,
        name: &'static str,
        kind: RequestKind,
    ) -> Self {
        Self {
            inner,
            name,
            kind,
            _request: PhantomData,
        }
    }

    fn violation(&self, violation: DecoratorViolation) -> ChainViolation {
        ChainViolation(DispatchError::DecoratorContractViolation {
            request: type_name::<R>(),
            decorator: self.name,
            violation,
        })
    }
}

impl<R: Request> Decorator<R> for UniversalAdapter<R> {
    fn handle(
        &self,
        request: &R,
        next: Next<'_, R::Response>,
        token: &CancellationToken,
    ) -> HandlerResult<R::Response> {
        let context = RequestContext::new(request, self.kind);
        let mut pending = Some(next);
        let mut outcome: Option<HandlerResult<R::Response>> = None;
        let mut reused = false;

        let verdict = {
            let mut proceed = || -> HandlerResult<()> {
                let Some(continuation) = pending.take() else {
                    reused = true;
                    return Err(Box::new(DecoratorViolation::ContinuationReused));
                };
                match continuation.run() {
                    Ok(response) => {
                        outcome = Some(Ok(response));
                        Ok(())
                    }
                    Err(error) => {
                        let message = error.to_string();
                        outcome = Some(Err(error));
                        Err(Box::new(InnerFailure { message }))
                    }
                }
            };
            self.inner.handle(&context, &mut proceed, token)
        };

        if reused {
            return Err(Box::new(
                self.violation(DecoratorViolation::ContinuationReused),
            ));
        }

        match (verdict, outcome) {
            (Err(error), Some(Err(inner))) if error.is::<InnerFailure>() => Err(inner),
            (Err(error), _) => Err(error),
            (Ok(()), Some(result)) => result,
            (Ok(()), None) => Err(Box::new(
                self.violation(DecoratorViolation::MissingContinuation),
            )),
        }
    }
}
