//! Notification fan-out.
//!
//! Every handler registered for a notification runs, whatever the others
//! do. Failures and panics are collected per handler and reported together.
//! Each handler receives a child of the caller's token: cancelling the
//! caller's token reaches every in-flight handler, while a handler that
//! cancels its own token does not affect its siblings.

use std::any::{Any, type_name};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use courier_config::PublishMode;
use tracing::{debug, warn};

use crate::cancellation::CancellationToken;
use crate::error::{HandlerFailure, HandlerResult, NotificationFailures};
use crate::handler::NotificationHandler;
use crate::message::Notification;

const PUBLISH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::publish");

/// A resolved notification handler and the name it is reported under.
pub struct Subscriber<N: Notification> {
    name: &'static str,
    handler: Arc<dyn NotificationHandler<N>>,
}

impl<N: Notification> Subscriber<N> {
    /// Pairs a handler with its reporting name.
    #[must_use]
    pub fn new(name: &'static str, handler: Arc<dyn NotificationHandler<N>>) -> Self {
        Self { name, handler }
    }

    /// Returns the reporting name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    fn guarded(&self, notification: &N, token: &CancellationToken) -> Option<HandlerFailure> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.handler.handle(notification, token)
        }));
        self.settle(outcome)
    }

    fn settle(
        &self,
        outcome: Result<HandlerResult<()>, Box<dyn Any + Send>>,
    ) -> Option<HandlerFailure> {
        match outcome {
            Ok(Ok(())) => None,
            Ok(Err(source)) => Some(HandlerFailure::Failed {
                handler: self.name,
                source,
            }),
            Err(payload) => Some(HandlerFailure::Panicked {
                handler: self.name,
                message: panic_message(payload.as_ref()),
            }),
        }
    }
}

/// Delivers `notification` to every subscriber.
///
/// # Errors
///
/// Returns every failure, in subscriber order, when at least one handler
/// failed or panicked. An empty subscriber list always succeeds.
pub fn fan_out<N: Notification>(
    notification: &N,
    subscribers: &[Subscriber<N>],
    token: &CancellationToken,
    mode: PublishMode,
) -> Result<(), NotificationFailures> {
    debug!(
        target: PUBLISH_TARGET,
        notification = type_name::<N>(),
        handlers = subscribers.len(),
        mode = %mode,
        "publishing notification"
    );

    let outcomes = match mode {
        PublishMode::Concurrent => run_concurrently(notification, subscribers, token),
        PublishMode::Sequential => subscribers
            .iter()
            .map(|subscriber| subscriber.guarded(notification, &token.child()))
            .collect(),
    };

    let failures: Vec<HandlerFailure> = outcomes.into_iter().flatten().collect();
    if failures.is_empty() {
        return Ok(());
    }

    warn!(
        target: PUBLISH_TARGET,
        notification = type_name::<N>(),
        failed = failures.len(),
        handlers = subscribers.len(),
        "notification handlers failed"
    );
    Err(NotificationFailures::new(
        type_name::<N>(),
        subscribers.len(),
        failures,
    ))
}

fn run_concurrently<N: Notification>(
    notification: &N,
    subscribers: &[Subscriber<N>],
    token: &CancellationToken,
) -> Vec<Option<HandlerFailure>> {
    let Some((first, rest)) = subscribers.split_first() else {
        return Vec::new();
    };

    thread::scope(|scope| {
        let spawned: Vec<_> = rest
            .iter()
            .map(|subscriber| {
                let child = token.child();
                scope.spawn(move || subscriber.handler.handle(notification, &child))
            })
            .collect();

        let mut outcomes = Vec::with_capacity(subscribers.len());
        outcomes.push(first.guarded(notification, &token.child()));
        for (subscriber, handle) in rest.iter().zip(spawned) {
            outcomes.push(subscriber.settle(handle.join()));
        }
        outcomes
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned())
}
