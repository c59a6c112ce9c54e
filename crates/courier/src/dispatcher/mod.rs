//! Dispatcher facade.
//!
//! [`Dispatcher::send`] classifies the request, resolves its handler and
//! decorators from the [`ServiceProvider`], fetches the compiled invocation
//! from the dispatcher's own [`InvocationCache`] and runs the decorator
//! chain. [`Dispatcher::publish`] resolves every handler of a notification
//! and fans the notification out to them.
//!
//! Nothing here retries or recovers: every failure reaches the caller.

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use courier_config::{Config, PublishMode};
use tracing::{debug, warn};

use crate::cache::InvocationCache;
use crate::cancellation::CancellationToken;
use crate::classify::classify;
use crate::error::{DecoratorViolation, DispatchError};
use crate::handler::{Decorator, UniversalAdapter};
use crate::message::{Notification, Request, RequestKind};
use crate::pipeline::{build_chain, terminal};
use crate::publish::{Subscriber, fan_out};
use crate::service::{RequestKey, Service, ServiceProvider, TypeKey};

const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Entry point routing requests and notifications to their handlers.
pub struct Dispatcher {
    services: Arc<dyn ServiceProvider>,
    cache: InvocationCache,
    publish_mode: PublishMode,
}

impl Dispatcher {
    /// Creates a dispatcher over `services` with concurrent publishing.
    #[must_use]
    pub fn new(services: Arc<dyn ServiceProvider>) -> Self {
        Self {
            services,
            cache: InvocationCache::new(),
            publish_mode: PublishMode::default(),
        }
    }

    /// Creates a dispatcher using the settings in `config`.
    #[must_use]
    pub fn from_config(services: Arc<dyn ServiceProvider>, config: &Config) -> Self {
        Self::new(services).with_publish_mode(config.publish_mode())
    }

    /// Replaces the notification fan-out strategy.
    #[must_use]
    pub const fn with_publish_mode(mut self, mode: PublishMode) -> Self {
        self.publish_mode = mode;
        self
    }

    /// Returns the notification fan-out strategy.
    #[must_use]
    pub const fn publish_mode(&self) -> PublishMode {
        self.publish_mode
    }

    /// Returns the dispatcher's invocation cache.
    #[must_use]
    pub const fn cache(&self) -> &InvocationCache {
        &self.cache
    }

    /// Sends a command or query to its handler through the decorator chain.
    ///
    /// Plain commands yield `()`.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::UnsupportedRequestKind`] when `R` does not declare
    ///   exactly one capability.
    /// - [`DispatchError::HandlerNotRegistered`] when no handler is wired.
    ///   No decorator lookup or compilation happens in that case.
    /// - [`DispatchError::HandlerContractViolation`] and
    ///   [`DispatchError::DecoratorContractViolation`] when the provider
    ///   returns services of the wrong shape.
    /// - [`DispatchError::Handler`] carrying the error a handler or
    ///   decorator returned, even when that error is itself a
    ///   `DispatchError` from a nested send.
    pub fn send<R: Request>(
        &self,
        request: &R,
        token: &CancellationToken,
    ) -> Result<R::Response, DispatchError> {
        let kind = classify(request)?;
        let key = RequestKey::of::<R>();

        let Some(service) = self.services.resolve_handler(&key) else {
            warn!(
                target: DISPATCH_TARGET,
                request = key.request.name(),
                response = key.response.name(),
                "no handler registered"
            );
            return Err(DispatchError::HandlerNotRegistered {
                request: key.request.name(),
                response: key.response.name(),
            });
        };
        let handler =
            service
                .as_handler::<R>()
                .ok_or_else(|| DispatchError::HandlerContractViolation {
                    request: key.request.name(),
                    service: service.type_name(),
                })?;

        let decorators = self.decorators::<R>(&key, kind)?;
        let compiled = self.cache.get_or_compile::<R>()?;

        debug!(
            target: DISPATCH_TARGET,
            request = key.request.name(),
            kind = %kind,
            handler = service.type_name(),
            decorators = decorators.len(),
            "dispatching request"
        );

        let innermost = terminal(&compiled, handler.as_ref(), request, token);
        build_chain(&decorators, request, token, innermost)
            .run()
            .map_err(DispatchError::from_chain)
    }

    /// Publishes a notification to every handler registered for `N`.
    ///
    /// With no handlers registered the call succeeds without doing anything.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::HandlerContractViolation`] when the provider
    ///   returns a service that does not handle `N`. No handler runs.
    /// - [`DispatchError::AggregateNotificationFailure`] carrying every
    ///   handler failure once all handlers have finished.
    pub fn publish<N: Notification>(
        &self,
        notification: &N,
        token: &CancellationToken,
    ) -> Result<(), DispatchError> {
        let key = TypeKey::of::<N>();
        let subscribers = self
            .services
            .resolve_notification_handlers(&key)
            .into_iter()
            .map(|service| subscriber::<N>(&service))
            .collect::<Result<Vec<_>, _>>()?;

        fan_out(notification, &subscribers, token, self.publish_mode)
            .map_err(DispatchError::AggregateNotificationFailure)
    }

    fn decorators<R: Request>(
        &self,
        key: &RequestKey,
        kind: RequestKind,
    ) -> Result<Vec<Arc<dyn Decorator<R>>>, DispatchError> {
        self.services
            .resolve_decorators(key)
            .into_iter()
            .filter(|service| {
                let skipped = R::skips_decorator(service.key());
                if skipped {
                    debug!(
                        target: DISPATCH_TARGET,
                        request = key.request.name(),
                        decorator = service.type_name(),
                        "decorator skipped"
                    );
                }
                !skipped
            })
            .map(|service| decorator::<R>(&service, kind))
            .collect()
    }
}

fn decorator<R: Request>(
    service: &Service,
    kind: RequestKind,
) -> Result<Arc<dyn Decorator<R>>, DispatchError> {
    if let Some(typed) = service.as_decorator::<R>() {
        return Ok(typed);
    }
    if let Some(universal) = service.as_universal_decorator() {
        let adapted: Arc<dyn Decorator<R>> = Arc::new(UniversalAdapter::<R>::new(
            universal,
            service.type_name(),
            kind,
        ));
        return Ok(adapted);
    }
    Err(DispatchError::DecoratorContractViolation {
        request: type_name::<R>(),
        decorator: service.type_name(),
        violation: DecoratorViolation::Incompatible,
    })
}

fn subscriber<N: Notification>(service: &Service) -> Result<Subscriber<N>, DispatchError> {
    service
        .as_notification_handler::<N>()
        .map(|handler| Subscriber::new(service.type_name(), handler))
        .ok_or_else(|| DispatchError::HandlerContractViolation {
            request: type_name::<N>(),
            service: service.type_name(),
        })
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Dispatcher")
            .field("cache", &self.cache)
            .field("publish_mode", &self.publish_mode)
            .finish_non_exhaustive()
    }
}
