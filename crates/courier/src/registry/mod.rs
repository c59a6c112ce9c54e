//! In-memory handler registry.
//!
//! [`Registry`] is the [`ServiceProvider`] shipped with the crate. It is
//! populated up front, either directly or through [`Module`]s, and then
//! handed to the dispatcher. Each request type accepts one handler;
//! notification types accept any number. Typed and universal decorators
//! share a single registration sequence, which is the order they wrap the
//! handler in.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::decorators::LoggingDecorator;
use crate::error::RegistryError;
use crate::handler::{Decorator, NotificationHandler, RequestHandler, UniversalDecorator};
use crate::message::{Notification, Request};
use crate::service::{RequestKey, Service, ServiceProvider, TypeKey};

const REGISTRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::registry");

type Factory = Arc<dyn Fn() -> Service + Send + Sync>;

#[derive(Clone)]
enum Provision {
    Shared(Service),
    Transient { handler: TypeKey, build: Factory },
}

impl Provision {
    const fn handler(&self) -> &TypeKey {
        match self {
            Self::Shared(service) => service.key(),
            Self::Transient { handler, .. } => handler,
        }
    }

    fn provide(&self) -> Service {
        match self {
            Self::Shared(service) => service.clone(),
            Self::Transient { build, .. } => build(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Request(TypeKey),
    Universal,
}

impl Scope {
    fn applies_to(self, key: &RequestKey) -> bool {
        match self {
            Self::Request(request) => request == key.request,
            Self::Universal => true,
        }
    }
}

/// A bundle of registrations contributed by one feature area.
pub trait Module {
    /// Returns a name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Registers the module's handlers and decorators.
    ///
    /// # Errors
    ///
    /// Propagates registration failures such as duplicate handlers.
    fn register(&self, registry: &mut Registry) -> Result<(), RegistryError>;
}

/// Registry of handlers and decorators keyed by message type.
#[derive(Default)]
pub struct Registry {
    handlers: HashMap<RequestKey, Provision>,
    decorators: Vec<(Scope, Service)>,
    notification_handlers: HashMap<TypeKey, Vec<Service>>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the handler for request type `R`.
    ///
    /// The same instance serves every dispatch.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateHandler`] when `R` already has a
    /// handler.
    pub fn register_handler<R, H>(&mut self, handler: H) -> Result<&mut Self, RegistryError>
    where
        R: Request,
        H: RequestHandler<R> + 'static,
    {
        let service = Service::handler::<R, H>(Arc::new(handler));
        self.insert_handler(RequestKey::of::<R>(), Provision::Shared(service))
    }

    /// Registers a factory building a fresh handler for every dispatch of
    /// request type `R`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateHandler`] when `R` already has a
    /// handler.
    pub fn register_handler_factory<R, H, F>(
        &mut self,
        factory: F,
    ) -> Result<&mut Self, RegistryError>
    where
        R: Request,
        H: RequestHandler<R> + 'static,
        F: Fn() -> H + Send + Sync + 'static,
    {
        let build: Factory = Arc::new(move || Service::handler::<R, H>(Arc::new(factory())));
        let provision = Provision::Transient {
            handler: TypeKey::of::<H>(),
            build,
        };
        self.insert_handler(RequestKey::of::<R>(), provision)
    }

    /// Adds a handler for notification type `N`.
    pub fn register_notification_handler<N, H>(&mut self, handler: H) -> &mut Self
    where
        N: Notification,
        H: NotificationHandler<N> + 'static,
    {
        let service = Service::notification_handler::<N, H>(Arc::new(handler));
        debug!(
            target: REGISTRY_TARGET,
            notification = std::any::type_name::<N>(),
            handler = service.type_name(),
            "registered notification handler"
        );
        self.notification_handlers
            .entry(TypeKey::of::<N>())
            .or_default()
            .push(service);
        self
    }

    /// Appends a decorator wrapping the handler of request type `R`.
    pub fn register_decorator<R, D>(&mut self, decorator: D) -> &mut Self
    where
        R: Request,
        D: Decorator<R> + 'static,
    {
        let service = Service::decorator::<R, D>(Arc::new(decorator));
        self.push_decorator(Scope::Request(TypeKey::of::<R>()), service)
    }

    /// Appends a decorator wrapping the handler of every request type.
    pub fn register_universal_decorator<D>(&mut self, decorator: D) -> &mut Self
    where
        D: UniversalDecorator + 'static,
    {
        let service = Service::universal_decorator(Arc::new(decorator));
        self.push_decorator(Scope::Universal, service)
    }

    /// Appends the built-in [`LoggingDecorator`] for every request type.
    #[must_use]
    pub fn with_logging(mut self) -> Self {
        self.register_universal_decorator(LoggingDecorator::new());
        self
    }

    /// Applies every registration contributed by `module`.
    ///
    /// # Errors
    ///
    /// Propagates the first registration failure reported by the module.
    pub fn install<M: Module + ?Sized>(&mut self, module: &M) -> Result<&mut Self, RegistryError> {
        module.register(self)?;
        debug!(
            target: REGISTRY_TARGET,
            module = module.name(),
            "installed module"
        );
        Ok(self)
    }

    /// Returns `true` when request type `R` has a handler.
    #[must_use]
    pub fn has_handler<R: Request>(&self) -> bool {
        self.handlers.contains_key(&RequestKey::of::<R>())
    }

    /// Returns the number of registered request handlers.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Returns the number of registered decorators of either kind.
    #[must_use]
    pub fn decorator_count(&self) -> usize {
        self.decorators.len()
    }

    fn insert_handler(
        &mut self,
        key: RequestKey,
        provision: Provision,
    ) -> Result<&mut Self, RegistryError> {
        if let Some(existing) = self.handlers.get(&key) {
            return Err(RegistryError::DuplicateHandler {
                request: key.request.name(),
                existing: existing.handler().name(),
                rejected: provision.handler().name(),
            });
        }
        debug!(
            target: REGISTRY_TARGET,
            request = key.request.name(),
            handler = provision.handler().name(),
            transient = matches!(provision, Provision::Transient { .. }),
            "registered handler"
        );
        self.handlers.insert(key, provision);
        Ok(self)
    }

    fn push_decorator(&mut self, scope: Scope, service: Service) -> &mut Self {
        debug!(
            target: REGISTRY_TARGET,
            decorator = service.type_name(),
            position = self.decorators.len(),
            universal = scope == Scope::Universal,
            "registered decorator"
        );
        self.decorators.push((scope, service));
        self
    }
}

impl ServiceProvider for Registry {
    fn resolve_handler(&self, key: &RequestKey) -> Option<Service> {
        self.handlers.get(key).map(Provision::provide)
    }

    fn resolve_decorators(&self, key: &RequestKey) -> Vec<Service> {
        self.decorators
            .iter()
            .filter(|(scope, _)| scope.applies_to(key))
            .map(|(_, service)| service.clone())
            .collect()
    }

    fn resolve_notification_handlers(&self, notification: &TypeKey) -> Vec<Service> {
        self.notification_handlers
            .get(notification)
            .cloned()
            .unwrap_or_default()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Registry")
            .field("handlers", &self.handlers.len())
            .field("decorators", &self.decorators.len())
            .field("notification_types", &self.notification_handlers.len())
            .finish()
    }
}
