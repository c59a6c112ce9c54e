//! Lookup facade consumed by the dispatcher.
//!
//! The dispatcher never constructs handlers. It asks a [`ServiceProvider`]
//! for the handler, decorators and notification handlers registered for a
//! type and borrows what it gets back for one call. Values cross the facade
//! as [`Service`], a type-erased handle that remembers the concrete type it
//! was built from.

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::handler::{Decorator, NotificationHandler, RequestHandler, UniversalDecorator};
use crate::message::{Notification, Request};

/// Runtime identity of a Rust type.
///
/// Equality and hashing use the [`TypeId`] only; the name is carried for
/// diagnostics.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Returns the key of `T`.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Returns the type identifier.
    #[must_use]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    /// Returns the type name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name)
    }
}

/// Lookup key for a command or query: the request and response types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestKey {
    /// Request type.
    pub request: TypeKey,
    /// Response type.
    pub response: TypeKey,
}

impl RequestKey {
    /// Returns the key for request type `R`.
    #[must_use]
    pub fn of<R: Request>() -> Self {
        Self {
            request: TypeKey::of::<R>(),
            response: TypeKey::of::<R::Response>(),
        }
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} -> {}", self.request, self.response)
    }
}

/// Type-erased handler or decorator returned by a [`ServiceProvider`].
#[derive(Clone)]
pub struct Service {
    key: TypeKey,
    value: Arc<dyn Any + Send + Sync>,
}

impl Service {
    fn erase<T: Any + Send + Sync>(key: TypeKey, value: T) -> Self {
        Self {
            key,
            value: Arc::new(value),
        }
    }

    /// Wraps the handler for request type `R`.
    #[must_use]
    pub fn handler<R, H>(handler: Arc<H>) -> Self
    where
        R: Request,
        H: RequestHandler<R> + 'static,
    {
        let erased: Arc<dyn RequestHandler<R>> = handler;
        Self::erase(TypeKey::of::<H>(), erased)
    }

    /// Wraps a handler for notification type `N`.
    #[must_use]
    pub fn notification_handler<N, H>(handler: Arc<H>) -> Self
    where
        N: Notification,
        H: NotificationHandler<N> + 'static,
    {
        let erased: Arc<dyn NotificationHandler<N>> = handler;
        Self::erase(TypeKey::of::<H>(), erased)
    }

    /// Wraps a decorator for request type `R`.
    #[must_use]
    pub fn decorator<R, D>(decorator: Arc<D>) -> Self
    where
        R: Request,
        D: Decorator<R> + 'static,
    {
        let erased: Arc<dyn Decorator<R>> = decorator;
        Self::erase(TypeKey::of::<D>(), erased)
    }

    /// Wraps a decorator applied to every request type.
    #[must_use]
    pub fn universal_decorator<D>(decorator: Arc<D>) -> Self
    where
        D: UniversalDecorator + 'static,
    {
        let erased: Arc<dyn UniversalDecorator> = decorator;
        Self::erase(TypeKey::of::<D>(), erased)
    }

    /// Returns the key of the concrete type this service was built from.
    #[must_use]
    pub const fn key(&self) -> &TypeKey {
        &self.key
    }

    /// Returns the concrete type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.key.name
    }

    /// Returns the service as a handler for `R`, if it is one.
    #[must_use]
    pub fn as_handler<R: Request>(&self) -> Option<Arc<dyn RequestHandler<R>>> {
        self.value
            .downcast_ref::<Arc<dyn RequestHandler<R>>>()
            .cloned()
    }

    /// Returns the service as a handler for notification `N`, if it is one.
    #[must_use]
    pub fn as_notification_handler<N: Notification>(
        &self,
    ) -> Option<Arc<dyn NotificationHandler<N>>> {
        self.value
            .downcast_ref::<Arc<dyn NotificationHandler<N>>>()
            .cloned()
    }

    /// Returns the service as a decorator for `R`, if it is one.
    #[must_use]
    pub fn as_decorator<R: Request>(&self) -> Option<Arc<dyn Decorator<R>>> {
        self.value.downcast_ref::<Arc<dyn Decorator<R>>>().cloned()
    }

    /// Returns the service as a universal decorator, if it is one.
    #[must_use]
    pub fn as_universal_decorator(&self) -> Option<Arc<dyn UniversalDecorator>> {
        self.value
            .downcast_ref::<Arc<dyn UniversalDecorator>>()
            .cloned()
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Service")
            .field("type", &self.key)
            .finish_non_exhaustive()
    }
}

/// Lookups the dispatcher performs against the handler registry.
///
/// Implementations are plain lookups; the dispatcher memoises anything
/// expensive itself.
pub trait ServiceProvider: Send + Sync {
    /// Returns the single handler registered for `key`, if any.
    fn resolve_handler(&self, key: &RequestKey) -> Option<Service>;

    /// Returns the decorators for `key`, outermost first.
    fn resolve_decorators(&self, key: &RequestKey) -> Vec<Service>;

    /// Returns every handler registered for the notification type.
    fn resolve_notification_handlers(&self, notification: &TypeKey) -> Vec<Service>;
}
