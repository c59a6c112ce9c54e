//! In-process request dispatch.
//!
//! `courier` routes strongly typed commands, queries and notifications to
//! the handlers registered for their concrete type. Decorators wrap every
//! handler call in registration order, and the call path for each request
//! type is compiled once and reused.
//!
//! The crate is organised around a small set of seams:
//!
//! - [`message`] declares the [`Request`] and [`Notification`] contracts and
//!   the capability markers that drive [`classify`].
//! - [`handler`] declares what handler and decorator authors implement.
//! - [`service`] is the lookup facade the dispatcher consumes. [`Registry`]
//!   is the in-memory implementation shipped with the crate.
//! - [`Dispatcher`] orchestrates classification, resolution, decoration and
//!   invocation for [`Dispatcher::send`] and fans notifications out in
//!   [`Dispatcher::publish`].

pub mod cache;
pub mod cancellation;
pub mod classify;
pub mod decorators;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod message;
pub mod pipeline;
pub mod publish;
pub mod registry;
pub mod service;
pub mod telemetry;

#[cfg(test)]
mod tests;

pub use self::cache::{CacheStats, CompiledInvocation, InvocationCache};
pub use self::cancellation::{Cancelled, CancellationToken};
pub use self::classify::classify;
pub use self::decorators::LoggingDecorator;
pub use self::dispatcher::Dispatcher;
pub use self::error::{
    BoxError, DecoratorViolation, DispatchError, HandlerFailure, HandlerResult, NotificationFailures,
    RegistryError,
};
pub use self::handler::{
    Decorator, NotificationHandler, Next, RequestContext, RequestHandler, UniversalDecorator,
};
pub use self::message::{Capabilities, Notification, Request, RequestKind};
pub use self::registry::{Module, Registry};
pub use self::service::{RequestKey, Service, ServiceProvider, TypeKey};
pub use self::telemetry::{TelemetryError, TelemetryHandle};
pub use courier_config::{Config, PublishMode};
