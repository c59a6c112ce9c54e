//! Invocation cache.
//!
//! Each request type compiles to one [`CompiledInvocation`]: the resolved
//! call into its handler contract. The cache is owned by the dispatcher,
//! append-only and safe under concurrent first use. Lookups take the read
//! lock; compilation happens outside any lock, and the first value written
//! wins. Every caller receives that canonical value.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::cancellation::CancellationToken;
use crate::classify::kind_of;
use crate::error::{DispatchError, HandlerResult};
use crate::handler::RequestHandler;
use crate::message::{Request, RequestKind};

const CACHE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::cache");

type Invoke<R> = fn(
    &dyn RequestHandler<R>,
    &R,
    &CancellationToken,
) -> HandlerResult<<R as Request>::Response>;

/// Memoised call path for one request type.
pub struct CompiledInvocation<R: Request> {
    kind: RequestKind,
    request_type: &'static str,
    invoke: Invoke<R>,
}

impl<R: Request> CompiledInvocation<R> {
    fn compile(kind: RequestKind) -> Self {
        Self {
            kind,
            request_type: type_name::<R>(),
            invoke: invoke_handler::<R>,
        }
    }

    /// Returns the kind the request type was classified as.
    #[must_use]
    pub const fn kind(&self) -> RequestKind {
        self.kind
    }

    /// Returns the request type name.
    #[must_use]
    pub const fn request_type(&self) -> &'static str {
        self.request_type
    }

    /// Calls the handler with the request and token.
    ///
    /// # Errors
    ///
    /// Returns the handler's own error.
    pub fn invoke(
        &self,
        handler: &dyn RequestHandler<R>,
        request: &R,
        token: &CancellationToken,
    ) -> HandlerResult<R::Response> {
        (self.invoke)(handler, request, token)
    }
}

impl<R: Request> fmt::Debug for CompiledInvocation<R> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("CompiledInvocation")
            .field("request_type", &self.request_type)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

fn invoke_handler<R: Request>(
    handler: &dyn RequestHandler<R>,
    request: &R,
    token: &CancellationToken,
) -> HandlerResult<R::Response> {
    handler.handle(request, token)
}

/// Counters describing cache behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that had to compile. Unclassifiable types are not counted.
    pub misses: u64,
    /// Entries stored. Lower than `misses` when callers raced.
    pub compiled: u64,
}

type Entry = Arc<dyn Any + Send + Sync>;

/// Concurrency-safe memo of compiled invocations keyed by request type.
#[derive(Default)]
pub struct InvocationCache {
    entries: RwLock<HashMap<TypeId, Entry>>,
    hits: AtomicU64,
    misses: AtomicU64,
    compiled: AtomicU64,
}

impl InvocationCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the canonical compiled invocation for `R`, compiling it on
    /// first use.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnsupportedRequestKind`] when `R` cannot be
    /// classified. Nothing is cached in that case.
    pub fn get_or_compile<R: Request>(&self) -> Result<Arc<CompiledInvocation<R>>, DispatchError> {
        let id = TypeId::of::<R>();
        if let Some(compiled) = self.lookup(id).and_then(downcast::<R>) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(compiled);
        }

        let kind = kind_of::<R>()?;
        self.misses.fetch_add(1, Ordering::Relaxed);
        let fresh = Arc::new(CompiledInvocation::<R>::compile(kind));
        let candidate: Entry = fresh.clone();

        let stored = {
            let mut entries = self
                .entries
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let before = entries.len();
            let canonical = Arc::clone(entries.entry(id).or_insert(candidate));
            if entries.len() > before {
                self.compiled.fetch_add(1, Ordering::Relaxed);
                debug!(
                    target: CACHE_TARGET,
                    request = type_name::<R>(),
                    kind = %kind,
                    "compiled invocation"
                );
            }
            canonical
        };

        // Entries are keyed by `TypeId::of::<R>()`, so the stored value is
        // always a `CompiledInvocation<R>`.
        Ok(downcast::<R>(stored).unwrap_or(fresh))
    }

    /// Returns `true` when `R` has a compiled invocation.
    #[must_use]
    pub fn contains<R: Request>(&self) -> bool {
        self.lookup(TypeId::of::<R>()).is_some()
    }

    /// Returns the number of compiled request types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` when nothing has been compiled yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a snapshot of the cache counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            compiled: self.compiled.load(Ordering::Relaxed),
        }
    }

    fn lookup(&self, id: TypeId) -> Option<Entry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }
}

impl fmt::Debug for InvocationCache {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("InvocationCache")
            .field("entries", &self.len())
            .field("stats", &self.stats())
            .finish()
    }
}

fn downcast<R: Request>(entry: Entry) -> Option<Arc<CompiledInvocation<R>>> {
    entry.downcast::<CompiledInvocation<R>>().ok()
}
