//! Request and notification contracts.
//!
//! A request type declares which dispatch capability it carries through
//! [`Request::CAPABILITIES`]. Exactly one capability must be present:
//!
//! - [`Capabilities::COMMAND`] for commands that produce no value
//!   (`Response = ()`),
//! - [`Capabilities::RESULT_COMMAND`] for commands that return a value,
//! - [`Capabilities::QUERY`] for read-only requests that return a value.
//!
//! Notifications only carry the [`Notification`] marker.

use std::fmt;

use crate::service::TypeKey;

/// Set of dispatch capabilities declared by a request type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Capabilities(u8);

impl Capabilities {
    /// No capability.
    pub const NONE: Self = Self(0);
    /// State-changing request without a response value.
    pub const COMMAND: Self = Self(1);
    /// State-changing request that returns a value.
    pub const RESULT_COMMAND: Self = Self(1 << 1);
    /// Read-only request that returns a value.
    pub const QUERY: Self = Self(1 << 2);

    const NAMED: [(Self, &'static str); 3] = [
        (Self::RESULT_COMMAND, "result_command"),
        (Self::COMMAND, "command"),
        (Self::QUERY, "query"),
    ];

    /// Combines two capability sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Returns `true` when every capability in `other` is present.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    /// Returns the number of declared capabilities.
    #[must_use]
    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    /// Returns `true` when no capability is declared.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for Capabilities {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return formatter.write_str("none");
        }
        let mut first = true;
        for (capability, name) in Self::NAMED {
            if self.contains(capability) {
                if !first {
                    formatter.write_str(" | ")?;
                }
                formatter.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Dispatch kind a request resolves to after classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// Command without a response value.
    PlainCommand,
    /// Command returning a value.
    ResultCommand,
    /// Read-only query returning a value.
    Query,
}

impl RequestKind {
    /// Returns the stable lowercase label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PlainCommand => "command",
            Self::ResultCommand => "result_command",
            Self::Query => "query",
        }
    }

    /// Returns `true` for both command kinds.
    #[must_use]
    pub const fn is_command(self) -> bool {
        matches!(self, Self::PlainCommand | Self::ResultCommand)
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// A command or query routed to exactly one handler.
///
/// The request is borrowed for the duration of a dispatch and never
/// mutated by the dispatcher.
pub trait Request: fmt::Debug + Send + Sync + 'static {
    /// Value produced by the handler. Plain commands use `()`.
    type Response: Send + 'static;

    /// Dispatch capabilities declared by this type.
    const CAPABILITIES: Capabilities;

    /// Returns `true` when the decorator identified by `decorator` must not
    /// wrap this request type.
    #[must_use]
    fn skips_decorator(decorator: &TypeKey) -> bool {
        let _ = decorator;
        false
    }
}

/// A broadcast event delivered to zero or more handlers.
pub trait Notification: fmt::Debug + Send + Sync + 'static {}

#[cfg(test)]
mod tests;
