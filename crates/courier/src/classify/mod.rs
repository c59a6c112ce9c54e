//! Message classification.
//!
//! Classification inspects only the capabilities declared on the request
//! type. It checks, in order, for a result command, a plain command and a
//! query, and rejects types that declare none or more than one.

use std::any::{TypeId, type_name};

use crate::error::DispatchError;
use crate::message::{Capabilities, Request, RequestKind};

/// Classifies a request value by the capabilities of its type.
///
/// # Errors
///
/// Returns [`DispatchError::UnsupportedRequestKind`] when the type declares
/// no capability, more than one capability, or the plain command capability
/// with a response other than `()`.
pub fn classify<R: Request>(request: &R) -> Result<RequestKind, DispatchError> {
    let _ = request;
    kind_of::<R>()
}

/// Classifies a request type without needing a value.
///
/// # Errors
///
/// See [`classify`].
pub fn kind_of<R: Request>() -> Result<RequestKind, DispatchError> {
    let capabilities = R::CAPABILITIES;
    if capabilities.len() != 1 {
        return Err(unsupported::<R>());
    }

    if capabilities.contains(Capabilities::RESULT_COMMAND) {
        Ok(RequestKind::ResultCommand)
    } else if capabilities.contains(Capabilities::COMMAND) {
        if TypeId::of::<R::Response>() == TypeId::of::<()>() {
            Ok(RequestKind::PlainCommand)
        } else {
            Err(unsupported::<R>())
        }
    } else if capabilities.contains(Capabilities::QUERY) {
        Ok(RequestKind::Query)
    } else {
        Err(unsupported::<R>())
    }
}

fn unsupported<R: Request>() -> DispatchError {
    DispatchError::UnsupportedRequestKind {
        request: type_name::<R>(),
        capabilities: R::CAPABILITIES,
    }
}
