//! Per-request context
//!
//! Every manager operation runs on behalf of one request. The context names
//! the request for logging and owns the session that storage adapters use to
//! track the request's open transaction.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifies one logical storage session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The caller's request context
///
/// Clones share the session, so a clone observes the same open transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    request_id: String,
    session: SessionId,
}

impl RequestContext {
    /// A context with a fresh request id and a fresh session
    pub fn new() -> Self {
        Self::with_request_id(format!("req-{}", Uuid::new_v4()))
    }

    /// A context for an externally assigned request id
    pub fn with_request_id(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            session: SessionId::new(),
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn session(&self) -> &SessionId {
        &self.session
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
