//! # Handler descriptor.
//!
//! Defines [`HandlerDescriptor`]: the declaration that binds one handler to one
//! action type under one concurrency policy.
//!
//! A descriptor can be created:
//! - **Explicitly** with [`HandlerDescriptor::new`] (any policy, including parsed tags)
//! - **Per policy** with [`HandlerDescriptor::every`], [`latest`](HandlerDescriptor::latest),
//!   [`leading`](HandlerDescriptor::leading) and [`throttle`](HandlerDescriptor::throttle)
//!
//! Descriptors are immutable once built: the `with_*` methods consume and return.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use takevisor::{Action, ConcurrencyPolicy, HandlerDescriptor, HandlerError, HandlerFn, HandlerRef};
//!
//! let fetch: HandlerRef = HandlerFn::arc("fetch", |_a: Action, _ctx: CancellationToken| async {
//!     Ok::<(), HandlerError>(())
//! });
//!
//! let d = HandlerDescriptor::throttle("search/query", Duration::from_millis(500), fetch.clone());
//! assert_eq!(d.policy(), &ConcurrencyPolicy::Throttle);
//! assert_eq!(d.policy_param(), Some(500.0));
//!
//! let d = HandlerDescriptor::new("search/query", "takeLatest".parse().unwrap(), fetch)
//!     .with_timeout(Some(Duration::from_secs(2)));
//! assert_eq!(d.policy(), &ConcurrencyPolicy::Latest);
//! assert_eq!(d.timeout(), Some(Duration::from_secs(2)));
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::handlers::handler::HandlerRef;
use crate::policies::ConcurrencyPolicy;

/// Declaration of one handler bound to an action type and a policy.
#[derive(Clone)]
pub struct HandlerDescriptor {
    action_type: Arc<str>,
    policy: ConcurrencyPolicy,
    policy_param: Option<f64>,
    handler: HandlerRef,
    timeout: Option<Duration>,
}

impl HandlerDescriptor {
    /// Creates a descriptor with an explicit policy and no parameter.
    pub fn new(
        action_type: impl Into<Arc<str>>,
        policy: ConcurrencyPolicy,
        handler: HandlerRef,
    ) -> Self {
        Self {
            action_type: action_type.into(),
            policy,
            policy_param: None,
            handler,
            timeout: None,
        }
    }

    /// `every`: one invocation per matching action, overlapping freely.
    pub fn every(action_type: impl Into<Arc<str>>, handler: HandlerRef) -> Self {
        Self::new(action_type, ConcurrencyPolicy::Every, handler)
    }

    /// `latest`: a newer matching action cancels the in-flight invocation.
    pub fn latest(action_type: impl Into<Arc<str>>, handler: HandlerRef) -> Self {
        Self::new(action_type, ConcurrencyPolicy::Latest, handler)
    }

    /// `leading`: matching actions are ignored while an invocation is in flight.
    pub fn leading(action_type: impl Into<Arc<str>>, handler: HandlerRef) -> Self {
        Self::new(action_type, ConcurrencyPolicy::Leading, handler)
    }

    /// `throttle`: at most one invocation start per `window`.
    pub fn throttle(action_type: impl Into<Arc<str>>, window: Duration, handler: HandlerRef) -> Self {
        Self::new(action_type, ConcurrencyPolicy::Throttle, handler)
            .with_param(window.as_secs_f64() * 1000.0)
    }

    /// Returns a new descriptor with the raw policy parameter (milliseconds).
    pub fn with_param(mut self, ms: f64) -> Self {
        self.policy_param = Some(ms);
        self
    }

    /// Returns a new descriptor with a per-invocation timeout (`None` = inherit).
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the action type this handler reacts to.
    pub fn action_type(&self) -> &str {
        &self.action_type
    }

    /// Returns the declared policy.
    pub fn policy(&self) -> &ConcurrencyPolicy {
        &self.policy
    }

    /// Returns the raw policy parameter, if declared.
    pub fn policy_param(&self) -> Option<f64> {
        self.policy_param
    }

    /// Returns the handler.
    pub fn handler(&self) -> &HandlerRef {
        &self.handler
    }

    /// Convenience: returns the handler name.
    pub fn name(&self) -> &str {
        self.handler.name()
    }

    /// Returns the per-invocation timeout, if configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub(crate) fn action_type_arc(&self) -> Arc<str> {
        self.action_type.clone()
    }
}

impl fmt::Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("action_type", &self.action_type)
            .field("policy", &self.policy)
            .field("policy_param", &self.policy_param)
            .field("handler", &self.handler.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}
