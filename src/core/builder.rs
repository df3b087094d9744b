use std::sync::Arc;

use crate::{
    events::Bus,
    subscribers::{Subscribe, SubscriberSet},
};
use super::{config::SupervisorConfig, registry::HandlerRegistry, supervisor::Supervisor};

/// Builder for constructing a Supervisor with optional features.
pub struct SupervisorBuilder {
    cfg: SupervisorConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
    registry: Option<Arc<HandlerRegistry>>,
}

impl SupervisorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: SupervisorConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            registry: None,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (watcher lifecycle, invocation
    /// failures, etc.) through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Uses an existing registry instead of an empty one.
    ///
    /// Lets several supervisors (or the code that declares handlers) share one table.
    pub fn with_registry(mut self, registry: Arc<HandlerRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Builds and returns the Supervisor instance.
    ///
    /// This consumes the builder and initializes all runtime components:
    /// - Event bus for broadcasting
    /// - Subscriber workers
    /// - Action stream
    /// - Bus listener feeding the alive tracker and subscribers
    pub fn build(self) -> Arc<Supervisor> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));
        let registry = self.registry.unwrap_or_default();

        Arc::new(Supervisor::new_internal(self.cfg, bus, subs, registry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::HandlerSet;

    #[tokio::test]
    async fn shares_an_external_registry() {
        let registry = Arc::new(HandlerRegistry::new());
        let sup = SupervisorBuilder::new(SupervisorConfig::default())
            .with_registry(Arc::clone(&registry))
            .build();

        sup.register("cart", HandlerSet::new()).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(Arc::ptr_eq(sup.registry(), &registry));
    }
}
