//! Name → Computation lookup, shared by coordinators and workers.

use std::sync::Arc;

use dashmap::DashMap;

use crate::computation::Computation;

type Factory = Arc<dyn Fn() -> Box<dyn Computation> + Send + Sync>;

/// Registers [`Computation`] factories by name. A factory, not a shared
/// instance, is stored: a coordinator needs a fresh, owned computation per
/// request (`accumulate`/`finalize` are stateful), while a worker is happy
/// sharing one instance across every `partial_compute` call it serves.
/// `create` hands out a fresh boxed instance either way.
#[derive(Clone, Default)]
pub struct ComputationRegistry {
    factories: Arc<DashMap<String, Factory>>,
}

impl ComputationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a computation under `name`, overwriting any prior entry.
    pub fn register<F>(&self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Computation> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    /// Create a fresh instance of the computation registered under `name`.
    pub fn create(&self, name: &str) -> Option<Box<dyn Computation>> {
        self.factories.get(name).map(|factory| factory())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }
}
