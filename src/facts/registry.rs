//! Fact Registry and Evaluation Passes
//!
//! Providers are registered by typed name and invoked through an
//! [`Evaluation`]: one pass over the registry with its own cache, so each
//! provider runs at most once per pass and dependencies between facts stay
//! explicit. Nothing is cached across passes.

use std::collections::BTreeMap;

use chrono::Utc;
use tracing::debug;

use crate::config::FactsConfig;
use crate::error::{Error, Result};
use crate::facts::providers::{
    HostnameProvider, MysqldVersionProvider, ServerIdProvider, SystemMacProvider,
};
use crate::facts::{FactName, FactSnapshot, Resolution};

/// A source for one host fact
///
/// Providers receive the current [`Evaluation`] so that a fact depending on
/// another fact asks the pass for it (and shares the pass cache) instead of
/// reaching into the host on its own.
pub trait FactProvider: Send + Sync {
    /// The fact this provider resolves
    fn name(&self) -> FactName;

    /// Resolve the fact within one evaluation pass
    fn resolve(&self, eval: &mut Evaluation<'_>) -> Result<Resolution>;
}

/// Registry of fact providers, keyed by typed fact name
pub struct FactRegistry {
    providers: BTreeMap<FactName, Box<dyn FactProvider>>,
}

impl FactRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            providers: BTreeMap::new(),
        }
    }

    /// The built-in provider set, configured from `[facts]`
    pub fn standard(config: &FactsConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(HostnameProvider));
        registry.register(Box::new(SystemMacProvider::new(config.interface.clone())));
        registry.register(Box::new(MysqldVersionProvider::new(
            config.mysqld_path.clone(),
        )));
        registry.register(Box::new(ServerIdProvider));
        registry
    }

    /// Register a provider, replacing any existing provider of the same name
    ///
    /// Replacement is the override mechanism: registering a
    /// [`crate::facts::FixedMacProvider`] over the system one pins the
    /// `macaddress` fact for tests and `--mac` runs.
    pub fn register(&mut self, provider: Box<dyn FactProvider>) {
        let name = provider.name();
        if self.providers.insert(name, provider).is_some() {
            debug!("Replaced provider for fact {}", name);
        }
    }

    /// Names of all registered facts, in order
    pub fn names(&self) -> Vec<FactName> {
        self.providers.keys().copied().collect()
    }

    /// Whether a provider is registered for `name`
    pub fn contains(&self, name: FactName) -> bool {
        self.providers.contains_key(&name)
    }

    /// Begin a fresh evaluation pass
    pub fn evaluate(&self) -> Evaluation<'_> {
        Evaluation::new(self)
    }

    /// Run one full pass and snapshot every registered fact
    pub fn snapshot(&self) -> Result<FactSnapshot> {
        self.evaluate().snapshot()
    }
}

impl Default for FactRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// One evaluation pass over a registry
///
/// Resolutions are cached for the lifetime of the pass only; a new pass
/// starts cold and re-runs every provider it touches.
pub struct Evaluation<'a> {
    registry: &'a FactRegistry,
    cache: BTreeMap<FactName, Resolution>,
    in_flight: Vec<FactName>,
}

impl<'a> Evaluation<'a> {
    fn new(registry: &'a FactRegistry) -> Self {
        Self {
            registry,
            cache: BTreeMap::new(),
            in_flight: Vec::new(),
        }
    }

    /// Resolve one fact, running its provider at most once per pass
    pub fn resolve(&mut self, name: FactName) -> Result<Resolution> {
        if let Some(cached) = self.cache.get(&name) {
            return Ok(cached.clone());
        }
        if self.in_flight.contains(&name) {
            return Err(Error::FactCycle(name.to_string()));
        }

        let registry = self.registry;
        let provider = registry
            .providers
            .get(&name)
            .ok_or_else(|| Error::UnknownFact(name.to_string()))?;

        self.in_flight.push(name);
        let result = provider.resolve(self);
        self.in_flight.pop();

        let resolution = result?;
        debug!("Resolved fact {} -> {:?}", name, resolution.render());
        self.cache.insert(name, resolution.clone());
        Ok(resolution)
    }

    /// Resolve every registered fact and snapshot the pass
    pub fn snapshot(mut self) -> Result<FactSnapshot> {
        for name in self.registry.names() {
            self.resolve(name)?;
        }
        Ok(FactSnapshot {
            evaluated_at: Utc::now(),
            facts: self.cache,
        })
    }
}
