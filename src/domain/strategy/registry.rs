//! Name-to-factory registry for strategies.

use std::collections::BTreeMap;

use super::{momentum, MomentumStrategy, Parameters, Strategy};
use crate::domain::error::SilkroadError;

pub type StrategyFactory =
    Box<dyn Fn(&Parameters) -> Result<Box<dyn Strategy>, SilkroadError> + Send + Sync>;

pub struct StrategyRegistry {
    factories: BTreeMap<String, StrategyFactory>,
}

impl StrategyRegistry {
    /// An empty registry with no strategies.
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&Parameters) -> Result<Box<dyn Strategy>, SilkroadError> + Send + Sync + 'static,
    {
        self.factories.insert(name.to_string(), Box::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    pub fn build(&self, name: &str, params: &Parameters) -> Result<Box<dyn Strategy>, SilkroadError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| SilkroadError::NotRegistered {
                kind: "Strategy",
                name: name.to_string(),
            })?;
        factory(params)
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(momentum::NAME, |params| {
            Ok(Box::new(MomentumStrategy::from_parameters(params)?))
        });
        registry
    }
}
