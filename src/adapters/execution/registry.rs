//! Name-to-factory registry for execution engines.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::alpaca::{self, AlpacaClient, AlpacaParameters};
use super::broker::BrokerExecutionEngine;
use super::paper::{self, PaperTradingEngine};
use crate::domain::error::SilkroadError;
use crate::domain::strategy::Parameters;
use crate::ports::analytics_port::AnalyticsSink;
use crate::ports::execution_port::ExecutionEngine;
use crate::ports::notifier_port::Notifier;

/// Shared collaborators handed to every engine factory.
#[derive(Clone)]
pub struct ExecutionContext {
    pub symbol: String,
    pub notifier: Arc<dyn Notifier>,
    pub analytics: Option<Arc<dyn AnalyticsSink>>,
}

pub type ExecutionFactory = Box<
    dyn Fn(&Parameters, &ExecutionContext) -> Result<Box<dyn ExecutionEngine>, SilkroadError>
        + Send
        + Sync,
>;

pub struct ExecutionRegistry {
    factories: BTreeMap<String, ExecutionFactory>,
}

impl ExecutionRegistry {
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&Parameters, &ExecutionContext) -> Result<Box<dyn ExecutionEngine>, SilkroadError>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(name.to_string(), Box::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    pub fn build(
        &self,
        name: &str,
        params: &Parameters,
        context: &ExecutionContext,
    ) -> Result<Box<dyn ExecutionEngine>, SilkroadError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| SilkroadError::NotRegistered {
                kind: "Execution engine",
                name: name.to_string(),
            })?;
        factory(params, context)
    }
}

impl Default for ExecutionRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(paper::NAME, |_, ctx| {
            Ok(Box::new(PaperTradingEngine::new(
                &ctx.symbol,
                ctx.notifier.clone(),
                ctx.analytics.clone(),
            )))
        });
        registry.register(alpaca::NAME, |params, ctx| {
            let params = AlpacaParameters::from_parameters(params)?;
            let client = AlpacaClient::new(&params)?;
            Ok(Box::new(BrokerExecutionEngine::new(
                client,
                &ctx.symbol,
                params.sizing(),
                ctx.notifier.clone(),
                ctx.analytics.clone(),
            )))
        });
        registry
    }
}
