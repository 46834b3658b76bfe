//! Execution engine port.

use crate::domain::error::SilkroadError;
use crate::domain::signal::Signal;

/// Routes approved signals to a venue. Risk checks happen before `execute`.
pub trait ExecutionEngine: Send {
    fn name(&self) -> &str;

    /// `price` is the reference price for the signal, when known.
    fn execute(&mut self, signal: &Signal, price: Option<f64>) -> Result<(), SilkroadError>;

    fn shutdown(&mut self) -> Result<(), SilkroadError> {
        Ok(())
    }
}
