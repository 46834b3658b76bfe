//! Pre-trade risk gate.
//!
//! Every non-hold signal passes through [`RiskManager::validate`] before it
//! reaches an execution engine. A rejected signal is skipped, never resized.

use std::sync::Mutex;

use super::signal::{Side, Signal};

#[derive(Debug, Clone, PartialEq)]
pub struct RiskLimits {
    /// Largest signal size (fraction of equity) allowed through.
    pub max_position_fraction: f64,
    /// Peak-to-trough equity loss after which trading halts.
    pub max_drawdown: f64,
    /// Stop distance applied to open positions, as a fraction of entry price.
    pub stop_loss_pct: f64,
}

impl Default for RiskLimits {
    fn default() -> Self {
        RiskLimits {
            max_position_fraction: 0.1,
            max_drawdown: 0.2,
            stop_loss_pct: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RiskViolation {
    #[error("signal size {size} exceeds max position fraction {limit}")]
    PositionTooLarge { size: f64, limit: f64 },

    #[error("trading halted: drawdown {drawdown:.4} exceeded {limit}")]
    DrawdownHalt { drawdown: f64, limit: f64 },
}

#[derive(Debug, Default)]
struct EquityWatermark {
    peak: f64,
    halted_at: Option<f64>,
}

#[derive(Debug, Default)]
pub struct RiskManager {
    limits: RiskLimits,
    watermark: Mutex<EquityWatermark>,
}

impl RiskManager {
    pub fn new(limits: RiskLimits) -> Self {
        Self {
            limits,
            watermark: Mutex::new(EquityWatermark::default()),
        }
    }

    pub fn limits(&self) -> &RiskLimits {
        &self.limits
    }

    pub fn validate(&self, signal: &Signal) -> Result<(), RiskViolation> {
        if signal.side == Side::Hold {
            return Ok(());
        }
        if let Some(drawdown) = self.halted_drawdown() {
            return Err(RiskViolation::DrawdownHalt {
                drawdown,
                limit: self.limits.max_drawdown,
            });
        }
        if signal.size > self.limits.max_position_fraction {
            return Err(RiskViolation::PositionTooLarge {
                size: signal.size,
                limit: self.limits.max_position_fraction,
            });
        }
        Ok(())
    }

    /// Record a mark-to-market equity value. Returns `true` when this
    /// observation tripped the drawdown halt.
    pub fn observe_equity(&self, equity: f64) -> bool {
        let mut wm = match self.watermark.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if equity > wm.peak {
            wm.peak = equity;
        }
        if wm.halted_at.is_some() || wm.peak <= 0.0 {
            return false;
        }
        let drawdown = (wm.peak - equity) / wm.peak;
        if drawdown > self.limits.max_drawdown {
            wm.halted_at = Some(drawdown);
            tracing::warn!(
                drawdown,
                limit = self.limits.max_drawdown,
                "drawdown limit breached, halting new trades"
            );
            return true;
        }
        false
    }

    pub fn is_halted(&self) -> bool {
        self.halted_drawdown().is_some()
    }

    fn halted_drawdown(&self) -> Option<f64> {
        match self.watermark.lock() {
            Ok(guard) => guard.halted_at,
            Err(poisoned) => poisoned.into_inner().halted_at,
        }
    }
}
