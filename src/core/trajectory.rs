//! Trajectory Forecaster
//!
//! Damped linear extrapolation: p_k = p_{k-1} + v * d^k, where v is the
//! least-squares slope over the trailing window and d the damping of the
//! primary hypothesis. An ordered cascade at stage 2 or deeper is treated as
//! progressive and extrapolates undamped.

use crate::config::ForecastPolicy;
use crate::types::{AlertLevel, CascadeState, DifferentialResult, ReasonCode, Trajectory};
use crate::{FORECAST_CLAMP, FORECAST_FLAT_CONFIDENCE};

/// Ceiling on forecast confidence
const MAX_CONFIDENCE: f64 = 0.9;

#[derive(Debug, Clone, Default)]
pub struct TrajectoryForecaster {
    policy: ForecastPolicy,
}

impl TrajectoryForecaster {
    pub fn new(policy: ForecastPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ForecastPolicy {
        &self.policy
    }

    /// Project `history` (oldest first, newest included) forward
    pub fn forecast(
        &self,
        history: &[f64],
        differential: &DifferentialResult,
        cascade: &CascadeState,
    ) -> Trajectory {
        let n = history.len();
        let last = history.last().copied().unwrap_or(0.0);

        if n < self.policy.min_points {
            return Trajectory {
                predictions: vec![last; self.policy.horizon],
                predicted_alert_at_horizon: AlertLevel::from_composite(last),
                velocity: 0.0,
                acceleration: None,
                damping: 0.0,
                model: "flat_insufficient_history".to_string(),
                confidence: FORECAST_FLAT_CONFIDENCE,
                reason: Some(ReasonCode::R204_SHORT_HISTORY),
            };
        }

        let window = self.policy.window.min(n);
        let (velocity, r2) = fit(&history[n - window..]);
        let acceleration = if n > self.policy.window {
            let (prev, _) = fit(&history[n - window - 1..n - 1]);
            Some(velocity - prev)
        } else {
            None
        };

        let primary = differential.primary_hypothesis;
        let progressive = cascade.depth() >= 2 && cascade.order_preserved();
        let damping = if progressive {
            1.0
        } else {
            self.policy.damping_for(primary)
        };

        let mut predictions = Vec::with_capacity(self.policy.horizon);
        let mut p = last;
        let mut factor = 1.0;
        for _ in 0..self.policy.horizon {
            factor *= damping;
            p = (p + velocity * factor).clamp(-FORECAST_CLAMP, FORECAST_CLAMP);
            predictions.push(p);
        }
        let horizon_value = predictions.last().copied().unwrap_or(last);

        let length_factor = (n as f64 / (2 * self.policy.window) as f64).min(1.0);
        let confidence = FORECAST_FLAT_CONFIDENCE
            + (MAX_CONFIDENCE - FORECAST_FLAT_CONFIDENCE) * r2 * length_factor;

        Trajectory {
            predictions,
            predicted_alert_at_horizon: AlertLevel::from_composite(horizon_value),
            velocity,
            acceleration,
            damping,
            model: format!("damped_linear:{}", primary.name()),
            confidence,
            reason: None,
        }
    }
}

/// Least-squares slope against 0..n and the fit's R² (1.0 for a flat series)
fn fit(ys: &[f64]) -> (f64, f64) {
    let n = ys.len() as f64;
    if ys.len() < 2 {
        return (0.0, 0.0);
    }
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = ys.iter().sum::<f64>() / n;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (i, y) in ys.iter().enumerate() {
        let dx = i as f64 - x_mean;
        let dy = y - y_mean;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    let slope = sxy / sxx;
    let r2 = if syy == 0.0 {
        1.0
    } else {
        ((sxy * sxy) / (sxx * syy)).clamp(0.0, 1.0)
    };
    (slope, r2)
}

// =============================================================================
// TESTS
// =============================================================================
