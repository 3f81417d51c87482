//! Concrete neuron model components.
//!
//! | Component | Role | Per-neuron words |
//! |-----------|------|------------------|
//! | [`NeuronModelLeakyIntegrateAndFire`] | membrane dynamics | 8 |
//! | [`InputTypeCurrent`] | current-based input | 0 |
//! | [`ThresholdTypeStatic`] | fixed threshold | 1 |
//! | [`SynapseTypeExponential`] | exponential PSC shaping | 4 |

mod input;
mod lif;
mod synapse_type;
mod threshold;

pub use input::InputTypeCurrent;
pub use lif::{LifParameters, NeuronModelLeakyIntegrateAndFire};
pub use synapse_type::SynapseTypeExponential;
pub use threshold::ThresholdTypeStatic;

/// Exponential decay over one time step, `exp(-dt / tau)`
pub(crate) fn decay_per_step(time_step_ms: f64, tau_ms: f64) -> f64 {
    if tau_ms <= 0.0 {
        0.0
    } else {
        (-time_step_ms / tau_ms).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decay_is_between_zero_and_one() {
        let d = decay_per_step(1.0, 20.0);
        assert!(d > 0.95 && d < 1.0);
        assert_eq!(decay_per_step(1.0, 0.0), 0.0);
    }
}
