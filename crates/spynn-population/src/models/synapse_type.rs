//! Exponentially decaying synaptic currents.

use super::decay_per_step;
use crate::parameters::{
    ComponentCost, NeuronParameter, ParameterAccess, ParameterValue, SynapseType,
};
use spynn_dataspec::DataType;

const NAMES: &[&str] = &["tau_syn_E", "tau_syn_I"];
const RECEPTORS: &[&str] = &["excitatory", "inhibitory"];

/// Excitatory and inhibitory receptors with exponential decay
#[derive(Debug, Clone)]
pub struct SynapseTypeExponential {
    tau_syn_e: ParameterValue,
    tau_syn_i: ParameterValue,
    machine_time_step_us: u32,
}

impl SynapseTypeExponential {
    /// Create with time constants in ms
    pub fn new(
        tau_syn_e: impl Into<ParameterValue>,
        tau_syn_i: impl Into<ParameterValue>,
        machine_time_step_us: u32,
    ) -> Self {
        Self {
            tau_syn_e: tau_syn_e.into(),
            tau_syn_i: tau_syn_i.into(),
            machine_time_step_us,
        }
    }

    /// Default 5 ms time constants
    pub fn with_defaults(machine_time_step_us: u32) -> Self {
        Self::new(5.0, 5.0, machine_time_step_us)
    }

    fn decay_and_init(&self, tau: &ParameterValue) -> [NeuronParameter; 2] {
        let dt = f64::from(self.machine_time_step_us) / 1000.0;
        let decay = tau.map(|t| decay_per_step(dt, t));
        let init = decay.map(|d| 1.0 - d);
        [
            NeuronParameter::new(decay, DataType::U032),
            NeuronParameter::new(init, DataType::U032),
        ]
    }
}

impl ComponentCost for SynapseTypeExponential {
    fn n_cpu_cycles_per_neuron(&self) -> u64 {
        100
    }

    fn dtcm_usage_per_neuron_in_bytes(&self) -> usize {
        4 * spynn_chip::BYTES_PER_WORD
    }
}

impl ParameterAccess for SynapseTypeExponential {
    fn parameter_names(&self) -> &'static [&'static str] {
        NAMES
    }

    fn get_parameter(&self, name: &str) -> Option<ParameterValue> {
        match name {
            "tau_syn_E" => Some(self.tau_syn_e.clone()),
            "tau_syn_I" => Some(self.tau_syn_i.clone()),
            _ => None,
        }
    }

    fn set_parameter(&mut self, name: &str, value: ParameterValue) -> bool {
        match name {
            "tau_syn_E" => self.tau_syn_e = value,
            "tau_syn_I" => self.tau_syn_i = value,
            _ => return false,
        }
        true
    }
}

impl SynapseType for SynapseTypeExponential {
    fn n_synapse_types(&self) -> usize {
        RECEPTORS.len()
    }

    fn synapse_type_name(&self, index: usize) -> Option<&'static str> {
        RECEPTORS.get(index).copied()
    }

    fn synapse_type_parameters(&self) -> Vec<NeuronParameter> {
        let mut params = Vec::with_capacity(4);
        params.extend(self.decay_and_init(&self.tau_syn_e));
        params.extend(self.decay_and_init(&self.tau_syn_i));
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decay_and_init_are_fractions() {
        let syn = SynapseTypeExponential::with_defaults(1000);
        let params = syn.synapse_type_parameters();
        assert_eq!(params.len(), 4);
        for p in &params {
            let v = p.value.value_for(0).unwrap_or(-1.0);
            assert!((0.0..1.0).contains(&v), "{v}");
            assert_eq!(p.data_type, DataType::U032);
        }
        assert_eq!(syn.sdram_usage_per_neuron_in_bytes(), 16);
    }

    #[test]
    fn receptor_names() {
        let syn = SynapseTypeExponential::with_defaults(1000);
        assert_eq!(syn.n_synapse_types(), 2);
        assert_eq!(syn.synapse_type_name(1), Some("inhibitory"));
        assert_eq!(syn.synapse_type_name(2), None);
    }
}
