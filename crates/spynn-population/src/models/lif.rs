//! Leaky integrate-and-fire membrane.

use super::decay_per_step;
use crate::parameters::{
    ComponentCost, NeuronModel, NeuronParameter, ParameterAccess, ParameterValue,
};
use spynn_dataspec::DataType;

/// Firmware cycles per neuron per tick
const LIF_CPU_CYCLES_PER_NEURON: u64 = 80;
/// Words in the firmware's per-neuron struct
const LIF_PARAMETER_WORDS: usize = 8;

const NAMES: &[&str] = &[
    "v_init",
    "v_rest",
    "tau_m",
    "cm",
    "i_offset",
    "v_reset",
    "tau_refrac",
];

/// User-facing LIF parameters (mV, ms, nF, nA)
#[derive(Debug, Clone, PartialEq)]
pub struct LifParameters {
    /// Initial membrane voltage
    pub v_init: ParameterValue,
    /// Resting voltage
    pub v_rest: ParameterValue,
    /// Membrane time constant
    pub tau_m: ParameterValue,
    /// Membrane capacitance
    pub cm: ParameterValue,
    /// Constant injected current
    pub i_offset: ParameterValue,
    /// Voltage after a spike
    pub v_reset: ParameterValue,
    /// Refractory period
    pub tau_refrac: ParameterValue,
}

impl Default for LifParameters {
    fn default() -> Self {
        Self {
            v_init: ParameterValue::Scalar(-65.0),
            v_rest: ParameterValue::Scalar(-65.0),
            tau_m: ParameterValue::Scalar(20.0),
            cm: ParameterValue::Scalar(1.0),
            i_offset: ParameterValue::Scalar(0.0),
            v_reset: ParameterValue::Scalar(-65.0),
            tau_refrac: ParameterValue::Scalar(0.1),
        }
    }
}

/// LIF neuron model bound to a machine time step
#[derive(Debug, Clone)]
pub struct NeuronModelLeakyIntegrateAndFire {
    params: LifParameters,
    machine_time_step_us: u32,
}

impl NeuronModelLeakyIntegrateAndFire {
    /// Create the model
    pub fn new(params: LifParameters, machine_time_step_us: u32) -> Self {
        Self {
            params,
            machine_time_step_us,
        }
    }

    /// Current parameters
    pub fn params(&self) -> &LifParameters {
        &self.params
    }

    fn time_step_ms(&self) -> f64 {
        f64::from(self.machine_time_step_us) / 1000.0
    }

    fn field(&self, name: &str) -> Option<&ParameterValue> {
        let p = &self.params;
        Some(match name {
            "v_init" => &p.v_init,
            "v_rest" => &p.v_rest,
            "tau_m" => &p.tau_m,
            "cm" => &p.cm,
            "i_offset" => &p.i_offset,
            "v_reset" => &p.v_reset,
            "tau_refrac" => &p.tau_refrac,
            _ => return None,
        })
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut ParameterValue> {
        let p = &mut self.params;
        Some(match name {
            "v_init" => &mut p.v_init,
            "v_rest" => &mut p.v_rest,
            "tau_m" => &mut p.tau_m,
            "cm" => &mut p.cm,
            "i_offset" => &mut p.i_offset,
            "v_reset" => &mut p.v_reset,
            "tau_refrac" => &mut p.tau_refrac,
            _ => return None,
        })
    }
}

impl ComponentCost for NeuronModelLeakyIntegrateAndFire {
    fn n_cpu_cycles_per_neuron(&self) -> u64 {
        LIF_CPU_CYCLES_PER_NEURON
    }

    fn dtcm_usage_per_neuron_in_bytes(&self) -> usize {
        LIF_PARAMETER_WORDS * spynn_chip::BYTES_PER_WORD
    }
}

impl ParameterAccess for NeuronModelLeakyIntegrateAndFire {
    fn parameter_names(&self) -> &'static [&'static str] {
        NAMES
    }

    fn get_parameter(&self, name: &str) -> Option<ParameterValue> {
        self.field(name).cloned()
    }

    fn set_parameter(&mut self, name: &str, value: ParameterValue) -> bool {
        match self.field_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

impl NeuronModel for NeuronModelLeakyIntegrateAndFire {
    fn neural_parameters(&self) -> Vec<NeuronParameter> {
        let dt = self.time_step_ms();
        let p = &self.params;
        let r_membrane = p.tau_m.zip_with(&p.cm, |tau, cm| if cm == 0.0 { 0.0 } else { tau / cm });
        let exp_tc = p.tau_m.map(|tau| decay_per_step(dt, tau));
        let t_refract = p.tau_refrac.map(|tau| (tau / dt).round());

        vec![
            NeuronParameter::new(p.v_init.clone(), DataType::S1615),
            NeuronParameter::new(p.v_rest.clone(), DataType::S1615),
            NeuronParameter::new(r_membrane, DataType::S1615),
            NeuronParameter::new(exp_tc, DataType::S1615),
            NeuronParameter::new(p.i_offset.clone(), DataType::S1615),
            // refractory countdown starts idle
            NeuronParameter::new(0.0, DataType::Int32),
            NeuronParameter::new(p.v_reset.clone(), DataType::S1615),
            NeuronParameter::new(t_refract, DataType::Int32),
        ]
    }

    fn state_variables(&self) -> &'static [&'static str] {
        &["v"]
    }

    fn initialize(&mut self, variable: &str, value: ParameterValue) -> bool {
        if variable == "v" {
            self.params.v_init = value;
            true
        } else {
            false
        }
    }
}
