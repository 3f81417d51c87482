//! Current-based synaptic input.

use crate::parameters::{ComponentCost, InputType, NeuronParameter, ParameterAccess, ParameterValue};

/// Input type that adds synaptic current directly; it has no parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct InputTypeCurrent;

impl ComponentCost for InputTypeCurrent {
    fn n_cpu_cycles_per_neuron(&self) -> u64 {
        0
    }

    fn dtcm_usage_per_neuron_in_bytes(&self) -> usize {
        0
    }
}

impl ParameterAccess for InputTypeCurrent {
    fn parameter_names(&self) -> &'static [&'static str] {
        &[]
    }

    fn get_parameter(&self, _name: &str) -> Option<ParameterValue> {
        None
    }

    fn set_parameter(&mut self, _name: &str, _value: ParameterValue) -> bool {
        false
    }
}

impl InputType for InputTypeCurrent {
    fn input_type_parameters(&self) -> Vec<NeuronParameter> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contributes_nothing() {
        let input = InputTypeCurrent;
        assert!(input.input_type_parameters().is_empty());
        assert_eq!(input.sdram_usage_per_neuron_in_bytes(), 0);
        assert!((input.global_weight_scale() - 1.0).abs() < f64::EPSILON);
    }
}
