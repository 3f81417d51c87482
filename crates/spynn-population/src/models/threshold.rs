//! Static firing threshold.

use crate::parameters::{
    ComponentCost, NeuronParameter, ParameterAccess, ParameterValue, ThresholdType,
};
use spynn_dataspec::DataType;

/// A comparison against a fixed voltage
#[derive(Debug, Clone)]
pub struct ThresholdTypeStatic {
    v_thresh: ParameterValue,
}

impl ThresholdTypeStatic {
    /// Create a threshold at `v_thresh` mV
    pub fn new(v_thresh: impl Into<ParameterValue>) -> Self {
        Self {
            v_thresh: v_thresh.into(),
        }
    }
}

impl Default for ThresholdTypeStatic {
    fn default() -> Self {
        Self::new(-50.0)
    }
}

impl ComponentCost for ThresholdTypeStatic {
    fn n_cpu_cycles_per_neuron(&self) -> u64 {
        2
    }

    fn dtcm_usage_per_neuron_in_bytes(&self) -> usize {
        spynn_chip::BYTES_PER_WORD
    }
}

impl ParameterAccess for ThresholdTypeStatic {
    fn parameter_names(&self) -> &'static [&'static str] {
        &["v_thresh"]
    }

    fn get_parameter(&self, name: &str) -> Option<ParameterValue> {
        (name == "v_thresh").then(|| self.v_thresh.clone())
    }

    fn set_parameter(&mut self, name: &str, value: ParameterValue) -> bool {
        if name == "v_thresh" {
            self.v_thresh = value;
            true
        } else {
            false
        }
    }
}

impl ThresholdType for ThresholdTypeStatic {
    fn threshold_parameters(&self) -> Vec<NeuronParameter> {
        vec![NeuronParameter::new(self.v_thresh.clone(), DataType::S1615)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_word_threshold() {
        let mut t = ThresholdTypeStatic::default();
        assert_eq!(t.sdram_usage_per_neuron_in_bytes(), 4);
        assert!(t.set_parameter("v_thresh", ParameterValue::Scalar(-55.0)));
        assert_eq!(
            t.threshold_parameters()[0].value,
            ParameterValue::Scalar(-55.0)
        );
    }
}
