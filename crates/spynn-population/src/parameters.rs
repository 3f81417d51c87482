//! Neuron parameters and the component traits that supply them.
//!
//! A population is assembled from four components: a neuron model, an
//! input type, a threshold type and a synapse type. Each contributes
//! per-neuron parameters (serialized neuron-major), per-neuron costs, and
//! named parameters the user can read and change.

use spynn_dataspec::DataType;
use std::fmt::Debug;

/// A parameter value: one value for every neuron, or one per neuron
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    /// Same value for all neurons
    Scalar(f64),
    /// One value per neuron of the population
    PerNeuron(Vec<f64>),
}

impl ParameterValue {
    /// Value for population atom `atom`, `None` when a per-neuron list is too short
    pub fn value_for(&self, atom: usize) -> Option<f64> {
        match self {
            Self::Scalar(v) => Some(*v),
            Self::PerNeuron(values) => values.get(atom).copied(),
        }
    }

    /// Number of explicit values (1 for a scalar)
    pub fn len(&self) -> usize {
        match self {
            Self::Scalar(_) => 1,
            Self::PerNeuron(values) => values.len(),
        }
    }

    /// True for an empty per-neuron list
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::PerNeuron(values) if values.is_empty())
    }

    /// True when the value can describe `n_atoms` neurons
    pub fn fits(&self, n_atoms: usize) -> bool {
        match self {
            Self::Scalar(_) => true,
            Self::PerNeuron(values) => values.len() == n_atoms,
        }
    }

    /// Apply `f` to every value
    #[must_use]
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        match self {
            Self::Scalar(v) => Self::Scalar(f(*v)),
            Self::PerNeuron(values) => Self::PerNeuron(values.iter().map(|&v| f(v)).collect()),
        }
    }

    /// Combine with `other` value by value, broadcasting scalars
    #[must_use]
    pub fn zip_with(&self, other: &Self, f: impl Fn(f64, f64) -> f64) -> Self {
        match (self, other) {
            (Self::Scalar(a), Self::Scalar(b)) => Self::Scalar(f(*a, *b)),
            (Self::Scalar(a), Self::PerNeuron(bs)) => {
                Self::PerNeuron(bs.iter().map(|&b| f(*a, b)).collect())
            }
            (Self::PerNeuron(as_), Self::Scalar(b)) => {
                Self::PerNeuron(as_.iter().map(|&a| f(a, *b)).collect())
            }
            (Self::PerNeuron(as_), Self::PerNeuron(bs)) => {
                Self::PerNeuron(as_.iter().zip(bs).map(|(&a, &b)| f(a, b)).collect())
            }
        }
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<f64>> for ParameterValue {
    fn from(values: Vec<f64>) -> Self {
        Self::PerNeuron(values)
    }
}

/// A value tagged with its serialized representation
#[derive(Debug, Clone, PartialEq)]
pub struct NeuronParameter {
    /// Value(s)
    pub value: ParameterValue,
    /// Binary representation
    pub data_type: DataType,
}

impl NeuronParameter {
    /// Create a parameter
    pub fn new(value: impl Into<ParameterValue>, data_type: DataType) -> Self {
        Self {
            value: value.into(),
            data_type,
        }
    }
}

/// Bytes one neuron's worth of `parameters` occupies
pub fn parameter_bytes(parameters: &[NeuronParameter]) -> usize {
    parameters.iter().map(|p| p.data_type.size()).sum()
}

/// Named parameters a component exposes for reading and writing
pub trait ParameterAccess {
    /// Names this component answers to
    fn parameter_names(&self) -> &'static [&'static str];

    /// Current value of `name`
    fn get_parameter(&self, name: &str) -> Option<ParameterValue>;

    /// Replace `name`; returns false when the component has no such parameter
    fn set_parameter(&mut self, name: &str, value: ParameterValue) -> bool;
}

/// Per-neuron processing costs of a component
pub trait ComponentCost {
    /// CPU cycles per neuron per tick
    fn n_cpu_cycles_per_neuron(&self) -> u64;

    /// DTCM bytes per neuron
    fn dtcm_usage_per_neuron_in_bytes(&self) -> usize;
}

/// Neuron dynamics component
pub trait NeuronModel: ComponentCost + ParameterAccess + Debug + Send + Sync {
    /// Parameters shared by every neuron, written once
    fn global_parameters(&self) -> Vec<NeuronParameter> {
        Vec::new()
    }

    /// Per-neuron parameters in firmware struct order
    fn neural_parameters(&self) -> Vec<NeuronParameter>;

    /// SDRAM bytes for the neuron model's share of the parameter region
    fn sdram_usage_in_bytes(&self, n_atoms: usize) -> usize {
        parameter_bytes(&self.global_parameters())
            + n_atoms * parameter_bytes(&self.neural_parameters())
    }

    /// State variables [`initialize`](Self::initialize) accepts
    fn state_variables(&self) -> &'static [&'static str] {
        &[]
    }

    /// Set the initial value of a state variable; false when unsupported
    fn initialize(&mut self, variable: &str, value: ParameterValue) -> bool {
        let _ = (variable, value);
        false
    }
}

/// Synaptic input conversion component
pub trait InputType: ComponentCost + ParameterAccess + Debug + Send + Sync {
    /// Per-neuron parameters in firmware struct order
    fn input_type_parameters(&self) -> Vec<NeuronParameter>;

    /// SDRAM bytes per neuron
    fn sdram_usage_per_neuron_in_bytes(&self) -> usize {
        parameter_bytes(&self.input_type_parameters())
    }

    /// Scale applied to weights before they reach the ring buffers
    fn global_weight_scale(&self) -> f64 {
        1.0
    }
}

/// Firing threshold component
pub trait ThresholdType: ComponentCost + ParameterAccess + Debug + Send + Sync {
    /// Per-neuron parameters in firmware struct order
    fn threshold_parameters(&self) -> Vec<NeuronParameter>;

    /// SDRAM bytes per neuron
    fn sdram_usage_per_neuron_in_bytes(&self) -> usize {
        parameter_bytes(&self.threshold_parameters())
    }
}

/// Synaptic shaping component
pub trait SynapseType: ComponentCost + ParameterAccess + Debug + Send + Sync {
    /// Number of receptor types (e.g. excitatory and inhibitory)
    fn n_synapse_types(&self) -> usize;

    /// Name of receptor `index`
    fn synapse_type_name(&self, index: usize) -> Option<&'static str>;

    /// Per-neuron parameters in firmware struct order
    fn synapse_type_parameters(&self) -> Vec<NeuronParameter>;

    /// SDRAM bytes per neuron
    fn sdram_usage_per_neuron_in_bytes(&self) -> usize {
        parameter_bytes(&self.synapse_type_parameters())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_broadcast() {
        let v = ParameterValue::Scalar(-65.0);
        assert_eq!(v.value_for(123), Some(-65.0));
        assert!(v.fits(1000));
    }

    #[test]
    fn per_neuron_values_are_bounded() {
        let v = ParameterValue::from(vec![1.0, 2.0]);
        assert_eq!(v.value_for(1), Some(2.0));
        assert_eq!(v.value_for(2), None);
        assert!(v.fits(2));
        assert!(!v.fits(3));
    }

    #[test]
    fn zip_broadcasts_scalar_side() {
        let tau = ParameterValue::from(vec![10.0, 20.0]);
        let cm = ParameterValue::Scalar(2.0);
        assert_eq!(
            tau.zip_with(&cm, |t, c| t / c),
            ParameterValue::PerNeuron(vec![5.0, 10.0])
        );
    }

    #[test]
    fn byte_count_follows_data_types() {
        let params = [
            NeuronParameter::new(1.0, DataType::S1615),
            NeuronParameter::new(1.0, DataType::Uint16),
        ];
        assert_eq!(parameter_bytes(&params), 6);
    }
}
