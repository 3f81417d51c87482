//! Population vertex
//!
//! The composition root for one population: it owns the model components,
//! the three recorders and the synapse manager, estimates resources per
//! slice, and writes each core's data specification.
//!
//! ## Regions written per core
//!
//! ```text
//! 0 System          magic, timer period, ticks, recording flags,
//!                   3 × region size, 3 × sampling interval
//! 1 NeuronParams    key flag, key, n_neurons, globals,
//!                   neuron block, input block, threshold block (each neuron-major)
//! 2 SynapseParams   } see synapses
//! 3 PopulationTable }
//! 4 SynapticMatrix  }
//! 6..8 recordings   reserved empty when recording
//! 9 Provenance      reserved empty
//! ```

use crate::capabilities::{
    ConductanceRecordable, PopulationInitializable, PopulationSettable, ProvidesProvenance,
    ReceivesBuffersToHost, SpikeRecordable, VoltageRecordable,
};
use crate::config::SimulationConfig;
use crate::error::{PopulationError, Result};
use crate::models::{
    InputTypeCurrent, LifParameters, NeuronModelLeakyIntegrateAndFire, SynapseTypeExponential,
    ThresholdTypeStatic,
};
use crate::parameters::{
    InputType, NeuronModel, NeuronParameter, ParameterValue, SynapseType, ThresholdType,
};
use crate::provenance::{read_population_provenance, ProvenanceDataItem, ProvenanceSource};
use crate::reader::MemoryReader;
use crate::recording::{
    AnalogRecording, Conductance, Recorder, SignalKind, SpikeRecording, Spikes, Voltage,
};
use crate::resources::{self, CostTable, ModelCosts, RecordingCost, ResourceContainer};
use crate::slice::{CoreLocation, Placement, VertexSlice};
use crate::synapses::{IncomingProjection, SynapseManager};
use rayon::prelude::*;
use spynn_chip::provenance::{N_BASIC_PROVENANCE_WORDS, N_POPULATION_PROVENANCE_WORDS};
use spynn_chip::system::{POPULATION_SYSTEM_REGION_BYTES, RECORDING_MAGIC};
use spynn_chip::{PopulationRegion, BYTES_PER_WORD};
use spynn_dataspec::{DataSpecification, DataSpecificationGenerator, DataType};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info};

/// The four model components of a population
#[derive(Debug)]
pub struct PopulationComponents {
    /// Membrane dynamics
    pub neuron_model: Box<dyn NeuronModel>,
    /// Synaptic input conversion
    pub input_type: Box<dyn InputType>,
    /// Firing threshold
    pub threshold_type: Box<dyn ThresholdType>,
    /// Synaptic shaping
    pub synapse_type: Box<dyn SynapseType>,
}

impl PopulationComponents {
    /// Current-based LIF neurons with exponential synapses
    pub fn lif_curr_exp(
        params: LifParameters,
        v_thresh: impl Into<ParameterValue>,
        tau_syn_e: impl Into<ParameterValue>,
        tau_syn_i: impl Into<ParameterValue>,
        machine_time_step_us: u32,
    ) -> Self {
        Self {
            neuron_model: Box::new(NeuronModelLeakyIntegrateAndFire::new(params, machine_time_step_us)),
            input_type: Box::new(InputTypeCurrent),
            threshold_type: Box::new(ThresholdTypeStatic::new(v_thresh)),
            synapse_type: Box::new(SynapseTypeExponential::new(tau_syn_e, tau_syn_i, machine_time_step_us)),
        }
    }
}

/// Component owning a named parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Component {
    NeuronModel,
    InputType,
    ThresholdType,
    SynapseType,
}

/// A population of neurons split over one or more cores
#[derive(Debug)]
pub struct PopulationVertex {
    label: String,
    model_name: String,
    binary: String,
    n_atoms: usize,
    config: SimulationConfig,
    costs: CostTable,
    neuron_model: Box<dyn NeuronModel>,
    input_type: Box<dyn InputType>,
    threshold_type: Box<dyn ThresholdType>,
    synapse_manager: SynapseManager,
    spike_recorder: Recorder<Spikes>,
    v_recorder: Recorder<Voltage>,
    gsyn_recorder: Recorder<Conductance>,
    parameter_owners: HashMap<&'static str, Component>,
}

impl PopulationVertex {
    /// Create a vertex of `n_atoms` neurons
    ///
    /// # Errors
    ///
    /// Returns `ParameterShape` when a per-neuron parameter list does not
    /// have `n_atoms` entries.
    pub fn new(
        label: impl Into<String>,
        n_atoms: usize,
        model_name: impl Into<String>,
        components: PopulationComponents,
        config: SimulationConfig,
    ) -> Result<Self> {
        let model_name = model_name.into();
        let PopulationComponents {
            neuron_model,
            input_type,
            threshold_type,
            synapse_type,
        } = components;

        let mut parameter_owners = HashMap::new();
        let owners = [
            (neuron_model.parameter_names(), Component::NeuronModel),
            (input_type.parameter_names(), Component::InputType),
            (threshold_type.parameter_names(), Component::ThresholdType),
            (synapse_type.parameter_names(), Component::SynapseType),
        ];
        for (names, component) in owners {
            for &name in names {
                // earlier components win a name clash
                parameter_owners.entry(name).or_insert(component);
            }
        }

        let vertex = Self {
            label: label.into(),
            binary: format!("{model_name}.aplx"),
            model_name,
            n_atoms,
            config,
            costs: CostTable::default(),
            neuron_model,
            input_type,
            threshold_type,
            synapse_manager: SynapseManager::new(synapse_type),
            spike_recorder: Recorder::new(),
            v_recorder: Recorder::new(),
            gsyn_recorder: Recorder::new(),
            parameter_owners,
        };
        for &name in vertex.parameter_owners.keys() {
            if let Some(value) = vertex.lookup(name) {
                vertex.check_shape(name, &value)?;
            }
        }
        debug!("Created {}", vertex);
        Ok(vertex)
    }

    /// Current-based LIF population with default parameters
    ///
    /// # Errors
    ///
    /// As [`new`](Self::new).
    pub fn lif_curr_exp(
        label: impl Into<String>,
        n_atoms: usize,
        config: SimulationConfig,
    ) -> Result<Self> {
        let components = PopulationComponents::lif_curr_exp(
            LifParameters::default(),
            -50.0,
            5.0,
            5.0,
            config.machine_time_step_us,
        );
        Self::new(label, n_atoms, "IF_curr_exp", components, config)
    }

    /// Replace the cost table
    #[must_use]
    pub fn with_cost_table(mut self, costs: CostTable) -> Self {
        self.costs = costs;
        self
    }

    /// Replace the executable name
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Set the ring-buffer tuning of the synapse manager
    #[must_use]
    pub fn with_ring_buffer_tuning(mut self, spikes_per_second: f64, ring_buffer_sigma: f64) -> Self {
        self.synapse_manager = self
            .synapse_manager
            .with_ring_buffer_tuning(spikes_per_second, ring_buffer_sigma);
        self
    }

    /// Set the executable suffix of the synapse manager
    #[must_use]
    pub fn with_executable_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.synapse_manager = self.synapse_manager.with_executable_suffix(suffix);
        self
    }

    /// Population label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Model name
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Number of neurons
    pub fn n_atoms(&self) -> usize {
        self.n_atoms
    }

    /// Timing configuration
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Cost table
    pub fn cost_table(&self) -> &CostTable {
        &self.costs
    }

    /// Extend the run by `run_time_ms` without extracting recordings
    ///
    /// Recording regions are sized for the total, so this must happen
    /// before the data specifications are generated.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTiming` when the total run no longer fits the tick
    /// counter; the run length is unchanged in that case.
    pub fn extend_run_ms(&mut self, run_time_ms: f64) -> Result<()> {
        self.config = self.config.clone().extend_run_ms(run_time_ms)?;
        info!(
            "{} now runs for {} ticks",
            self.label, self.config.n_machine_time_steps
        );
        Ok(())
    }

    /// Add a projection arriving at this population
    pub fn add_incoming_projection(&mut self, projection: IncomingProjection) {
        self.synapse_manager.add_projection(projection);
    }

    /// Synapse manager
    pub fn synapse_manager(&self) -> &SynapseManager {
        &self.synapse_manager
    }

    /// Scale applied to incoming weights
    pub fn weight_scale(&self) -> f64 {
        self.input_type.global_weight_scale()
    }

    /// Executable name with the synapse manager's suffix before the extension
    pub fn binary_file_name(&self) -> String {
        let suffix = self.synapse_manager.executable_suffix();
        match self.binary.rfind('.') {
            Some(dot) if dot > 0 => {
                format!("{}{}{}", &self.binary[..dot], suffix, &self.binary[dot..])
            }
            _ => format!("{}{}", self.binary, suffix),
        }
    }

    fn n_timesteps(&self) -> usize {
        self.config.n_machine_time_steps as usize
    }

    fn lookup(&self, name: &str) -> Option<ParameterValue> {
        match self.parameter_owners.get(name)? {
            Component::NeuronModel => self.neuron_model.get_parameter(name),
            Component::InputType => self.input_type.get_parameter(name),
            Component::ThresholdType => self.threshold_type.get_parameter(name),
            Component::SynapseType => self.synapse_manager.synapse_type().get_parameter(name),
        }
    }

    fn check_shape(&self, name: &str, value: &ParameterValue) -> Result<()> {
        if value.fits(self.n_atoms) {
            Ok(())
        } else {
            Err(PopulationError::ParameterShape {
                population: self.label.clone(),
                parameter: name.to_string(),
                got: value.len(),
                expected: self.n_atoms,
            })
        }
    }

    fn unknown(&self, name: &str) -> PopulationError {
        PopulationError::UnknownParameter {
            population: self.label.clone(),
            parameter: name.to_string(),
        }
    }

    /// Per-neuron costs summed over neuron, input and threshold
    pub fn model_costs(&self) -> ModelCosts {
        let global = self.neuron_model.sdram_usage_in_bytes(0);
        let neuron_per_neuron = self.neuron_model.sdram_usage_in_bytes(1) - global;
        ModelCosts {
            cpu_cycles_per_neuron: self.neuron_model.n_cpu_cycles_per_neuron()
                + self.input_type.n_cpu_cycles_per_neuron()
                + self.threshold_type.n_cpu_cycles_per_neuron(),
            dtcm_bytes_per_neuron: self.neuron_model.dtcm_usage_per_neuron_in_bytes()
                + self.input_type.dtcm_usage_per_neuron_in_bytes()
                + self.threshold_type.dtcm_usage_per_neuron_in_bytes(),
            global_param_bytes: global,
            param_bytes_per_neuron: neuron_per_neuron
                + self.input_type.sdram_usage_per_neuron_in_bytes()
                + self.threshold_type.sdram_usage_per_neuron_in_bytes(),
        }
    }

    fn recorders(&self) -> [&dyn RecordingCost; 3] {
        [&self.spike_recorder, &self.v_recorder, &self.gsyn_recorder]
    }

    /// CPU, DTCM and SDRAM needed by the core holding `slice`
    pub fn resources_required(&self, slice: &VertexSlice) -> ResourceContainer {
        let n = slice.n_atoms();
        resources::estimate(
            &self.costs,
            &self.model_costs(),
            &self.recorders(),
            &self.synapse_manager.costs(&self.costs, n),
            n,
            self.n_timesteps(),
        )
    }

    /// True when the core holding `slice` fits the per-core limits
    pub fn fits_on_core(&self, slice: &VertexSlice) -> bool {
        let needed = self.resources_required(slice);
        self.config
            .timer_period_us()
            .is_ok_and(|period| needed.fits(&self.costs.limits(period)))
    }

    /// Write the data specification of the core at `placement`
    ///
    /// `routing_key` is the key the core sends spikes with, if it has
    /// outgoing connections. Any error abandons the whole specification.
    ///
    /// # Errors
    ///
    /// Returns a data specification error (overflow, value out of range)
    /// or `ParameterShape` for a per-neuron list that does not cover the
    /// slice.
    pub fn generate_data_spec(
        &self,
        placement: &Placement,
        routing_key: Option<u32>,
    ) -> Result<DataSpecification> {
        let slice = &placement.slice;
        let n_steps = self.n_timesteps();
        let sizes = [
            self.spike_recorder.sdram_usage_bytes(slice.n_atoms(), n_steps),
            self.v_recorder.sdram_usage_bytes(slice.n_atoms(), n_steps),
            self.gsyn_recorder.sdram_usage_bytes(slice.n_atoms(), n_steps),
        ];

        let mut spec = DataSpecificationGenerator::new();
        spec.comment(format!("\n*** Spec for block of {} neurons ***\n", self.model_name));
        self.reserve_regions(&mut spec, slice, sizes)?;
        self.write_setup_info(&mut spec, sizes)?;
        self.write_neuron_parameters(&mut spec, slice, routing_key)?;
        self.synapse_manager.write_data_spec(
            &mut spec,
            &self.costs,
            &self.label,
            slice,
            self.weight_scale(),
            self.config.time_step_ms(),
        )?;
        let spec = spec.end_specification()?;

        info!(
            "Data spec for {} {} on {}: {} bytes reserved",
            self.label,
            slice,
            placement.location,
            spec.total_reserved_bytes()
        );
        Ok(spec)
    }

    /// Write every core's specification in parallel, then register the placements
    ///
    /// The placements replace any registered by an earlier call, so a
    /// re-partitioned population extracts from its new cores only.
    ///
    /// # Errors
    ///
    /// Returns the first error any core produced; the registered
    /// placements are left unchanged in that case.
    pub fn generate_data_specs(
        &mut self,
        placements: &[(Placement, Option<u32>)],
    ) -> Result<Vec<DataSpecification>> {
        let specs = placements
            .par_iter()
            .map(|(placement, key)| self.generate_data_spec(placement, *key))
            .collect::<Result<Vec<_>>>()?;
        self.clear_placements();
        for (placement, _) in placements {
            self.register_placement(placement);
        }
        Ok(specs)
    }

    /// Forget the cores registered with the recorders
    pub fn clear_placements(&mut self) {
        self.spike_recorder.clear_placements();
        self.v_recorder.clear_placements();
        self.gsyn_recorder.clear_placements();
    }

    /// Tell the recorders which core holds which slice
    pub fn register_placement(&mut self, placement: &Placement) {
        self.spike_recorder.register_placement(placement);
        self.v_recorder.register_placement(placement);
        self.gsyn_recorder.register_placement(placement);
    }

    fn reserve_regions(
        &self,
        spec: &mut DataSpecificationGenerator,
        slice: &VertexSlice,
        sizes: [usize; 3],
    ) -> Result<()> {
        spec.comment("\nReserving memory space for data regions:\n\n");
        spec.reserve_memory_region(
            PopulationRegion::System.index(),
            POPULATION_SYSTEM_REGION_BYTES,
            Some("System"),
            false,
        )?;
        spec.reserve_memory_region(
            PopulationRegion::NeuronParams.index(),
            resources::neuron_params_bytes(&self.costs, &self.model_costs(), slice.n_atoms()),
            Some("NeuronParams"),
            false,
        )?;
        let recording_regions = [
            (Spikes::REGION, sizes[0]),
            (Voltage::REGION, sizes[1]),
            (Conductance::REGION, sizes[2]),
        ];
        for (region, size) in recording_regions {
            if size > 0 {
                spec.reserve_memory_region(region.index(), size, Some(region.label()), true)?;
            }
        }
        spec.reserve_memory_region(
            PopulationRegion::ProvenanceData.index(),
            (N_BASIC_PROVENANCE_WORDS + N_POPULATION_PROVENANCE_WORDS) * BYTES_PER_WORD,
            Some("Provenance"),
            true,
        )?;
        Ok(())
    }

    fn write_setup_info(&self, spec: &mut DataSpecificationGenerator, sizes: [usize; 3]) -> Result<()> {
        let flags = RECORDING_MAGIC
            | self.spike_recorder.flag()
            | self.v_recorder.flag()
            | self.gsyn_recorder.flag();

        spec.switch_write_focus(PopulationRegion::System.index())?;
        spec.write_u32(self.config.application_magic)?;
        spec.write_u32(self.config.timer_period_us()?)?;
        spec.write_u32(self.config.n_machine_time_steps)?;
        spec.write_u32(flags)?;
        for size in sizes {
            spec.write_value(size as f64, DataType::Uint32)?;
        }
        spec.write_u32(self.spike_recorder.sampling_interval())?;
        spec.write_u32(self.v_recorder.sampling_interval())?;
        spec.write_u32(self.gsyn_recorder.sampling_interval())?;
        Ok(())
    }

    fn write_neuron_parameters(
        &self,
        spec: &mut DataSpecificationGenerator,
        slice: &VertexSlice,
        routing_key: Option<u32>,
    ) -> Result<()> {
        spec.comment(format!(
            "\nWriting Neuron Parameters for {} Neurons:\n",
            slice.n_atoms()
        ));
        spec.switch_write_focus(PopulationRegion::NeuronParams.index())?;

        match routing_key {
            Some(key) => {
                spec.write_u32(1)?;
                spec.write_u32(key)?;
            }
            None => {
                spec.write_u32(0)?;
                spec.write_u32(0)?;
            }
        }
        spec.write_value(slice.n_atoms() as f64, DataType::Uint32)?;

        for (index, param) in self.neuron_model.global_parameters().iter().enumerate() {
            let value = self.parameter_value(param, 0, "global", index)?;
            spec.write_value(value, param.data_type)?;
        }

        let blocks = [
            ("neuron", self.neuron_model.neural_parameters()),
            ("input", self.input_type.input_type_parameters()),
            ("threshold", self.threshold_type.threshold_parameters()),
        ];
        for (block, params) in &blocks {
            for atom in slice.atoms() {
                for (index, param) in params.iter().enumerate() {
                    let value = self.parameter_value(param, atom, block, index)?;
                    spec.write_value(value, param.data_type)?;
                }
            }
        }
        Ok(())
    }

    fn parameter_value(
        &self,
        param: &NeuronParameter,
        atom: usize,
        block: &str,
        index: usize,
    ) -> Result<f64> {
        param
            .value
            .value_for(atom)
            .ok_or_else(|| PopulationError::ParameterShape {
                population: self.label.clone(),
                parameter: format!("{block} parameter {index}"),
                got: param.value.len(),
                expected: self.n_atoms,
            })
    }
}

impl fmt::Display for PopulationVertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} with {} atoms", self.label, self.n_atoms)
    }
}

impl SpikeRecordable for PopulationVertex {
    fn is_recording_spikes(&self) -> bool {
        self.spike_recorder.is_recording()
    }

    fn set_recording_spikes(&mut self) {
        self.spike_recorder.set_recording(true);
    }

    fn get_spikes(&self, reader: &dyn MemoryReader) -> Result<SpikeRecording> {
        self.spike_recorder
            .get_spikes(&self.label, reader, self.n_timesteps())
    }
}

impl VoltageRecordable for PopulationVertex {
    fn is_recording_v(&self) -> bool {
        self.v_recorder.is_recording()
    }

    fn set_recording_v(&mut self, interval: u32) {
        self.v_recorder.set_sampling_interval(interval);
        self.v_recorder.set_recording(true);
    }

    fn get_v(&self, reader: &dyn MemoryReader) -> Result<AnalogRecording> {
        self.v_recorder.get_v(&self.label, reader, self.n_timesteps())
    }
}

impl ConductanceRecordable for PopulationVertex {
    fn is_recording_gsyn(&self) -> bool {
        self.gsyn_recorder.is_recording()
    }

    fn set_recording_gsyn(&mut self, interval: u32) {
        self.gsyn_recorder.set_sampling_interval(interval);
        self.gsyn_recorder.set_recording(true);
    }

    fn get_gsyn(&self, reader: &dyn MemoryReader) -> Result<AnalogRecording> {
        self.gsyn_recorder
            .get_gsyn(&self.label, reader, self.n_timesteps())
    }
}

impl PopulationInitializable for PopulationVertex {
    fn initialize(&mut self, variable: &str, value: ParameterValue) -> Result<()> {
        let unsupported = || PopulationError::UnsupportedInitialization {
            population: self.label.clone(),
            variable: variable.to_string(),
        };
        if !self.neuron_model.state_variables().contains(&variable) {
            return Err(unsupported());
        }
        self.check_shape(variable, &value)?;
        if self.neuron_model.initialize(variable, value) {
            Ok(())
        } else {
            Err(unsupported())
        }
    }
}

impl PopulationSettable for PopulationVertex {
    fn get_value(&self, name: &str) -> Result<ParameterValue> {
        self.lookup(name).ok_or_else(|| self.unknown(name))
    }

    fn set_value(&mut self, name: &str, value: ParameterValue) -> Result<()> {
        let owner = *self
            .parameter_owners
            .get(name)
            .ok_or_else(|| self.unknown(name))?;
        self.check_shape(name, &value)?;
        let accepted = match owner {
            Component::NeuronModel => self.neuron_model.set_parameter(name, value),
            Component::InputType => self.input_type.set_parameter(name, value),
            Component::ThresholdType => self.threshold_type.set_parameter(name, value),
            Component::SynapseType => self
                .synapse_manager
                .synapse_type_mut()
                .set_parameter(name, value),
        };
        if accepted {
            Ok(())
        } else {
            Err(self.unknown(name))
        }
    }
}

impl ProvidesProvenance for PopulationVertex {
    fn get_provenance_data(
        &self,
        reader: &dyn MemoryReader,
        location: CoreLocation,
    ) -> Result<Vec<ProvenanceDataItem>> {
        read_population_provenance(
            reader,
            &ProvenanceSource {
                label: &self.label,
                location,
            },
        )
    }
}

fn per_timestep<K: SignalKind>(recorder: &Recorder<K>, n_atoms: usize) -> usize {
    if recorder.is_recording() {
        K::record_bytes(n_atoms).div_ceil(recorder.sampling_interval() as usize)
    } else {
        0
    }
}

impl ReceivesBuffersToHost for PopulationVertex {
    fn recorded_region_ids(&self) -> Vec<PopulationRegion> {
        let mut ids = Vec::with_capacity(3);
        if self.spike_recorder.is_recording() {
            ids.push(Spikes::REGION);
        }
        if self.v_recorder.is_recording() {
            ids.push(Voltage::REGION);
        }
        if self.gsyn_recorder.is_recording() {
            ids.push(Conductance::REGION);
        }
        ids
    }

    fn buffered_sdram_per_timestep(&self, slice: &VertexSlice) -> usize {
        let n = slice.n_atoms();
        per_timestep(&self.spike_recorder, n)
            + per_timestep(&self.v_recorder, n)
            + per_timestep(&self.gsyn_recorder, n)
    }

    fn minimum_buffer_sdram_usage(&self, slice: &VertexSlice) -> usize {
        let n = slice.n_atoms();
        let steps = self.n_timesteps();
        self.recorders()
            .iter()
            .map(|r| r.sdram_usage_bytes(n, steps))
            .filter(|&size| size > 0)
            .map(|size| size.min(self.costs.minimum_buffer_sdram_bytes))
            .sum()
    }

    fn n_timesteps_in_buffer_space(&self, slice: &VertexSlice, buffer_space: usize) -> Option<usize> {
        let per_step = self.buffered_sdram_per_timestep(slice);
        if per_step == 0 {
            return None;
        }
        // one record per region of slack for averaged sampling
        let n = slice.n_atoms();
        let overflow = [
            (self.spike_recorder.is_recording(), Spikes::record_bytes(n)),
            (self.v_recorder.is_recording(), Voltage::record_bytes(n)),
            (self.gsyn_recorder.is_recording(), Conductance::record_bytes(n)),
        ]
        .iter()
        .filter(|(on, _)| *on)
        .map(|(_, bytes)| bytes)
        .sum::<usize>();
        Some(buffer_space.saturating_sub(overflow) / per_step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spynn_chip::system::{RECORD_SPIKE_BIT, RECORD_STATE_BIT};

    fn config() -> SimulationConfig {
        SimulationConfig::default().with_time_steps(100)
    }

    fn vertex(n: usize) -> PopulationVertex {
        PopulationVertex::lif_curr_exp("pop", n, config()).expect("Failed to build population")
    }

    fn slice(lo: usize, hi: usize) -> VertexSlice {
        VertexSlice::new(lo, hi).expect("Invalid slice")
    }

    #[test]
    fn parameters_resolve_across_components() {
        let mut v = vertex(4);
        assert_eq!(v.get_value("tau_m").ok(), Some(ParameterValue::Scalar(20.0)));
        assert_eq!(v.get_value("v_thresh").ok(), Some(ParameterValue::Scalar(-50.0)));
        assert_eq!(v.get_value("tau_syn_E").ok(), Some(ParameterValue::Scalar(5.0)));

        v.set_value("v_thresh", vec![-50.0, -51.0, -52.0, -53.0].into())
            .expect("Failed to set v_thresh");
        assert_eq!(
            v.get_value("v_thresh").ok(),
            Some(ParameterValue::PerNeuron(vec![-50.0, -51.0, -52.0, -53.0]))
        );
    }

    #[test]
    fn unknown_parameter_names_the_population() {
        let mut v = vertex(4);
        let err = v.get_value("tau_x").err();
        assert!(matches!(
            err,
            Some(PopulationError::UnknownParameter { ref population, ref parameter })
                if population == "pop" && parameter == "tau_x"
        ));
        assert!(v.set_value("tau_x", ParameterValue::Scalar(1.0)).is_err());
    }

    #[test]
    fn per_neuron_values_must_cover_the_population() {
        let mut v = vertex(4);
        let err = v.set_value("v_rest", vec![1.0, 2.0].into());
        assert!(matches!(err, Err(PopulationError::ParameterShape { got: 2, expected: 4, .. })));
    }

    #[test]
    fn initialize_only_declared_state() {
        let mut v = vertex(2);
        v.initialize("v", ParameterValue::Scalar(-70.0))
            .expect("Failed to initialize v");
        assert_eq!(v.get_value("v_init").ok(), Some(ParameterValue::Scalar(-70.0)));
        assert!(matches!(
            v.initialize("u", ParameterValue::Scalar(0.0)),
            Err(PopulationError::UnsupportedInitialization { .. })
        ));
    }

    #[test]
    fn binary_name_takes_suffix_before_extension() {
        let v = vertex(1).with_executable_suffix("_stdp_mad");
        assert_eq!(v.binary_file_name(), "IF_curr_exp_stdp_mad.aplx");
        let v = vertex(1).with_binary("plain");
        assert_eq!(v.binary_file_name(), "plain");
    }

    #[test]
    fn system_region_layout() {
        let mut v = vertex(10);
        v.set_recording_spikes();
        v.set_recording_v(2);
        let p = Placement::new(slice(0, 9), CoreLocation::new(0, 0, 1));
        let spec = v.generate_data_spec(&p, Some(0x800)).expect("Failed to generate data spec");
        let image = spec.execute().expect("Failed to execute data spec");

        let system = image
            .region(PopulationRegion::System.index())
            .expect("System region not reserved");
        let mut r = system.reader();
        let words: Vec<u32> = (0..10).map(|_| r.read_u32().unwrap_or_default()).collect();
        assert_eq!(words[0], 0xAC0);
        assert_eq!(words[1], 1000);
        assert_eq!(words[2], 100);
        assert_eq!(words[3], RECORDING_MAGIC | RECORD_SPIKE_BIT | RECORD_STATE_BIT);
        assert_eq!(words[4], 4 + 100 * 4);
        assert_eq!(words[5], 4 + 50 * (4 + 40));
        assert_eq!(words[6], 0);
        assert_eq!(&words[7..], &[1, 2, 1]);

        assert!(image.region(PopulationRegion::SpikeHistory.index()).is_some_and(|r| r.empty));
        assert!(image.region(PopulationRegion::GsynHistory.index()).is_none());

        let mut params = image
            .region(PopulationRegion::NeuronParams.index())
            .expect("Neuron parameter region not reserved")
            .reader();
        assert_eq!(params.read_u32().ok(), Some(1));
        assert_eq!(params.read_u32().ok(), Some(0x800));
        assert_eq!(params.read_u32().ok(), Some(10));
    }

    #[test]
    fn reserved_sdram_matches_estimate() {
        let mut v = vertex(50);
        v.set_recording_spikes();
        v.add_incoming_projection(IncomingProjection::one_to_one("stim", 50, 0, 2.0, 1.0));
        let s = slice(0, 49);
        let spec = v
            .generate_data_spec(&Placement::new(s, CoreLocation::new(0, 0, 2)), None)
            .expect("Failed to generate data spec");
        let provenance_bytes = 16 * 4;
        assert_eq!(
            spec.total_reserved_bytes(),
            v.resources_required(&s).sdram_bytes + provenance_bytes
        );
        assert!(v.fits_on_core(&s));
    }

    #[test]
    fn parallel_generation_registers_every_core() {
        let mut v = vertex(250);
        v.set_recording_spikes();
        let placements: Vec<_> = crate::slice::split_population(250, 100)
            .expect("Failed to split population")
            .into_iter()
            .enumerate()
            .map(|(i, s)| (Placement::new(s, CoreLocation::new(0, 0, i as u32 + 1)), None))
            .collect();
        let specs = v.generate_data_specs(&placements).expect("Failed to generate data specs");
        assert_eq!(specs.len(), 3);
        assert_eq!(v.spike_recorder.placements().count(), 3);
    }

    #[test]
    fn buffering_queries() {
        let mut v = vertex(64);
        let s = slice(0, 63);
        assert!(v.recorded_region_ids().is_empty());
        assert_eq!(v.n_timesteps_in_buffer_space(&s, 1000), None);

        v.set_recording_spikes();
        assert_eq!(v.recorded_region_ids(), vec![PopulationRegion::SpikeHistory]);
        assert_eq!(v.buffered_sdram_per_timestep(&s), 8);
        assert_eq!(v.minimum_buffer_sdram_usage(&s), 4 + 100 * 8);
        assert_eq!(v.n_timesteps_in_buffer_space(&s, 808), Some(100));
    }
}
