//! Synapse manager
//!
//! Owns the population's synapse type and its incoming projections, and
//! writes the three synaptic regions of each core:
//!
//! | Region | Contents |
//! |--------|----------|
//! | `SynapseParams` | ring-buffer left shift per receptor, then synapse type parameters neuron-major |
//! | `PopulationTable` | entry count, then `key, mask, matrix offset, row length` per projection |
//! | `SynapticMatrix` | reserved empty, filled by the loader |

use crate::error::{PopulationError, Result};
use crate::parameters::SynapseType;
use crate::resources::{CostTable, SynapseCosts};
use crate::slice::VertexSlice;
use spynn_chip::costs::{MAX_RING_BUFFER_LEFT_SHIFT, SYNAPTIC_ROW_HEADER_WORDS};
use spynn_chip::{PopulationRegion, BYTES_PER_WORD};
use spynn_dataspec::{DataSpecificationGenerator, DataType};
use tracing::debug;

/// Default expected firing rate of pre-synaptic neurons (Hz)
pub const DEFAULT_SPIKES_PER_SECOND: f64 = 30.0;
/// Default number of standard deviations the ring buffers must absorb
pub const DEFAULT_RING_BUFFER_SIGMA: f64 = 5.0;

/// A projection arriving at this population
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingProjection {
    /// Label of the source population
    pub pre_label: String,
    /// Routing key of the source
    pub key: u32,
    /// Routing mask of the source
    pub mask: u32,
    /// Neurons in the source population
    pub n_pre_atoms: usize,
    /// Most synapses any source neuron has onto this population
    pub max_row_length: usize,
    /// Mean synapses each target neuron receives from this projection
    pub connections_per_post: f64,
    /// Receptor index of the synapse type
    pub receptor: usize,
    /// Synaptic weight (nA or µS)
    pub weight: f64,
    /// Synaptic delay (ms)
    pub delay_ms: f64,
}

impl IncomingProjection {
    /// One-to-one projection from `n_pre_atoms` neurons
    pub fn one_to_one(pre_label: impl Into<String>, n_pre_atoms: usize, receptor: usize, weight: f64, delay_ms: f64) -> Self {
        Self {
            pre_label: pre_label.into(),
            key: 0,
            mask: 0xFFFF_FFFF,
            n_pre_atoms,
            max_row_length: 1,
            connections_per_post: 1.0,
            receptor,
            weight,
            delay_ms,
        }
    }

    /// Bytes of this projection's block in the synaptic matrix
    pub fn matrix_bytes(&self) -> usize {
        self.n_pre_atoms * (SYNAPTIC_ROW_HEADER_WORDS + self.max_row_length) * BYTES_PER_WORD
    }
}

/// Synaptic state of one population
#[derive(Debug)]
pub struct SynapseManager {
    synapse_type: Box<dyn SynapseType>,
    projections: Vec<IncomingProjection>,
    spikes_per_second: f64,
    ring_buffer_sigma: f64,
    executable_suffix: String,
}

impl SynapseManager {
    /// Create a manager with no incoming projections
    pub fn new(synapse_type: Box<dyn SynapseType>) -> Self {
        Self {
            synapse_type,
            projections: Vec::new(),
            spikes_per_second: DEFAULT_SPIKES_PER_SECOND,
            ring_buffer_sigma: DEFAULT_RING_BUFFER_SIGMA,
            executable_suffix: String::new(),
        }
    }

    /// Set the expected pre-synaptic rate and the headroom in standard deviations
    #[must_use]
    pub fn with_ring_buffer_tuning(mut self, spikes_per_second: f64, ring_buffer_sigma: f64) -> Self {
        self.spikes_per_second = spikes_per_second;
        self.ring_buffer_sigma = ring_buffer_sigma;
        self
    }

    /// Set the suffix of the executable variant these synapses need
    #[must_use]
    pub fn with_executable_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.executable_suffix = suffix.into();
        self
    }

    /// Synapse type
    pub fn synapse_type(&self) -> &dyn SynapseType {
        self.synapse_type.as_ref()
    }

    /// Synapse type, mutably
    pub fn synapse_type_mut(&mut self) -> &mut dyn SynapseType {
        self.synapse_type.as_mut()
    }

    /// Add an incoming projection
    pub fn add_projection(&mut self, projection: IncomingProjection) {
        debug!(
            "Projection from {} ({} atoms) onto receptor {}",
            projection.pre_label, projection.n_pre_atoms, projection.receptor
        );
        self.projections.push(projection);
    }

    /// Incoming projections
    pub fn projections(&self) -> &[IncomingProjection] {
        &self.projections
    }

    /// Suffix inserted into the executable name
    pub fn executable_suffix(&self) -> &str {
        &self.executable_suffix
    }

    /// Left shift applied to each receptor's ring buffer
    ///
    /// The shift leaves room for the mean input plus `ring_buffer_sigma`
    /// standard deviations arriving in one tick, assuming Poisson sources
    /// firing at `spikes_per_second`, but never more than the sum of all
    /// weights. The result is clamped to the firmware maximum.
    pub fn ring_buffer_shifts(&self, weight_scale: f64, time_step_ms: f64) -> Vec<u32> {
        let n_types = self.synapse_type.n_synapse_types();
        let rate_per_tick = self.spikes_per_second * time_step_ms / 1000.0;
        let mut mean = vec![0.0f64; n_types];
        let mut variance = vec![0.0f64; n_types];
        let mut ceiling = vec![0.0f64; n_types];
        let mut largest = vec![0.0f64; n_types];

        for proj in self.projections.iter().filter(|p| p.receptor < n_types) {
            let w = (proj.weight * weight_scale).abs();
            let r = proj.receptor;
            mean[r] += proj.connections_per_post * w * rate_per_tick;
            variance[r] += proj.connections_per_post * w * w * rate_per_tick;
            ceiling[r] += proj.connections_per_post * w;
            largest[r] = largest[r].max(w);
        }

        (0..n_types)
            .map(|r| {
                let upper = mean[r] + self.ring_buffer_sigma * variance[r].sqrt();
                let max_weight = upper.min(ceiling[r]).max(largest[r]);
                weight_power(max_weight).min(MAX_RING_BUFFER_LEFT_SHIFT)
            })
            .collect()
    }

    fn synapse_params_bytes(&self, n_atoms: usize) -> usize {
        self.synapse_type.n_synapse_types() * BYTES_PER_WORD
            + n_atoms * self.synapse_type.sdram_usage_per_neuron_in_bytes()
    }

    fn population_table_bytes(&self, table: &CostTable) -> usize {
        table.population_table_header_bytes + self.projections.len() * table.population_table_entry_bytes
    }

    fn synaptic_matrix_bytes(&self) -> usize {
        self.projections.iter().map(IncomingProjection::matrix_bytes).sum()
    }

    /// CPU, DTCM and SDRAM for `n_atoms` target neurons
    pub fn costs(&self, table: &CostTable, n_atoms: usize) -> SynapseCosts {
        let n_types = self.synapse_type.n_synapse_types();
        let ring_buffers =
            n_atoms * n_types * table.ring_buffer_delay_slots * table.ring_buffer_slot_bytes;
        SynapseCosts {
            cpu_cycles: table.synapse_base_cpu_cycles
                + self.projections.len() as u64 * table.synapse_cpu_cycles_per_incoming_edge
                + self.synapse_type.n_cpu_cycles_per_neuron() * n_atoms as u64,
            dtcm_bytes: n_atoms * self.synapse_type.dtcm_usage_per_neuron_in_bytes() + ring_buffers,
            sdram_bytes: self.synapse_params_bytes(n_atoms)
                + self.population_table_bytes(table)
                + self.synaptic_matrix_bytes(),
        }
    }

    /// Reserve and fill the synaptic regions for `slice`
    ///
    /// # Errors
    ///
    /// Returns a data specification error if a region overflows or a
    /// value does not fit its data type, and `ParameterShape` when a
    /// per-neuron synapse parameter does not reach the end of `slice`.
    pub fn write_data_spec(
        &self,
        spec: &mut DataSpecificationGenerator,
        table: &CostTable,
        population: &str,
        slice: &VertexSlice,
        weight_scale: f64,
        time_step_ms: f64,
    ) -> Result<()> {
        let matrix_bytes = self.synaptic_matrix_bytes();
        spec.reserve_memory_region(
            PopulationRegion::SynapseParams.index(),
            self.synapse_params_bytes(slice.n_atoms()),
            Some("SynapseParams"),
            false,
        )?;
        spec.reserve_memory_region(
            PopulationRegion::PopulationTable.index(),
            self.population_table_bytes(table),
            Some("PopulationTable"),
            false,
        )?;
        if matrix_bytes > 0 {
            spec.reserve_memory_region(
                PopulationRegion::SynapticMatrix.index(),
                matrix_bytes,
                Some("SynapticMatrix"),
                true,
            )?;
        }

        spec.comment("\nWriting Synapse Parameters for each neuron:\n");
        spec.switch_write_focus(PopulationRegion::SynapseParams.index())?;
        for shift in self.ring_buffer_shifts(weight_scale, time_step_ms) {
            spec.write_u32(shift)?;
        }
        let params = self.synapse_type.synapse_type_parameters();
        for atom in slice.atoms() {
            for (index, param) in params.iter().enumerate() {
                let value = param.value.value_for(atom).ok_or_else(|| {
                    PopulationError::ParameterShape {
                        population: population.to_string(),
                        parameter: format!("synapse parameter {index}"),
                        got: param.value.len(),
                        expected: slice.hi_atom() + 1,
                    }
                })?;
                spec.write_value(value, param.data_type)?;
            }
        }

        spec.comment("\nWriting Master Population Table:\n");
        spec.switch_write_focus(PopulationRegion::PopulationTable.index())?;
        spec.write_value(self.projections.len() as f64, DataType::Uint32)?;
        let mut offset = 0usize;
        for proj in &self.projections {
            spec.write_u32(proj.key)?;
            spec.write_u32(proj.mask)?;
            spec.write_value(offset as f64, DataType::Uint32)?;
            spec.write_value(proj.max_row_length as f64, DataType::Uint32)?;
            offset += proj.matrix_bytes();
        }
        Ok(())
    }
}

/// Power of two at or above `max_weight`, bumped once more when exact
fn weight_power(max_weight: f64) -> u32 {
    if max_weight <= 0.0 {
        return 0;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let power = max_weight.log2().ceil().max(0.0) as u32;
    if 2f64.powi(power as i32) <= max_weight {
        power + 1
    } else {
        power
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SynapseTypeExponential;

    fn manager() -> SynapseManager {
        SynapseManager::new(Box::new(SynapseTypeExponential::with_defaults(1000)))
    }

    #[test]
    fn weight_power_covers_the_weight() {
        assert_eq!(weight_power(0.0), 0);
        assert_eq!(weight_power(0.5), 0);
        assert_eq!(weight_power(1.0), 1);
        assert_eq!(weight_power(3.0), 2);
        assert_eq!(weight_power(4.0), 3);
    }

    #[test]
    fn no_projections_need_no_shift() {
        assert_eq!(manager().ring_buffer_shifts(1.0, 1.0), vec![0, 0]);
    }

    #[test]
    fn shifts_are_per_receptor() {
        let mut m = manager();
        m.add_projection(IncomingProjection::one_to_one("stim", 1, 0, 5.0, 1.0));
        m.add_projection(IncomingProjection::one_to_one("inh", 10, 1, -0.25, 1.0));
        let shifts = m.ring_buffer_shifts(1.0, 1.0);
        // the single largest weight dominates each receptor
        assert_eq!(shifts, vec![3, 0]);
    }

    #[test]
    fn shifts_are_clamped() {
        let mut m = manager();
        m.add_projection(IncomingProjection::one_to_one("big", 1, 0, 1.0e9, 1.0));
        assert_eq!(m.ring_buffer_shifts(1.0, 1.0)[0], MAX_RING_BUFFER_LEFT_SHIFT);
    }

    #[test]
    fn costs_grow_with_fan_in() {
        let table = CostTable::default();
        let mut m = manager();
        let before = m.costs(&table, 10);
        m.add_projection(IncomingProjection::one_to_one("a", 10, 0, 1.0, 1.0));
        let after = m.costs(&table, 10);
        assert_eq!(after.cpu_cycles - before.cpu_cycles, table.synapse_cpu_cycles_per_incoming_edge);
        assert_eq!(after.sdram_bytes - before.sdram_bytes, 16 + 10 * 4 * 4);
        assert_eq!(before.dtcm_bytes, 10 * 16 + 10 * 2 * 16 * 2);
    }

    #[test]
    fn regions_fill_exactly() {
        let table = CostTable::default();
        let mut m = manager().with_executable_suffix("_stdp");
        m.add_projection(IncomingProjection::one_to_one("a", 4, 0, 1.0, 1.0));
        let slice = VertexSlice::new(0, 2).expect("Invalid slice");
        let mut spec = DataSpecificationGenerator::new();
        m.write_data_spec(&mut spec, &table, "pop", &slice, 1.0, 1.0)
            .expect("Failed to write synapse regions");
        assert_eq!(spec.bytes_remaining(PopulationRegion::SynapseParams.index()), Some(0));
        assert_eq!(spec.bytes_remaining(PopulationRegion::PopulationTable.index()), Some(0));
        assert_eq!(m.executable_suffix(), "_stdp");
    }
}
