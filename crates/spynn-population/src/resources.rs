//! Resource estimation.
//!
//! Every estimate is a pure function of the slice size, the components'
//! per-neuron costs, the run length and an injected [`CostTable`]. The
//! vertex gathers the inputs; nothing here holds state.

use spynn_chip::{costs, recording, system};
use std::fmt;
use std::ops::Add;

/// Base costs and per-core limits shared by estimation and generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostTable {
    /// Fixed neuron-loop cycles per tick
    pub neuron_base_cpu_cycles: u64,
    /// Neuron-loop cycles per neuron per tick, before component costs
    pub neuron_base_cpu_cycles_per_neuron: u64,
    /// Fixed neuron-loop DTCM
    pub neuron_base_dtcm_bytes: usize,
    /// Neuron parameter region header (key flag, key, neuron count)
    pub neuron_base_sdram_bytes: usize,
    /// Fixed cycles of the main loop
    pub c_main_base_cpu_cycles: u64,
    /// Fixed DTCM of the main loop
    pub c_main_base_dtcm_bytes: usize,
    /// Bytes of the system region
    pub system_region_bytes: usize,
    /// Spike recorder cycles per neuron per tick
    pub spike_recorder_cpu_cycles_per_neuron: u64,
    /// Analog recorder cycles per neuron per tick
    pub analog_recorder_cpu_cycles_per_neuron: u64,
    /// Analog recorder DTCM
    pub analog_recorder_dtcm_bytes: usize,
    /// Smallest buffer a streamed recording region may be given
    pub minimum_buffer_sdram_bytes: usize,
    /// Fixed synapse processing cycles per tick
    pub synapse_base_cpu_cycles: u64,
    /// Synapse processing cycles per incoming projection
    pub synapse_cpu_cycles_per_incoming_edge: u64,
    /// Delay slots in each neuron's input ring buffer
    pub ring_buffer_delay_slots: usize,
    /// Bytes per ring buffer slot
    pub ring_buffer_slot_bytes: usize,
    /// Master population table header
    pub population_table_header_bytes: usize,
    /// Master population table entry per incoming projection
    pub population_table_entry_bytes: usize,
    /// DTCM available to one core
    pub dtcm_available_bytes: usize,
    /// SDRAM available on one chip
    pub sdram_available_bytes: usize,
    /// Core clock
    pub cpu_clock_mhz: u64,
}

impl Default for CostTable {
    fn default() -> Self {
        Self {
            neuron_base_cpu_cycles: costs::NEURON_BASE_CPU_CYCLES,
            neuron_base_cpu_cycles_per_neuron: costs::NEURON_BASE_CPU_CYCLES_PER_NEURON,
            neuron_base_dtcm_bytes: costs::NEURON_BASE_DTCM_BYTES,
            neuron_base_sdram_bytes: costs::NEURON_BASE_SDRAM_BYTES,
            c_main_base_cpu_cycles: costs::C_MAIN_BASE_CPU_CYCLES,
            c_main_base_dtcm_bytes: costs::C_MAIN_BASE_DTCM_BYTES,
            system_region_bytes: system::POPULATION_SYSTEM_REGION_BYTES,
            spike_recorder_cpu_cycles_per_neuron: costs::SPIKE_RECORDER_CPU_CYCLES_PER_NEURON,
            analog_recorder_cpu_cycles_per_neuron: costs::ANALOG_RECORDER_CPU_CYCLES_PER_NEURON,
            analog_recorder_dtcm_bytes: costs::ANALOG_RECORDER_DTCM_BYTES,
            minimum_buffer_sdram_bytes: recording::MINIMUM_BUFFER_SDRAM_BYTES,
            synapse_base_cpu_cycles: costs::SYNAPSE_BASE_CPU_CYCLES,
            synapse_cpu_cycles_per_incoming_edge: costs::SYNAPSE_CPU_CYCLES_PER_INCOMING_EDGE,
            ring_buffer_delay_slots: costs::RING_BUFFER_DELAY_SLOTS,
            ring_buffer_slot_bytes: costs::RING_BUFFER_SLOT_BYTES,
            population_table_header_bytes: costs::POPULATION_TABLE_HEADER_BYTES,
            population_table_entry_bytes: costs::POPULATION_TABLE_ENTRY_BYTES,
            dtcm_available_bytes: costs::DTCM_AVAILABLE_BYTES,
            sdram_available_bytes: costs::SDRAM_PER_CHIP_BYTES,
            cpu_clock_mhz: costs::CPU_CLOCK_MHZ,
        }
    }
}

impl CostTable {
    /// Capacity of one core at the given timer period
    pub fn limits(&self, timer_period_us: u32) -> ResourceContainer {
        ResourceContainer {
            cpu_cycles: self.cpu_clock_mhz * u64::from(timer_period_us),
            dtcm_bytes: self.dtcm_available_bytes,
            sdram_bytes: self.sdram_available_bytes,
        }
    }
}

/// CPU, DTCM and SDRAM required by (or available to) one core
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceContainer {
    /// Cycles per tick
    pub cpu_cycles: u64,
    /// DTCM bytes
    pub dtcm_bytes: usize,
    /// SDRAM bytes
    pub sdram_bytes: usize,
}

impl ResourceContainer {
    /// True when every requirement is within `limits`
    pub fn fits(&self, limits: &Self) -> bool {
        self.cpu_cycles <= limits.cpu_cycles
            && self.dtcm_bytes <= limits.dtcm_bytes
            && self.sdram_bytes <= limits.sdram_bytes
    }
}

impl Add for ResourceContainer {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            cpu_cycles: self.cpu_cycles + rhs.cpu_cycles,
            dtcm_bytes: self.dtcm_bytes + rhs.dtcm_bytes,
            sdram_bytes: self.sdram_bytes + rhs.sdram_bytes,
        }
    }
}

impl fmt::Display for ResourceContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cycles/tick, {} B DTCM, {} B SDRAM",
            self.cpu_cycles, self.dtcm_bytes, self.sdram_bytes
        )
    }
}

/// Per-neuron costs summed over the neuron, input and threshold components
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModelCosts {
    /// Cycles per neuron per tick
    pub cpu_cycles_per_neuron: u64,
    /// DTCM bytes per neuron
    pub dtcm_bytes_per_neuron: usize,
    /// Neuron parameter bytes written once per core
    pub global_param_bytes: usize,
    /// Neuron parameter bytes per neuron
    pub param_bytes_per_neuron: usize,
}

/// Overheads a recorder adds to its core
pub trait RecordingCost {
    /// Cycles per tick for `n_atoms` neurons
    fn cpu_overhead(&self, table: &CostTable, n_atoms: usize) -> u64;

    /// DTCM bytes
    fn dtcm_overhead(&self, table: &CostTable) -> usize;

    /// SDRAM bytes of the recording region
    fn sdram_usage_bytes(&self, n_atoms: usize, n_timesteps: usize) -> usize;
}

/// Synapse manager contribution for one slice
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SynapseCosts {
    /// Cycles per tick
    pub cpu_cycles: u64,
    /// DTCM bytes
    pub dtcm_bytes: usize,
    /// SDRAM bytes of all synapse regions
    pub sdram_bytes: usize,
}

/// Bytes of the neuron parameter region for `n_atoms` neurons
pub fn neuron_params_bytes(table: &CostTable, model: &ModelCosts, n_atoms: usize) -> usize {
    table.neuron_base_sdram_bytes + model.global_param_bytes + model.param_bytes_per_neuron * n_atoms
}

/// CPU cycles per tick
pub fn cpu_cycles(
    table: &CostTable,
    model: &ModelCosts,
    recorders: &[&dyn RecordingCost],
    synapses: &SynapseCosts,
    n_atoms: usize,
) -> u64 {
    let per_neuron = table.neuron_base_cpu_cycles_per_neuron + model.cpu_cycles_per_neuron;
    table.neuron_base_cpu_cycles
        + table.c_main_base_cpu_cycles
        + per_neuron * n_atoms as u64
        + recorders
            .iter()
            .map(|r| r.cpu_overhead(table, n_atoms))
            .sum::<u64>()
        + synapses.cpu_cycles
}

/// DTCM bytes
pub fn dtcm_bytes(
    table: &CostTable,
    model: &ModelCosts,
    recorders: &[&dyn RecordingCost],
    synapses: &SynapseCosts,
    n_atoms: usize,
) -> usize {
    table.neuron_base_dtcm_bytes
        + table.c_main_base_dtcm_bytes
        + model.dtcm_bytes_per_neuron * n_atoms
        + recorders.iter().map(|r| r.dtcm_overhead(table)).sum::<usize>()
        + synapses.dtcm_bytes
}

/// SDRAM bytes: system region, neuron parameters, recordings and synapses
pub fn sdram_bytes(
    table: &CostTable,
    model: &ModelCosts,
    recorders: &[&dyn RecordingCost],
    synapses: &SynapseCosts,
    n_atoms: usize,
    n_timesteps: usize,
) -> usize {
    table.system_region_bytes
        + neuron_params_bytes(table, model, n_atoms)
        + recorders
            .iter()
            .map(|r| r.sdram_usage_bytes(n_atoms, n_timesteps))
            .sum::<usize>()
        + synapses.sdram_bytes
}

/// All three estimates at once
pub fn estimate(
    table: &CostTable,
    model: &ModelCosts,
    recorders: &[&dyn RecordingCost],
    synapses: &SynapseCosts,
    n_atoms: usize,
    n_timesteps: usize,
) -> ResourceContainer {
    ResourceContainer {
        cpu_cycles: cpu_cycles(table, model, recorders, synapses, n_atoms),
        dtcm_bytes: dtcm_bytes(table, model, recorders, synapses, n_atoms),
        sdram_bytes: sdram_bytes(table, model, recorders, synapses, n_atoms, n_timesteps),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PerNeuronRecorder;

    impl RecordingCost for PerNeuronRecorder {
        fn cpu_overhead(&self, _table: &CostTable, n_atoms: usize) -> u64 {
            3 * n_atoms as u64
        }

        fn dtcm_overhead(&self, _table: &CostTable) -> usize {
            8
        }

        fn sdram_usage_bytes(&self, n_atoms: usize, n_timesteps: usize) -> usize {
            4 + n_atoms * n_timesteps
        }
    }

    fn model() -> ModelCosts {
        ModelCosts {
            cpu_cycles_per_neuron: 50,
            dtcm_bytes_per_neuron: 36,
            global_param_bytes: 8,
            param_bytes_per_neuron: 36,
        }
    }

    #[test]
    fn empty_slice_costs_only_base() {
        let table = CostTable::default();
        let r = estimate(&table, &model(), &[], &SynapseCosts::default(), 0, 1000);
        assert_eq!(r.cpu_cycles, 10);
        assert_eq!(r.dtcm_bytes, 36 + 12);
        assert_eq!(r.sdram_bytes, 40 + 12 + 8);
    }

    #[test]
    fn per_neuron_terms_are_linear() {
        let table = CostTable::default();
        let rec = PerNeuronRecorder;
        let recorders: [&dyn RecordingCost; 1] = [&rec];
        let syn = SynapseCosts::default();
        for k in [1usize, 7, 64, 100] {
            let a = estimate(&table, &model(), &recorders, &syn, k, 10);
            let b = estimate(&table, &model(), &recorders, &syn, 2 * k, 10);
            assert_eq!(b.cpu_cycles - a.cpu_cycles, (22 + 50 + 3) * k as u64);
            assert_eq!(b.dtcm_bytes - a.dtcm_bytes, 36 * k);
            assert_eq!(b.sdram_bytes - a.sdram_bytes, (36 + 10) * k);
        }
    }

    #[test]
    fn fit_check_uses_every_dimension() {
        let limits = CostTable::default().limits(1000);
        assert_eq!(limits.cpu_cycles, 200_000);
        let ok = ResourceContainer {
            cpu_cycles: 1,
            dtcm_bytes: 1,
            sdram_bytes: 1,
        };
        assert!(ok.fits(&limits));
        let too_hot = ResourceContainer {
            cpu_cycles: 200_001,
            ..ok
        };
        assert!(!too_hot.fits(&limits));
        let too_big = ResourceContainer {
            dtcm_bytes: 64 * 1024 + 1,
            ..ok
        };
        assert!(!too_big.fits(&limits));
    }

    #[test]
    fn containers_add() {
        let a = ResourceContainer {
            cpu_cycles: 1,
            dtcm_bytes: 2,
            sdram_bytes: 3,
        };
        assert_eq!(
            a + a,
            ResourceContainer {
                cpu_cycles: 2,
                dtcm_bytes: 4,
                sdram_bytes: 6
            }
        );
    }
}
