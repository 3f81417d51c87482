//! Base resource costs and per-core capacities.
//!
//! Cycle counts are per machine time step. Byte counts are totals for one
//! core. These are the firmware's fixed overheads; model-specific costs
//! are supplied by the neuron, input, threshold and synapse components.

// ── Neuron loop ──────────────────────────────────────────────────────────────

/// DTCM used by the neuron loop before any neuron is added.
pub const NEURON_BASE_DTCM_BYTES: usize = 36;
/// SDRAM header of the neuron parameter region (key flag, key, n_neurons).
pub const NEURON_BASE_SDRAM_BYTES: usize = 12;
/// Cycles spent per neuron by the loop itself.
pub const NEURON_BASE_CPU_CYCLES_PER_NEURON: u64 = 22;
/// Fixed cycles of the neuron loop.
pub const NEURON_BASE_CPU_CYCLES: u64 = 10;

// ── c_main ───────────────────────────────────────────────────────────────────

/// DTCM used by `c_main` statics.
pub const C_MAIN_BASE_DTCM_BYTES: usize = 12;
/// Fixed cycles of `c_main` per tick.
pub const C_MAIN_BASE_CPU_CYCLES: u64 = 0;

// ── Recorders ────────────────────────────────────────────────────────────────

/// Cycles per neuron to set a bit in the outgoing spike bit-field.
pub const SPIKE_RECORDER_CPU_CYCLES_PER_NEURON: u64 = 4;
/// Cycles per neuron to copy one analog sample into the record.
pub const ANALOG_RECORDER_CPU_CYCLES_PER_NEURON: u64 = 4;
/// DTCM for an analog recorder's write pointer and state.
pub const ANALOG_RECORDER_DTCM_BYTES: usize = 4;

// ── Synapses ─────────────────────────────────────────────────────────────────

/// Fixed cycles of synapse processing per tick.
pub const SYNAPSE_BASE_CPU_CYCLES: u64 = 10;
/// Cycles per incoming projection (population table walk and row DMA setup).
pub const SYNAPSE_CPU_CYCLES_PER_INCOMING_EDGE: u64 = 50;
/// Delay slots in each ring buffer.
pub const RING_BUFFER_DELAY_SLOTS: usize = 16;
/// Bytes per ring buffer slot (one 16-bit accumulated weight).
pub const RING_BUFFER_SLOT_BYTES: usize = 2;
/// Bytes of the master population table header (entry count).
pub const POPULATION_TABLE_HEADER_BYTES: usize = 4;
/// Bytes per master population table entry (key, mask, address, row length).
pub const POPULATION_TABLE_ENTRY_BYTES: usize = 16;
/// Header words at the front of every synaptic row.
pub const SYNAPTIC_ROW_HEADER_WORDS: usize = 3;
/// Largest ring-buffer left shift the firmware accepts.
pub const MAX_RING_BUFFER_LEFT_SHIFT: u32 = 16;

// ── Capacities ───────────────────────────────────────────────────────────────

/// DTCM available to application code on one core.
pub const DTCM_AVAILABLE_BYTES: usize = 64 * 1024;
/// SDRAM on one chip, shared by its cores.
pub const SDRAM_PER_CHIP_BYTES: usize = 128 * 1024 * 1024;
/// Core clock.
pub const CPU_CLOCK_MHZ: u64 = 200;

/// CPU cycles available in one timer tick of `timer_period_us`.
#[must_use]
pub const fn cpu_cycles_per_tick(timer_period_us: u64) -> u64 {
    CPU_CLOCK_MHZ * timer_period_us
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millisecond_tick_cycles() {
        assert_eq!(cpu_cycles_per_tick(1000), 200_000);
    }

    #[test]
    fn neuron_header_is_three_words() {
        assert_eq!(NEURON_BASE_SDRAM_BYTES, 3 * crate::BYTES_PER_WORD);
    }
}
