//! Recording buffer format.
//!
//! Every recording region starts with one header word holding the number
//! of record bytes the core has written so far. Records follow back to
//! back, one per sampled time step:
//!
//! ```text
//! spikes       ceil(n_atoms / 32) words of bit-field
//!              (bit i % 32 of word i / 32 set when neuron i fired)
//! voltage      u32 time step, then n_atoms S1615 samples
//! conductance  u32 time step, then n_atoms S1615 samples
//! ```

use crate::BYTES_PER_WORD;

/// Bytes of the `bytes_written` header at the front of a recording region.
pub const RECORDING_HEADER_BYTES: usize = 4;

/// Neurons covered by one bit-field word.
pub const NEURONS_PER_SPIKE_WORD: usize = 32;

/// Bytes of the time stamp leading each analog record.
pub const ANALOG_TIMESTAMP_BYTES: usize = 4;

/// Bytes per analog sample (S1615).
pub const ANALOG_SAMPLE_BYTES: usize = 4;

/// Smallest SDRAM buffer worth streaming a recording through.
pub const MINIMUM_BUFFER_SDRAM_BYTES: usize = 1024 * 1024;

/// Bit-field words needed to cover `n_atoms` neurons.
#[must_use]
pub const fn spike_words(n_atoms: usize) -> usize {
    n_atoms.div_ceil(NEURONS_PER_SPIKE_WORD)
}

/// Bytes of one spike record.
#[must_use]
pub const fn spike_record_bytes(n_atoms: usize) -> usize {
    spike_words(n_atoms) * BYTES_PER_WORD
}

/// Bytes of one voltage or conductance record.
#[must_use]
pub const fn analog_record_bytes(n_atoms: usize) -> usize {
    ANALOG_TIMESTAMP_BYTES + n_atoms * ANALOG_SAMPLE_BYTES
}

/// Number of records taken over `n_timesteps` at one record every `interval` steps.
#[must_use]
pub const fn n_records(n_timesteps: usize, interval: usize) -> usize {
    if interval == 0 {
        return 0;
    }
    n_timesteps.div_ceil(interval)
}
