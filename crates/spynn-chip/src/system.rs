//! System region layout.
//!
//! ```text
//! word 0      application magic number
//! word 1      timer period (µs, machine time step × time scale factor)
//! word 2      number of machine time steps
//! word 3      recording flags
//!               bit 0   record spikes
//!               bit 1   record membrane voltage
//!               bit 2   record synaptic conductance
//!               bit 3   reserved (zero)
//!               16..31  0xBEEF sentinel
//! word 4..6   recording region sizes: spikes, voltage, conductance
//! word 7..9   sampling intervals: spikes, voltage, conductance
//! ```

use crate::BYTES_PER_WORD;

// ── Basic setup header ───────────────────────────────────────────────────────

/// Words in the basic setup header (magic, timer period, time steps).
pub const BASIC_SETUP_WORDS: usize = 3;

/// Default application magic number for the population executable.
pub const DEFAULT_APPLICATION_MAGIC: u32 = 0xAC0;

// ── Recording flags ──────────────────────────────────────────────────────────

/// Record spike history.
pub const RECORD_SPIKE_BIT: u32 = 1 << 0;
/// Record membrane voltage.
pub const RECORD_STATE_BIT: u32 = 1 << 1;
/// Record synaptic conductance.
pub const RECORD_GSYN_BIT: u32 = 1 << 2;
/// Reserved flag bits; always written as zero.
pub const RECORD_RESERVED_MASK: u32 = 0x0000_FFF8;

/// Sentinel in the high half of the flags word.
pub const RECORDING_MAGIC: u32 = 0xBEEF_0000;
/// Mask selecting the sentinel.
pub const RECORDING_MAGIC_MASK: u32 = 0xFFFF_0000;

/// Number of recorded signals (spikes, voltage, conductance).
pub const N_RECORDED_SIGNALS: usize = 3;

// ── Sizes ────────────────────────────────────────────────────────────────────

/// Words in the system region.
pub const POPULATION_SYSTEM_REGION_WORDS: usize =
    BASIC_SETUP_WORDS + 1 + N_RECORDED_SIGNALS + N_RECORDED_SIGNALS;

/// Bytes in the system region.
pub const POPULATION_SYSTEM_REGION_BYTES: usize = POPULATION_SYSTEM_REGION_WORDS * BYTES_PER_WORD;

/// True when a flags word carries the sentinel and no reserved bits.
#[must_use]
pub const fn recording_flags_valid(flags: u32) -> bool {
    flags & RECORDING_MAGIC_MASK == RECORDING_MAGIC && flags & RECORD_RESERVED_MASK == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_bits_are_distinct() {
        assert_eq!(RECORD_SPIKE_BIT & RECORD_STATE_BIT, 0);
        assert_eq!(RECORD_STATE_BIT & RECORD_GSYN_BIT, 0);
        assert_eq!(
            (RECORD_SPIKE_BIT | RECORD_STATE_BIT | RECORD_GSYN_BIT) & RECORD_RESERVED_MASK,
            0
        );
    }

    #[test]
    fn system_region_is_ten_words() {
        assert_eq!(POPULATION_SYSTEM_REGION_BYTES, 40);
    }

    #[test]
    fn sentinel_validation() {
        assert!(recording_flags_valid(RECORDING_MAGIC | RECORD_SPIKE_BIT));
        assert!(!recording_flags_valid(RECORD_SPIKE_BIT));
        assert!(!recording_flags_valid(RECORDING_MAGIC | 0x8));
    }
}
