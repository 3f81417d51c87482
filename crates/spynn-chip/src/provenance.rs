//! Provenance counter layout.
//!
//! At the end of a run each core writes a block of little-endian words to
//! its provenance region: first the counters every application reports,
//! then the counters specific to population cores.
//!
//! ```text
//! word 0..4    basic counters          (BasicCounter order)
//! word 5..15   population counters     (PopulationCounter order)
//! ```

/// Counters common to every application core, in firmware order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BasicCounter {
    /// Times the outgoing packet queue was full.
    TransmissionEventOverflow = 0,
    /// Times the callback queue overflowed.
    CallbackQueueOverloaded = 1,
    /// Times the DMA queue overflowed.
    DmaQueueOverloaded = 2,
    /// Timer ticks that started while the previous one was still running.
    TimerTickOverrun = 3,
    /// Largest number of ticks the timer fell behind by.
    MaxTimerTickOverrun = 4,
}

impl BasicCounter {
    /// All basic counters in firmware order.
    pub const ALL: [Self; 5] = [
        Self::TransmissionEventOverflow,
        Self::CallbackQueueOverloaded,
        Self::DmaQueueOverloaded,
        Self::TimerTickOverrun,
        Self::MaxTimerTickOverrun,
    ];

    /// Word offset in the provenance block.
    #[must_use]
    pub const fn offset(self) -> usize {
        self as usize
    }
}

/// Number of basic counters preceding any application-specific counters.
pub const N_BASIC_PROVENANCE_WORDS: usize = BasicCounter::ALL.len();

/// Counters written by population cores after the basic counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PopulationCounter {
    /// Pre-synaptic events received.
    PreSynapticEventCount = 0,
    /// Times a ring-buffer weight saturated.
    SaturationCount = 1,
    /// Packets lost from the input buffer.
    BufferOverflowCount = 2,
    /// Last timer tick the core reached.
    CurrentTimerTick = 3,
    /// Times a plastic weight saturated.
    PlasticSynapticWeightSaturationCount = 4,
    /// Population table searches that found nothing.
    GhostPopTableSearches = 5,
    /// Bit-fields that could not be read into DTCM.
    FailedToReadBitFields = 6,
    /// Synaptic rows read that turned out empty.
    EmptyRowReads = 7,
    /// DMA transfers completed.
    DmaCompletes = 8,
    /// Spikes processed.
    SpikeProcessingCount = 9,
    /// Keys received with no master population entry.
    InvalidMasterPopHits = 10,
}

impl PopulationCounter {
    /// All population counters in firmware order.
    pub const ALL: [Self; 11] = [
        Self::PreSynapticEventCount,
        Self::SaturationCount,
        Self::BufferOverflowCount,
        Self::CurrentTimerTick,
        Self::PlasticSynapticWeightSaturationCount,
        Self::GhostPopTableSearches,
        Self::FailedToReadBitFields,
        Self::EmptyRowReads,
        Self::DmaCompletes,
        Self::SpikeProcessingCount,
        Self::InvalidMasterPopHits,
    ];

    /// Word offset after the basic counters.
    #[must_use]
    pub const fn offset(self) -> usize {
        self as usize
    }
}

/// Number of population-specific provenance words.
pub const N_POPULATION_PROVENANCE_WORDS: usize = PopulationCounter::ALL.len();

/// Bit-field words needed to cover 256 atoms.
pub const WORDS_TO_COVER_256_ATOMS: u64 = 8;
