//! Provenance decoding
//!
//! A core's provenance region is a fixed block of little-endian words:
//! the five basic counters followed by the application's own. Decoding
//! maps the block onto named records and turns each counter into a
//! [`ProvenanceDataItem`]. Abnormal counters are flagged `reportable` with
//! a message and logged at `warn`; they never fail decoding.

use crate::error::{PopulationError, Result};
use crate::reader::MemoryReader;
use crate::slice::CoreLocation;
use bytes::Buf;
use spynn_chip::provenance::{
    BasicCounter, PopulationCounter, N_BASIC_PROVENANCE_WORDS, N_POPULATION_PROVENANCE_WORDS,
    WORDS_TO_COVER_256_ATOMS,
};
use spynn_chip::{PopulationRegion, BYTES_PER_WORD};
use std::fmt;
use tracing::{debug, warn};

/// One decoded diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvenanceDataItem {
    /// Hierarchical name, core first
    pub names: Vec<String>,
    /// Counter value
    pub value: u64,
    /// Whether the value indicates a problem worth showing the user
    pub reportable: bool,
    /// Explanation and remedy, present for counters that can be reportable
    pub message: Option<String>,
}

impl ProvenanceDataItem {
    /// Final component of the name
    pub fn name(&self) -> &str {
        self.names.last().map_or("", String::as_str)
    }
}

impl fmt::Display for ProvenanceDataItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.names.join("/"), self.value)
    }
}

/// Where a provenance block came from
#[derive(Debug, Clone, Copy)]
pub struct ProvenanceSource<'a> {
    /// Vertex label
    pub label: &'a str,
    /// Core coordinates
    pub location: CoreLocation,
}

impl ProvenanceSource<'_> {
    fn names(&self, counter: &str) -> Vec<String> {
        let CoreLocation { x, y, p } = self.location;
        vec![format!("{x}_{y}_{p}_{}", self.label), counter.to_string()]
    }

    fn info(&self, counter: &str, value: u32) -> ProvenanceDataItem {
        ProvenanceDataItem {
            names: self.names(counter),
            value: u64::from(value),
            reportable: false,
            message: None,
        }
    }

    fn flagged(&self, counter: &str, value: u64, message: String) -> ProvenanceDataItem {
        ProvenanceDataItem {
            names: self.names(counter),
            value,
            reportable: value > 0,
            message: Some(message),
        }
    }
}

/// Counters every application core reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BasicProvenance {
    /// Outgoing packet queue full events
    pub transmission_event_overflow: u32,
    /// Callback queue overflows
    pub callback_queue_overloaded: u32,
    /// DMA queue overflows
    pub dma_queue_overloaded: u32,
    /// Timer ticks that overran
    pub timer_tick_overruns: u32,
    /// Largest number of ticks the timer fell behind by
    pub max_timer_tick_overrun: u32,
}

impl BasicProvenance {
    fn from_words(words: &[u32]) -> Self {
        let w = |c: BasicCounter| words[c.offset()];
        Self {
            transmission_event_overflow: w(BasicCounter::TransmissionEventOverflow),
            callback_queue_overloaded: w(BasicCounter::CallbackQueueOverloaded),
            dma_queue_overloaded: w(BasicCounter::DmaQueueOverloaded),
            timer_tick_overruns: w(BasicCounter::TimerTickOverrun),
            max_timer_tick_overrun: w(BasicCounter::MaxTimerTickOverrun),
        }
    }

    /// Diagnostic records, one per counter
    pub fn items(&self, source: &ProvenanceSource<'_>) -> Vec<ProvenanceDataItem> {
        let ProvenanceSource { label, location } = *source;
        vec![
            source.flagged(
                "Times_the_transmission_of_spikes_overran",
                self.transmission_event_overflow.into(),
                format!(
                    "The transmission buffer for {label} on {location} was blocked on {} \
                     occasions. The core is seeing back pressure from the fabric; spread \
                     the load over more cores or reduce the peak transmission rate.",
                    self.transmission_event_overflow
                ),
            ),
            source.flagged(
                "Times_the_callback_queue_was_overloaded",
                self.callback_queue_overloaded.into(),
                format!(
                    "The callback queue for {label} on {location} overloaded on {} \
                     occasions. Increase the machine time step or time_scale_factor, or \
                     decrease the number of neurons per core.",
                    self.callback_queue_overloaded
                ),
            ),
            source.flagged(
                "Times_the_dma_queue_was_overloaded",
                self.dma_queue_overloaded.into(),
                format!(
                    "The DMA queue for {label} on {location} overloaded on {} occasions. \
                     Increase the machine time step or time_scale_factor, or decrease the \
                     number of neurons per core.",
                    self.dma_queue_overloaded
                ),
            ),
            source.flagged(
                "Times_the_timer_tic_over_ran",
                self.timer_tick_overruns.into(),
                format!(
                    "A timer tick callback for {label} on {location} was still running \
                     when the next tick fired, {} times. Results are likely incorrect; \
                     increase the machine time step or time_scale_factor, or decrease the \
                     number of neurons per core.",
                    self.timer_tick_overruns
                ),
            ),
            source.flagged(
                "max_number_of_times_timer_tic_over_ran",
                self.max_timer_tick_overrun.into(),
                format!(
                    "The timer for {label} on {location} fell behind by up to {} ticks. \
                     Increase the machine time step or time_scale_factor, or decrease the \
                     number of neurons per core.",
                    self.max_timer_tick_overrun
                ),
            ),
        ]
    }
}

/// Counters written by population cores
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PopulationProvenance {
    /// Pre-synaptic events received
    pub pre_synaptic_event_count: u32,
    /// Ring-buffer weight saturations
    pub saturation_count: u32,
    /// Packets lost from the input buffer
    pub buffer_overflow_count: u32,
    /// Last tick the core ran to
    pub current_timer_tick: u32,
    /// Plastic weight saturations
    pub plastic_synaptic_weight_saturation_count: u32,
    /// Population table searches that found nothing
    pub ghost_pop_table_searches: u32,
    /// Bit-fields that did not fit in DTCM
    pub failed_to_read_bit_fields: u32,
    /// Synaptic rows read that were empty
    pub empty_row_reads: u32,
    /// DMA transfers completed
    pub dma_completes: u32,
    /// Spikes processed
    pub spike_processing_count: u32,
    /// Keys with no master population entry
    pub invalid_master_pop_hits: u32,
}

impl PopulationProvenance {
    fn from_words(words: &[u32]) -> Self {
        let w = |c: PopulationCounter| words[c.offset()];
        Self {
            pre_synaptic_event_count: w(PopulationCounter::PreSynapticEventCount),
            saturation_count: w(PopulationCounter::SaturationCount),
            buffer_overflow_count: w(PopulationCounter::BufferOverflowCount),
            current_timer_tick: w(PopulationCounter::CurrentTimerTick),
            plastic_synaptic_weight_saturation_count: w(
                PopulationCounter::PlasticSynapticWeightSaturationCount,
            ),
            ghost_pop_table_searches: w(PopulationCounter::GhostPopTableSearches),
            failed_to_read_bit_fields: w(PopulationCounter::FailedToReadBitFields),
            empty_row_reads: w(PopulationCounter::EmptyRowReads),
            dma_completes: w(PopulationCounter::DmaCompletes),
            spike_processing_count: w(PopulationCounter::SpikeProcessingCount),
            invalid_master_pop_hits: w(PopulationCounter::InvalidMasterPopHits),
        }
    }

    /// Diagnostic records, one per counter
    pub fn items(&self, source: &ProvenanceSource<'_>) -> Vec<ProvenanceDataItem> {
        let ProvenanceSource { label, location } = *source;
        let extra_words =
            u64::from(self.failed_to_read_bit_fields) * WORDS_TO_COVER_256_ATOMS;
        vec![
            source.info("Total_pre_synaptic_events", self.pre_synaptic_event_count),
            source.flagged(
                "Times_synaptic_weights_have_saturated",
                self.saturation_count.into(),
                format!(
                    "The weights from the synapses for {label} on {location} saturated {} \
                     times. If this causes issues increase spikes_per_second and/or \
                     ring_buffer_sigma.",
                    self.saturation_count
                ),
            ),
            source.flagged(
                "Times_the_input_buffer_lost_packets",
                self.buffer_overflow_count.into(),
                format!(
                    "The input buffer for {label} on {location} lost packets on {} \
                     occasions. The system is probably running too quickly for the number \
                     of neurons per core; increase the time step or time_scale_factor, or \
                     decrease the number of neurons per core.",
                    self.buffer_overflow_count
                ),
            ),
            source.info("Last_timer_tic_the_core_ran_to", self.current_timer_tick),
            source.flagged(
                "Times_plastic_synaptic_weights_have_saturated",
                self.plastic_synaptic_weight_saturation_count.into(),
                format!(
                    "The weights from the plastic synapses for {label} on {location} \
                     saturated {} times. If this causes issues increase spikes_per_second \
                     and/or ring_buffer_sigma.",
                    self.plastic_synaptic_weight_saturation_count
                ),
            ),
            source.flagged(
                "Number of failed pop table searches",
                self.ghost_pop_table_searches.into(),
                format!(
                    "The number of failed population table searches for {label} on \
                     {location} was {}. If this is large relative to the expected incoming \
                     spike rate, increase source and target neurons per core.",
                    self.ghost_pop_table_searches
                ),
            ),
            source.flagged(
                "N bit fields not able to be read into DTCM",
                self.failed_to_read_bit_fields.into(),
                format!(
                    "The redundant-DMA filter for {label} on {location} could not be fully \
                     built: {} bit-fields were not read, needing up to {extra_words} \
                     extra words of DTCM (at 256 atoms per core). Reduce neurons per core, \
                     buffer sizes or per-neuron parameters.",
                    self.failed_to_read_bit_fields
                ),
            ),
            source.flagged(
                "N rows read that were empty",
                self.empty_row_reads.into(),
                format!(
                    "DMA reads of the synaptic matrix for {label} on {location} fetched {} \
                     empty rows, slowing the neurons down. Increase source and target \
                     neurons per core.",
                    self.empty_row_reads
                ),
            ),
            source.info("DMA's that were completed", self.dma_completes),
            source.info("how many spikes were processed", self.spike_processing_count),
            source.flagged(
                "Invalid Master Pop hits",
                self.invalid_master_pop_hits.into(),
                format!(
                    "{} keys received by {label} on {location} had no master population \
                     entry. This is an error, most likely caused by bad routing.",
                    self.invalid_master_pop_hits
                ),
            ),
        ]
    }
}

/// A provenance region split into its basic and application parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvenanceBlock {
    /// Common counters
    pub basic: BasicProvenance,
    /// Application counters, positional
    pub extra: Vec<u32>,
}

impl ProvenanceBlock {
    /// Parse a block holding `n_extra` application counters
    ///
    /// # Errors
    ///
    /// Returns `DataFormat` unless the block is exactly
    /// `(5 + n_extra)` words long.
    pub fn parse(mut data: &[u8], n_extra: usize, location: CoreLocation) -> Result<Self> {
        let expected = (N_BASIC_PROVENANCE_WORDS + n_extra) * BYTES_PER_WORD;
        if data.len() != expected {
            return Err(PopulationError::data_format(
                PopulationRegion::ProvenanceData,
                location,
                format!(
                    "{} bytes read, expected {expected} for {n_extra} extra counters",
                    data.len()
                ),
            ));
        }
        let mut words = Vec::with_capacity(expected / BYTES_PER_WORD);
        while data.has_remaining() {
            words.push(data.get_u32_le());
        }
        let extra = words.split_off(N_BASIC_PROVENANCE_WORDS);
        Ok(Self {
            basic: BasicProvenance::from_words(&words),
            extra,
        })
    }
}

/// Report reportable items at `warn`
fn log_reportable(items: &[ProvenanceDataItem]) {
    for item in items.iter().filter(|i| i.reportable) {
        if let Some(message) = &item.message {
            warn!("{}", message);
        }
    }
}

/// Decode a population core's provenance block
///
/// # Errors
///
/// Returns `DataFormat` when the block is not exactly 16 words long.
pub fn decode_population_provenance(
    data: &[u8],
    source: &ProvenanceSource<'_>,
) -> Result<Vec<ProvenanceDataItem>> {
    let block = ProvenanceBlock::parse(data, N_POPULATION_PROVENANCE_WORDS, source.location)?;
    let population = PopulationProvenance::from_words(&block.extra);

    let mut items = block.basic.items(source);
    items.extend(population.items(source));
    debug!(
        "Decoded {} provenance items for {} on {}",
        items.len(),
        source.label,
        source.location
    );
    log_reportable(&items);
    Ok(items)
}

/// Read and decode a population core's provenance region
///
/// # Errors
///
/// Returns `ReadFailed` from the reader or `DataFormat` from decoding.
pub fn read_population_provenance(
    reader: &dyn MemoryReader,
    source: &ProvenanceSource<'_>,
) -> Result<Vec<ProvenanceDataItem>> {
    let data = reader.read_memory(source.location, PopulationRegion::ProvenanceData)?;
    decode_population_provenance(&data, source)
}
