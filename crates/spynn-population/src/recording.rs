//! Recording of spikes, membrane voltage and synaptic conductance
//!
//! One [`Recorder`] per signal. A recorder is switched on before data
//! specification generation, sizes its region for the whole run, learns
//! which core holds which slice, and finally decodes the region each core
//! filled.
//!
//! ## Region format
//!
//! ```text
//! +----------------+---------------------+-----+---------------------+
//! | bytes_written  | record 0            | ... | record n-1          |
//! +----------------+---------------------+-----+---------------------+
//!   u32 LE           spikes: ceil(n/32) bit-field words
//!                    analog: u32 timestep + n × S1615
//! ```
//!
//! A record is taken every `sampling_interval` ticks, so a run of `t`
//! ticks holds `ceil(t / interval)` records.

use crate::error::{PopulationError, Result};
use crate::reader::MemoryReader;
use crate::resources::{CostTable, RecordingCost};
use crate::slice::{CoreLocation, Placement, VertexSlice};
use bytes::Buf;
use spynn_chip::recording::{
    analog_record_bytes, n_records, spike_record_bytes, spike_words, NEURONS_PER_SPIKE_WORD,
    RECORDING_HEADER_BYTES,
};
use spynn_chip::system::{RECORD_GSYN_BIT, RECORD_SPIKE_BIT, RECORD_STATE_BIT};
use spynn_chip::PopulationRegion;
use spynn_dataspec::DataType;
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use tracing::{debug, info};

/// A recordable signal and its firmware contract
pub trait SignalKind: fmt::Debug + Send + Sync + 'static {
    /// Name used in errors and logs
    const NAME: &'static str;
    /// Region the firmware records into
    const REGION: PopulationRegion;
    /// Bit in the recording flags word
    const FLAG: u32;

    /// Bytes of one record for `n_atoms` neurons
    fn record_bytes(n_atoms: usize) -> usize;

    /// Cycles per neuron per tick while recording
    fn cpu_cycles_per_neuron(table: &CostTable) -> u64;

    /// DTCM while recording
    fn dtcm_bytes(table: &CostTable) -> usize;
}

/// Spike trains
#[derive(Debug, Clone, Copy)]
pub struct Spikes;

/// Membrane voltage
#[derive(Debug, Clone, Copy)]
pub struct Voltage;

/// Synaptic conductance (or current)
#[derive(Debug, Clone, Copy)]
pub struct Conductance;

impl SignalKind for Spikes {
    const NAME: &'static str = "spikes";
    const REGION: PopulationRegion = PopulationRegion::SpikeHistory;
    const FLAG: u32 = RECORD_SPIKE_BIT;

    fn record_bytes(n_atoms: usize) -> usize {
        spike_record_bytes(n_atoms)
    }

    fn cpu_cycles_per_neuron(table: &CostTable) -> u64 {
        table.spike_recorder_cpu_cycles_per_neuron
    }

    fn dtcm_bytes(_table: &CostTable) -> usize {
        0
    }
}

impl SignalKind for Voltage {
    const NAME: &'static str = "v";
    const REGION: PopulationRegion = PopulationRegion::PotentialHistory;
    const FLAG: u32 = RECORD_STATE_BIT;

    fn record_bytes(n_atoms: usize) -> usize {
        analog_record_bytes(n_atoms)
    }

    fn cpu_cycles_per_neuron(table: &CostTable) -> u64 {
        table.analog_recorder_cpu_cycles_per_neuron
    }

    fn dtcm_bytes(table: &CostTable) -> usize {
        table.analog_recorder_dtcm_bytes
    }
}

impl SignalKind for Conductance {
    const NAME: &'static str = "gsyn";
    const REGION: PopulationRegion = PopulationRegion::GsynHistory;
    const FLAG: u32 = RECORD_GSYN_BIT;

    fn record_bytes(n_atoms: usize) -> usize {
        analog_record_bytes(n_atoms)
    }

    fn cpu_cycles_per_neuron(table: &CostTable) -> u64 {
        table.analog_recorder_cpu_cycles_per_neuron
    }

    fn dtcm_bytes(table: &CostTable) -> usize {
        table.analog_recorder_dtcm_bytes
    }
}

/// One spike
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Spike {
    /// Population-relative neuron index
    pub neuron_id: usize,
    /// Tick the spike was recorded in
    pub timestep: u32,
}

impl Spike {
    /// Spike time in ms
    pub fn time_ms(&self, time_step_ms: f64) -> f64 {
        f64::from(self.timestep) * time_step_ms
    }
}

/// Decoded spike recording of a population
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpikeRecording {
    /// Population label
    pub label: String,
    /// Spikes sorted by neuron then time
    pub spikes: Vec<Spike>,
}

impl SpikeRecording {
    /// Total number of spikes
    pub fn len(&self) -> usize {
        self.spikes.len()
    }

    /// True when no neuron fired
    pub fn is_empty(&self) -> bool {
        self.spikes.is_empty()
    }

    /// Spike ticks of one neuron
    pub fn spike_train(&self, neuron_id: usize) -> Vec<u32> {
        self.spikes
            .iter()
            .filter(|s| s.neuron_id == neuron_id)
            .map(|s| s.timestep)
            .collect()
    }
}

/// One analog sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalogSample {
    /// Population-relative neuron index
    pub neuron_id: usize,
    /// Tick the sample was taken in
    pub timestep: u32,
    /// Value in model units (mV or µS)
    pub value: f64,
}

/// Decoded voltage or conductance recording of a population
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalogRecording {
    /// Population label
    pub label: String,
    /// Samples sorted by neuron then time
    pub samples: Vec<AnalogSample>,
}

impl AnalogRecording {
    /// `(timestep, value)` pairs of one neuron
    pub fn series(&self, neuron_id: usize) -> Vec<(u32, f64)> {
        self.samples
            .iter()
            .filter(|s| s.neuron_id == neuron_id)
            .map(|s| (s.timestep, s.value))
            .collect()
    }
}

/// Recording state for one signal of one population
#[derive(Debug, Clone)]
pub struct Recorder<K: SignalKind> {
    recording: bool,
    sampling_interval: u32,
    placements: BTreeMap<VertexSlice, CoreLocation>,
    _kind: PhantomData<K>,
}

impl<K: SignalKind> Default for Recorder<K> {
    fn default() -> Self {
        Self {
            recording: false,
            sampling_interval: 1,
            placements: BTreeMap::new(),
            _kind: PhantomData,
        }
    }
}

/// Records the region holds after decoding its header
struct RecordedRegion {
    slice: VertexSlice,
    location: CoreLocation,
    records: bytes::Bytes,
}

impl<K: SignalKind> Recorder<K> {
    /// Create a recorder that is not recording
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the signal is recorded
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Switch recording on or off
    pub fn set_recording(&mut self, recording: bool) {
        debug!("{} recording {}", K::NAME, if recording { "on" } else { "off" });
        self.recording = recording;
    }

    /// Ticks between records; zero is treated as one
    pub fn set_sampling_interval(&mut self, interval: u32) {
        self.sampling_interval = interval.max(1);
    }

    /// Ticks between records
    pub fn sampling_interval(&self) -> u32 {
        self.sampling_interval
    }

    /// Bit this recorder contributes to the flags word, zero when off
    pub fn flag(&self) -> u32 {
        if self.recording {
            K::FLAG
        } else {
            0
        }
    }

    /// Bytes of the recording region; zero when not recording
    pub fn sdram_usage_bytes(&self, n_atoms: usize, n_timesteps: usize) -> usize {
        if !self.recording {
            return 0;
        }
        RECORDING_HEADER_BYTES
            + n_records(n_timesteps, self.sampling_interval as usize) * K::record_bytes(n_atoms)
    }

    /// Remember which core holds `placement.slice`
    pub fn register_placement(&mut self, placement: &Placement) {
        self.placements.insert(placement.slice, placement.location);
    }

    /// Forget every registered core
    pub fn clear_placements(&mut self) {
        self.placements.clear();
    }

    /// Registered `(slice, core)` pairs in slice order
    pub fn placements(&self) -> impl Iterator<Item = (&VertexSlice, &CoreLocation)> {
        self.placements.iter()
    }

    /// Read and validate every registered core's region
    fn read_regions(
        &self,
        label: &str,
        reader: &dyn MemoryReader,
        n_timesteps: usize,
    ) -> Result<Vec<RecordedRegion>> {
        if !self.recording {
            return Err(PopulationError::NotRecording {
                population: label.to_string(),
                signal: K::NAME,
            });
        }
        if self.placements.is_empty() {
            return Err(PopulationError::PlacementNotRegistered {
                population: label.to_string(),
                signal: K::NAME,
            });
        }

        let mut regions = Vec::with_capacity(self.placements.len());
        for (&slice, &location) in &self.placements {
            let mut data = reader.read_memory(location, K::REGION)?;
            let expected = self.sdram_usage_bytes(slice.n_atoms(), n_timesteps);
            if data.len() != expected {
                return Err(PopulationError::data_format(
                    K::REGION,
                    location,
                    format!(
                        "{} bytes read but {} recording of {} neurons over {} ticks needs {}",
                        data.len(),
                        K::NAME,
                        slice.n_atoms(),
                        n_timesteps,
                        expected
                    ),
                ));
            }

            let written = data.get_u32_le() as usize;
            let record_bytes = K::record_bytes(slice.n_atoms());
            if written > data.len() || written % record_bytes != 0 {
                return Err(PopulationError::data_format(
                    K::REGION,
                    location,
                    format!(
                        "{written} bytes recorded is not a whole number of {record_bytes}-byte \
                         records within {} bytes",
                        data.len()
                    ),
                ));
            }
            data.truncate(written);
            debug!(
                "{} of {} on {}: {} records",
                K::NAME,
                slice,
                location,
                written / record_bytes
            );
            regions.push(RecordedRegion {
                slice,
                location,
                records: data,
            });
        }
        Ok(regions)
    }
}

impl Recorder<Spikes> {
    /// Decode the spikes of every registered core
    ///
    /// # Errors
    ///
    /// Returns `NotRecording` or `PlacementNotRegistered` for a recorder
    /// that was never set up, `ReadFailed` from the reader, and
    /// `DataFormat` when a region's length disagrees with the recording
    /// configuration.
    pub fn get_spikes(
        &self,
        label: &str,
        reader: &dyn MemoryReader,
        n_timesteps: usize,
    ) -> Result<SpikeRecording> {
        let mut spikes = Vec::new();
        for region in self.read_regions(label, reader, n_timesteps)? {
            let words = spike_words(region.slice.n_atoms());
            let mut records = region.records;
            let mut index = 0u32;
            while records.has_remaining() {
                let timestep = index * self.sampling_interval;
                for word in 0..words {
                    let mut bits = records.get_u32_le();
                    while bits != 0 {
                        let bit = bits.trailing_zeros() as usize;
                        bits &= bits - 1;
                        let neuron = word * NEURONS_PER_SPIKE_WORD + bit;
                        // padding bits past the slice end are ignored
                        if neuron < region.slice.n_atoms() {
                            spikes.push(Spike {
                                neuron_id: region.slice.lo_atom() + neuron,
                                timestep,
                            });
                        }
                    }
                }
                index += 1;
            }
        }
        spikes.sort_unstable();
        info!("Extracted {} spikes from {}", spikes.len(), label);
        Ok(SpikeRecording {
            label: label.to_string(),
            spikes,
        })
    }
}

/// Analog decoding shared by voltage and conductance
fn decode_analog<K: SignalKind>(
    recorder: &Recorder<K>,
    label: &str,
    reader: &dyn MemoryReader,
    n_timesteps: usize,
) -> Result<AnalogRecording> {
    let mut samples = Vec::new();
    for region in recorder.read_regions(label, reader, n_timesteps)? {
        let mut records = region.records;
        while records.has_remaining() {
            let timestep = records.get_u32_le();
            for neuron in region.slice.atoms() {
                let raw = DataType::S1615
                    .get(&mut records)
                    .map_err(|e| PopulationError::data_format(K::REGION, region.location, e.to_string()))?;
                samples.push(AnalogSample {
                    neuron_id: neuron,
                    timestep,
                    value: DataType::S1615.decode(raw),
                });
            }
        }
    }
    samples.sort_by(|a, b| (a.neuron_id, a.timestep).cmp(&(b.neuron_id, b.timestep)));
    info!("Extracted {} {} samples from {}", samples.len(), K::NAME, label);
    Ok(AnalogRecording {
        label: label.to_string(),
        samples,
    })
}

impl Recorder<Voltage> {
    /// Decode membrane voltage of every registered core
    ///
    /// # Errors
    ///
    /// As for spike extraction.
    pub fn get_v(
        &self,
        label: &str,
        reader: &dyn MemoryReader,
        n_timesteps: usize,
    ) -> Result<AnalogRecording> {
        decode_analog(self, label, reader, n_timesteps)
    }
}

impl Recorder<Conductance> {
    /// Decode synaptic conductance of every registered core
    ///
    /// # Errors
    ///
    /// As for spike extraction.
    pub fn get_gsyn(
        &self,
        label: &str,
        reader: &dyn MemoryReader,
        n_timesteps: usize,
    ) -> Result<AnalogRecording> {
        decode_analog(self, label, reader, n_timesteps)
    }
}

impl<K: SignalKind> RecordingCost for Recorder<K> {
    fn cpu_overhead(&self, table: &CostTable, n_atoms: usize) -> u64 {
        if self.recording {
            K::cpu_cycles_per_neuron(table) * n_atoms as u64
        } else {
            0
        }
    }

    fn dtcm_overhead(&self, table: &CostTable) -> usize {
        if self.recording {
            K::dtcm_bytes(table)
        } else {
            0
        }
    }

    fn sdram_usage_bytes(&self, n_atoms: usize, n_timesteps: usize) -> usize {
        Recorder::<K>::sdram_usage_bytes(self, n_atoms, n_timesteps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::InMemoryReader;
    use bytes::{BufMut, BytesMut};

    fn placement(lo: usize, hi: usize, p: u32) -> Placement {
        let slice = VertexSlice::new(lo, hi).expect("Invalid slice");
        Placement::new(slice, CoreLocation::new(0, 0, p))
    }

    fn spike_region(n_atoms: usize, n_timesteps: usize, fired: &[(usize, usize)]) -> BytesMut {
        let words = spike_words(n_atoms);
        let mut records = vec![0u32; words * n_timesteps];
        for &(neuron, t) in fired {
            records[t * words + neuron / 32] |= 1 << (neuron % 32);
        }
        let mut buf = BytesMut::new();
        buf.put_u32_le((records.len() * 4) as u32);
        for w in records {
            buf.put_u32_le(w);
        }
        buf
    }

    #[test]
    fn not_recording_uses_no_sdram() {
        let rec = Recorder::<Voltage>::new();
        for (n, t) in [(0, 0), (1, 1), (256, 10_000)] {
            assert_eq!(rec.sdram_usage_bytes(n, t), 0);
        }
        assert_eq!(rec.flag(), 0);
    }

    #[test]
    fn region_size_follows_sampling_interval() {
        let mut rec = Recorder::<Spikes>::new();
        rec.set_recording(true);
        assert_eq!(rec.sdram_usage_bytes(33, 10), 4 + 10 * 8);
        rec.set_sampling_interval(3);
        assert_eq!(rec.sdram_usage_bytes(33, 10), 4 + 4 * 8);

        let mut v = Recorder::<Voltage>::new();
        v.set_recording(true);
        assert_eq!(v.sdram_usage_bytes(10, 5), 4 + 5 * (4 + 40));
        assert_eq!(v.flag(), RECORD_STATE_BIT);
    }

    #[test]
    fn spikes_decode_with_slice_offset() {
        let mut rec = Recorder::<Spikes>::new();
        rec.set_recording(true);
        let p = placement(100, 139, 2);
        rec.register_placement(&p);

        let mut reader = InMemoryReader::new();
        reader.insert(
            p.location,
            PopulationRegion::SpikeHistory,
            spike_region(40, 5, &[(0, 4), (35, 1), (0, 2)]).freeze(),
        );

        let spikes = rec.get_spikes("pop", &reader, 5).expect("Failed to extract spikes");
        assert_eq!(
            spikes.spikes,
            vec![
                Spike { neuron_id: 100, timestep: 2 },
                Spike { neuron_id: 100, timestep: 4 },
                Spike { neuron_id: 135, timestep: 1 },
            ]
        );
        assert_eq!(spikes.spike_train(100), vec![2, 4]);
    }

    #[test]
    fn partially_filled_region_decodes_written_records_only() {
        let mut rec = Recorder::<Spikes>::new();
        rec.set_recording(true);
        let p = placement(0, 9, 1);
        rec.register_placement(&p);

        let mut region = spike_region(10, 4, &[(3, 0), (4, 3)]);
        // only the first two records were flushed
        region[..4].copy_from_slice(&8u32.to_le_bytes());
        let mut reader = InMemoryReader::new();
        reader.insert(p.location, PopulationRegion::SpikeHistory, region.freeze());

        let spikes = rec.get_spikes("pop", &reader, 4).expect("Failed to extract spikes");
        assert_eq!(spikes.len(), 1);
    }

    #[test]
    fn short_buffer_is_a_format_error() {
        let mut rec = Recorder::<Spikes>::new();
        rec.set_recording(true);
        let p = placement(0, 9, 1);
        rec.register_placement(&p);

        let mut region = spike_region(10, 4, &[]);
        region.truncate(region.len() - 4);
        let mut reader = InMemoryReader::new();
        reader.insert(p.location, PopulationRegion::SpikeHistory, region.freeze());

        let err = rec.get_spikes("pop", &reader, 4);
        assert!(matches!(err, Err(PopulationError::DataFormat { .. })));
    }

    #[test]
    fn bad_written_count_is_a_format_error() {
        let mut rec = Recorder::<Spikes>::new();
        rec.set_recording(true);
        let p = placement(0, 9, 1);
        rec.register_placement(&p);

        let mut region = spike_region(10, 4, &[]);
        region[..4].copy_from_slice(&6u32.to_le_bytes());
        let mut reader = InMemoryReader::new();
        reader.insert(p.location, PopulationRegion::SpikeHistory, region.freeze());

        assert!(matches!(
            rec.get_spikes("pop", &reader, 4),
            Err(PopulationError::DataFormat { .. })
        ));
    }

    #[test]
    fn cleared_placements_are_forgotten() {
        let mut rec = Recorder::<Spikes>::new();
        rec.set_recording(true);
        rec.register_placement(&placement(0, 31, 1));
        rec.register_placement(&placement(32, 63, 2));
        rec.clear_placements();
        assert_eq!(rec.placements().count(), 0);

        let whole = placement(0, 63, 1);
        rec.register_placement(&whole);
        let mut reader = InMemoryReader::new();
        reader.insert(
            whole.location,
            PopulationRegion::SpikeHistory,
            spike_region(64, 3, &[(40, 2)]).freeze(),
        );
        let spikes = rec.get_spikes("pop", &reader, 3).expect("Failed to extract spikes");
        assert_eq!(spikes.spike_train(40), vec![2]);
    }

    #[test]
    fn extraction_requires_setup() {
        let reader = InMemoryReader::new();
        let mut rec = Recorder::<Spikes>::new();
        assert!(matches!(
            rec.get_spikes("pop", &reader, 1),
            Err(PopulationError::NotRecording { .. })
        ));
        rec.set_recording(true);
        assert!(matches!(
            rec.get_spikes("pop", &reader, 1),
            Err(PopulationError::PlacementNotRegistered { .. })
        ));
    }

    #[test]
    fn voltage_samples_decode() {
        let mut rec = Recorder::<Voltage>::new();
        rec.set_recording(true);
        let p = placement(5, 6, 3);
        rec.register_placement(&p);

        let mut buf = BytesMut::new();
        buf.put_u32_le(2 * 12);
        for t in 0..2u32 {
            buf.put_u32_le(t);
            for v in [-65.0, -64.5] {
                let raw = DataType::S1615.encode(v).expect("Value out of range");
                DataType::S1615.put(&mut buf, raw);
            }
        }
        let mut reader = InMemoryReader::new();
        reader.insert(p.location, PopulationRegion::PotentialHistory, buf.freeze());

        let v = rec.get_v("pop", &reader, 2).expect("Failed to extract voltage");
        assert_eq!(v.samples.len(), 4);
        assert_eq!(v.series(6), vec![(0, -64.5), (1, -64.5)]);
    }
}
