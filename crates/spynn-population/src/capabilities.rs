//! Optional capabilities of a population vertex
//!
//! The toolchain asks a vertex what it can do through these traits. A
//! vertex type states its capabilities by implementing them; there is no
//! runtime probing.

use crate::error::Result;
use crate::parameters::ParameterValue;
use crate::provenance::ProvenanceDataItem;
use crate::reader::MemoryReader;
use crate::recording::{AnalogRecording, SpikeRecording};
use crate::slice::{CoreLocation, VertexSlice};
use spynn_chip::PopulationRegion;

/// Vertex that can record spikes
pub trait SpikeRecordable {
    /// Whether spikes are recorded
    fn is_recording_spikes(&self) -> bool;

    /// Switch spike recording on
    fn set_recording_spikes(&mut self);

    /// Decode the spikes recorded over the whole run
    ///
    /// # Errors
    ///
    /// Returns an error if recording was never set up or a core's
    /// region is inconsistent with the recording configuration.
    fn get_spikes(&self, reader: &dyn MemoryReader) -> Result<SpikeRecording>;
}

/// Vertex that can record membrane voltage
pub trait VoltageRecordable {
    /// Whether voltage is recorded
    fn is_recording_v(&self) -> bool;

    /// Switch voltage recording on, sampling every `interval` ticks
    fn set_recording_v(&mut self, interval: u32);

    /// Decode the voltage recorded over the whole run
    ///
    /// # Errors
    ///
    /// As [`SpikeRecordable::get_spikes`].
    fn get_v(&self, reader: &dyn MemoryReader) -> Result<AnalogRecording>;
}

/// Vertex that can record synaptic conductance
pub trait ConductanceRecordable {
    /// Whether conductance is recorded
    fn is_recording_gsyn(&self) -> bool;

    /// Switch conductance recording on, sampling every `interval` ticks
    fn set_recording_gsyn(&mut self, interval: u32);

    /// Decode the conductance recorded over the whole run
    ///
    /// # Errors
    ///
    /// As [`SpikeRecordable::get_spikes`].
    fn get_gsyn(&self, reader: &dyn MemoryReader) -> Result<AnalogRecording>;
}

/// Vertex whose state variables can be given initial values
pub trait PopulationInitializable {
    /// Set the initial value of `variable`
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedInitialization` when the model has no such
    /// state variable.
    fn initialize(&mut self, variable: &str, value: ParameterValue) -> Result<()>;
}

/// Vertex whose model parameters can be read and changed by name
pub trait PopulationSettable {
    /// Current value of `name`
    ///
    /// # Errors
    ///
    /// Returns `UnknownParameter` if no component provides `name`.
    fn get_value(&self, name: &str) -> Result<ParameterValue>;

    /// Replace the value of `name`
    ///
    /// # Errors
    ///
    /// Returns `UnknownParameter` if no component provides `name`, or
    /// `ParameterShape` if a per-neuron list has the wrong length.
    fn set_value(&mut self, name: &str, value: ParameterValue) -> Result<()>;
}

/// Vertex that decodes provenance from its cores
pub trait ProvidesProvenance {
    /// Read and decode the provenance of the core at `location`
    ///
    /// # Errors
    ///
    /// Returns `ReadFailed` or `DataFormat`; abnormal counters are
    /// reported through the items, not as errors.
    fn get_provenance_data(
        &self,
        reader: &dyn MemoryReader,
        location: CoreLocation,
    ) -> Result<Vec<ProvenanceDataItem>>;
}

/// Vertex whose recordings can be streamed through bounded buffers
pub trait ReceivesBuffersToHost {
    /// Regions being recorded
    fn recorded_region_ids(&self) -> Vec<PopulationRegion>;

    /// Bytes each recorded region grows by per tick, on average
    fn buffered_sdram_per_timestep(&self, slice: &VertexSlice) -> usize;

    /// Smallest SDRAM the recording buffers of `slice` may be given
    fn minimum_buffer_sdram_usage(&self, slice: &VertexSlice) -> usize;

    /// Ticks that fit in `buffer_space` bytes; `None` when nothing is recorded
    fn n_timesteps_in_buffer_space(&self, slice: &VertexSlice, buffer_space: usize) -> Option<usize>;
}
