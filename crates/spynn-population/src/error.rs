//! Error types for population operations

use crate::slice::{CoreLocation, VertexSlice};
use spynn_chip::PopulationRegion;
use spynn_dataspec::DataSpecError;
use thiserror::Error;

/// Result type alias for population operations
pub type Result<T> = std::result::Result<T, PopulationError>;

/// Errors raised by population vertices, recorders and decoders
#[derive(Debug, Error)]
pub enum PopulationError {
    /// Data specification construction failed; the core's image is discarded
    #[error("Data specification error: {source}")]
    DataSpec {
        /// Underlying construction error
        #[from]
        source: DataSpecError,
    },

    /// Bytes read back from a core disagree with the recorded configuration
    #[error("Data format error in {region} on {location}: {reason}")]
    DataFormat {
        /// Region being decoded
        region: PopulationRegion,
        /// Core the bytes came from
        location: CoreLocation,
        /// What did not match
        reason: String,
    },

    /// Parameter name not provided by any component of the population
    #[error("Population {population} does not have parameter {parameter}")]
    UnknownParameter {
        /// Population label
        population: String,
        /// Requested parameter
        parameter: String,
    },

    /// State variable the neuron model cannot initialise
    #[error("Population {population} does not support initialization of {variable}")]
    UnsupportedInitialization {
        /// Population label
        population: String,
        /// Requested state variable
        variable: String,
    },

    /// Parameter value shape does not match the population
    #[error("Population {population}: parameter {parameter} has {got} values, expected 1 or {expected}")]
    ParameterShape {
        /// Population label
        population: String,
        /// Parameter name
        parameter: String,
        /// Number of values supplied
        got: usize,
        /// Number of neurons
        expected: usize,
    },

    /// Extraction requested before any core was registered
    #[error("No placements registered for {signal} recording of {population}")]
    PlacementNotRegistered {
        /// Population label
        population: String,
        /// Signal name
        signal: &'static str,
    },

    /// Extraction of a signal that is not being recorded
    #[error("{population} is not recording {signal}")]
    NotRecording {
        /// Population label
        population: String,
        /// Signal name
        signal: &'static str,
    },

    /// Slice bounds are invalid
    #[error("Invalid slice {slice}: {reason}")]
    InvalidSlice {
        /// Offending slice
        slice: VertexSlice,
        /// Reason
        reason: String,
    },

    /// Atoms-per-core rounding policy rejected the division
    #[error("{n_atoms} atoms cannot be divided into {divisor} equal parts")]
    InvalidAtomsPerCore {
        /// Population size
        n_atoms: usize,
        /// Requested divisor
        divisor: usize,
    },

    /// Timing configuration is not supported
    #[error("Invalid timing configuration: {reason}")]
    InvalidTiming {
        /// Reason
        reason: String,
    },

    /// Reader capability failed to fetch a region
    #[error("Failed to read {region} on {location}: {reason}")]
    ReadFailed {
        /// Region requested
        region: PopulationRegion,
        /// Core requested
        location: CoreLocation,
        /// Reader-supplied reason
        reason: String,
    },
}

impl PopulationError {
    /// Create a data format error
    pub fn data_format(
        region: PopulationRegion,
        location: CoreLocation,
        reason: impl Into<String>,
    ) -> Self {
        Self::DataFormat {
            region,
            location,
            reason: reason.into(),
        }
    }

    /// Create a read failure
    pub fn read_failed(
        region: PopulationRegion,
        location: CoreLocation,
        reason: impl Into<String>,
    ) -> Self {
        Self::ReadFailed {
            region,
            location,
            reason: reason.into(),
        }
    }

    /// Create an invalid timing error
    pub fn invalid_timing(reason: impl Into<String>) -> Self {
        Self::InvalidTiming {
            reason: reason.into(),
        }
    }
}
