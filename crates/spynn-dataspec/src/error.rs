//! Error types for data specification generation and execution

use crate::data_type::DataType;
use thiserror::Error;

/// Result type alias for data specification operations
pub type Result<T> = std::result::Result<T, DataSpecError>;

/// Errors raised while building, encoding or executing a data specification.
///
/// Every variant is fatal for the core being described: the caller must
/// discard the specification rather than persist a partial image.
#[derive(Debug, Error)]
pub enum DataSpecError {
    /// A write would run past the end of the focused region
    #[error("Region {region} overflow: {size} bytes reserved, {written} written, {requested} more requested")]
    RegionOverflow {
        /// Region index
        region: u8,
        /// Reserved size in bytes
        size: usize,
        /// Bytes already written
        written: usize,
        /// Bytes the rejected write needed
        requested: usize,
    },

    /// A write was issued before any region was focused
    #[error("Write issued with no region in focus")]
    NoWriteFocus,

    /// A command targeted a region that was never reserved
    #[error("Region {region} has not been reserved")]
    RegionNotReserved {
        /// Region index
        region: u8,
    },

    /// A region was reserved twice
    #[error("Region {region} is already reserved")]
    RegionAlreadyReserved {
        /// Region index
        region: u8,
    },

    /// Region index outside the core's region table
    #[error("Region index {region} out of range (max {max})")]
    InvalidRegion {
        /// Region index
        region: u8,
        /// Number of slots in the region table
        max: u8,
    },

    /// A reservation asked for zero bytes
    #[error("Region {region} reserved with zero size")]
    ZeroSizedRegion {
        /// Region index
        region: u8,
    },

    /// A reservation does not fit in the SDRAM left on the chip
    #[error("Region {region} of {size} bytes exceeds the {available} bytes of SDRAM left")]
    RegionTooLarge {
        /// Region index
        region: u8,
        /// Requested size in bytes
        size: usize,
        /// SDRAM not yet reserved by earlier regions
        available: usize,
    },

    /// A write targeted a region reserved as empty
    #[error("Region {region} is reserved empty and cannot be written")]
    EmptyRegionWrite {
        /// Region index
        region: u8,
    },

    /// Value cannot be represented in the requested data type
    #[error("Value {value} out of range for {data_type}")]
    ValueOutOfRange {
        /// Rejected value
        value: f64,
        /// Target data type
        data_type: DataType,
    },

    /// A command followed the end of the specification
    #[error("Command found after end of specification")]
    CommandAfterEnd,

    /// Binary specification is malformed
    #[error("Failed to parse data specification: {reason}")]
    ParseError {
        /// Reason for failure
        reason: String,
    },
}

impl DataSpecError {
    /// Create a parse error
    pub fn parse_error(reason: impl Into<String>) -> Self {
        Self::ParseError {
            reason: reason.into(),
        }
    }
}
