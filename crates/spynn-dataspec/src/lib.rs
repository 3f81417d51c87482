#![deny(unsafe_code)]

//! Data specifications for population cores
//!
//! A data specification is the ordered list of commands that describes one
//! core's memory image: which regions to reserve, and what to write into
//! them. The firmware reads those regions at fixed indices, so the order
//! and representation of every write is a binary contract.
//!
//! # Pipeline
//!
//! ```text
//! DataSpecificationGenerator ──end_specification()──▶ DataSpecification
//!        (checked commands)                              │        │
//!                                             to_bytes() │        │ execute()
//!                                                        ▼        ▼
//!                                             command stream   MemoryImage
//! ```
//!
//! # Example
//!
//! ```
//! use spynn_dataspec::{DataSpecificationGenerator, DataType};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut spec = DataSpecificationGenerator::new();
//! spec.reserve_memory_region(1, 8, Some("NeuronParams"), false)?;
//! spec.switch_write_focus(1)?;
//! spec.write_u32(3)?;
//! spec.write_value(-65.0, DataType::S1615)?;
//! let spec = spec.end_specification()?;
//!
//! let image = spec.execute()?;
//! let mut params = image.region(1).unwrap().reader();
//! assert_eq!(params.read_u32()?, 3);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

mod command;
mod data_type;
mod error;
mod executor;
mod generator;
mod regions;
mod specification;

pub use command::{
    Command, OPCODE_END_SPEC, OPCODE_RESERVE, OPCODE_SWITCH_FOCUS, OPCODE_WRITE,
    OPCODE_WRITE_ARRAY,
};
pub use data_type::DataType;
pub use error::{DataSpecError, Result};
pub use executor::{MemoryImage, RegionImage, RegionReader};
pub use generator::DataSpecificationGenerator;
pub use specification::DataSpecification;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{DataSpecError, DataSpecification, DataSpecificationGenerator, DataType, Result};
}
