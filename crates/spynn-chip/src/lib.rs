//! Firmware contract tables for population cores.
//!
//! This crate has **no dependencies** and **no machine access**. It is the
//! host-side copy of everything the compiled neuron firmware expects to find
//! at fixed places: region indices, the system-region word layout, recording
//! flag bits, base cost constants, recording buffer formats and the ordered
//! provenance counters.
//!
//! Changing anything here without rebuilding the firmware produces images
//! the cores will misread.
//!
//! # Crate organisation
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`regions`] | Population region indices and labels |
//! | [`system`] | System region layout, recording flag bits, magic sentinel |
//! | [`costs`] | Base CPU / DTCM / SDRAM costs and per-core capacities |
//! | [`recording`] | Recording buffer header and record widths |
//! | [`provenance`] | Ordered basic and population provenance counters |

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod costs;
pub mod provenance;
pub mod recording;
pub mod regions;
pub mod system;

pub use regions::PopulationRegion;

/// Bytes per machine word.
pub const BYTES_PER_WORD: usize = 4;
