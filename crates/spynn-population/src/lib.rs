//! Host-side population cores for SpiNNaker-class neuromorphic machines.
//!
//! This crate sizes, describes and reads back the cores that simulate a
//! population of point neurons. The neural dynamics run in firmware; what
//! happens here is the bookkeeping either side of a run.
//!
//! # Flow
//!
//! ```text
//! PopulationVertex ──resources_required()──▶ ResourceContainer (per slice)
//!        │
//!        ├──generate_data_spec()──▶ DataSpecification (per core)
//!        │                              [machine runs]
//!        ├──get_spikes() / get_v() / get_gsyn() ◀── MemoryReader
//!        └──get_provenance_data()               ◀── MemoryReader
//! ```
//!
//! # Quick start
//!
//! ```
//! use spynn_population::prelude::*;
//!
//! # fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let config = SimulationConfig::new(1000, None, false)?.with_run_time_ms(1000.0)?;
//! let mut pop = PopulationVertex::lif_curr_exp("pop_1", 200, config)?;
//! pop.set_recording_spikes();
//!
//! let placements: Vec<_> = split_population(200, 100)?
//!     .into_iter()
//!     .zip(1..)
//!     .map(|(slice, p)| (Placement::new(slice, CoreLocation::new(0, 0, p)), None))
//!     .collect();
//! for (placement, _) in &placements {
//!     assert!(pop.fits_on_core(&placement.slice));
//! }
//! let specs = pop.generate_data_specs(&placements)?;
//! assert_eq!(specs.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! | Module | Role |
//! |--------|------|
//! | [`resources`] | CPU / DTCM / SDRAM estimation and the cost table |
//! | [`recording`] | Per-signal recorders and decoded recordings |
//! | [`provenance`] | Provenance block decoding |
//! | [`synapses`] | Synapse manager and incoming projections |
//! | [`models`] | Concrete neuron, input, threshold and synapse components |

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

mod capabilities;
mod config;
mod error;
pub mod models;
mod parameters;
pub mod provenance;
mod reader;
pub mod recording;
pub mod resources;
mod slice;
pub mod synapses;
mod vertex;

pub use capabilities::{
    ConductanceRecordable, PopulationInitializable, PopulationSettable, ProvidesProvenance,
    ReceivesBuffersToHost, SpikeRecordable, VoltageRecordable,
};
pub use config::{
    SimulationConfig, DEFAULT_MACHINE_TIME_STEP_US, ENV_MACHINE_TIME_STEP, ENV_TIME_SCALE_FACTOR,
};
pub use error::{PopulationError, Result};
pub use parameters::{
    parameter_bytes, ComponentCost, InputType, NeuronModel, NeuronParameter, ParameterAccess,
    ParameterValue, SynapseType, ThresholdType,
};
pub use provenance::{ProvenanceDataItem, ProvenanceSource};
pub use reader::{InMemoryReader, MemoryReader};
pub use recording::{AnalogRecording, AnalogSample, Recorder, Spike, SpikeRecording};
pub use resources::{CostTable, ModelCosts, ResourceContainer};
pub use slice::{
    atoms_per_core, split_population, AtomsPerCorePolicy, CoreLocation, Placement, VertexSlice,
};
pub use synapses::{IncomingProjection, SynapseManager};
pub use vertex::{PopulationComponents, PopulationVertex};

/// Commonly used types.
pub mod prelude {
    pub use crate::{
        split_population, ConductanceRecordable, CoreLocation, InMemoryReader, MemoryReader,
        ParameterValue, Placement, PopulationError, PopulationInitializable, PopulationSettable,
        PopulationVertex, ProvidesProvenance, Result, SimulationConfig, SpikeRecordable,
        VertexSlice, VoltageRecordable,
    };
}
