//! Population region indices.
//!
//! The neuron firmware locates each of its inputs through a region table
//! whose slots are compiled in. Index values are therefore a cross-system
//! contract and are never chosen on the host.
//!
//! ```text
//!  0  System            timing header, recording flags, recording sizes
//!  1  NeuronParams      key flag, key, n_neurons, globals, per-neuron blocks
//!  2  SynapseParams     ring-buffer shifts, per-neuron synapse parameters
//!  3  PopulationTable   master population table
//!  4  SynapticMatrix    rows written by the loader (reserved empty)
//!  5  SynapseDynamics   plasticity parameters (unused by static synapses)
//!  6  SpikeHistory      spike recording buffer (reserved empty)
//!  7  PotentialHistory  membrane voltage recording buffer (reserved empty)
//!  8  GsynHistory       synaptic conductance recording buffer (reserved empty)
//!  9  ProvenanceData    counters written by the core at the end of a run
//! ```

/// Largest number of regions a single core's region table can hold.
pub const MAX_MEMORY_REGIONS: u8 = 16;

/// Region slots used by population cores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum PopulationRegion {
    /// Timing header and recording configuration.
    System = 0,
    /// Neuron, input-type and threshold-type parameters.
    NeuronParams = 1,
    /// Synapse-type parameters.
    SynapseParams = 2,
    /// Master population table.
    PopulationTable = 3,
    /// Synaptic matrix rows.
    SynapticMatrix = 4,
    /// Synapse dynamics (plasticity) parameters.
    SynapseDynamics = 5,
    /// Spike recording buffer.
    SpikeHistory = 6,
    /// Membrane voltage recording buffer.
    PotentialHistory = 7,
    /// Synaptic conductance recording buffer.
    GsynHistory = 8,
    /// Provenance counters.
    ProvenanceData = 9,
}

impl PopulationRegion {
    /// Every population region in index order.
    pub const ALL: [Self; 10] = [
        Self::System,
        Self::NeuronParams,
        Self::SynapseParams,
        Self::PopulationTable,
        Self::SynapticMatrix,
        Self::SynapseDynamics,
        Self::SpikeHistory,
        Self::PotentialHistory,
        Self::GsynHistory,
        Self::ProvenanceData,
    ];

    /// Slot index in the core's region table.
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Label used in data specification reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::System => "System",
            Self::NeuronParams => "NeuronParams",
            Self::SynapseParams => "SynapseParams",
            Self::PopulationTable => "PopulationTable",
            Self::SynapticMatrix => "SynapticMatrix",
            Self::SynapseDynamics => "SynapseDynamics",
            Self::SpikeHistory => "spikeHistBuffer",
            Self::PotentialHistory => "vHistBuffer",
            Self::GsynHistory => "gsynHistBuffer",
            Self::ProvenanceData => "ProvenanceData",
        }
    }

    /// Look up a region by its slot index.
    #[must_use]
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|r| r.index() == index)
    }
}

impl std::fmt::Display for PopulationRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.label(), self.index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_unique_and_dense() {
        for (i, region) in PopulationRegion::ALL.iter().enumerate() {
            assert_eq!(usize::from(region.index()), i);
        }
    }

    #[test]
    fn indices_fit_region_table() {
        assert!(PopulationRegion::ALL
            .iter()
            .all(|r| r.index() < MAX_MEMORY_REGIONS));
    }

    #[test]
    fn from_index_round_trips() {
        assert_eq!(
            PopulationRegion::from_index(7),
            Some(PopulationRegion::PotentialHistory)
        );
        assert_eq!(PopulationRegion::from_index(12), None);
    }
}
