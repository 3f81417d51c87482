// SPDX-License-Identifier: AGPL-3.0-only

//! Reading regions back from cores
//!
//! Recorders and the provenance decoder fetch bytes through
//! [`MemoryReader`]. The machine-communication layer implements it against
//! real boards; [`InMemoryReader`] holds regions in host memory so that
//! extraction can be exercised in CI and from the CLI without hardware.

use crate::error::{PopulationError, Result};
use crate::slice::CoreLocation;
use bytes::Bytes;
use spynn_chip::PopulationRegion;
use spynn_dataspec::MemoryImage;
use std::collections::HashMap;
use std::fmt::Debug;
use tracing::debug;

/// Synchronous byte fetch of one region of one core
///
/// Retry and timeout policy belong to the implementor; a failed read is
/// surfaced as `ReadFailed` and never retried here.
pub trait MemoryReader: Debug + Send + Sync {
    /// Read the whole of `region` on `location`
    ///
    /// # Errors
    ///
    /// Returns `ReadFailed` if the region cannot be fetched.
    fn read_memory(&self, location: CoreLocation, region: PopulationRegion) -> Result<Bytes>;
}

/// Host-memory stand-in for a board
#[derive(Debug, Default, Clone)]
pub struct InMemoryReader {
    regions: HashMap<(CoreLocation, PopulationRegion), Bytes>,
}

impl InMemoryReader {
    /// Create an empty reader
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the contents of a region, replacing what was there
    pub fn insert(&mut self, location: CoreLocation, region: PopulationRegion, data: impl Into<Bytes>) {
        let data = data.into();
        debug!("Storing {} bytes for {} on {}", data.len(), region, location);
        self.regions.insert((location, region), data);
    }

    /// Store every region of an executed data specification
    ///
    /// Region indices the population layout does not know are skipped.
    pub fn load_image(&mut self, location: CoreLocation, image: &MemoryImage) {
        for (index, region) in image.regions() {
            if let Some(kind) = PopulationRegion::from_index(index) {
                self.insert(location, kind, region.data.clone());
            }
        }
    }

    /// Number of stored regions
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// True when nothing is stored
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

impl MemoryReader for InMemoryReader {
    fn read_memory(&self, location: CoreLocation, region: PopulationRegion) -> Result<Bytes> {
        self.regions
            .get(&(location, region))
            .cloned()
            .ok_or_else(|| PopulationError::read_failed(region, location, "region not present"))
    }
}
