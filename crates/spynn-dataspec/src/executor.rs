//! Executing a specification into memory images.
//!
//! The executor replays a command stream exactly as the on-machine loader
//! would: reserve regions, follow focus switches, and lay each write down
//! at the region's write pointer. The result is one zero-filled buffer per
//! reserved region, which is what a core would find in SDRAM before its
//! first tick. Hosts use it to read parameters back and to check layouts.

use crate::command::Command;
use crate::data_type::DataType;
use crate::error::{DataSpecError, Result};
use crate::regions::RegionTable;
use crate::specification::DataSpecification;
use std::collections::BTreeMap;

/// Contents of one reserved region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionImage {
    /// Report label, if any
    pub label: Option<String>,
    /// Reserved but not pre-filled
    pub empty: bool,
    /// Bytes written by the specification
    pub written: usize,
    /// Region bytes, `len()` equal to the reserved size
    pub data: Vec<u8>,
}

impl RegionImage {
    /// Reserved size in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Typed reader positioned at the start of the region
    pub fn reader(&self) -> RegionReader<'_> {
        RegionReader {
            remaining: &self.data[..],
        }
    }
}

/// Sequential typed reads from a region image
#[derive(Debug)]
pub struct RegionReader<'a> {
    remaining: &'a [u8],
}

impl RegionReader<'_> {
    /// Read one value in `data_type`
    ///
    /// # Errors
    ///
    /// Returns a parse error past the end of the region.
    pub fn read(&mut self, data_type: DataType) -> Result<f64> {
        Ok(data_type.decode(data_type.get(&mut self.remaining)?))
    }

    /// Read one unsigned 32-bit word
    ///
    /// # Errors
    ///
    /// Returns a parse error past the end of the region.
    #[allow(clippy::cast_possible_truncation)]
    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(DataType::Uint32.get(&mut self.remaining)? as u32)
    }

    /// Read `count` values in `data_type`
    ///
    /// # Errors
    ///
    /// Returns a parse error past the end of the region.
    pub fn read_array(&mut self, count: usize, data_type: DataType) -> Result<Vec<f64>> {
        (0..count).map(|_| self.read(data_type)).collect()
    }

    /// Bytes not yet read
    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }
}

/// Memory images of every region a specification reserves
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryImage {
    regions: BTreeMap<u8, RegionImage>,
}

impl MemoryImage {
    /// Image of `region`, if reserved
    pub fn region(&self, region: u8) -> Option<&RegionImage> {
        self.regions.get(&region)
    }

    /// All regions in index order
    pub fn regions(&self) -> impl Iterator<Item = (u8, &RegionImage)> {
        self.regions.iter().map(|(i, r)| (*i, r))
    }

    /// Total reserved bytes
    pub fn total_bytes(&self) -> usize {
        self.regions.values().map(RegionImage::size).sum()
    }
}

impl DataSpecification {
    /// Replay the specification into per-region memory images
    ///
    /// # Errors
    ///
    /// Returns the same construction errors the generator enforces, plus
    /// `CommandAfterEnd` when commands follow the end marker.
    pub fn execute(&self) -> Result<MemoryImage> {
        let mut table = RegionTable::default();
        let mut image = MemoryImage::default();
        let mut ended = false;

        for command in self.commands() {
            if ended {
                return Err(DataSpecError::CommandAfterEnd);
            }
            match command {
                Command::ReserveRegion {
                    region,
                    size,
                    label,
                    empty,
                } => {
                    table.reserve(*region, *size, *empty)?;
                    image.regions.insert(
                        *region,
                        RegionImage {
                            label: label.clone(),
                            empty: *empty,
                            written: 0,
                            data: vec![0; *size],
                        },
                    );
                }
                Command::SwitchFocus { region } => table.focus(*region)?,
                Command::WriteValue { data_type, raw } => {
                    let (region, offset) = table.claim(data_type.size())?;
                    let mut bytes = Vec::with_capacity(data_type.size());
                    data_type.put(&mut bytes, *raw);
                    place(&mut image, region, offset, &bytes)?;
                }
                Command::WriteArray { data, .. } => {
                    let (region, offset) = table.claim(data.len())?;
                    place(&mut image, region, offset, data)?;
                }
                Command::Comment(_) => {}
                Command::End => ended = true,
            }
        }

        if !ended {
            return Err(DataSpecError::parse_error("missing end of specification"));
        }
        tracing::debug!(
            "Executed specification: {} regions, {} bytes",
            image.regions.len(),
            image.total_bytes()
        );
        Ok(image)
    }
}

fn place(image: &mut MemoryImage, region: u8, offset: usize, bytes: &[u8]) -> Result<()> {
    let target = image
        .regions
        .get_mut(&region)
        .ok_or(DataSpecError::RegionNotReserved { region })?;
    target.data[offset..offset + bytes.len()].copy_from_slice(bytes);
    target.written = offset + bytes.len();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DataSpecificationGenerator;

    #[test]
    fn writes_land_in_their_regions() {
        let mut spec = DataSpecificationGenerator::new();
        spec.reserve_memory_region(0, 8, None, false).unwrap();
        spec.reserve_memory_region(1, 8, None, false).unwrap();
        spec.switch_write_focus(1).unwrap();
        spec.write_u32(7).unwrap();
        spec.switch_write_focus(0).unwrap();
        spec.write_value(-1.5, DataType::S1615).unwrap();
        spec.switch_write_focus(1).unwrap();
        spec.write_u32(9).unwrap();
        let image = spec.end_specification().unwrap().execute().unwrap();

        let mut r1 = image.region(1).unwrap().reader();
        assert_eq!(r1.read_u32().unwrap(), 7);
        assert_eq!(r1.read_u32().unwrap(), 9);

        let mut r0 = image.region(0).unwrap().reader();
        assert!((r0.read(DataType::S1615).unwrap() + 1.5).abs() < f64::EPSILON);
        assert_eq!(r0.read_u32().unwrap(), 0);
        assert!(r0.read_u32().is_err());
    }

    #[test]
    fn empty_regions_are_zero_filled() {
        let mut spec = DataSpecificationGenerator::new();
        spec.reserve_memory_region(6, 16, None, true).unwrap();
        let image = spec.end_specification().unwrap().execute().unwrap();
        let region = image.region(6).unwrap();
        assert!(region.empty);
        assert_eq!(region.data, vec![0; 16]);
        assert_eq!(image.total_bytes(), 16);
    }
}
