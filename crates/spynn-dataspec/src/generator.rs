//! Data specification generator.
//!
//! Builds the command stream for one core, checking every command as it
//! is issued: regions must be reserved before they are focused, writes go
//! to the focused region and may not run past its reserved size.
//!
//! The generator is consumed by [`DataSpecificationGenerator::end_specification`].
//! Any error leaves the caller holding a generator it should simply drop,
//! so no partially valid specification ever escapes.

use crate::command::Command;
use crate::data_type::DataType;
use crate::error::Result;
use crate::regions::RegionTable;
use crate::specification::DataSpecification;
use bytes::BytesMut;
use tracing::{debug, trace};

/// Builder for one core's data specification
#[derive(Debug, Default)]
pub struct DataSpecificationGenerator {
    commands: Vec<Command>,
    regions: RegionTable,
}

impl DataSpecificationGenerator {
    /// Start an empty specification
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a report-only comment
    pub fn comment(&mut self, text: impl Into<String>) {
        self.commands.push(Command::Comment(text.into()));
    }

    /// Reserve `size` bytes for `region`, rounded up to a whole word
    ///
    /// # Errors
    ///
    /// Fails for an out-of-range index, a zero size, a second reservation
    /// of the same region, or a size beyond the SDRAM the earlier
    /// reservations left on the chip.
    pub fn reserve_memory_region(
        &mut self,
        region: u8,
        size: usize,
        label: Option<&str>,
        empty: bool,
    ) -> Result<()> {
        // sizes too large to round are rejected by the table
        let size = size.checked_next_multiple_of(4).unwrap_or(usize::MAX);
        let label = label.map(str::to_owned);
        self.regions.reserve(region, size, empty)?;
        debug!("Reserved region {} ({} bytes, empty={})", region, size, empty);
        self.commands.push(Command::ReserveRegion {
            region,
            size,
            label,
            empty,
        });
        Ok(())
    }

    /// Direct following writes at `region`
    ///
    /// # Errors
    ///
    /// Fails if the region is not reserved or was reserved empty.
    pub fn switch_write_focus(&mut self, region: u8) -> Result<()> {
        self.regions.focus(region)?;
        self.commands.push(Command::SwitchFocus { region });
        Ok(())
    }

    /// Write one value in `data_type` to the focused region
    ///
    /// # Errors
    ///
    /// Fails with no focus, on overflow, or when the value does not fit
    /// the data type.
    pub fn write_value(&mut self, value: f64, data_type: DataType) -> Result<()> {
        let raw = data_type.encode(value)?;
        let (region, offset) = self.regions.claim(data_type.size())?;
        trace!("region {region} +{offset}: {data_type} {value}");
        self.commands.push(Command::WriteValue { data_type, raw });
        Ok(())
    }

    /// Write one unsigned 32-bit word to the focused region
    ///
    /// # Errors
    ///
    /// As [`write_value`](Self::write_value).
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.write_value(f64::from(value), DataType::Uint32)
    }

    /// Write a block of values in `data_type` to the focused region
    ///
    /// The block is encoded completely before any space is claimed, so a
    /// rejected value leaves the region untouched.
    ///
    /// # Errors
    ///
    /// As [`write_value`](Self::write_value).
    pub fn write_array(&mut self, values: &[f64], data_type: DataType) -> Result<()> {
        let mut data = BytesMut::with_capacity(values.len() * data_type.size());
        for &value in values {
            data_type.put(&mut data, data_type.encode(value)?);
        }
        let (region, offset) = self.regions.claim(data.len())?;
        trace!(
            "region {region} +{offset}: {} x {data_type}",
            values.len()
        );
        self.commands.push(Command::WriteArray {
            data_type,
            data: data.freeze(),
        });
        Ok(())
    }

    /// Bytes still free in `region`, if reserved
    pub fn bytes_remaining(&self, region: u8) -> Option<usize> {
        self.regions.slot(region).map(|s| s.size - s.written)
    }

    /// Finish the specification
    ///
    /// # Errors
    ///
    /// Currently infallible; kept fallible so callers treat the end of a
    /// specification as a checked step.
    pub fn end_specification(mut self) -> Result<DataSpecification> {
        for (region, slot) in self.regions.reserved() {
            if !slot.empty && slot.written < slot.size {
                debug!(
                    "Region {} left {} of {} bytes unwritten",
                    region,
                    slot.size - slot.written,
                    slot.size
                );
            }
        }
        self.commands.push(Command::End);
        Ok(DataSpecification::new(self.commands))
    }
}
