//! Region bookkeeping shared by the generator and the executor.

use crate::error::{DataSpecError, Result};
use spynn_chip::costs::SDRAM_PER_CHIP_BYTES;
use spynn_chip::regions::MAX_MEMORY_REGIONS;

#[derive(Debug, Clone)]
pub(crate) struct RegionSlot {
    pub size: usize,
    pub written: usize,
    pub empty: bool,
}

/// Reserved regions, the focused region and bytes written per region.
///
/// The sum of all reservations never exceeds one chip's SDRAM, which also
/// keeps every size within a 32-bit word.
#[derive(Debug, Clone, Default)]
pub(crate) struct RegionTable {
    slots: [Option<RegionSlot>; MAX_MEMORY_REGIONS as usize],
    focus: Option<u8>,
    reserved_bytes: usize,
}

impl RegionTable {
    fn check_index(region: u8) -> Result<()> {
        if region < MAX_MEMORY_REGIONS {
            Ok(())
        } else {
            Err(DataSpecError::InvalidRegion {
                region,
                max: MAX_MEMORY_REGIONS,
            })
        }
    }

    pub fn reserve(&mut self, region: u8, size: usize, empty: bool) -> Result<()> {
        Self::check_index(region)?;
        if size == 0 {
            return Err(DataSpecError::ZeroSizedRegion { region });
        }
        let available = SDRAM_PER_CHIP_BYTES - self.reserved_bytes;
        if size > available {
            return Err(DataSpecError::RegionTooLarge {
                region,
                size,
                available,
            });
        }
        let slot = &mut self.slots[usize::from(region)];
        if slot.is_some() {
            return Err(DataSpecError::RegionAlreadyReserved { region });
        }
        *slot = Some(RegionSlot {
            size,
            written: 0,
            empty,
        });
        self.reserved_bytes += size;
        Ok(())
    }

    pub fn focus(&mut self, region: u8) -> Result<()> {
        Self::check_index(region)?;
        let slot = self.slots[usize::from(region)]
            .as_ref()
            .ok_or(DataSpecError::RegionNotReserved { region })?;
        if slot.empty {
            return Err(DataSpecError::EmptyRegionWrite { region });
        }
        self.focus = Some(region);
        Ok(())
    }

    /// Claim `len` bytes in the focused region, returning (region, offset).
    pub fn claim(&mut self, len: usize) -> Result<(u8, usize)> {
        let region = self.focus.ok_or(DataSpecError::NoWriteFocus)?;
        let slot = self.slots[usize::from(region)]
            .as_mut()
            .ok_or(DataSpecError::RegionNotReserved { region })?;
        if slot.written + len > slot.size {
            return Err(DataSpecError::RegionOverflow {
                region,
                size: slot.size,
                written: slot.written,
                requested: len,
            });
        }
        let offset = slot.written;
        slot.written += len;
        Ok((region, offset))
    }

    pub fn slot(&self, region: u8) -> Option<&RegionSlot> {
        self.slots.get(usize::from(region)).and_then(Option::as_ref)
    }

    pub fn reserved(&self) -> impl Iterator<Item = (u8, &RegionSlot)> {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            // MAX_MEMORY_REGIONS fits in u8
            #[allow(clippy::cast_possible_truncation)]
            s.as_ref().map(|s| (i as u8, s))
        })
    }
}
