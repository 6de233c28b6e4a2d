//! Partition geometry and ring-relative addressing
//!
//! All higher-level logic reasons in (sector, slot) coordinates; this module
//! owns the only arithmetic that turns those into device byte addresses.

use crate::error::{Result, RingError};
use crate::flash::Flash;
use crate::header::SECTOR_HEADER_SIZE;
use crate::slot::SLOT_STATUS_SIZE;

/// A (sector, slot) position within the ring
///
/// Sector indices are partition-relative (0 .. sector_count) and wrap; slot
/// indices run 0 .. slots_per_sector within a sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub sector: u32,
    pub slot: u32,
}

impl Location {
    pub const fn new(sector: u32, slot: u32) -> Self {
        Location { sector, slot }
    }
}

/// Immutable partition arithmetic, fixed at construction
///
/// Each sector holds an 8-byte header followed by `slots_per_sector` slots
/// of `SLOT_STATUS_SIZE + object_size` bytes; trailing bytes that do not fit
/// a whole slot are never touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    sector_size: u32,
    sector_offset: u32,
    sector_count: u32,
    object_size: u32,
    slots_per_sector: u32,
}

impl Geometry {
    /// Derive and validate the geometry for a partition
    pub fn new(
        sector_size: u32,
        sector_offset: u32,
        sector_count: u32,
        object_size: u32,
    ) -> Result<Self> {
        if object_size == 0 {
            return Err(RingError::Geometry("object size must be non-zero"));
        }
        if sector_count < 2 {
            return Err(RingError::Geometry(
                "ring needs at least two sectors (one is erase slack)",
            ));
        }
        if sector_size <= SECTOR_HEADER_SIZE {
            return Err(RingError::Geometry("sector smaller than its header"));
        }
        let entry = SLOT_STATUS_SIZE as u64 + object_size as u64;
        let slots_per_sector = ((sector_size - SECTOR_HEADER_SIZE) as u64 / entry) as u32;
        if slots_per_sector == 0 {
            return Err(RingError::Geometry("sector cannot hold a single slot"));
        }
        let end = (sector_offset as u64 + sector_count as u64) * sector_size as u64;
        if end > u32::MAX as u64 + 1 {
            return Err(RingError::Geometry("partition exceeds 32-bit address space"));
        }
        Ok(Geometry {
            sector_size,
            sector_offset,
            sector_count,
            object_size,
            slots_per_sector,
        })
    }

    /// Read the partition parameters off a device
    pub fn from_flash<F: Flash>(flash: &F, object_size: u32) -> Result<Self> {
        Geometry::new(
            flash.sector_size(),
            flash.sector_offset(),
            flash.sector_count(),
            object_size,
        )
    }

    pub fn sector_size(&self) -> u32 {
        self.sector_size
    }

    pub fn sector_offset(&self) -> u32 {
        self.sector_offset
    }

    pub fn sector_count(&self) -> u32 {
        self.sector_count
    }

    pub fn object_size(&self) -> u32 {
        self.object_size
    }

    pub fn slots_per_sector(&self) -> u32 {
        self.slots_per_sector
    }

    /// Bytes per slot entry (status word + payload)
    pub fn slot_entry_size(&self) -> u32 {
        SLOT_STATUS_SIZE + self.object_size
    }

    /// Total usable slots; one sector's worth is permanently erase slack
    pub fn capacity(&self) -> usize {
        self.slots_per_sector as usize * (self.sector_count as usize - 1)
    }

    /// Device byte address of a partition-relative sector
    pub fn sector_address(&self, sector: u32) -> u32 {
        (self.sector_offset + sector) * self.sector_size
    }

    /// Device byte address of a slot's status word
    pub fn slot_address(&self, loc: Location) -> u32 {
        self.sector_address(loc.sector) + SECTOR_HEADER_SIZE + loc.slot * self.slot_entry_size()
    }

    /// Device byte address of a slot's payload
    pub fn payload_address(&self, loc: Location) -> u32 {
        self.slot_address(loc) + SLOT_STATUS_SIZE
    }

    /// Ring successor of a sector
    pub fn next_sector(&self, sector: u32) -> u32 {
        (sector + 1) % self.sector_count
    }

    /// Ring successor of a slot, crossing the sector edge when needed
    pub fn next_slot(&self, loc: Location) -> Location {
        if loc.slot + 1 < self.slots_per_sector {
            Location::new(loc.sector, loc.slot + 1)
        } else {
            Location::new(self.next_sector(loc.sector), 0)
        }
    }

    /// Ring distance in whole sectors from `from` to `to`
    pub fn sector_distance(&self, from: u32, to: u32) -> u32 {
        (to + self.sector_count - from) % self.sector_count
    }
}
