//! Slot status words
//!
//! Each slot starts with a 4-byte status word. The word values are chosen so
//! that every legal transition only clears bits, which is all NOR flash can
//! do without an erase: erased slots read `0xFFFFFFFF`, committing a record
//! clears the low half, discarding clears another byte.

use crate::error::{Result, RingError};

/// Size of the per-slot status word in bytes
pub const SLOT_STATUS_SIZE: u32 = 4;

/// State of a single record slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum SlotStatus {
    /// Erased, never programmed since the last sector erase
    Empty = 0xFFFF_FFFF,
    /// Payload programmed and committed
    Valid = 0xFFFF_0000,
    /// Consumed; skipped by fetch, reclaimed when the sector is erased
    Discarded = 0xFF00_0000,
}

impl SlotStatus {
    /// Parse a status word read off the media
    ///
    /// Anything but the three defined words means the slot bytes were
    /// manipulated outside the legal transitions.
    pub fn from_word(word: u32) -> Result<Self> {
        match word {
            0xFFFF_FFFF => Ok(SlotStatus::Empty),
            0xFFFF_0000 => Ok(SlotStatus::Valid),
            0xFF00_0000 => Ok(SlotStatus::Discarded),
            _ => Err(RingError::Corrupt("unknown slot status word")),
        }
    }

    /// The on-media LE encoding of this status
    pub fn to_bytes(self) -> [u8; SLOT_STATUS_SIZE as usize] {
        (self as u32).to_le_bytes()
    }
}
