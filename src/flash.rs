//! Device capability interface consumed by the ring store

use crate::error::Result;

/// Raw flash device exposed to the ring store.
///
/// Addresses are absolute device byte addresses. The partition owned by a
/// ring is `sector_count()` erase units of `sector_size()` bytes each,
/// starting at sector index `sector_offset()` of the device.
///
/// Implementations must model erase-before-write flash: `erase_sector`
/// resets a whole erase unit to `0xFF`, and `program` may only clear bits
/// (`1 -> 0`). The store never retries a failed call and assumes a repeated
/// call after an error is safe.
pub trait Flash {
    /// Bytes per erase unit
    fn sector_size(&self) -> u32;

    /// First device sector index belonging to the partition
    fn sector_offset(&self) -> u32;

    /// Number of sectors in the partition
    fn sector_count(&self) -> u32;

    /// Erase the sector containing `addr`, resetting it to `0xFF`
    fn erase_sector(&mut self, addr: u32) -> Result<()>;

    /// Program `data` at `addr`, clearing bits only
    fn program(&mut self, addr: u32, data: &[u8]) -> Result<()>;

    /// Read `buf.len()` bytes starting at `addr`
    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<()>;
}
