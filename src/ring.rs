//! Ring store engine
//!
//! The main object: a circular, append-only store of fixed-size records
//! over a flash partition. All state beyond the three cursors lives on the
//! media; recovery rebuilds the cursors from sector headers and slot
//! statuses alone.

use crate::error::{Result, RingError};
use crate::flash::Flash;
use crate::header::{SectorHeader, SECTOR_HEADER_SIZE};
use crate::layout::{Geometry, Location};
use crate::scan::{choose_cursors, summarize_slots, SectorClass};
use crate::slot::{SlotStatus, SLOT_STATUS_SIZE};
use std::fmt::Write as _;

/// Circular fixed-record store over a flash partition
///
/// The ring owns its device. Records are appended at the `write` cursor,
/// iterated from the `cursor` position, and consumed oldest-first at the
/// `read` cursor. When the partition fills up, appends reclaim the oldest
/// sector; the store never rejects an append for lack of space.
///
/// Single writer, single reader-cursor; wrap an instance in a lock for
/// shared use.
pub struct Ring<F: Flash> {
    flash: F,
    geometry: Geometry,
    version: u32,
    read: Location,
    write: Location,
    cursor: Location,
}

impl<F: Flash> Ring<F> {
    /// Recover a ring from whatever the media already holds
    ///
    /// Reads every sector header and slot status, never writing or erasing
    /// anything. Fails with [`RingError::Unformatted`] when no sector
    /// carries a matching header (format first) and with
    /// [`RingError::Corrupt`] when the slot statuses could not have been
    /// produced by this engine.
    pub fn scan(flash: F, version: u32, object_size: u32) -> Result<Self> {
        let geometry = Geometry::from_flash(&flash, object_size)?;
        let origin = Location::new(0, 0);
        let mut ring = Ring {
            flash,
            geometry,
            version,
            read: origin,
            write: origin,
            cursor: origin,
        };
        let (read, write) = ring.scan_media()?;
        ring.read = read;
        ring.write = write;
        ring.cursor = read;
        tracing::debug!(
            "Scan recovered read=({}, {}) write=({}, {})",
            read.sector,
            read.slot,
            write.sector,
            write.slot
        );
        Ok(ring)
    }

    /// Erase the whole partition and start empty
    ///
    /// Destructive counterpart of [`Ring::scan`]: every sector is erased,
    /// sector 0 gets a fresh header, and all cursors start at its slot 0.
    pub fn format(flash: F, version: u32, object_size: u32) -> Result<Self> {
        let geometry = Geometry::from_flash(&flash, object_size)?;
        let origin = Location::new(0, 0);
        let mut ring = Ring {
            flash,
            geometry,
            version,
            read: origin,
            write: origin,
            cursor: origin,
        };
        tracing::info!(
            "Formatting {} sectors of {} bytes for version {:#x}",
            geometry.sector_count(),
            geometry.sector_size(),
            version
        );
        for sector in 0..geometry.sector_count() {
            ring.flash.erase_sector(geometry.sector_address(sector))?;
        }
        ring.program_header(0)?;
        Ok(ring)
    }

    /// Total usable slots; one sector's worth stays erased as slack
    pub fn capacity(&self) -> usize {
        self.geometry.capacity()
    }

    /// Records between the read and write cursors, O(1) and I/O-free
    ///
    /// Counts the slots the cursors span, so it is an upper bound on
    /// [`count_exact`](Ring::count_exact); in normal operation the two
    /// agree.
    pub fn count_estimate(&self) -> usize {
        let g = &self.geometry;
        let sectors = g.sector_distance(self.read.sector, self.write.sector) as usize;
        sectors * g.slots_per_sector() as usize + self.write.slot as usize
            - self.read.slot as usize
    }

    /// Records between the read and write cursors, counted off the media
    pub fn count_exact(&mut self) -> Result<usize> {
        let mut n = 0;
        let mut loc = self.read;
        while loc != self.write {
            if self.read_status(loc)? == SlotStatus::Valid {
                n += 1;
            }
            loc = self.geometry.next_slot(loc);
        }
        Ok(n)
    }

    /// Append one record
    ///
    /// Never fails for lack of space: when the ring is full the oldest
    /// sector is erased and its records are gone. Device errors propagate
    /// immediately and leave the cursors untouched.
    pub fn append(&mut self, payload: &[u8]) -> Result<()> {
        let g = self.geometry;
        if payload.len() != g.object_size() as usize {
            return Err(RingError::PayloadSize {
                expected: g.object_size(),
                got: payload.len(),
            });
        }

        // First write into a sector: make sure it carries our header
        if self.write.slot == 0 {
            self.prepare_sector(self.write.sector)?;
        }
        // Keep one erased sector of slack ahead of the write frontier
        self.ensure_next_free()?;

        // Payload first, status last; the status word is the commit point
        self.flash.program(g.payload_address(self.write), payload)?;
        self.program_status(self.write, SlotStatus::Valid)?;
        self.write = g.next_slot(self.write);
        Ok(())
    }

    /// Copy the record under the fetch cursor into `buf` and advance
    ///
    /// Skips discarded slots. Fails with [`RingError::Empty`] once the
    /// cursor reaches the write frontier; [`rewind`](Ring::rewind) restarts
    /// the iteration at the oldest live record.
    pub fn fetch(&mut self, buf: &mut [u8]) -> Result<()> {
        let g = self.geometry;
        if buf.len() != g.object_size() as usize {
            return Err(RingError::PayloadSize {
                expected: g.object_size(),
                got: buf.len(),
            });
        }
        while self.cursor != self.write {
            let loc = self.cursor;
            if self.read_status(loc)? == SlotStatus::Valid {
                self.flash.read(g.payload_address(loc), buf)?;
                self.cursor = g.next_slot(loc);
                return Ok(());
            }
            self.cursor = g.next_slot(loc);
        }
        Err(RingError::Empty)
    }

    /// Reset the fetch cursor to the oldest live record
    pub fn rewind(&mut self) {
        self.cursor = self.read;
    }

    /// Mark the oldest record consumed and advance the read cursor
    ///
    /// One slot per call; never erases. The fetch cursor is dragged along
    /// when it pointed at the discarded slot, so it can never fall behind
    /// the read cursor.
    pub fn discard(&mut self) -> Result<()> {
        if self.read == self.write {
            return Err(RingError::Empty);
        }
        let old = self.read;
        self.program_status(old, SlotStatus::Discarded)?;
        self.read = self.geometry.next_slot(old);
        if self.cursor == old {
            self.cursor = self.read;
        }
        Ok(())
    }

    /// Render geometry, cursors, and per-sector summaries
    ///
    /// Diagnostic only; the output format carries no compatibility promise.
    /// Unlike [`Ring::scan`], damaged slot words are counted, not fatal.
    pub fn dump(&mut self) -> Result<String> {
        let g = self.geometry;
        let mut out = String::new();
        let _ = writeln!(
            out,
            "ring version={:#x} sectors={}x{}B slots={}x{}B capacity={}",
            self.version,
            g.sector_count(),
            g.sector_size(),
            g.slots_per_sector(),
            g.object_size(),
            g.capacity()
        );
        let _ = writeln!(
            out,
            "read=({}, {}) cursor=({}, {}) write=({}, {})",
            self.read.sector,
            self.read.slot,
            self.cursor.sector,
            self.cursor.slot,
            self.write.sector,
            self.write.slot
        );
        for sector in 0..g.sector_count() {
            match self.read_header(sector)? {
                Some(header) if header.matches(self.version) => {
                    let (mut discarded, mut valid, mut empty, mut damaged) = (0, 0, 0, 0);
                    for slot in 0..g.slots_per_sector() {
                        let word = self.read_status_word(Location::new(sector, slot))?;
                        match SlotStatus::from_word(word) {
                            Ok(SlotStatus::Discarded) => discarded += 1,
                            Ok(SlotStatus::Valid) => valid += 1,
                            Ok(SlotStatus::Empty) => empty += 1,
                            Err(_) => damaged += 1,
                        }
                    }
                    let _ = write!(
                        out,
                        "sector {:>3}: {}D {}V {}E",
                        sector, discarded, valid, empty
                    );
                    if damaged > 0 {
                        let _ = write!(out, " {}?", damaged);
                    }
                    let _ = writeln!(out);
                }
                Some(header) => {
                    let _ = writeln!(
                        out,
                        "sector {:>3}: foreign (version {:#x})",
                        sector, header.version
                    );
                }
                None => {
                    let _ = writeln!(out, "sector {:>3}: unformatted", sector);
                }
            }
        }
        Ok(out)
    }

    /// Oldest live record position
    pub fn read_position(&self) -> Location {
        self.read
    }

    /// Next fetch position
    pub fn fetch_position(&self) -> Location {
        self.cursor
    }

    /// Write frontier position
    pub fn write_position(&self) -> Location {
        self.write
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Hand the device back, consuming the ring
    pub fn into_flash(self) -> F {
        self.flash
    }

    fn scan_media(&mut self) -> Result<(Location, Location)> {
        let g = self.geometry;
        let mut classes = Vec::with_capacity(g.sector_count() as usize);
        for sector in 0..g.sector_count() {
            classes.push(self.classify_sector(sector)?);
        }
        choose_cursors(&classes, g.slots_per_sector(), self.version)
    }

    fn classify_sector(&mut self, sector: u32) -> Result<SectorClass> {
        match self.read_header(sector)? {
            Some(header) if header.matches(self.version) => {}
            _ => return Ok(SectorClass::Unformatted),
        }
        let g = self.geometry;
        let mut statuses = Vec::with_capacity(g.slots_per_sector() as usize);
        for slot in 0..g.slots_per_sector() {
            statuses.push(self.read_status(Location::new(sector, slot))?);
        }
        Ok(SectorClass::Formatted(summarize_slots(statuses)?))
    }

    /// Erase-and-format the sector unless it already carries our header
    fn prepare_sector(&mut self, sector: u32) -> Result<()> {
        let mut bytes = [0u8; SECTOR_HEADER_SIZE as usize];
        self.flash
            .read(self.geometry.sector_address(sector), &mut bytes)?;
        if SectorHeader::from_bytes(&bytes).is_some_and(|h| h.matches(self.version)) {
            return Ok(());
        }
        if bytes == [0xFF; SECTOR_HEADER_SIZE as usize] {
            tracing::debug!("Formatting blank sector {} at the write frontier", sector);
        } else {
            tracing::warn!("Sector {} carries an unrecognized header, reclaiming it", sector);
        }
        self.flash.erase_sector(self.geometry.sector_address(sector))?;
        self.program_header(sector)
    }

    /// Keep the sector after the write frontier erased and formatted
    ///
    /// When it still holds records this is the overwrite-oldest step: the
    /// read and fetch cursors are pushed out before the erase.
    fn ensure_next_free(&mut self) -> Result<()> {
        let g = self.geometry;
        let next = g.next_sector(self.write.sector);
        if self.sector_free(next)? {
            return Ok(());
        }
        tracing::debug!("Reclaiming sector {} ahead of the write frontier", next);
        let after = Location::new(g.next_sector(next), 0);
        if self.read.sector == next {
            self.read = after;
        }
        if self.cursor.sector == next {
            self.cursor = after;
        }
        self.flash.erase_sector(g.sector_address(next))?;
        self.program_header(next)
    }

    /// Formatted with a blank slot 0, i.e. ready to be written into
    fn sector_free(&mut self, sector: u32) -> Result<bool> {
        match self.read_header(sector)? {
            Some(header) if header.matches(self.version) => {}
            _ => return Ok(false),
        }
        Ok(self.read_status(Location::new(sector, 0))? == SlotStatus::Empty)
    }

    fn read_header(&mut self, sector: u32) -> Result<Option<SectorHeader>> {
        let mut bytes = [0u8; SECTOR_HEADER_SIZE as usize];
        self.flash
            .read(self.geometry.sector_address(sector), &mut bytes)?;
        Ok(SectorHeader::from_bytes(&bytes))
    }

    fn program_header(&mut self, sector: u32) -> Result<()> {
        let bytes = SectorHeader::new(self.version).to_bytes();
        self.flash
            .program(self.geometry.sector_address(sector), &bytes)
    }

    fn read_status_word(&mut self, loc: Location) -> Result<u32> {
        let mut bytes = [0u8; SLOT_STATUS_SIZE as usize];
        self.flash.read(self.geometry.slot_address(loc), &mut bytes)?;
        Ok(u32::from_le_bytes(bytes))
    }

    fn read_status(&mut self, loc: Location) -> Result<SlotStatus> {
        SlotStatus::from_word(self.read_status_word(loc)?)
    }

    fn program_status(&mut self, loc: Location, status: SlotStatus) -> Result<()> {
        self.flash
            .program(self.geometry.slot_address(loc), &status.to_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::MemFlash;

    fn tiny_ring() -> Ring<MemFlash> {
        // 64-byte sectors, 4-byte records: 7 slots per sector
        Ring::format(MemFlash::new(64, 4), 0x42, 4).unwrap()
    }

    #[test]
    fn test_format_starts_at_origin() {
        let ring = tiny_ring();
        assert_eq!(ring.read_position(), Location::new(0, 0));
        assert_eq!(ring.write_position(), Location::new(0, 0));
        assert_eq!(ring.fetch_position(), Location::new(0, 0));
        assert_eq!(ring.capacity(), 21);
        assert_eq!(ring.count_estimate(), 0);
    }

    #[test]
    fn test_append_fetch_round_trip() {
        let mut ring = tiny_ring();
        ring.append(&1u32.to_le_bytes()).unwrap();
        ring.append(&2u32.to_le_bytes()).unwrap();

        let mut buf = [0u8; 4];
        ring.fetch(&mut buf).unwrap();
        assert_eq!(u32::from_le_bytes(buf), 1);
        ring.fetch(&mut buf).unwrap();
        assert_eq!(u32::from_le_bytes(buf), 2);
        assert!(matches!(ring.fetch(&mut buf), Err(RingError::Empty)));
    }

    #[test]
    fn test_payload_size_checked() {
        let mut ring = tiny_ring();
        assert!(matches!(
            ring.append(&[0u8; 3]),
            Err(RingError::PayloadSize { expected: 4, got: 3 })
        ));
        let mut short = [0u8; 2];
        assert!(matches!(
            ring.fetch(&mut short),
            Err(RingError::PayloadSize { .. })
        ));
    }

    #[test]
    fn test_discard_empty_ring() {
        let mut ring = tiny_ring();
        assert!(matches!(ring.discard(), Err(RingError::Empty)));
    }

    #[test]
    fn test_dump_mentions_every_sector() {
        let mut ring = tiny_ring();
        ring.append(&7u32.to_le_bytes()).unwrap();
        let dump = ring.dump().unwrap();
        assert!(dump.contains("sector   0"));
        assert!(dump.contains("sector   3"));
        assert!(dump.contains("write=(0, 1)"));
    }

    #[test]
    fn test_into_flash_returns_device() {
        let ring = tiny_ring();
        let flash = ring.into_flash();
        assert_eq!(flash.sector_count(), 4);
    }
}
