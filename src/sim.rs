//! Flash device simulators
//!
//! `FlashSim` persists a NOR image in a regular file and is the reference
//! device for demos and integration tests; `MemFlash` keeps the image in
//! memory for unit tests, property tests, and fuzzing. Both model
//! erase-before-write flash: blank media reads `0xFF`, erasing a sector
//! resets it to `0xFF`, and programming can only clear bits.

use crate::error::{Result, RingError};
use crate::flash::Flash;
use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// File-backed NOR flash image
///
/// The file holds the raw device content, one byte per flash cell. The
/// handle owns the file; dropping the simulator closes it.
pub struct FlashSim {
    file: std::fs::File,
    path: PathBuf,
    sector_size: u32,
    total_sectors: u32,
    part_offset: u32,
    part_count: u32,
}

impl FlashSim {
    /// Create a blank image file, overwriting anything already at `path`
    pub fn create<P: AsRef<Path>>(path: P, sector_size: u32, sector_count: u32) -> Result<Self> {
        if sector_size == 0 || sector_count == 0 {
            return Err(RingError::Geometry("device needs non-empty sectors"));
        }
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;

        // Blank flash reads all ones
        let blank = vec![0xFFu8; sector_size as usize];
        for _ in 0..sector_count {
            file.write_all(&blank)?;
        }
        file.flush()?;

        Ok(FlashSim {
            file,
            path: path.as_ref().to_path_buf(),
            sector_size,
            total_sectors: sector_count,
            part_offset: 0,
            part_count: sector_count,
        })
    }

    /// Attach to an existing image file
    pub fn open<P: AsRef<Path>>(path: P, sector_size: u32, sector_count: u32) -> Result<Self> {
        if sector_size == 0 || sector_count == 0 {
            return Err(RingError::Geometry("device needs non-empty sectors"));
        }
        let file = OpenOptions::new().read(true).write(true).open(&path)?;

        let expected = sector_size as u64 * sector_count as u64;
        let actual = file.metadata()?.len();
        if actual != expected {
            return Err(RingError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Image is {} bytes, expected {}", actual, expected),
            )));
        }

        Ok(FlashSim {
            file,
            path: path.as_ref().to_path_buf(),
            sector_size,
            total_sectors: sector_count,
            part_offset: 0,
            part_count: sector_count,
        })
    }

    /// Expose only `count` sectors starting at `offset` through the
    /// [`Flash`] accessors, so a ring can own a sub-range of the device
    pub fn with_partition(mut self, offset: u32, count: u32) -> Result<Self> {
        if count == 0 || offset as u64 + count as u64 > self.total_sectors as u64 {
            return Err(RingError::Geometry("partition exceeds the device"));
        }
        self.part_offset = offset;
        self.part_count = count;
        Ok(self)
    }

    /// Path of the backing image file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn check_range(&self, addr: u32, len: usize) -> Result<()> {
        let device = self.sector_size as u64 * self.total_sectors as u64;
        if addr as u64 + len as u64 > device {
            return Err(RingError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Access at {:#x}+{} beyond device end {:#x}", addr, len, device),
            )));
        }
        Ok(())
    }
}

impl Flash for FlashSim {
    fn sector_size(&self) -> u32 {
        self.sector_size
    }

    fn sector_offset(&self) -> u32 {
        self.part_offset
    }

    fn sector_count(&self) -> u32 {
        self.part_count
    }

    fn erase_sector(&mut self, addr: u32) -> Result<()> {
        self.check_range(addr, 0)?;
        let aligned = addr - addr % self.sector_size;
        self.check_range(aligned, self.sector_size as usize)?;
        self.file.seek(SeekFrom::Start(aligned as u64))?;
        self.file.write_all(&vec![0xFFu8; self.sector_size as usize])?;
        self.file.flush()?;
        Ok(())
    }

    fn program(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        self.check_range(addr, data.len())?;
        let mut current = vec![0u8; data.len()];
        self.file.seek(SeekFrom::Start(addr as u64))?;
        self.file.read_exact(&mut current)?;
        // NOR programming can only clear bits
        for (cell, byte) in current.iter_mut().zip(data) {
            *cell &= byte;
        }
        self.file.seek(SeekFrom::Start(addr as u64))?;
        self.file.write_all(&current)?;
        self.file.flush()?;
        Ok(())
    }

    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        self.check_range(addr, buf.len())?;
        self.file.seek(SeekFrom::Start(addr as u64))?;
        self.file.read_exact(buf)?;
        Ok(())
    }
}

/// In-memory NOR flash with the same semantics as [`FlashSim`]
///
/// Starts blank (all `0xFF`). Handy wherever a throwaway device is needed
/// and file churn is not: unit tests, property tests, benches, fuzzing.
/// Cloning snapshots the image, so one prepared device can seed many runs.
#[derive(Clone)]
pub struct MemFlash {
    cells: Vec<u8>,
    sector_size: u32,
    total_sectors: u32,
    part_offset: u32,
    part_count: u32,
}

impl MemFlash {
    /// Create a blank in-memory device
    pub fn new(sector_size: u32, sector_count: u32) -> Self {
        MemFlash {
            cells: vec![0xFF; sector_size as usize * sector_count as usize],
            sector_size,
            total_sectors: sector_count,
            part_offset: 0,
            part_count: sector_count,
        }
    }

    /// Expose only `count` sectors starting at `offset` through the
    /// [`Flash`] accessors
    pub fn with_partition(mut self, offset: u32, count: u32) -> Result<Self> {
        if count == 0 || offset as u64 + count as u64 > self.total_sectors as u64 {
            return Err(RingError::Geometry("partition exceeds the device"));
        }
        self.part_offset = offset;
        self.part_count = count;
        Ok(self)
    }

    fn check_range(&self, addr: u32, len: usize) -> Result<()> {
        if addr as u64 + len as u64 > self.cells.len() as u64 {
            return Err(RingError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!(
                    "Access at {:#x}+{} beyond device end {:#x}",
                    addr,
                    len,
                    self.cells.len()
                ),
            )));
        }
        Ok(())
    }
}

impl Flash for MemFlash {
    fn sector_size(&self) -> u32 {
        self.sector_size
    }

    fn sector_offset(&self) -> u32 {
        self.part_offset
    }

    fn sector_count(&self) -> u32 {
        self.part_count
    }

    fn erase_sector(&mut self, addr: u32) -> Result<()> {
        self.check_range(addr, 0)?;
        let aligned = (addr - addr % self.sector_size) as usize;
        let end = aligned + self.sector_size as usize;
        self.check_range(aligned as u32, self.sector_size as usize)?;
        self.cells[aligned..end].fill(0xFF);
        Ok(())
    }

    fn program(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        self.check_range(addr, data.len())?;
        let start = addr as usize;
        for (cell, byte) in self.cells[start..start + data.len()].iter_mut().zip(data) {
            *cell &= byte;
        }
        Ok(())
    }

    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        self.check_range(addr, buf.len())?;
        let start = addr as usize;
        buf.copy_from_slice(&self.cells[start..start + buf.len()]);
        Ok(())
    }
}
