//! Sector header encode/parse
//!
//! The first 8 bytes of every formatted sector: the caller-supplied version
//! tag plus a CRC-32 over a fixed magic prefix and the tag bytes. A sector
//! whose stored CRC does not match is not "corrupt": it simply does not
//! carry a header (erased flash, foreign data, or a torn header write all
//! land here) and is classified unformatted by the scan.

/// Size of the on-media sector header in bytes
pub const SECTOR_HEADER_SIZE: u32 = 8;

/// Prefix mixed into the header CRC
///
/// Erased flash reads `0xFFFFFFFF` in both header words, and CRC-32 of four
/// `0xFF` bytes happens to be `0xFFFFFFFF`, so without the prefix a blank
/// sector would validate as a header for version `0xFFFFFFFF`.
pub const MAGIC: [u8; 4] = *b"ring";

fn header_crc(version: u32) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&MAGIC);
    hasher.update(&version.to_le_bytes());
    hasher.finalize()
}

/// Parsed sector header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorHeader {
    /// Caller-supplied on-media schema tag
    pub version: u32,
}

impl SectorHeader {
    pub fn new(version: u32) -> Self {
        SectorHeader { version }
    }

    /// Serialize to the 8-byte on-media form: version LE, then CRC-32 LE
    pub fn to_bytes(&self) -> [u8; SECTOR_HEADER_SIZE as usize] {
        let mut bytes = [0u8; SECTOR_HEADER_SIZE as usize];
        bytes[0..4].copy_from_slice(&self.version.to_le_bytes());
        bytes[4..8].copy_from_slice(&header_crc(self.version).to_le_bytes());
        bytes
    }

    /// Parse the 8-byte on-media form
    ///
    /// Returns `None` when the stored CRC does not cover the version bytes;
    /// erased flash (all `0xFF`) never parses.
    pub fn from_bytes(bytes: &[u8; SECTOR_HEADER_SIZE as usize]) -> Option<Self> {
        let version = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let stored = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        if header_crc(version) != stored {
            return None;
        }
        Some(SectorHeader { version })
    }

    /// Whether this header carries the expected version tag
    pub fn matches(&self, version: u32) -> bool {
        self.version == version
    }
}
