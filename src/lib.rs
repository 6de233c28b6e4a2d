//! Flashring - Circular Object Store for NOR Flash
//!
//! A circular, append-only store of fixed-size records over raw flash with
//! erase-before-write semantics. Records survive restarts: recovery rebuilds
//! the cursors purely from on-media content, with no separate journal.
//!
//! ## Features
//!
//! - **Bounded FIFO storage**: once the partition fills, appends reclaim the
//!   oldest sector instead of failing
//! - **Crash-consistent recovery**: [`Ring::scan`] reconstructs the read and
//!   write cursors from sector headers and slot status words alone
//! - **Erase-aware layout**: one erased sector of slack is kept ahead of the
//!   write frontier, so no append ever waits on a mid-stream erase
//! - **Single device seam**: everything below the engine is the three-method
//!   [`Flash`] trait; bring your own driver or use the bundled simulators
//! - **Restartable iteration**: [`Ring::fetch`] walks records oldest-first,
//!   [`Ring::rewind`] restarts the walk, [`Ring::discard`] consumes for good
//!
//! ## Example Usage
//!
//! ```rust
//! use flashring::{MemFlash, Ring};
//!
//! # fn main() -> flashring::Result<()> {
//! // A blank in-memory device: 16 sectors of 1 KiB, storing 16-byte records
//! let flash = MemFlash::new(1024, 16);
//! let mut ring = Ring::format(flash, 0x42, 16)?;
//!
//! ring.append(b"first record....")?;
//! ring.append(b"second record...")?;
//!
//! let mut record = [0u8; 16];
//! ring.fetch(&mut record)?;
//! assert_eq!(&record, b"first record....");
//!
//! // Consume the oldest record; fetch starts after it from now on
//! ring.discard()?;
//! ring.rewind();
//! ring.fetch(&mut record)?;
//! assert_eq!(&record, b"second record...");
//!
//! // A fresh scan over the same media recovers the cursors
//! let ring = Ring::scan(ring.into_flash(), 0x42, 16)?;
//! assert_eq!(ring.count_estimate(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## On-Media Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ Sector 0 (one erase unit)                   │
//! │  Header (8B):  version u32 | crc u32        │
//! │  Slot 0:       status u32  | payload        │
//! │  Slot 1:       status u32  | payload        │
//! │  ...           (slots_per_sector times)     │
//! ├─────────────────────────────────────────────┤
//! │ Sector 1 ... Sector N-1: same layout        │
//! │  Sectors form a ring; exactly one erased    │
//! │  sector trails the write frontier as slack  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Slot status words only ever clear bits, which is all NOR flash allows
//! between erases: `EMPTY (0xFFFFFFFF)` → `VALID (0xFFFF0000)` →
//! `DISCARDED (0xFF000000)`. The sector header CRC covers a fixed magic
//! prefix plus the version tag, so erased flash and foreign data never parse
//! as a header.
//!
//! ## Concurrency
//!
//! The engine is single-writer, single-reader-cursor and performs no
//! locking; wrap a [`Ring`] in a mutex when sharing it across threads.

pub mod error;
pub mod flash;
pub mod header;
pub mod layout;
pub mod ring;
mod scan;
pub mod sim;
pub mod slot;

// Re-export commonly used types
pub use error::{Result, RingError};
pub use flash::Flash;
pub use header::{SectorHeader, SECTOR_HEADER_SIZE};
pub use layout::{Geometry, Location};
pub use ring::Ring;
pub use sim::{FlashSim, MemFlash};
pub use slot::{SlotStatus, SLOT_STATUS_SIZE};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
