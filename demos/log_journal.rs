//! Log Journal Demo
//!
//! A persistent device log journal on top of the flash ring store:
//! - Fixed 16-byte log records encoded with serde + bincode
//! - A journal partition owning the back four sectors of a larger device
//! - Scan-or-format startup, append/fetch/discard/rewind walkthrough
//!
//! Run it twice: the second run recovers the records the first one left
//! behind.
//!
//! Run with: cargo run --example log_journal

use anyhow::{ensure, Context, Result};
use flashring::{FlashSim, Ring, RingError};
use serde::{Deserialize, Serialize};
use std::path::Path;

const SECTOR_SIZE: u32 = 1024;
const TOTAL_SECTORS: u32 = 16;
const PARTITION_OFFSET: u32 = 8;
const PARTITION_SECTORS: u32 = 4;
const JOURNAL_VERSION: u32 = 0x4A31;
const RECORD_SIZE: u32 = 16;

/// One journal entry: a severity level and a short message.
///
/// bincode's default fixed-width integer encoding makes this exactly 16
/// bytes on media: 4 for the level, 12 for the message.
#[derive(Debug, Serialize, Deserialize)]
struct LogRecord {
    level: u32,
    message: [u8; 12],
}

impl LogRecord {
    fn new(level: u32, text: &str) -> Self {
        let mut message = [b' '; 12];
        let bytes = text.as_bytes();
        let n = bytes.len().min(12);
        message[..n].copy_from_slice(&bytes[..n]);
        LogRecord { level, message }
    }

    fn text(&self) -> String {
        String::from_utf8_lossy(&self.message).trim_end().to_string()
    }
}

/// Attach to the journal partition, recovering existing records when the
/// image holds a compatible journal and formatting otherwise
fn open_journal(path: &Path) -> Result<Ring<FlashSim>> {
    if path.exists() {
        let sim = FlashSim::open(path, SECTOR_SIZE, TOTAL_SECTORS)
            .context("attaching to existing flash image")?
            .with_partition(PARTITION_OFFSET, PARTITION_SECTORS)?;
        match Ring::scan(sim, JOURNAL_VERSION, RECORD_SIZE) {
            Ok(ring) => {
                println!(
                    "   ✓ Found existing journal, usage: {}/{}",
                    ring.count_estimate(),
                    ring.capacity()
                );
                return Ok(ring);
            }
            Err(RingError::Unformatted(_)) => {
                println!("   No journal on the partition, formatting");
            }
            Err(e) => return Err(e).context("scanning journal partition"),
        }
    } else {
        println!("   No image yet, creating a blank device");
    }

    let sim = FlashSim::create(path, SECTOR_SIZE, TOTAL_SECTORS)
        .context("creating flash image")?
        .with_partition(PARTITION_OFFSET, PARTITION_SECTORS)?;
    let ring = Ring::format(sim, JOURNAL_VERSION, RECORD_SIZE)?;
    println!(
        "   ✓ Formatted {} sectors at offset {}",
        PARTITION_SECTORS, PARTITION_OFFSET
    );
    Ok(ring)
}

fn append_record(ring: &mut Ring<FlashSim>, record: &LogRecord) -> Result<()> {
    let bytes = bincode::serialize(record)?;
    ensure!(
        bytes.len() == RECORD_SIZE as usize,
        "record encoded to {} bytes, journal stores {}",
        bytes.len(),
        RECORD_SIZE
    );
    ring.append(&bytes)?;
    Ok(())
}

fn fetch_record(ring: &mut Ring<FlashSim>) -> Result<Option<LogRecord>> {
    let mut bytes = [0u8; RECORD_SIZE as usize];
    match ring.fetch(&mut bytes) {
        Ok(()) => Ok(Some(bincode::deserialize(&bytes)?)),
        Err(RingError::Empty) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn main() -> Result<()> {
    println!("=== Flashring Log Journal Demo ===\n");

    let path = std::env::temp_dir().join("log_journal.img");

    println!("1. Opening journal at {}...", path.display());
    let mut ring = open_journal(&path)?;
    println!("   Capacity: {} records\n", ring.capacity());

    println!("2. Appending log entries (oldest are evicted when full)...");
    for (level, text) in [
        (1, "foo"),
        (2, "bar"),
        (3, "baz"),
        (4, "xyzzy"),
        (5, "test"),
        (6, "hello"),
    ] {
        append_record(&mut ring, &LogRecord::new(level, text))?;
    }
    println!("   ✓ {} records live\n", ring.count_estimate());

    // Fetched records are not physically removed until discard. Useful when
    // shipping queued records over a network: discard only after the ACK.
    println!("3. Shipping two records and discarding them after the ACK...");
    for _ in 0..2 {
        if let Some(record) = fetch_record(&mut ring)? {
            println!("   shipped <{}> {}", record.level, record.text());
        }
    }
    ring.discard()?;
    ring.discard()?;
    println!("   {} records remain\n", ring.count_estimate());

    println!("4. Reading two more without an ACK...");
    for _ in 0..2 {
        if let Some(record) = fetch_record(&mut ring)? {
            println!("   read <{}> {}", record.level, record.text());
        }
    }
    println!("   No ACK came; rewinding, they stay available\n");
    ring.rewind();

    println!("5. Replaying everything still in the journal...");
    while let Some(record) = fetch_record(&mut ring)? {
        println!("   <{}> {}", record.level, record.text());
    }
    println!();

    println!("6. Media snapshot:");
    print!("{}", ring.dump()?);
    println!();

    println!(
        "Done. Records persist in {}; run again to recover them.",
        path.display()
    );
    Ok(())
}
