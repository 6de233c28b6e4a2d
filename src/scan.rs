//! Sector classification and cursor recovery
//!
//! Recovery is split in two: an I/O pass (in `ring`) reads every sector
//! header and slot status and folds them into one [`SectorClass`] per
//! sector; the pure [`choose_cursors`] function then derives the read and
//! write cursors from that classification alone. Keeping the chooser free
//! of I/O makes every recovery rule testable without a device.

use crate::error::{Result, RingError};
use crate::layout::Location;
use crate::slot::SlotStatus;

/// What one sector looks like to this engine instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SectorClass {
    /// Header missing, unparseable, or carrying a different version
    Unformatted,
    /// Header matches; slots follow the legal pattern
    Formatted(SlotSummary),
}

/// Slot statuses of a formatted sector, folded down
///
/// Legal sectors always read as a run of DISCARDED slots, then VALID slots,
/// then EMPTY slots (any run may be empty), so two counts describe them
/// completely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct SlotSummary {
    pub discarded: u32,
    pub valid: u32,
}

impl SlotSummary {
    /// Slots written since the last erase
    pub fn fill(&self) -> u32 {
        self.discarded + self.valid
    }

    /// Whether any slot was written since the last erase
    pub fn in_use(&self) -> bool {
        self.fill() > 0
    }
}

/// Fold a sector's slot statuses into a summary
///
/// Rejects any ordering other than `DISCARDED* VALID* EMPTY*`: slots are
/// written strictly left to right and discarded strictly oldest-first, so
/// anything else means the media was not produced by this engine.
pub(crate) fn summarize_slots<I>(statuses: I) -> Result<SlotSummary>
where
    I: IntoIterator<Item = SlotStatus>,
{
    let mut summary = SlotSummary::default();
    let mut saw_valid = false;
    let mut saw_empty = false;

    for status in statuses {
        match status {
            SlotStatus::Discarded => {
                if saw_empty {
                    return Err(RingError::Corrupt("discarded slot after an empty one"));
                }
                if saw_valid {
                    return Err(RingError::Corrupt("discarded slot after a valid one"));
                }
                summary.discarded += 1;
            }
            SlotStatus::Valid => {
                if saw_empty {
                    return Err(RingError::Corrupt("valid slot after an empty one"));
                }
                saw_valid = true;
                summary.valid += 1;
            }
            SlotStatus::Empty => {
                saw_empty = true;
            }
        }
    }

    Ok(summary)
}

/// Derive the read and write cursors from the per-sector classification
///
/// Returns `(read, write)`. The rules, in order:
///
/// 1. No formatted sector at all: the partition is not ours.
/// 2. Formatted sectors but none written: a freshly formatted ring; both
///    cursors sit at slot 0 of the first formatted sector.
/// 3. Otherwise the written sectors must form exactly one contiguous ring
///    run. The run starts at the *seam*, the written sector whose ring
///    predecessor is not written. No seam means every sector is written,
///    which the one-sector-of-slack append policy never produces; several
///    seams mean several write frontiers. Both are corruption.
/// 4. Run sectors before the last must be completely full, and once a
///    sector holds VALID slots no later run sector may hold DISCARDED ones.
/// 5. `write` is the first empty slot of the last run sector, or slot 0 of
///    its successor when it is full. `read` is the first VALID slot of the
///    run, or equal to `write` when every record was discarded.
pub(crate) fn choose_cursors(
    classes: &[SectorClass],
    slots_per_sector: u32,
    version: u32,
) -> Result<(Location, Location)> {
    let n = classes.len();
    let summary_of = |i: usize| match classes[i] {
        SectorClass::Formatted(s) => Some(s),
        SectorClass::Unformatted => None,
    };
    let used = |i: usize| summary_of(i).is_some_and(|s| s.in_use());

    let Some(first_formatted) = (0..n).find(|&i| summary_of(i).is_some()) else {
        return Err(RingError::Unformatted(version));
    };

    if !(0..n).any(used) {
        let origin = Location::new(first_formatted as u32, 0);
        return Ok((origin, origin));
    }

    let mut seams = (0..n).filter(|&i| used(i) && !used((i + n - 1) % n));
    let seam = match (seams.next(), seams.next()) {
        (Some(s), None) => s,
        (Some(_), Some(_)) => {
            return Err(RingError::Corrupt("multiple write frontiers in the ring"))
        }
        // Some sector is written yet no seam exists, so every sector is
        // written and nothing is left to erase into
        (None, _) => return Err(RingError::Corrupt("no erased sector in the ring")),
    };

    let mut run = Vec::new();
    let mut i = seam;
    while let Some(s) = summary_of(i).filter(|s| s.in_use()) {
        run.push((i, s));
        i = (i + 1) % n;
    }

    let mut read = None;
    let mut write = Location::new(0, 0);
    let mut saw_valid = false;
    let last = run.len() - 1;
    for (k, &(idx, s)) in run.iter().enumerate() {
        if k < last && s.fill() != slots_per_sector {
            return Err(RingError::Corrupt("empty slots inside the record run"));
        }
        if saw_valid && s.discarded > 0 {
            return Err(RingError::Corrupt("discard marks are not contiguous"));
        }
        if s.valid > 0 {
            saw_valid = true;
            if read.is_none() {
                read = Some(Location::new(idx as u32, s.discarded));
            }
        }
        if k == last {
            write = if s.fill() < slots_per_sector {
                Location::new(idx as u32, s.fill())
            } else {
                Location::new(((idx + 1) % n) as u32, 0)
            };
        }
    }

    Ok((read.unwrap_or(write), write))
}
