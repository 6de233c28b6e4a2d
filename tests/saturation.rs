//! Overflow, eviction, and iteration-order tests
//!
//! Small in-memory geometry so wraparound is cheap to reach: 64-byte
//! sectors, four per ring, 4-byte records. Seven slots per sector, capacity
//! 21, so anything past 21 appends starts evicting whole sectors.

use flashring::{Flash, Location, MemFlash, Ring, RingError, SlotStatus, SECTOR_HEADER_SIZE};

const VERSION: u32 = 0x42;
const OBJECT_SIZE: u32 = 4;
const SECTOR_SIZE: u32 = 64;
const SECTOR_COUNT: u32 = 4;
const SLOTS: u32 = 7;
const CAPACITY: usize = (SLOTS * (SECTOR_COUNT - 1)) as usize;

fn fresh_ring() -> Ring<MemFlash> {
    Ring::format(MemFlash::new(SECTOR_SIZE, SECTOR_COUNT), VERSION, OBJECT_SIZE).unwrap()
}

fn append_u32(ring: &mut Ring<MemFlash>, value: u32) {
    ring.append(&value.to_le_bytes()).unwrap();
}

/// Rewind and fetch everything, returning the records in iteration order
fn drain_from_start(ring: &mut Ring<MemFlash>) -> Vec<u32> {
    ring.rewind();
    let mut out = Vec::new();
    let mut buf = [0u8; 4];
    loop {
        match ring.fetch(&mut buf) {
            Ok(()) => out.push(u32::from_le_bytes(buf)),
            Err(RingError::Empty) => return out,
            Err(e) => panic!("fetch failed: {e}"),
        }
    }
}

#[test]
fn test_fifo_order_within_capacity() {
    let mut ring = fresh_ring();
    for i in 0..CAPACITY as u32 {
        append_u32(&mut ring, i);
    }
    assert_eq!(ring.count_exact().unwrap(), CAPACITY);

    let fetched = drain_from_start(&mut ring);
    let expected: Vec<u32> = (0..CAPACITY as u32).collect();
    assert_eq!(fetched, expected);
}

#[test]
fn test_overflow_evicts_oldest_sectors() {
    // One eviction drops a whole sector of records; the survivors are
    // always the most recent appends, still in order
    for k in [1u32, 3, 7, 8, 14, 15] {
        let mut ring = fresh_ring();
        let total = CAPACITY as u32 + k;
        for i in 0..total {
            append_u32(&mut ring, i);
        }

        let evicted = SLOTS * k.div_ceil(SLOTS);
        let live = (total - evicted) as usize;
        assert_eq!(ring.count_exact().unwrap(), live, "k={k}");
        assert_eq!(ring.count_estimate(), live, "k={k}");

        let fetched = drain_from_start(&mut ring);
        let expected: Vec<u32> = (evicted..total).collect();
        assert_eq!(fetched, expected, "k={k}");
    }
}

#[test]
fn test_append_beyond_capacity_never_fails() {
    let mut ring = fresh_ring();
    for i in 0..10 * CAPACITY as u32 {
        append_u32(&mut ring, i);
    }
    // 189 overflow appends is exactly 27 sectors, so the ring is saturated
    assert_eq!(ring.count_exact().unwrap(), CAPACITY);

    let read = ring.read_position();
    let write = ring.write_position();
    let recovered = Ring::scan(ring.into_flash(), VERSION, OBJECT_SIZE).unwrap();
    assert_eq!(recovered.read_position(), read);
    assert_eq!(recovered.write_position(), write);
}

#[test]
fn test_eviction_moves_read_and_fetch_cursors() {
    let mut ring = fresh_ring();
    for i in 0..CAPACITY as u32 {
        append_u32(&mut ring, i);
    }
    assert_eq!(ring.read_position(), Location::new(0, 0));

    // This append needs the slack sector, which means erasing sector 0 out
    // from under both cursors
    append_u32(&mut ring, CAPACITY as u32);
    assert_eq!(ring.read_position(), Location::new(1, 0));
    assert_eq!(ring.fetch_position(), Location::new(1, 0));

    let fetched = drain_from_start(&mut ring);
    assert_eq!(fetched[0], SLOTS);
    assert_eq!(*fetched.last().unwrap(), CAPACITY as u32);
}

#[test]
fn test_discard_monotonicity() {
    let mut ring = fresh_ring();
    for i in 0..10 {
        append_u32(&mut ring, i);
    }

    let mut expected = 10;
    while expected > 0 {
        let before = ring.read_position();
        ring.discard().unwrap();
        expected -= 1;
        assert_eq!(ring.count_exact().unwrap(), expected);
        // Exactly one slot per call
        let after = ring.read_position();
        let advanced = if before.slot + 1 < SLOTS {
            Location::new(before.sector, before.slot + 1)
        } else {
            Location::new(before.sector + 1, 0)
        };
        assert_eq!(after, advanced);
    }

    assert!(matches!(ring.discard(), Err(RingError::Empty)));
    assert_eq!(ring.read_position(), ring.write_position());
}

#[test]
fn test_discard_crossing_sector_edge_does_not_erase() {
    let mut ring = fresh_ring();
    for i in 0..SLOTS + 1 {
        append_u32(&mut ring, i);
    }
    // The eighth discard steps from sector 0 into sector 1
    for _ in 0..SLOTS + 1 {
        ring.discard().unwrap();
    }
    assert_eq!(ring.read_position(), Location::new(1, 1));

    // Sector 0 still holds its discard marks; only append-driven
    // allocation erases
    let mut flash = ring.into_flash();
    let mut word = [0u8; 4];
    flash.read(SECTOR_HEADER_SIZE, &mut word).unwrap();
    assert_eq!(
        SlotStatus::from_word(u32::from_le_bytes(word)).unwrap(),
        SlotStatus::Discarded
    );
}

#[test]
fn test_rewind_replays_from_oldest_live_record() {
    let mut ring = fresh_ring();
    for i in 0..6 {
        append_u32(&mut ring, i);
    }

    let mut buf = [0u8; 4];
    for _ in 0..4 {
        ring.fetch(&mut buf).unwrap();
    }
    assert_eq!(drain_from_start(&mut ring), vec![0, 1, 2, 3, 4, 5]);

    // Discarding moves the replay origin forward
    ring.discard().unwrap();
    ring.discard().unwrap();
    assert_eq!(drain_from_start(&mut ring), vec![2, 3, 4, 5]);
    // Repeatable: rewinding again replays the same sequence
    assert_eq!(drain_from_start(&mut ring), vec![2, 3, 4, 5]);
}

#[test]
fn test_interleaved_churn_matches_model() {
    let mut ring = fresh_ring();
    let mut model = std::collections::VecDeque::new();
    let mut next = 0u32;

    // Prime with a few records, then steady state: three in, three out per
    // round. The cursors chase each other around the ring for many laps
    // while the live set stays far below capacity, so the model never has
    // to know about eviction.
    for _ in 0..5 {
        append_u32(&mut ring, next);
        model.push_back(next);
        next += 1;
    }
    for round in 0..200 {
        for _ in 0..3 {
            append_u32(&mut ring, next);
            model.push_back(next);
            next += 1;
        }
        for _ in 0..3 {
            ring.discard().unwrap();
            model.pop_front();
        }
        if round % 50 == 0 {
            assert_eq!(ring.count_exact().unwrap(), model.len());
        }
    }

    assert_eq!(ring.count_exact().unwrap(), model.len());
    assert_eq!(ring.count_estimate(), model.len());
    let fetched = drain_from_start(&mut ring);
    assert_eq!(fetched, Vec::from(model));
}
