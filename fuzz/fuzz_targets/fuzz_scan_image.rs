#![no_main]
use flashring::{Flash, MemFlash, Ring};
use libfuzzer_sys::fuzz_target;

// Scan over arbitrary media must classify or reject, never panic. Starting
// from a formatted image with a few records and programming noise over it
// reaches deeper scan states than raw bytes alone.
fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }
    let object_size = (data[0] % 13 + 1) as u32;
    let version = u32::from_le_bytes([data[1], data[2], data[3], 0]);
    let noise = &data[4..];

    let mut flash = MemFlash::new(64, 4);

    if data[1] & 1 == 0 {
        let mut ring = match Ring::format(flash, version, object_size) {
            Ok(ring) => ring,
            Err(_) => return,
        };
        let record = vec![0x5A; object_size as usize];
        for _ in 0..(data[2] % 8) {
            ring.append(&record).unwrap();
        }
        flash = ring.into_flash();
    }

    let len = noise.len().min(256);
    if len > 0 {
        flash.program(0, &noise[..len]).unwrap();
    }

    let _ = Ring::scan(flash, version, object_size);
});
