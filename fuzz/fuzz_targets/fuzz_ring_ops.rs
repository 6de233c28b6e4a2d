#![no_main]
use flashring::{MemFlash, Ring, RingError};
use libfuzzer_sys::{
    arbitrary::{Arbitrary, Unstructured},
    fuzz_target,
};

#[derive(Debug, Arbitrary)]
enum RingOp {
    Append(u8),
    Fetch,
    Discard,
    Rewind,
    Rescan,
}

// Drives arbitrary operation sequences against a tiny ring and checks that
// recovery always lands on the live cursors
fuzz_target!(|input: &[u8]| {
    let mut u = Unstructured::new(input);

    let ops: Vec<RingOp> = match u.arbitrary() {
        Ok(ops) => ops,
        Err(_) => return,
    };

    if ops.is_empty() {
        return;
    }

    let mut ring = Ring::format(MemFlash::new(64, 4), 0x42, 4).unwrap();
    let mut buf = [0u8; 4];

    for op in ops.iter().take(64) {
        match op {
            RingOp::Append(byte) => ring.append(&[*byte; 4]).unwrap(),
            RingOp::Fetch => match ring.fetch(&mut buf) {
                Ok(()) | Err(RingError::Empty) => {}
                Err(e) => panic!("fetch failed on healthy media: {e}"),
            },
            RingOp::Discard => match ring.discard() {
                Ok(()) | Err(RingError::Empty) => {}
                Err(e) => panic!("discard failed on healthy media: {e}"),
            },
            RingOp::Rewind => ring.rewind(),
            RingOp::Rescan => {
                let read = ring.read_position();
                let write = ring.write_position();
                ring = Ring::scan(ring.into_flash(), 0x42, 4).unwrap();
                assert_eq!(ring.read_position(), read);
                assert_eq!(ring.write_position(), write);
            }
        }
    }

    let exact = ring.count_exact().unwrap();
    assert_eq!(ring.count_estimate(), exact);
    assert!(exact <= ring.capacity());
});
