//! Arbitrary stream bytes through the frame reader.
//!
//! The first byte picks the read chunk size so partial reads are exercised.
//! The reader must never hand out a frame above its limit and must report
//! progress consistently.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sealstream_proto::FrameReader;

const MAX_FRAME: u64 = 64 * 1024;

fuzz_target!(|data: &[u8]| {
    let Some((&chunk, wire)) = data.split_first() else {
        return;
    };
    let chunk = usize::from(chunk).max(1);

    let mut reader = FrameReader::new(MAX_FRAME);
    let mut pos = 0;

    while pos < wire.len() {
        let dst = reader.unfilled();
        assert!(!dst.is_empty());

        let n = dst.len().min(chunk).min(wire.len() - pos);
        dst[..n].copy_from_slice(&wire[pos..pos + n]);
        pos += n;

        match reader.advance(n) {
            Ok(Some(frame)) => {
                assert!(frame.len() as u64 <= MAX_FRAME);
                assert!(reader.is_idle());
            },
            Ok(None) => assert!(reader.bytes_received() < reader.target_size()),
            Err(_) => return,
        }
    }
});
