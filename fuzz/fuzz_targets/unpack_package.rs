//! Arbitrary bytes as a sealed package.
//!
//! `unpack` and `key_meta` must reject anything that was not produced by
//! `pack` under the same key, without panicking or over-reading. Inputs
//! whose declared sizes are consistent are also fed with a pinned tag.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sealstream_crypto::{SealError, SealedCodec, SymmetricKey};

fuzz_target!(|data: &[u8]| {
    let Ok(codec) = SealedCodec::new(&SymmetricKey::from([0u8; 16]), 128) else {
        return;
    };

    let _ = SealedCodec::key_meta(data);

    match codec.unpack(data, &[], None) {
        Ok(_) => panic!("forged package opened"),
        Err(SealError::SizeMismatch(_) | SealError::AuthenticationFailure) => {},
        Err(other) => panic!("unexpected error: {other}"),
    }

    let _ = codec.unpack(data, b"extra", Some(&[0u8; 16]));
});
