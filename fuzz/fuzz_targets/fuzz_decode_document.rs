// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fuzz target for simulation document decoding.
// Run with: cargo +nightly fuzz run fuzz_decode_document
//
// Arbitrary bytes go through decode, per-pair validation and key derivation.
// Every stage must return an error instead of panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use simstore_simulation::{decode_document, encode_document, key::derive_key, validation::validate_pair};

fuzz_target!(|data: &[u8]| {
    if data.len() > 64 * 1024 {
        return;
    }

    if let Ok(document) = decode_document(data) {
        for pair in document.pairs() {
            let _ = validate_pair(pair);
            let _ = derive_key(&pair.request);
        }
        let _ = encode_document(&document);
    }
});
