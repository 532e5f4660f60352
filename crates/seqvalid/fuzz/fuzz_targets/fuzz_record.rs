//! Fuzz target for whole-record validation.
//!
//! Inputs are JSON records. Anything that deserializes into a `SeqEntry`
//! must validate without panicking, under both default and indexer options.

#![no_main]

use libfuzzer_sys::fuzz_target;
use seqvalid::{Options, SeqEntry, Validator};

fuzz_target!(|data: &[u8]| {
    if data.len() > 100_000 {
        return;
    }
    let Ok(entry) = serde_json::from_slice::<SeqEntry>(data) else {
        return;
    };
    let validator = Validator::new();
    let _ = validator.validate(&entry, Options::NONE);
    let _ = validator.validate(&entry, Options::INDEXER_MODE | Options::VALIDATE_ALIGNMENTS);
});
