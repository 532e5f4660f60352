//! Fuzz target for lat_lon and collection_date parsing.
//!
//! This fuzzer tests that the source qualifier parsers:
//! 1. Never panic on any UTF-8 input
//! 2. Never panic when the claimed country is itself garbage

#![no_main]

use libfuzzer_sys::fuzz_target;
use seqvalid::rules::biosource::{collection_date_problem, lat_lon_problems};
use seqvalid::services::PolygonLocator;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1_000 {
        return;
    }
    let input = String::from_utf8_lossy(data);
    let locator = PolygonLocator::builtin();

    let _ = lat_lon_problems(&input, None, &locator, 200.0);
    let _ = lat_lon_problems(&input, Some("Romania"), &locator, 200.0);
    let _ = lat_lon_problems("45 N 25 E", Some(&input), &locator, 200.0);

    if let Some(today) = chrono::NaiveDate::from_ymd_opt(2024, 6, 1) {
        let _ = collection_date_problem(&input, today);
    }
});
