//! Fuzz target for voucher parsing and institution lookup.

#![no_main]

use libfuzzer_sys::fuzz_target;
use seqvalid::rules::voucher::{parse_voucher, voucher_problems};
use seqvalid::services::{InstitutionDictionary, VoucherKind};

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let dict = InstitutionDictionary::builtin();

    let _ = parse_voucher(input);
    for kind in [VoucherKind::Specimen, VoucherKind::Culture, VoucherKind::BioMaterial] {
        let _ = voucher_problems(kind, input, &dict);
    }
});
