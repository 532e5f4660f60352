//! Property-based tests for the validator.
//!
//! These tests use proptest to generate random records and verify that
//! validation keeps its invariants under all conditions.
//!
//! # Testing Philosophy
//!
//! Property-based tests verify:
//! 1. **No panics**: Validation never crashes on any record
//! 2. **Determinism**: Same record always produces same findings
//! 3. **Consistency**: Narrow runs report a subset of the full run
//! 4. **Invariants**: Suppression only removes what it names
//!
//! # Running Property Tests
//!
//! ```bash
//! # Run all property tests
//! cargo test -p seqvalid --test property_tests
//!
//! # Run with more cases (slower but more thorough)
//! PROPTEST_CASES=10000 cargo test -p seqvalid --test property_tests
//! ```

use proptest::prelude::*;

use seqvalid::fixtures;
use seqvalid::index::SUPPRESSION_KIND;
use seqvalid::model::{Descriptor, SeqEntry, SeqId, SubSourceType, UserObject};
use seqvalid::rules::biosource::{collection_date_problem, lat_lon_problems};
use seqvalid::rules::voucher::parse_voucher;
use seqvalid::services::PolygonLocator;
use seqvalid::{ErrorCode, Options, Validator};

// =============================================================================
// Test Strategies
// =============================================================================

/// Nucleotide residues with a generous share of N.
fn residues() -> impl Strategy<Value = String> {
    "[ACGTN]{1,200}"
}

/// Strings that look like lat_lon values, well formed or not.
fn lat_lon_like() -> impl Strategy<Value = String> {
    prop_oneof![
        "[0-9]{1,2}(\\.[0-9]{1,4})? [NS] [0-9]{1,3}(\\.[0-9]{1,4})? [EW]",
        "[0-9\\.\\-]{1,8} ?[NSEW]? [0-9\\.\\-]{1,8} ?[NSEW]?",
        "[ -~]{0,40}",
    ]
}

/// Option bitmasks without remote lookups.
fn options() -> impl Strategy<Value = Options> {
    (0u32..(1 << 12)).prop_map(|bits| {
        Options::from_bits(bits)
            .without(Options::USE_REMOTE_TAXONOMY)
            .without(Options::FAR_FETCH_PRODUCTS)
    })
}

fn nucleotide(residues: &str) -> SeqEntry {
    let mut entry = fixtures::good_nucleotide();
    let SeqEntry::Seq(seq) = &mut entry else { unreachable!() };
    seq.inst = fixtures::raw_dna(fixtures::nuc_id(), residues).inst;
    entry
}

// =============================================================================
// Validator Properties
// =============================================================================

proptest! {
    #[test]
    fn validation_is_deterministic(seq in residues(), opts in options()) {
        let entry = nucleotide(&seq);
        let validator = Validator::new();
        let first = validator.validate(&entry, opts);
        let second = validator.validate(&entry, opts);
        prop_assert_eq!(first.to_lines(), second.to_lines());
    }

    #[test]
    fn narrow_runs_are_subsets(seq in residues()) {
        let entry = nucleotide(&seq);
        let validator = Validator::new();
        let full = validator.validate(&entry, Options::NONE);
        for narrow in [
            validator.validate_n_stretches(&entry, Options::NONE),
            validator.validate_tsa_biomol(&entry, Options::NONE),
        ] {
            for finding in narrow.iter() {
                prop_assert!(full.as_slice().contains(finding), "{} missing from full run", finding);
            }
        }
    }

    #[test]
    fn suppression_removes_only_named_codes(seq in residues()) {
        let plain = nucleotide(&seq);
        let mut suppressed = plain.clone();
        if let SeqEntry::Seq(bioseq) = &mut suppressed {
            bioseq.descr.push(Descriptor::User(
                UserObject::new(SUPPRESSION_KIND).with_field("Suppress", "TerminalNs"),
            ));
        }
        let validator = Validator::new();
        let mut expected = validator.validate(&plain, Options::NONE);
        expected.remove_codes(&[ErrorCode::TerminalNs]);
        let actual = validator.validate(&suppressed, Options::NONE);
        prop_assert_eq!(actual.to_lines(), expected.to_lines());
    }

    #[test]
    fn insd_ids_never_lower_terminal_n_severity(tail in "[ACGT]{20,80}", ns in 1usize..5) {
        let residues = format!("{}{}", "N".repeat(ns), tail);
        let validator = Validator::new();
        let severity_for = |id: SeqId| {
            let mut entry = nucleotide(&residues);
            if let SeqEntry::Seq(seq) = &mut entry {
                seq.ids = vec![id];
            }
            validator
                .validate_n_stretches(&entry, Options::NONE)
                .with_code(ErrorCode::TerminalNs)
                .map(|f| f.severity)
                .next()
        };
        let local = severity_for(SeqId::local("nuc"));
        let genbank = severity_for(SeqId::genbank("AB123456", Some(1)));
        prop_assert!(local.is_some());
        prop_assert!(genbank > local);
    }

    #[test]
    fn random_sources_never_panic(lat_lon in lat_lon_like(), country in "[ -~]{0,30}") {
        let mut entry = fixtures::good_nucleotide();
        if let SeqEntry::Seq(seq) = &mut entry {
            for d in &mut seq.descr {
                if let Descriptor::Source(src) = d {
                    *src = src
                        .clone()
                        .with_subsource(SubSourceType::Country, country.clone())
                        .with_subsource(SubSourceType::LatLon, lat_lon.clone());
                }
            }
        }
        let _ = Validator::new().validate(&entry, Options::NONE);
    }
}

// =============================================================================
// Parser Properties
// =============================================================================

proptest! {
    #[test]
    fn lat_lon_never_panics(value in lat_lon_like(), country in "[A-Z][a-z]{2,12}") {
        let locator = PolygonLocator::builtin();
        let _ = lat_lon_problems(&value, Some(&country), &locator, 200.0);
        let _ = lat_lon_problems(&value, None, &locator, 200.0);
    }

    #[test]
    fn collection_dates_never_panic(value in "[ -~]{0,30}") {
        let today = chrono::NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let _ = collection_date_problem(&value, today);
    }

    #[test]
    fn voucher_parse_keeps_the_identifier(code in "[A-Z]{2,6}", id in "[0-9]{1,8}") {
        let value = format!("{}:{}", code, id);
        let voucher = parse_voucher(&value);
        prop_assert_eq!(voucher.map(|v| v.id), Some(id.as_str()));
    }
}
