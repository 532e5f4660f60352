//! Run options and validation thresholds.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Caller-supplied option bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Options(u32);

impl Options {
    pub const NONE: Options = Options(0);
    /// Journal articles must carry an ISO journal abbreviation.
    pub const REQUIRE_ISSN: Options = Options(1 << 0);
    /// Fetch CDS and mRNA products that are not in the record.
    pub const FAR_FETCH_PRODUCTS: Options = Options(1 << 1);
    /// Check identifiers for uniqueness across the whole record.
    pub const VALIDATE_ID_SET: Options = Options(1 << 2);
    pub const INDEXER_MODE: Options = Options(1 << 3);
    /// Build a remote taxonomy client when none was configured.
    pub const USE_REMOTE_TAXONOMY: Options = Options(1 << 4);
    pub const GENOME_SUBMISSION: Options = Options(1 << 5);
    /// Report any non-ASCII text.
    pub const STRICT_ASCII: Options = Options(1 << 6);
    pub const VALIDATE_ALIGNMENTS: Options = Options(1 << 7);
    /// Also check splice consensus around annotated `exon` features.
    pub const VALIDATE_EXONS: Options = Options(1 << 8);
    /// Check accessions cited in `inference` qualifiers.
    pub const INFERENCE_ACCESSIONS: Options = Options(1 << 9);
    /// Compare locus tags against general ids of CDS products.
    pub const LOCUS_TAG_GENERAL_MATCH: Options = Options(1 << 10);
    pub const CHECK_RUBISCO: Options = Options(1 << 11);

    const NAMES: [(Options, &'static str); 12] = [
        (Options::REQUIRE_ISSN, "REQUIRE_ISSN"),
        (Options::FAR_FETCH_PRODUCTS, "FAR_FETCH_PRODUCTS"),
        (Options::VALIDATE_ID_SET, "VALIDATE_ID_SET"),
        (Options::INDEXER_MODE, "INDEXER_MODE"),
        (Options::USE_REMOTE_TAXONOMY, "USE_REMOTE_TAXONOMY"),
        (Options::GENOME_SUBMISSION, "GENOME_SUBMISSION"),
        (Options::STRICT_ASCII, "STRICT_ASCII"),
        (Options::VALIDATE_ALIGNMENTS, "VALIDATE_ALIGNMENTS"),
        (Options::VALIDATE_EXONS, "VALIDATE_EXONS"),
        (Options::INFERENCE_ACCESSIONS, "INFERENCE_ACCESSIONS"),
        (Options::LOCUS_TAG_GENERAL_MATCH, "LOCUS_TAG_GENERAL_MATCH"),
        (Options::CHECK_RUBISCO, "CHECK_RUBISCO"),
    ];

    pub const fn from_bits(bits: u32) -> Self {
        Options(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Options) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn with(self, other: Options) -> Self {
        self | other
    }

    pub fn without(self, other: Options) -> Self {
        Options(self.0 & !other.0)
    }
}

impl BitOr for Options {
    type Output = Options;

    fn bitor(self, rhs: Options) -> Options {
        Options(self.0 | rhs.0)
    }
}

impl BitOrAssign for Options {
    fn bitor_assign(&mut self, rhs: Options) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = Options::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        if names.is_empty() {
            f.write_str("NONE")
        } else {
            f.write_str(&names.join("|"))
        }
    }
}

/// Thresholds used by the rule library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Small end window for N content (bases).
    pub n_window_small: usize,
    /// Ns allowed in the small window; more than this is reported.
    pub n_limit_small: usize,
    pub n_window_large: usize,
    pub n_limit_large: usize,
    /// Whole-sequence N percentage above which a sequence is reported.
    pub n_percent_limit: f64,
    /// Shortest internal N run reported in raw sequences.
    pub internal_n_run_raw: usize,
    /// Shortest internal N run reported in WGS sequences.
    pub internal_n_run_wgs: usize,
    /// Percentage of X above which a coding region is reported.
    pub x_percent_limit: f64,
    /// Mismatches reported one by one before collapsing into a summary.
    pub mismatch_report_limit: usize,
    /// Distance (km) under which a lat/lon mismatch is worded as nearby.
    pub latlon_nearby_km: f64,
    /// Alignments below this percent identity are reported.
    pub min_percent_identity: f64,
    /// Nucleotides shorter than this are reported in indexer mode.
    pub min_sequence_length: usize,
    /// Dates after this day are "in the future". `None` means today.
    pub reference_date: Option<NaiveDate>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            n_window_small: 10,
            n_limit_small: 5,
            n_window_large: 50,
            n_limit_large: 15,
            n_percent_limit: 50.0,
            internal_n_run_raw: 100,
            internal_n_run_wgs: 20,
            x_percent_limit: 50.0,
            mismatch_report_limit: 10,
            latlon_nearby_km: 200.0,
            min_percent_identity: 50.0,
            min_sequence_length: 50,
            reference_date: None,
        }
    }
}

impl ValidatorConfig {
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    pub fn with_mismatch_report_limit(mut self, limit: usize) -> Self {
        self.mismatch_report_limit = limit;
        self
    }

    /// The day used for "in the future" checks.
    pub fn today(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}
