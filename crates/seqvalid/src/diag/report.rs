//! Submitter report: findings bucketed into named categories.

use std::fmt;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::code::ErrorCode;
use super::finding::{Finding, FindingList};

/// Category name to member codes, in report order.
static CATEGORIES: Lazy<Vec<(&'static str, Vec<ErrorCode>)>> = Lazy::new(|| {
    use ErrorCode::*;
    vec![
        ("Not Splice Consensus", vec![
            NotSpliceConsensusDonor,
            NotSpliceConsensusAcceptor,
            NotSpliceConsensusDonorTerminalIntron,
            NotSpliceConsensusAcceptorTerminalIntron,
        ]),
        ("Bad Specific Host Values", vec![BadSpecificHost, AmbiguousSpecificHost]),
        ("Bad Institution Codes", vec![
            BadInstitutionCode,
            BadCollectionCode,
            BadVoucherId,
            WrongVoucherType,
            UnstructuredVoucher,
            MultipleSourceVouchers,
        ]),
        ("LatLonCountry Errors", vec![LatLonCountry]),
        ("LatLonValue Errors", vec![LatLonValue, LatLonFormat, LatLonRange]),
        ("Country Codes", vec![BadCountryCode, ReplacedCountryCode, BadCountryCapitalization]),
        ("EC Number Format", vec![BadEcNumberFormat]),
        ("EC Number Value", vec![BadEcNumberValue]),
        ("Rubisco Names", vec![RubiscoProblem]),
        ("Inference Qualifiers", vec![InvalidInferenceValue]),
        ("Start Codon", vec![StartCodon]),
        ("Internal Stops", vec![InternalStop, StopInProtein]),
        ("Missing Stop Codon", vec![NoStop]),
        ("Translation Mismatches", vec![MisMatchAa, TransLen]),
        ("Transcript Problems", vec![TranscriptLen, TranscriptMismatches]),
        ("CDS/mRNA Consistency", vec![
            CdsMrnaRange,
            CdsWithNoMrna,
            CdsWithMultipleMrnas,
            GenesInconsistent,
        ]),
        ("Gene Ranges", vec![CdsGeneRange, MrnaGeneRange, GeneXrefWithoutGene]),
        ("Feature Cross-References", vec![
            SeqFeatXrefNotReciprocal,
            SeqFeatXrefProblem,
        ]),
        ("Partial Problems", vec![PartialsInconsistent, PartialProblem]),
        ("Locus Tags", vec![CollidingLocusTags, MissingGeneLocusTag, LocusTagProductMismatch]),
        ("Duplicate Features", vec![DuplicateFeat]),
        ("Short Sequences", vec![ShortSeq]),
        ("Terminal Ns", vec![TerminalNs]),
        ("N Content", vec![
            HighNContentPercent,
            InternalNsInSeqRaw,
            InternalNsInSeqLit,
            InternalNsAdjacentToGap,
        ]),
        ("Gaps", vec![
            BadDeltaSeq,
            SeqLitGapLength0,
            SeqLitDataLength0,
            MissingGaps,
            BadHtgsSeq,
        ]),
        ("Bad Collection Dates", vec![BadCollectionDate]),
        ("Dates", vec![BadDate, Inconsistent]),
        ("Taxonomy", vec![OrganismNotFound, TaxonomyLookupProblem, NoOrgFound]),
        ("Source Qualifiers", vec![
            BadOrganelleLocation,
            BadVariety,
            InvalidSexQualifier,
            BioSourceInconsistency,
            MultipleSourceQualifiers,
            InconsistentBioSources,
        ]),
        ("Publications", vec![
            NoPubFound,
            MissingPubRequirement,
            BadPageNumbering,
            MissingIsoJta,
        ]),
        ("Structured Comments", vec![
            StrucCommMissingPrefixOrSuffix,
            BadStrucCommMissingField,
            BadStrucCommInvalidFieldValue,
        ]),
        ("Packaging", vec![
            NucProtProblem,
            CdsProductPackagingProblem,
            GenomicProductPackagingProblem,
            ImproperlyNestedSets,
            MissingSetTitle,
            EmptySet,
            NoBioseqFound,
        ]),
        ("Non-ASCII Characters", vec![NonAsciiAsn]),
        ("Service Errors", vec![ServiceError]),
    ]
});

/// Category a code is reported under.
pub fn category_of(code: ErrorCode) -> Option<&'static str> {
    CATEGORIES
        .iter()
        .find(|(_, codes)| codes.contains(&code))
        .map(|(name, _)| *name)
}

/// Codes a category contains, in table order.
pub fn category_codes(name: &str) -> Option<&'static [ErrorCode]> {
    CATEGORIES
        .iter()
        .find(|(cat, _)| *cat == name)
        .map(|(_, codes)| codes.as_slice())
}

pub fn category_names() -> impl Iterator<Item = &'static str> {
    CATEGORIES.iter().map(|(name, _)| *name)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportGroup {
    pub category: String,
    pub findings: Vec<Finding>,
}

/// Grouped view of a run. Findings without a category land in "Other".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitterReport {
    pub groups: Vec<ReportGroup>,
}

impl SubmitterReport {
    pub const OTHER: &'static str = "Other";

    pub fn from_findings(findings: &FindingList) -> Self {
        let mut buckets: IndexMap<&'static str, Vec<Finding>> =
            category_names().map(|name| (name, Vec::new())).collect();
        buckets.insert(Self::OTHER, Vec::new());

        for finding in findings {
            let name = category_of(finding.code).unwrap_or(Self::OTHER);
            if let Some(bucket) = buckets.get_mut(name) {
                bucket.push(finding.clone());
            }
        }

        let groups = buckets
            .into_iter()
            .filter(|(_, items)| !items.is_empty())
            .map(|(category, findings)| ReportGroup {
                category: category.to_string(),
                findings,
            })
            .collect();
        Self { groups }
    }

    pub fn group(&self, category: &str) -> Option<&ReportGroup> {
        self.groups.iter().find(|g| g.category == category)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl fmt::Display for SubmitterReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for group in &self.groups {
            writeln!(f, "{} ({})", group.category, group.findings.len())?;
            for finding in &group.findings {
                writeln!(f, "  {}", finding)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::Severity;

    #[test]
    fn test_every_code_in_at_most_one_category() {
        for code in ErrorCode::ALL {
            let hits = CATEGORIES.iter().filter(|(_, codes)| codes.contains(code)).count();
            assert!(hits <= 1, "{} appears in {} categories", code, hits);
        }
    }

    #[test]
    fn test_grouping_follows_category_order() {
        let list = FindingList::from(vec![
            Finding::new(Severity::Info, ErrorCode::LatLonCountry, "a", "x"),
            Finding::new(Severity::Warning, ErrorCode::NotSpliceConsensusDonor, "a", "y"),
            Finding::new(Severity::Warning, ErrorCode::ReprInvalid, "a", "z"),
        ]);
        let report = SubmitterReport::from_findings(&list);
        let names: Vec<&str> = report.groups.iter().map(|g| g.category.as_str()).collect();
        assert_eq!(names, vec!["Not Splice Consensus", "LatLonCountry Errors", "Other"]);
    }

    #[test]
    fn test_category_lookup() {
        assert_eq!(category_of(ErrorCode::BadEcNumberFormat), Some("EC Number Format"));
        assert!(category_codes("Bad Institution Codes")
            .unwrap()
            .contains(&ErrorCode::BadCollectionCode));
        assert_eq!(category_of(ErrorCode::InternalException), None);
    }
}
