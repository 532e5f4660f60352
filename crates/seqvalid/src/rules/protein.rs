//! Protein Bioseqs and their Prot-ref features.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{FeatureSubject, Scope};
use crate::config::Options;
use crate::diag::{ErrorCode, FindingSink, Severity};
use crate::error::Result;
use crate::index::SeqHandle;
use crate::model::{FeatData, ProtProcessed, ProtRef, SeqLoc};

static EC_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.(\d+|-)\.(\d+|-)\.(\d+|n\d+|-)$").unwrap());

/// Top-level EC classes.
const EC_CLASSES: std::ops::RangeInclusive<u32> = 1..=7;

const RUBISCO_NAMES: [&str; 3] = [
    "ribulose-1,5-bisphosphate carboxylase/oxygenase",
    "ribulose-1,5-bisphosphate carboxylase/oxygenase large subunit",
    "ribulose-1,5-bisphosphate carboxylase/oxygenase small subunit",
];

/// A protein Bioseq needs one Prot-ref covering its whole length.
pub fn check(seq: &SeqHandle<'_>, scope: &Scope<'_, '_>, out: &mut FindingSink) -> Result<()> {
    if !seq.seq.is_aa() || seq.seq.inst.is_empty() {
        return Ok(());
    }
    let len = seq.seq.inst.len();
    let full_length = scope
        .index
        .located_on(seq.ordinal)
        .iter()
        .map(|i| scope.index.feat(*i))
        .any(|h| {
            h.feat.prot_ref().is_some_and(|p| {
                matches!(p.processed, ProtProcessed::NotSet | ProtProcessed::Preprotein)
            }) && (matches!(h.feat.location, SeqLoc::Whole(_)) || (h.left == 0 && h.right + 1 == len))
        });
    if !full_length {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::NoProtRefFound,
            "No full length Prot-ref feature applied to this Bioseq",
        );
    }
    Ok(())
}

pub fn check_feature(subject: &FeatureSubject<'_, '_>, scope: &Scope<'_, '_>, out: &mut FindingSink) -> Result<()> {
    let FeatData::Prot(prot) = &subject.feat().data else {
        return Ok(());
    };
    if prot.is_empty() && prot.processed == ProtProcessed::NotSet {
        scope.post(
            out,
            Severity::Warning,
            ErrorCode::ProtRefHasNoData,
            "There is a protein feature where all fields are empty",
        );
    }
    for ec in &prot.ec {
        if let Some((code, message)) = ec_problem(ec) {
            scope.post(out, Severity::Warning, code, message);
        }
    }
    if scope.option(Options::CHECK_RUBISCO) {
        check_rubisco(prot, scope, out);
    }
    Ok(())
}

/// Format and value problems of one EC number.
pub fn ec_problem(ec: &str) -> Option<(ErrorCode, String)> {
    if !EC_FORMAT.is_match(ec) {
        return Some((
            ErrorCode::BadEcNumberFormat,
            format!("{} is not in proper EC_number format", ec),
        ));
    }
    let class: u32 = ec.split('.').next()?.parse().ok()?;
    if !EC_CLASSES.contains(&class) {
        return Some((
            ErrorCode::BadEcNumberValue,
            format!("{} is not a legal value for qualifier EC_number", ec),
        ));
    }
    None
}

fn check_rubisco(prot: &ProtRef, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    for name in &prot.name {
        let lower = name.to_ascii_lowercase();
        let mentions = lower.contains("ribulose") && lower.contains("bisphosphate");
        if mentions && !RUBISCO_NAMES.contains(&lower.as_str()) {
            scope.post(
                out,
                Severity::Warning,
                ErrorCode::RubiscoProblem,
                format!("Nonstandard ribulose bisphosphate protein name: {}", name),
            );
        } else if lower.contains("rubisco") && lower != "rubisco" {
            scope.post(
                out,
                Severity::Info,
                ErrorCode::RubiscoProblem,
                format!("Use full name for RuBisCO: {}", name),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::Finding;
    use crate::fixtures;
    use crate::model::{Bioseq, SeqAnnot, SeqEntry, SeqFeat};
    use crate::rules::testing::{Harness, codes};
    use rstest::rstest;

    fn protein_with(prot: ProtRef, loc: SeqLoc) -> Bioseq {
        let mut seq = fixtures::raw_protein(fixtures::prot_id(), fixtures::CODING_PROT);
        seq.annot.push(SeqAnnot::ftable(vec![SeqFeat::new(FeatData::Prot(prot), loc)]));
        seq
    }

    fn run_features(seq: Bioseq, harness: Harness) -> Vec<Finding> {
        let entry = SeqEntry::Seq(seq);
        harness.run(&entry, |scope, out| {
            for handle in scope.index.features() {
                check_feature(&FeatureSubject::new(handle), scope, out)?;
            }
            Ok(())
        })
    }

    #[test]
    fn test_full_length_prot_ref() {
        let entry = SeqEntry::Seq(fixtures::coding_protein());
        let findings = Harness::new().run(&entry, |scope, out| check(scope.index.seq(0), scope, out));
        assert!(findings.is_empty());

        let short = protein_with(ProtRef::named("p"), SeqLoc::int(fixtures::prot_id(), 0, 3));
        let entry = SeqEntry::Seq(short);
        let findings = Harness::new().run(&entry, |scope, out| check(scope.index.seq(0), scope, out));
        assert_eq!(codes(&findings), vec![ErrorCode::NoProtRefFound]);
    }

    #[rstest]
    #[case("1.1.1.1", None)]
    #[case("3.4.-.-", None)]
    #[case("2.7.11.n2", None)]
    #[case("1.1.1", Some(ErrorCode::BadEcNumberFormat))]
    #[case("EC 1.1.1.1", Some(ErrorCode::BadEcNumberFormat))]
    #[case("9.1.1.1", Some(ErrorCode::BadEcNumberValue))]
    fn test_ec_numbers(#[case] ec: &str, #[case] expected: Option<ErrorCode>) {
        assert_eq!(ec_problem(ec).map(|(c, _)| c), expected);
    }

    #[test]
    fn test_empty_prot_ref() {
        let seq = protein_with(ProtRef::default(), SeqLoc::Whole(fixtures::prot_id()));
        let findings = run_features(seq, Harness::new());
        assert_eq!(codes(&findings), vec![ErrorCode::ProtRefHasNoData]);
    }

    #[test]
    fn test_rubisco_only_when_enabled() {
        let prot = ProtRef::named("ribulose bisphosphate carboxylase large chain");
        let seq = protein_with(prot, SeqLoc::Whole(fixtures::prot_id()));
        assert!(run_features(seq.clone(), Harness::new()).is_empty());
        let findings = run_features(seq, Harness::new().with_options(Options::CHECK_RUBISCO));
        assert_eq!(codes(&findings), vec![ErrorCode::RubiscoProblem]);
    }
}
