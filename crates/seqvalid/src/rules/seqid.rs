//! Identifier rules: accession formats, conflicts and collisions.

use once_cell::sync::Lazy;
use regex::Regex;

use super::Scope;
use crate::config::Options;
use crate::diag::{ErrorCode, FindingSink, Severity};
use crate::error::Result;
use crate::index::SeqHandle;
use crate::model::{AccessionClass, ObjectId, SeqId};

/// Longest local identifier accepted.
const MAX_LOCAL_ID_LEN: usize = 50;

static INSD_NUC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Z]\d{5}|[A-Z]{2}\d{6}|[A-Z]{2}\d{8}|[A-Z]{4}\d{8,10}|[A-Z]{6}\d{9,11})$").unwrap()
});

static INSD_PROT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{3}(\d{5}|\d{7})$").unwrap());

static REFSEQ: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{2}_([A-Z]{4})?\d{6,9}$").unwrap());

pub fn check(seq: &SeqHandle<'_>, scope: &Scope<'_, '_>, out: &mut FindingSink) -> Result<()> {
    let bioseq = seq.seq;
    if bioseq.ids.is_empty() {
        scope.post(out, Severity::Critical, ErrorCode::NoIdOnBioseq, "No ids on a Bioseq");
        return Ok(());
    }

    for id in &bioseq.ids {
        if let Some(problem) = format_problem(id, bioseq.is_aa()) {
            scope.post(out, Severity::Error, ErrorCode::BadSeqIdFormat, problem);
        }
    }

    for (i, a) in bioseq.ids.iter().enumerate() {
        for b in &bioseq.ids[i + 1..] {
            if conflicts(a, b) {
                scope.post(
                    out,
                    Severity::Error,
                    ErrorCode::ConflictingIdsOnBioseq,
                    format!("Conflicting ids on a Bioseq: ({} - {})", a, b),
                );
            }
        }
    }

    if scope.option(Options::VALIDATE_ID_SET) {
        for id in &bioseq.ids {
            if scope.index.id_count(id) > 1 && scope.index.seq_by_id(id) == Some(seq.ordinal) {
                scope.post(
                    out,
                    Severity::Error,
                    ErrorCode::CollidingSeqIds,
                    format!("Colliding {} in record", id),
                );
            }
        }
    }
    Ok(())
}

/// Why an identifier is malformed, if it is.
pub fn format_problem(id: &SeqId, is_protein: bool) -> Option<String> {
    match id {
        SeqId::Local(ObjectId::Str(s)) if s.len() > MAX_LOCAL_ID_LEN => Some(format!(
            "Local identifier {} is longer than {} characters",
            id, MAX_LOCAL_ID_LEN
        )),
        SeqId::Local(ObjectId::Str(s)) if s.trim().is_empty() => Some("Empty local identifier".to_string()),
        _ => {
            let accession = id.accession()?;
            let ok = match AccessionClass::of(id) {
                AccessionClass::RefSeq => REFSEQ.is_match(accession),
                class if class.is_insd() => {
                    if is_protein {
                        INSD_PROT.is_match(accession)
                    } else {
                        INSD_NUC.is_match(accession)
                    }
                }
                _ => true,
            };
            (!ok).then(|| format!("Bad accession {}", accession))
        }
    }
}

/// Two ids of the same class naming different records.
fn conflicts(a: &SeqId, b: &SeqId) -> bool {
    let class = AccessionClass::of(a);
    if class != AccessionClass::of(b) || class == AccessionClass::General {
        return false;
    }
    match (a, b) {
        (SeqId::Local(_), SeqId::Local(_)) | (SeqId::Gi(_), SeqId::Gi(_)) => a != b,
        _ => match (a.accession(), b.accession()) {
            (Some(x), Some(y)) => !x.eq_ignore_ascii_case(y),
            _ => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::model::SeqEntry;
    use crate::rules::testing::{Harness, codes};
    use rstest::rstest;

    #[rstest]
    #[case(SeqId::genbank("AB123456", Some(1)), false, true)]
    #[case(SeqId::genbank("U12345", Some(1)), false, true)]
    #[case(SeqId::genbank("AAAA01000001", Some(1)), false, true)]
    #[case(SeqId::genbank("AB12", Some(1)), false, false)]
    #[case(SeqId::genbank("AAA12345", Some(1)), true, true)]
    #[case(SeqId::genbank("AB123456", Some(1)), true, false)]
    #[case(SeqId::refseq("NC_000001", Some(1)), false, true)]
    #[case(SeqId::refseq("NC000001", Some(1)), false, false)]
    #[case(SeqId::local("nuc"), false, true)]
    fn test_accession_formats(#[case] id: SeqId, #[case] protein: bool, #[case] valid: bool) {
        assert_eq!(format_problem(&id, protein).is_none(), valid);
    }

    #[test]
    fn test_conflicting_ids() {
        let mut seq = fixtures::raw_dna(SeqId::genbank("AB123456", Some(1)), fixtures::CODING_NUC);
        seq.ids.push(SeqId::genbank("AB654321", Some(1)));
        seq.ids.push(SeqId::local("nuc"));
        let entry = SeqEntry::Seq(seq);
        let findings = Harness::new().run(&entry, |scope, out| check(scope.index.seq(0), scope, out));
        assert_eq!(codes(&findings), vec![ErrorCode::ConflictingIdsOnBioseq]);
        assert_eq!(findings[0].accession, "AB123456.1");
    }

    #[test]
    fn test_colliding_ids_need_option() {
        let a = fixtures::raw_dna(SeqId::local("dup"), "ACGT");
        let entry = SeqEntry::Set(crate::model::BioseqSet::new(
            crate::model::SetClass::Genbank,
            vec![a.clone().into(), a.into()],
        ));
        let quiet = Harness::new().run(&entry, |scope, out| check(scope.index.seq(0), scope, out));
        assert!(quiet.is_empty());

        let harness = Harness::new().with_options(Options::VALIDATE_ID_SET);
        let loud = harness.run(&entry, |scope, out| {
            check(scope.index.seq(0), scope, out)?;
            check(scope.index.seq(1), scope, out)
        });
        assert_eq!(codes(&loud), vec![ErrorCode::CollidingSeqIds]);
    }

    #[test]
    fn test_no_ids() {
        let mut seq = fixtures::raw_dna(SeqId::local("x"), "ACGT");
        seq.ids.clear();
        let entry = SeqEntry::Seq(seq);
        let findings = Harness::new().run(&entry, |scope, out| check(scope.index.seq(0), scope, out));
        assert_eq!(codes(&findings), vec![ErrorCode::NoIdOnBioseq]);
        assert_eq!(findings[0].severity, Severity::Critical);
    }
}
