//! Sequence-instance legality: representation, residues and length.

use super::Scope;
use crate::config::Options;
use crate::diag::{ErrorCode, FindingSink, Severity};
use crate::error::Result;
use crate::index::SeqHandle;
use crate::model::{Completeness, MolType, SeqData, SeqExt, SeqInst, SeqRepr, Topology};
use crate::seq::alphabet;

/// Invalid residues reported one by one before the rest are summarized.
const RESIDUE_REPORT_LIMIT: usize = 10;

pub fn check(seq: &SeqHandle<'_>, scope: &Scope<'_, '_>, out: &mut FindingSink) -> Result<()> {
    let inst = &seq.seq.inst;

    if let Some((code, message)) = repr_problem(inst) {
        scope.post(out, Severity::Critical, code, message);
    }

    if inst.mol == MolType::NotSet {
        scope.post(out, Severity::Error, ErrorCode::MolNotSet, "Bioseq.mol is 0");
    }

    if let (SeqRepr::Raw | SeqRepr::Const, Some(data)) = (inst.repr, &inst.seq_data) {
        check_alphabet(inst.mol, data, scope, out);
        check_data_length(inst, data, scope, out);
    }

    if inst.topology == Topology::Circular && inst.mol.is_na() {
        let complete = scope
            .ctx
            .molinfo
            .is_some_and(|m| m.completeness == Completeness::Complete);
        if !complete {
            scope.post(
                out,
                Severity::Warning,
                ErrorCode::CompleteCircleProblem,
                "Circular topology without complete flag set",
            );
        }
    }

    if scope.option(Options::INDEXER_MODE)
        && inst.mol.is_na()
        && inst.len() < scope.config.min_sequence_length
        && !scope.ctx.molinfo.is_some_and(|m| m.completeness == Completeness::Partial)
    {
        scope.post(
            out,
            Severity::Warning,
            ErrorCode::ShortSeq,
            format!("Sequence only {} residues", inst.len()),
        );
    }
    Ok(())
}

/// The representation state machine: which combinations of `repr`,
/// residue data and extension are legal.
pub fn repr_problem(inst: &SeqInst) -> Option<(ErrorCode, String)> {
    let repr = inst.repr.label();
    let has_data = inst.seq_data.is_some();
    let ext = inst.ext.as_ref();

    let ext_matches = |want: fn(&SeqExt) -> bool| ext.is_some_and(want);
    let missing_ext = || {
        Some((
            ErrorCode::ExtBadOrMissing,
            format!("Missing or incorrect Seq-ext on {} Bioseq", repr),
        ))
    };
    let data_not_allowed = || {
        Some((
            ErrorCode::SeqDataNotAllowed,
            format!("Seq-data not allowed on {} Bioseq", repr),
        ))
    };

    match inst.repr {
        SeqRepr::NotSet | SeqRepr::Consen | SeqRepr::Other => Some((
            ErrorCode::ReprInvalid,
            format!("Invalid Bioseq->repr = {}", repr),
        )),
        SeqRepr::Virtual => {
            if ext.is_some() {
                Some((ErrorCode::ExtNotAllowed, "Virtual Bioseq has ext".to_string()))
            } else if has_data {
                Some((ErrorCode::SeqDataNotAllowed, "Virtual Bioseq has data".to_string()))
            } else {
                None
            }
        }
        SeqRepr::Raw | SeqRepr::Const => {
            if ext.is_some() {
                Some((
                    ErrorCode::ExtNotAllowed,
                    format!("Bioseq-ext not allowed on {} Bioseq", repr),
                ))
            } else if !has_data {
                Some((
                    ErrorCode::SeqDataNotFound,
                    format!("Missing Seq-data on {} Bioseq", repr),
                ))
            } else {
                None
            }
        }
        SeqRepr::Seg if !ext_matches(|e| matches!(e, SeqExt::Seg(_))) => missing_ext(),
        SeqRepr::Ref if !ext_matches(|e| matches!(e, SeqExt::Ref(_))) => missing_ext(),
        SeqRepr::Map if !ext_matches(|e| matches!(e, SeqExt::Map(_))) => missing_ext(),
        SeqRepr::Delta if !ext_matches(|e| matches!(e, SeqExt::Delta(_))) => missing_ext(),
        SeqRepr::Seg | SeqRepr::Ref | SeqRepr::Map | SeqRepr::Delta if has_data => data_not_allowed(),
        SeqRepr::Seg | SeqRepr::Ref | SeqRepr::Map | SeqRepr::Delta => None,
    }
}

fn check_alphabet(mol: MolType, data: &SeqData, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    let mismatched = match mol {
        MolType::Aa => !data.is_protein() && !data.is_gap(),
        MolType::Dna | MolType::Rna | MolType::Na => data.is_protein(),
        _ => false,
    };
    if mismatched {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::InvalidResidue,
            "Sequence alphabet does not match molecule type",
        );
        return;
    }

    let invalid = alphabet::invalid_residues(data);
    for (pos, residue) in invalid.iter().take(RESIDUE_REPORT_LIMIT) {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::InvalidResidue,
            format!("Invalid residue '{}' at position [{}]", residue, pos + 1),
        );
    }
    if invalid.len() > RESIDUE_REPORT_LIMIT {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::InvalidResidue,
            format!("More than {} invalid residues. Checking stopped", RESIDUE_REPORT_LIMIT),
        );
    }
}

fn check_data_length(inst: &SeqInst, data: &SeqData, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    let Some(held) = alphabet::data_len(data) else {
        return;
    };
    let declared = inst.len();
    if held < declared {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::SeqDataLenWrong,
            format!("Bioseq.seq_data too short [{}] for given length [{}]", held, declared),
        );
    } else if held > declared && !alphabet::is_packed(data) {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::SeqDataLenWrong,
            format!(
                "Length of sequence data [{}] greater than Bioseq.length [{}]",
                held, declared
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::model::{Descriptor, MolInfo, SeqEntry, SeqLoc};
    use crate::rules::testing::{Harness, codes};
    use rstest::rstest;

    fn inst(repr: SeqRepr, data: bool, ext: Option<SeqExt>) -> SeqInst {
        SeqInst {
            repr,
            mol: MolType::Dna,
            length: Some(4),
            topology: Topology::Linear,
            strand: None,
            seq_data: data.then(|| SeqData::Iupacna("ACGT".into())),
            ext,
        }
    }

    fn run(seq: crate::model::Bioseq, harness: &Harness) -> Vec<crate::diag::Finding> {
        let entry = SeqEntry::Seq(seq);
        harness.run(&entry, |scope, out| check(scope.index.seq(0), scope, out))
    }

    #[rstest]
    #[case(SeqRepr::Raw, true, None, None)]
    #[case(SeqRepr::Raw, false, None, Some(ErrorCode::SeqDataNotFound))]
    #[case(SeqRepr::Raw, true, Some(SeqExt::Delta(vec![])), Some(ErrorCode::ExtNotAllowed))]
    #[case(SeqRepr::Const, false, Some(SeqExt::Delta(vec![])), Some(ErrorCode::ExtNotAllowed))]
    #[case(SeqRepr::Virtual, false, None, None)]
    #[case(SeqRepr::Virtual, true, None, Some(ErrorCode::SeqDataNotAllowed))]
    #[case(SeqRepr::Delta, false, Some(SeqExt::Delta(vec![])), None)]
    #[case(SeqRepr::Delta, false, Some(SeqExt::Seg(vec![])), Some(ErrorCode::ExtBadOrMissing))]
    #[case(SeqRepr::Delta, true, Some(SeqExt::Delta(vec![])), Some(ErrorCode::SeqDataNotAllowed))]
    #[case(SeqRepr::Seg, false, Some(SeqExt::Seg(vec![SeqLoc::Null])), None)]
    #[case(SeqRepr::Map, false, None, Some(ErrorCode::ExtBadOrMissing))]
    #[case(SeqRepr::Ref, false, Some(SeqExt::Ref(SeqLoc::Null)), None)]
    #[case(SeqRepr::NotSet, true, None, Some(ErrorCode::ReprInvalid))]
    fn test_repr_table(
        #[case] repr: SeqRepr,
        #[case] data: bool,
        #[case] ext: Option<SeqExt>,
        #[case] expected: Option<ErrorCode>,
    ) {
        assert_eq!(repr_problem(&inst(repr, data, ext)).map(|(c, _)| c), expected);
    }

    #[test]
    fn test_good_sequence_is_clean() {
        let findings = run(fixtures::raw_dna(fixtures::nuc_id(), fixtures::CODING_NUC), &Harness::new());
        assert!(findings.is_empty(), "{:?}", findings);
    }

    #[test]
    fn test_invalid_residue_and_length() {
        let mut seq = fixtures::raw_dna(fixtures::nuc_id(), "ACGEACGT");
        seq.inst.length = Some(10);
        let findings = run(seq, &Harness::new());
        assert_eq!(codes(&findings), vec![ErrorCode::InvalidResidue, ErrorCode::SeqDataLenWrong]);
        assert_eq!(findings[0].message, "Invalid residue 'E' at position [4]");
        assert_eq!(findings[1].message, "Bioseq.seq_data too short [8] for given length [10]");
    }

    #[test]
    fn test_mol_not_set_and_circle() {
        let mut seq = fixtures::raw_dna(fixtures::nuc_id(), "ACGT");
        seq.inst.mol = MolType::NotSet;
        assert_eq!(codes(&run(seq, &Harness::new())), vec![ErrorCode::MolNotSet]);

        let mut circular = fixtures::raw_dna(fixtures::nuc_id(), "ACGT");
        circular.inst.topology = Topology::Circular;
        assert_eq!(
            codes(&run(circular.clone(), &Harness::new())),
            vec![ErrorCode::CompleteCircleProblem]
        );
        circular.descr.push(Descriptor::MolInfo(
            MolInfo::new(crate::model::Biomol::Genomic).with_completeness(Completeness::Complete),
        ));
        assert!(run(circular, &Harness::new()).is_empty());
    }

    #[test]
    fn test_short_sequence_only_in_indexer_mode() {
        let seq = fixtures::raw_dna(fixtures::nuc_id(), "ACGTACGT");
        assert!(run(seq.clone(), &Harness::new()).is_empty());
        let findings = run(seq, &Harness::new().with_options(Options::INDEXER_MODE));
        assert_eq!(codes(&findings), vec![ErrorCode::ShortSeq]);
        assert_eq!(findings[0].message, "Sequence only 8 residues");
    }
}
