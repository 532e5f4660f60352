//! Delta-sequence structure: literals, gaps, far components and HTGS phase.

use super::{Scope, plural};
use crate::diag::{ErrorCode, FindingSink, Severity};
use crate::error::Result;
use crate::index::SeqHandle;
use crate::model::{DeltaSeq, IntFuzz, SeqId, SeqLiteral, SeqLoc, SeqRepr, Tech};
use crate::seq::alphabet;

/// Keyword that marks an HTGS phase 2 record as actively being finished.
pub const HTGS_ACTIVEFIN: &str = "HTGS_ACTIVEFIN";

pub fn check(seq: &SeqHandle<'_>, scope: &Scope<'_, '_>, out: &mut FindingSink) -> Result<()> {
    let inst = &seq.seq.inst;
    if let Some(parts) = inst.delta_parts().filter(|_| inst.repr == SeqRepr::Delta) {
        check_literals(parts, scope, out);
        check_terminal_and_adjacent_gaps(parts, scope, out);
        check_far_components(seq, parts, scope, out);
        check_total_length(inst.len(), parts, scope, out);
    }
    check_htgs_gaps(seq, scope, out);
    Ok(())
}

fn check_literals(parts: &[DeltaSeq], scope: &Scope<'_, '_>, out: &mut FindingSink) {
    for (i, part) in parts.iter().enumerate() {
        let DeltaSeq::Literal(lit) = part else {
            continue;
        };
        if lit.length == 0 {
            if lit.is_gap() {
                let message = match lit.fuzz {
                    Some(IntFuzz::Unk) => "Gap of unknown length 0 in delta chain",
                    Some(_) => "Gap of length 0 with fuzz in delta chain",
                    None => "Gap of length 0 in delta chain",
                };
                scope.post(out, Severity::Error, ErrorCode::SeqLitGapLength0, message);
            } else {
                scope.post(
                    out,
                    Severity::Error,
                    ErrorCode::SeqLitDataLength0,
                    format!("Seq-lit of length 0 in delta chain, component {}", i + 1),
                );
            }
            continue;
        }
        let Some(data) = lit.seq_data.as_ref().filter(|d| !d.is_gap()) else {
            continue;
        };
        for (pos, residue) in alphabet::invalid_residues(data).into_iter().take(1) {
            scope.post(
                out,
                Severity::Error,
                ErrorCode::InvalidResidue,
                format!(
                    "Invalid residue '{}' at position [{}] of delta component {}",
                    residue,
                    pos + 1,
                    i + 1
                ),
            );
        }
        if let Some(held) = alphabet::data_len(data).filter(|held| *held < lit.length) {
            scope.post(
                out,
                Severity::Error,
                ErrorCode::SeqDataLenWrong,
                format!(
                    "Seq-lit data too short [{}] for given length [{}] in delta component {}",
                    held,
                    lit.length,
                    i + 1
                ),
            );
        }
    }
}

fn is_gap_part(part: &DeltaSeq) -> bool {
    matches!(part, DeltaSeq::Literal(lit) if lit.is_gap())
}

fn check_terminal_and_adjacent_gaps(parts: &[DeltaSeq], scope: &Scope<'_, '_>, out: &mut FindingSink) {
    let severity = if scope.ctx.tech().allows_terminal_gaps() {
        Severity::Warning
    } else {
        Severity::Error
    };
    if parts.first().is_some_and(is_gap_part) {
        scope.post(
            out,
            severity,
            ErrorCode::BadDeltaSeq,
            "First delta seq component is a gap",
        );
    }
    if parts.len() > 1 && parts.last().is_some_and(is_gap_part) {
        scope.post(
            out,
            severity,
            ErrorCode::BadDeltaSeq,
            "Last delta seq component is a gap",
        );
    }

    let adjacent = parts
        .windows(2)
        .filter(|w| is_gap_part(&w[0]) && is_gap_part(&w[1]))
        .count();
    if adjacent > 0 {
        let verb = if adjacent == 1 { "is" } else { "are" };
        scope.post(
            out,
            Severity::Error,
            ErrorCode::BadDeltaSeq,
            format!(
                "There {} {} in delta seq",
                verb,
                plural(adjacent, "adjacent gap", "adjacent gaps")
            ),
        );
    }
}

/// One far component as 1-based displayed coordinates.
struct FarRange<'a> {
    id: &'a SeqId,
    start: usize,
    stop: usize,
}

fn check_far_components(
    seq: &SeqHandle<'_>,
    parts: &[DeltaSeq],
    scope: &Scope<'_, '_>,
    out: &mut FindingSink,
) {
    let mut ranges: Vec<FarRange<'_>> = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        let DeltaSeq::Loc(loc) = part else {
            continue;
        };
        if loc.ids().into_iter().any(|id| seq.seq.has_id(id)) {
            scope.post(
                out,
                Severity::Critical,
                ErrorCode::SelfReferentialSequence,
                format!("Self-referential delta sequence {}", loc.label()),
            );
            continue;
        }
        for span in loc.explicit_spans() {
            if span.is_reversed() {
                scope.post(
                    out,
                    Severity::Error,
                    ErrorCode::BadDeltaSeq,
                    format!(
                        "Delta component {} has an interval with from greater than to: {}",
                        i + 1,
                        loc.label()
                    ),
                );
                continue;
            }
            ranges.push(FarRange {
                id: span.id,
                start: span.from + 1,
                stop: span.to + 1,
            });
        }
    }

    for (i, a) in ranges.iter().enumerate() {
        for b in &ranges[i + 1..] {
            if a.id.key() == b.id.key() && a.start <= b.stop && b.start <= a.stop {
                scope.post(
                    out,
                    Severity::Warning,
                    ErrorCode::OverlappingDeltaRange,
                    format!(
                        "Overlapping delta range {}-{} and {}-{} on a Bioseq {}",
                        a.start, a.stop, b.start, b.stop, a.id
                    ),
                );
            }
        }
    }
}

/// Length a component contributes, when it can be known.
fn part_length(part: &DeltaSeq, scope: &Scope<'_, '_>) -> Option<usize> {
    match part {
        DeltaSeq::Literal(SeqLiteral { length, .. }) => Some(*length),
        DeltaSeq::Loc(SeqLoc::Whole(id)) => scope.index.bioseq_len(id),
        DeltaSeq::Loc(loc) => {
            let spans = loc.explicit_spans();
            // a reversed component has no length to add up
            if spans.iter().any(|s| s.is_reversed()) {
                return None;
            }
            Some(spans.iter().map(|s| s.len()).sum())
        }
    }
}

fn check_total_length(declared: usize, parts: &[DeltaSeq], scope: &Scope<'_, '_>, out: &mut FindingSink) {
    let total: Option<usize> = parts.iter().map(|p| part_length(p, scope)).sum();
    if let Some(total) = total.filter(|t| *t != declared) {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::SeqDataLenWrong,
            format!(
                "Bioseq.length [{}] does not match sum of delta segment lengths [{}]",
                declared, total
            ),
        );
    }
}

/// HTGS phases 0-2 are expected to carry gaps; phase 3 must not.
fn check_htgs_gaps(seq: &SeqHandle<'_>, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    let tech = scope.ctx.tech();
    if !tech.is_htgs() || !seq.seq.is_na() {
        return;
    }
    let inst = &seq.seq.inst;
    let (kind, gaps) = match inst.delta_parts() {
        Some(parts) => ("delta", parts.iter().filter(|p| is_gap_part(p)).count()),
        None if inst.repr == SeqRepr::Raw => ("raw", 0),
        None => return,
    };
    let phase = match tech {
        Tech::Htgs0 => 0,
        Tech::Htgs1 => 1,
        Tech::Htgs2 => 2,
        _ => 3,
    };

    if phase == 3 {
        if gaps > 0 {
            scope.post(
                out,
                Severity::Error,
                ErrorCode::BadHtgsSeq,
                format!("HTGS 3 sequence should not have gaps ({})", plural(gaps, "gap", "gaps")),
            );
        }
        return;
    }
    if gaps > 0 {
        return;
    }
    if phase == 2 {
        if !scope.ctx.has_keyword(HTGS_ACTIVEFIN) {
            scope.post(
                out,
                Severity::Warning,
                ErrorCode::MissingGaps,
                format!("HTGS 2 {} seq has no gaps and no {} keyword", kind, HTGS_ACTIVEFIN),
            );
        }
    } else {
        scope.post(
            out,
            Severity::Warning,
            ErrorCode::MissingGaps,
            format!("HTGS {} {} seq has no gaps", phase, kind),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::Finding;
    use crate::fixtures;
    use crate::model::{Bioseq, Descriptor, GbBlock, MolInfo, SeqEntry};
    use crate::rules::testing::{Harness, codes};
    use pretty_assertions::assert_eq;

    fn run(seq: Bioseq) -> Vec<Finding> {
        let entry = SeqEntry::Seq(seq);
        Harness::new().run(&entry, |scope, out| check(scope.index.seq(0), scope, out))
    }

    fn with_parts(parts: Vec<DeltaSeq>, length: usize) -> Bioseq {
        let mut seq = fixtures::delta_sequence();
        seq.inst = crate::model::SeqInst::delta(crate::model::MolType::Dna, parts, length);
        seq
    }

    #[test]
    fn test_delta_fixture_is_clean() {
        assert!(run(fixtures::delta_sequence()).is_empty());
    }

    #[test]
    fn test_length_mismatch_reported_once() {
        for declared in [31, 33, 100] {
            let mut seq = fixtures::delta_sequence();
            seq.inst.length = Some(declared);
            let findings = run(seq);
            assert_eq!(codes(&findings), vec![ErrorCode::SeqDataLenWrong]);
            assert_eq!(
                findings[0].message,
                format!(
                    "Bioseq.length [{}] does not match sum of delta segment lengths [32]",
                    declared
                )
            );
        }
    }

    #[test]
    fn test_zero_length_literals() {
        let seq = with_parts(
            vec![
                DeltaSeq::Literal(SeqLiteral::data("ACGT")),
                DeltaSeq::Literal(SeqLiteral::unknown_gap(0)),
                DeltaSeq::Literal(SeqLiteral::gap(0)),
                DeltaSeq::Literal(SeqLiteral::data("ACGT")),
            ],
            8,
        );
        let findings = run(seq);
        assert_eq!(
            codes(&findings),
            vec![
                ErrorCode::SeqLitGapLength0,
                ErrorCode::SeqLitGapLength0,
                ErrorCode::BadDeltaSeq
            ]
        );
        assert_eq!(findings[0].message, "Gap of unknown length 0 in delta chain");
        assert_eq!(findings[1].message, "Gap of length 0 in delta chain");
        assert_eq!(findings[2].message, "There is 1 adjacent gap in delta seq");
    }

    #[test]
    fn test_terminal_gaps() {
        let seq = with_parts(
            vec![
                DeltaSeq::Literal(SeqLiteral::gap(5)),
                DeltaSeq::Literal(SeqLiteral::data("ACGT")),
                DeltaSeq::Literal(SeqLiteral::gap(5)),
            ],
            14,
        );
        let findings = run(seq.clone());
        assert_eq!(codes(&findings), vec![ErrorCode::BadDeltaSeq, ErrorCode::BadDeltaSeq]);
        assert!(findings.iter().all(|f| f.severity == Severity::Error));

        let mut wgs = seq;
        wgs.descr.push(Descriptor::MolInfo(
            MolInfo::new(crate::model::Biomol::Genomic).with_tech(Tech::Wgs),
        ));
        assert!(run(wgs).iter().all(|f| f.severity == Severity::Warning));
    }

    #[test]
    fn test_far_components() {
        let other = SeqId::local("other");
        let seq = with_parts(
            vec![
                DeltaSeq::Loc(SeqLoc::int(other.clone(), 0, 9)),
                DeltaSeq::Loc(SeqLoc::int(other, 5, 14)),
                DeltaSeq::Loc(SeqLoc::int(SeqId::local("delta"), 0, 1)),
            ],
            22,
        );
        let findings = run(seq);
        assert_eq!(
            codes(&findings),
            vec![ErrorCode::SelfReferentialSequence, ErrorCode::OverlappingDeltaRange]
        );
        assert_eq!(
            findings[1].message,
            "Overlapping delta range 1-10 and 6-15 on a Bioseq lcl|other"
        );
    }

    #[test]
    fn test_reversed_far_component() {
        let far = SeqId::genbank("AB123456", Some(1));
        let seq = with_parts(
            vec![
                DeltaSeq::Literal(SeqLiteral::data("ACGTACGTAC")),
                DeltaSeq::Loc(SeqLoc::int(far, 20, 3)),
            ],
            28,
        );
        let findings = run(seq);
        assert_eq!(codes(&findings), vec![ErrorCode::BadDeltaSeq]);
        assert_eq!(findings[0].severity, Severity::Error);
        assert!(
            findings[0]
                .message
                .starts_with("Delta component 2 has an interval with from greater than to")
        );
    }

    #[test]
    fn test_htgs_phases() {
        let gapless = with_parts(vec![DeltaSeq::Literal(SeqLiteral::data("ACGTACGT"))], 8);
        let htgs = |tech: Tech, seq: &Bioseq| {
            let mut seq = seq.clone();
            seq.descr
                .push(Descriptor::MolInfo(MolInfo::new(crate::model::Biomol::Genomic).with_tech(tech)));
            seq
        };

        let findings = run(htgs(Tech::Htgs2, &gapless));
        assert_eq!(codes(&findings), vec![ErrorCode::MissingGaps]);
        assert_eq!(
            findings[0].message,
            "HTGS 2 delta seq has no gaps and no HTGS_ACTIVEFIN keyword"
        );

        let mut finishing = htgs(Tech::Htgs2, &gapless);
        finishing.descr.push(Descriptor::Genbank(GbBlock {
            keywords: vec![HTGS_ACTIVEFIN.to_string()],
            ..Default::default()
        }));
        assert!(run(finishing).is_empty());

        let findings = run(htgs(Tech::Htgs3, &fixtures::delta_sequence()));
        assert_eq!(codes(&findings), vec![ErrorCode::BadHtgsSeq]);
    }
}
