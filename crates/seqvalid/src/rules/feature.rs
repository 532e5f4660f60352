//! Checks every feature gets regardless of its type: location sanity,
//! partial flags, type versus molecule, duplicates, identifiers, exception
//! text and genetic code.

use super::{Exemption, FeatureSubject, Scope, exceptions, first_non_ascii};
use crate::config::Options;
use crate::diag::{ErrorCode, FindingSink, Severity};
use crate::error::Result;
use crate::model::{Biomol, FeatData, SeqId, SeqLoc, Span, Topology};
use crate::seq::GeneticCode;

pub fn check(subject: &FeatureSubject<'_, '_>, scope: &Scope<'_, '_>, out: &mut FindingSink) -> Result<()> {
    check_location(subject, scope, out);
    check_partials(subject, scope, out);
    check_type(subject, scope, out);
    check_duplicate(subject, scope, out);
    check_feature_id(subject, scope, out);
    check_exception_text(subject, scope, out);
    check_genetic_code(subject, scope, out);
    if scope.option(Options::STRICT_ASCII) {
        check_ascii(subject, scope, out);
    }
    Ok(())
}

fn spans<'f>(loc: &'f SeqLoc, scope: &Scope<'_, '_>) -> Vec<Span<'f>> {
    loc.spans(&|id: &SeqId| scope.index.bioseq_len(id))
}

fn check_location(subject: &FeatureSubject<'_, '_>, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    let loc = &subject.feat().location;
    if matches!(loc, SeqLoc::Null) {
        return;
    }
    let spans = spans(loc, scope);

    for span in &spans {
        let Some(len) = scope.index.bioseq_len(span.id) else {
            continue;
        };
        if span.from > span.to {
            scope.post(
                out,
                Severity::Error,
                ErrorCode::Range,
                format!("Location: {} has an interval with from greater than to", loc.label()),
            );
            break;
        }
        if span.to >= len {
            scope.post(
                out,
                Severity::Error,
                ErrorCode::Range,
                format!("Location: {} has an interval greater than the sequence length", loc.label()),
            );
            break;
        }
    }

    let circular = subject
        .handle
        .target
        .is_some_and(|t| scope.index.seq(t).seq.inst.topology == Topology::Circular);
    if !circular && !subject.is_exempt(Exemption::SeqLocOrder) && out_of_order(&spans) {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::SeqLocOrder,
            format!("Intervals out of order in SeqLoc [{}]", loc.label()),
        );
    }

    if loc.strand().is_none() && !subject.is_exempt(Exemption::MixedStrand) {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::MixedStrand,
            format!("Mixed strands in SeqLoc [{}]", loc.label()),
        );
    }

    if loc.ids().iter().any(|id| scope.index.seq_by_id(id).is_none()) {
        scope.post(
            out,
            Severity::Warning,
            ErrorCode::FarLocation,
            "Feature has 'far' location - accession not packaged in record",
        );
    }
}

/// Consecutive pieces on one sequence must run in the direction of their
/// strand.
fn out_of_order(spans: &[Span<'_>]) -> bool {
    spans.windows(2).any(|pair| {
        let (prev, cur) = (&pair[0], &pair[1]);
        if prev.id != cur.id || !prev.strand.same_direction(cur.strand) {
            return false;
        }
        if cur.strand.is_minus() {
            cur.to > prev.to
        } else {
            cur.from < prev.from
        }
    })
}

fn check_partials(subject: &FeatureSubject<'_, '_>, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    let feat = subject.feat();
    let loc_partial = feat.location.has_any_partial();
    if feat.partial != loc_partial {
        let message = if feat.partial {
            "Inconsistent: Feature.partial is TRUE but location is complete"
        } else {
            "Inconsistent: Feature.partial is FALSE but location is partial"
        };
        scope.post(out, Severity::Warning, ErrorCode::PartialsInconsistent, message);
    }
    if !loc_partial {
        return;
    }

    let spans = feat.location.explicit_spans();
    let last = spans.len().saturating_sub(1);
    let internal = spans
        .iter()
        .enumerate()
        .any(|(i, s)| (s.partial_start && i != 0) || (s.partial_stop && i != last));
    if internal {
        scope.post(
            out,
            Severity::Warning,
            ErrorCode::PartialProblem,
            "Internal partial intervals do not include first/last residue of sequence",
        );
    }

    let Some(target) = subject.handle.target else {
        return;
    };
    if !scope.index.seq(target).seq.is_na() || subject.is_exempt(Exemption::Partial) {
        return;
    }
    if let Some(first) = spans.first().filter(|s| s.partial_start) {
        if !at_sequence_end(scope, target, first.five_prime(), !first.strand.is_minus()) {
            scope.post(
                out,
                Severity::Warning,
                ErrorCode::PartialProblem,
                "Start does not include first/last residue of sequence",
            );
        }
    }
    if let Some(end) = spans.last().filter(|s| s.partial_stop) {
        if !at_sequence_end(scope, target, end.three_prime(), end.strand.is_minus()) {
            scope.post(
                out,
                Severity::Warning,
                ErrorCode::PartialProblem,
                "Stop does not include first/last residue of sequence",
            );
        }
    }
}

/// Whether `pos` is the first (`toward_start`) or last base of the
/// sequence, or sits next to a gap or N in that direction.
fn at_sequence_end(scope: &Scope<'_, '_>, seq: usize, pos: usize, toward_start: bool) -> bool {
    let len = scope.index.seq(seq).seq.inst.len();
    let neighbour = if toward_start {
        match pos.checked_sub(1) {
            Some(p) => p,
            None => return true,
        }
    } else {
        if pos + 1 >= len {
            return true;
        }
        pos + 1
    };
    match scope.index.residues(seq).and_then(|r| r.get(neighbour)) {
        Some(&base) => matches!(base, b'N' | b'n' | b'-'),
        // unknown residues cannot prove the end is extendable
        None => true,
    }
}

fn check_type(subject: &FeatureSubject<'_, '_>, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    let Some(target) = subject.handle.target else {
        return;
    };
    let seq = scope.index.seq(target).seq;
    let data = &subject.feat().data;
    if seq.is_na() && data.is_protein_only() {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::FeatInvalidForType,
            "Invalid feature for a nucleotide Bioseq.",
        );
    } else if seq.is_aa() && data.is_nucleotide_only() {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::FeatInvalidForType,
            "Invalid feature for a protein Bioseq.",
        );
    } else if data.is_mrna() && scope.ctx.molinfo.is_some_and(|m| m.biomol == Biomol::Mrna) {
        scope.post(
            out,
            Severity::Warning,
            ErrorCode::FeatInvalidForType,
            "mRNA feature is invalid on an mRNA (cDNA) Bioseq.",
        );
    }
}

fn check_duplicate(subject: &FeatureSubject<'_, '_>, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    let Some(dup) = scope.index.duplicate_of(subject.ordinal()) else {
        return;
    };
    if dup.same_label {
        scope.post(out, Severity::Error, ErrorCode::DuplicateFeat, "Duplicate feature");
    } else {
        scope.post(
            out,
            Severity::Warning,
            ErrorCode::DuplicateFeat,
            "Features have identical intervals, but labels differ",
        );
    }
}

fn check_feature_id(subject: &FeatureSubject<'_, '_>, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    let Some(id) = subject.feat().id else {
        return;
    };
    let sharing = scope.index.features_with_id(id);
    if sharing.len() > 1 && sharing.first() != Some(&subject.ordinal()) {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::CollidingFeatureIds,
            format!("Colliding feature ID {}", id.0),
        );
    }
}

fn check_exception_text(subject: &FeatureSubject<'_, '_>, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    let feat = subject.feat();
    let has_text = feat.except_text.as_deref().is_some_and(|t| !t.trim().is_empty());
    match (feat.except, has_text) {
        (true, false) => scope.post(
            out,
            Severity::Warning,
            ErrorCode::ExceptionProblem,
            "Exception flag is set, but exception text is empty",
        ),
        (false, true) => scope.post(
            out,
            Severity::Warning,
            ErrorCode::ExceptionProblem,
            "Exception text is present, but exception flag is not set",
        ),
        _ => {}
    }
    for text in exceptions::unknown_texts(feat) {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::ExceptionProblem,
            format!("{} is not a legal exception explanation", text),
        );
    }
}

fn check_genetic_code(subject: &FeatureSubject<'_, '_>, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    let FeatData::Cdregion(cds) = &subject.feat().data else {
        return;
    };
    let Some(code) = cds.code else {
        return;
    };
    if GeneticCode::by_id(code).is_none() {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::GenCodeMismatch,
            format!("Genetic code {} is not a valid code", code),
        );
        return;
    }
    if let Some(organism) = scope.ctx.genetic_code.filter(|g| *g != code) {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::GenCodeMismatch,
            format!(
                "Genetic code conflict between CDS (code {}) and BioSource (code {})",
                code, organism
            ),
        );
    }
}

fn check_ascii(subject: &FeatureSubject<'_, '_>, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    let feat = subject.feat();
    let texts = feat
        .comment
        .iter()
        .map(String::as_str)
        .chain(feat.qual.iter().map(|q| q.val.as_str()));
    if let Some(c) = texts.filter_map(first_non_ascii).next() {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::NonAsciiAsn,
            format!("Non-ASCII character '{}' found in feature", c),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::Finding;
    use crate::fixtures;
    use crate::model::{
        Bioseq, Cdregion, GeneRef, ImpFeat, ProtRef, SeqAnnot, SeqEntry, SeqFeat, SeqInterval,
        Strand,
    };
    use crate::rules::testing::{Harness, codes};
    use pretty_assertions::assert_eq;

    fn nuc(feats: Vec<SeqFeat>) -> SeqEntry {
        let mut seq: Bioseq = match fixtures::good_nucleotide() {
            SeqEntry::Seq(seq) => seq,
            SeqEntry::Set(_) => unreachable!(),
        };
        seq.annot.push(SeqAnnot::ftable(feats));
        SeqEntry::Seq(seq)
    }

    fn run(entry: &SeqEntry, harness: Harness) -> Vec<Finding> {
        harness.run(entry, |scope, out| {
            for handle in scope.index.features() {
                check(&FeatureSubject::new(handle), scope, out)?;
            }
            Ok(())
        })
    }

    fn misc(loc: SeqLoc) -> SeqFeat {
        SeqFeat::new(FeatData::Imp(ImpFeat::new("misc_feature")), loc)
    }

    fn interval(from: usize, to: usize, strand: Strand) -> SeqInterval {
        SeqInterval::new(fixtures::nuc_id(), from, to, strand)
    }

    #[test]
    fn test_clean_feature() {
        let entry = nuc(vec![misc(SeqLoc::int(fixtures::nuc_id(), 0, 26))]);
        assert!(run(&entry, Harness::new()).is_empty());
    }

    #[test]
    fn test_location_problems() {
        let entry = nuc(vec![
            misc(SeqLoc::int(fixtures::nuc_id(), 10, 80)),
            misc(SeqLoc::packed(vec![interval(30, 40, Strand::Plus), interval(0, 10, Strand::Plus)])),
            misc(SeqLoc::packed(vec![interval(0, 10, Strand::Plus), interval(20, 30, Strand::Minus)])),
            misc(SeqLoc::int(SeqId::genbank("AY000001", Some(1)), 0, 10)),
        ]);
        let findings = run(&entry, Harness::new());
        assert_eq!(
            codes(&findings),
            vec![
                ErrorCode::Range,
                ErrorCode::SeqLocOrder,
                ErrorCode::MixedStrand,
                ErrorCode::FarLocation,
            ]
        );
        assert_eq!(
            findings[0].message,
            "Location: lcl|nuc:11-81 has an interval greater than the sequence length"
        );
    }

    #[test]
    fn test_trans_splicing_exempts_order_and_strand() {
        let feat = misc(SeqLoc::packed(vec![interval(30, 40, Strand::Plus), interval(0, 10, Strand::Minus)]))
            .with_exception("trans-splicing");
        assert!(run(&nuc(vec![feat]), Harness::new()).is_empty());
    }

    #[test]
    fn test_partials() {
        let mut start_partial = interval(0, 26, Strand::Plus);
        start_partial.partial_start = true;
        let mut inner = interval(3, 26, Strand::Plus);
        inner.partial_start = true;
        let mut unextendable = interval(4, 26, Strand::Plus);
        unextendable.partial_start = true;
        let entry = nuc(vec![
            // at the first residue: fine once the flag agrees
            misc(SeqLoc::Int(start_partial)).partial(),
            misc(SeqLoc::Int(inner)),
            misc(SeqLoc::Int(unextendable))
                .partial()
                .with_exception("unextendable partial coding region"),
        ]);
        let findings = run(&entry, Harness::new());
        assert_eq!(
            codes(&findings),
            vec![ErrorCode::PartialsInconsistent, ErrorCode::PartialProblem]
        );
        assert_eq!(findings[1].message, "Start does not include first/last residue of sequence");
    }

    #[test]
    fn test_protein_feature_on_nucleotide() {
        let entry = nuc(vec![SeqFeat::new(
            FeatData::Prot(ProtRef::named("p")),
            SeqLoc::int(fixtures::nuc_id(), 0, 26),
        )]);
        let findings = run(&entry, Harness::new());
        assert_eq!(codes(&findings), vec![ErrorCode::FeatInvalidForType]);
        assert_eq!(findings[0].message, "Invalid feature for a nucleotide Bioseq.");
    }

    #[test]
    fn test_duplicates_and_colliding_ids() {
        let loc = || SeqLoc::int(fixtures::nuc_id(), 0, 26);
        let entry = nuc(vec![
            SeqFeat::new(FeatData::Gene(GeneRef::locus("a")), loc()).with_id(1),
            SeqFeat::new(FeatData::Gene(GeneRef::locus("a")), loc()).with_id(1),
            SeqFeat::new(FeatData::Gene(GeneRef::locus("b")), loc()),
        ]);
        let findings = run(&entry, Harness::new());
        let messages: Vec<&str> = findings.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Duplicate feature",
                "Colliding feature ID 1",
                "Features have identical intervals, but labels differ",
            ]
        );
    }

    #[test]
    fn test_exception_text() {
        let mut flag_only = misc(SeqLoc::int(fixtures::nuc_id(), 30, 40));
        flag_only.except = true;
        let entry = nuc(vec![
            misc(SeqLoc::int(fixtures::nuc_id(), 0, 26)).with_exception("RNA editing, made up reason"),
            flag_only,
        ]);
        let findings = run(&entry, Harness::new());
        let messages: Vec<&str> = findings.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "made up reason is not a legal exception explanation",
                "Exception flag is set, but exception text is empty",
            ]
        );
    }

    #[test]
    fn test_genetic_code_conflict() {
        let cds = |code| {
            SeqFeat::new(
                FeatData::Cdregion(Cdregion {
                    code: Some(code),
                    ..Default::default()
                }),
                SeqLoc::int(fixtures::nuc_id(), 0, 26),
            )
        };
        let findings = run(&nuc(vec![cds(1)]), Harness::new());
        assert!(findings.is_empty());

        let findings = run(&nuc(vec![cds(11)]), Harness::new());
        assert_eq!(
            findings[0].message,
            "Genetic code conflict between CDS (code 11) and BioSource (code 1)"
        );
        let findings = run(&nuc(vec![cds(7)]), Harness::new());
        assert_eq!(findings[0].message, "Genetic code 7 is not a valid code");
    }

    #[test]
    fn test_non_ascii_only_when_strict() {
        let entry = nuc(vec![misc(SeqLoc::int(fixtures::nuc_id(), 0, 26)).with_comment("caf\u{e9}")]);
        assert!(run(&entry, Harness::new()).is_empty());
        let findings = run(&entry, Harness::new().with_options(Options::STRICT_ASCII));
        assert_eq!(codes(&findings), vec![ErrorCode::NonAsciiAsn]);
    }
}
