//! CDS and mRNA pairing, transcript products, and feature-id
//! cross-references.

use std::collections::HashSet;

use super::{Exemption, FeatureSubject, Scope, cds, is_pseudo};
use crate::diag::{ErrorCode, FindingSink, Severity};
use crate::error::Result;
use crate::index::FeatHandle;
use crate::model::{FeatData, SeqId, SeqLoc, SetClass, Span};

/// Share of a product's extra tail that must be A for it to count as polyA.
const POLY_A_PERCENT: usize = 95;

pub fn check(subject: &FeatureSubject<'_, '_>, scope: &Scope<'_, '_>, out: &mut FindingSink) -> Result<()> {
    let data = &subject.feat().data;
    if data.is_cds() {
        check_cds_mrnas(subject, scope, out);
    }
    if data.is_mrna() {
        check_gene_consistency(subject, scope, out);
        if !is_pseudo(subject, scope) && !subject.is_exempt(Exemption::Transcript) {
            check_transcript(subject, scope, out);
        }
    }
    check_xrefs(subject, scope, out);
    Ok(())
}

fn check_cds_mrnas(subject: &FeatureSubject<'_, '_>, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    let index = scope.index;
    let mrnas = index.mrnas_for_cds(subject.ordinal());
    let pseudo = is_pseudo(subject, scope);

    if scope.ctx.in_set(SetClass::GenProdSet) && !pseudo {
        match mrnas.len() {
            0 => scope.post(
                out,
                Severity::Warning,
                ErrorCode::CdsWithNoMrna,
                "CDS has no associated mRNA",
            ),
            1 => {}
            n => scope.post(
                out,
                Severity::Warning,
                ErrorCode::CdsWithMultipleMrnas,
                format!("CDS overlapped by {} mRNAs, but only one is expected", n),
            ),
        }
    }

    let len_of = |id: &SeqId| index.bioseq_len(id);
    let cds_spans = subject.feat().location.spans(&len_of);
    for &m in mrnas {
        let mrna = index.feat(m);
        let severity = if pseudo || mrna.feat.is_pseudo() {
            Severity::Info
        } else {
            Severity::Warning
        };
        let message = if !mrna.contains(subject.handle) {
            "mRNA overlaps or contains CDS but does not completely contain intervals"
        } else if !boundaries_agree(&cds_spans, &mrna.feat.location.spans(&len_of), subject.handle) {
            "mRNA contains CDS but internal intron-exon boundaries do not match"
        } else {
            continue;
        };
        scope.post(out, severity, ErrorCode::CdsMrnaRange, message);
    }
}

/// Introns as (last base of the upstream exon, first base of the next).
fn introns(spans: &[Span<'_>]) -> Vec<(usize, usize)> {
    spans
        .windows(2)
        .filter(|pair| pair[0].id == pair[1].id)
        .map(|pair| (pair[0].three_prime(), pair[1].five_prime()))
        .collect()
}

/// Every CDS intron is an mRNA intron, and every mRNA intron inside the
/// coding extent is a CDS intron.
fn boundaries_agree(cds: &[Span<'_>], mrna: &[Span<'_>], extent: &FeatHandle<'_>) -> bool {
    let cds_introns: HashSet<_> = introns(cds).into_iter().collect();
    let mrna_introns: HashSet<_> = introns(mrna).into_iter().collect();
    let inside = |(a, b): &(usize, usize)| {
        let (lo, hi) = if a < b { (*a, *b) } else { (*b, *a) };
        extent.left <= lo && hi <= extent.right
    };
    cds_introns.is_subset(&mrna_introns)
        && mrna_introns
            .iter()
            .filter(|intron| inside(intron))
            .all(|intron| cds_introns.contains(intron))
}

/// The gene annotated on a packaged mRNA product must be the gene of the
/// mRNA feature on the genomic sequence.
fn check_gene_consistency(subject: &FeatureSubject<'_, '_>, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    let index = scope.index;
    let Some(product_seq) = subject
        .feat()
        .product
        .as_ref()
        .and_then(SeqLoc::first_id)
        .and_then(|id| index.seq_by_id(id))
    else {
        return;
    };
    let Some(genomic) = index.gene_of(subject.ordinal()) else {
        return;
    };
    let Some(on_product) = index
        .located_on(product_seq)
        .iter()
        .copied()
        .find(|f| index.feat(*f).feat.data.is_gene())
    else {
        return;
    };
    if index.feature_label(on_product) != index.feature_label(genomic) {
        scope.post(
            out,
            Severity::Warning,
            ErrorCode::GenesInconsistent,
            "Gene on mRNA bioseq does not match gene on genomic bioseq",
        );
    }
}

/// Compare the bases under an mRNA with its product sequence.
fn check_transcript(subject: &FeatureSubject<'_, '_>, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    let feat = subject.feat();
    let Some((_, resolved)) = feat.product.as_ref().and_then(|p| cds::resolve_product(p, scope)) else {
        return;
    };
    let Some(product) = cds::product_residues(resolved, scope) else {
        return;
    };
    let Some(transcript) = scope.index.location_bases(&feat.location) else {
        return;
    };

    let (t, p) = (transcript.len(), product.len());
    if t < p {
        let tail = &product[t..];
        let adenines = tail.iter().filter(|b| b.eq_ignore_ascii_case(&b'A')).count();
        if adenines * 100 < tail.len() * POLY_A_PERCENT {
            scope.post(
                out,
                Severity::Error,
                ErrorCode::TranscriptLen,
                format!(
                    "Transcript length [{}] less than product length [{}], and tail < 95% polyA",
                    t, p
                ),
            );
        }
    } else if t > p {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::TranscriptLen,
            format!("Transcript length [{}] greater than product length [{}]", t, p),
        );
    }

    let mismatches = transcript
        .iter()
        .zip(product.iter())
        .filter(|(a, b)| {
            let (a, b) = (normalize(**a), normalize(**b));
            a != b'N' && b != b'N' && a != b
        })
        .count();
    if mismatches > 0 {
        scope.post(
            out,
            Severity::Warning,
            ErrorCode::TranscriptMismatches,
            format!(
                "There are {} mismatches out of {} bases between the transcript and product sequence",
                mismatches,
                t.min(p)
            ),
        );
    }
}

fn normalize(base: u8) -> u8 {
    match base.to_ascii_uppercase() {
        b'U' => b'T',
        other => other,
    }
}

fn legal_pair(a: &FeatData, b: &FeatData) -> bool {
    let kind = |d: &FeatData| {
        if d.is_cds() {
            Some(0)
        } else if d.is_mrna() {
            Some(1)
        } else if d.is_gene() {
            Some(2)
        } else {
            None
        }
    };
    matches!((kind(a), kind(b)), (Some(x), Some(y)) if x != y)
}

fn check_xrefs(subject: &FeatureSubject<'_, '_>, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    let index = scope.index;
    let feat = subject.feat();
    for id in feat.xref_ids() {
        let targets = index.features_with_id(id);
        if targets.is_empty() {
            scope.post(
                out,
                Severity::Warning,
                ErrorCode::SeqFeatXrefProblem,
                format!("Cross-referenced feature (id {}) does not exist", id.0),
            );
            continue;
        }
        for &t in targets {
            let other = index.feat(t).feat;
            if !legal_pair(&feat.data, &other.data) {
                scope.post(
                    out,
                    Severity::Warning,
                    ErrorCode::SeqFeatXrefProblem,
                    format!(
                        "Cross-references are not between CDS and mRNA pair or between a gene and a CDS or mRNA ({},{})",
                        feat.data.label(),
                        other.data.label()
                    ),
                );
                continue;
            }
            let transcript_pair = (feat.data.is_cds() && other.data.is_mrna())
                || (feat.data.is_mrna() && other.data.is_cds());
            let reciprocal = feat.id.is_some_and(|own| other.xref_ids().any(|back| back == own));
            if transcript_pair && !reciprocal {
                scope.post(
                    out,
                    Severity::Warning,
                    ErrorCode::SeqFeatXrefNotReciprocal,
                    "Cross-referenced feature does not link reciprocally",
                );
            }
        }
    }
}
