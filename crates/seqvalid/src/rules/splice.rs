//! Splice-site consensus at exon boundaries of coding regions and mRNAs,
//! at intron features, and optionally at exon features.
//!
//! Donors are `GT` or `GC`, acceptors `AG`; an intron reading `AT...AC`
//! is accepted as a whole.

use super::{Exemption, FeatureSubject, Scope, is_pseudo};
use crate::config::Options;
use crate::diag::{ErrorCode, FindingSink, Severity};
use crate::error::Result;
use crate::model::{FeatData, SeqId, Span};
use crate::seq::alphabet::is_acgt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Site {
    Donor,
    Acceptor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Consensus,
    NotConsensus,
    BadSequence,
}

/// Which side of the intron a message is written from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Exon,
    Intron { terminal: bool },
}

pub fn check(subject: &FeatureSubject<'_, '_>, scope: &Scope<'_, '_>, out: &mut FindingSink) -> Result<()> {
    let feat = subject.feat();
    let applies = match &feat.data {
        FeatData::Cdregion(_) => true,
        data if data.is_mrna() => true,
        data if data.is_imp("intron") => true,
        data if data.is_imp("exon") => scope.option(Options::VALIDATE_EXONS),
        _ => false,
    };
    if !applies || subject.is_exempt(Exemption::Splice) || is_pseudo(subject, scope) {
        return Ok(());
    }
    if scope.ctx.molinfo.is_some_and(|m| m.biomol.is_rna()) {
        return Ok(());
    }
    let spans = feat
        .location
        .spans(&|id: &SeqId| scope.index.bioseq_len(id));
    if feat.data.is_imp("intron") {
        if let [intron] = spans.as_slice() {
            check_intron(intron, scope, out);
        }
    } else if feat.data.is_imp("exon") {
        if let [exon] = spans.as_slice() {
            check_exon(subject, exon, scope, out);
        }
    } else {
        for pair in spans.windows(2) {
            let (upstream, downstream) = (&pair[0], &pair[1]);
            if upstream.id != downstream.id || upstream.strand.is_minus() != downstream.strand.is_minus() {
                continue;
            }
            let donor = (!upstream.partial_stop)
                .then(|| donor_after(upstream, scope))
                .flatten();
            let acceptor = (!downstream.partial_start)
                .then(|| acceptor_before(downstream, scope))
                .flatten();
            let (d, a) = judge(donor, acceptor);
            // each violation is worded from the intron and from the exon
            let step: i64 = if upstream.strand.is_minus() { -1 } else { 1 };
            let intron = Side::Intron { terminal: false };
            let intron_start = (upstream.three_prime() as i64 + step) as usize;
            let intron_end = (downstream.five_prime() as i64 - step) as usize;
            // an annotated intron reports its own ends
            if !intron_feature_at(upstream, Site::Donor, intron_start, scope) {
                report(Site::Donor, d, intron, intron_start, upstream.id, scope, out);
            }
            report(Site::Donor, d, Side::Exon, upstream.three_prime(), upstream.id, scope, out);
            if !intron_feature_at(downstream, Site::Acceptor, intron_end, scope) {
                report(Site::Acceptor, a, intron, intron_end, downstream.id, scope, out);
            }
            report(Site::Acceptor, a, Side::Exon, downstream.five_prime(), downstream.id, scope, out);
        }
    }
    Ok(())
}

/// Whether a checked intron feature on `exon`'s sequence and strand starts
/// (donor) or ends (acceptor) at `pos`.
fn intron_feature_at(exon: &Span<'_>, site: Site, pos: usize, scope: &Scope<'_, '_>) -> bool {
    let Some(seq) = scope.index.seq_by_id(exon.id) else {
        return false;
    };
    scope.index.located_on(seq).iter().any(|&i| {
        let handle = scope.index.feat(i);
        if !handle.feat.data.is_imp("intron") {
            return false;
        }
        let subject = FeatureSubject::new(handle);
        if subject.is_exempt(Exemption::Splice) || is_pseudo(&subject, scope) {
            return false;
        }
        match handle.feat.location.explicit_spans().as_slice() {
            [intron] if intron.strand.is_minus() == exon.strand.is_minus() => match site {
                Site::Donor => intron.five_prime() == pos,
                Site::Acceptor => intron.three_prime() == pos,
            },
            _ => false,
        }
    })
}

fn check_intron(intron: &Span<'_>, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    let Some(seq) = scope.index.seq_by_id(intron.id) else {
        return;
    };
    let len = scope.index.seq(seq).seq.inst.len();
    let minus = intron.strand.is_minus();
    let step: i64 = if minus { -1 } else { 1 };
    let five = intron.five_prime() as i64;
    let three = intron.three_prime() as i64;
    let donor = read_pair(seq, five, step, minus, scope);
    let acceptor = read_pair(seq, three - step, step, minus, scope);
    let (d, a) = judge(donor, acceptor);

    let at_start = |pos: usize| if minus { pos + 1 == len } else { pos == 0 };
    let at_end = |pos: usize| if minus { pos == 0 } else { pos + 1 == len };
    let terminal = at_start(intron.five_prime()) || at_end(intron.three_prime());
    let side = Side::Intron { terminal };
    report(Site::Donor, d, side, intron.five_prime(), intron.id, scope, out);
    report(Site::Acceptor, a, side, intron.three_prime(), intron.id, scope, out);
}

/// Exon features skip the ends they share with their gene or sequence.
fn check_exon(subject: &FeatureSubject<'_, '_>, exon: &Span<'_>, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    let gene_spans = scope
        .index
        .gene_of(subject.ordinal())
        .map(|g| scope.index.feat(g).feat.location.explicit_spans())
        .unwrap_or_default();
    let gene_five = gene_spans.first().map(Span::five_prime);
    let gene_three = gene_spans.last().map(Span::three_prime);

    if !exon.partial_start && gene_five != Some(exon.five_prime()) {
        let (_, a) = judge(None, acceptor_before(exon, scope));
        report(Site::Acceptor, a, Side::Exon, exon.five_prime(), exon.id, scope, out);
    }
    if !exon.partial_stop && gene_three != Some(exon.three_prime()) {
        let (d, _) = judge(donor_after(exon, scope), None);
        report(Site::Donor, d, Side::Exon, exon.three_prime(), exon.id, scope, out);
    }
}

/// The two bases after an exon, in reading direction.
fn donor_after(exon: &Span<'_>, scope: &Scope<'_, '_>) -> Option<[u8; 2]> {
    let seq = scope.index.seq_by_id(exon.id)?;
    let minus = exon.strand.is_minus();
    let step: i64 = if minus { -1 } else { 1 };
    read_pair(seq, exon.three_prime() as i64 + step, step, minus, scope)
}

/// The two bases before an exon, in reading direction.
fn acceptor_before(exon: &Span<'_>, scope: &Scope<'_, '_>) -> Option<[u8; 2]> {
    let seq = scope.index.seq_by_id(exon.id)?;
    let minus = exon.strand.is_minus();
    let step: i64 = if minus { -1 } else { 1 };
    read_pair(seq, exon.five_prime() as i64 - 2 * step, step, minus, scope)
}

fn read_pair(seq: usize, first: i64, step: i64, minus: bool, scope: &Scope<'_, '_>) -> Option<[u8; 2]> {
    let at = |pos: i64| {
        usize::try_from(pos)
            .ok()
            .and_then(|p| scope.index.base_at(seq, p, minus))
            .map(|b| b.to_ascii_uppercase())
    };
    Some([at(first)?, at(first + step)?])
}

/// Judge both ends of one intron; `None` ends are off the sequence and pass.
fn judge(donor: Option<[u8; 2]>, acceptor: Option<[u8; 2]>) -> (Verdict, Verdict) {
    if donor == Some(*b"AT") && acceptor == Some(*b"AC") {
        return (Verdict::Consensus, Verdict::Consensus);
    }
    let verdict = |bases: Option<[u8; 2]>, consensus: &[[u8; 2]]| match bases {
        None => Verdict::Consensus,
        Some(b) if consensus.contains(&b) => Verdict::Consensus,
        Some(b) if !b.iter().all(|&x| is_acgt(x)) => Verdict::BadSequence,
        Some(_) => Verdict::NotConsensus,
    };
    (
        verdict(donor, &[*b"GT", *b"GC"]),
        verdict(acceptor, &[*b"AG"]),
    )
}

fn report(
    site: Site,
    verdict: Verdict,
    side: Side,
    pos: usize,
    id: &SeqId,
    scope: &Scope<'_, '_>,
    out: &mut FindingSink,
) {
    if verdict == Verdict::Consensus {
        return;
    }
    let position = pos + 1;
    let (name, consensus) = match site {
        Site::Donor => ("donor", "GT"),
        Site::Acceptor => ("acceptor", "AG"),
    };
    let place = match (side, site) {
        (Side::Exon, Site::Donor) => format!("after exon ending at position {} of {}", position, id),
        (Side::Exon, Site::Acceptor) => format!("before exon starting at position {} of {}", position, id),
        (Side::Intron { .. }, Site::Donor) => format!("at start of intron, position {} of {}", position, id),
        (Side::Intron { .. }, Site::Acceptor) => format!("at end of intron, position {} of {}", position, id),
    };
    let message = match verdict {
        Verdict::Consensus | Verdict::NotConsensus => format!("Splice {} consensus ({}) not found {}", name, consensus, place),
        Verdict::BadSequence => format!("Bad sequence at splice {} {}", name, place),
    };
    let (severity, code) = match (side, site) {
        (Side::Intron { terminal: true }, Site::Donor) => {
            (Severity::Info, ErrorCode::NotSpliceConsensusDonorTerminalIntron)
        }
        (Side::Intron { terminal: true }, Site::Acceptor) => {
            (Severity::Info, ErrorCode::NotSpliceConsensusAcceptorTerminalIntron)
        }
        (_, Site::Donor) => (Severity::Warning, ErrorCode::NotSpliceConsensusDonor),
        (_, Site::Acceptor) => (Severity::Warning, ErrorCode::NotSpliceConsensusAcceptor),
    };
    scope.post(out, severity, code, message);
}
