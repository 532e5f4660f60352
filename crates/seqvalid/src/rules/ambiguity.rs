//! Ambiguous residue runs: terminal and internal Ns, N content, X runs.
//!
//! Every check reads one [`RunScan`] per residue stream, so the sequence is
//! walked once no matter how many thresholds apply.

use super::{Scope, plural};
use crate::diag::{AccessionPolicy, ErrorCode, FindingSink, Severity};
use crate::error::Result;
use crate::index::SeqHandle;
use crate::model::{Completeness, DeltaSeq, SeqRepr, Topology};
use crate::seq::{RunScan, alphabet, scan};

pub fn check(seq: &SeqHandle<'_>, scope: &Scope<'_, '_>, out: &mut FindingSink) -> Result<()> {
    let Some(residues) = scope.index.residues(seq.ordinal) else {
        return Ok(());
    };
    let config = scope.config;
    if seq.seq.is_aa() {
        let xs = scan(residues, b'X', config.n_window_small, config.n_window_large);
        check_x_runs(&xs, scope, out);
        return Ok(());
    }
    if !seq.seq.is_na() {
        return Ok(());
    }

    let ns = scan(residues, b'N', config.n_window_small, config.n_window_large);
    check_terminal_ns(seq, &ns, scope, out);
    check_n_windows(&ns, scope, out);

    match seq.seq.inst.repr {
        SeqRepr::Raw => check_internal_raw(&ns, scope, out),
        SeqRepr::Delta => {
            if let Some(parts) = seq.seq.inst.delta_parts() {
                check_delta_literals(parts, scope, out);
            }
        }
        _ => {}
    }
    Ok(())
}

/// Shortest internal run that is reported, by technique.
fn internal_run_threshold(scope: &Scope<'_, '_>) -> usize {
    if scope.ctx.is_wgs() {
        scope.config.internal_n_run_wgs
    } else {
        scope.config.internal_n_run_raw
    }
}

fn check_terminal_ns(seq: &SeqHandle<'_>, ns: &RunScan, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    let circular_complete = seq.seq.inst.topology == Topology::Circular
        && scope
            .ctx
            .molinfo
            .is_some_and(|m| m.completeness == Completeness::Complete);
    if circular_complete || ns.is_all_target() {
        return;
    }
    let severity = scope.severity(Severity::Warning, AccessionPolicy::RaiseForInsd);
    if ns.leading > 0 {
        scope.post(
            out,
            severity,
            ErrorCode::TerminalNs,
            format!("N at beginning of sequence: {}", ns.leading),
        );
    }
    if ns.trailing > 0 {
        scope.post(
            out,
            severity,
            ErrorCode::TerminalNs,
            format!("N at end of sequence: {}", ns.trailing),
        );
    }
}

fn check_n_windows(ns: &RunScan, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    let c = scope.config;
    let windows = [
        (ns.head_small, c.n_limit_small, c.n_window_small, "first"),
        (ns.head_large, c.n_limit_large, c.n_window_large, "first"),
        (ns.tail_small, c.n_limit_small, c.n_window_small, "last"),
        (ns.tail_large, c.n_limit_large, c.n_window_large, "last"),
    ];
    for (count, limit, window, end) in windows {
        if count > limit {
            scope.post(
                out,
                Severity::Warning,
                ErrorCode::HighNContentPercent,
                format!(
                    "Sequence has more than {} Ns in the {} {} bases",
                    limit, end, window
                ),
            );
        }
    }

    let percent = ns.percent();
    if percent > c.n_percent_limit {
        scope.post(
            out,
            Severity::Warning,
            ErrorCode::HighNContentPercent,
            format!("Sequence contains {}% N's", percent.round() as u32),
        );
    }
}

fn check_internal_raw(ns: &RunScan, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    let threshold = internal_run_threshold(scope);
    for (start, len) in ns.internal_runs.iter().filter(|(_, len)| *len >= threshold) {
        scope.post(
            out,
            Severity::Warning,
            ErrorCode::InternalNsInSeqRaw,
            format!("Run of {} Ns in raw sequence starting at base {}", len, start + 1),
        );
    }
}

/// Runs inside each literal, and literals whose Ns touch a gap.
fn check_delta_literals(parts: &[DeltaSeq], scope: &Scope<'_, '_>, out: &mut FindingSink) {
    let threshold = internal_run_threshold(scope);
    let c = scope.config;
    let is_gap = |i: usize| matches!(parts.get(i), Some(DeltaSeq::Literal(lit)) if lit.is_gap());

    let mut offset = 0usize;
    for (i, part) in parts.iter().enumerate() {
        let DeltaSeq::Literal(lit) = part else {
            offset += part_len(part);
            continue;
        };
        let residues = lit
            .seq_data
            .as_ref()
            .filter(|d| !d.is_gap())
            .and_then(|d| alphabet::decode(d, lit.length).ok());
        if let Some(residues) = residues {
            let ns = scan(&residues, b'N', c.n_window_small, c.n_window_large);
            for (start, len) in ns.internal_runs.iter().filter(|(_, len)| *len >= threshold) {
                scope.post(
                    out,
                    Severity::Warning,
                    ErrorCode::InternalNsInSeqLit,
                    format!(
                        "Run of {} Ns in delta component {} that starts at base {}",
                        len,
                        i + 1,
                        offset + start + 1
                    ),
                );
            }
            if i > 0 && is_gap(i - 1) && ns.leading > 0 {
                scope.post(
                    out,
                    Severity::Warning,
                    ErrorCode::InternalNsAdjacentToGap,
                    format!("Ambiguous residue N is adjacent to a gap around position {}", offset + 1),
                );
            }
            if is_gap(i + 1) && ns.trailing > 0 && !ns.is_all_target() {
                scope.post(
                    out,
                    Severity::Warning,
                    ErrorCode::InternalNsAdjacentToGap,
                    format!(
                        "Ambiguous residue N is adjacent to a gap around position {}",
                        offset + lit.length
                    ),
                );
            }
        }
        offset += lit.length;
    }
}

fn part_len(part: &DeltaSeq) -> usize {
    match part {
        DeltaSeq::Literal(lit) => lit.length,
        DeltaSeq::Loc(loc) => loc.explicit_spans().iter().map(|s| s.len()).sum(),
    }
}

fn check_x_runs(xs: &RunScan, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    if xs.is_all_target() {
        return;
    }
    if xs.leading > 0 {
        scope.post(
            out,
            Severity::Warning,
            ErrorCode::LeadingX,
            format!("Sequence starts with {}", plural(xs.leading, "leading X", "leading Xs")),
        );
    }
    if xs.trailing > 0 {
        scope.post(
            out,
            Severity::Warning,
            ErrorCode::TrailingX,
            format!("Sequence ends in {}", plural(xs.trailing, "trailing X", "trailing Xs")),
        );
    }
}
