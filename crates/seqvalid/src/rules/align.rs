//! Alignment geometry. Only dense-seg alignments are inspected; the
//! engine runs these rules when alignment validation is requested.

use super::Scope;
use crate::diag::{ErrorCode, FindingSink, Severity};
use crate::error::Result;
use crate::model::{AlignSegs, DenseSeg, SeqAlign, Strand};
use crate::seq::complement;

/// Start value marking a gap in one row of a segment.
const GAP: i64 = -1;

pub fn check(align: &SeqAlign, scope: &Scope<'_, '_>, out: &mut FindingSink) -> Result<()> {
    match &align.segs {
        AlignSegs::Denseg(seg) => {
            if let Some(dim) = align.dim.filter(|d| *d != seg.dim) {
                scope.post(
                    out,
                    Severity::Error,
                    ErrorCode::SegsDimMismatch,
                    format!(
                        "Mismatch between alignment dimension ({}) and segment dimension ({})",
                        dim, seg.dim
                    ),
                );
            }
            check_dense_seg(seg, scope, out);
        }
        AlignSegs::Disc(parts) => {
            for part in parts {
                check(part, scope, out)?;
            }
        }
        AlignSegs::Other(kind) => log::trace!("skipping {} alignment", kind),
    }
    Ok(())
}

fn check_dense_seg(seg: &DenseSeg, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    if !check_shape(seg, scope, out) {
        return;
    }
    let mut resolvable = true;
    for id in &seg.ids {
        if scope.index.seq_by_id(id).is_none() {
            resolvable = false;
            scope.post(
                out,
                Severity::Error,
                ErrorCode::SeqIdProblem,
                format!("The sequence corresponding to SeqId {} could not be found", id),
            );
        }
    }
    for s in 0..seg.numseg {
        if (0..seg.dim).all(|row| seg.start(s, row) == Some(GAP)) {
            scope.post(
                out,
                Severity::Error,
                ErrorCode::SegmentGap,
                format!("Segment {} contains only gaps", s + 1),
            );
        }
        if seg.lens[s] == 0 {
            scope.post(
                out,
                Severity::Error,
                ErrorCode::SegsLensMismatch,
                format!("Segment {} has zero length", s + 1),
            );
        }
    }
    if !resolvable {
        return;
    }
    let rows_ok = (0..seg.dim).fold(true, |ok, row| check_row(seg, row, scope, out) && ok);
    if rows_ok {
        check_identity(seg, scope, out);
    }
}

/// Array sizes must agree with `dim` and `numseg` before anything can be
/// indexed.
fn check_shape(seg: &DenseSeg, scope: &Scope<'_, '_>, out: &mut FindingSink) -> bool {
    let mut ok = true;
    let mut fail = |code: ErrorCode, message: String| {
        ok = false;
        scope.post(out, Severity::Error, code, message);
    };
    if seg.ids.len() != seg.dim {
        fail(
            ErrorCode::SegsDimMismatch,
            format!(
                "Mismatch between specified dimension ({}) and number of Seq-ids ({})",
                seg.dim,
                seg.ids.len()
            ),
        );
    }
    if seg.lens.len() != seg.numseg {
        fail(
            ErrorCode::SegsNumsegMismatch,
            format!(
                "Mismatch between specified numseg ({}) and number of Lens ({})",
                seg.numseg,
                seg.lens.len()
            ),
        );
    }
    let expected = seg.dim * seg.numseg;
    if seg.starts.len() != expected {
        fail(
            ErrorCode::SegsStartsMismatch,
            format!(
                "The number of Starts ({}) does not match the expected size of dim * numseg ({})",
                seg.starts.len(),
                expected
            ),
        );
    }
    if !seg.strands.is_empty() && seg.strands.len() != expected {
        fail(
            ErrorCode::SegsStrandsMismatch,
            format!(
                "The number of Strands ({}) does not match the expected size of dim * numseg ({})",
                seg.strands.len(),
                expected
            ),
        );
    }
    ok
}

/// One row must keep its strand, stay inside its sequence, and read its
/// segments contiguously.
fn check_row(seg: &DenseSeg, row: usize, scope: &Scope<'_, '_>, out: &mut FindingSink) -> bool {
    let id = &seg.ids[row];
    let len = scope.index.bioseq_len(id).unwrap_or_default();
    let mut ok = true;
    let mut strand: Option<Strand> = None;
    // (start, len) of the previous non-gap segment
    let mut previous: Option<(usize, usize)> = None;

    for s in 0..seg.numseg {
        let Some(start) = seg.start(s, row).filter(|st| *st != GAP) else {
            continue;
        };
        let seg_len = seg.lens[s];
        let this_strand = seg.strand(s, row);
        match strand {
            Some(first) if !first.same_direction(this_strand) => {
                ok = false;
                scope.post(
                    out,
                    Severity::Error,
                    ErrorCode::SegsStrandsMismatch,
                    format!("Strand for {} changes at segment {}", id, s + 1),
                );
            }
            _ => strand = Some(this_strand),
        }
        let Ok(start) = usize::try_from(start) else {
            ok = false;
            scope.post(
                out,
                Severity::Error,
                ErrorCode::Start,
                format!("Start {} of {} in segment {} is negative", start, id, s + 1),
            );
            continue;
        };
        if start + seg_len > len {
            ok = false;
            scope.post(
                out,
                Severity::Error,
                ErrorCode::Start,
                format!(
                    "Start/Length: segment {} of {} extends to {} past the end of the sequence ({})",
                    s + 1,
                    id,
                    start + seg_len,
                    len
                ),
            );
        }
        if let Some((prev_start, prev_len)) = previous {
            let follows = if this_strand.is_minus() {
                start + seg_len == prev_start
            } else {
                prev_start + prev_len == start
            };
            if !follows {
                ok = false;
                scope.post(
                    out,
                    Severity::Error,
                    ErrorCode::Start,
                    format!(
                        "Start of segment {} of {} ({}) does not follow the previous segment",
                        s + 1,
                        id,
                        start
                    ),
                );
            }
        }
        previous = Some((start, seg_len));
    }
    ok
}

/// Share of fully aligned columns whose residues all agree.
pub fn percent_identity(seg: &DenseSeg, residues: &[&[u8]]) -> Option<f64> {
    let mut aligned = 0usize;
    let mut identical = 0usize;
    for s in 0..seg.numseg {
        let starts: Option<Vec<usize>> = (0..seg.dim)
            .map(|row| seg.start(s, row).filter(|st| *st != GAP).and_then(|st| usize::try_from(st).ok()))
            .collect();
        let Some(starts) = starts else {
            continue;
        };
        let len = seg.lens[s];
        for k in 0..len {
            let column: Option<Vec<u8>> = (0..seg.dim)
                .map(|row| {
                    let minus = seg.strand(s, row).is_minus();
                    let pos = if minus { starts[row] + len - 1 - k } else { starts[row] + k };
                    let base = residues[row].get(pos)?.to_ascii_uppercase();
                    Some(if minus { complement(base) } else { base })
                })
                .collect();
            let column = column?;
            aligned += 1;
            if column.windows(2).all(|w| w[0] == w[1]) {
                identical += 1;
            }
        }
    }
    (aligned > 0).then(|| identical as f64 * 100.0 / aligned as f64)
}

fn check_identity(seg: &DenseSeg, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    let residues: Option<Vec<&[u8]>> = seg
        .ids
        .iter()
        .map(|id| scope.index.seq_by_id(id).and_then(|s| scope.index.residues(s)))
        .collect();
    let Some(identity) = residues.and_then(|r| percent_identity(seg, &r)) else {
        return;
    };
    let floor = scope.config.min_percent_identity;
    if identity < floor {
        scope.post(
            out,
            Severity::Warning,
            ErrorCode::PercentIdentity,
            format!("This alignment has a percent identity of {:.0}%", identity),
        );
    }
}
