//! Score graphs on nucleotide Bioseqs, mostly Phrap quality.

use super::Scope;
use crate::diag::{ErrorCode, FindingSink, Severity};
use crate::error::Result;
use crate::index::SeqHandle;
use crate::model::{AnnotData, ByteGraph, GraphData, SeqGraph, SeqId, Span};

/// Highest score a quality graph may carry.
const MAX_QUALITY: i32 = 100;

pub fn check(seq: &SeqHandle<'_>, scope: &Scope<'_, '_>, out: &mut FindingSink) -> Result<()> {
    let graphs: Vec<&SeqGraph> = seq
        .seq
        .annot
        .iter()
        .filter_map(|annot| match &annot.data {
            AnnotData::Graph(graphs) => Some(graphs),
            _ => None,
        })
        .flatten()
        .collect();
    if graphs.is_empty() || !seq.seq.is_na() {
        return Ok(());
    }

    let len_of = |id: &SeqId| scope.index.bioseq_len(id);
    let residues = scope.index.residues(seq.ordinal);
    let mut covered = 0;
    let mut last_start = None;
    let mut out_of_order = false;

    for graph in graphs {
        let spans = graph.loc.spans(&len_of);
        if !spans.iter().all(|s| seq.seq.has_id(s.id)) || spans.is_empty() {
            scope.post(
                out,
                Severity::Error,
                ErrorCode::GraphBioseqId,
                format!("Bioseq not found for Graph location {}", graph.loc.label()),
            );
            continue;
        }
        let values = graph.value_count();
        if graph.numval != values {
            scope.post(
                out,
                Severity::Error,
                ErrorCode::GraphByteLen,
                format!("SeqGraph ({}) and ByteStore ({}) length mismatch", graph.numval, values),
            );
        }
        let loc_len: usize = spans.iter().map(Span::len).sum();
        if loc_len != graph.numval {
            scope.post(
                out,
                Severity::Error,
                ErrorCode::GraphByteLen,
                format!("SeqGraph ({}) and SeqLoc ({}) length mismatch", graph.numval, loc_len),
            );
        }

        let start = spans[0].from;
        if last_start.is_some_and(|last| start < last) {
            out_of_order = true;
        }
        last_start = Some(start);
        covered += graph.numval;

        if let GraphData::Byte(bytes) = &graph.graph {
            check_range(bytes, scope, out);
            if let Some(residues) = residues {
                check_scores(bytes, &spans, residues, scope, out);
            }
        }
    }

    if out_of_order {
        scope.post(
            out,
            Severity::Warning,
            ErrorCode::GraphOutOfOrder,
            "Graph components are out of order - may be a software bug",
        );
    }

    let gaps = residues.map_or(0, |r| r.iter().filter(|b| **b == b'-').count());
    let expected = seq.seq.inst.len() - gaps.min(seq.seq.inst.len());
    if covered != expected {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::GraphBioseqLen,
            format!("SeqGraph ({}) and Bioseq ({}) length mismatch", covered, expected),
        );
    }
    Ok(())
}

fn check_range(graph: &ByteGraph, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    if graph.min < 0 || graph.min > MAX_QUALITY {
        scope.post(
            out,
            Severity::Warning,
            ErrorCode::GraphMin,
            format!("Graph min ({}) out of range", graph.min),
        );
    }
    if graph.max <= 0 || graph.max > MAX_QUALITY {
        scope.post(
            out,
            Severity::Warning,
            ErrorCode::GraphMax,
            format!("Graph max ({}) out of range", graph.max),
        );
    }
    let below = graph.values.iter().filter(|v| i32::from(**v) < graph.min).count();
    if below > 0 {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::GraphBelow,
            format!("{} quality scores have values below the reported minimum or 0", below),
        );
    }
    let above = graph
        .values
        .iter()
        .filter(|v| {
            let v = i32::from(**v);
            v > graph.max || v > MAX_QUALITY
        })
        .count();
    if above > 0 {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::GraphAbove,
            format!("{} quality scores have values above the reported maximum or 100", above),
        );
    }
}

/// Scores must be positive over real bases and zero over N and gaps.
fn check_scores(graph: &ByteGraph, spans: &[Span<'_>], residues: &[u8], scope: &Scope<'_, '_>, out: &mut FindingSink) {
    let positions = spans.iter().flat_map(|s| s.from..=s.to);
    let (mut acgt, mut n, mut gap) = (0, 0, 0);
    for (pos, score) in positions.zip(graph.values.iter()) {
        let Some(base) = residues.get(pos) else {
            break;
        };
        match base.to_ascii_uppercase() {
            b'A' | b'C' | b'G' | b'T' if *score == 0 => acgt += 1,
            b'N' if *score > 0 => n += 1,
            b'-' if *score > 0 => gap += 1,
            _ => {}
        }
    }
    let counts = [
        (acgt, ErrorCode::GraphAcgtScore, "ACGT", "zero"),
        (n, ErrorCode::GraphNScore, "N", "positive"),
        (gap, ErrorCode::GraphGapScore, "gap", "positive"),
    ];
    for (count, code, bases, kind) in counts {
        if count > 0 {
            scope.post(
                out,
                Severity::Error,
                code,
                format!("{} {} bases have {} quality scores", count, bases, kind),
            );
        }
    }
}
