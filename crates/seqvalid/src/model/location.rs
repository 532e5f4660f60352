//! Feature and sub-sequence locations.
//!
//! Coordinates are zero-based and inclusive, as in the record schema. Every
//! message shown to a submitter converts to one-based positions.

use serde::{Deserialize, Serialize};

use super::seqid::SeqId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strand {
    #[default]
    Unknown,
    Plus,
    Minus,
    Both,
    BothRev,
    Other,
}

impl Strand {
    pub fn is_minus(self) -> bool {
        matches!(self, Strand::Minus | Strand::BothRev)
    }

    /// Strands compare equal when both read in the same direction.
    pub fn same_direction(self, other: Strand) -> bool {
        self.is_minus() == other.is_minus()
    }
}

/// A single interval on one sequence.
///
/// `partial_start`/`partial_stop` are the biological 5' and 3' ends, so on
/// the minus strand `partial_start` refers to `to`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeqInterval {
    pub id: SeqId,
    pub from: usize,
    pub to: usize,
    #[serde(default)]
    pub strand: Strand,
    #[serde(default)]
    pub partial_start: bool,
    #[serde(default)]
    pub partial_stop: bool,
}

impl SeqInterval {
    pub fn new(id: SeqId, from: usize, to: usize, strand: Strand) -> Self {
        Self {
            id,
            from,
            to,
            strand,
            partial_start: false,
            partial_stop: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeqPoint {
    pub id: SeqId,
    pub point: usize,
    #[serde(default)]
    pub strand: Strand,
    #[serde(default)]
    pub partial: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeqBond {
    pub a: SeqPoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b: Option<SeqPoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeqLoc {
    Null,
    Empty(SeqId),
    Whole(SeqId),
    Int(SeqInterval),
    PackedInt(Vec<SeqInterval>),
    Pnt(SeqPoint),
    Mix(Vec<SeqLoc>),
    Equiv(Vec<SeqLoc>),
    Bond(SeqBond),
}

/// A flattened piece of a location with resolved coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span<'a> {
    pub id: &'a SeqId,
    pub from: usize,
    pub to: usize,
    pub strand: Strand,
    pub partial_start: bool,
    pub partial_stop: bool,
}

impl Span<'_> {
    /// Bases covered; zero for a reversed interval.
    pub fn len(&self) -> usize {
        (self.to + 1).saturating_sub(self.from)
    }

    pub fn is_reversed(&self) -> bool {
        self.from > self.to
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// First base in biological order.
    pub fn five_prime(&self) -> usize {
        if self.strand.is_minus() { self.to } else { self.from }
    }

    /// Last base in biological order.
    pub fn three_prime(&self) -> usize {
        if self.strand.is_minus() { self.from } else { self.to }
    }
}

impl SeqLoc {
    pub fn int(id: SeqId, from: usize, to: usize) -> Self {
        SeqLoc::Int(SeqInterval::new(id, from, to, Strand::Plus))
    }

    pub fn int_minus(id: SeqId, from: usize, to: usize) -> Self {
        SeqLoc::Int(SeqInterval::new(id, from, to, Strand::Minus))
    }

    pub fn packed(intervals: Vec<SeqInterval>) -> Self {
        SeqLoc::PackedInt(intervals)
    }

    /// Flatten into spans in location order.
    ///
    /// `Whole` locations need the length of their Bioseq; when `len_of`
    /// cannot supply it the piece is skipped.
    pub fn spans<F>(&self, len_of: &F) -> Vec<Span<'_>>
    where
        F: Fn(&SeqId) -> Option<usize>,
    {
        let mut out = Vec::new();
        self.collect_spans(len_of, &mut out);
        out
    }

    fn collect_spans<'a, F>(&'a self, len_of: &F, out: &mut Vec<Span<'a>>)
    where
        F: Fn(&SeqId) -> Option<usize>,
    {
        match self {
            SeqLoc::Null | SeqLoc::Empty(_) => {}
            SeqLoc::Whole(id) => {
                if let Some(len) = len_of(id).filter(|l| *l > 0) {
                    out.push(Span {
                        id,
                        from: 0,
                        to: len - 1,
                        strand: Strand::Plus,
                        partial_start: false,
                        partial_stop: false,
                    });
                }
            }
            SeqLoc::Int(int) => out.push(span_of(int)),
            SeqLoc::PackedInt(ints) => out.extend(ints.iter().map(span_of)),
            SeqLoc::Pnt(p) => out.push(Span {
                id: &p.id,
                from: p.point,
                to: p.point,
                strand: p.strand,
                partial_start: p.partial,
                partial_stop: p.partial,
            }),
            SeqLoc::Mix(parts) => {
                for part in parts {
                    part.collect_spans(len_of, out);
                }
            }
            SeqLoc::Equiv(parts) => {
                if let Some(first) = parts.first() {
                    first.collect_spans(len_of, out);
                }
            }
            SeqLoc::Bond(bond) => {
                for p in std::iter::once(&bond.a).chain(bond.b.iter()) {
                    out.push(Span {
                        id: &p.id,
                        from: p.point,
                        to: p.point,
                        strand: p.strand,
                        partial_start: false,
                        partial_stop: false,
                    });
                }
            }
        }
    }

    /// Spans without resolving `Whole` pieces.
    pub fn explicit_spans(&self) -> Vec<Span<'_>> {
        self.spans(&|_: &SeqId| None)
    }

    /// The identifier of the first piece.
    pub fn first_id(&self) -> Option<&SeqId> {
        match self {
            SeqLoc::Null => None,
            SeqLoc::Empty(id) | SeqLoc::Whole(id) => Some(id),
            SeqLoc::Int(int) => Some(&int.id),
            SeqLoc::PackedInt(ints) => ints.first().map(|i| &i.id),
            SeqLoc::Pnt(p) => Some(&p.id),
            SeqLoc::Mix(parts) | SeqLoc::Equiv(parts) => parts.iter().find_map(SeqLoc::first_id),
            SeqLoc::Bond(b) => Some(&b.a.id),
        }
    }

    /// Distinct identifiers referenced, in order of first appearance.
    pub fn ids(&self) -> Vec<&SeqId> {
        let mut ids: Vec<&SeqId> = Vec::new();
        self.visit_ids(&mut |id| {
            if !ids.contains(&id) {
                ids.push(id);
            }
        });
        ids
    }

    fn visit_ids<'a>(&'a self, f: &mut dyn FnMut(&'a SeqId)) {
        match self {
            SeqLoc::Null => {}
            SeqLoc::Empty(id) | SeqLoc::Whole(id) => f(id),
            SeqLoc::Int(int) => f(&int.id),
            SeqLoc::PackedInt(ints) => ints.iter().for_each(|i| f(&i.id)),
            SeqLoc::Pnt(p) => f(&p.id),
            SeqLoc::Mix(parts) | SeqLoc::Equiv(parts) => {
                for part in parts {
                    part.visit_ids(f);
                }
            }
            SeqLoc::Bond(b) => {
                f(&b.a.id);
                if let Some(other) = &b.b {
                    f(&other.id);
                }
            }
        }
    }

    pub fn is_partial_start(&self) -> bool {
        self.explicit_spans().first().is_some_and(|s| s.partial_start)
    }

    pub fn is_partial_stop(&self) -> bool {
        self.explicit_spans().last().is_some_and(|s| s.partial_stop)
    }

    /// True when any piece carries a partial flag, including internal ones.
    pub fn has_any_partial(&self) -> bool {
        self.explicit_spans()
            .iter()
            .any(|s| s.partial_start || s.partial_stop)
    }

    /// The common strand, or `None` when pieces disagree.
    pub fn strand(&self) -> Option<Strand> {
        let spans = self.explicit_spans();
        let first = spans.first()?.strand;
        if spans.iter().all(|s| s.strand.same_direction(first)) {
            Some(first)
        } else {
            None
        }
    }

    pub fn is_minus(&self) -> bool {
        self.strand().is_some_and(Strand::is_minus)
    }

    /// Human-readable label with one-based coordinates, e.g. `lcl|nuc:1-10`.
    pub fn label(&self) -> String {
        let spans = self.explicit_spans();
        match spans.len() {
            0 => match self {
                SeqLoc::Whole(id) => id.to_string(),
                SeqLoc::Empty(id) => format!("{}:empty", id),
                _ => "~".to_string(),
            },
            1 => span_label(&spans[0], true),
            _ => {
                let mut parts = Vec::new();
                let mut last_id: Option<&SeqId> = None;
                for span in &spans {
                    let show_id = last_id != Some(span.id);
                    parts.push(span_label(span, show_id));
                    last_id = Some(span.id);
                }
                format!("[{}]", parts.join(", "))
            }
        }
    }
}

fn span_of(int: &SeqInterval) -> Span<'_> {
    Span {
        id: &int.id,
        from: int.from,
        to: int.to,
        strand: int.strand,
        partial_start: int.partial_start,
        partial_stop: int.partial_stop,
    }
}

fn span_label(span: &Span<'_>, show_id: bool) -> String {
    let coords = if span.from == span.to {
        format!("{}", span.from + 1)
    } else if span.strand.is_minus() {
        format!("c{}-{}", span.to + 1, span.from + 1)
    } else {
        format!("{}-{}", span.from + 1, span.to + 1)
    };
    let coords = match (span.partial_start, span.partial_stop) {
        (true, true) => format!("<{}>", coords),
        (true, false) => format!("<{}", coords),
        (false, true) => format!("{}>", coords),
        (false, false) => coords,
    };
    if show_id {
        format!("{}:{}", span.id, coords)
    } else {
        coords
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nuc() -> SeqId {
        SeqId::local("nuc")
    }

    #[test]
    fn test_labels() {
        assert_eq!(SeqLoc::int(nuc(), 0, 9).label(), "lcl|nuc:1-10");
        assert_eq!(SeqLoc::int_minus(nuc(), 0, 9).label(), "lcl|nuc:c10-1");
        let mix = SeqLoc::packed(vec![
            SeqInterval::new(nuc(), 0, 9, Strand::Plus),
            SeqInterval::new(nuc(), 20, 29, Strand::Plus),
        ]);
        assert_eq!(mix.label(), "[lcl|nuc:1-10, 21-30]");
    }

    #[test]
    fn test_partial_flags_follow_location_order() {
        let mut first = SeqInterval::new(nuc(), 0, 9, Strand::Plus);
        first.partial_start = true;
        let loc = SeqLoc::packed(vec![first, SeqInterval::new(nuc(), 20, 29, Strand::Plus)]);
        assert!(loc.is_partial_start());
        assert!(!loc.is_partial_stop());
        assert!(loc.has_any_partial());
    }

    #[test]
    fn test_mixed_strand_has_no_common_strand() {
        let loc = SeqLoc::Mix(vec![SeqLoc::int(nuc(), 0, 9), SeqLoc::int_minus(nuc(), 20, 29)]);
        assert_eq!(loc.strand(), None);
        assert_eq!(SeqLoc::int_minus(nuc(), 1, 2).strand(), Some(Strand::Minus));
    }

    #[test]
    fn test_whole_needs_length() {
        let loc = SeqLoc::Whole(nuc());
        assert!(loc.explicit_spans().is_empty());
        let spans = loc.spans(&|_: &SeqId| Some(30));
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].to, 29);
    }
}
