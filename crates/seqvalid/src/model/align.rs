//! Alignments.

use serde::{Deserialize, Serialize};

use super::location::Strand;
use super::seqid::SeqId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignType {
    #[default]
    NotSet,
    Global,
    Diags,
    Partial,
    Disc,
    Other,
}

/// Dense-seg: `numseg` segments over `dim` rows.
///
/// `starts` and `strands` are row-major per segment (`seg * dim + row`); a
/// start of `-1` marks a gap in that row.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DenseSeg {
    pub dim: usize,
    pub numseg: usize,
    pub ids: Vec<SeqId>,
    pub starts: Vec<i64>,
    pub lens: Vec<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub strands: Vec<Strand>,
}

impl DenseSeg {
    pub fn start(&self, seg: usize, row: usize) -> Option<i64> {
        self.starts.get(seg * self.dim + row).copied()
    }

    pub fn strand(&self, seg: usize, row: usize) -> Strand {
        self.strands
            .get(seg * self.dim + row)
            .copied()
            .unwrap_or(Strand::Plus)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignSegs {
    Denseg(DenseSeg),
    Disc(Vec<SeqAlign>),
    /// Segment kinds the validator does not inspect (std-seg, packed-seg, spliced).
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeqAlign {
    #[serde(rename = "type", default)]
    pub kind: AlignType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dim: Option<usize>,
    pub segs: AlignSegs,
}

impl SeqAlign {
    pub fn dense(seg: DenseSeg) -> Self {
        Self {
            kind: AlignType::Global,
            dim: Some(seg.dim),
            segs: AlignSegs::Denseg(seg),
        }
    }
}
