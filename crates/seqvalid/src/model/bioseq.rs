//! Bioseq and its instance (representation, residues, extension).

use serde::{Deserialize, Serialize};

use super::align::SeqAlign;
use super::descr::Descriptor;
use super::feature::SeqFeat;
use super::graph::SeqGraph;
use super::location::{SeqLoc, Strand};
use super::seqid::SeqId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeqRepr {
    #[default]
    NotSet,
    Virtual,
    Raw,
    Seg,
    Const,
    Ref,
    Consen,
    Map,
    Delta,
    Other,
}

impl SeqRepr {
    pub fn label(&self) -> &'static str {
        match self {
            SeqRepr::NotSet => "not-set",
            SeqRepr::Virtual => "virtual",
            SeqRepr::Raw => "raw",
            SeqRepr::Seg => "seg",
            SeqRepr::Const => "const",
            SeqRepr::Ref => "ref",
            SeqRepr::Consen => "consen",
            SeqRepr::Map => "map",
            SeqRepr::Delta => "delta",
            SeqRepr::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MolType {
    #[default]
    NotSet,
    Dna,
    Rna,
    Aa,
    Na,
    Other,
}

impl MolType {
    pub fn is_na(self) -> bool {
        matches!(self, MolType::Dna | MolType::Rna | MolType::Na)
    }

    pub fn is_aa(self) -> bool {
        self == MolType::Aa
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    #[default]
    NotSet,
    Linear,
    Circular,
    Tandem,
    Other,
}

/// Residue payload in one of the schema alphabets.
///
/// Packed alphabets (`Ncbi2na`, `Ncbi4na`) carry their raw bytes; the
/// declared instance length says how many residues the bytes hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeqData {
    Iupacna(String),
    Iupacaa(String),
    Ncbieaa(String),
    Ncbi2na(Vec<u8>),
    Ncbi4na(Vec<u8>),
    Gap(SeqGap),
}

impl SeqData {
    pub fn is_protein(&self) -> bool {
        matches!(self, SeqData::Iupacaa(_) | SeqData::Ncbieaa(_))
    }

    pub fn is_gap(&self) -> bool {
        matches!(self, SeqData::Gap(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapType {
    #[default]
    Unknown,
    Fragment,
    Clone,
    ShortArm,
    Heterochromatin,
    Centromere,
    Telomere,
    Repeat,
    Contig,
    Scaffold,
    Contamination,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SeqGap {
    #[serde(default)]
    pub gap_type: GapType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkage: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntFuzz {
    /// Length is unknown; only a placeholder size is given.
    Unk,
    Gt,
    Lt,
    Range { min: usize, max: usize },
    Pct(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeqLiteral {
    pub length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuzz: Option<IntFuzz>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq_data: Option<SeqData>,
}

impl SeqLiteral {
    pub fn gap(length: usize) -> Self {
        Self {
            length,
            fuzz: None,
            seq_data: None,
        }
    }

    pub fn unknown_gap(length: usize) -> Self {
        Self {
            length,
            fuzz: Some(IntFuzz::Unk),
            seq_data: None,
        }
    }

    pub fn data(residues: impl Into<String>) -> Self {
        let residues = residues.into();
        Self {
            length: residues.len(),
            fuzz: None,
            seq_data: Some(SeqData::Iupacna(residues)),
        }
    }

    /// Gaps are literals without residues, or with an explicit gap payload.
    pub fn is_gap(&self) -> bool {
        match &self.seq_data {
            None => true,
            Some(data) => data.is_gap(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaSeq {
    Loc(SeqLoc),
    Literal(SeqLiteral),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeqExt {
    Seg(Vec<SeqLoc>),
    Ref(SeqLoc),
    Map(Vec<SeqFeat>),
    Delta(Vec<DeltaSeq>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeqInst {
    #[serde(default)]
    pub repr: SeqRepr,
    #[serde(default)]
    pub mol: MolType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,
    #[serde(default)]
    pub topology: Topology,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strand: Option<Strand>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq_data: Option<SeqData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<SeqExt>,
}

impl SeqInst {
    pub fn raw(mol: MolType, data: SeqData, length: usize) -> Self {
        Self {
            repr: SeqRepr::Raw,
            mol,
            length: Some(length),
            topology: Topology::Linear,
            strand: None,
            seq_data: Some(data),
            ext: None,
        }
    }

    pub fn delta(mol: MolType, parts: Vec<DeltaSeq>, length: usize) -> Self {
        Self {
            repr: SeqRepr::Delta,
            mol,
            length: Some(length),
            topology: Topology::Linear,
            strand: None,
            seq_data: None,
            ext: Some(SeqExt::Delta(parts)),
        }
    }

    pub fn len(&self) -> usize {
        self.length.unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn delta_parts(&self) -> Option<&[DeltaSeq]> {
        match &self.ext {
            Some(SeqExt::Delta(parts)) => Some(parts),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotData {
    Ftable(Vec<SeqFeat>),
    Align(Vec<SeqAlign>),
    Graph(Vec<SeqGraph>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeqAnnot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub data: AnnotData,
}

impl SeqAnnot {
    pub fn ftable(feats: Vec<SeqFeat>) -> Self {
        Self {
            name: None,
            data: AnnotData::Ftable(feats),
        }
    }

    pub fn features(&self) -> &[SeqFeat] {
        match &self.data {
            AnnotData::Ftable(feats) => feats,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bioseq {
    pub ids: Vec<SeqId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub descr: Vec<Descriptor>,
    pub inst: SeqInst,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annot: Vec<SeqAnnot>,
}

impl Bioseq {
    pub fn new(ids: Vec<SeqId>, inst: SeqInst) -> Self {
        Self {
            ids,
            descr: Vec::new(),
            inst,
            annot: Vec::new(),
        }
    }

    /// Highest ranked identifier for display.
    pub fn best_id(&self) -> Option<&SeqId> {
        self.ids.iter().min_by_key(|id| id.display_rank())
    }

    pub fn best_label(&self) -> String {
        self.best_id().map(|id| id.label()).unwrap_or_default()
    }

    pub fn has_id(&self, id: &SeqId) -> bool {
        let key = id.key();
        self.ids.iter().any(|own| own.key() == key)
    }

    pub fn is_na(&self) -> bool {
        self.inst.mol.is_na()
    }

    pub fn is_aa(&self) -> bool {
        self.inst.mol.is_aa()
    }

    pub fn features(&self) -> impl Iterator<Item = &SeqFeat> {
        self.annot.iter().flat_map(|a| a.features().iter())
    }
}
