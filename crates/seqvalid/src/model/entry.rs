//! Record entries: a single Bioseq or a typed set of entries.

use serde::{Deserialize, Serialize};

use super::bioseq::{Bioseq, SeqAnnot};
use super::descr::Descriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetClass {
    #[default]
    NotSet,
    NucProt,
    SegSet,
    Conset,
    Parts,
    Gibb,
    Gi,
    Genbank,
    Pir,
    PubSet,
    Equiv,
    Swissprot,
    PdbEntry,
    MutSet,
    PopSet,
    PhySet,
    EcoSet,
    GenProdSet,
    WgsSet,
    NamedAnnot,
    NamedAnnotProd,
    ReadSet,
    PairedEndReads,
    SmallGenomeSet,
    Other,
}

impl SetClass {
    pub fn label(&self) -> &'static str {
        match self {
            SetClass::NotSet => "not-set",
            SetClass::NucProt => "nuc-prot",
            SetClass::SegSet => "segset",
            SetClass::Conset => "conset",
            SetClass::Parts => "parts",
            SetClass::Gibb => "gibb",
            SetClass::Gi => "gi",
            SetClass::Genbank => "genbank",
            SetClass::Pir => "pir",
            SetClass::PubSet => "pub-set",
            SetClass::Equiv => "equiv",
            SetClass::Swissprot => "swissprot",
            SetClass::PdbEntry => "pdb-entry",
            SetClass::MutSet => "mut-set",
            SetClass::PopSet => "pop-set",
            SetClass::PhySet => "phy-set",
            SetClass::EcoSet => "eco-set",
            SetClass::GenProdSet => "gen-prod-set",
            SetClass::WgsSet => "wgs-set",
            SetClass::NamedAnnot => "named-annot",
            SetClass::NamedAnnotProd => "named-annot-prod",
            SetClass::ReadSet => "read-set",
            SetClass::PairedEndReads => "paired-end-reads",
            SetClass::SmallGenomeSet => "small-genome-set",
            SetClass::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BioseqSet {
    #[serde(default)]
    pub class: SetClass,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub descr: Vec<Descriptor>,
    #[serde(default)]
    pub seq_set: Vec<SeqEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annot: Vec<SeqAnnot>,
}

impl BioseqSet {
    pub fn new(class: SetClass, seq_set: Vec<SeqEntry>) -> Self {
        Self {
            class,
            descr: Vec::new(),
            seq_set,
            annot: Vec::new(),
        }
    }

    /// All Bioseqs in this set and nested sets, in document order.
    pub fn bioseqs(&self) -> Vec<&Bioseq> {
        let mut out = Vec::new();
        for entry in &self.seq_set {
            entry.collect_bioseqs(&mut out);
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeqEntry {
    Seq(Bioseq),
    Set(BioseqSet),
}

impl SeqEntry {
    pub fn bioseqs(&self) -> Vec<&Bioseq> {
        let mut out = Vec::new();
        self.collect_bioseqs(&mut out);
        out
    }

    fn collect_bioseqs<'a>(&'a self, out: &mut Vec<&'a Bioseq>) {
        match self {
            SeqEntry::Seq(seq) => out.push(seq),
            SeqEntry::Set(set) => {
                for child in &set.seq_set {
                    child.collect_bioseqs(out);
                }
            }
        }
    }

    pub fn descr(&self) -> &[Descriptor] {
        match self {
            SeqEntry::Seq(seq) => &seq.descr,
            SeqEntry::Set(set) => &set.descr,
        }
    }

    pub fn descr_mut(&mut self) -> &mut Vec<Descriptor> {
        match self {
            SeqEntry::Seq(seq) => &mut seq.descr,
            SeqEntry::Set(set) => &mut set.descr,
        }
    }

    /// Every descriptor in the tree, parents before children.
    pub fn all_descriptors(&self) -> Vec<&Descriptor> {
        let mut out: Vec<&Descriptor> = self.descr().iter().collect();
        if let SeqEntry::Set(set) = self {
            for child in &set.seq_set {
                out.extend(child.all_descriptors());
            }
        }
        out
    }
}

impl From<Bioseq> for SeqEntry {
    fn from(seq: Bioseq) -> Self {
        SeqEntry::Seq(seq)
    }
}

impl From<BioseqSet> for SeqEntry {
    fn from(set: BioseqSet) -> Self {
        SeqEntry::Set(set)
    }
}
