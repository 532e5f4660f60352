//! Features and their typed payloads.

use serde::{Deserialize, Serialize};

use super::descr::{BioSource, OrgRef, Pubdesc, UserObject};
use super::location::SeqLoc;
use super::seqid::DbTag;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeatId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frame {
    #[default]
    NotSet,
    One,
    Two,
    Three,
}

impl Frame {
    /// Bases skipped before the first codon.
    pub fn offset(self) -> usize {
        match self {
            Frame::NotSet | Frame::One => 0,
            Frame::Two => 1,
            Frame::Three => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBreak {
    pub loc: SeqLoc,
    /// Amino acid in ncbieaa.
    pub aa: char,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cdregion {
    #[serde(default)]
    pub orf: bool,
    #[serde(default)]
    pub frame: Frame,
    #[serde(default)]
    pub conflict: bool,
    /// Genetic code id; `None` means the organism's code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub code_break: Vec<CodeBreak>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RnaType {
    #[default]
    Unknown,
    PreMsg,
    Mrna,
    Trna,
    Rrna,
    Snrna,
    Scrna,
    Snorna,
    Ncrna,
    Tmrna,
    Miscrna,
    Other,
}

impl RnaType {
    pub fn label(&self) -> &'static str {
        match self {
            RnaType::Unknown => "RNA",
            RnaType::PreMsg => "precursor_RNA",
            RnaType::Mrna => "mRNA",
            RnaType::Trna => "tRNA",
            RnaType::Rrna => "rRNA",
            RnaType::Snrna => "snRNA",
            RnaType::Scrna => "scRNA",
            RnaType::Snorna => "snoRNA",
            RnaType::Ncrna => "ncRNA",
            RnaType::Tmrna => "tmRNA",
            RnaType::Miscrna => "misc_RNA",
            RnaType::Other => "misc_RNA",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrnaExt {
    /// Charged amino acid in ncbieaa.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aa: Option<char>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub codon: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anticodon: Option<SeqLoc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RnaExt {
    Name(String),
    Trna(TrnaExt),
    Gen {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        class: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        product: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RnaRef {
    #[serde(rename = "type", default)]
    pub kind: RnaType,
    #[serde(default)]
    pub pseudo: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<RnaExt>,
}

impl RnaRef {
    pub fn new(kind: RnaType) -> Self {
        Self {
            kind,
            pseudo: false,
            ext: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.ext = Some(RnaExt::Name(name.into()));
        self
    }

    /// Product name from either the plain name or the generic extension.
    pub fn product(&self) -> Option<&str> {
        match &self.ext {
            Some(RnaExt::Name(name)) => Some(name),
            Some(RnaExt::Gen { product, .. }) => product.as_deref(),
            _ => None,
        }
    }

    pub fn trna(&self) -> Option<&TrnaExt> {
        match &self.ext {
            Some(RnaExt::Trna(t)) => Some(t),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GeneRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locus: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allele: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maploc: Option<String>,
    #[serde(default)]
    pub pseudo: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub db: Vec<DbTag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub syn: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locus_tag: Option<String>,
}

impl GeneRef {
    pub fn locus(locus: impl Into<String>) -> Self {
        Self {
            locus: Some(locus.into()),
            ..Default::default()
        }
    }

    pub fn with_locus_tag(mut self, tag: impl Into<String>) -> Self {
        self.locus_tag = Some(tag.into());
        self
    }

    /// True when the ref carries nothing that identifies a gene.
    pub fn is_empty(&self) -> bool {
        self.locus.as_deref().is_none_or(str::is_empty)
            && self.locus_tag.as_deref().is_none_or(str::is_empty)
            && self.allele.is_none()
            && self.desc.is_none()
            && self.maploc.is_none()
            && self.db.is_empty()
            && self.syn.is_empty()
    }

    /// Label used in messages: locus, then locus_tag.
    pub fn label(&self) -> &str {
        self.locus
            .as_deref()
            .filter(|l| !l.is_empty())
            .or(self.locus_tag.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtProcessed {
    #[default]
    NotSet,
    Preprotein,
    Mature,
    SignalPeptide,
    TransitPeptide,
    Propeptide,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProtRef {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ec: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub activity: Vec<String>,
    #[serde(default)]
    pub processed: ProtProcessed,
}

impl ProtRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: vec![name.into()],
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.iter().all(|n| n.trim().is_empty())
            && self.desc.is_none()
            && self.ec.is_empty()
            && self.activity.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImpFeat {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descr: Option<String>,
}

impl ImpFeat {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            loc: None,
            descr: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatData {
    Gene(GeneRef),
    Org(OrgRef),
    Cdregion(Cdregion),
    Prot(ProtRef),
    Rna(RnaRef),
    Pub(Pubdesc),
    Imp(ImpFeat),
    Region(String),
    Comment,
    Bond(u8),
    Site(u8),
    User(UserObject),
    Het(String),
    NonStdResidue(String),
    Biosrc(BioSource),
    PsecStr(u8),
}

impl FeatData {
    /// Feature key as shown in flat files and messages.
    pub fn label(&self) -> &str {
        match self {
            FeatData::Gene(_) => "Gene",
            FeatData::Org(_) => "Org",
            FeatData::Cdregion(_) => "CDS",
            FeatData::Prot(p) => match p.processed {
                ProtProcessed::Mature => "mat_peptide",
                ProtProcessed::SignalPeptide => "sig_peptide",
                ProtProcessed::TransitPeptide => "transit_peptide",
                ProtProcessed::Propeptide => "propeptide",
                _ => "Prot",
            },
            FeatData::Rna(r) => r.kind.label(),
            FeatData::Pub(_) => "Pub",
            FeatData::Imp(imp) => &imp.key,
            FeatData::Region(_) => "Region",
            FeatData::Comment => "Comment",
            FeatData::Bond(_) => "Bond",
            FeatData::Site(_) => "Site",
            FeatData::User(_) => "User",
            FeatData::Het(_) => "Het",
            FeatData::NonStdResidue(_) => "NonStdResidue",
            FeatData::Biosrc(_) => "src",
            FeatData::PsecStr(_) => "PsecStr",
        }
    }

    pub fn is_cds(&self) -> bool {
        matches!(self, FeatData::Cdregion(_))
    }

    pub fn is_gene(&self) -> bool {
        matches!(self, FeatData::Gene(_))
    }

    pub fn is_mrna(&self) -> bool {
        matches!(self, FeatData::Rna(r) if r.kind == RnaType::Mrna)
    }

    pub fn is_imp(&self, key: &str) -> bool {
        matches!(self, FeatData::Imp(imp) if imp.key == key)
    }

    /// Features that only make sense on a protein Bioseq.
    pub fn is_protein_only(&self) -> bool {
        matches!(
            self,
            FeatData::Prot(_) | FeatData::PsecStr(_) | FeatData::Het(_) | FeatData::NonStdResidue(_)
        )
    }

    /// Features that only make sense on a nucleotide Bioseq.
    pub fn is_nucleotide_only(&self) -> bool {
        matches!(self, FeatData::Cdregion(_) | FeatData::Rna(_) | FeatData::Gene(_) | FeatData::Imp(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GbQual {
    pub qual: String,
    #[serde(default)]
    pub val: String,
}

impl GbQual {
    pub fn new(qual: impl Into<String>, val: impl Into<String>) -> Self {
        Self {
            qual: qual.into(),
            val: val.into(),
        }
    }
}

/// Cross-reference to another feature by id, or an inline payload
/// (typically a Gene-ref naming the gene this feature belongs to).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeqFeatXref {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<FeatId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<FeatData>,
}

impl SeqFeatXref {
    pub fn to_id(id: i64) -> Self {
        Self {
            id: Some(FeatId(id)),
            data: None,
        }
    }

    pub fn gene(gene: GeneRef) -> Self {
        Self {
            id: None,
            data: Some(FeatData::Gene(gene)),
        }
    }

    pub fn gene_ref(&self) -> Option<&GeneRef> {
        match &self.data {
            Some(FeatData::Gene(g)) => Some(g),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeqFeat {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<FeatId>,
    pub data: FeatData,
    #[serde(default)]
    pub partial: bool,
    #[serde(default)]
    pub except: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub except_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<SeqLoc>,
    pub location: SeqLoc,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub qual: Vec<GbQual>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub xref: Vec<SeqFeatXref>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dbxref: Vec<DbTag>,
    #[serde(default)]
    pub pseudo: bool,
}

impl SeqFeat {
    pub fn new(data: FeatData, location: SeqLoc) -> Self {
        Self {
            id: None,
            data,
            partial: false,
            except: false,
            except_text: None,
            comment: None,
            product: None,
            location,
            qual: Vec::new(),
            xref: Vec::new(),
            dbxref: Vec::new(),
            pseudo: false,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(FeatId(id));
        self
    }

    pub fn with_product(mut self, product: SeqLoc) -> Self {
        self.product = Some(product);
        self
    }

    pub fn with_qual(mut self, qual: impl Into<String>, val: impl Into<String>) -> Self {
        self.qual.push(GbQual::new(qual, val));
        self
    }

    pub fn with_xref(mut self, xref: SeqFeatXref) -> Self {
        self.xref.push(xref);
        self
    }

    pub fn with_exception(mut self, text: impl Into<String>) -> Self {
        self.except = true;
        self.except_text = Some(text.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn partial(mut self) -> Self {
        self.partial = true;
        self
    }

    pub fn pseudo(mut self) -> Self {
        self.pseudo = true;
        self
    }

    pub fn quals<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.qual
            .iter()
            .filter(move |q| q.qual.eq_ignore_ascii_case(name))
            .map(|q| q.val.as_str())
    }

    pub fn has_qual(&self, name: &str) -> bool {
        self.quals(name).next().is_some()
    }

    /// Pseudo either on the feature itself, or on its gene/RNA payload.
    pub fn is_pseudo(&self) -> bool {
        self.pseudo
            || self.has_qual("pseudogene")
            || match &self.data {
                FeatData::Gene(g) => g.pseudo,
                FeatData::Rna(r) => r.pseudo,
                _ => false,
            }
    }

    pub fn gene_xref(&self) -> Option<&GeneRef> {
        self.xref.iter().find_map(SeqFeatXref::gene_ref)
    }

    pub fn xref_ids(&self) -> impl Iterator<Item = FeatId> + '_ {
        self.xref.iter().filter_map(|x| x.id)
    }

    pub fn cdregion(&self) -> Option<&Cdregion> {
        match &self.data {
            FeatData::Cdregion(cds) => Some(cds),
            _ => None,
        }
    }

    pub fn gene_ref(&self) -> Option<&GeneRef> {
        match &self.data {
            FeatData::Gene(g) => Some(g),
            _ => None,
        }
    }

    pub fn rna_ref(&self) -> Option<&RnaRef> {
        match &self.data {
            FeatData::Rna(r) => Some(r),
            _ => None,
        }
    }

    pub fn prot_ref(&self) -> Option<&ProtRef> {
        match &self.data {
            FeatData::Prot(p) => Some(p),
            _ => None,
        }
    }

    /// Exception texts, split on commas and trimmed.
    pub fn exceptions(&self) -> Vec<&str> {
        self.except_text
            .as_deref()
            .map(|text| {
                text.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}
