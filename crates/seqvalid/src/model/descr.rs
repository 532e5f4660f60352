//! Descriptors: MolInfo, BioSource, publications, user objects and friends.

use serde::{Deserialize, Serialize};

use super::seqid::{DbTag, ObjectId};

// ============================================================================
// MolInfo
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Biomol {
    #[default]
    Unknown,
    Genomic,
    PreRna,
    Mrna,
    Rrna,
    Trna,
    Snrna,
    Scrna,
    Peptide,
    OtherGenetic,
    GenomicMrna,
    Crna,
    Snorna,
    TranscribedRna,
    Ncrna,
    Tmrna,
    Other,
}

impl Biomol {
    pub fn label(&self) -> &'static str {
        match self {
            Biomol::Unknown => "unknown",
            Biomol::Genomic => "genomic",
            Biomol::PreRna => "pre-RNA",
            Biomol::Mrna => "mRNA",
            Biomol::Rrna => "rRNA",
            Biomol::Trna => "tRNA",
            Biomol::Snrna => "snRNA",
            Biomol::Scrna => "scRNA",
            Biomol::Peptide => "peptide",
            Biomol::OtherGenetic => "other-genetic",
            Biomol::GenomicMrna => "genomic-mRNA",
            Biomol::Crna => "cRNA",
            Biomol::Snorna => "snoRNA",
            Biomol::TranscribedRna => "transcribed_RNA",
            Biomol::Ncrna => "ncRNA",
            Biomol::Tmrna => "tmRNA",
            Biomol::Other => "other",
        }
    }

    pub fn is_rna(self) -> bool {
        matches!(
            self,
            Biomol::PreRna
                | Biomol::Mrna
                | Biomol::Rrna
                | Biomol::Trna
                | Biomol::Snrna
                | Biomol::Scrna
                | Biomol::Crna
                | Biomol::Snorna
                | Biomol::TranscribedRna
                | Biomol::Ncrna
                | Biomol::Tmrna
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tech {
    #[default]
    Unknown,
    Standard,
    Est,
    Sts,
    Survey,
    Genemap,
    Physmap,
    Derived,
    ConceptTrans,
    SeqPept,
    Both,
    SeqPeptOverlap,
    SeqPeptHomol,
    ConceptTransA,
    Htgs1,
    Htgs2,
    Htgs3,
    FliCdna,
    Htgs0,
    Htc,
    Wgs,
    Barcode,
    CompositeWgsHtgs,
    Tsa,
    Targeted,
    Other,
}

impl Tech {
    pub fn is_htgs(self) -> bool {
        matches!(self, Tech::Htgs0 | Tech::Htgs1 | Tech::Htgs2 | Tech::Htgs3)
    }

    /// Techniques that may legitimately start or end with a gap.
    pub fn allows_terminal_gaps(self) -> bool {
        matches!(
            self,
            Tech::Htgs0 | Tech::Htgs1 | Tech::Htgs2 | Tech::Wgs | Tech::CompositeWgsHtgs
        )
    }

    pub fn is_protein_tech(self) -> bool {
        matches!(
            self,
            Tech::ConceptTrans
                | Tech::SeqPept
                | Tech::Both
                | Tech::SeqPeptOverlap
                | Tech::SeqPeptHomol
                | Tech::ConceptTransA
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Completeness {
    #[default]
    Unknown,
    Complete,
    Partial,
    NoLeft,
    NoRight,
    NoEnds,
    HasLeft,
    HasRight,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MolInfo {
    #[serde(default)]
    pub biomol: Biomol,
    #[serde(default)]
    pub tech: Tech,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub techexp: Option<String>,
    #[serde(default)]
    pub completeness: Completeness,
}

impl MolInfo {
    pub fn new(biomol: Biomol) -> Self {
        Self {
            biomol,
            ..Default::default()
        }
    }

    pub fn with_tech(mut self, tech: Tech) -> Self {
        self.tech = tech;
        self
    }

    pub fn with_completeness(mut self, completeness: Completeness) -> Self {
        self.completeness = completeness;
        self
    }
}

// ============================================================================
// BioSource
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Genome {
    #[default]
    Unknown,
    Genomic,
    Chloroplast,
    Chromoplast,
    Kinetoplast,
    Mitochondrion,
    Plastid,
    Macronuclear,
    Extrachrom,
    Plasmid,
    Transposon,
    InsertionSeq,
    Cyanelle,
    Proviral,
    Virion,
    Nucleomorph,
    Apicoplast,
    Leucoplast,
    Proplastid,
    EndogenousVirus,
    Hydrogenosome,
    Chromosome,
    Chromatophore,
    PlasmidInMitochondrion,
    PlasmidInPlastid,
}

impl Genome {
    pub fn label(&self) -> &'static str {
        match self {
            Genome::Unknown => "unknown",
            Genome::Genomic => "genomic",
            Genome::Chloroplast => "chloroplast",
            Genome::Chromoplast => "chromoplast",
            Genome::Kinetoplast => "kinetoplast",
            Genome::Mitochondrion => "mitochondrion",
            Genome::Plastid => "plastid",
            Genome::Macronuclear => "macronuclear",
            Genome::Extrachrom => "extrachrom",
            Genome::Plasmid => "plasmid",
            Genome::Transposon => "transposon",
            Genome::InsertionSeq => "insertion-seq",
            Genome::Cyanelle => "cyanelle",
            Genome::Proviral => "proviral",
            Genome::Virion => "virion",
            Genome::Nucleomorph => "nucleomorph",
            Genome::Apicoplast => "apicoplast",
            Genome::Leucoplast => "leucoplast",
            Genome::Proplastid => "proplastid",
            Genome::EndogenousVirus => "endogenous-virus",
            Genome::Hydrogenosome => "hydrogenosome",
            Genome::Chromosome => "chromosome",
            Genome::Chromatophore => "chromatophore",
            Genome::PlasmidInMitochondrion => "plasmid-in-mitochondrion",
            Genome::PlasmidInPlastid => "plasmid-in-plastid",
        }
    }

    /// Locations whose genes use the mitochondrial genetic code.
    pub fn uses_mito_code(self) -> bool {
        matches!(
            self,
            Genome::Mitochondrion | Genome::Kinetoplast | Genome::Hydrogenosome | Genome::PlasmidInMitochondrion
        )
    }

    /// Locations whose genes use the plastid genetic code.
    pub fn uses_plastid_code(self) -> bool {
        matches!(
            self,
            Genome::Chloroplast
                | Genome::Chromoplast
                | Genome::Plastid
                | Genome::Cyanelle
                | Genome::Apicoplast
                | Genome::Leucoplast
                | Genome::Proplastid
                | Genome::Chromatophore
                | Genome::PlasmidInPlastid
        )
    }

    pub fn is_organelle(self) -> bool {
        self.uses_mito_code() || self.uses_plastid_code() || self == Genome::Nucleomorph
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    #[default]
    Unknown,
    Natural,
    Natmut,
    Mut,
    Artificial,
    Synthetic,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrgModType {
    Strain,
    Substrain,
    Type,
    Subtype,
    Variety,
    Serotype,
    Serogroup,
    Serovar,
    Cultivar,
    Pathovar,
    Chemovar,
    Biovar,
    Biotype,
    Group,
    Subgroup,
    Isolate,
    Common,
    Acronym,
    Dosage,
    NatHost,
    SubSpecies,
    SpecimenVoucher,
    Authority,
    Forma,
    FormaSpecialis,
    Ecotype,
    Synonym,
    Anamorph,
    Teleomorph,
    Breed,
    GbAcronym,
    GbAnamorph,
    GbSynonym,
    CultureCollection,
    BioMaterial,
    MetagenomeSource,
    TypeMaterial,
    OldLineage,
    OldName,
    Other,
}

impl OrgModType {
    /// Qualifier name as written in flat files.
    pub fn label(&self) -> &'static str {
        match self {
            OrgModType::Strain => "strain",
            OrgModType::Substrain => "substrain",
            OrgModType::Type => "type",
            OrgModType::Subtype => "subtype",
            OrgModType::Variety => "variety",
            OrgModType::Serotype => "serotype",
            OrgModType::Serogroup => "serogroup",
            OrgModType::Serovar => "serovar",
            OrgModType::Cultivar => "cultivar",
            OrgModType::Pathovar => "pathovar",
            OrgModType::Chemovar => "chemovar",
            OrgModType::Biovar => "biovar",
            OrgModType::Biotype => "biotype",
            OrgModType::Group => "group",
            OrgModType::Subgroup => "subgroup",
            OrgModType::Isolate => "isolate",
            OrgModType::Common => "common",
            OrgModType::Acronym => "acronym",
            OrgModType::Dosage => "dosage",
            OrgModType::NatHost => "host",
            OrgModType::SubSpecies => "sub_species",
            OrgModType::SpecimenVoucher => "specimen_voucher",
            OrgModType::Authority => "authority",
            OrgModType::Forma => "forma",
            OrgModType::FormaSpecialis => "forma_specialis",
            OrgModType::Ecotype => "ecotype",
            OrgModType::Synonym => "synonym",
            OrgModType::Anamorph => "anamorph",
            OrgModType::Teleomorph => "teleomorph",
            OrgModType::Breed => "breed",
            OrgModType::GbAcronym => "gb_acronym",
            OrgModType::GbAnamorph => "gb_anamorph",
            OrgModType::GbSynonym => "gb_synonym",
            OrgModType::CultureCollection => "culture_collection",
            OrgModType::BioMaterial => "bio_material",
            OrgModType::MetagenomeSource => "metagenome_source",
            OrgModType::TypeMaterial => "type_material",
            OrgModType::OldLineage => "old_lineage",
            OrgModType::OldName => "old_name",
            OrgModType::Other => "note",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgMod {
    pub subtype: OrgModType,
    pub subname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrib: Option<String>,
}

impl OrgMod {
    pub fn new(subtype: OrgModType, subname: impl Into<String>) -> Self {
        Self {
            subtype,
            subname: subname.into(),
            attrib: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrgName {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lineage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub div: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gcode: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mgcode: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pgcode: Option<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mods: Vec<OrgMod>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrgRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub db: Vec<DbTag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub syn: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orgname: Option<OrgName>,
}

impl OrgRef {
    pub fn new(taxname: impl Into<String>) -> Self {
        Self {
            taxname: Some(taxname.into()),
            ..Default::default()
        }
    }

    pub fn with_taxid(mut self, taxid: i64) -> Self {
        self.db.retain(|tag| tag.db != "taxon");
        self.db.push(DbTag::new("taxon", taxid));
        self
    }

    pub fn with_lineage(mut self, lineage: impl Into<String>, div: impl Into<String>) -> Self {
        let orgname = self.orgname.get_or_insert_with(OrgName::default);
        orgname.lineage = Some(lineage.into());
        orgname.div = Some(div.into());
        self
    }

    pub fn with_mod(mut self, subtype: OrgModType, value: impl Into<String>) -> Self {
        self.orgname
            .get_or_insert_with(OrgName::default)
            .mods
            .push(OrgMod::new(subtype, value));
        self
    }

    pub fn taxname(&self) -> &str {
        self.taxname.as_deref().unwrap_or_default()
    }

    /// Taxonomy id from a `taxon` db cross-reference.
    pub fn taxid(&self) -> Option<i64> {
        self.db.iter().find(|tag| tag.db == "taxon").and_then(|tag| match &tag.tag {
            ObjectId::Id(id) => Some(*id),
            ObjectId::Str(s) => s.parse().ok(),
        })
    }

    pub fn lineage(&self) -> &str {
        self.orgname
            .as_ref()
            .and_then(|o| o.lineage.as_deref())
            .unwrap_or_default()
    }

    pub fn div(&self) -> &str {
        self.orgname.as_ref().and_then(|o| o.div.as_deref()).unwrap_or_default()
    }

    pub fn mods(&self) -> &[OrgMod] {
        self.orgname.as_ref().map(|o| o.mods.as_slice()).unwrap_or_default()
    }

    pub fn mods_of(&self, subtype: OrgModType) -> impl Iterator<Item = &OrgMod> {
        self.mods().iter().filter(move |m| m.subtype == subtype)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubSourceType {
    Chromosome,
    Map,
    Clone,
    Subclone,
    Haplotype,
    Genotype,
    Sex,
    CellLine,
    CellType,
    TissueType,
    CloneLib,
    DevStage,
    Frequency,
    Germline,
    Rearranged,
    LabHost,
    PopVariant,
    TissueLib,
    PlasmidName,
    TransposonName,
    InsertionSeqName,
    PlastidName,
    Country,
    Segment,
    EndogenousVirusName,
    Transgenic,
    EnvironmentalSample,
    IsolationSource,
    LatLon,
    CollectionDate,
    CollectedBy,
    IdentifiedBy,
    FwdPrimerSeq,
    RevPrimerSeq,
    FwdPrimerName,
    RevPrimerName,
    Metagenomic,
    MatingType,
    LinkageGroup,
    Haplogroup,
    WholeReplicon,
    Phenotype,
    Altitude,
    Other,
}

impl SubSourceType {
    pub fn label(&self) -> &'static str {
        match self {
            SubSourceType::Chromosome => "chromosome",
            SubSourceType::Map => "map",
            SubSourceType::Clone => "clone",
            SubSourceType::Subclone => "subclone",
            SubSourceType::Haplotype => "haplotype",
            SubSourceType::Genotype => "genotype",
            SubSourceType::Sex => "sex",
            SubSourceType::CellLine => "cell_line",
            SubSourceType::CellType => "cell_type",
            SubSourceType::TissueType => "tissue_type",
            SubSourceType::CloneLib => "clone_lib",
            SubSourceType::DevStage => "dev_stage",
            SubSourceType::Frequency => "frequency",
            SubSourceType::Germline => "germline",
            SubSourceType::Rearranged => "rearranged",
            SubSourceType::LabHost => "lab_host",
            SubSourceType::PopVariant => "pop_variant",
            SubSourceType::TissueLib => "tissue_lib",
            SubSourceType::PlasmidName => "plasmid_name",
            SubSourceType::TransposonName => "transposon_name",
            SubSourceType::InsertionSeqName => "insertion_seq_name",
            SubSourceType::PlastidName => "plastid_name",
            SubSourceType::Country => "country",
            SubSourceType::Segment => "segment",
            SubSourceType::EndogenousVirusName => "endogenous_virus_name",
            SubSourceType::Transgenic => "transgenic",
            SubSourceType::EnvironmentalSample => "environmental_sample",
            SubSourceType::IsolationSource => "isolation_source",
            SubSourceType::LatLon => "lat_lon",
            SubSourceType::CollectionDate => "collection_date",
            SubSourceType::CollectedBy => "collected_by",
            SubSourceType::IdentifiedBy => "identified_by",
            SubSourceType::FwdPrimerSeq => "fwd_primer_seq",
            SubSourceType::RevPrimerSeq => "rev_primer_seq",
            SubSourceType::FwdPrimerName => "fwd_primer_name",
            SubSourceType::RevPrimerName => "rev_primer_name",
            SubSourceType::Metagenomic => "metagenomic",
            SubSourceType::MatingType => "mating_type",
            SubSourceType::LinkageGroup => "linkage_group",
            SubSourceType::Haplogroup => "haplogroup",
            SubSourceType::WholeReplicon => "whole_replicon",
            SubSourceType::Phenotype => "phenotype",
            SubSourceType::Altitude => "altitude",
            SubSourceType::Other => "note",
        }
    }

    /// Flag qualifiers carry no meaningful value.
    pub fn is_flag(self) -> bool {
        matches!(
            self,
            SubSourceType::Germline
                | SubSourceType::Rearranged
                | SubSourceType::Transgenic
                | SubSourceType::EnvironmentalSample
                | SubSourceType::Metagenomic
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubSource {
    pub subtype: SubSourceType,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrib: Option<String>,
}

impl SubSource {
    pub fn new(subtype: SubSourceType, name: impl Into<String>) -> Self {
        Self {
            subtype,
            name: name.into(),
            attrib: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BioSource {
    #[serde(default)]
    pub genome: Genome,
    #[serde(default)]
    pub origin: Origin,
    pub org: OrgRef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtype: Vec<SubSource>,
    #[serde(default)]
    pub is_focus: bool,
}

impl BioSource {
    pub fn new(org: OrgRef) -> Self {
        Self {
            org,
            ..Default::default()
        }
    }

    pub fn with_genome(mut self, genome: Genome) -> Self {
        self.genome = genome;
        self
    }

    pub fn with_subsource(mut self, subtype: SubSourceType, value: impl Into<String>) -> Self {
        self.subtype.push(SubSource::new(subtype, value));
        self
    }

    pub fn subsources_of(&self, subtype: SubSourceType) -> impl Iterator<Item = &SubSource> {
        self.subtype.iter().filter(move |s| s.subtype == subtype)
    }

    pub fn first_subsource(&self, subtype: SubSourceType) -> Option<&str> {
        self.subsources_of(subtype).next().map(|s| s.name.as_str())
    }

    pub fn has_subsource(&self, subtype: SubSourceType) -> bool {
        self.subsources_of(subtype).next().is_some()
    }
}

// ============================================================================
// Dates
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateStd {
    pub year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Date {
    Std(DateStd),
    Str(String),
}

impl Date {
    pub fn ymd(year: i32, month: u32, day: u32) -> Self {
        Date::Std(DateStd {
            year,
            month: Some(month),
            day: Some(day),
            season: None,
        })
    }

    pub fn year(year: i32) -> Self {
        Date::Std(DateStd {
            year,
            ..Default::default()
        })
    }

    /// Sortable key; missing month/day compare as zero.
    pub fn sort_key(&self) -> Option<(i32, u32, u32)> {
        match self {
            Date::Std(d) => Some((d.year, d.month.unwrap_or(0), d.day.unwrap_or(0))),
            Date::Str(_) => None,
        }
    }
}

// ============================================================================
// Publications
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub last: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initials: Option<String>,
}

impl Author {
    pub fn new(last: impl Into<String>, first: impl Into<String>) -> Self {
        Self {
            last: last.into(),
            first: Some(first.into()),
            initials: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Affil {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affil: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AuthList {
    #[serde(default)]
    pub names: Vec<Author>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affil: Option<Affil>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Imprint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<Date>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<String>,
    /// Set for in-press and submitted articles.
    #[serde(default)]
    pub prepub: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CitJour {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iso_jta: Option<String>,
    #[serde(default)]
    pub imp: Imprint,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CitArt {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub authors: AuthList,
    pub journal: CitJour,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CitSub {
    #[serde(default)]
    pub authors: AuthList,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<Date>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descr: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CitGen {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<AuthList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<Date>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pub {
    Gen(CitGen),
    Sub(CitSub),
    Article(CitArt),
    Pmid(i64),
    Muid(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pubdesc {
    pub pubs: Vec<Pub>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Pubdesc {
    pub fn new(pubs: Vec<Pub>) -> Self {
        Self { pubs, comment: None }
    }

    pub fn has_pmid(&self) -> bool {
        self.pubs.iter().any(|p| matches!(p, Pub::Pmid(_) | Pub::Muid(_)))
    }
}

// ============================================================================
// User objects
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserData {
    Str(String),
    Int(i64),
    Real(f64),
    Bool(bool),
    Strs(Vec<String>),
    Ints(Vec<i64>),
    Fields(Vec<UserField>),
    Object(UserObject),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserField {
    pub label: ObjectId,
    pub data: UserData,
}

impl UserField {
    pub fn str(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: ObjectId::Str(label.into()),
            data: UserData::Str(value.into()),
        }
    }

    pub fn label_str(&self) -> Option<&str> {
        match &self.label {
            ObjectId::Str(s) => Some(s),
            ObjectId::Id(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.data {
            UserData::Str(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(rename = "type")]
    pub kind: ObjectId,
    #[serde(default)]
    pub data: Vec<UserField>,
}

impl UserObject {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            class: None,
            kind: ObjectId::Str(kind.into()),
            data: Vec::new(),
        }
    }

    pub fn with_field(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.push(UserField::str(label, value));
        self
    }

    pub fn kind_str(&self) -> Option<&str> {
        match &self.kind {
            ObjectId::Str(s) => Some(s),
            ObjectId::Id(_) => None,
        }
    }

    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind_str().is_some_and(|k| k.eq_ignore_ascii_case(kind))
    }

    pub fn field(&self, label: &str) -> Option<&UserField> {
        self.data.iter().find(|f| f.label_str() == Some(label))
    }
}

// ============================================================================
// GenBank block and the descriptor union
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GbBlock {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_accessions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub div: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Descriptor {
    MolInfo(MolInfo),
    Source(BioSource),
    Pub(Pubdesc),
    Title(String),
    Comment(String),
    User(UserObject),
    Genbank(GbBlock),
    CreateDate(Date),
    UpdateDate(Date),
    Name(String),
    Region(String),
}

impl Descriptor {
    pub fn label(&self) -> &'static str {
        match self {
            Descriptor::MolInfo(_) => "MolInfo",
            Descriptor::Source(_) => "BioSource",
            Descriptor::Pub(_) => "Pub",
            Descriptor::Title(_) => "Title",
            Descriptor::Comment(_) => "Comment",
            Descriptor::User(_) => "User",
            Descriptor::Genbank(_) => "GenBank",
            Descriptor::CreateDate(_) => "CreateDate",
            Descriptor::UpdateDate(_) => "UpdateDate",
            Descriptor::Name(_) => "Name",
            Descriptor::Region(_) => "Region",
        }
    }
}
