//! Sequence identifiers and the accession classes derived from them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Object identifier: either a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObjectId {
    Id(i64),
    Str(String),
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectId::Id(id) => write!(f, "{}", id),
            ObjectId::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for ObjectId {
    fn from(value: &str) -> Self {
        ObjectId::Str(value.to_string())
    }
}

impl From<i64> for ObjectId {
    fn from(value: i64) -> Self {
        ObjectId::Id(value)
    }
}

/// Database cross-reference (`db:tag`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DbTag {
    pub db: String,
    pub tag: ObjectId,
}

impl DbTag {
    pub fn new(db: impl Into<String>, tag: impl Into<ObjectId>) -> Self {
        Self {
            db: db.into(),
            tag: tag.into(),
        }
    }
}

impl fmt::Display for DbTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.db, self.tag)
    }
}

/// Accession-style identifier shared by the INSD and RefSeq id types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TextSeqId {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accession: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
}

impl TextSeqId {
    pub fn new(accession: impl Into<String>, version: Option<u32>) -> Self {
        Self {
            accession: Some(accession.into()),
            name: None,
            version,
        }
    }

    /// `ACCESSION.VERSION`, or the bare accession/name when parts are missing.
    pub fn label(&self) -> String {
        match (&self.accession, self.version, &self.name) {
            (Some(acc), Some(v), _) => format!("{}.{}", acc, v),
            (Some(acc), None, _) => acc.clone(),
            (None, _, Some(name)) => name.clone(),
            (None, _, None) => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatentSeqId {
    pub country: String,
    pub number: String,
    pub seqid: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PdbSeqId {
    pub mol: String,
    #[serde(default)]
    pub chain: String,
}

/// A sequence identifier.
///
/// `Other` is the RefSeq identifier type; `Tpg`/`Tpe`/`Tpd` are the
/// third-party annotation variants of the three INSD partners.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeqId {
    Local(ObjectId),
    General(DbTag),
    Gi(i64),
    Genbank(TextSeqId),
    Embl(TextSeqId),
    Ddbj(TextSeqId),
    Tpg(TextSeqId),
    Tpe(TextSeqId),
    Tpd(TextSeqId),
    Other(TextSeqId),
    Gpipe(TextSeqId),
    Patent(PatentSeqId),
    Pdb(PdbSeqId),
}

impl SeqId {
    pub fn local(id: impl Into<ObjectId>) -> Self {
        SeqId::Local(id.into())
    }

    pub fn general(db: impl Into<String>, tag: impl Into<ObjectId>) -> Self {
        SeqId::General(DbTag::new(db, tag))
    }

    pub fn genbank(accession: impl Into<String>, version: Option<u32>) -> Self {
        SeqId::Genbank(TextSeqId::new(accession, version))
    }

    pub fn embl(accession: impl Into<String>, version: Option<u32>) -> Self {
        SeqId::Embl(TextSeqId::new(accession, version))
    }

    pub fn ddbj(accession: impl Into<String>, version: Option<u32>) -> Self {
        SeqId::Ddbj(TextSeqId::new(accession, version))
    }

    pub fn refseq(accession: impl Into<String>, version: Option<u32>) -> Self {
        SeqId::Other(TextSeqId::new(accession, version))
    }

    pub fn patent(country: impl Into<String>, number: impl Into<String>, seqid: u32) -> Self {
        SeqId::Patent(PatentSeqId {
            country: country.into(),
            number: number.into(),
            seqid,
        })
    }

    /// The textual part shared by accession-bearing ids.
    pub fn text_id(&self) -> Option<&TextSeqId> {
        match self {
            SeqId::Genbank(t)
            | SeqId::Embl(t)
            | SeqId::Ddbj(t)
            | SeqId::Tpg(t)
            | SeqId::Tpe(t)
            | SeqId::Tpd(t)
            | SeqId::Other(t)
            | SeqId::Gpipe(t) => Some(t),
            _ => None,
        }
    }

    /// The accession without version, if this id carries one.
    pub fn accession(&self) -> Option<&str> {
        self.text_id().and_then(|t| t.accession.as_deref())
    }

    /// Label used as the accession of a finding: `AB123456.1` for
    /// accession-bearing ids, the FASTA form (`lcl|nuc`) otherwise.
    pub fn label(&self) -> String {
        match self.text_id() {
            Some(t) if t.accession.is_some() => t.label(),
            _ => self.to_string(),
        }
    }

    fn prefix(&self) -> &'static str {
        match self {
            SeqId::Local(_) => "lcl",
            SeqId::General(_) => "gnl",
            SeqId::Gi(_) => "gi",
            SeqId::Genbank(_) => "gb",
            SeqId::Embl(_) => "emb",
            SeqId::Ddbj(_) => "dbj",
            SeqId::Tpg(_) => "tpg",
            SeqId::Tpe(_) => "tpe",
            SeqId::Tpd(_) => "tpd",
            SeqId::Other(_) => "ref",
            SeqId::Gpipe(_) => "gpp",
            SeqId::Patent(_) => "pat",
            SeqId::Pdb(_) => "pdb",
        }
    }

    /// Lookup key used to match ids across a record.
    ///
    /// Versions are dropped so that `gb|AB123456.1|` and `gb|AB123456|`
    /// resolve to the same Bioseq.
    pub fn key(&self) -> String {
        match self.text_id() {
            Some(t) => {
                let core = t
                    .accession
                    .as_deref()
                    .or(t.name.as_deref())
                    .unwrap_or_default()
                    .to_ascii_uppercase();
                format!("{}|{}", self.prefix(), core)
            }
            None => self.to_string(),
        }
    }

    /// Rank used to pick the identifier shown in findings (lower wins).
    pub fn display_rank(&self) -> u8 {
        match AccessionClass::of(self) {
            AccessionClass::RefSeq => 0,
            c if c.is_insd() => 1,
            AccessionClass::Patent => 2,
            AccessionClass::Pdb => 3,
            AccessionClass::General => 4,
            AccessionClass::Local => 5,
            AccessionClass::Gi => 6,
            _ => 7,
        }
    }
}

impl fmt::Display for SeqId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeqId::Local(id) => write!(f, "lcl|{}", id),
            SeqId::General(tag) => write!(f, "gnl|{}|{}", tag.db, tag.tag),
            SeqId::Gi(gi) => write!(f, "gi|{}", gi),
            SeqId::Patent(p) => write!(f, "pat|{}|{}|{}", p.country, p.number, p.seqid),
            SeqId::Pdb(p) => {
                if p.chain.is_empty() {
                    write!(f, "pdb|{}|", p.mol)
                } else {
                    write!(f, "pdb|{}|{}", p.mol, p.chain)
                }
            }
            other => {
                // text ids always have a text part
                let label = other.text_id().map(TextSeqId::label).unwrap_or_default();
                let name = other
                    .text_id()
                    .and_then(|t| if t.accession.is_some() { t.name.as_deref() } else { None })
                    .unwrap_or_default();
                write!(f, "{}|{}|{}", other.prefix(), label, name)
            }
        }
    }
}

/// Category of identifier that drives severity policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessionClass {
    Local,
    General,
    Gi,
    GenBank,
    Embl,
    Ddbj,
    /// Third-party annotation (TPA) in any of the INSD partners.
    Tpa,
    RefSeq,
    Patent,
    Pdb,
    Other,
}

impl AccessionClass {
    pub fn of(id: &SeqId) -> Self {
        match id {
            SeqId::Local(_) => AccessionClass::Local,
            SeqId::General(_) => AccessionClass::General,
            SeqId::Gi(_) => AccessionClass::Gi,
            SeqId::Genbank(_) => AccessionClass::GenBank,
            SeqId::Embl(_) => AccessionClass::Embl,
            SeqId::Ddbj(_) => AccessionClass::Ddbj,
            SeqId::Tpg(_) | SeqId::Tpe(_) | SeqId::Tpd(_) => AccessionClass::Tpa,
            SeqId::Other(_) => AccessionClass::RefSeq,
            SeqId::Patent(_) => AccessionClass::Patent,
            SeqId::Pdb(_) => AccessionClass::Pdb,
            SeqId::Gpipe(_) => AccessionClass::Other,
        }
    }

    /// Class of a Bioseq, taken from its most authoritative identifier.
    pub fn for_ids(ids: &[SeqId]) -> Self {
        let classes: Vec<AccessionClass> = ids.iter().map(AccessionClass::of).collect();
        let order = [
            AccessionClass::RefSeq,
            AccessionClass::GenBank,
            AccessionClass::Embl,
            AccessionClass::Ddbj,
            AccessionClass::Tpa,
            AccessionClass::Patent,
            AccessionClass::Pdb,
            AccessionClass::Other,
            AccessionClass::General,
            AccessionClass::Gi,
        ];
        order
            .into_iter()
            .find(|c| classes.contains(c))
            .unwrap_or(AccessionClass::Local)
    }

    /// GenBank, EMBL, DDBJ and their TPA variants.
    pub fn is_insd(self) -> bool {
        matches!(
            self,
            AccessionClass::GenBank | AccessionClass::Embl | AccessionClass::Ddbj | AccessionClass::Tpa
        )
    }

    /// True for ids that never leave the submitter (local and general).
    pub fn is_local_only(self) -> bool {
        matches!(self, AccessionClass::Local | AccessionClass::General)
    }

    pub fn label(&self) -> &'static str {
        match self {
            AccessionClass::Local => "Local",
            AccessionClass::General => "General",
            AccessionClass::Gi => "GI",
            AccessionClass::GenBank => "GenBank",
            AccessionClass::Embl => "EMBL",
            AccessionClass::Ddbj => "DDBJ",
            AccessionClass::Tpa => "TPA",
            AccessionClass::RefSeq => "RefSeq",
            AccessionClass::Patent => "Patent",
            AccessionClass::Pdb => "PDB",
            AccessionClass::Other => "Other",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fasta_labels() {
        assert_eq!(SeqId::local("nuc").to_string(), "lcl|nuc");
        assert_eq!(SeqId::genbank("AB123456", Some(1)).to_string(), "gb|AB123456.1|");
        assert_eq!(SeqId::refseq("NC_000001", Some(11)).to_string(), "ref|NC_000001.11|");
        assert_eq!(SeqId::general("center", "tag1").to_string(), "gnl|center|tag1");
        assert_eq!(SeqId::patent("US", "123", 4).to_string(), "pat|US|123|4");
    }

    #[test]
    fn test_key_ignores_version() {
        let a = SeqId::genbank("AB123456", Some(1));
        let b = SeqId::genbank("ab123456", None);
        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), SeqId::embl("AB123456", Some(1)).key());
    }

    #[test]
    fn test_accession_class_for_ids() {
        let ids = vec![SeqId::local("x"), SeqId::genbank("AB123456", Some(1))];
        assert_eq!(AccessionClass::for_ids(&ids), AccessionClass::GenBank);
        assert_eq!(AccessionClass::for_ids(&[SeqId::local("x")]), AccessionClass::Local);
        assert_eq!(
            AccessionClass::for_ids(&[SeqId::refseq("NM_000001", Some(1)), SeqId::genbank("A", None)]),
            AccessionClass::RefSeq
        );
        assert!(AccessionClass::Tpa.is_insd());
        assert!(!AccessionClass::RefSeq.is_insd());
    }
}
