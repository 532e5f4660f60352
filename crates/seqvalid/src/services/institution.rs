//! Institution and collection code dictionary.
//!
//! Rows are `code<TAB>kinds<TAB>name`. A code may carry a collection
//! (`MVZ:Herp`) or a country qualifier (`CIB<CHN>`). Kinds are any of the
//! letters `s` (specimen_voucher), `c` (culture_collection) and
//! `b` (bio_material).

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidatorError};
use crate::model::OrgModType;

const BUILTIN_CODES: &str = include_str!("../../data/institution_codes.tsv");

/// Voucher qualifier family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoucherKind {
    Specimen,
    Culture,
    BioMaterial,
}

impl VoucherKind {
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_lowercase() {
            's' => Some(VoucherKind::Specimen),
            'c' => Some(VoucherKind::Culture),
            'b' => Some(VoucherKind::BioMaterial),
            _ => None,
        }
    }

    pub fn of_qualifier(subtype: OrgModType) -> Option<Self> {
        match subtype {
            OrgModType::SpecimenVoucher => Some(VoucherKind::Specimen),
            OrgModType::CultureCollection => Some(VoucherKind::Culture),
            OrgModType::BioMaterial => Some(VoucherKind::BioMaterial),
            _ => None,
        }
    }

    /// Qualifier name as used in messages.
    pub fn label(&self) -> &'static str {
        match self {
            VoucherKind::Specimen => "specimen_voucher",
            VoucherKind::Culture => "culture_collection",
            VoucherKind::BioMaterial => "bio_material",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Institution {
    /// Code exactly as listed, including any `:COLL` or `<CTRY>` part.
    pub code: String,
    pub kinds: Vec<VoucherKind>,
    pub name: String,
}

impl Institution {
    /// Institution part of the code, without collection or country.
    pub fn base(&self) -> &str {
        let end = self.code.find([':', '<']).unwrap_or(self.code.len());
        &self.code[..end]
    }

    pub fn collection(&self) -> Option<&str> {
        self.code.split_once(':').map(|(_, coll)| coll)
    }

    pub fn accepts(&self, kind: VoucherKind) -> bool {
        self.kinds.contains(&kind)
    }
}

/// Result of looking up one code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeLookup<'a> {
    Exact(&'a Institution),
    /// Known, but written with different capitalization.
    WrongCase(&'a Institution),
    /// Only country-qualified variants exist.
    NeedsCountry(Vec<&'a Institution>),
    Unknown,
}

/// Case-aware institution dictionary.
#[derive(Debug, Clone, Default)]
pub struct InstitutionDictionary {
    entries: Vec<Institution>,
    by_code: HashMap<String, usize>,
    by_lower: HashMap<String, Vec<usize>>,
    /// Country-qualified entries by uppercase base code.
    qualified: HashMap<String, Vec<usize>>,
}

impl InstitutionDictionary {
    /// The dictionary shipped with the crate.
    pub fn builtin() -> Self {
        // the embedded table is checked by the tests below
        Self::from_tsv(BUILTIN_CODES.as_bytes()).unwrap_or_default()
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| ValidatorError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_tsv(&bytes[..])
    }

    pub fn from_tsv(bytes: &[u8]) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .comment(Some(b'#'))
            .flexible(true)
            .from_reader(bytes);

        let mut dict = Self::default();
        for result in reader.records() {
            let record = result?;
            let code = record.get(0).unwrap_or_default().trim();
            if code.is_empty() {
                continue;
            }
            let kinds = record
                .get(1)
                .unwrap_or_default()
                .chars()
                .filter_map(VoucherKind::from_letter)
                .collect();
            let name = record.get(2).unwrap_or_default().trim().to_string();
            dict.insert(Institution {
                code: code.to_string(),
                kinds,
                name,
            });
        }
        log::debug!("loaded {} institution codes", dict.len());
        Ok(dict)
    }

    pub fn insert(&mut self, institution: Institution) {
        let idx = self.entries.len();
        self.by_code.insert(institution.code.clone(), idx);
        self.by_lower
            .entry(institution.code.to_lowercase())
            .or_default()
            .push(idx);
        if institution.code.contains('<') {
            self.qualified
                .entry(institution.base().to_uppercase())
                .or_default()
                .push(idx);
        }
        self.entries.push(institution);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, code: &str) -> Option<&Institution> {
        self.by_code.get(code).map(|i| &self.entries[*i])
    }

    /// Look up a code (optionally `CODE:COLL` or `CODE<CTRY>`).
    pub fn lookup(&self, code: &str) -> CodeLookup<'_> {
        if let Some(inst) = self.get(code) {
            return CodeLookup::Exact(inst);
        }
        if let Some(idxs) = self.by_lower.get(&code.to_lowercase()) {
            if let Some(i) = idxs.first() {
                return CodeLookup::WrongCase(&self.entries[*i]);
            }
        }
        if !code.contains('<') {
            if let Some(idxs) = self.qualified.get(&code.to_uppercase()) {
                return CodeLookup::NeedsCountry(idxs.iter().map(|i| &self.entries[*i]).collect());
            }
        }
        CodeLookup::Unknown
    }

    /// Collection codes listed for an institution.
    pub fn collections_of(&self, base: &str) -> Vec<&str> {
        let prefix = format!("{}:", base);
        let mut colls: Vec<&str> = self
            .entries
            .iter()
            .filter(|e| e.code.starts_with(&prefix))
            .filter_map(|e| e.collection())
            .collect();
        colls.sort_unstable();
        colls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_loads() {
        let dict = InstitutionDictionary::builtin();
        assert!(dict.len() > 40);
        assert!(dict.get("USNM").is_some());
    }

    #[test]
    fn test_lookup_variants() {
        let dict = InstitutionDictionary::builtin();
        assert!(matches!(dict.lookup("MVZ"), CodeLookup::Exact(_)));
        match dict.lookup("usnm") {
            CodeLookup::WrongCase(inst) => assert_eq!(inst.code, "USNM"),
            other => panic!("expected wrong case, got {:?}", other),
        }
        match dict.lookup("CIB") {
            CodeLookup::NeedsCountry(options) => assert_eq!(options.len(), 2),
            other => panic!("expected country qualifier, got {:?}", other),
        }
        assert!(matches!(dict.lookup("CIB<CHN>"), CodeLookup::Exact(_)));
        assert_eq!(dict.lookup("XYZZY"), CodeLookup::Unknown);
    }

    #[test]
    fn test_collections_and_kinds() {
        let dict = InstitutionDictionary::builtin();
        assert_eq!(dict.collections_of("MVZ"), vec!["Bird", "Herp", "Mamm"]);
        let atcc = dict.get("ATCC").unwrap();
        assert!(atcc.accepts(VoucherKind::Culture));
        assert!(atcc.accepts(VoucherKind::BioMaterial));
        assert!(!atcc.accepts(VoucherKind::Specimen));
        assert_eq!(dict.get("MVZ:Herp").unwrap().base(), "MVZ");
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codes.tsv");
        std::fs::write(&path, "ABC\ts\tA Big Collection\nABC:Fish\ts\tFish\n").unwrap();
        let dict = InstitutionDictionary::from_path(&path).unwrap();
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.collections_of("ABC"), vec!["Fish"]);
    }
}
