//! Voucher qualifiers: `/specimen_voucher`, `/culture_collection` and
//! `/bio_material`, parsed as `CODE[:COLLECTION]:ID` and checked against the
//! institution dictionary.

use std::collections::HashSet;

use super::Scope;
use super::biosource::Problem;
use crate::diag::{ErrorCode, FindingSink, Severity};
use crate::error::Result;
use crate::model::BioSource;
use crate::services::{CodeLookup, Institution, InstitutionDictionary, VoucherKind};

/// Institution code for privately held material; never looked up.
const PERSONAL: &str = "personal";

/// A structured voucher value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Voucher<'v> {
    pub institution: &'v str,
    pub collection: Option<&'v str>,
    pub id: &'v str,
}

impl Voucher<'_> {
    /// `CODE` or `CODE:COLL`, the dictionary key.
    pub fn key(&self) -> String {
        match self.collection {
            Some(coll) => format!("{}:{}", self.institution, coll),
            None => self.institution.to_string(),
        }
    }
}

/// Split a voucher value; `None` for unstructured values without a colon.
pub fn parse_voucher(value: &str) -> Option<Voucher<'_>> {
    let mut parts = value.splitn(3, ':').map(str::trim);
    let institution = parts.next()?;
    let second = parts.next()?;
    match parts.next() {
        Some(id) => Some(Voucher {
            institution,
            collection: Some(second),
            id,
        }),
        None => Some(Voucher {
            institution,
            collection: None,
            id: second,
        }),
    }
}

pub fn check(src: &BioSource, scope: &Scope<'_, '_>, out: &mut FindingSink) -> Result<()> {
    let mut seen: HashSet<(String, Option<String>)> = HashSet::new();
    let mut reported_duplicate = false;
    for orgmod in src.org.mods() {
        let Some(kind) = VoucherKind::of_qualifier(orgmod.subtype) else {
            continue;
        };
        for (severity, code, message) in voucher_problems(kind, &orgmod.subname, scope.services.institutions) {
            scope.post(out, severity, code, message);
        }
        if let Some(v) = parse_voucher(&orgmod.subname) {
            let key = (v.institution.to_uppercase(), v.collection.map(str::to_uppercase));
            if !v.institution.is_empty() && !seen.insert(key) && !reported_duplicate {
                reported_duplicate = true;
                scope.post(
                    out,
                    Severity::Warning,
                    ErrorCode::MultipleSourceVouchers,
                    format!("Multiple vouchers with same institution {}", v.key()),
                );
            }
        }
    }
    Ok(())
}

/// Everything wrong with one voucher value of the given qualifier family.
pub fn voucher_problems(kind: VoucherKind, value: &str, dict: &InstitutionDictionary) -> Vec<Problem> {
    let mut problems = Vec::new();
    let Some(voucher) = parse_voucher(value) else {
        let problem = if kind == VoucherKind::Culture {
            (
                Severity::Error,
                ErrorCode::UnstructuredVoucher,
                "Culture_collection should be structured, but is not".to_string(),
            )
        } else {
            (
                Severity::Info,
                ErrorCode::UnstructuredVoucher,
                format!("{} is not structured [{}]", kind.label(), value),
            )
        };
        problems.push(problem);
        return problems;
    };

    if voucher.institution.is_empty() {
        problems.push((
            Severity::Error,
            ErrorCode::BadInstitutionCode,
            "Voucher is missing institution code".to_string(),
        ));
    }
    if voucher.id.is_empty() {
        problems.push((
            Severity::Error,
            ErrorCode::BadVoucherId,
            "Voucher is missing specific identifier".to_string(),
        ));
    }
    if voucher.institution.is_empty() || voucher.institution.eq_ignore_ascii_case(PERSONAL) {
        return problems;
    }

    let key = voucher.key();
    let inst = match voucher.collection.map(|_| dict.lookup(&key)) {
        Some(CodeLookup::Exact(inst)) => Some(inst),
        Some(CodeLookup::WrongCase(inst)) => {
            problems.push(capitalization(&key, inst));
            Some(inst)
        }
        _ => resolve_institution(&voucher, dict, &mut problems),
    };
    if let Some(inst) = inst {
        if !inst.accepts(kind) {
            if let Some(expected) = inst.kinds.first() {
                problems.push((
                    Severity::Warning,
                    ErrorCode::WrongVoucherType,
                    format!("Institution code {} should be {}", inst.code, expected.label()),
                ));
            }
        }
    }
    problems
}

fn capitalization(given: &str, inst: &Institution) -> Problem {
    (
        Severity::Error,
        ErrorCode::BadInstitutionCode,
        format!(
            "Institution code {} exists, but correct capitalization is {}",
            given, inst.code
        ),
    )
}

/// Look up the institution without its collection, reporting what does not
/// match.
fn resolve_institution<'d>(
    voucher: &Voucher<'_>,
    dict: &'d InstitutionDictionary,
    problems: &mut Vec<Problem>,
) -> Option<&'d Institution> {
    let code = voucher.institution;
    let inst = match dict.lookup(code) {
        CodeLookup::Exact(inst) => inst,
        CodeLookup::WrongCase(inst) => {
            problems.push(capitalization(code, inst));
            inst
        }
        CodeLookup::NeedsCountry(_) => {
            problems.push((
                Severity::Warning,
                ErrorCode::BadInstitutionCode,
                format!(
                    "Institution code {} needs to be qualified with a <COUNTRY> designation",
                    code
                ),
            ));
            return None;
        }
        CodeLookup::Unknown => {
            problems.push((
                Severity::Warning,
                ErrorCode::BadInstitutionCode,
                format!("Institution code {} is not in list", code),
            ));
            return None;
        }
    };
    if let Some(coll) = voucher.collection {
        let known = dict.collections_of(inst.base());
        let severity = if known.is_empty() { Severity::Info } else { Severity::Warning };
        problems.push((
            severity,
            ErrorCode::BadCollectionCode,
            format!(
                "Institution code {} exists, but collection {}:{} is not in list",
                inst.code, inst.code, coll
            ),
        ));
    }
    Some(inst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::model::OrgModType;
    use crate::rules::testing::{Harness, codes};
    use rstest::rstest;

    fn problems(kind: VoucherKind, value: &str) -> Vec<Problem> {
        voucher_problems(kind, value, &InstitutionDictionary::builtin())
    }

    #[test]
    fn test_parse_voucher() {
        assert_eq!(
            parse_voucher("MCZ:Herp:A-1234"),
            Some(Voucher {
                institution: "MCZ",
                collection: Some("Herp"),
                id: "A-1234"
            })
        );
        assert_eq!(
            parse_voucher("ATCC 25922").map(|v| v.id),
            None
        );
        assert_eq!(parse_voucher("ATCC:25922").map(|v| v.id), Some("25922"));
    }

    #[rstest]
    #[case(VoucherKind::Specimen, "MCZ:Herp:A-1234", vec![])]
    #[case(VoucherKind::Specimen, "MCZ:12345", vec![])]
    #[case(VoucherKind::Culture, "ATCC:25922", vec![])]
    #[case(VoucherKind::Specimen, "personal:JD-12", vec![])]
    #[case(VoucherKind::Specimen, "mcz:12345", vec![ErrorCode::BadInstitutionCode])]
    #[case(VoucherKind::Specimen, "XYZZY:12345", vec![ErrorCode::BadInstitutionCode])]
    #[case(VoucherKind::Specimen, "CIB:12345", vec![ErrorCode::BadInstitutionCode])]
    #[case(VoucherKind::Specimen, "MCZ:Fish:12", vec![ErrorCode::BadCollectionCode])]
    #[case(VoucherKind::Specimen, "MCZ:", vec![ErrorCode::BadVoucherId])]
    #[case(VoucherKind::Specimen, "ATCC:25922", vec![ErrorCode::WrongVoucherType])]
    #[case(VoucherKind::Culture, "ATCC 25922", vec![ErrorCode::UnstructuredVoucher])]
    fn test_voucher_problems(#[case] kind: VoucherKind, #[case] value: &str, #[case] expected: Vec<ErrorCode>) {
        let found: Vec<ErrorCode> = problems(kind, value).into_iter().map(|p| p.1).collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_messages() {
        let p = problems(VoucherKind::Specimen, "mcz:12345");
        assert_eq!(p[0].2, "Institution code mcz exists, but correct capitalization is MCZ");
        let p = problems(VoucherKind::Specimen, "ATCC:25922");
        assert_eq!(p[0].2, "Institution code ATCC should be culture_collection");
        let p = problems(VoucherKind::Specimen, "MCZ:Fish:12");
        assert_eq!(p[0].2, "Institution code MCZ exists, but collection MCZ:Fish is not in list");
    }

    #[test]
    fn test_duplicate_vouchers_reported_once() {
        let mut src = fixtures::human_source();
        src.org = src
            .org
            .with_mod(OrgModType::SpecimenVoucher, "MCZ:111")
            .with_mod(OrgModType::SpecimenVoucher, "MCZ:222")
            .with_mod(OrgModType::SpecimenVoucher, "mcz:333");
        let entry = fixtures::good_nucleotide();
        let findings = Harness::new().run(&entry, |scope, out| check(&src, scope, out));
        assert_eq!(
            codes(&findings),
            vec![ErrorCode::MultipleSourceVouchers, ErrorCode::BadInstitutionCode]
        );
    }
}
