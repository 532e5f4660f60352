//! Which Bioseqs and sets may be packaged together.

use super::Scope;
use crate::diag::{ErrorCode, FindingSink, Severity};
use crate::error::Result;
use crate::index::SetHandle;
use crate::model::{Descriptor, SeqEntry, SeqLoc, SeqRepr, SetClass};

/// Sets that group independent submissions of related organisms.
fn is_study_set(class: SetClass) -> bool {
    matches!(
        class,
        SetClass::PopSet | SetClass::PhySet | SetClass::MutSet | SetClass::EcoSet
    )
}

/// Record-wide packaging: there must be something to validate.
pub fn check_record(scope: &Scope<'_, '_>, out: &mut FindingSink) -> Result<()> {
    if scope.index.bioseqs().is_empty() {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::NoBioseqFound,
            "No Bioseqs in this entire record.",
        );
    }
    Ok(())
}

pub fn check_set(set: &SetHandle<'_>, scope: &Scope<'_, '_>, out: &mut FindingSink) -> Result<()> {
    let class = set.set.class;
    if set.seqs.is_empty() {
        let severity = match class {
            SetClass::NucProt | SetClass::SegSet | SetClass::GenProdSet | SetClass::Parts => Severity::Error,
            _ => Severity::Warning,
        };
        scope.post(
            out,
            severity,
            ErrorCode::EmptySet,
            format!("No Bioseqs in {} set", class.label()),
        );
        return Ok(());
    }

    match class {
        SetClass::NucProt => check_nuc_prot(set, scope, out),
        SetClass::GenProdSet => check_gen_prod(set, scope, out),
        _ => {}
    }
    if is_study_set(class) {
        check_study_set(set, scope, out);
    }
    Ok(())
}

fn check_nuc_prot(set: &SetHandle<'_>, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    let index = scope.index;
    let members = || set.seqs.clone().map(|i| index.seq(i).seq);
    let has_nucleotide = members().any(|s| {
        s.inst.mol.is_na() && matches!(s.inst.repr, SeqRepr::Raw | SeqRepr::Delta | SeqRepr::Seg)
    });
    if !has_nucleotide {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::NucProtProblem,
            "No nucleotides in nuc-prot set",
        );
    }
    if !members().any(|s| s.inst.mol.is_aa()) {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::NucProtProblem,
            "No proteins in nuc-prot set",
        );
    }

    for child in &set.set.seq_set {
        if let SeqEntry::Set(inner) = child {
            if !matches!(inner.class, SetClass::SegSet | SetClass::Parts) {
                scope.post(
                    out,
                    Severity::Error,
                    ErrorCode::ImproperlyNestedSets,
                    format!("Nuc-prot set contains a {} set", inner.class.label()),
                );
            }
        }
    }

    for handle in index.features() {
        if !handle.feat.data.is_cds() || !handle.target.is_some_and(|t| set.seqs.contains(&t)) {
            continue;
        }
        let Some(product) = handle
            .feat
            .product
            .as_ref()
            .and_then(SeqLoc::first_id)
            .and_then(|id| index.seq_by_id(id))
        else {
            continue;
        };
        if !set.seqs.contains(&product) {
            scope.post(
                out,
                Severity::Warning,
                ErrorCode::CdsProductPackagingProblem,
                format!(
                    "Protein product {} not packaged in nuc-prot set with nucleotide",
                    index.seq(product).seq.best_label()
                ),
            );
        }
    }
}

fn check_gen_prod(set: &SetHandle<'_>, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    let index = scope.index;
    if set.set.annot.iter().any(|a| !a.features().is_empty()) {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::GenomicProductPackagingProblem,
            "Seq-annot packaged directly on genomic product set",
        );
    }
    for handle in index.features() {
        let feat = handle.feat;
        let kind = if feat.data.is_cds() {
            "CDS"
        } else if feat.data.is_mrna() {
            "mRNA"
        } else {
            continue;
        };
        if feat.is_pseudo() || !handle.target.is_some_and(|t| set.seqs.contains(&t)) {
            continue;
        }
        let message = match feat.product.as_ref().and_then(SeqLoc::first_id) {
            None if kind == "mRNA" => "Product of mRNA feature not set".to_string(),
            None => continue,
            Some(id) => match index.seq_by_id(id) {
                Some(seq) if set.seqs.contains(&seq) => continue,
                _ => format!("Product of {} feature ({}) not packaged in genomic product set", kind, id),
            },
        };
        scope.post(
            out,
            Severity::Warning,
            ErrorCode::GenomicProductPackagingProblem,
            message,
        );
    }
}

fn check_study_set(set: &SetHandle<'_>, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    let index = scope.index;
    let mut enclosing = 0;
    let mut parent = set.parent;
    while let Some(p) = parent {
        let handle = index.set(p);
        if is_study_set(handle.set.class) {
            enclosing += 1;
        }
        parent = handle.parent;
    }
    if enclosing > 1 {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::ImproperlyNestedSets,
            format!("Nested sets within {} set", set.set.class.label()),
        );
    }

    let titled = |descr: &[Descriptor]| descr.iter().any(|d| matches!(d, Descriptor::Title(t) if !t.is_empty()));
    let members_titled = set.seqs.clone().all(|i| titled(&index.seq(i).seq.descr));
    if enclosing == 0 && !titled(&set.set.descr) && !members_titled {
        scope.post(
            out,
            Severity::Warning,
            ErrorCode::MissingSetTitle,
            "Pop/Phy/Mut/Eco set does not have title",
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::Finding;
    use crate::fixtures;
    use crate::model::{BioseqSet, SeqAnnot, SeqFeat, SeqId};
    use crate::rules::testing::{Harness, codes};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn run(entry: &SeqEntry) -> Vec<Finding> {
        Harness::new().run(entry, |scope, out| {
            check_record(scope, out)?;
            for set in scope.index.sets() {
                check_set(set, scope, out)?;
            }
            Ok(())
        })
    }

    fn titled_dna(name: &str) -> SeqEntry {
        let mut seq = fixtures::raw_dna(SeqId::local(name), fixtures::CODING_NUC);
        seq.descr = vec![Descriptor::Title(format!("Homo sapiens clone {}", name))];
        seq.into()
    }

    #[test]
    fn test_well_formed_sets() {
        assert!(run(&fixtures::good_nuc_prot()).is_empty());
        assert!(run(&fixtures::genomic_product_set()).is_empty());
        assert!(run(&fixtures::good_nucleotide()).is_empty());
    }

    #[test]
    fn test_no_bioseqs() {
        let findings = run(&BioseqSet::new(SetClass::Genbank, vec![]).into());
        assert_eq!(codes(&findings), vec![ErrorCode::NoBioseqFound, ErrorCode::EmptySet]);
        assert_eq!(findings[0].message, "No Bioseqs in this entire record.");
        assert_eq!(findings[1].severity, Severity::Warning);
    }

    #[rstest]
    #[case(SetClass::NucProt, Severity::Error)]
    #[case(SetClass::SegSet, Severity::Error)]
    #[case(SetClass::PopSet, Severity::Warning)]
    fn test_empty_set_severity(#[case] class: SetClass, #[case] severity: Severity) {
        let entry: SeqEntry = BioseqSet::new(
            SetClass::Genbank,
            vec![titled_dna("a"), BioseqSet::new(class, vec![]).into()],
        )
        .into();
        let findings = run(&entry);
        assert_eq!(codes(&findings), vec![ErrorCode::EmptySet]);
        assert_eq!(findings[0].severity, severity);
    }

    #[test]
    fn test_nuc_prot_members() {
        let entry: SeqEntry = BioseqSet::new(SetClass::NucProt, vec![titled_dna("a")]).into();
        let findings = run(&entry);
        assert_eq!(codes(&findings), vec![ErrorCode::NucProtProblem]);
        assert_eq!(findings[0].message, "No proteins in nuc-prot set");
    }

    #[test]
    fn test_cds_product_outside_nuc_prot() {
        let mut nuc = fixtures::raw_dna(fixtures::nuc_id(), fixtures::CODING_NUC);
        nuc.annot.push(SeqAnnot::ftable(vec![fixtures::coding_region()]));
        let nuc_prot = BioseqSet::new(
            SetClass::NucProt,
            vec![nuc.into(), fixtures::raw_protein(SeqId::local("other"), "MK").into()],
        );
        let entry: SeqEntry = BioseqSet::new(
            SetClass::Genbank,
            vec![nuc_prot.into(), fixtures::coding_protein().into()],
        )
        .into();
        let findings = run(&entry);
        assert_eq!(codes(&findings), vec![ErrorCode::CdsProductPackagingProblem]);
        assert_eq!(
            findings[0].message,
            "Protein product lcl|prot not packaged in nuc-prot set with nucleotide"
        );
    }

    #[test]
    fn test_genomic_product_set_packaging() {
        let mut entry = fixtures::genomic_product_set();
        let SeqEntry::Set(set) = &mut entry else { unreachable!() };
        set.annot.push(SeqAnnot::ftable(vec![SeqFeat::new(
            crate::model::FeatData::Comment,
            SeqLoc::int(SeqId::local("contig"), 0, 5),
        )]));
        // drop the nuc-prot set holding both products
        set.seq_set.truncate(1);
        let findings = run(&entry);
        assert_eq!(
            codes(&findings),
            vec![
                ErrorCode::GenomicProductPackagingProblem,
                ErrorCode::GenomicProductPackagingProblem,
                ErrorCode::GenomicProductPackagingProblem,
            ]
        );
        assert_eq!(findings[0].message, "Seq-annot packaged directly on genomic product set");
        assert_eq!(
            findings[1].message,
            "Product of mRNA feature (lcl|mrna) not packaged in genomic product set"
        );
    }

    #[test]
    fn test_study_sets() {
        let untitled = |name: &str| -> SeqEntry { fixtures::raw_dna(SeqId::local(name), fixtures::CODING_NUC).into() };
        let findings = run(&BioseqSet::new(SetClass::PopSet, vec![untitled("a"), untitled("b")]).into());
        assert_eq!(codes(&findings), vec![ErrorCode::MissingSetTitle]);

        let mut popset = BioseqSet::new(SetClass::PopSet, vec![untitled("a"), untitled("b")]);
        popset.descr.push(Descriptor::Title("Population study".into()));
        assert!(run(&popset.into()).is_empty());
        assert!(run(&BioseqSet::new(SetClass::PhySet, vec![titled_dna("a"), titled_dna("b")]).into()).is_empty());

        let innermost = BioseqSet::new(SetClass::PopSet, vec![titled_dna("a")]);
        let middle = BioseqSet::new(SetClass::PopSet, vec![innermost.into()]);
        let outer = BioseqSet::new(SetClass::PhySet, vec![middle.into(), titled_dna("b")]);
        let findings = run(&outer.into());
        assert_eq!(codes(&findings), vec![ErrorCode::ImproperlyNestedSets]);
        assert_eq!(findings[0].message, "Nested sets within pop-set set");
    }
}
