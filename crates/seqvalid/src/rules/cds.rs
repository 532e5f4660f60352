//! Coding regions: the product, its resolution, X content of the
//! translation, and locus tags against product ids.

use std::borrow::Cow;

use super::{FeatureSubject, Scope, is_pseudo, translation};
use crate::config::Options;
use crate::diag::{ErrorCode, FindingSink, Severity};
use crate::error::Result;
use crate::model::{Bioseq, FeatData, SeqId, SeqLoc, SetClass};
use crate::services::FetchOutcome;

/// Exception text under which a CDS legitimately has no product.
const REARRANGEMENT: &str = "rearrangement required for product";

/// Why a product outside the record could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unresolved<'s> {
    /// Far fetch was not enabled.
    NotFetched,
    /// The fetcher did not know the id.
    Unknown,
    Failed(&'s str),
}

/// Where a CDS or mRNA product comes from.
#[derive(Debug, Clone, Copy)]
pub enum Product<'s> {
    /// Packaged in the record, by Bioseq ordinal.
    Packaged(usize),
    Fetched(&'s Bioseq),
    Unresolved(Unresolved<'s>),
}

/// Resolve a product location against the record, then the far cache.
pub fn resolve_product<'s>(product: &SeqLoc, scope: &Scope<'s, '_>) -> Option<(SeqId, Product<'s>)> {
    let id = product.first_id()?;
    if let Some(seq) = scope.index.seq_by_id(id) {
        return Some((id.clone(), Product::Packaged(seq)));
    }
    let products = scope.services.products;
    let resolved = match products.get(id) {
        Some(FetchOutcome::Found(seq)) => Product::Fetched(seq),
        Some(FetchOutcome::Unknown) => Product::Unresolved(Unresolved::Unknown),
        Some(FetchOutcome::Failed(reason)) => Product::Unresolved(Unresolved::Failed(reason)),
        None => Product::Unresolved(Unresolved::NotFetched),
    };
    Some((id.clone(), resolved))
}

/// Residues of a resolved product.
pub fn product_residues<'s>(product: Product<'s>, scope: &Scope<'s, '_>) -> Option<Cow<'s, [u8]>> {
    match product {
        Product::Packaged(seq) => scope.index.residues(seq).map(Cow::Borrowed),
        Product::Fetched(seq) => {
            let data = seq.inst.seq_data.as_ref()?;
            crate::seq::decode(data, seq.inst.len()).ok().map(Cow::Owned)
        }
        Product::Unresolved(_) => None,
    }
}

pub fn check(subject: &FeatureSubject<'_, '_>, scope: &Scope<'_, '_>, out: &mut FindingSink) -> Result<()> {
    let feat = subject.feat();
    let FeatData::Cdregion(cds) = &feat.data else {
        return Ok(());
    };
    let pseudo = is_pseudo(subject, scope);

    match &feat.product {
        None => {
            if !pseudo && !feat.exceptions().contains(&REARRANGEMENT) {
                scope.post(
                    out,
                    Severity::Error,
                    ErrorCode::MissingCdsProduct,
                    "Expected CDS product absent",
                );
            }
        }
        Some(product) => check_product(subject, product, scope, out),
    }

    if !pseudo {
        if let Some(tr) = translation::translate_cds(feat, cds, scope) {
            let limit = scope.config.x_percent_limit;
            if tr.x_percent() > limit {
                scope.post(
                    out,
                    Severity::Warning,
                    ErrorCode::CdsHasTooManyXs,
                    format!("CDS translation consists of more than {}% X residues", limit),
                );
            }
        }
    }

    if scope.option(Options::LOCUS_TAG_GENERAL_MATCH) {
        check_locus_tag(subject, scope, out);
    }
    Ok(())
}

fn check_product(subject: &FeatureSubject<'_, '_>, product: &SeqLoc, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    let Some((id, resolved)) = resolve_product(product, scope) else {
        return;
    };
    if subject.feat().location.ids().contains(&&id) {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::SelfReferentialProduct,
            format!("Self-referential CDS product {}", id),
        );
        return;
    }
    let message = match resolved {
        Product::Packaged(_) | Product::Fetched(_) => return,
        // a CDS inside a nuc-prot set must find its protein there
        Product::Unresolved(Unresolved::NotFetched) if scope.ctx.in_set(SetClass::NucProt) => {
            format!("CDS product {} is not packaged in the record", id)
        }
        Product::Unresolved(Unresolved::NotFetched) => return,
        Product::Unresolved(Unresolved::Unknown) => format!("CDS product {} could not be found", id),
        Product::Unresolved(Unresolved::Failed(reason)) => {
            format!("Unable to fetch CDS product {}: {}", id, reason)
        }
    };
    scope.post(out, Severity::Error, ErrorCode::ProductFetchFailure, message);
}

/// A general id on the product must carry the gene's locus tag.
fn check_locus_tag(subject: &FeatureSubject<'_, '_>, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    let Some(product) = subject.feat().product.as_ref() else {
        return;
    };
    let Some(tag) = scope
        .index
        .gene_of(subject.ordinal())
        .and_then(|g| scope.index.feat(g).feat.gene_ref())
        .and_then(|gene| gene.locus_tag.as_deref())
        .filter(|t| !t.is_empty())
    else {
        return;
    };
    let ids: Vec<&SeqId> = match product.first_id().and_then(|id| scope.index.bioseq_by_id(id)) {
        Some(seq) => seq.ids.iter().collect(),
        None => product.ids(),
    };
    let mismatched = ids.iter().find_map(|id| match id {
        SeqId::General(db_tag) => {
            let general = db_tag.tag.to_string();
            (!general.starts_with(tag)).then_some(general)
        }
        _ => None,
    });
    if let Some(general) = mismatched {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::LocusTagProductMismatch,
            format!(
                "Gene locus_tag {} does not match general ID of product ({})",
                tag, general
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::Finding;
    use crate::fixtures;
    use crate::model::{BioseqSet, Descriptor, GeneRef, SeqAnnot, SeqEntry, SeqFeat};
    use crate::rules::testing::{Harness, codes};
    use crate::services::{InMemoryFetcher, ProductCache};

    fn run(entry: &SeqEntry, harness: &Harness) -> Vec<Finding> {
        harness.run(entry, |scope, out| {
            for handle in scope.index.features() {
                check(&FeatureSubject::new(handle), scope, out)?;
            }
            Ok(())
        })
    }

    fn nucleotide_with(feats: Vec<SeqFeat>) -> SeqEntry {
        let mut seq = fixtures::raw_dna(fixtures::nuc_id(), fixtures::CODING_NUC);
        seq.descr = vec![Descriptor::Source(fixtures::human_source())];
        seq.annot.push(SeqAnnot::ftable(feats));
        SeqEntry::Seq(seq)
    }

    #[test]
    fn test_packaged_product_is_clean() {
        assert!(run(&fixtures::good_nuc_prot(), &Harness::new()).is_empty());
    }

    #[test]
    fn test_missing_product() {
        let cds = SeqFeat::new(FeatData::Cdregion(Default::default()), SeqLoc::int(fixtures::nuc_id(), 0, 26));
        let findings = run(&nucleotide_with(vec![cds.clone()]), &Harness::new());
        assert_eq!(codes(&findings), vec![ErrorCode::MissingCdsProduct]);

        let findings = run(&nucleotide_with(vec![cds.pseudo()]), &Harness::new());
        assert!(findings.is_empty());
    }

    #[test]
    fn test_unpackaged_product_in_nuc_prot_set() {
        let mut nuc = fixtures::raw_dna(fixtures::nuc_id(), fixtures::CODING_NUC);
        nuc.annot.push(SeqAnnot::ftable(vec![fixtures::coding_region()]));
        let mut set = BioseqSet::new(SetClass::NucProt, vec![nuc.into()]);
        set.descr = vec![Descriptor::Source(fixtures::human_source())];
        let findings = run(&SeqEntry::Set(set), &Harness::new());
        assert_eq!(codes(&findings), vec![ErrorCode::ProductFetchFailure]);
        assert_eq!(findings[0].message, "CDS product lcl|prot is not packaged in the record");

        // outside a nuc-prot set the product cannot be checked and is skipped
        let entry = nucleotide_with(vec![fixtures::coding_region()]);
        assert!(run(&entry, &Harness::new()).is_empty());
    }

    #[test]
    fn test_far_product_fetch() {
        let entry = nucleotide_with(vec![fixtures::coding_region()]);
        let prot_id = fixtures::prot_id();

        let mut harness = Harness::new();
        harness.products = ProductCache::fetch(&InMemoryFetcher::new(), &[&prot_id]);
        let findings = run(&entry, &harness);
        assert_eq!(findings[0].message, "CDS product lcl|prot could not be found");

        let fetcher = InMemoryFetcher::new().with_bioseq(fixtures::coding_protein());
        harness.products = ProductCache::fetch(&fetcher, &[&prot_id]);
        assert!(run(&entry, &harness).is_empty());
    }

    #[test]
    fn test_too_many_xs() {
        let mut seq = fixtures::raw_dna(fixtures::nuc_id(), "ATGNNNNNNNNNNNNAAATAA");
        seq.descr = vec![Descriptor::Source(fixtures::human_source())];
        seq.annot.push(SeqAnnot::ftable(vec![
            SeqFeat::new(FeatData::Cdregion(Default::default()), SeqLoc::int(fixtures::nuc_id(), 0, 20))
                .with_product(SeqLoc::Whole(SeqId::local("far"))),
        ]));
        let findings = run(&SeqEntry::Seq(seq), &Harness::new());
        assert_eq!(codes(&findings), vec![ErrorCode::CdsHasTooManyXs]);
        assert_eq!(findings[0].message, "CDS translation consists of more than 50% X residues");
    }

    #[test]
    fn test_locus_tag_against_general_id() {
        let gene = SeqFeat::new(
            FeatData::Gene(GeneRef::locus("abc").with_locus_tag("ABC_0001")),
            SeqLoc::int(fixtures::nuc_id(), 0, 26),
        );
        let cds = |tag: &str| {
            SeqFeat::new(FeatData::Cdregion(Default::default()), SeqLoc::int(fixtures::nuc_id(), 0, 26))
                .with_product(SeqLoc::Whole(SeqId::general("lab", tag)))
        };
        let harness = Harness::new().with_options(Options::LOCUS_TAG_GENERAL_MATCH);
        let entry = nucleotide_with(vec![gene.clone(), cds("ABC_0001")]);
        assert!(run(&entry, &harness).is_empty());

        let entry = nucleotide_with(vec![gene, cds("XYZ_0002")]);
        let findings = run(&entry, &harness);
        assert_eq!(codes(&findings), vec![ErrorCode::LocusTagProductMismatch]);
    }
}
