//! Gene features and the links other features make to them.

use super::{FeatureSubject, Scope};
use crate::config::Options;
use crate::diag::{ErrorCode, FindingSink, Severity};
use crate::error::Result;
use crate::index::GeneLink;
use crate::model::{FeatData, GeneRef};

pub fn check(subject: &FeatureSubject<'_, '_>, scope: &Scope<'_, '_>, out: &mut FindingSink) -> Result<()> {
    let feat = subject.feat();
    if let FeatData::Gene(gene) = &feat.data {
        check_gene(subject, gene, scope, out);
    }
    if feat.data.is_cds() || feat.data.is_mrna() {
        check_gene_range(subject, scope, out);
    }
    if scope.index.gene_link(subject.ordinal()) == GeneLink::Unresolved {
        let tagged = feat
            .gene_xref()
            .and_then(|xref| xref.locus_tag.as_deref())
            .is_some_and(|t| !t.is_empty());
        let kind = if tagged { "locus_tag" } else { "locus" };
        scope.post(
            out,
            Severity::Warning,
            ErrorCode::GeneXrefWithoutGene,
            format!(
                "Feature has gene {} cross-reference but no equivalent gene feature exists",
                kind
            ),
        );
    }
    Ok(())
}

fn check_gene(subject: &FeatureSubject<'_, '_>, gene: &GeneRef, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    let feat = subject.feat();
    if gene.is_empty() && !gene.pseudo && feat.comment.as_deref().is_none_or(str::is_empty) {
        scope.post(
            out,
            Severity::Warning,
            ErrorCode::GeneRefHasNoData,
            "There is a gene feature where all fields are empty",
        );
    }
    match gene.locus_tag.as_deref().filter(|t| !t.is_empty()) {
        Some(tag) => {
            let holders = scope.index.genes_with_locus_tag(tag);
            if holders.first().is_some_and(|first| *first != subject.ordinal()) {
                scope.post(
                    out,
                    Severity::Error,
                    ErrorCode::CollidingLocusTags,
                    format!("Colliding locus_tag {} in gene feature", tag),
                );
            }
        }
        None if scope.option(Options::GENOME_SUBMISSION) && !feat.is_pseudo() => {
            scope.post(
                out,
                Severity::Warning,
                ErrorCode::MissingGeneLocusTag,
                "Missing gene locus tag",
            );
        }
        None => {}
    }
}

/// A CDS or mRNA must lie inside its gene, and inside any gene it overlaps
/// without a link of its own.
fn check_gene_range(subject: &FeatureSubject<'_, '_>, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    let index = scope.index;
    let handle = subject.handle;
    let (code, kind) = if subject.feat().data.is_cds() {
        (ErrorCode::CdsGeneRange, "CDS")
    } else {
        (ErrorCode::MrnaGeneRange, "mRNA")
    };
    let link = index.gene_link(subject.ordinal());
    let message = match link {
        GeneLink::ById(g) | GeneLink::ByName(g) => {
            let gene = index.feat(g);
            if gene.target != handle.target || gene.contains(handle) {
                return;
            }
            format!(
                "{} is not contained within its gene [{}]",
                kind,
                index.feature_label(g)
            )
        }
        GeneLink::None => {
            let partial_overlap = index
                .overlapping_genes(subject.ordinal())
                .into_iter()
                .any(|g| !index.feat(g).contains(handle));
            if !partial_overlap {
                return;
            }
            format!("gene overlaps {} but does not completely contain it", kind)
        }
        GeneLink::ByOverlap(_) | GeneLink::Suppressed | GeneLink::Unresolved => return,
    };
    scope.post(out, Severity::Warning, code, message);
}
