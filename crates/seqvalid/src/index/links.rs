//! Gene and transcript links between features.

use std::collections::HashSet;

use super::RecordIndex;
use crate::model::{FeatData, FeatId, GeneRef};

/// How a feature was tied to its gene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneLink {
    /// Feature-id cross-reference, possibly through an mRNA or CDS.
    ById(usize),
    /// Gene xref naming a locus or locus_tag.
    ByName(usize),
    /// Smallest gene containing the feature on the same strand.
    ByOverlap(usize),
    /// An empty gene xref that opts out of overlap.
    Suppressed,
    /// A gene xref whose name matches no gene in the record.
    Unresolved,
    None,
}

impl GeneLink {
    pub fn gene(self) -> Option<usize> {
        match self {
            GeneLink::ById(g) | GeneLink::ByName(g) | GeneLink::ByOverlap(g) => Some(g),
            GeneLink::Suppressed | GeneLink::Unresolved | GeneLink::None => None,
        }
    }
}

impl RecordIndex<'_> {
    pub(super) fn link_gene(&self, feat: usize) -> GeneLink {
        let handle = &self.feats[feat];
        if matches!(handle.feat.data, FeatData::Gene(_) | FeatData::Prot(_)) {
            return GeneLink::None;
        }

        let mut visited = HashSet::new();
        if let Some(gene) = self.gene_through_ids(feat, &mut visited) {
            return GeneLink::ById(gene);
        }

        if let Some(xref) = handle.feat.gene_xref() {
            if xref.is_empty() {
                return GeneLink::Suppressed;
            }
            return match self.gene_by_name(feat, xref) {
                Some(gene) => GeneLink::ByName(gene),
                None => GeneLink::Unresolved,
            };
        }

        self.overlapping_genes(feat)
            .into_iter()
            .filter(|g| self.feats[*g].contains(handle))
            .min_by_key(|g| (self.feats[*g].extent(), *g))
            .map_or(GeneLink::None, GeneLink::ByOverlap)
    }

    fn gene_through_ids(&self, feat: usize, visited: &mut HashSet<usize>) -> Option<usize> {
        if !visited.insert(feat) {
            return None;
        }
        let ids: Vec<FeatId> = self.feats[feat].feat.xref_ids().collect();
        for id in &ids {
            if let Some(gene) = self
                .features_with_id(*id)
                .iter()
                .copied()
                .find(|f| self.feats[*f].feat.data.is_gene())
            {
                return Some(gene);
            }
        }
        for id in ids {
            for other in self.features_with_id(id).to_vec() {
                let data = &self.feats[other].feat.data;
                if data.is_mrna() || data.is_cds() {
                    if let Some(gene) = self.gene_through_ids(other, visited) {
                        return Some(gene);
                    }
                }
            }
        }
        None
    }

    fn gene_by_name(&self, feat: usize, xref: &GeneRef) -> Option<usize> {
        let target = self.feats[feat].target;
        let candidates = match xref.locus_tag.as_deref().filter(|t| !t.is_empty()) {
            Some(tag) => self.genes_with_locus_tag(tag),
            None => self.genes_with_locus(xref.locus.as_deref().unwrap_or_default()),
        };
        candidates
            .iter()
            .copied()
            .find(|g| self.feats[*g].target == target)
            .or_else(|| candidates.first().copied())
    }

    /// Genes overlapping a feature on the same strand, in position order.
    pub fn overlapping_genes(&self, feat: usize) -> Vec<usize> {
        let handle = &self.feats[feat];
        let Some(target) = handle.target else {
            return Vec::new();
        };
        self.located_on(target)
            .iter()
            .copied()
            .filter(|g| *g != feat)
            .filter(|g| {
                let gene = &self.feats[*g];
                gene.feat.data.is_gene() && gene.overlaps(handle) && gene.strand.same_direction(handle.strand)
            })
            .collect()
    }

    pub(super) fn pair_cds_mrna(&mut self) {
        let mut pairs = std::collections::HashMap::new();
        for cds in self.feats.iter().filter(|h| h.feat.data.is_cds()) {
            let by_xref: Vec<usize> = cds
                .feat
                .xref_ids()
                .flat_map(|id| self.features_with_id(id).iter().copied())
                .filter(|f| self.feats[*f].feat.data.is_mrna())
                .collect();
            let mrnas = if !by_xref.is_empty() {
                by_xref
            } else {
                match cds.target {
                    Some(target) => self
                        .located_on(target)
                        .iter()
                        .copied()
                        .filter(|m| {
                            let mrna = &self.feats[*m];
                            mrna.feat.data.is_mrna()
                                && mrna.contains(cds)
                                && mrna.strand.same_direction(cds.strand)
                        })
                        .collect(),
                    None => Vec::new(),
                }
            };
            if !mrnas.is_empty() {
                pairs.insert(cds.ordinal, mrnas);
            }
        }
        self.cds_mrnas = pairs;
    }
}
