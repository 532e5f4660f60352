//! Pre-pass index over one record.
//!
//! Built once per validation run before traversal. Holds every Bioseq, set
//! and feature in document order, plus the cross-feature relationships
//! rules need: location-sorted features per Bioseq, feature ids, gene
//! locus and locus_tag maps, resolved genes and CDS/mRNA pairs.

mod links;

use std::collections::HashMap;
use std::ops::Range;
use std::str::FromStr;

use once_cell::unsync::OnceCell;

use crate::diag::ErrorCode;
use crate::model::{
    Bioseq, BioseqSet, DeltaSeq, Descriptor, FeatData, FeatId, OrgModType, SeqEntry, SeqFeat,
    SeqId, SeqLoc, Strand, UserData,
};
use crate::seq::{alphabet, reverse_complement};

pub use links::GeneLink;

/// User object kind that lists error codes to drop from the output.
pub const SUPPRESSION_KIND: &str = "ValidationSuppression";

/// One Bioseq of the record.
#[derive(Debug)]
pub struct SeqHandle<'a> {
    pub seq: &'a Bioseq,
    pub ordinal: usize,
    /// Innermost set holding this Bioseq.
    pub parent: Option<usize>,
    residues: OnceCell<Option<Vec<u8>>>,
}

/// One Bioseq-set of the record.
#[derive(Debug)]
pub struct SetHandle<'a> {
    pub set: &'a BioseqSet,
    pub ordinal: usize,
    pub parent: Option<usize>,
    /// Bioseqs nested anywhere inside, as ordinals.
    pub seqs: Range<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatOwner {
    Bioseq(usize),
    Set(usize),
}

/// One feature of the record.
#[derive(Debug)]
pub struct FeatHandle<'a> {
    pub feat: &'a SeqFeat,
    pub ordinal: usize,
    pub owner: FeatOwner,
    /// Bioseq the location points at, when it is in this record.
    pub target: Option<usize>,
    /// Extent on the target, zero-based inclusive.
    pub left: usize,
    pub right: usize,
    pub strand: Strand,
}

impl FeatHandle<'_> {
    pub fn contains(&self, other: &FeatHandle<'_>) -> bool {
        self.target.is_some()
            && self.target == other.target
            && self.left <= other.left
            && self.right >= other.right
    }

    pub fn overlaps(&self, other: &FeatHandle<'_>) -> bool {
        self.target.is_some()
            && self.target == other.target
            && self.left <= other.right
            && other.left <= self.right
    }

    pub fn extent(&self) -> usize {
        (self.right + 1).saturating_sub(self.left)
    }
}

/// A feature that repeats an earlier one on the same interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Duplicate {
    pub earlier: usize,
    pub same_label: bool,
}

#[derive(Debug, Default)]
pub struct IndexStats {
    pub bioseqs: usize,
    pub sets: usize,
    pub features: usize,
    pub genes: usize,
}

/// Everything the traversal needs to know about the record up front.
#[derive(Debug, Default)]
pub struct RecordIndex<'a> {
    seqs: Vec<SeqHandle<'a>>,
    sets: Vec<SetHandle<'a>>,
    feats: Vec<FeatHandle<'a>>,
    by_seq_id: HashMap<String, usize>,
    id_counts: HashMap<String, usize>,
    owned: HashMap<FeatOwner, Vec<usize>>,
    located: HashMap<usize, Vec<usize>>,
    by_feat_id: HashMap<FeatId, Vec<usize>>,
    by_locus: HashMap<String, Vec<usize>>,
    by_locus_tag: HashMap<String, Vec<usize>>,
    genes: Vec<GeneLink>,
    cds_mrnas: HashMap<usize, Vec<usize>>,
    duplicates: HashMap<usize, Duplicate>,
    suppressed: Vec<ErrorCode>,
    organism_names: Vec<String>,
    host_values: Vec<String>,
}

impl<'a> RecordIndex<'a> {
    pub fn build(entry: &'a SeqEntry) -> Self {
        let mut index = Self::default();
        index.walk(entry, None);
        index.locate_features();
        index.index_genes();
        index.genes = (0..index.feats.len()).map(|i| index.link_gene(i)).collect();
        index.pair_cds_mrna();
        index.find_duplicates();
        index.collect_descriptor_data(entry);

        let stats = index.stats();
        log::debug!(
            "indexed {} bioseqs, {} sets, {} features ({} genes)",
            stats.bioseqs,
            stats.sets,
            stats.features,
            stats.genes
        );
        index
    }

    // ========================================================================
    // Building
    // ========================================================================

    fn walk(&mut self, entry: &'a SeqEntry, parent: Option<usize>) {
        match entry {
            SeqEntry::Seq(seq) => {
                let ordinal = self.seqs.len();
                for id in &seq.ids {
                    let key = id.key();
                    *self.id_counts.entry(key.clone()).or_default() += 1;
                    self.by_seq_id.entry(key).or_insert(ordinal);
                }
                self.seqs.push(SeqHandle {
                    seq,
                    ordinal,
                    parent,
                    residues: OnceCell::new(),
                });
                for feat in seq.features() {
                    self.add_feature(feat, FeatOwner::Bioseq(ordinal));
                }
            }
            SeqEntry::Set(set) => {
                let ordinal = self.sets.len();
                let first = self.seqs.len();
                self.sets.push(SetHandle {
                    set,
                    ordinal,
                    parent,
                    seqs: first..first,
                });
                for child in &set.seq_set {
                    self.walk(child, Some(ordinal));
                }
                self.sets[ordinal].seqs = first..self.seqs.len();
                for feat in set.annot.iter().flat_map(|a| a.features().iter()) {
                    self.add_feature(feat, FeatOwner::Set(ordinal));
                }
            }
        }
    }

    fn add_feature(&mut self, feat: &'a SeqFeat, owner: FeatOwner) {
        let ordinal = self.feats.len();
        if let Some(id) = feat.id {
            self.by_feat_id.entry(id).or_default().push(ordinal);
        }
        self.owned.entry(owner).or_default().push(ordinal);
        self.feats.push(FeatHandle {
            feat,
            ordinal,
            owner,
            target: None,
            left: 0,
            right: 0,
            strand: Strand::Unknown,
        });
    }

    fn locate_features(&mut self) {
        for i in 0..self.feats.len() {
            let feat = self.feats[i].feat;
            let Some(target) = feat.location.first_id().and_then(|id| self.seq_by_id(id)) else {
                continue;
            };
            let target_seq = self.seqs[target].seq;
            let spans = feat.location.spans(&|id: &SeqId| self.bioseq_len(id));
            let on_target: Vec<_> = spans.iter().filter(|s| target_seq.has_id(s.id)).collect();
            let (Some(left), Some(right)) = (
                on_target.iter().map(|s| s.from).min(),
                on_target.iter().map(|s| s.to).max(),
            ) else {
                continue;
            };
            let handle = &mut self.feats[i];
            handle.target = Some(target);
            handle.left = left;
            handle.right = right;
            handle.strand = feat.location.strand().unwrap_or(Strand::Plus);
            self.located.entry(target).or_default().push(i);
        }

        let feats = &self.feats;
        for list in self.located.values_mut() {
            list.sort_by(|a, b| {
                let (fa, fb) = (&feats[*a], &feats[*b]);
                fa.left
                    .cmp(&fb.left)
                    .then(fb.right.cmp(&fa.right))
                    .then(fa.ordinal.cmp(&fb.ordinal))
            });
        }
    }

    fn index_genes(&mut self) {
        for handle in &self.feats {
            let Some(gene) = handle.feat.gene_ref() else {
                continue;
            };
            if let Some(locus) = gene.locus.as_deref().filter(|l| !l.is_empty()) {
                self.by_locus.entry(locus.to_string()).or_default().push(handle.ordinal);
            }
            if let Some(tag) = gene.locus_tag.as_deref().filter(|t| !t.is_empty()) {
                self.by_locus_tag.entry(tag.to_string()).or_default().push(handle.ordinal);
            }
        }
    }

    fn find_duplicates(&mut self) {
        let mut found = HashMap::new();
        for list in self.located.values() {
            for (pos, &later) in list.iter().enumerate() {
                let b = &self.feats[later];
                if !participates_in_duplicates(&b.feat.data) {
                    continue;
                }
                for &earlier in list[..pos].iter().rev() {
                    let a = &self.feats[earlier];
                    if a.left != b.left {
                        break;
                    }
                    if a.right == b.right
                        && a.feat.data.label() == b.feat.data.label()
                        && a.strand.same_direction(b.strand)
                        && a.feat.location.label() == b.feat.location.label()
                    {
                        found.insert(
                            later,
                            Duplicate {
                                earlier,
                                same_label: self.feature_label(earlier) == self.feature_label(later),
                            },
                        );
                        break;
                    }
                }
            }
        }
        self.duplicates = found;
    }

    fn collect_descriptor_data(&mut self, entry: &'a SeqEntry) {
        for descr in entry.all_descriptors() {
            match descr {
                Descriptor::User(user) if user.is_kind(SUPPRESSION_KIND) => {
                    for field in &user.data {
                        let values: Vec<&str> = match &field.data {
                            UserData::Str(s) => vec![s.as_str()],
                            UserData::Strs(list) => list.iter().map(String::as_str).collect(),
                            _ => Vec::new(),
                        };
                        for value in values {
                            match ErrorCode::from_str(value.trim()) {
                                Ok(code) if !self.suppressed.contains(&code) => self.suppressed.push(code),
                                Ok(_) => {}
                                Err(e) => log::warn!("ignoring suppression entry: {}", e),
                            }
                        }
                    }
                }
                Descriptor::Source(src) => self.note_organism(&src.org),
                _ => {}
            }
        }
        let feature_orgs: Vec<&'a crate::model::OrgRef> = self
            .feats
            .iter()
            .filter_map(|h| match &h.feat.data {
                FeatData::Biosrc(src) => Some(&src.org),
                FeatData::Org(org) => Some(org),
                _ => None,
            })
            .collect();
        for org in feature_orgs {
            self.note_organism(org);
        }
    }

    fn note_organism(&mut self, org: &crate::model::OrgRef) {
        let name = org.taxname().trim();
        if !name.is_empty() && !self.organism_names.iter().any(|n| n == name) {
            self.organism_names.push(name.to_string());
        }
        for host in org.mods_of(OrgModType::NatHost) {
            let value = host.subname.trim();
            if !value.is_empty() && !self.host_values.iter().any(|h| h == value) {
                self.host_values.push(value.to_string());
            }
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            bioseqs: self.seqs.len(),
            sets: self.sets.len(),
            features: self.feats.len(),
            genes: self.feats.iter().filter(|h| h.feat.data.is_gene()).count(),
        }
    }

    pub fn bioseqs(&self) -> &[SeqHandle<'a>] {
        &self.seqs
    }

    pub fn seq(&self, ordinal: usize) -> &SeqHandle<'a> {
        &self.seqs[ordinal]
    }

    pub fn sets(&self) -> &[SetHandle<'a>] {
        &self.sets
    }

    pub fn set(&self, ordinal: usize) -> &SetHandle<'a> {
        &self.sets[ordinal]
    }

    pub fn features(&self) -> &[FeatHandle<'a>] {
        &self.feats
    }

    pub fn feat(&self, ordinal: usize) -> &FeatHandle<'a> {
        &self.feats[ordinal]
    }

    /// Features packaged on a Bioseq or set, in document order.
    pub fn owned_by(&self, owner: FeatOwner) -> &[usize] {
        self.owned.get(&owner).map(Vec::as_slice).unwrap_or_default()
    }

    /// Features located on a Bioseq, sorted by position.
    pub fn located_on(&self, seq: usize) -> &[usize] {
        self.located.get(&seq).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn seq_by_id(&self, id: &SeqId) -> Option<usize> {
        self.by_seq_id.get(&id.key()).copied()
    }

    pub fn bioseq_by_id(&self, id: &SeqId) -> Option<&'a Bioseq> {
        self.seq_by_id(id).map(|i| self.seqs[i].seq)
    }

    pub fn bioseq_len(&self, id: &SeqId) -> Option<usize> {
        self.bioseq_by_id(id).map(|seq| seq.inst.len())
    }

    /// How many Bioseqs in the record carry this identifier.
    pub fn id_count(&self, id: &SeqId) -> usize {
        self.id_counts.get(&id.key()).copied().unwrap_or(0)
    }

    pub fn features_with_id(&self, id: FeatId) -> &[usize] {
        self.by_feat_id.get(&id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn genes_with_locus(&self, locus: &str) -> &[usize] {
        self.by_locus.get(locus).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn genes_with_locus_tag(&self, tag: &str) -> &[usize] {
        self.by_locus_tag.get(tag).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn gene_link(&self, feat: usize) -> GeneLink {
        self.genes.get(feat).copied().unwrap_or(GeneLink::None)
    }

    /// The gene a feature belongs to, however it was linked.
    pub fn gene_of(&self, feat: usize) -> Option<usize> {
        self.gene_link(feat).gene()
    }

    pub fn mrnas_for_cds(&self, cds: usize) -> &[usize] {
        self.cds_mrnas.get(&cds).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn duplicate_of(&self, feat: usize) -> Option<Duplicate> {
        self.duplicates.get(&feat).copied()
    }

    /// Error codes listed in validation-suppression user objects.
    pub fn suppressed_codes(&self) -> &[ErrorCode] {
        &self.suppressed
    }

    pub fn organism_names(&self) -> &[String] {
        &self.organism_names
    }

    pub fn host_values(&self) -> &[String] {
        &self.host_values
    }

    /// Label of a feature for messages and duplicate comparison.
    pub fn feature_label(&self, feat: usize) -> String {
        let handle = &self.feats[feat];
        match &handle.feat.data {
            FeatData::Gene(gene) => gene.label().to_string(),
            FeatData::Rna(rna) => rna.product().unwrap_or_default().to_string(),
            FeatData::Prot(prot) => prot.name.first().cloned().unwrap_or_default(),
            FeatData::Cdregion(_) => self
                .product_protein_name(feat)
                .or_else(|| handle.feat.product.as_ref().map(SeqLoc::label))
                .unwrap_or_default(),
            FeatData::Imp(imp) => handle
                .feat
                .quals("note")
                .next()
                .map(|note| format!("{} {}", imp.key, note))
                .unwrap_or_else(|| imp.key.clone()),
            FeatData::Region(name) => name.clone(),
            other => other.label().to_string(),
        }
    }

    /// Name of the full-length protein on a CDS product Bioseq.
    pub fn product_protein_name(&self, cds: usize) -> Option<String> {
        let product = self.feats[cds].feat.product.as_ref()?;
        let seq = self.seq_by_id(product.first_id()?)?;
        self.owned_by(FeatOwner::Bioseq(seq))
            .iter()
            .filter_map(|i| self.feats[*i].feat.prot_ref())
            .find_map(|prot| prot.name.first().cloned())
    }

    // ========================================================================
    // Residues
    // ========================================================================

    /// Decoded residues of a Bioseq, computed on first use.
    ///
    /// Delta gaps decode to `-`. `None` when the residues cannot be known
    /// (virtual Bioseqs, undecodable data, far components outside the
    /// record).
    pub fn residues(&self, seq: usize) -> Option<&[u8]> {
        let handle = self.seqs.get(seq)?;
        handle
            .residues
            .get_or_init(|| self.decode_residues(seq))
            .as_deref()
    }

    fn decode_residues(&self, ordinal: usize) -> Option<Vec<u8>> {
        let seq = self.seqs[ordinal].seq;
        if let Some(data) = &seq.inst.seq_data {
            return alphabet::decode(data, seq.inst.len()).ok();
        }
        let parts = seq.inst.delta_parts()?;
        let mut out = Vec::with_capacity(seq.inst.len());
        for part in parts {
            match part {
                DeltaSeq::Literal(lit) => match &lit.seq_data {
                    Some(data) if !data.is_gap() => out.extend(alphabet::decode(data, lit.length).ok()?),
                    _ => out.extend(std::iter::repeat_n(b'-', lit.length)),
                },
                DeltaSeq::Loc(loc) => {
                    // only one level of far components, and never ourselves
                    let id = loc.first_id()?;
                    let other = self.seq_by_id(id)?;
                    if other == ordinal || self.seqs[other].seq.inst.seq_data.is_none() {
                        return None;
                    }
                    out.extend(self.location_bases(loc)?);
                }
            }
        }
        Some(out)
    }

    /// Bases covered by a location, in biological order.
    pub fn location_bases(&self, loc: &SeqLoc) -> Option<Vec<u8>> {
        let mut out = Vec::new();
        for span in loc.spans(&|id: &SeqId| self.bioseq_len(id)) {
            let seq = self.seq_by_id(span.id)?;
            let residues = self.residues(seq)?;
            let piece = residues.get(span.from..=span.to)?;
            if span.strand.is_minus() {
                out.extend(reverse_complement(piece));
            } else {
                out.extend_from_slice(piece);
            }
        }
        Some(out)
    }

    /// One base by position, already complemented for minus strand reads.
    pub fn base_at(&self, seq: usize, pos: usize, minus: bool) -> Option<u8> {
        let base = *self.residues(seq)?.get(pos)?;
        Some(if minus { crate::seq::complement(base) } else { base })
    }
}

/// Feature kinds that can be reported as duplicates.
fn participates_in_duplicates(data: &FeatData) -> bool {
    !matches!(
        data,
        FeatData::Pub(_)
            | FeatData::Comment
            | FeatData::Region(_)
            | FeatData::Biosrc(_)
            | FeatData::User(_)
            | FeatData::Org(_)
    )
}
