//! Record traversal.
//!
//! The engine walks the record depth first in document order. Entering a
//! set or a Bioseq pushes a context frame built from its descriptors; the
//! rules for that node run against the merged context, then its children
//! are visited and the frame is popped. Rule families switched off in the
//! [`RuleSet`] are skipped. A rule returning `Err` becomes one
//! `InternalException` finding for the node and traversal goes on.

use crate::config::{Options, ValidatorConfig};
use crate::context::{Context, ContextStack, Frame, genetic_code_for};
use crate::diag::{ErrorCode, FindingList, FindingSink, Severity};
use crate::error::Result;
use crate::index::{FeatOwner, RecordIndex};
use crate::model::{
    AccessionClass, AnnotData, BioSource, Bioseq, BioseqSet, Descriptor, FeatData, SeqAnnot,
    SeqEntry,
};
use crate::rules::{
    FeatureSubject, RuleFamily, RuleSet, Scope, Services, align, ambiguity, biosource, cds, delta,
    descr, feature, gene, graph, host, impfeat, inst, mrna, packaging, protein, pubs, rna, seqid,
    splice, structured, taxon, translation, tsa, voucher,
};

/// Mutable state of one traversal.
struct Walk<'a> {
    stack: ContextStack<'a>,
    out: FindingSink,
    next_seq: usize,
    next_set: usize,
}

/// Read-only collaborators of one traversal.
pub struct Engine<'s, 'a> {
    index: &'s RecordIndex<'a>,
    config: &'s ValidatorConfig,
    services: &'s Services<'s>,
    rules: &'s RuleSet,
}

impl<'s, 'a> Engine<'s, 'a> {
    pub fn new(
        index: &'s RecordIndex<'a>,
        config: &'s ValidatorConfig,
        services: &'s Services<'s>,
        rules: &'s RuleSet,
    ) -> Self {
        Self {
            index,
            config,
            services,
            rules,
        }
    }

    /// Validate `entry`, which must be the record `index` was built from.
    pub fn run(&self, entry: &'a SeqEntry, options: Options) -> FindingList {
        let mut walk = Walk {
            stack: ContextStack::new(options),
            out: FindingSink::new(),
            next_seq: 0,
            next_set: 0,
        };

        let mut root = Frame::new();
        if let Some(first) = self.index.bioseqs().first() {
            root = root.with_accession(first.seq.best_label(), AccessionClass::for_ids(&first.seq.ids));
        }
        walk.stack.push(root);
        let ctx = walk.stack.current();
        let scope = self.scope(&ctx);
        self.dispatch(RuleFamily::Packaging, &scope, &mut walk.out, |out| {
            packaging::check_record(&scope, out)
        });

        self.visit(entry, &mut walk);
        walk.stack.pop();
        debug_assert_eq!(walk.stack.depth(), 0);

        log::debug!(
            "visited {} bioseqs and {} sets, {} findings",
            walk.next_seq,
            walk.next_set,
            walk.out.len()
        );
        walk.out.finish()
    }

    fn scope<'c>(&self, ctx: &'c Context<'a>) -> Scope<'c, 'a>
    where
        's: 'c,
    {
        Scope {
            index: self.index,
            ctx,
            config: self.config,
            services: self.services,
        }
    }

    /// Run one family's rule unless the family is switched off.
    fn dispatch<F>(&self, family: RuleFamily, scope: &Scope<'_, '_>, out: &mut FindingSink, rule: F)
    where
        F: FnOnce(&mut FindingSink) -> Result<()>,
    {
        if !self.rules.contains(family) {
            return;
        }
        log::trace!("{} rules on {}", family, scope.accession());
        if let Err(e) = rule(out) {
            log::warn!("{} rules failed on {}: {}", family, scope.accession(), e);
            scope.post(
                out,
                Severity::Error,
                ErrorCode::InternalException,
                format!("{} rules failed: {}", family, e),
            );
        }
    }

    fn visit(&self, entry: &'a SeqEntry, walk: &mut Walk<'a>) {
        match entry {
            SeqEntry::Seq(seq) => self.visit_bioseq(seq, walk),
            SeqEntry::Set(set) => self.visit_set(set, walk),
        }
    }

    fn visit_set(&self, set: &'a BioseqSet, walk: &mut Walk<'a>) {
        let ordinal = walk.next_set;
        walk.next_set += 1;
        let handle = self.index.set(ordinal);
        debug_assert!(std::ptr::eq(handle.set, set));

        let mut frame = descriptor_frame(&set.descr).with_set_class(set.class);
        if !handle.seqs.is_empty() {
            let first = self.index.seq(handle.seqs.start).seq;
            frame = frame.with_accession(first.best_label(), AccessionClass::for_ids(&first.ids));
        }
        walk.stack.push(frame);
        let ctx = walk.stack.current();
        let scope = self.scope(&ctx);
        log::trace!("entering {} set at depth {}", set.class.label(), walk.stack.depth());

        self.check_descriptors(&set.descr, None, &scope, &mut walk.out);
        for child in &set.seq_set {
            self.visit(child, walk);
        }
        self.check_features(self.index.owned_by(FeatOwner::Set(ordinal)), &scope, &mut walk.out);
        self.check_alignments(&set.annot, &scope, &mut walk.out);
        self.dispatch(RuleFamily::Packaging, &scope, &mut walk.out, |out| {
            packaging::check_set(handle, &scope, out)
        });
        self.dispatch(RuleFamily::BioSource, &scope, &mut walk.out, |out| {
            biosource::check_set(handle, &scope, out)
        });

        walk.stack.pop();
    }

    fn visit_bioseq(&self, seq: &'a Bioseq, walk: &mut Walk<'a>) {
        let ordinal = walk.next_seq;
        walk.next_seq += 1;
        let handle = self.index.seq(ordinal);
        debug_assert!(std::ptr::eq(handle.seq, seq));

        let frame = descriptor_frame(&seq.descr).with_accession(seq.best_label(), AccessionClass::for_ids(&seq.ids));
        walk.stack.push(frame);
        let ctx = walk.stack.current();
        let scope = self.scope(&ctx);
        let out = &mut walk.out;

        self.check_descriptors(&seq.descr, Some(seq), &scope, out);
        self.dispatch(RuleFamily::SeqId, &scope, out, |out| seqid::check(handle, &scope, out));
        self.dispatch(RuleFamily::Inst, &scope, out, |out| inst::check(handle, &scope, out));
        self.dispatch(RuleFamily::Delta, &scope, out, |out| delta::check(handle, &scope, out));
        self.dispatch(RuleFamily::Ambiguity, &scope, out, |out| {
            ambiguity::check(handle, &scope, out)
        });
        self.dispatch(RuleFamily::Protein, &scope, out, |out| protein::check(handle, &scope, out));
        self.dispatch(RuleFamily::Descr, &scope, out, |out| {
            descr::check_completeness(handle, &scope, out)
        });
        self.dispatch(RuleFamily::Tsa, &scope, out, |out| tsa::check(handle, &scope, out));
        self.dispatch(RuleFamily::Graph, &scope, out, |out| graph::check(handle, &scope, out));
        self.check_alignments(&seq.annot, &scope, out);
        self.check_features(self.index.owned_by(FeatOwner::Bioseq(ordinal)), &scope, out);

        walk.stack.pop();
    }

    fn check_descriptors(
        &self,
        descrs: &[Descriptor],
        target: Option<&Bioseq>,
        scope: &Scope<'_, '_>,
        out: &mut FindingSink,
    ) {
        self.dispatch(RuleFamily::Descr, scope, out, |out| descr::check_node(descrs, scope, out));
        for d in descrs {
            self.dispatch(RuleFamily::Descr, scope, out, |out| descr::check(d, target, scope, out));
            match d {
                Descriptor::Source(src) => self.check_biosource(src, scope, out),
                Descriptor::Pub(pubdesc) => {
                    self.dispatch(RuleFamily::Pubs, scope, out, |out| pubs::check(pubdesc, scope, out));
                }
                Descriptor::User(user) => {
                    self.dispatch(RuleFamily::Structured, scope, out, |out| {
                        structured::check(user, scope, out)
                    });
                }
                _ => {}
            }
        }
    }

    fn check_biosource(&self, src: &BioSource, scope: &Scope<'_, '_>, out: &mut FindingSink) {
        self.dispatch(RuleFamily::BioSource, scope, out, |out| biosource::check(src, scope, out));
        self.dispatch(RuleFamily::Voucher, scope, out, |out| voucher::check(src, scope, out));
        self.dispatch(RuleFamily::Host, scope, out, |out| host::check(src, scope, out));
        self.dispatch(RuleFamily::Taxon, scope, out, |out| taxon::check(src, scope, out));
    }

    fn check_features(&self, ordinals: &[usize], scope: &Scope<'_, '_>, out: &mut FindingSink) {
        type FeatureRule = fn(&FeatureSubject<'_, '_>, &Scope<'_, '_>, &mut FindingSink) -> Result<()>;
        const FEATURE_RULES: [(RuleFamily, FeatureRule); 10] = [
            (RuleFamily::Feature, feature::check),
            (RuleFamily::Cds, cds::check),
            (RuleFamily::Translation, translation::check),
            (RuleFamily::Splice, splice::check),
            (RuleFamily::Rna, rna::check),
            (RuleFamily::Gene, gene::check),
            (RuleFamily::ImpFeat, impfeat::check),
            (RuleFamily::Mrna, mrna::check),
            (RuleFamily::Tsa, tsa::check_feature),
            (RuleFamily::Protein, protein::check_feature),
        ];

        for &ordinal in ordinals {
            let subject = FeatureSubject::new(self.index.feat(ordinal));
            for (family, rule) in FEATURE_RULES {
                self.dispatch(family, scope, out, |out| rule(&subject, scope, out));
            }
            match &subject.feat().data {
                FeatData::Biosrc(src) => self.check_biosource(src, scope, out),
                FeatData::Pub(pubdesc) => {
                    self.dispatch(RuleFamily::Pubs, scope, out, |out| pubs::check(pubdesc, scope, out));
                }
                _ => {}
            }
        }
    }

    fn check_alignments(&self, annots: &[SeqAnnot], scope: &Scope<'_, '_>, out: &mut FindingSink) {
        if !scope.option(Options::VALIDATE_ALIGNMENTS) {
            return;
        }
        let aligns = annots.iter().filter_map(|a| match &a.data {
            AnnotData::Align(aligns) => Some(aligns),
            _ => None,
        });
        for align in aligns.flatten() {
            self.dispatch(RuleFamily::Align, scope, out, |out| align::check(align, scope, out));
        }
    }
}

/// Context contributed by one node's own descriptors.
fn descriptor_frame(descrs: &[Descriptor]) -> Frame<'_> {
    let biosource = descrs.iter().find_map(|d| match d {
        Descriptor::Source(src) => Some(src),
        _ => None,
    });
    let molinfo = descrs.iter().find_map(|d| match d {
        Descriptor::MolInfo(mol) => Some(mol),
        _ => None,
    });
    let mut frame = Frame::new()
        .with_biosource(biosource)
        .with_molinfo(molinfo)
        .with_genetic_code(biosource.and_then(genetic_code_for));
    for d in descrs {
        match d {
            Descriptor::Genbank(gb) => frame.keywords.extend(gb.keywords.iter().map(String::as_str)),
            Descriptor::Pub(_) => frame.has_pub = true,
            _ => {}
        }
    }
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::model::{SeqId, SetClass};
    use crate::services::{InstitutionDictionary, PolygonLocator, ProductCache, TaxonomyCache};
    use pretty_assertions::assert_eq;

    fn run_with(entry: &SeqEntry, rules: &RuleSet, options: Options) -> FindingList {
        let index = RecordIndex::build(entry);
        let institutions = InstitutionDictionary::builtin();
        let locator = PolygonLocator::builtin();
        let products = ProductCache::empty();
        let taxonomy = TaxonomyCache::unavailable();
        let services = Services {
            institutions: &institutions,
            locator: &locator,
            products: &products,
            taxonomy: &taxonomy,
        };
        let config = ValidatorConfig::default();
        Engine::new(&index, &config, &services, rules).run(entry, options)
    }

    #[test]
    fn test_clean_nuc_prot() {
        let rules = RuleSet::only(&[
            RuleFamily::Packaging,
            RuleFamily::Descr,
            RuleFamily::Cds,
            RuleFamily::Translation,
        ]);
        for entry in [fixtures::good_nucleotide(), fixtures::good_nuc_prot()] {
            let findings = run_with(&entry, &rules, Options::NONE);
            assert!(findings.is_empty(), "{:?}", findings.to_lines());
        }
    }

    #[test]
    fn test_findings_carry_node_accession() {
        let mut entry = fixtures::good_nuc_prot();
        let SeqEntry::Set(set) = &mut entry else { unreachable!() };
        set.seq_set.pop();
        let findings = run_with(&entry, &RuleSet::only(&[RuleFamily::Packaging]), Options::NONE);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings.as_slice()[0].code, ErrorCode::NucProtProblem);
        assert_eq!(findings.as_slice()[0].accession, "lcl|nuc");
    }

    #[test]
    fn test_disabled_families_are_skipped() {
        let entry: SeqEntry = BioseqSet::new(SetClass::NucProt, vec![]).into();
        let all = run_with(&entry, &RuleSet::all(), Options::NONE);
        assert!(all.has(ErrorCode::NoBioseqFound));
        let none = run_with(&entry, &RuleSet::only(&[RuleFamily::Tsa]), Options::NONE);
        assert!(none.is_empty());
    }

    #[test]
    fn test_descriptor_frame() {
        let mut seq = fixtures::raw_dna(SeqId::local("x"), fixtures::CODING_NUC);
        seq.descr.push(Descriptor::Source(fixtures::human_source()));
        let frame = descriptor_frame(&seq.descr);
        assert!(frame.biosource.is_some());
        assert!(frame.molinfo.is_none());
        assert!(!frame.has_pub);
    }
}
