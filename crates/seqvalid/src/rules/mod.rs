//! Rule library.
//!
//! Each family is a module of plain functions with the shape
//! `check(subject, &Scope, &mut FindingSink) -> Result<()>`. Rules never
//! fail for an invalid record; that is what findings are for. An `Err`
//! means a schema invariant was broken, and the engine turns it into a
//! single `InternalException` finding for the node.

pub mod align;
pub mod ambiguity;
pub mod biosource;
pub mod cds;
pub mod delta;
pub mod descr;
pub mod exceptions;
pub mod feature;
pub mod gene;
pub mod graph;
pub mod host;
pub mod impfeat;
pub mod inst;
pub mod mrna;
pub mod packaging;
pub mod protein;
pub mod pubs;
pub mod rna;
pub mod seqid;
pub mod splice;
pub mod structured;
pub mod taxon;
pub mod translation;
pub mod tsa;
pub mod voucher;

use std::fmt;

use crate::config::{Options, ValidatorConfig};
use crate::context::Context;
use crate::diag::{AccessionPolicy, ErrorCode, FindingSink, Severity, severity_for};
use crate::index::{FeatHandle, RecordIndex};
use crate::services::{CountryLocator, InstitutionDictionary, ProductCache, TaxonomyCache};

pub use exceptions::{Exemption, Exemptions};

/// Lookup collaborators shared by every rule of one run.
pub struct Services<'s> {
    pub institutions: &'s InstitutionDictionary,
    pub locator: &'s dyn CountryLocator,
    /// Far CDS and mRNA products fetched before traversal.
    pub products: &'s ProductCache,
    pub taxonomy: &'s TaxonomyCache,
}

/// Everything a rule may read besides its subject.
pub struct Scope<'s, 'a> {
    pub index: &'s RecordIndex<'a>,
    pub ctx: &'s Context<'a>,
    pub config: &'s ValidatorConfig,
    pub services: &'s Services<'s>,
}

impl<'s, 'a> Scope<'s, 'a> {
    pub fn accession(&self) -> &str {
        &self.ctx.accession
    }

    pub fn option(&self, flag: Options) -> bool {
        self.ctx.option(flag)
    }

    /// Apply an accession-class policy to a base severity.
    pub fn severity(&self, base: Severity, policy: AccessionPolicy) -> Severity {
        severity_for(base, policy, self.ctx.accession_class, self.ctx.has_taxon())
    }

    /// Post a finding against the record in context.
    pub fn post(&self, out: &mut FindingSink, severity: Severity, code: ErrorCode, message: impl Into<String>) {
        out.post(severity, code, self.accession(), message);
    }
}

/// A feature under validation with its exception text already resolved.
pub struct FeatureSubject<'s, 'a> {
    pub handle: &'s FeatHandle<'a>,
    pub exempt: Exemptions,
}

impl<'s, 'a> FeatureSubject<'s, 'a> {
    pub fn new(handle: &'s FeatHandle<'a>) -> Self {
        Self {
            handle,
            exempt: Exemptions::for_feature(handle.feat),
        }
    }

    pub fn ordinal(&self) -> usize {
        self.handle.ordinal
    }

    pub fn feat(&self) -> &'a crate::model::SeqFeat {
        self.handle.feat
    }

    pub fn is_exempt(&self, check: Exemption) -> bool {
        self.exempt.contains(check)
    }
}

/// Groups of rules that a run can switch on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleFamily {
    SeqId,
    Inst,
    Delta,
    Ambiguity,
    Protein,
    Descr,
    Pubs,
    Structured,
    BioSource,
    Voucher,
    Host,
    Taxon,
    Feature,
    Cds,
    Translation,
    Splice,
    Rna,
    Gene,
    ImpFeat,
    Mrna,
    Tsa,
    Packaging,
    Align,
    Graph,
}

impl RuleFamily {
    pub const ALL: [RuleFamily; 24] = [
        RuleFamily::SeqId,
        RuleFamily::Inst,
        RuleFamily::Delta,
        RuleFamily::Ambiguity,
        RuleFamily::Protein,
        RuleFamily::Descr,
        RuleFamily::Pubs,
        RuleFamily::Structured,
        RuleFamily::BioSource,
        RuleFamily::Voucher,
        RuleFamily::Host,
        RuleFamily::Taxon,
        RuleFamily::Feature,
        RuleFamily::Cds,
        RuleFamily::Translation,
        RuleFamily::Splice,
        RuleFamily::Rna,
        RuleFamily::Gene,
        RuleFamily::ImpFeat,
        RuleFamily::Mrna,
        RuleFamily::Tsa,
        RuleFamily::Packaging,
        RuleFamily::Align,
        RuleFamily::Graph,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RuleFamily::SeqId => "seq-id",
            RuleFamily::Inst => "instance",
            RuleFamily::Delta => "delta",
            RuleFamily::Ambiguity => "ambiguity",
            RuleFamily::Protein => "protein",
            RuleFamily::Descr => "descriptor",
            RuleFamily::Pubs => "publication",
            RuleFamily::Structured => "structured-comment",
            RuleFamily::BioSource => "biosource",
            RuleFamily::Voucher => "voucher",
            RuleFamily::Host => "specific-host",
            RuleFamily::Taxon => "taxonomy",
            RuleFamily::Feature => "feature",
            RuleFamily::Cds => "cds",
            RuleFamily::Translation => "translation",
            RuleFamily::Splice => "splice",
            RuleFamily::Rna => "rna",
            RuleFamily::Gene => "gene",
            RuleFamily::ImpFeat => "imp-feat",
            RuleFamily::Mrna => "mrna",
            RuleFamily::Tsa => "tsa",
            RuleFamily::Packaging => "packaging",
            RuleFamily::Align => "alignment",
            RuleFamily::Graph => "graph",
        }
    }
}

impl fmt::Display for RuleFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The families enabled for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    families: Vec<RuleFamily>,
}

impl RuleSet {
    pub fn all() -> Self {
        Self {
            families: RuleFamily::ALL.to_vec(),
        }
    }

    pub fn only(families: &[RuleFamily]) -> Self {
        Self {
            families: families.to_vec(),
        }
    }

    pub fn contains(&self, family: RuleFamily) -> bool {
        self.families.contains(&family)
    }

    pub fn is_full(&self) -> bool {
        RuleFamily::ALL.iter().all(|f| self.contains(*f))
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::all()
    }
}

// ============================================================================
// Shared text helpers
// ============================================================================

/// Pseudo on the feature itself or on the gene it belongs to.
pub(crate) fn is_pseudo(subject: &FeatureSubject<'_, '_>, scope: &Scope<'_, '_>) -> bool {
    subject.feat().is_pseudo()
        || scope
            .index
            .gene_of(subject.ordinal())
            .is_some_and(|g| scope.index.feat(g).feat.is_pseudo())
}

/// First non-ASCII character of a text, if any.
pub(crate) fn first_non_ascii(text: &str) -> Option<char> {
    text.chars().find(|c| !c.is_ascii())
}

/// Pluralize a count for messages: `1 mismatch`, `2 mismatches`.
pub(crate) fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}
