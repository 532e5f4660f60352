//! Organism names checked against the taxonomy cache.

use super::Scope;
use crate::diag::{AccessionPolicy, ErrorCode, FindingSink, Severity};
use crate::error::Result;
use crate::model::BioSource;
use crate::services::TaxonMatch;

pub fn check(src: &BioSource, scope: &Scope<'_, '_>, out: &mut FindingSink) -> Result<()> {
    let taxonomy = scope.services.taxonomy;
    let name = src.org.taxname().trim();
    if !taxonomy.is_available() || name.is_empty() {
        return Ok(());
    }
    let Some(reply) = taxonomy.get(name) else {
        return Ok(());
    };
    match &reply.matched {
        TaxonMatch::Exact => {
            let expected = reply.record.as_ref().map(|r| i64::from(r.taxid));
            if let (Some(expected), Some(declared)) = (expected, src.org.taxid()) {
                if expected != declared {
                    scope.post(
                        out,
                        scope.severity(Severity::Warning, AccessionPolicy::CriticalForRefSeqTaxon),
                        ErrorCode::TaxonomyLookupProblem,
                        format!(
                            "Organism name is {} but taxonomy ID {} does not match lookup ID {}",
                            name, declared, expected
                        ),
                    );
                }
            }
        }
        TaxonMatch::CaseMismatch { correct } | TaxonMatch::Misspelled { suggestion: correct } => {
            scope.post(
                out,
                Severity::Warning,
                ErrorCode::TaxonomyLookupProblem,
                format!("Taxonomy lookup suggests {} for organism name {}", correct, name),
            );
        }
        TaxonMatch::Ambiguous { candidates } => {
            scope.post(
                out,
                Severity::Warning,
                ErrorCode::TaxonomyLookupProblem,
                format!(
                    "Taxonomy lookup found {} taxa for organism name {}",
                    candidates.len(),
                    name
                ),
            );
        }
        TaxonMatch::NotFound => {
            scope.post(
                out,
                Severity::Error,
                ErrorCode::OrganismNotFound,
                format!("Organism not found in taxonomy database (taxname: {})", name),
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::Finding;
    use crate::fixtures;
    use crate::model::{Descriptor, OrgRef, SeqEntry, SeqId};
    use crate::rules::testing::{Harness, codes};
    use crate::services::{StaticTaxonomy, TaxonomyCache};

    fn run_with(entry: &SeqEntry, src: &BioSource) -> Vec<Finding> {
        let mut harness = Harness::new();
        harness.taxonomy =
            TaxonomyCache::fetch(&StaticTaxonomy::new(), &[src.org.taxname().to_string()]).unwrap();
        harness.run(entry, |scope, out| check(src, scope, out))
    }

    #[test]
    fn test_known_organism_is_clean() {
        let src = fixtures::human_source();
        assert!(run_with(&fixtures::good_nucleotide(), &src).is_empty());
    }

    #[test]
    fn test_unknown_and_misspelled() {
        let entry = fixtures::good_nucleotide();
        let unknown = BioSource::new(OrgRef::new("Unicornis magicus"));
        let findings = run_with(&entry, &unknown);
        assert_eq!(codes(&findings), vec![ErrorCode::OrganismNotFound]);
        assert_eq!(
            findings[0].message,
            "Organism not found in taxonomy database (taxname: Unicornis magicus)"
        );

        let typo = BioSource::new(OrgRef::new("Homo sapeins"));
        assert_eq!(codes(&run_with(&entry, &typo)), vec![ErrorCode::TaxonomyLookupProblem]);
    }

    #[test]
    fn test_taxid_conflict_is_critical_on_refseq() {
        let src = BioSource::new(OrgRef::new("Homo sapiens").with_taxid(10090));
        let mut seq = fixtures::raw_dna(SeqId::refseq("NC_000001", Some(1)), fixtures::CODING_NUC);
        seq.descr.push(Descriptor::Source(src.clone()));
        let findings = run_with(&SeqEntry::Seq(seq), &src);
        assert_eq!(codes(&findings), vec![ErrorCode::TaxonomyLookupProblem]);
        assert_eq!(findings[0].severity, Severity::Critical);

        let local = run_with(&fixtures::good_nucleotide(), &src);
        assert_eq!(local[0].severity, Severity::Warning);
    }
}
