//! Main Validator struct and public API.

use std::sync::Arc;

use crate::config::{Options, ValidatorConfig};
use crate::diag::{ErrorCode, Finding, FindingList, Severity};
use crate::engine::Engine;
use crate::index::RecordIndex;
use crate::model::{SeqEntry, SeqId, SeqLoc};
use crate::rules::host::host_query;
use crate::rules::{RuleFamily, RuleSet, Services};
use crate::services::{
    CountryLocator, EutilsTaxonomy, InstitutionDictionary, PolygonLocator, ProductCache,
    SequenceFetcher, TaxonomyCache, TaxonomyService,
};

/// Validates sequence records.
///
/// A `Validator` holds only immutable collaborators, so one instance can
/// serve many concurrent [`validate`](Validator::validate) calls. Every call
/// builds its own index, context stack and service caches.
pub struct Validator {
    config: ValidatorConfig,
    taxonomy: Option<Arc<dyn TaxonomyService>>,
    fetcher: Option<Arc<dyn SequenceFetcher>>,
    institutions: Arc<InstitutionDictionary>,
    locator: Arc<dyn CountryLocator>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    /// Create a validator with default thresholds and the built-in
    /// institution and country tables.
    pub fn new() -> Self {
        Self {
            config: ValidatorConfig::default(),
            taxonomy: None,
            fetcher: None,
            institutions: Arc::new(InstitutionDictionary::builtin()),
            locator: Arc::new(PolygonLocator::builtin()),
        }
    }

    pub fn with_config(mut self, config: ValidatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Add a taxonomy service for organism and specific-host checks.
    ///
    /// Without one, those checks are skipped unless
    /// `Options::USE_REMOTE_TAXONOMY` asks for the remote client.
    pub fn with_taxonomy(mut self, service: impl TaxonomyService + 'static) -> Self {
        self.taxonomy = Some(Arc::new(service));
        self
    }

    /// Add a fetcher for CDS and mRNA products outside the record, used
    /// under `Options::FAR_FETCH_PRODUCTS`.
    pub fn with_fetcher(mut self, fetcher: impl SequenceFetcher + 'static) -> Self {
        self.fetcher = Some(Arc::new(fetcher));
        self
    }

    pub fn with_institutions(mut self, institutions: InstitutionDictionary) -> Self {
        self.institutions = Arc::new(institutions);
        self
    }

    pub fn with_country_locator(mut self, locator: impl CountryLocator + 'static) -> Self {
        self.locator = Arc::new(locator);
        self
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Run every rule against `entry`.
    pub fn validate(&self, entry: &SeqEntry, options: Options) -> FindingList {
        self.run(entry, options, &RuleSet::all())
    }

    /// Only the TSA molecule-type and minus-strand CDS checks.
    pub fn validate_tsa_biomol(&self, entry: &SeqEntry, options: Options) -> FindingList {
        self.run(entry, options, &RuleSet::only(&[RuleFamily::Tsa]))
    }

    /// Only the N-run, terminal-N and N-content checks.
    pub fn validate_n_stretches(&self, entry: &SeqEntry, options: Options) -> FindingList {
        self.run(entry, options, &RuleSet::only(&[RuleFamily::Ambiguity]))
    }

    fn run(&self, entry: &SeqEntry, options: Options, rules: &RuleSet) -> FindingList {
        log::debug!("validating with options {}", options);
        let index = RecordIndex::build(entry);
        let mut preamble = Vec::new();

        let taxonomy = self.taxonomy_cache(&index, options, rules, &mut preamble);
        let products = self.product_cache(&index, options, rules);
        let services = Services {
            institutions: &self.institutions,
            locator: self.locator.as_ref(),
            products: &products,
            taxonomy: &taxonomy,
        };

        let findings = Engine::new(&index, &self.config, &services, rules).run(entry, options);
        let mut all = preamble;
        all.extend(findings.into_vec());
        let mut findings = FindingList::from(all);

        let suppressed = index.suppressed_codes();
        if !suppressed.is_empty() {
            let before = findings.len();
            findings.remove_codes(suppressed);
            log::debug!("suppressed {} findings", before - findings.len());
        }
        findings
    }

    /// Look up every organism and host name of the record in one request.
    fn taxonomy_cache(
        &self,
        index: &RecordIndex<'_>,
        options: Options,
        rules: &RuleSet,
        preamble: &mut Vec<Finding>,
    ) -> TaxonomyCache {
        if !rules.contains(RuleFamily::Taxon) && !rules.contains(RuleFamily::Host) {
            return TaxonomyCache::unavailable();
        }
        let accession = index.bioseqs().first().map(|h| h.seq.best_label()).unwrap_or_default();
        let service: Arc<dyn TaxonomyService> = match &self.taxonomy {
            Some(service) => Arc::clone(service),
            None if options.contains(Options::USE_REMOTE_TAXONOMY) => match EutilsTaxonomy::new() {
                Ok(client) => Arc::new(client),
                Err(e) => {
                    log::warn!("cannot build remote taxonomy client: {}", e);
                    preamble.push(service_failure(&accession));
                    return TaxonomyCache::unavailable();
                }
            },
            None => return TaxonomyCache::unavailable(),
        };

        let mut queries = index.organism_names().to_vec();
        queries.extend(index.host_values().iter().map(|h| host_query(h)));
        match TaxonomyCache::fetch(service.as_ref(), &queries) {
            Ok(cache) => cache,
            Err(e) => {
                log::warn!("taxonomy lookup via {} failed: {}", service.name(), e);
                preamble.push(service_failure(&accession));
                TaxonomyCache::unavailable()
            }
        }
    }

    /// Fetch CDS and mRNA products that are not packaged in the record.
    fn product_cache(&self, index: &RecordIndex<'_>, options: Options, rules: &RuleSet) -> ProductCache {
        let Some(fetcher) = self.fetcher.as_deref() else {
            return ProductCache::empty();
        };
        let wanted = rules.contains(RuleFamily::Cds)
            || rules.contains(RuleFamily::Translation)
            || rules.contains(RuleFamily::Mrna);
        if !options.contains(Options::FAR_FETCH_PRODUCTS) || !wanted {
            return ProductCache::empty();
        }
        let mut far: Vec<&SeqId> = Vec::new();
        for handle in index.features() {
            let data = &handle.feat.data;
            if !data.is_cds() && !data.is_mrna() {
                continue;
            }
            let Some(id) = handle.feat.product.as_ref().and_then(SeqLoc::first_id) else {
                continue;
            };
            if index.seq_by_id(id).is_none() && !far.iter().any(|f| f.key() == id.key()) {
                far.push(id);
            }
        }
        if far.is_empty() {
            return ProductCache::empty();
        }
        log::debug!("fetching {} far products", far.len());
        ProductCache::fetch(fetcher, &far)
    }
}

fn service_failure(accession: &str) -> Finding {
    Finding::new(
        Severity::Error,
        ErrorCode::ServiceError,
        accession,
        "Taxonomy service connection failure",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::fixtures;
    use crate::index::SUPPRESSION_KIND;
    use crate::model::{Descriptor, OrgModType, UserObject};
    use crate::services::{InMemoryFetcher, StaticTaxonomy, TaxonReply};
    use pretty_assertions::assert_eq;

    struct SilentTaxonomy;

    impl TaxonomyService for SilentTaxonomy {
        fn name(&self) -> &str {
            "silent"
        }

        fn lookup(&self, _queries: &[String]) -> Result<Vec<TaxonReply>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_empty_taxonomy_reply_is_a_service_error() {
        let validator = Validator::new().with_taxonomy(SilentTaxonomy);
        let findings = validator.validate(&fixtures::good_nucleotide(), Options::NONE);
        let errors: Vec<_> = findings.with_code(ErrorCode::ServiceError).collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Taxonomy service connection failure");
        assert_eq!(errors[0].accession, "lcl|nuc");
        assert!(!findings.has(ErrorCode::OrganismNotFound));
    }

    #[test]
    fn test_no_taxonomy_means_no_lookup() {
        let findings = Validator::new().validate(&fixtures::good_nucleotide(), Options::NONE);
        assert!(!findings.has(ErrorCode::ServiceError));
    }

    #[test]
    fn test_narrow_runs() {
        let mut entry = fixtures::good_nucleotide();
        let SeqEntry::Seq(seq) = &mut entry else { unreachable!() };
        seq.inst = fixtures::raw_dna(fixtures::nuc_id(), &format!("NNNNNN{}", &fixtures::CODING_NUC[6..])).inst;

        let validator = Validator::new();
        let narrow = validator.validate_n_stretches(&entry, Options::NONE);
        assert!(narrow.has(ErrorCode::TerminalNs));
        let full = validator.validate(&entry, Options::NONE);
        assert!(narrow.iter().all(|f| full.as_slice().contains(f)));
        assert!(full.len() >= narrow.len());

        assert!(validator.validate_tsa_biomol(&entry, Options::NONE).is_empty());
    }

    #[test]
    fn test_suppression() {
        let mut entry = fixtures::good_nuc_prot();
        let SeqEntry::Set(set) = &mut entry else { unreachable!() };
        set.seq_set.pop();
        let validator = Validator::new();
        assert!(validator.validate(&entry, Options::NONE).has(ErrorCode::NucProtProblem));

        let SeqEntry::Set(set) = &mut entry else { unreachable!() };
        set.descr.push(Descriptor::User(
            UserObject::new(SUPPRESSION_KIND).with_field("Suppress", "NucProtProblem"),
        ));
        assert!(!validator.validate(&entry, Options::NONE).has(ErrorCode::NucProtProblem));
    }

    #[test]
    fn test_host_values_are_queried() {
        let mut entry = fixtures::good_nucleotide();
        let SeqEntry::Seq(seq) = &mut entry else { unreachable!() };
        for d in &mut seq.descr {
            if let Descriptor::Source(src) = d {
                src.org = src.org.clone().with_mod(OrgModType::NatHost, "homo sapiens");
            }
        }
        let findings = Validator::new()
            .with_taxonomy(StaticTaxonomy::new())
            .validate(&entry, Options::NONE);
        assert!(!findings.has(ErrorCode::ServiceError));
        let hosts: Vec<_> = findings.with_code(ErrorCode::BadSpecificHost).collect();
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].message, "Specific host value is incorrectly capitalized: 'homo sapiens'");
    }

    #[test]
    fn test_far_products_come_from_the_fetcher() {
        let mut entry = fixtures::good_nuc_prot();
        let SeqEntry::Set(set) = &mut entry else { unreachable!() };
        set.seq_set.pop();

        let plain = Validator::new().validate(&entry, Options::FAR_FETCH_PRODUCTS);
        assert!(plain.has(ErrorCode::ProductFetchFailure));

        let validator = Validator::new().with_fetcher(InMemoryFetcher::new().with_bioseq(fixtures::coding_protein()));
        assert!(validator.validate(&entry, Options::NONE).has(ErrorCode::ProductFetchFailure));
        assert!(!validator.validate(&entry, Options::FAR_FETCH_PRODUCTS).has(ErrorCode::ProductFetchFailure));
    }

    #[test]
    fn test_builder_replaces_collaborators() {
        let mut entry = fixtures::good_nucleotide();
        let SeqEntry::Seq(seq) = &mut entry else { unreachable!() };
        for d in &mut seq.descr {
            if let Descriptor::Source(src) = d {
                src.org = src.org.clone().with_mod(OrgModType::SpecimenVoucher, "USNM:12345");
            }
        }
        assert!(!Validator::new().validate(&entry, Options::NONE).has(ErrorCode::BadInstitutionCode));

        let config = ValidatorConfig::default().with_mismatch_report_limit(0);
        let validator = Validator::new()
            .with_config(config)
            .with_institutions(InstitutionDictionary::default())
            .with_country_locator(PolygonLocator::builtin());
        assert_eq!(validator.config().mismatch_report_limit, 0);
        assert!(validator.validate(&entry, Options::NONE).has(ErrorCode::BadInstitutionCode));
    }
}
