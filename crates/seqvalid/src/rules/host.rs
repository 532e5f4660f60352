//! Specific-host (`/host`) values, resolved through the taxonomy cache.

use super::Scope;
use crate::diag::{ErrorCode, FindingSink, Severity};
use crate::error::Result;
use crate::model::{BioSource, OrgModType};
use crate::services::TaxonMatch;

/// The organism part of a host value, as sent to the taxonomy service:
/// text before `;`, `,` or `(`, cut to a binomial when followed by free
/// text such as an age or sex.
pub fn host_query(value: &str) -> String {
    let head = value
        .split([';', ',', '('])
        .next()
        .unwrap_or(value)
        .trim();
    let words: Vec<&str> = head.split_whitespace().collect();
    let capitalized = words
        .first()
        .and_then(|w| w.chars().next())
        .is_some_and(char::is_uppercase);
    let keeps_rank = words.iter().any(|w| matches!(*w, "sp." | "subsp." | "var." | "sp"));
    if capitalized && words.len() > 2 && !keeps_rank {
        words[..2].join(" ")
    } else {
        words.join(" ")
    }
}

pub fn check(src: &BioSource, scope: &Scope<'_, '_>, out: &mut FindingSink) -> Result<()> {
    let taxonomy = scope.services.taxonomy;
    if !taxonomy.is_available() {
        return Ok(());
    }
    for host in src.org.mods_of(OrgModType::NatHost) {
        let value = host.subname.trim();
        if value.is_empty() {
            continue;
        }
        let Some(reply) = taxonomy.get(&host_query(value)) else {
            continue;
        };
        match &reply.matched {
            TaxonMatch::Exact => {}
            TaxonMatch::CaseMismatch { .. } => scope.post(
                out,
                Severity::Warning,
                ErrorCode::BadSpecificHost,
                format!("Specific host value is incorrectly capitalized: '{}'", value),
            ),
            TaxonMatch::Misspelled { .. } => scope.post(
                out,
                Severity::Warning,
                ErrorCode::BadSpecificHost,
                format!("Specific host value is misspelled: '{}'", value),
            ),
            TaxonMatch::Ambiguous { .. } => scope.post(
                out,
                Severity::Info,
                ErrorCode::AmbiguousSpecificHost,
                format!("Specific host value is ambiguous: {}", value),
            ),
            TaxonMatch::NotFound => scope.post(
                out,
                Severity::Warning,
                ErrorCode::BadSpecificHost,
                format!("Invalid value for specific host: {}", value),
            ),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::Finding;
    use crate::fixtures;
    use crate::rules::testing::{Harness, codes};
    use crate::services::{StaticTaxonomy, TaxonomyCache};
    use rstest::rstest;

    fn run(hosts: &[&str]) -> Vec<Finding> {
        let mut src = fixtures::human_source();
        for host in hosts {
            src.org = src.org.with_mod(OrgModType::NatHost, *host);
        }
        let queries: Vec<String> = hosts.iter().map(|h| host_query(h)).collect();
        let mut harness = Harness::new();
        harness.taxonomy = TaxonomyCache::fetch(&StaticTaxonomy::new(), &queries).unwrap();
        let entry = fixtures::good_nucleotide();
        harness.run(&entry, |scope, out| check(&src, scope, out))
    }

    #[rstest]
    #[case("Homo sapiens", "Homo sapiens")]
    #[case("Homo sapiens; female", "Homo sapiens")]
    #[case("Homo sapiens 45 year old male", "Homo sapiens")]
    #[case("Bos sp. (cow)", "Bos sp.")]
    #[case("human", "human")]
    fn test_host_query(#[case] value: &str, #[case] expected: &str) {
        assert_eq!(host_query(value), expected);
    }

    #[test]
    fn test_host_classification() {
        let findings = run(&["Homo sapiens", "homo sapiens", "Homo sapeins", "Bos sp.", "Unicornis magicus", "human"]);
        assert_eq!(
            codes(&findings),
            vec![
                ErrorCode::BadSpecificHost,
                ErrorCode::BadSpecificHost,
                ErrorCode::AmbiguousSpecificHost,
                ErrorCode::BadSpecificHost,
            ]
        );
        let messages: Vec<&str> = findings.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Specific host value is incorrectly capitalized: 'homo sapiens'",
                "Specific host value is misspelled: 'Homo sapeins'",
                "Specific host value is ambiguous: Bos sp.",
                "Invalid value for specific host: Unicornis magicus",
            ]
        );
        assert_eq!(findings[2].severity, Severity::Info);
    }

    #[test]
    fn test_skipped_without_taxonomy() {
        let mut src = fixtures::human_source();
        src.org = src.org.with_mod(OrgModType::NatHost, "Unicornis magicus");
        let entry = fixtures::good_nucleotide();
        assert!(Harness::new().run(&entry, |scope, out| check(&src, scope, out)).is_empty());
    }
}
