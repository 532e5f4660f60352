//! BioSource rules: country, lat-lon, collection date, organelle and
//! qualifier semantics, plus set-level organism consistency.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::{Scope, first_non_ascii};
use crate::config::Options;
use crate::diag::{ErrorCode, FindingSink, Severity};
use crate::error::Result;
use crate::index::SetHandle;
use crate::model::{BioSource, Descriptor, OrgModType, SeqEntry, SetClass, SubSourceType};
use crate::services::{CountryLocator, CountryStatus, LatLon, LatLonError, classify_country, country_part, parse_lat_lon};

/// Accepted `/sex` values.
const SEX_VALUES: &[&str] = &[
    "female",
    "male",
    "hermaphrodite",
    "unisexual",
    "bisexual",
    "asexual",
    "monoecious",
    "dioecious",
    "pooled male and female",
    "pooled males and females",
    "neuter",
    "mixed",
    "not applicable",
    "not collected",
    "not provided",
    "missing",
    "restricted access",
];

/// Subsources that may appear at most once.
const SINGLE_VALUED: &[SubSourceType] = &[
    SubSourceType::Country,
    SubSourceType::LatLon,
    SubSourceType::CollectionDate,
    SubSourceType::Sex,
    SubSourceType::Segment,
    SubSourceType::Altitude,
];

/// One finding before it is posted.
pub type Problem = (Severity, ErrorCode, String);

pub fn check(src: &BioSource, scope: &Scope<'_, '_>, out: &mut FindingSink) -> Result<()> {
    let lineage = src.org.lineage();
    let prokaryote_or_virus = ["Bacteria", "Archaea", "Viruses"].iter().any(|k| lineage.starts_with(k));

    if src.genome.is_organelle() && prokaryote_or_virus {
        scope.post(
            out,
            Severity::Warning,
            ErrorCode::BadOrganelleLocation,
            format!(
                "Bacterial or viral source should not have organelle location {}",
                src.genome.label()
            ),
        );
    } else if src.genome.uses_plastid_code() && lineage.contains("Metazoa") {
        scope.post(
            out,
            Severity::Warning,
            ErrorCode::BadOrganelleLocation,
            format!("Animal source should not have organelle location {}", src.genome.label()),
        );
    }

    if src.org.mods_of(OrgModType::Variety).next().is_some()
        && !lineage.is_empty()
        && !["Viridiplantae", "Fungi", "Cyanobacteria"].iter().any(|k| lineage.contains(k))
    {
        scope.post(
            out,
            Severity::Warning,
            ErrorCode::BadVariety,
            "Orgmod variety should only be in plants, fungi, or cyanobacteria",
        );
    }

    for subtype in SINGLE_VALUED {
        if src.subsources_of(*subtype).count() > 1 {
            scope.post(
                out,
                Severity::Warning,
                ErrorCode::MultipleSourceQualifiers,
                format!("Multiple {} qualifiers present", subtype.label()),
            );
        }
    }

    let declared = src.first_subsource(SubSourceType::Country);
    for country in src.subsources_of(SubSourceType::Country) {
        if let Some((severity, code, message)) = country_problem(&country.name) {
            scope.post(out, severity, code, message);
        }
    }

    let valid_country = declared.filter(|c| classify_country(c) == CountryStatus::Valid);
    for lat_lon in src.subsources_of(SubSourceType::LatLon) {
        let problems = lat_lon_problems(
            &lat_lon.name,
            valid_country,
            scope.services.locator,
            scope.config.latlon_nearby_km,
        );
        for (severity, code, message) in problems {
            scope.post(out, severity, code, message);
        }
    }

    for date in src.subsources_of(SubSourceType::CollectionDate) {
        if let Some(message) = collection_date_problem(&date.name, scope.config.today()) {
            scope.post(out, Severity::Warning, ErrorCode::BadCollectionDate, message);
        }
    }

    for sex in src.subsources_of(SubSourceType::Sex) {
        if ["Bacteria", "Archaea"].iter().any(|k| lineage.starts_with(k)) {
            scope.post(
                out,
                Severity::Warning,
                ErrorCode::InvalidSexQualifier,
                "Unexpected use of /sex qualifier",
            );
        } else if !SEX_VALUES.contains(&sex.name.trim().to_ascii_lowercase().as_str()) {
            scope.post(
                out,
                Severity::Error,
                ErrorCode::InvalidSexQualifier,
                format!("Invalid value for sex qualifier: {}", sex.name),
            );
        }
    }

    check_consistency(src, scope, out);

    if scope.option(Options::STRICT_ASCII) {
        let texts = std::iter::once(src.org.taxname())
            .chain(src.subtype.iter().map(|s| s.name.as_str()))
            .chain(src.org.mods().iter().map(|m| m.subname.as_str()));
        if let Some(c) = texts.filter_map(first_non_ascii).next() {
            scope.post(
                out,
                Severity::Error,
                ErrorCode::NonAsciiAsn,
                format!("Non-ASCII character '{}' found in BioSource", c),
            );
        }
    }
    Ok(())
}

fn check_consistency(src: &BioSource, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    let taxname = src.org.taxname().to_ascii_lowercase();
    let env = src.has_subsource(SubSourceType::EnvironmentalSample);
    let mut inconsistent = |message: &str| {
        scope.post(out, Severity::Warning, ErrorCode::BioSourceInconsistency, message);
    };
    if taxname.starts_with("uncultured") && !env {
        inconsistent("Uncultured should also have /environmental_sample");
    }
    if src.has_subsource(SubSourceType::Metagenomic) && !env {
        inconsistent("Metagenomic should also have /environmental_sample");
    }
    if src.has_subsource(SubSourceType::Transgenic) && env {
        inconsistent("Transgenic and environmental sample should not both be present");
    }
    if src.has_subsource(SubSourceType::Germline) && src.has_subsource(SubSourceType::Rearranged) {
        inconsistent("Germline and rearranged should not both be present");
    }
    for sub in src.subtype.iter().filter(|s| s.subtype.is_flag()) {
        let value = sub.name.trim();
        if !value.is_empty() && !value.eq_ignore_ascii_case("true") {
            inconsistent(&format!("/{} is a flag and should not have a value", sub.subtype.label()));
        }
    }
}

/// Problems with a `/country` value.
pub fn country_problem(value: &str) -> Option<Problem> {
    if value.trim().is_empty() {
        return Some((Severity::Error, ErrorCode::BadCountryCode, "Empty country name".to_string()));
    }
    match classify_country(value) {
        CountryStatus::Valid => None,
        CountryStatus::BadCapitalization(_) => Some((
            Severity::Warning,
            ErrorCode::BadCountryCapitalization,
            format!("Bad country capitalization [{}]", value),
        )),
        CountryStatus::Replaced(now) => Some((
            Severity::Warning,
            ErrorCode::ReplacedCountryCode,
            format!("Replaced country name [{}], use {}", country_part(value), now),
        )),
        CountryStatus::Unknown => Some((
            Severity::Error,
            ErrorCode::BadCountryCode,
            format!("Bad country [{}]", value),
        )),
    }
}

/// Format, range and country cross-check of one `/lat_lon` value.
/// `country` is the declared, already valid `/country`.
pub fn lat_lon_problems(
    value: &str,
    country: Option<&str>,
    locator: &dyn CountryLocator,
    nearby_km: f64,
) -> Vec<Problem> {
    let point = match parse_lat_lon(value) {
        Ok(point) => point,
        Err(LatLonError::Format) => {
            return vec![(
                Severity::Error,
                ErrorCode::LatLonFormat,
                format!("lat_lon format is incorrect - should be 'dd.dd N|S ddd.dd E|W' [{}]", value),
            )];
        }
        Err(LatLonError::LatitudeRange) => {
            return vec![(
                Severity::Error,
                ErrorCode::LatLonRange,
                format!("latitude value is out of range - should be between 90 S and 90 N [{}]", value),
            )];
        }
        Err(LatLonError::LongitudeRange) => {
            return vec![(
                Severity::Error,
                ErrorCode::LatLonRange,
                format!("longitude value is out of range - should be between 180 W and 180 E [{}]", value),
            )];
        }
    };
    let Some(declared) = country.map(country_part) else {
        return Vec::new();
    };
    let found = locator.country_at(point);
    if found.as_deref() == Some(declared) {
        return Vec::new();
    }

    let in_declared = |p: LatLon| locator.country_at(p).as_deref() == Some(declared);
    let flips = [
        (
            LatLon { lat: -point.lat, lon: point.lon },
            if point.lat < 0.0 {
                "Latitude should be set to N (northern hemisphere)"
            } else {
                "Latitude should be set to S (southern hemisphere)"
            },
        ),
        (
            LatLon { lat: point.lat, lon: -point.lon },
            if point.lon < 0.0 {
                "Longitude should be set to E (eastern hemisphere)"
            } else {
                "Longitude should be set to W (western hemisphere)"
            },
        ),
        (
            LatLon { lat: point.lon, lon: point.lat },
            "Latitude and longitude values appear to be exchanged",
        ),
    ];
    if let Some((_, message)) = flips
        .iter()
        .filter(|(p, _)| p.lat.abs() <= 90.0)
        .find(|(p, _)| in_declared(*p))
    {
        return vec![(Severity::Error, ErrorCode::LatLonValue, message.to_string())];
    }

    let distance = locator.distance_km(declared, point);
    match found {
        Some(other) => match distance {
            Some(d) if d <= nearby_km => vec![(
                Severity::Info,
                ErrorCode::LatLonCountry,
                format!(
                    "Lat_lon '{}' maps to '{}' instead of '{}' - claimed region '{}' is at distance {} km",
                    value,
                    other,
                    declared,
                    declared,
                    d.round() as i64
                ),
            )],
            _ => vec![(
                Severity::Error,
                ErrorCode::LatLonCountry,
                format!("Lat_lon '{}' maps to '{}' instead of '{}'", value, other, declared),
            )],
        },
        None => match distance {
            Some(d) if d > nearby_km => vec![(
                Severity::Error,
                ErrorCode::LatLonCountry,
                format!("Lat_lon '{}' does not map to '{}'", value, declared),
            )],
            _ => Vec::new(),
        },
    }
}

/// Earliest day of one collection-date form: `2011`, `Mar-2011`,
/// `21-Mar-2011`, `2011-03`, `2011-03-21`, or an ISO date-time.
fn parse_single_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let date_part = value.split('T').next().unwrap_or(value);
    if let Ok(date) = NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{}-01", date_part), "%Y-%m-%d") {
        return (date_part.len() == 7).then_some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%d-%b-%Y") {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(&format!("01-{}", value), "%d-%b-%Y") {
        return Some(date);
    }
    if value.len() == 4 && value.chars().all(|c| c.is_ascii_digit()) {
        return NaiveDate::from_ymd_opt(value.parse().ok()?, 1, 1);
    }
    None
}

/// First and last day named by a collection date, ranges included.
pub fn parse_collection_date(value: &str) -> Option<(NaiveDate, NaiveDate)> {
    match value.split_once('/') {
        Some((a, b)) => Some((parse_single_date(a)?, parse_single_date(b)?)),
        None => {
            let date = parse_single_date(value)?;
            Some((date, date))
        }
    }
}

pub fn collection_date_problem(value: &str, today: NaiveDate) -> Option<String> {
    let Some((start, end)) = parse_collection_date(value) else {
        return Some(format!(
            "Collection_date format is not in DD-Mmm-YYYY format [{}]",
            value
        ));
    };
    if start > end {
        return Some(format!("Collection_date range is not in chronological order [{}]", value));
    }
    if end > today {
        return Some(format!("Collection_date [{}] is in the future", value));
    }
    None
}

/// Organisms named by the direct children of a set.
fn child_organisms(entries: &[SeqEntry]) -> BTreeSet<&str> {
    entries
        .iter()
        .flat_map(|child| child.descr())
        .filter_map(|d| match d {
            Descriptor::Source(src) => Some(src.org.taxname()),
            _ => None,
        })
        .filter(|name| !name.is_empty())
        .collect()
}

/// Children of segmented, parts, nuc-prot and genomic product sets share
/// one organism. Population sets warn only when genera differ.
pub fn check_set(set: &SetHandle<'_>, scope: &Scope<'_, '_>, out: &mut FindingSink) -> Result<()> {
    let names = child_organisms(&set.set.seq_set);
    if names.len() < 2 {
        return Ok(());
    }
    let joined: Vec<&str> = names.iter().copied().collect();
    match set.set.class {
        SetClass::SegSet | SetClass::Parts | SetClass::NucProt | SetClass::GenProdSet => {
            scope.post(
                out,
                Severity::Error,
                ErrorCode::InconsistentBioSources,
                format!(
                    "BioSources within {} set are inconsistent: {}",
                    set.set.class.label(),
                    joined.join(", ")
                ),
            );
        }
        SetClass::PopSet => {
            let genera: BTreeSet<&str> = names.iter().filter_map(|n| n.split_whitespace().next()).collect();
            if genera.len() > 1 {
                scope.post(
                    out,
                    Severity::Warning,
                    ErrorCode::InconsistentBioSources,
                    "Population set contains inconsistent organisms.",
                );
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::Finding;
    use crate::fixtures;
    use crate::model::{BioseqSet, Genome, OrgRef};
    use crate::rules::testing::{Harness, codes};
    use crate::services::PolygonLocator;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn run(src: &BioSource) -> Vec<Finding> {
        let entry = fixtures::good_nucleotide();
        Harness::new().run(&entry, |scope, out| check(src, scope, out))
    }

    fn latlon(value: &str, country: &str) -> Vec<Problem> {
        lat_lon_problems(value, Some(country), &PolygonLocator::builtin(), 200.0)
    }

    #[test]
    fn test_fixture_source_is_clean() {
        assert!(run(&fixtures::human_source()).is_empty());
    }

    #[test]
    fn test_lat_lon_near_neighbour_reports_distance() {
        let problems = latlon("46.5 N 20 E", "Romania");
        assert_eq!(
            problems,
            vec![(
                Severity::Info,
                ErrorCode::LatLonCountry,
                "Lat_lon '46.5 N 20 E' maps to 'Hungary' instead of 'Romania' - claimed region 'Romania' is at distance 45 km".to_string()
            )]
        );
    }

    #[test]
    fn test_lat_lon_far_country_omits_distance() {
        let problems = latlon("34 N 65 E", "Romania");
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].1, ErrorCode::LatLonCountry);
        assert_eq!(problems[0].2, "Lat_lon '34 N 65 E' maps to 'Afghanistan' instead of 'Romania'");
    }

    #[test]
    fn test_lat_lon_hemisphere_flip() {
        let problems = latlon("38.9 N 77.03 E", "USA");
        assert_eq!(problems[0].1, ErrorCode::LatLonValue);
        assert_eq!(problems[0].2, "Longitude should be set to W (western hemisphere)");
    }

    #[rstest]
    #[case("46.5 N 20 E", "Hungary", None)]
    #[case("46.5N 20E", "Hungary", Some(ErrorCode::LatLonFormat))]
    #[case("95 N 20 E", "Hungary", Some(ErrorCode::LatLonRange))]
    fn test_lat_lon_format_and_range(
        #[case] value: &str,
        #[case] country: &str,
        #[case] expected: Option<ErrorCode>,
    ) {
        assert_eq!(latlon(value, country).first().map(|p| p.1), expected);
    }

    #[rstest]
    #[case("Romania", None)]
    #[case("USA: Maryland", None)]
    #[case("romania", Some(ErrorCode::BadCountryCapitalization))]
    #[case("Burma", Some(ErrorCode::ReplacedCountryCode))]
    #[case("Atlantis", Some(ErrorCode::BadCountryCode))]
    #[case("", Some(ErrorCode::BadCountryCode))]
    fn test_country_values(#[case] value: &str, #[case] expected: Option<ErrorCode>) {
        assert_eq!(country_problem(value).map(|p| p.1), expected);
    }

    #[rstest]
    #[case("21-Mar-2011", None)]
    #[case("Mar-2011", None)]
    #[case("2011", None)]
    #[case("2011-03", None)]
    #[case("2011-03-21T10:00:00Z", None)]
    #[case("2010/2011", None)]
    #[case("2011/2010", Some("Collection_date range is not in chronological order [2011/2010]"))]
    #[case("March 21 2011", Some("Collection_date format is not in DD-Mmm-YYYY format [March 21 2011]"))]
    #[case("2031", Some("Collection_date [2031] is in the future"))]
    fn test_collection_dates(#[case] value: &str, #[case] expected: Option<&str>) {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(collection_date_problem(value, today).as_deref(), expected);
    }

    #[test]
    fn test_organelle_and_variety() {
        let bacterium = BioSource::new(OrgRef::new("Escherichia coli").with_lineage("Bacteria; Proteobacteria", "BCT"))
            .with_genome(Genome::Mitochondrion);
        assert_eq!(codes(&run(&bacterium)), vec![ErrorCode::BadOrganelleLocation]);

        let mut animal = fixtures::human_source();
        animal.org = animal.org.with_mod(OrgModType::Variety, "tall");
        assert_eq!(codes(&run(&animal)), vec![ErrorCode::BadVariety]);
    }

    #[test]
    fn test_sex_and_multiplicity() {
        let src = fixtures::human_source()
            .with_subsource(SubSourceType::Sex, "female")
            .with_subsource(SubSourceType::Sex, "robot");
        let findings = run(&src);
        assert_eq!(
            codes(&findings),
            vec![ErrorCode::MultipleSourceQualifiers, ErrorCode::InvalidSexQualifier]
        );
        assert_eq!(findings[1].message, "Invalid value for sex qualifier: robot");
    }

    #[test]
    fn test_environmental_consistency() {
        let src = BioSource::new(OrgRef::new("uncultured bacterium"))
            .with_subsource(SubSourceType::Metagenomic, "");
        let messages: Vec<String> = run(&src).into_iter().map(|f| f.message).collect();
        assert_eq!(
            messages,
            vec![
                "Uncultured should also have /environmental_sample",
                "Metagenomic should also have /environmental_sample"
            ]
        );
    }

    #[test]
    fn test_inconsistent_segset() {
        let mut a = fixtures::raw_dna(crate::model::SeqId::local("a"), fixtures::CODING_NUC);
        a.descr.push(Descriptor::Source(fixtures::human_source()));
        let mut b = fixtures::raw_dna(crate::model::SeqId::local("b"), fixtures::CODING_NUC);
        b.descr.push(Descriptor::Source(BioSource::new(OrgRef::new("Mus musculus"))));
        let entry = SeqEntry::Set(BioseqSet::new(SetClass::SegSet, vec![a.into(), b.into()]));
        let findings = Harness::new().run(&entry, |scope, out| check_set(&scope.index.sets()[0], scope, out));
        assert_eq!(codes(&findings), vec![ErrorCode::InconsistentBioSources]);
        assert_eq!(
            findings[0].message,
            "BioSources within segset set are inconsistent: Homo sapiens, Mus musculus"
        );
    }
}
