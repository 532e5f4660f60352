//! Descriptor rules: MolInfo, titles, comments, user objects, GenBank
//! blocks, dates, multiplicity and record completeness.

use chrono::NaiveDate;

use super::{Scope, first_non_ascii, seqid};
use crate::config::Options;
use crate::diag::{ErrorCode, FindingSink, Severity};
use crate::error::Result;
use crate::index::{FeatOwner, SUPPRESSION_KIND, SeqHandle};
use crate::model::{Biomol, Bioseq, Date, Descriptor, FeatData, GbBlock, MolInfo, SeqId, Tech, UserObject};

/// User object kind holding a structured comment.
pub const STRUCTURED_COMMENT_KIND: &str = "StructuredComment";

/// Check one descriptor. `target` is the Bioseq the descriptor sits on, or
/// `None` for set-level descriptors.
pub fn check(
    descr: &Descriptor,
    target: Option<&Bioseq>,
    scope: &Scope<'_, '_>,
    out: &mut FindingSink,
) -> Result<()> {
    match descr {
        Descriptor::MolInfo(mol) => check_molinfo(mol, target, scope, out),
        Descriptor::Title(title) => check_text("Title", title, scope, out),
        Descriptor::Comment(comment) => check_text("Comment", comment, scope, out),
        Descriptor::User(user) => check_user_object(user, scope, out),
        Descriptor::Genbank(gb) => check_genbank_block(gb, target, scope, out),
        Descriptor::CreateDate(date) => check_date("Create", date, scope, out),
        Descriptor::UpdateDate(date) => check_date("Update", date, scope, out),
        Descriptor::Source(_) | Descriptor::Pub(_) | Descriptor::Name(_) | Descriptor::Region(_) => {}
    }
    Ok(())
}

fn check_molinfo(mol: &MolInfo, target: Option<&Bioseq>, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    let Some(seq) = target else {
        return;
    };
    if seq.is_na() {
        if mol.biomol == Biomol::Peptide {
            scope.post(
                out,
                Severity::Error,
                ErrorCode::InvalidForType,
                "Nucleic acid with Molinfo-biomol = peptide",
            );
        }
        if mol.tech.is_protein_tech() {
            scope.post(
                out,
                Severity::Error,
                ErrorCode::InvalidForType,
                "Nucleic acid with protein sequence method",
            );
        }
    } else if seq.is_aa() {
        if !matches!(mol.biomol, Biomol::Peptide | Biomol::Unknown | Biomol::Other) {
            scope.post(
                out,
                Severity::Error,
                ErrorCode::InvalidForType,
                format!("Molinfo-biomol [{}] used on protein", mol.biomol.label()),
            );
        }
        if !matches!(mol.tech, Tech::Unknown | Tech::Standard | Tech::Other) && !mol.tech.is_protein_tech() {
            scope.post(
                out,
                Severity::Error,
                ErrorCode::InvalidForType,
                "Protein with nucleic acid sequence method",
            );
        }
    }
}

fn check_text(what: &str, text: &str, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::MissingText,
            format!("{} descriptor needs text", what),
        );
        return;
    }
    if what == "Title" && trimmed.ends_with([',', ';', ':']) {
        scope.post(
            out,
            Severity::Warning,
            ErrorCode::BadPunctuation,
            "Title descriptor ends in bad punctuation",
        );
    }
    if scope.option(Options::STRICT_ASCII) {
        if let Some(c) = first_non_ascii(text) {
            scope.post(
                out,
                Severity::Error,
                ErrorCode::NonAsciiAsn,
                format!("Non-ASCII character '{}' found in {} descriptor", c, what),
            );
        }
    }
}

fn check_user_object(user: &UserObject, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    if user.is_kind(STRUCTURED_COMMENT_KIND) || user.is_kind(SUPPRESSION_KIND) {
        return;
    }
    if user.data.is_empty() {
        let kind = user.kind_str().unwrap_or("?");
        scope.post(
            out,
            Severity::Error,
            ErrorCode::UserObjectProblem,
            format!("User object {} has no data", kind),
        );
    }
}

fn check_genbank_block(gb: &GbBlock, target: Option<&Bioseq>, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    let is_aa = target.is_some_and(Bioseq::is_aa);
    for acc in &gb.extra_accessions {
        let primary = target.is_some_and(|seq| seq.ids.iter().any(|id| id.accession() == Some(acc.as_str())));
        if primary {
            scope.post(
                out,
                Severity::Error,
                ErrorCode::BadSecondaryAccn,
                format!("{} used for both primary and secondary accession", acc),
            );
        } else if seqid::format_problem(&SeqId::genbank(acc.as_str(), None), is_aa).is_some() {
            scope.post(
                out,
                Severity::Error,
                ErrorCode::BadSecondaryAccn,
                format!("Bad secondary accession {}", acc),
            );
        }
    }

    let tech = scope.ctx.tech();
    for keyword in &gb.keywords {
        let Some(phase) = keyword.strip_prefix("HTGS_PHASE") else {
            continue;
        };
        let expected = match tech {
            Tech::Htgs0 => "0",
            Tech::Htgs1 => "1",
            Tech::Htgs2 => "2",
            Tech::Htgs3 => "3",
            _ => continue,
        };
        if phase != expected {
            scope.post(
                out,
                Severity::Warning,
                ErrorCode::Inconsistent,
                format!("{} keyword conflicts with technique htgs-{}", keyword, expected),
            );
        }
    }
}

/// Why a date is malformed: `BAD_YEAR`, `BAD_MONTH`, `BAD_DAY`, `EMPTY` or
/// `FUTURE`.
pub fn date_problem(date: &Date, today: NaiveDate) -> Option<&'static str> {
    let std = match date {
        Date::Str(s) if s.trim().is_empty() => return Some("EMPTY"),
        Date::Str(_) => return None,
        Date::Std(std) => std,
    };
    if std.year <= 0 {
        return Some("BAD_YEAR");
    }
    let month = match std.month {
        Some(m) if !(1..=12).contains(&m) => return Some("BAD_MONTH"),
        Some(m) => m,
        None => return (std.year > chrono::Datelike::year(&today)).then_some("FUTURE"),
    };
    let day = match std.day {
        Some(d) => {
            if NaiveDate::from_ymd_opt(std.year, month, d).is_none() {
                return Some("BAD_DAY");
            }
            d
        }
        None => 1,
    };
    let first = NaiveDate::from_ymd_opt(std.year, month, day)?;
    (first > today).then_some("FUTURE")
}

/// `YYYY-MM-DD` with missing parts left out.
pub fn date_label(date: &Date) -> String {
    match date {
        Date::Str(s) => s.clone(),
        Date::Std(std) => match (std.month, std.day) {
            (Some(m), Some(d)) => format!("{:04}-{:02}-{:02}", std.year, m, d),
            (Some(m), None) => format!("{:04}-{:02}", std.year, m),
            _ => format!("{:04}", std.year),
        },
    }
}

fn check_date(what: &str, date: &Date, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    if let Some(problem) = date_problem(date, scope.config.today()) {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::BadDate,
            format!("{} date has error - {}", what, problem),
        );
    }
}

/// Per-node multiplicity and create/update consistency.
pub fn check_node(descrs: &[Descriptor], scope: &Scope<'_, '_>, out: &mut FindingSink) -> Result<()> {
    let count = |f: fn(&Descriptor) -> bool| descrs.iter().filter(|d| f(d)).count();
    if count(|d| matches!(d, Descriptor::Source(_))) > 1 {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::MultipleBioSources,
            "Undesired multiple source descriptors",
        );
    }
    if count(|d| matches!(d, Descriptor::MolInfo(_))) > 1 {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::MultipleMolInfo,
            "Multiple MolInfo descriptors",
        );
    }
    if count(|d| matches!(d, Descriptor::Title(_))) > 1 {
        scope.post(out, Severity::Error, ErrorCode::MultipleTitles, "Multiple Title blocks");
    }

    let create = descrs.iter().find_map(|d| match d {
        Descriptor::CreateDate(date) => Some(date),
        _ => None,
    });
    let update = descrs.iter().find_map(|d| match d {
        Descriptor::UpdateDate(date) => Some(date),
        _ => None,
    });
    if let (Some(create), Some(update)) = (create, update) {
        if let (Some(c), Some(u)) = (create.sort_key(), update.sort_key()) {
            if c > u {
                scope.post(
                    out,
                    Severity::Warning,
                    ErrorCode::Inconsistent,
                    format!(
                        "Inconsistent create_date [{}] and update_date [{}]",
                        date_label(create),
                        date_label(update)
                    ),
                );
            }
        }
    }
    Ok(())
}

/// Organism, publication and MolInfo that every Bioseq needs from somewhere
/// in its ancestry.
pub fn check_completeness(seq: &SeqHandle<'_>, scope: &Scope<'_, '_>, out: &mut FindingSink) -> Result<()> {
    let feats = scope.index.located_on(seq.ordinal);
    let has_feature = |pred: fn(&FeatData) -> bool| {
        feats.iter().any(|i| pred(&scope.index.feat(*i).feat.data))
    };

    let org = scope
        .ctx
        .biosource
        .map(|b| b.org.taxname())
        .filter(|name| !name.trim().is_empty());
    if org.is_none() && !has_feature(|d| matches!(d, FeatData::Biosrc(_))) {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::NoOrgFound,
            "No organism name has been applied to this Bioseq. Other qualifiers may exist.",
        );
    }

    let owns_pub = scope
        .index
        .owned_by(FeatOwner::Bioseq(seq.ordinal))
        .iter()
        .any(|i| matches!(scope.index.feat(*i).feat.data, FeatData::Pub(_)));
    if seq.seq.is_na() && !scope.ctx.has_pub && !owns_pub && !has_feature(|d| matches!(d, FeatData::Pub(_))) {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::NoPubFound,
            "No publications refer to this Bioseq.",
        );
    }

    if scope.option(Options::INDEXER_MODE) && scope.ctx.molinfo.is_none() {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::NoMolInfoFound,
            "No Mol-info applies to this Bioseq",
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::Finding;
    use crate::fixtures;
    use crate::model::{SeqEntry, UserField};
    use crate::rules::testing::{Harness, codes};
    use rstest::rstest;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn run_descr(descr: Descriptor, harness: &Harness) -> Vec<Finding> {
        let mut seq = fixtures::raw_dna(fixtures::nuc_id(), fixtures::CODING_NUC);
        seq.descr.push(descr);
        let entry = SeqEntry::Seq(seq);
        harness.run(&entry, |scope, out| {
            let seq = scope.index.seq(0).seq;
            for d in &seq.descr {
                check(d, Some(seq), scope, out)?;
            }
            Ok(())
        })
    }

    #[rstest]
    #[case(Date::ymd(2020, 1, 15), None)]
    #[case(Date::ymd(2020, 13, 1), Some("BAD_MONTH"))]
    #[case(Date::ymd(2021, 2, 30), Some("BAD_DAY"))]
    #[case(Date::ymd(0, 1, 1), Some("BAD_YEAR"))]
    #[case(Date::ymd(2024, 7, 1), Some("FUTURE"))]
    #[case(Date::year(2030), Some("FUTURE"))]
    #[case(Date::Str(String::new()), Some("EMPTY"))]
    #[case(Date::Str("spring 2001".into()), None)]
    fn test_date_problems(#[case] date: Date, #[case] expected: Option<&str>) {
        assert_eq!(date_problem(&date, today()), expected);
    }

    #[test]
    fn test_molinfo_type_mismatch() {
        let findings = run_descr(Descriptor::MolInfo(MolInfo::new(Biomol::Peptide)), &Harness::new());
        assert_eq!(codes(&findings), vec![ErrorCode::InvalidForType]);
        assert_eq!(findings[0].message, "Nucleic acid with Molinfo-biomol = peptide");
    }

    #[test]
    fn test_title_text() {
        let findings = run_descr(Descriptor::Title("Homo sapiens clone 5,".into()), &Harness::new());
        assert_eq!(codes(&findings), vec![ErrorCode::BadPunctuation]);

        let findings = run_descr(Descriptor::Title("  ".into()), &Harness::new());
        assert_eq!(codes(&findings), vec![ErrorCode::MissingText]);

        let strict = Harness::new().with_options(Options::STRICT_ASCII);
        let findings = run_descr(Descriptor::Comment("caf\u{e9}".into()), &strict);
        assert_eq!(codes(&findings), vec![ErrorCode::NonAsciiAsn]);
    }

    #[test]
    fn test_secondary_accessions() {
        let mut seq = fixtures::raw_dna(SeqId::genbank("AB123456", Some(1)), fixtures::CODING_NUC);
        seq.descr.push(Descriptor::Genbank(GbBlock {
            extra_accessions: vec!["AB123456".into(), "AB654321".into(), "12345".into()],
            ..Default::default()
        }));
        let entry = SeqEntry::Seq(seq);
        let findings = Harness::new().run(&entry, |scope, out| {
            let seq = scope.index.seq(0).seq;
            check(&seq.descr[0], Some(seq), scope, out)
        });
        let messages: Vec<&str> = findings.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "AB123456 used for both primary and secondary accession",
                "Bad secondary accession 12345"
            ]
        );
    }

    #[test]
    fn test_empty_user_object() {
        let findings = run_descr(Descriptor::User(UserObject::new("Submission")), &Harness::new());
        assert_eq!(codes(&findings), vec![ErrorCode::UserObjectProblem]);

        let mut user = UserObject::new("Submission");
        user.data.push(UserField::str("AdditionalComment", "x"));
        assert!(run_descr(Descriptor::User(user), &Harness::new()).is_empty());
    }

    #[test]
    fn test_multiplicity_and_dates() {
        let descrs = vec![
            Descriptor::Title("a".into()),
            Descriptor::Title("b".into()),
            Descriptor::CreateDate(Date::ymd(2021, 1, 1)),
            Descriptor::UpdateDate(Date::ymd(2020, 1, 1)),
        ];
        let entry = fixtures::good_nucleotide();
        let findings = Harness::new().run(&entry, |scope, out| check_node(&descrs, scope, out));
        assert_eq!(codes(&findings), vec![ErrorCode::MultipleTitles, ErrorCode::Inconsistent]);
        assert_eq!(
            findings[1].message,
            "Inconsistent create_date [2021-01-01] and update_date [2020-01-01]"
        );
    }

    #[test]
    fn test_completeness() {
        let entry = fixtures::good_nucleotide();
        let findings = Harness::new().run(&entry, |scope, out| check_completeness(scope.index.seq(0), scope, out));
        assert!(findings.is_empty());

        let bare = SeqEntry::Seq(fixtures::raw_dna(fixtures::nuc_id(), fixtures::CODING_NUC));
        let findings = Harness::new()
            .with_options(Options::INDEXER_MODE)
            .run(&bare, |scope, out| check_completeness(scope.index.seq(0), scope, out));
        assert_eq!(
            codes(&findings),
            vec![ErrorCode::NoOrgFound, ErrorCode::NoPubFound, ErrorCode::NoMolInfoFound]
        );
    }
}
