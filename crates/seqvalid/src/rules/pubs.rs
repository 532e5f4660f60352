//! Publication rules, shared by Pub descriptors and Pub features.

use super::{Scope, descr};
use crate::config::Options;
use crate::diag::{ErrorCode, FindingSink, Severity};
use crate::error::Result;
use crate::model::{AuthList, CitArt, CitGen, CitJour, CitSub, Pub, Pubdesc};

pub fn check(pubdesc: &Pubdesc, scope: &Scope<'_, '_>, out: &mut FindingSink) -> Result<()> {
    for p in &pubdesc.pubs {
        match p {
            Pub::Article(art) => check_article(art, pubdesc.has_pmid(), scope, out),
            Pub::Sub(sub) => check_submission(sub, scope, out),
            Pub::Gen(cit) => check_generic(cit, scope, out),
            Pub::Pmid(id) | Pub::Muid(id) if *id <= 0 => {
                scope.post(
                    out,
                    Severity::Error,
                    ErrorCode::MissingPubRequirement,
                    format!("Publication identifier {} is not valid", id),
                );
            }
            Pub::Pmid(_) | Pub::Muid(_) => {}
        }
    }
    Ok(())
}

fn has_authors(authors: &AuthList) -> bool {
    authors.names.iter().any(|a| !a.last.trim().is_empty())
}

fn missing(scope: &Scope<'_, '_>, out: &mut FindingSink, message: &str) {
    scope.post(out, Severity::Error, ErrorCode::MissingPubRequirement, message);
}

fn check_article(art: &CitArt, has_pmid: bool, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    let published = !art.journal.imp.prepub;
    if !has_authors(&art.authors) {
        missing(scope, out, "Publication has no author names");
    }
    if art.title.as_deref().is_none_or(|t| t.trim().is_empty()) {
        missing(scope, out, "Publication has no title");
    }
    check_journal(&art.journal, published, has_pmid, scope, out);
}

fn check_journal(jour: &CitJour, published: bool, has_pmid: bool, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    if jour.name.as_deref().is_none_or(|n| n.trim().is_empty()) {
        missing(scope, out, "Journal title missing");
    }
    if published {
        if jour.imp.volume.as_deref().is_none_or(|v| v.trim().is_empty()) {
            missing(scope, out, "Journal volume missing");
        }
        match jour.imp.pages.as_deref() {
            None => missing(scope, out, "Journal pages missing"),
            Some(pages) => {
                if let Some(message) = page_problem(pages) {
                    scope.post(out, Severity::Warning, ErrorCode::BadPageNumbering, message);
                }
            }
        }
        if scope.option(Options::REQUIRE_ISSN)
            && !has_pmid
            && jour.iso_jta.as_deref().is_none_or(|j| j.trim().is_empty())
        {
            scope.post(
                out,
                Severity::Error,
                ErrorCode::MissingIsoJta,
                "ISO journal title abbreviation missing",
            );
        }
    }
    if let Some(date) = &jour.imp.date {
        if let Some(problem) = descr::date_problem(date, scope.config.today()) {
            scope.post(
                out,
                Severity::Error,
                ErrorCode::BadDate,
                format!("Publication date has error - {}", problem),
            );
        }
    } else if published {
        missing(scope, out, "Published journal article has no date");
    }
}

/// Page range problems: `12-9` ends before it starts; `a-b` ranges with a
/// different alphabetic prefix do not compare.
pub fn page_problem(pages: &str) -> Option<String> {
    let pages = pages.trim();
    if pages.is_empty() {
        return Some("No page numbers".to_string());
    }
    let (start, end) = pages.split_once('-')?;
    let (start, end) = (start.trim(), end.trim());
    if start.is_empty() || end.is_empty() {
        return Some(format!("Page numbering missing start or end [{}]", pages));
    }
    let split = |s: &str| -> (String, Option<u64>) {
        let digits: String = s.chars().filter(char::is_ascii_digit).collect();
        let prefix: String = s.chars().filter(|c| !c.is_ascii_digit()).collect();
        (prefix, digits.parse().ok())
    };
    let (start_prefix, start_num) = split(start);
    let (end_prefix, end_num) = split(end);
    if start_prefix != end_prefix && !end_prefix.is_empty() {
        return None;
    }
    match (start_num, end_num) {
        (Some(a), Some(b)) if b < a => {
            // `1234-56` abbreviates `1234-1256`.
            let width = end.len().min(start.len());
            let expanded = start[..start.len() - width].to_string() + end;
            match expanded.parse::<u64>() {
                Ok(full) if full >= a && start_prefix.is_empty() => None,
                _ => Some(format!(
                    "Page numbering stop [{}] less than start [{}]",
                    end, start
                )),
            }
        }
        _ => None,
    }
}

fn check_submission(sub: &CitSub, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    if !has_authors(&sub.authors) {
        missing(scope, out, "Submission citation has no author names");
    }
    match &sub.authors.affil {
        None => missing(scope, out, "Submission citation has no affiliation"),
        Some(affil) => {
            if affil.country.as_deref().is_none_or(|c| c.trim().is_empty()) {
                scope.post(
                    out,
                    Severity::Warning,
                    ErrorCode::MissingPubRequirement,
                    "Submission citation affiliation has no country",
                );
            }
        }
    }
    match &sub.date {
        None => missing(scope, out, "Submission citation has no date"),
        Some(date) => {
            if let Some(problem) = descr::date_problem(date, scope.config.today()) {
                scope.post(
                    out,
                    Severity::Error,
                    ErrorCode::BadDate,
                    format!("Submission citation date has error - {}", problem),
                );
            }
        }
    }
}

fn check_generic(cit: &CitGen, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    let blank = |s: &Option<String>| s.as_deref().is_none_or(|t| t.trim().is_empty());
    if blank(&cit.cit) && blank(&cit.title) && cit.authors.as_ref().is_none_or(|a| !has_authors(a)) {
        missing(scope, out, "Unpublished citation text invalid");
    }
    if cit.cit.as_deref().is_some_and(|c| c.eq_ignore_ascii_case("unpublished")) && blank(&cit.title) {
        missing(scope, out, "Unpublished citation has no title");
    }
    if let Some(date) = &cit.date {
        if let Some(problem) = descr::date_problem(date, scope.config.today()) {
            scope.post(
                out,
                Severity::Error,
                ErrorCode::BadDate,
                format!("Publication date has error - {}", problem),
            );
        }
    }
}
