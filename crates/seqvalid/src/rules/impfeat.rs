//! Import features and free-text qualifiers: legal keys, legal qualifier
//! names, qualifiers a key requires, and `/inference` values.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{FeatureSubject, Scope};
use crate::config::Options;
use crate::diag::{ErrorCode, FindingSink, Severity};
use crate::error::Result;
use crate::model::{FeatData, ImpFeat, SeqFeat};

/// Feature keys carried as import features.
const IMP_KEYS: &[&str] = &[
    "-", "-10_signal", "-35_signal", "3'clip", "3'UTR", "5'clip", "5'UTR", "allele", "assembly_gap",
    "attenuator", "C_region", "CAAT_signal", "centromere", "conflict", "D-loop", "D_segment",
    "enhancer", "exon", "gap", "GC_signal", "iDNA", "intron", "J_segment", "LTR", "mat_peptide",
    "misc_binding", "misc_difference", "misc_feature", "misc_recomb", "misc_signal",
    "misc_structure", "mobile_element", "modified_base", "mutation", "N_region", "old_sequence",
    "operon", "oriT", "polyA_signal", "polyA_site", "prim_transcript", "primer_bind", "promoter",
    "propeptide", "protein_bind", "RBS", "regulatory", "rep_origin", "repeat_region",
    "repeat_unit", "S_region", "satellite", "sig_peptide", "stem_loop", "STS", "TATA_signal",
    "telomere", "terminator", "transit_peptide", "unsure", "V_region", "V_segment", "variation",
    "virion",
];

/// Keys that have their own feature type and never appear as import features.
const TYPED_KEYS: &[&str] = &[
    "CDS", "gene", "mRNA", "tRNA", "rRNA", "ncRNA", "tmRNA", "misc_RNA", "precursor_RNA", "source",
    "Protein", "Region", "Site", "Bond",
];

const QUALIFIERS: &[&str] = &[
    "allele", "anticodon", "artificial_location", "bound_moiety", "circular_RNA", "citation",
    "codon_start", "compare", "cons_splice", "db_xref", "direction", "EC_number",
    "environmental_sample", "estimated_length", "evidence", "exception", "experiment", "focus",
    "frequency", "function", "gap_type", "gene", "gene_synonym", "germline", "inference", "label",
    "linkage_evidence", "locus_tag", "macronuclear", "map", "mobile_element_type", "mod_base",
    "ncRNA_class", "note", "number", "old_locus_tag", "operon", "partial", "phenotype", "product",
    "protein_id", "proviral", "pseudo", "pseudogene", "rearranged", "recombination_class",
    "regulatory_class", "replace", "ribosomal_slippage", "rpt_family", "rpt_type",
    "rpt_unit_range", "rpt_unit_seq", "satellite", "standard_name", "tag_peptide",
    "trans_splicing", "transcript_id", "transl_except", "transl_table", "translation", "usedin",
];

/// Qualifiers a key cannot do without; any one of a group satisfies it.
const REQUIRED: &[(&str, &[&str])] = &[
    ("conflict", &["citation", "compare"]),
    ("old_sequence", &["citation", "compare"]),
    ("modified_base", &["mod_base"]),
    ("gap", &["estimated_length"]),
    ("assembly_gap", &["estimated_length"]),
    ("regulatory", &["regulatory_class"]),
    ("mobile_element", &["mobile_element_type"]),
];

/// Evidence categories an inference may open with.
const INFERENCE_CATEGORIES: [&str; 3] = ["COORDINATES:", "DESCRIPTION:", "EXISTENCE:"];

/// Inference prefixes, longest first so a prefix never shadows a longer one.
const INFERENCE_PREFIXES: &[&str] = &[
    "non-experimental evidence, no additional details recorded",
    "similar to RNA sequence, other RNA",
    "similar to RNA sequence, mRNA",
    "similar to RNA sequence, EST",
    "similar to RNA sequence",
    "similar to DNA sequence",
    "similar to AA sequence",
    "ab initio prediction",
    "similar to sequence",
    "nucleotide motif",
    "protein motif",
    "alignment",
    "profile",
];

/// Databases an inference may cite an accession from.
const INFERENCE_DATABASES: &[&str] = &[
    "GenBank", "EMBL", "DDBJ", "INSD", "RefSeq", "UniProtKB", "UniProt", "SwissProt", "TrEMBL",
    "PDB", "Rfam", "PIR", "PRF",
];

static VERSIONED_ACCESSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][A-Z0-9]*(_[A-Z0-9]+)?\.\d+$").unwrap());

pub fn check(subject: &FeatureSubject<'_, '_>, scope: &Scope<'_, '_>, out: &mut FindingSink) -> Result<()> {
    let feat = subject.feat();
    if let FeatData::Imp(imp) = &feat.data {
        check_key(feat, imp, scope, out);
    }
    for qual in &feat.qual {
        if !QUALIFIERS.iter().any(|q| q.eq_ignore_ascii_case(&qual.qual)) {
            scope.post(
                out,
                Severity::Warning,
                ErrorCode::UnknownImpFeatQual,
                format!("Unknown qualifier {}", qual.qual),
            );
        }
    }
    let accessions = scope.option(Options::INFERENCE_ACCESSIONS);
    for value in feat.quals("inference") {
        if let Some(problem) = inference_problem(value, accessions) {
            scope.post(
                out,
                Severity::Warning,
                ErrorCode::InvalidInferenceValue,
                format!("Inference qualifier problem - {} ({})", problem, value),
            );
        }
    }
    Ok(())
}

fn check_key(feat: &SeqFeat, imp: &ImpFeat, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    let key = imp.key.as_str();
    if TYPED_KEYS.contains(&key) {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::UnknownImpFeatKey,
            format!("Feature key {} is not allowed as an import feature", key),
        );
        return;
    }
    if !IMP_KEYS.contains(&key) {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::UnknownImpFeatKey,
            format!("Unknown feature key {}", key),
        );
        return;
    }
    for (_, quals) in REQUIRED.iter().filter(|(k, _)| *k == key) {
        if !quals.iter().any(|q| feat.has_qual(q)) {
            scope.post(
                out,
                Severity::Error,
                ErrorCode::MissingQualOnImpFeat,
                format!("Missing qualifier {} for feature {}", quals.join(" or "), key),
            );
        }
    }
}

/// What is wrong with one `/inference` value.
pub fn inference_problem(value: &str, check_accessions: bool) -> Option<&'static str> {
    let mut rest = value.trim();
    if let Some(category) = INFERENCE_CATEGORIES.iter().find(|c| rest.starts_with(*c)) {
        rest = rest[category.len()..].trim_start();
    }
    let Some(prefix) = INFERENCE_PREFIXES.iter().find(|p| rest.starts_with(*p)) else {
        return Some("bad inference prefix");
    };
    rest = &rest[prefix.len()..];
    rest = rest.strip_prefix(" (same species)").unwrap_or(rest);

    if prefix.starts_with("non-experimental") {
        return (!rest.trim().is_empty()).then_some("bad inference body");
    }
    let Some(body) = rest.strip_prefix(':').map(str::trim) else {
        return Some("bad inference body");
    };
    if body.is_empty() {
        return Some("bad inference body");
    }
    if !prefix.starts_with("similar to") {
        return None;
    }
    for item in body.split(',').map(str::trim) {
        let Some((db, accession)) = item.split_once(':') else {
            return Some("bad inference body");
        };
        if !check_accessions {
            continue;
        }
        if !INFERENCE_DATABASES.contains(&db) {
            return Some("unrecognized database");
        }
        if !VERSIONED_ACCESSION.is_match(accession) {
            return Some("bad inference accession version");
        }
    }
    None
}
