//! Integration tests for the seqvalid validator.

use pretty_assertions::assert_eq;
use rstest::rstest;

use seqvalid::fixtures;
use seqvalid::index::SUPPRESSION_KIND;
use seqvalid::model::{
    BioseqSet, DeltaSeq, Descriptor, FeatData, ImpFeat, MolType, SeqAnnot, SeqEntry, SeqFeat,
    SeqId, SeqInst, SeqInterval, SeqLiteral, SeqLoc, SetClass, Strand, SubSourceType, UserObject,
};
use seqvalid::{ErrorCode, Finding, FindingList, Options, Severity, SubmitterReport, Validator};

/// Findings of one code, in output order.
fn of_code(findings: &FindingList, code: ErrorCode) -> Vec<&Finding> {
    findings.with_code(code).collect()
}

/// A nucleotide with organism, publication and MolInfo around `residues`.
fn nucleotide(id: SeqId, residues: &str) -> SeqEntry {
    let mut entry = fixtures::good_nucleotide();
    let SeqEntry::Seq(seq) = &mut entry else { unreachable!() };
    seq.ids = vec![id.clone()];
    seq.inst = fixtures::raw_dna(id, residues).inst;
    entry
}

// =============================================================================
// Determinism and Suppression
// =============================================================================

#[test]
fn test_repeated_runs_are_identical() {
    let validator = Validator::new();
    let entries = [
        fixtures::good_nucleotide(),
        fixtures::good_nuc_prot(),
        fixtures::delta_entry(),
        fixtures::genomic_product_set(),
    ];
    for entry in &entries {
        let first = validator.validate(entry, Options::INDEXER_MODE);
        let second = validator.validate(entry, Options::INDEXER_MODE);
        assert_eq!(first.to_lines(), second.to_lines());
        assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
    }
}

#[test]
fn test_suppression_is_a_post_filter() {
    let residues = format!("NNNNNN{}", &fixtures::CODING_NUC[6..]);
    let plain = nucleotide(fixtures::nuc_id(), &residues);
    let mut suppressed = plain.clone();
    let SeqEntry::Seq(seq) = &mut suppressed else { unreachable!() };
    seq.descr.push(Descriptor::User(
        UserObject::new(SUPPRESSION_KIND)
            .with_field("Suppress", "TerminalNs")
            .with_field("Suppress", "HighNContentPercent"),
    ));

    let validator = Validator::new();
    let mut expected = validator.validate(&plain, Options::NONE);
    assert!(expected.has(ErrorCode::TerminalNs));
    expected.remove_codes(&[ErrorCode::TerminalNs, ErrorCode::HighNContentPercent]);

    let actual = validator.validate(&suppressed, Options::NONE);
    assert!(!actual.has(ErrorCode::TerminalNs));
    assert_eq!(actual.to_lines(), expected.to_lines());
}

// =============================================================================
// Sequence Content
// =============================================================================

#[rstest]
#[case(SeqId::local("nuc"), Severity::Warning)]
#[case(SeqId::genbank("AB123456", Some(1)), Severity::Error)]
#[case(SeqId::refseq("NC_000001", Some(1)), Severity::Warning)]
#[case(SeqId::patent("US", "123", 1), Severity::Warning)]
fn test_terminal_ns_follow_accession_class(#[case] id: SeqId, #[case] expected: Severity) {
    let residues = format!("NN{}", "ACGT".repeat(20));
    let findings = Validator::new().validate_n_stretches(&nucleotide(id, &residues), Options::NONE);
    let terminal = of_code(&findings, ErrorCode::TerminalNs);
    assert_eq!(terminal.len(), 1);
    assert_eq!(terminal[0].severity, expected);
    assert_eq!(terminal[0].message, "N at beginning of sequence: 2");
}

#[rstest]
#[case(5, false)]
#[case(6, true)]
fn test_n_window_threshold(#[case] ns: usize, #[case] reported: bool) {
    let residues = format!("A{}{}", "N".repeat(ns), "ACGT".repeat(20));
    let findings = Validator::new().validate_n_stretches(&nucleotide(fixtures::nuc_id(), &residues), Options::NONE);
    let windows: Vec<&str> = of_code(&findings, ErrorCode::HighNContentPercent)
        .iter()
        .map(|f| f.message.as_str())
        .collect();
    assert_eq!(
        windows.contains(&"Sequence has more than 5 Ns in the first 10 bases"),
        reported
    );
}

#[test]
fn test_delta_length_arithmetic() {
    let validator = Validator::new();
    let clean = validator.validate(&fixtures::delta_entry(), Options::NONE);
    assert!(!clean.has(ErrorCode::SeqDataLenWrong));

    for declared in [31, 33] {
        let mut entry = fixtures::delta_entry();
        let seq = match &mut entry {
            SeqEntry::Seq(seq) => seq,
            SeqEntry::Set(set) => match &mut set.seq_set[0] {
                SeqEntry::Seq(seq) => seq,
                SeqEntry::Set(_) => unreachable!(),
            },
        };
        seq.inst.length = Some(declared);
        let findings = validator.validate(&entry, Options::NONE);
        let wrong = of_code(&findings, ErrorCode::SeqDataLenWrong);
        assert_eq!(wrong.len(), 1);
        assert_eq!(
            wrong[0].message,
            format!("Bioseq.length [{}] does not match sum of delta segment lengths [32]", declared)
        );
        assert_eq!(findings.len(), clean.len() + 1);
    }
}

#[test]
fn test_reversed_delta_component_is_reported() {
    let mut seq = fixtures::delta_sequence();
    seq.inst = SeqInst::delta(
        MolType::Dna,
        vec![
            DeltaSeq::Literal(SeqLiteral::data("ACGTACGTAC")),
            DeltaSeq::Loc(SeqLoc::int(SeqId::genbank("AB123456", Some(1)), 20, 3)),
        ],
        28,
    );
    let entry = SeqEntry::Seq(seq);

    let validator = Validator::new();
    let findings = validator.validate(&entry, Options::NONE);
    let bad = of_code(&findings, ErrorCode::BadDeltaSeq);
    assert_eq!(bad.len(), 1);
    assert_eq!(bad[0].severity, Severity::Error);
    assert!(bad[0].message.starts_with("Delta component 2 has an interval with from greater than to"));
    assert!(!findings.has(ErrorCode::SeqDataLenWrong));

    let narrow = validator.validate_n_stretches(&entry, Options::NONE);
    assert!(narrow.iter().all(|f| findings.as_slice().contains(f)));
}

// =============================================================================
// Features
// =============================================================================

/// Nuc-prot set whose CDS covers `ATG` + `codons` alanines + `TAA`.
fn coding_set(codons: usize, protein: &str) -> SeqEntry {
    let residues = format!("ATG{}TAA", "GCT".repeat(codons));
    let mut nuc = fixtures::raw_dna(fixtures::nuc_id(), &residues);
    nuc.descr = vec![Descriptor::MolInfo(fixtures::genomic_molinfo())];
    nuc.annot.push(SeqAnnot::ftable(vec![
        SeqFeat::new(
            FeatData::Cdregion(Default::default()),
            SeqLoc::int(fixtures::nuc_id(), 0, residues.len() - 1),
        )
        .with_product(SeqLoc::Whole(fixtures::prot_id())),
    ]));
    let mut prot = fixtures::coding_protein();
    prot.inst = fixtures::raw_protein(fixtures::prot_id(), protein).inst;
    let mut set = BioseqSet::new(SetClass::NucProt, vec![nuc.into(), prot.into()]);
    set.descr = vec![
        Descriptor::Source(fixtures::human_source()),
        Descriptor::Pub(fixtures::submission_pub()),
    ];
    SeqEntry::Set(set)
}

#[test]
fn test_translation_mismatches() {
    let validator = Validator::new();
    let exact = format!("M{}", "A".repeat(20));
    assert!(!validator.validate(&coding_set(20, &exact), Options::NONE).has(ErrorCode::MisMatchAa));

    let one = format!("MAAAAAG{}", "A".repeat(14));
    let findings = validator.validate(&coding_set(20, &one), Options::NONE);
    let mismatches = of_code(&findings, ErrorCode::MisMatchAa);
    assert_eq!(mismatches.len(), 1);
    assert!(mismatches[0].message.starts_with("Residue 7 in protein [G] != translation [A]"));

    let eleven = format!("M{}{}", "G".repeat(11), "A".repeat(9));
    let findings = validator.validate(&coding_set(20, &eleven), Options::NONE);
    let mismatches = of_code(&findings, ErrorCode::MisMatchAa);
    assert_eq!(mismatches.len(), 1);
    assert!(mismatches[0].message.starts_with("11 mismatches found."));
}

#[test]
fn test_splice_donor_at_cds_boundary() {
    // exon ATGGCC, intron starting CT, exon GCTTAA
    let residues = "ATGGCCCTACCCCCCAGGCTTAA";
    let exons = SeqLoc::packed(vec![
        SeqInterval::new(fixtures::nuc_id(), 0, 5, Strand::Plus),
        SeqInterval::new(fixtures::nuc_id(), 17, 22, Strand::Plus),
    ]);
    let mut entry = nucleotide(fixtures::nuc_id(), residues);
    let SeqEntry::Seq(seq) = &mut entry else { unreachable!() };
    seq.annot.push(SeqAnnot::ftable(vec![
        SeqFeat::new(FeatData::Cdregion(Default::default()), exons),
        SeqFeat::new(FeatData::Imp(ImpFeat::new("intron")), SeqLoc::int(fixtures::nuc_id(), 6, 16)),
    ]));

    let findings = Validator::new().validate(&entry, Options::NONE);
    let donors = of_code(&findings, ErrorCode::NotSpliceConsensusDonor);
    let mut messages: Vec<&str> = donors.iter().map(|f| f.message.as_str()).collect();
    messages.sort_unstable();
    assert_eq!(
        messages,
        vec![
            "Splice donor consensus (GT) not found after exon ending at position 6 of lcl|nuc",
            "Splice donor consensus (GT) not found at start of intron, position 7 of lcl|nuc",
        ]
    );
    assert!(donors.iter().all(|f| f.severity == Severity::Warning));
}

#[test]
fn test_nuc_prot_without_protein() {
    let mut entry = fixtures::good_nuc_prot();
    let SeqEntry::Set(set) = &mut entry else { unreachable!() };
    set.seq_set.truncate(1);

    let findings = Validator::new().validate(&entry, Options::NONE);
    let packaging = of_code(&findings, ErrorCode::NucProtProblem);
    assert_eq!(packaging.len(), 1);
    assert_eq!(packaging[0].severity, Severity::Error);
    assert_eq!(packaging[0].message, "No proteins in nuc-prot set");
    assert!(findings.has(ErrorCode::ProductFetchFailure));
    assert!(!findings.has(ErrorCode::CdsGeneRange));
}

// =============================================================================
// Sources
// =============================================================================

fn located(lat_lon: &str) -> SeqEntry {
    let mut entry = fixtures::good_nucleotide();
    let SeqEntry::Seq(seq) = &mut entry else { unreachable!() };
    for d in &mut seq.descr {
        if let Descriptor::Source(src) = d {
            *src = src
                .clone()
                .with_subsource(SubSourceType::Country, "Romania")
                .with_subsource(SubSourceType::LatLon, lat_lon);
        }
    }
    entry
}

#[rstest]
#[case(
    "46.5 N 20 E",
    "Lat_lon '46.5 N 20 E' maps to 'Hungary' instead of 'Romania' - claimed region 'Romania' is at distance 45 km"
)]
#[case("34 N 65 E", "Lat_lon '34 N 65 E' maps to 'Afghanistan' instead of 'Romania'")]
fn test_lat_lon_country(#[case] lat_lon: &str, #[case] message: &str) {
    let findings = Validator::new().validate(&located(lat_lon), Options::NONE);
    let country = of_code(&findings, ErrorCode::LatLonCountry);
    assert_eq!(country.len(), 1);
    assert_eq!(country[0].message, message);
    if lat_lon.starts_with("46.5") {
        assert_eq!(country[0].severity, Severity::Info);
    }
}

// =============================================================================
// Reporting
// =============================================================================

#[test]
fn test_lines_and_report() {
    let mut entry = fixtures::good_nuc_prot();
    let SeqEntry::Set(set) = &mut entry else { unreachable!() };
    set.seq_set.truncate(1);
    let findings = Validator::new().validate(&entry, Options::NONE);

    let line = findings
        .to_lines()
        .into_iter()
        .find(|l| l.contains("NucProtProblem"))
        .unwrap();
    assert_eq!(line, "lcl|nuc:Error:NucProtProblem:No proteins in nuc-prot set");

    let report = SubmitterReport::from_findings(&findings);
    let json = serde_json::to_string(&report).unwrap();
    assert!(!json.is_empty());
}
