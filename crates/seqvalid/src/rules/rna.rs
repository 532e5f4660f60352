//! RNA features: type, rRNA product names and tRNA anticodons.

use super::{FeatureSubject, Scope, is_pseudo};
use crate::diag::{ErrorCode, FindingSink, Severity};
use crate::error::Result;
use crate::model::{FeatData, RnaRef, RnaType, SeqFeat, SeqId, SeqLoc, Span, TrnaExt};
use crate::seq::GeneticCode;
use crate::seq::alphabet::{complement, expand_base};

pub fn check(subject: &FeatureSubject<'_, '_>, scope: &Scope<'_, '_>, out: &mut FindingSink) -> Result<()> {
    let feat = subject.feat();
    let FeatData::Rna(rna) = &feat.data else {
        return Ok(());
    };
    if rna.kind == RnaType::Unknown {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::RnaType0,
            "RNA type 0 (unknown) not supported",
        );
    }
    if rna.kind == RnaType::Rrna && rna.product().is_none_or(str::is_empty) && !is_pseudo(subject, scope) {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::RrnaDoesNotHaveProduct,
            "rRNA has no name",
        );
    }
    if let Some(trna) = rna.trna() {
        check_anticodon(feat, rna, trna, scope, out);
    }
    Ok(())
}

fn check_anticodon(feat: &SeqFeat, rna: &RnaRef, trna: &TrnaExt, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    let Some(anticodon) = &trna.anticodon else {
        return;
    };
    let len_of = |id: &SeqId| scope.index.bioseq_len(id);
    let spans = anticodon.spans(&len_of);
    let trna_spans = feat.location.spans(&len_of);

    let mut well_placed = true;
    let length: usize = spans.iter().map(Span::len).sum();
    if length != 3 {
        well_placed = false;
        scope.post(
            out,
            Severity::Error,
            ErrorCode::BadAnticodonLoc,
            "Anticodon is not 3 bases in length",
        );
    }
    let inside = |s: &Span<'_>| {
        trna_spans
            .iter()
            .any(|t| t.id == s.id && t.from <= s.from && s.to <= t.to)
    };
    if !spans.iter().all(inside) {
        well_placed = false;
        scope.post(
            out,
            Severity::Error,
            ErrorCode::BadAnticodonLoc,
            "Anticodon location not in tRNA",
        );
    }
    if anticodon.strand().is_some_and(|s| !feat.location.strand().is_some_and(|t| t.same_direction(s))) {
        well_placed = false;
        scope.post(
            out,
            Severity::Warning,
            ErrorCode::BadAnticodonLoc,
            "Anticodon strand and tRNA strand do not match",
        );
    }
    if well_placed && !rna.pseudo {
        check_charged_aa(anticodon, trna, scope, out);
    }
}

/// The tRNA's amino acid must be encoded by a codon the anticodon reads,
/// allowing wobble at the anticodon's 5' base.
fn check_charged_aa(anticodon: &SeqLoc, trna: &TrnaExt, scope: &Scope<'_, '_>, out: &mut FindingSink) {
    let Some(aa) = trna.aa.filter(|aa| !matches!(aa, 'U' | 'O' | 'X' | '*')) else {
        return;
    };
    let Some(bases) = scope.index.location_bases(anticodon) else {
        return;
    };
    let &[first, second, third] = bases.as_slice() else {
        return;
    };
    let code = scope
        .ctx
        .genetic_code
        .and_then(GeneticCode::by_id)
        .unwrap_or_else(GeneticCode::standard);
    let readable = codons_read_by([first, second, third].map(|b| b.to_ascii_uppercase()));
    if readable.is_empty() {
        return;
    }
    if !readable.iter().any(|codon| code.translate_codon(*codon) == aa as u8) {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::BadAnticodonAa,
            format!(
                "Codons predicted from anticodon ({}) cannot produce amino acid ({})",
                String::from_utf8_lossy(&bases).to_uppercase(),
                aa
            ),
        );
    }
}

/// Codons paired by an anticodon read 5' to 3'.
fn codons_read_by(anticodon: [u8; 3]) -> Vec<[u8; 3]> {
    let thirds: Vec<u8> = match anticodon[0] {
        b'G' => b"CT".to_vec(),
        b'T' | b'U' => b"AG".to_vec(),
        // inosine is recorded as A
        b'A' => b"TCA".to_vec(),
        other => expand_base(other).iter().map(|b| complement(*b)).collect(),
    };
    let mut codons = Vec::new();
    for first in expand_base(anticodon[2]) {
        for second in expand_base(anticodon[1]) {
            for third in &thirds {
                codons.push([complement(*first), complement(*second), *third]);
            }
        }
    }
    codons
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::Finding;
    use crate::fixtures;
    use crate::model::{Descriptor, RnaExt, SeqAnnot, SeqEntry, SeqInterval, Strand};
    use crate::rules::testing::{Harness, codes};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    /// Thirty bases with `GAA` at positions 10 to 12.
    const TRNA_GENE: &str = "AAAAAAAAAAGAAAAAAAAAAAAAAAAAAA";

    fn run(feats: Vec<SeqFeat>) -> Vec<Finding> {
        let mut seq = fixtures::raw_dna(fixtures::nuc_id(), TRNA_GENE);
        seq.descr = vec![Descriptor::Source(fixtures::human_source())];
        seq.annot.push(SeqAnnot::ftable(feats));
        let entry = SeqEntry::Seq(seq);
        Harness::new().run(&entry, |scope, out| {
            for handle in scope.index.features() {
                check(&FeatureSubject::new(handle), scope, out)?;
            }
            Ok(())
        })
    }

    fn rna(rna: RnaRef) -> SeqFeat {
        SeqFeat::new(FeatData::Rna(rna), SeqLoc::int(fixtures::nuc_id(), 0, 29))
    }

    fn trna(aa: char, anticodon: SeqLoc) -> SeqFeat {
        let mut r = RnaRef::new(RnaType::Trna);
        r.ext = Some(RnaExt::Trna(TrnaExt {
            aa: Some(aa),
            codon: Vec::new(),
            anticodon: Some(anticodon),
        }));
        rna(r)
    }

    #[test]
    fn test_rna_type_and_rrna_name() {
        assert_eq!(codes(&run(vec![rna(RnaRef::new(RnaType::Unknown))])), vec![ErrorCode::RnaType0]);

        let findings = run(vec![rna(RnaRef::new(RnaType::Rrna))]);
        assert_eq!(codes(&findings), vec![ErrorCode::RrnaDoesNotHaveProduct]);
        assert_eq!(findings[0].message, "rRNA has no name");

        assert!(run(vec![rna(RnaRef::new(RnaType::Rrna).with_name("16S ribosomal RNA"))]).is_empty());
        assert!(run(vec![rna(RnaRef::new(RnaType::Rrna)).pseudo()]).is_empty());
    }

    #[test]
    fn test_anticodon_matches_amino_acid() {
        let anticodon = SeqLoc::int(fixtures::nuc_id(), 10, 12);
        assert!(run(vec![trna('F', anticodon.clone())]).is_empty());

        let findings = run(vec![trna('K', anticodon)]);
        assert_eq!(codes(&findings), vec![ErrorCode::BadAnticodonAa]);
        assert_eq!(
            findings[0].message,
            "Codons predicted from anticodon (GAA) cannot produce amino acid (K)"
        );

        // selenocysteine is read through a stop codon
        assert!(run(vec![trna('U', SeqLoc::int(fixtures::nuc_id(), 10, 12))]).is_empty());
    }

    #[rstest]
    #[case(SeqLoc::int(fixtures::nuc_id(), 10, 11), "Anticodon is not 3 bases in length")]
    #[case(SeqLoc::int(fixtures::nuc_id(), 28, 30), "Anticodon location not in tRNA")]
    #[case(
        SeqLoc::Int(SeqInterval::new(fixtures::nuc_id(), 10, 12, Strand::Minus)),
        "Anticodon strand and tRNA strand do not match"
    )]
    fn test_bad_anticodon_location(#[case] anticodon: SeqLoc, #[case] message: &str) {
        let findings = run(vec![trna('F', anticodon)]);
        assert_eq!(codes(&findings), vec![ErrorCode::BadAnticodonLoc]);
        assert_eq!(findings[0].message, message);
    }

    #[rstest]
    #[case(*b"GAA", b"TTC")]
    #[case(*b"CAT", b"ATG")]
    fn test_codons_read_by(#[case] anticodon: [u8; 3], #[case] codon: &[u8]) {
        let codons = codons_read_by(anticodon);
        assert!(codons.iter().any(|c| &c[..] == codon));
    }
}
