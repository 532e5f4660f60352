//! Coding region translation against the annotated protein: start codon,
//! internal and terminal stops, residue mismatches and length.

use super::{Exemption, FeatureSubject, Scope, cds, is_pseudo, plural};
use crate::diag::{ErrorCode, FindingSink, Severity};
use crate::error::Result;
use crate::model::{Cdregion, FeatData, SeqFeat, SeqId, SeqInterval, SeqLoc, Strand};
use crate::seq::{GeneticCode, complement, translate};

/// A CDS translated from the record's residues.
#[derive(Debug, Clone)]
pub struct Translation {
    /// Genetic code actually used.
    pub code: u8,
    /// One residue per complete codon, stops included as `*`.
    pub residues: Vec<u8>,
    /// Bases after the frame offset.
    pub coding_len: usize,
    /// The first codon is not an initiation codon of a 5' complete CDS.
    pub bad_start: bool,
    offset: usize,
    pieces: Vec<(SeqId, Strand)>,
    /// (piece, position) for each base in biological order.
    positions: Vec<(usize, usize)>,
}

impl Translation {
    /// Share of X among the translated residues, terminal stop excluded.
    pub fn x_percent(&self) -> f64 {
        let protein = match self.residues.split_last() {
            Some((&b'*', rest)) => rest,
            _ => &self.residues[..],
        };
        if protein.is_empty() {
            return 0.0;
        }
        let xs = protein.iter().filter(|&&aa| aa == b'X').count();
        xs as f64 * 100.0 / protein.len() as f64
    }

    /// Where a codon sits on the nucleotide.
    pub fn codon_location(&self, codon: usize) -> SeqLoc {
        let start = self.offset + codon * 3;
        let mut ints: Vec<SeqInterval> = Vec::new();
        for &(piece, pos) in self.positions.iter().skip(start).take(3) {
            let (id, strand) = &self.pieces[piece];
            match ints.last_mut() {
                Some(last) if last.id == *id && last.strand == *strand && strand.is_minus() && last.from == pos + 1 => {
                    last.from = pos;
                }
                Some(last) if last.id == *id && last.strand == *strand && !strand.is_minus() && last.to + 1 == pos => {
                    last.to = pos;
                }
                _ => ints.push(SeqInterval::new(id.clone(), pos, pos, *strand)),
            }
        }
        if ints.len() == 1 {
            SeqLoc::Int(ints.remove(0))
        } else {
            SeqLoc::PackedInt(ints)
        }
    }
}

/// Translate a coding region with its own genetic code, falling back to the
/// organism's and then the standard code. `None` when any residue under the
/// location is unavailable.
pub fn translate_cds(feat: &SeqFeat, cds: &Cdregion, scope: &Scope<'_, '_>) -> Option<Translation> {
    let index = scope.index;
    let mut pieces = Vec::new();
    let mut positions = Vec::new();
    let mut bases = Vec::new();
    for span in feat.location.spans(&|id: &SeqId| index.bioseq_len(id)) {
        let residues = index.residues(index.seq_by_id(span.id)?)?;
        residues.get(span.from..=span.to)?;
        let minus = span.strand.is_minus();
        let piece = pieces.len();
        pieces.push((span.id.clone(), span.strand));
        for k in 0..span.len() {
            let pos = if minus { span.to - k } else { span.from + k };
            let base = residues[pos];
            bases.push(if minus { complement(base) } else { base });
            positions.push((piece, pos));
        }
    }

    let table = cds
        .code
        .or(scope.ctx.genetic_code)
        .and_then(GeneticCode::by_id)
        .unwrap_or_else(GeneticCode::standard);
    let offset = cds.frame.offset().min(bases.len());
    let breaks: Vec<(usize, u8)> = cds
        .code_break
        .iter()
        .filter_map(|cb| {
            let span = *cb.loc.explicit_spans().first()?;
            let k = positions
                .iter()
                .position(|&(piece, pos)| pieces[piece].0 == *span.id && pos == span.five_prime())?;
            let aa = u8::try_from(cb.aa).ok()?;
            (k >= offset).then(|| ((k - offset) / 3, aa))
        })
        .collect();

    let coding = &bases[offset..];
    let first_is_start = offset == 0 && !feat.location.is_partial_start();
    let bad_start = first_is_start
        && !breaks.iter().any(|(codon, _)| *codon == 0)
        && coding
            .get(..3)
            .is_some_and(|c| !table.is_start([c[0], c[1], c[2]]));
    Some(Translation {
        code: table.id,
        residues: translate(coding, table, first_is_start, &breaks),
        coding_len: coding.len(),
        bad_start,
        offset,
        pieces,
        positions,
    })
}

pub fn check(subject: &FeatureSubject<'_, '_>, scope: &Scope<'_, '_>, out: &mut FindingSink) -> Result<()> {
    let feat = subject.feat();
    let FeatData::Cdregion(cdregion) = &feat.data else {
        return Ok(());
    };
    if is_pseudo(subject, scope) {
        return Ok(());
    }
    let Some(tr) = translate_cds(feat, cdregion, scope) else {
        return Ok(());
    };
    let product = feat
        .product
        .as_ref()
        .and_then(|p| cds::resolve_product(p, scope))
        .and_then(|(_, resolved)| cds::product_residues(resolved, scope));
    let given = product.as_deref();

    // a stop right after the annotated protein with codons left over
    let extension = given
        .map(<[u8]>::len)
        .filter(|&p| p + 1 < tr.residues.len() && tr.residues[p] == b'*');
    let end = match extension {
        Some(p) => p,
        None if tr.residues.last() == Some(&b'*') => tr.residues.len() - 1,
        None => tr.residues.len(),
    };
    let translated = &tr.residues[..end];
    let has_stop = end < tr.residues.len();

    check_start_and_stops(subject, &tr, translated, scope, out);

    let partial_stop = feat.location.is_partial_stop();
    if !has_stop && !partial_stop && !subject.is_exempt(Exemption::NoStop) {
        scope.post(out, Severity::Error, ErrorCode::NoStop, "Missing stop codon");
    }
    if has_stop && partial_stop && extension.is_none() {
        scope.post(
            out,
            Severity::Warning,
            ErrorCode::PartialProblem,
            "Got stop codon, but 3'end is labeled partial",
        );
    }

    let Some(given) = given else {
        return Ok(());
    };
    if !cdregion.conflict && !subject.is_exempt(Exemption::Mismatch) {
        report_mismatches(&tr, translated, given, scope, out);
    }
    if !cdregion.conflict && !subject.is_exempt(Exemption::TransLen) {
        if let Some(p) = extension {
            let past = tr.coding_len.saturating_sub(3 * (p + 1));
            scope.post(
                out,
                Severity::Error,
                ErrorCode::TransLen,
                format!("Coding region extends {} past stop codon", plural(past, "base", "bases")),
            );
        } else if given.len() != translated.len() {
            scope.post(
                out,
                Severity::Error,
                ErrorCode::TransLen,
                format!(
                    "Given protein length [{}] does not match translation length [{}]",
                    given.len(),
                    translated.len()
                ),
            );
        }
    }
    let terminators = given.iter().filter(|&&aa| aa == b'*').count();
    if terminators > 0 {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::StopInProtein,
            format!("[{}] termination symbols in protein sequence", terminators),
        );
    }
    Ok(())
}

fn check_start_and_stops(
    subject: &FeatureSubject<'_, '_>,
    tr: &Translation,
    translated: &[u8],
    scope: &Scope<'_, '_>,
    out: &mut FindingSink,
) {
    let bad_start = tr.bad_start && !subject.is_exempt(Exemption::StartCodon);
    let stops = if subject.is_exempt(Exemption::InternalStop) {
        0
    } else {
        translated.iter().filter(|&&aa| aa == b'*').count()
    };
    if bad_start && stops > 0 {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::StartCodon,
            format!(
                "Illegal start codon (and {}). Probably wrong genetic code [{}]",
                plural(stops, "internal stop codon", "internal stop codons"),
                tr.code
            ),
        );
    } else if bad_start {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::StartCodon,
            format!(
                "Illegal start codon used. Wrong genetic code [{}] or protein should be partial",
                tr.code
            ),
        );
    } else if stops > 0 {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::InternalStop,
            format!(
                "{}. Genetic code [{}]",
                plural(stops, "internal stop", "internal stops"),
                tr.code
            ),
        );
    }
}

/// Residue by residue comparison; one summary once the mismatches pass the
/// configured limit.
fn report_mismatches(tr: &Translation, translated: &[u8], given: &[u8], scope: &Scope<'_, '_>, out: &mut FindingSink) {
    let mismatches: Vec<usize> = translated
        .iter()
        .zip(given)
        .enumerate()
        .filter(|&(i, (t, p))| !(i == 0 && tr.bad_start) && !matches!(*t, b'X' | b'*') && *p != b'*' && t != p)
        .map(|(i, _)| i)
        .collect();
    let describe = |i: usize| {
        format!(
            "residue in protein [{}] != translation [{}] at {}",
            given[i] as char,
            translated[i] as char,
            tr.codon_location(i).label()
        )
    };
    match mismatches.as_slice() {
        [] => {}
        found if found.len() > scope.config.mismatch_report_limit => {
            let (first, last) = (found[0], found[found.len() - 1]);
            scope.post(
                out,
                Severity::Error,
                ErrorCode::MisMatchAa,
                format!(
                    "{} mismatches found. First mismatch at {}, {}. Last mismatch at {}, {}. Genetic code [{}]",
                    found.len(),
                    first + 1,
                    describe(first),
                    last + 1,
                    describe(last),
                    tr.code
                ),
            );
        }
        found => {
            for &i in found {
                scope.post(
                    out,
                    Severity::Error,
                    ErrorCode::MisMatchAa,
                    format!(
                        "Residue {} in protein [{}] != translation [{}] at {}",
                        i + 1,
                        given[i] as char,
                        translated[i] as char,
                        tr.codon_location(i).label()
                    ),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::Finding;
    use crate::fixtures;
    use crate::model::{BioseqSet, Descriptor, SeqAnnot, SeqEntry, SetClass};
    use crate::rules::testing::{Harness, codes};
    use pretty_assertions::assert_eq;

    fn run(entry: &SeqEntry) -> Vec<Finding> {
        Harness::new().run(entry, |scope, out| {
            for handle in scope.index.features() {
                check(&FeatureSubject::new(handle), scope, out)?;
            }
            Ok(())
        })
    }

    /// `ATG`, `codons` alanines, `TAA`.
    fn orf(codons: usize) -> String {
        format!("ATG{}TAA", "GCT".repeat(codons))
    }

    fn alanines(codons: usize) -> String {
        format!("M{}", "A".repeat(codons))
    }

    fn cds(location: SeqLoc) -> SeqFeat {
        SeqFeat::new(FeatData::Cdregion(Default::default()), location).with_product(SeqLoc::Whole(fixtures::prot_id()))
    }

    fn nuc_prot(nucleotide: &str, feat: SeqFeat, protein: &str) -> SeqEntry {
        let mut nuc = fixtures::raw_dna(fixtures::nuc_id(), nucleotide);
        nuc.annot.push(SeqAnnot::ftable(vec![feat]));
        let prot = fixtures::raw_protein(fixtures::prot_id(), protein);
        let mut set = BioseqSet::new(SetClass::NucProt, vec![nuc.into(), prot.into()]);
        set.descr = vec![Descriptor::Source(fixtures::human_source())];
        SeqEntry::Set(set)
    }

    fn full_length(nucleotide: &str, protein: &str) -> SeqEntry {
        let feat = cds(SeqLoc::int(fixtures::nuc_id(), 0, nucleotide.len() - 1));
        nuc_prot(nucleotide, feat, protein)
    }

    #[test]
    fn test_matching_translation_is_clean() {
        assert!(run(&fixtures::good_nuc_prot()).is_empty());
        assert!(run(&full_length(&orf(20), &alanines(20))).is_empty());
    }

    #[test]
    fn test_single_mismatch() {
        let mut protein = alanines(20).into_bytes();
        protein[5] = b'G';
        let findings = run(&full_length(&orf(20), &String::from_utf8(protein).unwrap()));
        assert_eq!(codes(&findings), vec![ErrorCode::MisMatchAa]);
        assert_eq!(
            findings[0].message,
            "Residue 6 in protein [G] != translation [A] at lcl|nuc:16-18"
        );
    }

    #[test]
    fn test_many_mismatches_are_summarized() {
        let protein = format!("M{}{}", "G".repeat(11), "A".repeat(9));
        let findings = run(&full_length(&orf(20), &protein));
        assert_eq!(codes(&findings), vec![ErrorCode::MisMatchAa]);
        assert_eq!(
            findings[0].message,
            "11 mismatches found. First mismatch at 2, residue in protein [G] != translation [A] at lcl|nuc:4-6. \
             Last mismatch at 12, residue in protein [G] != translation [A] at lcl|nuc:34-36. Genetic code [1]"
        );
    }

    #[test]
    fn test_mismatch_exemptions() {
        let protein = format!("M{}A", "G".repeat(19));
        let feat = cds(SeqLoc::int(fixtures::nuc_id(), 0, 65)).with_exception("mismatches in translation");
        assert!(run(&nuc_prot(&orf(20), feat, &protein)).is_empty());

        let mut feat = cds(SeqLoc::int(fixtures::nuc_id(), 0, 65));
        if let FeatData::Cdregion(cdregion) = &mut feat.data {
            cdregion.conflict = true;
        }
        assert!(run(&nuc_prot(&orf(20), feat, &protein)).is_empty());
    }

    #[test]
    fn test_illegal_start_codon() {
        let nucleotide = format!("AAA{}TAA", "GCT".repeat(20));
        let findings = run(&full_length(&nucleotide, &alanines(20)));
        assert_eq!(codes(&findings), vec![ErrorCode::StartCodon]);
        assert_eq!(
            findings[0].message,
            "Illegal start codon used. Wrong genetic code [1] or protein should be partial"
        );

        let feat = cds(SeqLoc::int(fixtures::nuc_id(), 0, 65)).with_exception("alternative start codon");
        assert!(run(&nuc_prot(&nucleotide, feat, &alanines(20))).is_empty());
    }

    #[test]
    fn test_internal_stop() {
        let nucleotide = format!("ATG{}TAA{}TAA", "GCT".repeat(9), "GCT".repeat(10));
        let findings = run(&full_length(&nucleotide, &alanines(20)));
        assert_eq!(codes(&findings), vec![ErrorCode::InternalStop]);
        assert_eq!(findings[0].message, "1 internal stop. Genetic code [1]");

        let nucleotide = format!("AAA{}TAA{}TAA", "GCT".repeat(9), "GCT".repeat(10));
        let findings = run(&full_length(&nucleotide, &alanines(20)));
        assert_eq!(
            findings[0].message,
            "Illegal start codon (and 1 internal stop codon). Probably wrong genetic code [1]"
        );
    }

    #[test]
    fn test_missing_and_partial_stop() {
        let nucleotide = format!("ATG{}", "GCT".repeat(21));
        let findings = run(&full_length(&nucleotide, &alanines(21)));
        assert_eq!(codes(&findings), vec![ErrorCode::NoStop]);

        let mut int = SeqInterval::new(fixtures::nuc_id(), 0, 65, Strand::Plus);
        int.partial_stop = true;
        let feat = cds(SeqLoc::Int(int)).partial();
        let findings = run(&nuc_prot(&orf(20), feat, &alanines(20)));
        assert_eq!(codes(&findings), vec![ErrorCode::PartialProblem]);
    }

    #[test]
    fn test_translation_length() {
        let nucleotide = format!("{}GCTGCT", orf(20));
        let findings = run(&full_length(&nucleotide, &alanines(20)));
        assert_eq!(codes(&findings), vec![ErrorCode::TransLen]);
        assert_eq!(findings[0].message, "Coding region extends 6 bases past stop codon");

        let findings = run(&full_length(&orf(20), &alanines(19)));
        assert_eq!(codes(&findings), vec![ErrorCode::TransLen]);
        assert_eq!(
            findings[0].message,
            "Given protein length [20] does not match translation length [21]"
        );
    }

    #[test]
    fn test_stop_in_protein() {
        let protein = format!("{}*", alanines(19));
        let findings = run(&full_length(&orf(20), &protein));
        assert_eq!(codes(&findings), vec![ErrorCode::StopInProtein]);
        assert_eq!(findings[0].message, "[1] termination symbols in protein sequence");
    }

    #[test]
    fn test_pseudo_cds_is_skipped() {
        let feat = cds(SeqLoc::int(fixtures::nuc_id(), 0, 65)).pseudo();
        assert!(run(&nuc_prot(&format!("AAA{}", "GCT".repeat(21)), feat, "M")).is_empty());
    }

    #[test]
    fn test_translate_cds_genetic_code() {
        let mut feat = cds(SeqLoc::int(fixtures::nuc_id(), 0, 8));
        let entry = nuc_prot("ATGTGATAA", feat.clone(), "MW");
        Harness::new().run(&entry, |scope, _| {
            let feat = scope.index.feat(0).feat;
            let tr = translate_cds(feat, feat.cdregion().unwrap(), scope).unwrap();
            assert_eq!(tr.residues, b"M**".to_vec());
            assert_eq!(tr.code, 1);
            Ok(())
        });

        if let FeatData::Cdregion(cdregion) = &mut feat.data {
            cdregion.code = Some(2);
        }
        let entry = nuc_prot("ATGTGATAA", feat, "MW");
        Harness::new().run(&entry, |scope, _| {
            let feat = scope.index.feat(0).feat;
            let tr = translate_cds(feat, feat.cdregion().unwrap(), scope).unwrap();
            assert_eq!(tr.residues, b"MW*".to_vec());
            Ok(())
        });
    }

    #[test]
    fn test_codon_locations_across_introns_and_strands() {
        let exons = SeqLoc::packed(vec![
            SeqInterval::new(fixtures::nuc_id(), 0, 4, Strand::Plus),
            SeqInterval::new(fixtures::nuc_id(), 8, 11, Strand::Plus),
        ]);
        let entry = nuc_prot("ATGGCNNNTTAA", cds(exons), "MA");
        Harness::new().run(&entry, |scope, _| {
            let feat = scope.index.feat(0).feat;
            let tr = translate_cds(feat, feat.cdregion().unwrap(), scope).unwrap();
            assert_eq!(tr.residues, b"MA*".to_vec());
            assert_eq!(tr.codon_location(1).label(), "[lcl|nuc:4-5, 9]");
            Ok(())
        });

        let entry = nuc_prot("TTAAGCCAT", cds(SeqLoc::int_minus(fixtures::nuc_id(), 0, 8)), "MA");
        assert!(run(&entry).is_empty());
        Harness::new().run(&entry, |scope, _| {
            let feat = scope.index.feat(0).feat;
            let tr = translate_cds(feat, feat.cdregion().unwrap(), scope).unwrap();
            assert_eq!(tr.codon_location(0).label(), "lcl|nuc:c9-7");
            Ok(())
        });
    }
}
