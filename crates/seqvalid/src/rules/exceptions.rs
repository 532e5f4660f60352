//! Exception-text policy.
//!
//! A feature's exception text names the biology that explains an otherwise
//! failing check. The table maps every legal text to the checks it turns
//! off; the feature rules consult the resolved [`Exemptions`] once per
//! feature.

use std::collections::HashMap;
use std::ops::BitOr;

use once_cell::sync::Lazy;

use crate::model::SeqFeat;

/// A check that an exception text can turn off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Exemption {
    StartCodon,
    InternalStop,
    NoStop,
    Mismatch,
    TransLen,
    Splice,
    MixedStrand,
    SeqLocOrder,
    Transcript,
    Partial,
}

impl Exemption {
    const fn bit(self) -> u16 {
        1 << self as u16
    }
}

/// Set of exempted checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Exemptions(u16);

impl Exemptions {
    pub const NONE: Exemptions = Exemptions(0);

    pub const fn of(checks: &[Exemption]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < checks.len() {
            bits |= checks[i].bit();
            i += 1;
        }
        Exemptions(bits)
    }

    pub fn contains(self, check: Exemption) -> bool {
        self.0 & check.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Union of the effects of every legal text on the feature.
    pub fn for_feature(feat: &SeqFeat) -> Self {
        feat.exceptions()
            .into_iter()
            .filter_map(policy_for)
            .fold(Exemptions::NONE, |acc, e| acc | e)
    }
}

impl BitOr for Exemptions {
    type Output = Exemptions;

    fn bitor(self, rhs: Exemptions) -> Exemptions {
        Exemptions(self.0 | rhs.0)
    }
}

use Exemption::*;

const TRANSLATION: Exemptions = Exemptions::of(&[StartCodon, InternalStop, NoStop, Mismatch, TransLen]);
const FRAMESHIFT: Exemptions = Exemptions::of(&[InternalStop, Mismatch, TransLen, NoStop]);

static POLICY: Lazy<HashMap<&'static str, Exemptions>> = Lazy::new(|| {
    let with_transcript = Exemptions::of(&[Transcript]);
    let entries: [(&str, Exemptions); 24] = [
        ("RNA editing", TRANSLATION | with_transcript),
        ("reasons given in citation", TRANSLATION | Exemptions::of(&[Splice, Transcript])),
        ("rearrangement required for product", TRANSLATION | Exemptions::of(&[Splice, Transcript])),
        ("ribosomal slippage", FRAMESHIFT),
        ("artificial frameshift", FRAMESHIFT),
        ("unclassified translation discrepancy", FRAMESHIFT),
        ("adjusted for low-quality genome", FRAMESHIFT | Exemptions::of(&[Splice])),
        ("annotated by transcript or proteomic data", Exemptions::of(&[Mismatch, InternalStop, NoStop])),
        ("mismatches in translation", Exemptions::of(&[Mismatch])),
        ("translated product replaced", Exemptions::of(&[Mismatch])),
        ("modified codon recognition", Exemptions::of(&[InternalStop, Mismatch])),
        ("alternative start codon", Exemptions::of(&[StartCodon])),
        ("trans-splicing", Exemptions::of(&[Splice, MixedStrand, SeqLocOrder])),
        ("nonconsensus splice site", Exemptions::of(&[Splice])),
        ("heterogeneous population sequenced", Exemptions::of(&[Splice])),
        ("low-quality sequence region", Exemptions::of(&[Splice])),
        ("unclassified transcription discrepancy", with_transcript),
        ("mismatches in transcription", with_transcript),
        ("transcribed product replaced", with_transcript),
        ("circular RNA", Exemptions::of(&[SeqLocOrder])),
        ("unextendable partial coding region", Exemptions::of(&[Partial])),
        ("dicistronic gene", Exemptions::NONE),
        ("alternative processing", Exemptions::NONE),
        ("transcribed pseudogene", Exemptions::NONE),
    ];
    entries.into_iter().collect()
});

/// Effect of one exception text, or `None` when the text is not legal.
pub fn policy_for(text: &str) -> Option<Exemptions> {
    POLICY.get(text).copied()
}

pub fn is_legal(text: &str) -> bool {
    POLICY.contains_key(text)
}

/// Exception texts on the feature that are not in the table.
pub fn unknown_texts(feat: &SeqFeat) -> Vec<&str> {
    feat.exceptions().into_iter().filter(|t| !is_legal(t)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FeatData, SeqLoc};
    use rstest::rstest;

    fn feat(text: &str) -> SeqFeat {
        SeqFeat::new(FeatData::Comment, SeqLoc::Null).with_exception(text)
    }

    #[rstest]
    #[case("RNA editing", Mismatch, true)]
    #[case("RNA editing", StartCodon, true)]
    #[case("unclassified translation discrepancy", Mismatch, true)]
    #[case("unclassified translation discrepancy", StartCodon, false)]
    #[case("annotated by transcript or proteomic data", TransLen, false)]
    #[case("annotated by transcript or proteomic data", NoStop, true)]
    #[case("alternative start codon", StartCodon, true)]
    #[case("alternative start codon", Mismatch, false)]
    #[case("trans-splicing", MixedStrand, true)]
    #[case("dicistronic gene", Splice, false)]
    fn test_policy_table(#[case] text: &str, #[case] check: Exemption, #[case] exempt: bool) {
        assert_eq!(Exemptions::for_feature(&feat(text)).contains(check), exempt);
    }

    #[test]
    fn test_multiple_texts_combine() {
        let f = feat("alternative start codon, mismatches in translation");
        let exempt = Exemptions::for_feature(&f);
        assert!(exempt.contains(StartCodon));
        assert!(exempt.contains(Mismatch));
        assert!(!exempt.contains(InternalStop));
    }

    #[test]
    fn test_unknown_texts() {
        let f = feat("RNA editing, because I said so");
        assert_eq!(unknown_texts(&f), vec!["because I said so"]);
        assert!(Exemptions::for_feature(&feat("nonsense")).is_empty());
    }
}
