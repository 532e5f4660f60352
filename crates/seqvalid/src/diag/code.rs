//! Stable error codes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidatorError;

/// Family an error code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeGroup {
    Inst,
    Descr,
    Feat,
    Pkg,
    Align,
    Graph,
    Generic,
}

impl CodeGroup {
    pub fn label(&self) -> &'static str {
        match self {
            CodeGroup::Inst => "SEQ_INST",
            CodeGroup::Descr => "SEQ_DESCR",
            CodeGroup::Feat => "SEQ_FEAT",
            CodeGroup::Pkg => "SEQ_PKG",
            CodeGroup::Align => "SEQ_ALIGN",
            CodeGroup::Graph => "SEQ_GRAPH",
            CodeGroup::Generic => "GENERIC",
        }
    }
}

macro_rules! error_codes {
    ($($variant:ident => ($name:literal, $group:ident)),+ $(,)?) => {
        /// Every code a rule can emit.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum ErrorCode {
            $($variant),+
        }

        impl ErrorCode {
            pub const ALL: &'static [ErrorCode] = &[$(ErrorCode::$variant),+];

            /// The stable string form, e.g. `TerminalNs`.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(ErrorCode::$variant => $name),+
                }
            }

            pub fn group(&self) -> CodeGroup {
                match self {
                    $(ErrorCode::$variant => CodeGroup::$group),+
                }
            }
        }

        impl FromStr for ErrorCode {
            type Err = ValidatorError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(ErrorCode::$variant),)+
                    other => Err(ValidatorError::UnknownErrorCode(other.to_string())),
                }
            }
        }
    };
}

error_codes! {
    // instance
    ReprInvalid => ("ReprInvalid", Inst),
    ExtNotAllowed => ("ExtNotAllowed", Inst),
    ExtBadOrMissing => ("ExtBadOrMissing", Inst),
    SeqDataNotFound => ("SeqDataNotFound", Inst),
    SeqDataNotAllowed => ("SeqDataNotAllowed", Inst),
    SeqDataLenWrong => ("SeqDataLenWrong", Inst),
    InvalidResidue => ("InvalidResidue", Inst),
    MolNotSet => ("MolNotSet", Inst),
    CompleteCircleProblem => ("CompleteCircleProblem", Inst),
    ShortSeq => ("ShortSeq", Inst),
    TerminalNs => ("TerminalNs", Inst),
    HighNContentPercent => ("HighNContentPercent", Inst),
    InternalNsInSeqRaw => ("InternalNsInSeqRaw", Inst),
    InternalNsInSeqLit => ("InternalNsInSeqLit", Inst),
    InternalNsAdjacentToGap => ("InternalNsAdjacentToGap", Inst),
    LeadingX => ("LeadingX", Inst),
    TrailingX => ("TrailingX", Inst),
    SeqLitDataLength0 => ("SeqLitDataLength0", Inst),
    SeqLitGapLength0 => ("SeqLitGapLength0", Inst),
    BadDeltaSeq => ("BadDeltaSeq", Inst),
    OverlappingDeltaRange => ("OverlappingDeltaRange", Inst),
    MissingGaps => ("MissingGaps", Inst),
    BadHtgsSeq => ("BadHTGSeq", Inst),
    SelfReferentialSequence => ("SelfReferentialSequence", Inst),
    BadSeqIdFormat => ("BadSeqIdFormat", Inst),
    ConflictingIdsOnBioseq => ("ConflictingIdsOnBioseq", Inst),
    CollidingSeqIds => ("CollidingSeqIds", Inst),
    NoIdOnBioseq => ("NoIdOnBioseq", Inst),
    // descriptors
    MultipleBioSources => ("MultipleBioSources", Descr),
    MultipleMolInfo => ("MultipleMolInfo", Descr),
    MultipleTitles => ("MultipleTitles", Descr),
    InvalidForType => ("InvalidForType", Descr),
    ConflictingBiomolTech => ("ConflictingBiomolTech", Descr),
    NoMolInfoFound => ("NoMolInfoFound", Descr),
    BadDate => ("BadDate", Descr),
    Inconsistent => ("Inconsistent", Descr),
    BadCollectionDate => ("BadCollectionDate", Descr),
    NoPubFound => ("NoPubFound", Descr),
    NoOrgFound => ("NoOrgFound", Descr),
    MissingPubRequirement => ("MissingPubRequirement", Descr),
    BadPageNumbering => ("BadPageNumbering", Descr),
    MissingIsoJta => ("MissingISOJTA", Descr),
    BadPunctuation => ("BadPunctuation", Descr),
    MissingText => ("MissingText", Descr),
    StrucCommMissingPrefixOrSuffix => ("StrucCommMissingPrefixOrSuffix", Descr),
    BadStrucCommMissingField => ("BadStrucCommMissingField", Descr),
    BadStrucCommInvalidFieldValue => ("BadStrucCommInvalidFieldValue", Descr),
    UserObjectProblem => ("UserObjectProblem", Descr),
    BadSecondaryAccn => ("BadSecondaryAccn", Descr),
    BadCountryCode => ("BadCountryCode", Descr),
    ReplacedCountryCode => ("ReplacedCountryCode", Descr),
    BadCountryCapitalization => ("BadCountryCapitalization", Descr),
    LatLonFormat => ("LatLonFormat", Descr),
    LatLonRange => ("LatLonRange", Descr),
    LatLonCountry => ("LatLonCountry", Descr),
    LatLonValue => ("LatLonValue", Descr),
    BadOrganelleLocation => ("BadOrganelleLocation", Descr),
    BadVariety => ("BadVariety", Descr),
    InvalidSexQualifier => ("InvalidSexQualifier", Descr),
    BioSourceInconsistency => ("BioSourceInconsistency", Descr),
    MultipleSourceQualifiers => ("MultipleSourceQualifiers", Descr),
    UnstructuredVoucher => ("UnstructuredVoucher", Descr),
    BadInstitutionCode => ("BadInstitutionCode", Descr),
    BadCollectionCode => ("BadCollectionCode", Descr),
    BadVoucherId => ("BadVoucherID", Descr),
    WrongVoucherType => ("WrongVoucherType", Descr),
    MultipleSourceVouchers => ("MultipleSourceVouchers", Descr),
    OrganismNotFound => ("OrganismNotFound", Descr),
    TaxonomyLookupProblem => ("TaxonomyLookupProblem", Descr),
    AmbiguousSpecificHost => ("AmbiguousSpecificHost", Descr),
    BadSpecificHost => ("BadSpecificHost", Descr),
    InconsistentBioSources => ("InconsistentBioSources", Descr),
    NonAsciiAsn => ("NonAsciiAsn", Descr),
    // features
    Range => ("Range", Feat),
    SeqLocOrder => ("SeqLocOrder", Feat),
    MixedStrand => ("MixedStrand", Feat),
    PartialsInconsistent => ("PartialsInconsistent", Feat),
    PartialProblem => ("PartialProblem", Feat),
    FeatInvalidForType => ("FeatInvalidForType", Feat),
    DuplicateFeat => ("DuplicateFeat", Feat),
    CollidingFeatureIds => ("CollidingFeatureIDs", Feat),
    FarLocation => ("FarLocation", Feat),
    ExceptionProblem => ("ExceptionProblem", Feat),
    GenCodeMismatch => ("GenCodeMismatch", Feat),
    MissingCdsProduct => ("MissingCDSproduct", Feat),
    StartCodon => ("StartCodon", Feat),
    InternalStop => ("InternalStop", Feat),
    NoStop => ("NoStop", Feat),
    MisMatchAa => ("MisMatchAA", Feat),
    TransLen => ("TransLen", Feat),
    StopInProtein => ("StopInProtein", Feat),
    CdsHasTooManyXs => ("CDShasTooManyXs", Feat),
    NotSpliceConsensusDonor => ("NotSpliceConsensusDonor", Feat),
    NotSpliceConsensusAcceptor => ("NotSpliceConsensusAcceptor", Feat),
    NotSpliceConsensusDonorTerminalIntron => ("NotSpliceConsensusDonorTerminalIntron", Feat),
    NotSpliceConsensusAcceptorTerminalIntron => ("NotSpliceConsensusAcceptorTerminalIntron", Feat),
    CdsMrnaRange => ("CDSmRNArange", Feat),
    CdsWithNoMrna => ("CDSwithNoMRNA", Feat),
    CdsWithMultipleMrnas => ("CDSwithMultipleMRNAs", Feat),
    GenesInconsistent => ("GenesInconsistent", Feat),
    SeqFeatXrefNotReciprocal => ("SeqFeatXrefNotReciprocal", Feat),
    SeqFeatXrefProblem => ("SeqFeatXrefProblem", Feat),
    CdsGeneRange => ("CDSgeneRange", Feat),
    MrnaGeneRange => ("mRNAgeneRange", Feat),
    GeneXrefWithoutGene => ("GeneXrefWithoutGene", Feat),
    CollidingLocusTags => ("CollidingLocusTags", Feat),
    GeneRefHasNoData => ("GeneRefHasNoData", Feat),
    ProtRefHasNoData => ("ProtRefHasNoData", Feat),
    BadEcNumberFormat => ("BadEcNumberFormat", Feat),
    BadEcNumberValue => ("BadEcNumberValue", Feat),
    RubiscoProblem => ("RubiscoProblem", Feat),
    InvalidInferenceValue => ("InvalidInferenceValue", Feat),
    UnknownImpFeatKey => ("UnknownImpFeatKey", Feat),
    UnknownImpFeatQual => ("UnknownImpFeatQual", Feat),
    MissingQualOnImpFeat => ("MissingQualOnImpFeat", Feat),
    RnaType0 => ("RNAtype0", Feat),
    RrnaDoesNotHaveProduct => ("rRNADoesNotHaveProduct", Feat),
    BadAnticodonLoc => ("BadAnticodonLoc", Feat),
    BadAnticodonAa => ("BadAnticodonAA", Feat),
    TranscriptLen => ("TranscriptLen", Feat),
    TranscriptMismatches => ("TranscriptMismatches", Feat),
    CdsOnMinusStrandTranscribedRna => ("CDSonMinusStrandTranscribedRNA", Feat),
    LocusTagProductMismatch => ("LocusTagProductMismatch", Feat),
    MissingGeneLocusTag => ("MissingGeneLocusTag", Feat),
    NoProtRefFound => ("NoProtRefFound", Feat),
    ProductFetchFailure => ("ProductFetchFailure", Feat),
    SelfReferentialProduct => ("SelfReferentialProduct", Feat),
    // packaging
    NucProtProblem => ("NucProtProblem", Pkg),
    CdsProductPackagingProblem => ("CDSproductPackagingProblem", Pkg),
    GenomicProductPackagingProblem => ("GenomicProductPackagingProblem", Pkg),
    ImproperlyNestedSets => ("ImproperlyNestedSets", Pkg),
    MissingSetTitle => ("MissingSetTitle", Pkg),
    EmptySet => ("EmptySet", Pkg),
    NoBioseqFound => ("NoBioseqFound", Pkg),
    // alignments
    SegsDimMismatch => ("SegsDimMismatch", Align),
    SegsNumsegMismatch => ("SegsNumsegMismatch", Align),
    SegsStartsMismatch => ("SegsStartsMismatch", Align),
    SegsLensMismatch => ("SegsLensMismatch", Align),
    SegsStrandsMismatch => ("SegsStrandsMismatch", Align),
    SeqIdProblem => ("SeqIdProblem", Align),
    Start => ("Start", Align),
    SegmentGap => ("SegmentGap", Align),
    PercentIdentity => ("PercentIdentity", Align),
    // graphs
    GraphMin => ("GraphMin", Graph),
    GraphMax => ("GraphMax", Graph),
    GraphBelow => ("GraphBelow", Graph),
    GraphAbove => ("GraphAbove", Graph),
    GraphByteLen => ("GraphByteLen", Graph),
    GraphBioseqLen => ("GraphBioseqLen", Graph),
    GraphAcgtScore => ("GraphACGTScore", Graph),
    GraphNScore => ("GraphNScore", Graph),
    GraphGapScore => ("GraphGapScore", Graph),
    GraphBioseqId => ("GraphBioseqId", Graph),
    GraphOutOfOrder => ("GraphOutOfOrder", Graph),
    // generic
    ServiceError => ("ServiceError", Generic),
    InternalException => ("InternalException", Generic),
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_codes_round_trip_through_strings() {
        for code in ErrorCode::ALL {
            assert_eq!(code.as_str().parse::<ErrorCode>().unwrap(), *code);
        }
    }

    #[test]
    fn test_code_names_are_unique() {
        let names: HashSet<&str> = ErrorCode::ALL.iter().map(|c| c.as_str()).collect();
        assert_eq!(names.len(), ErrorCode::ALL.len());
    }

    #[test]
    fn test_unknown_code() {
        assert!("NotARealCode".parse::<ErrorCode>().is_err());
        assert_eq!(ErrorCode::MrnaGeneRange.to_string(), "mRNAgeneRange");
        assert_eq!(ErrorCode::GraphMin.group(), CodeGroup::Graph);
    }
}
