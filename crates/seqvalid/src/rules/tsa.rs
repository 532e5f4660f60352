//! Transcriptome shotgun assembly: molecule and coding-strand checks.

use super::{FeatureSubject, Scope};
use crate::diag::{ErrorCode, FindingSink, Severity};
use crate::error::Result;
use crate::index::SeqHandle;
use crate::model::{Biomol, MolType, Tech};

/// A TSA record describes an RNA; its MolInfo and molecule must agree.
pub fn check(seq: &SeqHandle<'_>, scope: &Scope<'_, '_>, out: &mut FindingSink) -> Result<()> {
    if seq.seq.inst.mol.is_aa() || scope.ctx.tech() != Tech::Tsa {
        return Ok(());
    }
    let biomol = scope.ctx.molinfo.map(|m| m.biomol).unwrap_or_default();
    if !biomol.is_rna() {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::ConflictingBiomolTech,
            format!(
                "Biomol \"{}\" is not appropriate for sequences that use the TSA technique.",
                biomol.label()
            ),
        );
    }
    if seq.seq.inst.mol == MolType::Dna && biomol != Biomol::TranscribedRna {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::ConflictingBiomolTech,
            "TSA sequence should not be DNA",
        );
    }
    Ok(())
}

/// Assembled transcripts are submitted in the sense orientation.
pub fn check_feature(subject: &FeatureSubject<'_, '_>, scope: &Scope<'_, '_>, out: &mut FindingSink) -> Result<()> {
    let transcribed = scope
        .ctx
        .molinfo
        .is_some_and(|m| m.biomol == Biomol::TranscribedRna);
    if transcribed && subject.feat().data.is_cds() && subject.handle.strand.is_minus() {
        scope.post(
            out,
            Severity::Warning,
            ErrorCode::CdsOnMinusStrandTranscribedRna,
            "CDS should not be on minus strand of transcribed RNA",
        );
    }
    Ok(())
}
