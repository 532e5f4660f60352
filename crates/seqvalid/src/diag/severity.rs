//! Severity adjustment by accession class.
//!
//! Many rules share the same escalation policy: a base severity that is
//! raised for public accessions, lowered for submitter-local ids, or
//! promoted to `Critical` for RefSeq records that carry a taxon id.

use serde::{Deserialize, Serialize};

use super::finding::Severity;
use crate::model::AccessionClass;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessionPolicy {
    /// Base severity applies regardless of class.
    Fixed,
    /// One step up for INSD accessions (GenBank/EMBL/DDBJ and TPA).
    RaiseForInsd,
    /// One step down when the record only has local or general ids.
    LowerForLocal,
    /// `Critical` for RefSeq records with a taxon id.
    CriticalForRefSeqTaxon,
}

/// Apply `policy` to `base` for a record of class `class`.
pub fn severity_for(
    base: Severity,
    policy: AccessionPolicy,
    class: AccessionClass,
    has_taxon: bool,
) -> Severity {
    match policy {
        AccessionPolicy::Fixed => base,
        AccessionPolicy::RaiseForInsd if class.is_insd() => base.raised(),
        AccessionPolicy::RaiseForInsd => base,
        AccessionPolicy::LowerForLocal if class.is_local_only() => base.lowered(),
        AccessionPolicy::LowerForLocal => base,
        AccessionPolicy::CriticalForRefSeqTaxon if class == AccessionClass::RefSeq && has_taxon => {
            Severity::Critical
        }
        AccessionPolicy::CriticalForRefSeqTaxon => base,
    }
}
