//! Read-only record model consumed by the validator.
//!
//! Closed enums mirror the tagged unions of the sequence record schema, so
//! every rule that dispatches on them is checked for exhaustiveness.

pub mod align;
pub mod bioseq;
pub mod descr;
pub mod entry;
pub mod feature;
pub mod graph;
pub mod location;
pub mod seqid;

pub use align::{AlignSegs, AlignType, DenseSeg, SeqAlign};
pub use bioseq::{
    AnnotData, Bioseq, DeltaSeq, GapType, IntFuzz, MolType, SeqAnnot, SeqData, SeqExt, SeqGap,
    SeqInst, SeqLiteral, SeqRepr, Topology,
};
pub use descr::{
    Affil, AuthList, Author, BioSource, Biomol, CitArt, CitGen, CitJour, CitSub, Completeness,
    Date, DateStd, Descriptor, GbBlock, Genome, Imprint, MolInfo, OrgMod, OrgModType, OrgName,
    OrgRef, Origin, Pub, Pubdesc, SubSource, SubSourceType, Tech, UserData, UserField, UserObject,
};
pub use entry::{BioseqSet, SeqEntry, SetClass};
pub use feature::{
    Cdregion, CodeBreak, FeatData, FeatId, Frame, GbQual, GeneRef, ImpFeat, ProtProcessed, ProtRef,
    RnaExt, RnaRef, RnaType, SeqFeat, SeqFeatXref, TrnaExt,
};
pub use graph::{ByteGraph, GraphData, IntGraph, RealGraph, SeqGraph};
pub use location::{SeqBond, SeqInterval, SeqLoc, SeqPoint, Span, Strand};
pub use seqid::{AccessionClass, DbTag, ObjectId, PatentSeqId, PdbSeqId, SeqId, TextSeqId};
