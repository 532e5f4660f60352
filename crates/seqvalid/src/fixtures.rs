//! Small, valid records to build tests and benchmarks from.
//!
//! Each builder returns a record that is well formed for the rules it is
//! meant to exercise; tests break one thing at a time.

use crate::model::{
    Affil, AuthList, Author, BioSource, Biomol, Bioseq, BioseqSet, CitSub, Completeness, Date,
    DeltaSeq, Descriptor, FeatData, GeneRef, Genome, MolInfo, MolType, OrgName, OrgRef, ProtRef,
    Pub, Pubdesc, RnaRef, RnaType, SeqAnnot, SeqData, SeqEntry, SeqFeat, SeqId, SeqInst,
    SeqLiteral, SeqLoc, SetClass, Tech,
};

/// Lineage of *Homo sapiens* as the taxonomy service reports it.
pub const HUMAN_LINEAGE: &str = "Eukaryota; Metazoa; Chordata; Craniata; Vertebrata; Euteleostomi; Mammalia; Eutheria; Euarchontoglires; Primates; Haplorrhini; Catarrhini; Hominidae; Homo";

/// 60 bases; the first 27 are an ORF (`MPRKTEIN*`).
pub const CODING_NUC: &str = "ATGCCCAGAAAAACAGAGATAAACTAAGGGATGCCCAGAAAAACAGAGATAAACTAAGGG";

/// Conceptual translation of the first 27 bases of [`CODING_NUC`].
pub const CODING_PROT: &str = "MPRKTEIN";

pub fn human() -> OrgRef {
    let mut org = OrgRef::new("Homo sapiens").with_taxid(9606);
    org.orgname = Some(OrgName {
        lineage: Some(HUMAN_LINEAGE.to_string()),
        div: Some("PRI".to_string()),
        gcode: Some(1),
        mgcode: Some(2),
        ..Default::default()
    });
    org
}

pub fn human_source() -> BioSource {
    BioSource::new(human()).with_genome(Genome::Genomic)
}

pub fn submission_pub() -> Pubdesc {
    Pubdesc::new(vec![Pub::Sub(CitSub {
        authors: AuthList {
            names: vec![Author::new("Doe", "Jane")],
            affil: Some(Affil {
                affil: Some("Example University".to_string()),
                country: Some("USA".to_string()),
            }),
        },
        date: Some(Date::ymd(2020, 1, 15)),
        descr: None,
    })])
}

pub fn genomic_molinfo() -> MolInfo {
    MolInfo::new(Biomol::Genomic)
}

pub fn protein_molinfo() -> MolInfo {
    MolInfo::new(Biomol::Peptide)
        .with_tech(Tech::ConceptTrans)
        .with_completeness(Completeness::Complete)
}

pub fn nuc_id() -> SeqId {
    SeqId::local("nuc")
}

pub fn prot_id() -> SeqId {
    SeqId::local("prot")
}

/// A raw DNA Bioseq with residues, no descriptors.
pub fn raw_dna(id: SeqId, residues: &str) -> Bioseq {
    Bioseq::new(
        vec![id],
        SeqInst::raw(MolType::Dna, SeqData::Iupacna(residues.to_string()), residues.len()),
    )
}

pub fn raw_protein(id: SeqId, residues: &str) -> Bioseq {
    Bioseq::new(
        vec![id],
        SeqInst::raw(MolType::Aa, SeqData::Iupacaa(residues.to_string()), residues.len()),
    )
}

/// One genomic nucleotide with organism, publication and MolInfo.
pub fn good_nucleotide() -> SeqEntry {
    let mut seq = raw_dna(nuc_id(), CODING_NUC);
    seq.descr = vec![
        Descriptor::Source(human_source()),
        Descriptor::MolInfo(genomic_molinfo()),
        Descriptor::Pub(submission_pub()),
    ];
    SeqEntry::Seq(seq)
}

/// CDS on the nucleotide covering the ORF, pointing at `lcl|prot`.
pub fn coding_region() -> SeqFeat {
    SeqFeat::new(
        FeatData::Cdregion(Default::default()),
        SeqLoc::int(nuc_id(), 0, 26),
    )
    .with_product(SeqLoc::Whole(prot_id()))
}

/// The protein of a nuc-prot set, with its full-length Prot-ref.
pub fn coding_protein() -> Bioseq {
    let mut prot = raw_protein(prot_id(), CODING_PROT);
    prot.descr = vec![Descriptor::MolInfo(protein_molinfo())];
    prot.annot.push(SeqAnnot::ftable(vec![SeqFeat::new(
        FeatData::Prot(ProtRef::named("hypothetical protein")),
        SeqLoc::int(prot_id(), 0, CODING_PROT.len() - 1),
    )]));
    prot
}

/// Nuc-prot set: nucleotide with one CDS and its translated protein.
pub fn good_nuc_prot() -> SeqEntry {
    let mut nuc = raw_dna(nuc_id(), CODING_NUC);
    nuc.descr = vec![Descriptor::MolInfo(genomic_molinfo())];
    nuc.annot.push(SeqAnnot::ftable(vec![coding_region()]));

    let mut set = BioseqSet::new(SetClass::NucProt, vec![nuc.into(), coding_protein().into()]);
    set.descr = vec![
        Descriptor::Source(human_source()),
        Descriptor::Pub(submission_pub()),
    ];
    SeqEntry::Set(set)
}

/// Delta Bioseq `[12 bases, gap 10, 10 bases]`, declared length 32.
pub fn delta_sequence() -> Bioseq {
    Bioseq::new(
        vec![SeqId::local("delta")],
        SeqInst::delta(
            MolType::Dna,
            vec![
                DeltaSeq::Literal(SeqLiteral::data("ATGATGATGCCC")),
                DeltaSeq::Literal(SeqLiteral::gap(10)),
                DeltaSeq::Literal(SeqLiteral::data("CCCATGATGA")),
            ],
            32,
        ),
    )
}

/// [`delta_sequence`] with the descriptors a complete record needs.
pub fn delta_entry() -> SeqEntry {
    let mut seq = delta_sequence();
    seq.descr = vec![
        Descriptor::Source(human_source()),
        Descriptor::MolInfo(genomic_molinfo()),
        Descriptor::Pub(submission_pub()),
    ];
    SeqEntry::Seq(seq)
}

/// Genomic product set: a contig with gene, mRNA and CDS, plus a nuc-prot
/// set holding the mRNA product and the protein.
pub fn genomic_product_set() -> SeqEntry {
    let contig_id = SeqId::local("contig");
    let mrna_id = SeqId::local("mrna");

    let mut contig = raw_dna(contig_id.clone(), CODING_NUC);
    contig.descr = vec![Descriptor::MolInfo(genomic_molinfo())];
    contig.annot.push(SeqAnnot::ftable(vec![
        SeqFeat::new(
            FeatData::Gene(GeneRef::locus("abc").with_locus_tag("ABC_0001")),
            SeqLoc::int(contig_id.clone(), 0, 26),
        ),
        SeqFeat::new(
            FeatData::Rna(RnaRef::new(RnaType::Mrna).with_name("hypothetical protein")),
            SeqLoc::int(contig_id.clone(), 0, 26),
        )
        .with_product(SeqLoc::Whole(mrna_id.clone())),
        SeqFeat::new(FeatData::Cdregion(Default::default()), SeqLoc::int(contig_id, 0, 26))
            .with_product(SeqLoc::Whole(prot_id())),
    ]));

    let mut mrna = Bioseq::new(
        vec![mrna_id],
        SeqInst::raw(MolType::Rna, SeqData::Iupacna(CODING_NUC[..27].to_string()), 27),
    );
    mrna.descr = vec![Descriptor::MolInfo(MolInfo::new(Biomol::Mrna))];

    let nuc_prot = BioseqSet::new(SetClass::NucProt, vec![mrna.into(), coding_protein().into()]);
    let mut set = BioseqSet::new(SetClass::GenProdSet, vec![contig.into(), nuc_prot.into()]);
    set.descr = vec![
        Descriptor::Source(human_source()),
        Descriptor::Pub(submission_pub()),
    ];
    SeqEntry::Set(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seq::{GeneticCode, translate};

    #[test]
    fn test_coding_fixture_translates() {
        let protein = translate(&CODING_NUC.as_bytes()[..27], GeneticCode::standard(), true, &[]);
        assert_eq!(protein, format!("{}*", CODING_PROT).into_bytes());
    }

    #[test]
    fn test_fixture_shapes() {
        assert_eq!(good_nuc_prot().bioseqs().len(), 2);
        assert_eq!(genomic_product_set().bioseqs().len(), 3);
        assert_eq!(delta_sequence().inst.len(), 32);
        assert_eq!(good_nucleotide().descr().len(), 3);
    }
}
