//! NCBI genetic codes and codon translation.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use super::alphabet::expand_base;

/// A genetic code in NCBI table form.
///
/// Both strings hold 64 entries with codons ordered TCAG by first, second
/// and third base. `starts` marks initiation codons with `M`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneticCode {
    pub id: u8,
    pub name: &'static str,
    aas: &'static [u8; 64],
    starts: &'static [u8; 64],
}

static CODES: Lazy<HashMap<u8, GeneticCode>> = Lazy::new(|| {
    let table: [(u8, &str, &[u8; 64], &[u8; 64]); 19] = [
        (1, "Standard",
            b"FFLLSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG",
            b"---M------**--*----M---------------M----------------------------"),
        (2, "Vertebrate Mitochondrial",
            b"FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIMMTTTTNNKKSS**VVVVAAAADDEEGGGG",
            b"----------**--------------------MMMM----------**---M------------"),
        (3, "Yeast Mitochondrial",
            b"FFLLSSSSYY**CCWWTTTTPPPPHHQQRRRRIIMMTTTTNNKKSSRRVVVVAAAADDEEGGGG",
            b"----------**----------------------MM---------------M------------"),
        (4, "Mold Mitochondrial",
            b"FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG",
            b"--MM------**-------M------------MMMM---------------M------------"),
        (5, "Invertebrate Mitochondrial",
            b"FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIMMTTTTNNKKSSSSVVVVAAAADDEEGGGG",
            b"---M------**--------------------MMMM---------------M------------"),
        (6, "Ciliate Nuclear",
            b"FFLLSSSSYYQQCC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG",
            b"--------------*--------------------M----------------------------"),
        (9, "Echinoderm Mitochondrial",
            b"FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIIMTTTTNNNKSSSSVVVVAAAADDEEGGGG",
            b"----------**-----------------------M---------------M------------"),
        (10, "Euplotid Nuclear",
            b"FFLLSSSSYY**CCCWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG",
            b"----------**-----------------------M----------------------------"),
        (11, "Bacterial, Archaeal and Plant Plastid",
            b"FFLLSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG",
            b"---M------**--*----M------------MMMM---------------M------------"),
        (12, "Alternative Yeast Nuclear",
            b"FFLLSSSSYY**CC*WLLLSPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG",
            b"----------**--*----M---------------M----------------------------"),
        (13, "Ascidian Mitochondrial",
            b"FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIMMTTTTNNKKSSGGVVVVAAAADDEEGGGG",
            b"---M------**----------------------MM---------------M------------"),
        (14, "Alternative Flatworm Mitochondrial",
            b"FFLLSSSSYYY*CCWWLLLLPPPPHHQQRRRRIIIMTTTTNNNKSSSSVVVVAAAADDEEGGGG",
            b"-----------*-----------------------M----------------------------"),
        (15, "Blepharisma Macronuclear",
            b"FFLLSSSSYY*QCC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG",
            b"----------*---*--------------------M----------------------------"),
        (16, "Chlorophycean Mitochondrial",
            b"FFLLSSSSYY*LCC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG",
            b"----------*---*--------------------M----------------------------"),
        (21, "Trematode Mitochondrial",
            b"FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIMMTTTTNNNKSSSSVVVVAAAADDEEGGGG",
            b"----------**-----------------------M---------------M------------"),
        (22, "Scenedesmus obliquus Mitochondrial",
            b"FFLLSS*SYY*LCC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG",
            b"------*---*---*--------------------M----------------------------"),
        (23, "Thraustochytrium Mitochondrial",
            b"FF*LSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG",
            b"--*-------**--*-----------------M--M---------------M------------"),
        (24, "Rhabdopleuridae Mitochondrial",
            b"FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSSKVVVVAAAADDEEGGGG",
            b"---M------**-------M---------------M---------------M------------"),
        (25, "Candidate Division SR1 and Gracilibacteria",
            b"FFLLSSSSYY**CCGWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG",
            b"---M------**-----------------------M---------------M------------"),
    ];
    table
        .into_iter()
        .map(|(id, name, aas, starts)| (id, GeneticCode { id, name, aas, starts }))
        .collect()
});

fn base_index(base: u8) -> Option<usize> {
    match base {
        b'T' | b'U' => Some(0),
        b'C' => Some(1),
        b'A' => Some(2),
        b'G' => Some(3),
        _ => None,
    }
}

fn codon_index(codon: [u8; 3]) -> Option<usize> {
    Some(base_index(codon[0])? * 16 + base_index(codon[1])? * 4 + base_index(codon[2])?)
}

/// All unambiguous codons an ambiguous codon may stand for.
fn expand_codon(codon: [u8; 3]) -> Vec<usize> {
    let mut out = Vec::new();
    for a in expand_base(codon[0]) {
        for b in expand_base(codon[1]) {
            for c in expand_base(codon[2]) {
                if let Some(idx) = codon_index([*a, *b, *c]) {
                    out.push(idx);
                }
            }
        }
    }
    out
}

impl GeneticCode {
    /// Look up a code by NCBI id.
    pub fn by_id(id: u8) -> Option<&'static GeneticCode> {
        CODES.get(&id)
    }

    pub fn standard() -> &'static GeneticCode {
        &CODES[&1]
    }

    pub fn ids() -> Vec<u8> {
        let mut ids: Vec<u8> = CODES.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Translate one codon; ambiguous bases resolve when every expansion
    /// agrees, otherwise `X`.
    pub fn translate_codon(&self, codon: [u8; 3]) -> u8 {
        let expansions = expand_codon(codon);
        let Some(first) = expansions.first() else {
            return b'X';
        };
        let aa = self.aas[*first];
        if expansions.iter().all(|idx| self.aas[*idx] == aa) {
            aa
        } else {
            b'X'
        }
    }

    /// True when every expansion of the codon is an initiation codon.
    pub fn is_start(&self, codon: [u8; 3]) -> bool {
        let expansions = expand_codon(codon);
        !expansions.is_empty() && expansions.iter().all(|idx| self.starts[*idx] == b'M')
    }
}

/// Translate a coding sequence codon by codon.
///
/// `first_is_start` renders a legal initiation codon as `M`. `code_breaks`
/// holds (codon index, amino acid) overrides. A trailing partial codon is
/// dropped.
pub fn translate(
    bases: &[u8],
    code: &GeneticCode,
    first_is_start: bool,
    code_breaks: &[(usize, u8)],
) -> Vec<u8> {
    bases
        .chunks_exact(3)
        .enumerate()
        .map(|(i, chunk)| {
            let codon = [chunk[0], chunk[1], chunk[2]];
            if let Some((_, aa)) = code_breaks.iter().find(|(idx, _)| *idx == i) {
                return *aa;
            }
            if i == 0 && first_is_start && code.is_start(codon) {
                return b'M';
            }
            code.translate_codon(codon)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_well_formed() {
        for id in GeneticCode::ids() {
            let code = GeneticCode::by_id(id).unwrap();
            assert!(code.starts.iter().all(|c| matches!(c, b'M' | b'-' | b'*')));
        }
        assert!(GeneticCode::by_id(7).is_none());
    }

    #[test]
    fn test_standard_code() {
        let code = GeneticCode::standard();
        assert_eq!(code.translate_codon(*b"ATG"), b'M');
        assert_eq!(code.translate_codon(*b"TGA"), b'*');
        assert!(code.is_start(*b"ATG"));
        assert!(code.is_start(*b"CTG"));
        assert!(!code.is_start(*b"AAA"));
    }

    #[test]
    fn test_mito_code_reads_tga_as_trp() {
        let code = GeneticCode::by_id(2).unwrap();
        assert_eq!(code.translate_codon(*b"TGA"), b'W');
        assert_eq!(code.translate_codon(*b"AGA"), b'*');
    }

    #[test]
    fn test_ambiguous_codons() {
        let code = GeneticCode::standard();
        // GGN is always glycine
        assert_eq!(code.translate_codon(*b"GGN"), b'G');
        assert_eq!(code.translate_codon(*b"NNN"), b'X');
        assert_eq!(code.translate_codon(*b"TAR"), b'*');
    }

    #[test]
    fn test_translate_with_breaks() {
        let code = GeneticCode::standard();
        let protein = translate(b"CTGAAATGATAA", code, true, &[(2, b'U')]);
        assert_eq!(protein, b"MKU*".to_vec());
        let protein = translate(b"CTGAAA", code, false, &[]);
        assert_eq!(protein, b"LK".to_vec());
    }
}
