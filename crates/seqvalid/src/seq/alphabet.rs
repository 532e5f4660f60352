//! Residue alphabets: decoding packed data and residue legality.

use crate::error::{Result, ValidatorError};
use crate::model::SeqData;

const NA_LEGAL: &[u8] = b"ACGTMRWSYKVHDBN";
const IUPACAA_LEGAL: &[u8] = b"ABCDEFGHIKLMNPQRSTUVWXYZ*";
const NCBIEAA_LEGAL: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ*-";
const NCBI4NA: &[u8; 16] = b"-ACMGRSVTWYHKDBN";
const NCBI2NA: &[u8; 4] = b"ACGT";

/// Decode `data` into one ASCII residue per position.
///
/// Packed alphabets need the declared `length`, since the final byte may be
/// padded. Gap payloads decode to nothing.
pub fn decode(data: &SeqData, length: usize) -> Result<Vec<u8>> {
    match data {
        SeqData::Iupacna(s) | SeqData::Iupacaa(s) | SeqData::Ncbieaa(s) => Ok(s.as_bytes().to_vec()),
        SeqData::Ncbi2na(bytes) => {
            if bytes.len() * 4 < length {
                return Err(ValidatorError::InvalidData(format!(
                    "ncbi2na data holds {} bases, {} declared",
                    bytes.len() * 4,
                    length
                )));
            }
            Ok((0..length)
                .map(|i| {
                    let shift = 6 - 2 * (i % 4);
                    NCBI2NA[((bytes[i / 4] >> shift) & 0b11) as usize]
                })
                .collect())
        }
        SeqData::Ncbi4na(bytes) => {
            if bytes.len() * 2 < length {
                return Err(ValidatorError::InvalidData(format!(
                    "ncbi4na data holds {} bases, {} declared",
                    bytes.len() * 2,
                    length
                )));
            }
            Ok((0..length)
                .map(|i| {
                    let shift = if i % 2 == 0 { 4 } else { 0 };
                    NCBI4NA[((bytes[i / 2] >> shift) & 0x0f) as usize]
                })
                .collect())
        }
        SeqData::Gap(_) => Ok(Vec::new()),
    }
}

/// Number of residues the payload holds, where that can be known.
pub fn data_len(data: &SeqData) -> Option<usize> {
    match data {
        SeqData::Iupacna(s) | SeqData::Iupacaa(s) | SeqData::Ncbieaa(s) => Some(s.len()),
        SeqData::Ncbi2na(bytes) => Some(bytes.len() * 4),
        SeqData::Ncbi4na(bytes) => Some(bytes.len() * 2),
        SeqData::Gap(_) => None,
    }
}

/// Packed payloads can only be checked for being too short.
pub fn is_packed(data: &SeqData) -> bool {
    matches!(data, SeqData::Ncbi2na(_) | SeqData::Ncbi4na(_))
}

/// Positions (zero-based) and characters that the alphabet does not allow.
pub fn invalid_residues(data: &SeqData) -> Vec<(usize, char)> {
    let (text, legal) = match data {
        SeqData::Iupacna(s) => (s, NA_LEGAL),
        SeqData::Iupacaa(s) => (s, IUPACAA_LEGAL),
        SeqData::Ncbieaa(s) => (s, NCBIEAA_LEGAL),
        _ => return Vec::new(),
    };
    text.char_indices()
        .filter(|(_, c)| !c.is_ascii() || !legal.contains(&(*c as u8)))
        .collect()
}

pub fn complement(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'T' | b'U' => b'A',
        b'C' => b'G',
        b'G' => b'C',
        b'M' => b'K',
        b'K' => b'M',
        b'R' => b'Y',
        b'Y' => b'R',
        b'V' => b'B',
        b'B' => b'V',
        b'H' => b'D',
        b'D' => b'H',
        other => other,
    }
}

pub fn reverse_complement(bases: &[u8]) -> Vec<u8> {
    bases.iter().rev().map(|b| complement(*b)).collect()
}

/// Unambiguous bases a (possibly ambiguous) IUPAC code stands for.
pub fn expand_base(base: u8) -> &'static [u8] {
    match base {
        b'A' => b"A",
        b'C' => b"C",
        b'G' => b"G",
        b'T' | b'U' => b"T",
        b'M' => b"AC",
        b'R' => b"AG",
        b'W' => b"AT",
        b'S' => b"CG",
        b'Y' => b"CT",
        b'K' => b"GT",
        b'V' => b"ACG",
        b'H' => b"ACT",
        b'D' => b"AGT",
        b'B' => b"CGT",
        b'N' => b"ACGT",
        _ => b"",
    }
}

pub fn is_acgt(base: u8) -> bool {
    matches!(base, b'A' | b'C' | b'G' | b'T')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_ncbi2na() {
        // AC GT | AAAA
        let data = SeqData::Ncbi2na(vec![0b0001_1011, 0]);
        assert_eq!(decode(&data, 6).unwrap(), b"ACGTAA".to_vec());
        assert!(decode(&data, 9).is_err());
    }

    #[test]
    fn test_decode_ncbi4na() {
        let data = SeqData::Ncbi4na(vec![0x12, 0x4f]);
        assert_eq!(decode(&data, 4).unwrap(), b"ACGN".to_vec());
    }

    #[test]
    fn test_invalid_residues() {
        let data = SeqData::Iupacna("ACGTEFZ".into());
        let bad: Vec<char> = invalid_residues(&data).into_iter().map(|(_, c)| c).collect();
        assert_eq!(bad, vec!['E', 'F', 'Z']);
        assert!(invalid_residues(&SeqData::Iupacaa("MKLV*".into())).is_empty());
    }

    #[test]
    fn test_reverse_complement() {
        assert_eq!(reverse_complement(b"AACGTN"), b"NACGTT".to_vec());
        assert_eq!(expand_base(b'N').len(), 4);
    }
}
