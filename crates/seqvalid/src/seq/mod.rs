//! Residue-level primitives: alphabets, translation and run scanning.

pub mod alphabet;
pub mod nrun;
pub mod translate;

pub use alphabet::{complement, decode, invalid_residues, reverse_complement};
pub use nrun::{RunScan, scan};
pub use translate::{GeneticCode, translate};
