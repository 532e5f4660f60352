//! seqvalid: rule-based validation of NCBI-style sequence records.
//!
//! A record is a tree of Bioseq-sets and Bioseqs carrying descriptors,
//! features, alignments and graphs. The validator walks it depth first,
//! runs every applicable rule family at each node and returns an ordered
//! list of findings, each with a severity, a stable error code, the best
//! accession of the offending record and a message.
//!
//! # Core Principles
//!
//! - **Findings, not failures**: an invalid record is the normal output,
//!   never an error
//! - **Deterministic**: the same record and options give the same findings
//!   in the same order
//! - **Injected lookups**: taxonomy, institution codes, country outlines and
//!   far sequences come from collaborators handed to the [`Validator`]
//!
//! # Example
//!
//! ```no_run
//! use seqvalid::{Options, SeqEntry, Validator};
//!
//! let text = std::fs::read_to_string("record.json").unwrap();
//! let entry: SeqEntry = serde_json::from_str(&text).unwrap();
//!
//! let validator = Validator::new();
//! let findings = validator.validate(&entry, Options::REQUIRE_ISSN);
//! for line in findings.to_lines() {
//!     println!("{}", line);
//! }
//! ```

pub mod config;
pub mod context;
pub mod diag;
pub mod error;
pub mod fixtures;
pub mod index;
pub mod model;
pub mod rules;
pub mod seq;
pub mod services;

mod engine;
mod validator;

pub use crate::validator::Validator;
pub use config::{Options, ValidatorConfig};
pub use diag::{ErrorCode, Finding, FindingList, Severity, SubmitterReport};
pub use error::{Result, ValidatorError};
pub use model::SeqEntry;
pub use rules::{RuleFamily, RuleSet};
