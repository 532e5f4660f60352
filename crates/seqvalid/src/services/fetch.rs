//! Far-sequence fetch.
//!
//! Consulted only when `Options::FAR_FETCH_PRODUCTS` is set; otherwise rules
//! that need a sequence outside the record skip the check.

use std::collections::HashMap;

use crate::error::Result;
use crate::model::{Bioseq, SeqId};

/// Resolves sequences that are not packaged in the record.
pub trait SequenceFetcher: Send + Sync {
    /// `Ok(None)` means the id is unknown; `Err` means the fetch failed.
    fn fetch(&self, id: &SeqId) -> Result<Option<Bioseq>>;
}

/// Fetcher backed by a map, keyed by version-less id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFetcher {
    seqs: HashMap<String, Bioseq>,
}

impl InMemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bioseq(mut self, bioseq: Bioseq) -> Self {
        self.insert(bioseq);
        self
    }

    pub fn insert(&mut self, bioseq: Bioseq) {
        for id in &bioseq.ids {
            self.seqs.insert(id.key(), bioseq.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.seqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seqs.is_empty()
    }
}

impl SequenceFetcher for InMemoryFetcher {
    fn fetch(&self, id: &SeqId) -> Result<Option<Bioseq>> {
        Ok(self.seqs.get(&id.key()).cloned())
    }
}

/// What a far fetch produced for one id.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Found(Bioseq),
    Unknown,
    Failed(String),
}

/// Far products fetched once before traversal, keyed by version-less id.
#[derive(Debug, Default)]
pub struct ProductCache {
    seqs: HashMap<String, FetchOutcome>,
}

impl ProductCache {
    /// A cache that knows nothing; far products cannot be verified.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Fetch every id once. Failures are kept, not raised, so each rule
    /// that needs the sequence can report them.
    pub fn fetch(fetcher: &dyn SequenceFetcher, ids: &[&SeqId]) -> Self {
        let mut seqs = HashMap::new();
        for id in ids {
            let key = id.key();
            if seqs.contains_key(&key) {
                continue;
            }
            let outcome = match fetcher.fetch(id) {
                Ok(Some(seq)) => FetchOutcome::Found(seq),
                Ok(None) => FetchOutcome::Unknown,
                Err(e) => {
                    log::warn!("far fetch of {} failed: {}", id, e);
                    FetchOutcome::Failed(e.to_string())
                }
            };
            seqs.insert(key, outcome);
        }
        log::debug!("fetched {} far products", seqs.len());
        Self { seqs }
    }

    pub fn get(&self, id: &SeqId) -> Option<&FetchOutcome> {
        self.seqs.get(&id.key())
    }

    pub fn bioseq(&self, id: &SeqId) -> Option<&Bioseq> {
        match self.get(id)? {
            FetchOutcome::Found(seq) => Some(seq),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.seqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seqs.is_empty()
    }
}
