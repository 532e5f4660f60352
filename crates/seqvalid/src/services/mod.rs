//! Collaborators the validator consults: taxonomy, institution codes,
//! country outlines and far-sequence fetch.

pub mod fetch;
pub mod geo;
pub mod institution;
pub mod remote;
pub mod taxonomy;

pub use fetch::{FetchOutcome, InMemoryFetcher, ProductCache, SequenceFetcher};
pub use geo::{
    CountryLocator, CountryStatus, LatLon, LatLonError, PolygonLocator, classify_country,
    country_part, parse_lat_lon,
};
pub use institution::{CodeLookup, Institution, InstitutionDictionary, VoucherKind};
pub use remote::EutilsTaxonomy;
pub use taxonomy::{
    StaticTaxonomy, TaxonMatch, TaxonRecord, TaxonReply, TaxonomyCache, TaxonomyService,
};
