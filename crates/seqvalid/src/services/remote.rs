//! NCBI E-utilities taxonomy adapter.
//!
//! Each query costs one `esearch` call and, when exactly one taxon comes
//! back, one `esummary` call. Names with no hit are offered to `espell` for
//! a suggestion. Set `NCBI_EUTILS_URL` to point at a mirror.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, ValidatorError};

use super::taxonomy::{TaxonMatch, TaxonRecord, TaxonReply, TaxonomyService};

/// Default E-utilities base URL.
const DEFAULT_API_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

static CORRECTED_QUERY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<CorrectedQuery>([^<]*)</CorrectedQuery>").unwrap());

/// Remote taxonomy lookups over HTTP.
pub struct EutilsTaxonomy {
    client: Client,
    api_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    esearchresult: SearchResult,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

impl EutilsTaxonomy {
    /// Create an adapter with a 30 second timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(30))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("seqvalid/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ValidatorError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let api_url = std::env::var("NCBI_EUTILS_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        Ok(Self {
            client,
            api_url,
            api_key: std::env::var("NCBI_API_KEY").ok(),
        })
    }

    /// Point at a different server (a mirror or a test double).
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn get(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<reqwest::blocking::Response> {
        let url = format!("{}/{}", self.api_url, endpoint);
        let mut request = self.client.get(&url).query(params);
        if let Some(key) = &self.api_key {
            request = request.query(&[("api_key", key.as_str())]);
        }
        let response = request.send().map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                ValidatorError::Service(format!("Taxonomy service connection failure: {}", e))
            } else {
                ValidatorError::Http(e)
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            return Err(ValidatorError::Service(format!(
                "E-utilities error ({}): {}",
                status, error_text
            )));
        }
        Ok(response)
    }

    fn search(&self, name: &str) -> Result<Vec<u32>> {
        let term = format!("\"{}\"[Scientific Name] OR \"{}\"[Common Name]", name, name);
        let response: SearchResponse = self
            .get(
                "esearch.fcgi",
                &[("db", "taxonomy"), ("retmode", "json"), ("term", term.as_str())],
            )?
            .json()
            .map_err(|e| ValidatorError::Service(format!("Failed to parse esearch response: {}", e)))?;
        Ok(response
            .esearchresult
            .idlist
            .iter()
            .filter_map(|id| id.parse().ok())
            .collect())
    }

    fn summary(&self, taxid: u32) -> Result<TaxonRecord> {
        let id = taxid.to_string();
        let body: Value = self
            .get(
                "esummary.fcgi",
                &[("db", "taxonomy"), ("retmode", "json"), ("id", id.as_str())],
            )?
            .json()
            .map_err(|e| ValidatorError::Service(format!("Failed to parse esummary response: {}", e)))?;
        parse_summary(&body, taxid)
    }

    fn spell(&self, name: &str) -> Result<Option<String>> {
        let text = self
            .get("espell.fcgi", &[("db", "taxonomy"), ("term", name)])?
            .text()
            .map_err(ValidatorError::Http)?;
        Ok(CORRECTED_QUERY
            .captures(&text)
            .map(|c| c[1].trim().to_string())
            .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case(name)))
    }

    fn resolve(&self, query: &str) -> Result<TaxonReply> {
        let ids = self.search(query)?;
        match ids.as_slice() {
            [] => {
                let matched = match self.spell(query)? {
                    Some(suggestion) => TaxonMatch::Misspelled { suggestion },
                    None => TaxonMatch::NotFound,
                };
                Ok(TaxonReply {
                    query: query.to_string(),
                    matched,
                    record: None,
                })
            }
            [taxid] => {
                let record = self.summary(*taxid)?;
                let matched = if record.scientific_name == query
                    || record.common_names.iter().any(|c| c.eq_ignore_ascii_case(query))
                {
                    TaxonMatch::Exact
                } else if record.scientific_name.eq_ignore_ascii_case(query) {
                    TaxonMatch::CaseMismatch {
                        correct: record.scientific_name.clone(),
                    }
                } else {
                    TaxonMatch::Misspelled {
                        suggestion: record.scientific_name.clone(),
                    }
                };
                Ok(TaxonReply {
                    query: query.to_string(),
                    matched,
                    record: Some(record),
                })
            }
            many => Ok(TaxonReply {
                query: query.to_string(),
                matched: TaxonMatch::Ambiguous {
                    candidates: many.iter().map(|id| id.to_string()).collect(),
                },
                record: None,
            }),
        }
    }
}

/// Pull a [`TaxonRecord`] out of an esummary JSON document.
fn parse_summary(body: &Value, taxid: u32) -> Result<TaxonRecord> {
    let doc = body
        .get("result")
        .and_then(|r| r.get(taxid.to_string()))
        .ok_or_else(|| ValidatorError::Service(format!("esummary has no document for taxid {}", taxid)))?;
    let field = |name: &str| doc.get(name).and_then(Value::as_str).unwrap_or_default().to_string();

    let scientific_name = field("scientificname");
    if scientific_name.is_empty() {
        return Err(ValidatorError::MissingField(format!("scientificname for taxid {}", taxid)));
    }
    let common = field("commonname");
    Ok(TaxonRecord {
        taxid,
        scientific_name,
        rank: field("rank"),
        lineage: String::new(),
        division: field("division"),
        gcode: 1,
        mgcode: 0,
        pgcode: None,
        common_names: if common.is_empty() { Vec::new() } else { vec![common] },
        parent_taxid: None,
    })
}

impl TaxonomyService for EutilsTaxonomy {
    fn name(&self) -> &str {
        "ncbi-eutils"
    }

    fn lookup(&self, queries: &[String]) -> Result<Vec<TaxonReply>> {
        let mut replies = Vec::with_capacity(queries.len());
        for query in queries {
            match self.resolve(query) {
                Ok(reply) => replies.push(reply),
                // one bad name should not sink the batch
                Err(ValidatorError::MissingField(msg)) => {
                    log::warn!("taxonomy reply for '{}' unusable: {}", query, msg);
                    replies.push(TaxonReply::not_found(query.clone()));
                }
                Err(e) => return Err(e),
            }
        }
        Ok(replies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_summary() {
        let body = json!({
            "result": {
                "uids": ["9606"],
                "9606": {
                    "uid": "9606",
                    "rank": "species",
                    "division": "primates",
                    "scientificname": "Homo sapiens",
                    "commonname": "human"
                }
            }
        });
        let record = parse_summary(&body, 9606).unwrap();
        assert_eq!(record.scientific_name, "Homo sapiens");
        assert_eq!(record.common_names, vec!["human".to_string()]);
        assert_eq!(record.rank, "species");
    }

    #[test]
    fn test_parse_summary_missing_document() {
        let body = json!({ "result": { "uids": [] } });
        assert!(matches!(parse_summary(&body, 1), Err(ValidatorError::Service(_))));
    }

    #[test]
    fn test_corrected_query_pattern() {
        let xml = "<eSpellResult><Query>homo sapien</Query><CorrectedQuery>homo sapiens</CorrectedQuery></eSpellResult>";
        let caps = CORRECTED_QUERY.captures(xml).unwrap();
        assert_eq!(&caps[1], "homo sapiens");
    }

    #[test]
    fn test_unreachable_server_is_service_error() {
        let taxonomy = EutilsTaxonomy::with_timeout(Duration::from_millis(200))
            .unwrap()
            .with_api_url("http://127.0.0.1:9");
        let err = taxonomy.lookup(&["Homo sapiens".to_string()]).unwrap_err();
        assert!(matches!(err, ValidatorError::Service(_) | ValidatorError::Http(_)));
    }
}
