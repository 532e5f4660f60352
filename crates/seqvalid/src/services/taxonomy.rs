//! Taxonomy name resolution.
//!
//! The validator asks a [`TaxonomyService`] about every organism name and
//! specific-host value in a record, in one batch, before traversal starts.
//! Replies are correlated by query string, never by position.
//!
//! [`StaticTaxonomy`] answers from memory: a built-in set of common
//! organisms, optionally replaced by NCBI taxonomy dump files.
//!
//! ```ignore
//! use seqvalid::services::StaticTaxonomy;
//!
//! // Built-in organisms
//! let taxonomy = StaticTaxonomy::new();
//!
//! // Or load from NCBI dump files
//! let taxonomy = StaticTaxonomy::from_ncbi_dump("taxdump/names.dmp", Some("taxdump/nodes.dmp"))?;
//! ```

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidatorError};

/// A taxon as known to the taxonomy database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonRecord {
    pub taxid: u32,
    pub scientific_name: String,
    /// Taxonomic rank (species, genus, ...).
    pub rank: String,
    /// Semicolon separated, root first, excluding the taxon itself.
    #[serde(default)]
    pub lineage: String,
    /// GenBank division code (PRI, BCT, ...).
    #[serde(default)]
    pub division: String,
    #[serde(default = "default_gcode")]
    pub gcode: u8,
    #[serde(default)]
    pub mgcode: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pgcode: Option<u8>,
    #[serde(default)]
    pub common_names: Vec<String>,
    #[serde(default)]
    pub parent_taxid: Option<u32>,
}

fn default_gcode() -> u8 {
    1
}

/// How a query matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaxonMatch {
    /// Exact scientific or common name.
    Exact,
    /// Matches apart from capitalization.
    CaseMismatch { correct: String },
    /// Close to a known name.
    Misspelled { suggestion: String },
    /// Several taxa carry this name, or it only names a genus.
    Ambiguous { candidates: Vec<String> },
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonReply {
    pub query: String,
    pub matched: TaxonMatch,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<TaxonRecord>,
}

impl TaxonReply {
    pub fn not_found(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            matched: TaxonMatch::NotFound,
            record: None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self.matched, TaxonMatch::Exact)
    }
}

/// Batched taxonomy lookup.
///
/// Implementations may answer in any order and may leave names out; a
/// missing name means "not found". An `Err`, or an empty reply to a
/// non-empty request, means the service itself failed.
pub trait TaxonomyService: Send + Sync {
    /// Get the service name for logging.
    fn name(&self) -> &str;

    fn lookup(&self, queries: &[String]) -> Result<Vec<TaxonReply>>;
}

/// Statistics about loaded taxonomy data.
#[derive(Debug, Clone, Default)]
pub struct TaxonomyStats {
    pub total_taxa: usize,
    pub species_count: usize,
    pub genus_count: usize,
    pub abbreviation_count: usize,
    /// Data source description.
    pub source: String,
}

/// In-memory taxonomy.
#[derive(Debug, Clone)]
pub struct StaticTaxonomy {
    /// Common abbreviations and their expansions.
    abbreviations: HashMap<String, String>,
    /// Taxids by lowercase scientific or common name.
    names: HashMap<String, Vec<u32>>,
    taxid_index: HashMap<u32, TaxonRecord>,
    stats: TaxonomyStats,
}

impl StaticTaxonomy {
    /// Create a taxonomy with the built-in organisms.
    pub fn new() -> Self {
        let mut taxonomy = Self::empty("built-in");
        taxonomy.load_common_abbreviations();
        taxonomy.load_common_organisms();
        taxonomy.update_stats();
        taxonomy
    }

    fn empty(source: impl Into<String>) -> Self {
        Self {
            abbreviations: HashMap::new(),
            names: HashMap::new(),
            taxid_index: HashMap::new(),
            stats: TaxonomyStats {
                source: source.into(),
                ..Default::default()
            },
        }
    }

    /// Build from NCBI taxonomy dump files.
    ///
    /// `nodes.dmp` supplies rank, parent, division and genetic codes; without
    /// it records carry names only.
    pub fn from_ncbi_dump(
        names_path: impl AsRef<Path>,
        nodes_path: Option<impl AsRef<Path>>,
    ) -> Result<Self> {
        let names_path = names_path.as_ref();
        let mut taxonomy = Self::empty(format!("NCBI dump: {}", names_path.display()));

        let nodes = match nodes_path {
            Some(path) => parse_nodes_dmp(path.as_ref())?,
            None => HashMap::new(),
        };
        let (scientific, common) = parse_names_dmp(names_path)?;

        for (taxid, name) in &scientific {
            let node = nodes.get(taxid);
            let record = TaxonRecord {
                taxid: *taxid,
                scientific_name: name.clone(),
                rank: node.map(|n| n.rank.clone()).unwrap_or_else(|| "no rank".to_string()),
                lineage: lineage_of(*taxid, &nodes, &scientific),
                division: node.map(|n| division_code(n.division).to_string()).unwrap_or_default(),
                gcode: node.map(|n| n.gcode).unwrap_or(1),
                mgcode: node.map(|n| n.mgcode).unwrap_or(0),
                pgcode: None,
                common_names: common.get(taxid).cloned().unwrap_or_default(),
                parent_taxid: node.map(|n| n.parent).filter(|p| p != taxid),
            };
            taxonomy.insert(record);
        }

        taxonomy.load_common_abbreviations();
        taxonomy.update_stats();
        log::debug!(
            "loaded {} taxa from {}",
            taxonomy.stats.total_taxa,
            names_path.display()
        );
        Ok(taxonomy)
    }

    /// Add or replace a taxon.
    pub fn insert(&mut self, record: TaxonRecord) {
        let mut keys = vec![record.scientific_name.to_lowercase()];
        keys.extend(record.common_names.iter().map(|c| c.to_lowercase()));
        for key in keys {
            let ids = self.names.entry(key).or_default();
            if !ids.contains(&record.taxid) {
                ids.push(record.taxid);
            }
        }
        self.taxid_index.insert(record.taxid, record);
    }

    fn update_stats(&mut self) {
        self.stats.total_taxa = self.taxid_index.len();
        self.stats.abbreviation_count = self.abbreviations.len();
        self.stats.species_count = self.taxid_index.values().filter(|e| e.rank == "species").count();
        self.stats.genus_count = self.taxid_index.values().filter(|e| e.rank == "genus").count();
    }

    pub fn stats(&self) -> &TaxonomyStats {
        &self.stats
    }

    pub fn lookup_by_taxid(&self, taxid: u32) -> Option<&TaxonRecord> {
        self.taxid_index.get(&taxid)
    }

    pub fn organism_count(&self) -> usize {
        self.taxid_index.len()
    }

    pub fn expand_abbreviation(&self, value: &str) -> Option<&str> {
        self.abbreviations.get(&value.to_lowercase()).map(|s| s.as_str())
    }

    fn records_named(&self, lower: &str) -> Vec<&TaxonRecord> {
        self.names
            .get(lower)
            .map(|ids| ids.iter().filter_map(|id| self.taxid_index.get(id)).collect())
            .unwrap_or_default()
    }

    /// Resolve a single name.
    pub fn resolve(&self, query: &str) -> TaxonReply {
        let name = query.split_whitespace().collect::<Vec<_>>().join(" ");
        if name.is_empty() {
            return TaxonReply::not_found(query);
        }
        let lower = name.to_lowercase();

        let hits = self.records_named(&lower);
        match hits.as_slice() {
            [record] => {
                let exact = record.scientific_name == name
                    || record.common_names.iter().any(|c| *c == name);
                let matched = if exact {
                    TaxonMatch::Exact
                } else if record.common_names.iter().any(|c| c.to_lowercase() == lower) {
                    // common names are not case sensitive
                    TaxonMatch::Exact
                } else {
                    TaxonMatch::CaseMismatch {
                        correct: record.scientific_name.clone(),
                    }
                };
                return TaxonReply {
                    query: query.to_string(),
                    matched,
                    record: Some((*record).clone()),
                };
            }
            [] => {}
            many => {
                let mut candidates: Vec<String> = many
                    .iter()
                    .map(|r| format!("{} ({})", r.scientific_name, r.taxid))
                    .collect();
                candidates.sort();
                return TaxonReply {
                    query: query.to_string(),
                    matched: TaxonMatch::Ambiguous { candidates },
                    record: None,
                };
            }
        }

        if let Some(expanded) = self.expand_abbreviation(&name) {
            if let Some(record) = self.records_named(&expanded.to_lowercase()).first() {
                return TaxonReply {
                    query: query.to_string(),
                    matched: TaxonMatch::Misspelled {
                        suggestion: record.scientific_name.clone(),
                    },
                    record: Some((*record).clone()),
                };
            }
        }

        // "Genus sp." only narrows to a genus
        if let Some(genus) = lower.strip_suffix(" sp.").or_else(|| lower.strip_suffix(" sp")) {
            let genera = self.records_named(genus);
            if !genera.is_empty() {
                return TaxonReply {
                    query: query.to_string(),
                    matched: TaxonMatch::Ambiguous {
                        candidates: genera.iter().map(|g| g.scientific_name.clone()).collect(),
                    },
                    record: None,
                };
            }
        }

        if let Some((record, distance)) = self.fuzzy_match(&lower) {
            if distance <= 2 {
                return TaxonReply {
                    query: query.to_string(),
                    matched: TaxonMatch::Misspelled {
                        suggestion: record.scientific_name.clone(),
                    },
                    record: Some(record.clone()),
                };
            }
        }

        TaxonReply::not_found(query)
    }

    fn fuzzy_match(&self, lower: &str) -> Option<(&TaxonRecord, usize)> {
        let mut best: Option<(&TaxonRecord, usize)> = None;
        // sorted for a deterministic pick among equal distances
        let mut ids: Vec<&u32> = self.taxid_index.keys().collect();
        ids.sort_unstable();
        for id in ids {
            let record = &self.taxid_index[id];
            let distance = levenshtein(lower, &record.scientific_name.to_lowercase());
            if distance <= 3 && best.is_none_or(|(_, d)| distance < d) {
                best = Some((record, distance));
            }
        }
        best
    }

    fn load_common_abbreviations(&mut self) {
        let abbrevs = [
            ("E. coli", "Escherichia coli"),
            ("S. aureus", "Staphylococcus aureus"),
            ("B. subtilis", "Bacillus subtilis"),
            ("P. aeruginosa", "Pseudomonas aeruginosa"),
            ("S. cerevisiae", "Saccharomyces cerevisiae"),
            ("C. elegans", "Caenorhabditis elegans"),
            ("D. melanogaster", "Drosophila melanogaster"),
            ("M. musculus", "Mus musculus"),
            ("H. sapiens", "Homo sapiens"),
            ("A. thaliana", "Arabidopsis thaliana"),
        ];

        for (abbrev, full) in abbrevs {
            self.abbreviations.insert(abbrev.to_lowercase(), full.to_string());
            let no_period = abbrev.replace('.', "");
            self.abbreviations.insert(no_period.to_lowercase(), full.to_string());
        }
    }

    fn load_common_organisms(&mut self) {
        const MAMMAL: &str = "Eukaryota; Metazoa; Chordata; Craniata; Vertebrata; Euteleostomi; Mammalia";
        const PRIMATE: &str = "Eukaryota; Metazoa; Chordata; Craniata; Vertebrata; Euteleostomi; Mammalia; Eutheria; Euarchontoglires; Primates; Haplorrhini; Catarrhini; Hominidae";
        const RODENT: &str = "Eukaryota; Metazoa; Chordata; Craniata; Vertebrata; Euteleostomi; Mammalia; Eutheria; Euarchontoglires; Glires; Rodentia; Muridae";
        const BOVID: &str = "Eukaryota; Metazoa; Chordata; Craniata; Vertebrata; Euteleostomi; Mammalia; Eutheria; Laurasiatheria; Artiodactyla; Ruminantia; Pecora; Bovidae; Bovinae";
        const BIRD: &str = "Eukaryota; Metazoa; Chordata; Craniata; Vertebrata; Euteleostomi; Archelosauria; Archosauria; Dinosauria; Aves";
        const FISH: &str = "Eukaryota; Metazoa; Chordata; Craniata; Vertebrata; Euteleostomi; Actinopterygii; Neopterygii; Teleostei; Cypriniformes; Danionidae";
        const FROG: &str = "Eukaryota; Metazoa; Chordata; Craniata; Vertebrata; Euteleostomi; Amphibia; Batrachia; Anura; Pipidae; Xenopus";
        const FLY: &str = "Eukaryota; Metazoa; Ecdysozoa; Arthropoda; Hexapoda; Insecta; Pterygota; Diptera; Drosophilidae";
        const NEMATODE: &str = "Eukaryota; Metazoa; Ecdysozoa; Nematoda; Chromadorea; Rhabditida; Caenorhabditis";
        const YEAST: &str = "Eukaryota; Fungi; Dikarya; Ascomycota; Saccharomycotina; Saccharomycetes; Saccharomycetales; Saccharomycetaceae; Saccharomyces";
        const BRASSICA: &str = "Eukaryota; Viridiplantae; Streptophyta; Embryophyta; Tracheophyta; Spermatophyta; Magnoliopsida; eudicotyledons; Brassicales; Brassicaceae; Arabidopsis";
        const GRASS: &str = "Eukaryota; Viridiplantae; Streptophyta; Embryophyta; Tracheophyta; Spermatophyta; Magnoliopsida; Liliopsida; Poales; Poaceae";
        const MORACEAE: &str = "Eukaryota; Viridiplantae; Streptophyta; Embryophyta; Tracheophyta; Spermatophyta; Magnoliopsida; eudicotyledons; Rosales; Moraceae";
        const GAMMAPROTEO: &str = "Bacteria; Pseudomonadota; Gammaproteobacteria";
        const FIRMICUTES: &str = "Bacteria; Bacillota; Bacilli";
        const ACTINO: &str = "Bacteria; Actinomycetota; Actinomycetes; Mycobacteriales; Mycobacteriaceae; Mycobacterium";
        const APICOMPLEXA: &str = "Eukaryota; Sar; Alveolata; Apicomplexa; Aconoidasida; Haemosporida; Plasmodiidae; Plasmodium";
        const CILIATE: &str = "Eukaryota; Sar; Alveolata; Ciliophora; Intramacronucleata; Oligohymenophorea; Tetrahymena";
        const VIRUS: &str = "Viruses; Riboviria";

        // (taxid, name, rank, lineage, division, gcode, mgcode, pgcode, common names, parent)
        type Row = (u32, &'static str, &'static str, &'static str, &'static str, u8, u8, Option<u8>, &'static [&'static str], Option<u32>);
        let organisms: &[Row] = &[
            // === Animals ===
            (9606, "Homo sapiens", "species", PRIMATE, "PRI", 1, 2, None, &["human"], Some(9605)),
            (9605, "Homo", "genus", PRIMATE, "PRI", 1, 2, None, &[], Some(9604)),
            (10090, "Mus musculus", "species", RODENT, "ROD", 1, 2, None, &["house mouse", "mouse"], Some(10088)),
            (10116, "Rattus norvegicus", "species", RODENT, "ROD", 1, 2, None, &["Norway rat", "rat"], Some(10114)),
            (9913, "Bos taurus", "species", BOVID, "MAM", 1, 2, None, &["cattle"], Some(9903)),
            (9903, "Bos", "genus", BOVID, "MAM", 1, 2, None, &[], Some(27592)),
            (9823, "Sus scrofa", "species", MAMMAL, "MAM", 1, 2, None, &["pig"], Some(9822)),
            (9615, "Canis lupus familiaris", "subspecies", MAMMAL, "MAM", 1, 2, None, &["dog"], Some(9612)),
            (9685, "Felis catus", "species", MAMMAL, "MAM", 1, 2, None, &["domestic cat"], Some(9682)),
            (9031, "Gallus gallus", "species", BIRD, "VRT", 1, 2, None, &["chicken"], Some(9030)),
            (37577, "Morus", "genus", BIRD, "VRT", 1, 2, None, &[], Some(9219)),
            (7955, "Danio rerio", "species", FISH, "VRT", 1, 2, None, &["zebrafish"], Some(7954)),
            (8355, "Xenopus laevis", "species", FROG, "VRT", 1, 2, None, &["African clawed frog"], Some(8353)),
            (7227, "Drosophila melanogaster", "species", FLY, "INV", 1, 5, None, &["fruit fly"], Some(7215)),
            (7215, "Drosophila", "genus", FLY, "INV", 1, 5, None, &[], Some(7214)),
            (6239, "Caenorhabditis elegans", "species", NEMATODE, "INV", 1, 5, None, &[], Some(6237)),
            (5833, "Plasmodium falciparum", "species", APICOMPLEXA, "INV", 1, 4, None, &["malaria parasite P. falciparum"], Some(5820)),
            (5911, "Tetrahymena thermophila", "species", CILIATE, "INV", 6, 4, None, &[], Some(5890)),
            // === Fungi and plants ===
            (4932, "Saccharomyces cerevisiae", "species", YEAST, "PLN", 1, 3, None, &["baker's yeast"], Some(4930)),
            (3702, "Arabidopsis thaliana", "species", BRASSICA, "PLN", 1, 1, Some(11), &["thale cress"], Some(3701)),
            (4577, "Zea mays", "species", GRASS, "PLN", 1, 1, Some(11), &["maize"], Some(4575)),
            (4530, "Oryza sativa", "species", GRASS, "PLN", 1, 1, Some(11), &["rice"], Some(4527)),
            (3497, "Morus", "genus", MORACEAE, "PLN", 1, 1, Some(11), &[], Some(3487)),
            // === Bacteria ===
            (562, "Escherichia coli", "species", GAMMAPROTEO, "BCT", 11, 0, None, &[], Some(561)),
            (28901, "Salmonella enterica", "species", GAMMAPROTEO, "BCT", 11, 0, None, &[], Some(590)),
            (287, "Pseudomonas aeruginosa", "species", GAMMAPROTEO, "BCT", 11, 0, None, &[], Some(286)),
            (1423, "Bacillus subtilis", "species", FIRMICUTES, "BCT", 11, 0, None, &[], Some(1386)),
            (1280, "Staphylococcus aureus", "species", FIRMICUTES, "BCT", 11, 0, None, &[], Some(1279)),
            (1773, "Mycobacterium tuberculosis", "species", ACTINO, "BCT", 11, 0, None, &[], Some(1763)),
            // === Viruses ===
            (11320, "Influenza A virus", "species", VIRUS, "VRL", 1, 0, None, &[], Some(197911)),
            (11676, "Human immunodeficiency virus 1", "species", VIRUS, "VRL", 1, 0, None, &["HIV-1"], Some(11646)),
            (2697049, "Severe acute respiratory syndrome coronavirus 2", "no rank", VIRUS, "VRL", 1, 0, None, &["SARS-CoV-2"], Some(694009)),
        ];

        for (taxid, name, rank, lineage, division, gcode, mgcode, pgcode, common, parent) in organisms {
            self.insert(TaxonRecord {
                taxid: *taxid,
                scientific_name: name.to_string(),
                rank: rank.to_string(),
                lineage: lineage.to_string(),
                division: division.to_string(),
                gcode: *gcode,
                mgcode: *mgcode,
                pgcode: *pgcode,
                common_names: common.iter().map(|s| s.to_string()).collect(),
                parent_taxid: *parent,
            });
        }
    }
}

impl Default for StaticTaxonomy {
    fn default() -> Self {
        Self::new()
    }
}

impl TaxonomyService for StaticTaxonomy {
    fn name(&self) -> &str {
        &self.stats.source
    }

    fn lookup(&self, queries: &[String]) -> Result<Vec<TaxonReply>> {
        Ok(queries.iter().map(|q| self.resolve(q)).collect())
    }
}

/// Replies of one batched lookup, keyed by query string.
#[derive(Debug, Clone, Default)]
pub struct TaxonomyCache {
    replies: HashMap<String, TaxonReply>,
    available: bool,
}

impl TaxonomyCache {
    /// A cache for runs without a taxonomy service; every check that needs
    /// it is skipped.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Ask `service` about every distinct query in one request.
    ///
    /// An empty reply to a non-empty request counts as a failure.
    pub fn fetch(service: &dyn TaxonomyService, queries: &[String]) -> Result<Self> {
        let mut distinct: Vec<String> = Vec::new();
        for query in queries {
            if !distinct.contains(query) {
                distinct.push(query.clone());
            }
        }
        if distinct.is_empty() {
            return Ok(Self {
                replies: HashMap::new(),
                available: true,
            });
        }

        log::debug!("taxonomy lookup of {} names via {}", distinct.len(), service.name());
        let replies = service.lookup(&distinct)?;
        if replies.is_empty() {
            return Err(ValidatorError::Service(format!(
                "{} returned no replies for {} queries",
                service.name(),
                distinct.len()
            )));
        }
        let mut by_query: HashMap<String, TaxonReply> =
            replies.into_iter().map(|r| (r.query.clone(), r)).collect();
        for query in distinct {
            by_query.entry(query.clone()).or_insert_with(|| TaxonReply::not_found(query));
        }
        Ok(Self {
            replies: by_query,
            available: true,
        })
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn get(&self, query: &str) -> Option<&TaxonReply> {
        self.replies.get(query)
    }

    pub fn len(&self) -> usize {
        self.replies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replies.is_empty()
    }
}

struct NodeRow {
    parent: u32,
    rank: String,
    division: u32,
    gcode: u8,
    mgcode: u8,
}

fn io_error(path: &Path, source: std::io::Error) -> ValidatorError {
    ValidatorError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn dump_fields(line: &str) -> Vec<&str> {
    line.trim_end_matches("\t|").split("\t|\t").map(str::trim).collect()
}

/// nodes.dmp: tax_id, parent, rank, embl code, division id, inherited div,
/// genetic code id, inherited gc, mito code id, ...
fn parse_nodes_dmp(path: &Path) -> Result<HashMap<u32, NodeRow>> {
    let file = File::open(path).map_err(|e| io_error(path, e))?;
    let mut nodes = HashMap::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| io_error(path, e))?;
        let parts = dump_fields(&line);
        if parts.len() < 9 {
            continue;
        }
        let (Ok(taxid), Ok(parent)) = (parts[0].parse::<u32>(), parts[1].parse::<u32>()) else {
            continue;
        };
        nodes.insert(
            taxid,
            NodeRow {
                parent,
                rank: parts[2].to_string(),
                division: parts[4].parse().unwrap_or(8),
                gcode: parts[6].parse().unwrap_or(1),
                mgcode: parts[8].parse().unwrap_or(0),
            },
        );
    }
    Ok(nodes)
}

type NameTables = (HashMap<u32, String>, HashMap<u32, Vec<String>>);

fn parse_names_dmp(path: &Path) -> Result<NameTables> {
    let file = File::open(path).map_err(|e| io_error(path, e))?;
    let mut scientific = HashMap::new();
    let mut common: HashMap<u32, Vec<String>> = HashMap::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| io_error(path, e))?;
        let parts = dump_fields(&line);
        if parts.len() < 4 {
            continue;
        }
        let Ok(taxid) = parts[0].parse::<u32>() else {
            continue;
        };
        match parts[3] {
            "scientific name" => {
                scientific.insert(taxid, parts[1].to_string());
            }
            "common name" | "genbank common name" => {
                common.entry(taxid).or_default().push(parts[1].to_string());
            }
            _ => {}
        }
    }
    Ok((scientific, common))
}

fn lineage_of(taxid: u32, nodes: &HashMap<u32, NodeRow>, names: &HashMap<u32, String>) -> String {
    let mut chain = Vec::new();
    let mut current = nodes.get(&taxid).map(|n| n.parent);
    let mut guard = 0;
    while let Some(id) = current {
        if id == 1 || guard > 100 {
            break;
        }
        if let Some(name) = names.get(&id) {
            if name != "cellular organisms" {
                chain.push(name.clone());
            }
        }
        let next = nodes.get(&id).map(|n| n.parent);
        current = next.filter(|p| *p != id);
        guard += 1;
    }
    chain.reverse();
    chain.join("; ")
}

fn division_code(id: u32) -> &'static str {
    match id {
        0 => "BCT",
        1 => "INV",
        2 => "MAM",
        3 => "PHG",
        4 => "PLN",
        5 => "PRI",
        6 => "ROD",
        7 => "SYN",
        9 => "VRL",
        10 => "VRT",
        11 => "ENV",
        _ => "UNA",
    }
}

/// Levenshtein distance.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut row = vec![0usize; b_chars.len() + 1];
    for (i, ca) in a_chars.iter().enumerate() {
        row[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != cb);
            row[j + 1] = (prev[j + 1] + 1).min(row[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut row);
    }
    prev[b_chars.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_exact_and_common_names() {
        let tax = StaticTaxonomy::new();
        assert!(tax.resolve("Homo sapiens").is_found());
        assert!(tax.resolve("human").is_found());
        assert_eq!(tax.resolve("Homo sapiens").record.unwrap().division, "PRI");
    }

    #[test]
    fn test_case_mismatch() {
        let tax = StaticTaxonomy::new();
        assert_eq!(
            tax.resolve("homo sapiens").matched,
            TaxonMatch::CaseMismatch {
                correct: "Homo sapiens".to_string()
            }
        );
    }

    #[test]
    fn test_misspelling_and_abbreviation() {
        let tax = StaticTaxonomy::new();
        assert_eq!(
            tax.resolve("Homo sapien").matched,
            TaxonMatch::Misspelled {
                suggestion: "Homo sapiens".to_string()
            }
        );
        assert_eq!(
            tax.resolve("E. coli").matched,
            TaxonMatch::Misspelled {
                suggestion: "Escherichia coli".to_string()
            }
        );
    }

    #[test]
    fn test_ambiguous_names() {
        let tax = StaticTaxonomy::new();
        assert!(matches!(tax.resolve("Morus").matched, TaxonMatch::Ambiguous { .. }));
        assert!(matches!(tax.resolve("Bos sp.").matched, TaxonMatch::Ambiguous { .. }));
        assert_eq!(tax.resolve("Zzzzz qqqqq").matched, TaxonMatch::NotFound);
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("same", "same"), 0);
    }

    #[test]
    fn test_from_ncbi_dump() {
        let dir = tempfile::tempdir().unwrap();
        let names = dir.path().join("names.dmp");
        let nodes = dir.path().join("nodes.dmp");
        let mut f = File::create(&names).unwrap();
        writeln!(f, "1\t|\troot\t|\t\t|\tscientific name\t|").unwrap();
        writeln!(f, "2\t|\tBacteria\t|\t\t|\tscientific name\t|").unwrap();
        writeln!(f, "562\t|\tEscherichia coli\t|\t\t|\tscientific name\t|").unwrap();
        let mut f = File::create(&nodes).unwrap();
        writeln!(f, "1\t|\t1\t|\tno rank\t|\t\t|\t8\t|\t0\t|\t1\t|\t0\t|\t0\t|").unwrap();
        writeln!(f, "2\t|\t1\t|\tsuperkingdom\t|\t\t|\t0\t|\t0\t|\t11\t|\t0\t|\t0\t|").unwrap();
        writeln!(f, "562\t|\t2\t|\tspecies\t|\tEC\t|\t0\t|\t1\t|\t11\t|\t1\t|\t0\t|").unwrap();

        let tax = StaticTaxonomy::from_ncbi_dump(&names, Some(&nodes)).unwrap();
        let ecoli = tax.lookup_by_taxid(562).unwrap();
        assert_eq!(ecoli.lineage, "Bacteria");
        assert_eq!(ecoli.division, "BCT");
        assert_eq!(ecoli.gcode, 11);
        assert_eq!(tax.stats().species_count, 1);
    }

    #[test]
    fn test_missing_dump_is_io_error() {
        let err = StaticTaxonomy::from_ncbi_dump("/nonexistent/names.dmp", None::<&str>).unwrap_err();
        assert!(matches!(err, ValidatorError::Io { .. }));
    }

    struct SilentService;

    impl TaxonomyService for SilentService {
        fn name(&self) -> &str {
            "silent"
        }

        fn lookup(&self, _queries: &[String]) -> Result<Vec<TaxonReply>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_cache_correlates_by_query() {
        let tax = StaticTaxonomy::new();
        let queries = vec![
            "Homo sapiens".to_string(),
            "Nonexistus fakeus".to_string(),
            "Homo sapiens".to_string(),
        ];
        let cache = TaxonomyCache::fetch(&tax, &queries).unwrap();
        assert!(cache.is_available());
        assert_eq!(cache.len(), 2);
        assert!(cache.get("Homo sapiens").unwrap().is_found());
        assert_eq!(cache.get("Nonexistus fakeus").unwrap().matched, TaxonMatch::NotFound);
        assert!(cache.get("Mus musculus").is_none());
    }

    #[test]
    fn test_cache_empty_reply_is_failure() {
        let err = TaxonomyCache::fetch(&SilentService, &["Homo sapiens".to_string()]).unwrap_err();
        assert!(matches!(err, ValidatorError::Service(_)));
        assert!(!TaxonomyCache::unavailable().is_available());
    }

}
