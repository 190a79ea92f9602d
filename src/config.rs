//! Source list and license whitelist configuration.
//!
//! Both are JSON files. The source list is either a bare list of source descriptors
//! or an object with a `sources` key. Each descriptor carries a `type` tag selecting
//! the provider, an `id`, and type-specific fields:
//!
//! ```json
//! [
//!   {"type": "oai_pmh", "id": "pdc", "base_url": "https://dataspace.princeton.edu/oai/request",
//!    "max_records": 300, "required_license_contains": ["cc"]},
//!   {"type": "dataverse_search", "id": "harvard", "api_base": "https://dataverse.harvard.edu/api",
//!    "declared_license": "https://creativecommons.org/publicdomain/zero/1.0/"},
//!   {"type": "datacite_prefix", "id": "zenodo", "prefix": "10.5281", "max_results": 200},
//!   {"type": "html_course_catalog", "id": "ocw", "layout": "mit_ocw",
//!    "start_urls": ["https://ocw.mit.edu/search/"], "link_regex": "/courses/[^/]+/$"},
//!   {"type": "html_list", "id": "openstax", "start_urls": ["https://openstax.org/subjects"],
//!    "required_license_contains": ["CC BY 4.0"]}
//! ]
//! ```
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A configured source: provenance and license fields shared by every provider, plus provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub id: String,
    /// Attribution for pool items. Defaults to [SourceConfig::id].
    #[serde(default)]
    pub org: Option<String>,
    /// License URL or label covering the whole source, trusted out of band.
    #[serde(default)]
    pub declared_license: Option<String>,
    /// When not empty, records whose rights contain none of these (case-insensitive) are skipped.
    #[serde(default)]
    pub required_license_contains: Vec<String>,
    #[serde(flatten)]
    pub kind: SourceKind,
}

impl SourceConfig {
    pub fn org(&self) -> &str {
        self.org.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceKind {
    OaiPmh(OaiPmhConfig),
    DataverseSearch(DataverseConfig),
    DatacitePrefix(DataciteConfig),
    HtmlCourseCatalog(CourseCatalogConfig),
    HtmlList(HtmlListConfig),
}

impl SourceKind {
    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::OaiPmh(_) => "oai_pmh",
            SourceKind::DataverseSearch(_) => "dataverse_search",
            SourceKind::DatacitePrefix(_) => "datacite_prefix",
            SourceKind::HtmlCourseCatalog(_) => "html_course_catalog",
            SourceKind::HtmlList(_) => "html_list",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OaiPmhConfig {
    pub base_url: String,
    #[serde(default = "default_metadata_prefix")]
    pub metadata_prefix: String,
    #[serde(default)]
    pub set_spec: Option<String>,
    #[serde(default = "default_oai_max_records")]
    pub max_records: usize,
    /// pause between two resumption requests
    #[serde(default = "default_sleep_ms")]
    pub sleep_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataverseConfig {
    pub api_base: String,
    #[serde(default = "default_query")]
    pub query: String,
    #[serde(default = "default_page_size")]
    pub per_page: usize,
    #[serde(default = "default_dataverse_max_results")]
    pub max_results: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataciteConfig {
    pub prefix: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_datacite_max_results")]
    pub max_results: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseCatalogConfig {
    pub start_urls: Vec<String>,
    pub link_regex: String,
    #[serde(default = "default_max_pages", alias = "max_records")]
    pub max_pages: usize,
    #[serde(default)]
    pub layout: CatalogLayout,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HtmlListConfig {
    pub start_urls: Vec<String>,
    #[serde(default = "default_max_pages")]
    pub max_records: usize,
}

/// Known course catalog page layouts.
///
/// The layout picks where the course description is looked for and which rights
/// label the catalog publishes its material under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CatalogLayout {
    #[default]
    Generic,
    MitOcw,
    YaleOyc,
    StanfordSee,
}

fn default_metadata_prefix() -> String {
    "oai_dc".to_string()
}
fn default_oai_max_records() -> usize {
    500
}
fn default_sleep_ms() -> u64 {
    200
}
fn default_query() -> String {
    "*".to_string()
}
fn default_page_size() -> usize {
    100
}
fn default_dataverse_max_results() -> usize {
    300
}
fn default_datacite_max_results() -> usize {
    1000
}
fn default_max_pages() -> usize {
    50
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SourcesFile {
    List(Vec<SourceConfig>),
    Object { sources: Vec<SourceConfig> },
}

/// Parse a source list from its JSON representation.
pub fn parse_sources(json: &str) -> Result<Vec<SourceConfig>, Error> {
    let file: SourcesFile = serde_json::from_str(json)
        .map_err(|e| Error::Config(format!("invalid sources config: {}", e)))?;
    let sources = match file {
        SourcesFile::List(sources) => sources,
        SourcesFile::Object { sources } => sources,
    };
    Ok(sources)
}

/// Load the source list. A missing or malformed file is a configuration error.
pub fn load_sources(path: &Path) -> Result<Vec<SourceConfig>, Error> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("could not read sources config {:?}: {}", path, e)))?;
    let sources = parse_sources(&json)?;
    if sources.is_empty() {
        return Err(Error::Config(format!("no source in {:?}", path)));
    }
    debug!("loaded {} sources from {:?}", sources.len(), path);
    Ok(sources)
}

/// License allow/block lists.
///
/// Missing keys in a whitelist file are empty lists: a file replaces the built-in defaults as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseWhitelist {
    /// License labels that accept a record when found in its rights.
    #[serde(default)]
    pub allow: Vec<String>,
    /// Patterns accepting a record's rights, or a source's declared license.
    #[serde(default)]
    pub allowed_license_patterns: Vec<String>,
    /// Patterns rejecting a record's rights, checked before any allow rule.
    #[serde(default)]
    pub blocked_license_patterns: Vec<String>,
}

impl Default for LicenseWhitelist {
    fn default() -> Self {
        let strings = |values: &[&str]| -> Vec<String> {
            values.iter().map(|v| v.to_string()).collect()
        };
        Self {
            allow: strings(&[
                "cc0",
                "cc by",
                "cc-by",
                "creative commons",
                "public domain",
            ]),
            allowed_license_patterns: strings(&[
                "creativecommons.org/licenses/",
                "creativecommons.org/publicdomain/",
            ]),
            blocked_license_patterns: strings(&[
                "all rights reserved",
                "not_cc",
                "not licensed under a creative commons",
                "proprietary",
            ]),
        }
    }
}

/// Load a whitelist file, or use the built-in defaults when no path is given.
pub fn load_whitelist(path: Option<&Path>) -> Result<LicenseWhitelist, Error> {
    match path {
        None => Ok(LicenseWhitelist::default()),
        Some(path) => {
            let file = File::open(path).map_err(|e| {
                Error::Config(format!("could not read license whitelist {:?}: {}", path, e))
            })?;
            serde_json::from_reader(BufReader::new(file))
                .map_err(|e| Error::Config(format!("invalid license whitelist {:?}: {}", path, e)))
        }
    }
}
