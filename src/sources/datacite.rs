//! DataCite REST API, harvesting every DOI registered under a prefix.
//!
//! Pages are walked with cursor pagination by following the `links.next` URL
//! of each response.
use log::{debug, warn};
use serde_json::Value;

use super::{HttpClient, Provider, RawRecord};
use crate::config::DataciteConfig;
use crate::error::Error;

pub const DATACITE_API: &str = "https://api.datacite.org/dois";

/// Keys of a `rightsList` entry that carry license information, in output order.
const RIGHTS_KEYS: [&str; 4] = ["rights", "rightsUri", "rightsURI", "rightsIdentifier"];

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Page {
    pub records: Vec<RawRecord>,
    pub next: Option<String>,
}

/// First entry of a list of `{key: ...}` objects (or plain strings).
fn first_text(list: &Value, key: &str) -> String {
    let first = &list[0];
    first[key]
        .as_str()
        .or_else(|| first.as_str())
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Flatten a `rightsList` into a single rights string.
pub fn flatten_rights(rights_list: &Value) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for entry in rights_list.as_array().into_iter().flatten() {
        for key in RIGHTS_KEYS {
            if let Some(value) = entry[key].as_str().map(str::trim) {
                if !value.is_empty() && !parts.contains(&value) {
                    parts.push(value);
                }
            }
        }
    }
    parts.join(" ")
}

fn parse_item(item: &Value) -> RawRecord {
    let attributes = &item["attributes"];
    let url = ["url", "landingPage", "doi"]
        .iter()
        .find_map(|key| attributes[*key].as_str())
        .unwrap_or_default();

    RawRecord {
        text: first_text(&attributes["descriptions"], "description"),
        rights: flatten_rights(&attributes["rightsList"]),
        title: first_text(&attributes["titles"], "title"),
        url: url.to_string(),
        declared_license: None,
    }
}

/// Parse a `/dois` response page.
pub fn parse_page(page: &Value) -> Page {
    let records = page["data"]
        .as_array()
        .map(|items| items.iter().map(parse_item).collect())
        .unwrap_or_default();
    let next = page["links"]["next"]
        .as_str()
        .filter(|next| !next.is_empty())
        .map(String::from);

    Page { records, next }
}

pub struct DataCite {
    client: HttpClient,
    config: DataciteConfig,
}

impl DataCite {
    pub fn new(client: HttpClient, config: DataciteConfig) -> Self {
        Self { client, config }
    }
}

impl Provider for DataCite {
    fn fetch(&self) -> Result<Vec<RawRecord>, Error> {
        let mut records = Vec::new();
        let mut page = self.client.get_json(
            DATACITE_API,
            &[
                ("prefix", self.config.prefix.clone()),
                ("page[size]", self.config.page_size.to_string()),
                ("page[cursor]", "1".to_string()),
            ],
        )?;

        loop {
            let Page {
                records: page_records,
                next,
            } = parse_page(&page);
            if page_records.is_empty() {
                break;
            }

            for record in page_records {
                records.push(record);
                if records.len() >= self.config.max_results {
                    return Ok(records);
                }
            }

            let Some(next) = next else { break };
            debug!("{}: following {}", self.config.prefix, next);
            page = match self.client.get_json(&next, &[]) {
                Ok(page) => page,
                Err(e) => {
                    warn!("{}: stopping harvest early: {:?}", self.config.prefix, e);
                    break;
                }
            };
        }

        Ok(records)
    }
}
