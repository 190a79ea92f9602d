//! Dataverse search API.
//!
//! Datasets are listed with the search endpoint, then fetched one by one through
//! their persistent id to get the citation metadata and license.
use log::{debug, warn};
use serde_json::Value;

use super::{harvested, HttpClient, Provider, RawRecord};
use crate::config::DataverseConfig;
use crate::error::Error;

/// Persistent ids of the datasets in a search response page.
pub fn parse_search_page(page: &Value) -> Vec<String> {
    page["data"]["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["global_id"].as_str())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

fn non_empty(value: &Value) -> Option<&str> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty())
}

/// License of a dataset, either a plain string or a `{name, uri}` object.
fn license_parts(license: &Value) -> Vec<String> {
    match license {
        Value::String(_) => non_empty(license).map(String::from).into_iter().collect(),
        Value::Object(_) => [&license["name"], &license["uri"]]
            .iter()
            .filter_map(|v| non_empty(v))
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    }
}

/// First description of a `dsDescription` citation field.
fn description(value: &Value) -> Option<String> {
    match value {
        Value::String(_) => non_empty(value).map(String::from),
        Value::Array(values) => {
            let first = values.first()?;
            let inner = &first["dsDescriptionValue"];
            non_empty(&inner["value"])
                .or_else(|| non_empty(inner))
                .or_else(|| non_empty(&first["value"]))
                .map(String::from)
        }
        _ => None,
    }
}

/// Landing page of a dataset, derived from the API base (`https://host/api`).
pub fn landing_url(api_base: &str, persistent_id: &str) -> String {
    let host = api_base.trim_end_matches('/').trim_end_matches("/api");
    format!("{}/dataset.xhtml?persistentId={}", host, persistent_id)
}

/// Extract a record from a `datasets/:persistentId` response.
pub fn parse_dataset(dataset: &Value, api_base: &str) -> Option<RawRecord> {
    let data = dataset.get("data")?;
    let latest = &data["latestVersion"];

    let mut title = String::new();
    let mut text = String::new();
    if let Some(fields) = latest["metadataBlocks"]["citation"]["fields"].as_array() {
        for field in fields {
            match field["typeName"].as_str() {
                Some("title") => {
                    title = non_empty(&field["value"]).unwrap_or_default().to_string()
                }
                Some("dsDescription") | Some("description") => {
                    if text.is_empty() {
                        text = description(&field["value"]).unwrap_or_default();
                    }
                }
                _ => (),
            }
        }
    }

    let mut rights = license_parts(&data["license"]);
    rights.extend(license_parts(&latest["license"]));
    rights.extend(non_empty(&data["termsOfUse"]).map(String::from));
    rights.extend(non_empty(&latest["termsOfUse"]).map(String::from));
    rights.dedup();

    let persistent_id = non_empty(&data["persistentId"])
        .or_else(|| non_empty(&latest["datasetPersistentId"]))
        .unwrap_or_default();
    let url = if persistent_id.is_empty() {
        String::new()
    } else {
        landing_url(api_base, persistent_id)
    };

    Some(RawRecord {
        text,
        rights: rights.join(" "),
        title,
        url,
        declared_license: None,
    })
}

pub struct Dataverse {
    client: HttpClient,
    config: DataverseConfig,
}

impl Dataverse {
    pub fn new(client: HttpClient, config: DataverseConfig) -> Self {
        Self { client, config }
    }

    fn api(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_base.trim_end_matches('/'), path)
    }

    fn search(&self) -> Result<Vec<String>, Error> {
        let mut ids = Vec::new();
        let per_page = self.config.per_page.max(1);
        let mut start = 0;

        while start < self.config.max_results {
            let query = [
                ("q", self.config.query.clone()),
                ("type", "dataset".to_string()),
                ("per_page", per_page.to_string()),
                ("start", start.to_string()),
            ];
            let page = match self.client.get_json(&self.api("search"), &query) {
                Ok(page) => parse_search_page(&page),
                Err(e) if !ids.is_empty() => {
                    warn!("{}: stopping search early: {:?}", self.config.api_base, e);
                    break;
                }
                Err(e) => return Err(e),
            };

            let nb_items = page.len();
            ids.extend(page);
            if nb_items < per_page {
                break;
            }
            start += per_page;
        }

        ids.truncate(self.config.max_results);
        Ok(ids)
    }
}

impl Provider for Dataverse {
    fn fetch(&self) -> Result<Vec<RawRecord>, Error> {
        let ids = self.search()?;
        debug!("{}: {} datasets found", self.config.api_base, ids.len());

        let mut records = Vec::with_capacity(ids.len());
        let mut last_error = None;
        for id in ids {
            let query = [("persistentId", id.clone())];
            match self.client.get_json(&self.api("datasets/:persistentId"), &query) {
                Ok(dataset) => records.extend(parse_dataset(&dataset, &self.config.api_base)),
                Err(e) => {
                    warn!("could not fetch dataset {}: {:?}", id, e);
                    last_error = Some(e);
                }
            }
        }
        harvested(records, last_error)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn search_page() {
        let page = json!({"status": "OK", "data": {"items": [
            {"name": "a", "global_id": "doi:10.7910/DVN/AAAA"},
            {"name": "no id"},
            {"name": "b", "global_id": "doi:10.7910/DVN/BBBB"}
        ]}});
        assert_eq!(
            parse_search_page(&page),
            vec!["doi:10.7910/DVN/AAAA", "doi:10.7910/DVN/BBBB"]
        );
        assert!(parse_search_page(&json!({"data": {}})).is_empty());
    }

    #[test]
    fn dataset() {
        let dataset = json!({"status": "OK", "data": {
            "persistentId": "doi:10.7910/DVN/AAAA",
            "latestVersion": {
                "license": {"name": "CC0 1.0", "uri": "http://creativecommons.org/publicdomain/zero/1.0"},
                "termsOfUse": "Please cite the dataset.",
                "metadataBlocks": {"citation": {"fields": [
                    {"typeName": "title", "value": "Global glacier inventory"},
                    {"typeName": "dsDescription", "value": [
                        {"dsDescriptionValue": {"typeName": "dsDescriptionValue", "value": "Outlines of glaciers."}}
                    ]}
                ]}}
            }
        }});

        let record = parse_dataset(&dataset, "https://dataverse.harvard.edu/api").unwrap();
        assert_eq!(record.title, "Global glacier inventory");
        assert_eq!(record.text, "Outlines of glaciers.");
        assert_eq!(
            record.rights,
            "CC0 1.0 http://creativecommons.org/publicdomain/zero/1.0 Please cite the dataset."
        );
        assert_eq!(
            record.url,
            "https://dataverse.harvard.edu/dataset.xhtml?persistentId=doi:10.7910/DVN/AAAA"
        );
    }

    #[test]
    fn dataset_legacy_license() {
        let dataset = json!({"data": {
            "license": "CC0",
            "latestVersion": {"metadataBlocks": {"citation": {"fields": [
                {"typeName": "dsDescription", "value": "Plain description."}
            ]}}}
        }});
        let record = parse_dataset(&dataset, "https://example.org/api/").unwrap();
        assert_eq!(record.rights, "CC0");
        assert_eq!(record.text, "Plain description.");
        assert_eq!(record.url, "");
    }

    #[test]
    fn not_a_dataset() {
        assert!(parse_dataset(&json!({"status": "ERROR"}), "https://example.org/api").is_none());
    }

    #[test]
    fn landing() {
        assert_eq!(
            landing_url("https://example.org/api/", "doi:1/2"),
            "https://example.org/dataset.xhtml?persistentId=doi:1/2"
        );
    }
}
