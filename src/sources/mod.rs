/*! Record sources

A source is anything that yields [RawRecord]s: harvested text with its declared rights, a title and a URL.
The pool builder only sees the [Provider] trait, so scrapers and API clients can be swapped or stubbed freely.

Failures are expected: providers return an [Error] when nothing could be harvested, and log and skip
individual records (or pages) that fail once some progress has been made.
!*/
pub mod datacite;
pub mod dataverse;
pub mod html;
pub mod http;
pub mod oai;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{SourceConfig, SourceKind};
use crate::error::Error;
use crate::text::normalize_space;
pub use http::HttpClient;

/// Harvested record, before any filtering.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawRecord {
    /// description, abstract or page body
    pub text: String,
    /// declared rights, as found in the record (may be empty)
    pub rights: String,
    pub title: String,
    pub url: String,
    /// license the source declares for all of its records
    pub declared_license: Option<String>,
}

impl RawRecord {
    pub fn new(text: &str, rights: &str, title: &str, url: &str) -> Self {
        Self {
            text: text.to_string(),
            rights: rights.to_string(),
            title: title.to_string(),
            url: url.to_string(),
            declared_license: None,
        }
    }

    /// License label used for attribution: the record's rights, or the source's declared license.
    pub fn license_label(&self) -> String {
        let rights = normalize_space(&self.rights);
        if !rights.is_empty() {
            return rights;
        }
        self.declared_license
            .as_deref()
            .map(normalize_space)
            .filter(|label| !label.is_empty())
            .unwrap_or_else(|| "(unknown)".to_string())
    }
}

/// Capability shared by every kind of source.
pub trait Provider {
    /// Fetch records, bounded by the provider's own record cap.
    fn fetch(&self) -> Result<Vec<RawRecord>, Error>;
}

/// A provider together with the provenance and license settings of its source.
pub struct Source {
    id: String,
    org: String,
    declared_license: Option<String>,
    required_license_contains: Vec<String>,
    provider: Box<dyn Provider>,
}

impl Source {
    pub fn new(id: &str, provider: Box<dyn Provider>) -> Self {
        Self {
            id: id.to_string(),
            org: id.to_string(),
            declared_license: None,
            required_license_contains: Vec::new(),
            provider,
        }
    }

    pub fn with_org(mut self, org: &str) -> Self {
        self.org = org.to_string();
        self
    }

    pub fn with_declared_license(mut self, license: Option<String>) -> Self {
        self.declared_license = license;
        self
    }

    pub fn with_required_license(mut self, required: Vec<String>) -> Self {
        self.required_license_contains = required.into_iter().map(|r| r.to_lowercase()).collect();
        self
    }

    /// Build the provider a source configuration describes.
    pub fn from_config(config: &SourceConfig, client: &HttpClient) -> Result<Self, Error> {
        let provider: Box<dyn Provider> = match &config.kind {
            SourceKind::OaiPmh(c) => Box::new(oai::OaiPmh::new(client.clone(), c.clone())),
            SourceKind::DataverseSearch(c) => {
                Box::new(dataverse::Dataverse::new(client.clone(), c.clone()))
            }
            SourceKind::DatacitePrefix(c) => {
                Box::new(datacite::DataCite::new(client.clone(), c.clone()))
            }
            SourceKind::HtmlCourseCatalog(c) => {
                Box::new(html::CourseCatalog::new(client.clone(), c.clone())?)
            }
            SourceKind::HtmlList(c) => Box::new(html::HtmlList::new(
                client.clone(),
                c.clone(),
                config.required_license_contains.clone(),
            )),
        };

        Ok(Self::new(&config.id, provider)
            .with_org(config.org())
            .with_declared_license(config.declared_license.clone())
            .with_required_license(config.required_license_contains.clone()))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn org(&self) -> &str {
        &self.org
    }

    /// Fetch records, stamping them with the source's declared license.
    pub fn fetch(&self) -> Result<Vec<RawRecord>, Error> {
        let mut records = self.provider.fetch()?;
        if let Some(declared) = &self.declared_license {
            for record in records.iter_mut() {
                record.declared_license.get_or_insert_with(|| declared.clone());
            }
        }
        Ok(records)
    }

    /// Whether the record's rights contain one of the source's required license substrings.
    ///
    /// Always true when the source requires nothing.
    pub fn has_required_license(&self, record: &RawRecord) -> bool {
        if self.required_license_contains.is_empty() {
            return true;
        }
        let rights = record.rights.to_lowercase();
        self.required_license_contains
            .iter()
            .any(|required| rights.contains(required.as_str()))
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("id", &self.id)
            .field("org", &self.org)
            .field("declared_license", &self.declared_license)
            .field("required_license_contains", &self.required_license_contains)
            .finish()
    }
}

/// Outcome of a fetch loop that skips failing items.
///
/// Some records make the fetch a success, whatever failed along the way.
/// No record and at least one failure make it the last failure.
pub(crate) fn harvested(
    records: Vec<RawRecord>,
    last_error: Option<Error>,
) -> Result<Vec<RawRecord>, Error> {
    match (records.is_empty(), last_error) {
        (true, Some(e)) => Err(e),
        _ => Ok(records),
    }
}

/// Truncate to at most `max_chars` codepoints.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<RawRecord>);

    impl Provider for Fixed {
        fn fetch(&self) -> Result<Vec<RawRecord>, Error> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn license_label() {
        let mut record = RawRecord::new("text", "  CC BY\n4.0 ", "t", "u");
        assert_eq!(record.license_label(), "CC BY 4.0");

        record.rights = String::new();
        assert_eq!(record.license_label(), "(unknown)");

        record.declared_license = Some("https://creativecommons.org/publicdomain/zero/1.0/".into());
        assert_eq!(
            record.license_label(),
            "https://creativecommons.org/publicdomain/zero/1.0/"
        );
    }

    #[test]
    fn declared_license_is_stamped() {
        let mut own = RawRecord::new("b", "", "", "");
        own.declared_license = Some("own".to_string());
        let source = Source::new(
            "fixed",
            Box::new(Fixed(vec![RawRecord::new("a", "", "", ""), own])),
        )
        .with_declared_license(Some("catalog".to_string()));

        let records = source.fetch().unwrap();
        assert_eq!(records[0].declared_license.as_deref(), Some("catalog"));
        assert_eq!(records[1].declared_license.as_deref(), Some("own"));
    }

    #[test]
    fn required_license() {
        let source = Source::new("fixed", Box::new(Fixed(vec![])))
            .with_required_license(vec!["CC BY".to_string(), "cc0".to_string()]);
        assert!(source.has_required_license(&RawRecord::new("", "Licensed cc by 4.0", "", "")));
        assert!(source.has_required_license(&RawRecord::new("", "CC0", "", "")));
        assert!(!source.has_required_license(&RawRecord::new("", "", "", "")));

        let lenient = Source::new("fixed", Box::new(Fixed(vec![])));
        assert!(lenient.has_required_license(&RawRecord::new("", "", "", "")));
    }

    #[test]
    fn builder() {
        let source = Source::new("mit", Box::new(Fixed(vec![]))).with_org("MIT OpenCourseWare");
        assert_eq!(source.id(), "mit");
        assert_eq!(source.org(), "MIT OpenCourseWare");
    }

    #[test]
    fn harvest_outcome() {
        let failure = || Some(Error::Custom("timeout".to_string()));
        let records = vec![RawRecord::new("a", "", "", "")];

        assert_eq!(harvested(records.clone(), failure()).unwrap(), records);
        assert!(harvested(Vec::new(), failure()).is_err());
        assert!(harvested(Vec::new(), None).unwrap().is_empty());
    }

    #[test]
    fn truncate() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 5), "hi");
    }
}
