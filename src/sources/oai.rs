//! OAI-PMH harvesting (`ListRecords` with Dublin Core metadata).
//!
//! Records are requested page by page, following resumption tokens until the
//! record cap is reached or the repository has no more pages.
use std::thread;
use std::time::Duration;

use log::{debug, warn};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{truncate_chars, HttpClient, Provider, RawRecord};
use crate::config::OaiPmhConfig;
use crate::error::Error;

const MAX_DESCRIPTION_CHARS: usize = 5000;
const MAX_RIGHTS_CHARS: usize = 2000;
const MAX_IDENTIFIERS: usize = 10;

/// One `ListRecords` response.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Page {
    pub records: Vec<RawRecord>,
    pub resumption_token: Option<String>,
}

/// Dublin Core fields of the record being parsed.
#[derive(Debug, Default)]
struct DcRecord {
    deleted: bool,
    has_metadata: bool,
    titles: Vec<String>,
    descriptions: Vec<String>,
    rights: Vec<String>,
    identifiers: Vec<String>,
}

impl DcRecord {
    fn into_raw(self) -> Option<RawRecord> {
        if self.deleted || !self.has_metadata {
            return None;
        }

        let identifiers: Vec<&String> = self.identifiers.iter().take(MAX_IDENTIFIERS).collect();
        let url = identifiers
            .iter()
            .find(|id| id.starts_with("http://") || id.starts_with("https://"))
            .or_else(|| identifiers.first())
            .map(|id| id.to_string())
            .unwrap_or_default();

        Some(RawRecord {
            text: truncate_chars(&self.descriptions.join(" "), MAX_DESCRIPTION_CHARS),
            rights: truncate_chars(&self.rights.join(" "), MAX_RIGHTS_CHARS),
            title: self.titles.into_iter().next().unwrap_or_default(),
            url,
            declared_license: None,
        })
    }
}

/// Element whose text content is being collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Description,
    Rights,
    Identifier,
    ResumptionToken,
    Error,
}

impl Field {
    fn from_local_name(name: &[u8], in_dc: bool) -> Option<Self> {
        match (name, in_dc) {
            (b"title", true) => Some(Field::Title),
            (b"description", true) => Some(Field::Description),
            (b"rights", true) => Some(Field::Rights),
            (b"identifier", true) => Some(Field::Identifier),
            (b"resumptionToken", false) => Some(Field::ResumptionToken),
            (b"error", false) => Some(Field::Error),
            _ => None,
        }
    }
}

fn is_deleted(header: &BytesStart) -> bool {
    header
        .attributes()
        .flatten()
        .any(|attr| attr.key.local_name().as_ref() == b"status" && attr.value.as_ref() == b"deleted")
}

fn error_code(error: &BytesStart) -> String {
    error
        .attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == b"code")
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
        .unwrap_or_default()
}

/// Append a trimmed text node, space separated from the previous one.
fn push_text(buf: &mut String, text: &str) {
    if !buf.is_empty() {
        buf.push(' ');
    }
    buf.push_str(text);
}

/// Parse a `ListRecords` response.
///
/// Deleted records and records without Dublin Core metadata are skipped.
/// A `noRecordsMatch` error is an empty page, any other OAI-PMH error is an [Error].
pub fn parse_list_records(xml: &str) -> Result<Page, Error> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut page = Page::default();
    let mut record: Option<DcRecord> = None;
    let mut in_dc = false;
    let mut field: Option<Field> = None;
    // elements opened inside the current field (inline markup)
    let mut nested = 0usize;
    let mut buf = String::new();
    let mut oai_error: Option<(String, String)> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"record" => record = Some(DcRecord::default()),
                    b"header" => {
                        if let Some(r) = record.as_mut() {
                            r.deleted = is_deleted(&e);
                        }
                    }
                    b"dc" => {
                        in_dc = true;
                        if let Some(r) = record.as_mut() {
                            r.has_metadata = true;
                        }
                    }
                    b"error" => oai_error = Some((error_code(&e), String::new())),
                    _ if field.is_some() => nested += 1,
                    other => {
                        field = Field::from_local_name(other, in_dc);
                        buf.clear();
                    }
                }
            }
            Event::Empty(e) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"header" => {
                        if let Some(r) = record.as_mut() {
                            r.deleted = is_deleted(&e);
                        }
                    }
                    b"error" => oai_error = Some((error_code(&e), String::new())),
                    _ => (),
                }
            }
            Event::Text(e) => {
                if field.is_some() || oai_error.is_some() {
                    let text = e
                        .unescape()
                        .map_err(|e| Error::Custom(format!("invalid OAI-PMH text: {}", e)))?;
                    push_text(&mut buf, &text);
                }
            }
            Event::CData(e) => {
                if field.is_some() {
                    push_text(&mut buf, &String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::End(e) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"record" => {
                        if let Some(raw) = record.take().and_then(DcRecord::into_raw) {
                            page.records.push(raw);
                        }
                    }
                    _ if nested > 0 => nested -= 1,
                    b"dc" => in_dc = false,
                    b"error" => {
                        if let Some((_, message)) = oai_error.as_mut() {
                            *message = buf.trim().to_string();
                        }
                        buf.clear();
                    }
                    _ => {
                        if let Some(f) = field.take() {
                            let value = buf.trim().to_string();
                            buf.clear();
                            if value.is_empty() {
                                continue;
                            }
                            match (f, record.as_mut()) {
                                (Field::ResumptionToken, _) => page.resumption_token = Some(value),
                                (Field::Title, Some(r)) => r.titles.push(value),
                                (Field::Description, Some(r)) => r.descriptions.push(value),
                                (Field::Rights, Some(r)) => r.rights.push(value),
                                (Field::Identifier, Some(r)) => r.identifiers.push(value),
                                _ => (),
                            }
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => (),
        }
    }

    match oai_error {
        Some((code, _)) if code == "noRecordsMatch" => Ok(Page::default()),
        Some((code, message)) => Err(Error::Custom(format!(
            "OAI-PMH error {}: {}",
            code, message
        ))),
        None => Ok(page),
    }
}

pub struct OaiPmh {
    client: HttpClient,
    config: OaiPmhConfig,
}

impl OaiPmh {
    pub fn new(client: HttpClient, config: OaiPmhConfig) -> Self {
        Self { client, config }
    }

    fn first_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("verb", "ListRecords".to_string()),
            ("metadataPrefix", self.config.metadata_prefix.clone()),
        ];
        if let Some(set_spec) = &self.config.set_spec {
            query.push(("set", set_spec.clone()));
        }
        query
    }
}

impl Provider for OaiPmh {
    fn fetch(&self) -> Result<Vec<RawRecord>, Error> {
        let mut records = Vec::new();
        let mut query = self.first_query();

        loop {
            let page = self
                .client
                .get_text(&self.config.base_url, &query)
                .and_then(|xml| parse_list_records(&xml));

            let page = match page {
                Ok(page) => page,
                // keep what previous pages gave us
                Err(e) if !records.is_empty() => {
                    warn!("{}: stopping harvest early: {:?}", self.config.base_url, e);
                    break;
                }
                Err(e) => return Err(e),
            };

            debug!(
                "{}: {} records in page, token {:?}",
                self.config.base_url,
                page.records.len(),
                page.resumption_token
            );

            for record in page.records {
                records.push(record);
                if records.len() >= self.config.max_records {
                    return Ok(records);
                }
            }

            match page.resumption_token {
                Some(token) => {
                    query = vec![
                        ("verb", "ListRecords".to_string()),
                        ("resumptionToken", token),
                    ];
                    thread::sleep(Duration::from_millis(self.config.sleep_ms));
                }
                None => break,
            }
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<OAI-PMH xmlns="http://www.openarchives.org/OAI/2.0/">
  <responseDate>2024-01-01T00:00:00Z</responseDate>
  <request verb="ListRecords" metadataPrefix="oai_dc">https://example.org/oai</request>
  <ListRecords>
    <record>
      <header><identifier>oai:example.org:1</identifier></header>
      <metadata>
        <oai_dc:dc xmlns:oai_dc="http://www.openarchives.org/OAI/2.0/oai_dc/" xmlns:dc="http://purl.org/dc/elements/1.1/">
          <dc:title>Ocean temperature records</dc:title>
          <dc:title>Secondary title</dc:title>
          <dc:description>Sea surface temperature &amp; salinity.</dc:description>
          <dc:description><![CDATA[Collected <daily>.]]></dc:description>
          <dc:rights>CC0 1.0</dc:rights>
          <dc:identifier>doi:10.1234/abcd</dc:identifier>
          <dc:identifier>https://example.org/items/1</dc:identifier>
        </oai_dc:dc>
      </metadata>
    </record>
    <record>
      <header status="deleted"><identifier>oai:example.org:2</identifier></header>
    </record>
    <record>
      <header><identifier>oai:example.org:3</identifier></header>
    </record>
    <record>
      <header><identifier>oai:example.org:4</identifier></header>
      <metadata>
        <oai_dc:dc xmlns:oai_dc="http://www.openarchives.org/OAI/2.0/oai_dc/" xmlns:dc="http://purl.org/dc/elements/1.1/">
          <dc:title>No rights here</dc:title>
          <dc:identifier>oai:example.org:4</dc:identifier>
        </oai_dc:dc>
      </metadata>
    </record>
    <resumptionToken cursor="0" completeListSize="10">token-123</resumptionToken>
  </ListRecords>
</OAI-PMH>"#;

    #[test]
    fn parse_page() {
        let page = parse_list_records(PAGE).unwrap();
        assert_eq!(page.resumption_token.as_deref(), Some("token-123"));
        assert_eq!(page.records.len(), 2);

        let first = &page.records[0];
        assert_eq!(first.title, "Ocean temperature records");
        assert_eq!(
            first.text,
            "Sea surface temperature & salinity. Collected <daily>."
        );
        assert_eq!(first.rights, "CC0 1.0");
        assert_eq!(first.url, "https://example.org/items/1");

        let second = &page.records[1];
        assert_eq!(second.title, "No rights here");
        assert_eq!(second.rights, "");
        assert_eq!(second.url, "oai:example.org:4");
    }

    #[test]
    fn inline_markup() {
        let xml = r#"<OAI-PMH><ListRecords><record><header/><metadata>
<oai_dc:dc xmlns:oai_dc="http://www.openarchives.org/OAI/2.0/oai_dc/" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <dc:title>Marine <i>plankton</i> survey</dc:title>
  <dc:description>Counts of <b>diatoms <i>and</i> copepods</b> per litre.</dc:description>
  <dc:rights>CC BY 4.0</dc:rights>
</oai_dc:dc></metadata></record></ListRecords></OAI-PMH>"#;
        let page = parse_list_records(xml).unwrap();
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].title, "Marine plankton survey");
        assert_eq!(page.records[0].text, "Counts of diatoms and copepods per litre.");
        assert_eq!(page.records[0].rights, "CC BY 4.0");
    }

    #[test]
    fn last_page() {
        let xml = r#"<OAI-PMH><ListRecords><resumptionToken completeListSize="10" cursor="9"/></ListRecords></OAI-PMH>"#;
        let page = parse_list_records(xml).unwrap();
        assert_eq!(page, Page::default());
    }

    #[test]
    fn no_records_match() {
        let xml = r#"<OAI-PMH><error code="noRecordsMatch">No matching records</error></OAI-PMH>"#;
        assert_eq!(parse_list_records(xml).unwrap(), Page::default());
    }

    #[test]
    fn oai_error() {
        let xml = r#"<OAI-PMH><error code="badArgument">Illegal argument</error></OAI-PMH>"#;
        assert!(parse_list_records(xml).is_err());
    }

    #[test]
    fn malformed() {
        assert!(parse_list_records("<OAI-PMH><ListRecords></OAI-PMH>").is_err());
    }
}
