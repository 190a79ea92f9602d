//! HTML scraping providers.
//!
//! Scraping is heuristic: a layout change on a catalog silently yields empty
//! descriptions rather than errors. Records with no usable text are dropped.
//!
//! - [CourseCatalog] collects course links from catalog pages, then scrapes each
//!   course page for its title and first substantial paragraph.
//! - [HtmlList] uses each configured page's whole visible text as a record.
use std::collections::HashSet;

use log::{debug, warn};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::{harvested, HttpClient, Provider, RawRecord};
use crate::config::{CatalogLayout, CourseCatalogConfig, HtmlListConfig};
use crate::error::Error;
use crate::text::normalize_space;

/// A paragraph has to be longer than this to be taken as a course description.
const MIN_PARAGRAPH_CHARS: usize = 80;

/// Elements whose text is never shown to readers.
const INVISIBLE: [&str; 4] = ["script", "style", "noscript", "template"];

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn element_text(el: &ElementRef) -> String {
    normalize_space(&el.text().collect::<Vec<_>>().join(" "))
}

fn first_text(doc: &Html, css: &str) -> Option<String> {
    let sel = selector(css)?;
    doc.select(&sel)
        .map(|el| element_text(&el))
        .find(|text| !text.is_empty())
}

/// Visible text of a page, whitespace-normalized.
pub fn visible_text(doc: &Html) -> String {
    let texts: Vec<&str> = doc
        .tree
        .root()
        .descendants()
        .filter_map(|node| node.value().as_text().map(|text| (node, text)))
        .filter(|(node, _)| {
            !node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .map_or(false, |el| INVISIBLE.contains(&el.name()))
            })
        })
        .map(|(_, text)| &**text)
        .collect();
    normalize_space(&texts.join(" "))
}

/// Absolute URLs of the page's links matching `pattern`, in page order and without repeats.
pub fn matching_links(doc: &Html, base: &Url, pattern: &Regex) -> Vec<String> {
    let Some(sel) = selector("a[href]") else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    doc.select(&sel)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| base.join(href).ok())
        .map(|mut url| {
            url.set_fragment(None);
            url.to_string()
        })
        .filter(|url| pattern.is_match(url))
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

/// License link of the page (`<a rel="license">` or `<link rel="license">`), if any.
fn license_link(doc: &Html) -> Option<String> {
    let sel = selector(r#"a[rel~="license"], link[rel~="license"]"#)?;
    doc.select(&sel)
        .filter_map(|el| el.value().attr("href"))
        .map(str::trim)
        .find(|href| !href.is_empty())
        .map(String::from)
}

impl CatalogLayout {
    /// Where the course description paragraphs are, and how many of them are worth looking at.
    fn paragraphs(&self) -> (&'static str, usize) {
        match self {
            CatalogLayout::Generic => ("main p, article p, p", 15),
            CatalogLayout::MitOcw => ("main p", 10),
            CatalogLayout::YaleOyc => ("main p, div.field--name-body p", 12),
            CatalogLayout::StanfordSee => ("p", 15),
        }
    }

    /// Rights label for a course page of this catalog.
    fn rights(&self, doc: &Html) -> String {
        match self {
            CatalogLayout::Generic => license_link(doc).unwrap_or_default(),
            CatalogLayout::MitOcw => "CC BY-NC-SA 4.0".to_string(),
            CatalogLayout::YaleOyc => "CC BY-NC-SA 3.0 US (most materials)".to_string(),
            CatalogLayout::StanfordSee => {
                let body = visible_text(doc).to_lowercase();
                if body.contains("not licensed under a creative commons") {
                    "NOT_CC".to_string()
                } else {
                    "Creative Commons (SEE)".to_string()
                }
            }
        }
    }
}

/// Scrape a course page: first `h1` as title, first long paragraph as description.
pub fn parse_course_page(html: &str, url: &str, layout: CatalogLayout) -> RawRecord {
    let doc = Html::parse_document(html);
    let title = first_text(&doc, "h1").unwrap_or_default();

    let (css, max_paragraphs) = layout.paragraphs();
    let text = selector(css)
        .and_then(|sel| {
            doc.select(&sel)
                .take(max_paragraphs)
                .map(|p| element_text(&p))
                .find(|p| p.chars().count() > MIN_PARAGRAPH_CHARS)
        })
        .unwrap_or_default();

    RawRecord {
        text,
        rights: layout.rights(&doc),
        title,
        url: url.to_string(),
        declared_license: None,
    }
}

/// Scrape a list page: its visible text is the record, its rights the first
/// required license substring found on the page (or its license link).
pub fn parse_list_page(html: &str, url: &str, required_license: &[String]) -> RawRecord {
    let doc = Html::parse_document(html);
    let text = visible_text(&doc);
    let low = text.to_lowercase();

    let rights = required_license
        .iter()
        .find(|license| low.contains(&license.to_lowercase()))
        .cloned()
        .or_else(|| license_link(&doc))
        .unwrap_or_default();

    let title = first_text(&doc, "title")
        .or_else(|| first_text(&doc, "h1"))
        .unwrap_or_default();

    RawRecord {
        text,
        rights,
        title,
        url: url.to_string(),
        declared_license: None,
    }
}

pub struct CourseCatalog {
    client: HttpClient,
    config: CourseCatalogConfig,
    link_pattern: Regex,
}

impl CourseCatalog {
    pub fn new(client: HttpClient, config: CourseCatalogConfig) -> Result<Self, Error> {
        let link_pattern = Regex::new(&config.link_regex).map_err(|e| {
            Error::Config(format!("invalid link_regex {:?}: {}", config.link_regex, e))
        })?;
        Ok(Self {
            client,
            config,
            link_pattern,
        })
    }

    /// Course page URLs linked from the start pages, at most `max_pages` of them.
    fn course_links(&self) -> Result<Vec<String>, Error> {
        let mut links = Vec::new();
        let mut last_error = None;

        for start in &self.config.start_urls {
            let page = Url::parse(start)
                .map_err(Error::from)
                .and_then(|base| Ok((self.client.get_text(start, &[])?, base)));
            match page {
                Ok((html, base)) => {
                    let doc = Html::parse_document(&html);
                    for link in matching_links(&doc, &base, &self.link_pattern) {
                        if !links.contains(&link) {
                            links.push(link);
                        }
                    }
                }
                Err(e) => {
                    warn!("could not crawl {}: {:?}", start, e);
                    last_error = Some(e);
                }
            }
            if links.len() >= self.config.max_pages {
                break;
            }
        }

        // every start page failed
        if let (true, Some(e)) = (links.is_empty(), last_error) {
            return Err(e);
        }

        links.truncate(self.config.max_pages);
        Ok(links)
    }
}

impl Provider for CourseCatalog {
    fn fetch(&self) -> Result<Vec<RawRecord>, Error> {
        let links = self.course_links()?;
        debug!("{} course pages to scrape", links.len());

        let mut records = Vec::new();
        let mut last_error = None;
        for link in links {
            match self.client.get_text(&link, &[]) {
                Ok(html) => {
                    let record = parse_course_page(&html, &link, self.config.layout);
                    if record.text.is_empty() {
                        debug!("no description found on {}", link);
                    } else {
                        records.push(record);
                    }
                }
                Err(e) => {
                    warn!("could not scrape {}: {:?}", link, e);
                    last_error = Some(e);
                }
            }
        }
        harvested(records, last_error)
    }
}

pub struct HtmlList {
    client: HttpClient,
    config: HtmlListConfig,
    required_license: Vec<String>,
}

impl HtmlList {
    pub fn new(client: HttpClient, config: HtmlListConfig, required_license: Vec<String>) -> Self {
        Self {
            client,
            config,
            required_license,
        }
    }
}

impl Provider for HtmlList {
    fn fetch(&self) -> Result<Vec<RawRecord>, Error> {
        let mut records = Vec::new();
        let mut last_error = None;

        for url in self.config.start_urls.iter().take(self.config.max_records) {
            match self.client.get_text(url, &[]) {
                Ok(html) => {
                    let record = parse_list_page(&html, url, &self.required_license);
                    if !record.text.is_empty() {
                        records.push(record);
                    }
                }
                Err(e) => {
                    warn!("could not fetch {}: {:?}", url, e);
                    last_error = Some(e);
                }
            }
        }

        harvested(records, last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COURSE: &str = r#"<html><head><title>8.01 | Physics</title><script>var x = "hidden";</script></head>
<body>
  <nav><p>Menu</p></nav>
  <main>
    <h1>  Classical   Mechanics </h1>
    <p>Short intro.</p>
    <p>This course covers classical mechanics, including Newton's laws of motion and energy conservation,
       taught over a 14-week semester.</p>
    <p>Another long paragraph that would only be used if the first one was missing from the page entirely.</p>
  </main>
  <footer><a rel="license" href="https://creativecommons.org/licenses/by/4.0/">CC BY</a></footer>
</body></html>"#;

    #[test]
    fn course_page() {
        let record = parse_course_page(COURSE, "https://example.org/c/1", CatalogLayout::MitOcw);
        assert_eq!(record.title, "Classical Mechanics");
        assert_eq!(
            record.text,
            "This course covers classical mechanics, including Newton's laws of motion and energy conservation, taught over a 14-week semester."
        );
        assert_eq!(record.rights, "CC BY-NC-SA 4.0");
        assert_eq!(record.url, "https://example.org/c/1");
    }

    #[test]
    fn generic_layout_uses_license_link() {
        let record = parse_course_page(COURSE, "https://example.org/c/1", CatalogLayout::Generic);
        assert_eq!(record.rights, "https://creativecommons.org/licenses/by/4.0/");
    }

    #[test]
    fn stanford_not_cc() {
        let html = "<html><body><h1>CS101</h1><p>This material is not licensed under a Creative Commons license.</p></body></html>";
        let record = parse_course_page(html, "u", CatalogLayout::StanfordSee);
        assert_eq!(record.rights, "NOT_CC");
        assert_eq!(record.text, "");

        let record = parse_course_page(COURSE, "u", CatalogLayout::StanfordSee);
        assert_eq!(record.rights, "Creative Commons (SEE)");
    }

    #[test]
    fn invisible_text() {
        let doc = Html::parse_document(COURSE);
        let text = visible_text(&doc);
        assert!(text.contains("Classical Mechanics"));
        assert!(!text.contains("hidden"));
    }

    #[test]
    fn links() {
        let html = r##"<html><body>
            <a href="/courses/8-01/">Physics</a>
            <a href="/courses/8-01/#syllabus">Physics again</a>
            <a href="https://other.org/courses/x/">External</a>
            <a href="/about/">About</a>
            <a href="#top">Top</a>
        </body></html>"##;
        let doc = Html::parse_document(html);
        let base = Url::parse("https://ocw.example.org/search/").unwrap();
        let pattern = Regex::new(r"/courses/[^/]+/$").unwrap();

        assert_eq!(
            matching_links(&doc, &base, &pattern),
            vec![
                "https://ocw.example.org/courses/8-01/",
                "https://other.org/courses/x/"
            ]
        );
    }

    #[test]
    fn list_page() {
        let html = r#"<html><head><title>Biology 2e</title></head><body>
            <p>The cell is the basic unit of life.</p>
            <p>Licensed under CC BY 4.0.</p>
        </body></html>"#;
        let record = parse_list_page(html, "https://example.org/bio", &["cc by 4.0".to_string()]);
        assert_eq!(record.title, "Biology 2e");
        assert_eq!(record.rights, "cc by 4.0");
        assert!(record.text.contains("basic unit of life"));

        let record = parse_list_page(html, "https://example.org/bio", &["CC0".to_string()]);
        assert_eq!(record.rights, "");
    }
}
