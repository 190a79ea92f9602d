//! Blocking HTTP client shared by every provider.
use std::time::Duration;

use log::debug;

use crate::error::Error;

pub const USER_AGENT: &str = "AcademicTriviaBot/1.1";
const TIMEOUT: Duration = Duration::from_secs(30);

/// Thin wrapper over [reqwest::blocking::Client].
///
/// Cloning is cheap: clones share the same connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::blocking::Client,
}

impl HttpClient {
    pub fn new() -> Result<Self, Error> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(TIMEOUT)
            .build()?;
        Ok(Self { client })
    }

    /// GET `url` with query parameters, failing on non-success statuses.
    pub fn get_text(&self, url: &str, query: &[(&str, String)]) -> Result<String, Error> {
        debug!("GET {} {:?}", url, query);
        let response = self
            .client
            .get(url)
            .query(query)
            .send()?
            .error_for_status()?;
        Ok(response.text()?)
    }

    pub fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<serde_json::Value, Error> {
        let body = self.get_text(url, query)?;
        Ok(serde_json::from_str(&body)?)
    }
}
