/*! Trivia pool document.

The pool is written once, at the end of a build:

```json
{
  "version": "1.1.0",
  "generated_utc": "2024-01-01T00:00:00Z",
  "items": [
    {"text": "...", "source_org": "...", "source_title": "...", "source_url": "...", "license": "..."}
  ],
  "stats": {"unique_sentences": 1, "target": 1200}
}
```
!*/
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Error;

pub const POOL_VERSION: &str = "1.1.0";

/// One deduplicated, license-cleared sentence with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolItem {
    pub text: String,
    pub source_org: String,
    pub source_title: String,
    pub source_url: String,
    pub license: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub unique_sentences: usize,
    pub target: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub version: String,
    pub generated_utc: String,
    pub items: Vec<PoolItem>,
    pub stats: Stats,
}

impl Pool {
    /// Create a pool stamped with the current UTC time.
    pub fn new(items: Vec<PoolItem>, target: usize) -> Self {
        let stats = Stats {
            unique_sentences: items.len(),
            target,
        };
        Self {
            version: POOL_VERSION.to_string(),
            generated_utc: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            items,
            stats,
        }
    }

    /// Write the pool as pretty-printed JSON.
    ///
    /// The document is written next to `dst` first and then renamed over it,
    /// so an interrupted write never leaves a truncated pool behind.
    pub fn write(&self, dst: &Path) -> Result<(), Error> {
        if let Some(parent) = dst.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut tmp = PathBuf::from(dst);
        tmp.set_extension("json.tmp");

        let mut writer = BufWriter::new(File::create(&tmp)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        std::fs::rename(&tmp, dst)?;
        debug!("wrote {} items to {:?}", self.items.len(), dst);
        Ok(())
    }

    pub fn read(src: &Path) -> Result<Self, Error> {
        let reader = BufReader::new(File::open(src)?);
        Ok(serde_json::from_reader(reader)?)
    }
}
