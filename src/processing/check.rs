/*! Duplicate checking of existing trivia modules

Trivia modules are JSON files holding an `entries` list:

```json
{"entries": [{"text": "..."}, {"text": "..."}]}
```

Every `*.json` file of a directory is read in file name order, and each entry text is hashed
(sha256 of the lowercased, trimmed text). An entry whose hash was already seen is reported as a
`(file, first_file)` pair, `first_file` being the file the text was first seen in.
!*/
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use itertools::Itertools;
use log::{debug, info, warn};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::error::Error;

#[derive(Debug, Deserialize)]
struct Entry {
    text: String,
}

#[derive(Debug, Default, Deserialize)]
struct Module {
    #[serde(default)]
    entries: Vec<Entry>,
}

/// A repeated entry: the file it was found in, and the file it was first seen in.
pub type DuplicatePair = (String, String);

/// Hex sha256 of the lowercased, trimmed text.
fn text_key(text: &str, hasher: &mut Sha256) -> String {
    hasher.update(text.trim().to_lowercase().as_bytes());
    format!("{:x}", hasher.finalize_reset())
}

fn load_module(path: &Path) -> Result<Module, Error> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// `*.json` files of `src`, sorted by path.
fn module_files(src: &Path) -> Result<Vec<PathBuf>, Error> {
    let entries: Result<Vec<_>, std::io::Error> = std::fs::read_dir(src)?.collect();
    Ok(entries?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().map_or(false, |ext| ext == "json"))
        .sorted()
        .collect())
}

/// Report exact duplicate entries across the trivia modules of `src`.
///
/// Files that cannot be read or parsed are logged and skipped.
pub fn check(src: &Path) -> Result<Vec<DuplicatePair>, Error> {
    let mut hasher = Sha256::new();
    let mut seen: HashMap<String, String> = HashMap::new();
    let mut duplicates = Vec::new();

    for path in module_files(src)? {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let module = match load_module(&path) {
            Ok(module) => module,
            Err(e) => {
                warn!("skipping {:?}: {:?}", path, e);
                continue;
            }
        };
        debug!("[{}] {} entries", filename, module.entries.len());

        for entry in module.entries {
            let key = text_key(&entry.text, &mut hasher);
            match seen.get(&key) {
                Some(first) => duplicates.push((filename.clone(), first.clone())),
                None => {
                    seen.insert(key, filename.clone());
                }
            }
        }
    }

    info!(
        "{} unique entries, {} duplicates",
        seen.len(),
        duplicates.len()
    );
    Ok(duplicates)
}
