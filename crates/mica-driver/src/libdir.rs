//! Library registry backed by a directory of manifests.
//!
//! Each library is a `<name>.json` file containing an `exports` array
//! of names and an optional `bundle` string with the library's payload.
//! Lookups are cached, including misses, so one bad manifest is
//! reported once per run.

use mica_resolver::{LibraryBundle, LibraryRegistry};
use std::collections::HashMap;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tokio::sync::Mutex;

pub struct DirRegistry {
    dir: PathBuf,
    cache: Mutex<HashMap<String, Option<LibraryBundle>>>,
}

impl DirRegistry {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    async fn load(&self, name: &str) -> Option<LibraryBundle> {
        let path = self.dir.join(format!("{}.json", name));
        let text = tokio::fs::read_to_string(&path).await.ok()?;
        match parse_manifest(&text) {
            Some(bundle) => Some(bundle),
            None => {
                eprintln!("Warning: malformed library manifest {}", path.display());
                None
            }
        }
    }
}

impl LibraryRegistry for DirRegistry {
    async fn lookup(&self, name: &str) -> Option<LibraryBundle> {
        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.get(name) {
            return cached.clone();
        }
        let loaded = self.load(name).await;
        cache.insert(name.to_string(), loaded.clone());
        loaded
    }
}

fn parse_manifest(text: &str) -> Option<LibraryBundle> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    let exports: BTreeSet<String> = value
        .get("exports")?
        .as_array()?
        .iter()
        .map(|entry| entry.as_str().map(str::to_string))
        .collect::<Option<_>>()?;
    let bundle = value
        .get("bundle")
        .and_then(|b| b.as_str())
        .unwrap_or("")
        .to_string();
    Some(LibraryBundle { exports, bundle })
}
