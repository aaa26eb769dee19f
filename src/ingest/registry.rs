// src/ingest/registry.rs
//! Target id → feed URL table.
//!
//! Loaded once at process start and passed by reference; adding a feed is a
//! data edit (`config/feeds.toml`), not a code change.

use anyhow::{anyhow, bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::CollectError;
use crate::ingest::types::FeedTarget;

pub const ENV_REGISTRY_PATH: &str = "FEED_REGISTRY_PATH";

const BUILTIN_FEEDS: [(&str, &str); 2] = [
    ("mk_economy", "https://www.mk.co.kr/rss/30100041/"),
    ("hk_it", "https://www.hankyung.com/feed/it"),
];

static TARGET_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9_]+$").expect("static regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRegistry {
    feeds: BTreeMap<String, String>,
}

impl Default for FeedRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FeedRegistry {
    pub fn builtin() -> Self {
        Self {
            feeds: BUILTIN_FEEDS
                .iter()
                .map(|(id, url)| (id.to_string(), url.to_string()))
                .collect(),
        }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut feeds = BTreeMap::new();
        for (id, url) in pairs {
            let id = normalize_id(id.as_ref());
            let url = url.as_ref().trim();
            if !TARGET_ID.is_match(&id) {
                bail!("invalid target id '{id}' (expected [a-z0-9_]+)");
            }
            if url.is_empty() {
                bail!("target '{id}' has an empty feed URL");
            }
            feeds.insert(id, url.to_string());
        }
        if feeds.is_empty() {
            bail!("feed registry is empty");
        }
        Ok(Self { feeds })
    }

    /// Resolve a user-supplied id (case-insensitive) to its feed.
    pub fn resolve(&self, target: &str) -> Result<FeedTarget, CollectError> {
        let id = normalize_id(target);
        if id.is_empty() {
            return Err(CollectError::MissingTarget {
                known: self.known_list(),
            });
        }
        match self.feeds.get(&id) {
            Some(url) => Ok(FeedTarget {
                id,
                url: url.clone(),
            }),
            None => Err(CollectError::UnknownTarget {
                suggestion: self.closest(&id),
                target: id,
                known: self.known_list(),
            }),
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.feeds.keys().map(String::as_str)
    }

    pub fn known_list(&self) -> String {
        self.ids().collect::<Vec<_>>().join(", ")
    }

    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }

    fn closest(&self, id: &str) -> Option<String> {
        self.ids()
            .map(|known| (strsim::jaro_winkler(id, known), known))
            .filter(|(score, _)| *score >= 0.8)
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, known)| known.to_string())
    }
}

fn normalize_id(id: &str) -> String {
    id.trim().to_ascii_lowercase()
}

/// Load a registry from an explicit path. Supports TOML or JSON.
pub fn load_registry_from(path: &Path) -> Result<FeedRegistry> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading feed registry from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_registry(&content, ext.as_str())
        .with_context(|| format!("parsing feed registry {}", path.display()))
}

/// Load the registry using explicit path / env var + fallbacks:
/// 1) `explicit` (usually the `--registry` flag)
/// 2) $FEED_REGISTRY_PATH
/// 3) config/feeds.toml
/// 4) config/feeds.json
/// 5) built-in table
pub fn load_registry(explicit: Option<&Path>) -> Result<FeedRegistry> {
    let from_env = std::env::var(ENV_REGISTRY_PATH).ok().map(PathBuf::from);
    if let Some(p) = explicit.map(Path::to_path_buf).or(from_env) {
        if p.exists() {
            return load_registry_from(&p);
        }
        return Err(anyhow!(
            "feed registry path {} does not exist",
            p.display()
        ));
    }
    let toml_p = PathBuf::from("config/feeds.toml");
    if toml_p.exists() {
        return load_registry_from(&toml_p);
    }
    let json_p = PathBuf::from("config/feeds.json");
    if json_p.exists() {
        return load_registry_from(&json_p);
    }
    Ok(FeedRegistry::builtin())
}

fn parse_registry(s: &str, hint_ext: &str) -> Result<FeedRegistry> {
    let try_toml = hint_ext == "toml" || s.contains("[feeds]");
    if try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    if let Ok(v) = parse_json(s) {
        return Ok(v);
    }
    if !try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    // Re-run the hinted parser so the caller sees its error, not a generic one.
    if try_toml {
        parse_toml(s)
    } else {
        parse_json(s)
    }
}

fn parse_toml(s: &str) -> Result<FeedRegistry> {
    #[derive(serde::Deserialize)]
    struct TomlRegistry {
        feeds: BTreeMap<String, String>,
    }
    let v: TomlRegistry = toml::from_str(s)?;
    FeedRegistry::from_pairs(v.feeds)
}

fn parse_json(s: &str) -> Result<FeedRegistry> {
    let v: BTreeMap<String, String> = serde_json::from_str(s)?;
    FeedRegistry::from_pairs(v)
}
