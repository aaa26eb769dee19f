// src/ingest/providers/mod.rs
pub mod direct;
pub mod tolerant;

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use encoding_rs::{Encoding, UTF_8};
use once_cell::sync::Lazy;
use regex::bytes::Regex;

use crate::error::FeedError;
use crate::ingest::types::RawEntry;

/// How a fetched body is turned into entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseStrategy {
    /// RSS 2.0, RSS 1.0 and Atom; rejects non-feed or truncated documents.
    #[default]
    Tolerant,
    /// RSS 2.0 `channel/item` only.
    Direct,
}

impl ParseStrategy {
    pub fn parse(self, body: &[u8]) -> Result<Vec<RawEntry>, FeedError> {
        match self {
            Self::Tolerant => tolerant::parse_entries(body),
            Self::Direct => direct::parse_items(body),
        }
    }
}

impl FromStr for ParseStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tolerant" | "feed" => Ok(Self::Tolerant),
            "direct" | "xml" => Ok(Self::Direct),
            other => Err(format!("unknown parser '{other}' (expected tolerant|direct)")),
        }
    }
}

impl fmt::Display for ParseStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tolerant => "tolerant",
            Self::Direct => "direct",
        })
    }
}

/// Replace the HTML entities news feeds routinely leak into XML.
pub(crate) fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&middot;", "·")
        .replace("&hellip;", "…")
}

static XML_DECL_ENCODING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(?-u:\xEF\xBB\xBF)?\s*<\?xml[^>]*?\bencoding\s*=\s*["']([A-Za-z0-9._:\-]+)["']"#)
        .expect("static regex")
});

/// Charset named in the `<?xml ... encoding=".."?>` declaration, if any.
fn declared_encoding(body: &[u8]) -> Option<&'static Encoding> {
    let head = &body[..body.len().min(256)];
    let label = XML_DECL_ENCODING.captures(head)?.get(1)?;
    Encoding::for_label(label.as_bytes())
}

/// Decode a feed body to text: BOM first, then the XML declaration, else UTF-8.
pub(crate) fn decode_body(body: &[u8]) -> Result<Cow<'_, str>, FeedError> {
    let encoding = declared_encoding(body).unwrap_or(UTF_8);
    let (text, used, malformed) = encoding.decode(body);
    if malformed {
        return Err(FeedError::Parse(format!(
            "body is not valid {}",
            used.name()
        )));
    }
    Ok(text)
}
