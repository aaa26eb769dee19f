// src/ingest/providers/direct.rs
//! Minimal `channel/item` extraction: reads `title`, `link` and `pubDate`, nothing else.

use quick_xml::de::from_str;
use serde::Deserialize;

use super::{decode_body, scrub_html_entities_for_xml};
use crate::error::FeedError;
use crate::ingest::types::RawEntry;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

pub fn parse_items(body: &[u8]) -> Result<Vec<RawEntry>, FeedError> {
    let xml = scrub_html_entities_for_xml(&decode_body(body)?);
    let rss: Rss = from_str(&xml).map_err(|e| FeedError::Parse(e.to_string()))?;

    Ok(rss
        .channel
        .item
        .into_iter()
        .map(|it| RawEntry {
            title: it.title.unwrap_or_default(),
            link: it.link.unwrap_or_default(),
            pub_date: it.pub_date.unwrap_or_default(),
        })
        .collect())
}
