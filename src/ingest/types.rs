// src/ingest/types.rs
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// One normalized feed entry, as persisted in the daily artifact.
///
/// Field order is the on-disk order: `title`, `link`, `pub_date`, `fetched_at`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    pub title: String,
    pub link: String,
    /// Feed-native publish date, copied verbatim.
    pub pub_date: String,
    #[serde(serialize_with = "serialize_utc_micros")]
    pub fetched_at: DateTime<Utc>,
}

impl Item {
    pub fn from_entry_at(entry: RawEntry, fetched_at: DateTime<Utc>) -> Self {
        Self {
            title: entry.title.trim().to_string(),
            link: entry.link,
            pub_date: entry.pub_date,
            fetched_at,
        }
    }
}

/// Current UTC time truncated to what the artifact format can carry.
pub fn collection_instant() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn serialize_utc_micros<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Micros, true))
}

/// An entry as pulled out of the XML, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntry {
    pub title: String,
    pub link: String,
    pub pub_date: String,
}

/// A registered feed: lowercase id plus its URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedTarget {
    pub id: String,
    pub url: String,
}
