// src/ingest/providers/tolerant.rs
//! Event-stream feed reader for RSS 2.0, RSS 1.0 (RDF) and Atom.
//!
//! Unknown elements are skipped and missing fields become empty strings, but
//! anything that is not a complete feed document is reported as
//! [`FeedError::Parse`]: bodies without a feed root element, mismatched tags
//! and documents that end with elements still open.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{decode_body, scrub_html_entities_for_xml};
use crate::error::FeedError;
use crate::ingest::types::RawEntry;

const FEED_ROOTS: [&str; 3] = ["rss", "RDF", "feed"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    PubDate,
    FallbackDate,
}

impl Field {
    fn from_tag(name: &str) -> Option<Self> {
        match name {
            "title" => Some(Self::Title),
            "link" => Some(Self::Link),
            "pubDate" | "published" => Some(Self::PubDate),
            "updated" | "dc:date" => Some(Self::FallbackDate),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct EntryBuilder {
    title: String,
    link: String,
    link_is_alternate: bool,
    pub_date: String,
    fallback_date: String,
}

impl EntryBuilder {
    fn push_text(&mut self, field: Field, text: &str) {
        let slot = match field {
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::PubDate => &mut self.pub_date,
            Field::FallbackDate => &mut self.fallback_date,
        };
        slot.push_str(text);
    }

    /// Atom `<link href=".." rel=".."/>`; the first alternate link wins.
    fn take_atom_link(&mut self, e: &BytesStart<'_>) {
        let Some(href) = attr(e, "href") else {
            return;
        };
        let alternate = attr(e, "rel").map_or(true, |rel| rel == "alternate");
        if self.link.is_empty() || (alternate && !self.link_is_alternate) {
            self.link = href;
            self.link_is_alternate = alternate;
        }
    }

    fn finish(self) -> RawEntry {
        let pub_date = if self.pub_date.is_empty() {
            self.fallback_date
        } else {
            self.pub_date
        };
        RawEntry {
            title: self.title,
            link: self.link.trim().to_string(),
            pub_date: pub_date.trim().to_string(),
        }
    }
}

fn attr(e: &BytesStart<'_>, key: &str) -> Option<String> {
    e.try_get_attribute(key)
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.into_owned())
}

fn qualified_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn parse_error(reader: &Reader<&[u8]>, msg: impl std::fmt::Display) -> FeedError {
    FeedError::Parse(format!("{msg} (at byte {})", reader.buffer_position()))
}

/// Parse a feed body into raw entries, in document order.
pub fn parse_entries(body: &[u8]) -> Result<Vec<RawEntry>, FeedError> {
    let xml = scrub_html_entities_for_xml(&decode_body(body)?);
    let mut reader = Reader::from_str(&xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut seen_root = false;
    let mut depth = 0usize;
    let mut entry: Option<EntryBuilder> = None;
    let mut entry_depth = 0usize;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                if !seen_root {
                    let root = local_name(&e);
                    if !FEED_ROOTS.contains(&root.as_str()) {
                        return Err(parse_error(
                            &reader,
                            format!("<{root}> is not an RSS or Atom root element"),
                        ));
                    }
                    seen_root = true;
                    continue;
                }
                if entry.is_none() {
                    let name = local_name(&e);
                    if name == "item" || name == "entry" {
                        entry = Some(EntryBuilder::default());
                        entry_depth = depth;
                    }
                } else if depth == entry_depth + 1 {
                    field = Field::from_tag(&qualified_name(&e));
                    if let (Some(builder), Some(Field::Link)) = (entry.as_mut(), field) {
                        builder.take_atom_link(&e);
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                if !seen_root {
                    let root = local_name(&e);
                    if !FEED_ROOTS.contains(&root.as_str()) {
                        return Err(parse_error(
                            &reader,
                            format!("<{root}/> is not an RSS or Atom root element"),
                        ));
                    }
                    seen_root = true;
                    continue;
                }
                if let Some(builder) = entry.as_mut() {
                    if depth == entry_depth && qualified_name(&e) == "link" {
                        builder.take_atom_link(&e);
                    }
                }
            }
            Ok(Event::End(_)) => {
                if entry.is_some() {
                    if depth == entry_depth {
                        if let Some(builder) = entry.take() {
                            entries.push(builder.finish());
                        }
                        field = None;
                    } else if depth == entry_depth + 1 {
                        field = None;
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Text(t)) => {
                if let (Some(builder), Some(f)) = (entry.as_mut(), field) {
                    let text = t
                        .unescape()
                        .map_err(|e| parse_error(&reader, format!("bad text node: {e}")))?;
                    builder.push_text(f, &text);
                }
            }
            Ok(Event::CData(c)) => {
                if let (Some(builder), Some(f)) = (entry.as_mut(), field) {
                    builder.push_text(f, &String::from_utf8_lossy(c.as_ref()));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(parse_error(&reader, e)),
            _ => {}
        }
    }

    if !seen_root {
        return Err(FeedError::Parse("document contains no XML elements".into()));
    }
    if depth != 0 {
        return Err(FeedError::Parse(format!(
            "unexpected end of document with {depth} element(s) still open"
        )));
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS2: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom">
  <channel>
    <title>한국경제 IT</title>
    <atom:link href="https://example.test/feed" rel="self"/>
    <item>
      <title><![CDATA[ AI 반도체 투자 확대 ]]></title>
      <link>https://example.test/it/1</link>
      <pubDate>Wed, 01 May 2024 09:00:00 +0900</pubDate>
    </item>
    <item>
      <title>Cloud &amp; edge</title>
      <link>https://example.test/it/2</link>
      <description><![CDATA[<p>ignored</p>]]></description>
    </item>
  </channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Example</title>
  <link href="https://example.test/"/>
  <entry>
    <title>First</title>
    <link rel="self" href="https://example.test/self/1"/>
    <link rel="alternate" href="https://example.test/posts/1"/>
    <updated>2024-05-01T00:00:00Z</updated>
  </entry>
  <entry>
    <title>Second</title>
    <link href="https://example.test/posts/2"/>
    <published>2024-04-30T10:00:00+09:00</published>
    <updated>2024-05-01T00:00:00Z</updated>
  </entry>
</feed>"#;

    #[test]
    fn rss2_items_in_document_order() {
        let out = parse_entries(RSS2.as_bytes()).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].title, " AI 반도체 투자 확대 ");
        assert_eq!(out[0].link, "https://example.test/it/1");
        assert_eq!(out[0].pub_date, "Wed, 01 May 2024 09:00:00 +0900");
        assert_eq!(out[1].title, "Cloud & edge");
        assert_eq!(out[1].pub_date, "");
    }

    #[test]
    fn atom_entries_prefer_alternate_link_and_published() {
        let out = parse_entries(ATOM.as_bytes()).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].link, "https://example.test/posts/1");
        assert_eq!(out[0].pub_date, "2024-05-01T00:00:00Z");
        assert_eq!(out[1].link, "https://example.test/posts/2");
        assert_eq!(out[1].pub_date, "2024-04-30T10:00:00+09:00");
    }

    #[test]
    fn truncated_body_is_rejected() {
        let cut = &RSS2[..RSS2.find("</item>").unwrap()];
        assert!(matches!(
            parse_entries(cut.as_bytes()),
            Err(FeedError::Parse(_))
        ));
    }

    #[test]
    fn html_page_is_rejected() {
        let html = "<html><body><p>Moved</p></body></html>";
        let err = parse_entries(html.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("<html>"), "{err}");
    }

    #[test]
    fn plain_text_is_rejected() {
        assert!(matches!(
            parse_entries(b"service unavailable"),
            Err(FeedError::Parse(_))
        ));
    }

    #[test]
    fn well_formed_feed_without_items_yields_nothing() {
        let xml = r#"<rss version="2.0"><channel><title>t</title></channel></rss>"#;
        assert!(parse_entries(xml.as_bytes()).unwrap().is_empty());
    }
}
