// src/artifact/mod.rs
//! Dated JSON snapshots: `data/<YYYY-MM-DD>/<target>.json`.

pub mod github;
pub mod sink;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tempfile::NamedTempFile;

use crate::error::ArtifactError;
use crate::ingest::types::Item;

pub const DEFAULT_DATA_DIR: &str = "data";

/// Repository-relative artifact path, identical for the local file and the remote copy.
pub fn artifact_path(date: NaiveDate, target: &str) -> String {
    format!(
        "{DEFAULT_DATA_DIR}/{}/{}.json",
        date.format("%Y-%m-%d"),
        target.to_ascii_lowercase()
    )
}

/// Pretty-printed UTF-8 JSON array; non-ASCII text is written as-is.
pub fn render(items: &[Item]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(items)
}

#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    root: PathBuf,
}

impl Default for ArtifactWriter {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_DIR)
    }
}

impl ArtifactWriter {
    /// `root` replaces the leading `data/` of the artifact path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, date: NaiveDate, target: &str) -> PathBuf {
        self.root
            .join(date.format("%Y-%m-%d").to_string())
            .join(format!("{}.json", target.to_ascii_lowercase()))
    }

    /// Replace the artifact for `(date, target)` with `items`.
    ///
    /// The file is written next to its destination and renamed into place, so
    /// readers see either the previous snapshot or the complete new one.
    pub fn write(
        &self,
        target: &str,
        date: NaiveDate,
        items: &[Item],
    ) -> Result<PathBuf, ArtifactError> {
        let path = self.path_for(date, target);
        let body = render(items)?;
        let dir = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| io_err(dir, e))?;
        tmp.write_all(body.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| io_err(tmp.path(), e))?;
        tmp.persist(&path).map_err(|e| io_err(&path, e.error))?;

        tracing::info!(path = %path.display(), count = items.len(), "artifact written");
        Ok(path)
    }

    pub fn read(&self, target: &str, date: NaiveDate) -> Result<Vec<Item>, ArtifactError> {
        let path = self.path_for(date, target);
        let raw = fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        Ok(serde_json::from_str(&raw)?)
    }
}

fn io_err(path: &Path, source: std::io::Error) -> ArtifactError {
    ArtifactError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::{collection_instant, RawEntry};

    fn item(title: &str) -> Item {
        Item::from_entry_at(
            RawEntry {
                title: title.into(),
                link: "https://example.test/a".into(),
                pub_date: "Wed, 01 May 2024 09:00:00 +0900".into(),
            },
            collection_instant(),
        )
    }

    #[test]
    fn path_layout_is_dated_and_lowercase() {
        let d = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(artifact_path(d, "MK_Economy"), "data/2024-05-01/mk_economy.json");
        let w = ArtifactWriter::new("/tmp/out");
        assert_eq!(
            w.path_for(d, "hk_it"),
            PathBuf::from("/tmp/out/2024-05-01/hk_it.json")
        );
    }

    #[test]
    fn render_keeps_non_ascii_and_field_order() {
        let body = render(&[item("코스피 상승")]).unwrap();
        assert!(body.contains("코스피 상승"));
        let t = body.find("\"title\"").unwrap();
        let l = body.find("\"link\"").unwrap();
        let p = body.find("\"pub_date\"").unwrap();
        let f = body.find("\"fetched_at\"").unwrap();
        assert!(t < l && l < p && p < f);
        assert!(body.starts_with("[\n  {"));
    }

    #[test]
    fn write_creates_directories_and_leaves_no_temp_files() {
        let tmp = tempfile::tempdir().unwrap();
        let w = ArtifactWriter::new(tmp.path().join("data"));
        let d = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let path = w.write("hk_it", d, &[item("a")]).unwrap();
        assert!(path.exists());
        let names: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("hk_it.json")]);
    }
}
