//! Persistent wallpaper database.
//!
//! One JSON document keyed by content hash. Writes are atomic (temp file in
//! the target directory, then rename) and the previous document is copied
//! to a dated backup before the first write of each day.

pub mod reconciler;

pub use reconciler::{Reconciler, SaveOutcome};

use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MuralError;
use crate::wallpaper::Wallpaper;

/// The on-disk document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreData {
    /// When any record in the document last changed.
    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub wallpapers: BTreeMap<String, StoreRecord>,
}

/// One wallpaper's persisted attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreRecord {
    pub paths: Vec<PathBuf>,
    pub format: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub rating: i32,
    #[serde(default)]
    pub purity: i32,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub added: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl StoreRecord {
    /// Snapshots a live wallpaper's full state.
    #[must_use]
    pub fn from_wallpaper(wallpaper: &Wallpaper) -> Self {
        Self {
            paths: wallpaper.paths(),
            format: wallpaper.format().to_string(),
            width: wallpaper.width(),
            height: wallpaper.height(),
            rating: wallpaper.rating(),
            purity: wallpaper.purity(),
            tags: wallpaper.tags().clone(),
            added: wallpaper.added(),
            modified: wallpaper.modified(),
        }
    }
}

/// Handle on the store file.
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    backed_up_on: Cell<Option<NaiveDate>>,
}

impl Store {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path, backed_up_on: Cell::new(None) }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole document. A missing file yields an empty document;
    /// a file that exists but fails to parse is an error, since silently
    /// starting empty would clobber it on the next write.
    ///
    /// # Errors
    ///
    /// Returns [`MuralError::Store`] on unreadable or malformed content.
    pub fn read_all(&self) -> Result<StoreData, MuralError> {
        if !self.path.exists() {
            return Ok(StoreData::default());
        }
        let raw = fs::read_to_string(&self.path).map_err(|err| {
            MuralError::Store(format!("cannot read {}: {err}", self.path.display()))
        })?;
        if raw.trim().is_empty() {
            return Ok(StoreData::default());
        }
        serde_json::from_str(&raw).map_err(|err| {
            MuralError::Store(format!("cannot parse {}: {err}", self.path.display()))
        })
    }

    /// Writes the whole document atomically: serialize into a temp file in
    /// the store's directory, flush, then rename over the target.
    ///
    /// # Errors
    ///
    /// Returns [`MuralError::Store`] when any step fails; the previous
    /// document is left intact in that case.
    pub fn write_all(&self, data: &StoreData) -> Result<(), MuralError> {
        let directory = self.path.parent().map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        fs::create_dir_all(&directory).map_err(|err| {
            MuralError::Store(format!("cannot create {}: {err}", directory.display()))
        })?;

        let mut file = tempfile::NamedTempFile::new_in(&directory).map_err(|err| {
            MuralError::Store(format!("cannot create temp file in {}: {err}", directory.display()))
        })?;
        serde_json::to_writer_pretty(&mut file, data)
            .map_err(|err| MuralError::Store(format!("cannot serialize store: {err}")))?;
        file.flush()
            .map_err(|err| MuralError::Store(format!("cannot flush store: {err}")))?;
        file.persist(&self.path).map_err(|err| {
            MuralError::Store(format!("cannot replace {}: {err}", self.path.display()))
        })?;
        Ok(())
    }

    /// Copies the current document to `<store>.bak-YYYY-MM-DD` once per
    /// calendar day, before the day's first write. Missing store file or an
    /// already-present backup are both no-ops.
    ///
    /// # Errors
    ///
    /// Returns [`MuralError::Store`] when the copy itself fails.
    pub fn backup_daily(&self) -> Result<(), MuralError> {
        let today = Utc::now().date_naive();
        if self.backed_up_on.get() == Some(today) || !self.path.exists() {
            return Ok(());
        }

        let backup = self.backup_path(today);
        if !backup.exists() {
            fs::copy(&self.path, &backup).map_err(|err| {
                MuralError::Store(format!("cannot back up to {}: {err}", backup.display()))
            })?;
            tracing::info!(path = %backup.display(), "wrote daily store backup");
        }
        self.backed_up_on.set(Some(today));
        Ok(())
    }

    fn backup_path(&self, date: NaiveDate) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(format!(".bak-{}", date.format("%Y-%m-%d")));
        PathBuf::from(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_data() -> StoreData {
        let mut wallpapers = BTreeMap::new();
        wallpapers.insert(
            "abc123".to_string(),
            StoreRecord {
                paths: vec![PathBuf::from("/w/a.png")],
                format: "PNG".to_string(),
                width: 1920,
                height: 1080,
                rating: 2,
                purity: -1,
                tags: BTreeSet::from(["nature".to_string()]),
                added: Utc::now(),
                modified: Utc::now(),
            },
        );
        StoreData { modified: Some(Utc::now()), wallpapers }
    }

    #[test]
    fn test_missing_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path().join("store.json"));
        let data = store.read_all().unwrap();
        assert!(data.wallpapers.is_empty());
        assert!(data.modified.is_none());
    }

    #[test]
    fn test_write_then_read_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path().join("store.json"));
        let data = sample_data();
        store.write_all(&data).unwrap();

        let loaded = store.read_all().unwrap();
        assert_eq!(loaded.wallpapers, data.wallpapers);
    }

    #[test]
    fn test_write_creates_missing_directories() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path().join("nested/deeper/store.json"));
        store.write_all(&sample_data()).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_empty_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "").unwrap();
        assert!(Store::new(path).read_all().unwrap().wallpapers.is_empty());
    }

    #[test]
    fn test_malformed_document_is_an_error_not_an_empty_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "{ not json").unwrap();

        let store = Store::new(path);
        assert!(matches!(store.read_all(), Err(MuralError::Store(_))));
    }

    #[test]
    fn test_write_leaves_no_temp_files_behind() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path().join("store.json"));
        store.write_all(&sample_data()).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_daily_backup_runs_once() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path().join("store.json"));
        store.write_all(&sample_data()).unwrap();

        store.backup_daily().unwrap();
        store.backup_daily().unwrap();

        let backups: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().contains(".bak-"))
            .collect();
        assert_eq!(backups.len(), 1);
    }

    #[test]
    fn test_backup_without_store_file_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path().join("store.json"));
        store.backup_daily().unwrap();
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_omitted_optional_fields_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        fs::write(
            &path,
            r#"{"wallpapers": {"h": {
                "paths": ["/w/a.png"], "format": "PNG",
                "width": 10, "height": 10,
                "added": "2026-01-01T00:00:00Z",
                "modified": "2026-01-01T00:00:00Z"
            }}}"#,
        )
        .unwrap();

        let data = Store::new(path).read_all().unwrap();
        let record = &data.wallpapers["h"];
        assert_eq!(record.rating, 0);
        assert_eq!(record.purity, 0);
        assert!(record.tags.is_empty());
    }
}
