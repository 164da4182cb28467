//! Library assembly.
//!
//! Walks the configured sources, fingerprints every readable image in
//! parallel, merges the results with persisted attributes, applies the
//! filter query, and produces the ordered pool the engine rotates over.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use rand::seq::SliceRandom;
use rayon::prelude::*;
use sha2::{Digest, Sha256};

use crate::error::MuralError;
use crate::query::Query;
use crate::store::{Store, StoreRecord};
use crate::wallpaper::{SourcePath, Wallpaper};

const IMAGE_EXTENSIONS: &[&str] =
    &["jpg", "jpeg", "png", "gif", "bmp", "webp", "tif", "tiff"];

/// How the assembled pool is ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PoolOrder {
    #[default]
    Shuffle,
    Sorted,
}

/// The assembled wallpaper pool.
#[derive(Debug)]
pub struct Library {
    pool: Rc<Vec<Rc<Wallpaper>>>,
}

/// Send-safe result of probing one file, produced on the rayon pool before
/// any shared-state wallpaper objects exist.
#[derive(Debug)]
struct ProbedImage {
    path: PathBuf,
    hash: String,
    width: u32,
    height: u32,
    format: String,
}

impl Library {
    /// Assembles the pool from `sources` (files or directories, `~`
    /// expanded, directories walked recursively).
    ///
    /// # Errors
    ///
    /// Returns [`MuralError::NoWallpapers`] when nothing survives
    /// discovery and filtering; store read failures propagate as
    /// [`MuralError::Store`]. Individual unreadable files are logged and
    /// skipped, never fatal.
    pub fn assemble(
        sources: &[String],
        store: &Store,
        query: Option<&Query>,
        order: PoolOrder,
    ) -> Result<Self, MuralError> {
        let records = store.read_all()?.wallpapers;
        let candidates = if sources.is_empty() {
            // No sources given: rotate over everything the store knows
            // about that still exists on disk.
            Self::from_store(&records)
        } else {
            Self::from_discovery(sources, &records)
        };

        let mut pool: Vec<Rc<Wallpaper>> = candidates
            .into_iter()
            .filter(|wallpaper| query.is_none_or(|q| q.matches(wallpaper)))
            .collect();

        if pool.is_empty() {
            return Err(MuralError::NoWallpapers);
        }

        match order {
            PoolOrder::Shuffle => pool.shuffle(&mut rand::rng()),
            PoolOrder::Sorted => pool.sort_by(|a, b| {
                let left = a.preferred_path().unwrap_or_default();
                let right = b.preferred_path().unwrap_or_default();
                natord::compare(&left.to_string_lossy(), &right.to_string_lossy())
            }),
        }

        tracing::info!(count = pool.len(), "assembled wallpaper pool");
        Ok(Self { pool: Rc::new(pool) })
    }

    fn from_discovery(
        sources: &[String],
        records: &BTreeMap<String, StoreRecord>,
    ) -> Vec<Rc<Wallpaper>> {
        let files = discover_files(sources);
        tracing::info!(count = files.len(), "discovered candidate files");

        let probed: Vec<ProbedImage> = files
            .par_iter()
            .filter_map(|path| match probe_image(path) {
                Ok(image) => Some(image),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping file");
                    None
                }
            })
            .collect();

        // Duplicate files collapse onto one wallpaper per content hash.
        let mut grouped: BTreeMap<String, (ProbedImage, Vec<PathBuf>)> = BTreeMap::new();
        for image in probed {
            let path = image.path.clone();
            grouped
                .entry(image.hash.clone())
                .or_insert_with(|| (image, Vec::new()))
                .1
                .push(path);
        }

        grouped
            .into_iter()
            .map(|(hash, (image, paths))| {
                Rc::new(match records.get(&hash) {
                    Some(record) => merge_record(hash, &image, paths, record),
                    None => Wallpaper::new(hash, image.width, image.height, image.format, paths),
                })
            })
            .collect()
    }

    fn from_store(records: &BTreeMap<String, StoreRecord>) -> Vec<Rc<Wallpaper>> {
        records
            .iter()
            .filter_map(|(hash, record)| {
                let paths: Vec<SourcePath> = record
                    .paths
                    .iter()
                    .map(|path| SourcePath { path: path.clone(), valid: path.exists() })
                    .collect();
                if !paths.iter().any(|entry| entry.valid) {
                    tracing::debug!(hash, "skipping stored wallpaper with no existing path");
                    return None;
                }
                Some(Rc::new(Wallpaper::restore(
                    hash.clone(),
                    record.width,
                    record.height,
                    record.format.clone(),
                    paths,
                    record.rating,
                    record.purity,
                    record.tags.clone(),
                    record.added,
                    record.modified,
                )))
            })
            .collect()
    }

    #[must_use]
    pub fn pool(&self) -> Rc<Vec<Rc<Wallpaper>>> {
        Rc::clone(&self.pool)
    }

    #[must_use]
    pub fn wallpapers(&self) -> &[Rc<Wallpaper>] {
        &self.pool
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }
}

/// Rebuilds a wallpaper from its stored record plus the freshly discovered
/// paths. Discovered paths are valid by observation; stored paths that did
/// not show up this run keep their record but are re-checked on disk.
fn merge_record(
    hash: String,
    image: &ProbedImage,
    discovered: Vec<PathBuf>,
    record: &StoreRecord,
) -> Wallpaper {
    let mut paths: Vec<SourcePath> = discovered
        .into_iter()
        .map(|path| SourcePath { path, valid: true })
        .collect();
    for stored in &record.paths {
        if !paths.iter().any(|entry| entry.path == *stored) {
            paths.push(SourcePath { path: stored.clone(), valid: stored.exists() });
        }
    }

    Wallpaper::restore(
        hash,
        image.width,
        image.height,
        image.format.clone(),
        paths,
        record.rating,
        record.purity,
        record.tags.clone(),
        record.added,
        record.modified,
    )
}

fn discover_files(sources: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for source in sources {
        let expanded = shellexpand::tilde(source);
        let path = PathBuf::from(expanded.as_ref());
        if path.is_dir() {
            walk_directory(&path, &mut files);
        } else if path.is_file() {
            files.push(path);
        } else {
            tracing::warn!(source = %path.display(), "source does not exist");
        }
    }
    files.sort();
    files.dedup();
    files
}

fn walk_directory(directory: &Path, files: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!(path = %directory.display(), error = %err, "cannot read directory");
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk_directory(&path, files);
        } else if has_image_extension(&path) {
            files.push(path);
        }
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known))
        })
}

fn probe_image(path: &Path) -> Result<ProbedImage, MuralError> {
    let bytes = fs::read(path)?;
    let hash = hex_digest(&bytes);

    let reader = image::ImageReader::new(std::io::Cursor::new(bytes)).with_guessed_format()?;
    let format = reader
        .format()
        .map(|format| format!("{format:?}").to_uppercase())
        .unwrap_or_else(|| "UNKNOWN".to_string());
    let (width, height) = reader.into_dimensions()?;

    Ok(ProbedImage { path: path.to_path_buf(), hash, width, height, format })
}

fn hex_digest(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::BufWriter;
    use tempfile::TempDir;

    /// Writes a tiny valid PNG whose pixel value makes the content unique.
    fn write_png(path: &Path, seed: u8) {
        use image::ImageEncoder;

        let file = BufWriter::new(File::create(path).unwrap());
        image::codecs::png::PngEncoder::new(file)
            .write_image(&[seed; 4 * 2 * 3], 4, 2, image::ExtendedColorType::Rgb8)
            .unwrap();
    }

    fn store_in(dir: &TempDir) -> Store {
        Store::new(dir.path().join("store.json"))
    }

    #[test]
    fn test_assemble_from_directory() {
        let dir = TempDir::new().unwrap();
        let images = dir.path().join("images");
        fs::create_dir(&images).unwrap();
        write_png(&images.join("a.png"), 1);
        write_png(&images.join("b.png"), 2);
        fs::write(images.join("notes.txt"), "not an image").unwrap();

        let library = Library::assemble(
            &[images.to_string_lossy().into_owned()],
            &store_in(&dir),
            None,
            PoolOrder::Sorted,
        )
        .unwrap();

        assert_eq!(library.len(), 2);
    }

    #[test]
    fn test_nested_directories_are_walked() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("images/deep/deeper");
        fs::create_dir_all(&nested).unwrap();
        write_png(&nested.join("a.png"), 1);

        let library = Library::assemble(
            &[dir.path().join("images").to_string_lossy().into_owned()],
            &store_in(&dir),
            None,
            PoolOrder::Sorted,
        )
        .unwrap();
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn test_duplicate_content_collapses_to_one_wallpaper() {
        let dir = TempDir::new().unwrap();
        let images = dir.path().join("images");
        fs::create_dir(&images).unwrap();
        write_png(&images.join("a.png"), 7);
        write_png(&images.join("copy-of-a.png"), 7);

        let library = Library::assemble(
            &[images.to_string_lossy().into_owned()],
            &store_in(&dir),
            None,
            PoolOrder::Sorted,
        )
        .unwrap();

        assert_eq!(library.len(), 1);
        assert_eq!(library.wallpapers()[0].paths().len(), 2);
    }

    #[test]
    fn test_unreadable_image_is_skipped_not_fatal() {
        let dir = TempDir::new().unwrap();
        let images = dir.path().join("images");
        fs::create_dir(&images).unwrap();
        write_png(&images.join("good.png"), 1);
        fs::write(images.join("broken.png"), "not a png at all").unwrap();

        let library = Library::assemble(
            &[images.to_string_lossy().into_owned()],
            &store_in(&dir),
            None,
            PoolOrder::Sorted,
        )
        .unwrap();
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn test_empty_discovery_is_fatal() {
        let dir = TempDir::new().unwrap();
        let images = dir.path().join("images");
        fs::create_dir(&images).unwrap();

        let result = Library::assemble(
            &[images.to_string_lossy().into_owned()],
            &store_in(&dir),
            None,
            PoolOrder::Sorted,
        );
        assert!(matches!(result, Err(MuralError::NoWallpapers)));
    }

    #[test]
    fn test_store_attributes_are_restored() {
        let dir = TempDir::new().unwrap();
        let images = dir.path().join("images");
        fs::create_dir(&images).unwrap();
        let image_path = images.join("a.png");
        write_png(&image_path, 3);

        let store = store_in(&dir);
        // First pass discovers, rates, and saves.
        let library = Library::assemble(
            &[images.to_string_lossy().into_owned()],
            &store,
            None,
            PoolOrder::Sorted,
        )
        .unwrap();
        library.wallpapers()[0].adjust_rating(4);
        library.wallpapers()[0].toggle_tag("keeper");
        crate::store::Reconciler::new(Store::new(store.path().to_path_buf()))
            .save(library.wallpapers())
            .unwrap();

        // Second pass restores the attributes from disk.
        let reloaded = Library::assemble(
            &[images.to_string_lossy().into_owned()],
            &store,
            None,
            PoolOrder::Sorted,
        )
        .unwrap();
        assert_eq!(reloaded.wallpapers()[0].rating(), 4);
        assert!(reloaded.wallpapers()[0].tags().contains("keeper"));
        assert!(!reloaded.wallpapers()[0].is_dirty());
    }

    #[test]
    fn test_stored_path_that_vanished_is_kept_but_invalid() {
        let dir = TempDir::new().unwrap();
        let images = dir.path().join("images");
        fs::create_dir(&images).unwrap();
        let image_path = images.join("a.png");
        write_png(&image_path, 5);

        let store = store_in(&dir);
        let library = Library::assemble(
            &[images.to_string_lossy().into_owned()],
            &store,
            None,
            PoolOrder::Sorted,
        )
        .unwrap();
        let hash = library.wallpapers()[0].hash().to_string();

        // Persist a record with an extra path that does not exist.
        let mut data = store.read_all().unwrap();
        data.wallpapers.insert(
            hash,
            StoreRecord {
                paths: vec![image_path.clone(), images.join("gone.png")],
                ..StoreRecord::from_wallpaper(&library.wallpapers()[0])
            },
        );
        store.write_all(&data).unwrap();

        let reloaded = Library::assemble(
            &[images.to_string_lossy().into_owned()],
            &store,
            None,
            PoolOrder::Sorted,
        )
        .unwrap();
        let wallpaper = &reloaded.wallpapers()[0];
        assert_eq!(wallpaper.paths().len(), 2);
        assert_eq!(wallpaper.preferred_path(), Some(image_path));
    }

    #[test]
    fn test_no_sources_rotates_over_store_records() {
        let dir = TempDir::new().unwrap();
        let images = dir.path().join("images");
        fs::create_dir(&images).unwrap();
        write_png(&images.join("a.png"), 1);
        write_png(&images.join("b.png"), 2);

        let store = store_in(&dir);
        let library = Library::assemble(
            &[images.to_string_lossy().into_owned()],
            &store,
            None,
            PoolOrder::Sorted,
        )
        .unwrap();
        for wallpaper in library.wallpapers() {
            wallpaper.adjust_rating(1);
        }
        crate::store::Reconciler::new(Store::new(store.path().to_path_buf()))
            .save(library.wallpapers())
            .unwrap();

        // One source file disappears; its record is skipped, the other
        // survives with its attributes.
        fs::remove_file(images.join("b.png")).unwrap();
        let from_store = Library::assemble(&[], &store, None, PoolOrder::Sorted).unwrap();
        assert_eq!(from_store.len(), 1);
        assert_eq!(from_store.wallpapers()[0].rating(), 1);
    }

    #[test]
    fn test_no_sources_and_empty_store_is_fatal() {
        let dir = TempDir::new().unwrap();
        let result = Library::assemble(&[], &store_in(&dir), None, PoolOrder::Sorted);
        assert!(matches!(result, Err(MuralError::NoWallpapers)));
    }

    #[test]
    fn test_query_filters_the_pool() {
        let dir = TempDir::new().unwrap();
        let images = dir.path().join("images");
        fs::create_dir(&images).unwrap();
        write_png(&images.join("a.png"), 1);
        write_png(&images.join("b.png"), 2);

        let store = store_in(&dir);
        let library = Library::assemble(
            &[images.to_string_lossy().into_owned()],
            &store,
            None,
            PoolOrder::Sorted,
        )
        .unwrap();
        library.wallpapers()[0].toggle_tag("keep");
        crate::store::Reconciler::new(Store::new(store.path().to_path_buf()))
            .save(library.wallpapers())
            .unwrap();

        let query = Query::parse("tag:keep").unwrap();
        let filtered = Library::assemble(
            &[images.to_string_lossy().into_owned()],
            &store,
            Some(&query),
            PoolOrder::Sorted,
        )
        .unwrap();
        assert_eq!(filtered.len(), 1);
        assert!(filtered.wallpapers()[0].tags().contains("keep"));
    }

    #[test]
    fn test_sorted_order_is_natural() {
        let dir = TempDir::new().unwrap();
        let images = dir.path().join("images");
        fs::create_dir(&images).unwrap();
        write_png(&images.join("img2.png"), 1);
        write_png(&images.join("img10.png"), 2);
        write_png(&images.join("img1.png"), 3);

        let library = Library::assemble(
            &[images.to_string_lossy().into_owned()],
            &store_in(&dir),
            None,
            PoolOrder::Sorted,
        )
        .unwrap();

        let names: Vec<String> = library
            .wallpapers()
            .iter()
            .map(|w| {
                w.preferred_path()
                    .unwrap()
                    .file_name()
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        assert_eq!(names, vec!["img1.png", "img2.png", "img10.png"]);
    }

    #[test]
    fn test_single_file_source() {
        let dir = TempDir::new().unwrap();
        let image_path = dir.path().join("single.png");
        write_png(&image_path, 9);

        let library = Library::assemble(
            &[image_path.to_string_lossy().into_owned()],
            &store_in(&dir),
            None,
            PoolOrder::Sorted,
        )
        .unwrap();
        assert_eq!(library.len(), 1);
        assert_eq!(library.wallpapers()[0].format(), "PNG");
        assert_eq!(
            (library.wallpapers()[0].width(), library.wallpapers()[0].height()),
            (4, 2)
        );
    }
}
