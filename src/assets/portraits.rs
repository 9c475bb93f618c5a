// Portrait lookup and decoded-image cache

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{DynamicImage, GenericImageView, ImageReader, imageops::FilterType};
use walkdir::WalkDir;

use super::{clean_filename, is_portrait_file};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortraitEntry {
    pub path: PathBuf,
    pub display_name: String,
}

/// Portrait files found in one directory (not recursive)
#[derive(Debug, Clone, Default)]
pub struct PortraitLibrary {
    dir: PathBuf,
    entries: Vec<PortraitEntry>,
}

impl PortraitLibrary {
    /// Scan `dir` for portrait images. A missing directory gives an empty library.
    pub fn scan(dir: &Path) -> Self {
        if !dir.is_dir() {
            log::warn!("Portrait directory not found: {}", dir.display());
            return Self { dir: dir.to_path_buf(), entries: Vec::new() };
        }

        let mut entries: Vec<PortraitEntry> = WalkDir::new(dir)
            .max_depth(1)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && is_portrait_file(e.path()))
            .map(|e| PortraitEntry {
                display_name: clean_filename(&e.file_name().to_string_lossy()),
                path: e.into_path(),
            })
            .collect();

        // Sort by path for consistent ordering
        entries.sort_by(|a, b| a.path.cmp(&b.path));

        log::info!("Found {} portraits in {}", entries.len(), dir.display());
        Self { dir: dir.to_path_buf(), entries }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn entries(&self) -> &[PortraitEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Portraits whose display name contains `character` (case-insensitive).
    pub fn portraits_for(&self, character: &str) -> Vec<PathBuf> {
        let needle = character.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.entries
            .iter()
            .filter(|e| e.display_name.to_lowercase().contains(&needle))
            .map(|e| e.path.clone())
            .collect()
    }

    /// Sorted, unique display names
    pub fn character_names(&self) -> Vec<String> {
        let names: BTreeSet<&str> = self.entries
            .iter()
            .map(|e| e.display_name.as_str())
            .filter(|n| !n.is_empty())
            .collect();
        names.into_iter().map(str::to_string).collect()
    }
}

// ----- Cache -----

#[derive(Debug, Clone)]
pub enum Portrait {
    Loaded(Arc<DynamicImage>),
    /// Path empty, file missing, or not decodable
    Missing,
}

impl Portrait {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Portrait::Loaded(_))
    }
}

type CacheKey = (PathBuf, u32, u32);

/// Bounded cache of scaled portraits. The least recently used entry is evicted.
#[derive(Debug)]
pub struct PortraitCache {
    capacity: usize,
    tick: u64,
    entries: HashMap<CacheKey, (Arc<DynamicImage>, u64)>,
}

impl PortraitCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            tick: 0,
            entries: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Load `path` scaled to fit `width` x `height`, keeping aspect ratio.
    pub fn load(&mut self, path: &Path, width: u32, height: u32) -> Portrait {
        if path.as_os_str().is_empty() || !path.is_file() {
            return Portrait::Missing;
        }

        self.tick += 1;
        let key = (path.to_path_buf(), width, height);
        if let Some((image, last_used)) = self.entries.get_mut(&key) {
            *last_used = self.tick;
            return Portrait::Loaded(Arc::clone(image));
        }

        let image = match decode_scaled(path, width, height) {
            Ok(image) => Arc::new(image),
            Err(e) => {
                log::warn!("Failed to load portrait {}: {}", path.display(), e);
                return Portrait::Missing;
            }
        };

        if self.entries.len() >= self.capacity {
            self.evict_oldest();
        }
        self.entries.insert(key, (Arc::clone(&image), self.tick));
        Portrait::Loaded(image)
    }

    fn evict_oldest(&mut self) {
        let oldest = self.entries
            .iter()
            .min_by_key(|(_, (_, last_used))| *last_used)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }

    #[cfg(test)]
    fn contains(&self, path: &Path, width: u32, height: u32) -> bool {
        self.entries.contains_key(&(path.to_path_buf(), width, height))
    }
}

fn decode_scaled(path: &Path, width: u32, height: u32) -> Result<DynamicImage> {
    let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    let (w, h) = image.dimensions();
    if w <= width && h <= height {
        return Ok(image);
    }
    // resize() keeps the aspect ratio within the bounds
    Ok(image.resize(width.max(1), height.max(1), FilterType::Triangle))
}
