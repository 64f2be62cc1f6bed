use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::{Arc, PoisonError, RwLock},
};

pub mod physical;

pub use physical::PhysicalFs;

pub const LOG_TARGET: &str = "fs";

/// Registers the log categories owned by this crate.
pub fn register_log_categories() {
    volkano_log::register_category(LOG_TARGET, log::LevelFilter::Info);
}

#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("the file was not found: {0}")]
    NotFound(PathBuf),
    #[error("a physical I/O error occurred at {0}: {1}")]
    PhysicalIo(PathBuf, std::io::Error),
}

/// An iterator over the files in a directory.
pub type FsIterator = Box<dyn Iterator<Item = PathBuf>>;

/// A filesystem.
pub trait Fs {
    /// Reads a file from the filesystem.
    ///
    /// Returns the contents of the file as a byte array or a file error.
    fn read(&self, path: &Path) -> Result<Arc<[u8]>, FsError>;

    /// Writes a file to the filesystem.
    fn write(&self, path: &Path, data: &[u8]) -> Result<(), FsError>;

    /// Lists the files in a directory.
    ///
    /// If no path is provided, the root directory is listed.
    fn list(&self, path: Option<&Path>) -> FsIterator;
}

/// A filesystem held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryFs {
    files: RwLock<BTreeMap<PathBuf, Arc<[u8]>>>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file, replacing any previous contents.
    pub fn insert(&self, path: impl Into<PathBuf>, data: impl Into<Arc<[u8]>>) {
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into(), data.into());
    }

    pub fn with_file(self, path: impl Into<PathBuf>, data: impl Into<Arc<[u8]>>) -> Self {
        self.insert(path, data);
        self
    }
}

impl Fs for MemoryFs {
    fn read(&self, path: &Path) -> Result<Arc<[u8]>, FsError> {
        self.files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
            .ok_or_else(|| FsError::NotFound(path.to_path_buf()))
    }

    fn write(&self, path: &Path, data: &[u8]) -> Result<(), FsError> {
        self.insert(path, data);
        Ok(())
    }

    fn list(&self, path: Option<&Path>) -> FsIterator {
        let parent = path.unwrap_or(Path::new(""));
        let entries = self
            .files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .filter(|file| file.parent() == Some(parent))
            .cloned()
            .collect::<Vec<_>>();

        Box::new(entries.into_iter())
    }
}
