use std::{
    borrow::Cow,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{Fs, FsError, FsIterator, LOG_TARGET};

/// A filesystem rooted at a directory on disk.
pub struct PhysicalFs {
    root: PathBuf,
}

impl PhysicalFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn map_io_error(path: PathBuf, error: std::io::Error) -> FsError {
    match error.kind() {
        std::io::ErrorKind::NotFound => FsError::NotFound(path),
        _ => FsError::PhysicalIo(path, error),
    }
}

impl Fs for PhysicalFs {
    fn read(&self, path: &Path) -> Result<Arc<[u8]>, FsError> {
        let path = self.root.join(path);
        log::debug!(target: LOG_TARGET, "reading {}", path.display());

        match std::fs::read(&path) {
            Ok(data) => Ok(Arc::from(data)),
            Err(error) => Err(map_io_error(path, error)),
        }
    }

    fn write(&self, path: &Path, data: &[u8]) -> Result<(), FsError> {
        let path = self.root.join(path);
        std::fs::write(&path, data).map_err(|error| map_io_error(path, error))
    }

    fn list(&self, path: Option<&Path>) -> FsIterator {
        let path = match path {
            Some(path) => Cow::Owned(self.root.join(path)),
            None => Cow::Borrowed(&self.root),
        };

        match std::fs::read_dir(&*path) {
            Ok(entries) => {
                let root = self.root.clone();
                let entries = entries.into_iter().filter_map(move |entry| {
                    let entry = entry.ok()?;

                    // Strip the root prefix from the entry path.
                    let path = entry.path().strip_prefix(&root).ok()?.to_path_buf();

                    Some(path)
                });

                Box::new(entries)
            }
            Err(error) => {
                log::warn!(target: LOG_TARGET, "cannot list {}: {error}", path.display());
                Box::new(std::iter::empty())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("volkano-fs-{}-{name}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_physical_fs_round_trip() {
        let dir = scratch_dir("round-trip");
        let fs = PhysicalFs::new(&dir);

        fs.write(Path::new("triangle.vert.spv"), &[3, 2, 0x23, 7]).unwrap();
        let data = fs.read(Path::new("triangle.vert.spv")).unwrap();

        assert_eq!(&*data, &[3, 2, 0x23, 7]);
        assert_eq!(
            fs.list(None).collect::<Vec<_>>(),
            vec![PathBuf::from("triangle.vert.spv")]
        );

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_physical_fs_missing_file_is_not_found() {
        let dir = scratch_dir("missing");
        let fs = PhysicalFs::new(&dir);

        let error = fs.read(Path::new("nope.spv")).unwrap_err();
        assert!(matches!(error, FsError::NotFound(path) if path.ends_with("nope.spv")));
    }
}
