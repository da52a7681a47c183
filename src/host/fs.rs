//! Storage backed by a directory on the host filesystem.

use log::warn;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use crate::error::StorageError;
use crate::hal::{ByteStream, Entry, Storage};

pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let mut full = self.root.clone();
        for part in path.split('/').filter(|part| !part.is_empty()) {
            full.push(part);
        }
        full
    }
}

impl Storage for FsStorage {
    /// List a directory in the order the filesystem returns it.
    fn enumerate(&self, path: &str) -> Result<Vec<Entry>, StorageError> {
        let dir = self.resolve(path);
        if dir.is_file() {
            return Err(StorageError::NotADirectory(path.to_string()));
        }
        let read_dir = fs::read_dir(&dir).map_err(|e| StorageError::unavailable(path, e))?;

        let mut entries = Vec::new();
        for item in read_dir {
            let item = match item {
                Ok(item) => item,
                Err(e) => {
                    warn!("Skipping unreadable entry in '{}': {e}", dir.display());
                    continue;
                }
            };
            let name = item.file_name().to_string_lossy().into_owned();
            match item.file_type() {
                Ok(kind) if kind.is_dir() => entries.push(Entry::directory(name)),
                Ok(_) => entries.push(Entry::file(name)),
                Err(e) => warn!("Skipping '{name}': {e}"),
            }
        }
        Ok(entries)
    }

    fn open(&self, path: &str) -> Result<Box<dyn ByteStream>, StorageError> {
        let full = self.resolve(path);
        if full.is_dir() {
            return Err(StorageError::unavailable(
                path,
                io::Error::other("is a directory"),
            ));
        }
        let file = File::open(&full).map_err(|e| StorageError::unavailable(path, e))?;
        Ok(Box::new(BufReader::new(file)))
    }
}
