//! The persisted byte region, kept in a small file next to the config.

use log::debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::constants::EEPROM_SIZE;
use crate::error::PersistError;
use crate::hal::PersistentStore;

/// Writes are staged in memory and reach the file on `commit`.
pub struct FileEeprom {
    path: PathBuf,
    bytes: [u8; EEPROM_SIZE],
}

impl FileEeprom {
    /// Load the region from `path`; a missing file reads as all zeros.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PersistError> {
        let path = path.into();
        let mut bytes = [0u8; EEPROM_SIZE];
        match fs::read(&path) {
            Ok(stored) => {
                let len = stored.len().min(EEPROM_SIZE);
                bytes[..len].copy_from_slice(&stored[..len]);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No stored region at {}, starting blank", path.display());
            }
            Err(e) => return Err(e.into()),
        }
        Ok(Self { path, bytes })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PersistentStore for FileEeprom {
    fn read(&self, addr: usize) -> Result<u8, PersistError> {
        self.bytes.get(addr).copied().ok_or(PersistError::Address(addr))
    }

    fn write(&mut self, addr: usize, value: u8) -> Result<(), PersistError> {
        let byte = self
            .bytes
            .get_mut(addr)
            .ok_or(PersistError::Address(addr))?;
        *byte = value;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, self.bytes)?;
        Ok(())
    }
}
