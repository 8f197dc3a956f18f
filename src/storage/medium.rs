//! Non-volatile media.
//!
//! A medium behaves like EEPROM emulation on flash: writes land in a staged
//! image and only become durable on [`NonVolatileMedium::commit`].

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use crate::error::{Error, Result};

/// Value of a cell that has never been written (erased flash).
pub const ERASED_BYTE: u8 = 0xFF;

/// Byte-addressable durable storage.
pub trait NonVolatileMedium: Send {
    /// Size of the medium in bytes.
    fn capacity(&self) -> usize;

    /// Read a byte from the staged image. `None` if `offset` is out of range.
    fn read_byte(&self, offset: usize) -> Option<u8>;

    /// Stage a byte. Not durable until [`commit`](Self::commit) returns.
    fn write_byte(&mut self, offset: usize, value: u8) -> Result<()>;

    /// Make every staged byte durable.
    fn commit(&mut self) -> Result<()>;
}

fn check_offset(offset: usize, capacity: usize) -> Result<()> {
    if offset >= capacity {
        return Err(Error::StorageOffset { offset, capacity });
    }
    Ok(())
}

/// In-memory medium.
///
/// Keeps separate staged and committed images so a power cycle can be
/// simulated with [`MemoryMedium::from_image`] on [`MemoryMedium::committed_image`].
#[derive(Debug, Clone)]
pub struct MemoryMedium {
    staged: Vec<u8>,
    committed: Vec<u8>,
    commit_count: usize,
    fail_commits: bool,
}

impl MemoryMedium {
    /// Create an erased medium.
    pub fn new(capacity: usize) -> Self {
        Self::from_image(vec![ERASED_BYTE; capacity])
    }

    /// Boot from a previously committed image.
    pub fn from_image(image: Vec<u8>) -> Self {
        Self {
            staged: image.clone(),
            committed: image,
            commit_count: 0,
            fail_commits: false,
        }
    }

    /// The bytes that would survive a power loss right now.
    pub fn committed_image(&self) -> Vec<u8> {
        self.committed.clone()
    }

    /// Number of successful commits since creation.
    pub fn commit_count(&self) -> usize {
        self.commit_count
    }

    /// Make subsequent commits fail (for testing fault handling).
    pub fn set_fail_commits(&mut self, fail: bool) {
        self.fail_commits = fail;
    }
}

impl NonVolatileMedium for MemoryMedium {
    fn capacity(&self) -> usize {
        self.staged.len()
    }

    fn read_byte(&self, offset: usize) -> Option<u8> {
        self.staged.get(offset).copied()
    }

    fn write_byte(&mut self, offset: usize, value: u8) -> Result<()> {
        check_offset(offset, self.capacity())?;
        self.staged[offset] = value;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        if self.fail_commits {
            return Err(Error::StorageCommit {
                reason: "injected commit failure".to_string(),
            });
        }
        self.committed.copy_from_slice(&self.staged);
        self.commit_count += 1;
        trace!("Memory medium commit #{}", self.commit_count);
        Ok(())
    }
}

/// File-backed medium for running the node on a host.
///
/// Commit writes the whole image to a sibling temp file, syncs it, and
/// renames it over the image file, so a crash leaves either the old or the
/// new image.
#[derive(Debug)]
pub struct FileMedium {
    path: PathBuf,
    staged: Vec<u8>,
}

impl FileMedium {
    /// Open the image at `path`, creating an erased one of `capacity` bytes
    /// in memory if the file does not exist yet.
    ///
    /// A shorter file is padded with erased bytes; a longer one is truncated.
    pub fn open(path: impl AsRef<Path>, capacity: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let mut staged = match fs::read(&path) {
            Ok(bytes) => {
                debug!("Loaded {} byte image from {}", bytes.len(), path.display());
                bytes
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No image at {}, starting erased", path.display());
                Vec::new()
            }
            Err(e) => return Err(Error::Io(e)),
        };
        staged.resize(capacity, ERASED_BYTE);

        Ok(Self { path, staged })
    }

    /// Path of the image file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl NonVolatileMedium for FileMedium {
    fn capacity(&self) -> usize {
        self.staged.len()
    }

    fn read_byte(&self, offset: usize) -> Option<u8> {
        self.staged.get(offset).copied()
    }

    fn write_byte(&mut self, offset: usize, value: u8) -> Result<()> {
        check_offset(offset, self.capacity())?;
        self.staged[offset] = value;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        let tmp = self.path.with_extension("tmp");
        let commit = || -> std::io::Result<()> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&self.staged)?;
            file.sync_all()?;
            fs::rename(&tmp, &self.path)
        };

        commit().map_err(|e| Error::StorageCommit {
            reason: format!("{}: {}", self.path.display(), e),
        })?;
        trace!("Committed {} bytes to {}", self.staged.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_image(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "simple-ble-node-{}-{}.bin",
            name,
            std::process::id()
        ))
    }

    #[test]
    fn test_memory_medium_starts_erased() {
        let medium = MemoryMedium::new(4);
        assert_eq!(medium.capacity(), 4);
        assert_eq!(medium.read_byte(0), Some(ERASED_BYTE));
        assert_eq!(medium.read_byte(4), None);
    }

    #[test]
    fn test_uncommitted_write_lost_on_power_cycle() {
        let mut medium = MemoryMedium::new(4);
        medium.write_byte(0, 7).unwrap();
        assert_eq!(medium.read_byte(0), Some(7));

        let rebooted = MemoryMedium::from_image(medium.committed_image());
        assert_eq!(rebooted.read_byte(0), Some(ERASED_BYTE));

        medium.commit().unwrap();
        let rebooted = MemoryMedium::from_image(medium.committed_image());
        assert_eq!(rebooted.read_byte(0), Some(7));
        assert_eq!(medium.commit_count(), 1);
    }

    #[test]
    fn test_memory_medium_offset_check() {
        let mut medium = MemoryMedium::new(1);
        assert!(matches!(
            medium.write_byte(1, 3),
            Err(Error::StorageOffset {
                offset: 1,
                capacity: 1
            })
        ));
    }

    #[test]
    fn test_injected_commit_failure() {
        let mut medium = MemoryMedium::new(1);
        medium.set_fail_commits(true);
        medium.write_byte(0, 3).unwrap();
        assert!(matches!(medium.commit(), Err(Error::StorageCommit { .. })));
        assert_eq!(medium.commit_count(), 0);
        assert_eq!(medium.committed_image(), vec![ERASED_BYTE]);
    }

    #[test]
    fn test_file_medium_persists_across_reopen() {
        let path = temp_image("reopen");
        let _ = fs::remove_file(&path);

        let mut medium = FileMedium::open(&path, 8).unwrap();
        assert_eq!(medium.read_byte(0), Some(ERASED_BYTE));
        medium.write_byte(0, 4).unwrap();
        medium.commit().unwrap();

        let reopened = FileMedium::open(&path, 8).unwrap();
        assert_eq!(reopened.read_byte(0), Some(4));
        assert_eq!(reopened.read_byte(7), Some(ERASED_BYTE));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_file_medium_pads_short_image() {
        let path = temp_image("pad");
        fs::write(&path, [9u8]).unwrap();

        let medium = FileMedium::open(&path, 3).unwrap();
        assert_eq!(medium.capacity(), 3);
        assert_eq!(medium.read_byte(0), Some(9));
        assert_eq!(medium.read_byte(2), Some(ERASED_BYTE));

        fs::remove_file(&path).unwrap();
    }
}
