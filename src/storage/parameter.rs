//! Persisted sampling interval.
//!
//! A single byte at a fixed offset of the non-volatile medium holds the
//! publish interval in whole seconds. Valid values are 1 to 10; a node that
//! was never configured reads back [`FACTORY_VALUE`].

use std::ops::RangeInclusive;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::storage::medium::{NonVolatileMedium, ERASED_BYTE};

/// Offset of the parameter cell.
pub const PARAMETER_OFFSET: usize = 0;

/// Smallest valid interval, in seconds.
pub const MIN_INTERVAL: u8 = 1;

/// Largest valid interval, in seconds.
pub const MAX_INTERVAL: u8 = 10;

/// Valid interval domain.
pub const INTERVAL_RANGE: RangeInclusive<u8> = MIN_INTERVAL..=MAX_INTERVAL;

/// Value read on first boot, before any write: the erased-cell byte (255).
pub const FACTORY_VALUE: u8 = ERASED_BYTE;

/// Result of a store write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    /// The value was already committed; the medium was not touched.
    Unchanged,
    /// The value was written and committed.
    Committed,
}

/// Durable single-value store.
///
/// Not synchronized; the session serializes access behind a mutex.
#[derive(Debug)]
pub struct ParameterStore<M> {
    medium: M,
    offset: usize,
}

impl<M: NonVolatileMedium> ParameterStore<M> {
    /// Create a store at [`PARAMETER_OFFSET`].
    pub fn new(medium: M) -> Result<Self> {
        Self::with_offset(medium, PARAMETER_OFFSET)
    }

    /// Create a store at a custom offset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageOffset`] if the cell lies outside the medium.
    pub fn with_offset(medium: M, offset: usize) -> Result<Self> {
        let capacity = medium.capacity();
        if offset >= capacity {
            return Err(Error::StorageOffset { offset, capacity });
        }
        Ok(Self { medium, offset })
    }

    /// Get the stored byte, or [`FACTORY_VALUE`] if never written.
    pub fn read(&self) -> u8 {
        self.medium.read_byte(self.offset).unwrap_or(ERASED_BYTE)
    }

    /// Store `value` and commit it before returning.
    ///
    /// Writing the value already stored is a no-op so the medium is not
    /// worn by repeated writes.
    ///
    /// If the commit fails the staged cell is restored, so [`read`](Self::read)
    /// keeps reporting the durable value and a retry commits again.
    pub fn write(&mut self, value: u8) -> Result<WriteStatus> {
        let previous = self.read();
        if previous == value {
            debug!("Parameter already {}, skipping commit", value);
            return Ok(WriteStatus::Unchanged);
        }

        self.medium.write_byte(self.offset, value)?;
        if let Err(e) = self.medium.commit() {
            if let Err(restore) = self.medium.write_byte(self.offset, previous) {
                warn!("Failed to restore staged parameter: {}", restore);
            }
            return Err(e);
        }
        info!("Parameter committed: {}", value);
        Ok(WriteStatus::Committed)
    }

    /// Get the stored interval if it is in the valid domain.
    pub fn interval(&self) -> Option<Duration> {
        let value = self.read();
        is_valid_interval(value).then(|| Duration::from_secs(u64::from(value)))
    }

    /// Check if the store still holds the factory value.
    pub fn is_factory(&self) -> bool {
        self.read() == FACTORY_VALUE
    }

    /// Get the underlying medium.
    pub fn medium(&self) -> &M {
        &self.medium
    }

    /// Get mutable access to the underlying medium.
    pub fn medium_mut(&mut self) -> &mut M {
        &mut self.medium
    }

    /// Consume the store, returning the medium.
    pub fn into_medium(self) -> M {
        self.medium
    }
}

/// Check if a byte is a valid interval.
pub fn is_valid_interval(value: u8) -> bool {
    INTERVAL_RANGE.contains(&value)
}
