//! Durable storage for the operating parameter.
//!
//! This module contains:
//! - The non-volatile medium abstraction and its memory/file implementations
//! - The persisted parameter store

pub mod medium;
pub mod parameter;

pub use medium::{FileMedium, MemoryMedium, NonVolatileMedium, ERASED_BYTE};
pub use parameter::{
    is_valid_interval, ParameterStore, WriteStatus, FACTORY_VALUE, MAX_INTERVAL, MIN_INTERVAL,
    PARAMETER_OFFSET,
};
