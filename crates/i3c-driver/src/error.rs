//! Error types for register and table access

use i3c_chip::TableKind;
use thiserror::Error;

/// Result type alias for I3C register operations
pub type Result<T> = std::result::Result<T, I3cError>;

/// Errors surfaced by the access layer.
///
/// Writes to read-only bits and mismatched `(low_bit, mask)` pairs are not
/// errors: the first is hardware behaviour, the second a caller contract.
#[derive(Debug, Error)]
pub enum I3cError {
    /// Offset is not a multiple of 4
    #[error("Misaligned register access at offset {offset:#x}")]
    Misaligned {
        /// Requested byte offset
        offset: usize,
    },

    /// Access falls outside the mapped register window
    #[error("Register offset {offset:#x} out of bounds (window is {limit:#x} bytes)")]
    OutOfBounds {
        /// Requested byte offset
        offset: usize,
        /// Window size in bytes
        limit: usize,
    },

    /// Table index beyond the table's capacity
    #[error("{table} index {index} out of range (capacity {capacity})")]
    IndexOutOfRange {
        /// Target table
        table: TableKind,
        /// Requested entry index
        index: usize,
        /// Number of entries in the table
        capacity: usize,
    },

    /// More words supplied or requested than one entry holds
    #[error("{table} entry holds {entry_words} words, got {words}")]
    EntryTooLong {
        /// Target table
        table: TableKind,
        /// Words supplied or requested
        words: usize,
        /// Words per entry
        entry_words: usize,
    },

    /// Field descriptor points past the last word of an entry
    #[error("{table} field in word {word} but entries have {entry_words} words")]
    WordOutOfRange {
        /// Target table
        table: TableKind,
        /// Word index from the field descriptor
        word: usize,
        /// Words per entry
        entry_words: usize,
    },

    /// I/O error while opening the register window
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error
        #[from]
        source: std::io::Error,
    },

    /// Mapping the register window failed
    #[error("Failed to map register window: {reason}")]
    MapFailed {
        /// Reason for failure
        reason: String,
    },

    /// Configuration is inconsistent
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// Reason for failure
        reason: String,
    },
}

impl I3cError {
    /// Create a misaligned access error
    pub const fn misaligned(offset: usize) -> Self {
        Self::Misaligned { offset }
    }

    /// Create an out of bounds error
    pub const fn out_of_bounds(offset: usize, limit: usize) -> Self {
        Self::OutOfBounds { offset, limit }
    }

    /// Create a map failed error
    pub fn map_failed(reason: impl Into<String>) -> Self {
        Self::MapFailed {
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}
