//! Error Module - FWB Error Types
//!
//! Policy violations in FWB are compile-time rejections (see the crate
//! documentation). The errors here cover the runtime surface around the
//! policy layer: safe slice variants of the bulk operations, the card table
//! that records barrier hits, and configuration.
//!
//! # Error Categories
//!
//! ## Bulk Operation Errors
//! - `LengthMismatch` - source longer than destination
//! - `RangeOutOfBounds` - move range outside the slice
//!
//! ## Card Table Errors
//! - `AddressOutOfRange` - query outside the covered heap range
//! - `AlignmentError` - covered range not aligned to the card size
//!
//! ## Configuration Errors
//! - `Configuration` - invalid configuration
//! - `InvalidArgument` - invalid function argument

use crate::config::ConfigError;
use thiserror::Error;

/// Main error type for all FWB operations
///
/// # Examples
///
/// ```rust
/// use fwb::FwbError;
///
/// fn handle_error(err: FwbError) {
///     match err {
///         FwbError::LengthMismatch { dst, src } => {
///             eprintln!("cannot copy {} elements into {}", src, dst);
///         }
///         _ => {
///             eprintln!("Other error: {}", err);
///         }
///     }
/// }
/// ```
#[derive(Debug, Error)]
pub enum FwbError {
    /// Source slice does not fit into the destination slice
    ///
    /// **When returned:** Safe bulk copy with `src.len() > dst.len()`
    ///
    /// **Recovery strategy:** Fix caller to size the destination
    #[error("Length mismatch: cannot copy {src} elements into a destination of {dst}")]
    LengthMismatch { dst: usize, src: usize },

    /// Element range does not lie within the slice
    ///
    /// **When returned:** `move_within` with a source or destination range
    /// past the end of the slice
    #[error("Range {start}..{end} out of bounds for length {length}")]
    RangeOutOfBounds {
        start: usize,
        end: usize,
        length: usize,
    },

    /// Address range not covered by a card table
    ///
    /// **When returned:** Card table query for memory it does not cover
    ///
    /// **Recovery strategy:** Register a card table for the heap range first
    #[error("Address range {address:#x}+{bytes} is not covered by the card table")]
    AddressOutOfRange { address: usize, bytes: usize },

    /// Alignment error
    ///
    /// **When returned:** Card table base address not aligned to the card size
    #[error("Alignment error: address {address:#x} is not aligned to {alignment} bytes")]
    AlignmentError { address: usize, alignment: usize },

    /// Invalid argument
    ///
    /// **Example scenarios:**
    /// - Card table with zero length
    /// - Covered range overflows the address space
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

impl FwbError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(self, FwbError::AddressOutOfRange { .. })
    }

    /// Check if this error indicates a bug in the caller
    pub fn is_bug(&self) -> bool {
        matches!(
            self,
            FwbError::LengthMismatch { .. }
                | FwbError::RangeOutOfBounds { .. }
                | FwbError::InvalidArgument(_)
        )
    }
}

/// Result type alias for FWB operations
pub type Result<T> = std::result::Result<T, FwbError>;

/// Ensure condition is true, otherwise return error
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
}
