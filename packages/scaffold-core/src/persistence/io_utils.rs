//! I/O utilities for persistence operations.

use std::io::ErrorKind;

use crate::error::ScaffoldError;

/// Classifies I/O errors into specific ScaffoldError variants.
pub fn classify_io_error(error: std::io::Error, context: &str) -> ScaffoldError {
    match error.kind() {
        ErrorKind::StorageFull | ErrorKind::OutOfMemory => {
            ScaffoldError::DiskFull(format!("{}: {}", context, error))
        }
        _ => ScaffoldError::IoError(format!("{}: {}", context, error)),
    }
}
