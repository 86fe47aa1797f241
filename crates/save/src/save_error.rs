// ---------------------------------------------------------------------------
// SaveError: typed errors for persistence operations
// ---------------------------------------------------------------------------

use std::fmt;

/// Errors that can occur while reading or writing simulation files.
#[derive(Debug)]
pub enum SaveError {
    /// I/O error (file not found, permission denied, disk full, etc.)
    Io(std::io::Error),
    /// Bitcode decoding failed (corrupt or invalid data).
    Decode(String),
    /// The file does not start with the expected magic bytes.
    HeaderMismatch { found: [u8; 4] },
    /// The payload checksum does not match the header.
    ChecksumMismatch { expected: u32, found: u32 },
    /// The file length is inconsistent with the format.
    TruncatedFile { len: usize },
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveError::Io(e) => write!(f, "I/O error: {e}"),
            SaveError::Decode(msg) => write!(f, "decoding error: {msg}"),
            SaveError::HeaderMismatch { found } => {
                write!(f, "header mismatch: unexpected magic {found:02x?}")
            }
            SaveError::ChecksumMismatch { expected, found } => {
                write!(f, "checksum mismatch: expected {expected:#010x}, found {found:#010x}")
            }
            SaveError::TruncatedFile { len } => {
                write!(f, "truncated or misaligned file ({len} bytes)")
            }
        }
    }
}

impl std::error::Error for SaveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SaveError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SaveError {
    fn from(e: std::io::Error) -> Self {
        SaveError::Io(e)
    }
}

impl From<bitcode::Error> for SaveError {
    fn from(e: bitcode::Error) -> Self {
        SaveError::Decode(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_io() {
        let err = SaveError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file not found",
        ));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_display_checksum() {
        let err = SaveError::ChecksumMismatch {
            expected: 1,
            found: 2,
        };
        assert!(err.to_string().contains("checksum"));
    }

    #[test]
    fn test_from_io_error() {
        let err: SaveError =
            std::io::Error::new(std::io::ErrorKind::Other, "boom").into();
        assert!(matches!(err, SaveError::Io(_)));
    }
}
