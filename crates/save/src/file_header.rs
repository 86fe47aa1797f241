// ---------------------------------------------------------------------------
// file_header – binary file header with magic bytes, version, and checksum
// ---------------------------------------------------------------------------
//
// Header format (28 bytes, fixed-size, little-endian):
//   [0..4]   Magic bytes: "RSIM"
//   [4..8]   Format version (u32)
//   [8..12]  Flags (u32: bit 0 = lz4-compressed payload)
//   [12..20] Timestamp (Unix epoch, u64)
//   [20..24] Uncompressed payload size (u32)
//   [24..28] xxHash32 checksum of the payload (everything after the header)
//
// On write: encode payload -> prepend header (with checksum of the stored
// bytes). On read: check magic -> validate checksum -> strip header.

use xxhash_rust::xxh32::xxh32;

use crate::save_error::SaveError;

/// Magic bytes identifying a simulation save file.
pub const MAGIC: [u8; 4] = [0x52, 0x53, 0x49, 0x4D]; // "RSIM"

/// Size of the file header in bytes.
pub const HEADER_SIZE: usize = 28;

/// Current header format version.
pub const HEADER_FORMAT_VERSION: u32 = 1;

/// Flag bit: the payload is lz4-compressed.
pub const FLAG_COMPRESSED: u32 = 1;

/// Seed for the xxHash32 checksum.
const XXHASH_SEED: u32 = 0;

/// Parsed file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub format_version: u32,
    pub flags: u32,
    pub timestamp: u64,
    pub uncompressed_size: u32,
    pub checksum: u32,
}

/// Wrap a payload with a file header.
///
/// `uncompressed_size` is the pre-compression size of the payload; the
/// checksum covers the bytes as stored.
pub fn wrap_with_header(payload: &[u8], flags: u32, uncompressed_size: u32) -> Vec<u8> {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&HEADER_FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&flags.to_le_bytes());
    out.extend_from_slice(&timestamp.to_le_bytes());
    out.extend_from_slice(&uncompressed_size.to_le_bytes());
    out.extend_from_slice(&xxh32(payload, XXHASH_SEED).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// Parse and validate the header, returning it with the payload bytes.
pub fn unwrap_and_verify(bytes: &[u8]) -> Result<(FileHeader, &[u8]), SaveError> {
    if bytes.len() < HEADER_SIZE {
        return Err(SaveError::TruncatedFile { len: bytes.len() });
    }
    if bytes[0..4] != MAGIC {
        let mut found = [0u8; 4];
        found.copy_from_slice(&bytes[0..4]);
        return Err(SaveError::HeaderMismatch { found });
    }

    let header = FileHeader {
        format_version: read_u32(bytes, 4),
        flags: read_u32(bytes, 8),
        timestamp: u64::from_le_bytes([
            bytes[12], bytes[13], bytes[14], bytes[15], bytes[16], bytes[17], bytes[18], bytes[19],
        ]),
        uncompressed_size: read_u32(bytes, 20),
        checksum: read_u32(bytes, 24),
    };

    let payload = &bytes[HEADER_SIZE..];
    let found = xxh32(payload, XXHASH_SEED);
    if found != header.checksum {
        return Err(SaveError::ChecksumMismatch {
            expected: header.checksum,
            found,
        });
    }

    Ok((header, payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_unwrap_roundtrip() {
        let payload = b"some payload bytes";
        let wrapped = wrap_with_header(payload, 0, payload.len() as u32);
        let (header, unwrapped) = unwrap_and_verify(&wrapped).unwrap();

        assert_eq!(unwrapped, payload);
        assert_eq!(header.format_version, HEADER_FORMAT_VERSION);
        assert_eq!(header.flags, 0);
        assert_eq!(header.uncompressed_size, payload.len() as u32);
    }

    #[test]
    fn test_bad_magic_rejected() {
        let mut wrapped = wrap_with_header(b"data", 0, 4);
        wrapped[0] = b'X';
        assert!(matches!(
            unwrap_and_verify(&wrapped),
            Err(SaveError::HeaderMismatch { .. })
        ));
    }

    #[test]
    fn test_corrupt_payload_rejected() {
        let mut wrapped = wrap_with_header(b"data-to-corrupt", 0, 15);
        let last = wrapped.len() - 1;
        wrapped[last] ^= 0xFF;
        assert!(matches!(
            unwrap_and_verify(&wrapped),
            Err(SaveError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_short_file_rejected() {
        assert!(matches!(
            unwrap_and_verify(&[1, 2, 3]),
            Err(SaveError::TruncatedFile { len: 3 })
        ));
    }
}
