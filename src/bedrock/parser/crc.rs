//! CRC32 checksum
//!
//! AWS Event Stream prelude and message checksums use the IEEE (ISO-HDLC) polynomial

use crc::{CRC_32_ISO_HDLC, Crc};

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Compute the CRC32 checksum of `data`
pub fn crc32(data: &[u8]) -> u32 {
    CRC32.checksum(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32_empty() {
        assert_eq!(crc32(&[]), 0);
    }

    #[test]
    fn test_crc32_check_value() {
        // Standard check value for "123456789"
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn test_crc32_detects_change() {
        assert_ne!(crc32(b"chunk"), crc32(b"chunK"));
    }
}
