//! `__objc_imageinfo`: a fixed 8-byte record describing the Swift ABI
//! version the image was built against, consulted when deciding whether a
//! class's trailing Swift header uses the stable or legacy layout.

use bitflags::bitflags;

use crate::cursor::{Cursor, Endian};
use crate::error::Result;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ImageInfoFlags: u32 {
        const IS_REPLACEMENT = 1 << 0;
        const SUPPORTS_GC = 1 << 1;
        const REQUIRES_GC = 1 << 2;
        const OPTIMIZED_BY_DYLD = 1 << 3;
        const CORRECTED_SYNTHESIZE = 1 << 4;
        const IS_SIMULATED = 1 << 5;
        const HAS_CATEGORY_CLASS_PROPERTIES = 1 << 6;
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ImageInfo {
    pub version: u32,
    pub flags: ImageInfoFlags,
    pub swift_stable_version: u32,
    pub swift_unstable_version: u32,
}

impl ImageInfo {
    const SWIFT_UNSTABLE_VERSION_MASK: u32 = 0xff << 8;
    const SWIFT_STABLE_VERSION_MASK: u32 = 0xff << 16;

    pub fn parse(bytes: &[u8]) -> Result<ImageInfo> {
        let mut cursor = Cursor::new(bytes);
        let version = cursor.read_u32(Endian::Little)?;
        let raw_flags = cursor.read_u32(Endian::Little)?;
        Ok(ImageInfo {
            version,
            flags: ImageInfoFlags::from_bits_truncate(raw_flags),
            swift_stable_version: (raw_flags & Self::SWIFT_STABLE_VERSION_MASK) >> 16,
            swift_unstable_version: (raw_flags & Self::SWIFT_UNSTABLE_VERSION_MASK) >> 8,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_version_fields() {
        let raw_flags = ImageInfoFlags::OPTIMIZED_BY_DYLD.bits() | (7 << 16);
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&raw_flags.to_le_bytes());
        let info = ImageInfo::parse(&bytes).unwrap();
        assert!(info.flags.contains(ImageInfoFlags::OPTIMIZED_BY_DYLD));
        assert_eq!(info.swift_stable_version, 7);
    }
}
