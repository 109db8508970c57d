//! On-disk superblock layout and validation.
//!
//! Block 0 of every volume holds a [`Superblock`]. Everything else in the
//! volume — the FAT region, the root directory block, and the data region —
//! is located relative to the fields parsed here.

use crate::block::{Block, BLOCK_SIZE};
use crate::error::LayoutError;

/// Exact 8-byte signature every valid volume starts with.
pub const SIGNATURE: &[u8; 8] = b"ECS150FS";

/// Number of 32-byte directory entries in the root block.
pub const ROOT_DIR_ENTRY_COUNT: usize = 128;

/// Number of open-file handles the in-memory table can hold.
pub const OPEN_FILE_MAX_COUNT: usize = 32;

/// Maximum length, in bytes, of a stored file name (including the
/// terminating NUL byte the 16-byte field reserves for it).
pub const FILENAME_LEN: usize = 16;

/// FAT entry value meaning "this data block is free".
pub const FAT_FREE: u16 = 0x0000;

/// FAT entry value meaning "end of chain" (also the sentinel stored in FAT
/// entry 0 on every valid volume).
pub const FAT_EOC: u16 = 0xFFFF;

/// In-memory image of block 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Superblock {
    pub total_blocks: u16,
    pub root_index: u16,
    pub data_index: u16,
    pub data_blocks: u16,
    pub fat_blocks: u8,
}

impl Superblock {
    /// Deserialize a superblock from a raw block-0 image without validating
    /// invariants; validation is a separate, explicit step so callers can
    /// distinguish "can't parse" from "parses but violates an invariant"
    /// (in practice every field here is fixed-width so parsing never fails).
    pub fn from_block(block: &Block) -> Self {
        Self {
            total_blocks: u16::from_le_bytes([block[8], block[9]]),
            root_index: u16::from_le_bytes([block[10], block[11]]),
            data_index: u16::from_le_bytes([block[12], block[13]]),
            data_blocks: u16::from_le_bytes([block[14], block[15]]),
            fat_blocks: block[16],
        }
    }

    /// Serialize this superblock into a fresh, zero-padded block-0 image.
    pub fn to_block(&self) -> Block {
        let mut block = [0u8; BLOCK_SIZE];
        block[0..8].copy_from_slice(SIGNATURE);
        block[8..10].copy_from_slice(&self.total_blocks.to_le_bytes());
        block[10..12].copy_from_slice(&self.root_index.to_le_bytes());
        block[12..14].copy_from_slice(&self.data_index.to_le_bytes());
        block[14..16].copy_from_slice(&self.data_blocks.to_le_bytes());
        block[16] = self.fat_blocks;
        block
    }

    /// Minimum number of FAT blocks needed to store `data_blocks` 16-bit
    /// entries: `ceil(data_blocks * 2 / BLOCK_SIZE)`.
    pub fn min_fat_blocks(data_blocks: u16) -> u8 {
        let bytes_needed = data_blocks as usize * 2;
        ((bytes_needed + BLOCK_SIZE - 1) / BLOCK_SIZE) as u8
    }

    /// Construct the superblock for a freshly-formatted volume with
    /// `data_blocks` data blocks. Total layout: 1 (superblock) + fat_blocks +
    /// 1 (root) + data_blocks.
    pub fn new(data_blocks: u16) -> Self {
        let fat_blocks = Self::min_fat_blocks(data_blocks);
        let root_index = fat_blocks as u16 + 1;
        let data_index = root_index + 1;
        let total_blocks = data_index + data_blocks;
        Self {
            total_blocks,
            root_index,
            data_index,
            data_blocks,
            fat_blocks,
        }
    }

    /// Validate every invariant from the on-disk format against a raw
    /// block-0 image and a device-reported block count.
    ///
    /// Returns the parsed, validated superblock on success.
    pub fn parse_and_validate(block: &Block, device_block_count: u32) -> Result<Self, LayoutError> {
        if &block[0..8] != SIGNATURE {
            return Err(LayoutError::BadSignature);
        }
        let sb = Self::from_block(block);

        if sb.fat_blocks as u32 + sb.data_blocks as u32 != sb.total_blocks as u32 - 2 {
            return Err(LayoutError::RegionCountMismatch);
        }
        if sb.total_blocks as u32 != device_block_count {
            return Err(LayoutError::TotalBlocksMismatch);
        }
        if sb.fat_blocks as u16 + 1 != sb.root_index || sb.root_index + 1 != sb.data_index {
            return Err(LayoutError::NonContiguousLayout);
        }
        if sb.fat_blocks != Self::min_fat_blocks(sb.data_blocks) {
            return Err(LayoutError::FatBlockCountMismatch);
        }

        Ok(sb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_a_block() {
        let sb = Superblock::new(7);
        let block = sb.to_block();
        let parsed = Superblock::from_block(&block);
        assert_eq!(sb, parsed);
    }

    #[test]
    fn computes_contiguous_layout() {
        // total_blocks=10, fat_blocks=1, data_blocks=7: an empty 10-block volume.
        let sb = Superblock::new(7);
        assert_eq!(sb.fat_blocks, 1);
        assert_eq!(sb.root_index, 2);
        assert_eq!(sb.data_index, 3);
        assert_eq!(sb.total_blocks, 10);
    }

    #[test]
    fn rejects_bad_signature() {
        let block = [0u8; BLOCK_SIZE];
        assert_eq!(
            Superblock::parse_and_validate(&block, 10),
            Err(LayoutError::BadSignature)
        );
    }

    #[test]
    fn rejects_mismatched_device_count() {
        let sb = Superblock::new(7);
        let block = sb.to_block();
        assert_eq!(
            Superblock::parse_and_validate(&block, 11),
            Err(LayoutError::TotalBlocksMismatch)
        );
    }
}
