//! Disk image formatter.
//!
//! The on-disk layout is produced by an external formatter, not by the core
//! itself — this module is that formatter. It is ambient tooling, not part
//! of [`crate::fs::FileSystem`]: it only ever writes a block-0 superblock, a
//! zeroed FAT, and a zeroed root directory that satisfy every layout
//! invariant the core validates on mount, the same shape the `fs_mkfs`
//! binary and the test suite's fixtures both rely on.

use std::io;
use std::path::Path;

use crate::block::{BlockDevice, FileBlockDevice, BLOCK_SIZE};
use crate::dir::RootDirectory;
use crate::fat::Fat;
use crate::layout::Superblock;

/// Create a new disk image at `path` with `data_blocks` data blocks,
/// formatted with an empty root directory and an all-free FAT (entry 0
/// reserved as the `0xFFFF` sentinel).
pub fn format<P: AsRef<Path>>(path: P, data_blocks: u16) -> io::Result<()> {
    let super_block = Superblock::new(data_blocks);
    let total_blocks = super_block.total_blocks as u32;

    let mut device = FileBlockDevice::create(path, total_blocks)?;
    device.write_block(0, &super_block.to_block())?;

    let fat = Fat::new_formatted(data_blocks);
    let fat_bytes = fat.to_bytes(super_block.fat_blocks);
    for i in 0..super_block.fat_blocks as u32 {
        let start = i as usize * BLOCK_SIZE;
        let mut block = [0u8; BLOCK_SIZE];
        block.copy_from_slice(&fat_bytes[start..start + BLOCK_SIZE]);
        device.write_block(i + 1, &block)?;
    }

    let root = RootDirectory::new_formatted();
    device.write_block(super_block.root_index as u32, &root.to_block())?;

    device.close()?;
    log::info!(
        "formatted {} blocks ({} data blocks)",
        total_blocks,
        data_blocks
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::FileSystem;

    #[test]
    fn formatted_image_mounts_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("disk.img");
        format(&path, 7).unwrap();

        let device = FileBlockDevice::open(&path).unwrap();
        let fs = FileSystem::mount(device).unwrap();
        assert_eq!(
            fs.info(),
            "FS Info:\ntotal_blk_count=10\nfat_blk_count=1\nrdir_blk=2\ndata_blk=3\ndata_blk_count=7\nfat_free_ratio=6/7\nrdir_free_ratio=128/128\n"
        );
    }
}
