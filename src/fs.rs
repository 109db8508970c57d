//! The mounted file system: ties the superblock, FAT, root directory, and
//! open-file table to a block device and exposes the public file system
//! operations as inherent methods.

use std::cmp::min;

use crate::block::{Block, BlockDevice, BLOCK_SIZE};
use crate::dir::RootDirectory;
use crate::error::{FsError, FsResult};
use crate::fat::Fat;
use crate::layout::{Superblock, FAT_EOC};
use crate::open_file::OpenFileTable;

/// A mounted volume: owns the in-memory superblock/FAT/root images, the
/// open-file table, and the underlying block device for the lifetime
/// between [`FileSystem::mount`] and [`FileSystem::unmount`].
pub struct FileSystem<D: BlockDevice> {
    device: D,
    super_block: Superblock,
    fat: Fat,
    root: RootDirectory,
    open_files: OpenFileTable,
    scratch: Block,
}

impl<D: BlockDevice> FileSystem<D> {
    /// Mount a volume from `device`.
    ///
    /// Reads and validates the superblock, loads the FAT and root-directory
    /// images, and verifies FAT entry 0 is the `0xFFFF` sentinel. Fails
    /// without exposing partial state if any read fails or any invariant is
    /// violated.
    pub fn mount(mut device: D) -> FsResult<Self> {
        let mut block0 = [0u8; BLOCK_SIZE];
        device.read_block(0, &mut block0)?;

        let super_block = Superblock::parse_and_validate(&block0, device.block_count())?;
        log::debug!(
            "mount: total_blocks={} fat_blocks={} root_index={} data_index={} data_blocks={}",
            super_block.total_blocks,
            super_block.fat_blocks,
            super_block.root_index,
            super_block.data_index,
            super_block.data_blocks
        );

        let mut fat_raw = vec![0u8; super_block.fat_blocks as usize * BLOCK_SIZE];
        for i in 0..super_block.fat_blocks as u32 {
            let mut block = [0u8; BLOCK_SIZE];
            device.read_block(i + 1, &mut block)?;
            let start = i as usize * BLOCK_SIZE;
            fat_raw[start..start + BLOCK_SIZE].copy_from_slice(&block);
        }
        let fat = Fat::from_blocks(&fat_raw, super_block.data_blocks);
        if !fat.has_valid_sentinel() {
            return Err(FsError::Layout(crate::error::LayoutError::MissingFatSentinel));
        }

        let mut root_block = [0u8; BLOCK_SIZE];
        device.read_block(super_block.root_index as u32, &mut root_block)?;
        let root = RootDirectory::from_block(&root_block);

        log::info!("mounted volume ({} data blocks)", super_block.data_blocks);

        Ok(Self {
            device,
            super_block,
            fat,
            root,
            open_files: OpenFileTable::new(),
            scratch: [0u8; BLOCK_SIZE],
        })
    }

    /// Persist the superblock, FAT, and root directory back to the device
    /// and close it. All open handles are implicitly discarded.
    pub fn unmount(mut self) -> FsResult<()> {
        self.device.write_block(0, &self.super_block.to_block())?;

        let fat_bytes = self.fat.to_bytes(self.super_block.fat_blocks);
        for i in 0..self.super_block.fat_blocks as u32 {
            let start = i as usize * BLOCK_SIZE;
            let mut block = [0u8; BLOCK_SIZE];
            block.copy_from_slice(&fat_bytes[start..start + BLOCK_SIZE]);
            self.device.write_block(i + 1, &block)?;
        }

        self.device
            .write_block(self.super_block.root_index as u32, &self.root.to_block())?;
        self.device.close()?;
        log::info!("unmounted volume");
        Ok(())
    }

    /// Human-readable geometry + free-ratio report. The output format is a
    /// fixed, byte-for-byte contract relied on by scripts and tests.
    pub fn info(&self) -> String {
        let free_fat = self.fat.free_count();
        let free_dirs = self.root.free_count();
        format!(
            "FS Info:\ntotal_blk_count={}\nfat_blk_count={}\nrdir_blk={}\ndata_blk={}\ndata_blk_count={}\nfat_free_ratio={}/{}\nrdir_free_ratio={}/128\n",
            self.super_block.total_blocks,
            self.super_block.fat_blocks,
            self.super_block.root_index,
            self.super_block.data_index,
            self.super_block.data_blocks,
            free_fat,
            self.super_block.data_blocks,
            free_dirs,
        )
    }

    /// Human-readable directory listing. Like [`FileSystem::info`], its
    /// output format is a fixed, byte-for-byte contract.
    pub fn ls(&self) -> String {
        let mut out = String::from("FS Ls:\n");
        for entry in self.root.iter() {
            out.push_str(&format!(
                "file: {}, size: {}, data_blk: {}\n",
                entry.name_str(),
                entry.file_size,
                entry.first_data_index
            ));
        }
        out
    }

    /// Create an empty file named `name`. Does not reserve a data block.
    pub fn create(&mut self, name: &str) -> FsResult<()> {
        self.root.create(name)
    }

    /// Delete `name`, freeing its entire FAT chain.
    ///
    /// Fails if no entry matches, or if any open handle currently names this
    /// file. Deletion is scoped to handles naming this particular file, not
    /// to "some file somewhere is open" (see the design notes for the
    /// reasoning).
    pub fn delete(&mut self, name: &str) -> FsResult<()> {
        if self.root.find(name).is_none() {
            return Err(FsError::NotFound);
        }
        if self.open_files.any_open_with_name(name) {
            return Err(FsError::FileOpen);
        }
        let head = self.root.remove(name)?;
        let freed = self.fat.free_chain(head);
        log::debug!("delete {}: freed {} data blocks", name, freed);
        Ok(())
    }

    /// Open `name`, returning a fresh file descriptor with offset 0.
    pub fn open(&mut self, name: &str) -> FsResult<usize> {
        if self.root.find(name).is_none() {
            return Err(FsError::NotFound);
        }
        self.open_files.open(name)
    }

    pub fn close(&mut self, fd: usize) -> FsResult<()> {
        self.open_files.close(fd)
    }

    /// Current size, in bytes, of the file backing `fd`.
    pub fn stat(&self, fd: usize) -> FsResult<u32> {
        let name = self.open_files.name_of(fd)?;
        let entry = self.root.find(name).ok_or(FsError::NotFound)?;
        Ok(entry.file_size)
    }

    /// Move `fd`'s cursor to `offset`. Fails if `offset` exceeds the file's
    /// current size.
    pub fn lseek(&mut self, fd: usize, offset: usize) -> FsResult<()> {
        let name = self.open_files.name_of(fd)?.to_string();
        let entry = self.root.find(&name).ok_or(FsError::NotFound)?;
        if offset > entry.file_size as usize {
            return Err(FsError::SeekPastEnd);
        }
        self.open_files.set_offset(fd, offset)
    }

    /// Read up to `buf.len()` bytes starting at `fd`'s current offset,
    /// advancing it. Returns the number of bytes actually delivered, which
    /// is less than requested only at end of file.
    pub fn read(&mut self, fd: usize, buf: &mut [u8]) -> FsResult<usize> {
        let name = self.open_files.name_of(fd)?.to_string();
        let offset = self.open_files.offset_of(fd)?;
        let entry = self.root.find(&name).ok_or(FsError::NotFound)?;
        let file_size = entry.file_size as usize;
        let first_data_index = entry.first_data_index;

        if offset >= file_size {
            return Ok(0);
        }
        let to_read = min(buf.len(), file_size - offset);

        let mut done = 0;
        let mut cur_offset = offset;
        while done < to_read {
            let chain_pos = cur_offset / BLOCK_SIZE;
            let block_offset = cur_offset % BLOCK_SIZE;
            let data_index = self
                .fat
                .walk(first_data_index, chain_pos)
                .ok_or(FsError::NotFound)?;

            self.device
                .read_block(self.super_block.data_index as u32 + data_index as u32, &mut self.scratch)?;

            let copy_len = min(BLOCK_SIZE - block_offset, to_read - done);
            buf[done..done + copy_len]
                .copy_from_slice(&self.scratch[block_offset..block_offset + copy_len]);

            done += copy_len;
            cur_offset += copy_len;
        }

        self.open_files.set_offset(fd, cur_offset)?;
        Ok(done)
    }

    /// Write `buf` starting at `fd`'s current offset, advancing it and
    /// extending `file_size` if the cursor moves past the previous end.
    /// Allocates data blocks lazily; if the FAT runs out of free blocks
    /// mid-write, returns the short count already written.
    pub fn write(&mut self, fd: usize, buf: &[u8]) -> FsResult<usize> {
        let name = self.open_files.name_of(fd)?.to_string();
        let offset = self.open_files.offset_of(fd)?;

        let mut done = 0;
        let mut cur_offset = offset;
        while done < buf.len() {
            let chain_pos = cur_offset / BLOCK_SIZE;
            let block_offset = cur_offset % BLOCK_SIZE;

            let data_index = match self.ensure_block(&name, chain_pos)? {
                Some(idx) => idx,
                None => break, // FAT exhausted: stop, report the short write below.
            };

            let write_len = min(BLOCK_SIZE - block_offset, buf.len() - done);
            self.device
                .read_block(self.super_block.data_index as u32 + data_index as u32, &mut self.scratch)?;
            self.scratch[block_offset..block_offset + write_len]
                .copy_from_slice(&buf[done..done + write_len]);
            self.device
                .write_block(self.super_block.data_index as u32 + data_index as u32, &self.scratch)?;

            done += write_len;
            cur_offset += write_len;
        }

        self.open_files.set_offset(fd, cur_offset)?;
        let entry = self.root.find_mut(&name).ok_or(FsError::NotFound)?;
        if cur_offset as u32 > entry.file_size {
            entry.file_size = cur_offset as u32;
        }
        Ok(done)
    }

    /// Resolve the data block at chain position `chain_pos` for `name`,
    /// allocating and linking a new block if the chain does not yet reach
    /// that far. Returns `None` if the FAT has no free block left.
    fn ensure_block(&mut self, name: &str, chain_pos: usize) -> FsResult<Option<u16>> {
        let entry = self.root.find(name).ok_or(FsError::NotFound)?;
        let head = entry.first_data_index;

        if let Some(existing) = self.fat.walk(head, chain_pos) {
            return Ok(Some(existing));
        }

        // Chain doesn't reach chain_pos yet: allocate blocks one at a time,
        // linking each onto the tail, until it does.
        let chain_len = self.fat.chain_len(head);
        let mut tail = if chain_len == 0 {
            None
        } else {
            self.fat.walk(head, chain_len - 1)
        };

        for _ in chain_len..=chain_pos {
            let new_block = match self.fat.allocate() {
                Ok(idx) => idx,
                Err(FsError::NoFreeBlock) => return Ok(None),
                Err(e) => return Err(e),
            };
            match tail {
                Some(t) => self.fat.link(t, new_block),
                None => {
                    self.root.find_mut(name).ok_or(FsError::NotFound)?.first_data_index = new_block;
                }
            }
            tail = Some(new_block);
        }

        Ok(Some(tail.expect("at least one block was just allocated")))
    }
}

/// FAT end-of-chain marker re-exported for callers that need to compare a
/// directory entry's `first_data_index` against "no chain yet".
pub const EMPTY_FILE_SENTINEL: u16 = FAT_EOC;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mkfs;

    fn mounted(data_blocks: u16) -> FileSystem<crate::block::FileBlockDevice> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("disk.img");
        mkfs::format(&path, data_blocks).unwrap();
        // Leak the tempdir so the file stays alive for the test's duration.
        std::mem::forget(dir);
        let device = crate::block::FileBlockDevice::open(&path).unwrap();
        FileSystem::mount(device).unwrap()
    }

    #[test]
    fn empty_volume_info_matches_scenario_s1() {
        let fs = mounted(7);
        assert_eq!(
            fs.info(),
            "FS Info:\ntotal_blk_count=10\nfat_blk_count=1\nrdir_blk=2\ndata_blk=3\ndata_blk_count=7\nfat_free_ratio=6/7\nrdir_free_ratio=128/128\n"
        );
    }

    #[test]
    fn small_file_round_trips_across_mounts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("disk.img");
        mkfs::format(&path, 7).unwrap();

        {
            let device = crate::block::FileBlockDevice::open(&path).unwrap();
            let mut fs = FileSystem::mount(device).unwrap();
            fs.create("hi").unwrap();
            let fd = fs.open("hi").unwrap();
            let written = fs.write(fd, b"Hello").unwrap();
            assert_eq!(written, 5);
            fs.close(fd).unwrap();
            fs.unmount().unwrap();
        }

        let device = crate::block::FileBlockDevice::open(&path).unwrap();
        let mut fs = FileSystem::mount(device).unwrap();
        let fd = fs.open("hi").unwrap();
        let mut buf = [0u8; 5];
        let read = fs.read(fd, &mut buf).unwrap();
        assert_eq!(read, 5);
        assert_eq!(&buf, b"Hello");
        assert_eq!(fs.stat(fd).unwrap(), 5);
    }

    #[test]
    fn cross_block_write_allocates_two_chained_blocks() {
        let mut fs = mounted(7);
        fs.create("big").unwrap();
        let fd = fs.open("big").unwrap();

        let data: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();
        let written = fs.write(fd, &data).unwrap();
        assert_eq!(written, 5000);
        assert_eq!(fs.stat(fd).unwrap(), 5000);

        fs.lseek(fd, 0).unwrap();
        let mut out = vec![0u8; 5000];
        let read = fs.read(fd, &mut out).unwrap();
        assert_eq!(read, 5000);
        assert_eq!(out, data);

        let entry = fs.root.find("big").unwrap();
        assert_eq!(fs.fat.chain_len(entry.first_data_index), 2);
    }

    #[test]
    fn short_write_at_capacity() {
        // 2 data blocks free: entry 0 is the sentinel, so data_blocks=2
        // leaves exactly 2 allocatable entries (1 and.. wait: data_blocks=2
        // means entries [0]=EOC, [1]=free — only 1 free block). Use 3 data
        // blocks so exactly 2 are free.
        let mut fs = mounted(3);
        fs.create("x").unwrap();
        let fd = fs.open("x").unwrap();
        let data = vec![7u8; 10000];
        let written = fs.write(fd, &data).unwrap();
        assert_eq!(written, 8192);
        assert_eq!(fs.stat(fd).unwrap(), 8192);
    }

    #[test]
    fn independent_offsets_across_two_descriptors() {
        let mut fs = mounted(7);
        fs.create("f").unwrap();
        let fd0 = fs.open("f").unwrap();
        fs.write(fd0, b"0123456789ABCDEF").unwrap();
        fs.lseek(fd0, 0).unwrap();

        let fd1 = fs.open("f").unwrap();
        fs.lseek(fd1, 10).unwrap();

        let mut buf0 = [0u8; 4];
        fs.read(fd0, &mut buf0).unwrap();
        assert_eq!(&buf0, b"0123");

        let mut buf1 = [0u8; 4];
        fs.read(fd1, &mut buf1).unwrap();
        assert_eq!(&buf1, b"ABCD");
    }

    #[test]
    fn delete_while_open_then_after_close() {
        let mut fs = mounted(7);
        fs.create("x").unwrap();
        let fd = fs.open("x").unwrap();
        assert!(matches!(fs.delete("x"), Err(FsError::FileOpen)));
        fs.close(fd).unwrap();
        fs.delete("x").unwrap();
    }

    #[test]
    fn create_then_delete_then_create_gives_empty_file() {
        let mut fs = mounted(7);
        fs.create("r").unwrap();
        let fd = fs.open("r").unwrap();
        fs.write(fd, b"xyz").unwrap();
        fs.close(fd).unwrap();
        fs.delete("r").unwrap();
        fs.create("r").unwrap();
        assert_eq!(fs.root.find("r").unwrap().file_size, 0);
    }
}
