//! Block device abstraction.
//!
//! The file system core never touches a disk directly — every read and
//! write flows through this trait. Production code backs it with a regular
//! file via [`FileBlockDevice`]; tests back it with whatever implements the
//! trait, typically a `tempfile`-backed `FileBlockDevice` created through
//! [`crate::mkfs`].

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Fixed size, in bytes, of one block on any volume this crate can mount.
pub const BLOCK_SIZE: usize = 4096;

/// One block's worth of bytes.
pub type Block = [u8; BLOCK_SIZE];

/// A fixed-size, block-addressable storage device.
///
/// Implementors are responsible for nothing beyond moving bytes: the core
/// owns all interpretation of what those bytes mean.
pub trait BlockDevice {
    /// Number of fixed-size blocks on the device.
    fn block_count(&self) -> u32;

    /// Read block `index` into `buf`.
    fn read_block(&mut self, index: u32, buf: &mut Block) -> io::Result<()>;

    /// Write `buf` to block `index`.
    fn write_block(&mut self, index: u32, buf: &Block) -> io::Result<()>;

    /// Flush and release any underlying resource.
    fn close(&mut self) -> io::Result<()>;
}

/// A [`BlockDevice`] backed by a regular file, addressed by fixed-size
/// `BLOCK_SIZE` windows.
pub struct FileBlockDevice {
    file: File,
    block_count: u32,
}

impl FileBlockDevice {
    /// Open an existing disk image file and determine its block count from
    /// its length. Fails if the file's length is not a whole number of
    /// blocks.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let len = file.metadata()?.len();
        if len % BLOCK_SIZE as u64 != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "disk image length is not a multiple of the block size",
            ));
        }
        let block_count = (len / BLOCK_SIZE as u64) as u32;
        Ok(Self { file, block_count })
    }

    /// Create a new disk image file of exactly `block_count` blocks, all
    /// zeroed. Used by [`crate::mkfs`] and by tests.
    pub fn create<P: AsRef<Path>>(path: P, block_count: u32) -> io::Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        let zero = [0u8; BLOCK_SIZE];
        for _ in 0..block_count {
            file.write_all(&zero)?;
        }
        file.flush()?;
        file.seek(SeekFrom::Start(0))?;
        Ok(Self { file, block_count })
    }
}

impl BlockDevice for FileBlockDevice {
    fn block_count(&self) -> u32 {
        self.block_count
    }

    fn read_block(&mut self, index: u32, buf: &mut Block) -> io::Result<()> {
        if index >= self.block_count {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "block index out of range",
            ));
        }
        self.file
            .seek(SeekFrom::Start(index as u64 * BLOCK_SIZE as u64))?;
        self.file.read_exact(buf)
    }

    fn write_block(&mut self, index: u32, buf: &Block) -> io::Result<()> {
        if index >= self.block_count {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "block index out of range",
            ));
        }
        self.file
            .seek(SeekFrom::Start(index as u64 * BLOCK_SIZE as u64))?;
        self.file.write_all(buf)
    }

    fn close(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_block() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("disk.img");
        let mut dev = FileBlockDevice::create(&path, 4).unwrap();
        assert_eq!(dev.block_count(), 4);

        let mut block = [0u8; BLOCK_SIZE];
        block[0] = 0xAB;
        block[BLOCK_SIZE - 1] = 0xCD;
        dev.write_block(2, &block).unwrap();

        let mut out = [0u8; BLOCK_SIZE];
        dev.read_block(2, &mut out).unwrap();
        assert_eq!(out, block);
    }

    #[test]
    fn rejects_out_of_range_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("disk.img");
        let mut dev = FileBlockDevice::create(&path, 1).unwrap();
        let buf = [0u8; BLOCK_SIZE];
        assert!(dev.write_block(1, &buf).is_err());
    }
}
