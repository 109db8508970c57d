//! Error taxonomy for the file system core.
//!
//! Every fallible operation returns `Result<_, FsError>`. The variants group
//! into the six kinds from the design: device, layout, capacity, lookup,
//! range, and state errors. Short reads/writes are not errors — they are
//! `Ok(n)` with `n` less than the requested count.

use std::io;

/// Reason a superblock failed the mount-time validation pass.
///
/// Each variant corresponds to one invariant check so a failing mount can be
/// diagnosed without re-deriving the geometry by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("signature does not match ECS150FS")]
    BadSignature,
    #[error("fat_blocks + data_blocks != total_blocks - 2")]
    RegionCountMismatch,
    #[error("total_blocks does not match the block device's reported count")]
    TotalBlocksMismatch,
    #[error("root_index/data_index are not contiguous after the FAT region")]
    NonContiguousLayout,
    #[error("fat_blocks does not equal ceil(data_blocks * 2 / BLOCK_SIZE)")]
    FatBlockCountMismatch,
    #[error("FAT entry 0 is not the 0xFFFF sentinel")]
    MissingFatSentinel,
}

/// Unified error type for every core operation.
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    /// Block device open/close/read/write failure.
    #[error("block device error: {0}")]
    Device(#[from] io::Error),

    /// Superblock failed validation at mount time.
    #[error("invalid volume layout: {0}")]
    Layout(#[from] LayoutError),

    /// The root directory has no free slot for a new file.
    #[error("root directory is full")]
    DirectoryFull,

    /// The open-file table has no free slot.
    #[error("open-file table is full")]
    OpenFileTableFull,

    /// The FAT has no free data block left to allocate.
    #[error("no free data block available")]
    NoFreeBlock,

    /// No directory entry matches the given name.
    #[error("file not found")]
    NotFound,

    /// The file descriptor is out of range or refers to a closed slot.
    #[error("invalid file descriptor")]
    InvalidDescriptor,

    /// A file name is too long to fit the 16-byte filename field.
    #[error("file name too long")]
    NameTooLong,

    /// `create` was called with a name that already has a non-free entry.
    #[error("file already exists")]
    NameAlreadyExists,

    /// `lseek` was asked to move past the file's current size.
    #[error("seek offset past end of file")]
    SeekPastEnd,

    /// An operation other than `mount` was attempted before any volume was
    /// mounted, or after it was unmounted.
    ///
    /// `FileSystem<D>` encapsulates the mounted state as an owned value
    /// rather than a global: there is no `FileSystem` to call methods on
    /// before `mount` succeeds, and `unmount` consumes `self`, so this
    /// condition can never actually arise through the safe API. The variant
    /// is kept for API parity with the error taxonomy (every caller matching
    /// on `FsError` can still handle it) and for any future entry point —
    /// e.g. a process-wide handle — that reintroduces a "no mount active"
    /// state the type system doesn't already rule out.
    #[error("no file system is mounted")]
    NotMounted,

    /// `delete` was attempted while a handle still references the file.
    #[error("file is still open")]
    FileOpen,
}

/// Convenience alias used throughout the crate.
pub type FsResult<T> = Result<T, FsError>;
