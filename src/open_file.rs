//! The in-memory open-file table: up to 32 handles, each an independent
//! cursor over a named file.

use crate::error::{FsError, FsResult};
use crate::layout::OPEN_FILE_MAX_COUNT;

#[derive(Debug, Clone)]
struct Handle {
    name: Option<String>,
    offset: usize,
}

impl Handle {
    const fn free() -> Self {
        Self {
            name: None,
            offset: 0,
        }
    }
}

/// Fixed-size table of open-file handles, identified by slot index.
#[derive(Debug, Clone)]
pub struct OpenFileTable {
    handles: Vec<Handle>,
}

impl OpenFileTable {
    pub fn new() -> Self {
        Self {
            handles: vec![Handle::free(); OPEN_FILE_MAX_COUNT],
        }
    }

    /// Occupy the lowest-indexed free slot for `name`, returning its index.
    pub fn open(&mut self, name: &str) -> FsResult<usize> {
        let slot = self
            .handles
            .iter_mut()
            .position(|h| h.name.is_none())
            .ok_or(FsError::OpenFileTableFull)?;
        self.handles[slot] = Handle {
            name: Some(name.to_string()),
            offset: 0,
        };
        Ok(slot)
    }

    fn get(&self, fd: usize) -> FsResult<&Handle> {
        self.handles
            .get(fd)
            .filter(|h| h.name.is_some())
            .ok_or(FsError::InvalidDescriptor)
    }

    fn get_mut(&mut self, fd: usize) -> FsResult<&mut Handle> {
        if fd >= self.handles.len() || self.handles[fd].name.is_none() {
            return Err(FsError::InvalidDescriptor);
        }
        Ok(&mut self.handles[fd])
    }

    pub fn close(&mut self, fd: usize) -> FsResult<()> {
        self.get(fd)?;
        self.handles[fd] = Handle::free();
        Ok(())
    }

    /// Name the given descriptor was opened against.
    pub fn name_of(&self, fd: usize) -> FsResult<&str> {
        Ok(self.get(fd)?.name.as_deref().unwrap())
    }

    pub fn offset_of(&self, fd: usize) -> FsResult<usize> {
        Ok(self.get(fd)?.offset)
    }

    pub fn set_offset(&mut self, fd: usize, offset: usize) -> FsResult<()> {
        self.get_mut(fd)?.offset = offset;
        Ok(())
    }

    /// Whether any open handle currently names `name`.
    pub fn any_open_with_name(&self, name: &str) -> bool {
        self.handles
            .iter()
            .any(|h| h.name.as_deref() == Some(name))
    }

    /// Whether any handle at all is open, regardless of which file it names.
    /// This is a coarser predicate than [`OpenFileTable::any_open_with_name`]
    /// and is not what `delete` uses — `delete` only blocks on handles that
    /// actually name the file being deleted. Exposed separately for callers
    /// that want the coarser "is anything open at all" check (see the design
    /// notes for the reasoning behind scoping `delete` the narrower way).
    pub fn any_open(&self) -> bool {
        self.handles.iter().any(|h| h.name.is_some())
    }
}

impl Default for OpenFileTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn independent_offsets_for_same_name() {
        let mut table = OpenFileTable::new();
        let fd1 = table.open("f").unwrap();
        let fd2 = table.open("f").unwrap();
        table.set_offset(fd1, 0).unwrap();
        table.set_offset(fd2, 10).unwrap();
        assert_eq!(table.offset_of(fd1).unwrap(), 0);
        assert_eq!(table.offset_of(fd2).unwrap(), 10);
    }

    #[test]
    fn close_frees_the_lowest_slot_first() {
        let mut table = OpenFileTable::new();
        let fd1 = table.open("a").unwrap();
        table.close(fd1).unwrap();
        let fd2 = table.open("b").unwrap();
        assert_eq!(fd1, fd2);
    }

    #[test]
    fn rejects_invalid_descriptors() {
        let table = OpenFileTable::new();
        assert!(matches!(
            table.offset_of(0),
            Err(FsError::InvalidDescriptor)
        ));
        assert!(matches!(
            table.offset_of(OPEN_FILE_MAX_COUNT),
            Err(FsError::InvalidDescriptor)
        ));
    }

    #[test]
    fn any_open_is_true_for_any_handle_any_open_with_name_is_scoped() {
        let mut table = OpenFileTable::new();
        assert!(!table.any_open());
        assert!(!table.any_open_with_name("a"));

        let fd = table.open("a").unwrap();
        assert!(table.any_open());
        assert!(table.any_open_with_name("a"));
        assert!(!table.any_open_with_name("b"));

        table.close(fd).unwrap();
        assert!(!table.any_open());
    }
}
