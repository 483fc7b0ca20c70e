//! Metadata heaps: strings, blobs, GUIDs and user strings.
//!
//! Each heap owns its bytes, resolves an index to a value and supports appending new values
//! while a module is rebuilt. [`Heaps`] bundles the four of them for one module.

mod blob;
mod guid;
mod strings;
mod userstrings;

pub use blob::{Blob, BlobIterator};
pub use guid::Guid;
pub use strings::Strings;
pub use userstrings::UserStrings;

use crate::metadata::tables::{HEAP_SIZE_BLOB, HEAP_SIZE_GUID, HEAP_SIZE_STRINGS};

/// The four heaps of one module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Heaps {
    /// `#Strings`
    pub strings: Strings,
    /// `#Blob`
    pub blobs: Blob,
    /// `#GUID`
    pub guids: Guid,
    /// `#US`
    pub user_strings: UserStrings,
}

impl Heaps {
    /// Empty heaps.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The `HeapSizes` flags matching the current heap sizes.
    #[must_use]
    pub fn heap_sizes(&self) -> u8 {
        let mut flags = 0;
        if self.strings.len() > usize::from(u16::MAX) {
            flags |= HEAP_SIZE_STRINGS;
        }
        if self.guids.count() > usize::from(u16::MAX) {
            flags |= HEAP_SIZE_GUID;
        }
        if self.blobs.len() > usize::from(u16::MAX) {
            flags |= HEAP_SIZE_BLOB;
        }
        flags
    }
}
