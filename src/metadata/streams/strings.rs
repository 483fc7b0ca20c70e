use std::ffi::CStr;

use crate::Result;

/// The `#Strings` heap: NUL-terminated UTF-8 identifiers addressed by byte offset.
///
/// Offset 0 always holds the empty string.
///
/// ```rust
/// use cilgraph::metadata::streams::Strings;
///
/// let mut strings = Strings::new();
/// let index = strings.append("Console")?;
/// assert_eq!(strings.get(index)?, "Console");
/// assert_eq!(strings.get(0)?, "");
/// # Ok::<(), cilgraph::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strings {
    data: Vec<u8>,
}

impl Default for Strings {
    fn default() -> Self {
        Strings { data: vec![0] }
    }
}

impl Strings {
    /// An empty heap holding only the empty string.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of existing heap bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the data does not start with the empty string.
    pub fn from(data: Vec<u8>) -> Result<Strings> {
        if data.first() != Some(&0) {
            return Err(malformed_error!("Provided #Strings heap is empty"));
        }

        Ok(Strings { data })
    }

    /// Get the string starting at `index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] for an index past the heap, and [`crate::Error::Malformed`] for
    /// unterminated or non UTF-8 data.
    pub fn get(&self, index: u32) -> Result<&str> {
        let index = index as usize;
        if index >= self.data.len() {
            return Err(out_of_bounds_error!());
        }

        match CStr::from_bytes_until_nul(&self.data[index..]) {
            Ok(result) => result
                .to_str()
                .map_err(|_| malformed_error!("Invalid string at index - {}", index)),
            Err(_) => Err(malformed_error!("Invalid string at index - {}", index)),
        }
    }

    /// Append a string and return its index. The empty string maps to index 0.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `value` contains a NUL character or the heap would
    /// outgrow 32-bit indices.
    pub fn append(&mut self, value: &str) -> Result<u32> {
        if value.is_empty() {
            return Ok(0);
        }
        if value.contains('\0') {
            return Err(malformed_error!("String '{}' contains a NUL character", value));
        }

        let index = heap_index(self.data.len())?;
        self.data.extend_from_slice(value.as_bytes());
        self.data.push(0);
        Ok(index)
    }

    /// Size of the heap in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether only the leading empty string is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.len() <= 1
    }

    /// The raw heap bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

pub(crate) fn heap_index(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| malformed_error!("Heap size {} exceeds 32-bit indices", len))
}
