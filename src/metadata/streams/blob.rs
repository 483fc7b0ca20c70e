use crate::{
    file::{io::write_compressed_uint, parser::Parser},
    metadata::streams::strings::heap_index,
    Result,
};

/// The `#Blob` heap: length-prefixed byte sequences addressed by byte offset.
///
/// Each entry starts with a compressed unsigned length. Offset 0 holds the empty blob and is
/// treated as "no blob", the same as an offset past the heap or an entry whose length runs
/// off its end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    data: Vec<u8>,
}

impl Default for Blob {
    fn default() -> Self {
        Blob { data: vec![0] }
    }
}

impl Blob {
    /// An empty heap holding only the empty blob.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of existing heap bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the data does not start with the empty blob.
    pub fn from(data: Vec<u8>) -> Result<Blob> {
        if data.first() != Some(&0) {
            return Err(malformed_error!("Invalid memory for #Blob heap"));
        }

        Ok(Blob { data })
    }

    /// Get the blob starting at `index`, or `None` if there is none.
    #[must_use]
    pub fn get(&self, index: u32) -> Option<&[u8]> {
        let index = index as usize;
        if index == 0 || index >= self.data.len() {
            return None;
        }

        let mut parser = Parser::new(&self.data[index..]);
        let len = parser.read_compressed_uint().ok()? as usize;
        let start = index.checked_add(parser.pos())?;
        let end = start.checked_add(len)?;

        self.data.get(start..end)
    }

    /// Append a blob and return its index. The empty blob maps to index 0.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the blob is too long for a compressed length or
    /// the heap would outgrow 32-bit indices.
    pub fn append(&mut self, value: &[u8]) -> Result<u32> {
        if value.is_empty() {
            return Ok(0);
        }

        let len = u32::try_from(value.len())
            .map_err(|_| malformed_error!("Blob of {} bytes is too long", value.len()))?;
        let index = heap_index(self.data.len())?;
        write_compressed_uint(len, &mut self.data)?;
        self.data.extend_from_slice(value);
        Ok(index)
    }

    /// Iterate over `(index, blob)` pairs, skipping the leading empty blob.
    ///
    /// Iteration stops at the first entry whose length prefix or body is truncated.
    #[must_use]
    pub fn iter(&self) -> BlobIterator<'_> {
        BlobIterator {
            blob: self,
            position: 1,
        }
    }

    /// Size of the heap in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether only the leading empty blob is present.
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

impl<'a> IntoIterator for &'a Blob {
    type Item = (u32, &'a [u8]);
    type IntoIter = BlobIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the entries of a [`Blob`] heap.
pub struct BlobIterator<'a> {
    blob: &'a Blob,
    position: usize,
}

impl<'a> Iterator for BlobIterator<'a> {
    type Item = (u32, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let index = u32::try_from(self.position).ok()?;
        let data = self.blob.get(index)?;

        let mut parser = Parser::new(&self.blob.data[self.position..]);
        parser.read_compressed_uint().ok()?;
        self.position += parser.pos() + data.len();

        Some((index, data))
    }
}
