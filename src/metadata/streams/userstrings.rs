use widestring::U16String;

use crate::{
    file::{io::write_compressed_uint, parser::Parser},
    metadata::streams::strings::heap_index,
    Result,
};

/// The `#US` heap: string literals loaded by `ldstr`.
///
/// Each entry is a compressed byte length, the UTF-16LE characters, and one trailing flag
/// byte that is set when any character needs more than 8-bit handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserStrings {
    data: Vec<u8>,
}

impl Default for UserStrings {
    fn default() -> Self {
        UserStrings { data: vec![0] }
    }
}

impl UserStrings {
    /// An empty heap.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of existing heap bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the data does not start with the empty entry.
    pub fn from(data: Vec<u8>) -> Result<UserStrings> {
        if data.first() != Some(&0) {
            return Err(malformed_error!("Invalid memory for #US heap"));
        }

        Ok(UserStrings { data })
    }

    /// Get the string starting at `index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] for an index or length past the heap, and
    /// [`crate::Error::Malformed`] for invalid UTF-16.
    pub fn get(&self, index: u32) -> Result<String> {
        let index = index as usize;
        if index >= self.data.len() {
            return Err(out_of_bounds_error!());
        }

        let mut parser = Parser::new(&self.data[index..]);
        let len = parser.read_compressed_uint()? as usize;
        // The trailing flag byte is not part of the characters
        let chars = parser.read_bytes(len)?;
        let chars = &chars[..len - (len % 2)];

        let units: Vec<u16> = chars
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        U16String::from_vec(units)
            .to_string()
            .map_err(|_| malformed_error!("Invalid string from index - {}", index))
    }

    /// Append a string and return its index.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the string is too long or the heap would
    /// outgrow its 24-bit token space.
    pub fn append(&mut self, value: &str) -> Result<u32> {
        let units = U16String::from_str(value).into_vec();
        let len = u32::try_from(units.len() * 2 + 1)
            .map_err(|_| malformed_error!("User string of {} characters is too long", units.len()))?;

        let index = heap_index(self.data.len())?;
        if index > crate::metadata::token::MAX_RID {
            return Err(malformed_error!("#US heap exceeds the user string token range"));
        }

        write_compressed_uint(len, &mut self.data)?;
        for unit in &units {
            self.data.extend_from_slice(&unit.to_le_bytes());
        }
        self.data.push(u8::from(units.iter().any(|unit| needs_flag(*unit))));
        Ok(index)
    }

    /// Size of the heap in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether only the leading empty entry is present.
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

fn needs_flag(unit: u16) -> bool {
    unit > 0xFF || matches!(unit, 0x01..=0x08 | 0x0E..=0x1F | 0x27 | 0x2D | 0x7F)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted() {
        #[rustfmt::skip]
        let data = vec![
            0x00, 0x1b, 0x48, 0x00, 0x65, 0x00, 0x6c, 0x00, 0x6c, 0x00, 0x6f, 0x00, 0x2c, 0x00, 0x20, 0x00,
            0x57, 0x00, 0x6f, 0x00, 0x72, 0x00, 0x6c, 0x00, 0x64, 0x00, 0x21, 0x00, 0x00,
        ];

        let us = UserStrings::from(data).unwrap();
        assert_eq!(us.get(1).unwrap(), "Hello, World!");
        assert!(us.get(40).is_err());
    }

    #[test]
    fn unpaired_surrogate_is_malformed() {
        // 0xD800 alone, length 3 with the flag byte
        let us = UserStrings::from(vec![0x00, 0x03, 0x00, 0xD8, 0x01]).unwrap();
        assert!(matches!(us.get(1), Err(crate::Error::Malformed { .. })));
    }

    #[test]
    fn append_encodes_surrogate_pairs() {
        let mut us = UserStrings::new();
        let index = us.append("\u{1F600}").unwrap();
        assert_eq!(&us.as_bytes()[1..7], &[0x05, 0x3D, 0xD8, 0x00, 0xDE, 0x01]);
        assert_eq!(us.get(index).unwrap(), "\u{1F600}");
    }

    #[test]
    fn append_sets_flag_byte() {
        let mut us = UserStrings::new();
        let plain = us.append("ab").unwrap();
        let flagged = us.append("it's").unwrap();

        assert_eq!(plain, 1);
        assert_eq!(&us.as_bytes()[1..7], &[0x05, 0x61, 0x00, 0x62, 0x00, 0x00]);
        assert_eq!(us.as_bytes()[us.len() - 1], 1);
        assert_eq!(us.get(flagged).unwrap(), "it's");
        assert_eq!(us.get(plain).unwrap(), "ab");
    }
}
