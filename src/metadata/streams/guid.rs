use crate::Result;

/// The `#GUID` heap: 16-byte entries addressed by a 1-based ordinal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Guid {
    data: Vec<u8>,
}

impl Guid {
    /// An empty heap.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of existing heap bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the data is not a whole number of entries.
    pub fn from(data: Vec<u8>) -> Result<Guid> {
        if data.len() % 16 != 0 {
            return Err(malformed_error!(
                "Data for #GUID heap is not a multiple of 16 bytes - {}",
                data.len()
            ));
        }

        Ok(Guid { data })
    }

    /// Get the GUID with 1-based ordinal `index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] for index 0 or an index past the last entry.
    pub fn get(&self, index: u32) -> Result<uguid::Guid> {
        let Some(start) = (index as usize).checked_sub(1).map(|slot| slot * 16) else {
            return Err(out_of_bounds_error!());
        };

        let mut buffer = [0u8; 16];
        match self.data.get(start..start + 16) {
            Some(bytes) => buffer.copy_from_slice(bytes),
            None => return Err(out_of_bounds_error!()),
        }
        Ok(uguid::Guid::from_bytes(buffer))
    }

    /// Append a GUID and return its ordinal.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the heap would outgrow 32-bit ordinals.
    pub fn append(&mut self, value: uguid::Guid) -> Result<u32> {
        let index = u32::try_from(self.count() + 1).map_err(|_| malformed_error!("Too many entries in #GUID heap"))?;
        self.data.extend_from_slice(&value.to_bytes());
        Ok(index)
    }

    /// Number of entries.
    #[must_use]
    pub fn count(&self) -> usize {
        self.data.len() / 16
    }

    /// The raw heap bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted() {
        #[rustfmt::skip]
        let data = vec![
            /* 1 */ 0x8e, 0x90, 0x37, 0xd4, 0xe6, 0x65, 0x7c, 0x48, 0x97, 0x35, 0x7b, 0xdf, 0xf6, 0x99, 0xbe, 0xa5,
            /* 2 */ 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA,
        ];

        let guids = Guid::from(data).unwrap();
        assert_eq!(guids.count(), 2);
        assert_eq!(
            guids.get(1).unwrap(),
            uguid::guid!("d437908e-65e6-487c-9735-7bdff699bea5")
        );
        assert_eq!(
            guids.get(2).unwrap(),
            uguid::guid!("AAAAAAAA-AAAA-AAAA-AAAA-AAAAAAAAAAAA")
        );
        assert!(guids.get(0).is_err());
        assert!(guids.get(3).is_err());
    }

    #[test]
    fn append_and_invalid() {
        let mut guids = Guid::new();
        let second = uguid::guid!("01234567-89ab-cdef-0123-456789abcdef");
        assert_eq!(guids.append(uguid::Guid::ZERO).unwrap(), 1);
        assert_eq!(guids.append(second).unwrap(), 2);
        assert_eq!(guids.get(2).unwrap(), second);
        assert_eq!(&guids.as_bytes()[16..20], &[0x67, 0x45, 0x23, 0x01]);
        assert!(Guid::from(vec![0; 15]).is_err());
    }
}
