//! Metadata tokens: the addressing primitive that ties every table row together.
//!
//! A token is the pair (table kind, 1-based row id) packed into a single 32-bit value:
//!
//! ```text
//!  31        24 23                              0
//! +------------+---------------------------------+
//! | table tag  |             row id              |
//! +------------+---------------------------------+
//! ```
//!
//! Row id 0 denotes an absent ("null") reference regardless of the table tag.
//!
//! ```rust
//! use cilgraph::metadata::{tables::TableId, token::Token};
//!
//! let token = Token::from_parts(TableId::MethodDef, 1);
//! assert_eq!(token.value(), 0x0600_0001);
//! assert_eq!(token.decode(), Some((TableId::MethodDef, 1)));
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::metadata::tables::TableId;

/// Table tag used by `ldstr` operands, which index the user-string heap rather than a table.
pub const USER_STRING_TAG: u8 = 0x70;

/// Largest row id representable in the 24-bit row field of a token.
pub const MAX_RID: u32 = 0x00FF_FFFF;

/// Reference to a metadata row, or to a user-string heap entry when tagged with
/// [`USER_STRING_TAG`].
///
/// Equality, ordering and hashing work on the raw 32-bit value, so tokens double as
/// identity-cache keys.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Token(pub u32);

impl Token {
    /// Wraps a raw token value.
    #[must_use]
    pub fn new(value: u32) -> Self {
        Token(value)
    }

    /// Encodes a table kind and row id. Row ids wider than 24 bits are truncated.
    #[must_use]
    pub fn from_parts(table: TableId, rid: u32) -> Self {
        Token((u32::from(table.as_u8()) << 24) | (rid & MAX_RID))
    }

    /// Raw 32-bit form, as stored in instruction operands.
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// High byte.
    #[must_use]
    pub fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Extracts the table kind, if the high byte names a metadata table
    #[must_use]
    pub fn table_id(&self) -> Option<TableId> {
        TableId::from_u8(self.table())
    }

    /// Row id (low 24 bits). Zero means absent.
    #[must_use]
    pub fn row(&self) -> u32 {
        self.0 & MAX_RID
    }

    /// Splits the token into table kind and row id.
    ///
    /// Returns `None` when the tag does not name a metadata table (for example user-string tokens).
    #[must_use]
    pub fn decode(&self) -> Option<(TableId, u32)> {
        self.table_id().map(|table| (table, self.row()))
    }

    /// Returns true if this token lives in `table`
    #[must_use]
    pub fn is_table(&self, table: TableId) -> bool {
        self.table() == table.as_u8()
    }

    /// Returns true if the row id is 0, which marks an absent reference
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.row() == 0
    }
}

impl From<u32> for Token {
    fn from(value: u32) -> Self {
        Token(value)
    }
}

impl From<Token> for u32 {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token(0x{:08x}, table: 0x{:02x}, row: {})",
            self.0,
            self.table(),
            self.row()
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}
