//! Arena tokens addressing the types and members of a [`crate::metadata::Module`].

use std::fmt;
use std::hash::{Hash, Hasher};

/// Table id of the type definition arena.
pub const TYPE_TABLE: u8 = 0x02;
/// Table id of the member arena (member definitions and member references).
pub const MEMBER_TABLE: u8 = 0x0A;

/// A token addressing an entry of a [`crate::metadata::Module`] arena.
///
/// Tokens follow the metadata token layout:
/// - The high byte (bits 24-31) indicates the arena (table)
/// - The low 24 bits (bits 0-23) indicate the 1-based row within that arena
///
/// Symbol references inside instruction streams are stored as tokens, so that
/// redirecting a reference is a local token swap rather than a graph edit.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Token(pub u32);

impl Token {
    /// Creates a new token from a raw 32-bit value
    #[must_use]
    pub fn new(value: u32) -> Self {
        Token(value)
    }

    /// Creates the token of the member at `index` (0-based) in the member arena
    #[must_use]
    pub fn member(index: usize) -> Self {
        Token((u32::from(MEMBER_TABLE) << 24) | ((index as u32 + 1) & 0x00FF_FFFF))
    }

    /// Creates the token of the type at `index` (0-based) in the type arena
    #[must_use]
    pub fn type_def(index: usize) -> Self {
        Token((u32::from(TYPE_TABLE) << 24) | ((index as u32 + 1) & 0x00FF_FFFF))
    }

    /// Returns the raw token value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Extracts the table type from the token (high byte)
    #[must_use]
    pub fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Extracts the row index from the token (low 24 bits)
    #[must_use]
    pub fn row(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// Returns the 0-based arena index, or `None` for a null row
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        match self.row() {
            0 => None,
            row => Some(row as usize - 1),
        }
    }

    /// Returns true if this token addresses the member arena
    #[must_use]
    pub fn is_member(&self) -> bool {
        self.table() == MEMBER_TABLE
    }

    /// Returns true if this token addresses the type arena
    #[must_use]
    pub fn is_type(&self) -> bool {
        self.table() == TYPE_TABLE
    }

    /// Returns true if this is a null token (value 0)
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_token_member() {
        let token = Token::member(0);
        assert_eq!(token.value(), 0x0A000001);
        assert!(token.is_member());
        assert!(!token.is_type());
        assert_eq!(token.index(), Some(0));

        let token = Token::member(41);
        assert_eq!(token.row(), 42);
        assert_eq!(token.index(), Some(41));
    }

    #[test]
    fn test_token_type_def() {
        let token = Token::type_def(4);
        assert_eq!(token.value(), 0x02000005);
        assert_eq!(token.table(), TYPE_TABLE);
        assert!(token.is_type());
        assert_eq!(token.index(), Some(4));
    }

    #[test]
    fn test_token_is_null() {
        let null_token = Token(0x00000000);
        assert!(null_token.is_null());
        assert_eq!(null_token.index(), None);

        let empty_row = Token(0x0A000000);
        assert!(!empty_row.is_null());
        assert_eq!(empty_row.index(), None);
    }

    #[test]
    fn test_token_from_conversion() {
        let value = 0x0A000003u32;
        let token: Token = value.into();
        assert_eq!(token, Token::member(2));

        let back_to_u32: u32 = token.into();
        assert_eq!(back_to_u32, value);
    }

    #[test]
    fn test_token_display() {
        assert_eq!(format!("{}", Token::member(0)), "0x0a000001");
        assert_eq!(format!("{}", Token(0)), "0x00000000");
    }

    #[test]
    fn test_token_debug() {
        let debug_str = format!("{:?}", Token::member(0));
        assert!(debug_str.contains("Token(0x0a000001"));
        assert!(debug_str.contains("table: 0x0a"));
        assert!(debug_str.contains("row: 1"));
    }

    #[test]
    fn test_token_ordering() {
        assert!(Token::type_def(10) < Token::member(0));
        assert!(Token::member(0) < Token::member(1));
    }

    #[test]
    fn test_token_hash() {
        let mut map = HashMap::new();
        map.insert(Token::member(0), "DrawSprite");
        map.insert(Token::member(1), "Version");

        assert_eq!(map.get(&Token::member(0)), Some(&"DrawSprite"));
        assert_eq!(map.get(&Token::member(1)), Some(&"Version"));
    }
}
