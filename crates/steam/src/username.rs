//! Steam account names.

use std::fmt;
use std::str::FromStr;

/// A validated Steam account name, stored lowercase.
///
/// A username must be between [`Username::MIN_LEN`] and [`Username::MAX_LEN`]
/// bytes long and consist only of `[a-zA-Z0-9_]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Username(String);

impl Username {
    pub const MAX_LEN: usize = 32;
    pub const MIN_LEN: usize = 3;

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Length including the NUL terminator the registry stores.
    pub fn len_with_nul(&self) -> usize {
        self.0.len() + 1
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&[u8]> for Username {
    type Error = UsernameError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        if value.len() > Username::MAX_LEN {
            return Err(UsernameError::TooLong);
        }
        if value.len() < Username::MIN_LEN {
            return Err(UsernameError::TooShort);
        }
        if !value
            .iter()
            .all(|b| b.is_ascii_alphanumeric() || *b == b'_')
        {
            return Err(UsernameError::IllegalCharacters);
        }
        let lower = value.to_ascii_lowercase();
        // Only ASCII survives the check above.
        Ok(Self(lower.into_iter().map(char::from).collect()))
    }
}

impl TryFrom<&str> for Username {
    type Error = UsernameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Username::try_from(value.as_bytes())
    }
}

impl FromStr for Username {
    type Err = UsernameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Username::try_from(s)
    }
}

/// Why a string is not a valid [`Username`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum UsernameError {
    #[error(
        "the username is too short, it must be at least {} characters",
        Username::MIN_LEN
    )]
    TooShort,

    #[error(
        "the username is too long, it must be at most {} characters",
        Username::MAX_LEN
    )]
    TooLong,

    #[error("the username may only contain ASCII letters, digits and underscores")]
    IllegalCharacters,
}
