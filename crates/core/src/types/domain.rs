//! Store domain type.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Errors that can occur when parsing a [`StoreDomain`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Nothing left after trimming.
    #[error("domain cannot be empty")]
    Empty,
    /// Longer than a DNS label allows.
    #[error("domain must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// Contains a character outside `a-z 0-9 - .`.
    #[error("domain contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// A store's unique domain slug.
///
/// Normalized by trimming and lower-casing, so `"MyShop"` and `" myshop "`
/// are the same domain.
///
/// ```
/// use kiosky_core::StoreDomain;
///
/// let a = StoreDomain::parse("MyShop").unwrap();
/// let b = StoreDomain::parse(" myshop ").unwrap();
/// assert_eq!(a, b);
/// assert!(StoreDomain::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct StoreDomain(String);

impl StoreDomain {
    /// Maximum length of a domain slug.
    pub const MAX_LENGTH: usize = 63;

    /// Parse and normalize a domain.
    ///
    /// # Errors
    ///
    /// Returns an error if the normalized input is empty, longer than
    /// [`Self::MAX_LENGTH`], or contains characters other than ASCII
    /// letters, digits, `-` and `.`.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let normalized = s.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(DomainError::Empty);
        }
        if normalized.len() > Self::MAX_LENGTH {
            return Err(DomainError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if let Some(c) = normalized
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '.')))
        {
            return Err(DomainError::InvalidCharacter(c));
        }
        Ok(Self(normalized))
    }

    /// Returns the domain as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StoreDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for StoreDomain {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for StoreDomain {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for StoreDomain {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for StoreDomain {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_case_and_whitespace() {
        assert_eq!(StoreDomain::parse("  Shop1 ").unwrap().as_str(), "shop1");
        assert_eq!(
            StoreDomain::parse("MyShop").unwrap(),
            StoreDomain::parse(" myshop ").unwrap()
        );
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(StoreDomain::parse(""), Err(DomainError::Empty));
        assert_eq!(StoreDomain::parse(" \t"), Err(DomainError::Empty));
    }

    #[test]
    fn test_rejects_invalid_characters() {
        assert_eq!(
            StoreDomain::parse("my shop"),
            Err(DomainError::InvalidCharacter(' '))
        );
        assert_eq!(
            StoreDomain::parse("shop/1"),
            Err(DomainError::InvalidCharacter('/'))
        );
    }

    #[test]
    fn test_rejects_too_long() {
        let long = "a".repeat(64);
        assert!(matches!(
            StoreDomain::parse(&long),
            Err(DomainError::TooLong { max: 63 })
        ));
    }
}
