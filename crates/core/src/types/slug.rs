//! URL slug for categories and products.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Errors that can occur when parsing a [`Slug`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug cannot be empty")]
    Empty,
    #[error("slug must be at most {max} characters")]
    TooLong { max: usize },
    #[error("slug must be lowercase words separated by single hyphens")]
    Malformed,
}

/// A lower-case, hyphen-separated slug, unique within a store.
///
/// ```
/// use kiosky_core::Slug;
///
/// assert_eq!(Slug::parse(" Summer-Sale ").unwrap().as_str(), "summer-sale");
/// assert!(Slug::parse("summer--sale").is_err());
/// assert!(Slug::parse("-sale").is_err());
/// ```
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Maximum slug length.
    pub const MAX_LENGTH: usize = 100;

    /// Parse and normalize a slug.
    ///
    /// # Errors
    ///
    /// Returns an error if the normalized input is empty, too long, or not of
    /// the form `[a-z0-9]+(-[a-z0-9]+)*`.
    pub fn parse(s: &str) -> Result<Self, SlugError> {
        let normalized = s.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(SlugError::Empty);
        }
        if normalized.len() > Self::MAX_LENGTH {
            return Err(SlugError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        let well_formed = normalized.split('-').all(|part| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        });
        if !well_formed {
            return Err(SlugError::Malformed);
        }
        Ok(Self(normalized))
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Slug {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Slug {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Slug {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Slug {
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
    fn test_accepts_simple_slugs() {
        assert_eq!(Slug::parse("shirts").unwrap().as_str(), "shirts");
        assert_eq!(Slug::parse("Tee-2024").unwrap().as_str(), "tee-2024");
    }

    #[test]
    fn test_rejects_malformed() {
        assert_eq!(Slug::parse(""), Err(SlugError::Empty));
        assert_eq!(Slug::parse("a b"), Err(SlugError::Malformed));
        assert_eq!(Slug::parse("a-"), Err(SlugError::Malformed));
        assert_eq!(Slug::parse("a_b"), Err(SlugError::Malformed));
    }
}
