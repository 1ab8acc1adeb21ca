//! The inline/remote storage marker.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Where an entity's definition is stored.
///
/// The platform reports `INLINE` or `REMOTE`; anything else (including a
/// missing field) is [`StoreType::Unknown`] and is treated like inline for
/// migration purposes.
///
/// # Examples
///
/// ```
/// use i2r_core::StoreType;
///
/// assert_eq!(StoreType::from_wire("REMOTE"), StoreType::Remote);
/// assert_eq!(StoreType::from_wire("something"), StoreType::Unknown);
/// assert!(StoreType::Remote.is_remote());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StoreType {
    /// Stored in the platform's own database.
    Inline,
    /// Stored in an external git repository.
    Remote,
    /// Not reported or not recognized.
    #[default]
    Unknown,
}

impl StoreType {
    /// Parses the platform's wire representation.
    #[must_use]
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "INLINE" => Self::Inline,
            "REMOTE" => Self::Remote,
            _ => Self::Unknown,
        }
    }

    /// Returns the platform's wire representation.
    #[must_use]
    pub const fn as_wire(self) -> &'static str {
        match self {
            Self::Inline => "INLINE",
            Self::Remote => "REMOTE",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Returns `true` if the entity already lives in git.
    #[inline]
    #[must_use]
    pub const fn is_remote(self) -> bool {
        matches!(self, Self::Remote)
    }
}

impl Serialize for StoreType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_wire())
    }
}

impl<'de> Deserialize<'de> for StoreType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map_or(Self::Unknown, Self::from_wire))
    }
}
