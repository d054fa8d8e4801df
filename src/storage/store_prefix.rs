use derive_more::{Display, From};
use thiserror::Error;

/// A store prefix.
///
/// A prefix is either empty (the root) or a `/` terminated string which does not start with `/`.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
pub struct StorePrefix(String);

/// An invalid store prefix.
#[derive(Debug, Error, From)]
#[error("invalid store prefix {0}")]
pub struct StorePrefixError(String);

impl StorePrefix {
    /// Create a new store prefix from `prefix`.
    ///
    /// # Errors
    /// Returns [`StorePrefixError`] if `prefix` is not valid according to [`StorePrefix::validate`()].
    pub fn new(prefix: impl Into<String>) -> Result<Self, StorePrefixError> {
        let prefix = prefix.into();
        if Self::validate(&prefix) {
            Ok(Self(prefix))
        } else {
            Err(StorePrefixError(prefix))
        }
    }

    /// Create a store prefix from an absolute array path such as `/` or `/group/volume`.
    ///
    /// # Errors
    /// Returns [`StorePrefixError`] if `path` is not absolute, has a trailing `/`, or contains an empty segment.
    pub fn from_path(path: &str) -> Result<Self, StorePrefixError> {
        if path == "/" {
            return Ok(Self::root());
        }
        match path.strip_prefix('/') {
            Some(relative) if relative.split('/').all(|segment| !segment.is_empty()) => {
                Ok(Self(format!("{relative}/")))
            }
            _ => Err(StorePrefixError(path.to_string())),
        }
    }

    pub(super) fn from_key_parent(parent: &str) -> Self {
        Self(format!("{parent}/"))
    }

    /// The root prefix.
    #[must_use]
    pub const fn root() -> Self {
        Self(String::new())
    }

    /// Extracts a string slice containing the prefix `String`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validates a prefix. A prefix is empty, or ends with a `/` and does not start with `/`.
    #[must_use]
    pub fn validate(prefix: &str) -> bool {
        prefix.is_empty() || (prefix.ends_with('/') && !prefix.starts_with('/'))
    }
}

impl TryFrom<&str> for StorePrefix {
    type Error = StorePrefixError;

    fn try_from(prefix: &str) -> Result<Self, StorePrefixError> {
        Self::new(prefix)
    }
}
