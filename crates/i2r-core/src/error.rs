//! Error types for the i2r-core crate.
//!
//! This module provides [`ConfigError`] for configuration loading and
//! validation failures, and [`PathError`] for the (rare) inputs the path
//! deriver refuses to map.

use camino::Utf8PathBuf;

/// Errors that can occur during configuration loading and validation.
///
/// # Examples
///
/// ```
/// use i2r_core::ConfigError;
///
/// let error = ConfigError::missing("accountIdentifier");
/// assert!(error.to_string().contains("accountIdentifier"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required option was not provided by the config file, flags, or env.
    #[error("missing required option '{0}'")]
    MissingOption(String),

    /// A configuration option has an invalid value.
    #[error("invalid configuration option '{option}': {reason}")]
    InvalidOption {
        /// The name of the invalid option.
        option: String,
        /// Explanation of why the option is invalid.
        reason: String,
    },

    /// The configuration file could not be read.
    #[error("failed to read configuration file {path}: {source}")]
    Io {
        /// The path that failed to read.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the configuration document.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
}

impl ConfigError {
    /// Creates a new [`ConfigError::MissingOption`] error.
    #[inline]
    pub fn missing(option: impl Into<String>) -> Self {
        Self::MissingOption(option.into())
    }

    /// Creates a new [`ConfigError::InvalidOption`] error.
    #[inline]
    pub fn invalid(option: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            option: option.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised by [`derive_path`](crate::derive_path).
///
/// Path derivation is total for every well-formed entity. The only refusal
/// is an override whose scope type this tool does not know how to lay out
/// in the git-experience convention; callers treat it as fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// An override v2 document carries a scope type with no git layout.
    #[error("override '{identifier}' has unrecognized scope type '{scope}'")]
    UnknownOverrideScope {
        /// The override identifier.
        identifier: String,
        /// The scope type as reported by the platform.
        scope: String,
    },
}
