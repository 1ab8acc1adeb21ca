//! Error types for the i2r-manifest crate.

/// Errors raised while parsing or re-serializing a manifest document.
///
/// All of them are per-document: the driver records the owning entity as
/// failed and moves on.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// A YAML document could not be parsed or written.
    #[error("invalid manifest YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON override spec could not be parsed or written.
    #[error("invalid override spec: {0}")]
    Json(#[from] serde_json::Error),

    /// The document is valid but lacks the section being rewritten.
    #[error("manifest document has no '{0}' section")]
    MissingSection(&'static str),
}
