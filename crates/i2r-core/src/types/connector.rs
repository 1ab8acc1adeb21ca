//! Git connectors registered on the platform.

use serde::{Deserialize, Serialize};

/// A git connector, as far as the publisher and rewriter need it.
///
/// # Examples
///
/// ```
/// use i2r_core::{Connector, ConnectorSpec};
///
/// let connector = Connector {
///     identifier: "github".to_owned(),
///     connector_type: "Github".to_owned(),
///     spec: ConnectorSpec {
///         url: "https://github.com/acme".to_owned(),
///         connection_type: Some("Account".to_owned()),
///     },
/// };
/// assert_eq!(connector.repository_url("filestore"), "https://github.com/acme/filestore.git");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connector {
    /// Connector identifier.
    pub identifier: String,
    /// Provider type (`Github`, `Gitlab`, `Bitbucket`, `Git`, ...).
    #[serde(rename = "type", default)]
    pub connector_type: String,
    /// Provider-specific settings.
    #[serde(default)]
    pub spec: ConnectorSpec,
}

/// The subset of a connector's spec used here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorSpec {
    /// Account or repository URL.
    #[serde(default)]
    pub url: String,
    /// `Account` or `Repo`.
    #[serde(default, alias = "type")]
    pub connection_type: Option<String>,
}

impl Connector {
    /// Returns `true` if the connector points at an account rather than a
    /// single repository.
    #[must_use]
    pub fn is_account_level(&self) -> bool {
        self.spec
            .connection_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case("account"))
    }

    /// Returns the clone URL for the publish repository.
    ///
    /// Account connectors get `/<repo_name>` appended; the result always ends
    /// in `.git`.
    #[must_use]
    pub fn repository_url(&self, repo_name: &str) -> String {
        let base = self.spec.url.trim_end_matches('/');
        let mut url = if self.is_account_level() && !repo_name.is_empty() {
            format!("{base}/{repo_name}")
        } else {
            base.to_owned()
        };
        if !url.ends_with(".git") {
            url.push_str(".git");
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connector(url: &str, connection_type: Option<&str>) -> Connector {
        Connector {
            identifier: "conn".to_owned(),
            connector_type: "Gitlab".to_owned(),
            spec: ConnectorSpec {
                url: url.to_owned(),
                connection_type: connection_type.map(str::to_owned),
            },
        }
    }

    #[test]
    fn test_repo_connector_url() {
        let c = connector("https://gitlab.com/acme/files", Some("Repo"));
        assert_eq!(c.repository_url("ignored"), "https://gitlab.com/acme/files.git");
    }

    #[test]
    fn test_account_connector_url() {
        let c = connector("https://gitlab.com/acme/", Some("Account"));
        assert_eq!(c.repository_url("files"), "https://gitlab.com/acme/files.git");
    }

    #[test]
    fn test_url_already_suffixed() {
        let c = connector("https://gitlab.com/acme/files.git", None);
        assert_eq!(c.repository_url(""), "https://gitlab.com/acme/files.git");
    }

    #[test]
    fn test_deserialize_connector() {
        let json = r#"{"identifier":"gl","type":"Gitlab","spec":{"url":"https://gitlab.com/a","type":"Account"}}"#;
        let c: Connector = serde_json::from_str(json).unwrap();
        assert!(c.is_account_level());
        assert_eq!(c.connector_type, "Gitlab");
    }
}
