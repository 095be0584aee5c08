//! Static, per-deployment configuration of the verifier.

use anyhow::{bail, Result};
use serde::Deserialize;
use url::Url;

/// Configuration the verifier is deployed with. Immutable for the lifetime of
/// the process; both use cases read it, neither writes it.
#[derive(Deserialize, Debug, Clone)]
pub struct VerifierConfig {
    /// OAuth client identifier the wallet will see in every request object.
    pub client_id: String,
    /// How signed request objects reach the wallet.
    pub request_object_embed: EmbedOption,
    /// Where the wallet posts its authorization response (`direct_post`).
    pub response_uri: Url,
}

/// How the signed request object reaches the wallet: inline in the `request`
/// parameter, or behind a `request_uri` the wallet dereferences.
#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum EmbedOption {
    ByValue,
    ByReference { at: BaseUrl },
}

/// A url that is always a base (can be safely extended with further path
/// elements without mangling).
#[derive(Deserialize, Debug, Clone, Hash, PartialEq, Eq)]
#[serde(try_from = "String")]
pub struct BaseUrl(Url);

impl BaseUrl {
    /// Extend the base with one path segment, e.g. a request id.
    pub fn join_segment(&self, segment: &str) -> Result<Url> {
        let mut url = self.0.clone();
        {
            let Ok(mut path) = url.path_segments_mut() else {
                bail!("URL cannot carry path segments: {}", self.0)
            };
            path.push(segment);
        }
        Ok(url)
    }
}

impl std::ops::Deref for BaseUrl {
    type Target = Url;

    fn deref(&self) -> &Url {
        &self.0
    }
}

impl TryFrom<String> for BaseUrl {
    type Error = url::ParseError;

    fn try_from(mut url: String) -> Result<Self, Self::Error> {
        // Make URL a base.
        if !url.ends_with('/') {
            url += "/"
        }
        url.parse().map(Self)
    }
}

impl std::str::FromStr for BaseUrl {
    type Err = url::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_always_ends_with_a_slash() {
        let base: BaseUrl = "https://verifier.example.com/request".parse().unwrap();
        assert_eq!(base.as_str(), "https://verifier.example.com/request/");
    }

    #[test]
    fn join_segment_extends_the_path() {
        let base: BaseUrl = "https://verifier.example.com/request".parse().unwrap();
        let url = base.join_segment("abc123").unwrap();
        assert_eq!(url.as_str(), "https://verifier.example.com/request/abc123");
    }

    #[test]
    fn embed_option_deserializes_from_config_json() {
        let by_value: EmbedOption = serde_json::from_str(r#"{"mode": "by_value"}"#).unwrap();
        assert!(matches!(by_value, EmbedOption::ByValue));

        let by_reference: EmbedOption = serde_json::from_str(
            r#"{"mode": "by_reference", "at": "https://verifier.example.com/request"}"#,
        )
        .unwrap();
        let EmbedOption::ByReference { at } = by_reference else {
            panic!("expected by_reference");
        };
        assert_eq!(at.as_str(), "https://verifier.example.com/request/");
    }
}
