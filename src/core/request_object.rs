//! The RFC 9101 request-object claims set handed to the wallet.

use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

use crate::config::VerifierConfig;

use super::presentation::{PresentationType, Requested};
use super::presentation_definition::PresentationDefinition;

/// Audience of self-issued id_token requests, per SIOPv2.
const SELF_ISSUED_V2: &str = "https://self-issued.me/v2";

/// Claims of the JWT-secured authorization request for one presentation
/// transaction.
///
/// `state` and `nonce` both carry the transaction's request id, tying the
/// wallet's eventual response back to the presentation record.
#[derive(Debug, Clone, Serialize)]
pub struct RequestObject {
    pub client_id: String,
    pub client_id_scheme: String,
    pub response_type: String,
    pub response_mode: String,
    pub response_uri: Url,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presentation_definition: Option<PresentationDefinition>,
    pub nonce: String,
    pub state: String,
    pub aud: Vec<String>,
    pub iat: i64,
}

impl RequestObject {
    /// Assemble the claims for a presentation still in the requested state.
    pub fn new(config: &VerifierConfig, at: DateTime<Utc>, presentation: &Requested) -> Self {
        let presentation_type = &presentation.presentation_type;

        let response_type = match presentation_type {
            PresentationType::IdTokenRequest { .. } => "id_token",
            PresentationType::VpTokenRequest { .. } => "vp_token",
            PresentationType::IdAndVpToken { .. } => "vp_token id_token",
        };

        let id_token_type = {
            let types: Vec<&str> = presentation_type
                .id_token_types()
                .iter()
                .map(|t| t.as_str())
                .collect();
            (!types.is_empty()).then(|| types.join(" "))
        };

        let aud = if presentation_type.requests_id_token() {
            vec![SELF_ISSUED_V2.to_string()]
        } else {
            Vec::new()
        };

        Self {
            client_id: config.client_id.clone(),
            client_id_scheme: "pre-registered".to_string(),
            response_type: response_type.to_string(),
            response_mode: "direct_post".to_string(),
            response_uri: config.response_uri.clone(),
            scope: presentation_type
                .requests_id_token()
                .then(|| "openid".to_string()),
            id_token_type,
            presentation_definition: presentation_type.presentation_definition().cloned(),
            nonce: presentation.request_id.as_str().to_string(),
            state: presentation.request_id.as_str().to_string(),
            aud,
            iat: at.timestamp(),
        }
    }
}
