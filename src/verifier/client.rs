use std::{fmt::Debug, sync::Arc};

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use base64::prelude::*;
use serde_json::{json, Value as Json};

use crate::core::presentation::Jwt;
use crate::core::request_object::RequestObject;

use super::request_signer::RequestSigner;

/// How the verifier identifies itself to the wallet and secures its request
/// objects.
#[async_trait]
pub trait Client: Debug {
    /// The OAuth client identifier the wallet will see.
    fn id(&self) -> &str;

    async fn generate_request_object_jwt(&self, body: &RequestObject) -> Result<Jwt>;
}

/// A [Client] with the `pre-registered` Client Identifier scheme: the wallet
/// knows the verifier's signing key out of band.
#[derive(Debug, Clone)]
pub struct PreregisteredClient {
    id: String,
    signer: Arc<dyn RequestSigner>,
}

impl PreregisteredClient {
    pub fn new(id: impl Into<String>, signer: Arc<dyn RequestSigner>) -> Self {
        Self {
            id: id.into(),
            signer,
        }
    }
}

#[async_trait]
impl Client for PreregisteredClient {
    fn id(&self) -> &str {
        &self.id
    }

    async fn generate_request_object_jwt(&self, body: &RequestObject) -> Result<Jwt> {
        let mut header = json!({
            "alg": self.signer.alg(),
            "typ": "oauth-authz-req+jwt"
        });
        if let Some(kid) = self.signer.key_id() {
            header["kid"] = json!(kid);
        }
        make_jwt(header, body, self.signer.as_ref()).await
    }
}

async fn make_jwt<S: RequestSigner + ?Sized>(
    header: Json,
    body: &RequestObject,
    signer: &S,
) -> Result<Jwt> {
    let header_b64: String =
        serde_json::to_vec(&header).map(|b| BASE64_URL_SAFE_NO_PAD.encode(b))?;
    let body_b64 = serde_json::to_vec(body).map(|b| BASE64_URL_SAFE_NO_PAD.encode(b))?;
    let payload = [header_b64.as_bytes(), b".", body_b64.as_bytes()].concat();
    let signature = signer
        .sign(&payload)
        .await
        .context("request object signing failed")?;
    let signature_b64 = BASE64_URL_SAFE_NO_PAD.encode(signature);
    Ok(format!("{header_b64}.{body_b64}.{signature_b64}"))
}
