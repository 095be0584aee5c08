use std::fmt::Debug;

use anyhow::Result;
use async_trait::async_trait;
use p256::ecdsa::{signature::Signer, Signature, SigningKey};

/// Signs the serialized request object. Failure is an infrastructure fault
/// (e.g. an HSM gone away), never a protocol outcome.
#[async_trait]
pub trait RequestSigner: Debug + Send + Sync {
    /// The JWS algorithm written into the JOSE header.
    fn alg(&self) -> &str;

    /// Key id advertised to the wallet, when the deployment publishes one.
    fn key_id(&self) -> Option<&str> {
        None
    }

    async fn sign(&self, payload: &[u8]) -> Result<Vec<u8>>;
}

/// An in-process ES256 signer.
#[derive(Debug)]
pub struct P256Signer {
    key: SigningKey,
    key_id: Option<String>,
}

impl P256Signer {
    pub fn new(key: SigningKey) -> Self {
        Self { key, key_id: None }
    }

    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }
}

#[async_trait]
impl RequestSigner for P256Signer {
    fn alg(&self) -> &str {
        "ES256"
    }

    fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    async fn sign(&self, payload: &[u8]) -> Result<Vec<u8>> {
        let sig: Signature = self.key.try_sign(payload)?;
        Ok(sig.to_vec())
    }
}
