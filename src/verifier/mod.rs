//! The verifier backend engine: wires configuration, identifier generation,
//! persistence and signing together, and exposes the presentation lifecycle
//! operations to the transport layer.

use std::{fmt::Debug, sync::Arc};

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};

use crate::config::VerifierConfig;
use crate::core::presentation::{Jwt, Requested};
use crate::core::request_object::RequestObject;

use client::Client;
use generators::{
    GeneratePresentationId, GenerateRequestId, RandomPresentationId, RandomRequestId,
};
use store::PresentationStore;

pub mod client;
pub mod generators;
pub mod get_request_object;
pub mod init_transaction;
pub mod request_signer;
pub mod store;
pub mod wallet_response;

/// Wall-clock seam. Production uses [SystemClock]; tests pin the instant.
pub trait Clock: Debug + Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a given instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Outcome of a lookup-style operation. The two non-success arms are expected,
/// frequent protocol occurrences (wallet retries, replays), not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryResponse<T> {
    NotFound,
    InvalidState,
    Found(T),
}

impl<T> QueryResponse<T> {
    pub fn found(self) -> Option<T> {
        match self {
            QueryResponse::Found(value) => Some(value),
            _ => None,
        }
    }
}

/// An OpenID4VP verifier backend.
///
/// Exposes the lifecycle of a presentation transaction: the verifier frontend
/// initiates it, the wallet fetches the request object (at most once) and
/// posts its response, and the frontend collects that response.
#[derive(Debug, Clone)]
pub struct Verifier {
    client: Arc<dyn Client + Send + Sync>,
    clock: Arc<dyn Clock>,
    config: VerifierConfig,
    generate_presentation_id: Arc<dyn GeneratePresentationId>,
    generate_request_id: Arc<dyn GenerateRequestId>,
    store: Arc<dyn PresentationStore + Send + Sync>,
}

impl Verifier {
    /// Build a new verifier.
    pub fn builder() -> VerifierBuilder {
        VerifierBuilder::default()
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Sign the request object of a presentation still in the requested state.
    pub(crate) async fn sign_request_object(
        &self,
        at: DateTime<Utc>,
        presentation: &Requested,
    ) -> Result<Jwt> {
        let request_object = RequestObject::new(&self.config, at, presentation);
        self.client.generate_request_object_jwt(&request_object).await
    }
}

/// Builder struct for [Verifier].
#[derive(Debug, Clone, Default)]
pub struct VerifierBuilder {
    client: Option<Arc<dyn Client + Send + Sync>>,
    clock: Option<Arc<dyn Clock>>,
    config: Option<VerifierConfig>,
    generate_presentation_id: Option<Arc<dyn GeneratePresentationId>>,
    generate_request_id: Option<Arc<dyn GenerateRequestId>>,
    store: Option<Arc<dyn PresentationStore + Send + Sync>>,
}

impl VerifierBuilder {
    /// Build the verifier.
    pub fn build(self) -> Result<Verifier> {
        let Self {
            client,
            clock,
            config,
            generate_presentation_id,
            generate_request_id,
            store,
        } = self;

        let Some(client) = client else {
            bail!("client is required, see `with_client`")
        };

        let Some(config) = config else {
            bail!("config is required, see `with_config`")
        };

        let Some(store) = store else {
            bail!("presentation store is required, see `with_store`")
        };

        Ok(Verifier {
            client,
            clock: clock.unwrap_or_else(|| Arc::new(SystemClock)),
            config,
            generate_presentation_id: generate_presentation_id
                .unwrap_or_else(|| Arc::new(RandomPresentationId)),
            generate_request_id: generate_request_id.unwrap_or_else(|| Arc::new(RandomRequestId)),
            store,
        })
    }

    /// Set the [Client] the verifier identifies itself to wallets with.
    pub fn with_client(mut self, client: Arc<dyn Client + Send + Sync>) -> Self {
        self.client = Some(client);
        self
    }

    /// Override the wall clock. Defaults to [SystemClock].
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Set the deployment configuration.
    pub fn with_config(mut self, config: VerifierConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Override presentation id generation. Defaults to UUIDv4.
    pub fn with_presentation_id_generator(
        mut self,
        generator: Arc<dyn GeneratePresentationId>,
    ) -> Self {
        self.generate_presentation_id = Some(generator);
        self
    }

    /// Override request id generation. Defaults to random base64url tokens.
    pub fn with_request_id_generator(mut self, generator: Arc<dyn GenerateRequestId>) -> Self {
        self.generate_request_id = Some(generator);
        self
    }

    /// Set the [PresentationStore] that keeps presentation records across the
    /// transaction's lifetime.
    pub fn with_store(mut self, store: Arc<dyn PresentationStore + Send + Sync>) -> Self {
        self.store = Some(store);
        self
    }
}
