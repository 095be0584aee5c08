//! Verifier backend for [OpenID for Verifiable Presentations].
//!
//! [OpenID for Verifiable Presentations]: <https://openid.net/specs/openid-4-verifiable-presentations-1_0.html>
//!
//! This library implements the verifier side of a credential presentation:
//! it issues JWT-secured authorization requests ([RFC 9101] request objects)
//! to a wallet, tracks the lifecycle of each presentation transaction, and
//! later accepts and exposes the wallet's authorization response.
//!
//! [RFC 9101]: <https://www.rfc-editor.org/rfc/rfc9101>
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use openid4vp_verifier::config::{EmbedOption, VerifierConfig};
//! use openid4vp_verifier::verifier::client::PreregisteredClient;
//! use openid4vp_verifier::verifier::init_transaction::InitTransactionRequest;
//! use openid4vp_verifier::verifier::request_signer::P256Signer;
//! use openid4vp_verifier::verifier::store::MemoryStore;
//! use openid4vp_verifier::verifier::{QueryResponse, Verifier};
//!
//! let config = VerifierConfig {
//!     client_id: "verifier-1".to_string(),
//!     request_object_embed: EmbedOption::ByReference {
//!         at: "https://verifier.example.com/wallet/request.jwt".parse()?,
//!     },
//!     response_uri: "https://verifier.example.com/wallet/direct_post".parse()?,
//! };
//!
//! let signer = Arc::new(P256Signer::new(signing_key));
//! let verifier = Verifier::builder()
//!     .with_client(Arc::new(PreregisteredClient::new("verifier-1", signer)))
//!     .with_config(config)
//!     .with_store(Arc::new(MemoryStore::default()))
//!     .build()?;
//!
//! // The verifier frontend initiates a transaction...
//! let authorization_request = verifier
//!     .init_transaction(InitTransactionRequest::default())
//!     .await?;
//!
//! // ...the wallet dereferences the request_uri it was handed...
//! let QueryResponse::Found(jwt) = verifier.get_request_object(&request_id).await? else {
//!     unreachable!()
//! };
//!
//! // ...and posts its authorization response, which the frontend collects.
//! verifier.post_wallet_response(authorisation_response).await?;
//! let response = verifier
//!     .get_wallet_response(&authorization_request.presentation_id)
//!     .await?;
//! ```
//!
//! # Lifecycle
//!
//! A presentation transaction moves through the states of
//! [`Presentation`](core::presentation::Presentation):
//!
//! 1. *Requested*: created by
//!    [`init_transaction`](verifier::Verifier::init_transaction). Under
//!    [`EmbedOption::ByValue`](config::EmbedOption) the request object is
//!    signed and embedded in the returned descriptor, advancing the state
//!    immediately; under `ByReference` the wallet is handed a `request_uri`.
//! 2. *RequestObjectRetrieved*: the wallet dereferenced the `request_uri` via
//!    [`get_request_object`](verifier::Verifier::get_request_object). A
//!    request object is issued at most once per transaction; later or
//!    concurrent attempts observe
//!    [`QueryResponse::InvalidState`](verifier::QueryResponse).
//! 3. *Submitted*: the wallet posted its response via
//!    [`post_wallet_response`](verifier::Verifier::post_wallet_response),
//!    exposed to the frontend by
//!    [`get_wallet_response`](verifier::Verifier::get_wallet_response).
//!
//! A transaction that never completes can be expired into the *TimedOut*
//! state; expiry policy belongs to the deployment, not this library.

pub mod config;
pub mod core;
pub mod verifier;
