//! Accepting the wallet's authorization response and exposing it to the
//! verifier frontend.

use anyhow::{Context as _, Result};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::core::presentation::{
    Presentation, PresentationId, PresentationState, PresentationType, RequestId,
    RequestObjectRetrieved, WalletResponse,
};
use crate::core::presentation_definition::PresentationSubmission;

use super::{QueryResponse, Verifier};

/// The `direct_post` form body submitted by the wallet. `state` carries the
/// request id issued at initiation; the remaining fields depend on what the
/// transaction asked for. An `error` response replaces the artifacts.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorisationResponse {
    pub state: RequestId,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub vp_token: Option<String>,
    /// The presentation submission, as the JSON text of its form field.
    #[serde(default)]
    pub presentation_submission: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Rejections of a wallet response that does not carry the artifacts the
/// transaction asked for. The presentation record is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WalletResponseValidationError {
    #[error("id_token is missing from the wallet response")]
    MissingIdToken,
    #[error("vp_token is missing from the wallet response")]
    MissingVpToken,
    #[error("presentation_submission is missing from the wallet response")]
    MissingPresentationSubmission,
    #[error("presentation_submission is not a valid Presentation Exchange submission")]
    InvalidPresentationSubmission,
}

#[derive(Debug, thiserror::Error)]
pub enum PostWalletResponseError {
    #[error(transparent)]
    Validation(#[from] WalletResponseValidationError),
    #[error(transparent)]
    Infrastructure(#[from] anyhow::Error),
}

impl AuthorisationResponse {
    /// Decode the `application/x-www-form-urlencoded` body of a `direct_post`.
    pub fn from_form(form: &str) -> Result<Self, serde_urlencoded::de::Error> {
        serde_urlencoded::from_str(form)
    }

    /// Check the response against what the transaction asked the wallet for.
    /// Signature and submission-content verification happen upstream of the
    /// state machine and are not repeated here.
    fn to_domain(
        &self,
        requested: &PresentationType,
    ) -> Result<WalletResponse, WalletResponseValidationError> {
        if let Some(error) = &self.error {
            return Ok(WalletResponse::Error {
                error: error.clone(),
                description: self.error_description.clone(),
            });
        }

        let id_token = || {
            self.id_token
                .clone()
                .ok_or(WalletResponseValidationError::MissingIdToken)
        };
        let vp_token = || {
            self.vp_token
                .clone()
                .ok_or(WalletResponseValidationError::MissingVpToken)
        };
        let presentation_submission = || match self.presentation_submission.as_deref() {
            None => Err(WalletResponseValidationError::MissingPresentationSubmission),
            Some(text) => PresentationSubmission::decode(text).map_err(|e| {
                debug!("presentation_submission rejected: {e}");
                WalletResponseValidationError::InvalidPresentationSubmission
            }),
        };

        match requested {
            PresentationType::IdTokenRequest { .. } => Ok(WalletResponse::IdToken {
                id_token: id_token()?,
            }),
            PresentationType::VpTokenRequest { .. } => Ok(WalletResponse::VpToken {
                vp_token: vp_token()?,
                presentation_submission: presentation_submission()?,
            }),
            PresentationType::IdAndVpToken { .. } => Ok(WalletResponse::IdAndVpToken {
                id_token: id_token()?,
                vp_token: vp_token()?,
                presentation_submission: presentation_submission()?,
            }),
        }
    }
}

impl Verifier {
    /// Accept the wallet's `direct_post` response.
    ///
    /// Legal exactly once per presentation, and only after the request object
    /// was retrieved; earlier or repeated posts observe
    /// [QueryResponse::InvalidState].
    pub async fn post_wallet_response(
        &self,
        response: AuthorisationResponse,
    ) -> Result<QueryResponse<()>, PostWalletResponseError> {
        let presentation = self
            .store
            .load_by_request_id(&response.state)
            .await
            .context("failed to load the presentation")?;

        match presentation {
            None => Ok(QueryResponse::NotFound),
            Some(Presentation::RequestObjectRetrieved(retrieved)) => {
                self.accept_wallet_response(retrieved, &response).await
            }
            Some(other) => {
                debug!(
                    "wallet response for presentation {} rejected in the {} state",
                    other.id(),
                    other.state()
                );
                Ok(QueryResponse::InvalidState)
            }
        }
    }

    async fn accept_wallet_response(
        &self,
        retrieved: RequestObjectRetrieved,
        response: &AuthorisationResponse,
    ) -> Result<QueryResponse<()>, PostWalletResponseError> {
        let wallet_response = response.to_domain(&retrieved.presentation_type)?;

        let id = retrieved.id.clone();
        let submitted = retrieved.submit(self.clock.now(), wallet_response);
        let committed = self
            .store
            .store_if_state(
                Presentation::Submitted(submitted),
                PresentationState::RequestObjectRetrieved,
            )
            .await
            .context("failed to store the presentation")?;

        if !committed {
            warn!("presentation {id} received concurrent wallet responses; keeping the first");
            return Ok(QueryResponse::InvalidState);
        }
        info!("wallet response for presentation {id} accepted");
        Ok(QueryResponse::Found(()))
    }

    /// Expose the wallet's response to the verifier frontend. `Found` only
    /// once the wallet has submitted.
    pub async fn get_wallet_response(
        &self,
        id: &PresentationId,
    ) -> Result<QueryResponse<WalletResponse>> {
        let presentation = self
            .store
            .load(id)
            .await
            .context("failed to load the presentation")?;

        match presentation {
            None => Ok(QueryResponse::NotFound),
            Some(Presentation::Submitted(submitted)) => {
                Ok(QueryResponse::Found(submitted.wallet_response))
            }
            Some(other) => {
                debug!(
                    "no wallet response for presentation {} in the {} state",
                    other.id(),
                    other.state()
                );
                Ok(QueryResponse::InvalidState)
            }
        }
    }
}
