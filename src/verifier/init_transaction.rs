//! Initiating a presentation transaction.

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::config::EmbedOption;
use crate::core::presentation::{
    IdTokenType, Jwt, Presentation, PresentationId, PresentationType, Requested,
};
use crate::core::presentation_definition::PresentationDefinition;

use super::Verifier;

/// The kind of presentation process a caller wants to initiate: a request (to
/// the wallet) to present an id_token, a vp_token, or both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresentationTypeTag {
    IdTokenRequest,
    VpTokenRequest,
    #[default]
    IdAndVpTokenRequest,
}

/// What kind of id_token to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdTokenTypeTag {
    SubjectSigned,
    AttesterSigned,
}

impl From<IdTokenTypeTag> for IdTokenType {
    fn from(tag: IdTokenTypeTag) -> Self {
        match tag {
            IdTokenTypeTag::SubjectSigned => IdTokenType::SubjectSigned,
            IdTokenTypeTag::AttesterSigned => IdTokenType::AttesterSigned,
        }
    }
}

/// Caller input for [Verifier::init_transaction].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InitTransactionRequest {
    #[serde(rename = "type", default)]
    pub presentation_type: PresentationTypeTag,
    #[serde(rename = "id_token_type", default)]
    pub id_token_type: Option<IdTokenTypeTag>,
    /// The presentation definition, as the JSON text the caller supplied.
    #[serde(rename = "presentation_definition", default)]
    pub presentation_definition: Option<String>,
}

/// Rejections of the caller's input. No side effects have occurred when one of
/// these is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("a presentation_definition is required for this presentation type")]
    MissingPresentationDefinition,
    #[error("presentation_definition is not a valid Presentation Exchange document")]
    InvalidPresentationDefinition,
}

#[derive(Debug, thiserror::Error)]
pub enum InitTransactionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Infrastructure(#[from] anyhow::Error),
}

impl InitTransactionRequest {
    fn to_domain(&self) -> Result<PresentationType, ValidationError> {
        let id_token_types = || -> Vec<IdTokenType> {
            // Absence means "no constraint", never a failure.
            self.id_token_type.map(|t| vec![t.into()]).unwrap_or_default()
        };
        let presentation_definition = || -> Result<PresentationDefinition, ValidationError> {
            match self.presentation_definition.as_deref() {
                None | Some("") => Err(ValidationError::MissingPresentationDefinition),
                Some(text) => PresentationDefinition::decode(text).map_err(|e| {
                    debug!("presentation_definition rejected: {e}");
                    ValidationError::InvalidPresentationDefinition
                }),
            }
        };

        match self.presentation_type {
            PresentationTypeTag::IdTokenRequest => Ok(PresentationType::IdTokenRequest {
                id_token_types: id_token_types(),
            }),
            PresentationTypeTag::VpTokenRequest => Ok(PresentationType::VpTokenRequest {
                presentation_definition: presentation_definition()?,
            }),
            PresentationTypeTag::IdAndVpTokenRequest => Ok(PresentationType::IdAndVpToken {
                id_token_types: id_token_types(),
                presentation_definition: presentation_definition()?,
            }),
        }
    }
}

/// The return value of successfully initiating a presentation: what the
/// verifier frontend forwards to the wallet. Exactly one of `request` and
/// `request_uri` is populated.
#[derive(Debug, Clone, Serialize)]
pub struct JwtSecuredAuthorizationRequest {
    pub presentation_id: PresentationId,
    pub client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<Jwt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_uri: Option<Url>,
}

impl Verifier {
    /// Initiate a presentation transaction.
    ///
    /// Validates the caller's input, creates the presentation record and
    /// applies the configured embedding option: by-value deployments get the
    /// signed request object inline (consuming the one allowed retrieval
    /// immediately), by-reference deployments get a `request_uri` for the
    /// wallet to dereference.
    ///
    /// Nothing is persisted unless the whole use case succeeds.
    pub async fn init_transaction(
        &self,
        request: InitTransactionRequest,
    ) -> Result<JwtSecuredAuthorizationRequest, InitTransactionError> {
        let presentation_type = request.to_domain()?;

        let requested = Requested {
            id: self.generate_presentation_id.generate(),
            initiated_at: self.clock.now(),
            request_id: self.generate_request_id.generate(),
            presentation_type,
        };
        debug!(
            "initiating presentation {} with request id {}",
            requested.id, requested.request_id
        );

        let (presentation, authorization_request) = self.create_request(requested).await?;

        self.store
            .store(presentation)
            .await
            .context("failed to store the presentation")?;

        info!(
            "presentation {} initiated",
            authorization_request.presentation_id
        );
        Ok(authorization_request)
    }

    /// Build the authorization request and, on the by-value path, advance the
    /// presentation in the same step.
    async fn create_request(
        &self,
        requested: Requested,
    ) -> Result<(Presentation, JwtSecuredAuthorizationRequest), InitTransactionError> {
        match &self.config.request_object_embed {
            EmbedOption::ByValue => {
                let jwt = self
                    .sign_request_object(requested.initiated_at, &requested)
                    .await
                    .context("failed to sign the request object")?;
                let at = requested.initiated_at;
                let retrieved = requested.retrieve_request_object(at);
                let authorization_request = JwtSecuredAuthorizationRequest {
                    presentation_id: retrieved.id.clone(),
                    client_id: self.config.client_id.clone(),
                    request: Some(jwt),
                    request_uri: None,
                };
                Ok((
                    Presentation::RequestObjectRetrieved(retrieved),
                    authorization_request,
                ))
            }
            EmbedOption::ByReference { at } => {
                let request_uri = at
                    .join_segment(requested.request_id.as_str())
                    .context("failed to build the request_uri")?;
                let authorization_request = JwtSecuredAuthorizationRequest {
                    presentation_id: requested.id.clone(),
                    client_id: self.config.client_id.clone(),
                    request: None,
                    request_uri: Some(request_uri),
                };
                Ok((Presentation::Requested(requested), authorization_request))
            }
        }
    }
}
