//! Request-object retrieval by the wallet.

use anyhow::{Context as _, Result};
use tracing::{debug, warn};

use crate::core::presentation::{Jwt, Presentation, PresentationState, Requested, RequestId};

use super::{QueryResponse, Verifier};

impl Verifier {
    /// Resolve `request_id` to its RFC 9101 request object, encoded as a JWT.
    ///
    /// Succeeds at most once per presentation: the first successful call moves
    /// the presentation out of the requested state, and every later call
    /// (a wallet retry, a replay, a concurrent racer) observes
    /// [QueryResponse::InvalidState].
    pub async fn get_request_object(&self, request_id: &RequestId) -> Result<QueryResponse<Jwt>> {
        let presentation = self
            .store
            .load_by_request_id(request_id)
            .await
            .context("failed to load the presentation")?;

        match presentation {
            None => Ok(QueryResponse::NotFound),
            Some(Presentation::Requested(requested)) => self.request_object_of(requested).await,
            Some(other) => {
                debug!(
                    "request object of presentation {} not retrievable in the {} state",
                    other.id(),
                    other.state()
                );
                Ok(QueryResponse::InvalidState)
            }
        }
    }

    /// Sign first, commit after. The signer runs without any claim on the
    /// record; the conditional store then decides the race, so a crash between
    /// the two leaves no retrieval on record and never a double issue.
    async fn request_object_of(&self, requested: Requested) -> Result<QueryResponse<Jwt>> {
        let now = self.clock.now();
        let jwt = self
            .sign_request_object(now, &requested)
            .await
            .context("failed to sign the request object")?;

        let id = requested.id.clone();
        let retrieved = requested.retrieve_request_object(now);
        let committed = self
            .store
            .store_if_state(
                Presentation::RequestObjectRetrieved(retrieved),
                PresentationState::Requested,
            )
            .await
            .context("failed to store the presentation")?;

        if !committed {
            warn!("presentation {id} was retrieved concurrently; request object not issued");
            return Ok(QueryResponse::InvalidState);
        }
        debug!("request object of presentation {id} issued");
        Ok(QueryResponse::Found(jwt))
    }
}
