//! The lifecycle of a single credential-presentation transaction.
//!
//! A [Presentation] is a tagged union over its lifecycle states. Transitions
//! are pure functions producing a new value; nothing is mutated in place. The
//! store is the only component that makes a transition durable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::presentation_definition::{PresentationDefinition, PresentationSubmission};

/// A signed JWT in compact serialization.
pub type Jwt = String;

/// Primary key of a presentation transaction, assigned at creation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresentationId(String);

impl PresentationId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PresentationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wallet-facing correlation token of a presentation transaction. Embedded in
/// the `request_uri` and carried back by the wallet as the OAuth `state`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The kind of id_token the wallet is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdTokenType {
    #[serde(rename = "subject_signed_id_token")]
    SubjectSigned,
    #[serde(rename = "attester_signed_id_token")]
    AttesterSigned,
}

impl IdTokenType {
    /// Wire value used in the `id_token_type` request-object claim.
    pub fn as_str(&self) -> &'static str {
        match self {
            IdTokenType::SubjectSigned => "subject_signed_id_token",
            IdTokenType::AttesterSigned => "attester_signed_id_token",
        }
    }
}

/// What the wallet is asked to present: an id_token, a vp_token, or both.
///
/// An empty id-token-type list means "no constraint on the id_token kind".
/// A vp_token is always requested against a concrete presentation definition.
#[derive(Debug, Clone, PartialEq)]
pub enum PresentationType {
    IdTokenRequest {
        id_token_types: Vec<IdTokenType>,
    },
    VpTokenRequest {
        presentation_definition: PresentationDefinition,
    },
    IdAndVpToken {
        id_token_types: Vec<IdTokenType>,
        presentation_definition: PresentationDefinition,
    },
}

impl PresentationType {
    pub fn id_token_types(&self) -> &[IdTokenType] {
        match self {
            PresentationType::IdTokenRequest { id_token_types }
            | PresentationType::IdAndVpToken { id_token_types, .. } => id_token_types,
            PresentationType::VpTokenRequest { .. } => &[],
        }
    }

    pub fn presentation_definition(&self) -> Option<&PresentationDefinition> {
        match self {
            PresentationType::VpTokenRequest {
                presentation_definition,
            }
            | PresentationType::IdAndVpToken {
                presentation_definition,
                ..
            } => Some(presentation_definition),
            PresentationType::IdTokenRequest { .. } => None,
        }
    }

    pub fn requests_id_token(&self) -> bool {
        matches!(
            self,
            PresentationType::IdTokenRequest { .. } | PresentationType::IdAndVpToken { .. }
        )
    }

    pub fn requests_vp_token(&self) -> bool {
        matches!(
            self,
            PresentationType::VpTokenRequest { .. } | PresentationType::IdAndVpToken { .. }
        )
    }
}

/// What the wallet delivered through `direct_post`.
///
/// Cryptographic verification of the artifacts is the caller's concern; the
/// state machine only records them.
#[derive(Debug, Clone, PartialEq)]
pub enum WalletResponse {
    IdToken {
        id_token: String,
    },
    VpToken {
        vp_token: String,
        presentation_submission: PresentationSubmission,
    },
    IdAndVpToken {
        id_token: String,
        vp_token: String,
        presentation_submission: PresentationSubmission,
    },
    Error {
        error: String,
        description: Option<String>,
    },
}

/// A freshly initiated transaction. The request object has not been handed to
/// the wallet yet.
#[derive(Debug, Clone)]
pub struct Requested {
    pub id: PresentationId,
    pub initiated_at: DateTime<Utc>,
    pub request_id: RequestId,
    pub presentation_type: PresentationType,
}

/// The request object was issued, exactly once. Waiting for the wallet's
/// authorization response.
#[derive(Debug, Clone)]
pub struct RequestObjectRetrieved {
    pub id: PresentationId,
    pub initiated_at: DateTime<Utc>,
    pub request_id: RequestId,
    pub presentation_type: PresentationType,
    pub request_object_retrieved_at: DateTime<Utc>,
}

/// The wallet posted its authorization response.
#[derive(Debug, Clone)]
pub struct Submitted {
    pub id: PresentationId,
    pub initiated_at: DateTime<Utc>,
    pub request_id: RequestId,
    pub presentation_type: PresentationType,
    pub request_object_retrieved_at: DateTime<Utc>,
    pub submitted_at: DateTime<Utc>,
    pub wallet_response: WalletResponse,
}

/// The transaction expired before completing.
#[derive(Debug, Clone)]
pub struct TimedOut {
    pub id: PresentationId,
    pub initiated_at: DateTime<Utc>,
    pub request_id: RequestId,
    pub timed_out_at: DateTime<Utc>,
}

impl Requested {
    pub fn retrieve_request_object(self, at: DateTime<Utc>) -> RequestObjectRetrieved {
        RequestObjectRetrieved {
            id: self.id,
            initiated_at: self.initiated_at,
            request_id: self.request_id,
            presentation_type: self.presentation_type,
            request_object_retrieved_at: at,
        }
    }

    pub fn time_out(self, at: DateTime<Utc>) -> TimedOut {
        TimedOut {
            id: self.id,
            initiated_at: self.initiated_at,
            request_id: self.request_id,
            timed_out_at: at,
        }
    }
}

impl RequestObjectRetrieved {
    pub fn submit(self, at: DateTime<Utc>, wallet_response: WalletResponse) -> Submitted {
        Submitted {
            id: self.id,
            initiated_at: self.initiated_at,
            request_id: self.request_id,
            presentation_type: self.presentation_type,
            request_object_retrieved_at: self.request_object_retrieved_at,
            submitted_at: at,
            wallet_response,
        }
    }

    pub fn time_out(self, at: DateTime<Utc>) -> TimedOut {
        TimedOut {
            id: self.id,
            initiated_at: self.initiated_at,
            request_id: self.request_id,
            timed_out_at: at,
        }
    }
}

/// Discriminant of a [Presentation]'s lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationState {
    Requested,
    RequestObjectRetrieved,
    Submitted,
    TimedOut,
}

impl std::fmt::Display for PresentationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            PresentationState::Requested => "requested",
            PresentationState::RequestObjectRetrieved => "request-object-retrieved",
            PresentationState::Submitted => "submitted",
            PresentationState::TimedOut => "timed-out",
        })
    }
}

/// Returned when a lifecycle transition is applied to a presentation that is
/// not in the state the transition departs from. The use cases check the state
/// before transitioning; enforcing it here as well means a concurrent double
/// retrieval cannot slip through the gap between check and commit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot {transition} a presentation in the {from} state")]
pub struct InvalidStateTransition {
    transition: &'static str,
    from: PresentationState,
}

impl InvalidStateTransition {
    fn new(transition: &'static str, from: PresentationState) -> Self {
        Self { transition, from }
    }
}

/// One credential-presentation transaction between the verifier and a wallet.
#[derive(Debug, Clone)]
pub enum Presentation {
    Requested(Requested),
    RequestObjectRetrieved(RequestObjectRetrieved),
    Submitted(Submitted),
    TimedOut(TimedOut),
}

impl Presentation {
    pub fn id(&self) -> &PresentationId {
        match self {
            Presentation::Requested(p) => &p.id,
            Presentation::RequestObjectRetrieved(p) => &p.id,
            Presentation::Submitted(p) => &p.id,
            Presentation::TimedOut(p) => &p.id,
        }
    }

    pub fn request_id(&self) -> &RequestId {
        match self {
            Presentation::Requested(p) => &p.request_id,
            Presentation::RequestObjectRetrieved(p) => &p.request_id,
            Presentation::Submitted(p) => &p.request_id,
            Presentation::TimedOut(p) => &p.request_id,
        }
    }

    pub fn initiated_at(&self) -> DateTime<Utc> {
        match self {
            Presentation::Requested(p) => p.initiated_at,
            Presentation::RequestObjectRetrieved(p) => p.initiated_at,
            Presentation::Submitted(p) => p.initiated_at,
            Presentation::TimedOut(p) => p.initiated_at,
        }
    }

    pub fn state(&self) -> PresentationState {
        match self {
            Presentation::Requested(_) => PresentationState::Requested,
            Presentation::RequestObjectRetrieved(_) => PresentationState::RequestObjectRetrieved,
            Presentation::Submitted(_) => PresentationState::Submitted,
            Presentation::TimedOut(_) => PresentationState::TimedOut,
        }
    }

    /// Marks the one allowed hand-out of the request object.
    pub fn retrieve_request_object(
        self,
        at: DateTime<Utc>,
    ) -> Result<Presentation, InvalidStateTransition> {
        match self {
            Presentation::Requested(p) => {
                Ok(Presentation::RequestObjectRetrieved(p.retrieve_request_object(at)))
            }
            other => Err(InvalidStateTransition::new(
                "retrieve the request object of",
                other.state(),
            )),
        }
    }

    /// Records the wallet's authorization response.
    pub fn submit(
        self,
        at: DateTime<Utc>,
        wallet_response: WalletResponse,
    ) -> Result<Presentation, InvalidStateTransition> {
        match self {
            Presentation::RequestObjectRetrieved(p) => {
                Ok(Presentation::Submitted(p.submit(at, wallet_response)))
            }
            other => Err(InvalidStateTransition::new("submit to", other.state())),
        }
    }

    /// Expires a transaction that never completed.
    pub fn time_out(self, at: DateTime<Utc>) -> Result<Presentation, InvalidStateTransition> {
        match self {
            Presentation::Requested(p) => Ok(Presentation::TimedOut(p.time_out(at))),
            Presentation::RequestObjectRetrieved(p) => Ok(Presentation::TimedOut(p.time_out(at))),
            other => Err(InvalidStateTransition::new("time out", other.state())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn requested() -> Presentation {
        Presentation::Requested(Requested {
            id: PresentationId::new("p-1"),
            initiated_at: Utc.with_ymd_and_hms(2024, 11, 2, 10, 5, 33).unwrap(),
            request_id: RequestId::new("r-1"),
            presentation_type: PresentationType::IdTokenRequest {
                id_token_types: vec![IdTokenType::SubjectSigned],
            },
        })
    }

    fn later() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 2, 10, 6, 33).unwrap()
    }

    #[test]
    fn request_object_can_be_retrieved_from_requested() {
        let retrieved = requested().retrieve_request_object(later()).unwrap();
        assert_eq!(retrieved.state(), PresentationState::RequestObjectRetrieved);
        assert_eq!(retrieved.request_id().as_str(), "r-1");
        match retrieved {
            Presentation::RequestObjectRetrieved(p) => {
                assert_eq!(p.request_object_retrieved_at, later())
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn request_object_cannot_be_retrieved_twice() {
        let retrieved = requested().retrieve_request_object(later()).unwrap();
        let err = retrieved.retrieve_request_object(later()).unwrap_err();
        assert_eq!(
            err,
            InvalidStateTransition::new(
                "retrieve the request object of",
                PresentationState::RequestObjectRetrieved
            )
        );
    }

    #[test]
    fn wallet_response_is_recorded_after_retrieval() {
        let response = WalletResponse::IdToken {
            id_token: "token".into(),
        };
        let submitted = requested()
            .retrieve_request_object(later())
            .unwrap()
            .submit(later(), response.clone())
            .unwrap();
        assert_eq!(submitted.state(), PresentationState::Submitted);
        match submitted {
            Presentation::Submitted(p) => assert_eq!(p.wallet_response, response),
            _ => unreachable!(),
        }
    }

    #[test]
    fn wallet_response_is_rejected_before_retrieval() {
        let response = WalletResponse::IdToken {
            id_token: "token".into(),
        };
        assert!(requested().submit(later(), response).is_err());
    }

    #[test]
    fn pending_presentations_can_time_out() {
        assert_eq!(
            requested().time_out(later()).unwrap().state(),
            PresentationState::TimedOut
        );
        let retrieved = requested().retrieve_request_object(later()).unwrap();
        assert_eq!(
            retrieved.time_out(later()).unwrap().state(),
            PresentationState::TimedOut
        );
    }

    #[test]
    fn completed_presentations_cannot_time_out() {
        let submitted = requested()
            .retrieve_request_object(later())
            .unwrap()
            .submit(
                later(),
                WalletResponse::Error {
                    error: "access_denied".into(),
                    description: None,
                },
            )
            .unwrap();
        assert!(submitted.time_out(later()).is_err());

        let timed_out = requested().time_out(later()).unwrap();
        assert!(timed_out.time_out(later()).is_err());
    }
}
