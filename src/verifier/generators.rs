//! Identifier generation seams. Pure and stateless, so deployments can swap in
//! their own scheme and tests can pin the values.

use std::fmt::Debug;

use base64::prelude::*;
use rand::RngCore;
use uuid::Uuid;

use crate::core::presentation::{PresentationId, RequestId};

/// Produces the primary key of a new presentation.
pub trait GeneratePresentationId: Debug + Send + Sync {
    fn generate(&self) -> PresentationId;
}

/// Produces the wallet-facing correlation token of a new presentation. Values
/// double as OAuth `state`/`nonce` material, so they must be unguessable in
/// addition to unique.
pub trait GenerateRequestId: Debug + Send + Sync {
    fn generate(&self) -> RequestId;
}

/// UUIDv4 presentation ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPresentationId;

impl GeneratePresentationId for RandomPresentationId {
    fn generate(&self) -> PresentationId {
        PresentationId::new(Uuid::new_v4().to_string())
    }
}

/// Request ids built from 32 bytes of OS entropy, base64url-encoded without
/// padding so they can travel in a URL path segment.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomRequestId;

impl GenerateRequestId for RandomRequestId {
    fn generate(&self) -> RequestId {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        RequestId::new(BASE64_URL_SAFE_NO_PAD.encode(bytes))
    }
}

/// Always hands out the same presentation id. For tests.
#[derive(Debug, Clone)]
pub struct FixedPresentationId(pub PresentationId);

impl GeneratePresentationId for FixedPresentationId {
    fn generate(&self) -> PresentationId {
        self.0.clone()
    }
}

/// Always hands out the same request id. For tests.
#[derive(Debug, Clone)]
pub struct FixedRequestId(pub RequestId);

impl GenerateRequestId for FixedRequestId {
    fn generate(&self) -> RequestId {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_request_ids_are_distinct_and_url_safe() {
        let generator = RandomRequestId;
        let a = generator.generate();
        let b = generator.generate();
        assert_ne!(a, b);
        assert!(a
            .as_str()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
