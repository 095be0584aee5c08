//! Persistence seam for presentation records.

use std::{collections::BTreeMap, fmt::Debug, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::core::presentation::{Presentation, PresentationId, PresentationState, RequestId};

/// Storage interface for presentation records, keyed by [PresentationId] with
/// a secondary index on [RequestId].
///
/// Lifecycle transitions are committed through [store_if_state]: the write is
/// conditioned on the state the writer observed, so two concurrent writers
/// cannot both advance the same presentation. Writes for different keys must
/// never block each other beyond the store's own synchronization.
///
/// [store_if_state]: PresentationStore::store_if_state
#[async_trait]
pub trait PresentationStore: Debug {
    /// Point lookup by primary key. Absence is a normal outcome.
    async fn load(&self, id: &PresentationId) -> Result<Option<Presentation>>;

    /// Point lookup by the wallet-facing correlation token.
    async fn load_by_request_id(&self, request_id: &RequestId) -> Result<Option<Presentation>>;

    /// Idempotent upsert. Also refreshes the request-id index.
    async fn store(&self, presentation: Presentation) -> Result<()>;

    /// Upsert that succeeds only while the stored record is still in the
    /// `expected` state. Returns false when another writer got there first,
    /// or when no record exists for the presentation's id.
    async fn store_if_state(
        &self,
        presentation: Presentation,
        expected: PresentationState,
    ) -> Result<bool>;
}

/// A local in-memory store. Not for production use!
///
/// # Warning
/// This in-memory store should only be used for test purposes, it will not
/// work for a distributed deployment.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    by_id: BTreeMap<PresentationId, Presentation>,
    request_index: BTreeMap<RequestId, PresentationId>,
}

impl Inner {
    fn upsert(&mut self, presentation: Presentation) {
        self.request_index
            .insert(presentation.request_id().clone(), presentation.id().clone());
        self.by_id.insert(presentation.id().clone(), presentation);
    }
}

#[async_trait]
impl PresentationStore for MemoryStore {
    async fn load(&self, id: &PresentationId) -> Result<Option<Presentation>> {
        Ok(self.inner.lock().await.by_id.get(id).cloned())
    }

    async fn load_by_request_id(&self, request_id: &RequestId) -> Result<Option<Presentation>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .request_index
            .get(request_id)
            .and_then(|id| inner.by_id.get(id))
            .cloned())
    }

    async fn store(&self, presentation: Presentation) -> Result<()> {
        self.inner.lock().await.upsert(presentation);
        Ok(())
    }

    async fn store_if_state(
        &self,
        presentation: Presentation,
        expected: PresentationState,
    ) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        let current = inner.by_id.get(presentation.id()).map(Presentation::state);
        if current != Some(expected) {
            return Ok(false);
        }
        inner.upsert(presentation);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::presentation::{PresentationType, Requested};
    use chrono::{TimeZone, Utc};

    fn requested(id: &str, request_id: &str) -> Presentation {
        Presentation::Requested(Requested {
            id: PresentationId::new(id),
            initiated_at: Utc.with_ymd_and_hms(2024, 11, 2, 10, 5, 33).unwrap(),
            request_id: RequestId::new(request_id),
            presentation_type: PresentationType::IdTokenRequest {
                id_token_types: vec![],
            },
        })
    }

    #[tokio::test]
    async fn lookup_works_through_both_keys() {
        let store = MemoryStore::default();
        store.store(requested("p-1", "r-1")).await.unwrap();

        let by_id = store.load(&PresentationId::new("p-1")).await.unwrap();
        assert!(by_id.is_some());
        let by_request_id = store
            .load_by_request_id(&RequestId::new("r-1"))
            .await
            .unwrap();
        assert!(by_request_id.is_some());
        assert!(store
            .load_by_request_id(&RequestId::new("r-2"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn conditional_store_requires_the_expected_state() {
        let store = MemoryStore::default();
        store.store(requested("p-1", "r-1")).await.unwrap();

        let at = Utc.with_ymd_and_hms(2024, 11, 2, 10, 6, 33).unwrap();
        let retrieved = requested("p-1", "r-1").retrieve_request_object(at).unwrap();

        let committed = store
            .store_if_state(retrieved.clone(), PresentationState::Requested)
            .await
            .unwrap();
        assert!(committed);

        // The record already advanced; a second conditional write loses.
        let committed = store
            .store_if_state(retrieved, PresentationState::Requested)
            .await
            .unwrap();
        assert!(!committed);
    }

    #[tokio::test]
    async fn conditional_store_without_a_record_fails() {
        let store = MemoryStore::default();
        let committed = store
            .store_if_state(requested("p-1", "r-1"), PresentationState::Requested)
            .await
            .unwrap();
        assert!(!committed);
    }
}
