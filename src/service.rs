//! Record service — the one entry point callers go through. Owns the
//! source bundle and the aggregation limits, and applies requester
//! scoping before any data leaves the store.

use std::sync::Arc;

use crate::access::{resolve_scope, RequesterContext, RequesterRole};
use crate::config::AggregationLimits;
use crate::index::{list_record_index, CompositeId, RecordIndexEntry};
use crate::sources::{CategorySource, PatientDirectory, SqliteStore};
use crate::timeline::{assemble_record, MedicalRecord, RecordError, SourceBundle};

pub struct RecordService {
    bundle: SourceBundle,
    limits: AggregationLimits,
}

impl RecordService {
    pub fn new(
        directory: Arc<dyn PatientDirectory>,
        categories: Vec<Arc<dyn CategorySource>>,
        limits: AggregationLimits,
    ) -> Self {
        RecordService { bundle: SourceBundle { directory, categories }, limits }
    }

    /// Wire every category of a single SQLite store into one service.
    pub fn from_store(store: &SqliteStore, limits: AggregationLimits) -> Self {
        RecordService::new(Arc::new(store.clone()), store.category_sources(), limits)
    }

    /// The record index visible to this requester.
    pub async fn list_index(
        &self,
        role: RequesterRole,
        context: &RequesterContext,
    ) -> Result<Vec<RecordIndexEntry>, RecordError> {
        let scope = resolve_scope(role, context);
        let entries =
            list_record_index(&self.bundle.directory, &scope, self.limits.index_page_cap).await?;
        Ok(entries)
    }

    /// Assemble the full record behind one index entry.
    ///
    /// Scope is resolved again from the requester context, never trusted
    /// from an earlier listing. An out-of-scope patient is denied before
    /// any source is touched.
    pub async fn get_timeline(
        &self,
        role: RequesterRole,
        context: &RequesterContext,
        composite: CompositeId,
    ) -> Result<MedicalRecord, RecordError> {
        let scope = resolve_scope(role, context);
        if !scope.permits(composite.patient_id) {
            return Err(RecordError::ScopeDenied(composite.patient_id));
        }
        assemble_record(&self.bundle, composite, &self.limits).await
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use uuid::Uuid;

    use super::*;
    use crate::sources::store::tests::{seed_chain, seed_patient};

    async fn seeded_service() -> (RecordService, Uuid, Uuid) {
        let store = SqliteStore::in_memory().unwrap();
        let patient_id = Uuid::new_v4();
        let (_, history_id) = store
            .with_conn(move |conn| {
                seed_patient(conn, patient_id, "Ana", "Torres");
                Ok(seed_chain(conn, patient_id))
            })
            .await
            .unwrap();
        let service = RecordService::from_store(&store, AggregationLimits::default());
        (service, patient_id, history_id)
    }

    fn patient_context(patient_id: Uuid) -> RequesterContext {
        RequesterContext { patient_id: Some(patient_id), ..Default::default() }
    }

    #[tokio::test]
    async fn patient_sees_their_own_record() {
        let (service, patient_id, history_id) = seeded_service().await;
        let composite = CompositeId { patient_id, history_id };

        let record = service
            .get_timeline(RequesterRole::Patient, &patient_context(patient_id), composite)
            .await
            .unwrap();
        assert_eq!(record.identity.id, patient_id);
        assert!(record.events.is_empty());
    }

    #[tokio::test]
    async fn out_of_scope_detail_is_denied_before_any_fetch() {
        let (service, patient_id, history_id) = seeded_service().await;
        let composite = CompositeId { patient_id, history_id };
        let stranger = patient_context(Uuid::new_v4());

        let err = service
            .get_timeline(RequesterRole::Patient, &stranger, composite)
            .await
            .unwrap_err();
        assert!(matches!(err, RecordError::ScopeDenied(id) if id == patient_id));
    }

    #[tokio::test]
    async fn clinician_assignment_grants_detail_access() {
        let (service, patient_id, history_id) = seeded_service().await;
        let composite = CompositeId { patient_id, history_id };
        let context = RequesterContext {
            assignments: BTreeSet::from([patient_id]),
            ..Default::default()
        };

        let record = service
            .get_timeline(RequesterRole::Clinician, &context, composite)
            .await
            .unwrap();
        assert_eq!(record.identity.id, patient_id);
    }

    #[tokio::test]
    async fn listing_honors_the_same_scope_as_detail() {
        let (service, patient_id, _) = seeded_service().await;

        let own = service
            .list_index(RequesterRole::Patient, &patient_context(patient_id))
            .await
            .unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].composite_id.patient_id, patient_id);

        let stranger = service
            .list_index(RequesterRole::Patient, &patient_context(Uuid::new_v4()))
            .await
            .unwrap();
        assert!(stranger.is_empty());
    }

    #[tokio::test]
    async fn admin_listing_sees_everything() {
        let (service, patient_id, _) = seeded_service().await;
        let entries = service
            .list_index(RequesterRole::Admin, &RequesterContext::default())
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].composite_id.patient_id, patient_id);
    }
}
