// ── Data-access collaborators ──
//
// The controller never talks HTTP itself. It drives a `DataAccess`
// implementation: `RestBackend` for a live admin API, `MemoryBackend`
// for demo data and tests.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;
use vitrine_api::ResourceClient;

use crate::convert::{draft_to_payload, wire_ids};
use crate::error::CoreError;
use crate::model::{Draft, Entity, EntityId, Value};

/// Async persistence operations for one resource collection.
///
/// Identifiers returned by `create` are authoritative.
pub trait DataAccess: Send + Sync + 'static {
    fn list(&self) -> impl Future<Output = Result<Vec<Entity>, CoreError>> + Send;

    fn create(&self, draft: &Draft) -> impl Future<Output = Result<Entity, CoreError>> + Send;

    fn update(
        &self,
        id: &EntityId,
        patch: &Draft,
    ) -> impl Future<Output = Result<Entity, CoreError>> + Send;

    fn remove(&self, id: &EntityId) -> impl Future<Output = Result<(), CoreError>> + Send;

    fn update_status(
        &self,
        id: &EntityId,
        field: &str,
        status: &str,
    ) -> impl Future<Output = Result<Entity, CoreError>> + Send;

    fn bulk_remove(&self, ids: &[EntityId]) -> impl Future<Output = Result<(), CoreError>> + Send;

    /// `Ok(None)` when the collaborator confirms without returning records.
    fn bulk_update_status(
        &self,
        ids: &[EntityId],
        field: &str,
        status: &str,
    ) -> impl Future<Output = Result<Option<Vec<Entity>>, CoreError>> + Send;
}

// ── REST ─────────────────────────────────────────────────────────────

/// `DataAccess` over one resource path of a REST admin API.
#[derive(Debug, Clone)]
pub struct RestBackend {
    client: ResourceClient,
    resource: String,
}

impl RestBackend {
    pub fn new(client: ResourceClient, resource: impl Into<String>) -> Self {
        Self {
            client,
            resource: resource.into(),
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }
}

impl DataAccess for RestBackend {
    async fn list(&self) -> Result<Vec<Entity>, CoreError> {
        let records = self.client.list(&self.resource).await?;
        Ok(records.into_iter().map(Entity::from).collect())
    }

    async fn create(&self, draft: &Draft) -> Result<Entity, CoreError> {
        let payload = draft_to_payload(draft);
        let record = self.client.create(&self.resource, &payload).await?;
        Ok(Entity::from(record))
    }

    async fn update(&self, id: &EntityId, patch: &Draft) -> Result<Entity, CoreError> {
        let payload = draft_to_payload(patch);
        let record = self
            .client
            .update(&self.resource, id.as_str(), &payload)
            .await?;
        Ok(Entity::from(record))
    }

    async fn remove(&self, id: &EntityId) -> Result<(), CoreError> {
        self.client.delete_record(&self.resource, id.as_str()).await?;
        Ok(())
    }

    async fn update_status(
        &self,
        id: &EntityId,
        field: &str,
        status: &str,
    ) -> Result<Entity, CoreError> {
        let record = self
            .client
            .update_status(&self.resource, id.as_str(), field, status)
            .await?;
        Ok(Entity::from(record))
    }

    async fn bulk_remove(&self, ids: &[EntityId]) -> Result<(), CoreError> {
        self.client
            .bulk_delete(&self.resource, &wire_ids(ids))
            .await?;
        Ok(())
    }

    async fn bulk_update_status(
        &self,
        ids: &[EntityId],
        field: &str,
        status: &str,
    ) -> Result<Option<Vec<Entity>>, CoreError> {
        let records = self
            .client
            .bulk_update_status(&self.resource, &wire_ids(ids), field, status)
            .await?;
        Ok(records.map(|records| records.into_iter().map(Entity::from).collect()))
    }
}

// ── In-memory ────────────────────────────────────────────────────────

/// In-process collection standing in for a server. Assigns UUID ids on
/// create. Clones share the same collection.
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    entity_name: String,
    items: Arc<Mutex<Vec<Entity>>>,
    requests: Arc<AtomicUsize>,
}

impl MemoryBackend {
    pub fn new(entity_name: impl Into<String>, seed: Vec<Entity>) -> Self {
        Self {
            entity_name: entity_name.into(),
            items: Arc::new(Mutex::new(seed)),
            requests: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of operations served so far.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }

    /// Copy of the stored collection.
    pub async fn snapshot(&self) -> Vec<Entity> {
        self.items.lock().await.clone()
    }

    fn record_request(&self, op: &str) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        debug!(entity = %self.entity_name, op, "memory backend request");
    }

    fn not_found(&self, id: &EntityId) -> CoreError {
        CoreError::not_found(&self.entity_name, id.as_str())
    }
}

impl DataAccess for MemoryBackend {
    async fn list(&self) -> Result<Vec<Entity>, CoreError> {
        self.record_request("list");
        Ok(self.items.lock().await.clone())
    }

    async fn create(&self, draft: &Draft) -> Result<Entity, CoreError> {
        self.record_request("create");
        let mut entity = Entity::new(Uuid::new_v4());
        entity.apply(draft);
        entity.attributes.shift_remove("id");
        self.items.lock().await.insert(0, entity.clone());
        Ok(entity)
    }

    async fn update(&self, id: &EntityId, patch: &Draft) -> Result<Entity, CoreError> {
        self.record_request("update");
        let mut items = self.items.lock().await;
        let entity = items
            .iter_mut()
            .find(|e| &e.id == id)
            .ok_or_else(|| self.not_found(id))?;
        entity.apply(patch);
        entity.attributes.shift_remove("id");
        Ok(entity.clone())
    }

    async fn remove(&self, id: &EntityId) -> Result<(), CoreError> {
        self.record_request("remove");
        let mut items = self.items.lock().await;
        let before = items.len();
        items.retain(|e| &e.id != id);
        if items.len() == before {
            return Err(self.not_found(id));
        }
        Ok(())
    }

    async fn update_status(
        &self,
        id: &EntityId,
        field: &str,
        status: &str,
    ) -> Result<Entity, CoreError> {
        self.record_request("update_status");
        let mut items = self.items.lock().await;
        let entity = items
            .iter_mut()
            .find(|e| &e.id == id)
            .ok_or_else(|| self.not_found(id))?;
        entity.attributes.insert(field.to_owned(), Value::from(status));
        Ok(entity.clone())
    }

    async fn bulk_remove(&self, ids: &[EntityId]) -> Result<(), CoreError> {
        self.record_request("bulk_remove");
        self.items.lock().await.retain(|e| !ids.contains(&e.id));
        Ok(())
    }

    async fn bulk_update_status(
        &self,
        ids: &[EntityId],
        field: &str,
        status: &str,
    ) -> Result<Option<Vec<Entity>>, CoreError> {
        self.record_request("bulk_update_status");
        let mut items = self.items.lock().await;
        let mut updated = Vec::new();
        for entity in items.iter_mut().filter(|e| ids.contains(&e.id)) {
            entity.attributes.insert(field.to_owned(), Value::from(status));
            updated.push(entity.clone());
        }
        Ok(Some(updated))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn backend() -> MemoryBackend {
        MemoryBackend::new(
            "Product",
            vec![
                Entity::new("1").with("name", "Bravo"),
                Entity::new("2").with("name", "Alpha"),
            ],
        )
    }

    #[tokio::test]
    async fn create_assigns_uuid_and_prepends() {
        let backend = backend();
        let created = backend
            .create(&Draft::new().with("name", "New").with("id", "client"))
            .await
            .unwrap();
        assert!(created.id.as_uuid().is_some());
        assert!(created.get("id").is_none());
        assert_eq!(backend.snapshot().await[0].id, created.id);
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let backend = backend();
        let err = backend
            .update(&EntityId::from("404"), &Draft::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
        assert!(backend.remove(&EntityId::from("404")).await.is_err());
    }

    #[tokio::test]
    async fn bulk_status_returns_updated_records() {
        let backend = backend();
        let ids = vec![EntityId::from("1"), EntityId::from("2")];
        let updated = backend
            .bulk_update_status(&ids, "status", "archived")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.len(), 2);
        assert!(updated.iter().all(|e| e.text("status") == "archived"));
        assert_eq!(backend.request_count(), 1);
    }
}
