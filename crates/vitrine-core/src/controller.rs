// ── CRUD controller ──
//
// The actions facade for one view. Async operations round-trip through
// the data-access collaborator and merge the confirmed result into the
// store; synchronous UI actions forward straight to the store.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexSet;
use tracing::{debug, info, warn};

use crate::backend::DataAccess;
use crate::command::{Command, CommandResult};
use crate::config::{CrudConfig, SortDirection};
use crate::error::CoreError;
use crate::model::{Draft, Entity, EntityId, Value};
use crate::notify::Notifier;
use crate::store::{Busy, CrudState, CrudStore, Modal};
use crate::stream::StateStream;
use crate::validation::{ValidationErrors, validate};

/// The main entry point for consumers of one CRUD view.
///
/// Cheaply cloneable via `Arc`. Owns the view's configuration, its
/// state store, the data-access backend and an optional toast channel.
pub struct CrudController<B: DataAccess> {
    inner: Arc<ControllerInner<B>>,
}

impl<B: DataAccess> Clone for CrudController<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ControllerInner<B> {
    config: Arc<CrudConfig>,
    store: CrudStore,
    backend: B,
    notifier: Option<Notifier>,
    /// Bumped per fetch; responses from older fetches are discarded.
    fetch_generation: AtomicU64,
}

impl<B: DataAccess> CrudController<B> {
    /// Build a controller. Fails if `config` does not validate.
    pub fn new(
        config: Arc<CrudConfig>,
        backend: B,
        notifier: Option<Notifier>,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(ControllerInner {
                store: CrudStore::new(Arc::clone(&config)),
                config,
                backend,
                notifier,
                fetch_generation: AtomicU64::new(0),
            }),
        })
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn config(&self) -> &Arc<CrudConfig> {
        &self.inner.config
    }

    pub fn backend(&self) -> &B {
        &self.inner.backend
    }

    pub fn notifier(&self) -> Option<&Notifier> {
        self.inner.notifier.as_ref()
    }

    pub fn store(&self) -> &CrudStore {
        &self.inner.store
    }

    /// Current state snapshot.
    pub fn state(&self) -> Arc<CrudState> {
        self.inner.store.snapshot()
    }

    pub fn subscribe(&self) -> StateStream {
        self.inner.store.subscribe()
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Async operations
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Load the full collection, replacing `items`.
    ///
    /// A response arriving after a newer fetch has started is dropped. A
    /// stale failure is returned but neither recorded nor toasted.
    pub async fn fetch_items(&self) -> Result<(), CoreError> {
        let generation = self.inner.fetch_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let _busy = self.store().begin(Busy::Loading);

        match self.inner.backend.list().await {
            Ok(items) => {
                if self.inner.fetch_generation.load(Ordering::SeqCst) != generation {
                    debug!(generation, "discarding stale fetch response");
                    return Ok(());
                }
                info!(view = %self.inner.config.plural, count = items.len(), "items loaded");
                self.store().replace_items(items);
                self.clear_error();
                Ok(())
            }
            Err(e) if self.inner.fetch_generation.load(Ordering::SeqCst) != generation => {
                debug!(generation, error = %e, "stale fetch failed");
                Err(e)
            }
            Err(e) => Err(self.fail(&format!("load {}", self.inner.config.plural), e)),
        }
    }

    /// Create from `draft`. The server-confirmed entity is prepended.
    pub async fn create_item(&self, draft: &Draft) -> Result<Entity, CoreError> {
        let _busy = self.store().begin(Busy::Creating);
        let name = self.inner.config.name.clone();

        match self.inner.backend.create(draft).await {
            Ok(entity) => {
                info!(id = %entity.id, "{name} created");
                self.store().prepend(entity.clone());
                self.succeed(format!("{name} created"));
                Ok(entity)
            }
            Err(e) => Err(self.fail(&format!("create {name}"), e)),
        }
    }

    /// Apply `patch` to `id`. Ids missing locally are never inserted.
    pub async fn update_item(&self, id: &EntityId, patch: &Draft) -> Result<Entity, CoreError> {
        let _busy = self.store().begin(Busy::Updating);
        let name = self.inner.config.name.clone();

        match self.inner.backend.update(id, patch).await {
            Ok(entity) => {
                if !self.store().replace(entity.clone()) {
                    debug!(%id, "updated entity not in local collection");
                }
                info!(%id, "{name} updated");
                self.succeed(format!("{name} updated"));
                Ok(entity)
            }
            Err(e) => Err(self.fail(&format!("update {name} {id}"), e)),
        }
    }

    pub async fn delete_item(&self, id: &EntityId) -> Result<(), CoreError> {
        let _busy = self.store().begin(Busy::Deleting);
        let name = self.inner.config.name.clone();

        match self.inner.backend.remove(id).await {
            Ok(()) => {
                self.store().remove(std::slice::from_ref(id));
                info!(%id, "{name} deleted");
                self.succeed(format!("{name} deleted"));
                Ok(())
            }
            Err(e) => Err(self.fail(&format!("delete {name} {id}"), e)),
        }
    }

    /// Move `id` to `status`.
    ///
    /// `Ok(None)` without sending anything when the view has no status
    /// workflow. Unknown status values fail validation before any request.
    pub async fn update_status(
        &self,
        id: &EntityId,
        status: &str,
    ) -> Result<Option<Entity>, CoreError> {
        let Some(field) = self.status_field_for(status)? else {
            debug!(%id, "no status field configured, ignoring status update");
            return Ok(None);
        };
        let _busy = self.store().begin(Busy::Updating);
        let name = self.inner.config.name.clone();

        match self.inner.backend.update_status(id, &field, status).await {
            Ok(entity) => {
                self.store().replace(entity.clone());
                info!(%id, status, "{name} status updated");
                self.succeed(format!("{name} status updated"));
                Ok(Some(entity))
            }
            Err(e) => Err(self.fail(&format!("update status of {name} {id}"), e)),
        }
    }

    /// Delete every id in `ids` (duplicates ignored); clears the selection.
    pub async fn bulk_delete(&self, ids: &[EntityId]) -> Result<usize, CoreError> {
        self.require_bulk("bulk delete")?;
        let ids = unique(ids);
        if ids.is_empty() {
            return Ok(0);
        }
        let _busy = self.store().begin(Busy::Deleting);
        let plural = self.inner.config.plural.clone();

        match self.inner.backend.bulk_remove(&ids).await {
            Ok(()) => {
                self.store().remove(&ids);
                self.store().clear_selection();
                info!(count = ids.len(), "{plural} deleted");
                self.succeed(format!("{} {plural} deleted", ids.len()));
                Ok(ids.len())
            }
            Err(e) => Err(self.fail(&format!("delete {plural}"), e)),
        }
    }

    /// Move every id in `ids` to `status`; clears the selection.
    pub async fn bulk_update_status(
        &self,
        ids: &[EntityId],
        status: &str,
    ) -> Result<usize, CoreError> {
        self.require_bulk("bulk status update")?;
        let Some(field) = self.status_field_for(status)? else {
            debug!("no status field configured, ignoring bulk status update");
            return Ok(0);
        };
        let ids = unique(ids);
        if ids.is_empty() {
            return Ok(0);
        }
        let _busy = self.store().begin(Busy::Updating);
        let plural = self.inner.config.plural.clone();

        match self.inner.backend.bulk_update_status(&ids, &field, status).await {
            Ok(confirmed) => {
                match confirmed {
                    Some(entities) => {
                        self.store().replace_many(entities);
                    }
                    None => {
                        self.store().patch_many(&ids, &field, &Value::from(status));
                    }
                }
                self.store().clear_selection();
                info!(count = ids.len(), status, "{plural} status updated");
                self.succeed(format!("{} {plural} updated", ids.len()));
                Ok(ids.len())
            }
            Err(e) => Err(self.fail(&format!("update status of {plural}"), e)),
        }
    }

    /// Validate `draft` against the form fields, then create it, or update
    /// the entity the open form targets. Closes modals on success.
    ///
    /// Invalid drafts fail with [`CoreError::Validation`] and nothing is
    /// sent. Values of hidden fields are not submitted.
    pub async fn submit_form(&self, draft: Draft) -> Result<Entity, CoreError> {
        let fields = &self.inner.config.form_fields;
        let errors = validate(fields, &draft);
        if !errors.is_empty() {
            debug!(fields = errors.len(), "form rejected");
            return Err(CoreError::Validation(errors));
        }

        let hidden: Vec<String> = fields
            .iter()
            .filter(|f| !f.is_visible(&draft))
            .map(|f| f.key.clone())
            .collect();
        let mut draft = draft;
        for key in &hidden {
            draft.remove(key);
        }

        let target = match self.state().modal {
            Modal::Form(Some(ref entity)) => Some(entity.id.clone()),
            _ => None,
        };
        let entity = match target {
            Some(id) => self.update_item(&id, &draft).await?,
            None => self.create_item(&draft).await?,
        };
        self.close_modals();
        Ok(entity)
    }

    /// Route a [`Command`] to its action.
    pub async fn execute(&self, command: Command) -> Result<CommandResult, CoreError> {
        debug!(verb = command.verb(), "executing command");
        match command {
            Command::Create { draft } => self.create_item(&draft).await.map(CommandResult::Entity),
            Command::Update { id, patch } => {
                self.update_item(&id, &patch).await.map(CommandResult::Entity)
            }
            Command::Delete { id } => self.delete_item(&id).await.map(|()| CommandResult::Ok),
            Command::UpdateStatus { id, status } => Ok(self
                .update_status(&id, &status)
                .await?
                .map_or(CommandResult::Ok, CommandResult::Entity)),
            Command::BulkDelete { ids } => self.bulk_delete(&ids).await.map(CommandResult::Affected),
            Command::BulkUpdateStatus { ids, status } => self
                .bulk_update_status(&ids, &status)
                .await
                .map(CommandResult::Affected),
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Synchronous UI actions
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    pub fn set_search_term(&self, term: impl Into<String>) {
        self.store().set_search_term(term);
    }

    pub fn set_filter(&self, key: impl Into<String>, value: impl Into<String>) {
        self.store().set_filter(key, value);
    }

    pub fn clear_filters(&self) {
        self.store().clear_filters();
    }

    pub fn set_sorting(&self, key: impl Into<String>, direction: SortDirection) {
        self.store().set_sorting(key, direction);
    }

    pub fn set_page(&self, page: usize) {
        self.store().set_page(page);
    }

    pub fn select_item(&self, id: &EntityId) {
        self.store().select_item(id);
    }

    pub fn select_all(&self) {
        self.store().select_all();
    }

    pub fn clear_selection(&self) {
        self.store().clear_selection();
    }

    pub fn open_view_modal(&self, entity: Entity) {
        self.store().open_view_modal(entity);
    }

    pub fn open_form_modal(&self, entity: Option<Entity>) {
        self.store().open_form_modal(entity);
    }

    pub fn open_delete_modal(&self, entity: Entity) {
        self.store().open_delete_modal(entity);
    }

    pub fn open_status_modal(&self, entity: Entity) {
        self.store().open_status_modal(entity);
    }

    pub fn close_modals(&self) {
        self.store().close_modals();
    }

    // ── Helpers ──────────────────────────────────────────────────────

    /// The status attribute, after checking `status` is one of its options.
    fn status_field_for(&self, status: &str) -> Result<Option<String>, CoreError> {
        let config = &self.inner.config;
        let Some(ref workflow) = config.status else {
            return Ok(None);
        };
        if !config.features.status_update {
            return Err(CoreError::Unsupported {
                operation: format!("status updates on {}", config.plural),
            });
        }
        if workflow.option(status).is_none() {
            let mut errors = ValidationErrors::new();
            errors.insert(
                workflow.field.clone(),
                format!("'{status}' is not a valid {}", workflow.field),
            );
            return Err(CoreError::Validation(errors));
        }
        Ok(Some(workflow.field.clone()))
    }

    fn require_bulk(&self, operation: &str) -> Result<(), CoreError> {
        let config = &self.inner.config;
        if config.features.bulk_actions {
            Ok(())
        } else {
            Err(CoreError::Unsupported {
                operation: format!("{operation} on {}", config.plural),
            })
        }
    }

    /// Log, record and toast a failed action, then hand the error back.
    fn fail(&self, action: &str, err: CoreError) -> CoreError {
        warn!(view = %self.inner.config.plural, action, error = %err, "action failed");
        let message = err.to_string();
        if let Some(ref notifier) = self.inner.notifier {
            notifier.error(format!("Failed to {action}"), message.clone());
        }
        self.store().set_error(Some(message));
        err
    }

    fn succeed(&self, title: String) {
        self.clear_error();
        if let Some(ref notifier) = self.inner.notifier {
            notifier.success(title, String::new());
        }
    }

    fn clear_error(&self) {
        if self.state().last_error.is_some() {
            self.store().set_error(None);
        }
    }
}

fn unique(ids: &[EntityId]) -> Vec<EntityId> {
    ids.iter().cloned().collect::<IndexSet<_>>().into_iter().collect()
}
