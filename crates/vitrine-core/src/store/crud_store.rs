// ── Reactive CRUD store ──
//
// Owns the state of one view behind a `watch` channel. Every mutation
// goes through `update`, which re-runs the pipeline before subscribers
// are notified, so `filtered_items` and `pagination` are never stale.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use super::state::{Busy, CrudState, Modal, Pagination};
use crate::config::{CrudConfig, SortDirection, SortSpec};
use crate::model::{Entity, EntityId, Value};
use crate::pipeline::{self, Query};
use crate::stream::StateStream;

/// Single writer for one view's `CrudState`.
pub struct CrudStore {
    config: Arc<CrudConfig>,
    state: watch::Sender<Arc<CrudState>>,
}

impl CrudStore {
    pub fn new(config: Arc<CrudConfig>) -> Self {
        let mut initial = CrudState {
            sort: config.default_sort.clone(),
            pagination: Pagination {
                page_size: config.page_size,
                ..Pagination::default()
            },
            ..CrudState::default()
        };
        rederive(&mut initial, &config);
        let (state, _) = watch::channel(Arc::new(initial));
        Self { config, state }
    }

    pub fn config(&self) -> &Arc<CrudConfig> {
        &self.config
    }

    /// Current state.
    pub fn snapshot(&self) -> Arc<CrudState> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> StateStream {
        StateStream::new(self.state.subscribe())
    }

    /// Apply `f`, re-derive the visible page, then notify subscribers.
    pub(crate) fn update(&self, f: impl FnOnce(&mut CrudState)) {
        let config = &self.config;
        self.state.send_modify(|snapshot| {
            let state = Arc::make_mut(snapshot);
            f(state);
            rederive(state, config);
        });
    }

    // ── Busy flags & errors ──────────────────────────────────────────

    /// Raise `kind`'s flag until the returned guard drops.
    pub(crate) fn begin(&self, kind: Busy) -> BusyGuard<'_> {
        self.update(|s| s.in_flight.begin(kind));
        BusyGuard { store: self, kind }
    }

    pub(crate) fn set_error(&self, message: Option<String>) {
        self.update(|s| s.last_error = message);
    }

    // ── Collection mutations ─────────────────────────────────────────

    pub(crate) fn replace_items(&self, items: Vec<Entity>) {
        let items = dedup_by_id(items);
        debug!(count = items.len(), "items replaced");
        self.update(|s| s.items = items);
    }

    /// Insert at the front. An existing entity with the same id is replaced.
    pub(crate) fn prepend(&self, entity: Entity) {
        self.update(|s| {
            s.items.retain(|e| e.id != entity.id);
            s.items.insert(0, entity);
        });
    }

    /// Replace by id in place. Unknown ids are ignored; returns whether
    /// anything changed.
    pub(crate) fn replace(&self, entity: Entity) -> bool {
        let mut replaced = false;
        self.update(|s| {
            if let Some(slot) = s.items.iter_mut().find(|e| e.id == entity.id) {
                sync_modal(&mut s.modal, &entity);
                *slot = entity;
                replaced = true;
            }
        });
        replaced
    }

    /// Replace every known entity in `entities`; returns how many matched.
    pub(crate) fn replace_many(&self, entities: Vec<Entity>) -> usize {
        let mut replaced = 0;
        self.update(|s| {
            for entity in entities {
                if let Some(slot) = s.items.iter_mut().find(|e| e.id == entity.id) {
                    sync_modal(&mut s.modal, &entity);
                    *slot = entity;
                    replaced += 1;
                }
            }
        });
        replaced
    }

    /// Set `field = value` on every listed entity.
    pub(crate) fn patch_many(&self, ids: &[EntityId], field: &str, value: &Value) -> usize {
        let wanted: HashSet<&EntityId> = ids.iter().collect();
        let mut patched = 0;
        self.update(|s| {
            for entity in s.items.iter_mut().filter(|e| wanted.contains(&e.id)) {
                entity.attributes.insert(field.to_owned(), value.clone());
                sync_modal(&mut s.modal, entity);
                patched += 1;
            }
        });
        patched
    }

    /// Remove from items and selection; returns how many were removed.
    pub(crate) fn remove(&self, ids: &[EntityId]) -> usize {
        let gone: HashSet<&EntityId> = ids.iter().collect();
        let mut removed = 0;
        self.update(|s| {
            let before = s.items.len();
            s.items.retain(|e| !gone.contains(&e.id));
            removed = before - s.items.len();
            s.selection.retain(|id| !gone.contains(id));
            if s.modal.target().is_some_and(|e| gone.contains(&e.id)) {
                s.modal = Modal::Closed;
            }
        });
        removed
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Synchronous UI actions
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    pub fn set_search_term(&self, term: impl Into<String>) {
        let term = term.into();
        self.update(|s| {
            s.search_term = term;
            s.pagination.current_page = 1;
        });
    }

    /// Set one filter. `all` or an empty value deactivates it.
    pub fn set_filter(&self, key: impl Into<String>, value: impl Into<String>) {
        let (key, value) = (key.into(), value.into());
        self.update(|s| {
            s.filters.insert(key, value);
            s.pagination.current_page = 1;
        });
    }

    pub fn clear_filters(&self) {
        self.update(|s| {
            s.filters.clear();
            s.pagination.current_page = 1;
        });
    }

    /// Sort by `key`. Columns declared unsortable are ignored.
    pub fn set_sorting(&self, key: impl Into<String>, direction: SortDirection) {
        let key = key.into();
        if self.config.column(&key).is_some_and(|c| !c.sortable) {
            debug!(%key, "ignoring sort on unsortable column");
            return;
        }
        self.update(|s| {
            s.sort = Some(SortSpec::new(key, direction));
            s.pagination.current_page = 1;
        });
    }

    /// Header-click behaviour: same key flips direction, new key sorts
    /// ascending.
    pub fn toggle_sort(&self, key: &str) {
        let direction = match self.snapshot().sort {
            Some(ref sort) if sort.key == key => sort.direction.reversed(),
            _ => SortDirection::Asc,
        };
        self.set_sorting(key, direction);
    }

    /// Jump to page `page`. Nothing else changes.
    pub fn set_page(&self, page: usize) {
        self.update(|s| s.pagination.current_page = page.max(1));
    }

    pub fn set_page_size(&self, page_size: usize) {
        self.update(|s| {
            s.pagination.page_size = page_size;
            s.pagination.current_page = 1;
        });
    }

    /// Toggle selection of `id`. Ids not in the collection are ignored.
    pub fn select_item(&self, id: &EntityId) {
        self.update(|s| {
            if !s.selection.shift_remove(id) && s.item(id).is_some() {
                s.selection.insert(id.clone());
            }
        });
    }

    /// Select exactly the entities on the visible page.
    pub fn select_all(&self) {
        self.update(|s| {
            s.selection = s.filtered_items.iter().map(|e| e.id.clone()).collect();
        });
    }

    pub fn clear_selection(&self) {
        self.update(|s| s.selection.clear());
    }

    pub fn open_view_modal(&self, entity: Entity) {
        self.update(|s| s.modal = Modal::View(entity));
    }

    /// `None` opens an empty create form, `Some` an edit form.
    pub fn open_form_modal(&self, entity: Option<Entity>) {
        self.update(|s| s.modal = Modal::Form(entity));
    }

    pub fn open_delete_modal(&self, entity: Entity) {
        self.update(|s| s.modal = Modal::Delete(entity));
    }

    pub fn open_status_modal(&self, entity: Entity) {
        self.update(|s| s.modal = Modal::Status(entity));
    }

    pub fn close_modals(&self) {
        self.update(|s| s.modal = Modal::Closed);
    }
}

/// Clears one busy flag on drop, whatever the outcome of the operation.
pub(crate) struct BusyGuard<'a> {
    store: &'a CrudStore,
    kind: Busy,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let kind = self.kind;
        self.store.update(|s| s.in_flight.end(kind));
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

fn rederive(state: &mut CrudState, config: &CrudConfig) {
    let known: HashSet<&EntityId> = state.items.iter().map(|e| &e.id).collect();
    state.selection.retain(|id| known.contains(id));

    let query = Query {
        search_term: state.search_term.clone(),
        filters: state.filters.clone(),
        sort: state.sort.clone(),
        page: state.pagination.current_page,
        page_size: state.pagination.page_size,
    };
    let view = pipeline::derive(&state.items, config, &query);
    state.filtered_items = view.items;
    state.pagination.current_page = view.page;
    state.pagination.total_pages = view.total_pages;
    state.pagination.total_count = view.total_count;
}

/// Keep an open modal showing the latest copy of its entity.
fn sync_modal(modal: &mut Modal, entity: &Entity) {
    match modal {
        Modal::View(e) | Modal::Delete(e) | Modal::Status(e) | Modal::Form(Some(e))
            if e.id == entity.id =>
        {
            *e = entity.clone();
        }
        _ => {}
    }
}

fn dedup_by_id(items: Vec<Entity>) -> Vec<Entity> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|e| seen.insert(e.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColumnDescriptor;
    use pretty_assertions::assert_eq;

    fn store() -> CrudStore {
        let config = CrudConfig::new("Product", "Products", "products")
            .with_column(ColumnDescriptor::new("name", "Name"))
            .with_column(ColumnDescriptor::new("actions", "Actions").unsortable())
            .with_search_fields(["name"])
            .with_page_size(2);
        let store = CrudStore::new(Arc::new(config));
        store.replace_items(
            ["Echo", "Delta", "Charlie", "Bravo", "Alpha"]
                .iter()
                .enumerate()
                .map(|(i, name)| Entity::new(i.to_string()).with("name", *name))
                .collect(),
        );
        store
    }

    fn page_ids(store: &CrudStore) -> Vec<String> {
        store
            .snapshot()
            .filtered_items
            .iter()
            .map(|e| e.id.to_string())
            .collect()
    }

    #[test]
    fn mutations_rederive_the_page() {
        let store = store();
        let state = store.snapshot();
        assert_eq!(state.pagination.total_pages, 3);
        assert_eq!(state.pagination.total_count, 5);
        assert_eq!(page_ids(&store), vec!["0", "1"]);

        store.set_sorting("name", SortDirection::Asc);
        assert_eq!(page_ids(&store), vec!["4", "3"]);
    }

    #[test]
    fn search_filter_and_sort_reset_page() {
        let store = store();

        store.set_page(3);
        store.set_search_term("a");
        assert_eq!(store.snapshot().pagination.current_page, 1);

        store.set_page(2);
        store.set_filter("name", "all");
        assert_eq!(store.snapshot().pagination.current_page, 1);

        store.set_page(2);
        store.set_sorting("name", SortDirection::Desc);
        assert_eq!(store.snapshot().pagination.current_page, 1);
    }

    #[test]
    fn set_page_leaves_query_alone() {
        let store = store();
        store.set_search_term("a");
        store.set_filter("name", "ha");
        store.set_sorting("name", SortDirection::Desc);
        store.set_page(2);

        let state = store.snapshot();
        assert_eq!(state.pagination.current_page, 2);
        assert_eq!(state.search_term, "a");
        assert_eq!(state.filters.get("name").map(String::as_str), Some("ha"));
        assert_eq!(state.sort, Some(SortSpec::new("name", SortDirection::Desc)));
    }

    #[test]
    fn unsortable_columns_are_ignored() {
        let store = store();
        store.set_sorting("actions", SortDirection::Asc);
        assert!(store.snapshot().sort.is_none());
    }

    #[test]
    fn toggle_sort_flips_direction() {
        let store = store();
        store.toggle_sort("name");
        assert_eq!(store.snapshot().sort, Some(SortSpec::new("name", SortDirection::Asc)));
        store.toggle_sort("name");
        assert_eq!(store.snapshot().sort, Some(SortSpec::new("name", SortDirection::Desc)));
    }

    #[test]
    fn selection_toggles_and_select_all_is_page_scoped() {
        let store = store();
        let id = EntityId::from("3");
        store.select_item(&id);
        assert!(store.snapshot().is_selected(&id));
        store.select_item(&id);
        assert!(!store.snapshot().is_selected(&id));

        store.select_item(&EntityId::from("missing"));
        assert!(store.snapshot().selection.is_empty());

        store.select_all();
        let selected: Vec<String> = store
            .snapshot()
            .selection
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(selected, vec!["0", "1"]);
    }

    #[test]
    fn at_most_one_modal_open() {
        let store = store();
        let entity = store.snapshot().items[0].clone();

        store.open_view_modal(entity.clone());
        store.open_delete_modal(entity.clone());
        let state = store.snapshot();
        assert!(state.is_delete_modal_open());
        assert!(!state.is_view_modal_open());

        store.open_form_modal(None);
        store.open_status_modal(entity);
        let state = store.snapshot();
        assert!(state.is_status_modal_open());
        assert!(!state.is_form_modal_open());

        store.close_modals();
        assert!(!store.snapshot().modal.is_open());
    }

    #[test]
    fn remove_clears_selection_and_modal() {
        let store = store();
        let id = EntityId::from("1");
        let entity = store.snapshot().item(&id).cloned();
        store.select_item(&id);
        if let Some(entity) = entity {
            store.open_view_modal(entity);
        }

        assert_eq!(store.remove(&[id.clone()]), 1);
        let state = store.snapshot();
        assert!(state.item(&id).is_none());
        assert!(!state.is_selected(&id));
        assert!(!state.modal.is_open());
    }

    #[test]
    fn replace_never_inserts() {
        let store = store();
        assert!(!store.replace(Entity::new("99").with("name", "Ghost")));
        assert_eq!(store.snapshot().items.len(), 5);

        assert!(store.replace(Entity::new("0").with("name", "Echo II")));
        let state = store.snapshot();
        assert_eq!(
            state.item(&EntityId::from("0")).map(|e| e.text("name")),
            Some("Echo II".to_string())
        );
    }

    #[test]
    fn replace_items_drops_duplicate_ids_and_stale_selection() {
        let store = store();
        store.select_item(&EntityId::from("4"));
        store.replace_items(vec![
            Entity::new("a").with("name", "first"),
            Entity::new("a").with("name", "second"),
        ]);
        let state = store.snapshot();
        assert_eq!(state.items.len(), 1);
        assert_eq!(state.items[0].text("name"), "first");
        assert!(state.selection.is_empty());
    }

    #[tokio::test]
    async fn subscribers_see_mutations() {
        let store = store();
        let mut stream = store.subscribe();
        store.set_search_term("alp");
        let state = stream.changed().await.unwrap_or_else(|| store.snapshot());
        assert_eq!(state.filtered_items.len(), 1);
    }

    #[test]
    fn busy_guard_clears_on_drop() {
        let store = store();
        {
            let _guard = store.begin(Busy::Loading);
            assert!(store.snapshot().is_loading());
        }
        assert!(!store.snapshot().is_loading());
    }
}
