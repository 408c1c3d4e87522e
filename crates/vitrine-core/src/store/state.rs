// ── CRUD view state ──
//
// Plain data. `CrudStore` is the only writer; everything else reads
// `Arc<CrudState>` snapshots.

use indexmap::{IndexMap, IndexSet};

use crate::config::SortSpec;
use crate::model::{Entity, EntityId};

/// The one modal that may be open, with the entity it targets.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Modal {
    #[default]
    Closed,
    View(Entity),
    /// `None` creates, `Some` edits.
    Form(Option<Entity>),
    Delete(Entity),
    Status(Entity),
}

impl Modal {
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }

    /// Entity the open modal targets, if any.
    pub fn target(&self) -> Option<&Entity> {
        match self {
            Self::View(e) | Self::Delete(e) | Self::Status(e) | Self::Form(Some(e)) => Some(e),
            Self::Closed | Self::Form(None) => None,
        }
    }
}

/// Which async operation a busy counter tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Busy {
    Loading,
    Creating,
    Updating,
    Deleting,
}

/// In-flight counts per operation kind. A flag stays raised until the
/// last overlapping operation of its kind completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct InFlight {
    loading: u32,
    creating: u32,
    updating: u32,
    deleting: u32,
}

impl InFlight {
    fn slot(&mut self, kind: Busy) -> &mut u32 {
        match kind {
            Busy::Loading => &mut self.loading,
            Busy::Creating => &mut self.creating,
            Busy::Updating => &mut self.updating,
            Busy::Deleting => &mut self.deleting,
        }
    }

    pub(crate) fn begin(&mut self, kind: Busy) {
        let slot = self.slot(kind);
        *slot = slot.saturating_add(1);
    }

    pub(crate) fn end(&mut self, kind: Busy) {
        let slot = self.slot(kind);
        *slot = slot.saturating_sub(1);
    }

    fn count(self, kind: Busy) -> u32 {
        match kind {
            Busy::Loading => self.loading,
            Busy::Creating => self.creating,
            Busy::Updating => self.updating,
            Busy::Deleting => self.deleting,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// 1-indexed.
    pub current_page: usize,
    /// Always at least 1.
    pub total_pages: usize,
    /// Matches across all pages, after search and filters.
    pub total_count: usize,
    pub page_size: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            current_page: 1,
            total_pages: 1,
            total_count: 0,
            page_size: 0,
        }
    }
}

/// Snapshot of one CRUD view.
#[derive(Debug, Clone, Default)]
pub struct CrudState {
    /// Full collection, id-unique, in server order (newest creates first).
    pub items: Vec<Entity>,
    /// The visible page after search, filters, sort and pagination.
    pub filtered_items: Vec<Entity>,
    /// Selected ids, always a subset of `items`.
    pub selection: IndexSet<EntityId>,
    pub pagination: Pagination,
    pub search_term: String,
    pub filters: IndexMap<String, String>,
    pub sort: Option<SortSpec>,
    pub modal: Modal,
    /// Message of the most recent failed action.
    pub last_error: Option<String>,
    pub(crate) in_flight: InFlight,
}

impl CrudState {
    // ── Busy flags ───────────────────────────────────────────────────

    pub fn is_busy(&self, kind: Busy) -> bool {
        self.in_flight.count(kind) > 0
    }

    pub fn is_loading(&self) -> bool {
        self.is_busy(Busy::Loading)
    }

    pub fn is_creating(&self) -> bool {
        self.is_busy(Busy::Creating)
    }

    pub fn is_updating(&self) -> bool {
        self.is_busy(Busy::Updating)
    }

    pub fn is_deleting(&self) -> bool {
        self.is_busy(Busy::Deleting)
    }

    // ── Modal flags ──────────────────────────────────────────────────

    pub fn is_view_modal_open(&self) -> bool {
        matches!(self.modal, Modal::View(_))
    }

    pub fn is_form_modal_open(&self) -> bool {
        matches!(self.modal, Modal::Form(_))
    }

    pub fn is_delete_modal_open(&self) -> bool {
        matches!(self.modal, Modal::Delete(_))
    }

    pub fn is_status_modal_open(&self) -> bool {
        matches!(self.modal, Modal::Status(_))
    }

    /// Entity targeted by the open modal.
    pub fn selected_item(&self) -> Option<&Entity> {
        self.modal.target()
    }

    // ── Lookups ──────────────────────────────────────────────────────

    pub fn item(&self, id: &EntityId) -> Option<&Entity> {
        self.items.iter().find(|e| &e.id == id)
    }

    pub fn is_selected(&self, id: &EntityId) -> bool {
        self.selection.contains(id)
    }

    /// Selected entities in selection order.
    pub fn selected_items(&self) -> Vec<&Entity> {
        self.selection.iter().filter_map(|id| self.item(id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_operations_keep_flag_raised() {
        let mut state = CrudState::default();
        state.in_flight.begin(Busy::Creating);
        state.in_flight.begin(Busy::Creating);
        state.in_flight.end(Busy::Creating);
        assert!(state.is_creating());
        state.in_flight.end(Busy::Creating);
        assert!(!state.is_creating());
        state.in_flight.end(Busy::Creating);
        assert!(!state.is_creating());
    }

    #[test]
    fn modal_flags_follow_the_enum() {
        let entity = Entity::new("1");
        let mut state = CrudState {
            modal: Modal::Delete(entity.clone()),
            ..CrudState::default()
        };
        assert!(state.is_delete_modal_open());
        assert!(!state.is_view_modal_open());
        assert_eq!(state.selected_item(), Some(&entity));

        state.modal = Modal::Form(None);
        assert!(state.is_form_modal_open());
        assert!(state.selected_item().is_none());
    }
}
