// ── Command API ──
//
// All write operations can flow through a unified `Command` enum.
// `CrudController::execute` routes each variant to its action.

use crate::model::{Draft, Entity, EntityId};

/// Every write operation a CRUD view supports.
#[derive(Debug, Clone)]
pub enum Command {
    Create {
        draft: Draft,
    },
    Update {
        id: EntityId,
        patch: Draft,
    },
    Delete {
        id: EntityId,
    },
    UpdateStatus {
        id: EntityId,
        status: String,
    },
    BulkDelete {
        ids: Vec<EntityId>,
    },
    BulkUpdateStatus {
        ids: Vec<EntityId>,
        status: String,
    },
}

impl Command {
    /// Short verb for logs and confirmations.
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
            Self::UpdateStatus { .. } => "update status of",
            Self::BulkDelete { .. } => "delete",
            Self::BulkUpdateStatus { .. } => "update status of",
        }
    }
}

/// Result of a successfully executed command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    /// Completed without a record to show.
    Ok,
    /// The server-confirmed entity.
    Entity(Entity),
    /// Number of entities affected by a bulk operation.
    Affected(usize),
}
