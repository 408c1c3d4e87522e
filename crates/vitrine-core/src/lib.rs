// vitrine-core: Generic CRUD state engine between vitrine-api and consumers (CLI).
//
// One `CrudController` per view: configuration in, reactive state out,
// with every write routed through a `DataAccess` backend.

pub mod backend;
pub mod command;
pub mod config;
pub mod controller;
mod convert;
pub mod error;
pub mod model;
pub mod notify;
pub mod pipeline;
pub mod store;
pub mod stream;
pub mod validation;

// ── Primary re-exports ──────────────────────────────────────────────
pub use backend::{DataAccess, MemoryBackend, RestBackend};
pub use command::{Command, CommandResult};
pub use config::{
    Align, ColumnDescriptor, CrudConfig, FILTER_ALL, Features, FieldKind, FilterDescriptor,
    FilterKind, FormField, PLACEHOLDER, SelectOption, SortDirection, SortSpec, StatusConfig,
    StatusOption, ValidationRule, Visibility,
};
pub use controller::CrudController;
pub use error::CoreError;
pub use model::{Attributes, Draft, Entity, EntityId, Value};
pub use notify::{Notification, NotificationKind, Notifier};
pub use pipeline::{PageView, Query};
pub use store::{Busy, CrudState, CrudStore, Modal, Pagination};
pub use stream::StateStream;
pub use validation::ValidationErrors;
