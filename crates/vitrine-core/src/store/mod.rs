// ── View state storage ──

mod crud_store;
mod state;

pub use crud_store::CrudStore;
pub use state::{Busy, CrudState, Modal, Pagination};
