// ── Domain model ──
//
// Schema-light records: every managed entity is an id plus an attribute
// bag. Configuration descriptors supply the schema overlay.

mod entity;
mod entity_id;
mod value;

pub use entity::{Attributes, Draft, Entity};
pub use entity_id::EntityId;
pub use value::Value;
