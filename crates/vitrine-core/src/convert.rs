// ── Wire-to-domain conversions ──
//
// Bridges `vitrine_api` records and payloads to the entity model.

use vitrine_api::{Payload, Record};

use crate::model::{Attributes, Draft, Entity, EntityId, Value};

impl From<Record> for Entity {
    fn from(record: Record) -> Self {
        let attributes: Attributes = record
            .fields
            .into_iter()
            .map(|(key, value)| (key, Value::from(value)))
            .collect();
        Entity {
            id: EntityId::from(record.id),
            attributes,
        }
    }
}

/// Request body for a draft. A stray `id` attribute is never sent: the
/// server owns identifiers.
pub(crate) fn draft_to_payload(draft: &Draft) -> Payload {
    draft
        .iter()
        .filter(|(key, _)| key.as_str() != "id")
        .map(|(key, value)| (key.clone(), value.to_json()))
        .collect()
}

pub(crate) fn wire_ids(ids: &[EntityId]) -> Vec<String> {
    ids.iter().map(|id| id.as_str().to_owned()).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_wire_ids_become_strings() {
        let record: Record =
            serde_json::from_value(json!({ "id": 42, "name": "Answer", "price": 9.5 })).unwrap();
        let entity = Entity::from(record);
        assert_eq!(entity.id.as_str(), "42");
        assert_eq!(entity.get("price"), Some(&Value::from(9.5)));
        assert!(entity.get("id").is_none());
    }

    #[test]
    fn payload_omits_id() {
        let draft = Draft::new().with("id", "client-made").with("name", "X").with("qty", 3_i64);
        let payload = draft_to_payload(&draft);
        assert_eq!(serde_json::Value::Object(payload), json!({ "name": "X", "qty": 3 }));
    }
}
