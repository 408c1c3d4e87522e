// Wire types for the resource endpoints.
//
// Records are schema-light: an identifier plus whatever fields the
// resource carries. Servers disagree on whether ids are strings or
// integers and on whether lists are enveloped, so both shapes decode.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Request body for create/update calls.
pub type Payload = Map<String, Value>;

/// Identifier as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    Text(String),
    Number(i64),
}

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s}"),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

/// A single resource record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: WireId,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// `GET /{resource}` body: either a bare array or `{ "data": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListResponse {
    Bare(Vec<Record>),
    Envelope { data: Vec<Record> },
}

impl ListResponse {
    pub(crate) fn into_records(self) -> Vec<Record> {
        match self {
            Self::Bare(records) | Self::Envelope { data: records } => records,
        }
    }
}

/// Single-record body: either the record itself or `{ "data": {...} }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RecordResponse {
    Bare(Record),
    Envelope { data: Record },
}

impl RecordResponse {
    pub(crate) fn into_record(self) -> Record {
        match self {
            Self::Bare(record) | Self::Envelope { data: record } => record,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct StatusUpdate<'a> {
    pub field: &'a str,
    pub status: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct BulkIds<'a> {
    pub ids: &'a [String],
}

#[derive(Debug, Serialize)]
pub(crate) struct BulkStatusUpdate<'a> {
    pub ids: &'a [String],
    pub field: &'a str,
    pub status: &'a str,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_and_string_ids_decode() {
        let a: Record = serde_json::from_value(json!({ "id": 7, "name": "Seven" })).unwrap();
        let b: Record = serde_json::from_value(json!({ "id": "p-7", "name": "Seven" })).unwrap();
        assert_eq!(a.id.to_string(), "7");
        assert_eq!(b.id, WireId::Text("p-7".into()));
        assert_eq!(a.fields.get("name"), Some(&json!("Seven")));
        assert!(!a.fields.contains_key("id"));
    }

    #[test]
    fn enveloped_and_bare_lists_decode() {
        let bare: ListResponse = serde_json::from_value(json!([{ "id": "1" }])).unwrap();
        let env: ListResponse =
            serde_json::from_value(json!({ "data": [{ "id": "1" }, { "id": "2" }] })).unwrap();
        assert_eq!(bare.into_records().len(), 1);
        assert_eq!(env.into_records().len(), 2);
    }
}
