//! Wire documents and result shapes
//!
//! Services answer with JSON:API-style documents (`{data: {id, attributes}}`
//! or `{data: [...], meta: {count}}`); callers get flat records
//! `{id, ...attributes}` wrapped in small result envelopes.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::ops::Deref;

/// Entity identifier, either numeric or textual
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    Int(i64),
    Str(String),
}

impl Id {
    /// Parse user input: integers become [`Id::Int`], anything else [`Id::Str`]
    pub fn parse(input: &str) -> Self {
        input
            .parse::<i64>()
            .map(Id::Int)
            .unwrap_or_else(|_| Id::Str(input.to_string()))
    }

    pub fn to_value(&self) -> Value {
        match self {
            Id::Int(n) => Value::from(*n),
            Id::Str(s) => Value::from(s.as_str()),
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Id::Int),
            Value::String(s) => Some(Id::Str(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Int(n) => write!(f, "{}", n),
            Id::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Id {
    fn from(value: i64) -> Self {
        Id::Int(value)
    }
}

impl From<i32> for Id {
    fn from(value: i32) -> Self {
        Id::Int(value.into())
    }
}

impl From<u32> for Id {
    fn from(value: u32) -> Self {
        Id::Int(value.into())
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Id::Str(value.to_string())
    }
}

impl From<String> for Id {
    fn from(value: String) -> Self {
        Id::Str(value)
    }
}

/// JSON:API resource object as returned by a service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceObject {
    pub id: Id,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// `null` and absent are both treated as empty
    #[serde(default)]
    pub attributes: Option<Map<String, Value>>,
}

impl ResourceObject {
    /// Flatten into `{id, ...attributes}`; the object's own id wins over an
    /// attribute named `id`.
    pub fn flatten(self) -> Record {
        let mut map = Map::new();
        map.insert("id".to_string(), self.id.to_value());
        for (key, value) in self.attributes.unwrap_or_default() {
            if key != "id" {
                map.insert(key, value);
            }
        }
        Record(map)
    }
}

/// Flat entity: `{id, ...attributes}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn id(&self) -> Option<Id> {
        self.0.get("id").and_then(Id::from_value)
    }

    /// Split back into a resource object. Fails when `id` is missing or not
    /// a string/integer.
    pub fn into_resource(mut self, kind: Option<String>) -> Result<ResourceObject> {
        let id = self
            .0
            .remove("id")
            .as_ref()
            .and_then(Id::from_value)
            .ok_or_else(|| Error::malformed("record has no usable id"))?;

        Ok(ResourceObject {
            id,
            kind,
            attributes: Some(self.0),
        })
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl Deref for Record {
    type Target = Map<String, Value>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Record(map)
    }
}

/// Paginated list: `total` is the server-side count, not the page length
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListResult {
    pub total: u64,
    pub data: Vec<Record>,
}

/// Single record result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OneResult {
    pub data: Record,
}

/// Ids touched by a batched operation, in request order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdsResult {
    pub data: Vec<Id>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletedRecord {
    pub id: Id,
}

/// Result of a single delete; the id comes from the response body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeleteResult {
    pub data: DeletedRecord,
}

#[derive(Deserialize)]
pub(crate) struct SingleDocument {
    pub data: ResourceObject,
}

#[derive(Deserialize)]
pub(crate) struct CollectionDocument {
    pub data: Vec<ResourceObject>,
    pub meta: Meta,
}

#[derive(Deserialize)]
pub(crate) struct Meta {
    pub count: u64,
}

#[derive(Deserialize)]
pub(crate) struct IdDocument {
    pub data: DeletedRecord,
}

/// Outgoing `{data: {id?, type, attributes}}` envelope
#[derive(Serialize)]
pub(crate) struct OutgoingDocument<'a> {
    pub data: OutgoingResource<'a>,
}

#[derive(Serialize)]
pub(crate) struct OutgoingResource<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<&'a Id>,
    #[serde(rename = "type")]
    pub kind: &'a str,
    pub attributes: &'a Map<String, Value>,
}

/// Decode a response body into one of the document shapes above
pub(crate) fn decode<T: DeserializeOwned>(json: Value, what: &str) -> Result<T> {
    serde_json::from_value(json).map_err(|e| Error::malformed(format!("{}: {}", what, e)))
}

impl CollectionDocument {
    pub fn into_list(self) -> ListResult {
        ListResult {
            total: self.meta.count,
            data: self.data.into_iter().map(ResourceObject::flatten).collect(),
        }
    }
}
