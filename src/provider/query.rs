//! Query string construction
//!
//! Pagination, filters and sort turn into a flat key/value mapping
//! (`page[number]`, `filter[field]`, `sort`), which is then encoded with
//! bracket notation for nested objects.

use super::params::{Filter, Pagination, Sort, SortOrder};
use super::response::Id;
use serde_json::Value;
use std::collections::BTreeMap;

pub const PAGE_NUMBER: &str = "page[number]";
pub const PAGE_SIZE: &str = "page[size]";
pub const SORT: &str = "sort";

/// Flat query mapping. Keys encode in lexicographic order; setting a key
/// twice keeps the last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query(BTreeMap<String, Value>);

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Encode as `key=value&...`, percent-encoding keys and values
    pub fn encode(&self) -> String {
        let mut pairs = Vec::new();
        for (key, value) in &self.0 {
            encode_pair(key, value, &mut pairs);
        }
        pairs.join("&")
    }

    /// Append the encoded query to `base`, omitting `?` when empty
    pub fn to_url(&self, base: &str) -> String {
        if self.is_empty() {
            base.to_string()
        } else {
            format!("{}?{}", base, self.encode())
        }
    }
}

fn encode_pair(key: &str, value: &Value, pairs: &mut Vec<String>) {
    match value {
        Value::Null => pairs.push(urlencoding::encode(key).into_owned()),
        Value::String(s) => pairs.push(format!(
            "{}={}",
            urlencoding::encode(key),
            urlencoding::encode(s)
        )),
        Value::Number(n) => pairs.push(format!(
            "{}={}",
            urlencoding::encode(key),
            urlencoding::encode(&number_text(n))
        )),
        Value::Bool(b) => pairs.push(format!("{}={}", urlencoding::encode(key), b)),
        Value::Array(items) => {
            for item in items {
                encode_pair(key, item, pairs);
            }
        }
        Value::Object(map) => {
            for (sub_key, sub_value) in map {
                encode_pair(&format!("{}[{}]", key, sub_key), sub_value, pairs);
            }
        }
    }
}

/// Whole floats are written without a fraction: `10.0` becomes `10`
fn number_text(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() => f.to_string(),
        _ => n.to_string(),
    }
}

pub fn filter_key(field: &str) -> String {
    format!("filter[{}]", field)
}

/// `field` for ascending, `-field` otherwise
pub fn sort_value(sort: &Sort) -> String {
    match sort.order {
        SortOrder::Asc => sort.field.clone(),
        SortOrder::Desc => format!("-{}", sort.field),
    }
}

/// Pagination first, then filters in order, then sort
pub fn list_query(pagination: &Pagination, filter: &Filter, sort: Option<&Sort>) -> Query {
    let mut query = Query::new();
    query.set(PAGE_NUMBER, pagination.page);
    query.set(PAGE_SIZE, pagination.per_page);

    for (field, value) in filter {
        query.set(filter_key(field), value.clone());
    }

    if let Some(sort) = sort.filter(|s| !s.field.is_empty()) {
        query.set(SORT, sort_value(sort));
    }

    query
}

/// Same as [`list_query`] plus `filter[target]=id`, which overrides any
/// filter on the same field
pub fn reference_query(
    target: &str,
    id: &Id,
    pagination: &Pagination,
    filter: &Filter,
    sort: Option<&Sort>,
) -> Query {
    let mut query = list_query(pagination, filter, sort);
    query.set(filter_key(target), id.to_value());
    query
}

/// `filter[id]=in:1,2,3`
pub fn ids_query(ids: &[Id]) -> Query {
    let joined = ids.iter().map(Id::to_string).collect::<Vec<_>>().join(",");
    let mut query = Query::new();
    query.set(filter_key("id"), format!("in:{}", joined));
    query
}
