//! Typed parameters for each provider operation

use super::response::Id;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field filters, kept in insertion order
pub type Filter = Map<String, Value>;

/// 1-based page number and page size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Pagination {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self { page, per_page }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
        }
    }
}

/// Sort direction. Only the exact string `ASC` is ascending; every other
/// value reads as descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", from = "String")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl From<String> for SortOrder {
    fn from(value: String) -> Self {
        SortOrder::from(value.as_str())
    }
}

impl From<&str> for SortOrder {
    fn from(value: &str) -> Self {
        if value == "ASC" {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    #[serde(default)]
    pub order: SortOrder,
}

impl Sort {
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GetListParams {
    pub pagination: Pagination,
    pub filter: Filter,
    pub sort: Option<Sort>,
}

impl GetListParams {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            pagination: Pagination::new(page, per_page),
            ..Self::default()
        }
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter.insert(field.into(), value.into());
        self
    }

    pub fn sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort = Some(Sort::new(field, order));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetOneParams {
    pub id: Id,
}

impl GetOneParams {
    pub fn new(id: impl Into<Id>) -> Self {
        Self { id: id.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetManyParams {
    pub ids: Vec<Id>,
}

impl GetManyParams {
    pub fn new<I: Into<Id>>(ids: impl IntoIterator<Item = I>) -> Self {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }
}

/// Records of `resource` whose `target` field references `id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetManyReferenceParams {
    pub target: String,
    pub id: Id,
    #[serde(default)]
    pub pagination: Pagination,
    #[serde(default)]
    pub filter: Filter,
    #[serde(default)]
    pub sort: Option<Sort>,
}

impl GetManyReferenceParams {
    pub fn new(target: impl Into<String>, id: impl Into<Id>) -> Self {
        Self {
            target: target.into(),
            id: id.into(),
            pagination: Pagination::default(),
            filter: Filter::new(),
            sort: None,
        }
    }

    pub fn paginate(mut self, page: u32, per_page: u32) -> Self {
        self.pagination = Pagination::new(page, per_page);
        self
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter.insert(field.into(), value.into());
        self
    }

    pub fn sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort = Some(Sort::new(field, order));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateParams {
    pub id: Id,
    pub data: Map<String, Value>,
}

impl UpdateParams {
    pub fn new(id: impl Into<Id>, data: Map<String, Value>) -> Self {
        Self { id: id.into(), data }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateManyParams {
    pub ids: Vec<Id>,
    pub data: Map<String, Value>,
}

impl UpdateManyParams {
    pub fn new<I: Into<Id>>(ids: impl IntoIterator<Item = I>, data: Map<String, Value>) -> Self {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateParams {
    pub data: Map<String, Value>,
}

impl CreateParams {
    pub fn new(data: Map<String, Value>) -> Self {
        Self { data }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteParams {
    pub id: Id,
}

impl DeleteParams {
    pub fn new(id: impl Into<Id>) -> Self {
        Self { id: id.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteManyParams {
    pub ids: Vec<Id>,
}

impl DeleteManyParams {
    pub fn new<I: Into<Id>>(ids: impl IntoIterator<Item = I>) -> Self {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }
}
