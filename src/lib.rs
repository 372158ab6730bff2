//! CRUD data provider for JSON:API microservices
//!
//! One uniform interface ([`DataProvider`]) for list/get/create/update/delete
//! against many independently-addressed services. Each resource name maps to
//! the base URL of the service that owns it; requests and responses follow
//! JSON:API conventions (`page[number]`, `filter[field]`, `{data: {id,
//! attributes}}`, `meta.count`).
//!
//! # Module Structure
//!
//! - [`provider`] - The provider, its parameters and result shapes
//! - [`http`] - Injectable HTTP client and the default `reqwest` one
//! - [`error`] - Error type shared by every operation

pub mod error;
pub mod http;
pub mod provider;

pub use error::{describe_error, Error, Result};
pub use http::{FetchOptions, HttpClient, HttpResponse, ReqwestClient};
pub use provider::{
    CreateParams, DataProvider, DeleteManyParams, DeleteParams, DeleteResult, DeletedRecord,
    Filter, GetListParams, GetManyParams, GetManyReferenceParams, GetOneParams, Id, IdsResult,
    ListResult, MicroServiceConfig, MicroServicesProvider, OneResult, Pagination, Record,
    ResourceObject, Sort, SortOrder, UpdateManyBody, UpdateManyParams, UpdateParams,
};
