//! Data provider over JSON:API microservices
//!
//! [`MicroServicesProvider`] implements the generic CRUD interface
//! ([`DataProvider`]) by resolving each resource name to the base URL of the
//! service that owns it and translating every call into one (or, for the
//! batched variants, several) HTTP requests.
//!
//! # Architecture
//!
//! - [`config`] - Resource name to base URL mapping
//! - [`params`] - Typed parameters for every operation
//! - [`query`] - Pagination/filter/sort query construction
//! - [`response`] - Wire documents, flat records and result envelopes
//!
//! # Request mapping
//!
//! ```text
//! get_list           => GET    base?page[number]=1&page[size]=10&filter[k]=v&sort=-title
//! get_one            => GET    base/123
//! get_many           => GET    base?filter[id]=in:123,456,789
//! get_many_reference => GET    base?page[number]=1&page[size]=10&filter[postId]=7
//! update             => PATCH  base/123
//! update_many        => PATCH  base/123, PATCH base/456, ...
//! create             => POST   base
//! delete             => DELETE base/123
//! delete_many        => DELETE base/123, DELETE base/456, ...
//! ```
//!
//! # Example
//!
//! ```ignore
//! use microservices_jsonapi::{DataProvider, GetListParams, MicroServiceConfig, MicroServicesProvider, SortOrder};
//!
//! async fn example() -> microservices_jsonapi::Result<()> {
//!     let config = MicroServiceConfig::new([("posts", "http://posts.api.local")])?;
//!     let provider = MicroServicesProvider::with_default_client(config)?;
//!     let page = provider
//!         .get_list("posts", GetListParams::new(1, 25).sort("title", SortOrder::Asc))
//!         .await?;
//!     println!("{} of {}", page.data.len(), page.total);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod params;
pub mod query;
pub mod response;

pub use config::{MicroServiceConfig, UpdateManyBody};
pub use params::{
    CreateParams, DeleteManyParams, DeleteParams, Filter, GetListParams, GetManyParams,
    GetManyReferenceParams, GetOneParams, Pagination, Sort, SortOrder, UpdateManyParams,
    UpdateParams,
};
pub use response::{
    DeleteResult, DeletedRecord, Id, IdsResult, ListResult, OneResult, Record, ResourceObject,
};

use crate::error::Result;
use crate::http::{FetchOptions, HttpClient, ReqwestClient};
use async_trait::async_trait;
use futures::future::join_all;
use response::{decode, CollectionDocument, IdDocument, OutgoingDocument, OutgoingResource, SingleDocument};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Generic CRUD interface over named resources
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// One page of records matching the filter
    async fn get_list(&self, resource: &str, params: GetListParams) -> Result<ListResult>;

    async fn get_one(&self, resource: &str, params: GetOneParams) -> Result<OneResult>;

    /// Records whose id is in `params.ids`
    async fn get_many(&self, resource: &str, params: GetManyParams) -> Result<ListResult>;

    /// One page of records referencing another record through `params.target`
    async fn get_many_reference(
        &self,
        resource: &str,
        params: GetManyReferenceParams,
    ) -> Result<ListResult>;

    async fn update(&self, resource: &str, params: UpdateParams) -> Result<OneResult>;

    /// Apply the same partial update to every id; fails if any request fails
    async fn update_many(&self, resource: &str, params: UpdateManyParams) -> Result<IdsResult>;

    async fn create(&self, resource: &str, params: CreateParams) -> Result<OneResult>;

    async fn delete(&self, resource: &str, params: DeleteParams) -> Result<DeleteResult>;

    /// Delete every id; fails if any request fails
    async fn delete_many(&self, resource: &str, params: DeleteManyParams) -> Result<IdsResult>;
}

/// [`DataProvider`] backed by one JSON:API service per resource
#[derive(Debug, Clone)]
pub struct MicroServicesProvider<C = ReqwestClient> {
    config: Arc<MicroServiceConfig>,
    client: C,
    update_many_body: UpdateManyBody,
}

impl MicroServicesProvider<ReqwestClient> {
    /// Provider using the default JSON client
    pub fn with_default_client(config: impl Into<Arc<MicroServiceConfig>>) -> Result<Self> {
        Ok(Self::new(config, ReqwestClient::new()?))
    }
}

impl<C: HttpClient> MicroServicesProvider<C> {
    pub fn new(config: impl Into<Arc<MicroServiceConfig>>, client: C) -> Self {
        Self {
            config: config.into(),
            client,
            update_many_body: UpdateManyBody::default(),
        }
    }

    /// Choose the body shape for `update_many` sub-requests
    pub fn with_update_many_body(mut self, body: UpdateManyBody) -> Self {
        self.update_many_body = body;
        self
    }

    pub fn config(&self) -> &MicroServiceConfig {
        &self.config
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    fn item_url(&self, resource: &str, id: &Id) -> Result<String> {
        let base = self.config.base_url(resource)?;
        Ok(format!("{}/{}", base, urlencoding::encode(&id.to_string())))
    }

    async fn fetch_list(&self, url: &str) -> Result<ListResult> {
        let response = self.client.fetch(url, FetchOptions::get()).await?;
        let document: CollectionDocument = decode(response.json, "collection response")?;
        Ok(document.into_list())
    }

    async fn fetch_one(&self, url: &str, options: FetchOptions) -> Result<OneResult> {
        let response = self.client.fetch(url, options).await?;
        let document: SingleDocument = decode(response.json, "record response")?;
        Ok(OneResult {
            data: document.data.flatten(),
        })
    }

    async fn fetch_id(&self, url: &str, options: FetchOptions) -> Result<Id> {
        let response = self.client.fetch(url, options).await?;
        let document: IdDocument = decode(response.json, "record response")?;
        Ok(document.data.id)
    }

    /// Send every request at once and wait for all of them to settle.
    /// The first failure in request order is returned; nothing is undone.
    async fn fan_out(&self, requests: Vec<(String, FetchOptions)>) -> Result<Vec<Id>> {
        let total = requests.len();
        let results = join_all(
            requests
                .into_iter()
                .map(|(url, options)| async move { self.fetch_id(&url, options).await }),
        )
        .await;

        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            tracing::debug!("{} of {} batched requests failed", failed, total);
        }

        results.into_iter().collect()
    }
}

fn envelope(resource: &str, id: Option<&Id>, attributes: &Map<String, Value>) -> Result<String> {
    let document = OutgoingDocument {
        data: OutgoingResource {
            id,
            kind: resource,
            attributes,
        },
    };
    Ok(serde_json::to_string(&document)?)
}

#[async_trait]
impl<C: HttpClient> DataProvider for MicroServicesProvider<C> {
    async fn get_list(&self, resource: &str, params: GetListParams) -> Result<ListResult> {
        let base = self.config.base_url(resource)?;
        let query = query::list_query(&params.pagination, &params.filter, params.sort.as_ref());
        self.fetch_list(&query.to_url(base)).await
    }

    async fn get_one(&self, resource: &str, params: GetOneParams) -> Result<OneResult> {
        let url = self.item_url(resource, &params.id)?;
        self.fetch_one(&url, FetchOptions::get()).await
    }

    async fn get_many(&self, resource: &str, params: GetManyParams) -> Result<ListResult> {
        let base = self.config.base_url(resource)?;
        let query = query::ids_query(&params.ids);
        self.fetch_list(&query.to_url(base)).await
    }

    async fn get_many_reference(
        &self,
        resource: &str,
        params: GetManyReferenceParams,
    ) -> Result<ListResult> {
        let base = self.config.base_url(resource)?;
        let query = query::reference_query(
            &params.target,
            &params.id,
            &params.pagination,
            &params.filter,
            params.sort.as_ref(),
        );
        self.fetch_list(&query.to_url(base)).await
    }

    async fn update(&self, resource: &str, params: UpdateParams) -> Result<OneResult> {
        let url = self.item_url(resource, &params.id)?;
        let body = envelope(resource, Some(&params.id), &params.data)?;
        self.fetch_one(&url, FetchOptions::patch(body)).await
    }

    async fn update_many(&self, resource: &str, params: UpdateManyParams) -> Result<IdsResult> {
        let mut requests = Vec::with_capacity(params.ids.len());
        for id in &params.ids {
            let body = match self.update_many_body {
                UpdateManyBody::Envelope => envelope(resource, Some(id), &params.data)?,
                UpdateManyBody::Raw => serde_json::to_string(&params.data)?,
            };
            requests.push((self.item_url(resource, id)?, FetchOptions::patch(body)));
        }

        tracing::debug!("PATCH {} x{}", resource, requests.len());
        Ok(IdsResult {
            data: self.fan_out(requests).await?,
        })
    }

    async fn create(&self, resource: &str, params: CreateParams) -> Result<OneResult> {
        let base = self.config.base_url(resource)?;
        let body = envelope(resource, None, &params.data)?;
        self.fetch_one(base, FetchOptions::post(body)).await
    }

    async fn delete(&self, resource: &str, params: DeleteParams) -> Result<DeleteResult> {
        let url = self.item_url(resource, &params.id)?;
        let id = self.fetch_id(&url, FetchOptions::delete()).await?;
        Ok(DeleteResult {
            data: DeletedRecord { id },
        })
    }

    async fn delete_many(&self, resource: &str, params: DeleteManyParams) -> Result<IdsResult> {
        let requests = params
            .ids
            .iter()
            .map(|id| Ok((self.item_url(resource, id)?, FetchOptions::delete())))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!("DELETE {} x{}", resource, requests.len());
        Ok(IdsResult {
            data: self.fan_out(requests).await?,
        })
    }
}
