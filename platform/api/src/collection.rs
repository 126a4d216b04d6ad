use std::{marker::PhantomData, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, Method, Response};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, instrument};
use url::Url;

use crate::{ApiError, ApiResult, RecordStore};

/// Where a collection lives and how to reach it.
#[derive(Clone, Debug)]
pub struct CollectionConfig {
    pub base_url: Url,
    pub collection: String,
    pub timeout: Option<Duration>,
}

impl CollectionConfig {
    pub fn new(base_url: Url, collection: impl Into<String>) -> Self {
        Self {
            base_url,
            collection: collection.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// JSON-over-HTTP client for a single record collection.
pub struct RestCollection<R> {
    client: Client,
    base_url: Url,
    collection: String,
    _record: PhantomData<fn() -> R>,
}

impl<R> RestCollection<R> {
    pub fn from_config(config: &CollectionConfig) -> ApiResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|source| ApiError::Transport {
            url: config.base_url.to_string(),
            source,
        })?;
        Self::with_client(client, config.base_url.clone(), config.collection.clone())
    }

    pub fn with_client(client: Client, base_url: Url, collection: String) -> ApiResult<Self> {
        if base_url.cannot_be_a_base() || collection.trim().is_empty() {
            return Err(ApiError::InvalidUrl(format!("{base_url} / {collection:?}")));
        }
        Ok(Self {
            client,
            base_url,
            collection,
            _record: PhantomData,
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// `<base>/<collection>` or `<base>/<collection>/<id>`, ids percent-encoded.
    pub fn endpoint(&self, id: Option<&str>) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?;
            segments.pop_if_empty().push(&self.collection);
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    async fn execute<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> ApiResult<Response> {
        let mut request = self.client.request(method.clone(), url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                method,
                url: url.to_string(),
                status,
            });
        }
        debug!(%method, %url, %status, "record store responded");
        Ok(response)
    }
}

#[async_trait]
impl<R> RecordStore<R> for RestCollection<R>
where
    R: Serialize + DeserializeOwned + Send + Sync,
{
    #[instrument(name = "records.list", skip_all, fields(collection = %self.collection))]
    async fn list(&self) -> ApiResult<Vec<R>> {
        let url = self.endpoint(None)?;
        let response = self
            .execute::<()>(Method::GET, url.clone(), None)
            .await?;
        response.json::<Vec<R>>().await.map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })
    }

    #[instrument(name = "records.create", skip_all, fields(collection = %self.collection))]
    async fn create(&self, record: &R) -> ApiResult<()> {
        let url = self.endpoint(None)?;
        self.execute(Method::POST, url, Some(record)).await?;
        Ok(())
    }

    #[instrument(name = "records.update", skip(self, record), fields(collection = %self.collection))]
    async fn update(&self, id: &str, record: &R) -> ApiResult<()> {
        let url = self.endpoint(Some(id))?;
        self.execute(Method::PUT, url, Some(record)).await?;
        Ok(())
    }

    #[instrument(name = "records.delete", skip(self), fields(collection = %self.collection))]
    async fn delete(&self, id: &str) -> ApiResult<()> {
        let url = self.endpoint(Some(id))?;
        self.execute::<()>(Method::DELETE, url, None).await?;
        Ok(())
    }
}
