//! Client plumbing for REST-style record collections.
//!
//! A record collection is addressed as `<base>/<collection>` and supports
//! list, create, update-by-id and delete-by-id. Products talk to it through
//! [`RecordStore`] so they can be exercised without a live service.

mod collection;

use async_trait::async_trait;
use thiserror::Error;

pub use collection::{CollectionConfig, RestCollection};
pub use reqwest::{Method, StatusCode};

/// Shared client result type.
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid collection url: {0}")]
    InvalidUrl(String),
    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{method} {url} returned {status}")]
    Status {
        method: Method,
        url: String,
        status: StatusCode,
    },
    #[error("failed to decode response from {url}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidUrl(_) => "INVALID_URL",
            ApiError::Transport { .. } => "TRANSPORT",
            ApiError::Status { .. } => "STATUS",
            ApiError::Decode { .. } => "DECODE",
        }
    }

    /// HTTP status of the failed call, when the service answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Remote collection of records keyed by a caller-supplied identifier.
#[async_trait]
pub trait RecordStore<R>: Send + Sync
where
    R: Send + Sync,
{
    /// Fetch every record in collection order.
    async fn list(&self) -> ApiResult<Vec<R>>;

    async fn create(&self, record: &R) -> ApiResult<()>;

    /// Replace the record stored under `id` with `record`.
    async fn update(&self, id: &str, record: &R) -> ApiResult<()>;

    async fn delete(&self, id: &str) -> ApiResult<()>;
}
