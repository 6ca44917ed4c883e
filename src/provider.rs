//! Resource provider seam between the aggregator and the data source

use crate::data::ResourceKind;
use crate::error::{ProviderError, Result};
use crate::identifier::RepositoryIdentifier;
use async_trait::async_trait;

/// HTTP status signalling that upstream statistics are still being computed
pub const STATUS_ACCEPTED: u16 = 202;
/// HTTP status for a successful response without a body
pub const STATUS_NO_CONTENT: u16 = 204;

/// Successful (2xx) raw response for one resource kind
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl RawResponse {
    pub fn ok(body: serde_json::Value) -> Self {
        Self { status: 200, body }
    }

    pub fn with_status(status: u16, body: serde_json::Value) -> Self {
        Self { status, body }
    }
}

/// Outcome of a single provider fetch
pub type FetchResult = std::result::Result<RawResponse, ProviderError>;

/// Source of raw repository data, one resource kind at a time.
///
/// Implementations must be safe to call concurrently for different kinds of
/// the same repository.
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Work that must succeed before any fetch is issued.
    ///
    /// An error here aborts the whole analysis.
    async fn prepare(&self, _id: &RepositoryIdentifier) -> Result<()> {
        Ok(())
    }

    /// Fetch the raw data for one resource kind
    async fn fetch(&self, id: &RepositoryIdentifier, kind: ResourceKind) -> FetchResult;
}
