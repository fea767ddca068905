//! Types for the offering catalog.

use async_trait::async_trait;
use thiserror::Error;

use crate::offering::Offering;

/// Errors that can occur while fetching the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout")]
    Timeout,

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for CatalogError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CatalogError::Timeout
        } else if e.is_connect() {
            CatalogError::ConnectionFailed(e.to_string())
        } else if e.is_decode() {
            CatalogError::InvalidResponse(e.to_string())
        } else {
            CatalogError::ApiError(e.to_string())
        }
    }
}

/// Source of the current offering list.
#[async_trait]
pub trait OfferingCatalog: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Fetch every listed offering, ordered by display priority.
    async fn fetch(&self) -> Result<Vec<Offering>, CatalogError>;
}
