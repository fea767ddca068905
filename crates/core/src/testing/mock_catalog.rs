//! Mock offering catalog for testing.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::catalog::{CatalogError, OfferingCatalog};
use crate::offering::Offering;

/// Mock implementation of the OfferingCatalog trait.
///
/// Returns whatever offerings were configured, counts fetches, and can be
/// told to fail the next fetch.
#[derive(Debug, Default)]
pub struct MockCatalog {
    offerings: Arc<RwLock<Vec<Offering>>>,
    next_error: Arc<RwLock<Option<CatalogError>>>,
    fetches: Arc<RwLock<u32>>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog that lists `offerings`.
    pub fn with_offerings(offerings: Vec<Offering>) -> Self {
        Self {
            offerings: Arc::new(RwLock::new(offerings)),
            ..Self::default()
        }
    }

    pub async fn set_offerings(&self, offerings: Vec<Offering>) {
        *self.offerings.write().await = offerings;
    }

    /// Configure the next fetch to fail with the given error.
    pub async fn set_next_error(&self, error: CatalogError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn fetch_count(&self) -> u32 {
        *self.fetches.read().await
    }
}

#[async_trait]
impl OfferingCatalog for MockCatalog {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self) -> Result<Vec<Offering>, CatalogError> {
        *self.fetches.write().await += 1;
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        Ok(self.offerings.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_next_error_applies_once() {
        let catalog = MockCatalog::with_offerings(vec![fixtures::offering("1", "Alpha Corp")]);
        catalog.set_next_error(CatalogError::Timeout).await;

        assert!(catalog.fetch().await.is_err());
        assert_eq!(catalog.fetch().await.unwrap().len(), 1);
        assert_eq!(catalog.fetch_count().await, 2);
    }
}
