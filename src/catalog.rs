//! Catalog reader with a static fallback for degraded mode.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::errors::StoreError;
use crate::models::{Catalog, CatalogOrigin};
use crate::seed::{default_categories, default_products};
use crate::store::CatalogStore;

#[derive(Clone)]
pub struct CatalogReader {
    store: Arc<dyn CatalogStore>,
}

impl CatalogReader {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Current products and categories.
    ///
    /// Never fails: when the store cannot be read the built-in catalog is
    /// returned, tagged [`CatalogOrigin::Fallback`].
    pub async fn snapshot(&self) -> Catalog {
        match self.read_live().await {
            Ok(catalog) => {
                debug!(products = catalog.products.len(), "Catalog read from store");
                catalog
            }
            Err(e) => {
                warn!(error = %e, "Catalog unavailable, serving built-in fallback");
                Catalog {
                    origin: CatalogOrigin::Fallback,
                    products: default_products(),
                    categories: default_categories(),
                }
            }
        }
    }

    async fn read_live(&self) -> Result<Catalog, StoreError> {
        let products = self.store.list_products().await?;
        let categories = self.store.list_categories().await?;
        Ok(Catalog {
            origin: CatalogOrigin::Live,
            products,
            categories,
        })
    }
}
