use std::collections::HashMap;

use crate::domain::catalog::{CatalogFilter, Page, Product, ProductDraft};
use crate::domain::errors::DomainError;
use crate::domain::ports::CatalogApi;
use crate::domain::session::{Role, Session};

pub const DEFAULT_PAGE_SIZE: i64 = 12;

pub struct CatalogService<C> {
    catalog: C,
}

impl<C: CatalogApi> CatalogService<C> {
    pub fn new(catalog: C) -> Self {
        Self { catalog }
    }

    /// One backend page, narrowed and sorted locally by `filter`.
    pub async fn browse(
        &self,
        page: i64,
        size: i64,
        filter: &CatalogFilter,
    ) -> Result<Page<Product>, DomainError> {
        let mut listing = self.catalog.list_products(page.max(0), size.max(1)).await?;
        listing.items = filter.apply(&listing.items);
        Ok(listing)
    }

    /// Blank keywords list the first page instead of hitting search.
    pub async fn search(
        &self,
        keyword: &str,
        filter: &CatalogFilter,
    ) -> Result<Vec<Product>, DomainError> {
        let keyword = keyword.trim();
        let products = if keyword.is_empty() {
            self.catalog.list_products(0, DEFAULT_PAGE_SIZE).await?.items
        } else {
            self.catalog
                .search_products(keyword, 0, DEFAULT_PAGE_SIZE)
                .await?
        };
        Ok(filter.apply(&products))
    }

    pub async fn product(&self, id: &str) -> Result<Product, DomainError> {
        self.catalog.get_product(id).await.map_err(|e| {
            if e.is_not_found() {
                DomainError::NotFound
            } else {
                e.into()
            }
        })
    }

    pub async fn by_category(&self, category: &str) -> Result<Vec<Product>, DomainError> {
        Ok(self.catalog.products_by_category(category).await?)
    }

    pub async fn by_vendor(&self, vendor_id: &str) -> Result<Vec<Product>, DomainError> {
        Ok(self.catalog.products_by_vendor(vendor_id).await?)
    }

    /// Fetches each id not yet in `known`. Products that cannot be loaded are
    /// skipped; their cart lines keep the fallback display.
    pub async fn load_missing(&self, known: &mut HashMap<String, Product>, ids: &[String]) {
        for id in ids {
            if known.contains_key(id) {
                continue;
            }
            match self.catalog.get_product(id).await {
                Ok(product) => {
                    known.insert(id.clone(), product);
                }
                Err(e) => log::warn!("Could not load product {}: {}", id, e),
            }
        }
    }

    // ── Vendor operations ────────────────────────────────────────────────────

    pub async fn create(
        &self,
        session: &Session,
        draft: &ProductDraft,
    ) -> Result<Product, DomainError> {
        session.require_role(&[Role::Vendor, Role::Admin])?;
        let product = self.catalog.create_product(draft).await?;
        log::info!("Product {} created by {}", product.id, session.user_id());
        Ok(product)
    }

    pub async fn update(
        &self,
        session: &Session,
        id: &str,
        draft: &ProductDraft,
    ) -> Result<Product, DomainError> {
        session.require_role(&[Role::Vendor, Role::Admin])?;
        Ok(self.catalog.update_product(id, draft).await?)
    }

    pub async fn delete(&self, session: &Session, id: &str) -> Result<(), DomainError> {
        session.require_role(&[Role::Vendor, Role::Admin])?;
        self.catalog.delete_product(id).await?;
        log::info!("Product {} deleted by {}", id, session.user_id());
        Ok(())
    }

    pub async fn set_stock(
        &self,
        session: &Session,
        id: &str,
        quantity: i32,
    ) -> Result<Product, DomainError> {
        session.require_role(&[Role::Vendor, Role::Admin])?;
        if quantity < 0 {
            return Err(DomainError::InvalidInput(
                "stock cannot be negative".to_string(),
            ));
        }
        Ok(self.catalog.update_stock(id, quantity).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{sample_product, SortKey};
    use crate::domain::errors::RemoteError;
    use crate::domain::money;
    use crate::domain::ports::MockCatalogApi;
    use crate::domain::session::sample_profile;

    #[tokio::test]
    async fn browse_applies_local_filter() {
        let mut api = MockCatalogApi::new();
        api.expect_list_products().times(1).returning(|page, size| {
            Ok(Page {
                items: vec![
                    sample_product("a", "Cheap", "2"),
                    sample_product("b", "Dear", "200"),
                ],
                total: 2,
                page,
                size,
            })
        });
        let service = CatalogService::new(api);
        let filter = CatalogFilter {
            max_price: money::parse_amount("50"),
            sort: SortKey::PriceAsc,
            ..Default::default()
        };

        let page = service.browse(0, 12, &filter).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn blank_search_lists_instead() {
        let mut api = MockCatalogApi::new();
        api.expect_search_products().never();
        api.expect_list_products().returning(|page, size| {
            Ok(Page {
                items: vec![sample_product("a", "A", "1")],
                total: 1,
                page,
                size,
            })
        });
        let service = CatalogService::new(api);

        let found = service.search("   ", &CatalogFilter::default()).await.unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn load_missing_skips_known_and_failures() {
        let mut api = MockCatalogApi::new();
        api.expect_get_product().times(2).returning(|id| {
            if id == "ok" {
                Ok(sample_product("ok", "Found", "3"))
            } else {
                Err(RemoteError::Status {
                    status: 404,
                    message: None,
                })
            }
        });
        let service = CatalogService::new(api);
        let mut known = HashMap::new();
        known.insert("have".to_string(), sample_product("have", "Have", "1"));

        service
            .load_missing(
                &mut known,
                &["have".to_string(), "ok".to_string(), "gone".to_string()],
            )
            .await;

        assert!(known.contains_key("ok"));
        assert!(!known.contains_key("gone"));
    }

    #[tokio::test]
    async fn clients_cannot_change_stock() {
        let mut api = MockCatalogApi::new();
        api.expect_update_stock().never();
        let service = CatalogService::new(api);
        let session = Session::new(sample_profile("u1", Role::Client));

        assert!(service.set_stock(&session, "p1", 3).await.is_err());
    }

    #[tokio::test]
    async fn vendors_can_restock() {
        let mut api = MockCatalogApi::new();
        api.expect_update_stock()
            .times(1)
            .returning(|id, quantity| {
                let mut product = sample_product(id, "Widget", "1");
                product.stock = quantity;
                Ok(product)
            });
        let service = CatalogService::new(api);
        let session = Session::new(sample_profile("v1", Role::Vendor));

        let product = service.set_stock(&session, "p1", 7).await.unwrap();
        assert_eq!(product.stock, 7);
        assert!(service.set_stock(&session, "p1", -1).await.is_err());
    }

    fn draft(vendor_id: &str, title: &str) -> ProductDraft {
        ProductDraft {
            vendor_id: vendor_id.to_string(),
            title: title.to_string(),
            description: Some("Recharge USB".to_string()),
            price: money::parse_amount("24.90").unwrap(),
            category: Some("Maison".to_string()),
            brand: None,
            currency: "USD".to_string(),
            image: None,
            stock: 5,
        }
    }

    #[tokio::test]
    async fn vendors_create_and_update_products() {
        let mut api = MockCatalogApi::new();
        api.expect_create_product()
            .times(1)
            .withf(|d| d.vendor_id == "v1" && d.title == "Lampe")
            .returning(|d| Ok(sample_product("new", &d.title, "24.90")));
        api.expect_update_product()
            .times(1)
            .withf(|id, d| id == "new" && d.title == "Lampe XL")
            .returning(|id, d| Ok(sample_product(id, &d.title, "24.90")));
        let service = CatalogService::new(api);
        let session = Session::new(sample_profile("v1", Role::Vendor));

        let created = service.create(&session, &draft("v1", "Lampe")).await.unwrap();
        assert_eq!(created.id, "new");
        let updated = service
            .update(&session, "new", &draft("v1", "Lampe XL"))
            .await
            .unwrap();
        assert_eq!(updated.title, "Lampe XL");
    }

    #[tokio::test]
    async fn clients_cannot_create_or_update_products() {
        let mut api = MockCatalogApi::new();
        api.expect_create_product().never();
        api.expect_update_product().never();
        let service = CatalogService::new(api);
        let session = Session::new(sample_profile("u1", Role::Client));

        let err = service.create(&session, &draft("u1", "Lampe")).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
        assert!(service
            .update(&session, "p1", &draft("u1", "Lampe"))
            .await
            .is_err());
    }
}
