use async_trait::async_trait;
use reqwest::Method;

use crate::domain::catalog::{Page, Product, ProductDraft};
use crate::domain::errors::RemoteError;
use crate::domain::ports::CatalogApi;

use super::http::ApiClient;
use super::models::PageDto;

#[async_trait]
impl CatalogApi for ApiClient {
    async fn list_products(&self, page: i64, size: i64) -> Result<Page<Product>, RemoteError> {
        let mut url = self.endpoint(&["produits"]);
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("size", &size.to_string());
        let body: PageDto<Product> = self.get_json(url).await?;
        Ok(body.into_page(page, size))
    }

    async fn get_product(&self, id: &str) -> Result<Product, RemoteError> {
        self.get_json(self.endpoint(&["produits", id])).await
    }

    async fn search_products(
        &self,
        keyword: &str,
        page: i64,
        size: i64,
    ) -> Result<Vec<Product>, RemoteError> {
        let mut url = self.endpoint(&["produits", "search"]);
        url.query_pairs_mut()
            .append_pair("keyword", keyword)
            .append_pair("page", &page.to_string())
            .append_pair("size", &size.to_string());
        let body: PageDto<Product> = self.get_json(url).await?;
        Ok(body.into_items())
    }

    async fn products_by_category(&self, category: &str) -> Result<Vec<Product>, RemoteError> {
        let body: PageDto<Product> = self
            .get_json(self.endpoint(&["produits", "categorie", category]))
            .await?;
        Ok(body.into_items())
    }

    async fn products_by_vendor(&self, vendor_id: &str) -> Result<Vec<Product>, RemoteError> {
        let body: PageDto<Product> = self
            .get_json(self.endpoint(&["produits", "vendeur", vendor_id]))
            .await?;
        Ok(body.into_items())
    }

    async fn create_product(&self, draft: &ProductDraft) -> Result<Product, RemoteError> {
        self.send_json(Method::POST, self.endpoint(&["produits"]), draft)
            .await
    }

    async fn update_product(
        &self,
        id: &str,
        draft: &ProductDraft,
    ) -> Result<Product, RemoteError> {
        self.send_json(Method::PUT, self.endpoint(&["produits", id]), draft)
            .await
    }

    async fn delete_product(&self, id: &str) -> Result<(), RemoteError> {
        self.send_empty(Method::DELETE, self.endpoint(&["produits", id]))
            .await
    }

    async fn update_stock(&self, id: &str, quantity: i32) -> Result<Product, RemoteError> {
        let mut url = self.endpoint(&["produits", id, "stock"]);
        url.query_pairs_mut()
            .append_pair("quantite", &quantity.to_string());
        let response = self.execute(self.request(Method::PUT, url)).await?;
        Ok(response.json().await?)
    }
}
