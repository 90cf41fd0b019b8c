use async_trait::async_trait;
use reqwest::Method;

use crate::domain::cart::CartLine;
use crate::domain::errors::RemoteError;
use crate::domain::ports::CartApi;

use super::http::ApiClient;
use super::models::{AddToCartBody, CartDto, UpdateQuantityBody};

#[async_trait]
impl CartApi for ApiClient {
    async fn get_cart(&self, user_id: &str) -> Result<Vec<CartLine>, RemoteError> {
        let cart: CartDto = self.get_json(self.endpoint(&["carte", user_id])).await?;
        Ok(cart.into_lines())
    }

    async fn add_item(
        &self,
        user_id: &str,
        product_id: &str,
        quantity: u32,
    ) -> Result<Vec<CartLine>, RemoteError> {
        let body = AddToCartBody {
            product_id,
            quantity,
        };
        let cart: CartDto = self
            .send_json(Method::POST, self.endpoint(&["carte", user_id, "items"]), &body)
            .await?;
        Ok(cart.into_lines())
    }

    async fn update_quantity(
        &self,
        user_id: &str,
        product_id: &str,
        quantity: u32,
    ) -> Result<Vec<CartLine>, RemoteError> {
        let cart: CartDto = self
            .send_json(
                Method::PATCH,
                self.endpoint(&["carte", user_id, "items", product_id]),
                &UpdateQuantityBody { quantity },
            )
            .await?;
        Ok(cart.into_lines())
    }

    async fn remove_item(
        &self,
        user_id: &str,
        product_id: &str,
    ) -> Result<Vec<CartLine>, RemoteError> {
        let url = self.endpoint(&["carte", user_id, "items", product_id]);
        let response = self.execute(self.request(Method::DELETE, url)).await?;
        let cart: CartDto = response.json().await?;
        Ok(cart.into_lines())
    }

    async fn clear_cart(&self, user_id: &str) -> Result<(), RemoteError> {
        self.send_empty(Method::DELETE, self.endpoint(&["carte", user_id]))
            .await
    }
}
