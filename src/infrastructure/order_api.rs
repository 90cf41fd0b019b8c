use async_trait::async_trait;
use reqwest::Method;

use crate::domain::errors::RemoteError;
use crate::domain::order::{Order, OrderDraft, OrderStats, OrderStatusUpdate};
use crate::domain::ports::OrderApi;

use super::http::ApiClient;

#[async_trait]
impl OrderApi for ApiClient {
    async fn create_order(&self, draft: &OrderDraft) -> Result<Order, RemoteError> {
        log::debug!(
            "Creating order for user {} with {} line(s)",
            draft.user_id,
            draft.items.len()
        );
        self.send_json(Method::POST, self.endpoint(&["orders"]), draft)
            .await
    }

    async fn get_order(&self, id: &str) -> Result<Order, RemoteError> {
        self.get_json(self.endpoint(&["orders", id])).await
    }

    async fn list_orders(&self) -> Result<Vec<Order>, RemoteError> {
        self.get_json(self.endpoint(&["orders"])).await
    }

    async fn orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, RemoteError> {
        self.get_json(self.endpoint(&["orders", "user", user_id]))
            .await
    }

    async fn update_status(
        &self,
        id: &str,
        update: &OrderStatusUpdate,
    ) -> Result<Order, RemoteError> {
        self.send_json(Method::PATCH, self.endpoint(&["orders", id, "status"]), update)
            .await
    }

    async fn cancel_order(&self, id: &str) -> Result<Order, RemoteError> {
        let url = self.endpoint(&["orders", id, "cancel"]);
        let response = self.execute(self.request(Method::PATCH, url)).await?;
        Ok(response.json().await?)
    }

    async fn order_stats(&self) -> Result<OrderStats, RemoteError> {
        self.get_json(self.endpoint(&["orders", "stats"])).await
    }
}
