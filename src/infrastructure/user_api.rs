use async_trait::async_trait;
use reqwest::Method;

use crate::domain::errors::RemoteError;
use crate::domain::ports::{RegisteredUser, UserApi};
use crate::domain::session::{Registration, Role, UserProfile};

use super::http::ApiClient;
use super::models::{RegisterResponseDto, RoleBody};

#[async_trait]
impl UserApi for ApiClient {
    async fn register(&self, registration: &Registration) -> Result<RegisteredUser, RemoteError> {
        let body: RegisterResponseDto = self
            .send_json(
                Method::POST,
                self.endpoint(&["users", "register"]),
                registration,
            )
            .await?;
        let (token, profile) = body.into_parts();
        Ok(RegisteredUser { token, profile })
    }

    /// The token under test goes in the header, whatever is stored.
    async fn verify_token(&self, token: &str) -> Result<UserProfile, RemoteError> {
        let builder = self
            .request_with_token(
                Method::POST,
                self.endpoint(&["users", "verify-token"]),
                Some(token),
            )
            .json(&serde_json::json!({}));
        let response = self.execute(builder).await?;
        Ok(response.json().await?)
    }

    async fn list_users(&self) -> Result<Vec<UserProfile>, RemoteError> {
        self.get_json(self.endpoint(&["users"])).await
    }

    async fn get_user(&self, id: &str) -> Result<UserProfile, RemoteError> {
        self.get_json(self.endpoint(&["users", id])).await
    }

    async fn users_by_role(&self, role: Role) -> Result<Vec<UserProfile>, RemoteError> {
        self.get_json(self.endpoint(&["users", "role", role.code()]))
            .await
    }

    async fn update_role(&self, id: &str, role: Role) -> Result<UserProfile, RemoteError> {
        self.send_json(
            Method::PATCH,
            self.endpoint(&["users", id, "role"]),
            &RoleBody { role },
        )
        .await
    }

    async fn delete_user(&self, id: &str) -> Result<(), RemoteError> {
        self.send_empty(Method::DELETE, self.endpoint(&["users", id]))
            .await
    }
}
