use async_trait::async_trait;
use mockall::automock;

use super::cart::{Cart, CartLine};
use super::catalog::{Page, Product, ProductDraft};
use super::errors::{DomainError, RemoteError};
use super::order::{Order, OrderDraft, OrderStats, OrderStatusUpdate};
use super::payment::{PaymentRecord, PaymentRequest, ProviderResponse};
use super::session::{Registration, Role, UserProfile};

/// Remote cart kept by the cart service. Every call returns the cart as the
/// server now sees it.
#[automock]
#[async_trait]
pub trait CartApi: Send + Sync {
    async fn get_cart(&self, user_id: &str) -> Result<Vec<CartLine>, RemoteError>;
    async fn add_item(
        &self,
        user_id: &str,
        product_id: &str,
        quantity: u32,
    ) -> Result<Vec<CartLine>, RemoteError>;
    async fn update_quantity(
        &self,
        user_id: &str,
        product_id: &str,
        quantity: u32,
    ) -> Result<Vec<CartLine>, RemoteError>;
    async fn remove_item(&self, user_id: &str, product_id: &str)
        -> Result<Vec<CartLine>, RemoteError>;
    async fn clear_cart(&self, user_id: &str) -> Result<(), RemoteError>;
}

#[automock]
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn list_products(&self, page: i64, size: i64) -> Result<Page<Product>, RemoteError>;
    async fn get_product(&self, id: &str) -> Result<Product, RemoteError>;
    async fn search_products(
        &self,
        keyword: &str,
        page: i64,
        size: i64,
    ) -> Result<Vec<Product>, RemoteError>;
    async fn products_by_category(&self, category: &str) -> Result<Vec<Product>, RemoteError>;
    async fn products_by_vendor(&self, vendor_id: &str) -> Result<Vec<Product>, RemoteError>;
    async fn create_product(&self, draft: &ProductDraft) -> Result<Product, RemoteError>;
    async fn update_product(&self, id: &str, draft: &ProductDraft)
        -> Result<Product, RemoteError>;
    async fn delete_product(&self, id: &str) -> Result<(), RemoteError>;
    async fn update_stock(&self, id: &str, quantity: i32) -> Result<Product, RemoteError>;
}

#[automock]
#[async_trait]
pub trait OrderApi: Send + Sync {
    async fn create_order(&self, draft: &OrderDraft) -> Result<Order, RemoteError>;
    async fn get_order(&self, id: &str) -> Result<Order, RemoteError>;
    async fn list_orders(&self) -> Result<Vec<Order>, RemoteError>;
    async fn orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, RemoteError>;
    async fn update_status(
        &self,
        id: &str,
        update: &OrderStatusUpdate,
    ) -> Result<Order, RemoteError>;
    async fn cancel_order(&self, id: &str) -> Result<Order, RemoteError>;
    async fn order_stats(&self) -> Result<OrderStats, RemoteError>;
}

#[automock]
#[async_trait]
pub trait PaymentApi: Send + Sync {
    async fn create_payment(&self, request: &PaymentRequest)
        -> Result<PaymentRecord, RemoteError>;
    async fn confirm_payment(
        &self,
        payment_id: &str,
        ack: &ProviderResponse,
    ) -> Result<PaymentRecord, RemoteError>;
    async fn fail_payment(&self, payment_id: &str, reason: &str)
        -> Result<PaymentRecord, RemoteError>;
    async fn get_payment(&self, payment_id: &str) -> Result<PaymentRecord, RemoteError>;
    async fn payments_for_order(&self, order_id: &str) -> Result<Vec<PaymentRecord>, RemoteError>;
    async fn is_order_paid(&self, order_id: &str) -> Result<bool, RemoteError>;
}

/// Response of `POST /users/register`.
#[derive(Debug, Clone)]
pub struct RegisteredUser {
    pub token: Option<String>,
    pub profile: UserProfile,
}

#[automock]
#[async_trait]
pub trait UserApi: Send + Sync {
    async fn register(&self, registration: &Registration) -> Result<RegisteredUser, RemoteError>;
    async fn verify_token(&self, token: &str) -> Result<UserProfile, RemoteError>;
    async fn list_users(&self) -> Result<Vec<UserProfile>, RemoteError>;
    async fn get_user(&self, id: &str) -> Result<UserProfile, RemoteError>;
    async fn users_by_role(&self, role: Role) -> Result<Vec<UserProfile>, RemoteError>;
    async fn update_role(&self, id: &str, role: Role) -> Result<UserProfile, RemoteError>;
    async fn delete_user(&self, id: &str) -> Result<(), RemoteError>;
}

/// Device-local mirror of a user's cart.
#[automock]
pub trait LocalStore: Send + Sync {
    fn load_cart(&self, user_id: &str) -> Result<Option<Cart>, DomainError>;
    fn save_cart(&self, user_id: &str, cart: &Cart) -> Result<(), DomainError>;
    fn remove_cart(&self, user_id: &str) -> Result<(), DomainError>;
}

/// Where the bearer token lives between runs.
#[automock]
pub trait TokenStore: Send + Sync {
    fn token(&self) -> Result<Option<String>, DomainError>;
    fn set_token(&self, token: &str) -> Result<(), DomainError>;
    fn clear_token(&self) -> Result<(), DomainError>;
}
