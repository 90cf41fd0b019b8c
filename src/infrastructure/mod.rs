pub mod cart_api;
pub mod catalog_api;
pub mod http;
pub mod local_store;
pub mod models;
pub mod order_api;
pub mod payment_api;
pub mod user_api;

pub use http::ApiClient;
pub use local_store::DieselLocalStore;
