pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod infrastructure;
pub mod schema;

use std::collections::HashMap;
use std::sync::Arc;

use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

pub use config::ClientConfig;
pub use db::{create_pool, DbPool};
pub use errors::AppError;

use application::cart_service::{CartAggregator, CartSync};
use application::catalog_service::CatalogService;
use domain::catalog::Product;
use domain::order::DeliveryAddress;
use domain::session::Session;
use infrastructure::{ApiClient, DieselLocalStore};

pub type SessionCart = CartAggregator<ApiClient, DieselLocalStore>;

/// A loaded cart plus catalog entries for lines that carry no display
/// fields of their own.
pub struct OpenCart {
    pub carts: SessionCart,
    pub sync: CartSync,
    pub products: HashMap<String, Product>,
}

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), AppError> {
    let mut conn = pool.get()?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| AppError::Internal(format!("Failed to run local migrations: {}", e)))?;
    Ok(())
}

/// Everything a session needs: the gateway client and the device store it
/// reads its token from.
#[derive(Clone)]
pub struct Marketplace {
    pub api: ApiClient,
    pub store: DieselLocalStore,
    pub config: ClientConfig,
}

impl Marketplace {
    /// Opens (and migrates) the local database, then builds the client.
    pub fn connect(config: ClientConfig) -> Result<Self, AppError> {
        let pool = create_pool(&config.local_db)?;
        run_migrations(&pool)?;
        let store = DieselLocalStore::new(pool);
        let api = ApiClient::new(&config.api_url, Arc::new(store.clone()))?;
        log::debug!("Using backend {} and local store {}", api.base_url(), config.local_db);
        Ok(Self { api, store, config })
    }

    pub async fn open_cart(&self, session: &Session) -> OpenCart {
        let mut carts = CartAggregator::new(self.api.clone(), self.store.clone(), session);
        let sync = carts.load().await;
        let mut products: HashMap<String, Product> = HashMap::new();
        let missing = carts.missing_product_ids(&products);
        CatalogService::new(self.api.clone())
            .load_missing(&mut products, &missing)
            .await;
        OpenCart {
            carts,
            sync,
            products,
        }
    }

    /// Checks the delivery address, then opens the cart. Nothing is fetched
    /// for an address that would be rejected.
    pub async fn open_checkout(
        &self,
        session: &Session,
        address: &DeliveryAddress,
    ) -> Result<OpenCart, AppError> {
        address.validate()?;
        Ok(self.open_cart(session).await)
    }
}
