use bigdecimal::BigDecimal;
use chrono::Utc;

use crate::domain::cart::{Cart, CartLine, CartLineView};
use crate::domain::catalog::{CatalogLookup, Product};
use crate::domain::errors::{DomainError, RemoteError};
use crate::domain::ports::{CartApi, LocalStore};
use crate::domain::session::Session;

/// Where the state after a cart operation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartSync {
    /// The cart service accepted the change and its answer was adopted.
    Remote,
    /// The cart service was unreachable or refused; the change lives in the
    /// local mirror only.
    Local,
}

/// Client-side cart for one session.
///
/// Every mutation goes to the cart service first. When that fails the same
/// mutation is applied in memory and mirrored to device storage under
/// `cart-{user_id}`. The next successful remote read replaces whatever was
/// done locally.
pub struct CartAggregator<C, S> {
    remote: C,
    local: S,
    user_id: String,
    cart: Cart,
}

impl<C: CartApi, S: LocalStore> CartAggregator<C, S> {
    pub fn new(remote: C, local: S, session: &Session) -> Self {
        Self {
            remote,
            local,
            user_id: session.user_id().to_string(),
            cart: Cart::new(),
        }
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub async fn load(&mut self) -> CartSync {
        match self.remote.get_cart(&self.user_id).await {
            Ok(lines) => {
                self.cart.adopt_remote(lines);
                CartSync::Remote
            }
            Err(e) => {
                log::warn!(
                    "Cart service unavailable for user {}, reading local cart: {}",
                    self.user_id,
                    e
                );
                match self.local.load_cart(&self.user_id) {
                    Ok(Some(cart)) => self.cart = cart,
                    Ok(None) => {}
                    Err(e) => log::error!("Failed to read local cart: {}", e),
                }
                CartSync::Local
            }
        }
    }

    /// Adds `quantity` units of `product`. A zero quantity is rejected.
    pub async fn add(&mut self, product: &Product, quantity: u32) -> Result<CartSync, DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidInput(
                "quantity must be at least 1".to_string(),
            ));
        }
        let result = self
            .remote
            .add_item(&self.user_id, &product.id, quantity)
            .await;
        let sync = self.settle("add", result, |cart| cart.add(product, quantity, Utc::now()));
        self.cart.capture_details(product);
        Ok(sync)
    }

    /// Quantities below one remove the line.
    pub async fn set_quantity(&mut self, product_id: &str, quantity: i64) -> CartSync {
        let Some(quantity) = u32::try_from(quantity).ok().filter(|q| *q > 0) else {
            return self.remove(product_id).await;
        };
        let result = self
            .remote
            .update_quantity(&self.user_id, product_id, quantity)
            .await;
        self.settle("update", result, |cart| {
            cart.set_quantity(product_id, i64::from(quantity), Utc::now())
        })
    }

    pub async fn remove(&mut self, product_id: &str) -> CartSync {
        let result = self.remote.remove_item(&self.user_id, product_id).await;
        self.settle("remove", result, |cart| cart.remove(product_id))
    }

    /// Always leaves an empty cart and no local mirror, whatever the cart
    /// service answers.
    pub async fn clear(&mut self) -> CartSync {
        let sync = match self.remote.clear_cart(&self.user_id).await {
            Ok(()) => CartSync::Remote,
            Err(e) => {
                log::warn!("Cart service could not clear cart for {}: {}", self.user_id, e);
                CartSync::Local
            }
        };
        self.cart.clear();
        if let Err(e) = self.local.remove_cart(&self.user_id) {
            log::error!("Failed to delete local cart: {}", e);
        }
        sync
    }

    pub fn total<L: CatalogLookup + ?Sized>(&self, catalog: &L) -> BigDecimal {
        self.cart.total(catalog)
    }

    pub fn views<L: CatalogLookup + ?Sized>(&self, catalog: &L) -> Vec<CartLineView> {
        self.cart.views(catalog)
    }

    pub fn missing_product_ids<L: CatalogLookup + ?Sized>(&self, catalog: &L) -> Vec<String> {
        self.cart.missing_product_ids(catalog)
    }

    pub fn total_item_count(&self) -> u64 {
        self.cart.total_item_count()
    }

    fn settle<F>(
        &mut self,
        action: &str,
        result: Result<Vec<CartLine>, RemoteError>,
        fallback: F,
    ) -> CartSync
    where
        F: FnOnce(&mut Cart),
    {
        match result {
            Ok(lines) => {
                self.cart.adopt_remote(lines);
                CartSync::Remote
            }
            Err(e) => {
                log::warn!(
                    "Cart service {} failed for user {}, keeping change locally: {}",
                    action,
                    self.user_id,
                    e
                );
                fallback(&mut self.cart);
                if let Err(e) = self.local.save_cart(&self.user_id, &self.cart) {
                    log::error!("Failed to write local cart: {}", e);
                }
                CartSync::Local
            }
        }
    }
}
