use chrono::Utc;
use diesel::prelude::*;

use crate::db::DbPool;
use crate::domain::cart::Cart;
use crate::domain::errors::DomainError;
use crate::domain::ports::{LocalStore, TokenStore};
use crate::schema::local_entries;

use super::models::{LocalEntryRow, NewLocalEntryRow};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

// ── Store ─────────────────────────────────────────────────────────────────────

pub const TOKEN_KEY: &str = "authToken";

pub fn cart_key(user_id: &str) -> String {
    format!("cart-{}", user_id)
}

/// Key/value storage on the device, holding the bearer token and the
/// per-user cart mirrors.
#[derive(Clone)]
pub struct DieselLocalStore {
    pool: DbPool,
}

impl DieselLocalStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn read(&self, key: &str) -> Result<Option<String>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = local_entries::table
            .find(key)
            .select(LocalEntryRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(|r| r.value))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        diesel::replace_into(local_entries::table)
            .values(&NewLocalEntryRow {
                key,
                value,
                updated_at: Utc::now().naive_utc(),
            })
            .execute(&mut conn)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        diesel::delete(local_entries::table.find(key)).execute(&mut conn)?;
        Ok(())
    }
}

impl LocalStore for DieselLocalStore {
    /// An unreadable mirror is dropped rather than failing the cart.
    fn load_cart(&self, user_id: &str) -> Result<Option<Cart>, DomainError> {
        let key = cart_key(user_id);
        let Some(raw) = self.read(&key)? else {
            return Ok(None);
        };
        match serde_json::from_str::<Cart>(&raw) {
            Ok(cart) => Ok(Some(cart)),
            Err(e) => {
                log::warn!("Discarding unreadable local cart {}: {}", key, e);
                self.delete(&key)?;
                Ok(None)
            }
        }
    }

    fn save_cart(&self, user_id: &str, cart: &Cart) -> Result<(), DomainError> {
        let raw = serde_json::to_string(cart).map_err(|e| DomainError::Internal(e.to_string()))?;
        self.write(&cart_key(user_id), &raw)
    }

    fn remove_cart(&self, user_id: &str) -> Result<(), DomainError> {
        self.delete(&cart_key(user_id))
    }
}

impl TokenStore for DieselLocalStore {
    fn token(&self) -> Result<Option<String>, DomainError> {
        self.read(TOKEN_KEY)
    }

    fn set_token(&self, token: &str) -> Result<(), DomainError> {
        self.write(TOKEN_KEY, token)
    }

    fn clear_token(&self) -> Result<(), DomainError> {
        self.delete(TOKEN_KEY)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use diesel::prelude::*;

    use super::*;
    use crate::db::{create_pool, IN_MEMORY};
    use crate::domain::catalog::{sample_product, Product};
    use crate::domain::money;

    fn setup_store() -> (DbPool, DieselLocalStore) {
        let pool = create_pool(IN_MEMORY).expect("pool");
        crate::run_migrations(&pool).expect("migrations");
        (pool.clone(), DieselLocalStore::new(pool))
    }

    #[test]
    fn token_set_read_clear() {
        let (_, store) = setup_store();
        assert_eq!(store.token().unwrap(), None);

        store.set_token("first").unwrap();
        store.set_token("second").unwrap();
        assert_eq!(store.token().unwrap().as_deref(), Some("second"));

        store.clear_token().unwrap();
        assert_eq!(store.token().unwrap(), None);
        // Clearing twice is fine.
        store.clear_token().unwrap();
    }

    #[test]
    fn cart_mirror_keeps_captured_fields() {
        let (_, store) = setup_store();
        let mut cart = Cart::new();
        cart.add(&sample_product("p1", "Widget", "10"), 2, Utc::now());

        store.save_cart("u1", &cart).unwrap();
        let restored = store.load_cart("u1").unwrap().expect("mirror present");

        let line = restored.line("p1").expect("line");
        assert_eq!(line.quantity, 2);
        assert_eq!(line.title.as_deref(), Some("Widget"));
        let no_catalog: Vec<Product> = Vec::new();
        assert_eq!(money::format_amount(&restored.total(&no_catalog)), "20.00");
        assert!(store.load_cart("someone-else").unwrap().is_none());
    }

    #[test]
    fn remove_cart_deletes_only_that_user() {
        let (_, store) = setup_store();
        store.save_cart("u1", &Cart::new()).unwrap();
        store.save_cart("u2", &Cart::new()).unwrap();
        store.set_token("tok").unwrap();

        store.remove_cart("u1").unwrap();

        assert!(store.load_cart("u1").unwrap().is_none());
        assert!(store.load_cart("u2").unwrap().is_some());
        assert_eq!(store.token().unwrap().as_deref(), Some("tok"));
    }

    #[test]
    fn corrupt_mirror_is_discarded() {
        let (pool, store) = setup_store();
        store.write(&cart_key("u1"), "{not json").unwrap();

        assert!(store.load_cart("u1").unwrap().is_none());

        let mut conn = pool.get().unwrap();
        let remaining: i64 = local_entries::table.count().get_result(&mut conn).unwrap();
        assert_eq!(remaining, 0);
    }
}
