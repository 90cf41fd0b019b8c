use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use diesel::sqlite::SqliteConnection;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

pub const IN_MEMORY: &str = ":memory:";

/// Each in-memory connection is its own database, so that pool holds one.
pub fn create_pool(database_url: &str) -> Result<DbPool, PoolError> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let max_size = if database_url == IN_MEMORY { 1 } else { 4 };
    Pool::builder().max_size(max_size).build(manager)
}
