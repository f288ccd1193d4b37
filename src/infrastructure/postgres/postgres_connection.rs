use anyhow::Result;
use diesel::{
    Connection, PgConnection,
    connection::CacheSize,
    r2d2::{ConnectionManager, CustomizeConnection, Error as R2d2Error, Pool, PooledConnection},
};

use crate::domain::value_objects::store_errors::StoreUnavailable;

#[derive(Debug, Default)]
struct DisablePreparedStatements;

impl CustomizeConnection<PgConnection, R2d2Error> for DisablePreparedStatements {
    fn on_acquire(&self, conn: &mut PgConnection) -> std::result::Result<(), R2d2Error> {
        conn.set_prepared_statement_cache_size(CacheSize::Disabled);
        Ok(())
    }
}

pub type PgPoolSquad = Pool<ConnectionManager<PgConnection>>;

pub fn establish_connection(database_url: &str) -> Result<PgPoolSquad> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = Pool::builder()
        .connection_customizer(Box::new(DisablePreparedStatements::default()))
        .build(manager)?;
    Ok(pool)
}

/// Pool checkout mapped to the `StoreUnavailable` marker so usecases can
/// report an overloaded or unreachable store as 503 instead of 500.
pub fn checkout(
    db_pool: &PgPoolSquad,
) -> Result<PooledConnection<ConnectionManager<PgConnection>>> {
    db_pool
        .get()
        .map_err(|err| anyhow::Error::new(StoreUnavailable).context(err.to_string()))
}
