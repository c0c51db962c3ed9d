pub use diesel::prelude::*;
use diesel::connection::SimpleConnection;
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection, PooledConnection};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::AccountError;

pub type DbPool = r2d2::Pool<ConnectionManager<SqliteConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Per-connection pragmas. Writers wait on a locked database instead of
/// failing straight away.
#[derive(Debug, Clone, Copy)]
struct ConnectionOptions {
    busy_timeout_ms: u64,
}

impl CustomizeConnection<SqliteConnection, r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), r2d2::Error> {
        conn.batch_execute(&format!(
            "PRAGMA busy_timeout = {}; PRAGMA foreign_keys = ON;",
            self.busy_timeout_ms
        ))
        .map_err(r2d2::Error::QueryError)
    }
}

/// Build the pool, switch the database to WAL and bring the schema up to date.
pub fn establish(config: &Config) -> Result<DbPool, AccountError> {
    let manager = ConnectionManager::<SqliteConnection>::new(&config.database_url);
    let busy_timeout_ms = u64::try_from(config.busy_timeout.as_millis()).unwrap_or(u64::MAX);

    let pool = r2d2::Pool::builder()
        .max_size(config.pool_size)
        .connection_timeout(config.connect_timeout)
        .connection_customizer(Box::new(ConnectionOptions { busy_timeout_ms }))
        .build(manager)?;

    let mut pooled = get_connection(&pool)?;
    let conn: &mut SqliteConnection = &mut pooled;
    conn.batch_execute("PRAGMA journal_mode = WAL;")?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| AccountError::storage(format!("migration failed: {err}")))?;
    for version in &applied {
        debug!(%version, "applied migration");
    }
    info!(
        database = %config.database_url,
        pool_size = config.pool_size,
        migrations = applied.len(),
        "database ready"
    );

    Ok(pool)
}

pub fn get_connection(pool: &DbPool) -> Result<DbConnection, AccountError> {
    Ok(pool.get()?)
}
