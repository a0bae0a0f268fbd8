use diesel::connection::SimpleConnection;
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection, Pool, PoolError, PooledConnection};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConn = PooledConnection<ConnectionManager<SqliteConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Applied to every connection the pool opens. SQLite keeps foreign keys
/// off per connection unless asked, and the cascades depend on them.
#[derive(Debug, Clone, Copy)]
struct SqlitePragmas;

impl CustomizeConnection<SqliteConnection, r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), r2d2::Error> {
        conn.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
            .map_err(r2d2::Error::QueryError)
    }
}

/// Return a pool of connections to the database at `database_url`.
///
/// `:memory:` gets a single connection that is never recycled, since every
/// new SQLite in-memory connection is a new, empty database.
///
/// # Example
/// ```
/// let pool = build_pool("blog.sqlite3", 8)?;
/// let mut conn = pool.get()?;
/// ```
pub fn build_pool(database_url: &str, max_size: u32) -> Result<DbPool, PoolError> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let builder = Pool::builder().connection_customizer(Box::new(SqlitePragmas));

    if database_url == ":memory:" {
        builder
            .max_size(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .build(manager)
    } else {
        builder.max_size(max_size.max(1)).build(manager)
    }
}

/// Brings the schema up to date, returns the number of migrations applied.
pub fn run_migrations(pool: &DbPool) -> anyhow::Result<usize> {
    let mut conn = pool.get()?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| anyhow::anyhow!("failed to run migrations: {err}"))?;

    Ok(applied.len())
}

/// Fresh, migrated in-memory database for a single test.
#[cfg(test)]
pub fn test_pool() -> DbPool {
    let pool = build_pool(":memory:", 1).expect("in-memory pool");
    run_migrations(&pool).expect("migrations");
    pool
}
