//! # kuppi-db
//!
//! Storage layer for the Kuppi backend.
//!
//! This crate provides:
//! - Connection pool management
//! - PostgreSQL implementations of the repository traits in `kuppi-core`
//! - An in-memory store implementing the same traits
//! - [`Stores`], the trait-object bundle the HTTP layer runs against
//!
//! ## Example
//!
//! ```rust,ignore
//! use kuppi_db::{Database, Stores};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/kuppi").await?;
//!     let stores = db.stores();
//!     println!("registered: {}", stores.users.exists("a@x.com").await?);
//!     Ok(())
//! }
//! ```
use std::sync::Arc;

pub mod memory;
pub mod notes;
pub mod otp;
pub mod pending;
pub mod pool;
pub mod reset_grants;
pub mod users;

// Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use kuppi_core::*;

pub use memory::MemoryStore;
pub use notes::PgNoteRepository;
pub use otp::PgOtpLedger;
pub use pending::PgPendingRegistrationRepository;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use reset_grants::PgResetGrantRepository;
pub use users::PgUserRepository;

/// Combined database context with all PostgreSQL repositories.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    pub users: PgUserRepository,
    pub notes: PgNoteRepository,
    pub pending: PgPendingRegistrationRepository,
    pub otp: PgOtpLedger,
    pub reset_grants: PgResetGrantRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            users: PgUserRepository::new(pool.clone()),
            notes: PgNoteRepository::new(pool.clone()),
            pending: PgPendingRegistrationRepository::new(pool.clone()),
            otp: PgOtpLedger::new(pool.clone()),
            reset_grants: PgResetGrantRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }

    /// Trait-object handles over this database.
    pub fn stores(&self) -> Stores {
        Stores {
            users: Arc::new(PgUserRepository::new(self.pool.clone())),
            notes: Arc::new(PgNoteRepository::new(self.pool.clone())),
            pending: Arc::new(PgPendingRegistrationRepository::new(self.pool.clone())),
            otp: Arc::new(PgOtpLedger::new(self.pool.clone())),
            reset_grants: Arc::new(PgResetGrantRepository::new(self.pool.clone())),
        }
    }
}

/// The repositories a running server needs, independent of backend.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserRepository>,
    pub notes: Arc<dyn NoteRepository>,
    pub pending: Arc<dyn PendingRegistrationRepository>,
    pub otp: Arc<dyn OtpLedger>,
    pub reset_grants: Arc<dyn ResetGrantRepository>,
}

impl Stores {
    /// Back every repository with the same in-memory store.
    pub fn in_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            users: store.clone(),
            notes: store.clone(),
            pending: store.clone(),
            otp: store.clone(),
            reset_grants: store,
        }
    }
}
