pub mod db;
pub mod error;
pub mod migrate;
pub mod paths;
pub mod repo;

use crate::error::{Result, StoreError};
use rusqlite::Connection;
use std::path::Path;

/// One SQLite connection plus typed repositories over it.
///
/// Workers that run in parallel each open their own `Store`; all
/// cross-worker coordination goes through table constraints.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = db::open(path)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = db::open_in_memory()?;
        Ok(Self { conn })
    }

    pub fn migrate(&self) -> Result<()> {
        migrate::run_migrations(&self.conn)
    }

    pub fn schema_version(&self) -> Result<i64> {
        migrate::schema_version(&self.conn)
    }

    /// Runs `f` in one transaction on this connection. Writes made through
    /// this store inside `f` are rolled back when it returns `Err`.
    pub fn in_transaction<T, E>(
        &self,
        f: impl FnOnce() -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E>
    where
        E: From<StoreError>,
    {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(StoreError::from)?;
        let value = f()?;
        tx.commit().map_err(StoreError::from)?;
        Ok(value)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn offers(&self) -> repo::OffersRepo<'_> {
        repo::OffersRepo::new(&self.conn)
    }

    pub fn locations(&self) -> repo::LocationsRepo<'_> {
        repo::LocationsRepo::new(&self.conn)
    }

    pub fn phones(&self) -> repo::PhonesRepo<'_> {
        repo::PhonesRepo::new(&self.conn)
    }

    pub fn invalid_phones(&self) -> repo::InvalidPhonesRepo<'_> {
        repo::InvalidPhonesRepo::new(&self.conn)
    }

    pub fn offer_phones(&self) -> repo::OfferPhonesRepo<'_> {
        repo::OfferPhonesRepo::new(&self.conn)
    }

    pub fn jobs(&self) -> repo::JobsRepo<'_> {
        repo::JobsRepo::new(&self.conn)
    }
}
