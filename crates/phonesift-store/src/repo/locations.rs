use crate::error::{Result, StoreError};
use phonesift_core::domain::{normalize_location_name, normalize_region, Location, LocationId};
use rusqlite::{params, Connection, OptionalExtension};
use std::str::FromStr;

pub struct LocationsRepo<'a> {
    conn: &'a Connection,
}

impl<'a> LocationsRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Inserts the location or refreshes the region of an existing one with
    /// the same name.
    pub fn upsert(&self, name: &str, region: Option<&str>) -> Result<Location> {
        let name = normalize_location_name(name)?;
        let region = normalize_region(region);
        let new_id = LocationId::new();

        self.conn.execute(
            "INSERT INTO locations (id, name, region) VALUES (?1, ?2, ?3)
             ON CONFLICT(name) DO UPDATE SET region = excluded.region;",
            params![new_id.to_string(), name, region],
        )?;

        self.find_by_name(&name)?
            .ok_or_else(|| StoreError::NotFound(format!("location {name}")))
    }

    pub fn get(&self, id: LocationId) -> Result<Option<Location>> {
        let row: Option<(String, String, Option<String>)> = self
            .conn
            .query_row(
                "SELECT id, name, region FROM locations WHERE id = ?1;",
                [id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        row.map(location_from_parts).transpose()
    }

    pub fn find_by_name(&self, name: &str) -> Result<Option<Location>> {
        let row: Option<(String, String, Option<String>)> = self
            .conn
            .query_row(
                "SELECT id, name, region FROM locations WHERE name = ?1;",
                [name.trim()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        row.map(location_from_parts).transpose()
    }
}

fn location_from_parts((id, name, region): (String, String, Option<String>)) -> Result<Location> {
    let id = LocationId::from_str(&id).map_err(|_| StoreError::InvalidId(id.clone()))?;
    Ok(Location { id, name, region })
}
