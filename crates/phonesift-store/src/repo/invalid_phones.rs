use crate::error::{Result, StoreError};
use phonesift_core::domain::{InvalidPhone, OfferId};
use rusqlite::{params, Connection};
use std::str::FromStr;

pub struct InvalidPhonesRepo<'a> {
    conn: &'a Connection,
}

impl<'a> InvalidPhonesRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Returns true when the pair was not recorded before.
    pub fn record(&self, now_utc: i64, offer_id: OfferId, phone: &str) -> Result<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO offer_invalid_phones (offer_id, phone, created_at)
             VALUES (?1, ?2, ?3);",
            params![offer_id.to_string(), phone, now_utc],
        )?;
        Ok(inserted > 0)
    }

    pub fn list_for_offer(&self, offer_id: OfferId) -> Result<Vec<InvalidPhone>> {
        let mut stmt = self.conn.prepare(
            "SELECT offer_id, phone, created_at
             FROM offer_invalid_phones
             WHERE offer_id = ?1
             ORDER BY created_at ASC, phone ASC;",
        )?;
        let mut rows = stmt.query([offer_id.to_string()])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            let id_str: String = row.get(0)?;
            let offer_id =
                OfferId::from_str(&id_str).map_err(|_| StoreError::InvalidId(id_str.clone()))?;
            items.push(InvalidPhone {
                offer_id,
                phone: row.get(1)?,
                created_at: row.get(2)?,
            });
        }
        Ok(items)
    }
}
