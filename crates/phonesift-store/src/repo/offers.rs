use crate::error::{is_unique_violation, Result, StoreError};
use phonesift_core::domain::{normalize_olx_id, LocationId, Offer, OfferId};
use rusqlite::{params, Connection, OptionalExtension};
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct OfferNew {
    pub olx_id: String,
    pub phones: Vec<String>,
    pub location_id: Option<LocationId>,
}

type OfferRow = (String, String, Option<String>, i64, i64);

const OFFER_COLUMNS: &str = "id, olx_id, location_id, created_at, updated_at";

pub struct OffersRepo<'a> {
    conn: &'a Connection,
}

impl<'a> OffersRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn create(&self, now_utc: i64, offer: OfferNew) -> Result<Offer> {
        let olx_id = normalize_olx_id(&offer.olx_id)?;
        let id = OfferId::new();

        let tx = self.conn.unchecked_transaction()?;
        let inserted = tx.execute(
            "INSERT INTO offers (id, olx_id, location_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                id.to_string(),
                olx_id,
                offer.location_id.map(|id| id.to_string()),
                now_utc,
                now_utc
            ],
        );
        if let Err(err) = inserted {
            if is_unique_violation(&err) {
                return Err(StoreError::DuplicateOlxId(olx_id));
            }
            return Err(err.into());
        }
        insert_raw_phones(&tx, &id, &offer.phones)?;
        tx.commit()?;

        Ok(Offer {
            id,
            olx_id,
            phones: offer.phones,
            location_id: offer.location_id,
            created_at: now_utc,
            updated_at: now_utc,
        })
    }

    pub fn get(&self, id: OfferId) -> Result<Option<Offer>> {
        let row: Option<OfferRow> = self
            .conn
            .query_row(
                &format!("SELECT {OFFER_COLUMNS} FROM offers WHERE id = ?1;"),
                [id.to_string()],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                    ))
                },
            )
            .optional()?;
        row.map(|row| self.offer_from_row(row)).transpose()
    }

    pub fn get_by_olx_id(&self, olx_id: &str) -> Result<Option<Offer>> {
        let row: Option<OfferRow> = self
            .conn
            .query_row(
                &format!("SELECT {OFFER_COLUMNS} FROM offers WHERE olx_id = ?1;"),
                [olx_id.trim()],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                    ))
                },
            )
            .optional()?;
        row.map(|row| self.offer_from_row(row)).transpose()
    }

    /// Replaces the raw phone list, e.g. after the listing was re-scraped.
    pub fn replace_phones(&self, now_utc: i64, id: OfferId, phones: &[String]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        let updated = tx.execute(
            "UPDATE offers SET updated_at = ?2 WHERE id = ?1;",
            params![id.to_string(), now_utc],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(format!("offer {id}")));
        }
        tx.execute(
            "DELETE FROM offer_raw_phones WHERE offer_id = ?1;",
            [id.to_string()],
        )?;
        insert_raw_phones(&tx, &id, phones)?;
        tx.commit()?;
        Ok(())
    }

    /// Region of the offer's location, if the offer has one.
    pub fn region(&self, id: OfferId) -> Result<Option<String>> {
        let region: Option<Option<String>> = self
            .conn
            .query_row(
                "SELECT locations.region
                 FROM offers
                 INNER JOIN locations ON locations.id = offers.location_id
                 WHERE offers.id = ?1;",
                [id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(region.flatten())
    }

    fn raw_phones(&self, id: &OfferId) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT raw FROM offer_raw_phones WHERE offer_id = ?1 ORDER BY position ASC;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        let mut phones = Vec::new();
        while let Some(row) = rows.next()? {
            phones.push(row.get(0)?);
        }
        Ok(phones)
    }

    fn offer_from_row(&self, row: OfferRow) -> Result<Offer> {
        let (id, olx_id, location_id, created_at, updated_at) = row;
        let id = OfferId::from_str(&id).map_err(|_| StoreError::InvalidId(id.clone()))?;
        let location_id = location_id
            .map(|raw| LocationId::from_str(&raw).map_err(|_| StoreError::InvalidId(raw.clone())))
            .transpose()?;
        let phones = self.raw_phones(&id)?;
        Ok(Offer {
            id,
            olx_id,
            phones,
            location_id,
            created_at,
            updated_at,
        })
    }
}

fn insert_raw_phones(conn: &Connection, id: &OfferId, phones: &[String]) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO offer_raw_phones (offer_id, position, raw) VALUES (?1, ?2, ?3);",
    )?;
    for (position, raw) in phones.iter().enumerate() {
        stmt.execute(params![id.to_string(), position as i64, raw])?;
    }
    Ok(())
}
