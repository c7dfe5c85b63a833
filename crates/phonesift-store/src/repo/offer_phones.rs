use crate::error::{is_unique_violation, Result, StoreError};
use crate::repo::phones::phone_from_parts;
use phonesift_core::domain::{CanonicalPhone, OfferId, PhoneRecord};
use rusqlite::{params, Connection};

pub struct OfferPhonesRepo<'a> {
    conn: &'a Connection,
}

impl<'a> OfferPhonesRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Inserts the (offer, phone) link.
    ///
    /// An existing link surfaces as [`StoreError::DuplicateLink`]; every other
    /// failure, including a missing offer or phone, stays a SQL error.
    pub fn attach(&self, now_utc: i64, offer_id: OfferId, phone: &CanonicalPhone) -> Result<()> {
        let inserted = self.conn.execute(
            "INSERT INTO offer_phones (offer_id, phone_id, created_at) VALUES (?1, ?2, ?3);",
            params![offer_id.to_string(), phone.as_str(), now_utc],
        );
        match inserted {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => Err(StoreError::DuplicateLink {
                offer_id,
                phone: phone.clone(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    pub fn is_linked(&self, offer_id: OfferId, phone: &CanonicalPhone) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(1) FROM offer_phones WHERE offer_id = ?1 AND phone_id = ?2;",
            params![offer_id.to_string(), phone.as_str()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn list_for_offer(&self, offer_id: OfferId) -> Result<Vec<PhoneRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT phones.id, phones.offer_count, phones.created_at
             FROM phones
             INNER JOIN offer_phones ON offer_phones.phone_id = phones.id
             WHERE offer_phones.offer_id = ?1
             ORDER BY offer_phones.created_at ASC, phones.id ASC;",
        )?;
        let mut rows = stmt.query([offer_id.to_string()])?;
        let mut phones = Vec::new();
        while let Some(row) = rows.next()? {
            phones.push(phone_from_parts((row.get(0)?, row.get(1)?, row.get(2)?))?);
        }
        Ok(phones)
    }

    pub fn count_for_phone(&self, phone: &CanonicalPhone) -> Result<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(1) FROM offer_phones WHERE phone_id = ?1;",
            [phone.as_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
