use crate::error::{Result, StoreError};
use phonesift_core::domain::{CanonicalPhone, PhoneRecord};
use rusqlite::{params, Connection, OptionalExtension};

#[derive(Debug, Clone)]
pub struct PhoneCreateResult {
    pub phone: PhoneRecord,
    pub created: bool,
}

pub struct PhonesRepo<'a> {
    conn: &'a Connection,
}

impl<'a> PhonesRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Returns the record for `phone`, inserting it first when missing.
    ///
    /// Concurrent callers on other connections may race on the same value;
    /// the losing insert is a no-op and both read back the winning row.
    pub fn get_or_create(&self, now_utc: i64, phone: &CanonicalPhone) -> Result<PhoneCreateResult> {
        let inserted = self.conn.execute(
            "INSERT INTO phones (id, offer_count, created_at) VALUES (?1, 0, ?2)
             ON CONFLICT(id) DO NOTHING;",
            params![phone.as_str(), now_utc],
        )?;

        let record = self
            .get(phone)?
            .ok_or_else(|| StoreError::NotFound(format!("phone {phone} after upsert")))?;
        Ok(PhoneCreateResult {
            phone: record,
            created: inserted > 0,
        })
    }

    pub fn get(&self, phone: &CanonicalPhone) -> Result<Option<PhoneRecord>> {
        let row: Option<(String, i64, i64)> = self
            .conn
            .query_row(
                "SELECT id, offer_count, created_at FROM phones WHERE id = ?1;",
                [phone.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        row.map(phone_from_parts).transpose()
    }

    pub fn list(&self) -> Result<Vec<PhoneRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, offer_count, created_at FROM phones ORDER BY id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut phones = Vec::new();
        while let Some(row) = rows.next()? {
            phones.push(phone_from_parts((row.get(0)?, row.get(1)?, row.get(2)?))?);
        }
        Ok(phones)
    }

    pub fn count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(1) FROM phones;", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Recomputes `offer_count` from the link table.
    pub fn refresh_offer_count(&self, phone: &CanonicalPhone) -> Result<PhoneRecord> {
        let updated = self.conn.execute(
            "UPDATE phones
             SET offer_count = (SELECT COUNT(1) FROM offer_phones WHERE phone_id = ?1)
             WHERE id = ?1;",
            [phone.as_str()],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(format!("phone {phone}")));
        }
        self.get(phone)?
            .ok_or_else(|| StoreError::NotFound(format!("phone {phone}")))
    }
}

pub(crate) fn phone_from_parts((id, offer_count, created_at): (String, i64, i64)) -> Result<PhoneRecord> {
    let phone = CanonicalPhone::try_from(id)?;
    Ok(PhoneRecord {
        phone,
        offer_count,
        created_at,
    })
}
