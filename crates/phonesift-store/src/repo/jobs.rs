use crate::error::{Result, StoreError};
use phonesift_core::domain::JobId;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedJob {
    pub id: JobId,
    pub queue: String,
    pub payload: String,
    /// Number of times the job has been reserved, including the current one.
    pub attempts: i64,
    pub available_at: i64,
    pub reserved_at: Option<i64>,
    pub failed_at: Option<i64>,
    pub last_error: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone)]
pub struct JobNew {
    pub queue: String,
    pub payload: String,
    pub available_at: i64,
}

const JOB_COLUMNS: &str =
    "id, queue, payload, attempts, available_at, reserved_at, failed_at, last_error, created_at";

pub struct JobsRepo<'a> {
    conn: &'a Connection,
}

impl<'a> JobsRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn push(&self, now_utc: i64, job: JobNew) -> Result<QueuedJob> {
        let id = JobId::new();
        self.conn.execute(
            "INSERT INTO jobs (id, queue, payload, attempts, available_at, created_at)
             VALUES (?1, ?2, ?3, 0, ?4, ?5);",
            params![
                id.to_string(),
                job.queue,
                job.payload,
                job.available_at,
                now_utc
            ],
        )?;
        Ok(QueuedJob {
            id,
            queue: job.queue,
            payload: job.payload,
            attempts: 0,
            available_at: job.available_at,
            reserved_at: None,
            failed_at: None,
            last_error: None,
            created_at: now_utc,
        })
    }

    /// Claims the oldest ready job on `queue` and bumps its attempt counter.
    ///
    /// A job reserved more than `reserve_timeout_secs` ago is claimed again;
    /// its worker is assumed to have died. The select and the claim run as
    /// one statement, so two workers never reserve the same row.
    pub fn reserve(
        &self,
        now_utc: i64,
        queue: &str,
        reserve_timeout_secs: i64,
    ) -> Result<Option<QueuedJob>> {
        let stale_before = now_utc.saturating_sub(reserve_timeout_secs);
        let job = self
            .conn
            .query_row(
                &format!(
                    "UPDATE jobs
                     SET reserved_at = ?2, attempts = attempts + 1
                     WHERE id = (
                       SELECT id FROM jobs
                       WHERE queue = ?1
                         AND failed_at IS NULL
                         AND (
                           (reserved_at IS NULL AND available_at <= ?2)
                           OR reserved_at <= ?3
                         )
                       ORDER BY available_at ASC, rowid ASC
                       LIMIT 1
                     )
                     RETURNING {JOB_COLUMNS};"
                ),
                params![queue, now_utc, stale_before],
                job_row,
            )
            .optional()?;
        job.map(job_from_row).transpose()
    }

    pub fn get(&self, id: JobId) -> Result<Option<QueuedJob>> {
        let job = self
            .conn
            .query_row(
                &format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?1;"),
                [id.to_string()],
                job_row,
            )
            .optional()?;
        job.map(job_from_row).transpose()
    }

    /// Removes a finished job.
    pub fn delete(&self, id: JobId) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM jobs WHERE id = ?1;", [id.to_string()])?;
        Ok(removed > 0)
    }

    /// Puts a reserved job back on its queue, ready again at `available_at`.
    pub fn release(&self, id: JobId, available_at: i64, error: Option<&str>) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE jobs
             SET reserved_at = NULL,
                 available_at = ?2,
                 last_error = COALESCE(?3, last_error)
             WHERE id = ?1;",
            params![id.to_string(), available_at, error],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(format!("job {id}")));
        }
        Ok(())
    }

    /// Moves a job to the failed set; it is never reserved again.
    pub fn fail(&self, now_utc: i64, id: JobId, error: &str) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE jobs
             SET reserved_at = NULL, failed_at = ?2, last_error = ?3
             WHERE id = ?1;",
            params![id.to_string(), now_utc, error],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(format!("job {id}")));
        }
        Ok(())
    }

    /// Jobs on `queue` that have not failed, reserved or not.
    pub fn pending_count(&self, queue: &str) -> Result<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(1) FROM jobs WHERE queue = ?1 AND failed_at IS NULL;",
            [queue],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn list_pending(&self, queue: &str) -> Result<Vec<QueuedJob>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs
             WHERE queue = ?1 AND failed_at IS NULL
             ORDER BY available_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([queue])?;
        let mut jobs = Vec::new();
        while let Some(row) = rows.next()? {
            jobs.push(job_from_row(job_row(row)?)?);
        }
        Ok(jobs)
    }

    pub fn list_failed(&self) -> Result<Vec<QueuedJob>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs
             WHERE failed_at IS NOT NULL
             ORDER BY failed_at DESC, rowid DESC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut jobs = Vec::new();
        while let Some(row) = rows.next()? {
            jobs.push(job_from_row(job_row(row)?)?);
        }
        Ok(jobs)
    }
}

type JobRow = (
    String,
    String,
    String,
    i64,
    i64,
    Option<i64>,
    Option<i64>,
    Option<String>,
    i64,
);

fn job_row(row: &Row<'_>) -> rusqlite::Result<JobRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
    ))
}

fn job_from_row(row: JobRow) -> Result<QueuedJob> {
    let (id, queue, payload, attempts, available_at, reserved_at, failed_at, last_error, created_at) =
        row;
    let id = JobId::from_str(&id).map_err(|_| StoreError::InvalidId(id.clone()))?;
    Ok(QueuedJob {
        id,
        queue,
        payload,
        attempts,
        available_at,
        reserved_at,
        failed_at,
        last_error,
        created_at,
    })
}
