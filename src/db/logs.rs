use crate::db::connection::Database;
use crate::domain::auction::ScraperLog;
use crate::errors::ServerError;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

/// Append one row to the audit trail. Rows are never updated or deleted.
pub fn append_log(db: &Database, message: &str, outcome: &str) -> Result<i64, ServerError> {
    let now = Utc::now().naive_utc();

    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO scraper_logs (timestamp, message, status) VALUES (?1, ?2, ?3)",
            params![now, message, outcome],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

pub fn last_log(db: &Database) -> Result<Option<ScraperLog>, ServerError> {
    db.with_conn(|conn| {
        let log = conn
            .query_row(
                "SELECT id, timestamp, message, status FROM scraper_logs ORDER BY timestamp DESC, id DESC LIMIT 1",
                [],
                |row| {
                    Ok(ScraperLog {
                        id: row.get(0)?,
                        timestamp: row.get(1)?,
                        message: row.get(2)?,
                        status: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(log)
    })
}
