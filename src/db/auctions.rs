use crate::db::connection::Database;
use crate::domain::auction::{
    AuctionRecord, EnrichmentCandidate, EnrichmentFields, GeocodeCandidate, ListingSummary,
    WorkStatus, SOURCE_BOE,
};
use crate::errors::ServerError;
use chrono::Utc;
use rusqlite::{params, Connection, Row};

const SELECT_RECORD: &str = r#"
    SELECT
        id, title, description, court, status, amount, url, source,
        location_city, location_province,
        lat, lng,
        identifier, auction_type, claim_amount, appraisal_amount, min_bid, deposit_amount,
        catastral_ref, full_address, postal_code, visitable, possession_status,
        enrichment_status, geocode_status,
        last_updated
    FROM auctions
"#;

/// Insert a newly discovered listing, or merge the discovery fields into the
/// existing record with the same id. Enrichment and geocoding columns are never
/// touched here. Refreshes `last_updated`.
pub fn upsert_listing(conn: &Connection, item: &ListingSummary) -> Result<(), ServerError> {
    let now = Utc::now().naive_utc();

    conn.execute(
        r#"
        INSERT INTO auctions (
            id, title, court, status, description, amount, url, source,
            location_city, location_province, created_at, last_updated
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
        ON CONFLICT(id) DO UPDATE SET
            title = excluded.title,
            court = excluded.court,
            status = excluded.status,
            description = excluded.description,
            amount = excluded.amount,
            url = excluded.url,
            source = excluded.source,
            location_city = excluded.location_city,
            location_province = excluded.location_province,
            last_updated = excluded.last_updated
        "#,
        params![
            item.id,
            item.title,
            item.court,
            item.status,
            item.detail_line,
            item.amount,
            item.url,
            SOURCE_BOE,
            item.city,
            item.province,
            now,
        ],
    )?;
    Ok(())
}

/// Upsert one partition's worth of listings in a single transaction.
pub fn save_listings(db: &Database, items: &[ListingSummary]) -> Result<usize, ServerError> {
    if items.is_empty() {
        return Ok(0);
    }

    db.with_conn(|conn| {
        let tx = conn.transaction()?;
        for item in items {
            upsert_listing(&tx, item)?;
        }
        tx.commit()?;
        Ok(items.len())
    })
}

/// Records still waiting for their detail views, capped at `limit`.
pub fn select_pending_enrichment(
    db: &Database,
    limit: usize,
) -> Result<Vec<EnrichmentCandidate>, ServerError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id, url FROM auctions WHERE enrichment_status = ?1 ORDER BY created_at, id LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![WorkStatus::Pending, limit as i64], |row| {
            Ok(EnrichmentCandidate {
                id: row.get(0)?,
                url: row.get(1)?,
            })
        })?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    })
}

/// Records without coordinates. Skipped records are included when
/// `include_skipped` is set so they get another chance on this run.
pub fn select_pending_geocode(
    db: &Database,
    include_skipped: bool,
) -> Result<Vec<GeocodeCandidate>, ServerError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            r#"
            SELECT id, title, description, location_city, location_province
            FROM auctions
            WHERE lat IS NULL
              AND (geocode_status = ?1 OR (?2 AND geocode_status = ?3))
            ORDER BY created_at, id
            "#,
        )?;
        let rows = stmt.query_map(
            params![WorkStatus::Pending, include_skipped, WorkStatus::Skipped],
            |row| {
                Ok(GeocodeCandidate {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    description: row.get(2)?,
                    location_city: row.get(3)?,
                    location_province: row.get(4)?,
                })
            },
        )?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    })
}

/// Write every enrichment field in one statement and mark the record done.
pub fn apply_enrichment(
    db: &Database,
    id: &str,
    fields: &EnrichmentFields,
) -> Result<(), ServerError> {
    db.with_conn(|conn| {
        conn.execute(
            r#"
            UPDATE auctions SET
                identifier = ?1,
                auction_type = ?2,
                claim_amount = ?3,
                appraisal_amount = ?4,
                min_bid = ?5,
                deposit_amount = ?6,
                catastral_ref = ?7,
                full_address = ?8,
                postal_code = ?9,
                visitable = ?10,
                possession_status = ?11,
                enrichment_status = ?12
            WHERE id = ?13
            "#,
            params![
                fields.identifier,
                fields.auction_type,
                fields.claim_amount,
                fields.appraisal_amount,
                fields.min_bid,
                fields.deposit_amount,
                fields.catastral_ref,
                fields.full_address,
                fields.postal_code,
                fields.visitable,
                fields.possession_status,
                WorkStatus::Done,
                id,
            ],
        )?;
        Ok(())
    })
}

/// Store a resolved coordinate pair. Both columns are written together.
pub fn apply_coordinates(db: &Database, id: &str, lat: f64, lng: f64) -> Result<(), ServerError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE auctions SET lat = ?1, lng = ?2, geocode_status = ?3 WHERE id = ?4",
            params![lat, lng, WorkStatus::Done, id],
        )?;
        Ok(())
    })
}

/// Remember that a geocode attempt found nothing. Coordinates stay null.
pub fn mark_geocode_skipped(db: &Database, id: &str) -> Result<(), ServerError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE auctions SET geocode_status = ?1 WHERE id = ?2 AND lat IS NULL",
            params![WorkStatus::Skipped, id],
        )?;
        Ok(())
    })
}

/// The most recently touched records, newest first.
pub fn snapshot(db: &Database, limit: usize) -> Result<Vec<AuctionRecord>, ServerError> {
    db.with_conn(|conn| {
        let sql = format!("{SELECT_RECORD} ORDER BY last_updated DESC, id LIMIT ?1");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![limit as i64], record_from_row)?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    })
}

/// Every record, newest first.
pub fn list_all(db: &Database) -> Result<Vec<AuctionRecord>, ServerError> {
    db.with_conn(|conn| {
        let sql = format!("{SELECT_RECORD} ORDER BY last_updated DESC, id");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], record_from_row)?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    })
}

#[cfg(test)]
pub fn get_auction(db: &Database, id: &str) -> Result<Option<AuctionRecord>, ServerError> {
    use rusqlite::OptionalExtension;

    db.with_conn(|conn| {
        let sql = format!("{SELECT_RECORD} WHERE id = ?1");
        let record = conn
            .query_row(&sql, params![id], record_from_row)
            .optional()?;
        Ok(record)
    })
}

pub fn count_auctions(db: &Database) -> Result<i64, ServerError> {
    db.with_conn(|conn| {
        let total: i64 = conn.query_row("SELECT COUNT(*) FROM auctions", [], |r| r.get(0))?;
        Ok(total)
    })
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<AuctionRecord> {
    Ok(AuctionRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        court: row.get(3)?,
        status: row.get(4)?,
        amount: row.get(5)?,
        url: row.get(6)?,
        source: row.get(7)?,
        location_city: row.get(8)?,
        location_province: row.get(9)?,

        lat: row.get(10)?,
        lng: row.get(11)?,

        identifier: row.get(12)?,
        auction_type: row.get(13)?,
        claim_amount: row.get(14)?,
        appraisal_amount: row.get(15)?,
        min_bid: row.get(16)?,
        deposit_amount: row.get(17)?,
        catastral_ref: row.get(18)?,
        full_address: row.get(19)?,
        postal_code: row.get(20)?,
        visitable: row.get(21)?,
        possession_status: row.get(22)?,

        enrichment_status: row.get(23)?,
        geocode_status: row.get(24)?,

        last_updated: row.get(25)?,
    })
}
