// src/domain/auction.rs

use chrono::NaiveDateTime;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::Serialize;
use std::fmt;

/// Tag stored in `source` for everything discovered on the BOE portal.
pub const SOURCE_BOE: &str = "BOE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuctionStatus {
    Live,
    Upcoming,
    Closed,
    Unknown,
}

impl AuctionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuctionStatus::Live => "LIVE",
            AuctionStatus::Upcoming => "UPCOMING",
            AuctionStatus::Closed => "CLOSED",
            AuctionStatus::Unknown => "UNKNOWN",
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw {
            "LIVE" => AuctionStatus::Live,
            "UPCOMING" => AuctionStatus::Upcoming,
            "CLOSED" => AuctionStatus::Closed,
            _ => AuctionStatus::Unknown,
        }
    }

    fn from_sql_str(raw: &str) -> Option<Self> {
        Some(Self::parse(raw))
    }
}

/// Progress of one processing concern (enrichment or geocoding) for a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkStatus {
    /// Not attempted yet, or attempted and failed: still queued.
    Pending,
    Done,
    /// Attempted, found nothing usable.
    Skipped,
}

impl WorkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkStatus::Pending => "pending",
            WorkStatus::Done => "done",
            WorkStatus::Skipped => "skipped",
        }
    }

    fn from_sql_str(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(WorkStatus::Pending),
            "done" => Some(WorkStatus::Done),
            "skipped" => Some(WorkStatus::Skipped),
            _ => None,
        }
    }
}

impl fmt::Display for WorkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Both enums are stored as TEXT columns.
macro_rules! sql_text_enum {
    ($ty:ty, $parse:path) => {
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let raw = value.as_str()?;
                $parse(raw).ok_or(FromSqlError::InvalidType)
            }
        }
    };
}

sql_text_enum!(AuctionStatus, AuctionStatus::from_sql_str);
sql_text_enum!(WorkStatus, WorkStatus::from_sql_str);

/// One listing block as found on a search results page.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingSummary {
    pub id: String,
    pub title: String,
    pub court: String,
    pub status: AuctionStatus,
    /// Second text line of the block; kept as the record description.
    pub detail_line: String,
    pub amount: Option<f64>,
    pub url: String,
    pub city: String,
    pub province: String,
}

/// Fields merged from the two secondary detail views of a listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichmentFields {
    // general view
    pub identifier: String,
    pub auction_type: String,
    pub claim_amount: Option<f64>,
    pub appraisal_amount: Option<f64>,
    pub min_bid: Option<f64>,
    pub deposit_amount: Option<f64>,

    // assets view
    pub catastral_ref: String,
    pub full_address: String,
    pub postal_code: String,
    pub visitable: String,
    pub possession_status: String,
}

/// A row of the `auctions` table, serialized as-is into the published snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuctionRecord {
    pub id: String,

    pub title: Option<String>,
    pub description: Option<String>,
    pub court: Option<String>,
    pub status: AuctionStatus,
    pub amount: Option<f64>,
    pub url: String,
    pub source: String,
    pub location_city: Option<String>,
    pub location_province: Option<String>,

    pub lat: Option<f64>,
    pub lng: Option<f64>,

    pub identifier: Option<String>,
    pub auction_type: Option<String>,
    pub claim_amount: Option<f64>,
    pub appraisal_amount: Option<f64>,
    pub min_bid: Option<f64>,
    pub deposit_amount: Option<f64>,
    pub catastral_ref: Option<String>,
    pub full_address: Option<String>,
    pub postal_code: Option<String>,
    pub visitable: Option<String>,
    pub possession_status: Option<String>,

    pub enrichment_status: WorkStatus,
    pub geocode_status: WorkStatus,

    pub last_updated: NaiveDateTime,
}

/// The slice of a record the geocoder needs to build its query.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeCandidate {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub location_city: Option<String>,
    pub location_province: Option<String>,
}

/// The slice of a record the enrichment stage needs.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentCandidate {
    pub id: String,
    pub url: String,
}

/// One row of the append-only `scraper_logs` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScraperLog {
    pub id: i64,
    pub timestamp: NaiveDateTime,
    pub message: String,
    pub status: String,
}

pub const LOG_SUCCESS: &str = "SUCCESS";
