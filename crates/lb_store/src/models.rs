//! Database row models — these map to/from SQL rows.

use lb_proto::{Record, RecordType};

use crate::error::StoreError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecordRow {
    pub id: i64,
    #[sqlx(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub opaque: String,
    pub meta: String,
}

/// Listing row: never carries `opaque`/`meta`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecordSummaryRow {
    pub id: i64,
    #[sqlx(rename = "type")]
    pub record_type: String,
    pub name: String,
}

impl TryFrom<RecordRow> for Record {
    type Error = StoreError;

    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        Ok(Record {
            id: row.id,
            record_type: row.record_type.parse::<RecordType>()?,
            name: row.name,
            opaque: row.opaque,
            meta: row.meta,
        })
    }
}

impl TryFrom<RecordSummaryRow> for Record {
    type Error = StoreError;

    fn try_from(row: RecordSummaryRow) -> Result<Self, Self::Error> {
        Ok(Record::summary(
            row.id,
            row.record_type.parse::<RecordType>()?,
            row.name,
        ))
    }
}
