//! Per-user record CRUD.
//!
//! Every query joins through `users.name`, so an id that belongs to another
//! user behaves exactly like an id that does not exist.  Update and delete
//! check the number of affected rows themselves: a statement that matched
//! nothing still executes successfully.

use lb_proto::{Record, RecordType, Records};
use sqlx::{Executor, Sqlite};
use tracing::{debug, warn};

use crate::db::Store;
use crate::error::StoreError;
use crate::models::{RecordRow, RecordSummaryRow};

const SELECT_RECORD: &str = "SELECT records.id, records.type, records.name, records.opaque, records.meta \
     FROM records JOIN users ON records.user_id = users.id";

impl Store {
    /// Insert a record for `user`; returns the new id.
    pub async fn store_record(&self, user: &str, record: &Record) -> Result<i64, StoreError> {
        let res = sqlx::query(
            "INSERT INTO records (user_id, name, type, opaque, meta) \
             SELECT id, ?, ?, ?, ? FROM users WHERE name = ?",
        )
        .bind(&record.name)
        .bind(record.record_type.as_str())
        .bind(&record.opaque)
        .bind(&record.meta)
        .bind(user)
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate(e, record))?;

        if res.rows_affected() != 1 {
            return Err(StoreError::NotFound(format!("user {user}")));
        }
        let id = res.last_insert_rowid();
        debug!(user, id, record_type = %record.record_type, "record stored");
        Ok(id)
    }

    /// Insert a record under a caller-chosen id, keeping the id the server
    /// assigned.  [`Store::replace_record_with_id`] uses the same insert
    /// inside its transaction.
    pub async fn store_record_with_id(
        &self,
        id: i64,
        user: &str,
        record: &Record,
    ) -> Result<(), StoreError> {
        insert_with_id(&self.pool, id, user, record).await
    }

    pub async fn get_record_by_id(&self, user: &str, id: i64) -> Result<Record, StoreError> {
        let row = sqlx::query_as::<_, RecordRow>(&format!(
            "{SELECT_RECORD} WHERE users.name = ? AND records.id = ?"
        ))
        .bind(user)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.ok_or_else(|| StoreError::NotFound(format!("record {id}")))?
            .try_into()
    }

    pub async fn get_record_by_type_name(
        &self,
        user: &str,
        record_type: RecordType,
        name: &str,
    ) -> Result<Record, StoreError> {
        let row = sqlx::query_as::<_, RecordRow>(&format!(
            "{SELECT_RECORD} WHERE users.name = ? AND records.type = ? AND records.name = ?"
        ))
        .bind(user)
        .bind(record_type.as_str())
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        row.ok_or_else(|| StoreError::NotFound(format!("{record_type} {name}")))?
            .try_into()
    }

    /// Replace name, type and both ciphertexts of record `id`.
    pub async fn update_record_by_id(
        &self,
        user: &str,
        id: i64,
        record: &Record,
    ) -> Result<(), StoreError> {
        let res = sqlx::query(
            "UPDATE records SET name = ?, type = ?, opaque = ?, meta = ? \
             WHERE id = ? AND user_id = (SELECT id FROM users WHERE name = ?)",
        )
        .bind(&record.name)
        .bind(record.record_type.as_str())
        .bind(&record.opaque)
        .bind(&record.meta)
        .bind(id)
        .bind(user)
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate(e, record))?;

        if res.rows_affected() != 1 {
            return Err(StoreError::NotFound(format!("record {id}")));
        }
        Ok(())
    }

    /// Replace the record addressed by `(record_type, name)`; returns its id.
    pub async fn update_record_by_type_name(
        &self,
        user: &str,
        record_type: RecordType,
        name: &str,
        record: &Record,
    ) -> Result<i64, StoreError> {
        let updated: Vec<i64> = sqlx::query_scalar(
            "UPDATE records SET name = ?, type = ?, opaque = ?, meta = ? \
             WHERE type = ? AND name = ? AND user_id = (SELECT id FROM users WHERE name = ?) \
             RETURNING id",
        )
        .bind(&record.name)
        .bind(record.record_type.as_str())
        .bind(&record.opaque)
        .bind(&record.meta)
        .bind(record_type.as_str())
        .bind(name)
        .bind(user)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| duplicate(e, record))?;

        exactly_one(updated, || format!("{record_type} {name}"))
    }

    pub async fn delete_record_by_id(&self, user: &str, id: i64) -> Result<(), StoreError> {
        let res = sqlx::query(
            "DELETE FROM records WHERE id = ? AND user_id = (SELECT id FROM users WHERE name = ?)",
        )
        .bind(id)
        .bind(user)
        .execute(&self.pool)
        .await?;

        if res.rows_affected() != 1 {
            return Err(StoreError::NotFound(format!("record {id}")));
        }
        Ok(())
    }

    /// Delete the record addressed by `(record_type, name)`; returns its id.
    pub async fn delete_record_by_type_name(
        &self,
        user: &str,
        record_type: RecordType,
        name: &str,
    ) -> Result<i64, StoreError> {
        let deleted: Vec<i64> = sqlx::query_scalar(
            "DELETE FROM records \
             WHERE type = ? AND name = ? AND user_id = (SELECT id FROM users WHERE name = ?) \
             RETURNING id",
        )
        .bind(record_type.as_str())
        .bind(name)
        .bind(user)
        .fetch_all(&self.pool)
        .await?;

        exactly_one(deleted, || format!("{record_type} {name}"))
    }

    /// All records of `user`, name and type only.
    pub async fn list_records(&self, user: &str) -> Result<Records, StoreError> {
        let rows = sqlx::query_as::<_, RecordSummaryRow>(
            "SELECT records.id, records.type, records.name \
             FROM records JOIN users ON records.user_id = users.id \
             WHERE users.name = ?",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;
        collect_summaries(rows)
    }

    /// Records of `user` with the given type, name and type only.
    pub async fn list_records_by_type(
        &self,
        user: &str,
        record_type: RecordType,
    ) -> Result<Records, StoreError> {
        let rows = sqlx::query_as::<_, RecordSummaryRow>(
            "SELECT records.id, records.type, records.name \
             FROM records JOIN users ON records.user_id = users.id \
             WHERE users.name = ? AND records.type = ?",
        )
        .bind(user)
        .bind(record_type.as_str())
        .fetch_all(&self.pool)
        .await?;
        collect_summaries(rows)
    }

    /// Upsert `record` under `id` in one transaction.  Any other row of the
    /// same user holding the same `(type, name)` is evicted first: it can
    /// only be a stale copy of a record the server has since replaced.
    pub async fn replace_record_with_id(
        &self,
        id: i64,
        user: &str,
        record: &Record,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let user_id: i64 = sqlx::query_scalar("SELECT id FROM users WHERE name = ?")
            .bind(user)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("user {user}")))?;

        sqlx::query("DELETE FROM records WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let stale = sqlx::query(
            "DELETE FROM records WHERE user_id = ? AND type = ? AND name = ? AND id != ?",
        )
        .bind(user_id)
        .bind(record.record_type.as_str())
        .bind(&record.name)
        .bind(id)
        .execute(&mut *tx)
        .await?;
        if stale.rows_affected() > 0 {
            warn!(
                id,
                record_type = %record.record_type,
                name = %record.name,
                "evicted stale entry with the same name"
            );
        }

        insert_with_id(&mut *tx, id, user, record).await?;

        tx.commit().await?;
        Ok(())
    }
}

async fn insert_with_id<'e, E>(
    executor: E,
    id: i64,
    user: &str,
    record: &Record,
) -> Result<(), StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let res = sqlx::query(
        "INSERT INTO records (id, user_id, name, type, opaque, meta) \
         SELECT ?, id, ?, ?, ?, ? FROM users WHERE name = ?",
    )
    .bind(id)
    .bind(&record.name)
    .bind(record.record_type.as_str())
    .bind(&record.opaque)
    .bind(&record.meta)
    .bind(user)
    .execute(executor)
    .await
    .map_err(|e| duplicate(e, record))?;

    if res.rows_affected() != 1 {
        return Err(StoreError::NotFound(format!("user {user}")));
    }
    Ok(())
}

fn duplicate(err: sqlx::Error, record: &Record) -> StoreError {
    match StoreError::from(err) {
        StoreError::AlreadyExists(_) => {
            StoreError::AlreadyExists(format!("{} {}", record.record_type, record.name))
        }
        other => other,
    }
}

fn exactly_one(ids: Vec<i64>, what: impl FnOnce() -> String) -> Result<i64, StoreError> {
    match ids.as_slice() {
        [id] => Ok(*id),
        _ => Err(StoreError::NotFound(what())),
    }
}

fn collect_summaries(rows: Vec<RecordSummaryRow>) -> Result<Records, StoreError> {
    rows.into_iter()
        .map(|row| Record::try_from(row).map(|rec| (rec.id, rec)))
        .collect()
}
