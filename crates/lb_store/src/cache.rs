//! Client-side mirror of server records.
//!
//! The cache is a [`Store`] opened on a local file, holding records in the
//! exact ciphertext form the server returned and under the ids the server
//! assigned.  It never decrypts and never checks staleness.  With no cache
//! file configured every mutation is a no-op and every lookup misses, so the
//! client degrades to server-only operation.

use std::path::Path;

use lb_proto::{Record, RecordType, Records};
use tracing::debug;

use crate::db::Store;
use crate::error::StoreError;

#[derive(Clone)]
pub struct Cache {
    inner: Option<Store>,
    user: String,
}

impl Cache {
    pub fn disabled(user: impl Into<String>) -> Self {
        Self {
            inner: None,
            user: user.into(),
        }
    }

    /// Open the cache file for `user`.  `None` or an empty path disables
    /// caching.  The user row is created on first use; it carries no
    /// credentials.
    pub async fn open(path: Option<&Path>, user: impl Into<String>) -> Result<Self, StoreError> {
        let user = user.into();
        let path = match path {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => {
                debug!(user = %user, "cache disabled");
                return Ok(Self::disabled(user));
            }
        };
        let store = Store::open(path).await?;
        store.ensure_user(&user).await?;
        Ok(Self {
            inner: Some(store),
            user,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Upsert `record` under the server-assigned `id`.
    pub async fn put(&self, id: i64, record: &Record) -> Result<(), StoreError> {
        match &self.inner {
            Some(store) => store.replace_record_with_id(id, &self.user, record).await,
            None => Ok(()),
        }
    }

    pub async fn get(&self, id: i64) -> Result<Record, StoreError> {
        self.store()?.get_record_by_id(&self.user, id).await
    }

    pub async fn get_by_type_name(
        &self,
        record_type: RecordType,
        name: &str,
    ) -> Result<Record, StoreError> {
        self.store()?
            .get_record_by_type_name(&self.user, record_type, name)
            .await
    }

    /// [`StoreError::NotFound`] if `id` was never cached.
    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        match &self.inner {
            Some(store) => store.delete_record_by_id(&self.user, id).await,
            None => Ok(()),
        }
    }

    pub async fn delete_by_type_name(
        &self,
        record_type: RecordType,
        name: &str,
    ) -> Result<(), StoreError> {
        match &self.inner {
            Some(store) => store
                .delete_record_by_type_name(&self.user, record_type, name)
                .await
                .map(|_| ()),
            None => Ok(()),
        }
    }

    /// Whatever has been mirrored so far; not a full copy of the server.
    pub async fn list(&self, record_type: Option<RecordType>) -> Result<Records, StoreError> {
        let Some(store) = &self.inner else {
            return Ok(Records::new());
        };
        match record_type {
            Some(t) => store.list_records_by_type(&self.user, t).await,
            None => store.list_records(&self.user).await,
        }
    }

    pub async fn close(&self) {
        if let Some(store) = &self.inner {
            store.close().await;
        }
    }

    fn store(&self) -> Result<&Store, StoreError> {
        self.inner
            .as_ref()
            .ok_or_else(|| StoreError::NotFound("cache disabled".into()))
    }
}
