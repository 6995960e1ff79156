//! Sync controller: server first, cache as mirror and fallback.
//!
//! Writes go to the server and are mirrored into the cache only after the
//! server acknowledged them, using the id it assigned and the exact
//! ciphertext it accepted.  Reads and listings fall back to the cache on a
//! network error and nothing else.  Writes and deletes never touch the cache
//! when the server is unreachable; there is no offline write queue.
//!
//! Cache maintenance after a successful server call is best effort: failures
//! are logged, not returned.

use lb_crypto::{decrypt_record, encrypt_record, key_from_file, RecordKey};
use lb_proto::{Record, RecordType, Records};
use lb_store::{Cache, StoreError};
use tracing::{debug, warn};

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::error::ClientError;

pub struct SyncClient {
    api: ApiClient,
    cache: Cache,
    key: RecordKey,
}

impl SyncClient {
    pub fn new(api: ApiClient, cache: Cache, key: RecordKey) -> Self {
        Self { api, cache, key }
    }

    /// Derive the key, open the cache and build the API client from `config`.
    /// The key file is checked before anything else is touched.
    pub async fn connect(config: &ClientConfig) -> Result<Self, ClientError> {
        let key = key_from_file(&config.key_file)?;
        let api = ApiClient::new(config)?;
        let cache = Cache::open(config.cache_path(), &config.user_name).await?;
        Ok(Self::new(api, cache, key))
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub async fn register(&self) -> Result<i64, ClientError> {
        self.api.register().await
    }

    pub async fn verify(&self) -> Result<(), ClientError> {
        self.api.ping().await
    }

    /// Encrypt and store a cleartext record; returns the server-assigned id.
    pub async fn store(&self, record: &Record) -> Result<i64, ClientError> {
        let sealed = encrypt_record(&self.key, record)?;
        let id = self.api.store(&sealed).await?;
        self.mirror(id, &sealed).await;
        Ok(id)
    }

    pub async fn get(&self, id: i64) -> Result<Record, ClientError> {
        let sealed = match self.api.get(id).await {
            Ok(sealed) => {
                self.mirror(id, &sealed).await;
                sealed
            }
            Err(ClientError::Network(e)) => {
                warn!(id, error = %e, "server unreachable, reading from cache");
                let cached = self.cache.get(id).await;
                self.from_cache(cached, e)?
            }
            Err(e) => return Err(e),
        };
        Ok(decrypt_record(&self.key, &sealed)?)
    }

    pub async fn get_by_type_name(
        &self,
        record_type: RecordType,
        name: &str,
    ) -> Result<Record, ClientError> {
        let sealed = match self.api.get_by_type_name(record_type, name).await {
            Ok(sealed) => {
                self.mirror(sealed.id, &sealed).await;
                sealed
            }
            Err(ClientError::Network(e)) => {
                warn!(%record_type, name, error = %e, "server unreachable, reading from cache");
                let cached = self.cache.get_by_type_name(record_type, name).await;
                self.from_cache(cached, e)?
            }
            Err(e) => return Err(e),
        };
        Ok(decrypt_record(&self.key, &sealed)?)
    }

    /// Full replace of record `id` with the cleartext `record`.
    pub async fn update(&self, id: i64, record: &Record) -> Result<(), ClientError> {
        let sealed = encrypt_record(&self.key, record)?;
        self.api.update(id, &sealed).await?;
        self.mirror(id, &sealed).await;
        Ok(())
    }

    /// Full replace of the record addressed by `(record_type, name)`;
    /// returns its id.
    pub async fn update_by_type_name(
        &self,
        record_type: RecordType,
        name: &str,
        record: &Record,
    ) -> Result<i64, ClientError> {
        let sealed = encrypt_record(&self.key, record)?;
        let id = self
            .api
            .update_by_type_name(record_type, name, &sealed)
            .await?;
        self.mirror(id, &sealed).await;
        Ok(id)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ClientError> {
        self.api.delete(id).await?;
        self.forget(id).await;
        Ok(())
    }

    /// Returns the id of the deleted record.
    pub async fn delete_by_type_name(
        &self,
        record_type: RecordType,
        name: &str,
    ) -> Result<i64, ClientError> {
        let id = self.api.delete_by_type_name(record_type, name).await?;
        self.forget(id).await;
        Ok(id)
    }

    /// Names and types only.  Offline, this is whatever the cache has seen,
    /// which may be a subset of the server's collection.
    pub async fn list(&self, record_type: Option<RecordType>) -> Result<Records, ClientError> {
        match self.api.list(record_type).await {
            Ok(records) => Ok(records),
            Err(ClientError::Network(e)) => {
                warn!(error = %e, "server unreachable, listing from cache");
                if !self.cache.is_enabled() {
                    return Err(ClientError::Network(e));
                }
                Ok(self.cache.list(record_type).await?)
            }
            Err(e) => Err(e),
        }
    }

    /// Resolve a cache lookup made after `network` failed.  Without a cache
    /// the original transport error is what the caller needs to see.
    fn from_cache(
        &self,
        cached: Result<Record, StoreError>,
        network: reqwest::Error,
    ) -> Result<Record, ClientError> {
        match cached {
            Ok(record) => Ok(record),
            Err(_) if !self.cache.is_enabled() => Err(ClientError::Network(network)),
            Err(e) => Err(e.into()),
        }
    }

    async fn mirror(&self, id: i64, sealed: &Record) {
        if let Err(e) = self.cache.put(id, sealed).await {
            warn!(id, error = %e, "cannot update cache");
        }
    }

    async fn forget(&self, id: i64) {
        match self.cache.delete(id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => debug!(id, "record was not cached"),
            Err(e) => warn!(id, error = %e, "cannot drop record from cache"),
        }
    }
}
