//! HTTP client for the record server.
//!
//! Speaks the ciphertext wire format only; encryption happens one level up
//! in [`crate::sync`].  Every request carries basic auth and a JSON content
//! type.  Transport failures and timeouts surface as
//! [`ClientError::Network`]; non-200 replies are mapped by status code.

use lb_proto::{Record, RecordType, Records, StatusResponse, User};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::ClientError;

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    user_name: String,
    password: String,
    full_name: String,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let base = Url::parse(&config.server_address).map_err(|e| {
            ClientError::Config(format!("server address {}: {e}", config.server_address))
        })?;
        if base.cannot_be_a_base() {
            return Err(ClientError::Config(format!(
                "server address {} is not a base URL",
                config.server_address
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .user_agent(concat!("lockbox/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(config.timeout())
            .pool_max_idle_per_host(0)
            .danger_accept_invalid_certs(config.https_insecure)
            .build()
            .map_err(|e| ClientError::Config(format!("http client: {e}")))?;

        Ok(Self {
            http,
            base,
            user_name: config.user_name.clone(),
            password: config.password.clone(),
            full_name: config.full_name.clone(),
        })
    }

    /// `POST /users` with the configured credentials.
    pub async fn register(&self) -> Result<i64, ClientError> {
        let user = User {
            name: self.user_name.clone(),
            full_name: self.full_name.clone(),
            password: self.password.clone(),
        };
        let req = self.http.post(self.url(&["users"])?).json(&user);
        let status: StatusResponse = read_json(send(req).await?).await?;
        Ok(status.id)
    }

    /// `GET /ping`: succeeds only if the credentials are accepted.
    pub async fn ping(&self) -> Result<(), ClientError> {
        self.call::<StatusResponse, ()>(Method::GET, &["ping"], None)
            .await
            .map(|_| ())
    }

    pub async fn store(&self, record: &Record) -> Result<i64, ClientError> {
        let status: StatusResponse = self
            .call(Method::POST, &["records"], Some(record))
            .await?;
        Ok(status.id)
    }

    pub async fn get(&self, id: i64) -> Result<Record, ClientError> {
        self.call::<_, ()>(Method::GET, &["records", &id.to_string()], None)
            .await
    }

    pub async fn get_by_type_name(
        &self,
        record_type: RecordType,
        name: &str,
    ) -> Result<Record, ClientError> {
        self.call::<_, ()>(Method::GET, &["records", record_type.as_str(), name], None)
            .await
    }

    pub async fn update(&self, id: i64, record: &Record) -> Result<(), ClientError> {
        self.call::<StatusResponse, _>(Method::PUT, &["records", &id.to_string()], Some(record))
            .await
            .map(|_| ())
    }

    /// Returns the id of the updated record.
    pub async fn update_by_type_name(
        &self,
        record_type: RecordType,
        name: &str,
        record: &Record,
    ) -> Result<i64, ClientError> {
        let status: StatusResponse = self
            .call(
                Method::PUT,
                &["records", record_type.as_str(), name],
                Some(record),
            )
            .await?;
        Ok(status.id)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ClientError> {
        self.call::<StatusResponse, ()>(Method::DELETE, &["records", &id.to_string()], None)
            .await
            .map(|_| ())
    }

    /// Returns the id of the deleted record.
    pub async fn delete_by_type_name(
        &self,
        record_type: RecordType,
        name: &str,
    ) -> Result<i64, ClientError> {
        let status: StatusResponse = self
            .call::<_, ()>(
                Method::DELETE,
                &["records", record_type.as_str(), name],
                None,
            )
            .await?;
        Ok(status.id)
    }

    pub async fn list(&self, record_type: Option<RecordType>) -> Result<Records, ClientError> {
        match record_type {
            Some(t) => {
                self.call::<_, ()>(Method::GET, &["records", "by_type", t.as_str()], None)
                    .await
            }
            None => self.call::<_, ()>(Method::GET, &["records"], None).await,
        }
    }

    async fn call<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
    ) -> Result<T, ClientError> {
        let url = self.url(segments)?;
        debug!(%method, %url, "request");
        let mut req = self
            .http
            .request(method, url)
            .basic_auth(&self.user_name, Some(&self.password));
        if let Some(body) = body {
            req = req.json(body);
        }
        read_json(send(req).await?).await
    }

    /// Each segment is percent-encoded, so record names may hold `/` or spaces.
    fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::Config(format!("bad server address {}", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

async fn send(req: RequestBuilder) -> Result<Response, ClientError> {
    req.send().await.map_err(ClientError::Network)
}

async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    let code = resp.status();
    let body = resp.bytes().await.map_err(ClientError::Network)?;
    if code == StatusCode::OK {
        return Ok(serde_json::from_slice(&body)?);
    }
    Err(status_error(code, &body))
}

fn status_error(code: StatusCode, body: &[u8]) -> ClientError {
    let status = serde_json::from_slice::<StatusResponse>(body)
        .map(|s| s.status)
        .unwrap_or_else(|_| String::from_utf8_lossy(body).trim().to_string());
    match code {
        StatusCode::NOT_FOUND => ClientError::NotFound(status),
        StatusCode::CONFLICT => ClientError::AlreadyExists(status),
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
        StatusCode::FORBIDDEN => ClientError::Forbidden,
        other => ClientError::Server {
            code: other.as_u16(),
            status,
        },
    }
}
