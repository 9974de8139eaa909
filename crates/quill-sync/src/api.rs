//! Request/response calls to the counterpart service.

use std::time::Duration;

use async_trait::async_trait;
use quill_core::config::AppConfig;
use quill_core::errors::ApiError;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

/// Client version sent as a cache-busting query on static resources.
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Body of `/api/system/getConf`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ConfResponse {
    pub conf: AppConfig,
    /// True when the server process has just started.
    #[serde(default)]
    pub start: bool,
}

#[async_trait]
pub trait ServerApi: Send + Sync {
    async fn get_conf(&self) -> Result<ConfResponse, ApiError>;
    async fn get_languages(&self, lang: &str) -> Result<Map<String, Value>, ApiError>;
    /// Signed-in cloud account, `None` when signed out.
    async fn get_cloud_user(&self) -> Result<Option<Value>, ApiError>;
    async fn get_emoji_conf(&self) -> Result<Vec<Value>, ApiError>;
    /// Ask the server to start its boot-time sync.
    async fn boot_sync(&self) -> Result<(), ApiError>;
}

/// Response envelope used by every `/api/*` endpoint.
#[derive(Deserialize)]
struct Envelope {
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Value,
}

/// [`ServerApi`] over HTTP.
pub struct HttpServerApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpServerApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read_body(resp: reqwest::Response) -> Result<Value, ApiError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status.as_u16(), body));
        }
        resp.json::<Value>()
            .await
            .map_err(|e| ApiError::MalformedResponse(e.to_string()))
    }

    /// POST `body` to an `/api/*` endpoint and decode `data`.
    async fn post<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<T, ApiError> {
        debug!(path, "api request");
        let resp = self
            .client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let envelope: Envelope = serde_json::from_value(Self::read_body(resp).await?)
            .map_err(|e| ApiError::MalformedResponse(e.to_string()))?;
        if envelope.code != 0 {
            return Err(ApiError::Server {
                code: envelope.code,
                msg: envelope.msg,
            });
        }
        serde_json::from_value(envelope.data).map_err(|e| ApiError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl ServerApi for HttpServerApi {
    async fn get_conf(&self) -> Result<ConfResponse, ApiError> {
        self.post("/api/system/getConf", Value::Object(Map::new())).await
    }

    async fn get_languages(&self, lang: &str) -> Result<Map<String, Value>, ApiError> {
        let url = self.url(&format!("/appearance/langs/{lang}.json"));
        debug!(%url, "language request");
        let resp = self
            .client
            .get(url)
            .query(&[("v", CLIENT_VERSION)])
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        serde_json::from_value(Self::read_body(resp).await?)
            .map_err(|e| ApiError::MalformedResponse(e.to_string()))
    }

    async fn get_cloud_user(&self) -> Result<Option<Value>, ApiError> {
        self.post("/api/setting/getCloudUser", Value::Object(Map::new())).await
    }

    async fn get_emoji_conf(&self) -> Result<Vec<Value>, ApiError> {
        self.post("/api/system/getEmojiConf", Value::Object(Map::new())).await
    }

    async fn boot_sync(&self) -> Result<(), ApiError> {
        let _: Value = self.post("/api/sync/performBootSync", Value::Object(Map::new())).await?;
        Ok(())
    }
}
