use std::future::Future;
use std::time::Duration;

use serde_json::Value;

use crate::config::Config;
use crate::error::RecoveryError;

/// エクスプローラーと手数料APIへのHTTPアクセスを抽象化したもの
///
/// 通信エラーと5xxは `RecoveryError::Transport`、4xxは `RecoveryError::HttpStatus`、
/// JSONとして読めないボディは `RecoveryError::MalformedResponse` として返す。リトライは行わない。
pub trait HttpTransport: Send + Sync {
    fn get_json(&self, url: &str) -> impl Future<Output = Result<Value, RecoveryError>> + Send;

    fn post_json(
        &self,
        url: &str,
        body: &Value,
    ) -> impl Future<Output = Result<Value, RecoveryError>> + Send;
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub disable_proxy: bool,
}

impl From<&Config> for TransportConfig {
    fn from(config: &Config) -> Self {
        TransportConfig {
            timeout: Duration::from_millis(config.timeout_ms),
            disable_proxy: config.disable_proxy,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: TransportConfig) -> Result<Self, RecoveryError> {
        let mut builder = reqwest::Client::builder().timeout(config.timeout);
        if config.disable_proxy {
            builder = builder.no_proxy();
        }

        let client = builder
            .build()
            .map_err(|e| RecoveryError::Config(format!("HTTPクライアントの初期化に失敗: {}", e)))?;
        Ok(ReqwestTransport { client })
    }

    async fn read_json(url: &str, resp: reqwest::Response) -> Result<Value, RecoveryError> {
        let status = resp.status();
        if status.is_client_error() {
            log::warn!("エクスプローラーがリクエストを拒否しました: {} ({})", url, status);
            return Err(RecoveryError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let resp = resp
            .error_for_status()
            .map_err(|e| RecoveryError::transport(url, e))?;
        let body = resp
            .text()
            .await
            .map_err(|e| RecoveryError::transport(url, e))?;

        serde_json::from_str(&body).map_err(|e| RecoveryError::malformed(url, e))
    }
}

impl HttpTransport for ReqwestTransport {
    async fn get_json(&self, url: &str) -> Result<Value, RecoveryError> {
        log::debug!("GET {}", url);
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RecoveryError::transport(url, e))?;
        Self::read_json(url, resp).await
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<Value, RecoveryError> {
        log::debug!("POST {}", url);
        let resp = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| RecoveryError::transport(url, e))?;
        Self::read_json(url, resp).await
    }
}
