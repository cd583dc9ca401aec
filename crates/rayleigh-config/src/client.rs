use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::credentials::{decode_credentials, Credentials, CredentialsError};

/// 默认应用标识
pub const DEFAULT_APP_ID: &str = "uob";

/// 默认 API 地址
pub const DEFAULT_ENDPOINT: &str = "https://api.uxeon.com/consumer/v1";

fn default_app_id() -> String {
    DEFAULT_APP_ID.to_string()
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

/// 客户端配置
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API 用户名（通常是 rayleighconnect.net 的登录邮箱）
    pub client_id: String,

    /// 访问令牌
    pub access_token: String,

    /// 应用标识
    #[serde(default = "default_app_id")]
    pub app_id: String,

    /// API 地址
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// 以 info 级别记录每个请求的 URL（令牌已脱敏）
    #[serde(default)]
    pub debug: bool,

    /// 请求超时（毫秒），未设置时使用 HTTP 库的默认行为
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl ClientConfig {
    pub fn new(client_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            access_token: access_token.into(),
            app_id: default_app_id(),
            endpoint: default_endpoint(),
            debug: false,
            timeout_ms: None,
        }
    }

    pub fn from_credentials(credentials: Credentials) -> Self {
        Self::new(credentials.client_id, credentials.access_token)
    }

    /// 从令牌生成器返回的 base64 字符串创建配置
    pub fn from_auth_string(auth_string: &str) -> Result<Self, CredentialsError> {
        decode_credentials(auth_string).map(Self::from_credentials)
    }

    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = app_id.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// 设置请求超时，精度为毫秒（不足 1ms 的部分舍去）
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// 当前账户的请求前缀：`{endpoint}/{client_id}`
    pub fn base_url(&self) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), self.client_id)
    }

    /// 验证配置
    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(anyhow!("client_id must not be empty"));
        }
        if self.access_token.trim().is_empty() {
            return Err(anyhow!("access_token must not be empty"));
        }
        if self.app_id.trim().is_empty() {
            return Err(anyhow!("app_id must not be empty"));
        }
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(anyhow!(
                "endpoint must be an http(s) URL, got {}",
                self.endpoint
            ));
        }
        if self.timeout_ms == Some(0) {
            return Err(anyhow!("timeout_ms must be at least 1 millisecond"));
        }
        Ok(())
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("client_id", &self.client_id)
            .field("access_token", &"***")
            .field("app_id", &self.app_id)
            .field("endpoint", &self.endpoint)
            .field("debug", &self.debug)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}
