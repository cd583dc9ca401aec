use async_trait::async_trait;
use rayleigh_config::ClientConfig;
use reqwest::{Client, Method, Url};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{RayleighError, Result};

/// 一次 API 请求
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// 相对路径，两端不带斜杠，例如 `devices`
    pub path: String,
    pub method: Method,
    pub body: Option<Value>,
    /// 额外的查询参数（按插入顺序）
    pub params: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: Method::GET,
            body: None,
            params: Vec::new(),
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    /// 查询参数的值
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn validate(&self) -> Result<()> {
        if self.path.is_empty() || self.path.starts_with('/') || self.path.ends_with('/') {
            return Err(RayleighError::invalid_argument(format!(
                "path must be non-empty without leading or trailing slash: {:?}",
                self.path
            )));
        }
        Ok(())
    }
}

/// 传输层 trait
///
/// 发送一次请求并返回解析后的 JSON；非 2xx 响应和网络错误都直接返回，不重试。
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<Value>;
}

/// 基于 reqwest 的 HTTP 传输
///
/// 每个请求的地址为 `{endpoint}/{client_id}/{path}`，
/// 并自动附加 `app_id` 和 `access_token` 查询参数。
pub struct HttpTransport {
    client: Client,
    config: ClientConfig,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            config,
        })
    }

    /// 构建完整的请求 URL
    ///
    /// `access_token` 单独传入，日志输出时用 `***` 代替。
    pub fn build_url(&self, request: &ApiRequest, access_token: &str) -> Result<Url> {
        request.validate()?;

        let base = format!("{}/{}", self.config.base_url(), request.path);
        let params = request
            .params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .chain([
                ("app_id", self.config.app_id.as_str()),
                ("access_token", access_token),
            ]);

        Url::parse_with_params(&base, params)
            .map_err(|e| RayleighError::invalid_argument(format!("invalid url {}: {}", base, e)))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<Value> {
        let url = self.build_url(request, &self.config.access_token)?;
        let redacted = self.build_url(request, "***")?;

        let mut req = self.client.request(request.method.clone(), url);
        if let Some(body) = &request.body {
            req = req.json(body);
        }

        let response = req.send().await?;
        let status = response.status();

        if self.config.debug {
            info!(target: "rayleigh_client", url = %redacted, status = status.as_u16(), "Requested");
        } else {
            debug!(target: "rayleigh_client", url = %redacted, status = status.as_u16(), "Requested");
        }

        let text = response.text().await?;
        if !status.is_success() {
            return Err(RayleighError::Request {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}
