use rayleigh_config::ClientConfig;
use rayleigh_types::Device;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::error::Result;
use crate::transport::{ApiRequest, HttpTransport, Transport};

/// rayleighconnect API 客户端
///
/// 只发起 GET 请求来读取设备、传感器和时序数据。
/// 设备列表在首次访问时加载并缓存，客户端生命周期内不会刷新；
/// 需要最新数据时请创建新的客户端。
///
/// 所有操作都是顺序执行的，同一时刻最多只有一个请求在进行中。
pub struct RayleighClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    pub(crate) devices: OnceCell<Vec<Device>>,
}

impl RayleighClient {
    /// 使用 HTTP 传输创建客户端
    ///
    /// # 错误
    /// * `Config` - 配置验证失败
    /// * `Connection` - HTTP 客户端初始化失败
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(config.clone())?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// 使用自定义传输创建客户端
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            devices: OnceCell::new(),
        }
    }

    /// 从令牌生成器返回的 base64 字符串创建客户端
    pub fn from_auth_string(auth_string: &str) -> Result<Self> {
        Self::new(ClientConfig::from_auth_string(auth_string)?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// 发起一次原始 API 请求
    ///
    /// 客户端自身只发 GET；通过 `ApiRequest::with_method` 可以使用其他方法。
    pub async fn request(&self, request: ApiRequest) -> Result<Value> {
        self.transport.send(&request).await
    }
}

impl std::fmt::Debug for RayleighClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RayleighClient")
            .field("config", &self.config)
            .field("devices_loaded", &self.devices.initialized())
            .finish()
    }
}
