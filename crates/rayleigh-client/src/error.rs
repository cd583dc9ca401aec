use rayleigh_config::CredentialsError;
use thiserror::Error;

/// 客户端错误类型
#[derive(Error, Debug)]
pub enum RayleighError {
    /// API 返回非 2xx 状态码
    #[error("Request failed with status {status}: {body}")]
    Request { status: u16, body: String },

    /// 网络连接失败
    #[error("Connection error: {0}")]
    Connection(#[from] reqwest::Error),

    /// 设备未找到
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// 传感器未找到
    #[error("Sensor not found: {device_id}:({sensor_id})")]
    SensorNotFound { device_id: String, sensor_id: String },

    /// 请求成功，但所有传感器在该时间范围内都没有数据
    #[error("No data for this device/sensor/datetime combination")]
    NoData,

    /// 参数无效
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// 无法解析的时间
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// 响应结构与约定不符
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// 响应不是合法的 JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 凭据解码失败
    #[error("Credentials error: {0}")]
    Credentials(#[from] CredentialsError),

    /// 配置错误
    #[error(transparent)]
    Config(#[from] anyhow::Error),
}

/// 客户端结果类型
pub type Result<T> = std::result::Result<T, RayleighError>;

impl RayleighError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        RayleighError::MalformedResponse(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        RayleighError::InvalidArgument(msg.into())
    }

    /// 是否为设备或传感器未找到
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RayleighError::DeviceNotFound(_) | RayleighError::SensorNotFound { .. }
        )
    }

    /// 是否为传输层错误（HTTP 状态或网络）
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            RayleighError::Request { .. } | RayleighError::Connection(_)
        )
    }

    /// HTTP 状态码（如果有）
    pub fn status(&self) -> Option<u16> {
        match self {
            RayleighError::Request { status, .. } => Some(*status),
            RayleighError::Connection(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
