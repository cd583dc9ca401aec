use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tokio::sync::OnceCell;

/// 从参数表中取出 `id` 字段
///
/// API 通常返回字符串，个别传感器 ID 是纯数字（如 `158`），两种都接受。
fn extract_id(params: &Map<String, Value>) -> Option<String> {
    match params.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// 远程设备
///
/// 设备 ID 的格式为 `<数字ID>@<厂商>`，例如 `300000000000000@rayleigh`。
/// 传感器列表按需加载，每个 `Device` 实例只请求一次，之后不会失效。
#[derive(Debug, Clone)]
pub struct Device {
    id: String,
    params: Map<String, Value>,
    sensors: OnceCell<Vec<Sensor>>,
}

impl Device {
    /// 从 API 返回的参数表创建设备，缺少 `id` 时返回 None
    pub fn from_params(params: Map<String, Value>) -> Option<Self> {
        let id = extract_id(&params)?;
        Some(Self {
            id,
            params,
            sensors: OnceCell::new(),
        })
    }

    /// 仅凭 ID 创建设备（参数表只包含 `id`）
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let mut params = Map::new();
        params.insert("id".to_string(), Value::String(id.clone()));
        Self {
            id,
            params,
            sensors: OnceCell::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// API 返回的原始参数
    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    /// 传感器缓存单元，由客户端在首次访问时填充
    pub fn sensor_cache(&self) -> &OnceCell<Vec<Sensor>> {
        &self.sensors
    }

    /// 已加载的传感器，尚未加载时返回 None
    pub fn cached_sensors(&self) -> Option<&[Sensor]> {
        self.sensors.get().map(Vec::as_slice)
    }
}

impl PartialEq for Device {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.params == other.params
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Device({})", self.id)
    }
}

/// 设备上的一个测量通道
///
/// 传感器 ID（如 `e1`、`e1.i3p`）只在所属设备内唯一，
/// 需要和设备 ID 组合才能唯一确定一个传感器。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    id: String,
    device_id: String,
    params: Map<String, Value>,
}

impl Sensor {
    /// 从 API 返回的参数表创建传感器，缺少 `id` 时返回 None
    pub fn from_params(device_id: impl Into<String>, params: Map<String, Value>) -> Option<Self> {
        let id = extract_id(&params)?;
        Some(Self {
            id,
            device_id: device_id.into(),
            params,
        })
    }

    pub fn new(device_id: impl Into<String>, id: impl Into<String>) -> Self {
        let id = id.into();
        let mut params = Map::new();
        params.insert("id".to_string(), Value::String(id.clone()));
        Self {
            id,
            device_id: device_id.into(),
            params,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// 所属设备的 ID
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sensor({}:({}))", self.device_id, self.id)
    }
}

/// 格式化设备列表，例如 `DevicesList([A@x, B@x])`
pub fn display_devices<'a, I>(devices: I) -> String
where
    I: IntoIterator<Item = &'a Device>,
{
    let ids: Vec<&str> = devices.into_iter().map(Device::id).collect();
    format!("DevicesList([{}])", ids.join(", "))
}

/// 格式化传感器列表，例如 `SensorList([A@x:(e1), B@x:(e2)])`
pub fn display_sensors<'a, I>(sensors: I) -> String
where
    I: IntoIterator<Item = &'a Sensor>,
{
    let ids: Vec<String> = sensors
        .into_iter()
        .map(|s| format!("{}:({})", s.device_id, s.id))
        .collect();
    format!("SensorList([{}])", ids.join(", "))
}
