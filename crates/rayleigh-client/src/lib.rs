//! rayleighconnect 传感器遥测 API 客户端
//!
//! 读取设备和传感器目录，并把批量时序查询的嵌套 JSON 转换为
//! 以 (device, sensor, timestamp) 为索引的长格式表。

pub mod catalog;
pub mod client;
pub mod error;
pub mod reshape;
pub mod time;
pub mod timeseries;
pub mod transport;

pub use client::RayleighClient;
pub use error::{RayleighError, Result};
pub use reshape::{plan_columns, reshape, ColumnPlan};
pub use time::{parse_datetime, TimeBound};
pub use timeseries::build_query;
pub use transport::{ApiRequest, HttpTransport, Transport};

pub use rayleigh_config::{decode_credentials, ClientConfig, ConfigLoader, Credentials};
pub use rayleigh_types::{Device, Observation, Sensor, SensorFrame};
