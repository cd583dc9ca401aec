use rayleigh_types::{Device, Sensor};
use serde_json::Value;
use tracing::debug;

use crate::client::RayleighClient;
use crate::error::{RayleighError, Result};
use crate::transport::ApiRequest;

/// 解析 `devices` 响应：设备参数表的列表，每项必须带 `id`
fn parse_devices(body: Value) -> Result<Vec<Device>> {
    let entries = match body {
        Value::Array(entries) => entries,
        other => {
            return Err(RayleighError::malformed(format!(
                "device listing is not a list: {}",
                other
            )))
        }
    };

    entries
        .into_iter()
        .map(|entry| match entry {
            Value::Object(params) => Device::from_params(params)
                .ok_or_else(|| RayleighError::malformed("device entry without an id")),
            other => Err(RayleighError::malformed(format!(
                "device entry is not an object: {}",
                other
            ))),
        })
        .collect()
}

/// 解析 `devices/{id}` 响应
///
/// 外层只有一个以设备 ID 为键的对象，内层是 sensor_key => 参数表。
/// 参数表自身带 `id`，所以内层键被丢弃。
fn parse_sensors(device_id: &str, body: Value) -> Result<Vec<Sensor>> {
    let mut outer = match body {
        Value::Object(outer) => outer,
        other => {
            return Err(RayleighError::malformed(format!(
                "sensor listing is not an object: {}",
                other
            )))
        }
    };

    let sensors = match outer.remove(device_id) {
        Some(Value::Object(sensors)) => sensors,
        Some(other) => {
            return Err(RayleighError::malformed(format!(
                "sensors of device {} are not an object: {}",
                device_id, other
            )))
        }
        None => {
            return Err(RayleighError::malformed(format!(
                "sensor listing does not contain device {}",
                device_id
            )))
        }
    };

    sensors
        .into_iter()
        .map(|(key, params)| match params {
            Value::Object(params) => Sensor::from_params(device_id, params).ok_or_else(|| {
                RayleighError::malformed(format!("sensor {} of {} has no id", key, device_id))
            }),
            other => Err(RayleighError::malformed(format!(
                "sensor {} of {} is not an object: {}",
                key, device_id, other
            ))),
        })
        .collect()
}

fn wanted(ids: &[&str], id: &str) -> bool {
    ids.is_empty() || ids.contains(&id)
}

impl RayleighClient {
    /// 获取账户下的全部设备
    ///
    /// 结果会被缓存，客户端生命周期内只请求一次。
    pub async fn list_devices(&self) -> Result<&[Device]> {
        let devices = self
            .devices
            .get_or_try_init(|| async {
                let body = self.request(ApiRequest::new("devices")).await?;
                let devices = parse_devices(body)?;
                debug!(device_count = devices.len(), "Loaded device catalog");
                Ok::<_, RayleighError>(devices)
            })
            .await?;
        Ok(devices.as_slice())
    }

    /// 获取一个或多个设备
    ///
    /// 结果按设备列表的顺序返回（而不是 `device_ids` 的顺序）；
    /// 找不到的设备直接忽略。`device_ids` 为空时返回全部设备。
    pub async fn get_devices(&self, device_ids: &[&str]) -> Result<Vec<&Device>> {
        Ok(self
            .list_devices()
            .await?
            .iter()
            .filter(|device| wanted(device_ids, device.id()))
            .collect())
    }

    /// 获取指定设备
    ///
    /// # 错误
    /// * `DeviceNotFound` - 设备不存在
    pub async fn get_device(&self, device_id: &str) -> Result<&Device> {
        self.get_devices(&[device_id])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RayleighError::DeviceNotFound(device_id.to_string()))
    }

    /// 获取设备上的全部传感器
    ///
    /// 结果缓存在 `Device` 实例上，每个实例只请求一次。
    pub async fn list_sensors<'a>(&self, device: &'a Device) -> Result<&'a [Sensor]> {
        let sensors = device
            .sensor_cache()
            .get_or_try_init(|| async {
                let body = self
                    .request(ApiRequest::new(format!("devices/{}", device.id())))
                    .await?;
                let sensors = parse_sensors(device.id(), body)?;
                debug!(
                    device_id = %device.id(),
                    sensor_count = sensors.len(),
                    "Loaded sensor catalog"
                );
                Ok::<_, RayleighError>(sensors)
            })
            .await?;
        Ok(sensors.as_slice())
    }

    /// 获取设备上的一个或多个传感器，规则同 `get_devices`
    pub async fn get_sensors<'a>(
        &self,
        device: &'a Device,
        sensor_ids: &[&str],
    ) -> Result<Vec<&'a Sensor>> {
        Ok(self
            .list_sensors(device)
            .await?
            .iter()
            .filter(|sensor| wanted(sensor_ids, sensor.id()))
            .collect())
    }

    /// 获取设备上的指定传感器
    ///
    /// # 错误
    /// * `SensorNotFound` - 传感器不存在
    pub async fn get_device_sensor<'a>(
        &self,
        device: &'a Device,
        sensor_id: &str,
    ) -> Result<&'a Sensor> {
        self.get_sensors(device, &[sensor_id])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RayleighError::SensorNotFound {
                device_id: device.id().to_string(),
                sensor_id: sensor_id.to_string(),
            })
    }

    /// 在多个设备上分别查找传感器，按设备顺序拼接结果
    ///
    /// 同一个传感器 ID 出现在多个设备上时，每个设备各返回一个。
    pub async fn get_sensors_for_devices<'a>(
        &self,
        devices: &[&'a Device],
        sensor_ids: &[&str],
    ) -> Result<Vec<&'a Sensor>> {
        let mut sensors = Vec::new();
        for &device in devices {
            sensors.extend(self.get_sensors(device, sensor_ids).await?);
        }
        Ok(sensors)
    }
}
