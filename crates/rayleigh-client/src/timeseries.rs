use rayleigh_types::{Sensor, SensorFrame};
use serde_json::Value;
use std::borrow::Borrow;
use tracing::debug;

use crate::client::RayleighClient;
use crate::error::{RayleighError, Result};
use crate::reshape::reshape;
use crate::time::TimeBound;
use crate::transport::ApiRequest;

/// 构建批量查询串，把传感器按所属设备分组
///
/// 设备按首次出现的顺序排列，设备内保持传感器的原始顺序，例如
/// `A@x:(s1,s2),B@x:(s3)`。
pub fn build_query<S: Borrow<Sensor>>(sensors: &[S]) -> String {
    let mut groups: Vec<(&str, Vec<&str>)> = Vec::new();

    for sensor in sensors {
        let sensor: &Sensor = sensor.borrow();
        let group = groups
            .iter_mut()
            .find(|(device_id, _)| *device_id == sensor.device_id());
        match group {
            Some((_, ids)) => ids.push(sensor.id()),
            None => groups.push((sensor.device_id(), vec![sensor.id()])),
        }
    }

    groups
        .iter()
        .map(|(device_id, ids)| format!("{}:({})", device_id, ids.join(",")))
        .collect::<Vec<_>>()
        .join(",")
}

impl RayleighClient {
    /// 一次请求获取多个传感器在 `[from, to]` 内的原始时序数据
    ///
    /// 返回 `{device_id: {sensor_id: [[ts, v...], ...]}}`。
    /// `to` 早于 `from` 时不做检查，结果由 API 决定。
    ///
    /// # 错误
    /// * `InvalidArgument` - 传感器列表为空
    /// * `InvalidDate` - 时间无法解析
    pub async fn fetch_raw<S: Borrow<Sensor>>(
        &self,
        sensors: &[S],
        from: impl Into<TimeBound>,
        to: impl Into<TimeBound>,
    ) -> Result<Value> {
        if sensors.is_empty() {
            return Err(RayleighError::invalid_argument(
                "at least one sensor is required to fetch data",
            ));
        }

        let from = from.into().to_millis()?;
        let to = to.into().to_millis()?;
        let query = build_query(sensors);

        debug!(
            query = %query,
            from,
            to,
            sensor_count = sensors.len(),
            "Fetching time-series"
        );

        let request = ApiRequest::new(format!("data/{}", query))
            .with_param("from", from)
            .with_param("to", to);
        self.request(request).await
    }

    /// 获取多个传感器在 `[from, to]` 内的数据，返回长格式表
    ///
    /// 表按 (device, sensor_column, timestamp) 排序。多值传感器
    /// （如三相电表）每个时间点会拆成多行，列名为 `{id}_{i}`。
    ///
    /// # 错误
    /// * `NoData` - 所有传感器在该时间范围内都没有数据
    pub async fn get_data<S: Borrow<Sensor>>(
        &self,
        sensors: &[S],
        from: impl Into<TimeBound>,
        to: impl Into<TimeBound>,
    ) -> Result<SensorFrame> {
        let raw = self.fetch_raw(sensors, from, to).await?;
        reshape(&raw)
    }

    /// 获取单个传感器的数据
    pub async fn get_sensor_data(
        &self,
        sensor: &Sensor,
        from: impl Into<TimeBound>,
        to: impl Into<TimeBound>,
    ) -> Result<SensorFrame> {
        self.get_data(&[sensor], from, to).await
    }
}
