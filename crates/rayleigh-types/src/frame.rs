use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// 长格式表中的一行
///
/// `sensor` 是输出列名：单值传感器为原始 ID，多值传感器为 `{id}_{i}`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub device_id: String,
    pub sensor: String,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl Observation {
    pub fn new(
        device_id: impl Into<String>,
        sensor: impl Into<String>,
        timestamp: DateTime<Utc>,
        value: f64,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            sensor: sensor.into(),
            timestamp,
            value,
        }
    }

    /// 索引键 (device, sensor_column, timestamp)
    pub fn key(&self) -> (&str, &str, DateTime<Utc>) {
        (&self.device_id, &self.sensor, self.timestamp)
    }

    fn cmp_key(&self, device_id: &str, sensor: &str, timestamp: DateTime<Utc>) -> Ordering {
        self.key().cmp(&(device_id, sensor, timestamp))
    }
}

/// 按 (device, sensor_column, timestamp) 升序排列的长格式时序表
///
/// 反序列化同样经过 `from_rows`，读入的行顺序不影响查找。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "FrameRows")]
pub struct SensorFrame {
    rows: Vec<Observation>,
}

#[derive(Deserialize)]
struct FrameRows {
    rows: Vec<Observation>,
}

impl From<FrameRows> for SensorFrame {
    fn from(frame: FrameRows) -> Self {
        SensorFrame::from_rows(frame.rows)
    }
}

impl From<Vec<Observation>> for SensorFrame {
    fn from(rows: Vec<Observation>) -> Self {
        SensorFrame::from_rows(rows)
    }
}

impl SensorFrame {
    /// 由任意顺序的行构建，构建时按索引键排序
    pub fn from_rows(mut rows: Vec<Observation>) -> Self {
        rows.sort_by(|a, b| a.key().cmp(&b.key()));
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.rows.iter()
    }

    pub fn into_rows(self) -> Vec<Observation> {
        self.rows
    }

    /// 值列，顺序与索引一致
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(|row| row.value)
    }

    /// 按完整索引键查找单个值
    pub fn get(&self, device_id: &str, sensor: &str, timestamp: DateTime<Utc>) -> Option<f64> {
        self.rows
            .binary_search_by(|row| row.cmp_key(device_id, sensor, timestamp))
            .ok()
            .map(|idx| self.rows[idx].value)
    }

    /// 某个设备某一列的全部行（按时间升序）
    pub fn series(&self, device_id: &str, sensor: &str) -> &[Observation] {
        let start = self.rows.partition_point(|row| {
            (row.device_id.as_str(), row.sensor.as_str()) < (device_id, sensor)
        });
        let end = start
            + self.rows[start..]
                .partition_point(|row| row.device_id == device_id && row.sensor == sensor);
        &self.rows[start..end]
    }

    /// 出现过的设备 ID（去重，升序）
    pub fn devices(&self) -> Vec<&str> {
        let mut devices: Vec<&str> = self.rows.iter().map(|row| row.device_id.as_str()).collect();
        devices.dedup();
        devices
    }

    /// 某个设备的输出列名（去重，升序）
    pub fn columns(&self, device_id: &str) -> Vec<&str> {
        let mut columns: Vec<&str> = self
            .rows
            .iter()
            .filter(|row| row.device_id == device_id)
            .map(|row| row.sensor.as_str())
            .collect();
        columns.dedup();
        columns
    }
}

impl<'a> IntoIterator for &'a SensorFrame {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(ms).unwrap()
    }

    fn sample() -> SensorFrame {
        SensorFrame::from_rows(vec![
            Observation::new("B@x", "e1", ts(2000), 4.0),
            Observation::new("A@x", "p1_1", ts(1000), 2.0),
            Observation::new("A@x", "p1_0", ts(2000), 3.0),
            Observation::new("A@x", "p1_0", ts(1000), 1.0),
        ])
    }

    #[test]
    fn test_rows_are_sorted() {
        let frame = sample();
        let keys: Vec<_> = frame.iter().map(|row| row.key()).collect();
        assert_eq!(
            keys,
            vec![
                ("A@x", "p1_0", ts(1000)),
                ("A@x", "p1_0", ts(2000)),
                ("A@x", "p1_1", ts(1000)),
                ("B@x", "e1", ts(2000)),
            ]
        );
        assert_eq!(frame.values().collect::<Vec<_>>(), vec![1.0, 3.0, 2.0, 4.0]);
    }

    #[test]
    fn test_lookup() {
        let frame = sample();
        assert_eq!(frame.get("A@x", "p1_1", ts(1000)), Some(2.0));
        assert_eq!(frame.get("A@x", "p1_1", ts(2000)), None);
        assert_eq!(frame.get("C@x", "e1", ts(1000)), None);
    }

    #[test]
    fn test_deserialize_sorts_rows() {
        let json = serde_json::json!({"rows": [
            {"device_id": "B@x", "sensor": "e1", "timestamp": "1970-01-01T00:00:01Z", "value": 1.0},
            {"device_id": "A@x", "sensor": "e2", "timestamp": "1970-01-01T00:00:01Z", "value": 2.0},
            {"device_id": "A@x", "sensor": "e1", "timestamp": "1970-01-01T00:00:01Z", "value": 3.0}
        ]});
        let frame: SensorFrame = serde_json::from_value(json).unwrap();

        assert_eq!(frame.devices(), vec!["A@x", "B@x"]);
        assert_eq!(frame.series("A@x", "e1").len(), 1);
        assert_eq!(frame.get("A@x", "e1", ts(1000)), Some(3.0));
        assert_eq!(frame.columns("A@x"), vec!["e1", "e2"]);
    }

    #[test]
    fn test_json_roundtrip_keeps_order() {
        let frame = sample();
        let json = serde_json::to_string(&frame).unwrap();
        let back: SensorFrame = serde_json::from_str(&json).unwrap();
        assert_eq!(back, frame);
    }

    #[test]
    fn test_series_and_columns() {
        let frame = sample();
        let series = frame.series("A@x", "p1_0");
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].timestamp, ts(1000));
        assert_eq!(series[1].timestamp, ts(2000));
        assert!(frame.series("A@x", "missing").is_empty());

        assert_eq!(frame.devices(), vec!["A@x", "B@x"]);
        assert_eq!(frame.columns("A@x"), vec!["p1_0", "p1_1"]);
        assert!(frame.columns("C@x").is_empty());
    }
}
