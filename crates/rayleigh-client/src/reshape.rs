use chrono::{DateTime, Utc};
use rayleigh_types::{Observation, SensorFrame};
use serde_json::Value;
use tracing::debug;

use crate::error::{RayleighError, Result};

/// 单个传感器的输出列规划
///
/// 每条记录为 `[timestamp_ms, v_0, .., v_{k-1}]`，k 为列数。
/// k = 1 时列名就是传感器 ID，否则为 `{id}_0 .. {id}_{k-1}`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPlan {
    pub sensor_id: String,
    pub columns: Vec<String>,
}

impl ColumnPlan {
    pub fn arity(&self) -> usize {
        self.columns.len()
    }
}

fn record_slots<'a>(sensor_id: &str, record: &'a Value) -> Result<&'a [Value]> {
    match record {
        Value::Array(slots) if slots.len() >= 2 => Ok(slots),
        Value::Array(slots) => Err(RayleighError::malformed(format!(
            "record for sensor {} has {} slot(s), expected at least 2",
            sensor_id,
            slots.len()
        ))),
        other => Err(RayleighError::malformed(format!(
            "record for sensor {} is not an array: {}",
            sensor_id, other
        ))),
    }
}

/// 根据记录推断列规划
///
/// 列数取自第一条记录；后续记录列数不一致时返回 `MalformedResponse`。
/// `records` 不能为空。
pub fn plan_columns(sensor_id: &str, records: &[Value]) -> Result<ColumnPlan> {
    let first = records.first().ok_or_else(|| {
        RayleighError::invalid_argument(format!("sensor {} has no records to plan", sensor_id))
    })?;
    let width = record_slots(sensor_id, first)?.len();

    for record in &records[1..] {
        let len = record_slots(sensor_id, record)?.len();
        if len != width {
            return Err(RayleighError::malformed(format!(
                "sensor {} changes arity from {} to {} within one series",
                sensor_id,
                width - 1,
                len - 1
            )));
        }
    }

    let arity = width - 1;
    let columns = if arity == 1 {
        vec![sensor_id.to_string()]
    } else {
        (0..arity).map(|i| format!("{}_{}", sensor_id, i)).collect()
    };

    Ok(ColumnPlan {
        sensor_id: sensor_id.to_string(),
        columns,
    })
}

fn parse_timestamp(sensor_id: &str, value: &Value) -> Result<DateTime<Utc>> {
    let ms = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.floor() as i64)),
        _ => None,
    };
    ms.and_then(DateTime::from_timestamp_millis).ok_or_else(|| {
        RayleighError::malformed(format!(
            "invalid timestamp for sensor {}: {}",
            sensor_id, value
        ))
    })
}

fn parse_value(sensor_id: &str, value: &Value) -> Result<f64> {
    match value {
        Value::Null => Ok(f64::NAN),
        Value::Number(n) => n.as_f64().ok_or_else(|| {
            RayleighError::malformed(format!("value out of range for sensor {}: {}", sensor_id, n))
        }),
        other => Err(RayleighError::malformed(format!(
            "non-numeric value for sensor {}: {}",
            sensor_id, other
        ))),
    }
}

/// 将一个传感器的记录展开为长格式行
fn melt(
    device_id: &str,
    plan: &ColumnPlan,
    records: &[Value],
    rows: &mut Vec<Observation>,
) -> Result<()> {
    for record in records {
        let slots = record_slots(&plan.sensor_id, record)?;
        let timestamp = parse_timestamp(&plan.sensor_id, &slots[0])?;
        for (column, slot) in plan.columns.iter().zip(&slots[1..]) {
            rows.push(Observation {
                device_id: device_id.to_string(),
                sensor: column.clone(),
                timestamp,
                value: parse_value(&plan.sensor_id, slot)?,
            });
        }
    }
    Ok(())
}

/// 将原始时序响应转换为长格式表
///
/// 输入结构为 `{device_id: {sensor_id: [[ts, v...], ...]}}`。
/// 空的（或为 null 的）记录列表会被跳过；所有传感器都没有数据时返回 `NoData`。
pub fn reshape(raw: &Value) -> Result<SensorFrame> {
    let devices = raw
        .as_object()
        .ok_or_else(|| RayleighError::malformed("time-series response is not an object"))?;

    let mut rows = Vec::new();
    let mut series = 0usize;

    for (device_id, device_data) in devices {
        let sensors = match device_data {
            Value::Object(sensors) => sensors,
            Value::Null => continue,
            other => {
                return Err(RayleighError::malformed(format!(
                    "data for device {} is not an object: {}",
                    device_id, other
                )))
            }
        };

        for (sensor_id, sensor_data) in sensors {
            let records = match sensor_data {
                Value::Array(records) if !records.is_empty() => records,
                Value::Array(_) | Value::Null => continue,
                other => {
                    return Err(RayleighError::malformed(format!(
                        "data for sensor {}:({}) is not a list: {}",
                        device_id, sensor_id, other
                    )))
                }
            };

            let plan = plan_columns(sensor_id, records)?;
            melt(device_id, &plan, records, &mut rows)?;
            series += 1;
        }
    }

    if series == 0 {
        return Err(RayleighError::NoData);
    }

    debug!(series, rows = rows.len(), "Reshaped time-series response");
    Ok(SensorFrame::from_rows(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ts(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(ms).unwrap()
    }

    #[test]
    fn test_plan_single_column() {
        let records = vec![json!([1000, 5.0])];
        let plan = plan_columns("e1", &records).unwrap();
        assert_eq!(plan.columns, vec!["e1"]);
        assert_eq!(plan.arity(), 1);
    }

    #[test]
    fn test_plan_multi_column() {
        let records = vec![json!([1000, 1.0, 2.0, 3.0]), json!([2000, 4.0, 5.0, 6.0])];
        let plan = plan_columns("p1", &records).unwrap();
        assert_eq!(plan.columns, vec!["p1_0", "p1_1", "p1_2"]);
    }

    #[test]
    fn test_plan_rejects_arity_drift() {
        let records = vec![json!([1000, 1.0, 2.0]), json!([2000, 4.0])];
        let err = plan_columns("p1", &records).unwrap_err();
        assert!(matches!(err, RayleighError::MalformedResponse(_)));
    }

    #[test]
    fn test_plan_rejects_short_record() {
        let err = plan_columns("e1", &[json!([1000])]).unwrap_err();
        assert!(matches!(err, RayleighError::MalformedResponse(_)));
    }

    #[test]
    fn test_single_value_sensor() {
        let frame = reshape(&json!({"A@x": {"e1": [[1000, 5.0]]}})).unwrap();
        assert_eq!(frame.len(), 1);
        let row = &frame.rows()[0];
        assert_eq!(row.key(), ("A@x", "e1", ts(1000)));
        assert_eq!(row.value, 5.0);
    }

    #[test]
    fn test_three_phase_sensor() {
        let frame = reshape(&json!({"A@x": {"p1": [[1000, 1.0, 2.0, 3.0]]}})).unwrap();
        let rows: Vec<_> = frame
            .iter()
            .map(|r| (r.device_id.as_str(), r.sensor.as_str(), r.timestamp, r.value))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("A@x", "p1_0", ts(1000), 1.0),
                ("A@x", "p1_1", ts(1000), 2.0),
                ("A@x", "p1_2", ts(1000), 3.0),
            ]
        );
    }

    #[test]
    fn test_row_count_is_records_times_arity() {
        let raw = json!({
            "B@x": {"p1": [[3000, 1, 2], [1000, 3, 4], [2000, 5, 6]]},
            "A@x": {"e1": [[2000, 7], [1000, 8]], "e2": []}
        });
        let frame = reshape(&raw).unwrap();
        assert_eq!(frame.len(), 3 * 2 + 2);

        let keys: Vec<_> = frame.iter().map(|r| r.key()).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(keys, sorted);
        assert_eq!(frame.get("B@x", "p1_1", ts(1000)), Some(4.0));
    }

    #[test]
    fn test_all_empty_is_no_data() {
        let err = reshape(&json!({"A@x": {"e1": []}})).unwrap_err();
        assert!(matches!(err, RayleighError::NoData));

        let err = reshape(&json!({})).unwrap_err();
        assert!(matches!(err, RayleighError::NoData));

        let err = reshape(&json!({"A@x": {"e1": null}, "B@x": {}})).unwrap_err();
        assert!(matches!(err, RayleighError::NoData));
    }

    #[test]
    fn test_null_value_becomes_nan() {
        let frame = reshape(&json!({"A@x": {"p1": [[1000, null, 2.5]]}})).unwrap();
        assert!(frame.get("A@x", "p1_0", ts(1000)).unwrap().is_nan());
        assert_eq!(frame.get("A@x", "p1_1", ts(1000)), Some(2.5));
    }

    #[test]
    fn test_float_timestamp() {
        let frame = reshape(&json!({"A@x": {"e1": [[1500.0, 1]]}})).unwrap();
        assert_eq!(frame.rows()[0].timestamp, ts(1500));

        let frame = reshape(&json!({"A@x": {"e1": [[1500.7, 1]]}})).unwrap();
        assert_eq!(frame.rows()[0].timestamp, ts(1500));

        // 负的小数毫秒向下取整
        let frame = reshape(&json!({"A@x": {"e1": [[-1.5, 1]]}})).unwrap();
        assert_eq!(frame.rows()[0].timestamp, ts(-2));
    }

    #[test]
    fn test_malformed_shapes() {
        for raw in [
            json!([1, 2, 3]),
            json!({"A@x": [1, 2]}),
            json!({"A@x": {"e1": "oops"}}),
            json!({"A@x": {"e1": [[1000, "high"]]}}),
            json!({"A@x": {"e1": [["noon", 1.0]]}}),
        ] {
            let err = reshape(&raw).unwrap_err();
            assert!(matches!(err, RayleighError::MalformedResponse(_)), "{}", raw);
        }
    }
}
