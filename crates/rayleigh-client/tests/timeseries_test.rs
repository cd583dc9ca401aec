
use chrono::{DateTime, TimeZone, Utc};
use rayleigh_client::{RayleighError, Sensor};
use serde_json::json;
use test_helpers::{catalog_transport, create_test_client, MockTransport};

const FROM_MS: i64 = 1_609_459_200_000; // 2021-01-01T00:00:00Z
const TO_MS: i64 = 1_609_545_600_000; // 2021-01-02T00:00:00Z

fn ts(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap()
}

/// 完整流程：目录 -> 批量查询 -> 长格式表
#[tokio::test]
async fn test_catalog_to_frame() {
    let transport = catalog_transport().respond(
        "data/A@x:(e1,p1),B@x:(e1)",
        json!({
            "A@x": {
                "e1": [[FROM_MS + 1000, 5.0], [FROM_MS, 4.0]],
                "p1": [[FROM_MS, 1.0, 2.0, 3.0]]
            },
            "B@x": {"e1": []}
        }),
    );
    let (client, transport) = create_test_client(transport);

    let devices = client.get_devices(&[]).await.unwrap();
    let sensors = client
        .get_sensors_for_devices(&devices, &["e1", "p1"])
        .await
        .unwrap();
    let frame = client
        .get_data(&sensors, "2021-01-01", "2021-01-02")
        .await
        .unwrap();

    // e1 两条单值记录 + p1 一条三相记录
    assert_eq!(frame.len(), 2 + 3);
    assert_eq!(frame.devices(), vec!["A@x"]);
    assert_eq!(frame.columns("A@x"), vec!["e1", "p1_0", "p1_1", "p1_2"]);

    let e1: Vec<f64> = frame.series("A@x", "e1").iter().map(|r| r.value).collect();
    assert_eq!(e1, vec![4.0, 5.0]);
    assert_eq!(frame.get("A@x", "p1_2", ts(FROM_MS)), Some(3.0));

    let request = transport.requests().pop().unwrap();
    assert_eq!(request.path, "data/A@x:(e1,p1),B@x:(e1)");
    assert_eq!(request.param("from"), Some(FROM_MS.to_string().as_str()));
    assert_eq!(request.param("to"), Some(TO_MS.to_string().as_str()));
}

#[tokio::test]
async fn test_single_sensor_data() {
    let transport =
        MockTransport::new().respond("data/A@x:(e1)", json!({"A@x": {"e1": [[1000, 5.0]]}}));
    let (client, transport) = create_test_client(transport);

    let sensor = Sensor::new("A@x", "e1");
    let from = Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap();
    let frame = client.get_sensor_data(&sensor, from, 2000i64).await.unwrap();

    assert_eq!(frame.len(), 1);
    let row = &frame.rows()[0];
    assert_eq!(row.key(), ("A@x", "e1", ts(1000)));
    assert_eq!(row.value, 5.0);

    let requests = transport.requests();
    let request = &requests[0];
    assert_eq!(request.param("from"), Some("0"));
    assert_eq!(request.param("to"), Some("2000"));
}

/// 所有传感器都没有数据时返回 NoData，而不是空表
#[tokio::test]
async fn test_empty_response_is_no_data() {
    let transport = MockTransport::new().respond("data/A@x:(e1)", json!({"A@x": {"e1": []}}));
    let (client, _) = create_test_client(transport);

    let err = client
        .get_data(&[Sensor::new("A@x", "e1")], "2021-01-01", "2021-01-02")
        .await
        .unwrap_err();
    assert!(matches!(err, RayleighError::NoData));
    assert!(!err.is_transport());
}

/// 空传感器列表在发请求之前就失败
#[tokio::test]
async fn test_empty_sensor_list_is_invalid() {
    let (client, transport) = create_test_client(MockTransport::new());

    let sensors: Vec<Sensor> = Vec::new();
    let err = client
        .get_data(&sensors, "2021-01-01", "2021-01-02")
        .await
        .unwrap_err();
    assert!(matches!(err, RayleighError::InvalidArgument(_)));
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_invalid_date_is_rejected() {
    let (client, transport) = create_test_client(MockTransport::new());

    let err = client
        .get_data(&[Sensor::new("A@x", "e1")], "last tuesday", "2021-01-02")
        .await
        .unwrap_err();
    assert!(matches!(err, RayleighError::InvalidDate(_)));
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_fetch_raw_returns_body_untouched() {
    let body = json!({"A@x": {"e1": [], "e2": [[1000, 1.0]]}});
    let transport = MockTransport::new().respond("data/A@x:(e1,e2)", body.clone());
    let (client, _) = create_test_client(transport);

    let sensors = vec![Sensor::new("A@x", "e1"), Sensor::new("A@x", "e2")];
    let raw = client.fetch_raw(&sensors, FROM_MS, TO_MS).await.unwrap();
    assert_eq!(raw, body);
}

#[tokio::test]
async fn test_data_request_failure_propagates() {
    let transport = MockTransport::new().fail("data/A@x:(e1)", 500, "upstream timeout");
    let (client, _) = create_test_client(transport);

    let err = client
        .get_data(&[Sensor::new("A@x", "e1")], FROM_MS, TO_MS)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(500));
}
