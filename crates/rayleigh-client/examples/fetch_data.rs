/// rayleigh-client 基本使用示例
///
/// 从当前目录（或第一个命令行参数指定的目录）读取 rayleigh.toml，
/// 列出设备和传感器，然后拉取最近一天的数据。
///
/// 运行：`RUST_LOG=info cargo run --example fetch_data -- ./config`
use chrono::{Duration, Utc};
use rayleigh_client::{ConfigLoader, RayleighClient, RayleighError};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config_dir = std::env::args().nth(1).unwrap_or_else(|| ".".to_string());
    let config = ConfigLoader::new(&config_dir).load_validated()?;
    let client = RayleighClient::new(config.with_debug(true))?;

    println!("=== 设备列表 ===");
    let devices = client.get_devices(&[]).await?;
    for device in &devices {
        let sensors = client.list_sensors(device).await?;
        println!("{} ({} 个传感器)", device, sensors.len());
        for sensor in sensors {
            println!("  {}", sensor);
        }
    }

    let sensors = client.get_sensors_for_devices(&devices, &[]).await?;
    if sensors.is_empty() {
        println!("没有可查询的传感器");
        return Ok(());
    }

    let to = Utc::now();
    let from = to - Duration::days(1);

    println!("\n=== 最近 24 小时数据 ===");
    match client.get_data(&sensors, from, to).await {
        Ok(frame) => {
            for device_id in frame.devices() {
                for column in frame.columns(device_id) {
                    let series = frame.series(device_id, column);
                    if let (Some(first), Some(last)) = (series.first(), series.last()) {
                        println!(
                            "{} {}: {} 行, {} -> {}, 最新值 {}",
                            device_id,
                            column,
                            series.len(),
                            first.timestamp,
                            last.timestamp,
                            last.value
                        );
                    }
                }
            }
            println!("\n{}", serde_json::to_string_pretty(&frame.rows()[..frame.len().min(5)])?);
        }
        Err(RayleighError::NoData) => println!("该时间范围内没有数据"),
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
