use anyhow::{anyhow, Context, Result};
use config::{Config, File, FileFormat};
use std::path::{Path, PathBuf};

use crate::ClientConfig;

/// 配置文件名
const CONFIG_FILE: &str = "rayleigh.toml";

/// 配置加载器
pub struct ConfigLoader {
    config_dir: PathBuf,
}

impl ConfigLoader {
    /// 创建配置加载器
    pub fn new<P: AsRef<Path>>(config_dir: P) -> Self {
        Self {
            config_dir: config_dir.as_ref().to_path_buf(),
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    /// 加载客户端配置
    ///
    /// 凭据没有默认值，所以配置文件不存在时直接报错。
    pub fn load(&self) -> Result<ClientConfig> {
        let config_path = self.config_path();

        if !config_path.exists() {
            return Err(anyhow!(
                "Config file not found: {}",
                config_path.display()
            ));
        }

        let config = Config::builder()
            .add_source(File::new(
                config_path.to_str().ok_or_else(|| anyhow!("Invalid config path"))?,
                FileFormat::Toml,
            ))
            .build()?;

        config
            .try_deserialize()
            .with_context(|| format!("Failed to parse {}", config_path.display()))
    }

    /// 加载并验证配置
    pub fn load_validated(&self) -> Result<ClientConfig> {
        let config = self.load()?;
        config.validate()?;
        Ok(config)
    }
}
