use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 默认配置文件名 (可用 RECON_CONFIG 覆盖)
pub const DEFAULT_CONFIG_FILE: &str = "reconcile";

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub job: JobConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// 文件任务路径; 路径为工作簿时按工作表名读写
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesConfig {
    pub contract_path: PathBuf,
    pub invoice_path: PathBuf,
    pub output_path: PathBuf,
    pub contract_sheet: String,
    pub invoice_sheet: String,
    pub output_sheet: String,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            contract_path: PathBuf::from("contract.csv"),
            invoice_path: PathBuf::from("invoice.csv"),
            output_path: PathBuf::from("discrepancies.csv"),
            contract_sheet: "Contract".to_string(),
            invoice_sheet: "Invoice".to_string(),
            output_sheet: "Discrepancies".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// 每处理多少条合同记录输出一次进度
    pub progress_interval: usize,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            progress_interval: 100,
        }
    }
}

impl AppConfig {
    /// 加载配置: 默认值 -> 配置文件 (可选) -> 环境变量 RECON_*
    ///
    /// 环境变量以 `__` 分隔层级, 如 `RECON_SERVER__PORT=9000`、`RECON_FILES__OUTPUT_PATH=out.csv`。
    pub fn load(config_file: &str) -> Result<Self, ConfigError> {
        let defaults = AppConfig::default();
        Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default(
                "files.contract_path",
                defaults.files.contract_path.display().to_string(),
            )?
            .set_default(
                "files.invoice_path",
                defaults.files.invoice_path.display().to_string(),
            )?
            .set_default(
                "files.output_path",
                defaults.files.output_path.display().to_string(),
            )?
            .set_default("files.contract_sheet", defaults.files.contract_sheet)?
            .set_default("files.invoice_sheet", defaults.files.invoice_sheet)?
            .set_default("files.output_sheet", defaults.files.output_sheet)?
            .set_default("job.progress_interval", defaults.job.progress_interval as i64)?
            .add_source(File::with_name(config_file).required(false))
            .add_source(
                Environment::with_prefix("RECON")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }

    /// 从环境加载, 配置文件路径取自 RECON_CONFIG
    pub fn from_env() -> Result<Self, ConfigError> {
        let file = std::env::var("RECON_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load(&file)
    }
}
