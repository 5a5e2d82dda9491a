//! 配置管理模块
//!
//! 加载顺序（后者覆盖前者）：
//! 1. 内置默认值
//! 2. TOML 配置文件（可选，默认 `config/gamegrid.toml`）
//! 3. `GAMEGRID_<SECTION>__<KEY>` 环境变量，如 `GAMEGRID_HTTP__PORT=9000`
//! 4. `DB_HOST` / `DB_USER` / `DB_PASSWORD` / `DB_NAME` 环境变量

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::query::DEFAULT_TABLE;
use crate::storage::postgres::max_batch_rows;
use crate::{GridError, Result};

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "config/gamegrid.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_service_name")]
    pub name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_http_host(),
            port: default_http_port(),
        }
    }
}

impl HttpConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_host")]
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    #[serde(default = "default_db_user")]
    pub user: String,
    #[serde(default = "default_db_password")]
    pub password: String,
    #[serde(default = "default_db_name")]
    pub dbname: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// 启动时自动建表
    #[serde(default = "default_true")]
    pub auto_create_table: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_db_host(),
            port: default_db_port(),
            user: default_db_user(),
            password: default_db_password(),
            dbname: default_db_name(),
            connect_timeout_secs: default_connect_timeout(),
            auto_create_table: true,
        }
    }
}

// 不输出密码
impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("dbname", &self.dbname)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("auto_create_table", &self.auto_create_table)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// 数据表名
    #[serde(default = "default_table")]
    pub table: String,
    /// 不支持的过滤条件直接报错，而不是忽略
    #[serde(default)]
    pub strict_filters: bool,
    /// 单次查询截止时间（毫秒），0 表示不限制
    #[serde(default = "default_query_timeout")]
    pub query_timeout_ms: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            table: default_table(),
            strict_filters: false,
            query_timeout_ms: default_query_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// 每条 INSERT 的行数
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,
    #[serde(default = "default_max_csv_bytes")]
    pub max_csv_bytes: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            download_timeout_secs: default_download_timeout(),
            max_csv_bytes: default_max_csv_bytes(),
        }
    }
}

// 默认值函数
fn default_service_name() -> String {
    "gamegrid".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_http_host() -> String {
    "127.0.0.1".to_string()
}
fn default_http_port() -> u16 {
    5000
}
fn default_db_host() -> String {
    "localhost".to_string()
}
fn default_db_port() -> u16 {
    5432
}
fn default_db_user() -> String {
    "postgres".to_string()
}
fn default_db_password() -> String {
    "password".to_string()
}
fn default_db_name() -> String {
    "postgres".to_string()
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_true() -> bool {
    true
}
fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}
fn default_query_timeout() -> u64 {
    30_000
}
fn default_batch_size() -> usize {
    500
}
fn default_download_timeout() -> u64 {
    120
}
fn default_max_csv_bytes() -> usize {
    256 * 1024 * 1024
}

/// 兼容旧部署的数据库环境变量
const LEGACY_DB_ENV: [(&str, &str); 4] = [
    ("DB_HOST", "database.host"),
    ("DB_USER", "database.user"),
    ("DB_PASSWORD", "database.password"),
    ("DB_NAME", "database.dbname"),
];

impl ServiceConfig {
    /// 从文件 + 进程环境变量加载；文件不存在时只使用默认值和环境变量
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_with_env(path, std::env::vars().collect())
    }

    pub fn load_default() -> Result<Self> {
        Self::load(DEFAULT_CONFIG_PATH)
    }

    /// 使用给定的环境变量表加载（`GAMEGRID_*` 与 `DB_*` 都只从 `env` 读取）
    pub fn load_with_env<P: AsRef<Path>>(path: P, env: HashMap<String, String>) -> Result<Self> {
        let path = path.as_ref();
        let mut builder = Config::builder()
            .add_source(
                File::from(path)
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                Environment::with_prefix("GAMEGRID")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(Some(env.clone())),
            );

        for (env_key, config_key) in LEGACY_DB_ENV {
            builder = builder
                .set_override_option(config_key, env.get(env_key).cloned())
                .map_err(|e| GridError::ConfigError(e.to_string()))?;
        }

        let config: ServiceConfig = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| {
                GridError::ConfigError(format!(
                    "Failed to load config from {}: {}",
                    path.display(),
                    e
                ))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文本解析（不读取环境变量）
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ServiceConfig = toml::from_str(content)
            .map_err(|e| GridError::ConfigError(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        crate::query::ensure_identifier(&self.query.table)
            .map_err(|_| GridError::ConfigError(format!("invalid table name: {:?}", self.query.table)))?;
        let max_rows = max_batch_rows();
        if self.ingest.batch_size == 0 || self.ingest.batch_size > max_rows {
            return Err(GridError::ConfigError(format!(
                "ingest.batch_size must be between 1 and {}, got {}",
                max_rows, self.ingest.batch_size
            )));
        }
        Ok(())
    }
}
