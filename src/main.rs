//! GameGrid 表格数据服务
//!
//! 集成功能：
//! 1. 服务端行模型查询（分组/聚合/过滤/排序/分页）
//! 2. CSV 数据导入
//! 3. HTTP API
//!
//! 运行: cargo run --bin gamegrid-server -- --config config/gamegrid.toml

use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;

use gamegrid::ingest::CsvIngestor;
use gamegrid::query::GridQueryEngine;
use gamegrid::service::http::HttpServer;
use gamegrid::storage::{ensure_table_exists, PgConnector, PgStore};
use gamegrid::utils::config::{ServiceConfig, DEFAULT_CONFIG_PATH};

/// 命令行参数
#[derive(Debug, Default)]
struct CliArgs {
    config_path: Option<PathBuf>,
    http_address: Option<String>,
    table: Option<String>,
}

impl CliArgs {
    fn parse() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let mut cli = CliArgs::default();
        for i in 0..args.len() {
            let value = args.get(i + 1).cloned();
            match args[i].as_str() {
                "--config" | "-c" => cli.config_path = value.map(PathBuf::from),
                "--http" | "-h" => cli.http_address = value,
                "--table" | "-t" => cli.table = value,
                _ => {}
            }
        }
        cli
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliArgs::parse();

    // 1. 加载配置（日志尚未初始化，错误稍后输出）
    let config_path = cli
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let (mut config, load_error) = match ServiceConfig::load(&config_path) {
        Ok(cfg) => (cfg, None),
        Err(e) => (ServiceConfig::default(), Some(e)),
    };

    // 2. 初始化日志
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.server.log_level.as_str()),
    )
    .init();

    if let Some(e) = load_error {
        log::warn!("Failed to load config file: {}, using defaults", e);
    }

    // 3. 命令行覆盖
    let mut bind_address = config.http.bind_address();
    if let Some(addr) = cli.http_address {
        bind_address = addr;
    }
    if let Some(table) = cli.table {
        config.query.table = table;
    }
    config
        .validate()
        .context("invalid configuration after CLI overrides")?;

    log::info!("Configuration loaded");
    log::info!(
        "  Database: {}@{}:{}/{}",
        config.database.user,
        config.database.host,
        config.database.port,
        config.database.dbname
    );
    log::info!("  Table: {}", config.query.table);
    log::info!("  Strict filters: {}", config.query.strict_filters);

    // 4. 存储
    let connector = PgConnector::from_config(&config.database);
    if config.database.auto_create_table {
        let session = connector
            .connect()
            .await
            .context("failed to connect to PostgreSQL")?;
        ensure_table_exists(session.client(), &config.query.table)
            .await
            .context("failed to provision table")?;
    }

    let store = Arc::new(
        PgStore::new(connector, config.query.table.clone())?
            .with_batch_size(config.ingest.batch_size),
    );

    // 5. 查询引擎与导入器
    let engine = Arc::new(GridQueryEngine::from_config(&config.query, store.clone())?);
    let ingestor = Arc::new(CsvIngestor::new(store, &config.ingest)?);

    // 6. HTTP 服务
    log::info!("🟢 {} is running. Press Ctrl+C to stop.", config.server.name);
    HttpServer::new(engine, ingestor, bind_address)
        .run()
        .await
        .context("HTTP server terminated")?;

    Ok(())
}
