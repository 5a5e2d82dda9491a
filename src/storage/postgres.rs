//! PostgreSQL 存储实现
//!
//! 每个请求建立一个会话（[`PgSession`]），会话析构时终止后台连接任务，
//! 因此无论成功、出错还是被超时取消，连接都会被释放。

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{Number, Value};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_postgres::types::{ToSql, Type};
use tokio_postgres::{Client, NoTls, Row};

use super::RowStore;
use crate::ingest::{GameRecord, GameSink};
use crate::query::{ensure_identifier, Record, SqlParam, SqlQuery};
use crate::utils::config::DatabaseConfig;
use crate::{GridError, Result};

/// 连接工厂
#[derive(Clone)]
pub struct PgConnector {
    config: tokio_postgres::Config,
}

impl PgConnector {
    pub fn new(config: tokio_postgres::Config) -> Self {
        Self { config }
    }

    pub fn from_config(db: &DatabaseConfig) -> Self {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&db.host)
            .port(db.port)
            .user(&db.user)
            .password(&db.password)
            .dbname(&db.dbname)
            .application_name("gamegrid")
            .connect_timeout(Duration::from_secs(db.connect_timeout_secs));
        Self { config }
    }

    /// 打开一个会话
    pub async fn connect(&self) -> Result<PgSession> {
        let (client, connection) = self.config.connect(NoTls).await?;
        let connection = tokio::spawn(async move {
            if let Err(e) = connection.await {
                log::warn!("PostgreSQL connection closed with error: {}", e);
            }
        });
        Ok(PgSession { client, connection })
    }
}

/// 作用域连接，析构即释放
pub struct PgSession {
    client: Client,
    connection: JoinHandle<()>,
}

impl PgSession {
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut Client {
        &mut self.client
    }
}

impl Drop for PgSession {
    fn drop(&mut self) {
        self.connection.abort();
    }
}

/// 基于 PostgreSQL 的表格数据源
pub struct PgStore {
    connector: PgConnector,
    table: String,
    batch_size: usize,
}

impl PgStore {
    pub fn new(connector: PgConnector, table: impl Into<String>) -> Result<Self> {
        let table = table.into();
        ensure_identifier(&table)?;
        Ok(Self {
            connector,
            table,
            batch_size: 500,
        })
    }

    /// 批量写入时每条 INSERT 的行数（受绑定参数上限约束）
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, max_batch_rows());
        self
    }

    pub fn connector(&self) -> &PgConnector {
        &self.connector
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

#[async_trait]
impl RowStore for PgStore {
    async fn query(&self, query: &SqlQuery) -> Result<Vec<Record>> {
        let session = self.connector.connect().await?;
        let params: Vec<&(dyn ToSql + Sync)> = query.params.iter().map(as_tosql).collect();

        let rows = session.client().query(query.sql.as_str(), &params).await?;
        rows.iter().map(row_to_record).collect()
    }
}

#[async_trait]
impl GameSink for PgStore {
    async fn upsert(&self, records: &[GameRecord]) -> Result<u64> {
        let mut session = self.connector.connect().await?;
        let tx = session.client_mut().transaction().await?;

        let mut written = 0u64;
        for chunk in records.chunks(self.batch_size) {
            let sql = upsert_sql(&self.table, chunk.len());
            let params: Vec<&(dyn ToSql + Sync)> =
                chunk.iter().flat_map(|r| r.sql_params()).collect();
            written += tx.execute(sql.as_str(), &params).await?;
        }

        tx.commit().await?;
        log::info!("Upserted {} rows into {}", written, self.table);
        Ok(written)
    }
}

/// 写入列（顺序与 GameRecord::sql_params 一致）
pub const GAME_COLUMNS: [&str; 19] = [
    "appid",
    "\"name\"",
    "release_date",
    "required_age",
    "price",
    "dlc_count",
    "about_the_game",
    "supported_languages",
    "windows",
    "mac",
    "linux",
    "positive",
    "negative",
    "score_rank",
    "developers",
    "publishers",
    "categories",
    "genres",
    "tags",
];

/// 单条语句的绑定参数上限（协议中参数个数为 u16）
pub const MAX_BIND_PARAMS: usize = u16::MAX as usize;

/// 单条 upsert 最多写入的行数
pub fn max_batch_rows() -> usize {
    MAX_BIND_PARAMS / GAME_COLUMNS.len()
}

/// 多行 upsert 语句，appid 冲突时覆盖
pub fn upsert_sql(table: &str, rows: usize) -> String {
    let width = GAME_COLUMNS.len();
    let values: Vec<String> = (0..rows)
        .map(|r| {
            let placeholders: Vec<String> =
                (1..=width).map(|c| format!("${}", r * width + c)).collect();
            format!("({})", placeholders.join(", "))
        })
        .collect();

    let updates: Vec<String> = GAME_COLUMNS[1..]
        .iter()
        .map(|c| format!("{} = EXCLUDED.{}", c, c))
        .collect();

    format!(
        "INSERT INTO {} ({}) VALUES {} ON CONFLICT (appid) DO UPDATE SET {}",
        table,
        GAME_COLUMNS.join(", "),
        values.join(", "),
        updates.join(", ")
    )
}

fn as_tosql(param: &SqlParam) -> &(dyn ToSql + Sync) {
    match param {
        SqlParam::Text(v) => v,
        SqlParam::Int(v) => v,
        SqlParam::Float(v) => v,
        SqlParam::Date(v) => v,
        SqlParam::Json(v) => v,
    }
}

fn row_to_record(row: &Row) -> Result<Record> {
    let mut record = Record::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let value = column_value(row, idx, column.type_()).map_err(|e| {
            GridError::StoreExecutionFailure(format!(
                "cannot decode column '{}' ({}): {}",
                column.name(),
                column.type_(),
                e
            ))
        })?;
        record.insert(column.name().to_string(), value);
    }
    Ok(record)
}

fn column_value(row: &Row, idx: usize, ty: &Type) -> std::result::Result<Value, tokio_postgres::Error> {
    let value = match *ty {
        Type::BOOL => row.try_get::<_, Option<bool>>(idx)?.map(Value::Bool),
        Type::INT2 => row.try_get::<_, Option<i16>>(idx)?.map(Value::from),
        Type::INT4 => row.try_get::<_, Option<i32>>(idx)?.map(Value::from),
        Type::INT8 => row.try_get::<_, Option<i64>>(idx)?.map(Value::from),
        Type::FLOAT4 => row
            .try_get::<_, Option<f32>>(idx)?
            .map(|v| float_value(v as f64)),
        Type::FLOAT8 => row.try_get::<_, Option<f64>>(idx)?.map(float_value),
        Type::NUMERIC => row.try_get::<_, Option<Decimal>>(idx)?.map(decimal_value),
        Type::DATE => row
            .try_get::<_, Option<NaiveDate>>(idx)?
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string())),
        Type::TIMESTAMP => row
            .try_get::<_, Option<NaiveDateTime>>(idx)?
            .map(|d| Value::String(d.format("%Y-%m-%dT%H:%M:%S").to_string())),
        Type::JSON | Type::JSONB => row.try_get::<_, Option<Value>>(idx)?,
        _ => row.try_get::<_, Option<String>>(idx)?.map(Value::String),
    };
    Ok(value.unwrap_or(Value::Null))
}

fn float_value(v: f64) -> Value {
    Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}

/// NUMERIC（avg/sum 聚合结果）：整数保持整数，其余转为浮点
fn decimal_value(d: Decimal) -> Value {
    if d.fract().is_zero() {
        if let Some(i) = d.to_i64() {
            return Value::from(i);
        }
    }
    d.to_f64().map(float_value).unwrap_or(Value::Null)
}

impl From<tokio_postgres::Error> for GridError {
    fn from(e: tokio_postgres::Error) -> Self {
        let message = match e.as_db_error() {
            Some(db) => format!("{} ({})", db.message(), db.code().code()),
            None => e.to_string(),
        };
        GridError::StoreExecutionFailure(message)
    }
}
