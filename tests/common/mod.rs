// 集成测试公共组件：内存数据源

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use gamegrid::ingest::{CsvIngestor, GameRecord, GameSink};
use gamegrid::query::{GridQueryEngine, QueryBuilder, Record, SqlParam, SqlQuery};
use gamegrid::utils::config::IngestConfig;
use gamegrid::{GridError, Result, RowStore};

/// 内存表：只解释末尾的 LIMIT/OFFSET 绑定参数
pub struct MemoryStore {
    rows: Vec<Record>,
    delay: Option<Duration>,
    queries: Mutex<Vec<SqlQuery>>,
}

impl MemoryStore {
    pub fn with_games(n: usize) -> Self {
        Self {
            rows: (0..n).map(game).collect(),
            delay: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn queries(&self) -> Vec<SqlQuery> {
        self.queries.lock().unwrap().clone()
    }
}

fn game(i: usize) -> Record {
    json!({
        "appid": 10_000 + i,
        "name": format!("Game {}", i),
        "price": (i % 20) as f64 + 0.99,
        "windows": true,
    })
    .as_object()
    .cloned()
    .unwrap()
}

fn window(params: &[SqlParam]) -> Result<(usize, usize)> {
    match params {
        [.., SqlParam::Int(limit), SqlParam::Int(offset)] => Ok((*limit as usize, *offset as usize)),
        _ => Err(GridError::StoreExecutionFailure(
            "query has no LIMIT/OFFSET bindings".to_string(),
        )),
    }
}

#[async_trait]
impl RowStore for MemoryStore {
    async fn query(&self, query: &SqlQuery) -> Result<Vec<Record>> {
        self.queries.lock().unwrap().push(query.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let (limit, offset) = window(&query.params)?;
        Ok(self.rows.iter().skip(offset).take(limit).cloned().collect())
    }
}

/// 记录写入内容的导入目标
#[derive(Default)]
pub struct MemorySink {
    pub written: Mutex<Vec<GameRecord>>,
}

#[async_trait]
impl GameSink for MemorySink {
    async fn upsert(&self, records: &[GameRecord]) -> Result<u64> {
        let mut written = self.written.lock().unwrap();
        written.extend_from_slice(records);
        Ok(records.len() as u64)
    }
}

pub fn engine(store: Arc<MemoryStore>) -> GridQueryEngine {
    GridQueryEngine::new(QueryBuilder::default(), store)
}

pub fn ingestor(sink: Arc<MemorySink>) -> CsvIngestor {
    CsvIngestor::new(sink, &IngestConfig::default()).unwrap()
}
