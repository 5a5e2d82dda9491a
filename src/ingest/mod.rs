//! CSV 批量导入
//!
//! 下载 CSV -> 逐行规范化为 [`GameRecord`] -> 通过 [`GameSink`] 批量 upsert。

pub mod record;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub use record::{CsvGameRow, GameRecord};

use crate::utils::config::IngestConfig;
use crate::{GridError, Result};

/// 导入目标
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GameSink: Send + Sync {
    /// 写入记录，返回受影响行数
    async fn upsert(&self, records: &[GameRecord]) -> Result<u64>;
}

/// 导入结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSummary {
    pub parsed: usize,
    pub written: u64,
}

/// CSV 导入器
pub struct CsvIngestor {
    http: reqwest::Client,
    sink: Arc<dyn GameSink>,
    max_bytes: usize,
}

impl CsvIngestor {
    pub fn new(sink: Arc<dyn GameSink>, config: &IngestConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.download_timeout_secs))
            .build()
            .map_err(|e| GridError::IngestError(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            sink,
            max_bytes: config.max_csv_bytes,
        })
    }

    /// 下载并导入
    pub async fn ingest_from_url(&self, url: &str) -> Result<IngestSummary> {
        let body = self.download(url).await?;
        self.ingest_from_str(&body).await
    }

    /// 导入 CSV 文本
    pub async fn ingest_from_str(&self, body: &str) -> Result<IngestSummary> {
        let records = parse_csv(body)?;
        let parsed = records.len();
        if parsed == 0 {
            return Ok(IngestSummary { parsed, written: 0 });
        }
        let written = self.sink.upsert(&records).await?;
        Ok(IngestSummary { parsed, written })
    }

    async fn download(&self, url: &str) -> Result<String> {
        log::info!("Downloading CSV from {}", url);
        let response = self.http.get(url).send().await.map_err(|e| {
            GridError::IngestError(format!("Failed to download the CSV file / Invalid URL: {}", e))
        })?;

        if !response.status().is_success() {
            return Err(GridError::IngestError(format!(
                "Failed to download the CSV file / Invalid URL (HTTP {})",
                response.status().as_u16()
            )));
        }

        if let Some(len) = response.content_length() {
            if len as usize > self.max_bytes {
                return Err(GridError::IngestError(format!(
                    "CSV file too large: {} bytes (limit {})",
                    len, self.max_bytes
                )));
            }
        }

        let body = response
            .text()
            .await
            .map_err(|e| GridError::IngestError(format!("Failed to read CSV body: {}", e)))?;
        if body.len() > self.max_bytes {
            return Err(GridError::IngestError(format!(
                "CSV file too large: {} bytes (limit {})",
                body.len(),
                self.max_bytes
            )));
        }
        Ok(body)
    }
}

/// 解析 CSV 文本，任何一行出错都使整个导入失败
pub fn parse_csv(body: &str) -> Result<Vec<GameRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut records = Vec::new();
    for (line, row) in reader.deserialize::<CsvGameRow>().enumerate() {
        let row = row.map_err(|e| {
            GridError::IngestError(format!("CSV row {} is invalid: {}", line + 1, e))
        })?;
        records.push(GameRecord::try_from(row)?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "AppID,Name,Release date,Required age,Price,DLC count,About the game,\
Supported languages,Windows,Mac,Linux,Positive,Negative,Score rank,Developers,Publishers,\
Categories,Genres,Tags";

    fn csv_body() -> String {
        format!(
            "{}\n\
20200,Galactic Bowling,\"Oct 21, 2008\",0,19.99,0,\"Bowling, in space.\",['English'],True,False,False,6,11,,Perpetual FX,Perpetual FX,['Single-player'],\"['Casual', 'Indie']\",['Indie']\n\
655370,Train Bandit,\"Oct 12, 2017\",0,0.99,0,Rob trains.,\"['English', 'French']\",True,True,False,53,5,,Rusty Moyher,Wild Rooster,['Single-player'],['Action'],\"['Indie', 'Action']\"\n",
            HEADER
        )
    }

    fn ingestor(sink: MockGameSink) -> CsvIngestor {
        CsvIngestor::new(Arc::new(sink), &IngestConfig::default()).unwrap()
    }

    #[test]
    fn test_parse_csv_rows() {
        let records = parse_csv(&csv_body()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Galactic Bowling");
        assert_eq!(records[0].about_the_game, "Bowling, in space.");
        assert_eq!(records[1].appid, 655370);
        assert!(records[1].mac);
        assert_eq!(records[1].supported_languages, serde_json::json!(["English", "French"]));
    }

    #[test]
    fn test_parse_csv_missing_column_fails() {
        let err = parse_csv("AppID,Name\n1,Foo\n").unwrap_err();
        assert!(matches!(err, GridError::IngestError(_)));
    }

    #[tokio::test]
    async fn test_ingest_writes_all_rows_once() {
        let mut sink = MockGameSink::new();
        sink.expect_upsert()
            .withf(|records| records.len() == 2 && records[0].appid == 20200)
            .times(1)
            .returning(|records| Ok(records.len() as u64));

        let summary = ingestor(sink).ingest_from_str(&csv_body()).await.unwrap();
        assert_eq!(summary, IngestSummary { parsed: 2, written: 2 });
    }

    #[tokio::test]
    async fn test_ingest_empty_csv_skips_sink() {
        let mut sink = MockGameSink::new();
        sink.expect_upsert().times(0);

        let summary = ingestor(sink)
            .ingest_from_str(&format!("{}\n", HEADER))
            .await
            .unwrap();
        assert_eq!(summary, IngestSummary { parsed: 0, written: 0 });
    }
}
