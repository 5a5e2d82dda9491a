// 查询引擎 - 表格请求 -> 参数化 SQL -> 分页结果

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::builder::QueryBuilder;
use super::pagination::paginate;
use super::predicate::FilterMode;
use super::request::GridRequest;
use super::types::PageResult;
use crate::storage::RowStore;
use crate::utils::config::QueryConfig;
use crate::{GridError, Result};

/// 表格查询引擎
///
/// 无状态，可在多个请求间共享：
/// - 校验请求
/// - 组装参数化查询
/// - 通过 RowStore 执行（可选超时）
/// - 根据多取的一行生成分页结果
pub struct GridQueryEngine {
    builder: QueryBuilder,
    store: Arc<dyn RowStore>,
    query_timeout: Option<Duration>,
}

impl GridQueryEngine {
    pub fn new(builder: QueryBuilder, store: Arc<dyn RowStore>) -> Self {
        Self {
            builder,
            store,
            query_timeout: None,
        }
    }

    /// 按配置创建引擎
    pub fn from_config(config: &QueryConfig, store: Arc<dyn RowStore>) -> Result<Self> {
        let mode = if config.strict_filters {
            FilterMode::Strict
        } else {
            FilterMode::Permissive
        };
        let builder = QueryBuilder::new(config.table.clone())?.with_filter_mode(mode);
        let timeout = match config.query_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };
        Ok(Self::new(builder, store).with_query_timeout(timeout))
    }

    /// 设置单次存储往返的截止时间
    pub fn with_query_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.query_timeout = timeout;
        self
    }

    pub fn builder(&self) -> &QueryBuilder {
        &self.builder
    }

    /// 获取一页数据
    pub async fn fetch_page(&self, req: &GridRequest) -> Result<PageResult> {
        let start = Instant::now();

        let query = self.builder.build(req)?;
        log::debug!("Grid query: {} ({} params)", query.sql, query.params.len());

        let execution = self.store.query(&query);
        let rows = match self.query_timeout {
            Some(deadline) => tokio::time::timeout(deadline, execution)
                .await
                .map_err(|_| {
                    GridError::StoreExecutionFailure(format!(
                        "query exceeded deadline of {} ms",
                        deadline.as_millis()
                    ))
                })??,
            None => execution.await?,
        };

        let fetched = rows.len();
        let page = paginate(req, rows);

        log::debug!(
            "Fetched {} rows for window [{}, {}) in {} ms, rowCount={:?}",
            fetched,
            req.start_row,
            req.end_row,
            start.elapsed().as_millis(),
            page.row_count
        );

        Ok(page)
    }
}
