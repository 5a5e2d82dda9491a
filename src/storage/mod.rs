//! 存储访问层
//!
//! 查询引擎只依赖 [`RowStore`]：给定参数化查询，返回有序的行记录。
//! PostgreSQL 实现见 [`postgres`]，表结构初始化见 [`schema`]。

pub mod postgres;
pub mod schema;

use async_trait::async_trait;

use crate::query::{Record, SqlQuery};
use crate::Result;

pub use postgres::{PgConnector, PgSession, PgStore};
pub use schema::ensure_table_exists;

/// 表格数据源
///
/// 每次调用执行一条查询；实现方负责在所有退出路径上释放连接。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RowStore: Send + Sync {
    async fn query(&self, query: &SqlQuery) -> Result<Vec<Record>>;
}
