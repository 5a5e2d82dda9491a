//! # GAMEGRID
//!
//! 游戏元数据表格后端 - 服务端行模型 (Server-Side Row Model)
//!
//! ## 核心能力
//!
//! - **请求模型**: 解析表格请求（行窗口/分组/聚合/排序/过滤）
//! - **过滤翻译**: 列过滤条件 -> 参数化 WHERE 谓词
//! - **查询组装**: SELECT / WHERE / GROUP BY / ORDER BY / LIMIT
//! - **分页估计**: 多取一行判断是否还有后续数据
//! - **数据导入**: 远程 CSV 下载并批量 upsert
//! - **对外服务**: HTTP API (基于 Actix-web)
//!
//! ## 架构设计
//!
//! ```text
//! 客户端 (HTTP)
//!     ↓
//! Service Layer (service/)
//!     ↓
//! Query Engine (query/)      Ingest (ingest/)
//!     ↓                          ↓
//! Storage (storage/) ← PostgreSQL
//! ```

// ============================================================================
// 内部模块
// ============================================================================

/// 请求模型、过滤翻译、查询组装、分页
pub mod query;

/// PostgreSQL 存储与建表
pub mod storage;

/// CSV 数据导入
pub mod ingest;

/// 对外服务层 (HTTP)
pub mod service;

/// 工具模块
pub mod utils;

// ============================================================================
// 重导出常用类型
// ============================================================================

pub use query::{GridQueryEngine, GridRequest, PageResult, QueryBuilder, RowCount, SqlQuery};
pub use storage::{PgStore, RowStore};

// ============================================================================
// 全局错误类型
// ============================================================================

/// 表格服务错误类型
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Unsupported filter on column '{column}': {reason}")]
    UnsupportedFilter { column: String, reason: String },

    #[error("Store execution failure: {0}")]
    StoreExecutionFailure(String),

    #[error("Ingest error: {0}")]
    IngestError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl GridError {
    /// 对应的 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            GridError::MalformedRequest(_)
            | GridError::UnsupportedFilter { .. }
            | GridError::IngestError(_) => 400,
            GridError::StoreExecutionFailure(_) | GridError::ConfigError(_) => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, GridError>;

// ============================================================================
// 测试模块
// ============================================================================
