// 查询模块 - 服务端行模型
//
// 架构：
// ┌──────────────────────────────────────────────────────────┐
// │  GridRequest (request.rs)                                │
// │        │                                                 │
// │        ▼                                                 │
// │  QueryBuilder (builder.rs) ──► predicate.rs (WHERE)      │
// │        │                                                 │
// │        ▼  SqlQuery + 绑定参数 (sql.rs)                   │
// │  GridQueryEngine (engine.rs) ──► RowStore                │
// │        │                                                 │
// │        ▼                                                 │
// │  paginate (pagination.rs) ──► PageResult (types.rs)      │
// └──────────────────────────────────────────────────────────┘

pub mod builder;
pub mod engine;
pub mod pagination;
pub mod predicate;
pub mod request;
pub mod sql;
pub mod types;

pub use builder::{QueryBuilder, DEFAULT_TABLE};
pub use engine::GridQueryEngine;
pub use pagination::paginate;
pub use predicate::FilterMode;
pub use request::{
    ensure_identifier, is_valid_identifier, AggFunc, ColumnRef, FilterCondition, FilterSpec,
    GridRequest, SortColumn, SortDirection, ValueColumn,
};
pub use sql::{Bindings, SqlParam, SqlQuery};
pub use types::{PageResult, Record, RowCount, MORE_ROWS_SENTINEL};
