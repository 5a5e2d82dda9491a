// 查询组装器
//
// 子句顺序固定：SELECT -> FROM -> WHERE -> GROUP BY -> ORDER BY -> LIMIT/OFFSET。
// 每个子句独立生成，缺省子句输出空串。

use serde_json::Value;

use super::predicate::{self, FilterMode};
use super::request::{ensure_identifier, GridRequest};
use super::sql::{Bindings, SqlParam, SqlQuery};
use crate::{GridError, Result};

/// 默认数据表
pub const DEFAULT_TABLE: &str = "game_data";

/// 查询组装器
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    /// 数据表名（已校验）
    table: String,
    /// 过滤模式
    filter_mode: FilterMode,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE.to_string(),
            filter_mode: FilterMode::Permissive,
        }
    }
}

impl QueryBuilder {
    /// 创建组装器，表名必须是合法标识符
    pub fn new(table: impl Into<String>) -> Result<Self> {
        let table = table.into();
        ensure_identifier(&table)?;
        Ok(Self {
            table,
            filter_mode: FilterMode::Permissive,
        })
    }

    pub fn with_filter_mode(mut self, mode: FilterMode) -> Self {
        self.filter_mode = mode;
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn filter_mode(&self) -> FilterMode {
        self.filter_mode
    }

    /// 组装完整查询
    pub fn build(&self, req: &GridRequest) -> Result<SqlQuery> {
        req.validate()?;

        let mut bindings = Bindings::new();

        let select_sql = self.select_clause(req);
        let from_sql = self.from_clause();
        let where_sql = self.where_clause(req, &mut bindings)?;
        let group_by_sql = self.group_by_clause(req);
        let order_by_sql = self.order_by_clause(req);
        let limit_sql = self.limit_clause(req, &mut bindings)?;

        let sql = format!(
            "{}{}{}{}{}{}",
            select_sql, from_sql, where_sql, group_by_sql, order_by_sql, limit_sql
        );

        Ok(SqlQuery::new(sql, bindings.into_params()))
    }

    /// 投影：分组时为当前分组列 + 聚合列，否则 `SELECT *`
    pub fn select_clause(&self, req: &GridRequest) -> String {
        match req.current_group_column() {
            Some(group_col) => {
                let mut cols = Vec::with_capacity(req.value_cols.len() + 1);
                cols.push(group_col.field.clone());
                for value_col in &req.value_cols {
                    cols.push(format!(
                        "{}({}) AS {}",
                        value_col.agg_func.as_sql(),
                        value_col.field,
                        value_col.field
                    ));
                }
                format!("SELECT {}", cols.join(", "))
            }
            None => "SELECT *".to_string(),
        }
    }

    pub fn from_clause(&self) -> String {
        format!(" FROM {}", self.table)
    }

    /// 过滤：已展开的分组键 + filterModel，AND 连接；无条件时不生成 WHERE
    pub fn where_clause(&self, req: &GridRequest, bindings: &mut Bindings) -> Result<String> {
        let mut parts = Vec::new();

        for (group_col, key) in req.row_group_cols.iter().zip(&req.group_keys) {
            parts.push(group_key_predicate(&group_col.field, key, bindings));
        }

        for (column, spec) in &req.filter_model {
            parts.push(predicate::translate(
                column,
                spec,
                bindings,
                self.filter_mode,
            )?);
        }

        if parts.is_empty() {
            Ok(String::new())
        } else {
            Ok(format!(" WHERE {}", parts.join(" AND ")))
        }
    }

    /// 分组：只按当前层级分组
    pub fn group_by_clause(&self, req: &GridRequest) -> String {
        match req.current_group_column() {
            Some(group_col) => format!(" GROUP BY {}", group_col.field),
            None => String::new(),
        }
    }

    pub fn order_by_clause(&self, req: &GridRequest) -> String {
        if req.sort_model.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = req
            .sort_model
            .iter()
            .map(|s| format!("{} {}", s.col_id, s.direction.as_sql()))
            .collect();
        format!(" ORDER BY {}", parts.join(", "))
    }

    /// 窗口：多取一行用于判断是否还有后续数据
    pub fn limit_clause(&self, req: &GridRequest, bindings: &mut Bindings) -> Result<String> {
        let fetch = i64::try_from(req.page_size())
            .ok()
            .and_then(|n| n.checked_add(1))
            .ok_or_else(|| {
                GridError::MalformedRequest(format!(
                    "row window [{}, {}) is too large",
                    req.start_row, req.end_row
                ))
            })?;
        let limit = bindings.push(SqlParam::Int(fetch));
        let offset = bindings.push(SqlParam::Int(req.start_row));
        Ok(format!(" LIMIT {} OFFSET {}", limit, offset))
    }
}

/// 分组键谓词：按文本形式比较，列类型无关；null 键匹配 NULL
fn group_key_predicate(field: &str, key: &Value, bindings: &mut Bindings) -> String {
    let text = match key {
        Value::Null => return format!("{} IS NULL", field),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let p = bindings.push(SqlParam::Text(text));
    format!("{}::text = {}::text", field, p)
}
