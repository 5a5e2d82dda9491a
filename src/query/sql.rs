// 参数化 SQL 表示
//
// 所有字面量（过滤值、分组键、分页窗口）都以绑定参数的形式出现，
// 查询文本中只包含 `$n` 占位符和经过校验的标识符。

use chrono::NaiveDate;
use serde_json::Value;
use std::fmt;

/// 绑定参数
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Int(i64),
    Float(f64),
    Date(NaiveDate),
    Json(Value),
}

impl fmt::Display for SqlParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlParam::Text(s) => write!(f, "{:?}", s),
            SqlParam::Int(i) => write!(f, "{}", i),
            SqlParam::Float(x) => write!(f, "{}", x),
            SqlParam::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            SqlParam::Json(v) => write!(f, "{}", v),
        }
    }
}

/// 参数收集器，按顺序分配 `$1`, `$2`, ...
#[derive(Debug, Default)]
pub struct Bindings {
    params: Vec<SqlParam>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个参数并返回其占位符
    pub fn push(&mut self, param: SqlParam) -> String {
        self.params.push(param);
        format!("${}", self.params.len())
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn as_slice(&self) -> &[SqlParam] {
        &self.params
    }

    pub fn into_params(self) -> Vec<SqlParam> {
        self.params
    }
}

/// 组装完成的查询：模板 + 参数列表
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl SqlQuery {
    pub fn new(sql: impl Into<String>, params: Vec<SqlParam>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

impl fmt::Display for SqlQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql)?;
        if !self.params.is_empty() {
            let rendered: Vec<String> = self.params.iter().map(|p| p.to_string()).collect();
            write!(f, " -- [{}]", rendered.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bindings_number_placeholders_in_order() {
        let mut b = Bindings::new();
        assert!(b.is_empty());
        assert_eq!(b.push(SqlParam::Text("a".into())), "$1");
        assert_eq!(b.push(SqlParam::Int(5)), "$2");
        assert_eq!(b.len(), 2);
        assert_eq!(
            b.into_params(),
            vec![SqlParam::Text("a".into()), SqlParam::Int(5)]
        );
    }

    #[test]
    fn test_display_includes_params() {
        let q = SqlQuery::new(
            "SELECT * FROM game_data WHERE name = $1::text",
            vec![SqlParam::Text("Portal".into())],
        );
        assert_eq!(
            q.to_string(),
            "SELECT * FROM game_data WHERE name = $1::text -- [\"Portal\"]"
        );
    }
}
