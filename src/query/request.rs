// 表格请求模型 - 服务端行模型 (server-side row model)

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::{GridError, Result};

/// 默认结束行（客户端未提供 endRow 时）
pub const DEFAULT_END_ROW: i64 = 100;

/// 表格查询请求
///
/// 描述客户端当前的分组/过滤/排序/分页状态。所有字段均可缺省，
/// 缺省值见各字段注释。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridRequest {
    /// 完整分组层级（外层在前），默认空
    #[serde(default)]
    pub row_group_cols: Vec<ColumnRef>,

    /// 分组时需要计算的聚合列，默认空
    #[serde(default)]
    pub value_cols: Vec<ValueColumn>,

    /// 已展开的分组路径，长度不超过 row_group_cols
    #[serde(default)]
    pub group_keys: Vec<Value>,

    /// 列名 -> 过滤条件（按列名排序，保证生成 SQL 稳定）
    #[serde(default)]
    pub filter_model: BTreeMap<String, FilterSpec>,

    /// 排序，按顺序生效，默认空
    #[serde(default)]
    pub sort_model: Vec<SortColumn>,

    /// 窗口起点（含），默认 0
    #[serde(default)]
    pub start_row: i64,

    /// 窗口终点（不含），默认 100
    #[serde(default = "default_end_row")]
    pub end_row: i64,
}

fn default_end_row() -> i64 {
    DEFAULT_END_ROW
}

impl Default for GridRequest {
    fn default() -> Self {
        Self {
            row_group_cols: Vec::new(),
            value_cols: Vec::new(),
            group_keys: Vec::new(),
            filter_model: BTreeMap::new(),
            sort_model: Vec::new(),
            start_row: 0,
            end_row: DEFAULT_END_ROW,
        }
    }
}

/// 分组列引用（客户端附带的 id/displayName 等字段忽略）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRef {
    pub field: String,
}

/// 聚合列
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueColumn {
    pub field: String,
    pub agg_func: AggFunc,
}

/// 聚合函数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggFunc {
    Sum,
    Avg,
    Min,
    Max,
    Count,
}

impl AggFunc {
    pub fn as_sql(&self) -> &'static str {
        match self {
            AggFunc::Sum => "sum",
            AggFunc::Avg => "avg",
            AggFunc::Min => "min",
            AggFunc::Max => "max",
            AggFunc::Count => "count",
        }
    }
}

/// 排序列
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortColumn {
    pub col_id: String,
    #[serde(rename = "sort", alias = "direction")]
    pub direction: SortDirection,
}

/// 排序方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// 单列过滤条件，按 filterType 区分
///
/// 解码是全函数：缺失或未知的 filterType、非对象的条目都落到 `Unknown`，
/// 翻译时按"不支持的过滤"处理，而不是拒绝整个请求。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "filterType", rename_all = "lowercase")]
pub enum FilterSpec {
    Text(FilterCondition),
    Number(FilterCondition),
    Date(FilterCondition),
    Array(FilterCondition),
    Unknown,
}

impl FilterSpec {
    pub fn from_value(raw: Value) -> Self {
        let kind = raw
            .get("filterType")
            .and_then(Value::as_str)
            .map(str::to_owned);
        let cond = match serde_json::from_value::<FilterCondition>(raw) {
            Ok(cond) => cond,
            Err(_) => return FilterSpec::Unknown,
        };
        match kind.as_deref() {
            Some("text") => FilterSpec::Text(cond),
            Some("number") => FilterSpec::Number(cond),
            Some("date") => FilterSpec::Date(cond),
            Some("array") => FilterSpec::Array(cond),
            _ => FilterSpec::Unknown,
        }
    }
}

impl<'de> Deserialize<'de> for FilterSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Value::deserialize(deserializer).map(FilterSpec::from_value)
    }
}

/// 过滤条件的操作符与操作数
///
/// `type` 保持原始字符串，由翻译器映射为封闭的操作符集合。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCondition {
    /// 非字符串的 type 视为缺失
    #[serde(rename = "type", default, deserialize_with = "string_or_none")]
    pub operator: Option<String>,
    #[serde(default)]
    pub filter: Option<Value>,
    #[serde(default)]
    pub filter_to: Option<Value>,
    /// 日期过滤器的原生字段，等价于 filter
    #[serde(default)]
    pub date_from: Option<Value>,
    /// 日期过滤器的原生字段，等价于 filterTo
    #[serde(default)]
    pub date_to: Option<Value>,
}

impl FilterCondition {
    pub fn operand(&self) -> Option<&Value> {
        non_null(self.filter.as_ref()).or_else(|| non_null(self.date_from.as_ref()))
    }

    pub fn operand_to(&self) -> Option<&Value> {
        non_null(self.filter_to.as_ref()).or_else(|| non_null(self.date_to.as_ref()))
    }
}

fn string_or_none<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

fn non_null(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

impl GridRequest {
    /// 从客户端原始 JSON 构造并校验
    pub fn from_json(payload: Value) -> Result<Self> {
        let request: GridRequest = serde_json::from_value(payload)
            .map_err(|e| GridError::MalformedRequest(format!("invalid grid request: {}", e)))?;
        request.validate()?;
        Ok(request)
    }

    /// 校验请求不变量，任何违规都在构建查询之前拒绝
    pub fn validate(&self) -> Result<()> {
        if self.group_keys.len() > self.row_group_cols.len() {
            return Err(GridError::MalformedRequest(format!(
                "groupKeys has {} entries but only {} rowGroupCols",
                self.group_keys.len(),
                self.row_group_cols.len()
            )));
        }

        if self.start_row < 0 {
            return Err(GridError::MalformedRequest(format!(
                "startRow must be non-negative, got {}",
                self.start_row
            )));
        }

        if self.end_row <= self.start_row {
            return Err(GridError::MalformedRequest(format!(
                "endRow ({}) must be greater than startRow ({})",
                self.end_row, self.start_row
            )));
        }

        let identifiers = self
            .row_group_cols
            .iter()
            .map(|c| c.field.as_str())
            .chain(self.value_cols.iter().map(|c| c.field.as_str()))
            .chain(self.sort_model.iter().map(|s| s.col_id.as_str()))
            .chain(self.filter_model.keys().map(|k| k.as_str()));

        for ident in identifiers {
            ensure_identifier(ident)?;
        }

        Ok(())
    }

    /// 是否处于分组状态（还有未展开的分组层级）
    pub fn is_grouping(&self) -> bool {
        self.row_group_cols.len() > self.group_keys.len()
    }

    /// 当前分组层级
    pub fn current_group_column(&self) -> Option<&ColumnRef> {
        if self.is_grouping() {
            self.row_group_cols.get(self.group_keys.len())
        } else {
            None
        }
    }

    /// 请求窗口大小
    pub fn page_size(&self) -> usize {
        (self.end_row - self.start_row).max(0) as usize
    }
}

/// 标识符校验：列名/表名无法绑定为参数，只允许 `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_valid_identifier(ident: &str) -> bool {
    let mut chars = ident.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn ensure_identifier(ident: &str) -> Result<()> {
    if is_valid_identifier(ident) {
        Ok(())
    } else {
        Err(GridError::MalformedRequest(format!(
            "invalid column identifier: {:?}",
            ident
        )))
    }
}
