// 过滤条件翻译器
//
// filterType × type 映射为封闭的枚举后再生成谓词片段；
// 片段中的字面量一律推入 Bindings，返回的 SQL 只含占位符。

use chrono::NaiveDate;
use serde_json::Value;

use super::request::{FilterCondition, FilterSpec};
use super::sql::{Bindings, SqlParam};
use crate::{GridError, Result};

/// 恒真谓词，用于被忽略的过滤条件
pub const ALWAYS_TRUE: &str = "TRUE";

/// 不支持的过滤条件如何处理
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FilterMode {
    /// 忽略并记录告警（默认）
    #[default]
    Permissive,
    /// 返回 UnsupportedFilter 错误
    Strict,
}

/// 过滤操作符（客户端 `type` 字段的封闭集合）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Equals,
    NotEqual,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    InRange,
}

impl FilterOperator {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "equals" => Some(FilterOperator::Equals),
            "notEqual" => Some(FilterOperator::NotEqual),
            "contains" => Some(FilterOperator::Contains),
            "notContains" => Some(FilterOperator::NotContains),
            "startsWith" => Some(FilterOperator::StartsWith),
            "endsWith" => Some(FilterOperator::EndsWith),
            "greaterThan" => Some(FilterOperator::GreaterThan),
            "greaterThanOrEqual" => Some(FilterOperator::GreaterThanOrEqual),
            "lessThan" => Some(FilterOperator::LessThan),
            "lessThanOrEqual" => Some(FilterOperator::LessThanOrEqual),
            "inRange" => Some(FilterOperator::InRange),
            _ => None,
        }
    }
}

/// 文本匹配方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMatch {
    Equals,
    NotEqual,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
}

/// 比较条件（数值/日期共用）
#[derive(Debug, Clone, PartialEq)]
pub enum Comparison<T> {
    Equals(T),
    NotEqual(T),
    GreaterThan(T),
    GreaterThanOrEqual(T),
    LessThan(T),
    LessThanOrEqual(T),
    /// 闭区间 [from, to]
    InRange(T, T),
}

/// 分类后的过滤条件
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Text(TextMatch, String),
    Number(Comparison<f64>),
    Date(Comparison<NaiveDate>),
    /// JSON 数组包含（或不包含）某个元素
    ArrayElement { negated: bool, value: String },
    /// 对数组文本形式做子串匹配，比元素匹配宽松
    ArrayText { negated: bool, value: String },
}

/// 将过滤条件分类为 Condition；无法支持时返回原因
pub fn classify(spec: &FilterSpec) -> std::result::Result<Condition, String> {
    match spec {
        FilterSpec::Text(cond) => classify_text(cond),
        FilterSpec::Number(cond) => {
            classify_comparison(cond, "number", parse_number).map(Condition::Number)
        }
        FilterSpec::Date(cond) => classify_comparison(cond, "date", parse_date).map(Condition::Date),
        FilterSpec::Array(cond) => classify_array(cond),
        FilterSpec::Unknown => Err("unknown filterType".to_string()),
    }
}

/// 翻译单列过滤条件为谓词片段
pub fn translate(
    column: &str,
    spec: &FilterSpec,
    bindings: &mut Bindings,
    mode: FilterMode,
) -> Result<String> {
    match classify(spec) {
        Ok(condition) => Ok(render(column, &condition, bindings)),
        Err(reason) => match mode {
            FilterMode::Strict => Err(GridError::UnsupportedFilter {
                column: column.to_string(),
                reason,
            }),
            FilterMode::Permissive => {
                log::warn!("Ignoring filter on column '{}': {}", column, reason);
                Ok(ALWAYS_TRUE.to_string())
            }
        },
    }
}

/// 生成谓词片段
pub fn render(column: &str, condition: &Condition, bindings: &mut Bindings) -> String {
    match condition {
        Condition::Text(kind, value) => {
            let (op, param) = match kind {
                TextMatch::Equals => ("=", value.clone()),
                TextMatch::NotEqual => ("!=", value.clone()),
                TextMatch::Contains => ("LIKE", format!("%{}%", escape_like(value))),
                TextMatch::NotContains => ("NOT LIKE", format!("%{}%", escape_like(value))),
                TextMatch::StartsWith => ("LIKE", format!("{}%", escape_like(value))),
                TextMatch::EndsWith => ("LIKE", format!("%{}", escape_like(value))),
            };
            let p = bindings.push(SqlParam::Text(param));
            format!("{} {} {}::text", column, op, p)
        }
        Condition::Number(cmp) => render_comparison(column, cmp, "float8", bindings, |v| {
            SqlParam::Float(*v)
        }),
        Condition::Date(cmp) => {
            render_comparison(column, cmp, "date", bindings, |d| SqlParam::Date(*d))
        }
        Condition::ArrayElement { negated, value } => {
            let p = bindings.push(SqlParam::Json(Value::Array(vec![Value::String(
                value.clone(),
            )])));
            let contains = format!("{}::jsonb @> {}::jsonb", column, p);
            if *negated {
                format!("NOT ({})", contains)
            } else {
                contains
            }
        }
        Condition::ArrayText { negated, value } => {
            let p = bindings.push(SqlParam::Text(format!("%{}%", escape_like(value))));
            let op = if *negated { "NOT LIKE" } else { "LIKE" };
            format!("{}::text {} {}::text", column, op, p)
        }
    }
}

fn render_comparison<T>(
    column: &str,
    cmp: &Comparison<T>,
    cast: &str,
    bindings: &mut Bindings,
    to_param: impl Fn(&T) -> SqlParam,
) -> String {
    let mut single = |op: &str, v: &T| {
        let p = bindings.push(to_param(v));
        format!("{} {} {}::{}", column, op, p, cast)
    };

    match cmp {
        Comparison::Equals(v) => single("=", v),
        Comparison::NotEqual(v) => single("!=", v),
        Comparison::GreaterThan(v) => single(">", v),
        Comparison::GreaterThanOrEqual(v) => single(">=", v),
        Comparison::LessThan(v) => single("<", v),
        Comparison::LessThanOrEqual(v) => single("<=", v),
        Comparison::InRange(from, to) => {
            let lower = single(">=", from);
            let upper = single("<=", to);
            format!("({} AND {})", lower, upper)
        }
    }
}

fn operator_of(cond: &FilterCondition) -> std::result::Result<FilterOperator, String> {
    let raw = cond
        .operator
        .as_deref()
        .ok_or_else(|| "missing filter type".to_string())?;
    FilterOperator::parse(raw).ok_or_else(|| format!("unsupported filter type '{}'", raw))
}

fn classify_text(cond: &FilterCondition) -> std::result::Result<Condition, String> {
    let kind = match operator_of(cond)? {
        FilterOperator::Equals => TextMatch::Equals,
        FilterOperator::NotEqual => TextMatch::NotEqual,
        FilterOperator::Contains => TextMatch::Contains,
        FilterOperator::NotContains => TextMatch::NotContains,
        FilterOperator::StartsWith => TextMatch::StartsWith,
        FilterOperator::EndsWith => TextMatch::EndsWith,
        other => return Err(format!("{:?} is not a text operator", other)),
    };
    let value = cond
        .operand()
        .and_then(text_operand)
        .ok_or_else(|| "missing text operand".to_string())?;
    Ok(Condition::Text(kind, value))
}

fn classify_array(cond: &FilterCondition) -> std::result::Result<Condition, String> {
    let op = operator_of(cond)?;
    let value = cond
        .operand()
        .and_then(text_operand)
        .ok_or_else(|| "missing array operand".to_string())?;
    match op {
        FilterOperator::Equals => Ok(Condition::ArrayElement {
            negated: false,
            value,
        }),
        FilterOperator::NotEqual => Ok(Condition::ArrayElement {
            negated: true,
            value,
        }),
        FilterOperator::Contains => Ok(Condition::ArrayText {
            negated: false,
            value,
        }),
        FilterOperator::NotContains => Ok(Condition::ArrayText {
            negated: true,
            value,
        }),
        other => Err(format!("{:?} is not an array operator", other)),
    }
}

fn classify_comparison<T>(
    cond: &FilterCondition,
    kind: &str,
    parse: impl Fn(&Value) -> Option<T>,
) -> std::result::Result<Comparison<T>, String> {
    let op = operator_of(cond)?;
    let operand = || {
        cond.operand()
            .and_then(&parse)
            .ok_or_else(|| format!("missing or invalid {} operand", kind))
    };

    let cmp = match op {
        FilterOperator::Equals => Comparison::Equals(operand()?),
        FilterOperator::NotEqual => Comparison::NotEqual(operand()?),
        FilterOperator::GreaterThan => Comparison::GreaterThan(operand()?),
        FilterOperator::GreaterThanOrEqual => Comparison::GreaterThanOrEqual(operand()?),
        FilterOperator::LessThan => Comparison::LessThan(operand()?),
        FilterOperator::LessThanOrEqual => Comparison::LessThanOrEqual(operand()?),
        FilterOperator::InRange => {
            let from = operand()?;
            let to = cond
                .operand_to()
                .and_then(&parse)
                .ok_or_else(|| format!("missing or invalid {} filterTo", kind))?;
            Comparison::InRange(from, to)
        }
        other => return Err(format!("{:?} is not a {} operator", other, kind)),
    };
    Ok(cmp)
}

fn text_operand(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn parse_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|x| x.is_finite()),
        _ => None,
    }
}

/// 接受 `YYYY-MM-DD`，忽略其后的时间部分（表格日期过滤器发送 `YYYY-MM-DD HH:MM:SS`）
fn parse_date(v: &Value) -> Option<NaiveDate> {
    let s = v.as_str()?.trim();
    let date_part = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// LIKE 模式转义：用户输入中的 `\` `%` `_` 按字面匹配
pub fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
