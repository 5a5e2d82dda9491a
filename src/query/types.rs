// 查询结果类型定义

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// 单行记录：列名 -> 值
pub type Record = Map<String, Value>;

/// 总行数信号
///
/// 序列化为客户端约定的形式：
/// - `Exact(n)` -> `n`
/// - `MoreRemain` -> `-1`
/// - `Empty` -> `null`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowCount {
    /// 已到达末尾，精确的总行数
    Exact(u64),
    /// 窗口之后还有数据
    MoreRemain,
    /// 起始行处没有任何数据
    Empty,
}

/// MoreRemain 的线上编码
pub const MORE_ROWS_SENTINEL: i64 = -1;

impl RowCount {
    pub fn as_wire(&self) -> Option<i64> {
        match self {
            RowCount::Exact(n) => Some(*n as i64),
            RowCount::MoreRemain => Some(MORE_ROWS_SENTINEL),
            RowCount::Empty => None,
        }
    }
}

impl Serialize for RowCount {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.as_wire().serialize(serializer)
    }
}

/// 一页查询结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    pub rows: Vec<Record>,
    pub row_count: RowCount,
}
