// 分页估算：根据多取的一行判断总行数信号

use super::request::GridRequest;
use super::types::{PageResult, Record, RowCount};

/// 由存储返回的行（最多 page_size + 1 行）生成当前页
pub fn paginate(req: &GridRequest, mut rows: Vec<Record>) -> PageResult {
    let page_size = req.page_size();

    let row_count = if rows.is_empty() {
        RowCount::Empty
    } else if rows.len() > page_size {
        rows.truncate(page_size);
        RowCount::MoreRemain
    } else {
        RowCount::Exact(req.start_row as u64 + rows.len() as u64)
    };

    PageResult { rows, row_count }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| {
                let mut r = Record::new();
                r.insert("appid".to_string(), json!(i));
                r
            })
            .collect()
    }

    fn window(start: i64, end: i64) -> GridRequest {
        GridRequest {
            start_row: start,
            end_row: end,
            ..Default::default()
        }
    }

    #[test]
    fn test_final_page_reports_exact_count() {
        let page = paginate(&window(0, 50), rows(50));
        assert_eq!(page.rows.len(), 50);
        assert_eq!(page.row_count, RowCount::Exact(50));
    }

    #[test]
    fn test_partial_last_page_offsets_by_start_row() {
        let page = paginate(&window(100, 150), rows(17));
        assert_eq!(page.rows.len(), 17);
        assert_eq!(page.row_count, RowCount::Exact(117));
    }

    #[test]
    fn test_over_fetch_truncates_and_signals_more() {
        let page = paginate(&window(0, 50), rows(51));
        assert_eq!(page.rows.len(), 50);
        assert_eq!(page.row_count, RowCount::MoreRemain);
        // 截断保留存储返回顺序
        assert_eq!(page.rows[49]["appid"], json!(49));
    }

    #[test]
    fn test_empty_window_is_distinct_from_zero() {
        let page = paginate(&window(0, 50), vec![]);
        assert!(page.rows.is_empty());
        assert_eq!(page.row_count, RowCount::Empty);
        assert_ne!(page.row_count, RowCount::Exact(0));
    }
}
