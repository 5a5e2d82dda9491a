// CSV 行 -> 游戏记录（字段规范化）

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use tokio_postgres::types::ToSql;

use crate::{GridError, Result};

/// CSV 原始行（列名与数据集表头一致）
#[derive(Debug, Clone, Deserialize)]
pub struct CsvGameRow {
    #[serde(rename = "AppID")]
    pub app_id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Release date")]
    pub release_date: String,
    #[serde(rename = "Required age")]
    pub required_age: String,
    #[serde(rename = "Price")]
    pub price: String,
    #[serde(rename = "DLC count")]
    pub dlc_count: String,
    #[serde(rename = "About the game")]
    pub about_the_game: String,
    #[serde(rename = "Supported languages")]
    pub supported_languages: String,
    #[serde(rename = "Windows")]
    pub windows: String,
    #[serde(rename = "Mac")]
    pub mac: String,
    #[serde(rename = "Linux")]
    pub linux: String,
    #[serde(rename = "Positive")]
    pub positive: String,
    #[serde(rename = "Negative")]
    pub negative: String,
    #[serde(rename = "Score rank")]
    pub score_rank: String,
    #[serde(rename = "Developers")]
    pub developers: String,
    #[serde(rename = "Publishers")]
    pub publishers: String,
    #[serde(rename = "Categories")]
    pub categories: String,
    #[serde(rename = "Genres")]
    pub genres: String,
    #[serde(rename = "Tags")]
    pub tags: String,
}

/// 规范化后的游戏记录
#[derive(Debug, Clone, PartialEq)]
pub struct GameRecord {
    pub appid: i32,
    pub name: String,
    pub release_date: Option<NaiveDate>,
    pub required_age: i32,
    pub price: f64,
    pub dlc_count: i32,
    pub about_the_game: String,
    pub supported_languages: Value,
    pub windows: bool,
    pub mac: bool,
    pub linux: bool,
    pub positive: i32,
    pub negative: i32,
    pub score_rank: i32,
    pub developers: String,
    pub publishers: String,
    pub categories: Value,
    pub genres: Value,
    pub tags: Value,
}

impl TryFrom<CsvGameRow> for GameRecord {
    type Error = GridError;

    fn try_from(row: CsvGameRow) -> Result<Self> {
        Ok(Self {
            appid: parse_required("AppID", &row.app_id)?,
            release_date: parse_release_date(&row.release_date),
            required_age: parse_required("Required age", &row.required_age)?,
            price: parse_required("Price", &row.price)?,
            dlc_count: parse_required("DLC count", &row.dlc_count)?,
            supported_languages: parse_list(&row.supported_languages),
            windows: parse_flag(&row.windows),
            mac: parse_flag(&row.mac),
            linux: parse_flag(&row.linux),
            positive: parse_or_zero("Positive", &row.positive)?,
            negative: parse_or_zero("Negative", &row.negative)?,
            score_rank: parse_or_zero("Score rank", &row.score_rank)?,
            categories: parse_list(&row.categories),
            genres: parse_list(&row.genres),
            tags: parse_list(&row.tags),
            name: row.name,
            about_the_game: row.about_the_game,
            developers: row.developers,
            publishers: row.publishers,
        })
    }
}

impl GameRecord {
    /// 绑定参数，顺序与写入列一致
    pub fn sql_params(&self) -> [&(dyn ToSql + Sync); 19] {
        [
            &self.appid,
            &self.name,
            &self.release_date,
            &self.required_age,
            &self.price,
            &self.dlc_count,
            &self.about_the_game,
            &self.supported_languages,
            &self.windows,
            &self.mac,
            &self.linux,
            &self.positive,
            &self.negative,
            &self.score_rank,
            &self.developers,
            &self.publishers,
            &self.categories,
            &self.genres,
            &self.tags,
        ]
    }
}

/// 发行日期格式如 `Oct 21, 2008`，无法解析时为空
pub fn parse_release_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%b %d, %Y").ok()
}

/// `['English', 'French']` -> `["English", "French"]`
pub fn parse_list(s: &str) -> Value {
    let inner = s.trim().trim_start_matches('[').trim_end_matches(']').replace('\'', "");
    let items = inner
        .split(", ")
        .map(|item| Value::String(item.to_string()))
        .collect();
    Value::Array(items)
}

pub fn parse_flag(s: &str) -> bool {
    s.trim().eq_ignore_ascii_case("true")
}

fn parse_required<T: std::str::FromStr>(field: &str, s: &str) -> Result<T> {
    s.trim().parse::<T>().map_err(|_| {
        GridError::IngestError(format!("invalid value {:?} for column '{}'", s, field))
    })
}

fn parse_or_zero<T: std::str::FromStr + Default>(field: &str, s: &str) -> Result<T> {
    if s.trim().is_empty() {
        Ok(T::default())
    } else {
        parse_required(field, s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row() -> CsvGameRow {
        CsvGameRow {
            app_id: "20200".into(),
            name: "Galactic Bowling".into(),
            release_date: "Oct 21, 2008".into(),
            required_age: "0".into(),
            price: "19.99".into(),
            dlc_count: "0".into(),
            about_the_game: "Bowling, in space.".into(),
            supported_languages: "['English']".into(),
            windows: "TRUE".into(),
            mac: " False".into(),
            linux: "false".into(),
            positive: "6".into(),
            negative: "".into(),
            score_rank: "".into(),
            developers: "Perpetual FX Creative".into(),
            publishers: "Perpetual FX Creative".into(),
            categories: "['Single-player', 'Multi-player']".into(),
            genres: "['Casual', 'Indie', 'Sports']".into(),
            tags: "['Indie', 'Casual']".into(),
        }
    }

    #[test]
    fn test_normalize_row() {
        let rec = GameRecord::try_from(row()).unwrap();
        assert_eq!(rec.appid, 20200);
        assert_eq!(rec.release_date, NaiveDate::from_ymd_opt(2008, 10, 21));
        assert_eq!(rec.price, 19.99);
        assert!(rec.windows);
        assert!(!rec.mac);
        assert_eq!(rec.negative, 0);
        assert_eq!(rec.score_rank, 0);
        assert_eq!(rec.positive, 6);
        assert_eq!(rec.genres, json!(["Casual", "Indie", "Sports"]));
        assert_eq!(rec.supported_languages, json!(["English"]));
    }

    #[test]
    fn test_unparseable_release_date_is_null() {
        assert_eq!(parse_release_date("Coming soon"), None);
        assert_eq!(
            parse_release_date("Jan 5, 2021"),
            NaiveDate::from_ymd_opt(2021, 1, 5)
        );
    }

    #[test]
    fn test_empty_list_keeps_single_empty_item() {
        assert_eq!(parse_list("[]"), json!([""]));
    }

    #[test]
    fn test_bad_appid_is_ingest_error() {
        let mut r = row();
        r.app_id = "abc".into();
        let err = GameRecord::try_from(r).unwrap_err();
        assert!(matches!(err, GridError::IngestError(_)));
    }
}
