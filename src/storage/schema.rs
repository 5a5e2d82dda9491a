//! 游戏元数据表结构

use tokio_postgres::Client;

use crate::query::ensure_identifier;
use crate::Result;

/// 建表 DDL
pub fn create_table_sql(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\
            slno SERIAL PRIMARY KEY, \
            appid INT UNIQUE, \
            \"name\" VARCHAR(255), \
            release_date DATE, \
            required_age INT, \
            price FLOAT, \
            dlc_count INT, \
            about_the_game TEXT, \
            supported_languages JSON, \
            windows BOOLEAN, \
            mac BOOLEAN, \
            linux BOOLEAN, \
            positive INT, \
            negative INT, \
            score_rank INT, \
            developers TEXT, \
            publishers TEXT, \
            categories JSON, \
            genres JSON, \
            tags JSON\
        )",
        table
    )
}

/// 确保数据表存在（已存在时不做任何修改）
pub async fn ensure_table_exists(client: &Client, table: &str) -> Result<()> {
    ensure_identifier(table)?;

    let existed = client
        .query_one(
            "SELECT EXISTS (SELECT 1 FROM information_schema.tables WHERE table_name = $1)",
            &[&table],
        )
        .await?
        .try_get::<_, bool>(0)?;

    if existed {
        log::info!("Table '{}' already exists", table);
        return Ok(());
    }

    client.batch_execute(&create_table_sql(table)).await?;
    log::info!("Table '{}' created", table);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_table_sql() {
        let ddl = create_table_sql("game_data");
        assert!(ddl.starts_with("CREATE TABLE IF NOT EXISTS game_data (slno SERIAL PRIMARY KEY, "));
        assert!(ddl.contains("appid INT UNIQUE"));
        assert!(ddl.contains("release_date DATE"));
        assert!(ddl.contains("tags JSON)"));
    }
}
