//! HTTP API 路由配置

use actix_web::{error::InternalError, web, HttpResponse};

use super::handlers;
use super::models::ApiResponse;

/// 请求体上限（表格请求 JSON）
const MAX_JSON_BYTES: usize = 1024 * 1024;

/// 配置所有路由
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        // 健康检查
        .route("/health", web::get().to(handlers::health_check))
        // 表格数据
        .route("/data", web::post().to(handlers::fetch_data))
        // CSV 导入
        .route("/upload-csv", web::post().to(handlers::upload_csv));
}

/// JSON 解析失败时返回统一的 400 响应
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(MAX_JSON_BYTES)
        .error_handler(|err, _req| {
            let message = format!("Malformed request: {}", err);
            let response =
                HttpResponse::BadRequest().json(ApiResponse::<()>::error(400, message));
            InternalError::from_response(err, response).into()
        })
}
