//! HTTP API 请求处理器

use actix_web::{http::StatusCode, web, HttpResponse, Result};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use super::models::*;
use crate::ingest::CsvIngestor;
use crate::query::{GridQueryEngine, GridRequest};
use crate::GridError;

/// 应用状态
pub struct AppState {
    pub engine: Arc<GridQueryEngine>,
    pub ingestor: Arc<CsvIngestor>,
}

impl AppState {
    pub fn new(engine: Arc<GridQueryEngine>, ingestor: Arc<CsvIngestor>) -> Self {
        Self { engine, ingestor }
    }
}

/// 健康检查
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "gamegrid"
    }))
}

/// 表格数据（服务端行模型）
pub async fn fetch_data(
    payload: web::Json<Value>,
    state: web::Data<Arc<AppState>>,
) -> Result<HttpResponse> {
    let request_id = Uuid::new_v4();

    let req = match GridRequest::from_json(payload.into_inner()) {
        Ok(req) => req,
        Err(e) => return Ok(error_response(request_id, &e)),
    };

    log::info!(
        "[{}] rows [{}, {}) groups={}/{} filters={} sorts={}",
        request_id,
        req.start_row,
        req.end_row,
        req.group_keys.len(),
        req.row_group_cols.len(),
        req.filter_model.len(),
        req.sort_model.len()
    );

    match state.engine.fetch_page(&req).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            "Data fetched successfully",
            page,
        ))),
        Err(e) => Ok(error_response(request_id, &e)),
    }
}

/// 从远程地址导入 CSV
pub async fn upload_csv(
    req: web::Json<UploadCsvRequest>,
    state: web::Data<Arc<AppState>>,
) -> Result<HttpResponse> {
    let request_id = Uuid::new_v4();

    let link = match req.csv_link.as_deref().map(str::trim) {
        Some(link) if !link.is_empty() => link.to_string(),
        _ => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::<()>::error(
                400,
                "CSV link is required".to_string(),
            )))
        }
    };

    match state.ingestor.ingest_from_url(&link).await {
        Ok(summary) => {
            log::info!(
                "[{}] CSV imported from {}: {} parsed, {} written",
                request_id,
                link,
                summary.parsed,
                summary.written
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                "CSV data uploaded successfully",
                UploadCsvResponse {
                    rows_parsed: summary.parsed,
                    rows_written: summary.written,
                },
            )))
        }
        Err(e) => Ok(error_response(request_id, &e)),
    }
}

/// GridError -> 统一错误响应
pub fn error_response(request_id: Uuid, err: &GridError) -> HttpResponse {
    let code = err.status_code();
    if code >= 500 {
        log::error!("[{}] {}", request_id, err);
    } else {
        log::warn!("[{}] {}", request_id, err);
    }

    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    HttpResponse::build(status).json(ApiResponse::<()>::error(code, err.to_string()))
}
