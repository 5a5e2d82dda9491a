//! HTTP API 请求/响应模型

use serde::{Deserialize, Serialize};

/// 通用响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

/// API 错误
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: u16,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error: None,
        }
    }

    pub fn error(code: u16, message: String) -> Self {
        Self {
            success: false,
            message: message.clone(),
            data: None,
            error: Some(ApiError { code, message }),
        }
    }
}

/// CSV 导入请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadCsvRequest {
    #[serde(default)]
    pub csv_link: Option<String>,
}

/// CSV 导入响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadCsvResponse {
    pub rows_parsed: usize,
    pub rows_written: u64,
}
