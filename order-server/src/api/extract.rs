//! 请求体提取器
//!
//! `axum::Json` 的包装：反序列化失败统一渲染为 [`AppError`]，
//! 与其他错误保持同一响应格式。
//!
//! | 失败原因 | 错误码 | HTTP |
//! |----------|--------|------|
//! | 字段缺失 / 类型不符 | UnprocessableBody | 422 |
//! | JSON 语法错误 / Content-Type 缺失 | InvalidRequest | 400 |

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};

use crate::utils::{AppError, ErrorCode};

/// JSON body extractor with [`AppError`] rejections
#[derive(Debug, Clone, Copy, Default)]
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(rejection_to_error(rejection)),
        }
    }
}

fn rejection_to_error(rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::JsonDataError(e) => {
            AppError::with_message(ErrorCode::UnprocessableBody, e.body_text())
        }
        other => AppError::invalid_request(other.body_text()),
    }
}
