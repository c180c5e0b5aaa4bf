//! /settings/keys 핸들러

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use gy_core::accounts::KeyList;
use gy_core::requests::{KeyDeletion, KeyRegistration, PageQuery};

use crate::error::{ApiError, Result};
use crate::middleware::CurrentUser;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct KeyRegistered {
    pub fingerprint: String,
}

/// 공개키 등록
pub async fn register(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<KeyRegistration>,
) -> Result<Json<KeyRegistered>> {
    let record = state.accounts.register_key(&user.id, request).await?;
    Ok(Json(KeyRegistered {
        fingerprint: record.fingerprint,
    }))
}

/// 공개키 목록
pub async fn list(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<KeyList>> {
    let list = state.accounts.list_keys(&user.id, query).await?;
    Ok(Json(list))
}

/// 공개키 삭제
///
/// 등록되지 않은 fingerprint는 404가 아닌 422입니다.
pub async fn delete(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<KeyDeletion>,
) -> Result<Json<Value>> {
    match state.accounts.delete_key(&user.id, &request.fingerprint).await {
        Ok(()) => Ok(Json(json!({}))),
        Err(gy_core::Error::NotFound { .. }) => Err(ApiError::Unprocessable {
            message: "fingerprint not registered".to_string(),
        }),
        Err(e) => Err(e.into()),
    }
}
