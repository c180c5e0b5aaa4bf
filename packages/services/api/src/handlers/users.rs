//! /users 핸들러

use std::sync::Arc;

use axum::{extract::State, Json};

use gy_core::requests::SignupRequest;
use gy_core::store::PublicUser;

use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// 회원가입
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SignupRequest>,
) -> Result<Json<PublicUser>> {
    let user = state.accounts.signup(request).await?;
    Ok(Json(user))
}

/// 현재 사용자 프로필
pub async fn me(CurrentUser(user): CurrentUser) -> Json<PublicUser> {
    Json(user.to_public())
}
