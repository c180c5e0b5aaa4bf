//! 로그인/토큰 핸들러
//!
//! Access token은 응답 본문으로, refresh token은 HttpOnly 쿠키로 전달합니다.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap},
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};

use gy_core::auth::{IssuedTokens, REFRESH_COOKIE_NAME};

use crate::cookie;
use crate::error::{ApiError, Result};
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// OAuth2 password grant 형식 로그인 폼
#[derive(Deserialize)]
pub struct LoginForm {
    /// email
    pub username: String,
    pub password: String,
}

/// 토큰 응답 본문
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// access token 수명 (초)
    pub expires_in: i64,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub revoked: bool,
}

/// POST /login/access-token
pub async fn access_token(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let tokens = state
        .sessions
        .login(form.username.trim(), &form.password)
        .await?;
    Ok(token_response(&state, tokens))
}

/// POST /login/refresh
pub async fn refresh(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Result<Response> {
    let presented = cookie::get(&headers, REFRESH_COOKIE_NAME)
        .ok_or_else(|| ApiError::unauthorized("missing refresh token"))?;

    let tokens = state.sessions.refresh(presented).await?;
    Ok(token_response(&state, tokens))
}

/// POST /logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Response> {
    let revoked = state.sessions.logout(&user.id).await?;

    let mut response = Json(LogoutResponse { revoked }).into_response();
    if let Some(value) = cookie::clear_refresh(state.config.cookie_secure) {
        response.headers_mut().insert(SET_COOKIE, value);
    }
    Ok(response)
}

fn token_response(state: &AppState, tokens: IssuedTokens) -> Response {
    let set_cookie = cookie::refresh(
        &tokens.refresh_token,
        tokens.refresh_ttl.num_seconds(),
        state.config.cookie_secure,
    );

    let mut response = Json(TokenResponse {
        access_token: tokens.access_token,
        token_type: "bearer".to_string(),
        expires_in: tokens.access_ttl.num_seconds(),
    })
    .into_response();

    match set_cookie {
        Some(value) => {
            response.headers_mut().insert(SET_COOKIE, value);
        }
        None => tracing::error!(user_id = %tokens.user_id, "refresh cookie could not be encoded"),
    }
    response
}
