//! Bearer 인증 extractor

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use gy_core::auth::bearer_token;
use gy_core::store::User;

use crate::error::ApiError;
use crate::state::AppState;

/// 유효한 access token으로 인증된 사용자
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        let token = bearer_token(header)
            .ok_or_else(|| ApiError::unauthorized("missing bearer token"))?;

        let user = state
            .sessions
            .authenticate(token)
            .await
            .map_err(|e| match e {
                // 토큰은 유효하지만 사용자가 사라진 경우도 인증 실패로 취급
                gy_core::Error::NotFound { .. } => {
                    ApiError::unauthorized("could not validate credentials")
                }
                other => ApiError::from(other),
            })?;

        Ok(CurrentUser(user))
    }
}
