//! Refresh token 쿠키

use axum::http::header::COOKIE;
use axum::http::{HeaderMap, HeaderValue};

use gy_core::auth::REFRESH_COOKIE_NAME;

/// 요청의 `Cookie` 헤더에서 값 조회
pub fn get<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

/// refresh token 설정용 `Set-Cookie` 값
pub fn refresh(token: &str, max_age_secs: i64, secure: bool) -> Option<HeaderValue> {
    build(token, max_age_secs.max(0), secure)
}

/// refresh token 삭제용 `Set-Cookie` 값
pub fn clear_refresh(secure: bool) -> Option<HeaderValue> {
    build("", 0, secure)
}

fn build(value: &str, max_age_secs: i64, secure: bool) -> Option<HeaderValue> {
    let mut cookie = format!(
        "{REFRESH_COOKIE_NAME}={value}; Max-Age={max_age_secs}; Path=/; HttpOnly; SameSite=Strict"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).ok()
}
