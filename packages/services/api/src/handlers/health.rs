//! 헬스 체크

use axum::Json;
use serde_json::{json, Value};

pub async fn healthcheck() -> Json<Value> {
    Json(json!({}))
}
