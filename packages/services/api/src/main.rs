//! Gityard API
//!
//! 회원가입, 로그인(access/refresh token), SSH 공개키 설정 엔드포인트를 제공합니다.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod cookie;
mod db;
mod error;
mod handlers;
mod middleware;
mod state;

use config::Config;
use db::SqliteStore;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 환경변수 로드
    dotenvy::dotenv().ok();

    // 로깅 초기화
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "gy_api=debug,gy_core=info,tower_http=debug".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 설정 로드
    let config = Config::from_env()?;
    tracing::info!("Starting API with config: {:?}", config);

    // 저장소 및 앱 상태 초기화
    let store = SqliteStore::new(&config.database_url).await?;
    let state = Arc::new(AppState::new(config.clone(), Arc::new(store)));

    // 라우터 구성
    let app = create_router(state);

    // 서버 시작
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("API listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// 라우터 생성
fn create_router(state: Arc<AppState>) -> Router {
    use handlers::{health, keys, login, users};

    Router::new()
        // Health check
        .route("/healthcheck", get(health::healthcheck))
        // Users
        .route("/users/signup", post(users::signup))
        .route("/users/me", get(users::me))
        .route("/me", get(users::me))
        // Login
        .route("/login/access-token", post(login::access_token))
        .route("/login/refresh", post(login::refresh))
        .route("/logout", post(login::logout))
        // Settings
        .route(
            "/settings/keys",
            post(keys::register).get(keys::list).delete(keys::delete),
        )
        .route("/settings/keys/register", post(keys::register))
        .route("/settings/keys/list", get(keys::list))
        .route("/settings/keys/delete", post(keys::delete))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(middleware::request_id))
        // State
        .with_state(state)
}
