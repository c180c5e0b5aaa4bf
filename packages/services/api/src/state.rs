//! API 앱 상태

use std::sync::Arc;

use gy_core::accounts::AccountService;
use gy_core::auth::{SessionManager, TokenCodec};
use gy_core::store::IdentityStore;

use crate::config::Config;

/// 앱 상태
///
/// 모든 핸들러에서 공유하는 상태입니다.
pub struct AppState {
    /// 설정
    pub config: Config,

    /// 로그인/refresh/로그아웃
    pub sessions: SessionManager,

    /// 회원가입/프로필/공개키
    pub accounts: AccountService,
}

impl AppState {
    /// 저장소를 주입받아 상태 생성
    pub fn new(config: Config, store: Arc<dyn IdentityStore>) -> Self {
        let hasher = config.password_hasher();
        let sessions = SessionManager::new(
            store.clone(),
            TokenCodec::new(&config.secret_key),
            hasher,
            config.session_policy(),
        );
        let accounts = AccountService::new(store, hasher);

        Self {
            config,
            sessions,
            accounts,
        }
    }
}
