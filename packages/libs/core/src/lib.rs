//! gy-core: Gityard 인증/식별 핵심 라이브러리
//!
//! HTTP 계층(gy-api)과 분리된 도메인 로직을 제공합니다.
//!
//! # 모듈 구조
//!
//! - `auth`: 비밀번호 해시, 토큰 발급/검증, 세션(로그인/refresh 회전/로그아웃)
//! - `pubkey`: SSH 공개키 파싱, OpenSSH 정규화, fingerprint
//! - `accounts`: 회원가입, 프로필, 공개키 등록/목록/삭제
//! - `store`: 영속 저장소 계약과 인메모리 구현
//! - `requests`: 요청 구조체와 사전 조건 검증
//! - `error`: 공통 에러 타입
//! - `id`: ID 생성 전략 (UUID, ULID)

pub mod accounts;
pub mod auth;
pub mod error;
pub mod id;
pub mod pubkey;
pub mod requests;
pub mod store;

pub use error::{Error, Result};
