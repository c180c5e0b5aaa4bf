//! HTTP 핸들러

pub mod health;
pub mod keys;
pub mod login;
pub mod users;
