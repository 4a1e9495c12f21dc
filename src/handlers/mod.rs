//! HTTP 处理器模块

pub mod audit;
pub mod auth;
pub mod extract;
pub mod health;
pub mod user;
