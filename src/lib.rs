//! 账户与访问控制服务库
//! 注册、认证、角色门禁、密码重置与审计日志

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod telemetry;
