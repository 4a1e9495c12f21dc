//! 数据模型模块

pub mod account;
pub mod audit;
pub mod auth;
pub mod role;
