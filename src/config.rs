//! 配置系统
//! 从环境变量加载所有配置，使用 Secret 包装敏感信息

use config::{Config, ConfigError, Environment};
use jsonwebtoken::Algorithm;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址，例如 "0.0.0.0:8000"
    pub addr: String,
    /// 优雅关闭超时时间（秒）
    pub graceful_shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库连接 URL（使用 Secret 包装，防止日志泄露）
    pub url: Secret<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    /// 获取连接超时时间（秒）
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别: trace, debug, info, warn, error
    pub level: String,
    /// 日志格式: json, pretty
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// JWT 签名密钥
    pub jwt_secret: Secret<String>,
    /// JWT 签名算法（仅支持 HMAC 系列）
    pub jwt_algorithm: String,
    /// 访问令牌过期时间（秒）
    pub access_token_exp_secs: u64,
    /// 刷新令牌过期时间（秒）
    pub refresh_token_exp_secs: u64,
    /// 密码重置码有效期（秒）
    pub reset_token_exp_secs: u64,
    /// Argon2 内存开销（KiB）
    pub hash_memory_kib: u32,
    pub hash_iterations: u32,
    pub hash_parallelism: u32,
    /// 是否信任 X-Forwarded-For 头
    pub trust_proxy: bool,
}

impl SecurityConfig {
    /// Parsed signing algorithm. Only valid after [`AppConfig::validate`] passed.
    pub fn algorithm(&self) -> Result<Algorithm, ConfigError> {
        let algorithm = Algorithm::from_str(&self.jwt_algorithm).map_err(|_| {
            ConfigError::Message(format!("Unknown JWT algorithm: {}", self.jwt_algorithm))
        })?;

        match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
            other => Err(ConfigError::Message(format!(
                "JWT algorithm {:?} needs a key pair; only HS256, HS384 and HS512 are supported",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
}

impl AppConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Config::builder();

        settings = settings
            .set_default("server.addr", "0.0.0.0:8000")?
            .set_default("server.graceful_shutdown_timeout_secs", 30)?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout_secs", 30)?
            .set_default("database.idle_timeout_secs", 600)?
            .set_default("database.max_lifetime_secs", 1800)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .set_default("security.jwt_secret", "change-this-secret-in-production-min-32-chars!")?
            .set_default("security.jwt_algorithm", "HS256")?
            .set_default("security.access_token_exp_secs", 1200)?
            .set_default("security.refresh_token_exp_secs", 604800)?
            .set_default("security.reset_token_exp_secs", 7200)?
            .set_default("security.hash_memory_kib", 65536)?
            .set_default("security.hash_iterations", 3)?
            .set_default("security.hash_parallelism", 4)?
            .set_default("security.trust_proxy", true)?;

        // 环境变量前缀为 AMS_，嵌套键使用 __ 分隔
        settings = settings.add_source(
            Environment::with_prefix("AMS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = settings.build()?.try_deserialize()?;

        config.validate()?;

        Ok(config)
    }

    /// 验证配置合法性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(port_str) = self.server.addr.split(':').next_back() {
            if let Ok(port) = port_str.parse::<u16>() {
                // 端口 0 表示由系统分配
                if port != 0 && port < 1024 {
                    return Err(ConfigError::Message("Server port should be >= 1024".to_string()));
                }
            }
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                )))
            }
        }

        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log format: {}. Must be one of: json, pretty",
                    self.logging.format
                )))
            }
        }

        if self.database.max_connections < self.database.min_connections {
            return Err(ConfigError::Message(
                "max_connections must be >= min_connections".to_string(),
            ));
        }

        if self.security.jwt_secret.expose_secret().len() < 32 {
            return Err(ConfigError::Message(
                "JWT secret must be at least 32 characters long".to_string(),
            ));
        }

        self.security.algorithm()?;

        if self.security.access_token_exp_secs < 60 || self.security.access_token_exp_secs > 86400 {
            return Err(ConfigError::Message(
                "access_token_exp_secs must be between 60 and 86400 (1 minute to 24 hours)"
                    .to_string(),
            ));
        }

        if self.security.refresh_token_exp_secs < 3600
            || self.security.refresh_token_exp_secs > 2592000
        {
            return Err(ConfigError::Message(
                "refresh_token_exp_secs must be between 3600 and 2592000 (1 hour to 30 days)"
                    .to_string(),
            ));
        }

        if self.security.reset_token_exp_secs < 300 || self.security.reset_token_exp_secs > 86400 {
            return Err(ConfigError::Message(
                "reset_token_exp_secs must be between 300 and 86400 (5 minutes to 24 hours)"
                    .to_string(),
            ));
        }

        Ok(())
    }
}
