//! HTTP 中间件
//! 应用状态、请求追踪、客户端 IP 提取

use crate::{
    auth::{jwt::JwtService, password::PasswordHasher},
    config::AppConfig,
    error::AppError,
    repository::Store,
    services::{AccessService, AccountService, AuditService, AuthService, RoleService},
};
use axum::{
    extract::{ConnectInfo, FromRef, FromRequestParts, Request},
    http::{request::Parts, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// 应用状态
///
/// 服务之间共享同一个 `Store`，克隆只复制 Arc 指针。
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Store,
    pub jwt_service: Arc<JwtService>,
    pub auth_service: Arc<AuthService>,
    pub access_service: Arc<AccessService>,
    pub account_service: Arc<AccountService>,
    pub audit_service: Arc<AuditService>,
    pub role_service: Arc<RoleService>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Store) -> Result<Self, AppError> {
        let jwt_service = Arc::new(JwtService::from_config(&config.security)?);
        let hasher = Arc::new(PasswordHasher::from_config(&config.security)?);

        let audit_service = Arc::new(AuditService::new(store.audit.clone()));
        let role_service = Arc::new(RoleService::new(store.roles.clone()));

        let auth_service = Arc::new(AuthService::new(
            store.accounts.clone(),
            store.resets.clone(),
            role_service.clone(),
            audit_service.clone(),
            jwt_service.clone(),
            hasher,
            config.security.reset_token_exp_secs,
        ));

        Ok(Self {
            access_service: Arc::new(AccessService::new(store.accounts.clone())),
            account_service: Arc::new(AccountService::new(
                store.accounts.clone(),
                role_service.clone(),
                audit_service.clone(),
            )),
            auth_service,
            audit_service,
            role_service,
            jwt_service,
            store,
            config,
        })
    }
}

/// 请求追踪中间件
/// 为每个请求生成 trace_id 和 request_id，并记录指标
pub async fn request_tracking_middleware(req: Request, next: Next) -> Response {
    let trace_id = extract_or_generate_trace_id(req.headers());
    let request_id = Uuid::new_v4().to_string();

    let method = req.method().to_string();
    let uri = req.uri().to_string();

    let span = tracing::info_span!(
        "http_request",
        trace_id = %trace_id,
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    async move {
        let start = Instant::now();

        let mut response = next.run(req).await;

        let elapsed = start.elapsed();

        // 指标标签只使用静态字符串
        let status = response.status().as_u16();
        let method_name = match method.as_str() {
            "GET" => "GET",
            "POST" => "POST",
            "PUT" => "PUT",
            "DELETE" => "DELETE",
            "PATCH" => "PATCH",
            _ => "UNKNOWN",
        };
        let status_code = match status {
            200 => "200",
            201 => "201",
            400 => "400",
            401 => "401",
            403 => "403",
            404 => "404",
            500 => "500",
            _ => "other",
        };

        metrics::counter!("http_requests_total", "method" => method_name, "status" => status_code)
            .increment(1);
        metrics::histogram!("http_request_duration_seconds").record(elapsed.as_secs_f64());

        tracing::info!(
            method = %method,
            uri = %uri,
            status = status,
            elapsed_ms = elapsed.as_millis(),
            "Request completed"
        );

        if let Ok(value) = HeaderValue::from_str(&trace_id) {
            response.headers_mut().insert("x-trace-id", value);
        }
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert("x-request-id", value);
        }

        response
    }
    .instrument(span)
    .await
}

/// 从请求头中提取或生成 trace_id
fn extract_or_generate_trace_id(headers: &HeaderMap) -> String {
    headers
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// 客户端 IP（写入审计记录）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl<S> FromRequestParts<S> for ClientIp
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = Arc::<AppState>::from_ref(state);
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Ok(ClientIp(client_ip(
            &parts.headers,
            peer,
            state.config.security.trust_proxy,
        )))
    }
}

/// 获取客户端 IP 地址
///
/// 仅在信任代理时读取 X-Forwarded-For（取第一个）和 X-Real-IP；
/// 无法解析为 IP 地址的头部值被忽略。
fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy: bool) -> String {
    if trust_proxy {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(parse_ip);

        let real_ip = || {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .and_then(parse_ip)
        };

        if let Some(ip) = forwarded.or_else(real_ip) {
            return ip.to_string();
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn parse_ip(value: &str) -> Option<IpAddr> {
    value.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_or_generate_trace_id() {
        let mut headers = HeaderMap::new();
        headers.insert("x-trace-id", "test-trace-123".parse().unwrap());

        let trace_id = extract_or_generate_trace_id(&headers);
        assert_eq!(trace_id, "test-trace-123");

        let headers = HeaderMap::new();
        let trace_id = extract_or_generate_trace_id(&headers);
        assert!(!trace_id.is_empty());
        assert_ne!(trace_id, "test-trace-123");
    }

    #[test]
    fn test_client_ip_prefers_forwarded_for_when_trusted() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        headers.insert("x-real-ip", "198.51.100.2".parse().unwrap());
        let peer: SocketAddr = "127.0.0.1:4000".parse().unwrap();

        assert_eq!(client_ip(&headers, Some(peer), true), "203.0.113.7");
        assert_eq!(client_ip(&headers, Some(peer), false), "127.0.0.1");
    }

    #[test]
    fn test_client_ip_falls_back_to_real_ip_then_peer() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "198.51.100.2".parse().unwrap());
        assert_eq!(client_ip(&headers, None, true), "198.51.100.2");

        let peer: SocketAddr = "192.0.2.10:5555".parse().unwrap();
        assert_eq!(client_ip(&HeaderMap::new(), Some(peer), true), "192.0.2.10");
        assert_eq!(client_ip(&HeaderMap::new(), None, true), "unknown");
    }

    #[test]
    fn test_client_ip_ignores_malformed_forwarded_values() {
        let peer: SocketAddr = "192.0.2.10:5555".parse().unwrap();

        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "a".repeat(300).parse().unwrap());
        assert_eq!(client_ip(&headers, Some(peer), true), "192.0.2.10");

        headers.insert("x-real-ip", "2001:db8::1".parse().unwrap());
        assert_eq!(client_ip(&headers, Some(peer), true), "2001:db8::1");

        headers.insert("x-real-ip", "not-an-ip".parse().unwrap());
        assert_eq!(client_ip(&headers, None, true), "unknown");
    }
}
