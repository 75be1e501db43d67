use actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderValue, RETRY_AFTER},
    Error, ResponseError,
};
use async_trait::async_trait;
use futures_util::future::{ready, LocalBoxFuture, Ready};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::domain::error::RelayError;
use crate::infrastructure::config::RateLimitConfig;
use crate::infrastructure::logger::Logger;

/// Limits applied per client key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window: Duration,
    /// Requests allowed inside one `burst_window`.
    pub burst: u32,
    pub burst_window: Duration,
}

impl RateLimitPolicy {
    pub fn new(max_requests: u32, burst: u32, window: Duration) -> Self {
        Self { max_requests, window, burst, burst_window: Duration::from_secs(1) }
    }
}

impl From<&RateLimitConfig> for RateLimitPolicy {
    fn from(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, config.burst, Duration::from_millis(config.window_ms))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

/// Shared counter storage. The middleware owns no state of its own, so several
/// relay instances can share one store.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Record one request for `key` and decide whether it may proceed.
    async fn hit(&self, key: &str, policy: &RateLimitPolicy) -> RateLimitDecision;

    /// Drop entries whose window has elapsed.
    async fn purge_expired(&self);
}

#[derive(Debug, Clone)]
struct RateLimitEntry {
    count: u32,
    reset_time: Instant,
    burst_count: u32,
    burst_reset_time: Instant,
}

impl RateLimitEntry {
    fn new(now: Instant, policy: &RateLimitPolicy) -> Self {
        Self {
            count: 1,
            reset_time: now + policy.window,
            burst_count: 1,
            burst_reset_time: now + policy.burst_window,
        }
    }

    fn expired(now: Instant) -> Self {
        Self { count: 0, reset_time: now, burst_count: 0, burst_reset_time: now }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryRateLimitStore {
    limits: RwLock<HashMap<String, RateLimitEntry>>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn tracked_clients(&self) -> usize {
        self.limits.read().await.len()
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimitStore {
    async fn hit(&self, key: &str, policy: &RateLimitPolicy) -> RateLimitDecision {
        let mut limits = self.limits.write().await;
        let now = Instant::now();

        let entry = limits
            .entry(key.to_string())
            .or_insert_with(|| RateLimitEntry::expired(now));
        if now >= entry.reset_time {
            *entry = RateLimitEntry::new(now, policy);
            return RateLimitDecision::Allowed { remaining: policy.max_requests.saturating_sub(1) };
        }

        if now >= entry.burst_reset_time {
            entry.burst_count = 0;
            entry.burst_reset_time = now + policy.burst_window;
        }

        if entry.count >= policy.max_requests {
            return RateLimitDecision::Limited { retry_after: entry.reset_time - now };
        }
        if entry.burst_count >= policy.burst {
            return RateLimitDecision::Limited { retry_after: entry.burst_reset_time - now };
        }

        entry.count += 1;
        entry.burst_count += 1;
        RateLimitDecision::Allowed { remaining: policy.max_requests - entry.count }
    }

    async fn purge_expired(&self) {
        let now = Instant::now();
        self.limits.write().await.retain(|_, entry| now < entry.reset_time);
    }
}

#[derive(Clone)]
pub struct RateLimitingMiddleware {
    store: Arc<dyn RateLimitStore>,
    policy: RateLimitPolicy,
}

impl RateLimitingMiddleware {
    pub fn new(store: Arc<dyn RateLimitStore>, policy: RateLimitPolicy) -> Self {
        Self { store, policy }
    }

    pub fn in_memory(policy: RateLimitPolicy) -> Self {
        Self::new(Arc::new(InMemoryRateLimitStore::new()), policy)
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitingMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Transform = RateLimitingService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitingService {
            service: Arc::new(service),
            store: Arc::clone(&self.store),
            policy: self.policy,
        }))
    }
}

pub struct RateLimitingService<S> {
    service: Arc<S>,
    store: Arc<dyn RateLimitStore>,
    policy: RateLimitPolicy,
}

impl<S, B> Service<ServiceRequest> for RateLimitingService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut std::task::Context<'_>) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Arc::clone(&self.service);
        let store = Arc::clone(&self.store);
        let policy = self.policy;

        Box::pin(async move {
            let client_key = req
                .connection_info()
                .realip_remote_addr()
                .unwrap_or("unknown")
                .to_string();

            if let RateLimitDecision::Limited { retry_after } = store.hit(&client_key, &policy).await {
                Logger::rate_limit_hit(&client_key);
                // Round up so clients never retry early.
                let retry_after_secs = retry_after.as_millis().div_ceil(1000) as u64;
                let mut response = RelayError::RateLimited { retry_after_secs }.error_response();
                if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                    response.headers_mut().insert(RETRY_AFTER, value);
                }
                return Ok(req.into_response(response));
            }

            let res = service.call(req).await?;
            Ok(res.map_into_boxed_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web, App, HttpResponse};

    fn policy(max_requests: u32, burst: u32) -> RateLimitPolicy {
        RateLimitPolicy::new(max_requests, burst, Duration::from_secs(60))
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_limit_and_reset() {
        let store = InMemoryRateLimitStore::new();
        let policy = policy(3, 100);

        for expected_remaining in [2, 1, 0] {
            assert_eq!(
                store.hit("10.0.0.1", &policy).await,
                RateLimitDecision::Allowed { remaining: expected_remaining }
            );
        }
        match store.hit("10.0.0.1", &policy).await {
            RateLimitDecision::Limited { retry_after } => assert!(retry_after <= Duration::from_secs(60)),
            other => panic!("expected limit, got {other:?}"),
        }
        // other clients are unaffected
        assert!(matches!(store.hit("10.0.0.2", &policy).await, RateLimitDecision::Allowed { .. }));

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(store.hit("10.0.0.1", &policy).await, RateLimitDecision::Allowed { remaining: 2 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_limit_recovers_within_window() {
        let store = InMemoryRateLimitStore::new();
        let policy = policy(100, 2);

        assert!(matches!(store.hit("c", &policy).await, RateLimitDecision::Allowed { .. }));
        assert!(matches!(store.hit("c", &policy).await, RateLimitDecision::Allowed { .. }));
        assert!(matches!(store.hit("c", &policy).await, RateLimitDecision::Limited { .. }));

        tokio::time::advance(Duration::from_millis(1100)).await;
        assert!(matches!(store.hit("c", &policy).await, RateLimitDecision::Allowed { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let store = InMemoryRateLimitStore::new();
        store.hit("a", &policy(10, 10)).await;
        store.hit("b", &policy(10, 10)).await;
        assert_eq!(store.tracked_clients().await, 2);

        tokio::time::advance(Duration::from_secs(61)).await;
        store.purge_expired().await;
        assert_eq!(store.tracked_clients().await, 0);
    }

    #[actix_web::test]
    async fn test_middleware_returns_429_with_retry_after() {
        let app = test::init_service(
            App::new()
                .wrap(RateLimitingMiddleware::in_memory(policy(1, 10)))
                .route("/ping", web::get().to(|| async { HttpResponse::Ok().body("pong") })),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/ping").to_request()).await;
        assert!(resp.status().is_success());

        let resp = test::call_service(&app, test::TestRequest::get().uri("/ping").to_request()).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::TOO_MANY_REQUESTS);
        assert!(resp.headers().contains_key(RETRY_AFTER));
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Rate limit exceeded");
    }

    #[actix_web::test]
    async fn test_shared_store_spans_middleware_instances() {
        let store: Arc<dyn RateLimitStore> = Arc::new(InMemoryRateLimitStore::new());
        let policy = policy(1, 10);
        let first = test::init_service(
            App::new()
                .wrap(RateLimitingMiddleware::new(Arc::clone(&store), policy))
                .route("/", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;
        let second = test::init_service(
            App::new()
                .wrap(RateLimitingMiddleware::new(store, policy))
                .route("/", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;

        let resp = test::call_service(&first, test::TestRequest::get().to_request()).await;
        assert!(resp.status().is_success());
        let resp = test::call_service(&second, test::TestRequest::get().to_request()).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::TOO_MANY_REQUESTS);
    }
}
