use actix_cors::Cors;
use actix_web::middleware::Condition;
use actix_web::{web, App, HttpServer};
use std::sync::Arc;
use std::time::Duration;

use swapgate_core::AggregatorClient;
use swapgate_relay::api::handlers::{configure, AppState};
use swapgate_relay::infrastructure::config::Config;
use swapgate_relay::infrastructure::logger::Logger;
use swapgate_relay::middleware::{InMemoryRateLimitStore, RateLimitPolicy, RateLimitStore, RateLimitingMiddleware};

const RATE_LIMIT_PURGE_INTERVAL: Duration = Duration::from_secs(60);

fn cors(config: &Config) -> Cors {
    if !config.security.enable_cors {
        return Cors::default();
    }
    let origins = config.security.cors_origins.trim();
    if origins == "*" {
        return Cors::permissive();
    }
    origins
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allowed_methods(vec!["GET", "POST"])
        .allow_any_header()
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = match Config::new() {
        Ok(config) => config,
        Err(e) => {
            Logger::init("info");
            log::error!("Failed to load configuration: {}", e);
            return Err(std::io::Error::other(format!("Configuration initialization failed: {e}")));
        }
    };
    Logger::init(&config.log_level);

    log::info!("Starting SwapGate relay v{}", config.version);
    log::info!("Configuration: {}", config.summary());

    let aggregator = match AggregatorClient::new(config.aggregator.clone()) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            log::error!("Failed to initialize aggregator client: {}", e);
            return Err(std::io::Error::other(format!("Aggregator client initialization failed: {e}")));
        }
    };

    // One store for every worker so limits hold across the whole process.
    let rate_limit_store = Arc::new(InMemoryRateLimitStore::new());
    let policy = RateLimitPolicy::from(&config.rate_limits);
    {
        let store = Arc::clone(&rate_limit_store);
        actix_web::rt::spawn(async move {
            let mut interval = actix_web::rt::time::interval(RATE_LIMIT_PURGE_INTERVAL);
            loop {
                interval.tick().await;
                store.purge_expired().await;
            }
        });
    }
    let rate_limit_store: Arc<dyn RateLimitStore> = rate_limit_store;

    let bind_addr = (config.host.clone(), config.port);
    log::info!("Listening on {}:{} ({})", bind_addr.0, bind_addr.1, config.environment);

    let state = web::Data::new(AppState::new(aggregator, config.clone()));

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Condition::new(
                config.security.enable_rate_limiting,
                RateLimitingMiddleware::new(Arc::clone(&rate_limit_store), policy),
            ))
            .wrap(cors(&config))
            .wrap(actix_web::middleware::Logger::default())
            .configure(configure)
    })
    .bind(bind_addr)?
    .run()
    .await
}
