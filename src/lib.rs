pub mod commands;
pub mod config;
pub mod deferred;
pub mod error;
pub mod handlers;
pub mod interaction;
pub mod leaderboard;
pub mod ocr;
pub mod registration;
pub mod server;
pub mod sheets;
pub mod signature;
pub mod trace;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

use config::{AppConfig, QueueMode};
use deferred::{
    ChannelQueue, FollowUpClient, ForwardQueue, JobQueue, KeepAlive, KeepAliveTargets, Processor,
    QUEUE_CAPACITY, QueueWorker,
};
use handlers::Services;
use reqwest::Client;
use server::{AppState, DEFERRED_PATH, FAST_ACK_PATH};
use signature::SignatureVerifier;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use trace::init_tracing;
use tracing::{error, info};

/// Upper bound on any single outbound call made while processing a job.
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Absolute URL of one of our own routes, with the function key attached.
pub fn route_url(
    base: &url::Url,
    route: &str,
    key: Option<&str>,
) -> Result<url::Url, url::ParseError> {
    let mut url = base.join(route)?;
    if let Some(key) = key {
        url.query_pairs_mut().append_pair("code", key);
    }
    Ok(url)
}

pub async fn run() -> Result<(), BoxError> {
    init_tracing();

    let cfg = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {}", e);
            return Err(Box::new(e) as BoxError);
        }
    };

    info!("Starting interaction service (queue mode = {:?})", cfg.queue_mode);

    let verifier = match SignatureVerifier::from_hex(&cfg.discord_public_key) {
        Ok(v) => Arc::new(v),
        Err(e) => {
            error!("DISCORD_PUBLIC_KEY is not a usable key: {}", e);
            return Err(Box::new(e) as BoxError);
        }
    };

    let http = Client::builder().timeout(UPSTREAM_TIMEOUT).build()?;

    let services = Services::from_config(http.clone(), &cfg);
    let followup = FollowUpClient::new(http.clone(), cfg.discord_api_base.clone());
    let processor = Processor::new(services, followup);

    let mut worker = None;
    let queue: Arc<dyn JobQueue> = match cfg.queue_mode {
        QueueMode::Channel => {
            let (queue, rx) = ChannelQueue::new(QUEUE_CAPACITY);
            worker = Some(QueueWorker::spawn(rx, processor.clone()));
            Arc::new(queue)
        }
        QueueMode::Forward => {
            let Some(base) = cfg.base_url.as_ref() else {
                error!("QUEUE_MODE=forward but BASE_URL not provided");
                return Err(Box::new(config::ConfigError::MissingEnv("BASE_URL")) as BoxError);
            };
            let target = route_url(base, DEFERRED_PATH, cfg.interaction_function_key.as_deref())?;
            Arc::new(ForwardQueue::new(http.clone(), target))
        }
    };

    let mut keep_alive = match cfg.base_url.as_ref() {
        Some(base) if cfg.keepalive_interval_secs > 0 => {
            let targets = KeepAliveTargets {
                fast_ack: route_url(base, FAST_ACK_PATH, cfg.handler_function_key.as_deref())?,
                deferred: match cfg.queue_mode {
                    QueueMode::Forward => Some(route_url(
                        base,
                        DEFERRED_PATH,
                        cfg.interaction_function_key.as_deref(),
                    )?),
                    QueueMode::Channel => None,
                },
            };
            info!(
                "Keep-alive every {}s against {}",
                cfg.keepalive_interval_secs, base
            );
            Some(KeepAlive::spawn(
                http.clone(),
                targets,
                Duration::from_secs(cfg.keepalive_interval_secs),
            ))
        }
        _ => None,
    };

    let state = AppState {
        verifier,
        queue,
        processor,
        queue_mode: cfg.queue_mode,
        handler_key: cfg.handler_function_key.clone(),
        interaction_key: cfg.interaction_function_key.clone(),
    };
    let app = server::build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());
    if let Err(e) = server.await {
        error!("Axum server error: {}", e);
    }

    if let Some(w) = worker.as_mut() {
        w.shutdown().await;
    }
    if let Some(k) = keep_alive.as_mut() {
        k.shutdown().await;
    }

    info!("Shutdown complete.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to listen for ctrl_c: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    {
        let mut term_stream =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(err) => {
                    error!("Failed to register SIGTERM handler: {}", err);
                    ctrl.await;
                    info!("Shutdown signal received (SIGINT). Stopping server.");
                    return;
                }
            };

        tokio::select! {
            _ = ctrl => {},
            _ = term_stream.recv() => {},
        }
    }
    #[cfg(not(unix))]
    {
        ctrl.await;
    }

    info!("Shutdown signal received (SIGINT/SIGTERM). Stopping server.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_url_appends_key() {
        let base = url::Url::parse("https://bot.example.net").unwrap();
        let url = route_url(&base, DEFERRED_PATH, Some("abc")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://bot.example.net/api/interactions/deferred?code=abc"
        );

        let url = route_url(&base, FAST_ACK_PATH, None).unwrap();
        assert_eq!(url.as_str(), "https://bot.example.net/api/interactions");
    }
}
