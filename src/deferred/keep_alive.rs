// Periodically prods both routes so neither goes cold.

use crate::interaction::WARMUP_MARKER;
use reqwest::Client;
use serde_json::json;
use tokio::{
    sync::oneshot,
    task::JoinHandle,
    time::{Duration, Instant, interval_at},
};
use tracing::{info, warn};

/// Where the keep-alive sends its warmup requests.
#[derive(Debug, Clone)]
pub struct KeepAliveTargets {
    /// Fast-ack route; receives `{"type": "warmup"}`.
    pub fast_ack: url::Url,
    /// Deferred route, when served; receives `?warmup=true` and no body.
    pub deferred: Option<url::Url>,
}

pub struct KeepAlive {
    stop_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl KeepAlive {
    /// The first prod goes out one full period after start.
    pub fn spawn(http: Client, targets: KeepAliveTargets, period: Duration) -> Self {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        prod(&http, &targets).await;
                    }

                    _ = &mut stop_rx => {
                        break;
                    }
                }
            }
        });

        Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        }
    }

    pub async fn shutdown(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(h) = self.handle.take() {
            let _ = h.await;
        }
    }
}

impl Drop for KeepAlive {
    fn drop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(h) = &self.handle {
            h.abort();
        }
    }
}

/// One round of warmup requests; failures are only logged.
pub async fn prod(http: &Client, targets: &KeepAliveTargets) {
    match http
        .post(targets.fast_ack.clone())
        .json(&json!({ "type": WARMUP_MARKER }))
        .send()
        .await
    {
        Ok(res) => info!("Keep-alive fast-ack route: {}", res.status().as_u16()),
        Err(e) => warn!("Keep-alive fast-ack route failed: {e}"),
    }

    let Some(mut deferred) = targets.deferred.clone() else {
        return;
    };
    deferred.query_pairs_mut().append_pair("warmup", "true");
    match http.post(deferred).send().await {
        Ok(res) => info!("Keep-alive deferred route: {}", res.status().as_u16()),
        Err(e) => warn!("Keep-alive deferred route failed: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn targets(server: &MockServer) -> KeepAliveTargets {
        KeepAliveTargets {
            fast_ack: url::Url::parse(&format!("{}/api/interactions", server.uri())).unwrap(),
            deferred: Some(
                url::Url::parse(&format!(
                    "{}/api/interactions/deferred?code=k",
                    server.uri()
                ))
                .unwrap(),
            ),
        }
    }

    #[tokio::test]
    async fn prod_hits_both_routes_with_warmup_marker() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/interactions"))
            .and(body_json(json!({"type": "warmup"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/interactions/deferred"))
            .and(query_param("warmup", "true"))
            .and(query_param("code", "k"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        prod(&Client::new(), &targets(&server)).await;
    }

    #[tokio::test]
    async fn prod_skips_deferred_route_when_not_served() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/interactions"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut only_fast_ack = targets(&server);
        only_fast_ack.deferred = None;
        prod(&Client::new(), &only_fast_ack).await;

        assert_eq!(server.received_requests().await.unwrap_or_default().len(), 1);
    }

    #[tokio::test]
    async fn ticks_until_shut_down() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let mut keep = KeepAlive::spawn(
            Client::new(),
            targets(&server),
            Duration::from_millis(30),
        );
        tokio::time::sleep(Duration::from_millis(200)).await;
        keep.shutdown().await;

        let count = server.received_requests().await.unwrap_or_default().len();
        assert!(count >= 2, "expected at least one round, got {count}");
        assert_eq!(count % 2, 0);
    }
}
