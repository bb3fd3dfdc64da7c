#![allow(dead_code)]

use ed25519_dalek::{Signer, SigningKey};
use reqwest::Client;
use rupture_bot::config::QueueMode;
use rupture_bot::deferred::{
    ChannelQueue, DeferredJob, FollowUpClient, ForwardQueue, JobQueue, Processor,
};
use rupture_bot::handlers::Services;
use rupture_bot::leaderboard::LeaderboardClient;
use rupture_bot::ocr::OcrClient;
use rupture_bot::server::{AppState, DEFERRED_PATH};
use rupture_bot::sheets::SheetsClient;
use rupture_bot::signature::SignatureVerifier;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use wiremock::MockServer;

pub const TIMESTAMP: &str = "1700000000";

pub fn signing_key() -> SigningKey {
    SigningKey::from_bytes(&[42u8; 32])
}

/// Hex signature over `timestamp || body`, as the platform sends it.
pub fn sign(body: &str) -> String {
    let mut message = TIMESTAMP.as_bytes().to_vec();
    message.extend_from_slice(body.as_bytes());
    hex::encode(signing_key().sign(&message).to_bytes())
}

/// Processor whose upstreams and follow-up target all live on `server`.
pub fn processor(server: &MockServer) -> Processor {
    let base = url::Url::parse(&server.uri()).unwrap();
    let http = Client::new();
    let services = Services {
        leaderboard: LeaderboardClient::new(http.clone(), base.clone()),
        sheets: SheetsClient::new(http.clone(), base.clone(), "sheet-1".into(), "key".into()),
        ocr: OcrClient::new(http.clone(), base.join("/parse/image").unwrap(), "key".into()),
    };
    Processor::new(services, FollowUpClient::new(http, base))
}

pub const INTERACTION_KEY: &str = "slow-key";

pub fn state_with_queue(
    queue: Arc<dyn JobQueue>,
    queue_mode: QueueMode,
    processor: Processor,
    handler_key: Option<&str>,
    interaction_key: Option<&str>,
) -> AppState {
    AppState {
        verifier: Arc::new(SignatureVerifier::from_key(signing_key().verifying_key())),
        queue,
        processor,
        queue_mode,
        handler_key: handler_key.map(str::to_string),
        interaction_key: interaction_key.map(str::to_string),
    }
}

/// State backed by an in-process channel; the receiver is handed back so
/// tests can drain it themselves or give it to a worker.
pub fn channel_state(server: &MockServer) -> (AppState, mpsc::Receiver<DeferredJob>) {
    let (queue, rx) = ChannelQueue::new(16);
    (
        state_with_queue(
            Arc::new(queue),
            QueueMode::Channel,
            processor(server),
            None,
            None,
        ),
        rx,
    )
}

/// Forward-mode state serving the deferred route behind [`INTERACTION_KEY`].
/// Jobs the fast-ack route forwards go to `server`'s deferred path.
pub fn forward_state(server: &MockServer, forward_timeout: Duration) -> AppState {
    let target = url::Url::parse(&format!("{}{}", server.uri(), DEFERRED_PATH)).unwrap();
    let queue = ForwardQueue::new(Client::new(), target).with_timeout(forward_timeout);
    state_with_queue(
        Arc::new(queue),
        QueueMode::Forward,
        processor(server),
        None,
        Some(INTERACTION_KEY),
    )
}
