#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use lostfound_api::auth::{Claims, TokenVerifier};
use lostfound_api::config::AppConfig;
use lostfound_api::database::MemoryItemStore;
use lostfound_api::media::MemoryMediaStore;
use lostfound_api::AppState;
use reqwest::StatusCode;

pub const SECRET: &str = "integration-test-secret";

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub store: MemoryItemStore,
    pub media: MemoryMediaStore,
}

impl TestServer {
    /// Serve the full router on a free port, backed by in-memory store and media.
    pub async fn spawn() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut config = AppConfig::development();
        config.security.jwt_secret = SECRET.to_string();
        config.server.port = port;

        let store = MemoryItemStore::new();
        let media = MemoryMediaStore::new(config.media.folder.clone());
        let state = AppState::new(config, Arc::new(store.clone()), Arc::new(media.clone()));

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test listener")?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, lostfound_api::app(state)).await;
        });

        let server = Self {
            port,
            base_url,
            store,
            media,
        };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// `Authorization` header value for the given user id
pub fn bearer(subject: &str) -> String {
    let token = TokenVerifier::new(SECRET)
        .sign(&Claims::new(subject))
        .expect("sign test token");
    format!("Bearer {}", token)
}
