//! Shared helpers for handler and extractor tests: in-memory application
//! state, a router wrapper, token minting, and failure-mode doubles.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{HeaderName, HeaderValue, header};
use axum_test::TestServer;
use url::Url;

use crate::AppState;
use crate::auth::Claims;
use crate::config::Config;
use crate::db::errors::{DbError, Result as DbResult};
use crate::db::{MemoryWardrobeStore, StyledLook, StyledLookCreate, WardrobeItem, WardrobeItemCreate, WardrobeStore};
use crate::gateway::GatewayClient;
use crate::storage::{BlobStore, MemoryBlobStore};
use crate::types::ItemId;

/// Stand-in for an uploaded photo. Starts with the PNG magic so anything
/// sniffing content still sees an image.
pub const TEST_IMAGE: &[u8] = b"\x89PNG\r\n\x1a\n-test-image-bytes";

/// Baseline test configuration: in-memory backends and a known signing secret
pub fn test_config() -> Config {
    Config {
        secret_key: Some("test-secret-key-for-jwt".to_string()),
        ..Config::default()
    }
}

/// Test configuration with every gateway endpoint pointed at `uri`,
/// keeping the per-endpoint operation names
pub fn gateway_config(uri: &str) -> Config {
    let url = Url::parse(uri).unwrap();
    let mut config = test_config();
    config.gateway.background_removal.url = url.clone();
    config.gateway.classifier.url = url.clone();
    config.gateway.try_on.url = url;
    config
}

/// Application state over explicit backends
pub fn state_with(config: Config, blobs: Arc<dyn BlobStore>, store: Arc<dyn WardrobeStore>) -> AppState {
    let gateway = GatewayClient::new(&config.gateway).unwrap();
    AppState::builder()
        .config(config)
        .blobs(blobs)
        .store(store)
        .gateway(gateway)
        .http(reqwest::Client::new())
        .build()
}

/// Application state over fresh in-memory backends. The backends are handed
/// back alongside the state so tests can inspect them after a request.
pub fn memory_state(config: Config) -> (AppState, Arc<MemoryBlobStore>, Arc<MemoryWardrobeStore>) {
    let blobs = Arc::new(MemoryBlobStore::new("memory://wardrobe"));
    let store = Arc::new(MemoryWardrobeStore::new());
    let state = state_with(config, blobs.clone(), store.clone());
    (state, blobs, store)
}

pub fn test_state() -> AppState {
    memory_state(test_config()).0
}

/// Serve the full router in-process
pub fn spawn_app(state: AppState) -> TestServer {
    TestServer::new(crate::build_router(state).unwrap()).unwrap()
}

/// Mint a bearer token the configured secret verifies, valid for an hour
pub fn mint_token(sub: &str, email: Option<&str>, config: &Config) -> String {
    let claims = Claims {
        sub: sub.to_string(),
        email: email.map(|e| e.to_string()),
        exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp(),
    };
    let secret = config.secret_key.as_deref().unwrap();
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

pub fn bearer_header(token: &str) -> (HeaderName, HeaderValue) {
    (header::AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}")).unwrap())
}

/// Metadata store whose inserts always fail; reads answer empty
pub struct FailingStore;

#[async_trait]
impl WardrobeStore for FailingStore {
    async fn insert_item(&self, _request: &WardrobeItemCreate) -> DbResult<WardrobeItem> {
        Err(DbError::Other(anyhow::anyhow!("insert rejected")))
    }

    async fn list_items(&self, _user_id: &str) -> DbResult<Vec<WardrobeItem>> {
        Ok(Vec::new())
    }

    async fn get_item(&self, _id: ItemId) -> DbResult<Option<WardrobeItem>> {
        Ok(None)
    }

    async fn delete_item(&self, _id: ItemId) -> DbResult<bool> {
        Ok(false)
    }

    async fn insert_look(&self, _request: &StyledLookCreate) -> DbResult<StyledLook> {
        Err(DbError::Other(anyhow::anyhow!("insert rejected")))
    }

    async fn list_looks(&self, _user_id: &str) -> DbResult<Vec<StyledLook>> {
        Ok(Vec::new())
    }
}
