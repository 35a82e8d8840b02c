//! Shared setup: a mock backend, a temporary data directory and a desk wired
//! to both

use std::path::Path;

use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::Value;
use tempfile::TempDir;

use eventdesk::config::{ApiConfig, CacheConfig, Config, EmptyListPolicy, StorageConfig};
use eventdesk::Desk;

/// An address nothing listens on
pub const UNREACHABLE_ROOT: &str = "http://127.0.0.1:1/api/";

pub fn config_for(root_url: &str, data_dir: &Path) -> Config {
    Config {
        api: ApiConfig {
            root_url: root_url.to_string(),
            request_timeout_seconds: Some(5),
        },
        storage: StorageConfig {
            data_dir: data_dir.to_path_buf(),
        },
        cache: CacheConfig {
            enabled: true,
            empty_list_policy: EmptyListPolicy::Authoritative,
        },
    }
}

/// Test environment for integration tests
pub struct TestEnvironment {
    pub server: ServerGuard,
    pub data_dir: TempDir,
    pub desk: Desk,
}

impl TestEnvironment {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let data_dir = tempfile::tempdir().expect("temp dir");
        let config = config_for(&format!("{}/api/", server.url()), data_dir.path());
        let desk = Desk::open(&config).await.expect("desk opens");

        Self {
            server,
            data_dir,
            desk,
        }
    }

    /// Another desk over the same data directory, pointed at `root_url`
    pub async fn reopen(&self, root_url: &str) -> Desk {
        Desk::open(&config_for(root_url, self.data_dir.path()))
            .await
            .expect("desk reopens")
    }

    /// Mock a JSON response for `method /api/{path}`
    pub async fn mock_json(&mut self, method: &str, path: &str, status: usize, body: &Value) -> Mock {
        self.server
            .mock(method, format!("/api/{}", path).as_str())
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await
    }

    /// Mock a successful token exchange for the given credentials
    pub async fn mock_token(&mut self, username: &str, password: &str, access: &str, refresh: &str) -> Mock {
        self.server
            .mock("POST", "/api/token/")
            .match_body(Matcher::Json(serde_json::json!({
                "username": username,
                "password": password,
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(serde_json::json!({"access": access, "refresh": refresh}).to_string())
            .create_async()
            .await
    }

    /// Store a session directly, skipping the login endpoint
    pub async fn logged_in(self, access: &str) -> Self {
        self.desk
            .session
            .login(access, "refresh-token")
            .await
            .expect("login");
        self
    }
}
