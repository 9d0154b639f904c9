//! Common test utilities for E2E tests

use photogram::{AppState, config};
use serde_json::Value;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
                domain: "localhost".to_string(),
                protocol: "http".to_string(),
            },
            database: config::DatabaseConfig { path: db_path },
            storage: config::StorageConfig {
                media: config::MediaStorageConfig {
                    bucket: "test-media".to_string(),
                    public_url: "https://media.test.example.com".to_string(),
                },
            },
            cloudflare: config::CloudflareConfig {
                account_id: "test-account".to_string(),
                r2_access_key_id: "test-key".to_string(),
                r2_secret_access_key: "test-secret".to_string(),
            },
            auth: config::AuthConfig {
                session_secret: "test-secret-key-32-bytes-long!!!".to_string(),
                session_max_age: 604800,
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        let state = AppState::new(config).await.unwrap();

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        let app = photogram::build_router(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait a bit for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Self {
            addr: addr_str,
            state,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Register an account over HTTP and return (account_id, token).
    pub async fn register(&self, username: &str) -> (String, String) {
        let response = self
            .client
            .post(self.url("/api/v1/auth/register"))
            .json(&serde_json::json!({
                "username": username,
                "password": "hunter22",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200, "register {} failed", username);

        let body: Value = response.json().await.unwrap();
        let id = body["account"]["id"].as_str().unwrap().to_string();
        let token = body["token"].as_str().unwrap().to_string();
        (id, token)
    }

    /// Insert a post directly, bypassing the media upload.
    pub async fn seed_post(&self, id: &str, owner_id: &str, caption: &str) {
        use photogram::data::models::Post;

        self.state
            .db
            .insert_post(&Post {
                id: id.to_string(),
                owner_id: owner_id.to_string(),
                caption: caption.to_string(),
                image_key: format!("posts/{}.jpg", id),
                created_at: chrono::Utc::now(),
            })
            .await
            .unwrap();
    }

    /// Promote an account to admin.
    pub async fn make_admin(&self, account_id: &str) {
        assert!(
            self.state
                .db
                .set_account_role(account_id, "admin")
                .await
                .unwrap()
        );
    }
}
