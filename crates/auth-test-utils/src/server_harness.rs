//! Test server harness for E2E testing
//!
//! Provides `TestAuthServer` for spawning real auth service instances backed
//! by an in-memory user store.

use crate::fixtures::{test_signing_secret, user_record};
use auth_service::config::{
    Config, DEFAULT_ACCESS_TOKEN_TTL_MS, DEFAULT_REFRESH_TOKEN_TTL_MS, MIN_BCRYPT_COST,
};
use auth_service::models::Identity;
use auth_service::observability::metrics::init_metrics_recorder;
use auth_service::repositories::InMemoryUserRepository;
use auth_service::routes::{self, AppState};
use auth_service::services::{AuthService, TokenAuthority};
use common::jwt::DEFAULT_CLOCK_SKEW;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Test harness for spawning the auth service in E2E tests
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_login_e2e() -> Result<(), anyhow::Error> {
///     let server = TestAuthServer::spawn().await?;
///     server.seed_user(alice_identity(), TEST_PASSWORD_ALICE).await;
///
///     let response = reqwest::Client::new()
///         .post(format!("{}/api/auth/login", server.url()))
///         .json(&json!({"usernameOrEmail": "alice", "password": TEST_PASSWORD_ALICE}))
///         .send()
///         .await?;
///
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestAuthServer {
    addr: SocketAddr,
    users: Arc<InMemoryUserRepository>,
    config: Config,
    _handle: JoinHandle<()>,
}

impl TestAuthServer {
    /// Spawn a server with the test secret and default token lifetimes
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        Self::spawn_with_config(Self::test_config()).await
    }

    /// Configuration used by [`TestAuthServer::spawn`]
    ///
    /// Uses the minimum bcrypt cost so login-heavy tests stay fast.
    pub fn test_config() -> Config {
        Config {
            bind_address: "127.0.0.1:0".to_string(),
            signing_secret: test_signing_secret(),
            access_token_ttl_ms: DEFAULT_ACCESS_TOKEN_TTL_MS,
            refresh_token_ttl_ms: DEFAULT_REFRESH_TOKEN_TTL_MS,
            clock_skew: DEFAULT_CLOCK_SKEW,
            bcrypt_cost: MIN_BCRYPT_COST,
            json_logs: false,
            drain_seconds: 0,
        }
    }

    /// Spawn a server with a caller-supplied configuration
    ///
    /// The server binds to 127.0.0.1:0 regardless of `config.bind_address`.
    pub async fn spawn_with_config(config: Config) -> Result<Self, anyhow::Error> {
        let users = Arc::new(InMemoryUserRepository::new());
        let authority = TokenAuthority::from_config(&config);
        let auth = AuthService::new(authority, users.clone(), config.bcrypt_cost)
            .map_err(|e| anyhow::anyhow!("Failed to build auth service: {}", e))?;

        let state = Arc::new(AppState { auth });

        // The global recorder can only be installed once per process; later
        // servers get a standalone recorder.
        let metrics_handle = match init_metrics_recorder() {
            Ok(handle) => handle,
            Err(_) => {
                use metrics_exporter_prometheus::PrometheusBuilder;
                PrometheusBuilder::new().build_recorder().handle()
            }
        };

        let app = routes::build_routes(state, metrics_handle);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, make_service).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            users,
            config,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get reference to the server configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The user store behind the server, for seeding and mutating identities
    pub fn users(&self) -> &Arc<InMemoryUserRepository> {
        &self.users
    }

    /// A token authority sharing the server's secret and lifetimes
    pub fn authority(&self) -> TokenAuthority {
        TokenAuthority::from_config(&self.config)
    }

    /// Insert `identity` with a bcrypt hash of `password`
    pub async fn seed_user(&self, identity: Identity, password: &str) -> Identity {
        self.users
            .insert(user_record(identity.clone(), password))
            .await;
        identity
    }

    /// Issue an access token for `identity` without going through login
    pub fn access_token_for(&self, identity: &Identity) -> Result<String, anyhow::Error> {
        self.authority()
            .issue_access_token(identity)
            .map_err(|e| anyhow::anyhow!("Failed to issue access token: {}", e))
    }
}

impl Drop for TestAuthServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
