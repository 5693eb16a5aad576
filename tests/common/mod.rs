//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use auth_service::config::{ListenerConfig, ServerConfig};
use auth_service::http::{register, AppState, HttpServer};
use auth_service::lifecycle::Shutdown;
use auth_service::net::Listener;
use auth_service::repo::{AuthRepository, RepoError, User};
use auth_service::rpc::UserExistenceService;
use tokio::task::JoinHandle;

/// Write `config.yaml` into `dir`.
pub fn write_config(dir: &Path, body: &str) {
    std::fs::write(dir.join("config.yaml"), body).unwrap();
}

/// Repository backed by a set of user ids.
#[derive(Default)]
pub struct MemoryRepository {
    users: Mutex<HashSet<String>>,
    pub down: AtomicBool,
}

impl MemoryRepository {
    pub fn with_users(ids: &[&str]) -> Self {
        let repo = Self::default();
        repo.users
            .lock()
            .unwrap()
            .extend(ids.iter().map(|id| id.to_string()));
        repo
    }

    fn check_up(&self) -> Result<(), RepoError> {
        if self.down.load(Ordering::SeqCst) {
            Err(RepoError::Database(sqlx::Error::PoolClosed))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AuthRepository for MemoryRepository {
    async fn sign_up_save(&self, user: &User) -> Result<(), RepoError> {
        self.check_up()?;
        if !self.users.lock().unwrap().insert(user.user_id.clone()) {
            return Err(RepoError::Duplicate(user.user_id.clone()));
        }
        Ok(())
    }

    async fn user_exists(&self, user_id: &str) -> Result<bool, RepoError> {
        self.check_up()?;
        Ok(self.users.lock().unwrap().contains(user_id))
    }

    async fn ping(&self) -> Result<(), RepoError> {
        self.check_up()
    }
}

/// A server running on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), std::io::Error>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// The service routes over `repo`.
pub fn service_routes(config: ServerConfig, repo: Arc<MemoryRepository>) -> HttpServer {
    let state = AppState {
        app_name: Arc::from(config.app_name.as_str()),
        repo: repo.clone(),
        rpc: Arc::new(UserExistenceService::new(repo)),
    };
    register(HttpServer::new(config), state)
}

/// Start the service routes over `repo` with the given shell options.
pub async fn spawn_server(config: ServerConfig, repo: Arc<MemoryRepository>) -> TestServer {
    spawn(service_routes(config, repo), Duration::from_secs(1)).await
}

/// Run an already assembled server on an ephemeral port.
pub async fn spawn(server: HttpServer, drain_timeout: Duration) -> TestServer {
    let listener = Listener::bind(&ListenerConfig {
        bind_address: "127.0.0.1:0".into(),
        max_connections: 64,
        shutdown_timeout: drain_timeout,
    })
    .await
    .unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let handle = tokio::spawn(server.run(listener, rx, drain_timeout));

    TestServer {
        addr,
        shutdown,
        handle,
    }
}
