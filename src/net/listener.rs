//! TCP listener implementation with backpressure.
//!
//! # Responsibilities
//! - Bind to configured address
//! - Accept incoming TCP connections
//! - Enforce max_connections limit via semaphore

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("invalid bind address `{0}`")]
    Address(String),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to accept: {0}")]
    Accept(#[source] std::io::Error),

    #[error("connection limiter closed")]
    Closed,
}

/// A bounded TCP listener that limits concurrent connections.
///
/// When the limit is reached, new connections wait until a slot frees up.
pub struct Listener {
    inner: TcpListener,
    connection_limit: Arc<Semaphore>,
    max_connections: usize,
}

impl Listener {
    /// Bind to the configured address with connection limits.
    pub async fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let addr: SocketAddr = config
            .bind_address
            .parse()
            .map_err(|_| ListenerError::Address(config.bind_address.clone()))?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ListenerError::Bind {
                address: config.bind_address.clone(),
                source,
            })?;

        let max_connections = config.max_connections.max(1);
        tracing::debug!(
            address = %addr,
            max_connections,
            "Listener bound"
        );

        Ok(Self {
            inner: listener,
            connection_limit: Arc::new(Semaphore::new(max_connections)),
            max_connections,
        })
    }

    /// Accept a new connection, respecting the connection limit.
    ///
    /// Returns the stream and a permit that must be held for the connection's lifetime.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr, ConnectionPermit), ListenerError> {
        // Acquire permit first (backpressure)
        let permit = self
            .connection_limit
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ListenerError::Closed)?;

        let (stream, addr) = self.inner.accept().await.map_err(ListenerError::Accept)?;

        tracing::trace!(
            peer_addr = %addr,
            available_permits = self.connection_limit.available_permits(),
            "Connection accepted"
        );

        Ok((stream, addr, ConnectionPermit { _permit: permit }))
    }

    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.inner.local_addr()
    }

    pub fn available_permits(&self) -> usize {
        self.connection_limit.available_permits()
    }

    pub fn max_connections(&self) -> usize {
        self.max_connections
    }
}

/// A connection slot. Dropping it releases the slot, even if the connection
/// task panics.
#[derive(Debug)]
pub struct ConnectionPermit {
    _permit: OwnedSemaphorePermit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config(max_connections: usize) -> ListenerConfig {
        ListenerConfig {
            bind_address: "127.0.0.1:0".into(),
            max_connections,
            shutdown_timeout: Duration::from_secs(1),
        }
    }

    #[tokio::test]
    async fn rejects_unparseable_address() {
        let mut config = config(1);
        config.bind_address = "localhost:http".into();
        assert!(matches!(
            Listener::bind(&config).await,
            Err(ListenerError::Address(_))
        ));
    }

    #[tokio::test]
    async fn permits_bound_concurrent_connections() {
        let listener = Listener::bind(&config(1)).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let _c1 = TcpStream::connect(addr).await.unwrap();
        let _c2 = TcpStream::connect(addr).await.unwrap();

        let (_s1, _, permit) = listener.accept().await.unwrap();
        assert_eq!(listener.available_permits(), 0);

        // Second accept waits for the slot.
        let blocked = tokio::time::timeout(Duration::from_millis(100), listener.accept()).await;
        assert!(blocked.is_err());

        drop(permit);
        let accepted = tokio::time::timeout(Duration::from_secs(1), listener.accept()).await;
        assert!(matches!(accepted, Ok(Ok(_))));
    }
}
