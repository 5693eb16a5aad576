//! Connection lifecycle tracking and idle enforcement.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Count live connections so shutdown can drain them
//! - Close connections that see no traffic for the idle timeout

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::time::{Instant, Sleep};

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Tracks active connections for graceful shutdown.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    active_count: Arc<AtomicU64>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new active connection. Returns a guard that decrements on drop.
    pub fn track(&self) -> ConnectionGuard {
        self.active_count.fetch_add(1, Ordering::SeqCst);
        ConnectionGuard {
            active_count: Arc::clone(&self.active_count),
            id: ConnectionId::new(),
        }
    }

    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }

    /// Wait until every connection has closed. Returns `false` if `timeout`
    /// elapsed first.
    pub async fn drain(&self, timeout: Duration) -> bool {
        let wait = async {
            while self.active_count() > 0 {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        };
        tokio::time::timeout(timeout, wait).await.is_ok()
    }
}

/// Guard that tracks a connection's lifetime.
/// Decrements active count when dropped.
#[derive(Debug)]
pub struct ConnectionGuard {
    active_count: Arc<AtomicU64>,
    id: ConnectionId,
}

impl ConnectionGuard {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.active_count.fetch_sub(1, Ordering::SeqCst);
        tracing::trace!(connection_id = %self.id, "Connection closed");
    }
}

/// Requests in flight on one connection.
///
/// The idle deadline only runs while this is zero, so a slow handler is
/// bounded by the write timeout rather than the idle timeout.
#[derive(Debug, Default)]
pub struct ConnectionActivity {
    in_flight: AtomicU64,
    completed: AtomicU64,
}

impl ConnectionActivity {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Mark a request as started. The returned guard marks it finished.
    pub fn begin(self: &Arc<Self>) -> RequestGuard {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        RequestGuard {
            activity: Arc::clone(self),
        }
    }

    pub fn in_flight(&self) -> u64 {
        self.in_flight.load(Ordering::SeqCst)
    }

    fn completed(&self) -> u64 {
        self.completed.load(Ordering::SeqCst)
    }
}

/// Ends one in-flight request on drop.
#[derive(Debug)]
pub struct RequestGuard {
    activity: Arc<ConnectionActivity>,
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        self.activity.completed.fetch_add(1, Ordering::SeqCst);
        self.activity.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Stream wrapper that fails with `TimedOut` once the connection has sat
/// between requests, with no bytes moving, for `timeout`.
pub struct IdleTimeout<S> {
    inner: S,
    timeout: Option<Duration>,
    deadline: Option<Pin<Box<Sleep>>>,
    activity: Arc<ConnectionActivity>,
    seen_completed: u64,
}

impl<S> IdleTimeout<S> {
    /// `None` disables the timeout.
    pub fn new(inner: S, timeout: Option<Duration>, activity: Arc<ConnectionActivity>) -> Self {
        let deadline = timeout.map(|t| Box::pin(tokio::time::sleep(t)));
        let seen_completed = activity.completed();
        Self {
            inner,
            timeout,
            deadline,
            activity,
            seen_completed,
        }
    }

    fn touch(&mut self) {
        if let (Some(timeout), Some(deadline)) = (self.timeout, self.deadline.as_mut()) {
            deadline.as_mut().reset(Instant::now() + timeout);
        }
    }

    fn poll_expired(&mut self, cx: &mut Context<'_>) -> Option<io::Error> {
        self.deadline.as_ref()?;

        // Busy: keep pushing the deadline out; the response write re-arms it.
        if self.activity.in_flight() > 0 {
            self.touch();
            return None;
        }
        // A request finished since the last check: idle time starts now.
        let completed = self.activity.completed();
        if completed != self.seen_completed {
            self.seen_completed = completed;
            self.touch();
        }

        let deadline = self.deadline.as_mut()?;
        match deadline.as_mut().poll(cx) {
            Poll::Ready(()) => Some(io::Error::new(
                io::ErrorKind::TimedOut,
                "connection idle timeout",
            )),
            Poll::Pending => None,
        }
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for IdleTimeout<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_read(cx, buf) {
            Poll::Ready(result) => {
                this.touch();
                Poll::Ready(result)
            }
            Poll::Pending => match this.poll_expired(cx) {
                Some(e) => Poll::Ready(Err(e)),
                None => Poll::Pending,
            },
        }
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for IdleTimeout<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_write(cx, buf) {
            Poll::Ready(result) => {
                this.touch();
                Poll::Ready(result)
            }
            Poll::Pending => match this.poll_expired(cx) {
                Some(e) => Poll::Ready(Err(e)),
                None => Poll::Pending,
            },
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[test]
    fn connection_id_unique() {
        let id1 = ConnectionId::new();
        let id2 = ConnectionId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn connection_tracker_counts() {
        let tracker = ConnectionTracker::new();
        assert_eq!(tracker.active_count(), 0);

        let guard1 = tracker.track();
        assert_eq!(tracker.active_count(), 1);

        let guard2 = tracker.track();
        assert_eq!(tracker.active_count(), 2);

        drop(guard1);
        assert_eq!(tracker.active_count(), 1);

        drop(guard2);
        assert_eq!(tracker.active_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn drain_reports_timeout() {
        let tracker = ConnectionTracker::new();
        let guard = tracker.track();
        assert!(!tracker.drain(Duration::from_millis(200)).await);

        drop(guard);
        assert!(tracker.drain(Duration::from_millis(200)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_stream_times_out_without_traffic() {
        let (client, server) = tokio::io::duplex(64);
        let mut server =
            IdleTimeout::new(server, Some(Duration::from_secs(5)), ConnectionActivity::new());
        let _client = client;

        let mut buf = [0u8; 8];
        let err = server.read(&mut buf).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }

    #[tokio::test(start_paused = true)]
    async fn traffic_resets_the_idle_deadline() {
        let (mut client, server) = tokio::io::duplex(64);
        let mut server =
            IdleTimeout::new(server, Some(Duration::from_secs(5)), ConnectionActivity::new());

        let mut buf = [0u8; 4];
        for _ in 0..3 {
            tokio::time::sleep(Duration::from_secs(4)).await;
            client.write_all(b"ping").await.unwrap();
            server.read_exact(&mut buf).await.unwrap();
            assert_eq!(&buf, b"ping");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_timeout_never_fires() {
        let (client, server) = tokio::io::duplex(64);
        let mut server = IdleTimeout::new(server, None, ConnectionActivity::new());
        let _client = client;

        let mut buf = [0u8; 8];
        let read = tokio::time::timeout(Duration::from_secs(3600), server.read(&mut buf)).await;
        assert!(read.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_request_holds_the_deadline() {
        let (client, server) = tokio::io::duplex(64);
        let activity = ConnectionActivity::new();
        let mut server =
            IdleTimeout::new(server, Some(Duration::from_secs(5)), Arc::clone(&activity));
        let _client = client;

        let request = activity.begin();
        let mut buf = [0u8; 8];
        let busy = tokio::time::timeout(Duration::from_secs(60), server.read(&mut buf)).await;
        assert!(busy.is_err(), "read must stay pending while a request runs");

        drop(request);
        assert_eq!(activity.in_flight(), 0);
        let started = Instant::now();
        let err = server.read(&mut buf).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
        assert!(started.elapsed() >= Duration::from_secs(5));
    }
}
