//! Single TCP connect attempts and the classification of their outcome.
use log::debug;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::{
    io::{self, AsyncWriteExt},
    net::TcpStream,
    time,
};

/// Why a port could not be reported as open or plainly closed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeFailure {
    #[error("connect timed out")]
    TimedOut,

    #[error("host or network unreachable")]
    Unreachable,

    /// The process ran out of file descriptors. Lower the worker count.
    #[error("too many open files")]
    ResourceExhausted,

    #[error("host could not be resolved")]
    Unresolved,

    #[error("{0}")]
    Io(io::ErrorKind),
}

/// The result of probing one port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortProbeOutcome {
    Open(u16),
    /// The target actively refused the connection.
    Closed(u16),
    Error(u16, ProbeFailure),
}

impl PortProbeOutcome {
    pub const fn port(&self) -> u16 {
        match *self {
            Self::Open(port) | Self::Closed(port) | Self::Error(port, _) => port,
        }
    }

    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Open(_))
    }

    /// Maps a failed connect on `port` into an outcome.
    pub fn from_connect_error(port: u16, error: &io::Error) -> Self {
        let failure = match error.kind() {
            io::ErrorKind::ConnectionRefused => return Self::Closed(port),
            io::ErrorKind::TimedOut => ProbeFailure::TimedOut,
            io::ErrorKind::HostUnreachable | io::ErrorKind::NetworkUnreachable => {
                ProbeFailure::Unreachable
            }
            _ if error
                .to_string()
                .to_lowercase()
                .contains("too many open files") =>
            {
                ProbeFailure::ResourceExhausted
            }
            kind => ProbeFailure::Io(kind),
        };
        Self::Error(port, failure)
    }
}

/// Something that can tell whether a socket accepts connections.
///
/// The worker pool is generic over this so the network can be swapped out.
pub trait Probe: Send + Sync + 'static {
    fn probe(&self, socket: SocketAddr) -> impl Future<Output = PortProbeOutcome> + Send;
}

/// Probes with a plain TCP connect bounded by a timeout.
#[derive(Debug, Clone, Copy)]
pub struct TcpProber {
    timeout: Duration,
}

impl TcpProber {
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Performs the connection to the socket with timeout.
    /// The elapsed timer surfaces as an `io::ErrorKind::TimedOut` error.
    async fn connect(&self, socket: SocketAddr) -> io::Result<TcpStream> {
        time::timeout(self.timeout, async move { TcpStream::connect(socket).await }).await?
    }
}

impl Probe for TcpProber {
    /// Connects once. An established connection is shut down right away
    /// and the port is reported open.
    async fn probe(&self, socket: SocketAddr) -> PortProbeOutcome {
        match self.connect(socket).await {
            Ok(tcp_stream) => {
                debug!("Connection was successful, shutting down stream {socket}");
                if let Err(e) = { tcp_stream }.shutdown().await {
                    debug!("Shutdown stream error {e}");
                }
                PortProbeOutcome::Open(socket.port())
            }
            Err(e) => {
                debug!("Connect to {socket} failed: {e}");
                PortProbeOutcome::from_connect_error(socket.port(), &e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Instant;
    use tokio::net::TcpListener;

    const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

    #[tokio::test]
    async fn listening_port_is_open() {
        let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
        let socket = listener.local_addr().unwrap();

        let outcome = TcpProber::new(Duration::from_millis(500)).probe(socket).await;

        assert_eq!(outcome, PortProbeOutcome::Open(socket.port()));
        assert!(outcome.is_open());
    }

    #[tokio::test]
    async fn released_port_is_closed() {
        let socket = {
            let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
            listener.local_addr().unwrap()
        };

        let outcome = TcpProber::new(Duration::from_millis(500)).probe(socket).await;

        assert!(!outcome.is_open());
        assert_eq!(outcome.port(), socket.port());
    }

    #[tokio::test]
    async fn probe_never_outlives_timeout_by_much() {
        // 192.0.2.0/24 is TEST-NET-1: either dropped or reported unreachable.
        let socket = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)), 81);
        let timeout = Duration::from_millis(200);

        let started = Instant::now();
        let outcome = TcpProber::new(timeout).probe(socket).await;

        assert!(started.elapsed() < timeout + Duration::from_millis(300));
        assert!(!outcome.is_open());
    }

    #[test]
    fn classifies_connect_errors() {
        let refused = io::Error::from(io::ErrorKind::ConnectionRefused);
        assert_eq!(
            PortProbeOutcome::from_connect_error(80, &refused),
            PortProbeOutcome::Closed(80)
        );

        let elapsed = io::Error::from(io::ErrorKind::TimedOut);
        assert_eq!(
            PortProbeOutcome::from_connect_error(80, &elapsed),
            PortProbeOutcome::Error(80, ProbeFailure::TimedOut)
        );

        let unreachable = io::Error::from(io::ErrorKind::NetworkUnreachable);
        assert_eq!(
            PortProbeOutcome::from_connect_error(80, &unreachable),
            PortProbeOutcome::Error(80, ProbeFailure::Unreachable)
        );

        let exhausted = io::Error::other("Too many open files (os error 24)");
        assert_eq!(
            PortProbeOutcome::from_connect_error(80, &exhausted),
            PortProbeOutcome::Error(80, ProbeFailure::ResourceExhausted)
        );

        let reset = io::Error::from(io::ErrorKind::ConnectionReset);
        assert_eq!(
            PortProbeOutcome::from_connect_error(80, &reset),
            PortProbeOutcome::Error(80, ProbeFailure::Io(io::ErrorKind::ConnectionReset))
        );
    }
}
