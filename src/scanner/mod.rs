//! Core functionality for actual scanning behaviour.
//!
//! A [`Scanner`] wires one scan together: it resolves the host, hands a
//! [`PortSource`] to a [`WorkerPool`], drains the pool through a
//! [`Collector`] and packages the result as a [`ScanSummary`].
use crate::address::resolve_host;
use crate::port_source::PortSource;
use crate::warning;
use log::debug;
use serde_derive::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::time::Instant;

mod collector;
mod pool;
mod prober;
mod request;

pub use collector::Collector;
pub use pool::{PoolReport, ResultStream, StatusLines, WorkerPool};
pub use prober::{PortProbeOutcome, Probe, ProbeFailure, TcpProber};
pub use request::{ConfigError, ScanRequest, DEFAULT_TIMEOUT};

/// The outcome of one finished scan.
///
/// `open_ports` is strictly ascending and lies within
/// `start_port..=end_port`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub host: String,
    pub start_port: u16,
    pub end_port: u16,
    pub open_ports: Vec<u16>,
    #[serde(rename = "scan_time_ms")]
    pub scan_duration_ms: u64,
}

/// Runs exactly one scan. `run` consumes the scanner, so a scanner goes
/// from idle to running to completed once and never back.
#[derive(Debug)]
pub struct Scanner<P = TcpProber> {
    request: ScanRequest,
    prober: Arc<P>,
    resolver: Option<String>,
    status: StatusLines,
}

impl Scanner<TcpProber> {
    /// A scanner that probes with real TCP connects using the request's
    /// timeout.
    ///
    /// ```rust
    /// # use portsweep::scanner::{ScanRequest, Scanner};
    /// # use std::time::Duration;
    /// let request = ScanRequest::new("127.0.0.1", 1, 1_000, 100, Duration::from_millis(100)).unwrap();
    /// let summary = tokio::runtime::Runtime::new()
    ///     .unwrap()
    ///     .block_on(Scanner::new(request).run());
    /// assert!(summary.open_ports.windows(2).all(|w| w[0] < w[1]));
    /// ```
    pub fn new(request: ScanRequest) -> Self {
        let prober = TcpProber::new(request.timeout());
        Self::with_prober(request, prober)
    }
}

impl<P: Probe> Scanner<P> {
    pub fn with_prober(request: ScanRequest, prober: P) -> Self {
        let status = StatusLines {
            verbose: request.is_verbose(),
            ..StatusLines::default()
        };
        Self {
            request,
            prober: Arc::new(prober),
            resolver: None,
            status,
        }
    }

    /// DNS servers (comma-separated IPs or a file of them) used when the
    /// system resolver cannot resolve the host.
    #[must_use]
    pub fn resolver(mut self, resolver: Option<String>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Only the summary is printed, no per-port lines.
    #[must_use]
    pub fn greppable(mut self, greppable: bool) -> Self {
        self.status.greppable = greppable;
        self
    }

    /// Turns off colour in per-port lines.
    #[must_use]
    pub fn accessible(mut self, accessible: bool) -> Self {
        self.status.accessible = accessible;
        self
    }

    pub const fn request(&self) -> &ScanRequest {
        &self.request
    }

    /// Scans every port of the request and waits for all workers to finish.
    ///
    /// Never fails: network problems only make ports count as not open. A
    /// host that cannot be resolved yields an empty result.
    pub async fn run(self) -> ScanSummary {
        let Self {
            request,
            prober,
            resolver,
            status,
        } = self;

        debug!("Scan of {} entering running state", request.host());
        let started = Instant::now();

        let target = resolve_host(request.host(), resolver.as_deref()).await;
        match target {
            Some(ip) => debug!("Scanning {} as {ip}", request.host()),
            None => warning!(
                format!("Host {:?} could not be resolved.", request.host()),
                status.greppable,
                status.accessible
            ),
        }

        let source = Arc::new(PortSource::new(request.start_port(), request.end_port()));
        debug!(
            "Start scanning ports.\nWorkers {}\nNumber of ports {}\nTimeout {:?}",
            request.workers(),
            request.port_count(),
            request.timeout()
        );

        let mut stream = WorkerPool::new(prober, request.worker_count(), status).run(source, target);
        let collector = Collector::new().drain(&mut stream.results).await;
        match stream.workers.await {
            Ok(report) if report.failed_workers > 0 => warning!(
                format!("{} workers stopped unexpectedly.", report.failed_workers),
                status.greppable,
                status.accessible
            ),
            Ok(report) => debug!("Ports probed per worker {:?}", report.probed_per_worker),
            Err(e) => debug!("Worker watcher did not finish: {e}"),
        }

        let elapsed = started.elapsed();
        let open_ports = collector.into_sorted();
        debug!("Scan completed in {elapsed:?}, open ports {open_ports:?}");
        debug_assert!(open_ports
            .iter()
            .all(|port| (request.start_port()..=request.end_port()).contains(port)));

        ScanSummary {
            host: request.host().to_owned(),
            start_port: request.start_port(),
            end_port: request.end_port(),
            open_ports,
            scan_duration_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }
}
