//! The validated description of a single scan.
use std::num::NonZeroUsize;
use std::time::Duration;
use thiserror::Error;

/// The default time a connect attempt may take before the port is given up.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);

/// Rejections raised while building a [`ScanRequest`]. These are the only
/// failures that stop a scan, and they always happen before it starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no host to scan was given")]
    EmptyHost,

    #[error("port 0 is not scannable, ports must be between 1 and 65535")]
    ZeroPort,

    #[error("start port {start} is greater than end port {end}")]
    StartAfterEnd { start: u16, end: u16 },

    #[error("worker count must be at least 1")]
    NoWorkers,

    #[error("connect timeout must be greater than zero")]
    ZeroTimeout,
}

/// Everything the scanner needs for one run. Built once, never changed.
///
/// The fields are private so an invalid request cannot be constructed:
/// `1 <= start_port <= end_port <= 65535` and `workers >= 1` always hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    host: String,
    start_port: u16,
    end_port: u16,
    workers: NonZeroUsize,
    timeout: Duration,
    verbose: bool,
}

impl ScanRequest {
    /// Validates the parameters of a scan.
    ///
    /// ```rust
    /// # use portsweep::scanner::{ConfigError, ScanRequest};
    /// # use std::time::Duration;
    /// let request = ScanRequest::new("127.0.0.1", 8000, 8100, 10, Duration::from_millis(500));
    /// assert!(request.is_ok());
    ///
    /// let reversed = ScanRequest::new("127.0.0.1", 1, 0, 10, Duration::from_millis(500));
    /// assert_eq!(reversed, Err(ConfigError::StartAfterEnd { start: 1, end: 0 }));
    /// ```
    pub fn new(
        host: impl Into<String>,
        start_port: u16,
        end_port: u16,
        workers: usize,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let host = host.into().trim().to_owned();
        if host.is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if start_port > end_port {
            return Err(ConfigError::StartAfterEnd {
                start: start_port,
                end: end_port,
            });
        }
        if start_port == 0 {
            return Err(ConfigError::ZeroPort);
        }
        let Some(workers) = NonZeroUsize::new(workers) else {
            return Err(ConfigError::NoWorkers);
        };
        if timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }

        Ok(Self {
            host,
            start_port,
            end_port,
            workers,
            timeout,
            verbose: false,
        })
    }

    /// Enables per-port status lines for closed and failed ports.
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub const fn start_port(&self) -> u16 {
        self.start_port
    }

    pub const fn end_port(&self) -> u16 {
        self.end_port
    }

    pub const fn workers(&self) -> usize {
        self.workers.get()
    }

    /// The worker count in the form the pool takes it.
    pub const fn worker_count(&self) -> NonZeroUsize {
        self.workers
    }

    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    pub const fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// How many ports the request covers.
    pub fn port_count(&self) -> usize {
        usize::from(self.end_port - self.start_port) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, ScanRequest, DEFAULT_TIMEOUT};
    use parameterized::parameterized;
    use std::time::Duration;

    #[parameterized(
        host = { "127.0.0.1", "127.0.0.1", "127.0.0.1", "", "   ", "localhost" },
        start = { 1, 0, 9000, 1, 1, 1 },
        end = { 0, 0, 8000, 10, 10, 10 },
        workers = { 10, 10, 10, 10, 10, 0 },
        expected = {
            ConfigError::StartAfterEnd { start: 1, end: 0 },
            ConfigError::ZeroPort,
            ConfigError::StartAfterEnd { start: 9000, end: 8000 },
            ConfigError::EmptyHost,
            ConfigError::EmptyHost,
            ConfigError::NoWorkers,
        }
    )]
    fn rejects_invalid_requests(
        host: &str,
        start: u16,
        end: u16,
        workers: usize,
        expected: ConfigError,
    ) {
        let result = ScanRequest::new(host, start, end, workers, DEFAULT_TIMEOUT);
        assert_eq!(result, Err(expected));
    }

    #[test]
    fn rejects_zero_timeout() {
        let result = ScanRequest::new("127.0.0.1", 1, 10, 1, Duration::ZERO);
        assert_eq!(result, Err(ConfigError::ZeroTimeout));
    }

    #[test]
    fn accepts_full_range() {
        let request = ScanRequest::new(" 10.0.0.1 ", 1, u16::MAX, 5000, DEFAULT_TIMEOUT).unwrap();
        assert_eq!(request.host(), "10.0.0.1");
        assert_eq!(request.port_count(), 65_535);
        assert!(!request.is_verbose());
    }

    #[test]
    fn single_port_request() {
        let request = ScanRequest::new("127.0.0.1", 22, 22, 1, DEFAULT_TIMEOUT)
            .unwrap()
            .verbose(true);
        assert_eq!(request.port_count(), 1);
        assert!(request.is_verbose());
        assert_eq!(request.timeout(), Duration::from_millis(500));
        assert_eq!(request.worker_count().get(), 1);
    }

    #[test]
    fn worker_count_matches_the_validated_value() {
        let request = ScanRequest::new("127.0.0.1", 1, 10, 250, DEFAULT_TIMEOUT).unwrap();
        assert_eq!(request.workers(), 250);
        assert_eq!(request.worker_count().get(), 250);
    }
}
